use serde::{Deserialize, Serialize};

use crate::confirm::ConfirmationId;
use crate::error::{AppError, ErrorKind};
use crate::model::{AuthState, Item, Model};
use crate::paths::CollectionId;
use crate::reconcile::{RenderChange, ViewHandle};
use crate::session::SessionStatus;

pub const MAIN_LIST_NAME: &str = "Shopping list";
pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_LIST_MESSAGE: &str = "No items here... yet";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Screen {
    SignIn { signing_in: bool },
    List,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub handle: ViewHandle,
    pub text: String,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemsView {
    Loading { message: String },
    Empty { message: String },
    Items(Vec<ItemView>),
    /// Shown in place of the list; whatever was rendered is kept in the core.
    AccessDenied { message: String },
    /// Last known items, with a notice that they may be out of date.
    Unavailable { message: String, items: Vec<ItemView> },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListView {
    pub id: CollectionId,
    pub name: String,
    pub created_at: Option<i64>,
    pub active: bool,
    pub deletable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationView {
    pub id: ConfirmationId,
    pub prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertView {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for AlertView {
    fn from(e: &AppError) -> Self {
        Self {
            code: e.kind.code().to_string(),
            message: e.message.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub screen: Screen,
    pub user_email: Option<String>,
    pub active_list: Option<ListView>,
    pub lists: Vec<ListView>,
    pub items: ItemsView,
    /// Changes made by the most recent reconciliation pass, for animation.
    pub changes: Vec<RenderChange<Item>>,
    pub render_pass: u64,
    pub confirmation: Option<ConfirmationView>,
    pub alert: Option<AlertView>,
}

pub(crate) fn build(model: &Model) -> ViewModel {
    let alert = model.alert.as_ref().map(AlertView::from);

    let user = match &model.auth {
        AuthState::SignedIn(user) => user,
        AuthState::SignedOut | AuthState::SigningIn => {
            return ViewModel {
                screen: Screen::SignIn {
                    signing_in: model.auth == AuthState::SigningIn,
                },
                user_email: None,
                active_list: None,
                lists: Vec::new(),
                items: ItemsView::Loading {
                    message: LOADING_MESSAGE.to_string(),
                },
                changes: Vec::new(),
                render_pass: model.render_pass,
                confirmation: None,
                alert,
            };
        }
    };

    let lists = list_views(model);
    let active_list = lists.iter().find(|l| l.active).cloned();

    ViewModel {
        screen: Screen::List,
        user_email: user.email.clone(),
        active_list,
        lists,
        items: items_view(model),
        changes: model.last_changes.clone(),
        render_pass: model.render_pass,
        confirmation: model.confirm.pending().map(|p| ConfirmationView {
            id: p.id,
            prompt: p.prompt.clone(),
        }),
        alert,
    }
}

fn item_views(model: &Model) -> Vec<ItemView> {
    model
        .items
        .rendered()
        .iter()
        .map(|(id, rendered)| ItemView {
            id: id.to_string(),
            handle: rendered.handle,
            text: rendered.value.text.clone(),
            completed: rendered.value.completed,
        })
        .collect()
}

fn items_view(model: &Model) -> ItemsView {
    match model.items.status() {
        SessionStatus::Idle | SessionStatus::Loading => ItemsView::Loading {
            message: LOADING_MESSAGE.to_string(),
        },
        SessionStatus::Live if model.items.rendered().is_empty() => ItemsView::Empty {
            message: EMPTY_LIST_MESSAGE.to_string(),
        },
        SessionStatus::Live => ItemsView::Items(item_views(model)),
        SessionStatus::AccessDenied => ItemsView::AccessDenied {
            message: ErrorKind::AccessDenied.user_message().to_string(),
        },
        SessionStatus::Unavailable => ItemsView::Unavailable {
            message: ErrorKind::TransientReadFailure.user_message().to_string(),
            items: item_views(model),
        },
    }
}

fn list_views(model: &Model) -> Vec<ListView> {
    let active = model.active_collection();

    let mut custom: Vec<ListView> = model
        .lists
        .rendered()
        .iter()
        .map(|(id, rendered)| {
            let collection = CollectionId::Custom(id.to_string());
            ListView {
                active: active == Some(&collection),
                id: collection,
                name: rendered.value.name.clone(),
                created_at: Some(rendered.value.created_at),
                deletable: true,
            }
        })
        .collect();
    custom.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });

    let mut lists = Vec::with_capacity(custom.len() + 1);
    lists.push(ListView {
        id: CollectionId::Main,
        name: MAIN_LIST_NAME.to_string(),
        created_at: None,
        active: active == Some(&CollectionId::Main),
        deletable: false,
    });

    // a selected list whose metadata has not arrived yet still shows up
    if let Some(CollectionId::Custom(id)) = active {
        if !custom.iter().any(|l| l.id.as_str() == id) {
            lists.push(ListView {
                id: CollectionId::Custom(id.clone()),
                name: model
                    .list_name(&CollectionId::Custom(id.clone()))
                    .unwrap_or_else(|| crate::model::UNTITLED_LIST_NAME.to_string()),
                created_at: None,
                active: true,
                deletable: true,
            });
        }
    }

    lists.extend(custom);
    lists
}
