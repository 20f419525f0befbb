use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::bootstrap::Bootstrap;
use crate::config::CoreConfig;
use crate::confirm::ConfirmSlot;
use crate::error::AppError;
use crate::input::TapFilter;
use crate::paths::{CollectionId, PathLayout, StorePath};
use crate::reconcile::RenderChange;
use crate::session::{CollectionSession, SessionKind};

pub const UNTITLED_LIST_NAME: &str = "Untitled list";

/// Converts one raw child value of a snapshot into its display shape.
///
/// Returns `None` for values that cannot represent an entry; those are treated
/// as absent from the snapshot.
pub trait Normalize: Sized {
    fn normalize(raw: &Value) -> Option<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    pub completed: bool,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ "text": self.text, "completed": self.completed })
    }

    /// The partial write that flips `completed`. The current text is sent
    /// along so a concurrent edit seen by this client is not reverted.
    pub fn toggled_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert("text".into(), Value::String(self.text.clone()));
        patch.insert("completed".into(), Value::Bool(!self.completed));
        patch
    }
}

/// Stored item encodings, resolved once here.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    /// Oldest single-list clients wrote the text as a bare string.
    Legacy(String),
    Structured {
        // early multi-list clients called it `name`
        #[serde(alias = "name")]
        text: String,
        #[serde(default)]
        completed: bool,
    },
}

impl Normalize for Item {
    fn normalize(raw: &Value) -> Option<Self> {
        if !raw.is_object() && !raw.is_string() {
            return None;
        }

        match RawItem::deserialize(raw).ok()? {
            RawItem::Legacy(text) => Some(Self::new(text)),
            RawItem::Structured { text, completed } => Some(Self { text, completed }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub name: String,
    pub created_at: i64,
}

impl ListMeta {
    /// Value written when a list is created: metadata nested under `meta` so
    /// items can later sit next to it under the same parent.
    pub fn to_list_value(&self) -> Value {
        json!({ "meta": { "name": self.name, "createdAt": self.created_at } })
    }
}

impl Normalize for ListMeta {
    fn normalize(raw: &Value) -> Option<Self> {
        let node = raw.as_object()?;
        // early layout kept name and createdAt directly on the list node
        let fields = node
            .get("meta")
            .and_then(Value::as_object)
            .unwrap_or(node);

        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNTITLED_LIST_NAME)
            .to_string();

        let created_at = fields
            .get("createdAt")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0);

        Some(Self { name, created_at })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    #[default]
    SignedOut,
    SigningIn,
    SignedIn(User),
}

impl AuthState {
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmAction {
    DeleteList { list_id: String },
}

pub type ItemsSession = CollectionSession<CollectionId, Item>;
pub type ListsSession = CollectionSession<StorePath, ListMeta>;

/// Everything the core owns. The application root holds exactly one.
#[derive(Debug)]
pub struct Model {
    pub config: CoreConfig,
    pub layout: PathLayout,
    pub auth: AuthState,
    pub items: ItemsSession,
    pub lists: ListsSession,
    pub bootstrap: Bootstrap,
    pub confirm: ConfirmSlot<ConfirmAction>,
    pub taps: TapFilter,
    pub alert: Option<AppError>,
    pub last_changes: Vec<RenderChange<Item>>,
    pub render_pass: u64,
}

impl Default for Model {
    fn default() -> Self {
        let config = CoreConfig::default();
        let taps = TapFilter::new(config.tap_window_ms);

        Self {
            config,
            layout: PathLayout::default(),
            auth: AuthState::default(),
            items: CollectionSession::new(SessionKind::Items),
            lists: CollectionSession::new(SessionKind::Lists),
            bootstrap: Bootstrap::default(),
            confirm: ConfirmSlot::default(),
            taps,
            alert: None,
            last_changes: Vec::new(),
            render_pass: 0,
        }
    }
}

impl Model {
    pub fn active_collection(&self) -> Option<&CollectionId> {
        self.items.active_target()
    }

    pub fn list_name(&self, collection: &CollectionId) -> Option<String> {
        match collection {
            CollectionId::Main => None,
            CollectionId::Custom(id) => self.lists.rendered().value(id).map(|m| m.name.clone()),
        }
    }
}
