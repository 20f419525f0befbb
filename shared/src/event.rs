use serde::{Deserialize, Serialize};

use crate::capabilities::{AuthFailure, PrefsError, StoreResponse};
use crate::config::CoreConfig;
use crate::confirm::ConfirmationId;
use crate::input::TapInput;
use crate::model::User;
use crate::paths::CollectionId;
use crate::session::SubscriptionId;
use crate::store::ReadToken;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    AppStarted,
    Configure(CoreConfig),

    SignInRequested,
    SignOutRequested,
    AlertDismissed,

    AddItemRequested { text: String },
    ItemTapped { id: String, input: TapInput, at_ms: u64 },
    /// The shell decided the gesture was a delete swipe.
    ItemSwiped { id: String },

    SelectList(CollectionId),
    CreateListRequested { name: String },
    DeleteListRequested { list_id: String },
    ConfirmationResolved { id: ConfirmationId, confirmed: bool },

    // capability callbacks, never sent by the shell directly
    #[serde(skip)]
    AuthStateChanged(Option<User>),
    #[serde(skip)]
    SignInFinished(Result<(), AuthFailure>),
    #[serde(skip)]
    SnapshotDelivered {
        subscription: SubscriptionId,
        response: StoreResponse,
    },
    #[serde(skip)]
    ReadCompleted {
        token: ReadToken,
        response: StoreResponse,
    },
    #[serde(skip)]
    PreferenceLoaded {
        token: ReadToken,
        response: Result<Option<String>, PrefsError>,
    },
    #[serde(skip)]
    PreferenceWritten(Result<(), PrefsError>),
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::SignInRequested => "sign_in_requested",
            Self::SignOutRequested => "sign_out_requested",
            Self::AlertDismissed => "alert_dismissed",
            Self::AddItemRequested { .. } => "add_item_requested",
            Self::ItemTapped { .. } => "item_tapped",
            Self::ItemSwiped { .. } => "item_swiped",
            Self::SelectList(_) => "select_list",
            Self::CreateListRequested { .. } => "create_list_requested",
            Self::DeleteListRequested { .. } => "delete_list_requested",
            Self::ConfirmationResolved { .. } => "confirmation_resolved",
            Self::AuthStateChanged(_) => "auth_state_changed",
            Self::SignInFinished(_) => "sign_in_finished",
            Self::SnapshotDelivered { .. } => "snapshot_delivered",
            Self::ReadCompleted { .. } => "read_completed",
            Self::PreferenceLoaded { .. } => "preference_loaded",
            Self::PreferenceWritten(_) => "preference_written",
        }
    }

    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SignInRequested
                | Self::SignOutRequested
                | Self::AlertDismissed
                | Self::AddItemRequested { .. }
                | Self::ItemTapped { .. }
                | Self::ItemSwiped { .. }
                | Self::SelectList(_)
                | Self::CreateListRequested { .. }
                | Self::DeleteListRequested { .. }
                | Self::ConfirmationResolved { .. }
        )
    }
}
