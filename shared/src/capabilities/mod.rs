mod auth;
mod prefs;
mod store;

pub use self::auth::{Auth, AuthFailure, AuthOperation, AuthResponse};
pub use self::prefs::{Prefs, PrefsError, PrefsKey};
pub use self::store::{Store, StoreOperation, StoreResponse};

// Crux's built-in Render covers view updates as is.
pub use crux_core::render::Render;
pub use crux_kv::error::KeyValueError;
pub use crux_kv::value::Value as KeyValueValue;
pub use crux_kv::{KeyValue, KeyValueOperation, KeyValueResponse, KeyValueResult};

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub store: Store<Event>,
    pub auth: Auth<Event>,
    pub kv: KeyValue<Event>,
}
