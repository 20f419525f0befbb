#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod bootstrap;
pub mod capabilities;
pub mod config;
pub mod confirm;
pub mod error;
pub mod event;
pub mod gateway;
pub mod input;
pub mod model;
pub mod paths;
pub mod push_id;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod view;

use std::time::{SystemTime, UNIX_EPOCH};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::CoreConfig;
pub use crux_core::App as CruxApp;
pub use error::{AppError, ErrorKind};
pub use event::Event;
pub use model::Model;
pub use paths::CollectionId;
pub use view::ViewModel;

/// Wall-clock milliseconds since the Unix epoch, or 0 if the clock is
/// before it.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
