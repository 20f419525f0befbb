use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::{PathError, PathLayout};

pub const DEFAULT_MAIN_LIST_PATH: &str = "shoppingList";
pub const DEFAULT_LISTS_ROOT: &str = "lists";
pub const DEFAULT_LAST_LIST_KEY: &str = "lastListId";
pub const DEFAULT_LIST_NAME_FORMAT: &str = "List %b %-d";
pub const DEFAULT_TAP_WINDOW_MS: u64 = 500;
pub const MAX_TAP_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid store path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("main list path {main} must not live under lists root {lists_root}")]
    OverlappingPaths { main: String, lists_root: String },

    #[error("invalid default list name format: {0:?}")]
    InvalidNameFormat(String),

    #[error("preferences key cannot be empty")]
    EmptyPrefsKey,

    #[error("tap window {window_ms}ms exceeds max {max}ms")]
    TapWindowTooLong { window_ms: u64, max: u64 },
}

/// Shell-supplied settings. Every field has a default matching the data
/// already stored by existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    pub main_list_path: String,
    pub lists_root: String,
    pub last_list_key: String,
    pub default_list_name_format: String,
    pub tap_window_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            main_list_path: DEFAULT_MAIN_LIST_PATH.to_string(),
            lists_root: DEFAULT_LISTS_ROOT.to_string(),
            last_list_key: DEFAULT_LAST_LIST_KEY.to_string(),
            default_list_name_format: DEFAULT_LIST_NAME_FORMAT.to_string(),
            tap_window_ms: DEFAULT_TAP_WINDOW_MS,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout()?;

        if self.last_list_key.trim().is_empty() {
            return Err(ConfigError::EmptyPrefsKey);
        }

        let format_ok = !self.default_list_name_format.trim().is_empty()
            && StrftimeItems::new(&self.default_list_name_format)
                .all(|item| !matches!(item, Item::Error));
        if !format_ok {
            return Err(ConfigError::InvalidNameFormat(
                self.default_list_name_format.clone(),
            ));
        }

        if self.tap_window_ms > MAX_TAP_WINDOW_MS {
            return Err(ConfigError::TapWindowTooLong {
                window_ms: self.tap_window_ms,
                max: MAX_TAP_WINDOW_MS,
            });
        }

        Ok(())
    }

    pub fn layout(&self) -> Result<PathLayout, ConfigError> {
        let layout = PathLayout::new(&self.main_list_path, &self.lists_root)?;

        let (main, lists_root) = (layout.main(), layout.lists_root());
        if main == lists_root || lists_root.is_ancestor_of(main) || main.is_ancestor_of(lists_root) {
            return Err(ConfigError::OverlappingPaths {
                main: main.to_string(),
                lists_root: lists_root.to_string(),
            });
        }

        Ok(layout)
    }
}
