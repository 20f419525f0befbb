//! User intents turned into store writes.
//!
//! Nothing here keeps local state or reads back its own writes: the next
//! snapshot delivered to the matching session is the only confirmation.

use chrono::{TimeZone, Utc};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Item, ListMeta};
use crate::paths::{CollectionId, PathError, PathLayout};
use crate::reconcile::RenderedState;
use crate::store::StoreAdapter;

pub const FALLBACK_LIST_NAME: &str = "New list";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("item {0} is not displayed")]
    UnknownItem(String),

    #[error("the main list cannot be deleted")]
    MainListPermanent,
}

pub struct MutationGateway<'a, S: ?Sized> {
    store: &'a S,
    layout: &'a PathLayout,
}

impl<'a, S> MutationGateway<'a, S>
where
    S: StoreAdapter + ?Sized,
{
    pub fn new(store: &'a S, layout: &'a PathLayout) -> Self {
        Self { store, layout }
    }

    /// Pushes a new open item. Blank input is skipped and yields `None`.
    pub fn add_item(
        &self,
        collection: &CollectionId,
        text: &str,
    ) -> Result<Option<String>, GatewayError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank item");
            return Ok(None);
        }

        let path = self.layout.items(collection)?;
        let key = self.store.push_new(path, Item::new(text).to_value());
        info!(%collection, %key, "item added");
        Ok(Some(key))
    }

    pub fn toggle_completed(
        &self,
        collection: &CollectionId,
        item_id: &str,
        current: &Item,
    ) -> Result<(), GatewayError> {
        let path = self.layout.item(collection, item_id)?;
        debug!(%collection, %item_id, completed = !current.completed, "toggling item");
        self.store.patch(path, current.toggled_patch());
        Ok(())
    }

    /// Toggles using whatever is displayed right now for `item_id`.
    pub fn toggle_displayed(
        &self,
        collection: &CollectionId,
        item_id: &str,
        rendered: &RenderedState<Item>,
    ) -> Result<(), GatewayError> {
        let current = rendered
            .value(item_id)
            .ok_or_else(|| GatewayError::UnknownItem(item_id.to_string()))?;
        self.toggle_completed(collection, item_id, current)
    }

    pub fn delete_item(&self, collection: &CollectionId, item_id: &str) -> Result<(), GatewayError> {
        let path = self.layout.item(collection, item_id)?;
        info!(%collection, %item_id, "item deleted");
        self.store.delete(path);
        Ok(())
    }

    /// Creates a list and returns its id. A blank name becomes a dated
    /// default rendered with `name_format`.
    pub fn create_list(
        &self,
        name: &str,
        now_ms: i64,
        name_format: &str,
    ) -> Result<String, GatewayError> {
        let name = match name.trim() {
            "" => default_list_name(now_ms, name_format),
            trimmed => trimmed.to_string(),
        };

        let meta = ListMeta {
            name,
            created_at: now_ms,
        };
        let key = self
            .store
            .push_new(self.layout.lists_root().clone(), meta.to_list_value());
        info!(list_id = %key, name = %meta.name, "list created");
        Ok(key)
    }

    /// Removes the whole list subtree, metadata and items together.
    pub fn delete_list(&self, collection: &CollectionId) -> Result<(), GatewayError> {
        let list_id = collection
            .custom_id()
            .ok_or(GatewayError::MainListPermanent)?;
        let path = self.layout.list(list_id)?;
        info!(%list_id, "list deleted");
        self.store.delete(path);
        Ok(())
    }
}

pub fn default_list_name(now_ms: i64, name_format: &str) -> String {
    let Some(at) = Utc.timestamp_millis_opt(now_ms).single() else {
        return FALLBACK_LIST_NAME.to_string();
    };

    let mut name = String::new();
    if write!(name, "{}", at.format(name_format)).is_err() || name.trim().is_empty() {
        return FALLBACK_LIST_NAME.to_string();
    }
    name
}
