//! The remote tree store as seen from the core.
//!
//! The store itself (a hosted realtime database) lives in the shell. The core
//! only issues requests through [`StoreAdapter`] and later receives deliveries
//! as events tagged with the [`SubscriptionId`] or [`ReadToken`] that started
//! them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::paths::StorePath;
use crate::session::SubscriptionId;

/// A full point-in-time view of one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exists: bool,
    #[serde(default)]
    pub value: Value,
}

impl Snapshot {
    pub fn absent() -> Self {
        Self {
            exists: false,
            value: Value::Null,
        }
    }

    /// Wraps a value the way the store reports it: `null` means the path
    /// does not exist.
    pub fn of(value: Value) -> Self {
        Self {
            exists: !value.is_null(),
            value,
        }
    }

    pub fn exists(&self) -> bool {
        self.exists && !self.value.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn children(&self) -> Option<&Map<String, Value>> {
        if self.exists() {
            self.value.as_object()
        } else {
            None
        }
    }
}

/// Correlates a one-shot read with whoever asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadToken(pub u64);

impl fmt::Display for ReadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreErrorCode {
    PermissionDenied,
    Unavailable,
    Disconnected,
    Other,
}

impl StoreErrorCode {
    pub fn parse(code: &str) -> Self {
        let normalized = code
            .trim()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .replace('-', "_")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "UNAVAILABLE" | "NETWORK_ERROR" => Self::Unavailable,
            "DISCONNECTED" => Self::Disconnected,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Unavailable => "UNAVAILABLE",
            Self::Disconnected => "DISCONNECTED",
            Self::Other => "OTHER",
        }
    }
}

/// Failure reported by the store. Callers branch on [`StoreError::kind`],
/// never on the message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("store error {code}: {message}")]
pub struct StoreError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> StoreErrorCode {
        StoreErrorCode::parse(&self.code)
    }

    pub fn is_permission_denied(&self) -> bool {
        self.kind() == StoreErrorCode::PermissionDenied
    }
}

/// Requests the core can make of the store.
///
/// Every call is fire-and-forget: subscription and read results arrive later
/// as separate events. `push_new` hands back the generated child key
/// immediately while the write itself completes asynchronously.
pub trait StoreAdapter {
    fn subscribe(&self, subscription: SubscriptionId, path: StorePath);
    fn unsubscribe(&self, subscription: SubscriptionId);
    fn read_once(&self, token: ReadToken, path: StorePath);
    fn write(&self, path: StorePath, value: Value);
    fn patch(&self, path: StorePath, partial: Map<String, Value>);
    fn delete(&self, path: StorePath);
    fn push_new(&self, path: StorePath, value: Value) -> String;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum StoreCall {
        Subscribe(SubscriptionId, StorePath),
        Unsubscribe(SubscriptionId),
        ReadOnce(ReadToken, StorePath),
        Write(StorePath, Value),
        Patch(StorePath, Map<String, Value>),
        Delete(StorePath),
        PushNew(StorePath, Value, String),
    }

    /// Records every call; pushed keys are `k1`, `k2`, ...
    #[derive(Debug, Default)]
    pub(crate) struct FakeStore {
        calls: RefCell<Vec<StoreCall>>,
        pushed: Cell<u32>,
    }

    impl FakeStore {
        pub(crate) fn calls(&self) -> Vec<StoreCall> {
            self.calls.borrow().clone()
        }

        pub(crate) fn take_calls(&self) -> Vec<StoreCall> {
            self.calls.borrow_mut().drain(..).collect()
        }

        pub(crate) fn live_subscriptions(&self) -> Vec<SubscriptionId> {
            let mut live = Vec::new();
            for call in self.calls.borrow().iter() {
                match call {
                    StoreCall::Subscribe(id, _) => live.push(*id),
                    StoreCall::Unsubscribe(id) => live.retain(|l| l != id),
                    _ => {}
                }
            }
            live
        }
    }

    impl StoreAdapter for FakeStore {
        fn subscribe(&self, subscription: SubscriptionId, path: StorePath) {
            self.calls
                .borrow_mut()
                .push(StoreCall::Subscribe(subscription, path));
        }

        fn unsubscribe(&self, subscription: SubscriptionId) {
            self.calls
                .borrow_mut()
                .push(StoreCall::Unsubscribe(subscription));
        }

        fn read_once(&self, token: ReadToken, path: StorePath) {
            self.calls.borrow_mut().push(StoreCall::ReadOnce(token, path));
        }

        fn write(&self, path: StorePath, value: Value) {
            self.calls.borrow_mut().push(StoreCall::Write(path, value));
        }

        fn patch(&self, path: StorePath, partial: Map<String, Value>) {
            self.calls.borrow_mut().push(StoreCall::Patch(path, partial));
        }

        fn delete(&self, path: StorePath) {
            self.calls.borrow_mut().push(StoreCall::Delete(path));
        }

        fn push_new(&self, path: StorePath, value: Value) -> String {
            let next = self.pushed.get() + 1;
            self.pushed.set(next);
            let key = format!("k{next}");
            self.calls
                .borrow_mut()
                .push(StoreCall::PushNew(path, value, key.clone()));
            key
        }
    }
}
