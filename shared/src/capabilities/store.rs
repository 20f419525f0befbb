use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crate::event::Event;
use crate::paths::StorePath;
use crate::push_id::PushIdGenerator;
use crate::session::SubscriptionId;
use crate::store::{ReadToken, Snapshot, StoreAdapter, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum StoreOperation {
    /// Long-lived: the shell resolves it once per snapshot until told to
    /// `Unsubscribe` with the same id.
    Subscribe {
        subscription: SubscriptionId,
        path: StorePath,
    },
    Unsubscribe {
        subscription: SubscriptionId,
    },
    Read {
        path: StorePath,
    },
    Set {
        path: StorePath,
        value: Value,
    },
    Update {
        path: StorePath,
        value: Map<String, Value>,
    },
    Remove {
        path: StorePath,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreResponse {
    Snapshot(Snapshot),
    Error(StoreError),
}

impl StoreResponse {
    pub fn into_result(self) -> Result<Snapshot, StoreError> {
        match self {
            Self::Snapshot(snapshot) => Ok(snapshot),
            Self::Error(error) => Err(error),
        }
    }
}

impl Operation for StoreOperation {
    type Output = StoreResponse;
}

pub struct Store<Ev> {
    context: CapabilityContext<StoreOperation, Ev>,
    push_ids: Arc<Mutex<PushIdGenerator>>,
}

impl<Ev> Capability<Ev> for Store<Ev> {
    type Operation = StoreOperation;
    type MappedSelf<MappedEv> = Store<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Store {
            context: self.context.map_event(f),
            push_ids: Arc::clone(&self.push_ids),
        }
    }
}

impl<Ev> Store<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<StoreOperation, Ev>) -> Self {
        Self {
            context,
            push_ids: Arc::default(),
        }
    }

    pub fn watch<F>(&self, subscription: SubscriptionId, path: StorePath, make_event: F)
    where
        F: Fn(StoreResponse) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut deliveries =
                ctx.stream_from_shell(StoreOperation::Subscribe { subscription, path });
            while let Some(response) = deliveries.next().await {
                ctx.update_app(make_event(response));
            }
        });
    }

    pub fn stop_watching(&self, subscription: SubscriptionId) {
        self.notify(StoreOperation::Unsubscribe { subscription });
    }

    pub fn read<F>(&self, path: StorePath, make_event: F)
    where
        F: FnOnce(StoreResponse) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx.request_from_shell(StoreOperation::Read { path }).await;
            ctx.update_app(make_event(response));
        });
    }

    pub fn set(&self, path: StorePath, value: Value) {
        self.notify(StoreOperation::Set { path, value });
    }

    pub fn update(&self, path: StorePath, value: Map<String, Value>) {
        self.notify(StoreOperation::Update { path, value });
    }

    pub fn remove(&self, path: StorePath) {
        self.notify(StoreOperation::Remove { path });
    }

    /// Writes `value` under a freshly generated child key of `path` and
    /// returns the key straight away.
    pub fn push(&self, path: &StorePath, value: Value) -> String {
        let key = {
            let mut ids = self
                .push_ids
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            ids.next_id(crate::now_ms(), &mut thread_rng())
        };

        match path.child(&key) {
            Ok(child) => self.set(child, value),
            Err(e) => warn!(%path, %key, error = %e, "generated key rejected"),
        }
        key
    }

    fn notify(&self, operation: StoreOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}

impl StoreAdapter for Store<Event> {
    fn subscribe(&self, subscription: SubscriptionId, path: StorePath) {
        self.watch(subscription, path, move |response| Event::SnapshotDelivered {
            subscription,
            response,
        });
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.stop_watching(subscription);
    }

    fn read_once(&self, token: ReadToken, path: StorePath) {
        self.read(path, move |response| Event::ReadCompleted { token, response });
    }

    fn write(&self, path: StorePath, value: Value) {
        self.set(path, value);
    }

    fn patch(&self, path: StorePath, partial: Map<String, Value>) {
        self.update(path, partial);
    }

    fn delete(&self, path: StorePath) {
        self.remove(path);
    }

    fn push_new(&self, path: StorePath, value: Value) -> String {
        self.push(&path, value)
    }
}
