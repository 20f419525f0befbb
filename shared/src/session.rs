use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::model::Normalize;
use crate::paths::StorePath;
use crate::reconcile::{reconcile, RenderChange, RenderedState};
use crate::store::{Snapshot, StoreAdapter, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Items,
    Lists,
}

/// Identity of one subscription: which session opened it and the generation
/// that session was on at the time. Deliveries carrying any other id are
/// stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId {
    pub kind: SessionKind,
    pub generation: u64,
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Live,
    AccessDenied,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
struct Active<K> {
    subscription: SubscriptionId,
    target: K,
}

/// Lifecycle of the one live subscription a screen may hold.
///
/// `open` always tears down the previous subscription before issuing the new
/// one, and every delivery is checked against the current subscription id
/// before it may touch the rendered state.
#[derive(Debug, Clone)]
pub struct CollectionSession<K, T> {
    kind: SessionKind,
    generation: u64,
    active: Option<Active<K>>,
    rendered: RenderedState<T>,
    status: SessionStatus,
}

impl<K, T> CollectionSession<K, T>
where
    K: fmt::Debug + Clone,
    T: Normalize + Clone,
{
    pub fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            generation: 0,
            active: None,
            rendered: RenderedState::new(),
            status: SessionStatus::Idle,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rendered(&self) -> &RenderedState<T> {
        &self.rendered
    }

    pub fn active_target(&self) -> Option<&K> {
        self.active.as_ref().map(|a| &a.target)
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.active.as_ref().map(|a| a.subscription)
    }

    pub fn is_current(&self, subscription: SubscriptionId) -> bool {
        self.subscription() == Some(subscription)
    }

    #[instrument(skip(self, store), fields(kind = ?self.kind))]
    pub fn open<S>(&mut self, target: K, path: StorePath, store: &S) -> SubscriptionId
    where
        S: StoreAdapter + ?Sized,
    {
        if let Some(previous) = self.active.take() {
            debug!(subscription = %previous.subscription, "cancelling previous subscription");
            store.unsubscribe(previous.subscription);
        }

        self.rendered.clear();
        self.generation += 1;

        let subscription = SubscriptionId {
            kind: self.kind,
            generation: self.generation,
        };
        self.active = Some(Active {
            subscription,
            target,
        });
        self.status = SessionStatus::Loading;

        info!(%subscription, %path, "subscribing");
        store.subscribe(subscription, path);
        subscription
    }

    #[instrument(skip(self, store), fields(kind = ?self.kind))]
    pub fn close<S>(&mut self, store: &S)
    where
        S: StoreAdapter + ?Sized,
    {
        if let Some(previous) = self.active.take() {
            info!(subscription = %previous.subscription, "closing session");
            store.unsubscribe(previous.subscription);
        }

        self.rendered.clear();
        self.status = SessionStatus::Idle;
    }

    /// Reconciles a delivery into the rendered state. Returns `None` when the
    /// delivery belongs to a superseded subscription.
    pub fn on_snapshot(
        &mut self,
        subscription: SubscriptionId,
        snapshot: &Snapshot,
    ) -> Option<Vec<RenderChange<T>>> {
        if !self.is_current(subscription) {
            debug!(%subscription, current = ?self.subscription(), "dropping stale snapshot");
            return None;
        }

        let plan = reconcile(&self.rendered, snapshot);
        let changes = self.rendered.apply(plan);
        self.status = SessionStatus::Live;

        debug!(
            %subscription,
            changes = changes.len(),
            rendered = self.rendered.len(),
            "reconciled snapshot"
        );
        Some(changes)
    }

    /// Records a subscription failure. The rendered state is left as it was.
    /// Returns `false` for stale failures.
    pub fn on_error(&mut self, subscription: SubscriptionId, error: &StoreError) -> bool {
        if !self.is_current(subscription) {
            debug!(%subscription, "dropping stale subscription error");
            return false;
        }

        self.status = if error.is_permission_denied() {
            SessionStatus::AccessDenied
        } else {
            SessionStatus::Unavailable
        };

        warn!(%subscription, code = %error.code, status = ?self.status, "subscription failed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::paths::{CollectionId, PathLayout};
    use crate::store::fake::{FakeStore, StoreCall};
    use serde_json::json;

    type Session = CollectionSession<CollectionId, Item>;

    fn open(session: &mut Session, store: &FakeStore, id: CollectionId) -> SubscriptionId {
        let path = PathLayout::default().items(&id).unwrap();
        session.open(id, path, store)
    }

    #[test]
    fn open_subscribes_and_stamps_generation() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let first = open(&mut session, &store, CollectionId::Main);
        assert_eq!(first.generation, 1);
        assert_eq!(session.status(), SessionStatus::Loading);
        assert_eq!(session.active_target(), Some(&CollectionId::Main));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Subscribe(
                first,
                StorePath::parse("shoppingList").unwrap()
            )]
        );
    }

    #[test]
    fn switching_unsubscribes_first() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        let y = open(&mut session, &store, CollectionId::Custom("L1".into()));

        let calls = store.calls();
        assert_eq!(calls[1], StoreCall::Unsubscribe(x));
        assert!(matches!(calls[2], StoreCall::Subscribe(id, _) if id == y));
        assert_eq!(store.live_subscriptions(), vec![y]);
    }

    #[test]
    fn stale_delivery_after_switch_is_discarded() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        let y = open(&mut session, &store, CollectionId::Custom("L1".into()));

        // X's callback was already queued when Y opened
        let late = session.on_snapshot(x, &Snapshot::of(json!({"x1": "from x"})));
        assert!(late.is_none());
        assert!(session.rendered().is_empty());
        assert_eq!(session.status(), SessionStatus::Loading);

        let changes = session
            .on_snapshot(y, &Snapshot::of(json!({"y1": "from y"})))
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(session.rendered().ids().collect::<Vec<_>>(), vec!["y1"]);
        assert_eq!(session.status(), SessionStatus::Live);
    }

    #[test]
    fn open_resets_rendered_state() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        session.on_snapshot(x, &Snapshot::of(json!({"a": "milk"})));
        assert_eq!(session.rendered().len(), 1);

        open(&mut session, &store, CollectionId::Custom("L1".into()));
        assert!(session.rendered().is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        session.on_snapshot(x, &Snapshot::of(json!({"a": "milk"})));

        session.close(&store);
        session.close(&store);

        let unsubscribes = store
            .calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Unsubscribe(_)))
            .count();
        assert_eq!(unsubscribes, 1);
        assert!(session.rendered().is_empty());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.on_snapshot(x, &Snapshot::of(json!({"b": "x"}))).is_none());
    }

    #[test]
    fn permission_error_keeps_rendered_state() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        session.on_snapshot(x, &Snapshot::of(json!({"a": "milk"})));

        assert!(session.on_error(x, &StoreError::new("PERMISSION_DENIED", "nope")));
        assert_eq!(session.status(), SessionStatus::AccessDenied);
        assert_eq!(session.rendered().len(), 1);

        assert!(session.on_error(x, &StoreError::new("UNAVAILABLE", "offline")));
        assert_eq!(session.status(), SessionStatus::Unavailable);
    }

    #[test]
    fn stale_error_is_ignored() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let x = open(&mut session, &store, CollectionId::Main);
        let _y = open(&mut session, &store, CollectionId::Custom("L1".into()));

        assert!(!session.on_error(x, &StoreError::new("PERMISSION_DENIED", "")));
        assert_eq!(session.status(), SessionStatus::Loading);
    }

    #[test]
    fn generations_are_never_reused_across_close() {
        let store = FakeStore::default();
        let mut session = Session::new(SessionKind::Items);

        let first = open(&mut session, &store, CollectionId::Main);
        session.close(&store);
        let second = open(&mut session, &store, CollectionId::Main);

        assert_ne!(first, second);
        assert!(session.on_snapshot(first, &Snapshot::absent()).is_none());
    }
}
