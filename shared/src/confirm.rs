use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationId(pub Uuid);

impl ConfirmationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConfirmationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmOutcome {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation<A> {
    pub id: ConfirmationId,
    pub prompt: String,
    pub action: A,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<A> {
    pub id: ConfirmationId,
    pub action: A,
    pub outcome: ConfirmOutcome,
}

/// The one question the modal may be asking.
///
/// Opening a new request while another is pending resolves the older one as
/// cancelled, so no request is ever left hanging.
#[derive(Debug, Clone)]
pub struct ConfirmSlot<A> {
    pending: Option<PendingConfirmation<A>>,
}

impl<A> Default for ConfirmSlot<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A: fmt::Debug> ConfirmSlot<A> {
    pub fn pending(&self) -> Option<&PendingConfirmation<A>> {
        self.pending.as_ref()
    }

    pub fn open(
        &mut self,
        action: A,
        prompt: impl Into<String>,
    ) -> (ConfirmationId, Option<Resolution<A>>) {
        let superseded = self.cancel();
        let id = ConfirmationId::new();
        self.pending = Some(PendingConfirmation {
            id,
            prompt: prompt.into(),
            action,
        });
        (id, superseded)
    }

    /// Answers the pending request. Answers for any other id are ignored.
    pub fn resolve(&mut self, id: ConfirmationId, confirmed: bool) -> Option<Resolution<A>> {
        if self.pending.as_ref().map(|p| p.id) != Some(id) {
            debug!(%id, "ignoring answer for a request that is no longer pending");
            return None;
        }

        self.pending.take().map(|p| Resolution {
            id: p.id,
            action: p.action,
            outcome: if confirmed {
                ConfirmOutcome::Confirmed
            } else {
                ConfirmOutcome::Cancelled
            },
        })
    }

    pub fn cancel(&mut self) -> Option<Resolution<A>> {
        self.pending.take().map(|p| {
            debug!(id = %p.id, action = ?p.action, "confirmation cancelled");
            Resolution {
                id: p.id,
                action: p.action,
                outcome: ConfirmOutcome::Cancelled,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_pending_request() {
        let mut slot = ConfirmSlot::default();
        let (id, superseded) = slot.open("delete L1", "Delete list?");
        assert!(superseded.is_none());
        assert_eq!(slot.pending().map(|p| p.prompt.as_str()), Some("Delete list?"));

        let resolution = slot.resolve(id, true).unwrap();
        assert_eq!(resolution.action, "delete L1");
        assert_eq!(resolution.outcome, ConfirmOutcome::Confirmed);
        assert!(slot.pending().is_none());
    }

    #[test]
    fn opening_again_cancels_previous() {
        let mut slot = ConfirmSlot::default();
        let (first, _) = slot.open("delete L1", "Delete L1?");
        let (second, superseded) = slot.open("delete L2", "Delete L2?");

        let superseded = superseded.unwrap();
        assert_eq!(superseded.id, first);
        assert_eq!(superseded.outcome, ConfirmOutcome::Cancelled);

        assert!(slot.resolve(first, true).is_none());
        assert_eq!(slot.resolve(second, true).unwrap().action, "delete L2");
    }

    #[test]
    fn declining_and_cancelling() {
        let mut slot = ConfirmSlot::default();
        let (id, _) = slot.open(1, "?");
        assert_eq!(slot.resolve(id, false).unwrap().outcome, ConfirmOutcome::Cancelled);
        assert!(slot.resolve(id, true).is_none());

        slot.open(2, "?");
        assert_eq!(slot.cancel().map(|r| r.action), Some(2));
        assert!(slot.cancel().is_none());
    }
}
