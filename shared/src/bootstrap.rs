//! Picking the first collection to show after sign-in.

use tracing::{debug, info, warn};

use crate::paths::CollectionId;
use crate::store::{ReadToken, Snapshot, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BootstrapState {
    #[default]
    Idle,
    LoadingPreference { token: ReadToken },
    VerifyingList { token: ReadToken, list_id: String },
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStep {
    /// One-shot read of the remembered list's metadata.
    VerifyList { token: ReadToken, list_id: String },
    Select {
        collection: CollectionId,
        clear_persisted: bool,
    },
}

/// Read remembered list id, confirm it still exists, select it; anything
/// unexpected falls back to the main list.
///
/// Every step carries a token so a read that completes after the bootstrap was
/// cancelled or restarted is ignored.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    state: BootstrapState,
    last_token: u64,
}

impl Bootstrap {
    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            BootstrapState::LoadingPreference { .. } | BootstrapState::VerifyingList { .. }
        )
    }

    /// Starts over and returns the token for the preference read.
    pub fn start(&mut self) -> ReadToken {
        let token = self.next_token();
        debug!(%token, "bootstrap started");
        self.state = BootstrapState::LoadingPreference { token };
        token
    }

    pub fn cancel(&mut self) {
        if self.is_pending() {
            debug!(state = ?self.state, "bootstrap cancelled");
        }
        self.state = BootstrapState::Idle;
    }

    pub fn on_preference(&mut self, token: ReadToken, stored: Option<String>) -> Option<BootstrapStep> {
        if self.state != (BootstrapState::LoadingPreference { token }) {
            debug!(%token, "ignoring stale preference read");
            return None;
        }

        match stored.as_deref().map(CollectionId::from_persisted) {
            Some(CollectionId::Custom(list_id)) => {
                let token = self.next_token();
                self.state = BootstrapState::VerifyingList {
                    token,
                    list_id: list_id.clone(),
                };
                Some(BootstrapStep::VerifyList { token, list_id })
            }
            Some(CollectionId::Main) | None => Some(self.finish(CollectionId::Main, false)),
        }
    }

    pub fn on_meta_read(
        &mut self,
        token: ReadToken,
        result: Result<Snapshot, StoreError>,
    ) -> Option<BootstrapStep> {
        let list_id = match &self.state {
            BootstrapState::VerifyingList { token: expected, list_id } if *expected == token => {
                list_id.clone()
            }
            _ => {
                debug!(%token, "ignoring stale list verification");
                return None;
            }
        };

        match result {
            Ok(snapshot) if snapshot.exists() => {
                Some(self.finish(CollectionId::Custom(list_id), false))
            }
            Ok(_) => {
                info!(%list_id, "remembered list no longer exists");
                Some(self.finish(CollectionId::Main, true))
            }
            Err(error) => {
                warn!(%list_id, code = %error.code, "could not verify remembered list");
                Some(self.finish(CollectionId::Main, false))
            }
        }
    }

    fn finish(&mut self, collection: CollectionId, clear_persisted: bool) -> BootstrapStep {
        self.state = BootstrapState::Done;
        BootstrapStep::Select {
            collection,
            clear_persisted,
        }
    }

    fn next_token(&mut self) -> ReadToken {
        self.last_token += 1;
        ReadToken(self.last_token)
    }
}
