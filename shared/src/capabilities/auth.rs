use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::AuthErrorCode;
use crate::model::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum AuthOperation {
    /// Long-lived: resolved with `AuthResponse::State` on every auth change.
    WatchState,
    SignInWithPopup,
    SignOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl AuthFailure {
    pub fn code(&self) -> AuthErrorCode {
        AuthErrorCode::parse(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthResponse {
    State(Option<User>),
    SignedIn,
    Failed(AuthFailure),
}

impl Operation for AuthOperation {
    type Output = AuthResponse;
}

pub struct Auth<Ev> {
    context: CapabilityContext<AuthOperation, Ev>,
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = AuthOperation;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Auth::new(self.context.map_event(f))
    }
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn watch_state<F>(&self, make_event: F)
    where
        F: Fn(Option<User>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut changes = ctx.stream_from_shell(AuthOperation::WatchState);
            while let Some(response) = changes.next().await {
                if let AuthResponse::State(user) = response {
                    ctx.update_app(make_event(user));
                }
            }
        });
    }

    pub fn sign_in<F>(&self, make_event: F)
    where
        F: FnOnce(Result<(), AuthFailure>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(AuthOperation::SignInWithPopup).await {
                AuthResponse::Failed(failure) => Err(failure),
                AuthResponse::SignedIn | AuthResponse::State(_) => Ok(()),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn sign_out(&self) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(AuthOperation::SignOut).await;
        });
    }
}
