use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Your email may not be on the allowed list.";
pub const UNAVAILABLE_MESSAGE: &str = "Couldn't reach the list. Changes will appear when you're back online.";
pub const UNAUTHORIZED_DOMAIN_MESSAGE: &str =
    "This domain isn't authorized for sign-in. Add it to the authorized domains of the project.";
pub const SIGN_IN_FAILED_MESSAGE: &str = "Couldn't sign in. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthErrorCode {
    PopupClosedByUser,
    CancelledPopupRequest,
    PopupBlocked,
    UnauthorizedDomain,
    Other(String),
}

impl AuthErrorCode {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "auth/popup-closed-by-user" => Self::PopupClosedByUser,
            "auth/cancelled-popup-request" => Self::CancelledPopupRequest,
            "auth/popup-blocked" => Self::PopupBlocked,
            "auth/unauthorized-domain" => Self::UnauthorizedDomain,
            other => Self::Other(other.to_string()),
        }
    }

    /// Failures the user caused on purpose produce no alert.
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::PopupClosedByUser | Self::CancelledPopupRequest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AccessDenied,
    TransientReadFailure,
    SignInFailed,
    UnauthorizedDomain,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AccessDenied => "ACCESS_DENIED",
            Self::TransientReadFailure => "TRANSIENT_READ_FAILURE",
            Self::SignInFailed => "SIGN_IN_FAILED",
            Self::UnauthorizedDomain => "UNAUTHORIZED_DOMAIN",
        }
    }

    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::AccessDenied => ACCESS_DENIED_MESSAGE,
            Self::TransientReadFailure => UNAVAILABLE_MESSAGE,
            Self::UnauthorizedDomain => UNAUTHORIZED_DOMAIN_MESSAGE,
            Self::SignInFailed => SIGN_IN_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {message}", .kind.code())]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Maps a sign-in failure to the alert to show, if any.
    pub fn from_sign_in_failure(code: &AuthErrorCode) -> Option<Self> {
        if code.is_silent() {
            return None;
        }
        Some(match code {
            AuthErrorCode::UnauthorizedDomain => {
                Self::new(ErrorKind::UnauthorizedDomain, UNAUTHORIZED_DOMAIN_MESSAGE)
            }
            _ => Self::new(ErrorKind::SignInFailed, SIGN_IN_FAILED_MESSAGE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_failures_map_by_code() {
        assert_eq!(
            AppError::from_sign_in_failure(&AuthErrorCode::parse("auth/popup-closed-by-user")),
            None
        );
        assert_eq!(
            AppError::from_sign_in_failure(&AuthErrorCode::parse("auth/unauthorized-domain"))
                .map(|e| e.kind),
            Some(ErrorKind::UnauthorizedDomain)
        );
        assert_eq!(
            AppError::from_sign_in_failure(&AuthErrorCode::parse("auth/network-request-failed"))
                .map(|e| e.kind),
            Some(ErrorKind::SignInFailed)
        );
        assert!(AuthErrorCode::parse("auth/cancelled-popup-request").is_silent());
        assert!(!AuthErrorCode::parse("auth/popup-blocked").is_silent());
    }

    #[test]
    fn silent_codes_never_alert() {
        for raw in [
            "auth/popup-closed-by-user",
            "auth/cancelled-popup-request",
            "auth/popup-blocked",
            "auth/unauthorized-domain",
            "auth/internal-error",
        ] {
            let code = AuthErrorCode::parse(raw);
            assert_eq!(
                AppError::from_sign_in_failure(&code).is_none(),
                code.is_silent(),
                "{raw}"
            );
        }
    }

    #[test]
    fn display_uses_stable_code() {
        let err = AppError::new(ErrorKind::AccessDenied, "denied");
        assert_eq!(err.to_string(), "ACCESS_DENIED: denied");
    }
}
