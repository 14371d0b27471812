//! Error types for callback processing

use auth_client::HttpAction;
use session_store::SessionError;

/// Errors from configuring or running the callback engine.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("no configuration bound to the callback engine")]
    MissingConfiguration,

    #[error("duplicate client name: {0}")]
    DuplicateClient(String),

    #[error("no client found for name: {0}")]
    NoClientFound(String),

    #[error("cannot select a client implicitly among {0} registered clients")]
    AmbiguousClient(usize),

    #[error("client {0} is not an indirect client and cannot complete a callback")]
    DirectClient(String),

    #[error("no requested URL in session and no default URL configured")]
    NoRedirectTarget,

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("session renewal failed: {0}")]
    SessionRenewal(#[source] SessionError),
}

impl CallbackError {
    /// HTTP action for errors caused by the request; `None` for server-side
    /// failures.
    pub fn http_action(&self) -> Option<HttpAction> {
        match self {
            CallbackError::NoClientFound(_)
            | CallbackError::AmbiguousClient(_)
            | CallbackError::DirectClient(_)
            | CallbackError::NoRedirectTarget => Some(HttpAction::BadRequest),
            CallbackError::MissingConfiguration
            | CallbackError::DuplicateClient(_)
            | CallbackError::Session(_)
            | CallbackError::SessionRenewal(_) => None,
        }
    }

    /// Stable label for logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            CallbackError::MissingConfiguration => "missing_configuration",
            CallbackError::DuplicateClient(_) => "duplicate_client",
            CallbackError::NoClientFound(_) => "no_client_found",
            CallbackError::AmbiguousClient(_) => "ambiguous_client",
            CallbackError::DirectClient(_) => "direct_client",
            CallbackError::NoRedirectTarget => "no_redirect_target",
            CallbackError::Session(_) => "session_error",
            CallbackError::SessionRenewal(_) => "session_renewal_failed",
        }
    }
}

/// Result alias for callback operations.
pub type Result<T> = std::result::Result<T, CallbackError>;
