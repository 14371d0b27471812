//! Client abstraction for indirect authentication protocols
//!
//! Defines the `Client` trait that decouples the callback engine from any
//! particular identity-provider protocol. A client knows how to start a login
//! (`redirect`) and how to finish it when the browser comes back
//! (`complete_handshake`). The engine never interprets protocol details; it
//! only consumes the discriminated `HandshakeOutcome`.

pub mod action;
pub mod context;
pub mod form;
pub mod profile;

pub use action::HttpAction;
pub use context::{CLIENT_NAME_PARAMETER, CallbackContext, CallbackRequest};
pub use form::FormClient;
pub use profile::UserProfile;

use session_store::{BoxFuture, SessionId};

pub use session_store::SessionError;

/// Protocol family of a client, used as a dispatch tag in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    OAuth2,
    Oidc,
    Saml,
    Cas,
    Form,
}

impl Protocol {
    /// Stable label for logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::OAuth2 => "oauth2",
            Protocol::Oidc => "oidc",
            Protocol::Saml => "saml",
            Protocol::Cas => "cas",
            Protocol::Form => "form",
        }
    }
}

/// Result of completing an authentication handshake.
///
/// `Action` covers every non-success: the provider reported an error, the
/// request was malformed, or the client wants to redirect again mid-protocol.
/// The engine passes it through unmodified.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeOutcome {
    Authenticated(UserProfile),
    Action(HttpAction),
}

/// An authentication mechanism selectable on the callback endpoint.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Client>`).
pub trait Client: Send + Sync {
    /// Stable name used for resolution (`client_name` parameter) and as the
    /// key of the profile this client produces.
    fn name(&self) -> &str;

    fn protocol(&self) -> Protocol;

    /// Indirect clients send the browser to an external party and back.
    /// Only those may complete a login on the callback endpoint.
    fn is_indirect(&self) -> bool {
        true
    }

    /// Start a login: build the action that sends the browser to the
    /// identity provider, stashing whatever the protocol needs in the session.
    fn redirect<'a>(
        &'a self,
        ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, Result<HttpAction, SessionError>>;

    /// Finish a login from the callback request.
    ///
    /// On failure the client must leave the session as it found it.
    fn complete_handshake<'a>(
        &'a self,
        ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, HandshakeOutcome>;

    /// Called after the session identifier was rotated following a login.
    ///
    /// Protocols that index server-side state by session id (e.g. back-channel
    /// logout tickets) re-key it here. Default is a no-op.
    fn session_renewed<'a>(
        &'a self,
        _old_session: &'a SessionId,
        _ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}
