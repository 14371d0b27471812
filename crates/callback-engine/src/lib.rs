//! Authentication callback completion
//!
//! Finalizes an indirect login when the identity provider sends the browser
//! back to the application:
//!
//! 1. `PathDecision` gates the request on the callback path suffix
//! 2. `resolver::resolve()` picks the registered client for the request
//! 3. The client completes its protocol handshake (`auth_client::Client`)
//! 4. `profile_store::save()` persists the profile (single or multi-profile)
//! 5. `renewer::renew()` rotates the session identifier against fixation
//! 6. `CallbackEngine` picks the redirect target and emits the HTTP action

pub mod config;
pub mod engine;
pub mod error;
pub mod options;
pub mod path;
pub mod profile_store;
pub mod renewer;
pub mod requested_url;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Configuration, ConfigurationBuilder};
pub use engine::{CallbackEngine, CallbackEngineBuilder};
pub use error::{CallbackError, Result};
pub use options::CallbackOptions;
pub use path::{DEFAULT_CALLBACK_SUFFIX, PathDecision, applies};
pub use profile_store::PROFILES_KEY;
pub use requested_url::REQUESTED_URL_KEY;
