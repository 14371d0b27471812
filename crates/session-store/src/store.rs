//! The session store collaborator trait

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::Result;
use crate::id::SessionId;

/// Boxed future returned by dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstraction over session storage backends.
///
/// Reads on an unknown or expired session behave like reads on an empty one
/// (`Ok(None)`); writes to an unknown session fail with `NotFound` so that an
/// identifier chosen by a client is never adopted. Callers create sessions
/// explicitly with `create()`.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn SessionStore>`).
pub trait SessionStore: Send + Sync {
    /// Mint a new, empty session and return its identifier.
    fn create(&self) -> BoxFuture<'_, Result<SessionId>>;

    /// Whether the identifier names a live session.
    fn exists<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, bool>;

    fn get<'a>(&'a self, id: &'a SessionId, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

    fn set<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<()>>;

    /// Remove an attribute, returning its previous value.
    fn remove<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>>;

    /// Move every attribute of `id` to a freshly minted identifier and
    /// invalidate `id`.
    ///
    /// Must be atomic: either the new identifier carries the complete
    /// attribute set and the old one is gone, or an error is returned and the
    /// old session is untouched.
    fn renew<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<SessionId>>;

    /// Drop the session and all its attributes.
    fn invalidate<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<()>>;
}
