//! Test doubles shared by the unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use auth_client::{
    CallbackContext, CallbackRequest, Client, HandshakeOutcome, HttpAction, Protocol, UserProfile,
};
use serde_json::Value;
use session_store::{BoxFuture, MemorySessionStore, Result, SessionError, SessionId, SessionStore};

pub(crate) fn memory_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new(Duration::from_secs(300)))
}

pub(crate) fn context(store: &Arc<dyn SessionStore>, params: &[(&str, &str)]) -> CallbackContext {
    let mut request = CallbackRequest::new("GET", "/callback");
    for (name, value) in params {
        request = request.with_parameter(*name, *value);
    }
    CallbackContext::new(request, store.clone())
}

pub(crate) fn context_with_session(
    store: &Arc<dyn SessionStore>,
    session: &SessionId,
    params: &[(&str, &str)],
) -> CallbackContext {
    let mut request = CallbackRequest::new("GET", "/callback").with_session(session.clone());
    for (name, value) in params {
        request = request.with_parameter(*name, *value);
    }
    CallbackContext::new(request, store.clone())
}

/// Client whose handshake always yields the same outcome.
pub(crate) struct StubClient {
    name: String,
    outcome: HandshakeOutcome,
    indirect: bool,
    renewals: AtomicUsize,
}

impl StubClient {
    pub(crate) fn authenticating(name: &str, user_id: &str) -> Self {
        Self::with_outcome(
            name,
            HandshakeOutcome::Authenticated(UserProfile::new(user_id, name)),
        )
    }

    pub(crate) fn failing(name: &str, action: HttpAction) -> Self {
        Self::with_outcome(name, HandshakeOutcome::Action(action))
    }

    fn with_outcome(name: &str, outcome: HandshakeOutcome) -> Self {
        Self {
            name: name.to_owned(),
            outcome,
            indirect: true,
            renewals: AtomicUsize::new(0),
        }
    }

    pub(crate) fn direct(mut self) -> Self {
        self.indirect = false;
        self
    }

    pub(crate) fn renewals(&self) -> usize {
        self.renewals.load(Ordering::SeqCst)
    }
}

impl Client for StubClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::OAuth2
    }

    fn is_indirect(&self) -> bool {
        self.indirect
    }

    fn redirect<'a>(
        &'a self,
        _ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, std::result::Result<HttpAction, SessionError>> {
        Box::pin(async move { Ok(HttpAction::redirect(format!("https://idp.test/{}", self.name))) })
    }

    fn complete_handshake<'a>(
        &'a self,
        _ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, HandshakeOutcome> {
        Box::pin(async move { self.outcome.clone() })
    }

    fn session_renewed<'a>(
        &'a self,
        _old_session: &'a SessionId,
        _ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.renewals.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// In-memory store that refuses to rotate identifiers.
pub(crate) struct NoRenewStore {
    inner: MemorySessionStore,
}

impl NoRenewStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(Duration::from_secs(300)),
        }
    }
}

impl SessionStore for NoRenewStore {
    fn create(&self) -> BoxFuture<'_, Result<SessionId>> {
        self.inner.create()
    }

    fn exists<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, bool> {
        self.inner.exists(id)
    }

    fn get<'a>(&'a self, id: &'a SessionId, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        self.inner.get(id, key)
    }

    fn set<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<()>> {
        self.inner.set(id, key, value)
    }

    fn remove<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        self.inner.remove(id, key)
    }

    fn renew<'a>(&'a self, _id: &'a SessionId) -> BoxFuture<'a, Result<SessionId>> {
        Box::pin(async { Err(SessionError::Unsupported("renew")) })
    }

    fn invalidate<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<()>> {
        self.inner.invalidate(id)
    }
}
