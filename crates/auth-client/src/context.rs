//! Per-request working context
//!
//! `CallbackContext` binds the inbound request to the shared session store.
//! The bound session identifier starts as whatever the browser sent and can
//! change in two ways: lazy creation on the first write (when the browser
//! sent no identifier, or one the store does not know), and renewal after
//! login. The host compares the final identifier with the inbound one to
//! decide whether to re-issue the session cookie.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use session_store::{Result, SessionError, SessionId, SessionStore};
use tracing::debug;

use crate::profile::UserProfile;

/// Request parameter naming the client that should process the callback.
pub const CLIENT_NAME_PARAMETER: &str = "client_name";

/// Normalized inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub method: String,
    pub path: String,
    /// Query and form body parameters, body values winning on conflict
    pub parameters: HashMap<String, String>,
    /// Session identifier sent by the browser, if any
    pub session_id: Option<SessionId>,
}

impl CallbackRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_session(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

pub struct CallbackContext {
    request: CallbackRequest,
    store: Arc<dyn SessionStore>,
    session_id: Option<SessionId>,
    request_profiles: Vec<UserProfile>,
}

impl CallbackContext {
    pub fn new(request: CallbackRequest, store: Arc<dyn SessionStore>) -> Self {
        let session_id = request.session_id.clone();
        Self {
            request,
            store,
            session_id,
            request_profiles: Vec::new(),
        }
    }

    pub fn request(&self) -> &CallbackRequest {
        &self.request
    }

    /// Request parameter, `None` when missing or blank.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.request
            .parameter(name)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Identifier currently bound to this request.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether the bound identifier differs from the one the browser sent.
    pub fn session_changed(&self) -> bool {
        self.session_id != self.request.session_id
    }

    /// Rebind the context to another identifier (after renewal).
    pub fn bind_session(&mut self, id: SessionId) {
        self.session_id = Some(id);
    }

    /// Return the bound session, creating one if none is bound or the bound
    /// identifier is unknown to the store.
    pub async fn ensure_session(&mut self) -> Result<SessionId> {
        if let Some(id) = &self.session_id {
            if self.store.exists(id).await {
                return Ok(id.clone());
            }
        }
        let id = self.store.create().await?;
        debug!(session = id.redacted(), "bound new session to request");
        self.session_id = Some(id.clone());
        Ok(id)
    }

    pub async fn session_get(&self, key: &str) -> Result<Option<Value>> {
        match &self.session_id {
            Some(id) => self.store.get(id, key).await,
            None => Ok(None),
        }
    }

    pub async fn session_get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.session_get(key).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SessionError::Serialization {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }

    pub async fn session_set(&mut self, key: &str, value: Value) -> Result<()> {
        let id = self.ensure_session().await?;
        self.store.set(&id, key, value).await
    }

    pub async fn session_set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| SessionError::Serialization {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
        self.session_set(key, value).await
    }

    pub async fn session_remove(&self, key: &str) -> Result<Option<Value>> {
        match &self.session_id {
            Some(id) => self.store.remove(id, key).await,
            None => Ok(None),
        }
    }

    /// Profiles authenticated during this request, whether or not they were
    /// persisted in the session.
    pub fn request_profiles(&self) -> &[UserProfile] {
        &self.request_profiles
    }

    pub fn add_request_profile(&mut self, profile: UserProfile) {
        self.request_profiles
            .retain(|p| p.client_name() != profile.client_name());
        self.request_profiles.push(profile);
    }
}
