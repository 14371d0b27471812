//! Indirect form client
//!
//! The browser is sent to an external login page; the page posts `username`
//! and `password` back to the callback URL (with `client_name` set to this
//! client). Bad or missing credentials send the browser back to the login
//! page with an `error` parameter instead of failing the request, which is
//! the "redirect again mid-protocol" case of `HandshakeOutcome::Action`.
//!
//! Passwords are configured as SHA-256 hex digests, never in clear.

use std::collections::HashMap;

use session_store::{BoxFuture, SessionError};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{CallbackContext, Client, HandshakeOutcome, HttpAction, Protocol, UserProfile};

pub const USERNAME_PARAMETER: &str = "username";
pub const PASSWORD_PARAMETER: &str = "password";
pub const ERROR_PARAMETER: &str = "error";
pub const MISSING_FIELD_ERROR: &str = "missing_field";
pub const INVALID_CREDENTIALS_ERROR: &str = "invalid_credentials";

/// Lowercase hex SHA-256 of a password, the format `FormClient` users are
/// configured with.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Same length as a real digest but outside the hex alphabet.
const UNKNOWN_USER_DIGEST: &str =
    "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";

/// Compare two digests without short-circuiting on the first differing byte.
fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

pub struct FormClient {
    name: String,
    login_url: String,
    /// username -> password digest
    users: HashMap<String, String>,
}

impl FormClient {
    pub fn new(name: impl Into<String>, login_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login_url: login_url.into(),
            users: HashMap::new(),
        }
    }

    pub fn with_user(mut self, username: impl Into<String>, password_sha256: &str) -> Self {
        self.users
            .insert(username.into(), password_sha256.trim().to_ascii_lowercase());
        self
    }

    /// Login page URL carrying an error code for the page to display.
    fn back_to_login(&self, error: &str) -> HttpAction {
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        HttpAction::redirect(format!(
            "{}{separator}{ERROR_PARAMETER}={error}",
            self.login_url
        ))
    }

    /// Unknown users are checked against a digest no password produces, so
    /// both failures take the same path.
    fn authenticate(&self, username: &str, password: &str) -> Option<UserProfile> {
        let (expected, known) = match self.users.get(username) {
            Some(digest) => (digest.as_str(), true),
            None => (UNKNOWN_USER_DIGEST, false),
        };
        let matches = digests_match(expected, &password_digest(password));
        (known && matches)
            .then(|| UserProfile::new(username, &self.name).with_attribute("username", username))
    }
}

impl Client for FormClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Form
    }

    fn redirect<'a>(
        &'a self,
        _ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, Result<HttpAction, SessionError>> {
        Box::pin(async move { Ok(HttpAction::redirect(self.login_url.clone())) })
    }

    fn complete_handshake<'a>(
        &'a self,
        ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, HandshakeOutcome> {
        Box::pin(async move {
            let (Some(username), Some(password)) = (
                ctx.parameter(USERNAME_PARAMETER),
                ctx.parameter(PASSWORD_PARAMETER),
            ) else {
                debug!(client = %self.name, "form post without credentials");
                return HandshakeOutcome::Action(self.back_to_login(MISSING_FIELD_ERROR));
            };

            match self.authenticate(username, password) {
                Some(profile) => {
                    info!(client = %self.name, user = %username, "form credentials accepted");
                    HandshakeOutcome::Authenticated(profile)
                }
                None => {
                    info!(client = %self.name, user = %username, "form credentials rejected");
                    HandshakeOutcome::Action(self.back_to_login(INVALID_CREDENTIALS_ERROR))
                }
            }
        })
    }
}
