//! `Client` implementation for OAuth 2.0 providers

use common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use session_store::{BoxFuture, SessionError};
use tracing::{debug, info, warn};

use auth_client::{CallbackContext, Client, HandshakeOutcome, HttpAction, Protocol, UserProfile};

use crate::error::{Error, Result};
use crate::pkce::{compute_challenge, generate_state, generate_verifier, state_matches};
use crate::token::{exchange_code, fetch_user_info};

/// Provider endpoints and client registration.
#[derive(Debug, Clone)]
pub struct OAuth2Settings {
    pub name: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    /// Absent for public clients that rely on PKCE only
    pub client_secret: Option<Secret<String>>,
    /// Callback URL registered with the provider, normally
    /// `<base>/callback?client_name=<name>`
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// User info member holding the stable user identifier
    pub id_attribute: String,
}

/// Login state kept in the session between `redirect` and the callback.
#[derive(Debug, Serialize, Deserialize)]
struct PendingAuthorization {
    state: String,
    verifier: String,
}

pub struct OAuth2Client {
    settings: OAuth2Settings,
    http: reqwest::Client,
}

impl OAuth2Client {
    /// Validates the configured endpoint URLs up front so a typo fails at
    /// startup rather than on the first login.
    pub fn new(settings: OAuth2Settings, http: reqwest::Client) -> Result<Self> {
        for url in [
            &settings.authorize_url,
            &settings.token_url,
            &settings.userinfo_url,
            &settings.redirect_uri,
        ] {
            reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self { settings, http })
    }

    fn pending_key(&self) -> String {
        format!("oauth2.{}.pending", self.settings.name)
    }

    /// Authorization endpoint URL with all request parameters.
    pub fn authorization_url(&self, state: &str, challenge: &str) -> Result<String> {
        let mut url =
            reqwest::Url::parse(&self.settings.authorize_url).map_err(|e| Error::InvalidUrl {
                url: self.settings.authorize_url.clone(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url.into())
    }

    /// Code exchange plus user info lookup, producing the profile.
    async fn authenticate(&self, code: &str, verifier: &str) -> Result<UserProfile> {
        let token = exchange_code(&self.http, &self.settings, code, verifier).await?;
        let attributes =
            fetch_user_info(&self.http, &self.settings.userinfo_url, &token.access_token).await?;

        let id = match attributes.get(&self.settings.id_attribute) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::UserInfo(format!(
                    "user info has no usable '{}' member",
                    self.settings.id_attribute
                )));
            }
        };

        Ok(UserProfile::new(id, &self.settings.name).with_attributes(attributes))
    }
}

impl Client for OAuth2Client {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::OAuth2
    }

    fn redirect<'a>(
        &'a self,
        ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, std::result::Result<HttpAction, SessionError>> {
        Box::pin(async move {
            let pending = PendingAuthorization {
                state: generate_state(),
                verifier: generate_verifier(),
            };
            let challenge = compute_challenge(&pending.verifier);

            let location = match self.authorization_url(&pending.state, &challenge) {
                Ok(url) => url,
                Err(e) => {
                    // URLs are validated in new(); only reachable if settings were mutated
                    warn!(client = %self.settings.name, error = %e, "cannot build authorization URL");
                    return Ok(HttpAction::BadRequest);
                }
            };

            ctx.session_set_as(&self.pending_key(), &pending).await?;
            debug!(client = %self.settings.name, "authorization request prepared");
            Ok(HttpAction::redirect(location))
        })
    }

    fn complete_handshake<'a>(
        &'a self,
        ctx: &'a mut CallbackContext,
    ) -> BoxFuture<'a, HandshakeOutcome> {
        Box::pin(async move {
            let name = &self.settings.name;

            if let Some(error) = ctx.parameter("error") {
                let description = ctx.parameter("error_description").unwrap_or("none");
                warn!(client = %name, error, description, "provider returned error on callback");
                return HandshakeOutcome::Action(HttpAction::Forbidden);
            }

            let (Some(code), Some(state)) = (ctx.parameter("code"), ctx.parameter("state")) else {
                warn!(client = %name, "callback missing code or state");
                return HandshakeOutcome::Action(HttpAction::BadRequest);
            };
            let (code, state) = (code.to_owned(), state.to_owned());

            let key = self.pending_key();
            let pending = match ctx.session_get_as::<PendingAuthorization>(&key).await {
                Ok(Some(p)) => p,
                Ok(None) => {
                    warn!(client = %name, "no pending authorization in session");
                    return HandshakeOutcome::Action(HttpAction::BadRequest);
                }
                Err(e) => {
                    warn!(client = %name, error = %e, "unreadable pending authorization");
                    return HandshakeOutcome::Action(HttpAction::BadRequest);
                }
            };

            if !state_matches(&pending.state, &state) {
                warn!(client = %name, "state mismatch on callback");
                return HandshakeOutcome::Action(HttpAction::BadRequest);
            }

            let profile = match self.authenticate(&code, &pending.verifier).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(client = %name, error = %e, "OAuth handshake failed");
                    return HandshakeOutcome::Action(HttpAction::Forbidden);
                }
            };

            // One-shot: the code has been redeemed, drop the verifier
            if let Err(e) = ctx.session_remove(&key).await {
                warn!(client = %name, error = %e, "failed to clear pending authorization");
            }

            info!(client = %name, user = %profile.id(), "OAuth handshake completed");
            HandshakeOutcome::Authenticated(profile)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_client::CallbackRequest;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use session_store::{MemorySessionStore, SessionId, SessionStore};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Mock provider: token endpoint accepts code "good-code", user info
    /// returns a numeric id like GitHub does.
    async fn start_provider() -> String {
        let app = Router::new()
            .route(
                "/token",
                post(|axum::Form(form): axum::Form<HashMap<String, String>>| async move {
                    if form.get("code").map(String::as_str) == Some("good-code") {
                        (StatusCode::OK, axum::Json(serde_json::json!({"access_token": "at_ok"})))
                    } else {
                        (StatusCode::BAD_REQUEST, axum::Json(serde_json::json!({"error": "invalid_grant"})))
                    }
                }),
            )
            .route(
                "/userinfo",
                get(|| async { axum::Json(serde_json::json!({"id": 1234, "login": "octocat"})) }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> OAuth2Client {
        OAuth2Client::new(
            OAuth2Settings {
                name: "github".into(),
                authorize_url: format!("{base}/authorize"),
                token_url: format!("{base}/token"),
                userinfo_url: format!("{base}/userinfo"),
                client_id: "cid".into(),
                client_secret: None,
                redirect_uri: "http://app.local/callback?client_name=github".into(),
                scopes: vec!["read:user".into(), "user:email".into()],
                id_attribute: "id".into(),
            },
            reqwest::Client::new(),
        )
        .unwrap()
    }

    fn store() -> Arc<dyn SessionStore> {
        Arc::new(MemorySessionStore::new(Duration::from_secs(300)))
    }

    /// Run redirect() and return the session id plus the issued state.
    async fn begin_login(client: &OAuth2Client, store: &Arc<dyn SessionStore>) -> (SessionId, String) {
        let mut ctx = CallbackContext::new(CallbackRequest::new("GET", "/login/github"), store.clone());
        let action = client.redirect(&mut ctx).await.unwrap();
        let location = reqwest::Url::parse(action.location().unwrap()).unwrap();
        let state = location
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        (ctx.session_id().cloned().unwrap(), state)
    }

    fn callback_ctx(store: &Arc<dyn SessionStore>, session: &SessionId, params: &[(&str, &str)]) -> CallbackContext {
        let mut request = CallbackRequest::new("GET", "/callback").with_session(session.clone());
        for (k, v) in params {
            request = request.with_parameter(*k, *v);
        }
        CallbackContext::new(request, store.clone())
    }

    #[test]
    fn rejects_malformed_endpoint() {
        let result = OAuth2Client::new(
            OAuth2Settings {
                name: "bad".into(),
                authorize_url: "not a url".into(),
                token_url: "http://t".into(),
                userinfo_url: "http://u".into(),
                client_id: "c".into(),
                client_secret: None,
                redirect_uri: "http://r".into(),
                scopes: vec![],
                id_attribute: "sub".into(),
            },
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn authorization_url_contains_required_params() {
        let client = client("https://idp.example");
        let url = client.authorization_url("st-1", "ch-1").unwrap();

        assert!(url.starts_with("https://idp.example/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("state=st-1"));
        assert!(url.contains("code_challenge=ch-1"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("scope=read%3Auser+user%3Aemail"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Fapp.local%2Fcallback%3Fclient_name%3Dgithub"));
    }

    #[tokio::test]
    async fn full_handshake_produces_profile_and_clears_pending_state() {
        let base = start_provider().await;
        let client = client(&base);
        let store = store();
        let (session, state) = begin_login(&client, &store).await;

        let mut ctx = callback_ctx(&store, &session, &[("code", "good-code"), ("state", state.as_str())]);
        let outcome = client.complete_handshake(&mut ctx).await;

        let HandshakeOutcome::Authenticated(profile) = outcome else {
            panic!("expected profile, got {outcome:?}");
        };
        assert_eq!(profile.id(), "1234");
        assert_eq!(profile.client_name(), "github");
        assert_eq!(profile.attribute("login"), Some(&serde_json::json!("octocat")));
        assert_eq!(store.get(&session, "oauth2.github.pending").await.unwrap(), None);
    }

    #[tokio::test]
    async fn state_mismatch_is_bad_request_and_keeps_pending_state() {
        let base = start_provider().await;
        let client = client(&base);
        let store = store();
        let (session, _state) = begin_login(&client, &store).await;

        let mut ctx = callback_ctx(&store, &session, &[("code", "good-code"), ("state", "forged")]);
        assert_eq!(
            client.complete_handshake(&mut ctx).await,
            HandshakeOutcome::Action(HttpAction::BadRequest)
        );
        assert!(store.get(&session, "oauth2.github.pending").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn provider_error_parameter_is_forbidden() {
        let client = client("https://idp.example");
        let store = store();
        let session = store.create().await.unwrap();

        let mut ctx = callback_ctx(&store, &session, &[("error", "access_denied")]);
        assert_eq!(
            client.complete_handshake(&mut ctx).await,
            HandshakeOutcome::Action(HttpAction::Forbidden)
        );
    }

    #[tokio::test]
    async fn callback_without_login_is_bad_request() {
        let client = client("https://idp.example");
        let store = store();
        let session = store.create().await.unwrap();

        let mut ctx = callback_ctx(&store, &session, &[("code", "c"), ("state", "s")]);
        assert_eq!(
            client.complete_handshake(&mut ctx).await,
            HandshakeOutcome::Action(HttpAction::BadRequest)
        );
    }

    #[tokio::test]
    async fn rejected_code_is_forbidden() {
        let base = start_provider().await;
        let client = client(&base);
        let store = store();
        let (session, state) = begin_login(&client, &store).await;

        let mut ctx = callback_ctx(&store, &session, &[("code", "bad-code"), ("state", state.as_str())]);
        assert_eq!(
            client.complete_handshake(&mut ctx).await,
            HandshakeOutcome::Action(HttpAction::Forbidden)
        );
    }
}
