//! Token endpoint and user info round-trips
//!
//! 1. Authorization code exchange: POST form to the token endpoint
//! 2. User info: GET the provider's user endpoint with the access token

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::OAuth2Settings;
use crate::error::{Error, Result};

/// Response from the token endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchange an authorization code for tokens.
///
/// Sends the PKCE verifier to prove this party initiated the flow. The client
/// secret is sent in the form body (`client_secret_post`) when configured;
/// public clients rely on PKCE alone.
pub async fn exchange_code(
    http: &reqwest::Client,
    settings: &OAuth2Settings,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("code_verifier", verifier),
        ("client_id", settings.client_id.as_str()),
        ("redirect_uri", settings.redirect_uri.as_str()),
    ];
    if let Some(secret) = &settings.client_secret {
        form.push(("client_secret", secret.expose().as_str()));
    }

    let response = http
        .post(&settings.token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

/// Fetch the user's attributes from the provider.
///
/// The endpoint must answer with a JSON object; its members become the
/// profile attributes.
pub async fn fetch_user_info(
    http: &reqwest::Client,
    userinfo_url: &str,
    access_token: &str,
) -> Result<Map<String, Value>> {
    let response = http
        .get(userinfo_url)
        .bearer_auth(access_token)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::Http(format!("user info request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::UserInfo(format!(
            "user info endpoint returned {status}"
        )));
    }

    match response.json::<Value>().await {
        Ok(Value::Object(attributes)) => Ok(attributes),
        Ok(other) => Err(Error::UserInfo(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::UserInfo(format!("invalid user info response: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
