//! Session routes around the callback
//!
//! Endpoints:
//! - GET  /login/{client}?url=...  remember the requested URL, redirect to the provider
//! - GET  /profiles                profiles authenticated in the current session
//! - POST /logout                  drop the profiles from the session

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;

use auth_client::{CallbackContext, CallbackRequest};
use callback_engine::{profile_store, requested_url};

use crate::AppState;
use crate::error::ApiError;
use crate::filter::{action_response, with_session_cookie};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/{client}", get(login))
        .route("/profiles", get(list_profiles))
        .route("/logout", post(logout))
}

#[derive(Deserialize)]
struct LoginQuery {
    url: Option<String>,
}

/// Context bound to the browser's session cookie, without parameters.
fn session_context(state: &AppState, jar: &CookieJar, method: &str, path: &str) -> CallbackContext {
    let mut request = CallbackRequest::new(method, path);
    request.session_id = state.cookie.read(jar);
    CallbackContext::new(
        request,
        state.engine.configuration().session_store().clone(),
    )
}

/// Only same-site paths may be remembered, so the callback cannot be turned
/// into an open redirect. Browsers drop tab, CR and LF while parsing a
/// `Location`, so control characters are rejected outright.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && !url.contains('\\')
        && !url.chars().any(char::is_control)
}

/// GET /login/{client} — start a login with the named client.
async fn login(
    State(state): State<AppState>,
    Path(client_name): Path<String>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let client = state
        .engine
        .configuration()
        .find_client(&client_name)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("no client named {client_name}")))?;

    let mut ctx = session_context(&state, &jar, "GET", &format!("/login/{client_name}"));

    if let Some(url) = query.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !is_local_path(url) {
            return Err(ApiError::bad_request(
                "url must be a path on this site, e.g. /account",
            ));
        }
        requested_url::remember(&mut ctx, url).await?;
    }

    let action = client.redirect(&mut ctx).await?;
    info!(
        client = %client.name(),
        protocol = client.protocol().label(),
        "login initiated"
    );
    Ok(with_session_cookie(&state, jar, &ctx, action_response(&action)))
}

/// GET /profiles — list the profiles stored in the session.
async fn list_profiles(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = session_context(&state, &jar, "GET", "/profiles");
    let profiles = profile_store::retrieve_all(&ctx).await?;

    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "profiles": profiles }).to_string(),
    ))
}

/// POST /logout — remove every profile and end the session.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = session_context(&state, &jar, "POST", "/logout");
    profile_store::clear(&ctx).await?;
    if let Some(id) = ctx.session_id() {
        ctx.session_store().invalidate(id).await?;
    }
    info!("session ended");

    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "status": "logged_out" }).to_string(),
    ))
}
