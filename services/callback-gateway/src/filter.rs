//! Callback filter
//!
//! axum middleware wrapped around every route. Requests whose path does not
//! end with the callback suffix go straight to the inner router; callbacks
//! are answered here by the engine and never reach a route.

use std::collections::HashMap;
use std::time::Instant;

use auth_client::{CallbackContext, CallbackRequest, HttpAction};
use axum::Form;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, instrument, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::metrics;

pub async fn callback_filter(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if !state.path.applies(request.uri().path()) {
        return next.run(request).await;
    }
    handle_callback(state, jar, request).await
}

#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
async fn handle_callback(state: AppState, jar: CookieJar, request: Request) -> Response {
    let start = Instant::now();

    let callback_request = match read_request(&state, &jar, request).await {
        Ok(r) => r,
        Err(e) => {
            metrics::record_callback("bad_request", start.elapsed().as_secs_f64());
            state.stats.record(true);
            return e.into_response();
        }
    };

    let store = state.engine.configuration().session_store().clone();
    let mut ctx = CallbackContext::new(callback_request, store);
    let result = state.engine.perform(&mut ctx).await;

    let (outcome, failed, response) = match result {
        Ok(action) => (action.label(), false, action_response(&action)),
        Err(e) => match e.http_action() {
            Some(action) => {
                warn!(error = %e, "callback rejected");
                let response = match action {
                    HttpAction::BadRequest => ApiError::bad_request(e.to_string()).into_response(),
                    other => action_response(&other),
                };
                (e.label(), true, response)
            }
            None => {
                error!(error = %e, "callback failed");
                (e.label(), true, ApiError::internal(e.to_string()).into_response())
            }
        },
    };

    metrics::record_callback(outcome, start.elapsed().as_secs_f64());
    state.stats.record(failed);
    info!(outcome, status = response.status().as_u16(), "callback answered");

    with_session_cookie(&state, jar, &ctx, response)
}

/// Normalize method, path, query and form body parameters (body wins) and
/// the session cookie into a `CallbackRequest`.
async fn read_request(
    state: &AppState,
    jar: &CookieJar,
    request: Request,
) -> Result<CallbackRequest, ApiError> {
    let mut callback_request =
        CallbackRequest::new(request.method().as_str(), request.uri().path());

    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map_err(|e| ApiError::bad_request(format!("invalid query string: {e}")))?;
    callback_request.parameters = query;

    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    if is_form && request.method() != axum::http::Method::GET {
        let Form(body) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(format!("invalid form body: {e}")))?;
        callback_request.parameters.extend(body);
    }

    callback_request.session_id = state.cookie.read(jar);
    Ok(callback_request)
}

/// Translate an engine or client action into an HTTP response.
pub fn action_response(action: &HttpAction) -> Response {
    match action {
        HttpAction::Redirect { location } => {
            (StatusCode::FOUND, [(header::LOCATION, location.clone())]).into_response()
        }
        HttpAction::BadRequest => ApiError::bad_request("bad request").into_response(),
        HttpAction::Forbidden => ApiError::forbidden("forbidden").into_response(),
    }
}

/// Re-issue the session cookie when the request ends bound to a different
/// session than the browser sent (lazy creation or renewal).
pub fn with_session_cookie(
    state: &AppState,
    jar: CookieJar,
    ctx: &CallbackContext,
    response: Response,
) -> Response {
    match ctx.session_id() {
        Some(id) if ctx.session_changed() => (state.cookie.issue(jar, id), response).into_response(),
        _ => response,
    }
}
