//! Finalize-login algorithm
//!
//! `perform` runs once per callback request, after the path gate:
//! 1. Resolve the client
//! 2. Complete its handshake; an `HttpAction` passes through untouched
//! 3. Persist the profile (unless `save_in_session = false`)
//! 4. Rotate the session (unless `renew_session = false`); on failure the
//!    profile state from step 3 is rolled back
//! 5. Redirect to the remembered URL, else the default URL

use std::sync::Arc;

use auth_client::{CallbackContext, HandshakeOutcome, HttpAction};
use serde_json::Value;
use tracing::{Span, info, instrument, warn};

use crate::config::Configuration;
use crate::error::{CallbackError, Result};
use crate::options::CallbackOptions;
use crate::profile_store::{self, PROFILES_KEY};
use crate::{renewer, requested_url, resolver};

#[derive(Debug)]
pub struct CallbackEngine {
    configuration: Arc<Configuration>,
    options: CallbackOptions,
}

#[derive(Debug, Default)]
pub struct CallbackEngineBuilder {
    configuration: Option<Arc<Configuration>>,
    options: CallbackOptions,
}

impl CallbackEngineBuilder {
    pub fn configuration(mut self, configuration: Arc<Configuration>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn options(mut self, options: CallbackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<CallbackEngine> {
        let configuration = self
            .configuration
            .ok_or(CallbackError::MissingConfiguration)?;
        Ok(CallbackEngine {
            configuration,
            options: self.options,
        })
    }
}

impl CallbackEngine {
    pub fn builder() -> CallbackEngineBuilder {
        CallbackEngineBuilder::default()
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn options(&self) -> &CallbackOptions {
        &self.options
    }

    /// Complete the login carried by `ctx` and return the response action.
    ///
    /// Request-caused errors expose an action through
    /// `CallbackError::http_action()`; the rest are server errors.
    #[instrument(skip_all, fields(path = %ctx.request().path, client = tracing::field::Empty))]
    pub async fn perform(&self, ctx: &mut CallbackContext) -> Result<HttpAction> {
        let client = resolver::resolve(&self.configuration, ctx, self.options.default_client())?;
        Span::current().record("client", client.name());

        let profile = match client.complete_handshake(ctx).await {
            HandshakeOutcome::Authenticated(profile) => profile,
            HandshakeOutcome::Action(action) => {
                info!(action = action.label(), "handshake did not produce a profile");
                return Ok(action);
            }
        };
        info!(user = %profile.typed_id(), "handshake completed");
        ctx.add_request_profile(profile.clone());

        // Snapshot for rollback if renewal fails; None when nothing was written
        let mut snapshot = None;
        if self.options.saves_in_session() {
            snapshot = Some(ctx.session_get(PROFILES_KEY).await?);
            profile_store::save(ctx, profile, self.options.is_multi_profile()).await?;
        }

        if self.options.renews_session() {
            if let Err(e) = renewer::renew(ctx, self.configuration.all_clients()).await {
                warn!(error = %e, "session renewal failed");
                if let Some(previous) = snapshot {
                    restore_profiles(ctx, previous).await;
                }
                return Err(CallbackError::SessionRenewal(e));
            }
        }

        let target = match requested_url::take(ctx).await? {
            Some(url) => url,
            None => self
                .options
                .default_url()
                .map(str::to_owned)
                .ok_or(CallbackError::NoRedirectTarget)?,
        };

        info!(location = %target, "callback completed");
        Ok(HttpAction::redirect(target))
    }
}

/// Put the profiles entry back to what it was before this callback.
async fn restore_profiles(ctx: &CallbackContext, previous: Option<Value>) {
    let Some(id) = ctx.session_id() else {
        return;
    };
    let store = ctx.session_store();
    let result = match previous {
        Some(value) => store.set(id, PROFILES_KEY, value).await,
        None => store.remove(id, PROFILES_KEY).await.map(|_| ()),
    };
    if let Err(e) = result {
        warn!(error = %e, "failed to restore profiles after renewal failure");
    }
}
