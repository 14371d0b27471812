//! Session identifier rotation after login
//!
//! The attribute move itself is the store's atomic `renew`; this module
//! rebinds the request to the new identifier and tells every client about
//! the change.

use std::sync::Arc;

use auth_client::{CallbackContext, Client};
use session_store::{Result, SessionId};
use tracing::{debug, info};

/// Rotate the bound session and return the new identifier.
///
/// Returns `Ok(None)` when there is nothing an attacker could have fixed: no
/// session bound, or a bound identifier the store does not know.
pub async fn renew(ctx: &mut CallbackContext, clients: &[Arc<dyn Client>]) -> Result<Option<SessionId>> {
    let Some(old) = ctx.session_id().cloned() else {
        debug!("no session bound, skipping renewal");
        return Ok(None);
    };

    let store = ctx.session_store().clone();
    if !store.exists(&old).await {
        debug!(session = old.redacted(), "bound session unknown to store, skipping renewal");
        return Ok(None);
    }

    let new = store.renew(&old).await?;
    ctx.bind_session(new.clone());
    metrics::counter!("callback_session_renewals_total").increment(1);
    info!(
        old_session = old.redacted(),
        new_session = new.redacted(),
        "session renewed"
    );

    for client in clients {
        client.session_renewed(&old, ctx).await;
    }
    Ok(Some(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubClient, context, context_with_session, memory_store};
    use serde_json::json;

    #[tokio::test]
    async fn moves_attributes_and_invalidates_old_identifier() {
        let store = memory_store();
        let old = store.create().await.unwrap();
        store.set(&old, "cart", json!(["book"])).await.unwrap();
        let mut ctx = context_with_session(&store, &old, &[]);

        let new = renew(&mut ctx, &[]).await.unwrap().unwrap();

        assert_ne!(new, old);
        assert!(!store.exists(&old).await);
        assert_eq!(store.get(&new, "cart").await.unwrap(), Some(json!(["book"])));
        assert_eq!(ctx.session_id(), Some(&new));
        assert!(ctx.session_changed());
    }

    #[tokio::test]
    async fn notifies_every_client() {
        let store = memory_store();
        let old = store.create().await.unwrap();
        let a = Arc::new(StubClient::authenticating("a", "1"));
        let b = Arc::new(StubClient::authenticating("b", "2"));
        let clients: Vec<Arc<dyn Client>> = vec![a.clone(), b.clone()];
        let mut ctx = context_with_session(&store, &old, &[]);

        renew(&mut ctx, &clients).await.unwrap();

        assert_eq!(a.renewals(), 1);
        assert_eq!(b.renewals(), 1);
    }

    #[tokio::test]
    async fn skips_without_session() {
        let store = memory_store();
        let mut ctx = context(&store, &[]);

        assert_eq!(renew(&mut ctx, &[]).await.unwrap(), None);
        assert!(ctx.session_id().is_none());
    }

    #[tokio::test]
    async fn skips_unknown_identifier() {
        let store = memory_store();
        let forged = SessionId::parse("attacker-chosen").unwrap();
        let mut ctx = context_with_session(&store, &forged, &[]);

        assert_eq!(renew(&mut ctx, &[]).await.unwrap(), None);
        assert_eq!(ctx.session_id(), Some(&forged));
        assert!(!store.exists(&forged).await);
    }
}
