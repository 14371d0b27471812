//! The URL the user asked for before being sent to log in

use auth_client::CallbackContext;
use serde_json::Value;
use session_store::Result;

/// Session key holding the originally requested URL.
pub const REQUESTED_URL_KEY: &str = "callback.requested_url";

pub async fn remember(ctx: &mut CallbackContext, url: &str) -> Result<()> {
    ctx.session_set(REQUESTED_URL_KEY, Value::String(url.to_owned()))
        .await
}

/// Remove and return the remembered URL. Blank or non-string values read as
/// absent (they are still removed).
pub async fn take(ctx: &CallbackContext) -> Result<Option<String>> {
    let Some(value) = ctx.session_remove(REQUESTED_URL_KEY).await? else {
        return Ok(None);
    };
    Ok(value
        .as_str()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, memory_store};

    #[tokio::test]
    async fn take_consumes_the_url() {
        let mut ctx = context(&memory_store(), &[]);
        remember(&mut ctx, "/orders/42").await.unwrap();

        assert_eq!(take(&ctx).await.unwrap().as_deref(), Some("/orders/42"));
        assert_eq!(take(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_url_reads_as_absent() {
        let mut ctx = context(&memory_store(), &[]);
        remember(&mut ctx, "   ").await.unwrap();

        assert_eq!(take(&ctx).await.unwrap(), None);
        assert_eq!(ctx.session_get(REQUESTED_URL_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn nothing_to_take_without_session() {
        let ctx = context(&memory_store(), &[]);
        assert_eq!(take(&ctx).await.unwrap(), None);
        assert!(ctx.session_id().is_none());
    }
}
