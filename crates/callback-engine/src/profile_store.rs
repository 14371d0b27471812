//! Profile persistence in the session
//!
//! Profiles live under `PROFILES_KEY` as a JSON array. Single-profile mode
//! always stores a one-element array; multi-profile mode keeps one entry per
//! client name in first-login order.

use auth_client::{CallbackContext, UserProfile};
use session_store::Result;

/// Session key holding the authenticated profiles.
pub const PROFILES_KEY: &str = "callback.profiles";

/// Persist `profile`, replacing everything (single mode) or only the entry of
/// the same client (multi mode).
pub async fn save(ctx: &mut CallbackContext, profile: UserProfile, multi_profile: bool) -> Result<()> {
    let profiles = if multi_profile {
        let mut profiles = retrieve_all(ctx).await?;
        match profiles
            .iter_mut()
            .find(|p| p.client_name() == profile.client_name())
        {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
        profiles
    } else {
        vec![profile]
    };
    ctx.session_set_as(PROFILES_KEY, &profiles).await
}

/// Every stored profile; empty for an unauthenticated session.
pub async fn retrieve_all(ctx: &CallbackContext) -> Result<Vec<UserProfile>> {
    Ok(ctx
        .session_get_as::<Vec<UserProfile>>(PROFILES_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn clear(ctx: &CallbackContext) -> Result<()> {
    ctx.session_remove(PROFILES_KEY).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, memory_store};

    fn ids(profiles: &[UserProfile]) -> Vec<String> {
        profiles.iter().map(UserProfile::typed_id).collect()
    }

    #[tokio::test]
    async fn unauthenticated_session_yields_empty_list() {
        let ctx = context(&memory_store(), &[]);
        assert!(retrieve_all(&ctx).await.unwrap().is_empty());
        assert!(ctx.session_id().is_none(), "reading must not create a session");
    }

    #[tokio::test]
    async fn single_mode_replaces() {
        let mut ctx = context(&memory_store(), &[]);
        save(&mut ctx, UserProfile::new("p1", "A"), false).await.unwrap();
        save(&mut ctx, UserProfile::new("p2", "B"), false).await.unwrap();

        assert_eq!(ids(&retrieve_all(&ctx).await.unwrap()), ["B#p2"]);
    }

    #[tokio::test]
    async fn multi_mode_merges_per_client() {
        let mut ctx = context(&memory_store(), &[]);
        save(&mut ctx, UserProfile::new("p1", "A"), true).await.unwrap();
        save(&mut ctx, UserProfile::new("p2", "B"), true).await.unwrap();
        assert_eq!(ids(&retrieve_all(&ctx).await.unwrap()), ["A#p1", "B#p2"]);

        save(&mut ctx, UserProfile::new("p3", "A"), true).await.unwrap();
        assert_eq!(ids(&retrieve_all(&ctx).await.unwrap()), ["A#p3", "B#p2"]);
    }

    #[tokio::test]
    async fn single_mode_after_multi_keeps_only_latest() {
        let mut ctx = context(&memory_store(), &[]);
        save(&mut ctx, UserProfile::new("p1", "A"), true).await.unwrap();
        save(&mut ctx, UserProfile::new("p2", "B"), true).await.unwrap();
        save(&mut ctx, UserProfile::new("p3", "C"), false).await.unwrap();

        assert_eq!(ids(&retrieve_all(&ctx).await.unwrap()), ["C#p3"]);
    }

    #[tokio::test]
    async fn clear_removes_all_profiles() {
        let mut ctx = context(&memory_store(), &[]);
        save(&mut ctx, UserProfile::new("p1", "A"), true).await.unwrap();
        ctx.session_set("other", serde_json::json!(1)).await.unwrap();

        clear(&ctx).await.unwrap();

        assert!(retrieve_all(&ctx).await.unwrap().is_empty());
        assert_eq!(ctx.session_get("other").await.unwrap(), Some(serde_json::json!(1)));
    }

    #[tokio::test]
    async fn malformed_entry_is_reported() {
        let mut ctx = context(&memory_store(), &[]);
        ctx.session_set(PROFILES_KEY, serde_json::json!("garbage")).await.unwrap();

        assert!(retrieve_all(&ctx).await.is_err());
    }
}
