//! Client selection for a callback request
//!
//! Order: explicit `client_name` parameter, then the configured default
//! client, then the only registered client. Anything else is ambiguous.
//! Reads the configuration and the request only.

use std::sync::Arc;

use auth_client::{CLIENT_NAME_PARAMETER, CallbackContext, Client};
use tracing::debug;

use crate::config::Configuration;
use crate::error::{CallbackError, Result};

pub fn resolve(
    config: &Configuration,
    ctx: &CallbackContext,
    default_client: Option<&str>,
) -> Result<Arc<dyn Client>> {
    let client = if let Some(name) = ctx.parameter(CLIENT_NAME_PARAMETER) {
        lookup(config, name)?
    } else if let Some(name) = default_client.filter(|n| !n.trim().is_empty()) {
        lookup(config, name)?
    } else {
        match config.all_clients() {
            [only] => only.clone(),
            clients => return Err(CallbackError::AmbiguousClient(clients.len())),
        }
    };

    if !client.is_indirect() {
        return Err(CallbackError::DirectClient(client.name().to_owned()));
    }

    debug!(client = %client.name(), protocol = client.protocol().label(), "client resolved");
    Ok(client)
}

fn lookup(config: &Configuration, name: &str) -> Result<Arc<dyn Client>> {
    config
        .find_client(name)
        .cloned()
        .ok_or_else(|| CallbackError::NoClientFound(name.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubClient, context, memory_store};

    fn config(names: &[&str]) -> Configuration {
        names
            .iter()
            .fold(Configuration::builder(memory_store()), |b, name| {
                b.client(Arc::new(StubClient::authenticating(name, "u")))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn explicit_parameter_wins_over_default() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[("client_name", "b")]);

        assert_eq!(resolve(&config, &ctx, Some("a")).unwrap().name(), "b");
    }

    #[test]
    fn unknown_explicit_client_fails() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[("client_name", "c")]);

        let err = resolve(&config, &ctx, Some("a")).err().unwrap();
        assert!(matches!(err, CallbackError::NoClientFound(ref n) if n == "c"));
    }

    #[test]
    fn two_clients_without_hint_are_ambiguous() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[]);

        for _ in 0..3 {
            let err = resolve(&config, &ctx, None).err().unwrap();
            assert!(matches!(err, CallbackError::AmbiguousClient(2)));
        }
    }

    #[test]
    fn default_client_resolves_deterministically() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[]);

        for _ in 0..3 {
            assert_eq!(resolve(&config, &ctx, Some("a")).unwrap().name(), "a");
        }
    }

    #[test]
    fn misconfigured_default_fails() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[]);

        assert!(matches!(
            resolve(&config, &ctx, Some("zzz")),
            Err(CallbackError::NoClientFound(_))
        ));
    }

    #[test]
    fn single_client_is_implicit() {
        let config = config(&["only"]);
        let ctx = context(&memory_store(), &[]);

        assert_eq!(resolve(&config, &ctx, None).unwrap().name(), "only");
    }

    #[test]
    fn no_clients_is_ambiguous() {
        let config = config(&[]);
        let ctx = context(&memory_store(), &[]);

        assert!(matches!(
            resolve(&config, &ctx, None),
            Err(CallbackError::AmbiguousClient(0))
        ));
    }

    #[test]
    fn blank_parameter_falls_back_to_default() {
        let config = config(&["a", "b"]);
        let ctx = context(&memory_store(), &[("client_name", " ")]);

        assert_eq!(resolve(&config, &ctx, Some("b")).unwrap().name(), "b");
    }

    #[test]
    fn lookup_ignores_case() {
        let config = config(&["GitHub", "form"]);
        let ctx = context(&memory_store(), &[("client_name", "github")]);

        assert_eq!(resolve(&config, &ctx, None).unwrap().name(), "GitHub");
    }

    #[test]
    fn direct_client_is_rejected() {
        let config = Configuration::builder(memory_store())
            .client(Arc::new(StubClient::authenticating("basic", "u").direct()))
            .build()
            .unwrap();
        let ctx = context(&memory_store(), &[]);

        assert!(matches!(
            resolve(&config, &ctx, None),
            Err(CallbackError::DirectClient(ref n)) if n == "basic"
        ));
    }
}
