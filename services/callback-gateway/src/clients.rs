//! Client construction from `[[clients]]` entries

use std::sync::Arc;

use anyhow::{Context, Result};
use auth_client::{Client, FormClient};
use oauth2_client::{OAuth2Client, OAuth2Settings};
use tracing::info;

use crate::config::ClientConfig;

/// Build every configured client, in configuration order.
pub fn build_clients(
    configs: Vec<ClientConfig>,
    http: &reqwest::Client,
) -> Result<Vec<Arc<dyn Client>>> {
    configs
        .into_iter()
        .map(|config| build_client(config, http))
        .collect()
}

fn build_client(config: ClientConfig, http: &reqwest::Client) -> Result<Arc<dyn Client>> {
    let client: Arc<dyn Client> = match config {
        ClientConfig::OAuth2(c) => {
            let name = c.name.clone();
            let settings = OAuth2Settings {
                name: c.name,
                authorize_url: c.authorize_url,
                token_url: c.token_url,
                userinfo_url: c.userinfo_url,
                client_id: c.client_id,
                client_secret: c.client_secret,
                redirect_uri: c.redirect_uri,
                scopes: c.scopes,
                id_attribute: c.id_attribute,
            };
            Arc::new(
                OAuth2Client::new(settings, http.clone())
                    .with_context(|| format!("invalid OAuth2 client {name}"))?,
            )
        }
        ClientConfig::Form(c) => Arc::new(
            c.users
                .iter()
                .fold(FormClient::new(c.name, c.login_url), |client, user| {
                    client.with_user(&user.username, &user.password_sha256)
                }),
        ),
    };

    info!(
        client = %client.name(),
        protocol = client.protocol().label(),
        "client registered"
    );
    Ok(client)
}
