//! Configuration types and loading
//!
//! Config path precedence: CLI `--config` > `CONFIG_PATH` env > default file.
//! OAuth client secrets are loaded from the env var named by
//! `client_secret_env` or from `client_secret_file`, never stored in the TOML
//! directly to avoid leaking secrets.

use callback_engine::{CallbackOptions, DEFAULT_CALLBACK_SUFFIX};
use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Timeout for outbound calls to identity providers
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// Callback endpoint and engine options
#[derive(Debug, Deserialize)]
pub struct CallbackConfig {
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(flatten)]
    pub options: CallbackOptions,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            options: CallbackOptions::default(),
        }
    }
}

/// Session cookie and expiry settings
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

/// One `[[clients]]` entry, tagged by `type`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientConfig {
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2ClientConfig),
    Form(FormClientConfig),
}

impl ClientConfig {
    pub fn name(&self) -> &str {
        match self {
            ClientConfig::OAuth2(c) => &c.name,
            ClientConfig::Form(c) => &c.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuth2ClientConfig {
    pub name: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    /// Env var holding the client secret
    #[serde(default)]
    pub client_secret_env: Option<String>,
    /// File holding the client secret (used when the env var is unset)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
}

#[derive(Debug, Deserialize)]
pub struct FormClientConfig {
    pub name: String,
    pub login_url: String,
    #[serde(default)]
    pub users: Vec<FormUser>,
}

#[derive(Debug, Deserialize)]
pub struct FormUser {
    pub username: String,
    /// Lowercase hex SHA-256 of the password
    pub password_sha256: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_http_timeout() -> u64 {
    10
}

fn default_suffix() -> String {
    DEFAULT_CALLBACK_SUFFIX.to_string()
}

fn default_cookie_name() -> String {
    "sid".to_string()
}

fn default_idle_timeout() -> u64 {
    1800
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_secure_cookies() -> bool {
    true
}

fn default_id_attribute() -> String {
    "sub".to_string()
}

impl Config {
    /// Load configuration from a TOML file, validate it and resolve client
    /// secrets.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        for client in &mut config.clients {
            if let ClientConfig::OAuth2(oauth) = client {
                if oauth.client_secret_env.is_some() || oauth.client_secret_file.is_some() {
                    let secret = Secret::resolve(
                        oauth.client_secret_env.as_deref(),
                        oauth.client_secret_file.as_deref(),
                    )
                    .map_err(|e| {
                        common::Error::invalid(&format!("clients.{}.client_secret", oauth.name), e)
                    })?;
                    oauth.client_secret = Some(secret);
                }
            }
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.server.max_connections == 0 {
            return Err(common::Error::invalid(
                "server.max_connections",
                "must be greater than 0",
            ));
        }
        if self.server.http_timeout_secs == 0 {
            return Err(common::Error::invalid(
                "server.http_timeout_secs",
                "must be greater than 0",
            ));
        }

        if !self.callback.suffix.is_empty() && !self.callback.suffix.starts_with('/') {
            return Err(common::Error::invalid(
                "callback.suffix",
                format!("must be empty or start with '/', got: {}", self.callback.suffix),
            ));
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(common::Error::invalid("session.cookie_name", "must not be empty"));
        }
        if self.session.idle_timeout_secs == 0 {
            return Err(common::Error::invalid(
                "session.idle_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(common::Error::invalid(
                "session.sweep_interval_secs",
                "must be greater than 0",
            ));
        }

        if self.clients.is_empty() {
            return Err(common::Error::Config(
                "at least one [[clients]] entry is required".into(),
            ));
        }
        for client in &self.clients {
            if client.name().trim().is_empty() {
                return Err(common::Error::invalid("clients.name", "must not be empty"));
            }
            match client {
                ClientConfig::OAuth2(oauth) => {
                    for (field, url) in [
                        ("authorize_url", &oauth.authorize_url),
                        ("token_url", &oauth.token_url),
                        ("userinfo_url", &oauth.userinfo_url),
                        ("redirect_uri", &oauth.redirect_uri),
                    ] {
                        if !url.starts_with("http://") && !url.starts_with("https://") {
                            return Err(common::Error::invalid(
                                &format!("clients.{}.{field}", oauth.name),
                                format!("must start with http:// or https://, got: {url}"),
                            ));
                        }
                    }
                }
                ClientConfig::Form(form) => {
                    for user in &form.users {
                        let digest = user.password_sha256.trim();
                        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                            return Err(common::Error::invalid(
                                &format!("clients.{}.users.{}", form.name, user.username),
                                "password_sha256 must be 64 hex characters",
                            ));
                        }
                    }
                }
            }
        }

        if let Some(default_client) = self.callback.options.default_client() {
            if !self
                .clients
                .iter()
                .any(|c| c.name().trim().eq_ignore_ascii_case(default_client))
            {
                return Err(common::Error::invalid(
                    "callback.default_client",
                    format!("no client named {default_client}"),
                ));
            }
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("callback-gateway.toml")
    }
}
