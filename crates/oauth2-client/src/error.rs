//! Error types for OAuth 2.0 operations

/// Errors from the provider round-trips. They never leave the client: the
/// handshake maps each of them to an `HttpAction`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("user info request failed: {0}")]
    UserInfo(String),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result alias for OAuth operations.
pub type Result<T> = std::result::Result<T, Error>;
