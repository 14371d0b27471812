//! Session identifiers

use std::fmt;

/// Opaque session identifier carried in the session cookie.
///
/// Generated identifiers are 32 lowercase hex characters (UUIDv4, simple
/// form). `Debug` shows only a short prefix so identifiers can appear in logs
/// without handing out a usable session key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().as_simple().to_string())
    }

    /// Wrap an identifier received from a client (e.g. a cookie value).
    ///
    /// Returns `None` for blank values. The store decides whether the
    /// identifier is actually known.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, log-safe prefix of the identifier.
    pub fn redacted(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(6)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.redacted())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
