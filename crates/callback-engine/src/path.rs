//! Callback path gating

/// Suffix matched when none is configured.
pub const DEFAULT_CALLBACK_SUFFIX: &str = "/callback";

/// Whether `request_path` belongs to the callback endpoint.
///
/// An empty suffix matches everything; otherwise the path must end with the
/// suffix exactly (case-sensitive, no wildcards).
pub fn applies(request_path: &str, suffix: &str) -> bool {
    suffix.is_empty() || request_path.ends_with(suffix)
}

/// Configured callback path suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    suffix: String,
}

impl PathDecision {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn applies(&self, request_path: &str) -> bool {
        applies(request_path, &self.suffix)
    }
}

impl Default for PathDecision {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK_SUFFIX)
    }
}
