//! Secret wrapper for client secrets and other sensitive config values

use std::fmt;
use std::path::Path;

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Sensitive value - redacted in Debug/Display/logs, zeroed on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Resolve a secret string from an environment variable or a file.
    ///
    /// The env var wins when both are given and the variable is set. File
    /// contents are trimmed; an empty file or an unset variable with no file
    /// is an error because the caller asked for a secret explicitly.
    pub fn resolve(env_var: Option<&str>, file: Option<&Path>) -> Result<Self> {
        if let Some(name) = env_var {
            if let Ok(value) = std::env::var(name) {
                if !value.trim().is_empty() {
                    return Ok(Self::new(value.trim().to_owned()));
                }
            }
        }

        let Some(path) = file else {
            return Err(Error::Secret(match env_var {
                Some(name) => format!("env var {name} is not set and no secret file given"),
                None => "no env var or secret file given".into(),
            }));
        };

        let mut raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Secret(format!("failed to read secret file {}: {e}", path.display()))
        })?;
        let value = raw.trim().to_owned();
        raw.zeroize();

        if value.is_empty() {
            return Err(Error::Secret(format!(
                "secret file {} is empty",
                path.display()
            )));
        }
        Ok(Self::new(value))
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = Secret::new(String::from("client-secret-value"));
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "client-secret-value");
    }

    #[test]
    fn resolve_prefers_env_over_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "from-file").unwrap();

        unsafe { std::env::set_var("COMMON_TEST_SECRET_A", "from-env") };
        let secret = Secret::resolve(Some("COMMON_TEST_SECRET_A"), Some(&path)).unwrap();
        unsafe { std::env::remove_var("COMMON_TEST_SECRET_A") };

        assert_eq!(secret.expose(), "from-env");
    }

    #[test]
    fn resolve_reads_trimmed_file_when_env_unset() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "  from-file\n").unwrap();

        unsafe { std::env::remove_var("COMMON_TEST_SECRET_B") };
        let secret = Secret::resolve(Some("COMMON_TEST_SECRET_B"), Some(&path)).unwrap();
        assert_eq!(secret.expose(), "from-file");
    }

    #[test]
    fn resolve_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, " \n ").unwrap();

        let err = Secret::resolve(None, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("is empty"), "got: {err}");
    }

    #[test]
    fn resolve_without_any_source_fails() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("COMMON_TEST_SECRET_C") };
        let err = Secret::resolve(Some("COMMON_TEST_SECRET_C"), None).unwrap_err();
        assert!(err.to_string().contains("COMMON_TEST_SECRET_C"), "got: {err}");
    }
}
