//! Engine options
//!
//! Tri-state booleans keep "not specified" distinct from an explicit choice;
//! the accessors apply the defaults.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CallbackOptions {
    /// Redirect target when no requested URL was remembered
    pub default_url: Option<String>,
    /// Persist the profile in the session (default: yes)
    pub save_in_session: Option<bool>,
    /// Keep one profile per client instead of a single profile (default: no)
    pub multi_profile: Option<bool>,
    /// Rotate the session identifier after login (default: yes)
    pub renew_session: Option<bool>,
    /// Client used when the request does not name one
    pub default_client: Option<String>,
}

impl CallbackOptions {
    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = Some(url.into());
        self
    }

    pub fn with_default_client(mut self, name: impl Into<String>) -> Self {
        self.default_client = Some(name.into());
        self
    }

    pub fn with_save_in_session(mut self, save: bool) -> Self {
        self.save_in_session = Some(save);
        self
    }

    pub fn with_multi_profile(mut self, multi: bool) -> Self {
        self.multi_profile = Some(multi);
        self
    }

    pub fn with_renew_session(mut self, renew: bool) -> Self {
        self.renew_session = Some(renew);
        self
    }

    pub fn saves_in_session(&self) -> bool {
        self.save_in_session != Some(false)
    }

    pub fn is_multi_profile(&self) -> bool {
        self.multi_profile == Some(true)
    }

    pub fn renews_session(&self) -> bool {
        self.renew_session != Some(false)
    }

    /// Default URL, `None` when unset or blank.
    pub fn default_url(&self) -> Option<&str> {
        non_blank(self.default_url.as_deref())
    }

    /// Default client name, `None` when unset or blank.
    pub fn default_client(&self) -> Option<&str> {
        non_blank(self.default_client.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
