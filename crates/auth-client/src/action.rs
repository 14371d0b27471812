//! Terminal HTTP outcomes of a callback

/// HTTP action produced for the browser.
///
/// Body formats are the host's concern; only the status and, for redirects,
/// the target are specified here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpAction {
    /// 302 Found to `location`
    Redirect { location: String },
    /// 400
    BadRequest,
    /// 403
    Forbidden,
}

impl HttpAction {
    pub fn redirect(location: impl Into<String>) -> Self {
        HttpAction::Redirect {
            location: location.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            HttpAction::Redirect { .. } => 302,
            HttpAction::BadRequest => 400,
            HttpAction::Forbidden => 403,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            HttpAction::Redirect { location } => Some(location),
            _ => None,
        }
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            HttpAction::Redirect { .. } => "redirect",
            HttpAction::BadRequest => "bad_request",
            HttpAction::Forbidden => "forbidden",
        }
    }
}
