use thiserror::Error;

/// Top-level error type for the `fwdeck-api` crate.
///
/// Every failure that crosses the REST boundary ends up here. Server-side
/// failures are collapsed into [`Error::Api`], whose message is the body's
/// `error` field when the control plane provides one. `fwdeck-core` maps
/// these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The configured API key cannot be carried in an HTTP header.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("timeout of {timeout_secs}s exceeded")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Control plane ───────────────────────────────────────────────
    /// Non-2xx response. `message` comes from the `{ "error": ... }` body,
    /// falling back to the raw body, then to the status reason.
    #[error("{message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The normalized, user-presentable message for this error.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the control plane rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401 | 403)) || matches!(self, Self::InvalidApiKey { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
