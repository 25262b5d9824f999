// ── Core error types ──
//
// User-facing errors from fwdeck-core. Consumers never match on HTTP
// internals; the `From<fwdeck_api::Error>` impl folds transport failures
// into domain variants while keeping the server's message intact.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to control plane at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Control plane disconnected")]
    ControllerDisconnected,

    #[error("timeout of {timeout_secs}s exceeded")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{message}")]
    ValidationFailed { message: String },

    #[error("Operation not available: {message}")]
    Unsupported { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    /// Non-2xx answer from the control plane. Displays the server's
    /// message verbatim so notifications read naturally.
    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    /// HTTP status code carried by the underlying API failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fwdeck_api::Error> for CoreError {
    fn from(err: fwdeck_api::Error) -> Self {
        match err {
            fwdeck_api::Error::InvalidApiKey { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fwdeck_api::Error::Api { status, message } if matches!(status, 401 | 403) => {
                CoreError::AuthenticationFailed { message }
            }
            fwdeck_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            fwdeck_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            fwdeck_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            fwdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fwdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fwdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_survives_translation() {
        let err: CoreError = fwdeck_api::Error::Api {
            status: 500,
            message: "iptables-restore failed".into(),
        }
        .into();
        assert_eq!(err.to_string(), "iptables-restore failed");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn forbidden_maps_to_auth_failure() {
        let err: CoreError = fwdeck_api::Error::Api {
            status: 403,
            message: "invalid api key".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn validation_displays_bare_message() {
        assert_eq!(
            CoreError::validation("NAT IP is required").to_string(),
            "NAT IP is required"
        );
    }
}
