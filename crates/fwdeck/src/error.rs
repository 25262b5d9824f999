//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fwdeck_config::ConfigError;
use fwdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to control plane at {url}")]
    #[diagnostic(
        code(fwdeck::connection_failed),
        help(
            "Check that the firewall service is running and reachable.\n\
             URL: {url}\n\
             Try: fwdeck health"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fwdeck::auth_failed),
        help(
            "Verify the API key for this profile.\n\
             Run: fwdeck config set api_key <key>"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(fwdeck::no_credentials),
        help(
            "Configure one with: fwdeck config init\n\
             Or set the FWDECK_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fwdeck::not_found),
        help("Run: fwdeck {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(fwdeck::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("{message}")]
    #[diagnostic(code(fwdeck::unsupported))]
    Unsupported { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fwdeck::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fwdeck::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fwdeck config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No control plane configured")]
    #[diagnostic(
        code(fwdeck::no_config),
        help(
            "Create a profile with: fwdeck config init\n\
             Or pass --url and --api-key.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fwdeck::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fwdeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(fwdeck::timeout),
        help("Increase timeout with --timeout or check the control plane.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(fwdeck::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "No connection to the control plane".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Unsupported { message } => CliError::Unsupported { message },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                status: None,
                message,
            },
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "NAT rule" => "nat list",
        "Zone" => "zones list",
        "Interface" => "interfaces list",
        _ => "rules list",
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see: fwdeck config profiles)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_pick_exit_codes() {
        let not_found: CliError = CoreError::NotFound {
            entity_type: "NAT rule".into(),
            identifier: "n9".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            not_found,
            CliError::NotFound { ref list_command, .. } if list_command == "nat list"
        ));

        let auth: CliError = CoreError::AuthenticationFailed {
            message: "bad key".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let invalid: CliError = CoreError::ValidationFailed {
            message: "NAT IP is required".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn server_message_is_the_display() {
        let err: CliError = CoreError::Api {
            message: "iptables-restore failed".into(),
            status: Some(500),
        }
        .into();
        assert_eq!(err.to_string(), "iptables-restore failed");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
