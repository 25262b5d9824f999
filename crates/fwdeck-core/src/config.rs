// ── Runtime connection configuration ──
//
// These types describe how to reach a control plane and how the
// controller should behave once connected. They carry the API key and
// tuning knobs but never touch disk: the CLI builds a `ControllerConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab boxes).
    DangerAcceptInvalid,
}

/// When a local reorder is written back to the control plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReorderPersistence {
    /// Reorders stay local until `persist_*_order()` is called.
    #[default]
    Manual,
    /// Every reorder is followed by a position write-back.
    Immediate,
}

/// Configuration for connecting to a single control plane.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Control-plane URL (e.g., `http://10.0.0.1:8080`). `/api` is appended.
    pub url: Url,
    /// Bearer API key.
    pub api_key: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub reorder_persistence: ReorderPersistence,
    /// Counter polling cadence while connected. Zero disables polling.
    pub counters_poll_interval: Duration,
    /// Full-refresh cadence while connected. Zero disables it.
    pub refresh_interval: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            timeout: fwdeck_api::transport::DEFAULT_TIMEOUT,
            reorder_persistence: ReorderPersistence::default(),
            counters_poll_interval: Duration::from_secs(5),
            refresh_interval: Duration::ZERO,
        }
    }
}
