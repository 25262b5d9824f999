//! CLI configuration: thin wrapper around `fwdeck_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--url,
//! --api-key, --insecure, --timeout, --config).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use fwdeck_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fwdeck_config::{Config, Defaults, Profile, ReorderMode};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `FWDECK_CONFIG`, else the XDG path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(fwdeck_config::config_path)
}

pub fn load_config_or_default(global: &GlobalOpts) -> Config {
    fwdeck_config::load_config_or_default(&config_path(global))
}

/// Write `cfg` to the config file in effect and return its path.
pub fn save(global: &GlobalOpts, cfg: &Config) -> Result<PathBuf, CliError> {
    let path = config_path(global);
    fwdeck_config::save_config(cfg, &path)?;
    Ok(path)
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build the one-shot `ControllerConfig` for this invocation.
///
/// CLI flags take priority over profile values. Without a profile, `--url`
/// and `--api-key` must both be given.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default(global);
    let profile_name = active_profile_name(global, &cfg);

    let mut config = if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut profile = profile.clone();
        if let Some(ref url) = global.url {
            profile.url.clone_from(url);
        }
        let key = match global.api_key {
            Some(ref key) => SecretString::from(key.clone()),
            None => fwdeck_config::resolve_api_key(&profile, &profile_name)?,
        };
        fwdeck_config::profile_to_controller_config(&profile, &cfg.defaults, key)?
    } else {
        let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
            path: config_path(global).display().to_string(),
        })?;
        let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
        let key = global
            .api_key
            .clone()
            .ok_or_else(|| CliError::NoCredentials {
                profile: profile_name.clone(),
            })?;
        let mut config = ControllerConfig::new(url, SecretString::from(key));
        config.timeout = Duration::from_secs(cfg.defaults.timeout);
        config
    };

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    // One request-response cycle per invocation: no background work.
    config.counters_poll_interval = Duration::ZERO;
    config.refresh_interval = Duration::ZERO;

    Ok(config)
}
