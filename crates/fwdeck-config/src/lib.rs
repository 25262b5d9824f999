//! Shared configuration for fwdeck.
//!
//! TOML profiles, API-key resolution (env + plaintext), and translation to
//! `fwdeck_core::ControllerConfig`. The CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fwdeck_core::{ControllerConfig, ReorderPersistence, TlsVerification};

/// Prefix for environment overrides, e.g. `FWDECK_DEFAULTS__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "FWDECK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named control-plane profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the default.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    15
}

/// How reorders are written back, as spelled in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderMode {
    #[default]
    Manual,
    Immediate,
}

impl From<ReorderMode> for ReorderPersistence {
    fn from(mode: ReorderMode) -> Self {
        match mode {
            ReorderMode::Manual => Self::Manual,
            ReorderMode::Immediate => Self::Immediate,
        }
    }
}

/// A named control-plane profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Control-plane base URL (e.g., "http://10.0.0.1:8080").
    pub url: String,

    /// API key (plaintext; prefer `api_key_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub reorder: ReorderMode,

    /// Counter polling cadence for long-running sessions, seconds.
    #[serde(default = "default_counters_poll")]
    pub counters_poll: u64,
}

fn default_counters_poll() -> u64 {
    5
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            api_key_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            reorder: ReorderMode::default(),
            counters_poll: default_counters_poll(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "fwdeck", "fwdeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fwdeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. A missing file contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default(path: &Path) -> Config {
    load_config_from(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key from the profile: `api_key_env` first, then the
/// plaintext value.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|val| !val.is_empty())
    {
        return Ok(SecretString::from(val));
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ControllerConfig` from a profile with an already-resolved key.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<ControllerConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let mut config = ControllerConfig::new(url, api_key);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reorder_persistence = profile.reorder.into();
    config.counters_poll_interval = Duration::from_secs(profile.counters_poll);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 15);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
default_profile = "lab"

[defaults]
output = "json"

[profiles.lab]
url = "http://10.0.0.1:8080"
api_key = "k"
reorder = "immediate"
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "lab");
        assert_eq!(cfg.profile_name(Some("other")), "other");
        assert_eq!(cfg.defaults.output, "json");

        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.reorder, ReorderMode::Immediate);
        assert_eq!(lab.counters_poll, 5);
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("http://fw.lan:8080");
        profile.api_key_env = Some("FW_KEY".into());
        cfg.profiles.insert("default".into(), profile);
        save_config(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let p = loaded.profile("default").unwrap();
        assert_eq!(p.url, "http://fw.lan:8080");
        assert_eq!(p.api_key_env.as_deref(), Some("FW_KEY"));
    }

    #[test]
    fn unset_key_env_falls_back_to_plaintext() {
        let mut profile = Profile::new("http://fw.lan");
        profile.api_key_env = Some("FWDECK_TEST_SURELY_UNSET_VARIABLE".into());
        profile.api_key = Some("plain".into());

        let key = resolve_api_key(&profile, "default").unwrap();
        assert_eq!(key.expose_secret(), "plain");
    }

    #[test]
    fn no_key_anywhere_is_an_error() {
        let profile = Profile::new("http://fw.lan");
        assert!(matches!(
            resolve_api_key(&profile, "lab"),
            Err(ConfigError::NoCredentials { profile }) if profile == "lab"
        ));
    }

    #[test]
    fn controller_config_takes_profile_overrides() {
        let mut profile = Profile::new("http://fw.lan:8080");
        profile.timeout = Some(3);
        profile.reorder = ReorderMode::Immediate;
        profile.ca_cert = Some(PathBuf::from("/etc/fw/ca.pem"));

        let cfg =
            profile_to_controller_config(&profile, &Defaults::default(), "k".to_string().into())
                .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.reorder_persistence, ReorderPersistence::Immediate);
        assert_eq!(
            cfg.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/fw/ca.pem"))
        );
        assert_eq!(cfg.counters_poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn bad_url_is_a_validation_error() {
        let profile = Profile::new("not a url");
        let err =
            profile_to_controller_config(&profile, &Defaults::default(), "k".to_string().into())
                .unwrap_err();
        assert!(err.to_string().contains("url"));
    }
}
