//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile, ReorderMode};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of `cfg` with plaintext API keys masked.
fn redacted(cfg: &Config) -> Config {
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                if p.api_key.is_some() {
                    p.api_key = Some(MASK.into());
                }
                (name.clone(), p)
            })
            .collect(),
    }
}

fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref key) = p.api_key {
            let _ = writeln!(out, "api_key = \"{key}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        let _ = writeln!(
            out,
            "reorder = \"{}\"",
            match p.reorder {
                ReorderMode::Manual => "manual",
                ReorderMode::Immediate => "immediate",
            }
        );
        let _ = writeln!(out, "counters_poll = {}", p.counters_poll);
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

/// Apply `key = value` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "url" => {
            url::Url::parse(&value).map_err(|_| CliError::Validation {
                field: "url".into(),
                reason: format!("invalid URL: {value}"),
            })?;
            profile.url = value;
        }
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(parse_flag("insecure", &value, "must be 'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_flag("timeout", &value, "must be a number (seconds)")?);
        }
        "counters_poll" | "counters-poll" => {
            profile.counters_poll =
                parse_flag("counters_poll", &value, "must be a number (seconds, 0 = off)")?;
        }
        "reorder" => {
            profile.reorder = match value.as_str() {
                "manual" => ReorderMode::Manual,
                "immediate" => ReorderMode::Immediate,
                _ => {
                    return Err(CliError::Validation {
                        field: "reorder".into(),
                        reason: "must be 'manual' or 'immediate'".into(),
                    });
                }
            };
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, api_key, api_key_env, \
                     ca_cert, insecure, timeout, reorder, counters_poll"
                ),
            });
        }
    }
    Ok(())
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path(global);
            eprintln!("fwdeck configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Control-plane URL")
                .default("http://127.0.0.1:8080".into())
                .validate_with(|s: &String| url::Url::parse(s).map(|_| ()).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(url);

            let storage = Select::new()
                .with_prompt("Where should the API key come from?")
                .items(&["Environment variable (recommended)", "Config file (plaintext)"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            if storage == 0 {
                let var: String = Input::new()
                    .with_prompt("Variable name")
                    .default("FWDECK_API_KEY".into())
                    .interact_text()
                    .map_err(prompt_err)?;
                profile.api_key_env = Some(var);
            } else {
                let key = Password::new()
                    .with_prompt("API key")
                    .interact()
                    .map_err(prompt_err)?;
                if key.is_empty() {
                    return Err(CliError::Validation {
                        field: "api_key".into(),
                        reason: "API key cannot be empty".into(),
                    });
                }
                profile.api_key = Some(key);
            }

            let reorder = Select::new()
                .with_prompt("Save rule order")
                .items(&["On request (fwdeck rules move persists)", "After every move"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            if reorder == 1 {
                profile.reorder = ReorderMode::Immediate;
            }

            let mut cfg = config::load_config_or_default(global);
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            let path = config::save(global, &cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: fwdeck health");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default(global));
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default(global);
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));
            set_key(profile, &key, value)?;

            config::save(global, &cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default(global);
            let default = cfg.profile_name(None).to_owned();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: fwdeck config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default(global);

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save(global, &cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_keys() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("http://10.0.0.1:8080");
        profile.api_key = Some("s3cret".into());
        cfg.profiles.insert("lab".into(), profile);

        let text = format_config(&redacted(&cfg));
        assert!(text.contains("api_key = \"****\""));
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn set_key_validates_values() {
        let mut profile = Profile::new("http://10.0.0.1:8080");
        assert!(set_key(&mut profile, "reorder", "immediate".into()).is_ok());
        assert_eq!(profile.reorder, ReorderMode::Immediate);

        assert!(set_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_key(&mut profile, "url", "not a url".into()).is_err());
        assert!(set_key(&mut profile, "site", "default".into()).is_err());

        assert!(set_key(&mut profile, "counters_poll", "0".into()).is_ok());
        assert_eq!(profile.counters_poll, 0);
    }
}
