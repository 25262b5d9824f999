//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;

use fwdeck_core::{Controller, Entity, EntityId, Notification};

use crate::cli::MoveTarget;
use crate::error::CliError;

/// Find an entity in a snapshot by id.
pub fn find<T: Entity>(
    snapshot: &[Arc<T>],
    id: &str,
    list_command: &str,
) -> Result<Arc<T>, CliError> {
    snapshot
        .iter()
        .find(|item| item.id().as_str() == id)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: T::KIND.into(),
            identifier: id.into(),
            list_command: list_command.into(),
        })
}

/// Resolve a `--to` / `--onto` pair into `(from, to)` indices.
pub fn resolve_move<T: Entity>(
    snapshot: &[Arc<T>],
    id: &str,
    target: &MoveTarget,
    list_command: &str,
) -> Result<(usize, usize), CliError> {
    let index_of = |needle: &str| {
        snapshot
            .iter()
            .position(|item| item.id().as_str() == needle)
            .ok_or_else(|| CliError::NotFound {
                resource_type: T::KIND.into(),
                identifier: needle.into(),
                list_command: list_command.into(),
            })
    };

    let from = index_of(id)?;
    let to = match (&target.to, &target.onto) {
        (Some(to), _) => *to,
        (None, Some(onto)) => index_of(onto)?,
        (None, None) => from,
    };
    if to >= snapshot.len() {
        return Err(CliError::Validation {
            field: "to".into(),
            reason: format!("position {to} is past the end (0..{})", snapshot.len()),
        });
    }
    Ok((from, to))
}

pub fn entity_id(id: &str) -> EntityId {
    EntityId::from(id)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

// ── Notifications ───────────────────────────────────────────────────

/// Subscription opened before a mutation so its outcome can be echoed.
pub struct Outcome(broadcast::Receiver<Notification>);

impl Outcome {
    pub fn watch(controller: &Controller) -> Self {
        Self(controller.notifications())
    }

    /// Echo success messages to stderr. Errors surface through the
    /// returned `CliError` instead.
    pub fn report(mut self, quiet: bool) {
        while let Ok(note) = self.0.try_recv() {
            if !quiet && !note.is_error() {
                eprintln!("✓ {}", note.message);
            }
        }
    }
}
