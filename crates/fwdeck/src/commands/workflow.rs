//! Apply, rollback, and health.

use owo_colors::OwoColorize;

use fwdeck_core::{Command as CoreCommand, Controller};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util::{self, Outcome};

pub async fn apply(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let outcome = Outcome::watch(controller);
    controller.execute(CoreCommand::Apply).await?;
    outcome.report(global.quiet);
    Ok(())
}

pub async fn rollback(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(
        "Restore the last-known-good ruleset? Unapplied edits are lost.",
        global.yes,
    )? {
        return Ok(());
    }
    let outcome = Outcome::watch(controller);
    controller.execute(CoreCommand::Rollback).await?;
    outcome.report(global.quiet);
    Ok(())
}

pub async fn health(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let health = controller.health().await?;
    let color = output::should_color(&global.color);

    let out = output::render_single(
        &global.output,
        &health,
        |h| {
            let status = if color && h.is_ok() {
                h.status.green().to_string()
            } else if color {
                h.status.red().to_string()
            } else {
                h.status.clone()
            };
            format!(
                "Status:  {status}\nService: {}",
                h.service.as_deref().unwrap_or("-")
            )
        },
        |h| h.status.clone(),
    );
    output::print_output(&out, global.quiet);

    if health.is_ok() {
        Ok(())
    } else {
        Err(CliError::ApiError {
            status: None,
            message: format!("Control plane reports status '{}'", health.status),
        })
    }
}
