//! Global settings (IP forwarding, NAT) handlers.

use std::sync::Arc;

use fwdeck_core::{
    Command as CoreCommand, CommandResult, Controller, FirewallConfig, UpdateConfigRequest,
};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

use super::util::Outcome;

fn detail(cfg: &Arc<FirewallConfig>) -> String {
    [
        format!("IP forwarding: {}", output::yes_no(cfg.ip_forwarding, false)),
        format!("NAT:           {}", output::yes_no(cfg.nat_enabled, false)),
        format!(
            "Updated:       {}",
            cfg.updated_at.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
    ]
    .join("\n")
}

fn current(controller: &Controller) -> Result<Arc<FirewallConfig>, CliError> {
    controller
        .firewall_config()
        .ok_or_else(|| CliError::ApiError {
            status: None,
            message: "Failed to load settings".into(),
        })
}

pub async fn handle(
    controller: &Controller,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show => {
            let cfg = current(controller)?;
            let out = output::render_single(&global.output, &cfg, detail, |c| c.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set { ip_forwarding, nat } => {
            let outcome = Outcome::watch(controller);
            let result = controller
                .execute(CoreCommand::UpdateConfig(UpdateConfigRequest {
                    ip_forwarding,
                    nat_enabled: nat,
                }))
                .await?;
            outcome.report(global.quiet);
            if let CommandResult::Config(cfg) = result {
                let out = output::render_single(&global.output, &cfg, detail, |c| c.id.to_string());
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
    }
}
