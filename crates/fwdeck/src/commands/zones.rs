//! Zone command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fwdeck_core::{
    Command as CoreCommand, CommandResult, Controller, CreateZoneRequest, UpdateZoneRequest, Zone,
};

use crate::cli::{GlobalOpts, ZonesArgs, ZonesCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Outcome};

const LIST: &str = "zones list";

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "In")]
    in_policy: String,
    #[tabled(rename = "Out")]
    out_policy: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn row(z: &Arc<Zone>, color: bool) -> ZoneRow {
    ZoneRow {
        id: z.id.to_string(),
        name: z.name.clone(),
        target: output::paint_policy(z.target, color),
        in_policy: output::paint_policy(z.in_policy, color),
        out_policy: output::paint_policy(z.out_policy, color),
        description: output::or_dash(&z.description),
    }
}

fn detail(z: &Arc<Zone>) -> String {
    [
        format!("ID:          {}", z.id),
        format!("Name:        {}", z.name),
        format!("Target:      {}", z.target),
        format!("Inbound:     {}", z.in_policy),
        format!("Outbound:    {}", z.out_policy),
        format!("Description: {}", output::or_dash(&z.description)),
    ]
    .join("\n")
}

pub async fn handle(
    controller: &Controller,
    args: ZonesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        ZonesCommand::List => {
            let snap = controller.zones_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |z| row(z, color),
                |z| z.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Get { id } => {
            let zone = util::find(&controller.zones_snapshot(), &id, LIST)?;
            let out = output::render_single(&global.output, &zone, detail, |z| z.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Create {
            name,
            description,
            target,
            in_policy,
            out_policy,
        } => {
            let defaults = CreateZoneRequest::default();
            let req = CreateZoneRequest {
                name,
                description: description.unwrap_or_default(),
                target: target.unwrap_or(defaults.target),
                in_policy: in_policy.unwrap_or(defaults.in_policy),
                out_policy: out_policy.unwrap_or(defaults.out_policy),
            };
            let outcome = Outcome::watch(controller);
            let result = controller.execute(CoreCommand::CreateZone(req)).await?;
            outcome.report(global.quiet);
            if let CommandResult::Zone(zone) = result {
                output::print_output(&zone.id.to_string(), global.quiet);
            }
            Ok(())
        }

        ZonesCommand::Update {
            id,
            name,
            description,
            target,
            in_policy,
            out_policy,
        } => {
            let outcome = Outcome::watch(controller);
            controller
                .execute(CoreCommand::UpdateZone {
                    id: util::entity_id(&id),
                    update: UpdateZoneRequest {
                        name,
                        description,
                        target,
                        in_policy,
                        out_policy,
                    },
                })
                .await?;
            outcome.report(global.quiet);
            Ok(())
        }

        ZonesCommand::Delete { id } => {
            let zone = util::find(&controller.zones_snapshot(), &id, LIST)?;
            if !util::confirm(&format!("Delete zone {}?", zone.name), global.yes)? {
                return Ok(());
            }
            let outcome = Outcome::watch(controller);
            controller
                .execute(CoreCommand::DeleteZone {
                    id: util::entity_id(&id),
                })
                .await?;
            outcome.report(global.quiet);
            Ok(())
        }
    }
}
