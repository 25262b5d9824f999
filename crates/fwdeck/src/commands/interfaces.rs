//! Interface assignment command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fwdeck_core::{
    Command as CoreCommand, CommandResult, Controller, CreateInterfaceRequest, NetworkInterface,
    UpdateInterfaceRequest,
};

use crate::cli::{GlobalOpts, InterfacesArgs, InterfacesCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Outcome};

const LIST: &str = "interfaces list";

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

fn row(i: &Arc<NetworkInterface>, color: bool) -> InterfaceRow {
    InterfaceRow {
        id: i.id.to_string(),
        name: i.name.clone(),
        zone: i.zone.clone(),
        enabled: output::yes_no(i.enabled, color),
        notes: output::or_dash(&i.notes),
    }
}

fn detail(i: &Arc<NetworkInterface>) -> String {
    [
        format!("ID:      {}", i.id),
        format!("Name:    {}", i.name),
        format!("Zone:    {}", i.zone),
        format!("Enabled: {}", i.enabled),
        format!("Notes:   {}", output::or_dash(&i.notes)),
    ]
    .join("\n")
}

pub async fn handle(
    controller: &Controller,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        InterfacesCommand::List => {
            let snap = controller.interfaces_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |i| row(i, color),
                |i| i.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Get { id } => {
            let iface = util::find(&controller.interfaces_snapshot(), &id, LIST)?;
            let out = output::render_single(&global.output, &iface, detail, |i| i.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Create {
            name,
            zone,
            enabled,
            notes,
        } => {
            let defaults = CreateInterfaceRequest::default();
            let req = CreateInterfaceRequest {
                name,
                zone: zone.unwrap_or(defaults.zone),
                enabled: enabled.unwrap_or(defaults.enabled),
                notes: notes.unwrap_or_default(),
            };
            let outcome = Outcome::watch(controller);
            let result = controller
                .execute(CoreCommand::CreateInterface(req))
                .await?;
            outcome.report(global.quiet);
            if let CommandResult::Interface(iface) = result {
                output::print_output(&iface.id.to_string(), global.quiet);
            }
            Ok(())
        }

        InterfacesCommand::Update {
            id,
            name,
            zone,
            enabled,
            notes,
        } => {
            let outcome = Outcome::watch(controller);
            controller
                .execute(CoreCommand::UpdateInterface {
                    id: util::entity_id(&id),
                    update: UpdateInterfaceRequest {
                        name,
                        zone,
                        enabled,
                        notes,
                    },
                })
                .await?;
            outcome.report(global.quiet);
            Ok(())
        }

        InterfacesCommand::Delete { id } => {
            let iface = util::find(&controller.interfaces_snapshot(), &id, LIST)?;
            if !util::confirm(
                &format!("Remove interface {} from zone {}?", iface.name, iface.zone),
                global.yes,
            )? {
                return Ok(());
            }
            let outcome = Outcome::watch(controller);
            controller
                .execute(CoreCommand::DeleteInterface {
                    id: util::entity_id(&id),
                })
                .await?;
            outcome.report(global.quiet);
            Ok(())
        }
    }
}
