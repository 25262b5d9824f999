//! NAT rule command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fwdeck_core::{
    Command as CoreCommand, CommandResult, Controller, CreateNatRuleRequest, NatRule,
    UpdateNatRuleRequest,
};

use crate::cli::{GlobalOpts, NatArgs, NatCommand, NatFields};
use crate::error::CliError;
use crate::output;

use super::util::{self, Outcome};

const LIST: &str = "nat list";

#[derive(Tabled)]
struct NatRow {
    #[tabled(rename = "#")]
    position: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    nat_type: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Match")]
    matcher: String,
    #[tabled(rename = "Translate To")]
    target: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

fn with_port(ip: &str, port: &str) -> String {
    if port.is_empty() {
        output::or_dash(ip)
    } else {
        format!("{}:{port}", if ip.is_empty() { "*" } else { ip })
    }
}

/// "in eth0 / out eth1 / 10.0.0.0/8 -> 1.2.3.4:80", empty parts left out.
fn match_summary(n: &NatRule) -> String {
    let mut parts = Vec::new();
    if !n.in_interface.is_empty() {
        parts.push(format!("in {}", n.in_interface));
    }
    if !n.out_interface.is_empty() {
        parts.push(format!("out {}", n.out_interface));
    }
    let src = with_port(&n.source_ip, &n.source_port);
    let dst = with_port(&n.dest_ip, &n.dest_port);
    if src != "-" || dst != "-" {
        parts.push(format!("{src} -> {dst}"));
    }
    if parts.is_empty() {
        "any".into()
    } else {
        parts.join(" / ")
    }
}

fn row(n: &Arc<NatRule>, color: bool) -> NatRow {
    NatRow {
        position: n.position,
        id: n.id.to_string(),
        name: n.name.clone(),
        nat_type: n.nat_type.to_string(),
        protocol: n.protocol.to_string(),
        matcher: match_summary(n),
        target: with_port(&n.natto_ip, &n.natto_port),
        enabled: output::yes_no(n.enabled, color),
    }
}

fn detail(n: &Arc<NatRule>) -> String {
    [
        format!("ID:            {}", n.id),
        format!("Position:      {}", n.position),
        format!("Name:          {}", n.name),
        format!("Type:          {}", n.nat_type),
        format!("Protocol:      {}", n.protocol),
        format!("In interface:  {}", output::or_dash(&n.in_interface)),
        format!("Out interface: {}", output::or_dash(&n.out_interface)),
        format!("Source:        {}", with_port(&n.source_ip, &n.source_port)),
        format!("Destination:   {}", with_port(&n.dest_ip, &n.dest_port)),
        format!("Translate to:  {}", with_port(&n.natto_ip, &n.natto_port)),
        format!("Enabled:       {}", n.enabled),
        format!("Comment:       {}", output::or_dash(&n.comment)),
    ]
    .join("\n")
}

fn create_request(fields: NatFields) -> CreateNatRuleRequest {
    let defaults = CreateNatRuleRequest::default();
    CreateNatRuleRequest {
        name: fields.name.unwrap_or_default(),
        nat_type: fields.nat_type.unwrap_or(defaults.nat_type),
        protocol: fields.protocol.unwrap_or(defaults.protocol),
        in_interface: fields.in_interface.unwrap_or_default(),
        out_interface: fields.out_interface.unwrap_or_default(),
        source_ip: fields.source_ip.unwrap_or_default(),
        source_port: fields.source_port.unwrap_or_default(),
        dest_ip: fields.dest_ip.unwrap_or_default(),
        dest_port: fields.dest_port.unwrap_or_default(),
        natto_ip: fields.natto_ip.unwrap_or_default(),
        natto_port: fields.natto_port.unwrap_or_default(),
        comment: fields.comment.unwrap_or_default(),
        enabled: fields.enabled.unwrap_or(defaults.enabled),
    }
}

fn update_request(fields: NatFields) -> UpdateNatRuleRequest {
    UpdateNatRuleRequest {
        name: fields.name,
        nat_type: fields.nat_type,
        protocol: fields.protocol,
        in_interface: fields.in_interface,
        out_interface: fields.out_interface,
        source_ip: fields.source_ip,
        source_port: fields.source_port,
        dest_ip: fields.dest_ip,
        dest_port: fields.dest_port,
        natto_ip: fields.natto_ip,
        natto_port: fields.natto_port,
        comment: fields.comment,
        enabled: fields.enabled,
    }
}

/// NAT rules stay editable on the server when NAT is off, but the shell
/// only lets them be read.
fn ensure_nat_enabled(controller: &Controller) -> Result<(), CliError> {
    match controller.firewall_config() {
        Some(cfg) if !cfg.nat_enabled => Err(CliError::Unsupported {
            message: "NAT is disabled on the control plane. \
                      Enable it with: fwdeck settings set --nat true"
                .into(),
        }),
        _ => Ok(()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: NatArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    if !matches!(args.command, NatCommand::List | NatCommand::Get { .. }) {
        ensure_nat_enabled(controller)?;
    }

    match args.command {
        NatCommand::List => {
            let snap = controller.nat_rules_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |n| row(n, color),
                |n| n.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NatCommand::Get { id } => {
            let nat = util::find(&controller.nat_rules_snapshot(), &id, LIST)?;
            let out = output::render_single(&global.output, &nat, detail, |n| n.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NatCommand::Create { fields, from_file } => {
            let req = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                create_request(fields)
            };
            let outcome = Outcome::watch(controller);
            let result = controller.execute(CoreCommand::CreateNatRule(req)).await?;
            outcome.report(global.quiet);
            if let CommandResult::NatRule(nat) = result {
                output::print_output(&nat.id.to_string(), global.quiet);
            }
            Ok(())
        }

        NatCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let update = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                update_request(fields)
            };
            mutate(controller, global, CoreCommand::UpdateNatRule {
                id: util::entity_id(&id),
                update,
            })
            .await
        }

        NatCommand::Enable { id } => set_enabled(controller, global, &id, true).await,

        NatCommand::Disable { id } => set_enabled(controller, global, &id, false).await,

        NatCommand::Delete { id } => {
            util::find(&controller.nat_rules_snapshot(), &id, LIST)?;
            if !util::confirm(&format!("Delete NAT rule {id}?"), global.yes)? {
                return Ok(());
            }
            mutate(controller, global, CoreCommand::DeleteNatRule {
                id: util::entity_id(&id),
            })
            .await
        }

        NatCommand::Move { id, target } => {
            let (from, to) =
                util::resolve_move(&controller.nat_rules_snapshot(), &id, &target, LIST)?;
            let outcome = Outcome::watch(controller);
            let moved = controller
                .execute(CoreCommand::ReorderNatRules { from, to })
                .await?;
            if matches!(moved, CommandResult::Unchanged) {
                if !global.quiet {
                    eprintln!("NAT rule {id} is already at position {to}");
                }
                return Ok(());
            }
            controller.execute(CoreCommand::PersistNatRuleOrder).await?;
            outcome.report(global.quiet);
            Ok(())
        }
    }
}

async fn set_enabled(
    controller: &Controller,
    global: &GlobalOpts,
    id: &str,
    enabled: bool,
) -> Result<(), CliError> {
    mutate(controller, global, CoreCommand::UpdateNatRule {
        id: util::entity_id(id),
        update: UpdateNatRuleRequest {
            enabled: Some(enabled),
            ..Default::default()
        },
    })
    .await
}

async fn mutate(
    controller: &Controller,
    global: &GlobalOpts,
    cmd: CoreCommand,
) -> Result<(), CliError> {
    let outcome = Outcome::watch(controller);
    controller.execute(cmd).await?;
    outcome.report(global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_only_gets_wildcard_host() {
        assert_eq!(with_port("", ""), "-");
        assert_eq!(with_port("", "80"), "*:80");
        assert_eq!(with_port("192.0.2.5", "8080"), "192.0.2.5:8080");
    }

    #[test]
    fn create_defaults_to_snat_all() {
        let req = create_request(NatFields {
            name: Some("masq".into()),
            natto_ip: Some("203.0.113.1".into()),
            ..Default::default()
        });
        assert_eq!(req.nat_type, fwdeck_core::NatType::Snat);
        assert_eq!(req.protocol, fwdeck_core::Protocol::All);
        assert!(req.enabled);
    }
}
