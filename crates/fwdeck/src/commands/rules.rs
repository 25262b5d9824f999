//! Firewall rule command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fwdeck_core::{
    Command as CoreCommand, CommandResult, Controller, CreateRuleRequest, Rule, UpdateRuleRequest,
};

use crate::cli::{GlobalOpts, RuleFields, RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Outcome};

const LIST: &str = "rules list";

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    position: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Chain")]
    chain: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Source")]
    src: String,
    #[tabled(rename = "Destination")]
    dst: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

fn endpoint(addr: &str, port: &str) -> String {
    match (addr.is_empty(), port.is_empty()) {
        (true, true) => "any".into(),
        (false, true) => addr.into(),
        (true, false) => format!("*:{port}"),
        (false, false) => format!("{addr}:{port}"),
    }
}

fn row(r: &Arc<Rule>, color: bool) -> RuleRow {
    RuleRow {
        position: r.position,
        id: r.id.to_string(),
        chain: r.chain.to_string(),
        protocol: r.protocol.to_string(),
        src: endpoint(&r.src, &r.src_port),
        dst: endpoint(&r.dst, &r.dst_port),
        action: output::paint_action(r.action, color),
        enabled: output::yes_no(r.enabled, color),
        comment: output::or_dash(&r.comment),
    }
}

fn detail(r: &Arc<Rule>) -> String {
    [
        format!("ID:          {}", r.id),
        format!("Position:    {}", r.position),
        format!("Chain:       {}", r.chain),
        format!("Protocol:    {}", r.protocol),
        format!("Source:      {}", endpoint(&r.src, &r.src_port)),
        format!("Destination: {}", endpoint(&r.dst, &r.dst_port)),
        format!("Action:      {}", r.action),
        format!("Enabled:     {}", r.enabled),
        format!("Comment:     {}", output::or_dash(&r.comment)),
        format!(
            "Updated:     {}",
            r.updated_at.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
    ]
    .join("\n")
}

// ── Request building ────────────────────────────────────────────────

fn create_request(fields: RuleFields) -> CreateRuleRequest {
    let defaults = CreateRuleRequest::default();
    CreateRuleRequest {
        chain: fields.chain.unwrap_or(defaults.chain),
        protocol: fields.protocol.unwrap_or(defaults.protocol),
        src: fields.src.unwrap_or_default(),
        dst: fields.dst.unwrap_or_default(),
        src_port: fields.src_port.unwrap_or_default(),
        dst_port: fields.dst_port.unwrap_or_default(),
        action: fields.action.unwrap_or(defaults.action),
        enabled: fields.enabled.unwrap_or(defaults.enabled),
        comment: fields.comment.unwrap_or_default(),
    }
}

fn update_request(fields: RuleFields) -> UpdateRuleRequest {
    UpdateRuleRequest {
        chain: fields.chain,
        protocol: fields.protocol,
        src: fields.src,
        dst: fields.dst,
        src_port: fields.src_port,
        dst_port: fields.dst_port,
        action: fields.action,
        enabled: fields.enabled,
        comment: fields.comment,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        RulesCommand::List { chain } => {
            let snap = controller.rules_snapshot();
            let rules: Vec<Arc<Rule>> = snap
                .iter()
                .filter(|r| chain.is_none_or(|c| r.chain == c))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &rules,
                |r| row(r, color),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Get { id } => {
            let rule = util::find(&controller.rules_snapshot(), &id, LIST)?;
            let out = output::render_single(&global.output, &rule, detail, |r| r.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Create { fields, from_file } => {
            let req = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                create_request(fields)
            };
            let outcome = Outcome::watch(controller);
            let result = controller.execute(CoreCommand::CreateRule(req)).await?;
            outcome.report(global.quiet);
            if let CommandResult::Rule(rule) = result {
                output::print_output(&rule.id.to_string(), global.quiet);
            }
            Ok(())
        }

        RulesCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let update = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                update_request(fields)
            };
            mutate(controller, global, CoreCommand::UpdateRule {
                id: util::entity_id(&id),
                update,
            })
            .await
        }

        RulesCommand::Enable { id } => set_enabled(controller, global, &id, true).await,

        RulesCommand::Disable { id } => set_enabled(controller, global, &id, false).await,

        RulesCommand::Delete { id } => {
            util::find(&controller.rules_snapshot(), &id, LIST)?;
            if !util::confirm(&format!("Delete rule {id}?"), global.yes)? {
                return Ok(());
            }
            mutate(controller, global, CoreCommand::DeleteRule {
                id: util::entity_id(&id),
            })
            .await
        }

        RulesCommand::Move { id, target } => {
            let (from, to) = util::resolve_move(&controller.rules_snapshot(), &id, &target, LIST)?;
            let outcome = Outcome::watch(controller);
            let moved = controller
                .execute(CoreCommand::ReorderRules { from, to })
                .await?;
            if matches!(moved, CommandResult::Unchanged) {
                if !global.quiet {
                    eprintln!("Rule {id} is already at position {to}");
                }
                return Ok(());
            }
            controller.execute(CoreCommand::PersistRuleOrder).await?;
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
    mutate(controller, global, CoreCommand::UpdateRule {
        id: util::entity_id(id),
        update: UpdateRuleRequest {
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
    fn endpoint_formats() {
        assert_eq!(endpoint("", ""), "any");
        assert_eq!(endpoint("10.0.0.0/8", ""), "10.0.0.0/8");
        assert_eq!(endpoint("", "22"), "*:22");
        assert_eq!(endpoint("10.0.0.1", "443"), "10.0.0.1:443");
    }

    #[test]
    fn create_request_falls_back_to_form_defaults() {
        let req = create_request(RuleFields {
            dst_port: Some("443".into()),
            ..Default::default()
        });
        assert_eq!(req, CreateRuleRequest {
            dst_port: "443".into(),
            ..Default::default()
        });
    }
}
