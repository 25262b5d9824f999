// ── Wire/domain conversions ──
//
// Bridges `fwdeck_api::types` responses into `crate::model` types, and
// turns typed requests (merged with the stored entity for updates) into
// the full-body payloads the control plane expects.

use fwdeck_api::types::{
    ConfigResponse, ConfigUpdateBody, CounterResponse, HealthResponse, InterfaceBody,
    InterfaceResponse, NatRuleBody, NatRuleResponse, RuleBody, RuleResponse, ZoneBody,
    ZoneResponse,
};

use crate::command::requests::{
    CreateInterfaceRequest, CreateNatRuleRequest, CreateRuleRequest, CreateZoneRequest,
    UpdateConfigRequest, UpdateInterfaceRequest, UpdateNatRuleRequest, UpdateRuleRequest,
    UpdateZoneRequest,
};
use crate::model::{
    Counter, EntityId, FirewallConfig, Health, NatRule, NetworkInterface, Rule, Zone,
};

// ━━ Responses → domain ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<RuleResponse> for Rule {
    fn from(r: RuleResponse) -> Self {
        Self {
            id: EntityId::from(r.id),
            chain: r.chain,
            protocol: r.protocol,
            src: r.src,
            dst: r.dst,
            src_port: r.src_port,
            dst_port: r.dst_port,
            action: r.action,
            enabled: r.enabled,
            comment: r.comment,
            position: r.position,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<NatRuleResponse> for NatRule {
    fn from(r: NatRuleResponse) -> Self {
        Self {
            id: EntityId::from(r.id),
            name: r.name,
            nat_type: r.nat_type,
            protocol: r.protocol,
            in_interface: r.in_interface,
            out_interface: r.out_interface,
            source_ip: r.source_ip,
            source_port: r.source_port,
            dest_ip: r.dest_ip,
            dest_port: r.dest_port,
            natto_ip: r.natto_ip,
            natto_port: r.natto_port,
            comment: r.comment,
            enabled: r.enabled,
            position: r.position,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<ZoneResponse> for Zone {
    fn from(z: ZoneResponse) -> Self {
        Self {
            id: EntityId::from(z.id),
            name: z.name,
            description: z.description,
            target: z.target,
            in_policy: z.in_policy,
            out_policy: z.out_policy,
            created_at: z.created_at,
            updated_at: z.updated_at,
        }
    }
}

impl From<InterfaceResponse> for NetworkInterface {
    fn from(i: InterfaceResponse) -> Self {
        Self {
            id: EntityId::from(i.id),
            name: i.name,
            zone: i.zone,
            enabled: i.enabled,
            notes: i.notes,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

impl From<ConfigResponse> for FirewallConfig {
    fn from(c: ConfigResponse) -> Self {
        Self {
            id: EntityId::from(c.id),
            ip_forwarding: c.ip_forwarding,
            nat_enabled: c.nat_enabled,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<CounterResponse> for Counter {
    fn from(c: CounterResponse) -> Self {
        Self {
            chain: c.chain,
            rule: c.rule,
            packets: c.packets,
            bytes: c.bytes,
        }
    }
}

impl From<HealthResponse> for Health {
    fn from(h: HealthResponse) -> Self {
        Self {
            status: h.status,
            service: h.service,
        }
    }
}

// ━━ Requests → wire bodies ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// ── Rules ────────────────────────────────────────────────────────────

pub(crate) fn rule_create_body(req: CreateRuleRequest, position: i64) -> RuleBody {
    RuleBody {
        chain: req.chain,
        protocol: req.protocol,
        src: req.src,
        dst: req.dst,
        src_port: req.src_port,
        dst_port: req.dst_port,
        action: req.action,
        enabled: req.enabled,
        comment: req.comment,
        position,
    }
}

/// The stored rule with `update` laid over it.
pub(crate) fn rule_update_body(current: &Rule, update: UpdateRuleRequest) -> RuleBody {
    RuleBody {
        chain: update.chain.unwrap_or(current.chain),
        protocol: update.protocol.unwrap_or(current.protocol),
        src: update.src.unwrap_or_else(|| current.src.clone()),
        dst: update.dst.unwrap_or_else(|| current.dst.clone()),
        src_port: update.src_port.unwrap_or_else(|| current.src_port.clone()),
        dst_port: update.dst_port.unwrap_or_else(|| current.dst_port.clone()),
        action: update.action.unwrap_or(current.action),
        enabled: update.enabled.unwrap_or(current.enabled),
        comment: update.comment.unwrap_or_else(|| current.comment.clone()),
        position: current.position,
    }
}

/// Full body of a stored rule, as-is. Used when writing back positions.
pub(crate) fn rule_body(current: &Rule) -> RuleBody {
    rule_update_body(current, UpdateRuleRequest::default())
}

// ── NAT rules ────────────────────────────────────────────────────────

pub(crate) fn nat_create_body(req: CreateNatRuleRequest, position: i64) -> NatRuleBody {
    NatRuleBody {
        name: req.name,
        nat_type: req.nat_type,
        protocol: req.protocol,
        in_interface: req.in_interface,
        out_interface: req.out_interface,
        source_ip: req.source_ip,
        source_port: req.source_port,
        dest_ip: req.dest_ip,
        dest_port: req.dest_port,
        natto_ip: req.natto_ip,
        natto_port: req.natto_port,
        comment: req.comment,
        enabled: req.enabled,
        position,
    }
}

pub(crate) fn nat_update_body(current: &NatRule, update: UpdateNatRuleRequest) -> NatRuleBody {
    NatRuleBody {
        name: update.name.unwrap_or_else(|| current.name.clone()),
        nat_type: update.nat_type.unwrap_or(current.nat_type),
        protocol: update.protocol.unwrap_or(current.protocol),
        in_interface: update
            .in_interface
            .unwrap_or_else(|| current.in_interface.clone()),
        out_interface: update
            .out_interface
            .unwrap_or_else(|| current.out_interface.clone()),
        source_ip: update.source_ip.unwrap_or_else(|| current.source_ip.clone()),
        source_port: update
            .source_port
            .unwrap_or_else(|| current.source_port.clone()),
        dest_ip: update.dest_ip.unwrap_or_else(|| current.dest_ip.clone()),
        dest_port: update.dest_port.unwrap_or_else(|| current.dest_port.clone()),
        natto_ip: update.natto_ip.unwrap_or_else(|| current.natto_ip.clone()),
        natto_port: update.natto_port.unwrap_or_else(|| current.natto_port.clone()),
        comment: update.comment.unwrap_or_else(|| current.comment.clone()),
        enabled: update.enabled.unwrap_or(current.enabled),
        position: current.position,
    }
}

pub(crate) fn nat_body(current: &NatRule) -> NatRuleBody {
    nat_update_body(current, UpdateNatRuleRequest::default())
}

// ── Zones ────────────────────────────────────────────────────────────

pub(crate) fn zone_create_body(req: CreateZoneRequest) -> ZoneBody {
    ZoneBody {
        name: req.name,
        description: req.description,
        target: req.target,
        in_policy: req.in_policy,
        out_policy: req.out_policy,
    }
}

pub(crate) fn zone_update_body(current: &Zone, update: UpdateZoneRequest) -> ZoneBody {
    ZoneBody {
        name: update.name.unwrap_or_else(|| current.name.clone()),
        description: update
            .description
            .unwrap_or_else(|| current.description.clone()),
        target: update.target.unwrap_or(current.target),
        in_policy: update.in_policy.unwrap_or(current.in_policy),
        out_policy: update.out_policy.unwrap_or(current.out_policy),
    }
}

// ── Interfaces ───────────────────────────────────────────────────────

pub(crate) fn interface_create_body(req: CreateInterfaceRequest) -> InterfaceBody {
    InterfaceBody {
        name: req.name,
        zone: req.zone,
        enabled: req.enabled,
        notes: req.notes,
    }
}

pub(crate) fn interface_update_body(
    current: &NetworkInterface,
    update: UpdateInterfaceRequest,
) -> InterfaceBody {
    InterfaceBody {
        name: update.name.unwrap_or_else(|| current.name.clone()),
        zone: update.zone.unwrap_or_else(|| current.zone.clone()),
        enabled: update.enabled.unwrap_or(current.enabled),
        notes: update.notes.unwrap_or_else(|| current.notes.clone()),
    }
}

// ── Config ───────────────────────────────────────────────────────────

/// Both flags are always sent; unset ones keep their stored value.
pub(crate) fn config_update_body(
    current: Option<&FirewallConfig>,
    update: UpdateConfigRequest,
) -> ConfigUpdateBody {
    ConfigUpdateBody {
        ip_forwarding: update
            .ip_forwarding
            .or(current.map(|c| c.ip_forwarding))
            .unwrap_or(false),
        nat_enabled: update
            .nat_enabled
            .or(current.map(|c| c.nat_enabled))
            .unwrap_or(false),
    }
}
