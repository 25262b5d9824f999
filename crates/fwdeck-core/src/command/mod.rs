// ── Command API ──
//
// Every write operation can be expressed as a `Command` and handed to
// `Controller::execute`. Reads bypass commands entirely and go straight
// to `DataStore` snapshots.

pub mod requests;

use std::sync::Arc;

use crate::model::{EntityId, FirewallConfig, NatRule, NetworkInterface, Rule, Zone};

pub use requests::{
    CreateInterfaceRequest, CreateNatRuleRequest, CreateRuleRequest, CreateZoneRequest,
    UpdateConfigRequest, UpdateInterfaceRequest, UpdateNatRuleRequest, UpdateRuleRequest,
    UpdateZoneRequest,
};

/// All write operations against the control plane.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Rules ────────────────────────────────────────────────────────
    CreateRule(CreateRuleRequest),
    UpdateRule {
        id: EntityId,
        update: UpdateRuleRequest,
    },
    DeleteRule {
        id: EntityId,
    },
    /// Local reorder by index, persisted per the reorder policy.
    ReorderRules {
        from: usize,
        to: usize,
    },
    /// Drag `source` onto `target`'s slot.
    MoveRule {
        source: EntityId,
        target: EntityId,
    },
    PersistRuleOrder,

    // ── NAT rules ────────────────────────────────────────────────────
    CreateNatRule(CreateNatRuleRequest),
    UpdateNatRule {
        id: EntityId,
        update: UpdateNatRuleRequest,
    },
    DeleteNatRule {
        id: EntityId,
    },
    ReorderNatRules {
        from: usize,
        to: usize,
    },
    MoveNatRule {
        source: EntityId,
        target: EntityId,
    },
    PersistNatRuleOrder,

    // ── Zones ────────────────────────────────────────────────────────
    CreateZone(CreateZoneRequest),
    UpdateZone {
        id: EntityId,
        update: UpdateZoneRequest,
    },
    DeleteZone {
        id: EntityId,
    },

    // ── Interfaces ───────────────────────────────────────────────────
    CreateInterface(CreateInterfaceRequest),
    UpdateInterface {
        id: EntityId,
        update: UpdateInterfaceRequest,
    },
    DeleteInterface {
        id: EntityId,
    },

    // ── Global ───────────────────────────────────────────────────────
    UpdateConfig(UpdateConfigRequest),
    Apply,
    Rollback,
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    /// A reorder that left the order unchanged.
    Unchanged,
    Rule(Arc<Rule>),
    NatRule(Arc<NatRule>),
    Zone(Arc<Zone>),
    Interface(Arc<NetworkInterface>),
    Config(Arc<FirewallConfig>),
    /// Number of rows written back by an order persist.
    Persisted(usize),
}
