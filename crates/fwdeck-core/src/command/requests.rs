// ── Typed request structs for Command payloads ──
//
// Create requests carry every user-editable field and default the way the
// edit forms do. Update requests are sparse: `None` keeps the stored
// value. Positions are never part of a request; the ordering engine owns
// them.

use serde::{Deserialize, Serialize};

use crate::model::{Action, Chain, NatType, Policy, Protocol};

// ── Rule ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRuleRequest {
    pub chain: Chain,
    pub protocol: Protocol,
    pub src: String,
    pub dst: String,
    pub src_port: String,
    pub dst_port: String,
    pub action: Action,
    pub enabled: bool,
    pub comment: String,
}

impl Default for CreateRuleRequest {
    fn default() -> Self {
        Self {
            chain: Chain::Input,
            protocol: Protocol::Tcp,
            src: String::new(),
            dst: String::new(),
            src_port: String::new(),
            dst_port: String::new(),
            action: Action::Accept,
            enabled: true,
            comment: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRuleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<Chain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ── NAT rule ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateNatRuleRequest {
    pub name: String,
    pub nat_type: NatType,
    pub protocol: Protocol,
    pub in_interface: String,
    pub out_interface: String,
    pub source_ip: String,
    pub source_port: String,
    pub dest_ip: String,
    pub dest_port: String,
    pub natto_ip: String,
    pub natto_port: String,
    pub comment: String,
    pub enabled: bool,
}

impl Default for CreateNatRuleRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            nat_type: NatType::Snat,
            protocol: Protocol::All,
            in_interface: String::new(),
            out_interface: String::new(),
            source_ip: String::new(),
            source_port: String::new(),
            dest_ip: String::new(),
            dest_port: String::new(),
            natto_ip: String::new(),
            natto_port: String::new(),
            comment: String::new(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNatRuleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_type: Option<NatType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natto_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natto_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

// ── Zone ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateZoneRequest {
    pub name: String,
    pub description: String,
    pub target: Policy,
    pub in_policy: Policy,
    pub out_policy: Policy,
}

impl Default for CreateZoneRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            target: Policy::Reject,
            in_policy: Policy::Reject,
            out_policy: Policy::Accept,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateZoneRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Policy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_policy: Option<Policy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_policy: Option<Policy>,
}

// ── Interface ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateInterfaceRequest {
    pub name: String,
    /// Zone name the interface joins.
    pub zone: String,
    pub enabled: bool,
    pub notes: String,
}

impl Default for CreateInterfaceRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            zone: "public".into(),
            enabled: true,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInterfaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ── Global config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_forwarding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_enabled: Option<bool>,
}
