// Wire types for the control-plane REST API.
//
// Field names follow the server's camelCase JSON. Timestamps are optional
// because older control-plane builds omit them on some resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── Closed vocabularies ──────────────────────────────────────────────

/// Packet-filter chain a rule is attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Chain {
    Input,
    Output,
    Forward,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

/// What the kernel does with a matching packet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Action {
    Accept,
    Drop,
    Reject,
    Log,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum NatType {
    Snat,
    Dnat,
}

/// Zone target / default policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Policy {
    Accept,
    Drop,
    Reject,
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResponse {
    pub id: String,
    pub chain: Chain,
    pub protocol: Protocol,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    #[serde(default)]
    pub src_port: String,
    #[serde(default)]
    pub dst_port: String,
    pub action: Action,
    pub enabled: bool,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create and update share one body shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBody {
    pub chain: Chain,
    pub protocol: Protocol,
    pub src: String,
    pub dst: String,
    pub src_port: String,
    pub dst_port: String,
    pub action: Action,
    pub enabled: bool,
    pub comment: String,
    pub position: i64,
}

// ── NAT rules ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatRuleResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub nat_type: NatType,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    #[serde(default)]
    pub in_interface: String,
    #[serde(default)]
    pub out_interface: String,
    #[serde(default, rename = "sourceIP")]
    pub source_ip: String,
    #[serde(default)]
    pub source_port: String,
    #[serde(default, rename = "destIP")]
    pub dest_ip: String,
    #[serde(default)]
    pub dest_port: String,
    #[serde(rename = "nattoIP")]
    pub natto_ip: String,
    #[serde(default)]
    pub natto_port: String,
    #[serde(default)]
    pub comment: String,
    pub enabled: bool,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_protocol() -> Protocol {
    Protocol::All
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatRuleBody {
    pub name: String,
    #[serde(rename = "type")]
    pub nat_type: NatType,
    pub protocol: Protocol,
    pub in_interface: String,
    pub out_interface: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    pub source_port: String,
    #[serde(rename = "destIP")]
    pub dest_ip: String,
    pub dest_port: String,
    #[serde(rename = "nattoIP")]
    pub natto_ip: String,
    pub natto_port: String,
    pub comment: String,
    pub enabled: bool,
    pub position: i64,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target: Policy,
    pub in_policy: Policy,
    pub out_policy: Policy,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneBody {
    pub name: String,
    pub description: String,
    pub target: Policy,
    pub in_policy: Policy,
    pub out_policy: Policy,
}

// ── Interfaces ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub zone: String,
    pub enabled: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBody {
    pub name: String,
    pub zone: String,
    pub enabled: bool,
    pub notes: String,
}

// ── Global config ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub id: String,
    pub ip_forwarding: bool,
    pub nat_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateBody {
    pub ip_forwarding: bool,
    pub nat_enabled: bool,
}

// ── Read-only resources ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterResponse {
    pub chain: Chain,
    #[serde(default)]
    pub rule: String,
    pub packets: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

// ── Envelopes ────────────────────────────────────────────────────────
//
// Lists come back as `{ <resource>: [...] }`, single entities as
// `{ <entity>: {...} }`. Go encodes an empty slice as `null`, hence the
// `Option<Vec<_>>`.

#[derive(Deserialize)]
pub(crate) struct RulesEnvelope {
    pub rules: Option<Vec<RuleResponse>>,
}

#[derive(Deserialize)]
pub(crate) struct RuleEnvelope {
    pub rule: RuleResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NatRulesEnvelope {
    pub nat_rules: Option<Vec<NatRuleResponse>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NatRuleEnvelope {
    pub nat_rule: NatRuleResponse,
}

#[derive(Deserialize)]
pub(crate) struct ZonesEnvelope {
    pub zones: Option<Vec<ZoneResponse>>,
}

#[derive(Deserialize)]
pub(crate) struct ZoneEnvelope {
    pub zone: ZoneResponse,
}

#[derive(Deserialize)]
pub(crate) struct InterfacesEnvelope {
    pub interfaces: Option<Vec<InterfaceResponse>>,
}

#[derive(Deserialize)]
pub(crate) struct InterfaceEnvelope {
    pub interface: InterfaceResponse,
}

#[derive(Deserialize)]
pub(crate) struct ConfigEnvelope {
    pub config: ConfigResponse,
}

#[derive(Deserialize)]
pub(crate) struct CountersEnvelope {
    pub counters: Option<Vec<CounterResponse>>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
