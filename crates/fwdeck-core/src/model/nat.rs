// ── NAT rule ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Entity, NatType, Protocol};
use crate::ordering::Ordered;

/// Source or destination NAT rule. NAT rules are ordered independently
/// of filter rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatRule {
    pub id: EntityId,
    pub name: String,
    pub nat_type: NatType,
    pub protocol: Protocol,
    pub in_interface: String,
    pub out_interface: String,
    pub source_ip: String,
    pub source_port: String,
    pub dest_ip: String,
    pub dest_port: String,
    /// Translation target address. Always present on a stored rule.
    pub natto_ip: String,
    pub natto_port: String,
    pub comment: String,
    pub enabled: bool,
    pub position: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for NatRule {
    const KIND: &'static str = "NAT rule";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Ordered for NatRule {
    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}
