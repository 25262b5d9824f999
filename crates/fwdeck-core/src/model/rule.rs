// ── Firewall rule ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Action, Chain, Entity, Protocol};
use crate::ordering::Ordered;

/// Longest comment the control plane accepts on a rule.
pub const MAX_COMMENT_LEN: usize = 128;

/// One packet-filter rule. Rules share a single ordering domain across
/// all chains; `position` is the rule's slot in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: EntityId,
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
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Rule {
    const KIND: &'static str = "Rule";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Ordered for Rule {
    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}
