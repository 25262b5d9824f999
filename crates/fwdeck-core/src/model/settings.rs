use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Singleton global settings of the control plane.
///
/// `nat_enabled` only decides whether NAT editing is offered; turning it
/// off never removes NAT rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallConfig {
    pub id: EntityId,
    pub ip_forwarding: bool,
    pub nat_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
