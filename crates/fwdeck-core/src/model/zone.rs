use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Entity, Policy};

/// Firewall zone. Interfaces point at zones by name, so renaming or
/// deleting a zone leaves those references dangling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub target: Policy,
    pub in_policy: Policy,
    pub out_policy: Policy,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Zone {
    const KIND: &'static str = "Zone";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
