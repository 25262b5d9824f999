use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use super::entity_id::EntityId;

/// Host network interface and the zone it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: EntityId,
    pub name: String,
    /// Zone name (weak reference).
    pub zone: String,
    pub enabled: bool,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for NetworkInterface {
    const KIND: &'static str = "Interface";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
