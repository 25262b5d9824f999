// ── Domain model ──
//
// Canonical client-side representation of every control-plane resource.
// Wire shapes live in `fwdeck_api::types`; `crate::convert` maps them
// here. The closed vocabularies are shared with the wire layer as-is.

pub mod entity_id;

pub mod counter;
pub mod interface;
pub mod nat;
pub mod rule;
pub mod settings;
pub mod zone;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_id::EntityId;

pub use counter::{Counter, Health};
pub use interface::NetworkInterface;
pub use nat::NatRule;
pub use rule::Rule;
pub use settings::FirewallConfig;
pub use zone::Zone;

pub use fwdeck_api::types::{Action, Chain, NatType, Policy, Protocol};

/// Anything stored in an `EntityCollection`: cloneable, shareable, and
/// addressed by its server-assigned id.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human label used in notifications ("Rule", "Zone", ...).
    const KIND: &'static str;

    fn id(&self) -> &EntityId;
}
