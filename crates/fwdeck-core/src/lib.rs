//! Client-side state for a Linux firewall/NAT control plane.
//!
//! This crate owns the domain model, the ordered-ruleset store, and the
//! workflow logic that sits between `fwdeck-api` and the CLI:
//!
//! - **[`Controller`]**: facade over the whole lifecycle.
//!   [`connect()`](Controller::connect) probes liveness, loads every
//!   collection, then spawns counter polling and periodic refresh.
//!   [`Controller::oneshot()`](Controller::oneshot) is the single-shot mode
//!   the CLI uses.
//!
//! - **[`DataStore`]**: per-collection ordered storage (`IndexMap` behind a
//!   lock, published through `tokio::sync::watch`). Stale responses are
//!   discarded by ticket so a slow load never overwrites newer state.
//!
//! - **Ordering** ([`ordering`]): optimistic reorder with dense
//!   renumbering. Rules and NAT rules are independent ordering domains.
//!
//! - **Workflow**: apply/rollback of the stored ruleset with a single
//!   busy flag and an advisory "draft differs from kernel" flag.
//!
//! - **[`Notification`]**: every mutation outcome is published as a
//!   success or error message on a broadcast channel.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod notify;
pub mod ordering;
pub mod store;
pub mod stream;
mod validation;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{ControllerConfig, ReorderPersistence, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use notify::{Notification, NotificationLevel};
pub use store::DataStore;
pub use stream::EntityStream;
pub use workflow::{WorkflowOp, WorkflowState};

pub use model::{
    Action, Chain, Counter, Entity, EntityId, FirewallConfig, Health, NatRule, NatType,
    NetworkInterface, Policy, Protocol, Rule, Zone,
};
pub use ordering::Ordered;
