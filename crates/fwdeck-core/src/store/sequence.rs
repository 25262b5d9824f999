// ── Request sequencing ──
//
// Every request against a collection takes a ticket when it is issued.
// When the response arrives, the ticket decides whether it may still be
// applied: a late answer must never overwrite state that is newer than
// the request that produced it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::EntityId;

/// Monotonic issue order of a request against one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

/// Hands out tickets. Lock-free so issuance never waits on a response
/// being applied.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    next: AtomicU64,
}

impl Sequencer {
    pub(crate) fn issue(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// What has already been applied to a collection. Lives under the
/// collection's lock so admission and mutation are atomic together.
#[derive(Debug, Default)]
pub(crate) struct Watermarks {
    /// Newest ticket applied by anything (load, mutation, local reorder).
    newest: Ticket,
    /// Ticket of the last applied load.
    last_load: Ticket,
    /// Ticket of the last local reorder.
    last_local: Ticket,
    /// Newest applied mutation per entity.
    per_entity: HashMap<EntityId, Ticket>,
}

impl Watermarks {
    /// A load wins only if nothing newer has been applied.
    pub(crate) fn admit_load(&mut self, ticket: Ticket) -> bool {
        if ticket <= self.newest {
            return false;
        }
        self.newest = ticket;
        self.last_load = ticket;
        self.per_entity.clear();
        true
    }

    /// A mutation response is dropped when a load issued after it has
    /// already landed, or a newer mutation on the same entity has.
    pub(crate) fn admit_mutation(&mut self, ticket: Ticket, id: &EntityId) -> bool {
        if ticket < self.last_load {
            return false;
        }
        if self.per_entity.get(id).is_some_and(|seen| ticket < *seen) {
            return false;
        }
        self.per_entity.insert(id.clone(), ticket);
        self.newest = self.newest.max(ticket);
        true
    }

    /// Local edits (reorder preview) count as applied state, so any load
    /// issued before them is stale.
    pub(crate) fn record_local(&mut self, ticket: Ticket) {
        self.newest = self.newest.max(ticket);
        self.last_local = self.last_local.max(ticket);
    }

    /// `true` when a local reorder was applied after `ticket` was issued,
    /// so any position the response carries is older than the local one.
    pub(crate) fn predates_local(&self, ticket: Ticket) -> bool {
        ticket < self.last_local
    }
}
