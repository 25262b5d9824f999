// ── Generic reactive entity collection ──
//
// Ordered storage keyed by entity id, with push-based change notification
// via `watch` channels. Every server response passes through the
// collection's watermarks before it may touch state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::debug;

use super::sequence::{Sequencer, Ticket, Watermarks};
use crate::error::CoreError;
use crate::model::{Entity, EntityId};
use crate::ordering::{self, Ordered, OrderedMap};

/// A reactive collection for a single entity type.
///
/// Iteration order is display order. For ordered entities (rules, NAT
/// rules) it is also the ordering domain; for the rest it is simply the
/// order the server listed them in.
pub(crate) struct EntityCollection<T: Entity> {
    state: RwLock<State<T>>,
    sequencer: Sequencer,

    /// Full snapshot, rebuilt on mutation for cheap subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,

    /// `true` while at least one load is in flight.
    loading: watch::Sender<bool>,
    loads_in_flight: AtomicUsize,
}

struct State<T> {
    items: OrderedMap<T>,
    marks: Watermarks,
    /// Last position the server confirmed for each ordered entity.
    confirmed: HashMap<EntityId, i64>,
}

/// Holds the collection's `loading` flag up until dropped.
pub(crate) struct LoadGuard<'a, T: Entity> {
    collection: &'a EntityCollection<T>,
}

impl<T: Entity> Drop for LoadGuard<'_, T> {
    fn drop(&mut self) {
        if self.collection.loads_in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.collection.loading.send_replace(false);
        }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);

        Self {
            state: RwLock::new(State {
                items: OrderedMap::new(),
                marks: Watermarks::default(),
                confirmed: HashMap::new(),
            }),
            sequencer: Sequencer::default(),
            snapshot,
            loading,
            loads_in_flight: AtomicUsize::new(0),
        }
    }

    // ── Tickets ──────────────────────────────────────────────────────

    /// Ticket for a mutation about to be sent.
    pub(crate) fn issue(&self) -> Ticket {
        self.sequencer.issue()
    }

    /// Ticket for a load about to be sent; raises `loading` until the
    /// guard drops.
    pub(crate) fn begin_load(&self) -> (Ticket, LoadGuard<'_, T>) {
        if self.loads_in_flight.fetch_add(1, Ordering::AcqRel) == 0 {
            self.loading.send_replace(true);
        }
        (self.sequencer.issue(), LoadGuard { collection: self })
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.read().items.get(id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub(crate) fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    // ── Server responses (any entity) ────────────────────────────────

    /// Replace everything with a server list, in list order.
    pub(crate) fn apply_load(&self, ticket: Ticket, list: Vec<T>) -> bool {
        self.mutate(|state| {
            if !state.marks.admit_load(ticket) {
                debug!(kind = T::KIND, ?ticket, "discarding stale load");
                return false;
            }
            state.items = list
                .into_iter()
                .map(|item| (item.id().clone(), Arc::new(item)))
                .collect();
            true
        })
    }

    /// Append a newly created entity.
    pub(crate) fn apply_created(&self, ticket: Ticket, item: T) -> bool {
        self.mutate(|state| {
            if !admit(state, ticket, item.id()) {
                return false;
            }
            state.items.insert(item.id().clone(), Arc::new(item));
            true
        })
    }

    /// Replace an entity in place, keeping its slot.
    pub(crate) fn apply_updated(&self, ticket: Ticket, item: T) -> bool {
        self.mutate(|state| replace_in_place(state, ticket, item))
    }

    /// Remove an entity; everything else keeps its relative order.
    pub(crate) fn apply_deleted(&self, ticket: Ticket, id: &EntityId) -> bool {
        self.mutate(|state| {
            if !admit(state, ticket, id) {
                return false;
            }
            state.confirmed.remove(id);
            state.items.shift_remove(id).is_some()
        })
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn read(&self) -> RwLockReadGuard<'_, State<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the write lock and broadcast a fresh snapshot if it
    /// reports a change.
    fn mutate(&self, f: impl FnOnce(&mut State<T>) -> bool) -> bool {
        let mut state = self.write();
        let changed = f(&mut state);
        if changed {
            let values: Vec<Arc<T>> = state.items.values().cloned().collect();
            // `send_modify` updates unconditionally, even with zero receivers.
            self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        }
        changed
    }

    fn try_mutate(
        &self,
        f: impl FnOnce(&mut State<T>) -> Result<bool, CoreError>,
    ) -> Result<bool, CoreError> {
        let mut outcome = Ok(false);
        self.mutate(|state| {
            outcome = f(state);
            matches!(outcome, Ok(true))
        });
        outcome
    }
}

// ── Ordering domain operations ───────────────────────────────────────

impl<T: Entity + Ordered> EntityCollection<T> {
    /// Position a new entity should be submitted with: the current count.
    ///
    /// Loads keep server positions as given, so after a sparse list such as
    /// `[a=0, d=3]` this is 2 and the created row sorts in front of `d`.
    pub(crate) fn append_position(&self) -> i64 {
        ordering::append_position(self.len())
    }

    /// Replace everything with a server list, sorted by server position.
    pub(crate) fn apply_load_ordered(&self, ticket: Ticket, list: Vec<T>) -> bool {
        self.mutate(|state| {
            if !state.marks.admit_load(ticket) {
                debug!(kind = T::KIND, ?ticket, "discarding stale load");
                return false;
            }
            state.confirmed = list
                .iter()
                .map(|item| (item.id().clone(), item.position()))
                .collect();
            state.items =
                ordering::from_server_list(list.into_iter().map(|item| (item.id().clone(), item)));
            true
        })
    }

    /// Insert a created entity where its position puts it, then renumber.
    pub(crate) fn apply_created_ordered(&self, ticket: Ticket, item: T) -> bool {
        self.mutate(|state| {
            if !admit(state, ticket, item.id()) {
                return false;
            }
            state.confirmed.insert(item.id().clone(), item.position());
            state.items.insert(item.id().clone(), Arc::new(item));
            ordering::sort_by_position(&mut state.items);
            ordering::renumber(&mut state.items);
            true
        })
    }

    /// Replace in place and record the server's view of its position.
    ///
    /// A response to a request sent before the latest local reorder keeps
    /// the entity's local position; the server's position is still recorded
    /// as confirmed, so `unconfirmed()` keeps reporting the move.
    pub(crate) fn apply_updated_ordered(&self, ticket: Ticket, mut item: T) -> bool {
        self.mutate(|state| {
            let id = item.id().clone();
            let server_position = item.position();
            if state.marks.predates_local(ticket) {
                if let Some(local) = state.items.get(&id) {
                    item.set_position(local.position());
                }
            }
            let applied = replace_in_place(state, ticket, item);
            if applied {
                state.confirmed.insert(id, server_position);
            }
            applied
        })
    }

    /// Remove and close the gap.
    pub(crate) fn apply_deleted_ordered(&self, ticket: Ticket, id: &EntityId) -> bool {
        self.mutate(|state| {
            if !admit(state, ticket, id) {
                return false;
            }
            state.confirmed.remove(id);
            if state.items.shift_remove(id).is_none() {
                return false;
            }
            ordering::renumber(&mut state.items);
            true
        })
    }

    /// Local, optimistic move by index.
    pub(crate) fn reorder(&self, from: usize, to: usize) -> Result<bool, CoreError> {
        let ticket = self.issue();
        self.try_mutate(|state| {
            let moved = ordering::move_index(&mut state.items, from, to)?;
            if moved {
                state.marks.record_local(ticket);
            }
            Ok(moved)
        })
    }

    /// Local, optimistic move of `source` onto `target`'s slot.
    pub(crate) fn reorder_by_id(&self, source: &EntityId, target: &EntityId) -> bool {
        let ticket = self.issue();
        self.mutate(|state| {
            let Some((from, to)) = ordering::resolve_drop(&state.items, source, target) else {
                return false;
            };
            match ordering::move_index(&mut state.items, from, to) {
                Ok(moved) => {
                    if moved {
                        state.marks.record_local(ticket);
                    }
                    moved
                }
                Err(_) => false,
            }
        })
    }

    /// Entities whose local position differs from the server's.
    pub(crate) fn unconfirmed(&self) -> Vec<Arc<T>> {
        let state = self.read();
        state
            .items
            .values()
            .filter(|item| state.confirmed.get(item.id()) != Some(&item.position()))
            .cloned()
            .collect()
    }
}

// ── Shared mutation steps ────────────────────────────────────────────

fn admit<T: Entity>(state: &mut State<T>, ticket: Ticket, id: &EntityId) -> bool {
    if state.marks.admit_mutation(ticket, id) {
        true
    } else {
        debug!(kind = T::KIND, %id, ?ticket, "discarding stale mutation response");
        false
    }
}

fn replace_in_place<T: Entity>(state: &mut State<T>, ticket: Ticket, item: T) -> bool {
    if !admit(state, ticket, item.id()) {
        return false;
    }
    if let Some(slot) = state.items.get_mut(item.id()) {
        *slot = Arc::new(item);
        true
    } else {
        debug!(kind = T::KIND, id = %item.id(), "update for entity no longer held locally");
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: EntityId,
        label: String,
        position: i64,
    }

    impl Entity for Row {
        const KIND: &'static str = "Row";
        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    impl Ordered for Row {
        fn position(&self) -> i64 {
            self.position
        }
        fn set_position(&mut self, position: i64) {
            self.position = position;
        }
    }

    fn row(id: &str, position: i64) -> Row {
        Row {
            id: EntityId::from(id),
            label: id.to_uppercase(),
            position,
        }
    }

    fn ids(col: &EntityCollection<Row>) -> Vec<String> {
        col.snapshot().iter().map(|r| r.id.to_string()).collect()
    }

    fn positions(col: &EntityCollection<Row>) -> Vec<i64> {
        col.snapshot().iter().map(|r| r.position).collect()
    }

    fn loaded(rows: Vec<Row>) -> EntityCollection<Row> {
        let col = EntityCollection::new();
        {
            let (ticket, _guard) = col.begin_load();
            assert!(col.apply_load_ordered(ticket, rows));
        }
        col
    }

    #[test]
    fn load_sorts_by_server_position() {
        let col = loaded(vec![row("c", 2), row("a", 0), row("b", 1)]);
        assert_eq!(ids(&col), vec!["a", "b", "c"]);
        assert!(col.unconfirmed().is_empty());
    }

    #[test]
    fn loading_flag_tracks_guard() {
        let col: EntityCollection<Row> = EntityCollection::new();
        assert!(!col.is_loading());
        let (_t1, g1) = col.begin_load();
        let (_t2, g2) = col.begin_load();
        assert!(col.is_loading());
        drop(g1);
        assert!(col.is_loading());
        drop(g2);
        assert!(!col.is_loading());
    }

    #[test]
    fn reorder_scenario_c_to_front() {
        let col = loaded(vec![row("a", 0), row("b", 1), row("c", 2)]);
        assert!(col.reorder(2, 0).unwrap());
        assert_eq!(ids(&col), vec!["c", "a", "b"]);
        assert_eq!(positions(&col), vec![0, 1, 2]);

        let pending: Vec<_> = col.unconfirmed().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(pending, vec!["c", "a", "b"]);
    }

    #[test]
    fn reorder_by_id_onto_itself_is_noop() {
        let col = loaded(vec![row("a", 0), row("b", 1)]);
        let rx = col.subscribe();
        let a = EntityId::from("a");
        assert!(!col.reorder_by_id(&a, &a));
        assert!(!col.reorder_by_id(&a, &EntityId::from("missing")));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn update_touches_only_its_entity() {
        let col = loaded(vec![row("a", 0), row("b", 1), row("c", 2)]);
        let before = col.snapshot();

        let mut b = row("b", 1);
        b.label = "renamed".into();
        assert!(col.apply_updated_ordered(col.issue(), b));

        let after = col.snapshot();
        assert_eq!(ids(&col), vec!["a", "b", "c"]);
        assert_eq!(after[1].label, "renamed");
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
    }

    #[test]
    fn update_sent_before_reorder_keeps_local_position() {
        let col = loaded(vec![row("a", 0), row("b", 1), row("c", 2)]);
        let ticket = col.issue();
        assert!(col.reorder(1, 0).unwrap());

        let mut b = row("b", 1);
        b.label = "renamed".into();
        assert!(col.apply_updated_ordered(ticket, b));

        assert_eq!(ids(&col), vec!["b", "a", "c"]);
        assert_eq!(positions(&col), vec![0, 1, 2]);
        assert!(ordering::is_dense(col.snapshot().iter()));
        assert_eq!(col.snapshot()[0].label, "renamed");

        // the server still holds b=1, so both moved rows need writing
        let pending: Vec<_> = col.unconfirmed().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(pending, vec!["b", "a"]);
    }

    #[test]
    fn update_sent_after_reorder_takes_server_position() {
        let col = loaded(vec![row("a", 0), row("b", 1)]);
        assert!(col.reorder(1, 0).unwrap());

        // position write-back for b
        assert!(col.apply_updated_ordered(col.issue(), row("b", 0)));
        assert_eq!(positions(&col), vec![0, 1]);
        let pending: Vec<_> = col.unconfirmed().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(pending, vec!["a"]);
    }

    #[test]
    fn delete_renumbers_remaining() {
        let col = loaded(vec![row("a", 0), row("b", 1), row("c", 2), row("d", 3)]);
        assert!(col.apply_deleted_ordered(col.issue(), &EntityId::from("b")));
        assert_eq!(ids(&col), vec!["a", "c", "d"]);
        assert_eq!(positions(&col), vec![0, 1, 2]);
    }

    #[test]
    fn create_inserts_at_returned_position() {
        let col = loaded(vec![row("a", 0), row("b", 1)]);
        assert_eq!(col.append_position(), 2);
        assert!(col.apply_created_ordered(col.issue(), row("n", 2)));
        assert_eq!(ids(&col), vec!["a", "b", "n"]);

        // a server that echoes a lower position places the row there
        assert!(col.apply_created_ordered(col.issue(), row("m", 0)));
        assert_eq!(ids(&col), vec!["a", "m", "b", "n"]);
        assert_eq!(positions(&col), vec![0, 1, 2, 3]);
    }

    #[test]
    fn create_after_sparse_load_sorts_by_count_position() {
        let col = loaded(vec![row("a", 0), row("d", 3)]);
        assert_eq!(positions(&col), vec![0, 3]);
        assert_eq!(col.append_position(), 2);

        assert!(col.apply_created_ordered(col.issue(), row("n", 2)));
        assert_eq!(ids(&col), vec!["a", "n", "d"]);
        assert_eq!(positions(&col), vec![0, 1, 2]);
    }

    #[test]
    fn load_discards_optimistic_state() {
        let col = loaded(vec![row("a", 0), row("b", 1), row("c", 2)]);
        col.reorder(0, 2).unwrap();

        let (ticket, _guard) = col.begin_load();
        assert!(col.apply_load_ordered(ticket, vec![row("a", 0), row("b", 1)]));
        assert_eq!(ids(&col), vec!["a", "b"]);
        assert!(col.unconfirmed().is_empty());
    }

    #[test]
    fn stale_load_never_overwrites_newer_state() {
        let col: EntityCollection<Row> = EntityCollection::new();
        let (old, _g1) = col.begin_load();
        let (new, _g2) = col.begin_load();

        assert!(col.apply_load_ordered(new, vec![row("fresh", 0)]));
        assert!(!col.apply_load_ordered(old, vec![row("stale", 0)]));
        assert_eq!(ids(&col), vec!["fresh"]);
    }

    #[test]
    fn load_issued_before_reorder_is_stale() {
        let col = loaded(vec![row("a", 0), row("b", 1)]);
        let (ticket, _guard) = col.begin_load();
        col.reorder(1, 0).unwrap();
        assert!(!col.apply_load_ordered(ticket, vec![row("a", 0), row("b", 1)]));
        assert_eq!(ids(&col), vec!["b", "a"]);
    }

    #[test]
    fn mutation_response_older_than_applied_load_is_dropped() {
        let col = loaded(vec![row("a", 0)]);
        let create = col.issue();
        let (load, _guard) = col.begin_load();
        assert!(col.apply_load_ordered(load, vec![row("a", 0), row("n", 1)]));
        assert!(!col.apply_created_ordered(create, row("n", 1)));
        assert_eq!(ids(&col), vec!["a", "n"]);
    }

    #[test]
    fn unordered_collection_keeps_list_order() {
        let col: EntityCollection<Row> = EntityCollection::new();
        let (ticket, _guard) = col.begin_load();
        col.apply_load(ticket, vec![row("z", 9), row("y", 0)]);
        col.apply_created(col.issue(), row("x", 0));
        assert_eq!(ids(&col), vec!["z", "y", "x"]);

        col.apply_deleted(col.issue(), &EntityId::from("y"));
        assert_eq!(ids(&col), vec!["z", "x"]);
        // unordered deletes do not renumber
        assert_eq!(positions(&col), vec![9, 0]);
    }
}
