// ── Ordering engine ──
//
// Total, contiguous order over an ordering domain (all rules, or all NAT
// rules). Storage is an `IndexMap` keyed by id whose iteration order *is*
// the display order; `position` mirrors the index after every local
// mutation.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::EntityId;

/// An entity that occupies a slot in an ordering domain.
pub trait Ordered {
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

pub(crate) type OrderedMap<T> = IndexMap<EntityId, Arc<T>>;

/// Position assigned to a new entity appended to a domain of `len` items.
///
/// This is the count, not `max(position) + 1`; a domain still holding
/// sparse server positions gets the new entity sorted in before its tail.
pub fn append_position(len: usize) -> i64 {
    index_to_position(len)
}

fn index_to_position(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Reassign `position = index` to every item, in iteration order.
///
/// Only touched items are cloned (`Arc::make_mut`), so snapshots already
/// handed out keep their old values.
pub(crate) fn renumber<T: Ordered + Clone>(items: &mut OrderedMap<T>) {
    for (index, item) in items.values_mut().enumerate() {
        let position = index_to_position(index);
        if item.position() != position {
            Arc::make_mut(item).set_position(position);
        }
    }
}

/// Move the item at `from` to `to`, shifting everything in between, then
/// renumber. Returns whether the order changed.
pub(crate) fn move_index<T: Ordered + Clone>(
    items: &mut OrderedMap<T>,
    from: usize,
    to: usize,
) -> Result<bool, CoreError> {
    let len = items.len();
    if len < 2 {
        return Ok(false);
    }
    if from >= len || to >= len {
        return Err(CoreError::validation(format!(
            "Cannot move from {from} to {to}: only {len} items"
        )));
    }
    if from == to {
        return Ok(false);
    }

    items.move_index(from, to);
    renumber(items);
    Ok(true)
}

/// Resolve a drag source / drop target pair to indices.
///
/// `None` when either id is unknown or both are the same entity.
pub(crate) fn resolve_drop<T>(
    items: &OrderedMap<T>,
    source: &EntityId,
    target: &EntityId,
) -> Option<(usize, usize)> {
    if source == target {
        return None;
    }
    let from = items.get_index_of(source)?;
    let to = items.get_index_of(target)?;
    Some((from, to))
}

/// Stable sort by `position`; equal positions keep their current order.
pub(crate) fn sort_by_position<T: Ordered>(items: &mut OrderedMap<T>) {
    items.sort_by(|_, a, _, b| a.position().cmp(&b.position()));
}

/// Build an ordered map from a server list: sorted by position, ties in
/// list order. Server positions are kept as they are.
pub(crate) fn from_server_list<T: Ordered>(
    list: impl IntoIterator<Item = (EntityId, T)>,
) -> OrderedMap<T> {
    let mut items: OrderedMap<T> = list
        .into_iter()
        .map(|(id, item)| (id, Arc::new(item)))
        .collect();
    sort_by_position(&mut items);
    items
}

/// `true` when positions are exactly `0..len` in iteration order.
pub fn is_dense<'a, T: Ordered + 'a>(items: impl IntoIterator<Item = &'a Arc<T>>) -> bool {
    items
        .into_iter()
        .enumerate()
        .all(|(i, item)| item.position() == index_to_position(i))
}
