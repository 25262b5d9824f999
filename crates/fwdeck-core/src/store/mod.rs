// ── Reactive data store ──
//
// Ordered entity storage with push-based change notification and
// per-collection request sequencing.

mod collection;
mod data_store;
mod sequence;

pub(crate) use collection::EntityCollection;
pub(crate) use sequence::Ticket;
pub use data_store::DataStore;
