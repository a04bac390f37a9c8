//! Shared, hierarchical memory model
//!
//! Role-partitioned append-only logs with namespace isolation and
//! role-based visibility. See [`store::MemoryStore`] for the read/write
//! contract and [`entry::Entry`] for the record shape.

pub mod entry;
pub mod external;
pub mod store;

pub use entry::{Entry, EntryKind, RolePartition};
pub use external::MessageStore;
pub use store::{MemoryStore, MemoryView, Projection};
