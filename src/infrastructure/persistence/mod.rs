//! Unit of work: persistence context and change tracker

pub mod change_tracker;
pub mod context;

pub use change_tracker::{ChangeTracker, EntityKey, EntryId, EntryState, TrackedEntry};
pub use context::PersistenceContext;
