//! Domain layer - data access abstractions
//!
//! Trait definitions, query objects and domain error types.
//! Nothing here talks to a database.

pub mod entity;
pub mod errors;
pub mod query;
pub mod repositories;

pub use entity::AuditTimestamps;
pub use errors::DomainError;
pub use query::{Criterion, Filter, GetQuery, Operator};
pub use repositories::*;
