//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - Database connection and migrations (db)
//! - Unit of work: persistence context and change tracker (persistence)
//! - Repository implementations (repositories)
//! - Demo data (seed)

pub mod config;
pub mod db;
pub mod persistence;
pub mod repositories;
pub mod seed;

pub use persistence::PersistenceContext;
pub use repositories::*;
