//! Domain entity capability
//!
//! A domain entity is any SeaORM entity whose `ActiveModel` implements
//! [`AuditTimestamps`]. The repository and the change tracker only ever
//! write audit columns through this trait.

use sea_orm::prelude::DateTimeUtc;

/// Audit columns maintained at commit time.
pub trait AuditTimestamps {
    /// Called for entries in the `Added` state.
    fn set_created_on(&mut self, at: DateTimeUtc);

    /// Called for entries in the `Modified` state.
    fn set_updated_on(&mut self, at: DateTimeUtc);
}
