//! Repository trait definitions
//!
//! The contract for data access over one entity type.
//! The SeaORM implementation lives in the infrastructure layer.

use async_trait::async_trait;
use sea_orm::{EntityTrait, PrimaryKeyTrait};

use super::DomainError;
use super::query::{Filter, GetQuery};

/// Primary key value of an entity.
pub type PrimaryKeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// CRUD and query contract for one entity type.
///
/// Every mutating operation commits immediately.
#[async_trait]
pub trait Repository<E: EntityTrait>: Send {
    /// Persist a new record and return it as stored.
    ///
    /// Fails with `DomainError::InvalidArgument` when `entity` is `None`.
    async fn add(&mut self, entity: Option<E::ActiveModel>) -> Result<E::Model, DomainError>;

    /// Remove a record. `None` is a no-op.
    async fn delete(&mut self, entity: Option<E::Model>) -> Result<(), DomainError>;

    /// Query records of this type.
    async fn get(&mut self, query: GetQuery<E>) -> Result<Vec<E::Model>, DomainError>;

    /// Find a record by primary key.
    async fn get_by_id(&mut self, id: PrimaryKeyOf<E>) -> Result<Option<E::Model>, DomainError>;

    /// Overwrite a record. `None` is a no-op.
    async fn update(&mut self, entity: Option<E::Model>) -> Result<(), DomainError>;

    /// Stamp audit columns and flush every pending change as one unit of work.
    async fn commit(&mut self) -> Result<(), DomainError>;

    /// Count records matching `filter`, or all records.
    async fn count(&self, filter: Option<Filter<E>>) -> Result<u64, DomainError>;
}
