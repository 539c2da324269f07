//! SeaORM implementation of Repository for any audited entity

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, IntoActiveModel, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Related,
};

use crate::domain::{AuditTimestamps, DomainError, Filter, GetQuery, PrimaryKeyOf, Repository};
use crate::infrastructure::persistence::PersistenceContext;

/// Repository over one entity type, committing through an owned
/// [`PersistenceContext`].
pub struct GenericRepository<E: EntityTrait> {
    context: PersistenceContext,
    entity: E,
}

impl<E> GenericRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + ActiveModelBehavior
        + AuditTimestamps
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn new(context: PersistenceContext) -> Self {
        Self {
            context,
            entity: E::default(),
        }
    }

    pub fn context(&self) -> &PersistenceContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PersistenceContext {
        &mut self.context
    }

    /// Give the context back, e.g. to build a repository for another entity.
    pub fn into_context(self) -> PersistenceContext {
        self.context
    }

    /// Release the repository and its context.
    pub fn dispose(self) {
        tracing::debug!("Disposing repository for {}", self.entity.table_name());
        self.context.dispose();
    }

    /// Load matching records together with their related `R` records.
    ///
    /// `R` is already joined, so criteria may target its columns without
    /// [`Filter::join`]; joins carried by `filter` are not applied here.
    /// Results are detached.
    pub async fn get_with_related<R>(
        &self,
        related: R,
        filter: Option<Filter<E>>,
    ) -> Result<Vec<(E::Model, Vec<R::Model>)>, DomainError>
    where
        R: EntityTrait,
        E: Related<R>,
    {
        let mut query = E::find();
        if let Some(filter) = filter {
            query = query.filter(filter.into_condition());
        }

        let rows = query
            .find_with_related(related)
            .all(self.context.connection())
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl<E> Repository<E> for GenericRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: ActiveModelTrait<Entity = E>
        + ActiveModelBehavior
        + AuditTimestamps
        + Clone
        + Send
        + Sync
        + 'static,
{
    async fn add(&mut self, entity: Option<E::ActiveModel>) -> Result<E::Model, DomainError> {
        let entity =
            entity.ok_or_else(|| DomainError::invalid_argument("entity", "Entity can not be null"))?;

        let id = self
            .context
            .change_tracker_mut()
            .track_added::<E>(entity);
        self.commit().await?;

        self.context
            .change_tracker()
            .snapshot::<E>(id)
            .ok_or_else(|| {
                sea_orm::DbErr::RecordNotFound(format!(
                    "Added {} row was not returned by the store",
                    self.entity.table_name()
                ))
                .into()
            })
    }

    async fn delete(&mut self, entity: Option<E::Model>) -> Result<(), DomainError> {
        if let Some(entity) = entity {
            self.context
                .change_tracker_mut()
                .track_deleted::<E>(entity);
            self.commit().await?;
        }
        Ok(())
    }

    async fn get(&mut self, query: GetQuery<E>) -> Result<Vec<E::Model>, DomainError> {
        if query.has_pagination() {
            // page/size are carried but intentionally not applied
            tracing::debug!(
                "Pagination (page={}, size={}) is not applied to {} queries",
                query.page,
                query.size,
                self.entity.table_name()
            );
        }

        let mut select = E::find();

        if let Some(filter) = query.filter {
            select = filter.apply(select);
        }

        if !query.include.is_empty() {
            for relation in query.include {
                select = select.join(JoinType::LeftJoin, relation);
            }
            select = select.distinct();
        }

        let db = self.context.connection();
        let tracked = match query.order_by {
            Some(order_by) => {
                for (column, order) in order_by {
                    select = select.order_by(column, order);
                }
                true
            }
            None => query.is_tracking,
        };

        let models = select.all(db).await?;
        tracing::debug!(
            "Loaded {} {} row(s) (tracking: {})",
            models.len(),
            self.entity.table_name(),
            tracked
        );

        if tracked {
            let tracker = self.context.change_tracker_mut();
            for model in &models {
                tracker.track_unchanged::<E>(model.clone());
            }
        }

        Ok(models)
    }

    async fn get_by_id(&mut self, id: PrimaryKeyOf<E>) -> Result<Option<E::Model>, DomainError> {
        let model = E::find_by_id(id).one(self.context.connection()).await?;

        if let Some(model) = &model {
            self.context
                .change_tracker_mut()
                .track_unchanged::<E>(model.clone());
        }

        Ok(model)
    }

    async fn update(&mut self, entity: Option<E::Model>) -> Result<(), DomainError> {
        if let Some(entity) = entity {
            self.context
                .change_tracker_mut()
                .track_modified::<E>(entity);
            self.commit().await?;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let tracker = self.context.change_tracker_mut();
        if tracker.has_changes() {
            tracker.stamp_audit_timestamps(Utc::now());
        }
        self.context.commit().await?;
        Ok(())
    }

    async fn count(&self, filter: Option<Filter<E>>) -> Result<u64, DomainError> {
        let db = self.context.connection();
        let total = match filter {
            Some(filter) => filter.apply(E::find()).count(db).await?,
            None => E::find().count(db).await?,
        };
        Ok(total)
    }
}
