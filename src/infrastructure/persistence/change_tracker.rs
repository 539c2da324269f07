//! Change tracker for the unit of work
//!
//! Each tracked instance is one entry holding its state, the pending
//! `ActiveModel` and the last persisted snapshot. Entries of different
//! entity types live side by side behind the object-safe [`TrackedEntry`].

use std::any::Any;
use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, ModelTrait, PrimaryKeyToColumn, Value,
};

use crate::domain::AuditTimestamps;

/// State of a tracked instance since the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Unchanged,
    Deleted,
}

impl EntryState {
    pub fn is_pending(self) -> bool {
        self != EntryState::Unchanged
    }
}

/// Table name plus primary key values. Identity of a persisted row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityKey {
    table: String,
    values: Vec<Value>,
}

impl EntityKey {
    pub fn of<E: EntityTrait>(model: &E::Model) -> Self {
        let values = E::PrimaryKey::iter()
            .map(|pk| model.get(pk.into_column()))
            .collect();
        Self {
            table: E::default().table_name().to_owned(),
            values,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Hashable rendering used to index entries.
    fn identity(&self) -> String {
        format!("{}:{:?}", self.table, self.values)
    }
}

/// Handle returned when an entry is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryId(u64);

/// Type-erased view of one tracked instance.
#[async_trait]
pub trait TrackedEntry: Send + Sync {
    fn id(&self) -> EntryId;

    fn state(&self) -> EntryState;

    /// `None` until an added entry has been persisted.
    fn key(&self) -> Option<&EntityKey>;

    fn stamp_audit_timestamps(&mut self, now: DateTimeUtc);

    /// Write the pending change inside `txn`. State is left untouched
    /// until [`TrackedEntry::accept_changes`].
    async fn flush(&mut self, txn: &DatabaseTransaction) -> Result<(), DbErr>;

    /// Promote a flushed change. Returns `false` when the entry must be
    /// detached.
    fn accept_changes(&mut self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct TypedEntry<E: EntityTrait> {
    id: EntryId,
    state: EntryState,
    key: Option<EntityKey>,
    current: E::ActiveModel,
    snapshot: Option<E::Model>,
    flushed: Option<E::Model>,
}

impl<E> TypedEntry<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
{
    pub(crate) fn snapshot(&self) -> Option<&E::Model> {
        self.snapshot.as_ref()
    }
}

#[async_trait]
impl<E> TrackedEntry for TypedEntry<E>
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
    fn id(&self) -> EntryId {
        self.id
    }

    fn state(&self) -> EntryState {
        self.state
    }

    fn key(&self) -> Option<&EntityKey> {
        self.key.as_ref()
    }

    fn stamp_audit_timestamps(&mut self, now: DateTimeUtc) {
        match self.state {
            EntryState::Added => self.current.set_created_on(now),
            EntryState::Modified => self.current.set_updated_on(now),
            EntryState::Unchanged | EntryState::Deleted => {}
        }
    }

    async fn flush(&mut self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        self.flushed = match self.state {
            EntryState::Added => Some(self.current.clone().insert(txn).await?),
            EntryState::Modified => Some(self.current.clone().update(txn).await?),
            EntryState::Deleted => {
                let result = self.current.clone().delete(txn).await?;
                if result.rows_affected == 0 {
                    tracing::debug!("Delete on {:?} affected no rows", self.key);
                }
                None
            }
            EntryState::Unchanged => None,
        };
        Ok(())
    }

    fn accept_changes(&mut self) -> bool {
        match self.state {
            EntryState::Added | EntryState::Modified => {
                if let Some(model) = self.flushed.take() {
                    self.key = Some(EntityKey::of::<E>(&model));
                    self.current = model.clone().into_active_model();
                    self.snapshot = Some(model);
                }
                self.state = EntryState::Unchanged;
                true
            }
            EntryState::Deleted => false,
            EntryState::Unchanged => true,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Every non-key column of `model` marked for writing.
fn all_columns_modified<E>(model: E::Model) -> E::ActiveModel
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E>,
{
    let mut active = model.clone().into_active_model();
    for column in E::Column::iter() {
        if !is_primary_key::<E>(&column) {
            active.set(column, model.get(column));
        }
    }
    active
}

/// Only the columns that differ from `snapshot` marked for writing.
fn changed_columns<E>(snapshot: &E::Model, model: E::Model) -> E::ActiveModel
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E>,
{
    let mut active = model.clone().into_active_model();
    for column in E::Column::iter() {
        let value = model.get(column);
        if !is_primary_key::<E>(&column) && snapshot.get(column) != value {
            active.set(column, value);
        }
    }
    active
}

fn is_primary_key<E: EntityTrait>(column: &E::Column) -> bool {
    E::PrimaryKey::iter().any(|pk| pk.into_column().as_str() == column.as_str())
}

/// In-memory record of every instance tracked by one persistence context.
#[derive(Default)]
pub struct ChangeTracker {
    entries: Vec<Box<dyn TrackedEntry>>,
    /// Key identity to position in `entries`.
    index: HashMap<String, usize>,
    next_id: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries a commit would write.
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state().is_pending())
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.pending_count() > 0
    }

    /// State and key of every tracked entry, in registration order.
    pub fn states(&self) -> Vec<(EntryState, Option<EntityKey>)> {
        self.entries
            .iter()
            .map(|entry| (entry.state(), entry.key().cloned()))
            .collect()
    }

    /// Detach everything, discarding pending changes.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn stamp_audit_timestamps(&mut self, now: DateTimeUtc) {
        for entry in &mut self.entries {
            entry.stamp_audit_timestamps(now);
        }
    }

    pub(crate) fn pending_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn TrackedEntry>> {
        self.entries
            .iter_mut()
            .filter(|entry| entry.state().is_pending())
    }

    /// Called once the flush transaction has committed.
    pub fn accept_all_changes(&mut self) {
        self.entries.retain_mut(|entry| entry.accept_changes());
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| entry.key().map(|key| (key.identity(), position)))
            .collect();
    }

    fn next_entry_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    fn position(&self, key: &EntityKey) -> Option<usize> {
        self.index.get(&key.identity()).copied()
    }

    fn push<E>(
        &mut self,
        state: EntryState,
        key: Option<EntityKey>,
        current: E::ActiveModel,
        snapshot: Option<E::Model>,
    ) -> EntryId
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
        let id = self.next_entry_id();
        if let Some(key) = &key {
            self.index.insert(key.identity(), self.entries.len());
        }
        self.entries.push(Box::new(TypedEntry::<E> {
            id,
            state,
            key,
            current,
            snapshot,
            flushed: None,
        }));
        id
    }

    fn typed<E>(&self, id: EntryId) -> Option<&TypedEntry<E>>
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
        self.entries
            .iter()
            .find(|entry| entry.id() == id)
            .and_then(|entry| entry.as_any().downcast_ref::<TypedEntry<E>>())
    }

    /// Register a new record to be inserted on the next commit.
    pub fn track_added<E>(&mut self, entity: E::ActiveModel) -> EntryId
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
        self.push::<E>(EntryState::Added, None, entity, None)
    }

    /// Register a snapshot read from the store.
    ///
    /// An existing `Unchanged` entry for the same row is refreshed; a pending
    /// one is left alone so uncommitted changes are never overwritten.
    pub fn track_unchanged<E>(&mut self, model: E::Model) -> EntryId
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
        let key = EntityKey::of::<E>(&model);
        if let Some(index) = self.position(&key) {
            let entry = &mut self.entries[index];
            let id = entry.id();
            if entry.state() == EntryState::Unchanged
                && let Some(typed) = entry.as_any_mut().downcast_mut::<TypedEntry<E>>()
            {
                typed.current = model.clone().into_active_model();
                typed.snapshot = Some(model);
            }
            return id;
        }
        let current = model.clone().into_active_model();
        self.push::<E>(EntryState::Unchanged, Some(key), current, Some(model))
    }

    /// Mark a record as modified.
    ///
    /// When a snapshot of the same row is tracked only the columns that
    /// differ from it are written; otherwise every non-key column is.
    pub fn track_modified<E>(&mut self, model: E::Model) -> EntryId
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
        let key = EntityKey::of::<E>(&model);
        if let Some(index) = self.position(&key)
            && let Some(typed) = self.entries[index]
                .as_any_mut()
                .downcast_mut::<TypedEntry<E>>()
        {
            typed.current = match typed.snapshot.as_ref() {
                Some(snapshot) => changed_columns::<E>(snapshot, model),
                None => all_columns_modified::<E>(model),
            };
            typed.state = EntryState::Modified;
            return typed.id;
        }
        let current = all_columns_modified::<E>(model);
        self.push::<E>(EntryState::Modified, Some(key), current, None)
    }

    /// Mark a record for removal on the next commit.
    pub fn track_deleted<E>(&mut self, model: E::Model) -> EntryId
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
        let key = EntityKey::of::<E>(&model);
        if let Some(index) = self.position(&key)
            && let Some(typed) = self.entries[index]
                .as_any_mut()
                .downcast_mut::<TypedEntry<E>>()
        {
            typed.current = model.into_active_model();
            typed.state = EntryState::Deleted;
            return typed.id;
        }
        let current = model.into_active_model();
        self.push::<E>(EntryState::Deleted, Some(key), current, None)
    }

    /// Last persisted snapshot of an entry, if it is still tracked.
    pub fn snapshot<E>(&self, id: EntryId) -> Option<E::Model>
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
        self.typed::<E>(id)
            .and_then(|entry| entry.snapshot())
            .cloned()
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("entries", &self.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}
