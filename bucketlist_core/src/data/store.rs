use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::sync::{
    kv::KeyValueStore,
    persistence::{Persistence, PersistenceError, Snapshot},
    transaction::{StoreTransaction, Transaction, TransactionError},
};

use super::{
    activity::{normalize_name, Activity, ActivityId, ValidationError},
    category::Categories,
};

/// The in-memory activity collection together with its ID counter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivityList {
    manifest: ListManifest,
    /// Activities in insertion order.
    pub(crate) records: Vec<Activity>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ListManifest {
    /// How many IDs have been handed out. The last ID handed out equals this
    /// number; the next one is one more.
    num_created: u64,
}

/// Owns the activity collection. Every mutation goes through here and is
/// written through to persistence before the call returns.
#[derive(Debug)]
pub struct ActivityStore<K> {
    list: ActivityList,
    categories: Categories,
    persistence: Persistence<K>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no activity with id {0}")]
    NotFound(ActivityId),
    #[error("failed to persist activities")]
    Persistence(#[from] PersistenceError),
}

impl From<TransactionError> for StoreError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Invalid(err) => StoreError::Validation(err),
            TransactionError::NotFound(id) => StoreError::NotFound(id),
        }
    }
}

impl ActivityList {
    pub fn new() -> Self {
        ActivityList::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot { activities, num_created } = snapshot;
        ActivityList { manifest: ListManifest { num_created }, records: activities }
    }

    // Returns a unique `ActivityId` and marks that ID as used. Panics if the ID
    // space is exhausted.
    pub(crate) fn gen_unique_id(&mut self) -> ActivityId {
        let next = self.manifest.num_created.checked_add(1).expect("activity id space exhausted");
        self.manifest.num_created = next;
        ActivityId(next)
    }

    pub fn num_created(&self) -> u64 {
        self.manifest.num_created
    }

    pub fn records(&self) -> &[Activity] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, id: ActivityId) -> Option<usize> {
        self.records.iter().position(|activity| activity.id == id)
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.records.iter().find(|activity| activity.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ActivityId) -> Option<&mut Activity> {
        self.records.iter_mut().find(|activity| activity.id == id)
    }

    /// Activities filed under the category, in insertion order.
    pub fn by_category(&self, category: &str) -> Vec<&Activity> {
        self.records.iter().filter(|activity| activity.category == category).collect()
    }
}

impl<K: KeyValueStore> ActivityStore<K> {
    /// Hydrates the store from whatever was last persisted.
    pub fn open(categories: Categories, persistence: Persistence<K>) -> Self {
        let list = ActivityList::from_snapshot(persistence.load());
        for activity in list.records() {
            if !categories.contains(&activity.category) {
                warn!(
                    id = %activity.id,
                    category = %activity.category,
                    "activity belongs to a category that is no longer configured"
                );
            }
        }
        info!(activities = list.len(), num_created = list.num_created(), "opened activity store");
        ActivityStore { list, categories, persistence }
    }

    /// Creates an activity at the end of the collection.
    pub fn add(&mut self, name: &str, category: &str) -> Result<Activity, StoreError> {
        let name = normalize_name(name)?;
        self.categories.check(category)?;

        let activity =
            self.commit(StoreTransaction::Add { name, category: category.to_owned() })?;
        info!(id = %activity.id, category = %activity.category, "added activity");
        Ok(activity)
    }

    pub fn set_completed(&mut self, id: ActivityId, completed: bool) -> Result<(), StoreError> {
        self.commit(StoreTransaction::SetCompleted { id, completed })?;
        debug!(%id, completed, "set activity completion");
        Ok(())
    }

    /// Gives an existing activity a new name.
    pub fn rename(&mut self, id: ActivityId, name: &str) -> Result<Activity, StoreError> {
        let name = normalize_name(name)?;
        let activity = self.commit(StoreTransaction::Rename { id, name })?;
        info!(%id, "renamed activity");
        Ok(activity)
    }

    /// Deletes the activity and returns it. Its ID is not reused.
    pub fn remove(&mut self, id: ActivityId) -> Result<Activity, StoreError> {
        let activity = self.commit(StoreTransaction::Remove { id })?;
        info!(%id, category = %activity.category, "removed activity");
        Ok(activity)
    }

    /// Executes the transaction and writes the result through. If the write
    /// fails, the in-memory change is rolled back and the error returned.
    fn commit(&mut self, transaction: StoreTransaction) -> Result<Activity, StoreError> {
        let (activity, rollback) = transaction.execute(&mut self.list)?;
        if let Err(err) = self.persistence.save(self.list.records(), self.list.num_created()) {
            error!(error = &err as &dyn std::error::Error, ?transaction, "write-through failed; rolling back");
            rollback(&mut self.list);
            return Err(err.into());
        }
        Ok(activity)
    }
}

impl<K> ActivityStore<K> {
    /// Activities filed under the category, in insertion order.
    pub fn all_by_category(&self, category: &str) -> Vec<&Activity> {
        self.list.by_category(category)
    }

    /// The configured categories in display order.
    pub fn categories(&self) -> &[String] {
        self.categories.names()
    }

    pub fn category_set(&self) -> &Categories {
        &self.categories
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.list.get(id)
    }

    pub fn activities(&self) -> &[Activity] {
        self.list.records()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn num_created(&self) -> u64 {
        self.list.num_created()
    }

    pub fn persistence(&self) -> &Persistence<K> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence<K> {
        &mut self.persistence
    }
}
