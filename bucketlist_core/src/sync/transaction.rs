use thiserror::Error;

use crate::data::{
    activity::{Activity, ActivityId, ValidationError},
    store::ActivityList,
};

/// A transaction that can be executed on some type `V`, modifying it.
pub trait Transaction<V> {
    type Output;

    /// Executes the transaction on the given `V`, modifying it. If the
    /// transaction is successful, returns its output along with a function that
    /// can be used to roll back the transaction; when given a `V` in the exact
    /// state after this transaction executed, the rollback restores the state
    /// from before it executed. If the execution is unsuccessful, the `V` must
    /// remain unchanged.
    fn execute(&self, value: &mut V) -> Result<(Self::Output, Rollback<V>), TransactionError>;
}

pub type Rollback<V> = Box<dyn Fn(&mut V)>;

/// Error type for executing transactions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("no activity with id {0}")]
    NotFound(ActivityId),
}

/// The only ways the activity collection can change. Inputs are expected to
/// be validated by the store before a transaction is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTransaction {
    Add { name: String, category: String },
    SetCompleted { id: ActivityId, completed: bool },
    Rename { id: ActivityId, name: String },
    Remove { id: ActivityId },
}

impl Transaction<ActivityList> for StoreTransaction {
    /// The affected activity: as it is after the change, or as it was before
    /// removal.
    type Output = Activity;

    fn execute(
        &self,
        list: &mut ActivityList,
    ) -> Result<(Activity, Rollback<ActivityList>), TransactionError> {
        match self {
            StoreTransaction::Add { name, category } => {
                if name.trim().is_empty() {
                    return Err(ValidationError::EmptyName.into());
                }
                let id = list.gen_unique_id();
                let activity =
                    Activity { id, name: name.clone(), category: category.clone(), completed: false };
                list.records.push(activity.clone());
                // the counter is left as is; IDs are never handed out twice
                let rollback: Rollback<ActivityList> = Box::new(move |list: &mut ActivityList| {
                    if let Some(index) = list.position(id) {
                        list.records.remove(index);
                    }
                });
                Ok((activity, rollback))
            }
            &StoreTransaction::SetCompleted { id, completed } => {
                let activity = list.get_mut(id).ok_or(TransactionError::NotFound(id))?;
                let previous = activity.completed;
                activity.completed = completed;
                let rollback: Rollback<ActivityList> = Box::new(move |list: &mut ActivityList| {
                    if let Some(activity) = list.get_mut(id) {
                        activity.completed = previous;
                    }
                });
                Ok((activity.clone(), rollback))
            }
            StoreTransaction::Rename { id, name } => {
                let id = *id;
                if name.trim().is_empty() {
                    return Err(ValidationError::EmptyName.into());
                }
                let activity = list.get_mut(id).ok_or(TransactionError::NotFound(id))?;
                let previous = std::mem::replace(&mut activity.name, name.clone());
                let renamed = activity.clone();
                let rollback: Rollback<ActivityList> = Box::new(move |list: &mut ActivityList| {
                    if let Some(activity) = list.get_mut(id) {
                        activity.name = previous.clone();
                    }
                });
                Ok((renamed, rollback))
            }
            &StoreTransaction::Remove { id } => {
                let index = list.position(id).ok_or(TransactionError::NotFound(id))?;
                let removed = list.records.remove(index);
                let restored = removed.clone();
                let rollback: Rollback<ActivityList> = Box::new(move |list: &mut ActivityList| {
                    let index = index.min(list.records.len());
                    list.records.insert(index, restored.clone());
                });
                Ok((removed, rollback))
            }
        }
    }
}
