use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{config::StorageKeys, data::activity::Activity};

use super::kv::{KeyValueStore, KvError};

/// Everything that survives a reload: the activity records and the number of
/// activities ever created, which is also the last ID handed out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub activities: Vec<Activity>,
    pub num_created: u64,
}

/// Writes the activity collection through to a [`KeyValueStore`] and reads it
/// back at startup.
#[derive(Debug)]
pub struct Persistence<K> {
    backend: K,
    keys: StorageKeys,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to serialize `{key}`")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write `{key}`")]
    Write {
        key: String,
        #[source]
        source: KvError,
    },
}

/// A stored value that could not be parsed. Never surfaced to callers; the
/// value is treated as if it had never been written.
#[derive(Debug, Error)]
#[error("stored value under `{key}` is corrupt")]
pub struct CorruptState {
    key: String,
    #[source]
    source: serde_json::Error,
}

impl<K: KeyValueStore> Persistence<K> {
    pub fn new(backend: K, keys: StorageKeys) -> Self {
        Persistence { backend, keys }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut K {
        &mut self.backend
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Reads the last saved snapshot. Missing or corrupt values yield an empty
    /// collection and a zero counter. The counter is raised to the highest
    /// loaded ID if it is behind, so that IDs can never be handed out twice.
    pub fn load(&self) -> Snapshot {
        let activities: Vec<Activity> = self.read_or_default(&self.keys.records);
        let stored_count: u64 = self.read_or_default(&self.keys.counter);

        let highest_id = activities.iter().map(|activity| activity.id.0).max().unwrap_or(0);
        if highest_id > stored_count {
            warn!(
                key = %self.keys.counter,
                stored_count,
                highest_id,
                "stored counter is behind the stored activities; raising it"
            );
        }

        debug!(activities = activities.len(), "loaded persisted activities");
        Snapshot { num_created: stored_count.max(highest_id), activities }
    }

    /// Writes the snapshot. The counter goes first, so that a failure between
    /// the two writes can only leave the counter ahead of the records.
    pub fn save(&mut self, activities: &[Activity], num_created: u64) -> Result<(), PersistenceError> {
        let counter = encode(&self.keys.counter, &num_created)?;
        let records = encode(&self.keys.records, activities)?;

        write(&mut self.backend, &self.keys.counter, &counter)?;
        write(&mut self.backend, &self.keys.records, &records)?;
        debug!(activities = activities.len(), num_created, "saved activities");
        Ok(())
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(corrupt) => {
                warn!(error = &corrupt as &dyn std::error::Error, "discarding corrupt persisted state");
                T::default()
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CorruptState> {
        let Some(raw) = self.backend.get_item(key) else {
            return Ok(None);
        };
        // a stored `null` counts as absent
        serde_json::from_str::<Option<T>>(&raw)
            .map_err(|source| CorruptState { key: key.to_owned(), source })
    }
}

fn encode<T: serde::Serialize + ?Sized>(key: &str, value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value)
        .map_err(|source| PersistenceError::Serialize { key: key.to_owned(), source })
}

fn write<K: KeyValueStore>(backend: &mut K, key: &str, value: &str) -> Result<(), PersistenceError> {
    backend
        .set_item(key, value)
        .map_err(|source| PersistenceError::Write { key: key.to_owned(), source })
}
