//! Core of the bucket list: the activity store, its write-through persistence
//! and the category-grouped view that is kept in step with it.

pub mod config;
pub mod data;
pub mod digest;
pub mod sync;
pub mod view;

pub use config::{BucketListConfig, ConfigError, DisplayOrder, StorageKeys};
pub use data::{
    activity::{Activity, ActivityDraft, ActivityId, FormRecord, ValidationError},
    category::Categories,
    store::{ActivityList, ActivityStore, StoreError},
};
pub use sync::{
    kv::{KeyValueStore, KvError, MemoryKeyValueStore},
    persistence::{Persistence, PersistenceError, Snapshot},
};
pub use view::{
    patch::ViewPatch,
    synchronizer::{Interaction, UiEvent, ViewSynchronizer},
    Surface,
};
