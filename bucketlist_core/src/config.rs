use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::category::{Categories, DEFAULT_CATEGORIES};

/// Startup configuration of the bucket list, usually read from a TOML file.
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketListConfig {
    /// The category names in display order.
    pub categories: Vec<String>,
    pub display_order: DisplayOrder,
    pub storage: StorageKeys,
}

/// How the items within one category section are ordered on screen. Storage
/// order is always insertion order regardless of this setting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayOrder {
    /// Most recently added first.
    #[default]
    NewestFirst,
    /// By name, ignoring case.
    Alphabetical,
}

/// The keys under which state is written to the key-value service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageKeys {
    /// Holds the JSON array of activity records.
    pub records: String,
    /// Holds the JSON integer counting how many activities were ever created.
    pub counter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    #[error("at least one category must be configured")]
    NoCategories,
    #[error("category names must not be blank")]
    BlankCategory,
    #[error("category `{0}` is configured more than once")]
    DuplicateCategory(String),
    #[error("storage keys must be non-empty and distinct")]
    InvalidStorageKeys,
}

impl Default for BucketListConfig {
    fn default() -> Self {
        BucketListConfig {
            categories: DEFAULT_CATEGORIES.iter().map(|&name| name.to_owned()).collect(),
            display_order: DisplayOrder::default(),
            storage: StorageKeys::default(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        StorageKeys { records: "bucketList".to_owned(), counter: "numActivitiesCreated".to_owned() }
    }
}

impl BucketListConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BucketListConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        let mut seen = HashSet::new();
        for name in &self.categories {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankCategory);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateCategory(name.clone()));
            }
        }

        let StorageKeys { records, counter } = &self.storage;
        if records.is_empty() || counter.is_empty() || records == counter {
            return Err(ConfigError::InvalidStorageKeys);
        }
        Ok(())
    }

    pub fn categories(&self) -> Categories {
        Categories::new(self.categories.clone())
    }
}
