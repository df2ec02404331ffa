use std::collections::HashMap;

use thiserror::Error;

/// A synchronous, string-keyed and string-valued storage service, such as the
/// browser's `localStorage`.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key was never written.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores the value under the key, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), KvError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// An in-memory [`KeyValueStore`]. Can be given a byte quota and a set of keys
/// that refuse writes, to exercise the failure paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    items: HashMap<String, String>,
    /// Maximum total length of all keys and values, in bytes.
    quota: Option<usize>,
    failing_keys: Vec<String>,
    writes: usize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        MemoryKeyValueStore::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryKeyValueStore { quota: Some(quota), ..Default::default() }
    }

    /// Makes every later write to `key` fail with a backend error.
    pub fn fail_writes_to(&mut self, key: &str) {
        self.failing_keys.push(key.to_owned());
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        if self.failing_keys.iter().any(|k| k == key) {
            return Err(KvError::Backend(format!("writes to `{key}` are disabled")));
        }
        if let Some(quota) = self.quota {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(KvError::QuotaExceeded);
            }
        }
        self.items.insert(key.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_after_set() {
        let mut kv = MemoryKeyValueStore::new();
        assert_eq!(kv.get_item("a"), None);
        kv.set_item("a", "1").unwrap();
        kv.set_item("a", "2").unwrap();
        assert_eq!(kv.get_item("a"), Some("2".to_owned()));
        assert_eq!(kv.writes(), 2);
    }

    #[test]
    fn quota_counts_replaced_values_once() {
        let mut kv = MemoryKeyValueStore::with_quota(6);
        kv.set_item("ab", "1234").unwrap();
        // replacing the value does not count the old one against the quota
        kv.set_item("ab", "4321").unwrap();
        assert_eq!(kv.set_item("ab", "12345"), Err(KvError::QuotaExceeded));
        assert_eq!(kv.get_item("ab"), Some("4321".to_owned()));
    }

    #[test]
    fn failing_keys() {
        let mut kv = MemoryKeyValueStore::new();
        kv.fail_writes_to("b");
        kv.set_item("a", "1").unwrap();
        assert!(matches!(kv.set_item("b", "1"), Err(KvError::Backend(_))));
        assert_eq!(kv.get_item("b"), None);
    }
}
