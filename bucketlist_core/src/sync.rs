//! Keeping the persisted copy of the activity collection in step with the
//! in-memory one: the key-value service seam, the persistence bridge and the
//! transactions that can be rolled back when a write fails.

pub mod kv;
pub mod persistence;
pub mod transaction;
