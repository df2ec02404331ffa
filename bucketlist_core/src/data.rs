//! The business state of the bucket list: activity records, the configured
//! categories and the store that owns both.

pub mod activity;
pub mod category;
pub mod store;
