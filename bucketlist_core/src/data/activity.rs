use std::{collections::HashMap, fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the form field holding the activity name.
pub const NAME_FIELD: &str = "activityName";
/// Name of the form field holding the activity category.
pub const CATEGORY_FIELD: &str = "activityCategory";

/// A plain field-name to value mapping produced by the input collector.
pub type FormRecord = HashMap<String, String>;

/// A unique ID that refers to an activity.
///
/// IDs are handed out in strictly increasing order and are never reused, not
/// even after the activity they referred to has been removed.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActivityId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ActivityId)
    }
}

/// A single entry on the bucket list.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    /// What the user wants to do, e.g. "Climb a mountain". Never blank.
    pub name: String,
    /// The configured category this activity was filed under.
    pub category: String,
    #[serde(default)]
    pub completed: bool,
}

/// The name/category pair the user submitted, before it has been checked
/// against the store.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ActivityDraft {
    pub name: String,
    pub category: String,
}

impl ActivityDraft {
    /// Picks the activity fields out of a submitted form.
    pub fn from_form(form: &FormRecord) -> Result<Self, ValidationError> {
        let field = |key: &'static str| {
            form.get(key).cloned().ok_or(ValidationError::MissingField(key))
        };
        Ok(ActivityDraft { name: field(NAME_FIELD)?, category: field(CATEGORY_FIELD)? })
    }
}

/// Input that was rejected before it reached the activity collection.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("activity name must not be empty")]
    EmptyName,
    #[error("`{0}` is not a configured category")]
    UnknownCategory(String),
    #[error("form field `{0}` is missing")]
    MissingField(&'static str),
}

/// Trims the name and rejects it if nothing is left.
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_owned())
}
