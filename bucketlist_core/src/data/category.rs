use super::activity::ValidationError;

/// The categories shipped when no configuration overrides them.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Resor", "Äventyr", "Lärande", "Hobby"];

/// The fixed, ordered set of categories that activities can be filed under.
/// The order is the order in which category sections are displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories {
    names: Vec<String>,
}

impl Categories {
    /// Builds the set from already validated names (see
    /// [`crate::config::BucketListConfig::validate`]).
    pub fn new(names: Vec<String>) -> Self {
        Categories { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The display position of the category, if it is configured.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn check(&self, name: &str) -> Result<(), ValidationError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(ValidationError::UnknownCategory(name.to_owned()))
        }
    }
}

impl Default for Categories {
    fn default() -> Self {
        Categories::new(DEFAULT_CATEGORIES.iter().map(|&name| name.to_owned()).collect())
    }
}
