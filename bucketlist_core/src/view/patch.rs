use crate::data::activity::ActivityId;

use super::node::Node;

/// One edit to the displayed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPatch {
    /// Shows a category section at the given position among visible sections.
    InsertSection { category: String, index: usize, node: Node },
    RemoveSection { category: String },
    /// Inserts an item at the given position within the section's list.
    InsertItem { category: String, index: usize, node: Node },
    RemoveItem { category: String, id: ActivityId },
    SetCompleted { id: ActivityId, completed: bool },
    SetName { id: ActivityId, name: String },
    MoveItem { category: String, id: ActivityId, index: usize },
    /// Clears the input form after a successful submission.
    ResetInput,
}
