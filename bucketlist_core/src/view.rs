//! The category-grouped view of the activity collection. Tree construction
//! (`node`) is pure; the synchronizer computes minimal edits (`patch`) that a
//! [`Surface`] carries out.

pub mod model;
pub mod node;
pub mod patch;
pub mod synchronizer;
pub mod tree;

use patch::ViewPatch;

/// Something that displays the view, e.g. the DOM or the in-memory
/// [`tree::NodeTree`].
pub trait Surface {
    /// Carries out one edit. Edits referring to sections or items the surface
    /// does not know about are ignored.
    fn apply(&mut self, patch: &ViewPatch);
}
