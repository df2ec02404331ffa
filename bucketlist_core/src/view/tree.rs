use crate::data::activity::ActivityId;

use super::{
    model::{ItemState, ViewModel},
    node::{Control, Node, Role},
    patch::ViewPatch,
    synchronizer::{Interaction, UiEvent},
    Surface,
};

/// ID of the element that holds all category sections.
pub const ROOT_ID: &str = "bucketLists";

/// A [`Surface`] that keeps the displayed tree in memory as [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    root: Node,
    input_resets: usize,
}

impl Default for NodeTree {
    fn default() -> Self {
        NodeTree { root: Node::new("div").attr("id", ROOT_ID), input_resets: 0 }
    }
}

impl NodeTree {
    pub fn new() -> Self {
        NodeTree::default()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// How many times the input form was reset.
    pub fn input_resets(&self) -> usize {
        self.input_resets
    }

    pub fn section(&self, category: &str) -> Option<&Node> {
        self.root.child_with_role(&Role::Section(category.to_owned()))
    }

    pub fn item(&self, id: ActivityId) -> Option<&Node> {
        self.lists().flat_map(|list| &list.children).find(|item| item.item_id() == Some(id))
    }

    pub fn is_checked(&self, id: ActivityId) -> bool {
        self.item(id)
            .and_then(|item| item.child_with_role(&Role::Control(Control::Toggle)))
            .is_some_and(|toggle| toggle.attribute("checked").is_some())
    }

    /// Reads the view model back out of the tree.
    pub fn to_model(&self) -> ViewModel {
        let mut model = ViewModel::new();
        for section in &self.root.children {
            let Some(Role::Section(category)) = &section.role else {
                continue;
            };
            let Some(list) = section.child_with_role(&Role::List(category.clone())) else {
                continue;
            };
            let items: Vec<ActivityId> = list.children.iter().filter_map(Node::item_id).collect();
            model.insert_section(model.section_count(), category, items);
            for item in &list.children {
                if let Some(id) = item.item_id() {
                    model.set_item(id, shown_state(item));
                }
            }
        }
        model
    }

    /// Turns an interaction with the node at `path` (child indices from the
    /// root) into an event. The target may be a control or any element nested
    /// inside one; the item is found by walking up from the control.
    pub fn resolve(&self, path: &[usize], interaction: Interaction) -> Option<UiEvent> {
        let mut ancestors = vec![&self.root];
        let mut node = &self.root;
        for &index in path {
            node = node.children.get(index)?;
            ancestors.push(node);
        }

        let mut nearest = ancestors.iter().rev();
        let control = nearest.by_ref().find_map(|node| match node.role {
            Some(Role::Control(control)) => Some(control),
            _ => None,
        })?;
        let id = nearest.find_map(|node| node.item_id())?;
        UiEvent::from_interaction(id, control, interaction)
    }

    /// Flips a checkbox without telling anyone, like a click does before its
    /// handler runs.
    pub fn click_toggle(&mut self, id: ActivityId) {
        let toggle = self
            .item_mut(id)
            .and_then(|item| item.child_with_role_mut(&Role::Control(Control::Toggle)));
        if let Some(toggle) = toggle {
            if toggle.attribute("checked").is_some() {
                toggle.remove_attr("checked");
            } else {
                toggle.set_attr("checked", "");
            }
        }
    }

    fn lists(&self) -> impl Iterator<Item = &Node> {
        self.root.children.iter().filter_map(|section| match &section.role {
            Some(Role::Section(category)) => section.child_with_role(&Role::List(category.clone())),
            _ => None,
        })
    }

    fn list_mut(&mut self, category: &str) -> Option<&mut Node> {
        self.root
            .child_with_role_mut(&Role::Section(category.to_owned()))?
            .child_with_role_mut(&Role::List(category.to_owned()))
    }

    fn item_mut(&mut self, id: ActivityId) -> Option<&mut Node> {
        self.root
            .children
            .iter_mut()
            .flat_map(|section| section.children.iter_mut())
            .filter(|child| matches!(child.role, Some(Role::List(_))))
            .flat_map(|list| list.children.iter_mut())
            .find(|item| item.item_id() == Some(id))
    }
}

fn shown_state(item: &Node) -> ItemState {
    let name = item.child_with_role(&Role::Name).and_then(|label| label.text.clone());
    let completed = item
        .child_with_role(&Role::Control(Control::Toggle))
        .is_some_and(|toggle| toggle.attribute("checked").is_some());
    ItemState { name: name.unwrap_or_default(), completed }
}

impl Surface for NodeTree {
    fn apply(&mut self, patch: &ViewPatch) {
        match patch {
            ViewPatch::InsertSection { index, node, .. } => {
                let index = (*index).min(self.root.children.len());
                self.root.children.insert(index, node.clone());
            }
            ViewPatch::RemoveSection { category } => {
                let role = Role::Section(category.clone());
                self.root.children.retain(|section| section.role.as_ref() != Some(&role));
            }
            ViewPatch::InsertItem { category, index, node } => {
                if let Some(list) = self.list_mut(category) {
                    let index = (*index).min(list.children.len());
                    list.children.insert(index, node.clone());
                }
            }
            ViewPatch::RemoveItem { category, id } => {
                if let Some(list) = self.list_mut(category) {
                    list.children.retain(|item| item.item_id() != Some(*id));
                }
            }
            ViewPatch::SetCompleted { id, completed } => {
                let toggle = self
                    .item_mut(*id)
                    .and_then(|item| item.child_with_role_mut(&Role::Control(Control::Toggle)));
                if let Some(toggle) = toggle {
                    if *completed {
                        toggle.set_attr("checked", "");
                    } else {
                        toggle.remove_attr("checked");
                    }
                }
            }
            ViewPatch::SetName { id, name } => {
                let label = self.item_mut(*id).and_then(|item| item.child_with_role_mut(&Role::Name));
                if let Some(label) = label {
                    label.text = Some(name.clone());
                }
            }
            ViewPatch::MoveItem { category, id, index } => {
                if let Some(list) = self.list_mut(category) {
                    if let Some(from) = list.children.iter().position(|item| item.item_id() == Some(*id)) {
                        let item = list.children.remove(from);
                        let index = (*index).min(list.children.len());
                        list.children.insert(index, item);
                    }
                }
            }
            ViewPatch::ResetInput => self.input_resets += 1,
        }
    }
}
