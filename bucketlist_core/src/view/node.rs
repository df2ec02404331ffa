use std::{fmt, str::FromStr};

use crate::data::{
    activity::{Activity, ActivityId},
    category::Categories,
};

/// Attribute carrying an item's activity ID in the rendered markup.
pub const ACTIVITY_ID_ATTR: &str = "data-activity-id";
/// Attribute carrying a section's category name in the rendered markup.
pub const CATEGORY_ATTR: &str = "data-category";
/// Attribute naming which control of an item an element is.
pub const CONTROL_ATTR: &str = "data-control";

pub const TOGGLE_LABEL: &str = "Har gjort";
pub const EDIT_LABEL: &str = "Ändra";
pub const DELETE_LABEL: &str = "Ta bort";

/// A description of one element of the view: its tag, attributes, text and
/// children, plus a typed role that ties it back to the view model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub tag: &'static str,
    /// Attributes in the order they were added.
    pub attributes: Vec<(&'static str, String)>,
    pub text: Option<String>,
    pub role: Option<Role>,
    pub children: Vec<Node>,
}

/// What an element means to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Section(String),
    List(String),
    /// The root element of an item. The ID is fixed when the item is built.
    Item(ActivityId),
    /// The label showing the activity name.
    Name,
    Control(Control),
}

/// The interactive parts of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Toggle,
    Edit,
    Delete,
}

impl Control {
    pub fn as_str(self) -> &'static str {
        match self {
            Control::Toggle => "toggle",
            Control::Edit => "edit",
            Control::Delete => "delete",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Control {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle" => Ok(Control::Toggle),
            "edit" => Ok(Control::Edit),
            "delete" => Ok(Control::Delete),
            _ => Err(()),
        }
    }
}

impl Node {
    pub fn new(tag: &'static str) -> Self {
        Node { tag, ..Default::default() }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(n, _)| *n == name).map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(n, _)| *n != name);
    }

    pub fn item_id(&self) -> Option<ActivityId> {
        match self.role {
            Some(Role::Item(id)) => Some(id),
            _ => None,
        }
    }

    /// The first direct child with the given role.
    pub fn child_with_role(&self, role: &Role) -> Option<&Node> {
        self.children.iter().find(|child| child.role.as_ref() == Some(role))
    }

    pub fn child_with_role_mut(&mut self, role: &Role) -> Option<&mut Node> {
        self.children.iter_mut().find(|child| child.role.as_ref() == Some(role))
    }

    /// Depth-first search for a node, returning the path of child indices
    /// leading to it from `self`.
    pub fn find_path(&self, predicate: &impl Fn(&Node) -> bool) -> Option<Vec<usize>> {
        if predicate(self) {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(index, child)| {
            child.find_path(predicate).map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }
}

/// Builds the element for one activity.
pub fn item_node(activity: &Activity) -> Node {
    let checkbox_id = format!("activity-{}-done", activity.id);

    let mut toggle = Node::new("input")
        .attr("type", "checkbox")
        .attr("id", checkbox_id.clone())
        .attr(CONTROL_ATTR, Control::Toggle.as_str())
        .role(Role::Control(Control::Toggle));
    if activity.completed {
        toggle.set_attr("checked", "");
    }

    Node::new("li")
        .attr("class", "activity")
        .attr(ACTIVITY_ID_ATTR, activity.id.to_string())
        .role(Role::Item(activity.id))
        .child(Node::new("p").text(activity.name.clone()).role(Role::Name))
        .child(toggle)
        .child(Node::new("label").attr("for", checkbox_id).text(TOGGLE_LABEL))
        .child(control_button(Control::Edit, EDIT_LABEL))
        .child(control_button(Control::Delete, DELETE_LABEL))
}

fn control_button(control: Control, label: &str) -> Node {
    Node::new("button")
        .attr("type", "button")
        .attr("class", control.as_str())
        .attr(CONTROL_ATTR, control.as_str())
        .text(label)
        .role(Role::Control(control))
}

/// Builds a category section holding the given activities, which must already
/// be in display order.
pub fn section_node<'a>(category: &str, activities: impl IntoIterator<Item = &'a Activity>) -> Node {
    Node::new("section")
        .attr("class", "category")
        .attr(CATEGORY_ATTR, category)
        .role(Role::Section(category.to_owned()))
        .child(Node::new("h2").text(category))
        .child(
            Node::new("ul")
                .role(Role::List(category.to_owned()))
                .children(activities.into_iter().map(item_node)),
        )
}

/// One `<option>` per configured category, in configured order, for the
/// category field of the input form.
pub fn category_options(categories: &Categories) -> Vec<Node> {
    categories
        .names()
        .iter()
        .map(|name| Node::new("option").attr("value", name.clone()).text(name.clone()))
        .collect()
}
