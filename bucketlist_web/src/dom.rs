use std::collections::HashMap;

use bucketlist_core::{
    view::node::{Control, Node as ViewNode, Role, CONTROL_ATTR},
    ActivityId, Surface, ViewPatch,
};
use dioxus_logger::tracing::error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlFormElement, HtmlInputElement};

struct SectionHandle {
    container: Element,
    list: Element,
}

/// A [`Surface`] backed by the document. Sections and items are looked up
/// through maps filled in while rendering, never through selectors built
/// from category names.
pub struct DomSurface {
    document: Document,
    root: Element,
    form: HtmlFormElement,
    sections: HashMap<String, SectionHandle>,
    items: HashMap<ActivityId, Element>,
}

impl DomSurface {
    pub fn new(document: Document, root: Element, form: HtmlFormElement) -> Self {
        DomSurface { document, root, form, sections: HashMap::new(), items: HashMap::new() }
    }

    /// Replaces the children of `parent` with the given nodes.
    pub fn replace_children(&mut self, parent: &Element, nodes: &[ViewNode]) -> Result<(), JsValue> {
        parent.set_inner_html("");
        for node in nodes {
            let child = self.render(node)?;
            parent.append_child(&child)?;
        }
        Ok(())
    }

    fn try_apply(&mut self, patch: &ViewPatch) -> Result<(), JsValue> {
        match patch {
            ViewPatch::InsertSection { index, node, .. } => {
                let section = self.render(node)?;
                insert_at(&self.root, &section, *index)?;
            }
            ViewPatch::RemoveSection { category } => {
                if let Some(section) = self.sections.remove(category) {
                    section.container.remove();
                    self.items.retain(|_, item| item.is_connected());
                }
            }
            ViewPatch::InsertItem { category, index, node } => {
                let Some(list) = self.sections.get(category).map(|section| section.list.clone()) else {
                    return Ok(());
                };
                let item = self.render(node)?;
                insert_at(&list, &item, *index)?;
            }
            ViewPatch::RemoveItem { id, .. } => {
                if let Some(item) = self.items.remove(id) {
                    item.remove();
                }
            }
            ViewPatch::SetCompleted { id, completed } => {
                if let Some(toggle) = self.control(*id, Control::Toggle)? {
                    if let Some(checkbox) = toggle.dyn_ref::<HtmlInputElement>() {
                        checkbox.set_checked(*completed);
                    }
                }
            }
            ViewPatch::SetName { id, name } => {
                // the name label is the first child of an item
                if let Some(label) = self.items.get(id).and_then(Element::first_element_child) {
                    label.set_text_content(Some(name));
                }
            }
            ViewPatch::MoveItem { category, id, index } => {
                let list = self.sections.get(category).map(|section| &section.list);
                if let (Some(list), Some(item)) = (list, self.items.get(id)) {
                    item.remove();
                    insert_at(list, item, *index)?;
                }
            }
            ViewPatch::ResetInput => self.form.reset(),
        }
        Ok(())
    }

    /// Creates the elements for a node and remembers the handles of any
    /// sections and items among them.
    fn render(&mut self, node: &ViewNode) -> Result<Element, JsValue> {
        let element = self.document.create_element(node.tag)?;
        for (name, value) in &node.attributes {
            element.set_attribute(name, value)?;
        }
        if let Some(text) = &node.text {
            element.set_text_content(Some(text));
        }

        let mut list = None;
        for child in &node.children {
            let rendered = self.render(child)?;
            element.append_child(&rendered)?;
            if let Some(Role::List(_)) = child.role {
                list = Some(rendered);
            }
        }

        match &node.role {
            Some(Role::Section(category)) => {
                if let Some(list) = list {
                    let handle = SectionHandle { container: element.clone(), list };
                    self.sections.insert(category.clone(), handle);
                }
            }
            Some(Role::Item(id)) => {
                self.items.insert(*id, element.clone());
            }
            _ => {}
        }
        Ok(element)
    }

    fn control(&self, id: ActivityId, control: Control) -> Result<Option<Element>, JsValue> {
        match self.items.get(&id) {
            Some(item) => item.query_selector(&format!("[{CONTROL_ATTR}=\"{control}\"]")),
            None => Ok(None),
        }
    }
}

impl Surface for DomSurface {
    fn apply(&mut self, patch: &ViewPatch) {
        if let Err(err) = self.try_apply(patch) {
            error!(?err, ?patch, "failed to apply view patch to the document");
        }
    }
}

/// Inserts `child` so that it ends up at `index` among the element children
/// of `parent`, appending if the index is past the end.
fn insert_at(parent: &Element, child: &Element, index: usize) -> Result<(), JsValue> {
    let reference = u32::try_from(index).ok().and_then(|index| parent.children().item(index));
    parent.insert_before(child, reference.as_deref())?;
    Ok(())
}
