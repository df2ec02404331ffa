use std::{cell::RefCell, error::Error, rc::Rc};

use bucketlist_core::{
    data::activity::{CATEGORY_FIELD, NAME_FIELD},
    view::node::{Control, ACTIVITY_ID_ATTR, CONTROL_ATTR},
    ActivityId, FormRecord, Interaction, StoreError, UiEvent, ViewSynchronizer,
};
use dioxus_logger::tracing::error;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Element, Event, FormData, HtmlFormElement, HtmlInputElement};

use crate::{dom::DomSurface, storage::LocalStorage};

pub type SharedSynchronizer = Rc<RefCell<ViewSynchronizer<LocalStorage, DomSurface>>>;

/// Installs one click listener on the section root, covering every item that
/// is or will be rendered below it, and the submit listener on the form.
pub fn install(
    synchronizer: &SharedSynchronizer,
    root: &Element,
    form: &HtmlFormElement,
) -> Result<(), JsValue> {
    let on_click = {
        let synchronizer = Rc::clone(synchronizer);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(ui_event) = resolve_click(&event) {
                dispatch(&synchronizer, ui_event);
            }
        })
    };
    root.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_submit = {
        let synchronizer = Rc::clone(synchronizer);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            let Some(form) = event.target().and_then(|target| target.dyn_into::<HtmlFormElement>().ok())
            else {
                return;
            };
            match collect_form(&form) {
                Ok(record) => dispatch(&synchronizer, UiEvent::Submit(record)),
                Err(err) => error!(?err, "failed to read the submitted form"),
            }
        })
    };
    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
    on_submit.forget();

    Ok(())
}

fn dispatch(synchronizer: &SharedSynchronizer, event: UiEvent) {
    let result = synchronizer.borrow_mut().handle(event);
    if let Err(err) = result {
        // the synchronizer has already logged it; the user still needs to know
        alert(&match err {
            StoreError::Validation(err) => err.to_string(),
            err => format!("Could not save: {}", describe(&err)),
        });
    }
}

/// Finds the control that was clicked and, above it, the item it belongs to.
fn resolve_click(event: &Event) -> Option<UiEvent> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let control_element = target.closest(&format!("[{CONTROL_ATTR}]")).ok()??;
    let control: Control = control_element.get_attribute(CONTROL_ATTR)?.parse().ok()?;
    let item = control_element.closest(&format!("[{ACTIVITY_ID_ATTR}]")).ok()??;
    let id: ActivityId = item.get_attribute(ACTIVITY_ID_ATTR)?.parse().ok()?;

    let interaction = match control {
        Control::Toggle => Interaction::Toggled(control_element.dyn_ref::<HtmlInputElement>()?.checked()),
        Control::Delete => Interaction::Pressed,
        Control::Edit => Interaction::Edited(prompt_name(&item)?),
    };
    UiEvent::from_interaction(id, control, interaction)
}

/// Asks for a new name, offering the current one. `None` if cancelled.
fn prompt_name(item: &Element) -> Option<String> {
    let current = item.first_element_child().and_then(|label| label.text_content()).unwrap_or_default();
    web_sys::window()?.prompt_with_message_and_default("Nytt namn", &current).ok()?
}

fn collect_form(form: &HtmlFormElement) -> Result<FormRecord, JsValue> {
    let data = FormData::new_with_form(form)?;
    let mut record = FormRecord::new();
    for field in [NAME_FIELD, CATEGORY_FIELD] {
        if let Some(value) = data.get(field).as_string() {
            record.insert(field.to_owned(), value);
        }
    }
    Ok(record)
}

/// The error followed by each of its causes.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(err) = cause {
        message.push_str(": ");
        message.push_str(&err.to_string());
        cause = err.source();
    }
    message
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.alert_with_message(message) {
            error!(?err, "failed to show alert");
        }
    }
}
