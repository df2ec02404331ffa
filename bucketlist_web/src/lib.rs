//! Browser front end of the bucket list: mounts the core synchronizer onto the
//! page, backed by `localStorage`.

mod dom;
mod events;
mod storage;

use std::{cell::RefCell, rc::Rc};

use bucketlist_core::{
    data::activity::CATEGORY_FIELD,
    view::{node::category_options, tree::ROOT_ID},
    ActivityStore, BucketListConfig, Persistence, ViewSynchronizer,
};
use dioxus_logger::tracing::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlFormElement;

pub use dom::DomSurface;
pub use storage::LocalStorage;

/// ID of the form used to add activities.
pub const FORM_ID: &str = "bucketForm";

/// Loads the stored list, renders it and starts listening for user input.
pub fn start() -> Result<(), JsValue> {
    let config = load_config();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let root = document
        .get_element_by_id(ROOT_ID)
        .ok_or_else(|| JsValue::from_str("missing #bucketLists"))?;
    let form = document
        .get_element_by_id(FORM_ID)
        .ok_or_else(|| JsValue::from_str("missing #bucketForm"))?
        .dyn_into::<HtmlFormElement>()
        .map_err(|_| JsValue::from_str("#bucketForm is not a form"))?;

    let categories = config.categories();
    let mut surface = DomSurface::new(document, root.clone(), form.clone());
    // offer exactly the configured categories
    let category_field = form
        .query_selector(&format!("[name=\"{CATEGORY_FIELD}\"]"))?
        .ok_or_else(|| JsValue::from_str("missing category field"))?;
    surface.replace_children(&category_field, &category_options(&categories))?;

    let persistence = Persistence::new(LocalStorage::open()?, config.storage.clone());
    let store = ActivityStore::open(categories, persistence);
    info!(activities = store.len(), "loaded bucket list");

    let synchronizer = ViewSynchronizer::start(store, surface, config.display_order);
    events::install(&Rc::new(RefCell::new(synchronizer)), &root, &form)?;
    Ok(())
}

fn load_config() -> BucketListConfig {
    match BucketListConfig::from_toml_str(include_str!("../bucketlist.toml")) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                error = &err as &dyn std::error::Error,
                "invalid bundled configuration, using defaults"
            );
            BucketListConfig::default()
        }
    }
}
