use tracing::{debug, error, warn};

use crate::{
    config::DisplayOrder,
    data::{
        activity::{Activity, ActivityDraft, ActivityId, FormRecord},
        store::{ActivityStore, StoreError},
    },
    digest::Digestible,
    sync::kv::KeyValueStore,
};

use super::{
    model::{ItemState, ViewModel},
    node::{item_node, section_node, Control},
    patch::ViewPatch,
    Surface,
};

/// A user action, already resolved to the activity it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Toggle { id: ActivityId, completed: bool },
    Rename { id: ActivityId, name: String },
    Delete { id: ActivityId },
    Submit(FormRecord),
}

/// What happened to a control, as reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// A checkbox changed to the given state.
    Toggled(bool),
    /// A button was pressed.
    Pressed,
    /// The user entered a new name.
    Edited(String),
}

impl UiEvent {
    /// Combines the item found by ancestor lookup with the control that was
    /// interacted with. Returns `None` for interactions that mean nothing for
    /// that control.
    pub fn from_interaction(id: ActivityId, control: Control, interaction: Interaction) -> Option<Self> {
        match (control, interaction) {
            (Control::Toggle, Interaction::Toggled(completed)) => Some(UiEvent::Toggle { id, completed }),
            (Control::Delete, Interaction::Pressed) => Some(UiEvent::Delete { id }),
            (Control::Edit, Interaction::Edited(name)) => Some(UiEvent::Rename { id, name }),
            _ => None,
        }
    }
}

/// Keeps a [`Surface`] showing exactly what the [`ActivityStore`] holds.
/// User events are turned into store calls, and each successful store call
/// into the smallest set of [`ViewPatch`]es that brings the surface up to
/// date.
pub struct ViewSynchronizer<K, S> {
    store: ActivityStore<K>,
    surface: S,
    model: ViewModel,
    order: DisplayOrder,
}

impl<K: KeyValueStore, S: Surface> ViewSynchronizer<K, S> {
    /// Renders every non-empty category section onto the surface.
    pub fn start(store: ActivityStore<K>, surface: S, order: DisplayOrder) -> Self {
        let mut synchronizer = ViewSynchronizer { store, surface, model: ViewModel::new(), order };

        let categories = synchronizer.store.category_set().clone();
        for category in categories.names() {
            let members = order.arrange(synchronizer.store.all_by_category(category));
            if members.is_empty() {
                continue;
            }
            let ids = members.iter().map(|activity| activity.id).collect();
            let index = synchronizer.model.section_count();
            synchronizer.model.insert_section(index, category, ids);
            for activity in &members {
                synchronizer.model.set_item(activity.id, ItemState::from(*activity));
            }
            let node = section_node(category, members);
            synchronizer.surface.apply(&ViewPatch::InsertSection {
                category: category.clone(),
                index,
                node,
            });
        }
        debug!(sections = synchronizer.model.section_count(), "rendered initial view");
        synchronizer
    }

    /// Handles one user event. An event naming an activity that does not
    /// exist is logged and ignored; validation and persistence failures are
    /// returned and leave both the store and the surface untouched.
    pub fn handle(&mut self, event: UiEvent) -> Result<(), StoreError> {
        let result = match event {
            UiEvent::Toggle { id, completed } => self.on_toggle(id, completed),
            UiEvent::Rename { id, name } => self.on_rename(id, &name),
            UiEvent::Delete { id } => self.on_delete(id),
            UiEvent::Submit(form) => self.on_submit(&form),
        };
        match result {
            Err(StoreError::NotFound(id)) => {
                error!(%id, "event refers to an activity that does not exist");
                Ok(())
            }
            Err(err) => {
                warn!(error = &err as &dyn std::error::Error, "event rejected");
                Err(err)
            }
            Ok(()) => {
                debug_assert!(self.is_in_sync(), "view diverged from the store");
                Ok(())
            }
        }
    }

    fn on_submit(&mut self, form: &FormRecord) -> Result<(), StoreError> {
        let draft = ActivityDraft::from_form(form)?;
        let activity = self.store.add(&draft.name, &draft.category)?;
        self.show(&activity);
        self.emit(ViewPatch::ResetInput);
        Ok(())
    }

    /// The surface may already show the requested state, so the checkbox is
    /// set to whatever the store holds afterwards, even when the store call
    /// failed.
    fn on_toggle(&mut self, id: ActivityId, completed: bool) -> Result<(), StoreError> {
        let result = self.store.set_completed(id, completed);
        if let Some(stored) = self.store.get(id).map(|activity| activity.completed) {
            self.model.set_completed(id, stored);
            self.emit(ViewPatch::SetCompleted { id, completed: stored });
        }
        result
    }

    fn on_rename(&mut self, id: ActivityId, name: &str) -> Result<(), StoreError> {
        let activity = self.store.rename(id, name)?;
        let Some(before) = self.model.item_index(&activity.category, id) else {
            return Ok(());
        };
        self.model.set_name(id, &activity.name);
        self.emit(ViewPatch::SetName { id, name: activity.name.clone() });

        let after = self.display_index(&activity);
        if after != before {
            self.model.move_item(&activity.category, id, after);
            self.emit(ViewPatch::MoveItem { category: activity.category, id, index: after });
        }
        Ok(())
    }

    fn on_delete(&mut self, id: ActivityId) -> Result<(), StoreError> {
        let activity = self.store.remove(id)?;
        let category = activity.category;
        match self.model.remove_item(&category, id) {
            Some(0) => {
                self.model.remove_section(&category);
                self.emit(ViewPatch::RemoveSection { category });
            }
            Some(_) => self.emit(ViewPatch::RemoveItem { category, id }),
            None => {}
        }
        Ok(())
    }

    /// Puts a newly added activity on screen, creating its section if this is
    /// the first activity in the category.
    fn show(&mut self, activity: &Activity) {
        let category = &activity.category;
        if self.model.has_section(category) {
            let index = self.display_index(activity);
            self.model.insert_item(category, index, activity.id);
            self.model.set_item(activity.id, ItemState::from(activity));
            self.emit(ViewPatch::InsertItem {
                category: category.clone(),
                index,
                node: item_node(activity),
            });
        } else {
            let index = self.model.section_index_for(category, self.store.category_set());
            self.model.insert_section(index, category, vec![activity.id]);
            self.model.set_item(activity.id, ItemState::from(activity));
            self.emit(ViewPatch::InsertSection {
                category: category.clone(),
                index,
                node: section_node(category, [activity]),
            });
        }
    }

    /// Where the activity belongs within its section, given the current store
    /// contents.
    fn display_index(&self, activity: &Activity) -> usize {
        self.order
            .arrange(self.store.all_by_category(&activity.category))
            .iter()
            .position(|member| member.id == activity.id)
            .unwrap_or(0)
    }

    fn emit(&mut self, patch: ViewPatch) {
        debug!(?patch, "applying view patch");
        self.surface.apply(&patch);
    }
}

impl<K, S> ViewSynchronizer<K, S> {
    /// Whether the displayed sections match what the store holds.
    pub fn is_in_sync(&self) -> bool {
        let expected =
            ViewModel::project(self.store.activities(), self.store.category_set(), self.order);
        expected.digest() == self.model.digest()
    }

    pub fn store(&self) -> &ActivityStore<K> {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    pub fn display_order(&self) -> DisplayOrder {
        self.order
    }
}

#[cfg(test)]
mod test {
    use crate::{
        config::StorageKeys,
        data::{
            activity::{ValidationError, CATEGORY_FIELD, NAME_FIELD},
            category::Categories,
        },
        sync::{
            kv::{KeyValueStore, MemoryKeyValueStore},
            persistence::Persistence,
        },
        view::{
            node::Role,
            tree::NodeTree,
        },
    };

    use super::*;

    type TestSync = ViewSynchronizer<MemoryKeyValueStore, NodeTree>;

    fn start_over(kv: MemoryKeyValueStore, order: DisplayOrder) -> TestSync {
        let store =
            ActivityStore::open(Categories::default(), Persistence::new(kv, StorageKeys::default()));
        ViewSynchronizer::start(store, NodeTree::new(), order)
    }

    fn gen_sync() -> TestSync {
        start_over(MemoryKeyValueStore::new(), DisplayOrder::NewestFirst)
    }

    fn form(name: &str, category: &str) -> UiEvent {
        UiEvent::Submit(
            [(NAME_FIELD.to_owned(), name.to_owned()), (CATEGORY_FIELD.to_owned(), category.to_owned())]
                .into_iter()
                .collect(),
        )
    }

    fn section_order(sync: &TestSync) -> Vec<String> {
        sync.surface()
            .root()
            .children
            .iter()
            .filter_map(|section| match &section.role {
                Some(Role::Section(category)) => Some(category.clone()),
                _ => None,
            })
            .collect()
    }

    fn assert_consistent(sync: &TestSync) {
        assert!(sync.is_in_sync());
        assert_eq!(sync.surface().to_model(), *sync.model());
    }

    #[test]
    fn submit_creates_sections_lazily() {
        let mut sync = gen_sync();
        assert!(sync.surface().root().children.is_empty());

        sync.handle(form("Learn piano", "Hobby")).unwrap();
        sync.handle(form("Climb a mountain", "Äventyr")).unwrap();
        sync.handle(form("Paris", "Resor")).unwrap();

        assert_eq!(section_order(&sync), vec!["Resor", "Äventyr", "Hobby"]);
        assert_eq!(sync.store().len(), 3);
        assert_eq!(sync.surface().input_resets(), 3);
        assert_consistent(&sync);
    }

    #[test]
    fn newest_item_goes_first() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(form("Rome", "Resor")).unwrap();

        assert_eq!(sync.model().section("Resor"), Some([ActivityId(2), ActivityId(1)].as_slice()));
        assert_consistent(&sync);
        // storage keeps insertion order
        let stored: Vec<_> = sync.store().activities().iter().map(|a| a.id).collect();
        assert_eq!(stored, vec![ActivityId(1), ActivityId(2)]);
    }

    #[test]
    fn removing_last_item_removes_section() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(form("Surf", "Hobby")).unwrap();

        sync.handle(UiEvent::Delete { id: ActivityId(1) }).unwrap();

        assert!(sync.surface().section("Resor").is_none());
        assert!(sync.store().all_by_category("Resor").is_empty());
        assert_eq!(section_order(&sync), vec!["Hobby"]);
        assert_consistent(&sync);
    }

    #[test]
    fn removing_one_of_many_items() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(form("Rome", "Resor")).unwrap();

        sync.handle(UiEvent::Delete { id: ActivityId(2) }).unwrap();

        assert!(sync.surface().item(ActivityId(2)).is_none());
        assert!(sync.surface().item(ActivityId(1)).is_some());
        assert_consistent(&sync);
    }

    #[test]
    fn toggle_updates_store_and_checkbox() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(UiEvent::Toggle { id: ActivityId(1), completed: true }).unwrap();

        assert_eq!(sync.store().get(ActivityId(1)).map(|a| a.completed), Some(true));
        assert!(sync.surface().is_checked(ActivityId(1)));
        assert_consistent(&sync);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        let writes = sync.store().persistence().backend().writes();

        sync.handle(UiEvent::Toggle { id: ActivityId(9), completed: true }).unwrap();
        sync.handle(UiEvent::Delete { id: ActivityId(9) }).unwrap();
        sync.handle(UiEvent::Rename { id: ActivityId(9), name: "Oslo".to_owned() }).unwrap();

        assert_eq!(sync.store().len(), 1);
        assert_eq!(sync.store().persistence().backend().writes(), writes);
        assert_consistent(&sync);
    }

    #[test]
    fn invalid_submission_keeps_input() {
        let mut sync = gen_sync();
        let result = sync.handle(form("   ", "Resor"));
        assert!(matches!(result, Err(StoreError::Validation(ValidationError::EmptyName))));

        let result = sync.handle(UiEvent::Submit(FormRecord::new()));
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::MissingField(NAME_FIELD)))
        ));

        assert_eq!(sync.surface().input_resets(), 0);
        assert!(sync.store().is_empty());
        assert_eq!(sync.store().persistence().backend().writes(), 0);
        assert!(sync.surface().root().children.is_empty());
    }

    #[test]
    fn rename_updates_label() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(UiEvent::Rename { id: ActivityId(1), name: "Rome".to_owned() }).unwrap();

        let item = sync.surface().item(ActivityId(1)).unwrap();
        let label = item.child_with_role(&Role::Name).unwrap();
        assert_eq!(label.text.as_deref(), Some("Rome"));
        assert_consistent(&sync);
    }

    #[test]
    fn alphabetical_order_places_and_moves_items() {
        let mut sync = start_over(MemoryKeyValueStore::new(), DisplayOrder::Alphabetical);
        sync.handle(form("Rome", "Resor")).unwrap();
        sync.handle(form("Amsterdam", "Resor")).unwrap();
        sync.handle(form("Oslo", "Resor")).unwrap();
        assert_eq!(
            sync.model().section("Resor"),
            Some([ActivityId(2), ActivityId(3), ActivityId(1)].as_slice())
        );
        assert_consistent(&sync);

        sync.handle(UiEvent::Rename { id: ActivityId(2), name: "Zagreb".to_owned() }).unwrap();
        assert_eq!(
            sync.model().section("Resor"),
            Some([ActivityId(3), ActivityId(1), ActivityId(2)].as_slice())
        );
        assert_consistent(&sync);
    }

    #[test]
    fn start_renders_persisted_state() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.handle(form("Surf", "Hobby")).unwrap();
        sync.handle(form("Rome", "Resor")).unwrap();
        sync.handle(UiEvent::Toggle { id: ActivityId(3), completed: true }).unwrap();

        let kv = sync.store().persistence().backend().clone();
        let reloaded = start_over(kv, DisplayOrder::NewestFirst);

        assert_eq!(reloaded.surface().root(), sync.surface().root());
        assert_eq!(reloaded.model(), sync.model());
        assert!(reloaded.surface().is_checked(ActivityId(3)));
        assert_consistent(&reloaded);
    }

    #[test]
    fn start_skips_unconfigured_categories() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set_item(
            "bucketList",
            r#"[{"id":1,"name":"Mars","category":"Rymden"},{"id":2,"name":"Surf","category":"Hobby"}]"#,
        )
        .unwrap();
        let sync = start_over(kv, DisplayOrder::NewestFirst);

        assert_eq!(section_order(&sync), vec!["Hobby"]);
        assert_eq!(sync.store().len(), 2);
        assert_eq!(sync.store().num_created(), 2);
        assert_consistent(&sync);
    }

    #[test]
    fn corrupt_state_starts_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set_item("bucketList", "not json").unwrap();
        kv.set_item("numActivitiesCreated", "{}").unwrap();
        let mut sync = start_over(kv, DisplayOrder::NewestFirst);

        assert!(sync.store().is_empty());
        assert_eq!(sync.store().num_created(), 0);
        sync.handle(form("Paris", "Resor")).unwrap();
        assert_eq!(sync.store().activities()[0].id, ActivityId(1));
    }

    #[test]
    fn persistence_failure_leaves_view_untouched() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        let before = sync.surface().root().clone();

        let mut kv = sync.store().persistence().backend().clone();
        kv.fail_writes_to("bucketList");
        let store =
            ActivityStore::open(Categories::default(), Persistence::new(kv, StorageKeys::default()));
        let mut sync = ViewSynchronizer::start(store, NodeTree::new(), DisplayOrder::NewestFirst);

        assert!(matches!(sync.handle(form("Rome", "Resor")), Err(StoreError::Persistence(_))));
        assert!(matches!(
            sync.handle(UiEvent::Delete { id: ActivityId(1) }),
            Err(StoreError::Persistence(_))
        ));
        assert_eq!(sync.surface().root(), &before);
        assert_eq!(sync.surface().input_resets(), 0);
        assert_consistent(&sync);
    }

    #[test]
    fn failed_toggle_sets_checkbox_back() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set_item("bucketList", r#"[{"id":1,"name":"Paris","category":"Resor"}]"#).unwrap();
        kv.fail_writes_to("bucketList");
        let mut sync = start_over(kv, DisplayOrder::NewestFirst);
        sync.surface.click_toggle(ActivityId(1));
        assert!(sync.surface().is_checked(ActivityId(1)));

        let result = sync.handle(UiEvent::Toggle { id: ActivityId(1), completed: true });

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(sync.store().get(ActivityId(1)).map(|a| a.completed), Some(false));
        assert!(!sync.surface().is_checked(ActivityId(1)));
        assert_consistent(&sync);
    }

    #[test]
    fn sync_check_sees_completion_and_names() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        assert!(sync.is_in_sync());

        sync.model.set_completed(ActivityId(1), true);
        assert!(!sync.is_in_sync());
        sync.model.set_completed(ActivityId(1), false);
        assert!(sync.is_in_sync());

        sync.model.set_name(ActivityId(1), "Rome");
        assert!(!sync.is_in_sync());
    }

    #[test]
    fn page_drift_in_completion_shows_in_model() {
        let mut sync = gen_sync();
        sync.handle(form("Paris", "Resor")).unwrap();
        sync.surface.click_toggle(ActivityId(1));
        assert_ne!(sync.surface().to_model(), *sync.model());
    }

    #[test]
    fn interactions_map_to_events() {
        let id = ActivityId(4);
        assert_eq!(
            UiEvent::from_interaction(id, Control::Toggle, Interaction::Toggled(true)),
            Some(UiEvent::Toggle { id, completed: true })
        );
        assert_eq!(
            UiEvent::from_interaction(id, Control::Delete, Interaction::Pressed),
            Some(UiEvent::Delete { id })
        );
        assert_eq!(
            UiEvent::from_interaction(id, Control::Edit, Interaction::Edited("Oslo".to_owned())),
            Some(UiEvent::Rename { id, name: "Oslo".to_owned() })
        );
        assert_eq!(UiEvent::from_interaction(id, Control::Delete, Interaction::Toggled(true)), None);
    }
}
