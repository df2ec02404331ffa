use std::{cmp::Ordering, collections::BTreeMap};

use indexmap::IndexMap;

use crate::{
    config::DisplayOrder,
    data::{
        activity::{Activity, ActivityId},
        category::Categories,
    },
    digest::{digest_of, DigestOutput, Digestible},
};

/// What is currently on screen: the visible category sections in display
/// order, each with the IDs of its items in display order, and what each item
/// shows. Sections are keyed by category name; a section is present only
/// while it has items.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewModel {
    sections: IndexMap<String, Vec<ActivityId>>,
    items: BTreeMap<ActivityId, ItemState>,
}

/// The parts of an activity an item displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemState {
    pub name: String,
    pub completed: bool,
}

impl From<&Activity> for ItemState {
    fn from(activity: &Activity) -> Self {
        ItemState { name: activity.name.clone(), completed: activity.completed }
    }
}

impl DisplayOrder {
    /// Orders the activities of one category for display. The input is in
    /// insertion order.
    pub fn arrange<'a>(self, mut activities: Vec<&'a Activity>) -> Vec<&'a Activity> {
        match self {
            DisplayOrder::NewestFirst => activities.reverse(),
            DisplayOrder::Alphabetical => activities.sort_by(|a, b| compare_names(a, b)),
        }
        activities
    }
}

fn compare_names(a: &Activity, b: &Activity) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id))
}

impl ViewModel {
    pub fn new() -> Self {
        ViewModel::default()
    }

    /// The view that should be shown for the given activities: one section per
    /// configured category that has activities, in configured order.
    /// Activities of unconfigured categories are left out.
    pub fn project(activities: &[Activity], categories: &Categories, order: DisplayOrder) -> Self {
        let mut model = ViewModel::new();
        for category in categories.names() {
            let members = activities.iter().filter(|activity| &activity.category == category).collect();
            let members = order.arrange(members);
            if members.is_empty() {
                continue;
            }
            model.items.extend(members.iter().map(|activity| (activity.id, ItemState::from(*activity))));
            let ids = members.iter().map(|activity| activity.id).collect();
            model.sections.insert(category.clone(), ids);
        }
        model
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &[ActivityId])> {
        self.sections.iter().map(|(category, items)| (category.as_str(), items.as_slice()))
    }

    pub fn section(&self, category: &str) -> Option<&[ActivityId]> {
        self.sections.get(category).map(Vec::as_slice)
    }

    pub fn has_section(&self, category: &str) -> bool {
        self.sections.contains_key(category)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Where a section for the category belongs among the visible sections:
    /// after every visible section whose category is configured before it.
    pub fn section_index_for(&self, category: &str, categories: &Categories) -> usize {
        let Some(position) = categories.position(category) else {
            return self.sections.len();
        };
        self.sections
            .keys()
            .filter(|visible| categories.position(visible).is_some_and(|p| p < position))
            .count()
    }

    /// What the item shows, if it is shown at all.
    pub fn item(&self, id: ActivityId) -> Option<&ItemState> {
        self.items.get(&id)
    }

    /// Records what an item shows. Call after the item was inserted.
    pub fn set_item(&mut self, id: ActivityId, state: ItemState) {
        self.items.insert(id, state);
    }

    pub fn set_completed(&mut self, id: ActivityId, completed: bool) {
        if let Some(state) = self.items.get_mut(&id) {
            state.completed = completed;
        }
    }

    pub fn set_name(&mut self, id: ActivityId, name: &str) {
        if let Some(state) = self.items.get_mut(&id) {
            state.name = name.to_owned();
        }
    }

    pub fn insert_section(&mut self, index: usize, category: &str, items: Vec<ActivityId>) {
        let index = index.min(self.sections.len());
        self.sections.shift_insert(index, category.to_owned(), items);
    }

    pub fn remove_section(&mut self, category: &str) -> Option<Vec<ActivityId>> {
        let removed = self.sections.shift_remove(category)?;
        for id in &removed {
            self.items.remove(id);
        }
        Some(removed)
    }

    pub fn item_index(&self, category: &str, id: ActivityId) -> Option<usize> {
        self.sections.get(category)?.iter().position(|&item| item == id)
    }

    pub fn insert_item(&mut self, category: &str, index: usize, id: ActivityId) {
        if let Some(items) = self.sections.get_mut(category) {
            let index = index.min(items.len());
            items.insert(index, id);
        }
    }

    /// Removes the item and returns how many items are left in its section,
    /// or `None` if the item was not shown.
    pub fn remove_item(&mut self, category: &str, id: ActivityId) -> Option<usize> {
        let items = self.sections.get_mut(category)?;
        let index = items.iter().position(|&item| item == id)?;
        items.remove(index);
        let left = items.len();
        self.items.remove(&id);
        Some(left)
    }

    pub fn move_item(&mut self, category: &str, id: ActivityId, index: usize) {
        let Some(items) = self.sections.get_mut(category) else {
            return;
        };
        if let Some(from) = items.iter().position(|&item| item == id) {
            items.remove(from);
            items.insert(index.min(items.len()), id);
        }
    }
}

impl Digestible for ViewModel {
    fn digest(&self) -> DigestOutput {
        let sections: Vec<_> = self.sections().collect();
        digest_of(&(sections, &self.items))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gen_activity(id: u64, name: &str, category: &str) -> Activity {
        Activity { id: ActivityId(id), name: name.to_owned(), category: category.to_owned(), completed: false }
    }

    fn ids(raw: &[u64]) -> Vec<ActivityId> {
        raw.iter().copied().map(ActivityId).collect()
    }

    fn gen_activities() -> Vec<Activity> {
        vec![
            gen_activity(1, "rome", "Resor"),
            gen_activity(2, "Surf", "Hobby"),
            gen_activity(3, "Paris", "Resor"),
            gen_activity(4, "Oslo", "Resor"),
            gen_activity(5, "Mars", "Rymden"),
        ]
    }

    #[test]
    fn project_newest_first() {
        let model = ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::NewestFirst);
        let sections: Vec<_> = model.sections().collect();
        assert_eq!(
            sections,
            vec![("Resor", ids(&[4, 3, 1]).as_slice()), ("Hobby", ids(&[2]).as_slice())]
        );
    }

    #[test]
    fn project_alphabetical() {
        let model =
            ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::Alphabetical);
        assert_eq!(model.section("Resor"), Some(ids(&[4, 3, 1]).as_slice()));

        let mut activities = gen_activities();
        activities.push(gen_activity(6, "Amsterdam", "Resor"));
        activities.push(gen_activity(7, "amsterdam", "Resor"));
        let model = ViewModel::project(&activities, &Categories::default(), DisplayOrder::Alphabetical);
        assert_eq!(model.section("Resor"), Some(ids(&[6, 7, 4, 3, 1]).as_slice()));
    }

    #[test]
    fn unconfigured_and_empty_categories_are_hidden() {
        let model = ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::NewestFirst);
        assert!(!model.has_section("Rymden"));
        assert!(!model.has_section("Äventyr"));
        assert_eq!(model.section_count(), 2);
    }

    #[test]
    fn sections_are_placed_in_configured_order() {
        let categories = Categories::default();
        let mut model = ViewModel::new();
        model.insert_section(model.section_index_for("Hobby", &categories), "Hobby", ids(&[1]));
        model.insert_section(model.section_index_for("Resor", &categories), "Resor", ids(&[2]));
        model.insert_section(model.section_index_for("Lärande", &categories), "Lärande", ids(&[3]));

        let order: Vec<_> = model.sections().map(|(category, _)| category).collect();
        assert_eq!(order, vec!["Resor", "Lärande", "Hobby"]);
        assert_eq!(model.section_index_for("Äventyr", &categories), 1);
    }

    #[test]
    fn item_edits() {
        let mut model = ViewModel::new();
        model.insert_section(0, "Resor", ids(&[3, 1]));
        model.insert_item("Resor", 0, ActivityId(4));
        assert_eq!(model.section("Resor"), Some(ids(&[4, 3, 1]).as_slice()));

        model.move_item("Resor", ActivityId(1), 0);
        assert_eq!(model.section("Resor"), Some(ids(&[1, 4, 3]).as_slice()));
        assert_eq!(model.item_index("Resor", ActivityId(3)), Some(2));

        assert_eq!(model.remove_item("Resor", ActivityId(4)), Some(2));
        assert_eq!(model.remove_item("Resor", ActivityId(4)), None);
        assert_eq!(model.remove_item("Hobby", ActivityId(1)), None);
    }

    #[test]
    fn digest_tracks_content() {
        let a = ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::NewestFirst);
        let mut b = a.clone();
        assert_eq!(a.digest(), b.digest());
        b.move_item("Resor", ActivityId(1), 0);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn digest_tracks_what_items_show() {
        let a = ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::NewestFirst);

        let mut b = a.clone();
        b.set_completed(ActivityId(3), true);
        assert_ne!(a.digest(), b.digest());
        b.set_completed(ActivityId(3), false);
        assert_eq!(a.digest(), b.digest());

        let mut c = a.clone();
        c.set_name(ActivityId(3), "Lyon");
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn item_states_follow_their_items() {
        let mut model =
            ViewModel::project(&gen_activities(), &Categories::default(), DisplayOrder::NewestFirst);
        assert_eq!(model.item(ActivityId(3)), Some(&ItemState { name: "Paris".to_owned(), completed: false }));
        // not shown, so not tracked
        assert_eq!(model.item(ActivityId(5)), None);
        model.set_completed(ActivityId(5), true);
        assert_eq!(model.item(ActivityId(5)), None);

        model.move_item("Resor", ActivityId(3), 0);
        assert!(model.item(ActivityId(3)).is_some());

        model.remove_item("Resor", ActivityId(3));
        assert_eq!(model.item(ActivityId(3)), None);
        model.remove_section("Hobby");
        assert_eq!(model.item(ActivityId(2)), None);
    }
}
