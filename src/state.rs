use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Item, ItemId};

/// Everything resolved during a session: every item by id, plus the ordered
/// stories that passed the acceptance filter. Grows only; an id, once
/// present, keeps its first value.
#[derive(Debug, Default, Serialize)]
pub struct MaterializedState {
    items: HashMap<ItemId, Item>,
    stories: Vec<ItemId>,
    #[serde(skip)]
    accepted: HashSet<ItemId>,
}

/// A materialized item with its materialized replies, in `kids` order.
#[derive(Debug, PartialEq)]
pub struct Thread<'a> {
    pub item: &'a Item,
    pub replies: Vec<Thread<'a>>,
}

impl Thread<'_> {
    /// Items in this thread, including its root.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(Thread::size).sum::<usize>()
    }
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` unless its id is already known. Returns whether it was new.
    pub fn insert(&mut self, item: Item) -> bool {
        match self.items.entry(item.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(item);
                true
            }
        }
    }

    /// Materialize `story` and append it to the story list. Returns whether it
    /// was newly accepted.
    pub fn accept_story(&mut self, story: Item) -> bool {
        let id = story.id;
        self.insert(story);
        if self.accepted.insert(id) {
            self.stories.push(id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    /// Accepted stories in acceptance order.
    pub fn stories(&self) -> impl Iterator<Item = &Item> + '_ {
        self.stories.iter().filter_map(|id| self.items.get(id))
    }

    pub fn story_count(&self) -> usize {
        self.stories.len()
    }

    /// Number of `parent` hops from `id` up to the first item that is not
    /// materialized. A top-level story has depth 0.
    pub fn depth(&self, id: ItemId) -> usize {
        let mut depth = 0;
        let mut current = self.items.get(&id);

        while let Some(parent) = current.and_then(Item::parent) {
            match self.items.get(&parent) {
                Some(item) if depth < self.items.len() => {
                    depth += 1;
                    current = Some(item);
                }
                _ => break,
            }
        }

        depth
    }

    /// Reply tree for `ids`; ids not materialized yet are left out.
    pub fn thread(&self, ids: &[ItemId]) -> Vec<Thread<'_>> {
        self.thread_bounded(ids, self.items.len())
    }

    fn thread_bounded(&self, ids: &[ItemId], budget: usize) -> Vec<Thread<'_>> {
        if budget == 0 {
            return Vec::new();
        }

        ids.iter()
            .filter_map(|id| self.items.get(id))
            .map(|item| Thread {
                item,
                replies: self.thread_bounded(item.kids(), budget - 1),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        serde_json::from_value(value).expect("item decodes")
    }

    fn populated() -> MaterializedState {
        let mut state = MaterializedState::new();
        state.accept_story(item(json!({"id": 1, "type": "story", "title": "Root", "kids": [2, 3]})));
        state.insert(item(json!({"id": 2, "type": "comment", "parent": 1, "kids": [4]})));
        state.insert(item(json!({"id": 3, "type": "comment", "parent": 1})));
        state.insert(item(json!({"id": 4, "type": "comment", "parent": 2, "kids": [5]})));
        state
    }

    #[test]
    fn first_value_wins() {
        let mut state = MaterializedState::new();
        assert!(state.insert(item(json!({"id": 1, "type": "comment", "text": "first"}))));
        assert!(!state.insert(item(json!({"id": 1, "type": "comment", "text": "second"}))));

        assert_eq!(state.len(), 1);
        assert_eq!(state.get(1).and_then(Item::text), Some("first"));
    }

    #[test]
    fn stories_are_ordered_and_unique() {
        let mut state = MaterializedState::new();
        assert!(state.accept_story(item(json!({"id": 2, "title": "B"}))));
        assert!(state.accept_story(item(json!({"id": 1, "title": "A"}))));
        assert!(!state.accept_story(item(json!({"id": 2, "title": "B"}))));

        let ids: Vec<ItemId> = state.stories().map(|story| story.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(state.story_count(), 2);
    }

    #[test]
    fn depth_counts_materialized_parents() {
        let state = populated();
        assert_eq!(state.depth(1), 0);
        assert_eq!(state.depth(2), 1);
        assert_eq!(state.depth(4), 2);
        assert_eq!(state.depth(99), 0);
    }

    #[test]
    fn depth_terminates_on_cycles() {
        let mut state = MaterializedState::new();
        state.insert(item(json!({"id": 1, "type": "comment", "parent": 2})));
        state.insert(item(json!({"id": 2, "type": "comment", "parent": 1})));
        assert!(state.depth(1) <= 2);
    }

    #[test]
    fn thread_skips_unknown_ids() {
        let state = populated();
        let root = state.get(1).expect("root");

        let thread = state.thread(root.kids());

        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].item.id, 2);
        assert_eq!(thread[0].replies.len(), 1);
        // 5 is referenced but not materialized
        assert!(thread[0].replies[0].replies.is_empty());
        assert_eq!(thread[1].item.id, 3);
        assert_eq!(thread.iter().map(Thread::size).sum::<usize>(), 3);
    }
}
