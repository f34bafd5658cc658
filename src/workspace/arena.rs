//! Entry arena: entries addressed by stable `EntryId`s.
//!
//! Slots are never reused, so an id handed to a view stays valid (or reports
//! missing) after other entries are removed.

use crate::types::{Entry, EntryId};

#[derive(Debug, Clone, Default)]
pub struct EntryArena {
    slots: Vec<Option<Entry>>,
    live: usize,
}

impl EntryArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: Entry) -> EntryId {
        self.slots.push(Some(entry));
        self.live += 1;
        EntryId(self.slots.len() - 1)
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let removed = self.slots.get_mut(id.0).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EntryId(i), e)))
    }

    /// Remove every entry for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&Entry) -> bool) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|e| !keep(e)) {
                *slot = None;
                self.live -= 1;
            }
        }
    }

    /// Live entries in id order.
    pub fn to_vec(&self) -> Vec<Entry> {
        self.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
