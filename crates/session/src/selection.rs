use context_protocol::FileDescriptor;
use std::collections::HashMap;

const COMPACT_MIN_SLOTS: usize = 32;

/// Ordered set of selected files keyed by descriptor id.
///
/// Insertion order is kept in `slots`; removals leave a hole that is reclaimed
/// once more than half the slots are empty, so toggling stays O(1) amortized.
#[derive(Debug, Default, Clone)]
pub struct SelectionStore {
    slots: Vec<Option<FileDescriptor>>,
    index: HashMap<String, usize>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the descriptor is selected afterwards.
    pub fn toggle(&mut self, descriptor: FileDescriptor) -> bool {
        if self.index.contains_key(descriptor.id()) {
            self.remove(descriptor.id());
            return false;
        }
        self.index
            .insert(descriptor.id().to_string(), self.slots.len());
        self.slots.push(Some(descriptor));
        true
    }

    /// Removing an id that is not selected is a no-op returning `false`.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(slot) = self.index.remove(id) else {
            return false;
        };
        self.slots[slot] = None;
        self.compact_if_sparse();
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.slots.iter().flatten()
    }

    pub fn list(&self) -> Vec<FileDescriptor> {
        self.iter().cloned().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|d| d.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    fn compact_if_sparse(&mut self) {
        if self.slots.len() < COMPACT_MIN_SLOTS || self.index.len() * 2 >= self.slots.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some(descriptor) = slot {
                self.index.insert(descriptor.id().to_string(), position);
            }
        }
    }
}
