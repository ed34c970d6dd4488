use std::collections::BTreeSet;

use crate::models::message::MessageId;

/// Ids already placed in the thread.
///
/// Everything at or below `floor` counts as seen: the floor starts at the
/// server-rendered watermark and rises as old ids are pruned to keep the set
/// within `capacity`.
#[derive(Clone, Debug)]
pub struct SeenIds {
    floor: MessageId,
    ids: BTreeSet<MessageId>,
    capacity: usize,
}

impl SeenIds {
    pub fn new(floor: MessageId, capacity: usize) -> Self {
        Self {
            floor,
            ids: BTreeSet::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, id: MessageId) -> bool {
        id <= self.floor || self.ids.contains(&id)
    }

    /// Returns `false` when the id was already seen.
    pub fn insert(&mut self, id: MessageId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.insert(id);
        while self.ids.len() > self.capacity {
            if let Some(lowest) = self.ids.pop_first() {
                self.floor = self.floor.max(lowest);
            }
        }
        true
    }
}
