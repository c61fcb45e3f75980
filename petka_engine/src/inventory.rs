use serde::{Deserialize, Serialize};

use crate::message::ObjectId;

/// Items carried in the case, in pickup order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryState {
    #[serde(default)]
    items: Vec<ObjectId>,
}

impl InventoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, id: ObjectId) -> bool {
        if self.items.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }

    pub fn remove_item(&mut self, id: ObjectId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| *item != id);
        before != self.items.len()
    }

    /// Replaces `from` with `to` in place; a missing `from` leaves the case untouched.
    pub fn transform_item(&mut self, from: ObjectId, to: ObjectId) -> bool {
        let Some(slot) = self.items.iter().position(|item| *item == from) else {
            return false;
        };
        if self.items.contains(&to) {
            self.items.remove(slot);
        } else {
            self.items[slot] = to;
        }
        true
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.items.contains(&id)
    }

    pub fn items(&self) -> &[ObjectId] {
        &self.items
    }
}
