use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A stack of identical items in one inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
    pub durability: f64,
    pub max_durability: f64,
}

impl ItemStack {
    /// A stack at its natural (maximum) durability.
    pub fn new(item_id: impl Into<String>, quantity: u32, max_durability: f64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            durability: max_durability,
            max_durability,
        }
    }

    pub fn with_durability(mut self, durability: f64) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn is_same_item(&self, other: &ItemStack) -> bool {
        self.item_id == other.item_id
    }

    /// Same item at the same durability, so the two can share a slot.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.is_same_item(other)
            && self.durability == other.durability
            && self.max_durability == other.max_durability
    }

    pub fn is_partially_consumed(&self) -> bool {
        self.durability != self.max_durability
    }
}

/// Where an item handed to [`SlotTransactions::add_or_drop`] ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePlacement {
    Slot(usize),
    Dropped,
}

/// Slot-level inventory transactions supplied by the host.
///
/// Every call is atomic on its own and reports success; callers never retry.
pub trait SlotTransactions {
    fn slot(&self, slot: usize) -> Option<&ItemStack>;

    /// Overwrite `slot` with `stack`.
    fn set_slot(&mut self, slot: usize, stack: ItemStack) -> bool;

    /// Take `count` units out of `slot`, provided it still holds `expected`.
    fn remove_from_slot(&mut self, slot: usize, expected: &ItemStack, count: u32) -> bool;

    /// Store `stack` hotbar first, merging into a matching stack before taking an empty slot
    /// and dropping it into the world when neither exists.
    fn add_or_drop(&mut self, stack: ItemStack) -> StorePlacement;
}

/// Actor inventory: hotbar slots followed by storage slots.
///
/// Slot indices address the hotbar first, then storage.
#[derive(Component, Debug, Clone, Default)]
pub struct Inventory {
    hotbar: Vec<Option<ItemStack>>,
    storage: Vec<Option<ItemStack>>,
    locked: HashSet<usize>,
    dropped: Vec<ItemStack>,
}

impl Inventory {
    pub fn new(hotbar_slots: usize, storage_slots: usize) -> Self {
        Self {
            hotbar: vec![None; hotbar_slots],
            storage: vec![None; storage_slots],
            locked: HashSet::new(),
            dropped: Vec::new(),
        }
    }

    pub fn with_item(mut self, slot: usize, stack: ItemStack) -> Self {
        if let Some(entry) = self.entry_mut(slot) {
            *entry = Some(stack);
        }
        self
    }

    pub fn capacity(&self) -> usize {
        self.hotbar.len() + self.storage.len()
    }

    /// Make writes to `slot` fail, as if another interaction mutated it concurrently.
    pub fn lock_slot(&mut self, slot: usize) {
        self.locked.insert(slot);
    }

    pub fn unlock_slot(&mut self, slot: usize) {
        self.locked.remove(&slot);
    }

    /// Items that overflowed and must be spawned into the world.
    pub fn take_dropped(&mut self) -> Vec<ItemStack> {
        std::mem::take(&mut self.dropped)
    }

    pub fn has_dropped(&self) -> bool {
        !self.dropped.is_empty()
    }

    pub fn stacks(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.hotbar
            .iter()
            .chain(self.storage.iter())
            .enumerate()
            .filter_map(|(idx, entry)| entry.as_ref().map(|stack| (idx, stack)))
    }

    fn entry(&self, slot: usize) -> Option<&Option<ItemStack>> {
        if slot < self.hotbar.len() {
            self.hotbar.get(slot)
        } else {
            self.storage.get(slot - self.hotbar.len())
        }
    }

    fn entry_mut(&mut self, slot: usize) -> Option<&mut Option<ItemStack>> {
        if slot < self.hotbar.len() {
            self.hotbar.get_mut(slot)
        } else {
            let offset = self.hotbar.len();
            self.storage.get_mut(slot - offset)
        }
    }
}

impl SlotTransactions for Inventory {
    fn slot(&self, slot: usize) -> Option<&ItemStack> {
        self.entry(slot).and_then(Option::as_ref)
    }

    fn set_slot(&mut self, slot: usize, stack: ItemStack) -> bool {
        if self.locked.contains(&slot) {
            return false;
        }
        match self.entry_mut(slot) {
            Some(entry) => {
                *entry = Some(stack);
                true
            }
            None => false,
        }
    }

    fn remove_from_slot(&mut self, slot: usize, expected: &ItemStack, count: u32) -> bool {
        if self.locked.contains(&slot) {
            return false;
        }
        let Some(entry) = self.entry_mut(slot) else {
            return false;
        };
        let Some(current) = entry.as_mut() else {
            return false;
        };
        if !current.is_same_item(expected) || current.quantity < count {
            return false;
        }
        current.quantity -= count;
        if current.quantity == 0 {
            *entry = None;
        }
        true
    }

    fn add_or_drop(&mut self, stack: ItemStack) -> StorePlacement {
        let mergeable = (0..self.capacity()).find(|slot| {
            !self.locked.contains(slot)
                && self.slot(*slot).is_some_and(|held| held.can_merge(&stack))
        });
        if let Some(slot) = mergeable {
            if let Some(Some(held)) = self.entry_mut(slot) {
                held.quantity += stack.quantity;
            }
            return StorePlacement::Slot(slot);
        }

        let free = (0..self.capacity())
            .find(|slot| !self.locked.contains(slot) && self.slot(*slot).is_none());
        match free {
            Some(slot) => {
                if let Some(entry) = self.entry_mut(slot) {
                    *entry = Some(stack);
                }
                StorePlacement::Slot(slot)
            }
            None => {
                self.dropped.push(stack);
                StorePlacement::Dropped
            }
        }
    }
}

/// Item lying in the world after an inventory overflow.
#[derive(Component, Debug, Clone)]
pub struct DroppedItem {
    pub stack: ItemStack,
    pub owner: Entity,
}

/// Spawn world entities for items that did not fit in their owner's inventory.
pub fn spawn_dropped_items(mut commands: Commands, mut inventories: Query<(Entity, &mut Inventory)>) {
    for (owner, mut inventory) in inventories.iter_mut() {
        if !inventory.has_dropped() {
            continue;
        }
        for stack in inventory.take_dropped() {
            tracing::debug!(
                target: "brewery::refill",
                owner = ?owner,
                item = %stack.item_id,
                "item.dropped"
            );
            commands.spawn(DroppedItem { stack, owner });
        }
    }
}
