//! Name-keyed stackable inventory.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::INVENTORY_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Food,
    #[default]
    Tool,
    Weapon,
    Herb,
    Quest,
}

impl ItemCategory {
    pub const ALL: [Self; 5] = [
        Self::Food,
        Self::Tool,
        Self::Weapon,
        Self::Herb,
        Self::Quest,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Tool => "tool",
            Self::Weapon => "weapon",
            Self::Herb => "herb",
            Self::Quest => "quest",
        }
    }

    /// Stable ordinal written into save records.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Food => 0,
            Self::Tool => 1,
            Self::Weapon => 2,
            Self::Herb => 3,
            Self::Quest => 4,
        }
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Food),
            1 => Some(Self::Tool),
            2 => Some(Self::Weapon),
            3 => Some(Self::Herb),
            4 => Some(Self::Quest),
            _ => None,
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

/// A stack of same-named items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub category: ItemCategory,
    pub effect_value: i32,
    pub quantity: u32,
}

impl Item {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: ItemCategory,
        effect_value: i32,
        quantity: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            effect_value,
            quantity,
        }
    }
}

/// Ordered item collection, unique by name.
///
/// Entries keep insertion order and never hold a zero quantity. The capacity
/// counts distinct entries and is advisory: [`Inventory::add`] never rejects
/// an item, callers consult [`Inventory::is_full`] when they care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    items: Vec<Item>,
    capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(INVENTORY_CAPACITY)
    }
}

impl Inventory {
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Merge `item` into the entry of the same name, or append a new entry.
    pub fn add(&mut self, item: Item) {
        if item.quantity == 0 {
            log::debug!("ignoring zero-quantity add of {}", item.name);
            return;
        }
        if let Some(existing) = self.items.iter_mut().find(|entry| entry.name == item.name) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return;
        }
        if self.is_full() {
            log::debug!(
                "inventory holds {} entries (capacity {}), adding {} anyway",
                self.items.len(),
                self.capacity,
                item.name
            );
        }
        self.items.push(item);
    }

    /// Take one unit of `name`, dropping the entry when it runs out.
    pub fn remove_one(&mut self, name: &str) -> bool {
        let Some(index) = self.items.iter().position(|entry| entry.name == name) else {
            return false;
        };
        let entry = &mut self.items[index];
        entry.quantity = entry.quantity.saturating_sub(1);
        if entry.quantity == 0 {
            self.items.remove(index);
        }
        true
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.items.iter().any(|entry| entry.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn quantity_of(&self, name: &str) -> u32 {
        self.get(name).map_or(0, |entry| entry.quantity)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Deep copy of the entries in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Item> {
        self.items.clone()
    }

    /// Replace the contents with `items`, merging duplicates as [`Inventory::add`] does.
    pub fn restore(&mut self, items: impl IntoIterator<Item = Item>) {
        self.clear();
        for item in items {
            self.add(item);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}
