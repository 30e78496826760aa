//! Item templates and consumable effects, keyed by item name.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inventory::{Item, ItemCategory};
use crate::stats::StatDelta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub category: ItemCategory,
    #[serde(default)]
    pub effect_value: i32,
    /// Applied when the item is used. `None` means using it only consumes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_effect: Option<StatDelta>,
}

/// Everything the engine knows how to hand out or consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCatalog {
    templates: BTreeMap<String, ItemTemplate>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(
            "Meat",
            ItemTemplate {
                category: ItemCategory::Food,
                effect_value: 30,
                use_effect: Some(StatDelta {
                    hunger: -30,
                    ..StatDelta::default()
                }),
            },
        );
        catalog.insert(
            "Herbs",
            ItemTemplate {
                category: ItemCategory::Herb,
                effect_value: 20,
                use_effect: None,
            },
        );
        catalog.insert(
            "Map",
            ItemTemplate {
                category: ItemCategory::Tool,
                effect_value: 0,
                use_effect: None,
            },
        );
        catalog
    }
}

impl ItemCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, template: ItemTemplate) {
        self.templates.insert(name.into(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ItemTemplate> {
        self.templates.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Build a stack of `quantity` units of `name`.
    #[must_use]
    pub fn instantiate(&self, name: &str, quantity: u32) -> Option<Item> {
        self.get(name)
            .map(|template| Item::new(name, template.category, template.effect_value, quantity))
    }

    #[must_use]
    pub fn use_effect(&self, name: &str) -> Option<&StatDelta> {
        self.get(name).and_then(|template| template.use_effect.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_story_rewards() {
        let catalog = ItemCatalog::default();
        let meat = catalog.instantiate("Meat", 1).unwrap();
        assert_eq!(meat, Item::new("Meat", ItemCategory::Food, 30, 1));
        let herbs = catalog.instantiate("Herbs", 2).unwrap();
        assert_eq!(herbs.category, ItemCategory::Herb);
        assert_eq!(herbs.effect_value, 20);
        assert_eq!(herbs.quantity, 2);
        assert!(catalog.instantiate("Antler", 1).is_none());
    }

    #[test]
    fn only_meat_has_a_use_effect_by_default() {
        let catalog = ItemCatalog::default();
        assert_eq!(catalog.use_effect("Meat").map(|effect| effect.hunger), Some(-30));
        assert!(catalog.use_effect("Herbs").is_none());
        assert!(catalog.use_effect("Map").is_none());
    }

    #[test]
    fn herb_effect_is_a_data_change() {
        let json = r#"{
            "Herbs": { "category": "herb", "effect_value": 20, "use_effect": { "health": 15 } }
        }"#;
        let catalog: ItemCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.use_effect("Herbs").map(|effect| effect.health), Some(15));
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["Herbs"]);
    }
}
