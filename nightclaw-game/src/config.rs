//! Engine tunables: drift, rest and scavenge balance, event table, items.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ItemCatalog;
use crate::constants::{INVENTORY_CAPACITY, MAP_ITEM, UNDO_DEPTH};
use crate::events::{EventTrigger, default_triggers};
use crate::persistence::is_storable_name;
use crate::stats::StatDelta;

const DEFAULT_TUNING: &str = include_str!("../assets/tuning.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Minimum node-id distance from the last rest.
    pub cooldown: i32,
    pub effect: StatDelta,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            cooldown: 5,
            effect: StatDelta {
                health: 20,
                energy: 40,
                hunger: 10,
                reputation: 0,
                days: 1,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScavengeConfig {
    /// Minimum node-id distance from the last scavenge.
    pub cooldown: i32,
    /// Energy must be strictly above this to scavenge.
    pub min_energy: i32,
    pub effect: StatDelta,
    pub find_percent: u8,
    pub find_item: String,
}

impl Default for ScavengeConfig {
    fn default() -> Self {
        Self {
            cooldown: 3,
            min_energy: 10,
            effect: StatDelta {
                energy: -10,
                days: 1,
                ..StatDelta::default()
            },
            find_percent: 60,
            find_item: "Meat".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default = "EngineConfig::builtin")]
pub struct EngineConfig {
    pub undo_depth: usize,
    /// Advisory only; adds beyond it are still accepted.
    pub inventory_capacity: usize,
    /// Applied on every choice before the destination is resolved.
    pub turn_drift: StatDelta,
    pub rest: RestConfig,
    pub scavenge: ScavengeConfig,
    /// Checked in order; the first trigger covering a destination decides.
    pub events: Vec<EventTrigger>,
    pub catalog: ItemCatalog,
    pub starting_items: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_TUNING).unwrap_or_else(|err| {
            log::warn!("bundled tuning is malformed, using built-in table: {err}");
            Self::builtin()
        })
    }
}

impl EngineConfig {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default()
    }

    fn builtin() -> Self {
        Self {
            undo_depth: UNDO_DEPTH,
            inventory_capacity: INVENTORY_CAPACITY,
            turn_drift: StatDelta {
                energy: -5,
                hunger: 5,
                ..StatDelta::default()
            },
            rest: RestConfig::default(),
            scavenge: ScavengeConfig::default(),
            events: default_triggers(),
            catalog: ItemCatalog::default(),
            starting_items: vec![MAP_ITEM.to_string()],
        }
    }

    /// Parse caller-supplied tuning. Missing fields keep their built-in values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when [`EngineConfig::validate`] rejects it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_depth == 0 {
            return Err(ConfigError::Invalid("undo_depth must be at least 1".into()));
        }
        if let Some(name) = self.catalog.names().find(|name| !is_storable_name(name)) {
            return Err(ConfigError::Invalid(format!(
                "catalog item name {name:?} must be a single non-blank line"
            )));
        }
        if self.rest.cooldown < 0 || self.scavenge.cooldown < 0 {
            return Err(ConfigError::Invalid("cooldowns cannot be negative".into()));
        }
        if self.scavenge.find_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "scavenge find_percent {} exceeds 100",
                self.scavenge.find_percent
            )));
        }
        if !self.scavenge.find_item.is_empty() && !self.catalog.contains(&self.scavenge.find_item) {
            return Err(ConfigError::Invalid(format!(
                "scavenge find_item {:?} is not in the catalog",
                self.scavenge.find_item
            )));
        }
        for trigger in &self.events {
            if let EventTrigger::Chance {
                first,
                last,
                percent,
                ..
            } = *trigger
            {
                if first > last {
                    return Err(ConfigError::Invalid(format!(
                        "event range {first}..={last} is empty"
                    )));
                }
                if percent > 100 {
                    return Err(ConfigError::Invalid(format!(
                        "event chance {percent} exceeds 100"
                    )));
                }
            }
        }
        if let Some(name) = self
            .starting_items
            .iter()
            .find(|name| !self.catalog.contains(name))
        {
            return Err(ConfigError::Invalid(format!(
                "starting item {name:?} is not in the catalog"
            )));
        }
        Ok(())
    }
}
