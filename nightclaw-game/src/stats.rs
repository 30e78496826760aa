//! Player stat model: bounded survival meters plus run markers.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    COOLDOWN_UNSET, FIRST_DAY, LEGENDARY_REPUTATION, NodeId, PACK_LEADER_REPUTATION, STAT_MAX,
    STAT_MIN,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: i32,
    pub energy: i32,
    pub hunger: i32,
    pub reputation: i32,
    pub day_count: i32,
    pub pack_size: i32,
    /// Node id where the player last rested.
    pub last_rest_node: NodeId,
    /// Node id where the player last scavenged.
    pub last_scavenge_node: NodeId,
    /// Set once the single random event of a run has fired.
    pub event_happened: bool,
    pub has_pack: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: 100,
            energy: 100,
            hunger: 0,
            reputation: 0,
            day_count: FIRST_DAY,
            pack_size: 0,
            last_rest_node: COOLDOWN_UNSET,
            last_scavenge_node: COOLDOWN_UNSET,
            event_happened: false,
            has_pack: false,
        }
    }
}

impl Stats {
    /// Clip the four survival meters to `0..=100`.
    pub fn clamp(&mut self) {
        self.health = self.health.clamp(STAT_MIN, STAT_MAX);
        self.energy = self.energy.clamp(STAT_MIN, STAT_MAX);
        self.hunger = self.hunger.clamp(STAT_MIN, STAT_MAX);
        self.reputation = self.reputation.clamp(STAT_MIN, STAT_MAX);
        self.day_count = self.day_count.max(FIRST_DAY);
    }

    /// Add `delta` without clamping.
    pub fn apply(&mut self, delta: &StatDelta) {
        self.health = self.health.saturating_add(delta.health);
        self.energy = self.energy.saturating_add(delta.energy);
        self.hunger = self.hunger.saturating_add(delta.hunger);
        self.reputation = self.reputation.saturating_add(delta.reputation);
        self.day_count = self.day_count.saturating_add(delta.days);
    }

    /// Starved or bled out.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.health <= STAT_MIN || self.hunger >= STAT_MAX
    }

    #[must_use]
    pub const fn rank(&self) -> Rank {
        if self.reputation >= LEGENDARY_REPUTATION {
            Rank::LegendaryAlpha
        } else if self.reputation >= PACK_LEADER_REPUTATION {
            Rank::PackLeader
        } else {
            Rank::LoneSurvivor
        }
    }
}

/// Additive change to the survival meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatDelta {
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub hunger: i32,
    #[serde(default)]
    pub reputation: i32,
    #[serde(default)]
    pub days: i32,
}

impl StatDelta {
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.health == 0
            && self.energy == 0
            && self.hunger == 0
            && self.reputation == 0
            && self.days == 0
    }
}

impl fmt::Display for StatDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.health, "HP"),
            (self.energy, "Energy"),
            (self.hunger, "Hunger"),
            (self.reputation, "Reputation"),
            (self.days, "Day"),
        ];
        let mut first = true;
        for (value, label) in parts {
            if value == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{value:+} {label}")?;
            first = false;
        }
        Ok(())
    }
}

/// End-of-run title earned through reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    LoneSurvivor,
    PackLeader,
    LegendaryAlpha,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoneSurvivor => f.write_str("Lone Survivor"),
            Self::PackLeader => f.write_str("Pack Leader"),
            Self::LegendaryAlpha => f.write_str("Legendary Alpha"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters(stats: &Stats) -> [i32; 4] {
        [stats.health, stats.energy, stats.hunger, stats.reputation]
    }

    #[test]
    fn clamp_bounds_every_meter() {
        for value in [-500, -1, 0, 1, 50, 99, 100, 101, 10_000] {
            let mut stats = Stats {
                health: value,
                energy: -value,
                hunger: value,
                reputation: value.saturating_mul(3),
                ..Stats::default()
            };
            stats.clamp();
            for meter in meters(&stats) {
                assert!((STAT_MIN..=STAT_MAX).contains(&meter), "{meter} escaped");
            }
        }
    }

    #[test]
    fn clamp_is_idempotent_in_range() {
        let mut stats = Stats {
            health: 42,
            energy: 0,
            hunger: 100,
            reputation: 7,
            ..Stats::default()
        };
        let before = stats.clone();
        stats.clamp();
        assert_eq!(stats, before);
        stats.clamp();
        assert_eq!(stats, before);
    }

    #[test]
    fn collapse_on_health_or_hunger() {
        let healthy = Stats::default();
        assert!(!healthy.is_collapsed());

        let bled = Stats {
            health: 0,
            ..Stats::default()
        };
        assert!(bled.is_collapsed());

        let starved = Stats {
            hunger: 100,
            ..Stats::default()
        };
        assert!(starved.is_collapsed());
    }

    #[test]
    fn apply_adds_without_clamping() {
        let mut stats = Stats::default();
        stats.apply(&StatDelta {
            health: 15,
            energy: -5,
            hunger: 5,
            reputation: 3,
            days: 1,
        });
        assert_eq!(stats.health, 115);
        assert_eq!(stats.energy, 95);
        assert_eq!(stats.hunger, 5);
        assert_eq!(stats.reputation, 3);
        assert_eq!(stats.day_count, 2);
    }

    #[test]
    fn rank_thresholds() {
        let mut stats = Stats::default();
        assert_eq!(stats.rank(), Rank::LoneSurvivor);
        stats.reputation = 40;
        assert_eq!(stats.rank(), Rank::PackLeader);
        stats.reputation = 80;
        assert_eq!(stats.rank().to_string(), "Legendary Alpha");
    }

    #[test]
    fn delta_display_lists_nonzero_parts() {
        let delta = StatDelta {
            health: 20,
            energy: 40,
            ..StatDelta::default()
        };
        assert_eq!(delta.to_string(), "+20 HP, +40 Energy");
        assert_eq!(StatDelta::default().to_string(), "");
    }
}
