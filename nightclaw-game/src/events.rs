//! Random side-events that intercept travel and later hand the player back.
//!
//! A transition toward node `n` is checked against an ordered trigger
//! table. The first trigger whose range covers `n` decides: a chance trigger
//! rolls `0..100` against its percent, a forced trigger always fires. When
//! one fires the player is diverted to the event node and `n` is remembered
//! as the return point; event branches end in the resume sentinel, which
//! sends the player back there. Only one event may fire per run.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{ENTRY_NODE_ID, NO_RETURN, NodeId, RESUME_SENTINEL, is_ending};
use crate::stats::Stats;
use crate::story::StoryGraph;

pub const BLIZZARD_EVENT: NodeId = 901;
pub const BEAR_EVENT: NodeId = 902;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventTrigger {
    /// Roll `percent` in 100 when heading into `first..=last`.
    Chance {
        first: NodeId,
        last: NodeId,
        percent: u8,
        event: NodeId,
    },
    /// Always fire when heading into `at`.
    Forced { at: NodeId, event: NodeId },
}

impl EventTrigger {
    #[must_use]
    pub const fn covers(&self, next: NodeId) -> bool {
        match *self {
            Self::Chance { first, last, .. } => first <= next && next <= last,
            Self::Forced { at, .. } => next == at,
        }
    }

    #[must_use]
    pub const fn event(&self) -> NodeId {
        match *self {
            Self::Chance { event, .. } | Self::Forced { event, .. } => event,
        }
    }

    fn fires<R: Rng>(&self, rng: &mut R) -> bool {
        match *self {
            Self::Chance { percent, .. } => rng.gen_range(0..100u8) < percent,
            Self::Forced { .. } => true,
        }
    }
}

/// The table used by the bundled story: blizzard early, bear late, and a
/// guaranteed bear when leaving the hazard zone untouched.
#[must_use]
pub fn default_triggers() -> Vec<EventTrigger> {
    vec![
        EventTrigger::Chance {
            first: 9,
            last: 12,
            percent: 30,
            event: BLIZZARD_EVENT,
        },
        EventTrigger::Chance {
            first: 13,
            last: 16,
            percent: 30,
            event: BEAR_EVENT,
        },
        EventTrigger::Forced {
            at: 17,
            event: BEAR_EVENT,
        },
    ]
}

/// A diverted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interception {
    pub event: NodeId,
    /// Where the player was heading, and where the event returns them.
    pub destination: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventInjector {
    triggers: Vec<EventTrigger>,
}

impl EventInjector {
    #[must_use]
    pub const fn new(triggers: Vec<EventTrigger>) -> Self {
        Self { triggers }
    }

    #[must_use]
    pub fn triggers(&self) -> &[EventTrigger] {
        &self.triggers
    }

    /// Decide whether travel toward `next` is intercepted. Draws from `rng`
    /// only when a chance trigger covers `next` and no event has fired yet.
    pub fn check<R: Rng>(
        &self,
        next: NodeId,
        event_happened: bool,
        rng: &mut R,
    ) -> Option<Interception> {
        if event_happened || next == RESUME_SENTINEL || is_ending(next) {
            return None;
        }
        let trigger = self.triggers.iter().find(|trigger| trigger.covers(next))?;
        trigger.fires(rng).then(|| Interception {
            event: trigger.event(),
            destination: next,
        })
    }

    /// [`EventInjector::check`], then record the return point and spend the
    /// run's single event.
    pub fn redirect<R: Rng>(
        &self,
        next: NodeId,
        stats: &mut Stats,
        return_to: &mut NodeId,
        rng: &mut R,
    ) -> Option<Interception> {
        let interception = self.check(next, stats.event_happened, rng)?;
        *return_to = interception.destination;
        stats.event_happened = true;
        log::debug!(
            "event {} intercepts travel to {}",
            interception.event,
            interception.destination
        );
        Some(interception)
    }
}

/// Where the resume sentinel leads: the remembered destination, or the
/// entry node when none was recorded.
#[must_use]
pub fn resume_target(return_to: NodeId, graph: &StoryGraph) -> NodeId {
    if return_to != NO_RETURN && graph.contains(return_to) {
        return_to
    } else {
        ENTRY_NODE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFEAT_NODE_ID, VICTORY_NODE_ID};
    use crate::story::StoryNode;
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha20Rng;

    fn always(first: NodeId, last: NodeId, event: NodeId) -> EventTrigger {
        EventTrigger::Chance {
            first,
            last,
            percent: 100,
            event,
        }
    }

    #[test]
    fn forced_trigger_fires_at_zone_exit() {
        let injector = EventInjector::new(default_triggers());
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let hit = injector.check(17, false, &mut rng).unwrap();
        assert_eq!(hit.event, BEAR_EVENT);
        assert_eq!(hit.destination, 17);
    }

    #[test]
    fn forced_trigger_matches_exact_id_only() {
        let injector = EventInjector::new(default_triggers());
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for next in [18, 101, 170, 1701] {
            assert!(injector.check(next, false, &mut rng).is_none());
        }
    }

    #[test]
    fn no_trigger_once_event_happened() {
        let injector = EventInjector::new(vec![always(9, 17, BLIZZARD_EVENT)]);
        let mut rng = StepRng::new(0, 0);
        for next in 9..=17 {
            assert!(injector.check(next, true, &mut rng).is_none());
        }
    }

    #[test]
    fn sentinel_and_endings_are_exempt() {
        let injector = EventInjector::new(vec![always(-200, 2_000, BLIZZARD_EVENT)]);
        let mut rng = StepRng::new(0, 0);
        for next in [RESUME_SENTINEL, DEFEAT_NODE_ID, VICTORY_NODE_ID] {
            assert!(injector.check(next, false, &mut rng).is_none());
        }
        assert!(injector.check(5, false, &mut rng).is_some());
    }

    #[test]
    fn first_covering_trigger_decides() {
        let injector = EventInjector::new(vec![
            EventTrigger::Chance {
                first: 9,
                last: 12,
                percent: 0,
                event: BLIZZARD_EVENT,
            },
            always(9, 12, BEAR_EVENT),
        ]);
        let mut rng = StepRng::new(0, 0);
        assert!(injector.check(10, false, &mut rng).is_none());
    }

    #[test]
    fn redirect_records_return_point() {
        let injector = EventInjector::new(default_triggers());
        let mut stats = Stats::default();
        let mut return_to = NO_RETURN;
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let hit = injector
            .redirect(17, &mut stats, &mut return_to, &mut rng)
            .unwrap();
        assert_eq!(hit.event, BEAR_EVENT);
        assert_eq!(return_to, 17);
        assert!(stats.event_happened);

        assert!(
            injector
                .redirect(17, &mut stats, &mut return_to, &mut rng)
                .is_none()
        );
    }

    #[test]
    fn hazard_zone_rate_tracks_thirty_percent() {
        const SAMPLES: u32 = 5_000;
        let injector = EventInjector::new(default_triggers());
        let mut rng = ChaCha20Rng::seed_from_u64(0x00C0_FFEE);
        let mut blizzards = 0u32;
        let mut bears = 0u32;
        for _ in 0..SAMPLES {
            if injector.check(10, false, &mut rng).is_some() {
                blizzards += 1;
            }
            if let Some(hit) = injector.check(14, false, &mut rng) {
                assert_eq!(hit.event, BEAR_EVENT);
                bears += 1;
            }
        }
        for count in [blizzards, bears] {
            let rate = f64::from(count) / f64::from(SAMPLES);
            assert!((rate - 0.30).abs() <= 0.025, "event rate drifted: {rate:.4}");
        }
    }

    #[test]
    fn resume_falls_back_to_entry() {
        let mut builder = StoryGraph::builder();
        builder
            .add_node(StoryNode::new(1, "start", "1.png"))
            .add_node(StoryNode::new(17, "wanderers", "17.png"));
        let graph = builder.build().unwrap();

        assert_eq!(resume_target(17, &graph), 17);
        assert_eq!(resume_target(NO_RETURN, &graph), ENTRY_NODE_ID);
        assert_eq!(resume_target(404, &graph), ENTRY_NODE_ID);
    }

    #[test]
    fn trigger_table_roundtrips_through_json() {
        let json = serde_json::to_string(&default_triggers()).unwrap();
        assert!(json.contains("\"kind\":\"forced\""));
        let parsed: Vec<EventTrigger> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, default_triggers());
    }
}
