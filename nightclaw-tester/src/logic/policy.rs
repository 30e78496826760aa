use std::fmt;

use nightclaw_game::GameSession;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

const HUNGRY_AT: i32 = 50;
const FOOD: &str = "Meat";
const UNDO_PERCENT: u32 = 25;

/// What a policy did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    Choose(usize),
    Rest,
    Scavenge,
    Eat,
    Undo,
}

impl fmt::Display for TurnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choose(index) => write!(f, "choose #{index}"),
            Self::Rest => f.write_str("rest"),
            Self::Scavenge => f.write_str("scavenge"),
            Self::Eat => f.write_str("eat"),
            Self::Undo => f.write_str("undo"),
        }
    }
}

/// Policy interface for automated play.
pub trait PlayerPolicy {
    fn name(&self) -> &'static str;

    /// Perform exactly one player operation on `session`.
    fn take_turn(&mut self, session: &mut GameSession) -> TurnAction;
}

/// Built-in automated players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameplayStrategy {
    FirstChoice,
    RandomChoice,
    Survivalist,
    UndoHeavy,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::FirstChoice,
        Self::RandomChoice,
        Self::Survivalist,
        Self::UndoHeavy,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstChoice => "first-choice",
            Self::RandomChoice => "random-choice",
            Self::Survivalist => "survivalist",
            Self::UndoHeavy => "undo-heavy",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstChoice => "Always takes the first listed choice",
            Self::RandomChoice => "Picks uniformly among the listed choices",
            Self::Survivalist => "Eats when hungry, rests and scavenges whenever allowed",
            Self::UndoHeavy => "Random choices, frequently undone and re-picked",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(key.trim()))
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::FirstChoice => Box::new(FirstChoicePolicy),
            Self::RandomChoice => Box::new(RandomChoicePolicy::new(seed)),
            Self::Survivalist => Box::new(SurvivalistPolicy),
            Self::UndoHeavy => Box::new(UndoHeavyPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

struct FirstChoicePolicy;
struct SurvivalistPolicy;

struct RandomChoicePolicy {
    rng: ChaCha20Rng,
}

impl RandomChoicePolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct UndoHeavyPolicy {
    rng: ChaCha20Rng,
    just_undid: bool,
}

impl UndoHeavyPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            just_undid: false,
        }
    }
}

fn choice_count(session: &GameSession) -> usize {
    session
        .current_node()
        .map_or(0, |node| node.choices.len())
}

fn choose(session: &mut GameSession, index: usize) -> TurnAction {
    session.make_choice(index);
    TurnAction::Choose(index)
}

fn choose_random(session: &mut GameSession, rng: &mut ChaCha20Rng) -> TurnAction {
    let count = choice_count(session);
    let index = if count == 0 {
        0
    } else {
        rng.gen_range(0..count)
    };
    choose(session, index)
}

impl PlayerPolicy for FirstChoicePolicy {
    fn name(&self) -> &'static str {
        "First Choice"
    }

    fn take_turn(&mut self, session: &mut GameSession) -> TurnAction {
        choose(session, 0)
    }
}

impl PlayerPolicy for RandomChoicePolicy {
    fn name(&self) -> &'static str {
        "Random Choice"
    }

    fn take_turn(&mut self, session: &mut GameSession) -> TurnAction {
        choose_random(session, &mut self.rng)
    }
}

impl PlayerPolicy for SurvivalistPolicy {
    fn name(&self) -> &'static str {
        "Survivalist"
    }

    fn take_turn(&mut self, session: &mut GameSession) -> TurnAction {
        session.resume_gameplay();
        if session.stats().hunger >= HUNGRY_AT && session.inventory().has(FOOD) {
            session.use_item(FOOD);
            return TurnAction::Eat;
        }
        if session.rest() {
            return TurnAction::Rest;
        }
        if session.scavenge() {
            return TurnAction::Scavenge;
        }
        choose(session, 0)
    }
}

impl PlayerPolicy for UndoHeavyPolicy {
    fn name(&self) -> &'static str {
        "Undo Heavy"
    }

    fn take_turn(&mut self, session: &mut GameSession) -> TurnAction {
        let wants_undo = self.rng.gen_range(0..100) < UNDO_PERCENT;
        if wants_undo && !self.just_undid && !session.undo_history().is_empty() {
            self.just_undid = true;
            session.undo();
            return TurnAction::Undo;
        }
        self.just_undid = false;
        choose_random(session, &mut self.rng)
    }
}
