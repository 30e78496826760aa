//! Drive one session to an ending with a policy, checking engine
//! invariants after every operation.
use std::collections::HashSet;
use std::sync::Arc;

use nightclaw_game::constants::{DEFEAT_NODE_ID, LOG_EVENT_INTERRUPT, STAT_MAX, STAT_MIN};
use nightclaw_game::{
    EngineConfig, GameSession, LoadOutcome, MemoryStorage, Rank, SaveOutcome, StoryGraph,
};
use serde::{Deserialize, Serialize};

use super::policy::{GameplayStrategy, TurnAction};

const FINAL_SAVE: &str = "final-check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Victory,
    Defeat,
    TurnLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub outcome: RunOutcome,
    pub turns: usize,
    pub undos: usize,
    pub final_node: Option<i32>,
    pub health: i32,
    pub hunger: i32,
    pub reputation: i32,
    pub day_count: i32,
    pub rank: Rank,
    pub event_happened: bool,
    pub violations: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.outcome != RunOutcome::TurnLimit
    }
}

/// Run `strategy` against a fresh session until it ends or `max_turns` pass.
#[must_use]
pub fn play(
    graph: &Arc<StoryGraph>,
    config: &EngineConfig,
    strategy: GameplayStrategy,
    seed: u64,
    max_turns: usize,
) -> RunSummary {
    let mut session = GameSession::new(Arc::clone(graph), config.clone(), seed);
    session.start();
    while session.advance_intro() {}

    let mut policy = strategy.create_policy(seed);
    let mut violations = Vec::new();
    let mut turns = 0;
    let mut undos = 0;

    while !session.is_over() && !session.is_won() && turns < max_turns {
        let action = policy.take_turn(&mut session);
        turns += 1;
        if action == TurnAction::Undo {
            undos += 1;
        }
        log::trace!("{} seed {seed} turn {turns}: {action}", policy.name());
        for problem in check_invariants(&session, config) {
            violations.push(format!("turn {turns} ({action}): {problem}"));
        }
    }

    let outcome = if session.is_won() {
        RunOutcome::Victory
    } else if session.is_over() {
        RunOutcome::Defeat
    } else {
        RunOutcome::TurnLimit
    };
    if let Err(problem) = check_save_round_trip(&mut session) {
        violations.push(problem);
    }

    let stats = session.stats();
    RunSummary {
        strategy,
        seed,
        outcome,
        turns,
        undos,
        final_node: session.current_node_id(),
        health: stats.health,
        hunger: stats.hunger,
        reputation: stats.reputation,
        day_count: stats.day_count,
        rank: session.rank(),
        event_happened: stats.event_happened,
        violations,
    }
}

/// Everything that must hold between any two player operations.
#[must_use]
pub fn check_invariants(session: &GameSession, config: &EngineConfig) -> Vec<String> {
    let mut problems = Vec::new();
    let stats = session.stats();
    for (label, value) in [
        ("health", stats.health),
        ("energy", stats.energy),
        ("hunger", stats.hunger),
        ("reputation", stats.reputation),
    ] {
        if !(STAT_MIN..=STAT_MAX).contains(&value) {
            problems.push(format!("{label} out of range: {value}"));
        }
    }
    if stats.day_count < 1 {
        problems.push(format!("day count below one: {}", stats.day_count));
    }

    let depth = session.undo_history().len();
    if depth > config.undo_depth {
        problems.push(format!(
            "undo history holds {depth} entries (limit {})",
            config.undo_depth
        ));
    }

    let mut names = HashSet::new();
    for item in session.inventory().iter() {
        if item.quantity == 0 {
            problems.push(format!("{} has zero quantity", item.name));
        }
        if !names.insert(item.name.as_str()) {
            problems.push(format!("{} appears twice", item.name));
        }
    }

    if session.is_over() && session.current_node_id() != Some(DEFEAT_NODE_ID) {
        problems.push(format!(
            "defeated but standing on {:?}",
            session.current_node_id()
        ));
    }

    let events = session
        .log()
        .iter()
        .filter(|line| *line == LOG_EVENT_INTERRUPT)
        .count();
    if events > 1 {
        problems.push(format!("{events} random events fired in one run"));
    }
    problems
}

fn check_save_round_trip(session: &mut GameSession) -> Result<(), String> {
    let storage = MemoryStorage::default();
    let expected = session.record();
    let file_name = match session.save(&storage, FINAL_SAVE) {
        SaveOutcome::Saved { file_name } => file_name,
        SaveOutcome::Failed { reason, .. } => return Err(format!("final save failed: {reason}")),
    };

    let mut reloaded = session.clone();
    reloaded.init_game();
    match reloaded.load(&storage, &file_name) {
        LoadOutcome::Loaded => {}
        other => return Err(format!("final load failed: {other:?}")),
    }
    let restored = reloaded.record();
    if restored == expected {
        Ok(())
    } else {
        Err(format!(
            "save round trip changed the run: {expected:?} became {restored:?}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Arc<StoryGraph> {
        Arc::new(StoryGraph::bundled().unwrap())
    }

    #[test]
    fn every_strategy_finishes_cleanly() {
        let graph = bundled();
        let config = EngineConfig::default();
        for strategy in GameplayStrategy::ALL {
            for seed in [1, 2, 3] {
                let summary = play(&graph, &config, strategy, seed, 500);
                assert!(
                    summary.passed(),
                    "{strategy} seed {seed}: {:?} {:?}",
                    summary.outcome,
                    summary.violations
                );
            }
        }
    }

    #[test]
    fn turn_limit_is_reported() {
        let summary = play(
            &bundled(),
            &EngineConfig::default(),
            GameplayStrategy::FirstChoice,
            5,
            3,
        );
        assert_eq!(summary.outcome, RunOutcome::TurnLimit);
        assert_eq!(summary.turns, 3);
        assert!(!summary.passed());
    }

    #[test]
    fn invariants_flag_corrupted_state() {
        let graph = bundled();
        let config = EngineConfig::default();
        let mut session = GameSession::new(graph, config.clone(), 1);
        assert!(check_invariants(&session, &config).is_empty());

        session.stats_mut().health = 150;
        session.stats_mut().day_count = 0;
        let problems = check_invariants(&session, &config);
        assert_eq!(problems.len(), 2, "{problems:?}");
        assert!(problems[0].contains("health"));
    }
}
