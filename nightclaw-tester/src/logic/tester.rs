use colored::Colorize;
use nightclaw_game::{EngineConfig, StoryGraph};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::playthrough::{RunOutcome, RunSummary, play};
use super::policy::GameplayStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub victories: usize,
    pub defeats: usize,
    pub average_turns: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// Runs strategies over seeds against one story and tuning.
pub struct LogicTester {
    graph: Arc<StoryGraph>,
    config: EngineConfig,
    max_turns: usize,
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(
        graph: Arc<StoryGraph>,
        config: EngineConfig,
        max_turns: usize,
        verbose: bool,
    ) -> Self {
        Self {
            graph,
            config,
            max_turns,
            verbose,
        }
    }

    #[must_use]
    pub fn run_strategy(
        &self,
        strategy: GameplayStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing strategy: {} (seed: {seed})",
                        strategy.key().bright_white()
                    );
                }
                self.run_single(strategy, seed, iterations)
            })
            .collect()
    }

    fn run_single(
        &self,
        strategy: GameplayStrategy,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut victories = 0;
        let mut defeats = 0;
        let mut total_turns = 0usize;
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let start_time = Instant::now();
            let summary = play(
                &self.graph,
                &self.config,
                strategy,
                iteration_seed,
                self.max_turns,
            );
            durations.push(start_time.elapsed());
            total_turns += summary.turns;
            match summary.outcome {
                RunOutcome::Victory => victories += 1,
                RunOutcome::Defeat => defeats += 1,
                RunOutcome::TurnLimit => {}
            }

            if summary.passed() {
                successes += 1;
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{iterations} {:?} in {} turns, rank {}",
                        i + 1,
                        summary.outcome,
                        summary.turns,
                        summary.rank
                    );
                }
            } else {
                let failure = describe_failure(i + 1, &summary, self.max_turns);
                if self.verbose {
                    println!("  ❌ {}", failure.clone().red());
                }
                failures.push(failure);
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_turns = if iterations == 0 {
            0.0
        } else {
            total_turns as f64 / iterations as f64
        };

        ScenarioResult {
            scenario_name: strategy.key().to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            victories,
            defeats,
            average_turns,
            failures,
            average_duration,
        }
    }
}

fn describe_failure(iteration: usize, summary: &RunSummary, max_turns: usize) -> String {
    let reason = if summary.outcome == RunOutcome::TurnLimit && summary.violations.is_empty() {
        format!("no ending within {max_turns} turns")
    } else {
        summary.violations.join("; ")
    };
    format!(
        "Iteration {iteration} (strategy {}, seed {}, turns {}, node {:?}): {reason} | final HP {} Hunger {} Reputation {} Day {}",
        summary.strategy,
        summary.seed,
        summary.turns,
        summary.final_node,
        summary.health,
        summary.hunger,
        summary.reputation,
        summary.day_count
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
