//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and AI batch runs rely on the battle being fully deterministic.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: we use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units and cells live in `BTreeMap`s and every tie breaks on ids.
//!
//! - **System randomness**: none in the core.

use tactics_core::data::ScenarioData;
use tactics_core::game::{Game, GameBuilder};
use tactics_core::math::Fixed;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Build and start a game from a scenario.
///
/// # Panics
///
/// Panics if the scenario is malformed.
#[must_use]
pub fn start_scenario(scenario: &ScenarioData) -> Game {
    let mut game = GameBuilder::from_scenario(scenario)
        .build()
        .expect("scenario builds");
    game.start();
    game
}

/// Play a scenario `runs` times for `ticks` quarter-second ticks each and
/// compare the final state hashes.
#[must_use]
pub fn verify_scenario_determinism(scenario: &ScenarioData, runs: usize, ticks: u64) -> DeterminismResult {
    let quarter = Fixed::ONE / Fixed::from_num(4);
    verify_determinism(
        runs,
        ticks,
        || start_scenario(scenario),
        |game| game.tick(quarter),
        |game| game.battle().state_hash(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::skirmish_scenario;

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 10,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_panics_on_mismatch() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![1, 2],
            ticks: 1,
        };
        result.assert_deterministic();
    }

    #[test]
    fn test_skirmish_is_deterministic() {
        let result = verify_scenario_determinism(&skirmish_scenario(), 3, 200);
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 3);
    }
}
