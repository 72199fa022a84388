//! Plays a scenario AI-vs-AI and summarises the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tactics_core::data::ScenarioData;
use tactics_core::error::TacticsError;
use tactics_core::events::BattleEvent;
use tactics_core::game::{Game, GameBuilder};
use tactics_core::math::Fixed;
use tactics_core::player::PlayerNumber;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scenario::{ai_only, ScenarioError};

/// Error type for a single run.
#[derive(Error, Debug)]
pub enum RunError {
    /// The scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The scenario loaded but describes an invalid battle.
    #[error("Invalid battle setup: {0}")]
    Setup(#[from] TacticsError),
}

/// How a run is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Host tick length in milliseconds.
    pub tick_millis: u32,
    /// Give up after this many ticks (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_millis: 250,
            max_ticks: 20_000,
        }
    }
}

impl RunConfig {
    /// Tick length in seconds.
    #[must_use]
    pub fn tick(&self) -> Fixed {
        Fixed::from_num(self.tick_millis) / Fixed::from_num(1000)
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    /// Scenario name.
    pub scenario: String,
    /// Whether the battle was decided before the tick limit.
    pub finished: bool,
    /// Surviving player, if the battle was decided with one.
    pub winner: Option<PlayerNumber>,
    /// Completed turns.
    pub turns: u32,
    /// Host ticks played.
    pub ticks: u64,
    /// Attacks landed.
    pub attacks: u32,
    /// Destroyed unit ids in order of destruction.
    pub destroyed: Vec<u32>,
    /// Living units per player at the end.
    pub survivors: BTreeMap<PlayerNumber, usize>,
    /// Final battle state hash.
    pub state_hash: u64,
}

impl GameReport {
    /// Serialise to a single JSON line.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self).map(|json| json + "\n")
    }
}

/// Play `scenario` with every slot driven by the AI.
pub fn run_scenario(scenario: &ScenarioData, config: &RunConfig) -> Result<GameReport, RunError> {
    let scenario = ai_only(scenario.clone());
    let mut game = GameBuilder::from_scenario(&scenario).build()?;
    game.start();

    let dt = config.tick();
    let mut ticks = 0u64;
    let mut attacks = count_attacks(&mut game);
    while !game.is_over() && (config.max_ticks == 0 || ticks < config.max_ticks) {
        game.tick(dt);
        ticks += 1;
        attacks += count_attacks(&mut game);
    }

    let battle = game.battle();
    if !battle.is_over() {
        warn!(
            scenario = %scenario.name,
            ticks,
            "Tick limit reached before the battle was decided"
        );
    }

    let mut survivors: BTreeMap<PlayerNumber, usize> =
        battle.players().iter().map(|&p| (p, 0)).collect();
    for unit in battle.units() {
        *survivors.entry(unit.player()).or_default() += 1;
    }

    let report = GameReport {
        scenario: scenario.name.clone(),
        finished: battle.is_over(),
        winner: battle.winner(),
        turns: battle.turn(),
        ticks,
        attacks,
        destroyed: battle.fallen().iter().map(|id| id.0).collect(),
        survivors,
        state_hash: battle.state_hash(),
    };
    info!(
        scenario = %report.scenario,
        winner = ?report.winner,
        turns = report.turns,
        ticks = report.ticks,
        "Run complete"
    );
    Ok(report)
}

fn count_attacks(game: &mut Game) -> u32 {
    let mut attacks = 0;
    for event in game.battle_mut().drain_events() {
        match event {
            BattleEvent::UnitAttacked { .. } => attacks += 1,
            BattleEvent::TurnEnded { previous, current } => {
                debug!(previous, current, "Turn ended");
            }
            _ => {}
        }
    }
    attacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::skirmish_1v1;

    #[test]
    fn test_tick_conversion() {
        let config = RunConfig {
            tick_millis: 500,
            max_ticks: 1,
        };
        assert_eq!(config.tick(), Fixed::from_num(1) / Fixed::from_num(2));
    }

    #[test]
    fn test_skirmish_runs_to_completion() {
        let report = run_scenario(&skirmish_1v1().unwrap(), &RunConfig::default()).unwrap();
        assert!(report.finished);
        assert!(report.winner.is_some());
        assert!(report.attacks > 0);
        assert!(!report.destroyed.is_empty());

        let winner = report.winner.unwrap();
        assert!(report.survivors[&winner] > 0);
        for (&player, &count) in &report.survivors {
            if player != winner {
                assert_eq!(count, 0);
            }
        }
    }

    #[test]
    fn test_tick_limit_stops_the_run() {
        let config = RunConfig {
            tick_millis: 250,
            max_ticks: 3,
        };
        let report = run_scenario(&skirmish_1v1().unwrap(), &config).unwrap();
        assert_eq!(report.ticks, 3);
        assert!(!report.finished);
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_invalid_setup_is_reported() {
        let mut scenario = skirmish_1v1().unwrap();
        scenario.placements[0].template = "dragon".to_string();
        let err = run_scenario(&scenario, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, RunError::Setup(TacticsError::UnknownUnitTemplate(_))));
    }

    #[test]
    fn test_report_json_line() {
        let report = run_scenario(&skirmish_1v1().unwrap(), &RunConfig::default()).unwrap();
        let line = report.to_json_line().unwrap();
        assert!(line.ends_with('\n'));
        let parsed: GameReport = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, report);
    }
}
