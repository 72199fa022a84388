//! Batch runner.
//!
//! Plays every scenario in a directory in parallel using rayon and collects
//! the reports. Battles are built inside each worker, nothing is shared
//! between runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tactics_core::data::ScenarioData;
use tactics_core::player::PlayerNumber;
use tracing::{info, warn};

use crate::runner::{run_scenario, GameReport, RunConfig, RunError};
use crate::scenario::{self, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory holding the scenario files.
    pub scenario_dir: PathBuf,
    /// Plays per scenario.
    pub repeat: u32,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Per-run settings.
    pub run: RunConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario_dir: PathBuf::from("scenarios"),
            repeat: 1,
            parallel_games: 0,
            run: RunConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a scenario directory.
    pub fn new(scenario_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenario_dir: scenario_dir.into(),
            ..Default::default()
        }
    }

    /// Set plays per scenario.
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set per-run settings.
    pub fn with_run(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }
}

/// Error during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario file.
    pub path: PathBuf,
    /// Error message.
    pub message: String,
}

/// Aggregate numbers over all finished games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games played.
    pub total_games: usize,
    /// Games decided before the tick limit.
    pub decided: usize,
    /// Wins per player number.
    pub wins: BTreeMap<PlayerNumber, u32>,
    /// Mean completed turns per game.
    pub average_turns: f64,
}

impl BatchSummary {
    /// Summarise a set of reports.
    #[must_use]
    pub fn from_reports(reports: &[GameReport]) -> Self {
        let mut wins = BTreeMap::new();
        for winner in reports.iter().filter_map(|r| r.winner) {
            *wins.entry(winner).or_insert(0) += 1;
        }
        let turns: u64 = reports.iter().map(|r| u64::from(r.turns)).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_turns = if reports.is_empty() {
            0.0
        } else {
            turns as f64 / reports.len() as f64
        };
        Self {
            total_games: reports.len(),
            decided: reports.iter().filter(|r| r.finished).count(),
            wins,
            average_turns,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game reports, in scenario order.
    pub games: Vec<GameReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn run_file(path: &Path, run: &RunConfig) -> Result<GameReport, RunError> {
    let scenario = scenario::load(path)?;
    run_scenario(&scenario, run)
}

/// Run every scenario in `config.scenario_dir`.
///
/// Fails only when the directory cannot be listed; per-scenario failures
/// land in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let files = scenario::scenario_files(&config.scenario_dir)?;
    info!(
        scenarios = files.len(),
        repeat = config.repeat,
        dir = %config.scenario_dir.display(),
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let jobs: Vec<&PathBuf> = files
        .iter()
        .flat_map(|path| std::iter::repeat(path).take(config.repeat as usize))
        .collect();

    let results: Vec<Result<GameReport, BatchError>> = jobs
        .par_iter()
        .map(|&path| {
            run_file(path, &config.run).map_err(|e| {
                warn!(path = %path.display(), error = %e, "Game failed");
                BatchError {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameReport> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_reports(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        failed = errors.len(),
        duration_secs = format!("{duration_seconds:.2}"),
        "Batch complete"
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run ended in the same state.
    pub deterministic: bool,
}

/// Play `scenario` `runs` times and compare the final state hashes.
pub fn verify_determinism(
    scenario: &ScenarioData,
    runs: u32,
    config: &RunConfig,
) -> Result<VerifyReport, RunError> {
    let hashes = (0..runs)
        .map(|_| run_scenario(scenario, config).map(|report| report.state_hash))
        .collect::<Result<Vec<_>, _>>()?;
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(scenario = %scenario.name, ?hashes, "Runs diverged");
    }
    Ok(VerifyReport {
        scenario: scenario.name.clone(),
        hashes,
        deterministic,
    })
}
