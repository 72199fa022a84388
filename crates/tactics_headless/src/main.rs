//! Headless tactics runner.
//!
//! # Usage
//!
//! ```bash
//! # Play the built-in 1v1 skirmish AI-vs-AI and print a JSON report
//! cargo run -p tactics_headless -- run
//!
//! # Play a scenario file with human players over stdin/stdout
//! cargo run -p tactics_headless -- play --scenario duel.ron
//!
//! # Play every scenario in a directory, three times each
//! cargo run -p tactics_headless -- batch --dir scenarios --repeat 3 --output results/
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --scenario skirmish_1v1 --runs 5
//! ```
//!
//! Output (stdout): JSON
//! Logs (stderr): Debug information

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_scenario, RunConfig},
    scenario,
    session::{Session, SessionConfig},
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless turn-based tactics runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one scenario AI-vs-AI and print the report
    Run {
        /// Scenario file, or `skirmish_1v1` for the built-in one
        #[arg(short, long)]
        scenario: Option<String>,

        /// Give up after this many ticks (0 = unlimited)
        #[arg(long, default_value = "20000")]
        max_ticks: u64,

        /// Tick length in milliseconds
        #[arg(long, default_value = "250")]
        tick_millis: u32,
    },

    /// Play a scenario interactively over JSON lines
    Play {
        /// Scenario file, or `skirmish_1v1` for the built-in one
        #[arg(short, long)]
        scenario: Option<String>,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,

        /// Tick length in milliseconds
        #[arg(long, default_value = "250")]
        tick_millis: u32,
    },

    /// Play every scenario in a directory
    Batch {
        /// Directory of scenario files
        #[arg(short, long, default_value = "scenarios")]
        dir: PathBuf,

        /// Plays per scenario
        #[arg(short, long, default_value = "1")]
        repeat: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Give up after this many ticks (0 = unlimited)
        #[arg(long, default_value = "20000")]
        max_ticks: u64,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario file, or `skirmish_1v1` for the built-in one
        #[arg(short, long)]
        scenario: Option<String>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for JSON)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            max_ticks,
            tick_millis,
        }) => cmd_run(
            scenario.as_deref(),
            RunConfig {
                tick_millis,
                max_ticks,
            },
        ),
        Some(Commands::Play {
            scenario,
            auto_state,
            tick_millis,
        }) => cmd_play(
            scenario.as_deref(),
            SessionConfig {
                tick_millis,
                auto_state,
            },
        ),
        Some(Commands::Batch {
            dir,
            repeat,
            parallel,
            output,
            max_ticks,
        }) => cmd_batch(dir, repeat, parallel, output, max_ticks),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario.as_deref(), runs),
        None => cmd_run(None, RunConfig::default()),
    }
}

fn fatal(message: impl std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

/// Play one scenario and print its report
fn cmd_run(scenario: Option<&str>, config: RunConfig) {
    let scenario = scenario::resolve(scenario).unwrap_or_else(|e| fatal(e));
    let report = run_scenario(&scenario, &config).unwrap_or_else(|e| fatal(e));
    let json = report.to_json_line().unwrap_or_else(|e| fatal(e));
    print!("{json}");
    io::stdout().flush().ok();
}

/// Drive human players from stdin
fn cmd_play(scenario: Option<&str>, config: SessionConfig) {
    let scenario = scenario::resolve(scenario).unwrap_or_else(|e| fatal(e));
    let mut session = Session::new(&scenario, config).unwrap_or_else(|e| fatal(e));
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = session.run(stdin.lock(), stdout.lock()) {
        fatal(format!("Session aborted: {e}"));
    }
}

/// Play a directory of scenarios in parallel
fn cmd_batch(dir: PathBuf, repeat: u32, parallel: u32, output: PathBuf, max_ticks: u64) {
    if let Err(e) = std::fs::create_dir_all(&output) {
        fatal(format!(
            "Cannot create output directory '{}': {}",
            output.display(),
            e
        ));
    }

    let config = BatchConfig {
        scenario_dir: dir,
        repeat,
        parallel_games: parallel,
        run: RunConfig {
            max_ticks,
            ..RunConfig::default()
        },
    };
    let results = run_batch(config).unwrap_or_else(|e| fatal(e));

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fatal(format!("Failed to save results: {e}"));
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    eprintln!("Decided:      {}", results.summary.decided);
    for (player, wins) in &results.summary.wins {
        eprintln!("Player {player} wins: {wins}");
    }
    eprintln!("Average turns: {:.1}", results.summary.average_turns);
    if !results.errors.is_empty() {
        eprintln!("Failures:     {}", results.errors.len());
        for error in &results.errors {
            eprintln!("  {}: {}", error.path.display(), error.message);
        }
    }
    eprintln!("Results saved to: {}", results_path.display());
}

/// Run the same scenario several times and compare hashes
fn cmd_verify(scenario: Option<&str>, runs: u32) {
    let scenario = scenario::resolve(scenario).unwrap_or_else(|e| fatal(e));
    let report =
        verify_determinism(&scenario, runs, &RunConfig::default()).unwrap_or_else(|e| fatal(e));
    match serde_json::to_string(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => fatal(e),
    }
    if !report.deterministic {
        eprintln!("FAILED: {} runs produced different state hashes", runs);
        std::process::exit(1);
    }
    eprintln!("PASSED: {} runs ended in the same state", runs);
}
