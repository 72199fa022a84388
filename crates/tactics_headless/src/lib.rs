//! Headless battle runner for AI matches, batch runs and CI verification.
//!
//! This crate plays `tactics_core` battles without any rendering:
//!
//! - **Runs**: play a scenario AI-vs-AI and report the outcome as JSON
//! - **Batches**: play every scenario in a directory in parallel
//! - **Verification**: check that repeated runs end in the same state
//! - **Sessions**: drive human players over JSON lines on stdin/stdout
//!
//! Logs go to stderr so stdout stays machine-readable.
//!
//! # Example
//!
//! ```bash
//! # Play the built-in skirmish
//! cargo run -p tactics_headless -- run
//!
//! # Play every scenario in a directory
//! cargo run -p tactics_headless -- batch --dir crates/tactics_headless/scenarios
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --runs 5
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod session;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, VerifyReport};
pub use protocol::{Command, Response};
pub use runner::{run_scenario, GameReport, RunConfig, RunError};
pub use scenario::ScenarioError;
pub use session::{Session, SessionConfig};
