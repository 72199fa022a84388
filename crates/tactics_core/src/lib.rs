//! # Tactics Core
//!
//! Deterministic turn-based tactical combat core.
//!
//! This crate contains **only** battle logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! The host forwards input into a [`battle::Battle`] (usually through a
//! [`game::Game`]), receives feedback through a
//! [`presentation::Presenter`] and listens to [`events::BattleEvent`]s.
//!
//! ## Crate Structure
//!
//! - [`grid`], [`hex`], [`cell`] - Hex battlefield and occupancy
//! - [`graph`], [`pathfinding`] - Movement graph and the three pathfinders
//! - [`unit`], [`unit_state`] - Units, their path cache and lifecycle
//! - [`battle`], [`grid_state`] - Battle state and input state machine
//! - [`game`], [`player`], [`ai`] - Turn driver and players
//! - [`data`] - RON-friendly scenario definitions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod ai;
pub mod battle;
pub mod buffs;
pub mod cell;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod game;
pub mod generators;
pub mod graph;
pub mod grid;
pub mod grid_state;
pub mod hex;
pub mod math;
pub mod movement;
pub mod pathfinding;
pub mod player;
pub mod presentation;
mod turn;
pub mod unit;
pub mod unit_state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::{AbilityCost, AbilityKind, AbilityPoints, UnitAbility};
    pub use crate::ai::AiPlayer;
    pub use crate::battle::Battle;
    pub use crate::buffs::{Buff, BuffEffect};
    pub use crate::cell::{Cell, CellId, TileTag};
    pub use crate::config::BattleConfig;
    pub use crate::data::{MapData, ScenarioData, UnitData};
    pub use crate::error::{Result, TacticsError};
    pub use crate::events::BattleEvent;
    pub use crate::game::{Game, GameBuilder};
    pub use crate::generators::{CellGenerator, ObstacleGenerator, UnitGenerator};
    pub use crate::graph::{build_graph, Graph, Mobility, Traversal};
    pub use crate::grid::Grid;
    pub use crate::grid_state::{GridState, Selection};
    pub use crate::hex::HexCoord;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::movement::TaskStatus;
    pub use crate::pathfinding::{AStar, BStar, Dijkstra, Path, Pathfinders, Pathfinding};
    pub use crate::player::{HumanPlayer, Player, PlayerNumber};
    pub use crate::presentation::{CellMark, MarkBoard, NullPresenter, Presenter, UnitMark};
    pub use crate::unit::{Unit, UnitId, UnitStats};
    pub use crate::unit_state::UnitState;
}
