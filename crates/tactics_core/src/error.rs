//! Error types for battle setup.
//!
//! Only configuration problems are errors. Illegal actions (moving past the
//! movement budget, attacking without action points, clicking an invalid
//! cell) resolve to no-ops, and unreachable destinations resolve to an
//! empty [`Path`](crate::pathfinding::Path).

use thiserror::Error;

use crate::cell::CellId;
use crate::player::PlayerNumber;
use crate::unit::UnitId;

/// Result type alias using [`TacticsError`].
pub type Result<T> = std::result::Result<T, TacticsError>;

/// Top-level error type for battle configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TacticsError {
    /// A required generator was not supplied to the builder.
    #[error("No {0} generator supplied")]
    MissingGenerator(&'static str),

    /// The battle has no players registered.
    #[error("Battle has no players")]
    NoPlayers,

    /// Two cells share the same identifier.
    #[error("Duplicate cell ID: {0}")]
    DuplicateCell(CellId),

    /// Two cells share the same hex coordinate.
    #[error("Duplicate cell coordinate ({q}, {r})")]
    DuplicateCoordinate {
        /// Axial column.
        q: i32,
        /// Axial row.
        r: i32,
    },

    /// A cell has a zero movement cost.
    #[error("Cell {0} has a zero movement cost")]
    InvalidMovementCost(CellId),

    /// A generator referenced a cell that does not exist.
    #[error("Cell not found: {0}")]
    UnknownCell(CellId),

    /// A unit or obstacle was placed on a cell that is already taken.
    #[error("Cell {0} is already taken")]
    CellOccupied(CellId),

    /// A placement referenced a unit template that was never defined.
    #[error("Unknown unit template: {0}")]
    UnknownUnitTemplate(String),

    /// A unit belongs to a player number with no registered player.
    #[error("No player registered for player number {0}")]
    MissingPlayer(PlayerNumber),

    /// Two players were registered with the same number.
    #[error("Duplicate player number: {0}")]
    DuplicatePlayer(PlayerNumber),

    /// Two units share the same identifier.
    #[error("Duplicate unit ID: {0}")]
    DuplicateUnit(UnitId),
}
