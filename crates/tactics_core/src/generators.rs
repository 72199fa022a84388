//! Host-supplied level generators.
//!
//! A battle is populated once, at build time, from three generators: one
//! for the cells, one for obstacles and one for the units.

use std::fmt;

use crate::config::BattleConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::unit::Unit;

/// Produces the cells of the battlefield.
pub trait CellGenerator: fmt::Debug {
    /// Build the grid.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the cell set is malformed.
    fn generate_grid(&self, config: &BattleConfig) -> Result<Grid>;
}

/// Marks cells blocked by scenery.
pub trait ObstacleGenerator: fmt::Debug {
    /// Mark obstacles on `grid`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an obstacle references a missing cell.
    fn place_obstacles(&self, grid: &mut Grid) -> Result<()>;
}

/// Produces the starting units.
pub trait UnitGenerator: fmt::Debug {
    /// Create every unit, each standing on a cell of `grid`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a unit cannot be created.
    fn spawn_units(&self, grid: &Grid) -> Result<Vec<Unit>>;
}

/// Obstacle generator that places nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleGenerator for NoObstacles {
    fn place_obstacles(&self, _grid: &mut Grid) -> Result<()> {
        Ok(())
    }
}
