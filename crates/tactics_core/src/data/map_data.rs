//! Rectangular hex maps.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::abilities::AbilityKind;
use crate::cell::{Cell, CellId, TileTag};
use crate::error::{Result, TacticsError};
use crate::grid::Grid;
use crate::hex::HexCoord;
use crate::math::Fixed;

/// A cell whose movement cost differs from the map default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerrainPatch {
    /// Offset column.
    pub column: i32,
    /// Offset row.
    pub row: i32,
    /// Cost to enter.
    pub cost: u32,
}

/// A special tile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TilePlacement {
    /// Offset column.
    pub column: i32,
    /// Offset row.
    pub row: i32,
    /// Tile behaviour.
    pub tile: TileTag,
}

/// An ability token lying on a cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPlacement {
    /// Offset column.
    pub column: i32,
    /// Offset row.
    pub row: i32,
    /// Pool the token fills.
    pub kind: AbilityKind,
}

/// Rectangular "odd-q" map. Cell ids are `row * width + column`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapData {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Cost of cells without a terrain patch.
    #[serde(default = "default_cost")]
    pub default_cost: u32,
    /// Cost overrides.
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    /// Cells blocked by scenery, as `(column, row)`.
    #[serde(default)]
    pub obstacles: Vec<(i32, i32)>,
    /// Special tiles.
    #[serde(default)]
    pub tiles: Vec<TilePlacement>,
    /// Ability tokens.
    #[serde(default)]
    pub tokens: Vec<TokenPlacement>,
}

const fn default_cost() -> u32 {
    1
}

impl MapData {
    /// Id of the cell at an offset position, if it lies on the map.
    #[must_use]
    pub fn cell_id(&self, column: i32, row: i32) -> Option<CellId> {
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        (column < self.width && row < self.height).then(|| CellId(row * self.width + column))
    }

    fn require(&self, column: i32, row: i32) -> Result<CellId> {
        self.cell_id(column, row).ok_or_else(|| {
            error!("Position ({}, {}) lies outside the map", column, row);
            let id = row
                .max(0)
                .unsigned_abs()
                .saturating_mul(self.width)
                .saturating_add(column.max(0).unsigned_abs());
            TacticsError::UnknownCell(CellId(id))
        })
    }

    /// Build the grid with terrain, tiles and tokens applied.
    ///
    /// # Errors
    ///
    /// Fails if a patch, tile or token lies outside the map, or a terrain
    /// patch has zero cost.
    pub fn build(&self, cell_size: Fixed) -> Result<Grid> {
        let mut cells = Vec::with_capacity((self.width * self.height) as usize);
        for row in 0..self.height {
            for column in 0..self.width {
                let id = CellId(row * self.width + column);
                #[allow(clippy::cast_possible_wrap)]
                let coord = HexCoord::from_offset(column as i32, row as i32);
                cells.push(Cell::new(id, coord, self.default_cost));
            }
        }

        for patch in &self.terrain {
            let id = self.require(patch.column, patch.row)?;
            cells[id.0 as usize].movement_cost = patch.cost;
        }
        for placement in &self.tiles {
            let id = self.require(placement.column, placement.row)?;
            cells[id.0 as usize].tile = placement.tile.clone();
        }
        for token in &self.tokens {
            let id = self.require(token.column, token.row)?;
            cells[id.0 as usize].token = Some(token.kind);
        }

        Grid::new(cells, cell_size)
    }

    /// Mark every obstacle as taken.
    ///
    /// # Errors
    ///
    /// Fails if an obstacle lies outside the map or two obstacles overlap.
    pub fn place_obstacles(&self, grid: &mut Grid) -> Result<()> {
        for &(column, row) in &self.obstacles {
            let id = self.require(column, row)?;
            if grid.is_taken(id) {
                error!("Obstacle on already taken cell {}", id);
                return Err(TacticsError::CellOccupied(id));
            }
            grid.set_taken(id, true);
        }
        Ok(())
    }
}
