//! Grid cells and their tile tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityKind;
use crate::hex::HexCoord;

/// Unique identifier for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Special behaviour attached to a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileTag {
    /// No special behaviour.
    #[default]
    Plain,
    /// Grants points of the given kind on entry, then rotates to the next kind.
    AbilityPoint(AbilityKind),
    /// Refills every ability pool when a move ends here having collected
    /// exactly `requirement` along the way. Reverts to plain once entered.
    Camera {
        /// Ability kinds that must be collected, in any order.
        requirement: Vec<AbilityKind>,
    },
}

/// A single hex cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell identifier.
    pub id: CellId,
    /// Position on the hex grid.
    pub coord: HexCoord,
    /// Cost to enter this cell. Always positive.
    pub movement_cost: u32,
    /// Tile behaviour.
    #[serde(default)]
    pub tile: TileTag,
    /// Ability token lying on the cell, consumed by the first unit to enter.
    #[serde(default)]
    pub token: Option<AbilityKind>,
    #[serde(default)]
    taken: bool,
}

impl Cell {
    /// Create a free, plain cell.
    #[must_use]
    pub const fn new(id: CellId, coord: HexCoord, movement_cost: u32) -> Self {
        Self {
            id,
            coord,
            movement_cost,
            tile: TileTag::Plain,
            token: None,
            taken: false,
        }
    }

    /// Set the tile tag.
    #[must_use]
    pub fn with_tile(mut self, tile: TileTag) -> Self {
        self.tile = tile;
        self
    }

    /// Set the occupancy flag.
    #[must_use]
    pub const fn with_taken(mut self, taken: bool) -> Self {
        self.taken = taken;
        self
    }

    /// Whether a unit or obstacle occupies this cell.
    #[must_use]
    pub const fn is_taken(&self) -> bool {
        self.taken
    }

    pub(crate) fn set_taken(&mut self, taken: bool) {
        self.taken = taken;
    }

    /// Ability kind granted on entry, if this is an ability-point tile.
    #[must_use]
    pub const fn ability_kind(&self) -> Option<AbilityKind> {
        match self.tile {
            TileTag::AbilityPoint(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether this is a camera tile.
    #[must_use]
    pub const fn is_camera(&self) -> bool {
        matches!(self.tile, TileTag::Camera { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_free_and_plain() {
        let cell = Cell::new(CellId(3), HexCoord::new(1, 2), 2);
        assert!(!cell.is_taken());
        assert_eq!(cell.tile, TileTag::Plain);
        assert_eq!(cell.ability_kind(), None);
        assert!(!cell.is_camera());
    }

    #[test]
    fn test_tile_queries() {
        let cell = Cell::new(CellId(0), HexCoord::default(), 1)
            .with_tile(TileTag::AbilityPoint(AbilityKind::Cunning));
        assert_eq!(cell.ability_kind(), Some(AbilityKind::Cunning));

        let camera = Cell::new(CellId(1), HexCoord::default(), 1).with_tile(TileTag::Camera {
            requirement: vec![AbilityKind::Speed],
        });
        assert!(camera.is_camera());
    }
}
