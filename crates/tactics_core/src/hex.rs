//! Hexagonal grid coordinates.
//!
//! Cells are addressed in axial coordinates (`q`, `r`). Rectangular maps are
//! authored in "odd-q" offset coordinates (column, row) and converted on load.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// `sqrt(3) / 2` as raw `I32F32` bits.
const SQRT3_HALF: Fixed = Fixed::from_bits(3_719_550_787);

/// Axial offsets of the six neighbouring hexes.
const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),  // East
    (1, -1), // Northeast
    (0, -1), // Northwest
    (-1, 0), // West
    (-1, 1), // Southwest
    (0, 1),  // Southeast
];

/// Axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate from axial components.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Convert "odd-q" offset coordinates (column, row) to axial.
    #[must_use]
    pub const fn from_offset(column: i32, row: i32) -> Self {
        let q = column;
        let r = row - (column - (column & 1)) / 2;
        Self { q, r }
    }

    /// Convert back to "odd-q" offset coordinates (column, row).
    #[must_use]
    pub const fn to_offset(self) -> (i32, i32) {
        let column = self.q;
        let row = self.r + (self.q - (self.q & 1)) / 2;
        (column, row)
    }

    /// The six coordinates adjacent to this one.
    pub fn neighbours(self) -> impl Iterator<Item = HexCoord> {
        DIRECTIONS
            .iter()
            .map(move |&(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Number of hex steps between two coordinates.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.unsigned_abs() + dr.unsigned_abs() + (dq + dr).unsigned_abs()) / 2
    }

    /// World position of the hex centre for flat-topped hexes of the given size.
    #[must_use]
    pub fn to_world(self, size: Fixed) -> Vec2Fixed {
        let q = Fixed::from_num(self.q);
        let r = Fixed::from_num(self.r);
        let x = size * q * Fixed::from_num(3) / Fixed::from_num(2);
        let y = size * SQRT3_HALF * (r * Fixed::from_num(2) + q);
        Vec2Fixed::new(x, y)
    }
}
