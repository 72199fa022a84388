//! The battle grid: cells, coordinate index and neighbour relation.

use std::collections::BTreeMap;

use tracing::error;

use crate::cell::{Cell, CellId, TileTag};
use crate::error::{Result, TacticsError};
use crate::hex::HexCoord;
use crate::math::{Fixed, Vec2Fixed};

/// Hex grid owning every cell of a battle.
///
/// Neighbours are derived from coordinates once at construction and are
/// symmetric. Occupancy is the only cell state that changes during play,
/// and moves flip it through [`Grid::commit_move`].
#[derive(Debug, Clone)]
pub struct Grid {
    cells: BTreeMap<CellId, Cell>,
    by_coord: BTreeMap<HexCoord, CellId>,
    neighbours: BTreeMap<CellId, Vec<CellId>>,
    cell_size: Fixed,
}

impl Grid {
    /// Build a grid from a set of cells.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids, duplicate coordinates or zero movement costs.
    pub fn new(cells: Vec<Cell>, cell_size: Fixed) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        let mut by_coord = BTreeMap::new();

        for cell in cells {
            if cell.movement_cost == 0 {
                error!("Cell {} has zero movement cost", cell.id);
                return Err(TacticsError::InvalidMovementCost(cell.id));
            }
            if by_coord.insert(cell.coord, cell.id).is_some() {
                error!("Duplicate coordinate ({}, {})", cell.coord.q, cell.coord.r);
                return Err(TacticsError::DuplicateCoordinate {
                    q: cell.coord.q,
                    r: cell.coord.r,
                });
            }
            let id = cell.id;
            if by_id.insert(id, cell).is_some() {
                error!("Duplicate cell ID {}", id);
                return Err(TacticsError::DuplicateCell(id));
            }
        }

        let neighbours = link_neighbours(&by_id, &by_coord);
        Ok(Self {
            cells: by_id,
            by_coord,
            neighbours,
            cell_size,
        })
    }

    /// Build a rectangular "odd-q" map where every cell costs `movement_cost`.
    ///
    /// Cell ids are assigned row-major: `row * width + column`.
    #[must_use]
    pub fn rectangle(width: u32, height: u32, movement_cost: u32, cell_size: Fixed) -> Self {
        let cost = movement_cost.max(1);
        let mut cells = BTreeMap::new();
        let mut by_coord = BTreeMap::new();
        for row in 0..height {
            for column in 0..width {
                let id = CellId(row * width + column);
                #[allow(clippy::cast_possible_wrap)]
                let coord = HexCoord::from_offset(column as i32, row as i32);
                cells.insert(id, Cell::new(id, coord, cost));
                by_coord.insert(coord, id);
            }
        }
        let neighbours = link_neighbours(&cells, &by_coord);
        Self {
            cells,
            by_coord,
            neighbours,
            cell_size,
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Size of a hex in world units.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Look up a cell.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    /// Iterate cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Iterate cell ids in order.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    /// The cell at a hex coordinate.
    #[must_use]
    pub fn cell_at(&self, coord: HexCoord) -> Option<CellId> {
        self.by_coord.get(&coord).copied()
    }

    /// The cell at "odd-q" offset coordinates.
    #[must_use]
    pub fn cell_at_offset(&self, column: i32, row: i32) -> Option<CellId> {
        self.cell_at(HexCoord::from_offset(column, row))
    }

    /// Cells adjacent to `id`, sorted by id.
    #[must_use]
    pub fn neighbours(&self, id: CellId) -> &[CellId] {
        self.neighbours.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Hex distance between two cells.
    #[must_use]
    pub fn distance(&self, a: CellId, b: CellId) -> Option<u32> {
        let a = self.cells.get(&a)?;
        let b = self.cells.get(&b)?;
        Some(a.coord.distance(b.coord))
    }

    /// Whether a cell exists and is occupied.
    #[must_use]
    pub fn is_taken(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(Cell::is_taken)
    }

    /// Set the occupancy flag of a single cell.
    ///
    /// Used for spawning, obstacles and freeing the cell of a destroyed unit.
    /// Returns `false` if the cell does not exist.
    pub fn set_taken(&mut self, id: CellId, taken: bool) -> bool {
        match self.cells.get_mut(&id) {
            Some(cell) => {
                cell.set_taken(taken);
                true
            }
            None => false,
        }
    }

    /// Move an occupant from `from` to `to`.
    ///
    /// Both flags change in this one call, so no caller ever sees both or
    /// neither cell taken. Returns `false` and changes nothing if either cell
    /// is missing or `to` is already taken.
    pub fn commit_move(&mut self, from: CellId, to: CellId) -> bool {
        if from == to || !self.cells.contains_key(&from) {
            return false;
        }
        match self.cells.get(&to) {
            Some(cell) if !cell.is_taken() => {}
            _ => return false,
        }
        if let Some(cell) = self.cells.get_mut(&from) {
            cell.set_taken(false);
        }
        if let Some(cell) = self.cells.get_mut(&to) {
            cell.set_taken(true);
        }
        true
    }

    /// Replace the tile tag of a cell.
    pub fn set_tile(&mut self, id: CellId, tile: TileTag) -> bool {
        match self.cells.get_mut(&id) {
            Some(cell) => {
                cell.tile = tile;
                true
            }
            None => false,
        }
    }

    /// World position of a cell centre.
    #[must_use]
    pub fn world_position(&self, id: CellId) -> Option<Vec2Fixed> {
        self.cells
            .get(&id)
            .map(|cell| cell.coord.to_world(self.cell_size))
    }
}

fn link_neighbours(
    cells: &BTreeMap<CellId, Cell>,
    by_coord: &BTreeMap<HexCoord, CellId>,
) -> BTreeMap<CellId, Vec<CellId>> {
    cells
        .values()
        .map(|cell| {
            let mut adjacent: Vec<CellId> = cell
                .coord
                .neighbours()
                .filter_map(|coord| by_coord.get(&coord).copied())
                .collect();
            adjacent.sort_unstable();
            (cell.id, adjacent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> Fixed {
        Fixed::from_num(1)
    }

    #[test]
    fn test_rectangle_layout() {
        let grid = Grid::rectangle(4, 3, 1, size());
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.cell_at_offset(2, 1), Some(CellId(6)));
        // Interior cell of an odd-q map has six neighbours.
        assert_eq!(grid.neighbours(CellId(5)).len(), 6);
        // Corner has fewer.
        assert!(grid.neighbours(CellId(0)).len() < 6);
    }

    #[test]
    fn test_neighbours_are_symmetric() {
        let grid = Grid::rectangle(5, 5, 1, size());
        for cell in grid.cells() {
            for &n in grid.neighbours(cell.id) {
                assert!(grid.neighbours(n).contains(&cell.id));
            }
        }
    }

    #[test]
    fn test_new_rejects_duplicates_and_zero_cost() {
        let a = Cell::new(CellId(0), HexCoord::new(0, 0), 1);
        let b = Cell::new(CellId(0), HexCoord::new(1, 0), 1);
        assert_eq!(
            Grid::new(vec![a.clone(), b], size()).unwrap_err(),
            TacticsError::DuplicateCell(CellId(0))
        );

        let c = Cell::new(CellId(1), HexCoord::new(0, 0), 1);
        assert_eq!(
            Grid::new(vec![a.clone(), c], size()).unwrap_err(),
            TacticsError::DuplicateCoordinate { q: 0, r: 0 }
        );

        let d = Cell::new(CellId(2), HexCoord::new(2, 0), 0);
        assert_eq!(
            Grid::new(vec![a, d], size()).unwrap_err(),
            TacticsError::InvalidMovementCost(CellId(2))
        );
    }

    #[test]
    fn test_commit_move_flips_both_flags() {
        let mut grid = Grid::rectangle(3, 1, 1, size());
        grid.set_taken(CellId(0), true);

        assert!(grid.commit_move(CellId(0), CellId(1)));
        assert!(!grid.is_taken(CellId(0)));
        assert!(grid.is_taken(CellId(1)));
    }

    #[test]
    fn test_commit_move_into_taken_cell_changes_nothing() {
        let mut grid = Grid::rectangle(3, 1, 1, size());
        grid.set_taken(CellId(0), true);
        grid.set_taken(CellId(1), true);

        assert!(!grid.commit_move(CellId(0), CellId(1)));
        assert!(grid.is_taken(CellId(0)));
        assert!(grid.is_taken(CellId(1)));
        assert!(!grid.commit_move(CellId(0), CellId(99)));
        assert!(grid.is_taken(CellId(0)));
    }

    #[test]
    fn test_distance_and_world_position() {
        let grid = Grid::rectangle(4, 4, 1, size());
        assert_eq!(grid.distance(CellId(0), CellId(3)), Some(3));
        assert_eq!(grid.distance(CellId(0), CellId(100)), None);
        assert_eq!(grid.world_position(CellId(0)), Some(Vec2Fixed::ZERO));
    }
}
