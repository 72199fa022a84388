//! Weighted movement graph built per traversal query.
//!
//! A cell becomes a node when the moving unit may traverse it or when it is
//! the unit's own cell. Each node's outgoing edges lead to its traversable
//! neighbours, weighted by the neighbour's movement cost. Occupancy changes
//! from turn to turn, so graphs are built fresh for every query.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellId};
use crate::grid::Grid;
use crate::hex::HexCoord;
use crate::pathfinding::Path;

/// Unit-specific movement rules.
pub trait Traversal {
    /// Whether a path may pass through `cell`.
    fn is_traversable(&self, cell: &Cell) -> bool {
        !cell.is_taken()
    }

    /// Whether a move may end on `cell`.
    fn is_movable_to(&self, cell: &Cell) -> bool {
        !cell.is_taken()
    }
}

/// Built-in traversal rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mobility {
    /// Blocked by any occupied cell.
    #[default]
    Ground,
    /// Passes through occupied cells but never stops on one.
    Phasing,
}

impl Traversal for Mobility {
    fn is_traversable(&self, cell: &Cell) -> bool {
        match self {
            Self::Ground => !cell.is_taken(),
            Self::Phasing => true,
        }
    }
}

/// Directed graph of cells with positive integer edge weights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    edges: BTreeMap<CellId, BTreeMap<CellId, u32>>,
    coords: BTreeMap<CellId, HexCoord>,
    min_weight: Option<u32>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no known position. Heuristics treat it as distance zero.
    pub fn add_node(&mut self, id: CellId) {
        self.edges.entry(id).or_default();
    }

    /// Add a node located at `coord`.
    pub fn add_node_at(&mut self, id: CellId, coord: HexCoord) {
        self.add_node(id);
        self.coords.insert(id, coord);
    }

    /// Add a directed edge. Zero weights are ignored.
    ///
    /// Returns `false` if the edge was rejected.
    pub fn add_edge(&mut self, from: CellId, to: CellId, weight: u32) -> bool {
        if weight == 0 || from == to {
            return false;
        }
        self.edges.entry(from).or_default().insert(to, weight);
        self.min_weight = Some(self.min_weight.map_or(weight, |w| w.min(weight)));
        true
    }

    /// Whether `id` is a node.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate node ids in order.
    pub fn nodes(&self) -> impl Iterator<Item = CellId> + '_ {
        self.edges.keys().copied()
    }

    /// Outgoing edges of `id` as `(neighbour, weight)`, sorted by neighbour.
    pub fn edges_from(&self, id: CellId) -> impl Iterator<Item = (CellId, u32)> + '_ {
        self.edges
            .get(&id)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(&to, &w)| (to, w)))
    }

    /// Whether an edge leads from `from` to `to`.
    #[must_use]
    pub fn is_adjacent(&self, from: CellId, to: CellId) -> bool {
        self.edges
            .get(&from)
            .is_some_and(|edges| edges.contains_key(&to))
    }

    /// Weight of the edge `from -> to`.
    #[must_use]
    pub fn edge_weight(&self, from: CellId, to: CellId) -> Option<u32> {
        self.edges.get(&from)?.get(&to).copied()
    }

    /// Cost of walking `path` from `origin`, or `None` if a step has no edge.
    #[must_use]
    pub fn path_cost(&self, origin: CellId, path: &Path) -> Option<u32> {
        let mut current = origin;
        let mut total = 0u32;
        for &step in path.steps() {
            total = total.checked_add(self.edge_weight(current, step)?)?;
            current = step;
        }
        Some(total)
    }

    /// Admissible estimate of the cost from `from` to `to`.
    ///
    /// Hex distance times the cheapest edge weight when both positions are
    /// known, zero otherwise.
    #[must_use]
    pub fn heuristic(&self, from: CellId, to: CellId) -> u32 {
        match (self.coords.get(&from), self.coords.get(&to), self.min_weight) {
            (Some(a), Some(b), Some(w)) => a.distance(*b).saturating_mul(w),
            _ => 0,
        }
    }
}

/// Build the movement graph for a unit standing on `origin`.
pub fn build_graph<T: Traversal + ?Sized>(grid: &Grid, rules: &T, origin: CellId) -> Graph {
    let mut graph = Graph::new();
    for cell in grid.cells() {
        if !(rules.is_traversable(cell) || cell.id == origin) {
            continue;
        }
        graph.add_node_at(cell.id, cell.coord);
        for &neighbour_id in grid.neighbours(cell.id) {
            let Some(neighbour) = grid.cell(neighbour_id) else {
                continue;
            };
            if rules.is_traversable(neighbour) {
                graph.add_edge(cell.id, neighbour_id, neighbour.movement_cost);
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    fn grid() -> Grid {
        Grid::rectangle(3, 3, 1, Fixed::from_num(1))
    }

    #[test]
    fn test_origin_is_node_even_when_taken() {
        let mut grid = grid();
        grid.set_taken(CellId(4), true);
        let graph = build_graph(&grid, &Mobility::Ground, CellId(4));

        assert!(graph.contains(CellId(4)));
        assert_eq!(graph.node_count(), 9);
        // No edge leads back into the occupied origin.
        for node in graph.nodes() {
            assert!(!graph.is_adjacent(node, CellId(4)));
        }
    }

    #[test]
    fn test_taken_cells_are_excluded_for_ground_units() {
        let mut grid = grid();
        grid.set_taken(CellId(0), true);
        grid.set_taken(CellId(1), true);
        let graph = build_graph(&grid, &Mobility::Ground, CellId(0));

        assert!(graph.contains(CellId(0)));
        assert!(!graph.contains(CellId(1)));
        assert!(!graph.is_adjacent(CellId(0), CellId(1)));
    }

    #[test]
    fn test_phasing_units_traverse_taken_cells() {
        let mut grid = grid();
        grid.set_taken(CellId(1), true);
        let graph = build_graph(&grid, &Mobility::Phasing, CellId(0));

        assert!(graph.contains(CellId(1)));
        assert!(graph.is_adjacent(CellId(0), CellId(1)));
    }

    #[test]
    fn test_edge_weight_is_neighbour_cost() {
        let cells = vec![
            Cell::new(CellId(0), HexCoord::new(0, 0), 1),
            Cell::new(CellId(1), HexCoord::new(1, 0), 4),
        ];
        let grid = Grid::new(cells, Fixed::from_num(1)).unwrap();
        let graph = build_graph(&grid, &Mobility::Ground, CellId(0));

        assert_eq!(graph.edge_weight(CellId(0), CellId(1)), Some(4));
        assert_eq!(graph.edge_weight(CellId(1), CellId(0)), Some(1));
    }

    #[test]
    fn test_zero_weight_edges_are_rejected() {
        let mut graph = Graph::new();
        assert!(!graph.add_edge(CellId(0), CellId(1), 0));
        assert!(!graph.is_adjacent(CellId(0), CellId(1)));
    }

    #[test]
    fn test_path_cost() {
        let graph = build_graph(&grid(), &Mobility::Ground, CellId(0));
        let path = Path::from_steps(vec![CellId(1), CellId(2)]);
        assert_eq!(graph.path_cost(CellId(0), &path), Some(2));

        let broken = Path::from_steps(vec![CellId(8)]);
        assert_eq!(graph.path_cost(CellId(0), &broken), None);
    }

    #[test]
    fn test_heuristic_is_zero_without_coordinates() {
        let mut graph = Graph::new();
        graph.add_node(CellId(0));
        graph.add_node(CellId(1));
        graph.add_edge(CellId(0), CellId(1), 3);
        assert_eq!(graph.heuristic(CellId(0), CellId(1)), 0);
    }
}
