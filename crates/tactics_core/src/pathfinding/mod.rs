//! Pathfinding over movement graphs.
//!
//! Three interchangeable strategies share the [`Pathfinding`] contract:
//!
//! - [`Dijkstra`] computes shortest paths to every reachable node and seeds
//!   the per-unit path cache at selection time.
//! - [`AStar`] finds a single shortest path and serves as the fallback for
//!   destinations missing from the cache.
//! - [`BStar`] extends or retracts the path being previewed as the cursor
//!   moves one cell at a time. It is not a shortest-path algorithm.
//!
//! Unreachable destinations yield an empty [`Path`], never an error.

mod astar;
mod bstar;
mod dijkstra;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use astar::AStar;
pub use bstar::BStar;
pub use dijkstra::Dijkstra;

use crate::cell::CellId;
use crate::graph::Graph;
use crate::grid::Grid;

/// A path of cells, excluding its origin.
///
/// Steps are stored in walking order: the first element is the cell entered
/// first, the last element is the destination. The destination is the path's
/// *head*; extending a path adds a new head and truncating drops cells
/// beyond a head already on the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path(Vec<CellId>);

impl Path {
    /// The empty path.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a path from steps in walking order.
    #[must_use]
    pub fn from_steps(steps: Vec<CellId>) -> Self {
        Self(steps)
    }

    /// Whether the path has no steps (unreachable or zero-length).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The destination cell.
    #[must_use]
    pub fn head(&self) -> Option<CellId> {
        self.0.last().copied()
    }

    /// Steps in walking order.
    #[must_use]
    pub fn steps(&self) -> &[CellId] {
        &self.0
    }

    /// Whether `cell` is one of the steps.
    #[must_use]
    pub fn contains(&self, cell: CellId) -> bool {
        self.0.contains(&cell)
    }

    /// The prefix of this path ending at `cell`, if `cell` is on it.
    #[must_use]
    pub fn truncated_to(&self, cell: CellId) -> Option<Self> {
        let index = self.0.iter().position(|&c| c == cell)?;
        Some(Self(self.0[..=index].to_vec()))
    }

    /// This path with `cell` appended as the new head.
    #[must_use]
    pub fn extended(&self, cell: CellId) -> Self {
        let mut steps = self.0.clone();
        steps.push(cell);
        Self(steps)
    }

    /// Sum of the movement costs of every step.
    ///
    /// Cells missing from `grid` contribute nothing.
    #[must_use]
    pub fn cost(&self, grid: &Grid) -> u32 {
        self.0
            .iter()
            .filter_map(|&id| grid.cell(id))
            .map(|cell| cell.movement_cost)
            .sum()
    }
}

impl From<Vec<CellId>> for Path {
    fn from(steps: Vec<CellId>) -> Self {
        Self::from_steps(steps)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", steps.join(" -> "))
    }
}

/// Shared contract of the pathfinding strategies.
pub trait Pathfinding: fmt::Debug + Send + Sync {
    /// Find a path from `origin` to `destination`.
    ///
    /// `prior` and `budget` are only consulted by incremental strategies.
    /// Returns an empty path if the destination is unreachable.
    fn find_path(
        &self,
        graph: &Graph,
        origin: CellId,
        destination: CellId,
        prior: Option<&Path>,
        budget: Option<u32>,
    ) -> Path;

    /// Shortest path from `origin` to every reachable node.
    ///
    /// The origin itself is not a key.
    fn find_all_paths(&self, graph: &Graph, origin: CellId) -> BTreeMap<CellId, Path> {
        graph
            .nodes()
            .filter(|&node| node != origin)
            .filter_map(|node| {
                let path = self.find_path(graph, origin, node, None, None);
                (!path.is_empty()).then_some((node, path))
            })
            .collect()
    }
}

/// The strategy set a unit model uses.
#[derive(Debug)]
pub struct Pathfinders {
    /// Seeds the destination cache.
    pub all_paths: Box<dyn Pathfinding>,
    /// Single-pair search for destinations outside the cache.
    pub fallback: Box<dyn Pathfinding>,
    /// Live path preview while hovering.
    pub preview: Box<dyn Pathfinding>,
}

impl Default for Pathfinders {
    fn default() -> Self {
        Self {
            all_paths: Box::new(Dijkstra),
            fallback: Box::new(AStar),
            preview: Box::new(BStar),
        }
    }
}

/// Min-heap entry shared by Dijkstra and A*.
///
/// Ordered by reversed `priority` so `BinaryHeap` pops the cheapest first,
/// ties broken by the lower cell id, then the lower cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    priority: u32,
    cost: u32,
    cell: CellId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.cell.cmp(&self.cell))
            .then_with(|| other.cost.cmp(&self.cost))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Walk predecessor links back from `destination` to `origin`.
fn reconstruct(came_from: &BTreeMap<CellId, CellId>, origin: CellId, destination: CellId) -> Path {
    let mut steps = Vec::new();
    let mut current = destination;
    while current != origin {
        steps.push(current);
        match came_from.get(&current) {
            Some(&previous) => current = previous,
            None => return Path::empty(),
        }
    }
    steps.reverse();
    Path::from_steps(steps)
}
