//! Single-pair shortest path with a hex-distance heuristic.

use std::collections::{BTreeMap, BinaryHeap};

use super::{reconstruct, Path, Pathfinding, QueueEntry};
use crate::cell::CellId;
use crate::graph::Graph;

/// A* search using [`Graph::heuristic`].
///
/// The movement budget is ignored: callers use the result for feedback on
/// cells the unit cannot reach this turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStar;

impl Pathfinding for AStar {
    fn find_path(
        &self,
        graph: &Graph,
        origin: CellId,
        destination: CellId,
        _prior: Option<&Path>,
        _budget: Option<u32>,
    ) -> Path {
        if origin == destination || !graph.contains(origin) || !graph.contains(destination) {
            return Path::empty();
        }

        let mut came_from = BTreeMap::new();
        let mut best: BTreeMap<CellId, u32> = BTreeMap::new();
        let mut open = BinaryHeap::new();

        best.insert(origin, 0);
        open.push(QueueEntry {
            priority: graph.heuristic(origin, destination),
            cost: 0,
            cell: origin,
        });

        while let Some(current) = open.pop() {
            if current.cell == destination {
                return reconstruct(&came_from, origin, destination);
            }
            if best.get(&current.cell).is_some_and(|&b| current.cost > b) {
                continue;
            }
            for (next, weight) in graph.edges_from(current.cell) {
                let tentative = current.cost.saturating_add(weight);
                if best.get(&next).map_or(true, |&known| tentative < known) {
                    best.insert(next, tentative);
                    came_from.insert(next, current.cell);
                    open.push(QueueEntry {
                        priority: tentative.saturating_add(graph.heuristic(next, destination)),
                        cost: tentative,
                        cell: next,
                    });
                }
            }
        }

        Path::empty()
    }
}
