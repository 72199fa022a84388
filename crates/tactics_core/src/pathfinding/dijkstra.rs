//! Single-source shortest paths.

use std::collections::{BTreeMap, BinaryHeap};

use super::{reconstruct, Path, Pathfinding, QueueEntry};
use crate::cell::CellId;
use crate::graph::Graph;

/// Dijkstra's algorithm over non-negative edge weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dijkstra;

impl Dijkstra {
    /// Predecessor map of the shortest-path tree rooted at `origin`.
    fn search(graph: &Graph, origin: CellId) -> BTreeMap<CellId, CellId> {
        let mut came_from = BTreeMap::new();
        if !graph.contains(origin) {
            return came_from;
        }

        let mut best: BTreeMap<CellId, u32> = BTreeMap::new();
        let mut open = BinaryHeap::new();
        best.insert(origin, 0);
        open.push(QueueEntry {
            priority: 0,
            cost: 0,
            cell: origin,
        });

        while let Some(current) = open.pop() {
            if best.get(&current.cell).is_some_and(|&b| current.cost > b) {
                continue;
            }
            for (next, weight) in graph.edges_from(current.cell) {
                let tentative = current.cost.saturating_add(weight);
                if best.get(&next).map_or(true, |&known| tentative < known) {
                    best.insert(next, tentative);
                    came_from.insert(next, current.cell);
                    open.push(QueueEntry {
                        priority: tentative,
                        cost: tentative,
                        cell: next,
                    });
                }
            }
        }
        came_from
    }
}

impl Pathfinding for Dijkstra {
    fn find_path(
        &self,
        graph: &Graph,
        origin: CellId,
        destination: CellId,
        _prior: Option<&Path>,
        _budget: Option<u32>,
    ) -> Path {
        if origin == destination {
            return Path::empty();
        }
        let came_from = Self::search(graph, origin);
        if !came_from.contains_key(&destination) {
            return Path::empty();
        }
        reconstruct(&came_from, origin, destination)
    }

    fn find_all_paths(&self, graph: &Graph, origin: CellId) -> BTreeMap<CellId, Path> {
        let came_from = Self::search(graph, origin);
        came_from
            .keys()
            .filter(|&&cell| cell != origin)
            .map(|&cell| (cell, reconstruct(&came_from, origin, cell)))
            .collect()
    }
}
