//! Incremental extension and retraction of a previewed path.

use std::collections::BTreeMap;

use tracing::trace;

use super::{Path, Pathfinding};
use crate::cell::CellId;
use crate::graph::Graph;

/// Grows or shrinks the previous preview path one cell at a time.
///
/// Given the path drawn so far and the newly hovered `destination`:
///
/// 1. A destination already on the path truncates it there.
/// 2. A destination adjacent to the head is appended if the total cost
///    stays within the budget.
/// 3. An adjacent destination that would exceed the budget leaves the path
///    unchanged.
/// 4. Anything else discards the path.
///
/// A missing budget means unlimited.
#[derive(Debug, Clone, Copy, Default)]
pub struct BStar;

impl Pathfinding for BStar {
    fn find_path(
        &self,
        graph: &Graph,
        origin: CellId,
        destination: CellId,
        prior: Option<&Path>,
        budget: Option<u32>,
    ) -> Path {
        if origin == destination {
            return Path::empty();
        }
        let prior = prior.cloned().unwrap_or_default();

        if let Some(truncated) = prior.truncated_to(destination) {
            return truncated;
        }

        let head = prior.head().unwrap_or(origin);
        if !graph.is_adjacent(head, destination) {
            return Path::empty();
        }

        let extended = prior.extended(destination);
        match graph.path_cost(origin, &extended) {
            Some(cost) if budget.map_or(true, |b| cost <= b) => extended,
            Some(cost) => {
                trace!("Preview capped at budget ({} > {:?})", cost, budget);
                prior
            }
            None => Path::empty(),
        }
    }

    /// Incremental previews cannot enumerate destinations.
    fn find_all_paths(&self, _graph: &Graph, _origin: CellId) -> BTreeMap<CellId, Path> {
        BTreeMap::new()
    }
}
