//! Property tests for the pathfinders and the destination cache.

use tactics_core::cell::CellId;
use tactics_core::graph::{build_graph, Mobility};
use tactics_core::pathfinding::{AStar, BStar, Dijkstra, Path, Pathfinders, Pathfinding};
use tactics_core::unit::{Unit, UnitId, UnitStats};
use tactics_test_utils::fixtures::{cost_grid, strip};
use tactics_test_utils::proptest::prelude::*;
use tactics_test_utils::strategies::{arb_battlefield, arb_grid};

proptest! {
    /// Dijkstra and A* agree on the cost of every reachable destination.
    #[test]
    fn prop_dijkstra_and_astar_costs_match((grid, origin, _blocked) in arb_battlefield()) {
        let graph = build_graph(&grid, &Mobility::Ground, origin);
        let all = Dijkstra.find_all_paths(&graph, origin);

        for (&destination, path) in &all {
            let single = AStar.find_path(&graph, origin, destination, None, None);
            prop_assert!(!single.is_empty());
            prop_assert_eq!(single.head(), Some(destination));
            prop_assert_eq!(graph.path_cost(origin, path), graph.path_cost(origin, &single));
        }

        for node in graph.nodes().filter(|&n| n != origin && !all.contains_key(&n)) {
            prop_assert!(AStar.find_path(&graph, origin, node, None, None).is_empty());
        }
    }

    /// Path cost never depends on which grid copy computes it.
    #[test]
    fn prop_graph_cost_matches_cell_costs(grid in arb_grid()) {
        let origin = CellId(0);
        let graph = build_graph(&grid, &Mobility::Ground, origin);
        for path in Dijkstra.find_all_paths(&graph, origin).values() {
            prop_assert_eq!(graph.path_cost(origin, path), Some(path.cost(&grid)));
        }
    }

    /// Cached destinations respect the budget and are exactly the free cells
    /// within it.
    #[test]
    fn prop_destinations_within_budget(
        (mut grid, origin, _blocked) in arb_battlefield(),
        movement in 0u32..12,
    ) {
        grid.set_taken(origin, true);
        let mut unit = Unit::new(UnitId(0), 0, origin, UnitStats::new(5, 1, 0, 1, movement, 1));
        let destinations = unit.get_available_destinations(&grid, &Pathfinders::default());

        let graph = build_graph(&grid, &Mobility::Ground, origin);
        let shortest = Dijkstra.find_all_paths(&graph, origin);
        for (cell, path) in &shortest {
            let affordable = path.cost(&grid) <= movement && !grid.is_taken(*cell);
            prop_assert_eq!(destinations.contains(cell), affordable);
        }
        for cell in &destinations {
            prop_assert!(!grid.is_taken(*cell));
        }
    }

    /// Retracting the preview onto one of its own cells keeps the prefix.
    #[test]
    fn prop_bstar_truncates_to_prefix(length in 1u32..8, pick in 0u32..8) {
        let grid = strip(10);
        let graph = build_graph(&grid, &Mobility::Ground, CellId(0));
        let prior = Path::from_steps((1..=length).map(CellId).collect());
        let target = 1 + pick % length;

        let result = BStar.find_path(&graph, CellId(0), CellId(target), Some(&prior), Some(20));
        prop_assert_eq!(result.head(), Some(CellId(target)));
        prop_assert_eq!(result.steps(), &prior.steps()[..target as usize]);
    }
}

#[test]
fn test_destination_budget_boundary() {
    let grid = cost_grid(4, 1, &[1, 2, 1, 1]);
    let mut unit = Unit::new(UnitId(0), 0, CellId(0), UnitStats::new(5, 1, 0, 1, 3, 1));
    let destinations = unit.get_available_destinations(&grid, &Pathfinders::default());

    // Cell 2 costs exactly 3, cell 3 costs 4.
    assert!(destinations.contains(&CellId(2)));
    assert!(!destinations.contains(&CellId(3)));
}

#[test]
fn test_bstar_preview_laws() {
    let grid = strip(8);
    let origin = CellId(0);
    let graph = build_graph(&grid, &Mobility::Ground, origin);
    let prior = Path::from_steps(vec![CellId(1), CellId(2), CellId(3)]);

    let retracted = BStar.find_path(&graph, origin, CellId(2), Some(&prior), Some(5));
    assert_eq!(retracted.steps(), &[CellId(1), CellId(2)]);

    let extended = BStar.find_path(&graph, origin, CellId(4), Some(&prior), Some(5));
    assert_eq!(extended.steps(), &[CellId(1), CellId(2), CellId(3), CellId(4)]);

    let capped = BStar.find_path(&graph, origin, CellId(4), Some(&prior), Some(3));
    assert_eq!(capped, prior);

    let detached = BStar.find_path(&graph, origin, CellId(6), Some(&prior), Some(10));
    assert!(detached.is_empty());
}
