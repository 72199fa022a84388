//! Proptest strategies for grids and pathfinding inputs.

use proptest::prelude::*;
use tactics_core::cell::CellId;
use tactics_core::grid::Grid;

use crate::fixtures::cost_grid;

/// Rectangular maps up to 7x7 with movement costs in `1..=5`.
pub fn arb_grid() -> impl Strategy<Value = Grid> {
    (2u32..=7, 2u32..=7).prop_flat_map(|(width, height)| {
        prop::collection::vec(1u32..=5, (width * height) as usize)
            .prop_map(move |costs| cost_grid(width, height, &costs))
    })
}

/// A map together with an origin and a set of occupied cells.
///
/// The origin is never in the occupied set.
pub fn arb_battlefield() -> impl Strategy<Value = (Grid, CellId, Vec<CellId>)> {
    arb_grid().prop_flat_map(|grid| {
        #[allow(clippy::cast_possible_truncation)]
        let count = grid.len() as u32;
        (
            Just(grid),
            0..count,
            prop::collection::vec(0..count, 0..(count as usize / 3)),
        )
            .prop_map(|(mut grid, origin, blocked)| {
                let blocked: Vec<CellId> = blocked
                    .into_iter()
                    .filter(|&cell| cell != origin)
                    .map(CellId)
                    .collect();
                for &cell in &blocked {
                    grid.set_taken(cell, true);
                }
                (grid, CellId(origin), blocked)
            })
    })
}
