//! Test fixtures and helpers.
//!
//! Pre-built grids, units, battles and scenarios for consistent testing.

use std::collections::BTreeSet;

use fixed::types::I32F32;
use tactics_core::battle::Battle;
use tactics_core::cell::{Cell, CellId};
use tactics_core::config::BattleConfig;
use tactics_core::data::ScenarioData;
use tactics_core::grid::Grid;
use tactics_core::hex::HexCoord;
use tactics_core::player::PlayerNumber;
use tactics_core::unit::{Unit, UnitId, UnitStats};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// A single row of `width` cells costing 1. Cell `i` is column `i`.
#[must_use]
pub fn strip(width: u32) -> Grid {
    Grid::rectangle(width, 1, 1, I32F32::ONE)
}

/// A rectangular map whose costs are given row-major.
///
/// # Panics
///
/// Panics if `costs` does not hold `width * height` positive entries.
#[must_use]
pub fn cost_grid(width: u32, height: u32, costs: &[u32]) -> Grid {
    assert_eq!(costs.len(), (width * height) as usize, "cost table size");
    let mut cells = Vec::with_capacity(costs.len());
    for row in 0..height {
        for column in 0..width {
            let id = row * width + column;
            #[allow(clippy::cast_possible_wrap)]
            let coord = HexCoord::from_offset(column as i32, row as i32);
            cells.push(Cell::new(CellId(id), coord, costs[id as usize]));
        }
    }
    Grid::new(cells, I32F32::ONE).expect("valid cost grid")
}

/// A melee unit: 10 hit points, attack 4, no defence, range 1, one action.
#[must_use]
pub fn soldier(id: u32, player: PlayerNumber, cell: u32, movement: u32) -> Unit {
    Unit::new(
        UnitId(id),
        player,
        CellId(cell),
        UnitStats::new(10, 4, 0, 1, movement, 1),
    )
}

/// Battle over `grid` with the given units, player numbers taken from the units.
///
/// # Panics
///
/// Panics if a unit cannot be placed.
#[must_use]
pub fn battle_with(grid: Grid, units: Vec<Unit>) -> Battle {
    let players: BTreeSet<PlayerNumber> = units.iter().map(Unit::player).collect();
    let mut battle = Battle::new(grid, players, BattleConfig::default()).expect("players");
    for unit in units {
        battle.add_unit(unit).expect("unit placement");
    }
    battle
}

/// Three players on a strip, one soldier each, players 0, 1 and 2 from the left.
#[must_use]
pub fn three_player_battle() -> Battle {
    battle_with(
        strip(9),
        vec![soldier(0, 0, 0, 3), soldier(1, 1, 4, 3), soldier(2, 2, 8, 3)],
    )
}

/// RON source of a small AI-vs-AI skirmish.
pub const SKIRMISH_RON: &str = r#"
ScenarioData(
    name: "Fixture Skirmish",
    description: "Two squads of two on a 7x5 field with a rock in the middle",
    map: MapData(
        width: 7,
        height: 5,
        terrain: [
            TerrainPatch(column: 3, row: 1, cost: 2),
            TerrainPatch(column: 3, row: 3, cost: 2),
        ],
        obstacles: [(3, 2)],
        tiles: [TilePlacement(column: 2, row: 0, tile: AbilityPoint(Strength))],
        tokens: [TokenPlacement(column: 4, row: 4, kind: Speed)],
    ),
    units: {
        "brawler": UnitData(
            name: "Brawler",
            stats: StatBlock(hit_points: 10, attack: 4, defence: 1, movement_points: 3),
            ability_points: AbilityPoints(strength: 3, speed: 3, cunning: 3),
        ),
        "skirmisher": UnitData(
            name: "Skirmisher",
            stats: StatBlock(hit_points: 6, attack: 3, attack_range: 2, movement_points: 4),
        ),
    },
    placements: [
        Placement(template: "brawler", player: 0, column: 0, row: 1),
        Placement(template: "skirmisher", player: 0, column: 0, row: 3),
        Placement(template: "brawler", player: 1, column: 6, row: 1),
        Placement(template: "skirmisher", player: 1, column: 6, row: 3),
    ],
    players: [
        PlayerSlot(number: 0),
        PlayerSlot(number: 1),
    ],
)
"#;

/// The fixture skirmish scenario.
///
/// # Panics
///
/// Panics if [`SKIRMISH_RON`] does not parse.
#[must_use]
pub fn skirmish_scenario() -> ScenarioData {
    ron::from_str(SKIRMISH_RON).expect("fixture scenario parses")
}
