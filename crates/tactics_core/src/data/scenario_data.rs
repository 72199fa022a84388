//! Complete battle scenarios.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::error;

use super::map_data::MapData;
use super::unit_data::UnitData;
use crate::config::BattleConfig;
use crate::error::{Result, TacticsError};
use crate::generators::{CellGenerator, ObstacleGenerator, UnitGenerator};
use crate::grid::Grid;
use crate::player::PlayerNumber;
use crate::unit::{Unit, UnitId};

/// Who drives a player number.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Controller {
    /// Host input.
    Human,
    /// Built-in AI.
    #[default]
    Ai,
}

/// A player taking part in the scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Player number.
    pub number: PlayerNumber,
    /// Controller type.
    #[serde(default)]
    pub controller: Controller,
}

/// A unit placed at level start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    /// Key into [`ScenarioData::units`].
    pub template: String,
    /// Owning player.
    pub player: PlayerNumber,
    /// Offset column.
    pub column: i32,
    /// Offset row.
    pub row: i32,
}

/// A scenario: map, unit templates, placements and players.
///
/// Acts as all three level generators. Unit ids follow placement order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioData {
    /// Scenario name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Battlefield.
    pub map: MapData,
    /// Unit templates by key.
    pub units: BTreeMap<String, UnitData>,
    /// Starting units.
    pub placements: Vec<Placement>,
    /// Players in turn order.
    pub players: Vec<PlayerSlot>,
    /// Battle tunables.
    #[serde(default)]
    pub config: BattleConfig,
}

impl ScenarioData {
    /// Registered player numbers.
    #[must_use]
    pub fn player_numbers(&self) -> BTreeSet<PlayerNumber> {
        self.players.iter().map(|p| p.number).collect()
    }
}

impl CellGenerator for ScenarioData {
    fn generate_grid(&self, config: &BattleConfig) -> Result<Grid> {
        self.map.build(config.cell_size)
    }
}

impl ObstacleGenerator for ScenarioData {
    fn place_obstacles(&self, grid: &mut Grid) -> Result<()> {
        self.map.place_obstacles(grid)
    }
}

impl UnitGenerator for ScenarioData {
    fn spawn_units(&self, grid: &Grid) -> Result<Vec<Unit>> {
        let mut units = Vec::with_capacity(self.placements.len());
        for (index, placement) in (0u32..).zip(&self.placements) {
            let Some(template) = self.units.get(&placement.template) else {
                error!("Placement uses unknown template '{}'", placement.template);
                return Err(TacticsError::UnknownUnitTemplate(placement.template.clone()));
            };
            let Some(cell) = grid.cell_at_offset(placement.column, placement.row) else {
                error!(
                    "Placement of '{}' at ({}, {}) lies outside the map",
                    placement.template, placement.column, placement.row
                );
                return Err(TacticsError::UnknownCell(
                    self.map
                        .cell_id(placement.column, placement.row)
                        .unwrap_or_default(),
                ));
            };
            units.push(template.instantiate(UnitId(index), placement.player, cell));
        }
        Ok(units)
    }
}
