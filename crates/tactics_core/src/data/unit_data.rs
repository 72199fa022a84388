//! Unit templates for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityPoints, UnitAbility};
use crate::cell::CellId;
use crate::graph::Mobility;
use crate::math::{fixed_serde, Fixed};
use crate::player::PlayerNumber;
use crate::unit::{Unit, UnitId, UnitStats};

/// Stat block of a unit template. Every pool starts full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatBlock {
    /// Maximum hit points.
    pub hit_points: i32,

    /// Raw damage of a basic attack.
    pub attack: i32,

    /// Damage absorbed from every hit.
    #[serde(default)]
    pub defence: i32,

    /// Hex distance of a basic attack.
    #[serde(default = "default_range")]
    pub attack_range: u32,

    /// Movement points per turn.
    pub movement_points: u32,

    /// Action points per turn.
    #[serde(default = "default_actions")]
    pub action_points: u32,
}

const fn default_range() -> u32 {
    1
}

const fn default_actions() -> u32 {
    1
}

impl From<StatBlock> for UnitStats {
    fn from(block: StatBlock) -> Self {
        Self::new(
            block.hit_points,
            block.attack,
            block.defence,
            block.attack_range,
            block.movement_points,
            block.action_points,
        )
    }
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Brawler",
///     stats: StatBlock(
///         hit_points: 12,
///         attack: 4,
///         defence: 1,
///         movement_points: 4,
///     ),
///     abilities: [
///         UnitAbility(name: "Haymaker", attack_factor: 7, attack_range: 1, cost: AbilityCost(strength: 2)),
///     ],
///     ability_points: AbilityPoints(strength: 4, speed: 2, cunning: 2),
///     movement_speed: 17179869184,  // Fixed-point for 4.0
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitData {
    /// Display name.
    pub name: String,

    /// Combat and movement numbers.
    pub stats: StatBlock,

    /// Abilities in menu order.
    #[serde(default)]
    pub abilities: Vec<UnitAbility>,

    /// Ability point maxima.
    #[serde(default)]
    pub ability_points: AbilityPoints,

    /// Traversal rules.
    #[serde(default)]
    pub mobility: Mobility,

    /// Animation speed in world units per second (fixed-point). Zero is instant.
    #[serde(default, with = "fixed_serde")]
    pub movement_speed: Fixed,

    /// Activation delay in seconds (fixed-point). Zero re-arms every turn.
    #[serde(default, with = "fixed_serde")]
    pub action_speed: Fixed,
}

impl UnitData {
    /// Create a unit from this template.
    #[must_use]
    pub fn instantiate(&self, id: UnitId, player: PlayerNumber, cell: CellId) -> Unit {
        Unit::new(id, player, cell, self.stats.into())
            .with_name(self.name.clone())
            .with_abilities(self.abilities.clone())
            .with_ability_points(self.ability_points)
            .with_mobility(self.mobility)
            .with_movement_speed(self.movement_speed)
            .with_action_speed(self.action_speed)
    }

    /// Check if this unit has an ability with the given name.
    #[must_use]
    pub fn has_ability(&self, name: &str) -> bool {
        self.abilities.iter().any(|a| a.name == name)
    }
}
