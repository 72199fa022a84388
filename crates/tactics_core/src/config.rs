//! Battle tuning parameters.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Tunables shared by every unit and player in a battle.
///
/// Every field has a default so scenario files only list what they change.
/// Time values are in seconds of host tick time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Hex size used for world positions.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Pause between AI attacks.
    #[serde(with = "fixed_serde")]
    pub ai_decision_delay: Fixed,
    /// Interval between ability charges of an idle unit.
    #[serde(with = "fixed_serde")]
    pub charge_interval: Fixed,
    /// Points of each kind gained per charge.
    pub points_per_charge: u32,
    /// Points gained when entering an ability-point tile.
    pub points_per_tile: u32,
    /// Points gained when picking up a token.
    pub points_per_token: u32,
    /// Upper bound of the style meter.
    pub max_style_points: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            cell_size: Fixed::ONE,
            ai_decision_delay: Fixed::ONE / Fixed::from_num(2),
            charge_interval: Fixed::from_num(3),
            points_per_charge: 1,
            points_per_tile: 1,
            points_per_token: 3,
            max_style_points: 100,
        }
    }
}
