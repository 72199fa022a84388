//! Timed stat modifiers.

use serde::{Deserialize, Serialize};

use crate::unit::UnitStats;

/// What a buff does while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffEffect {
    /// Raise (or lower) attack factor.
    Attack(i32),
    /// Raise (or lower) defence factor.
    Defence(i32),
    /// Restore hit points, capped at the maximum. Not reverted on expiry.
    Healing(i32),
}

/// A stat modifier that expires after a number of turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buff {
    /// Turn ends remaining before the buff expires.
    pub duration: u32,
    /// The modifier.
    pub effect: BuffEffect,
}

impl Buff {
    /// Create a buff.
    #[must_use]
    pub const fn new(duration: u32, effect: BuffEffect) -> Self {
        Self { duration, effect }
    }

    /// Apply the effect to `stats`.
    pub fn apply(&self, stats: &mut UnitStats) {
        match self.effect {
            BuffEffect::Attack(delta) => stats.attack_factor += delta,
            BuffEffect::Defence(delta) => stats.defence_factor += delta,
            BuffEffect::Healing(amount) => {
                stats.hit_points = (stats.hit_points + amount).min(stats.max_hit_points);
            }
        }
    }

    /// Revert the effect.
    pub fn undo(&self, stats: &mut UnitStats) {
        match self.effect {
            BuffEffect::Attack(delta) => stats.attack_factor -= delta,
            BuffEffect::Defence(delta) => stats.defence_factor -= delta,
            BuffEffect::Healing(_) => {}
        }
    }
}
