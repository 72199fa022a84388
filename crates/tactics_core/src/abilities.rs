//! Ability point pools, ability costs and ability descriptors.

use serde::{Deserialize, Serialize};

/// The three kinds of ability points a unit collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Strength points.
    Strength,
    /// Speed points.
    Speed,
    /// Cunning points.
    Cunning,
}

impl AbilityKind {
    /// All kinds in rotation order.
    pub const ALL: [AbilityKind; 3] = [Self::Strength, Self::Speed, Self::Cunning];

    /// The kind an ability-point tile turns into after being collected.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Strength => Self::Speed,
            Self::Speed => Self::Cunning,
            Self::Cunning => Self::Strength,
        }
    }
}

/// Current (or maximum) ability points of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityPoints {
    /// Strength points.
    #[serde(default)]
    pub strength: u32,
    /// Speed points.
    #[serde(default)]
    pub speed: u32,
    /// Cunning points.
    #[serde(default)]
    pub cunning: u32,
}

impl AbilityPoints {
    /// Create a pool from its three components.
    #[must_use]
    pub const fn new(strength: u32, speed: u32, cunning: u32) -> Self {
        Self {
            strength,
            speed,
            cunning,
        }
    }

    /// Points held of one kind.
    #[must_use]
    pub const fn get(&self, kind: AbilityKind) -> u32 {
        match kind {
            AbilityKind::Strength => self.strength,
            AbilityKind::Speed => self.speed,
            AbilityKind::Cunning => self.cunning,
        }
    }

    fn slot(&mut self, kind: AbilityKind) -> &mut u32 {
        match kind {
            AbilityKind::Strength => &mut self.strength,
            AbilityKind::Speed => &mut self.speed,
            AbilityKind::Cunning => &mut self.cunning,
        }
    }

    /// Add points of one kind, clamped to the matching maximum.
    ///
    /// Returns `true` if the pool changed.
    pub fn add_clamped(&mut self, kind: AbilityKind, points: u32, maximum: &Self) -> bool {
        let cap = maximum.get(kind);
        let slot = self.slot(kind);
        let before = *slot;
        *slot = slot.saturating_add(points).min(cap);
        *slot != before
    }

    /// Whether this pool covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: &AbilityCost) -> bool {
        cost.strength <= self.strength && cost.speed <= self.speed && cost.cunning <= self.cunning
    }

    /// Deduct `cost`, saturating at zero.
    pub fn spend(&mut self, cost: &AbilityCost) {
        self.strength = self.strength.saturating_sub(cost.strength);
        self.speed = self.speed.saturating_sub(cost.speed);
        self.cunning = self.cunning.saturating_sub(cost.cunning);
    }
}

/// Points an ability consumes from each pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityCost {
    /// Strength cost.
    #[serde(default)]
    pub strength: u32,
    /// Speed cost.
    #[serde(default)]
    pub speed: u32,
    /// Cunning cost.
    #[serde(default)]
    pub cunning: u32,
}

impl AbilityCost {
    /// A cost that consumes nothing.
    pub const FREE: Self = Self {
        strength: 0,
        speed: 0,
        cunning: 0,
    };

    /// Create a cost from its three components.
    #[must_use]
    pub const fn new(strength: u32, speed: u32, cunning: u32) -> Self {
        Self {
            strength,
            speed,
            cunning,
        }
    }
}

/// An attack a unit can arm while selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAbility {
    /// Display name.
    pub name: String,
    /// Raw damage dealt by the attack.
    pub attack_factor: i32,
    /// Maximum hex distance to the target.
    pub attack_range: u32,
    /// Points consumed when the attack lands.
    #[serde(default)]
    pub cost: AbilityCost,
}

impl UnitAbility {
    /// Create an ability with no point cost.
    #[must_use]
    pub fn new(name: impl Into<String>, attack_factor: i32, attack_range: u32) -> Self {
        Self {
            name: name.into(),
            attack_factor,
            attack_range,
            cost: AbilityCost::FREE,
        }
    }

    /// Set the point cost.
    #[must_use]
    pub fn with_cost(mut self, cost: AbilityCost) -> Self {
        self.cost = cost;
        self
    }
}
