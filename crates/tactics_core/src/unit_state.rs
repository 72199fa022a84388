//! Per-unit lifecycle states.

use serde::{Deserialize, Serialize};

use crate::presentation::UnitMark;

/// What a unit may currently do and how it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitState {
    /// Idle, not the active player's unit.
    #[default]
    Normal,
    /// Belongs to the player whose turn it is.
    Friendly,
    /// Selected by its player.
    Selected,
    /// Enemy that the selected unit's armed ability can hit.
    ReachableEnemy,
    /// Has used its last action this turn.
    Finished,
    /// Removed from play. Absorbing.
    Destroyed,
}

impl UnitState {
    /// Whether a transition from `self` to `requested` is allowed.
    ///
    /// Destroyed accepts nothing. Finished only accepts Normal, so an
    /// exhausted unit cannot be selected or targeted again before the turn
    /// ends. Destruction itself bypasses this check.
    #[must_use]
    pub const fn accepts(self, requested: Self) -> bool {
        match (self, requested) {
            (Self::Destroyed, _) => false,
            (Self::Finished, Self::Normal) => true,
            (Self::Finished, _) => false,
            (_, Self::Destroyed) => false,
            _ => true,
        }
    }

    /// Mark shown while in this state.
    #[must_use]
    pub const fn mark(self) -> UnitMark {
        match self {
            Self::Normal => UnitMark::Normal,
            Self::Friendly => UnitMark::Friendly,
            Self::Selected => UnitMark::Selected,
            Self::ReachableEnemy => UnitMark::ReachableEnemy,
            Self::Finished => UnitMark::Finished,
            Self::Destroyed => UnitMark::Destroyed,
        }
    }
}
