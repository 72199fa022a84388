//! Battle notifications.
//!
//! Every event is delivered synchronously to each subscriber in the order it
//! was raised, before the call that raised it returns. Events are also
//! queued so hosts that prefer polling can [`EventBus::drain`] them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityPoints;
use crate::cell::CellId;
use crate::pathfinding::Path;
use crate::player::PlayerNumber;
use crate::unit::UnitId;

/// Something that happened in the battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// Level setup began.
    LevelLoading,
    /// Level setup finished.
    LevelLoadingDone,
    /// The first turn is about to be played.
    GameStarted,
    /// A turn ended and another player is up.
    TurnEnded {
        /// Player whose turn ended.
        previous: PlayerNumber,
        /// Player whose turn begins.
        current: PlayerNumber,
    },
    /// Only one player has living units left.
    GameEnded {
        /// The surviving player, if any.
        winner: Option<PlayerNumber>,
    },
    /// A unit joined the battle during setup.
    UnitAdded {
        /// The unit.
        unit: UnitId,
    },
    /// A unit was selected.
    UnitSelected {
        /// The unit.
        unit: UnitId,
    },
    /// A unit was deselected.
    UnitDeselected {
        /// The unit.
        unit: UnitId,
    },
    /// The cursor entered a unit.
    UnitHighlighted {
        /// The unit.
        unit: UnitId,
    },
    /// The cursor left a unit.
    UnitDehighlighted {
        /// The unit.
        unit: UnitId,
    },
    /// A unit was hit.
    UnitAttacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Defending unit.
        defender: UnitId,
        /// Raw damage before defence.
        damage: i32,
    },
    /// A unit's hit points dropped to zero or below.
    UnitDestroyed {
        /// Attacking unit.
        attacker: UnitId,
        /// Destroyed unit.
        defender: UnitId,
        /// Raw damage of the final blow.
        damage: i32,
    },
    /// A unit committed a move.
    UnitMoved {
        /// The unit.
        unit: UnitId,
        /// Cell it left.
        origin: CellId,
        /// Cell it moves to.
        destination: CellId,
        /// Steps taken.
        path: Path,
    },
    /// The style meter changed.
    StyleModified {
        /// Requested change.
        delta: i32,
        /// Meter value after clamping.
        total: u32,
    },
    /// A unit's ability points changed.
    AbilityPointsChanged {
        /// The unit.
        unit: UnitId,
        /// New pool contents.
        points: AbilityPoints,
    },
}

/// Subscriber callback.
pub type Subscriber = Box<dyn FnMut(&BattleEvent)>;

/// Synchronous event dispatcher with a polling queue.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    pending: Vec<BattleEvent>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every subsequent event.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&BattleEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Deliver `event` to every subscriber, then queue it.
    pub fn raise(&mut self, event: BattleEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.pending.push(event);
    }

    /// Take every queued event in raise order.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Queued events not yet drained.
    #[must_use]
    pub fn pending(&self) -> &[BattleEvent] {
        &self.pending
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
