//! Player abstraction.
//!
//! Units are associated with players by number only; a player never holds
//! references to its units.

use std::fmt;

use crate::battle::Battle;
use crate::math::Fixed;
use crate::movement::TaskStatus;

/// Player identifier. Turns advance in ascending order and wrap around.
pub type PlayerNumber = u8;

/// Something that takes turns: a human at the host's input devices or an AI.
pub trait Player: fmt::Debug {
    /// The number this player controls.
    fn number(&self) -> PlayerNumber;

    /// Called when this player's turn begins.
    fn play(&mut self, battle: &mut Battle);

    /// Resume turn logic on every host tick while it is this player's turn.
    ///
    /// Returning [`TaskStatus::Done`] ends the turn.
    fn step(&mut self, _battle: &mut Battle, _dt: Fixed) -> TaskStatus {
        TaskStatus::Running
    }
}

/// A player driven by host input. Its turn ends when the host calls `end_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanPlayer {
    number: PlayerNumber,
}

impl HumanPlayer {
    /// Create a human player.
    #[must_use]
    pub const fn new(number: PlayerNumber) -> Self {
        Self { number }
    }
}

impl Player for HumanPlayer {
    fn number(&self) -> PlayerNumber {
        self.number
    }

    fn play(&mut self, battle: &mut Battle) {
        battle.await_input();
    }
}
