//! Turn controller.

use std::collections::BTreeSet;
use std::ops::Bound;

use tracing::{debug, trace};

use crate::battle::Battle;
use crate::events::BattleEvent;
use crate::grid_state::GridState;
use crate::player::PlayerNumber;
use crate::unit::UnitId;

impl Battle {
    /// Run turn-start hooks for every unit of `player`.
    pub(crate) fn start_turn_of(&mut self, player: PlayerNumber) {
        for unit in self.units.values_mut().filter(|u| u.player() == player) {
            unit.on_turn_start(&mut self.marks);
        }
    }

    /// Start the first turn. The lowest player number with living units moves first.
    pub(crate) fn begin(&mut self) -> PlayerNumber {
        let living = self.living_players();
        if !living.contains(&self.current_player) {
            if let Some(&first) = living.first() {
                self.current_player = first;
            }
        }
        self.check_game_over();
        self.start_turn_of(self.current_player);
        self.current_player
    }

    /// End the current player's turn.
    ///
    /// Does nothing once at most one player has living units. Otherwise the
    /// turn passes to the next registered player number, wrapping around and
    /// skipping players without living units. Returns the new current player.
    pub fn end_turn(&mut self) -> Option<PlayerNumber> {
        let living = self.living_players();
        if living.len() <= 1 {
            trace!("End of turn ignored, {} players left", living.len());
            self.check_game_over();
            return None;
        }

        self.transition(GridState::TurnChanging);

        let previous = self.current_player;
        let ending: Vec<UnitId> = self.units_of(previous).map(|u| u.id()).collect();
        for id in ending {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.on_turn_end(&mut self.marks);
            }
        }

        let next = self.next_living_player(previous, &living)?;
        self.current_player = next;
        self.turn += 1;
        debug!("Turn {}: player {} -> player {}", self.turn, previous, next);
        self.raise(BattleEvent::TurnEnded {
            previous,
            current: next,
        });

        self.start_turn_of(next);
        Some(next)
    }

    /// Next player after `from` in ascending order, wrapping, that has living units.
    ///
    /// Bounded by the number of registered players.
    fn next_living_player(
        &self,
        from: PlayerNumber,
        living: &BTreeSet<PlayerNumber>,
    ) -> Option<PlayerNumber> {
        self.players
            .range((Bound::Excluded(from), Bound::Unbounded))
            .chain(self.players.range(..=from))
            .find(|&&number| living.contains(&number))
            .copied()
    }
}
