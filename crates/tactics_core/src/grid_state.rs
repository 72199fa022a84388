//! Grid state machine: what the battle accepts as host input.
//!
//! States are plain enum values. [`Battle::transition`] runs the exit hook of
//! the old state and the enter hook of the new one; re-entering
//! [`GridState::UnitSelected`] for the same unit rebuilds the selection from
//! scratch so follow-up actions see fresh destinations.

use std::collections::BTreeSet;

use tracing::{debug, info, trace};

use crate::abilities::UnitAbility;
use crate::battle::Battle;
use crate::cell::CellId;
use crate::events::BattleEvent;
use crate::pathfinding::Path;
use crate::presentation::{CellMark, Presenter};
use crate::unit::UnitId;
use crate::unit_state::UnitState;

/// One selection episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The selected unit.
    pub unit: UnitId,
    /// Whether the unit was ready and actually entered the Selected state.
    pub active: bool,
    /// Destinations cached on entry.
    pub reachable: BTreeSet<CellId>,
    /// Enemies marked by the armed ability.
    pub targets: BTreeSet<UnitId>,
    /// Path currently drawn under the cursor.
    pub preview: Path,
}

impl Selection {
    fn pending(unit: UnitId) -> Self {
        Self {
            unit,
            active: false,
            reachable: BTreeSet::new(),
            targets: BTreeSet::new(),
            preview: Path::empty(),
        }
    }
}

/// Input mode of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridState {
    /// Idle, waiting for the current player to pick a unit.
    WaitingForInput,
    /// A unit is selected.
    UnitSelected(Selection),
    /// Turn handover in progress. All input is ignored.
    TurnChanging,
}

impl GridState {
    /// Request selection of `unit`. The episode is filled in on entry.
    #[must_use]
    pub fn selecting(unit: UnitId) -> Self {
        Self::UnitSelected(Selection::pending(unit))
    }

    /// The selected unit, if any.
    #[must_use]
    pub const fn selected_unit(&self) -> Option<UnitId> {
        match self {
            Self::UnitSelected(selection) => Some(selection.unit),
            _ => None,
        }
    }
}

impl Battle {
    /// Switch grid state, running exit and enter hooks.
    pub(crate) fn transition(&mut self, next: GridState) {
        let previous = std::mem::replace(&mut self.state, GridState::TurnChanging);
        self.exit_state(previous);
        self.state = self.enter_state(next);
    }

    fn exit_state(&mut self, state: GridState) {
        let GridState::UnitSelected(selection) = state else {
            return;
        };
        if selection.active {
            if let Some(unit) = self.units.get_mut(&selection.unit) {
                unit.deselect(&mut self.marks, self.config.charge_interval);
            }
            self.paused = false;
            self.raise(BattleEvent::UnitDeselected {
                unit: selection.unit,
            });
        }
        for target in &selection.targets {
            if let Some(unit) = self.units.get_mut(target) {
                unit.set_state(UnitState::Normal, &mut self.marks);
            }
        }
        let cells: Vec<CellId> = self.grid.cell_ids().collect();
        for cell in cells {
            self.marks.mark_cell(cell, CellMark::Unmarked);
        }
    }

    fn enter_state(&mut self, state: GridState) -> GridState {
        let GridState::UnitSelected(selection) = state else {
            debug!("Grid state -> {:?}", state);
            return state;
        };
        GridState::UnitSelected(self.enter_selection(selection.unit))
    }

    fn enter_selection(&mut self, id: UnitId) -> Selection {
        let mut selection = Selection::pending(id);
        let selected = self
            .units
            .get_mut(&id)
            .is_some_and(|unit| unit.select(&mut self.marks));
        if !selected {
            trace!("Unit {} is not ready, selection is inactive", id);
            return selection;
        }

        selection.active = true;
        self.paused = true;
        self.raise(BattleEvent::UnitSelected { unit: id });
        self.refresh_abilities(id);

        selection.reachable = self.available_destinations(id);
        let cells: Vec<CellId> = self.grid.cell_ids().collect();
        for cell in cells {
            let mark = if selection.reachable.contains(&cell) {
                CellMark::Reachable
            } else {
                CellMark::Unmarked
            };
            self.marks.mark_cell(cell, mark);
        }
        debug!(
            "Grid state -> UnitSelected({}), {} destinations",
            id,
            selection.reachable.len()
        );
        selection
    }

    /// Enter the idle state. Called when a human player's turn begins.
    pub fn await_input(&mut self) {
        self.transition(GridState::WaitingForInput);
    }

    /// Host input: a cell was clicked.
    pub fn on_cell_clicked(&mut self, cell: CellId) {
        let GridState::UnitSelected(selection) = &self.state else {
            return;
        };
        let id = selection.unit;
        if self.units.get(&id).map_or(true, |u| u.is_moving()) {
            return;
        }
        if self.grid.is_taken(cell) || !selection.reachable.contains(&cell) {
            trace!("Cell {} is not a destination of unit {}", cell, id);
            self.transition(GridState::WaitingForInput);
            return;
        }

        let path = if selection.preview.head() == Some(cell) {
            selection.preview.clone()
        } else {
            self.find_path(id, cell)
        };
        self.move_unit(id, cell, &path);
        self.transition(GridState::selecting(id));
    }

    /// Host input: a unit was clicked.
    pub fn on_unit_clicked(&mut self, clicked: UnitId) {
        let Some(clicked_player) = self.units.get(&clicked).map(|u| u.player()) else {
            return;
        };
        match &self.state {
            GridState::TurnChanging => {}
            GridState::WaitingForInput => {
                if clicked_player == self.current_player {
                    self.transition(GridState::selecting(clicked));
                }
            }
            GridState::UnitSelected(selection) => {
                let id = selection.unit;
                let Some(selected) = self.units.get(&id) else {
                    return;
                };
                if clicked == id || selected.is_moving() {
                    return;
                }
                let player = selected.player();
                if selection.targets.contains(&clicked) && selected.stats.action_points > 0 {
                    self.attack(id, clicked);
                    self.transition(GridState::selecting(id));
                } else if clicked_player == player {
                    self.transition(GridState::selecting(clicked));
                } else {
                    trace!("Unit {} is not a target of unit {}", clicked, id);
                    self.transition(GridState::WaitingForInput);
                }
            }
        }
    }

    /// Host input: the cursor entered a cell.
    pub fn on_cell_selected(&mut self, cell: CellId) {
        match &self.state {
            GridState::TurnChanging => {}
            GridState::WaitingForInput => self.marks.mark_cell(cell, CellMark::Highlighted),
            GridState::UnitSelected(selection) => {
                let id = selection.unit;
                let prior = selection.preview.clone();
                let in_range = selection.reachable.contains(&cell);
                self.restore_preview(&prior);
                self.marks.mark_cell(cell, CellMark::Highlighted);
                if !in_range {
                    return;
                }

                let preview = self.units.get(&id).map_or_else(Path::empty, |unit| {
                    unit.preview_path(&self.grid, &self.pathfinders, cell, &prior)
                });
                for &step in preview.steps() {
                    self.marks.mark_cell(step, CellMark::Path);
                }
                if let GridState::UnitSelected(selection) = &mut self.state {
                    selection.preview = preview;
                }
            }
        }
    }

    /// Host input: the cursor left a cell.
    pub fn on_cell_deselected(&mut self, cell: CellId) {
        match &self.state {
            GridState::TurnChanging => {}
            GridState::WaitingForInput => self.marks.mark_cell(cell, CellMark::Unmarked),
            GridState::UnitSelected(selection) => {
                let prior = selection.preview.clone();
                let in_range = selection.reachable.contains(&cell);
                self.restore_preview(&prior);
                if !in_range {
                    self.marks.mark_cell(cell, CellMark::Unmarked);
                }
            }
        }
    }

    fn restore_preview(&mut self, preview: &Path) {
        let GridState::UnitSelected(selection) = &self.state else {
            return;
        };
        let marks: Vec<(CellId, CellMark)> = preview
            .steps()
            .iter()
            .map(|&cell| {
                let mark = if selection.reachable.contains(&cell) {
                    CellMark::Reachable
                } else {
                    CellMark::Unmarked
                };
                (cell, mark)
            })
            .collect();
        for (cell, mark) in marks {
            self.marks.mark_cell(cell, mark);
        }
    }

    /// Host input: the cursor entered a unit.
    pub fn on_unit_highlighted(&mut self, unit: UnitId) {
        if self.units.contains_key(&unit) {
            self.raise(BattleEvent::UnitHighlighted { unit });
        }
    }

    /// Host input: the cursor left a unit.
    pub fn on_unit_dehighlighted(&mut self, unit: UnitId) {
        if self.units.contains_key(&unit) {
            self.raise(BattleEvent::UnitDehighlighted { unit });
        }
    }

    /// Host input: an ability was chosen from the selected unit's menu.
    ///
    /// Enemies in range whose cost is affordable become reachable enemies and
    /// the episode's targets; the others revert to Normal and stop being
    /// targets.
    pub fn unit_ability(&mut self, ability: &UnitAbility) {
        let GridState::UnitSelected(selection) = &self.state else {
            return;
        };
        if !selection.active {
            return;
        }
        let id = selection.unit;
        let Some(selected) = self.units.get(&id) else {
            return;
        };

        let verdicts: Vec<(UnitId, bool)> = self
            .enemies_of(selected.player())
            .map(|enemy| {
                let attackable = selected.is_unit_attackable(
                    enemy,
                    selected.cell(),
                    ability.attack_range,
                    Some(&ability.cost),
                    &self.grid,
                );
                (enemy.id(), attackable)
            })
            .collect();

        let mut targets = BTreeSet::new();
        for (enemy, attackable) in verdicts {
            let state = if attackable {
                targets.insert(enemy);
                UnitState::ReachableEnemy
            } else {
                UnitState::Normal
            };
            if let Some(unit) = self.units.get_mut(&enemy) {
                unit.set_state(state, &mut self.marks);
            }
        }
        if !targets.is_empty() {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.arm(ability);
            }
        }
        debug!("Unit {} armed {}: {} targets", id, ability.name, targets.len());
        if let GridState::UnitSelected(selection) = &mut self.state {
            selection.targets = targets;
        }
    }

    /// Host input: the taunt button.
    pub fn taunt(&mut self) {
        if let GridState::UnitSelected(selection) = &self.state {
            info!("Unit {} taunts the enemy", selection.unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::abilities::{AbilityCost, AbilityPoints};
    use crate::config::BattleConfig;
    use crate::grid::Grid;
    use crate::math::Fixed;
    use crate::presentation::UnitMark;
    use crate::unit::{Unit, UnitStats};

    fn battle() -> Battle {
        let grid = Grid::rectangle(6, 1, 1, Fixed::ONE);
        let mut battle = Battle::new(grid, BTreeSet::from([0, 1]), BattleConfig::default()).unwrap();
        battle
            .add_unit(
                Unit::new(UnitId(0), 0, CellId(0), UnitStats::new(10, 3, 0, 1, 2, 2))
                    .with_ability_points(AbilityPoints::new(2, 2, 2)),
            )
            .unwrap();
        battle
            .add_unit(Unit::new(UnitId(1), 0, CellId(5), UnitStats::new(10, 3, 0, 1, 2, 1)))
            .unwrap();
        battle
            .add_unit(Unit::new(UnitId(2), 1, CellId(3), UnitStats::new(10, 3, 0, 1, 2, 1)))
            .unwrap();
        battle.await_input();
        battle
    }

    #[test]
    fn test_select_marks_reachable_cells_and_pauses() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));

        assert_eq!(battle.state().selected_unit(), Some(UnitId(0)));
        assert!(battle.is_paused());
        assert_eq!(battle.marks().unit_mark(UnitId(0)), UnitMark::Selected);
        assert!(battle.marks().is_menu_visible(UnitId(0)));
        let reachable: Vec<CellId> = battle.marks().cells_marked(CellMark::Reachable).collect();
        assert_eq!(reachable, vec![CellId(1), CellId(2)]);
    }

    #[test]
    fn test_enemy_click_while_waiting_is_ignored() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(2));
        assert_eq!(battle.state(), &GridState::WaitingForInput);
    }

    #[test]
    fn test_clicking_reachable_cell_moves_and_reselects() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_clicked(CellId(2));

        let unit = battle.unit(UnitId(0)).unwrap();
        assert_eq!(unit.cell(), CellId(2));
        assert_eq!(unit.stats.movement_points, 0);
        assert_eq!(battle.state().selected_unit(), Some(UnitId(0)));
        assert_eq!(battle.marks().cells_marked(CellMark::Reachable).count(), 0);
    }

    #[test]
    fn test_clicking_invalid_cell_returns_to_waiting() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_clicked(CellId(4));

        assert_eq!(battle.state(), &GridState::WaitingForInput);
        assert!(!battle.is_paused());
        assert_eq!(battle.unit(UnitId(0)).unwrap().cell(), CellId(0));
        assert_eq!(battle.marks().cells_marked(CellMark::Reachable).count(), 0);
    }

    #[test]
    fn test_hover_draws_and_clears_preview() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_selected(CellId(1));
        battle.on_cell_selected(CellId(2));
        let drawn: Vec<CellId> = battle.marks().cells_marked(CellMark::Path).collect();
        assert_eq!(drawn, vec![CellId(1), CellId(2)]);

        battle.on_cell_deselected(CellId(2));
        assert_eq!(battle.marks().cells_marked(CellMark::Path).count(), 0);
        assert_eq!(battle.marks().cell_mark(CellId(2)), CellMark::Reachable);
    }

    #[test]
    fn test_ability_marks_targets_and_attack_reverts_on_exit() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_clicked(CellId(2));

        let ability = UnitAbility::new("Jab", 5, 1).with_cost(AbilityCost::new(1, 0, 0));
        battle.unit_ability(&ability);
        assert_eq!(battle.unit(UnitId(2)).unwrap().state(), UnitState::ReachableEnemy);

        battle.on_unit_clicked(UnitId(2));
        let enemy = battle.unit(UnitId(2)).unwrap();
        assert_eq!(enemy.stats.hit_points, 5);
        assert_eq!(enemy.state(), UnitState::Normal);
        assert_eq!(battle.unit(UnitId(0)).unwrap().ability_points().strength, 1);
    }

    #[test]
    fn test_narrower_ability_drops_earlier_targets() {
        let mut battle = battle();
        battle
            .add_unit(Unit::new(UnitId(3), 1, CellId(1), UnitStats::new(10, 3, 0, 1, 2, 1)))
            .unwrap();
        battle.on_unit_clicked(UnitId(0));

        battle.unit_ability(&UnitAbility::new("Volley", 4, 5));
        assert_eq!(battle.unit(UnitId(2)).unwrap().state(), UnitState::ReachableEnemy);
        assert_eq!(battle.unit(UnitId(3)).unwrap().state(), UnitState::ReachableEnemy);

        battle.unit_ability(&UnitAbility::new("Jab", 5, 1));
        assert_eq!(battle.unit(UnitId(2)).unwrap().state(), UnitState::Normal);
        assert_eq!(battle.unit(UnitId(3)).unwrap().state(), UnitState::ReachableEnemy);
        let GridState::UnitSelected(selection) = battle.state() else {
            panic!("selection lost");
        };
        assert_eq!(selection.targets, BTreeSet::from([UnitId(3)]));

        battle.on_unit_clicked(UnitId(2));
        assert_eq!(battle.state(), &GridState::WaitingForInput);
        assert_eq!(battle.unit(UnitId(2)).unwrap().stats.hit_points, 10);
        assert_eq!(battle.unit(UnitId(0)).unwrap().stats.action_points, 2);
    }

    #[test]
    fn test_unaffordable_ability_marks_nothing() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_clicked(CellId(2));

        let ability = UnitAbility::new("Slam", 9, 1).with_cost(AbilityCost::new(5, 0, 0));
        battle.unit_ability(&ability);
        assert_eq!(battle.unit(UnitId(2)).unwrap().state(), UnitState::Normal);

        battle.on_unit_clicked(UnitId(2));
        assert_eq!(battle.state(), &GridState::WaitingForInput);
        assert_eq!(battle.unit(UnitId(2)).unwrap().stats.hit_points, 10);
    }

    #[test]
    fn test_clicking_friendly_switches_selection() {
        let mut battle = battle();
        battle.on_unit_clicked(UnitId(0));
        battle.on_unit_clicked(UnitId(1));

        assert_eq!(battle.state().selected_unit(), Some(UnitId(1)));
        assert_eq!(battle.unit(UnitId(0)).unwrap().state(), UnitState::Friendly);
        let events = battle.drain_events();
        assert!(events.contains(&BattleEvent::UnitDeselected { unit: UnitId(0) }));
    }

    #[test]
    fn test_turn_changing_ignores_input() {
        let mut battle = battle();
        battle.transition(GridState::TurnChanging);
        battle.on_unit_clicked(UnitId(0));
        battle.on_cell_clicked(CellId(1));
        assert_eq!(battle.state(), &GridState::TurnChanging);
    }
}
