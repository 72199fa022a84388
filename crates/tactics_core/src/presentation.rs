//! Feedback hooks for the rendering layer.
//!
//! The core calls a [`Presenter`] purely for side effects and never reads
//! anything back. [`MarkBoard`] records the latest mark of every cell and
//! unit so headless hosts and tests can inspect what a renderer would show.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::unit::UnitId;

/// Visual mark of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellMark {
    /// Default appearance.
    #[default]
    Unmarked,
    /// The selected unit can move here.
    Reachable,
    /// Part of the previewed path.
    Path,
    /// Under the cursor.
    Highlighted,
}

/// Visual mark of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitMark {
    /// Default appearance.
    #[default]
    Normal,
    /// Belongs to the player whose turn it is.
    Friendly,
    /// Currently selected.
    Selected,
    /// Enemy that the armed ability can hit.
    ReachableEnemy,
    /// Done for this turn.
    Finished,
    /// Removed from play.
    Destroyed,
    /// Performing an attack.
    Attacking,
    /// Receiving an attack.
    Defending,
}

/// Rendering capability set used by the core.
pub trait Presenter: fmt::Debug {
    /// Change the mark of a cell.
    fn mark_cell(&mut self, cell: CellId, mark: CellMark);

    /// Change the mark of a unit.
    fn mark_unit(&mut self, unit: UnitId, mark: UnitMark);

    /// Show or hide a unit's action menu.
    fn set_action_menu(&mut self, _unit: UnitId, _visible: bool) {}

    /// Enable or disable one of a unit's abilities in its action menu.
    fn set_ability_available(&mut self, _unit: UnitId, _ability: usize, _available: bool) {}
}

/// Presenter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn mark_cell(&mut self, _cell: CellId, _mark: CellMark) {}

    fn mark_unit(&mut self, _unit: UnitId, _mark: UnitMark) {}
}

/// Records the latest marks and forwards them to an optional host presenter.
#[derive(Debug, Default)]
pub struct MarkBoard {
    cells: BTreeMap<CellId, CellMark>,
    units: BTreeMap<UnitId, UnitMark>,
    menus: BTreeMap<UnitId, bool>,
    abilities: BTreeMap<(UnitId, usize), bool>,
    host: Option<Box<dyn Presenter>>,
}

impl MarkBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board that forwards every call to `host`.
    #[must_use]
    pub fn forwarding(host: Box<dyn Presenter>) -> Self {
        Self {
            host: Some(host),
            ..Self::default()
        }
    }

    /// Latest mark of a cell.
    #[must_use]
    pub fn cell_mark(&self, cell: CellId) -> CellMark {
        self.cells.get(&cell).copied().unwrap_or_default()
    }

    /// Latest mark of a unit.
    #[must_use]
    pub fn unit_mark(&self, unit: UnitId) -> UnitMark {
        self.units.get(&unit).copied().unwrap_or_default()
    }

    /// Whether a unit's action menu is shown.
    #[must_use]
    pub fn is_menu_visible(&self, unit: UnitId) -> bool {
        self.menus.get(&unit).copied().unwrap_or(false)
    }

    /// Whether an ability button is enabled.
    #[must_use]
    pub fn is_ability_available(&self, unit: UnitId, ability: usize) -> bool {
        self.abilities.get(&(unit, ability)).copied().unwrap_or(false)
    }

    /// Cells currently carrying `mark`.
    pub fn cells_marked(&self, mark: CellMark) -> impl Iterator<Item = CellId> + '_ {
        self.cells
            .iter()
            .filter(move |(_, &m)| m == mark)
            .map(|(&id, _)| id)
    }
}

impl Presenter for MarkBoard {
    fn mark_cell(&mut self, cell: CellId, mark: CellMark) {
        if mark == CellMark::Unmarked {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, mark);
        }
        if let Some(host) = self.host.as_mut() {
            host.mark_cell(cell, mark);
        }
    }

    fn mark_unit(&mut self, unit: UnitId, mark: UnitMark) {
        self.units.insert(unit, mark);
        if let Some(host) = self.host.as_mut() {
            host.mark_unit(unit, mark);
        }
    }

    fn set_action_menu(&mut self, unit: UnitId, visible: bool) {
        self.menus.insert(unit, visible);
        if let Some(host) = self.host.as_mut() {
            host.set_action_menu(unit, visible);
        }
    }

    fn set_ability_available(&mut self, unit: UnitId, ability: usize, available: bool) {
        self.abilities.insert((unit, ability), available);
        if let Some(host) = self.host.as_mut() {
            host.set_ability_available(unit, ability, available);
        }
    }
}
