//! Built-in melee AI.
//!
//! The AI plays its units one after another as a resumable task driven by
//! [`Player::step`]. Each unit attacks the weakest enemy in range, otherwise
//! walks towards the cheapest cell from which an enemy can be hit, waits for
//! the walk to finish and attacks again if it can. Every choice tie-breaks on
//! ids so runs are reproducible.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::battle::Battle;
use crate::cell::CellId;
use crate::graph::Traversal;
use crate::grid::Grid;
use crate::math::Fixed;
use crate::movement::TaskStatus;
use crate::pathfinding::Path;
use crate::player::{Player, PlayerNumber};
use crate::unit::{Unit, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    NextUnit,
    Engage { unit: UnitId, moved: bool },
    AwaitMovement(UnitId),
}

/// AI-controlled player.
#[derive(Debug, Clone)]
pub struct AiPlayer {
    number: PlayerNumber,
    phase: Phase,
    queue: VecDeque<UnitId>,
    timer: Fixed,
}

impl AiPlayer {
    /// Create an idle AI player.
    #[must_use]
    pub const fn new(number: PlayerNumber) -> Self {
        Self {
            number,
            phase: Phase::Idle,
            queue: VecDeque::new(),
            timer: Fixed::ZERO,
        }
    }

    /// Whether every unit has been played this turn.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Advance the state machine until it has to wait.
    fn advance(&mut self, battle: &mut Battle) -> TaskStatus {
        loop {
            match self.phase {
                Phase::Idle => return TaskStatus::Done,
                Phase::NextUnit => match self.queue.pop_front() {
                    Some(unit) => self.phase = Phase::Engage { unit, moved: false },
                    None => {
                        debug!("AI player {} is done", self.number);
                        self.phase = Phase::Idle;
                        return TaskStatus::Done;
                    }
                },
                Phase::Engage { unit, moved } => {
                    let Some(current) = battle.unit(unit) else {
                        self.phase = Phase::NextUnit;
                        continue;
                    };
                    if !current.is_alive() || !current.is_ready() || battle.is_over() {
                        self.phase = Phase::NextUnit;
                        continue;
                    }
                    if current.stats.action_points > 0 {
                        if let Some(target) = weakest_target(battle, current) {
                            battle.attack(unit, target);
                            self.timer = battle.config().ai_decision_delay;
                            return TaskStatus::Running;
                        }
                    }
                    if moved || current.stats.movement_points == 0 {
                        self.phase = Phase::NextUnit;
                        continue;
                    }
                    self.phase = if reposition(battle, unit) {
                        Phase::AwaitMovement(unit)
                    } else {
                        Phase::Engage { unit, moved: true }
                    };
                }
                Phase::AwaitMovement(unit) => {
                    if battle.unit(unit).is_some_and(Unit::is_moving) {
                        return TaskStatus::Running;
                    }
                    self.phase = Phase::Engage { unit, moved: true };
                }
            }
        }
    }
}

impl Player for AiPlayer {
    fn number(&self) -> PlayerNumber {
        self.number
    }

    fn play(&mut self, battle: &mut Battle) {
        self.queue = battle
            .units_of(self.number)
            .filter(|u| u.is_ready())
            .map(Unit::id)
            .collect();
        self.phase = Phase::NextUnit;
        self.timer = Fixed::ZERO;
        debug!("AI player {} plays {} units", self.number, self.queue.len());
    }

    fn step(&mut self, battle: &mut Battle, dt: Fixed) -> TaskStatus {
        if self.timer > Fixed::ZERO {
            self.timer -= dt;
            if self.timer > Fixed::ZERO {
                return TaskStatus::Running;
            }
        }
        self.advance(battle)
    }
}

/// Enemy in basic-attack range with the fewest hit points.
fn weakest_target(battle: &Battle, unit: &Unit) -> Option<UnitId> {
    battle
        .enemies_of(unit.player())
        .filter(|enemy| battle.is_attackable(unit.id(), enemy.id()))
        .min_by_key(|enemy| (enemy.stats.hit_points, enemy.id()))
        .map(Unit::id)
}

/// Cells from which some enemy is within basic-attack range.
fn attack_positions(battle: &Battle, unit: &Unit) -> Vec<CellId> {
    let grid = battle.grid();
    let range = unit.stats.attack_range;
    let enemies: Vec<CellId> = battle.enemies_of(unit.player()).map(Unit::cell).collect();
    grid.cells()
        .filter(|cell| cell.id == unit.cell() || unit.mobility().is_movable_to(cell))
        .filter(|cell| {
            enemies
                .iter()
                .any(|&enemy| grid.distance(cell.id, enemy).is_some_and(|d| d <= range))
        })
        .map(|cell| cell.id)
        .collect()
}

/// Candidate with the cheapest non-empty path, ties broken by cell id.
fn cheapest(
    grid: &Grid,
    candidates: impl Iterator<Item = (CellId, Path)>,
) -> Option<(CellId, Path)> {
    candidates
        .filter(|(_, path)| !path.is_empty())
        .min_by_key(|(cell, path)| (path.cost(grid), *cell))
}

/// Start a move towards an attack position. Returns `true` if the unit moved.
fn reposition(battle: &mut Battle, id: UnitId) -> bool {
    let destinations = battle.available_destinations(id);
    let Some(unit) = battle.unit(id) else {
        return false;
    };
    let positions = attack_positions(battle, unit);
    let grid = battle.grid();

    let within_budget = cheapest(
        grid,
        positions
            .iter()
            .filter(|&&cell| destinations.contains(&cell))
            .map(|&cell| (cell, battle.find_path(id, cell))),
    );

    let (destination, path) = if let Some(found) = within_budget {
        found
    } else {
        let Some((goal, route)) = cheapest(
            grid,
            positions
                .iter()
                .filter(|&&cell| cell != unit.cell())
                .map(|&cell| (cell, battle.find_path(id, cell))),
        ) else {
            trace!("AI unit {} has no route to any enemy", id);
            return false;
        };
        let Some(stop) = furthest_stop(&route, &destinations, grid, unit.stats.movement_points) else {
            trace!("AI unit {} cannot advance towards cell {}", id, goal);
            return false;
        };
        (stop, battle.find_path(id, stop))
    };

    debug!("AI unit {} heads for cell {}", id, destination);
    battle.move_unit(id, destination, &path)
}

/// Last cell along `route` that is affordable and a legal destination.
fn furthest_stop(
    route: &Path,
    destinations: &BTreeSet<CellId>,
    grid: &Grid,
    budget: u32,
) -> Option<CellId> {
    let mut spent = 0;
    let mut stop = None;
    for &cell in route.steps() {
        spent += grid.cell(cell)?.movement_cost;
        if spent > budget {
            break;
        }
        if destinations.contains(&cell) {
            stop = Some(cell);
        }
    }
    stop
}
