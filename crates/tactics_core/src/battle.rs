//! Battle state: grid, units, grid state machine and turn bookkeeping.
//!
//! The battle is single-threaded and cooperative. Host input, the turn
//! controller and [`Battle::update`] run strictly one after another, so the
//! path cache a selection builds is never read while occupancy changes.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use tracing::{debug, error, info};

use crate::abilities::AbilityKind;
use crate::buffs::Buff;
use crate::cell::{CellId, TileTag};
use crate::config::BattleConfig;
use crate::error::{Result, TacticsError};
use crate::events::{BattleEvent, EventBus};
use crate::grid::Grid;
use crate::grid_state::GridState;
use crate::math::Fixed;
use crate::movement::TaskStatus;
use crate::pathfinding::{Path, Pathfinders};
use crate::player::PlayerNumber;
use crate::presentation::{MarkBoard, Presenter};
use crate::unit::{AttackOutcome, Unit, UnitId};
use crate::unit_state::UnitState;

/// A running battle.
#[derive(Debug)]
pub struct Battle {
    pub(crate) grid: Grid,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) fallen: Vec<UnitId>,
    pub(crate) players: BTreeSet<PlayerNumber>,
    pub(crate) current_player: PlayerNumber,
    pub(crate) state: GridState,
    pub(crate) marks: MarkBoard,
    pub(crate) events: EventBus,
    pub(crate) config: BattleConfig,
    pub(crate) pathfinders: Pathfinders,
    pub(crate) paused: bool,
    pub(crate) style_points: u32,
    pub(crate) turn: u32,
    pub(crate) elapsed: Fixed,
    pub(crate) outcome: Option<Option<PlayerNumber>>,
}

impl Battle {
    /// Create an empty battle for the given player numbers.
    ///
    /// The lowest player number moves first.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::NoPlayers`] if `players` is empty.
    pub fn new(grid: Grid, players: BTreeSet<PlayerNumber>, config: BattleConfig) -> Result<Self> {
        let Some(&first) = players.first() else {
            error!("Battle created without players");
            return Err(TacticsError::NoPlayers);
        };
        Ok(Self {
            grid,
            units: BTreeMap::new(),
            fallen: Vec::new(),
            players,
            current_player: first,
            state: GridState::TurnChanging,
            marks: MarkBoard::new(),
            events: EventBus::new(),
            config,
            pathfinders: Pathfinders::default(),
            paused: false,
            style_points: 0,
            turn: 0,
            elapsed: Fixed::ZERO,
            outcome: None,
        })
    }

    /// Forward every mark to a host presenter.
    pub fn set_presenter(&mut self, presenter: Box<dyn Presenter>) {
        self.marks = MarkBoard::forwarding(presenter);
    }

    /// Replace the pathfinding strategies.
    pub fn set_pathfinders(&mut self, pathfinders: Pathfinders) {
        self.pathfinders = pathfinders;
    }

    /// Register an event callback.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&BattleEvent) + 'static) {
        self.events.subscribe(subscriber);
    }

    pub(crate) fn raise(&mut self, event: BattleEvent) {
        self.events.raise(event);
    }

    /// Place a unit on the grid.
    ///
    /// # Errors
    ///
    /// Fails if the unit id is already used, its cell is missing or taken,
    /// or its player is not part of the battle.
    pub fn add_unit(&mut self, mut unit: Unit) -> Result<()> {
        let id = unit.id();
        if self.units.contains_key(&id) || self.fallen.contains(&id) {
            error!("Duplicate unit ID {}", id);
            return Err(TacticsError::DuplicateUnit(id));
        }
        if !self.players.contains(&unit.player()) {
            error!("Unit {} belongs to unknown player {}", id, unit.player());
            return Err(TacticsError::MissingPlayer(unit.player()));
        }
        let cell = unit.cell();
        let Some(position) = self.grid.world_position(cell) else {
            error!("Unit {} placed on missing cell {}", id, cell);
            return Err(TacticsError::UnknownCell(cell));
        };
        if self.grid.is_taken(cell) {
            error!("Unit {} placed on taken cell {}", id, cell);
            return Err(TacticsError::CellOccupied(cell));
        }

        self.grid.set_taken(cell, true);
        unit.set_position(position);
        self.units.insert(id, unit);
        self.raise(BattleEvent::UnitAdded { unit: id });
        debug!("Unit {} added on cell {}", id, cell);
        Ok(())
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Look up a living unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Living units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Living units of one player in id order.
    pub fn units_of(&self, player: PlayerNumber) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.player() == player)
    }

    /// Living units of every other player in id order.
    pub fn enemies_of(&self, player: PlayerNumber) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.player() != player)
    }

    /// The unit standing on `cell`.
    #[must_use]
    pub fn unit_at(&self, cell: CellId) -> Option<&Unit> {
        self.units.values().find(|u| u.cell() == cell)
    }

    /// Units destroyed so far, in order of destruction.
    #[must_use]
    pub fn fallen(&self) -> &[UnitId] {
        &self.fallen
    }

    /// Player numbers taking part.
    #[must_use]
    pub const fn players(&self) -> &BTreeSet<PlayerNumber> {
        &self.players
    }

    /// Distinct players that still have living units.
    #[must_use]
    pub fn living_players(&self) -> BTreeSet<PlayerNumber> {
        self.units.values().map(Unit::player).collect()
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn current_player(&self) -> PlayerNumber {
        self.current_player
    }

    /// Current grid state.
    #[must_use]
    pub const fn state(&self) -> &GridState {
        &self.state
    }

    /// Marks recorded for the rendering layer.
    #[must_use]
    pub const fn marks(&self) -> &MarkBoard {
        &self.marks
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Battle tunables.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Whether timers are frozen (a unit is selected).
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current style meter.
    #[must_use]
    pub const fn style_points(&self) -> u32 {
        self.style_points
    }

    /// Number of completed turns.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Total tick time fed to [`Battle::update`].
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Whether at most one player has living units left.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The surviving player once the battle is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerNumber> {
        self.outcome.flatten()
    }

    /// Compute and cache the destinations of a unit.
    pub fn available_destinations(&mut self, unit: UnitId) -> BTreeSet<CellId> {
        match self.units.get_mut(&unit) {
            Some(u) => u.get_available_destinations(&self.grid, &self.pathfinders),
            None => BTreeSet::new(),
        }
    }

    /// Cached path, or a budget-free search for feedback.
    #[must_use]
    pub fn find_path(&self, unit: UnitId, destination: CellId) -> Path {
        self.units.get(&unit).map_or_else(Path::empty, |u| {
            u.find_path(&self.grid, &self.pathfinders, destination)
        })
    }

    /// Whether `attacker` could hit `target` from where it stands with its basic attack.
    #[must_use]
    pub fn is_attackable(&self, attacker: UnitId, target: UnitId) -> bool {
        match (self.units.get(&attacker), self.units.get(&target)) {
            (Some(a), Some(t)) => {
                a.player() != t.player()
                    && a.is_unit_attackable(t, a.cell(), a.stats.attack_range, None, &self.grid)
            }
            _ => false,
        }
    }

    /// Move a unit along `path`. Illegal moves are ignored.
    ///
    /// Raises [`BattleEvent::UnitMoved`]; instant moves apply their tile
    /// effects before returning.
    pub fn move_unit(&mut self, unit: UnitId, destination: CellId, path: &Path) -> bool {
        let Some(u) = self.units.get_mut(&unit) else {
            return false;
        };
        if !u.is_alive() {
            return false;
        }
        let Some(record) = u.move_along(&mut self.grid, destination, path) else {
            return false;
        };
        self.raise(BattleEvent::UnitMoved {
            unit,
            origin: record.origin,
            destination: record.destination,
            path: record.path,
        });
        self.advance_movement(unit, Fixed::ZERO);
        true
    }

    /// Step one unit's movement animation and apply effects of entered cells.
    fn advance_movement(&mut self, id: UnitId, dt: Fixed) {
        let status = {
            let Some(unit) = self.units.get_mut(&id) else {
                return;
            };
            let Some((task, position, speed)) = unit.movement_mut() else {
                return;
            };
            let status = task.step(position, speed, dt);
            let entered = task.take_entered();
            for cell in entered {
                enter_cell(unit, cell, &mut self.grid, &mut self.events, &self.config);
            }
            status
        };
        if status == TaskStatus::Done {
            let selected = self.units.get_mut(&id).is_some_and(|unit| {
                unit.finish_movement();
                unit.state() == UnitState::Selected
            });
            if selected {
                self.refresh_abilities(id);
            }
        }
    }

    /// Push per-ability availability of a selected unit to the presenter.
    pub(crate) fn refresh_abilities(&mut self, id: UnitId) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let enemies: Vec<&Unit> = self.enemies_of(unit.player()).collect();
        let availability = unit.ability_availability(&enemies, &self.grid);
        for (index, available) in availability.into_iter().enumerate() {
            self.marks.set_ability_available(id, index, available);
        }
    }

    /// Resolve an attack. Illegal attacks are ignored.
    ///
    /// A defender dropping to zero hit points is destroyed, its cell freed
    /// and the battle checked for a winner.
    pub fn attack(&mut self, attacker: UnitId, defender: UnitId) -> Option<AttackOutcome> {
        if attacker == defender {
            return None;
        }
        let mut target = self.units.remove(&defender)?;
        let outcome = match self.units.get_mut(&attacker) {
            Some(a) if target.is_alive() && a.is_alive() => a.deal_damage(&mut target, &mut self.marks),
            _ => None,
        };

        let destroyed = outcome.is_some_and(|o| o.destroyed);
        if destroyed {
            target.destroy(&mut self.grid, &mut self.marks);
            self.fallen.push(defender);
        } else {
            self.units.insert(defender, target);
        }

        let outcome = outcome?;
        self.raise(BattleEvent::UnitAttacked {
            attacker,
            defender,
            damage: outcome.damage,
        });
        if outcome.spent_points {
            if let Some(points) = self.units.get(&attacker).map(Unit::ability_points) {
                self.raise(BattleEvent::AbilityPointsChanged {
                    unit: attacker,
                    points,
                });
            }
        }
        if destroyed {
            self.raise(BattleEvent::UnitDestroyed {
                attacker,
                defender,
                damage: outcome.damage,
            });
            self.check_game_over();
        }
        Some(outcome)
    }

    /// Raise [`BattleEvent::GameEnded`] once at most one player remains.
    pub(crate) fn check_game_over(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let living = self.living_players();
        if living.len() > 1 {
            return;
        }
        let winner = living.first().copied();
        self.outcome = Some(winner);
        info!("Battle over after {} turns, winner: {:?}", self.turn, winner);
        self.raise(BattleEvent::GameEnded { winner });
    }

    /// Apply a buff to a unit.
    pub fn apply_buff(&mut self, unit: UnitId, buff: Buff) -> bool {
        match self.units.get_mut(&unit) {
            Some(u) => {
                u.apply_buff(buff);
                debug!("Unit {} buffed: {:?}", unit, buff);
                true
            }
            None => false,
        }
    }

    /// Change the style meter, clamped to `[0, max_style_points]`.
    pub fn modify_style(&mut self, delta: i32) -> u32 {
        let total = i64::from(self.style_points) + i64::from(delta);
        let clamped = total.clamp(0, i64::from(self.config.max_style_points));
        self.style_points = u32::try_from(clamped).unwrap_or(0);
        self.raise(BattleEvent::StyleModified {
            delta,
            total: self.style_points,
        });
        self.style_points
    }

    /// Advance animations and timers by `dt`.
    ///
    /// Movement always runs. Activation countdowns and ability charging only
    /// run while the battle is not paused.
    pub fn update(&mut self, dt: Fixed) {
        self.elapsed += dt;

        let moving: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.is_moving())
            .map(Unit::id)
            .collect();
        for id in moving {
            self.advance_movement(id, dt);
        }

        if self.paused {
            return;
        }

        let current = self.current_player;
        let mut charged = Vec::new();
        for unit in self.units.values_mut() {
            if unit.tick_activation(dt) && unit.player() == current {
                unit.on_turn_start(&mut self.marks);
            }
            if unit.charge(dt, &self.config) {
                charged.push((unit.id(), unit.ability_points()));
            }
        }
        for (unit, points) in charged {
            self.raise(BattleEvent::AbilityPointsChanged { unit, points });
        }
    }

    /// Hash of the observable battle state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turn.hash(&mut hasher);
        self.current_player.hash(&mut hasher);
        self.style_points.hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in self.units.values() {
            unit.id().hash(&mut hasher);
            unit.player().hash(&mut hasher);
            unit.cell().hash(&mut hasher);
            unit.state().hash(&mut hasher);
            unit.is_ready().hash(&mut hasher);
            unit.stats.hash(&mut hasher);
            unit.ability_points().hash(&mut hasher);
            unit.position().x.to_bits().hash(&mut hasher);
            unit.position().y.to_bits().hash(&mut hasher);
        }
        self.fallen.hash(&mut hasher);

        for cell in self.grid.cells() {
            cell.is_taken().hash(&mut hasher);
            cell.tile.hash(&mut hasher);
            cell.token.hash(&mut hasher);
        }

        hasher.finish()
    }
}

/// Apply the effects of `unit` entering `cell` mid-move.
fn enter_cell(
    unit: &mut Unit,
    cell: CellId,
    grid: &mut Grid,
    events: &mut EventBus,
    config: &BattleConfig,
) {
    let Some(target) = grid.cell_mut(cell) else {
        return;
    };
    let token = target.token.take();
    let tile = target.tile.clone();

    let mut changed = false;
    if let Some(kind) = token {
        changed |= unit.grant(kind, config.points_per_token);
    }

    match tile {
        TileTag::Plain => {}
        TileTag::AbilityPoint(kind) => {
            changed |= unit.grant(kind, config.points_per_tile);
            if let Some((task, _, _)) = unit.movement_mut() {
                task.collect(kind);
            }
            grid.set_tile(cell, TileTag::AbilityPoint(kind.next()));
        }
        TileTag::Camera { requirement } => {
            let collected: Option<Vec<AbilityKind>> = unit
                .movement_mut()
                .filter(|(task, _, _)| task.destination() == cell)
                .map(|(task, _, _)| task.collected().to_vec());
            if let Some(mut collected) = collected {
                let mut requirement = requirement;
                collected.sort_unstable();
                requirement.sort_unstable();
                if collected == requirement {
                    info!("Unit {} matched camera on cell {}", unit.id(), cell);
                    changed |= unit.refill();
                }
            }
            grid.set_tile(cell, TileTag::Plain);
        }
    }

    if changed {
        events.raise(BattleEvent::AbilityPointsChanged {
            unit: unit.id(),
            points: unit.ability_points(),
        });
    }
}
