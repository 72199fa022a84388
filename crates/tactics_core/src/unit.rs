//! Units: resources, path cache, movement and combat.
//!
//! A unit owns its resource pools, its [`UnitState`] and a turn-scoped cache
//! of paths to every destination it could reach when it was last selected.
//! The cell it stands on is a plain id; occupancy lives on the [`Grid`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::abilities::{AbilityCost, AbilityKind, AbilityPoints, UnitAbility};
use crate::buffs::Buff;
use crate::cell::CellId;
use crate::config::BattleConfig;
use crate::graph::{build_graph, Mobility, Traversal};
use crate::grid::Grid;
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::MovementTask;
use crate::pathfinding::{Path, Pathfinders};
use crate::player::PlayerNumber;
use crate::presentation::{Presenter, UnitMark};
use crate::unit_state::UnitState;

/// Unique identifier for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Combat and movement numbers of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitStats {
    /// Hit points at full health.
    pub max_hit_points: i32,
    /// Current hit points. The unit is destroyed at zero or below.
    pub hit_points: i32,
    /// Raw damage of a basic attack.
    pub attack_factor: i32,
    /// Damage absorbed from every hit.
    pub defence_factor: i32,
    /// Hex distance of a basic attack.
    pub attack_range: u32,
    /// Movement points restored each turn.
    pub max_movement_points: u32,
    /// Movement points left this turn.
    pub movement_points: u32,
    /// Action points restored each turn.
    pub max_action_points: u32,
    /// Action points left this turn.
    pub action_points: u32,
}

impl UnitStats {
    /// Stats with every pool full.
    #[must_use]
    pub const fn new(
        hit_points: i32,
        attack_factor: i32,
        defence_factor: i32,
        attack_range: u32,
        movement_points: u32,
        action_points: u32,
    ) -> Self {
        Self {
            max_hit_points: hit_points,
            hit_points,
            attack_factor,
            defence_factor,
            attack_range,
            max_movement_points: movement_points,
            movement_points,
            max_action_points: action_points,
            action_points,
        }
    }
}

/// A committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Unit that moved.
    pub unit: UnitId,
    /// Cell it left.
    pub origin: CellId,
    /// Cell it now occupies.
    pub destination: CellId,
    /// Steps walked.
    pub path: Path,
    /// Movement points spent.
    pub cost: u32,
}

/// Result of a landed attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Defending unit.
    pub defender: UnitId,
    /// Raw damage before defence.
    pub damage: i32,
    /// Hit points actually removed.
    pub dealt: i32,
    /// Whether the defender dropped to zero hit points.
    pub destroyed: bool,
    /// Whether ability points were consumed.
    pub spent_points: bool,
}

/// Ability armed for the next attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedAbility {
    attack_factor: i32,
    cost: AbilityCost,
}

/// A unit on the battlefield.
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    player: PlayerNumber,
    name: String,
    cell: CellId,
    position: Vec2Fixed,
    state: UnitState,
    ready: bool,
    /// Combat and movement numbers.
    pub stats: UnitStats,
    ability_points: AbilityPoints,
    ability_maximum: AbilityPoints,
    abilities: Vec<UnitAbility>,
    armed: Option<ArmedAbility>,
    mobility: Mobility,
    buffs: Vec<Buff>,
    movement_speed: Fixed,
    action_speed: Fixed,
    activation_timer: Fixed,
    charging: bool,
    charge_timer: Fixed,
    cached_paths: Option<BTreeMap<CellId, Path>>,
    movement: Option<MovementTask>,
}

impl Unit {
    /// Create a ready ground unit standing on `cell`.
    #[must_use]
    pub fn new(id: UnitId, player: PlayerNumber, cell: CellId, stats: UnitStats) -> Self {
        Self {
            id,
            player,
            name: format!("unit-{}", id.0),
            cell,
            position: Vec2Fixed::ZERO,
            state: UnitState::Normal,
            ready: true,
            stats,
            ability_points: AbilityPoints::default(),
            ability_maximum: AbilityPoints::default(),
            abilities: Vec::new(),
            armed: None,
            mobility: Mobility::Ground,
            buffs: Vec::new(),
            movement_speed: Fixed::ZERO,
            action_speed: Fixed::ZERO,
            activation_timer: Fixed::ZERO,
            charging: false,
            charge_timer: Fixed::ZERO,
            cached_paths: None,
            movement: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the abilities shown in the action menu.
    #[must_use]
    pub fn with_abilities(mut self, abilities: Vec<UnitAbility>) -> Self {
        self.abilities = abilities;
        self
    }

    /// Set the ability point maxima and fill every pool.
    #[must_use]
    pub fn with_ability_points(mut self, maximum: AbilityPoints) -> Self {
        self.ability_maximum = maximum;
        self.ability_points = maximum;
        self
    }

    /// Set traversal rules.
    #[must_use]
    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }

    /// Set animation speed in world units per second. Zero moves instantly.
    #[must_use]
    pub fn with_movement_speed(mut self, speed: Fixed) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Set the activation delay.
    ///
    /// A positive delay starts the unit unready with its countdown running.
    #[must_use]
    pub fn with_action_speed(mut self, delay: Fixed) -> Self {
        self.action_speed = delay;
        self.activation_timer = delay;
        self.ready = delay <= Fixed::ZERO;
        self
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning player.
    #[must_use]
    pub const fn player(&self) -> PlayerNumber {
        self.player
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell the unit occupies.
    #[must_use]
    pub const fn cell(&self) -> CellId {
        self.cell
    }

    /// Animated world position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> UnitState {
        self.state
    }

    /// Whether the unit may act this turn.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a movement animation is running.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    /// Whether the unit is still in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state != UnitState::Destroyed && self.stats.hit_points > 0
    }

    /// Current ability points.
    #[must_use]
    pub const fn ability_points(&self) -> AbilityPoints {
        self.ability_points
    }

    #[cfg(test)]
    pub(crate) fn ability_points_mut(&mut self) -> &mut AbilityPoints {
        &mut self.ability_points
    }

    /// Ability point maxima.
    #[must_use]
    pub const fn ability_maximum(&self) -> AbilityPoints {
        self.ability_maximum
    }

    /// Abilities in menu order.
    #[must_use]
    pub fn abilities(&self) -> &[UnitAbility] {
        &self.abilities
    }

    /// Active buffs.
    #[must_use]
    pub fn buffs(&self) -> &[Buff] {
        &self.buffs
    }

    /// Traversal rules.
    #[must_use]
    pub const fn mobility(&self) -> Mobility {
        self.mobility
    }

    /// Whether idle time is converted into ability points.
    #[must_use]
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// Destinations cached at the last selection, if still valid.
    #[must_use]
    pub fn cached_paths(&self) -> Option<&BTreeMap<CellId, Path>> {
        self.cached_paths.as_ref()
    }

    /// Request a state transition.
    ///
    /// Returns `false` if the current state rejects it. Touching the Finished
    /// state in either direction clears readiness and hides the action menu.
    pub fn set_state(&mut self, requested: UnitState, presenter: &mut dyn Presenter) -> bool {
        let current = self.state;
        if current == UnitState::Finished {
            self.ready = false;
            presenter.set_action_menu(self.id, false);
        }
        if !current.accepts(requested) {
            trace!("Unit {} ignores {:?} while {:?}", self.id, requested, current);
            return false;
        }
        if requested == UnitState::Finished {
            self.ready = false;
            presenter.set_action_menu(self.id, false);
        }
        self.state = requested;
        presenter.mark_unit(self.id, requested.mark());
        debug!("Unit {} {:?} -> {:?}", self.id, current, requested);
        true
    }

    /// Compute and cache every destination reachable this turn.
    ///
    /// Keeps cells the unit may stop on whose path cost is within the
    /// remaining movement points. Call once per selection.
    pub fn get_available_destinations(
        &mut self,
        grid: &Grid,
        pathfinders: &Pathfinders,
    ) -> BTreeSet<CellId> {
        let graph = build_graph(grid, &self.mobility, self.cell);
        let budget = self.stats.movement_points;
        let cache: BTreeMap<CellId, Path> = pathfinders
            .all_paths
            .find_all_paths(&graph, self.cell)
            .into_iter()
            .filter(|(id, path)| {
                grid.cell(*id)
                    .is_some_and(|cell| self.mobility.is_movable_to(cell))
                    && path.cost(grid) <= budget
            })
            .collect();
        let destinations = cache.keys().copied().collect();
        self.cached_paths = Some(cache);
        destinations
    }

    /// Path to `destination`: the cached one, or a fresh A* search.
    ///
    /// The search ignores the movement budget, so a non-cached result only
    /// serves as feedback and never authorises a move.
    #[must_use]
    pub fn find_path(&self, grid: &Grid, pathfinders: &Pathfinders, destination: CellId) -> Path {
        if let Some(path) = self
            .cached_paths
            .as_ref()
            .and_then(|cache| cache.get(&destination))
        {
            return path.clone();
        }
        let graph = build_graph(grid, &self.mobility, self.cell);
        pathfinders
            .fallback
            .find_path(&graph, self.cell, destination, None, None)
    }

    /// Path to show while the cursor hovers `destination`.
    ///
    /// Cached destinations use the incremental preview on top of `prior`,
    /// falling back to the cached path when the preview breaks off.
    #[must_use]
    pub fn preview_path(
        &self,
        grid: &Grid,
        pathfinders: &Pathfinders,
        destination: CellId,
        prior: &Path,
    ) -> Path {
        let Some(cached) = self
            .cached_paths
            .as_ref()
            .and_then(|cache| cache.get(&destination))
        else {
            return self.find_path(grid, pathfinders, destination);
        };
        let graph = build_graph(grid, &self.mobility, self.cell);
        let preview = pathfinders.preview.find_path(
            &graph,
            self.cell,
            destination,
            Some(prior),
            Some(self.stats.movement_points),
        );
        if preview.is_empty() {
            cached.clone()
        } else {
            preview
        }
    }

    /// Commit a move along `path` to `destination`.
    ///
    /// Rejected without side effects if the unit is already moving, the path
    /// does not end at `destination` or is not walkable, its cost exceeds the
    /// remaining movement points, or the destination cannot be stopped on.
    /// On success the occupancy of both cells flips together, the cache is
    /// dropped and a movement task starts.
    pub fn move_along(&mut self, grid: &mut Grid, destination: CellId, path: &Path) -> Option<MoveRecord> {
        if self.is_moving() {
            trace!("Unit {} is already moving", self.id);
            return None;
        }
        if path.head() != Some(destination) {
            return None;
        }
        let graph = build_graph(grid, &self.mobility, self.cell);
        let cost = graph.path_cost(self.cell, path)?;
        if cost > self.stats.movement_points {
            trace!(
                "Unit {} cannot afford path cost {} with {} movement points",
                self.id,
                cost,
                self.stats.movement_points
            );
            return None;
        }
        let movable = grid
            .cell(destination)
            .is_some_and(|cell| self.mobility.is_movable_to(cell));
        if !movable || !grid.commit_move(self.cell, destination) {
            return None;
        }

        self.stats.movement_points -= cost;
        let origin = std::mem::replace(&mut self.cell, destination);
        self.cached_paths = None;

        let waypoints = path
            .steps()
            .iter()
            .filter_map(|&id| grid.world_position(id).map(|pos| (id, pos)))
            .collect();
        self.movement = Some(MovementTask::new(waypoints, destination));

        debug!("Unit {} moves {} -> {} (cost {})", self.id, origin, destination, cost);
        Some(MoveRecord {
            unit: self.id,
            origin,
            destination,
            path: path.clone(),
            cost,
        })
    }

    pub(crate) fn movement_mut(&mut self) -> Option<(&mut MovementTask, &mut Vec2Fixed, Fixed)> {
        let speed = self.movement_speed;
        self.movement
            .as_mut()
            .map(|task| (task, &mut self.position, speed))
    }

    pub(crate) fn finish_movement(&mut self) -> Option<MovementTask> {
        self.movement.take()
    }

    /// Attack `target` with the armed ability, or the basic attack.
    ///
    /// Rejected while moving or without action points. Spending the last
    /// action point finishes the unit and zeroes its movement points.
    pub fn deal_damage(&mut self, target: &mut Unit, presenter: &mut dyn Presenter) -> Option<AttackOutcome> {
        if self.is_moving() || self.stats.action_points == 0 {
            trace!("Unit {} cannot attack now", self.id);
            return None;
        }

        presenter.mark_unit(self.id, UnitMark::Attacking);
        self.stats.action_points -= 1;

        let (damage, cost) = match self.armed.take() {
            Some(armed) => (armed.attack_factor, armed.cost),
            None => (self.stats.attack_factor, AbilityCost::FREE),
        };
        let dealt = target.defend(damage, presenter);
        self.ability_points.spend(&cost);

        if self.stats.action_points == 0 {
            self.set_state(UnitState::Finished, presenter);
            self.stats.movement_points = 0;
        }

        debug!(
            "Unit {} hits unit {} for {} ({} after defence)",
            self.id, target.id, damage, dealt
        );
        Some(AttackOutcome {
            attacker: self.id,
            defender: target.id,
            damage,
            dealt,
            destroyed: target.stats.hit_points <= 0,
            spent_points: cost != AbilityCost::FREE,
        })
    }

    /// Absorb `damage`. At least one hit point is always lost.
    pub fn defend(&mut self, damage: i32, presenter: &mut dyn Presenter) -> i32 {
        presenter.mark_unit(self.id, UnitMark::Defending);
        let dealt = (damage - self.stats.defence_factor).max(1);
        self.stats.hit_points -= dealt;
        dealt
    }

    /// Remove the unit from play and free its cell.
    pub fn destroy(&mut self, grid: &mut Grid, presenter: &mut dyn Presenter) {
        self.state = UnitState::Destroyed;
        self.ready = false;
        self.movement = None;
        self.cached_paths = None;
        grid.set_taken(self.cell, false);
        presenter.mark_unit(self.id, UnitMark::Destroyed);
        debug!("Unit {} destroyed", self.id);
    }

    /// Whether `other` is within `range` of `source` and `cost` is affordable.
    #[must_use]
    pub fn is_unit_attackable(
        &self,
        other: &Unit,
        source: CellId,
        range: u32,
        cost: Option<&AbilityCost>,
        grid: &Grid,
    ) -> bool {
        if cost.is_some_and(|c| !self.ability_points.can_afford(c)) {
            return false;
        }
        grid.distance(source, other.cell)
            .is_some_and(|distance| distance <= range)
    }

    /// Per ability: whether an enemy is in range and the cost is affordable.
    #[must_use]
    pub fn ability_availability(&self, enemies: &[&Unit], grid: &Grid) -> Vec<bool> {
        self.abilities
            .iter()
            .map(|ability| {
                enemies.iter().any(|enemy| {
                    self.is_unit_attackable(enemy, self.cell, ability.attack_range, Some(&ability.cost), grid)
                })
            })
            .collect()
    }

    /// Arm `ability` for the next attack.
    pub fn arm(&mut self, ability: &UnitAbility) {
        self.armed = Some(ArmedAbility {
            attack_factor: ability.attack_factor,
            cost: ability.cost,
        });
    }

    /// Whether an ability is armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Enter the Selected state. Returns `false` if the unit is not ready.
    pub fn select(&mut self, presenter: &mut dyn Presenter) -> bool {
        if !self.ready || !self.is_alive() {
            return false;
        }
        presenter.set_action_menu(self.id, true);
        self.set_state(UnitState::Selected, presenter)
    }

    /// Leave the Selected state.
    ///
    /// A unit with action points left starts charging ability points.
    pub fn deselect(&mut self, presenter: &mut dyn Presenter, charge_interval: Fixed) {
        presenter.set_action_menu(self.id, false);
        let charging = self.stats.action_points > 0;
        if charging && !self.charging {
            self.charge_timer = charge_interval;
        }
        self.charging = charging;
        self.armed = None;
        self.set_state(UnitState::Friendly, presenter);
    }

    /// Restore pools at the start of the owner's turn. Unready units are skipped.
    pub fn on_turn_start(&mut self, presenter: &mut dyn Presenter) {
        if !self.ready {
            return;
        }
        self.stats.movement_points = self.stats.max_movement_points;
        self.stats.action_points = self.stats.max_action_points;
        self.set_state(UnitState::Friendly, presenter);
    }

    /// Drop the cache, age buffs and return to Normal.
    ///
    /// Buffs already at zero duration are undone and removed; the rest lose
    /// one turn. Units without an activation delay are re-armed.
    pub fn on_turn_end(&mut self, presenter: &mut dyn Presenter) {
        self.cached_paths = None;
        self.armed = None;

        let stats = &mut self.stats;
        self.buffs.retain(|buff| {
            if buff.duration == 0 {
                buff.undo(stats);
                false
            } else {
                true
            }
        });
        for buff in &mut self.buffs {
            buff.duration -= 1;
        }

        self.set_state(UnitState::Normal, presenter);
        if self.action_speed <= Fixed::ZERO {
            self.ready = true;
        }
    }

    /// Apply a buff and keep it until it expires.
    pub fn apply_buff(&mut self, buff: Buff) {
        buff.apply(&mut self.stats);
        self.buffs.push(buff);
    }

    /// Add points of one kind, clamped. Returns `true` if the pool changed.
    pub fn grant(&mut self, kind: AbilityKind, points: u32) -> bool {
        let maximum = self.ability_maximum;
        self.ability_points.add_clamped(kind, points, &maximum)
    }

    /// Fill every pool. Returns `true` if anything changed.
    pub fn refill(&mut self) -> bool {
        let changed = self.ability_points != self.ability_maximum;
        self.ability_points = self.ability_maximum;
        changed
    }

    /// Advance ability charging. Returns `true` if points were gained.
    pub fn charge(&mut self, dt: Fixed, config: &BattleConfig) -> bool {
        if !self.charging || !self.is_alive() {
            return false;
        }
        self.charge_timer -= dt;
        if self.charge_timer > Fixed::ZERO {
            return false;
        }
        self.charge_timer = config.charge_interval;
        let mut changed = false;
        for kind in AbilityKind::ALL {
            changed |= self.grant(kind, config.points_per_charge);
        }
        changed
    }

    /// Advance the activation countdown. Returns `true` when the unit becomes ready.
    pub fn tick_activation(&mut self, dt: Fixed) -> bool {
        if self.ready || self.action_speed <= Fixed::ZERO || !self.is_alive() {
            return false;
        }
        self.activation_timer -= dt;
        if self.activation_timer > Fixed::ZERO {
            return false;
        }
        self.activation_timer = self.action_speed;
        self.ready = true;
        debug!("Unit {} activated", self.id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffs::BuffEffect;
    use crate::presentation::{MarkBoard, NullPresenter};

    fn grid() -> Grid {
        Grid::rectangle(6, 1, 1, Fixed::ONE)
    }

    fn unit(id: u32, player: PlayerNumber, cell: u32, movement: u32) -> Unit {
        Unit::new(UnitId(id), player, CellId(cell), UnitStats::new(10, 4, 1, 1, movement, 1))
    }

    fn placed(grid: &mut Grid, unit: Unit) -> Unit {
        grid.set_taken(unit.cell(), true);
        unit
    }

    #[test]
    fn test_destinations_respect_budget_boundary() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 3));
        let destinations = unit.get_available_destinations(&grid, &Pathfinders::default());

        assert!(destinations.contains(&CellId(3)));
        assert!(!destinations.contains(&CellId(4)));
        assert!(!destinations.contains(&CellId(0)));
    }

    #[test]
    fn test_destinations_skip_taken_cells() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 5));
        grid.set_taken(CellId(2), true);
        let destinations = unit.get_available_destinations(&grid, &Pathfinders::default());
        assert_eq!(destinations.into_iter().collect::<Vec<_>>(), vec![CellId(1)]);
    }

    #[test]
    fn test_phasing_unit_passes_but_never_stops_on_taken_cells() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 5).with_mobility(Mobility::Phasing));
        grid.set_taken(CellId(2), true);
        let destinations = unit.get_available_destinations(&grid, &Pathfinders::default());

        assert!(!destinations.contains(&CellId(2)));
        assert!(destinations.contains(&CellId(3)));
    }

    #[test]
    fn test_find_path_falls_back_outside_cache() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 1));
        let pathfinders = Pathfinders::default();
        unit.get_available_destinations(&grid, &pathfinders);

        let far = unit.find_path(&grid, &pathfinders, CellId(5));
        assert_eq!(far.len(), 5);
        let near = unit.find_path(&grid, &pathfinders, CellId(1));
        assert_eq!(near.steps(), &[CellId(1)]);
    }

    #[test]
    fn test_move_over_budget_changes_nothing() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 2));
        let path = Path::from_steps(vec![CellId(1), CellId(2), CellId(3)]);

        assert!(unit.move_along(&mut grid, CellId(3), &path).is_none());
        assert_eq!(unit.cell(), CellId(0));
        assert_eq!(unit.stats.movement_points, 2);
        assert!(grid.is_taken(CellId(0)));
        assert!(!grid.is_taken(CellId(3)));
    }

    #[test]
    fn test_move_commits_occupancy_and_cost() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 3));
        let pathfinders = Pathfinders::default();
        unit.get_available_destinations(&grid, &pathfinders);
        let path = unit.find_path(&grid, &pathfinders, CellId(2));

        let record = unit.move_along(&mut grid, CellId(2), &path).unwrap();
        assert_eq!(record.origin, CellId(0));
        assert_eq!(record.cost, 2);
        assert_eq!(unit.stats.movement_points, 1);
        assert!(!grid.is_taken(CellId(0)));
        assert!(grid.is_taken(CellId(2)));
        assert!(unit.cached_paths().is_none());
        assert!(unit.is_moving());

        // A second move while the animation runs is rejected.
        let next = Path::from_steps(vec![CellId(3)]);
        assert!(unit.move_along(&mut grid, CellId(3), &next).is_none());
    }

    #[test]
    fn test_move_rejects_mismatched_or_broken_paths() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 0, 5));
        let teleport = Path::from_steps(vec![CellId(4)]);
        assert!(unit.move_along(&mut grid, CellId(4), &teleport).is_none());
        let wrong_head = Path::from_steps(vec![CellId(1)]);
        assert!(unit.move_along(&mut grid, CellId(2), &wrong_head).is_none());
        assert_eq!(unit.cell(), CellId(0));
    }

    #[test]
    fn test_damage_floor_is_one() {
        let mut target = unit(1, 1, 1, 1);
        target.stats.defence_factor = 10;
        assert_eq!(target.defend(3, &mut NullPresenter), 1);
        assert_eq!(target.stats.hit_points, 9);
    }

    #[test]
    fn test_last_action_finishes_attacker() {
        let mut attacker = unit(0, 0, 0, 3);
        let mut target = unit(1, 1, 1, 3);
        let mut board = MarkBoard::new();

        let outcome = attacker.deal_damage(&mut target, &mut board).unwrap();
        assert_eq!(outcome.dealt, 3);
        assert_eq!(target.stats.hit_points, 7);
        assert_eq!(attacker.state(), UnitState::Finished);
        assert_eq!(attacker.stats.movement_points, 0);
        assert!(!attacker.is_ready());

        // Out of action points: no second hit.
        assert!(attacker.deal_damage(&mut target, &mut board).is_none());
        assert_eq!(target.stats.hit_points, 7);
    }

    #[test]
    fn test_finished_unit_cannot_be_selected() {
        let mut attacker = unit(0, 0, 0, 3);
        let mut target = unit(1, 1, 1, 3);
        attacker.deal_damage(&mut target, &mut NullPresenter);

        assert!(!attacker.select(&mut NullPresenter));
        assert!(!attacker.set_state(UnitState::ReachableEnemy, &mut NullPresenter));
        assert_eq!(attacker.state(), UnitState::Finished);
    }

    #[test]
    fn test_armed_ability_spends_points() {
        let mut attacker = unit(0, 0, 0, 3).with_ability_points(AbilityPoints::new(3, 3, 3));
        let mut target = unit(1, 1, 1, 3);
        let ability = UnitAbility::new("Cleave", 6, 1).with_cost(AbilityCost::new(2, 0, 1));

        attacker.arm(&ability);
        let outcome = attacker.deal_damage(&mut target, &mut NullPresenter).unwrap();
        assert_eq!(outcome.damage, 6);
        assert!(outcome.spent_points);
        assert_eq!(attacker.ability_points(), AbilityPoints::new(1, 3, 2));
        assert!(!attacker.is_armed());
    }

    #[test]
    fn test_attackable_checks_range_and_cost() {
        let grid = grid();
        let attacker = unit(0, 0, 0, 3).with_ability_points(AbilityPoints::new(1, 0, 0));
        let near = unit(1, 1, 1, 3);
        let far = unit(2, 1, 4, 3);

        assert!(attacker.is_unit_attackable(&near, CellId(0), 1, None, &grid));
        assert!(!attacker.is_unit_attackable(&far, CellId(0), 1, None, &grid));
        assert!(attacker.is_unit_attackable(&far, CellId(0), 4, None, &grid));
        let pricey = AbilityCost::new(2, 0, 0);
        assert!(!attacker.is_unit_attackable(&near, CellId(0), 1, Some(&pricey), &grid));
    }

    #[test]
    fn test_turn_start_refills_only_ready_units() {
        let mut unit = unit(0, 0, 0, 3);
        unit.stats.movement_points = 0;
        unit.stats.action_points = 0;
        unit.on_turn_start(&mut NullPresenter);
        assert_eq!(unit.stats.movement_points, 3);
        assert_eq!(unit.state(), UnitState::Friendly);

        let mut waiting = unit.clone().with_action_speed(Fixed::from_num(2));
        waiting.stats.movement_points = 0;
        waiting.on_turn_start(&mut NullPresenter);
        assert_eq!(waiting.stats.movement_points, 0);
    }

    #[test]
    fn test_turn_end_expires_buffs() {
        let mut unit = unit(0, 0, 0, 3);
        unit.apply_buff(Buff::new(1, BuffEffect::Attack(2)));
        assert_eq!(unit.stats.attack_factor, 6);

        unit.on_turn_end(&mut NullPresenter);
        assert_eq!(unit.buffs()[0].duration, 0);
        assert_eq!(unit.stats.attack_factor, 6);

        unit.on_turn_end(&mut NullPresenter);
        assert!(unit.buffs().is_empty());
        assert_eq!(unit.stats.attack_factor, 4);
    }

    #[test]
    fn test_turn_end_rearms_finished_unit() {
        let mut attacker = unit(0, 0, 0, 3);
        let mut target = unit(1, 1, 1, 3);
        attacker.deal_damage(&mut target, &mut NullPresenter);
        assert!(!attacker.is_ready());

        attacker.on_turn_end(&mut NullPresenter);
        assert_eq!(attacker.state(), UnitState::Normal);
        assert!(attacker.is_ready());
    }

    #[test]
    fn test_activation_countdown() {
        let mut unit = unit(0, 0, 0, 3).with_action_speed(Fixed::from_num(2));
        assert!(!unit.is_ready());
        assert!(!unit.tick_activation(Fixed::ONE));
        assert!(unit.tick_activation(Fixed::ONE));
        assert!(unit.is_ready());
        assert!(!unit.tick_activation(Fixed::ONE));
    }

    #[test]
    fn test_charging_after_deselect() {
        let config = BattleConfig::default();
        let mut unit = unit(0, 0, 0, 3).with_ability_points(AbilityPoints::new(5, 5, 5));
        unit.ability_points = AbilityPoints::default();

        unit.select(&mut NullPresenter);
        unit.deselect(&mut NullPresenter, config.charge_interval);
        assert!(unit.is_charging());

        assert!(!unit.charge(Fixed::from_num(2), &config));
        assert!(unit.charge(Fixed::from_num(1), &config));
        assert_eq!(unit.ability_points(), AbilityPoints::new(1, 1, 1));
    }

    #[test]
    fn test_destroy_frees_cell() {
        let mut grid = grid();
        let mut unit = placed(&mut grid, unit(0, 0, 2, 3));
        unit.destroy(&mut grid, &mut NullPresenter);
        assert!(!grid.is_taken(CellId(2)));
        assert_eq!(unit.state(), UnitState::Destroyed);
        assert!(!unit.set_state(UnitState::Normal, &mut NullPresenter));
    }
}
