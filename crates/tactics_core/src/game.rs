//! Host surface: level setup, players and the per-tick driver.
//!
//! ```text
//! GameBuilder::new()
//!     .cells(...).units(...)          generators
//!     .player(...)                    one per player number
//!     .build()?                       LevelLoading .. UnitAdded .. LevelLoadingDone
//! game.start()                        GameStarted, first player's turn
//! loop { game.tick(dt) }              animations, timers, AI steps
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::{error, info};

use crate::abilities::UnitAbility;
use crate::ai::AiPlayer;
use crate::battle::Battle;
use crate::buffs::Buff;
use crate::cell::CellId;
use crate::config::BattleConfig;
use crate::data::{Controller, ScenarioData};
use crate::error::{Result, TacticsError};
use crate::events::{BattleEvent, EventBus, Subscriber};
use crate::generators::{CellGenerator, NoObstacles, ObstacleGenerator, UnitGenerator};
use crate::math::Fixed;
use crate::movement::TaskStatus;
use crate::pathfinding::Pathfinders;
use crate::player::{HumanPlayer, Player, PlayerNumber};
use crate::presentation::Presenter;
use crate::unit::UnitId;

/// Builder wiring generators, players and host hooks into a [`Game`].
#[derive(Default)]
pub struct GameBuilder {
    config: BattleConfig,
    cells: Option<Box<dyn CellGenerator>>,
    obstacles: Option<Box<dyn ObstacleGenerator>>,
    units: Option<Box<dyn UnitGenerator>>,
    players: Vec<Box<dyn Player>>,
    presenter: Option<Box<dyn Presenter>>,
    pathfinders: Option<Pathfinders>,
    subscribers: Vec<Subscriber>,
}

impl GameBuilder {
    /// Create an empty builder with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire every generator, the config and one player per slot from a scenario.
    #[must_use]
    pub fn from_scenario(scenario: &ScenarioData) -> Self {
        let mut builder = Self::new()
            .config(scenario.config.clone())
            .cells(Box::new(scenario.clone()))
            .obstacles(Box::new(scenario.clone()))
            .units(Box::new(scenario.clone()));
        for slot in &scenario.players {
            let player: Box<dyn Player> = match slot.controller {
                Controller::Human => Box::new(HumanPlayer::new(slot.number)),
                Controller::Ai => Box::new(AiPlayer::new(slot.number)),
            };
            builder = builder.player(player);
        }
        builder
    }

    /// Set battle tunables.
    #[must_use]
    pub fn config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the cell generator.
    #[must_use]
    pub fn cells(mut self, generator: Box<dyn CellGenerator>) -> Self {
        self.cells = Some(generator);
        self
    }

    /// Set the obstacle generator. Defaults to no obstacles.
    #[must_use]
    pub fn obstacles(mut self, generator: Box<dyn ObstacleGenerator>) -> Self {
        self.obstacles = Some(generator);
        self
    }

    /// Set the unit generator.
    #[must_use]
    pub fn units(mut self, generator: Box<dyn UnitGenerator>) -> Self {
        self.units = Some(generator);
        self
    }

    /// Register a player.
    #[must_use]
    pub fn player(mut self, player: Box<dyn Player>) -> Self {
        self.players.push(player);
        self
    }

    /// Forward marks to a host presenter.
    #[must_use]
    pub fn presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Replace the pathfinding strategies.
    #[must_use]
    pub fn pathfinders(mut self, pathfinders: Pathfinders) -> Self {
        self.pathfinders = Some(pathfinders);
        self
    }

    /// Register an event callback. It also sees the level-loading events.
    #[must_use]
    pub fn subscribe(mut self, subscriber: impl FnMut(&BattleEvent) + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Generate the level and assemble the game.
    ///
    /// # Errors
    ///
    /// Fails on a missing cell or unit generator, no or duplicate players,
    /// and any error reported by the generators or unit placement.
    pub fn build(self) -> Result<Game> {
        let Some(cells) = self.cells else {
            error!("No cell generator supplied");
            return Err(TacticsError::MissingGenerator("cell"));
        };
        let Some(units) = self.units else {
            error!("No unit generator supplied");
            return Err(TacticsError::MissingGenerator("unit"));
        };
        let obstacles = self.obstacles.unwrap_or_else(|| Box::new(NoObstacles));

        let mut players = BTreeMap::new();
        for player in self.players {
            let number = player.number();
            if players.insert(number, player).is_some() {
                error!("Player {} registered twice", number);
                return Err(TacticsError::DuplicatePlayer(number));
            }
        }
        if players.is_empty() {
            error!("No players registered");
            return Err(TacticsError::NoPlayers);
        }

        let mut events = EventBus::new();
        for subscriber in self.subscribers {
            events.subscribe(subscriber);
        }
        events.raise(BattleEvent::LevelLoading);

        let mut grid = cells.generate_grid(&self.config)?;
        obstacles.place_obstacles(&mut grid)?;
        let spawned = units.spawn_units(&grid)?;

        let mut battle = Battle::new(grid, players.keys().copied().collect(), self.config)?;
        battle.events = events;
        if let Some(presenter) = self.presenter {
            battle.set_presenter(presenter);
        }
        if let Some(pathfinders) = self.pathfinders {
            battle.set_pathfinders(pathfinders);
        }
        for unit in spawned {
            battle.add_unit(unit)?;
        }
        battle.raise(BattleEvent::LevelLoadingDone);
        info!(
            "Level loaded: {} cells, {} units, {} players",
            battle.grid().len(),
            battle.units().count(),
            players.len()
        );

        Ok(Game {
            battle,
            players,
            started: false,
        })
    }
}

impl fmt::Debug for GameBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameBuilder")
            .field("config", &self.config)
            .field("cells", &self.cells)
            .field("obstacles", &self.obstacles)
            .field("units", &self.units)
            .field("players", &self.players)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

/// A battle together with the players taking turns in it.
#[derive(Debug)]
pub struct Game {
    battle: Battle,
    players: BTreeMap<PlayerNumber, Box<dyn Player>>,
    started: bool,
}

impl Game {
    /// The battle.
    #[must_use]
    pub const fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Mutable battle access for hosts and tests.
    pub fn battle_mut(&mut self) -> &mut Battle {
        &mut self.battle
    }

    /// Whether [`Game::start`] has run.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the battle is decided.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.battle.is_over()
    }

    /// Raise `GameStarted` and hand the first turn to its player.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.battle.raise(BattleEvent::GameStarted);
        let first = self.battle.begin();
        info!("Game started, player {} moves first", first);
        self.play_current();
    }

    fn play_current(&mut self) {
        if self.battle.is_over() {
            return;
        }
        let current = self.battle.current_player();
        if let Some(player) = self.players.get_mut(&current) {
            player.play(&mut self.battle);
        }
    }

    /// Advance the game by `dt` seconds.
    ///
    /// Runs movement, countdowns and charging, then resumes the current
    /// player's turn logic. A player reporting [`TaskStatus::Done`] ends its
    /// turn.
    pub fn tick(&mut self, dt: Fixed) {
        if !self.started || self.battle.is_over() {
            return;
        }
        self.battle.update(dt);
        let current = self.battle.current_player();
        let status = match self.players.get_mut(&current) {
            Some(player) => player.step(&mut self.battle, dt),
            None => TaskStatus::Done,
        };
        if status == TaskStatus::Done {
            self.end_turn();
        }
    }

    /// End the current turn and let the next player play.
    pub fn end_turn(&mut self) -> Option<PlayerNumber> {
        let next = self.battle.end_turn()?;
        self.play_current();
        Some(next)
    }

    /// Host input: a cell was clicked.
    pub fn on_cell_clicked(&mut self, cell: CellId) {
        self.battle.on_cell_clicked(cell);
    }

    /// Host input: the cursor entered a cell.
    pub fn on_cell_selected(&mut self, cell: CellId) {
        self.battle.on_cell_selected(cell);
    }

    /// Host input: the cursor left a cell.
    pub fn on_cell_deselected(&mut self, cell: CellId) {
        self.battle.on_cell_deselected(cell);
    }

    /// Host input: a unit was clicked.
    pub fn on_unit_clicked(&mut self, unit: UnitId) {
        self.battle.on_unit_clicked(unit);
    }

    /// Host input: the cursor entered a unit.
    pub fn on_unit_highlighted(&mut self, unit: UnitId) {
        self.battle.on_unit_highlighted(unit);
    }

    /// Host input: the cursor left a unit.
    pub fn on_unit_dehighlighted(&mut self, unit: UnitId) {
        self.battle.on_unit_dehighlighted(unit);
    }

    /// Host input: an ability was chosen.
    pub fn unit_ability(&mut self, ability: &UnitAbility) {
        self.battle.unit_ability(ability);
    }

    /// Host input: the taunt button.
    pub fn taunt(&mut self) {
        self.battle.taunt();
    }

    /// Apply a buff to a unit.
    pub fn apply_buff(&mut self, unit: UnitId, buff: Buff) -> bool {
        self.battle.apply_buff(unit, buff)
    }

    /// Change the style meter.
    pub fn modify_style(&mut self, delta: i32) -> u32 {
        self.battle.modify_style(delta)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::grid::Grid;
    use crate::grid_state::GridState;
    use crate::unit::{Unit, UnitStats};

    #[derive(Debug)]
    struct Strip(u32);

    impl CellGenerator for Strip {
        fn generate_grid(&self, config: &BattleConfig) -> Result<Grid> {
            Ok(Grid::rectangle(self.0, 1, 1, config.cell_size))
        }
    }

    #[derive(Debug)]
    struct Pair(u32);

    impl UnitGenerator for Pair {
        fn spawn_units(&self, _grid: &Grid) -> Result<Vec<Unit>> {
            let stats = UnitStats::new(8, 4, 0, 1, 3, 1);
            Ok(vec![
                Unit::new(UnitId(0), 0, CellId(0), stats),
                Unit::new(UnitId(1), 1, CellId(self.0), stats),
            ])
        }
    }

    fn builder(far: u32) -> GameBuilder {
        GameBuilder::new()
            .cells(Box::new(Strip(8)))
            .units(Box::new(Pair(far)))
    }

    #[test]
    fn test_missing_generators() {
        let err = GameBuilder::new()
            .units(Box::new(Pair(1)))
            .player(Box::new(HumanPlayer::new(0)))
            .build()
            .unwrap_err();
        assert_eq!(err, TacticsError::MissingGenerator("cell"));

        let err = GameBuilder::new()
            .cells(Box::new(Strip(4)))
            .player(Box::new(HumanPlayer::new(0)))
            .build()
            .unwrap_err();
        assert_eq!(err, TacticsError::MissingGenerator("unit"));
    }

    #[test]
    fn test_player_validation() {
        assert_eq!(builder(5).build().unwrap_err(), TacticsError::NoPlayers);
        let err = builder(5)
            .player(Box::new(HumanPlayer::new(0)))
            .player(Box::new(AiPlayer::new(0)))
            .build()
            .unwrap_err();
        assert_eq!(err, TacticsError::DuplicatePlayer(0));
        let err = builder(5)
            .player(Box::new(HumanPlayer::new(0)))
            .build()
            .unwrap_err();
        assert_eq!(err, TacticsError::MissingPlayer(1));
    }

    #[test]
    fn test_loading_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut game = builder(5)
            .player(Box::new(HumanPlayer::new(0)))
            .player(Box::new(HumanPlayer::new(1)))
            .subscribe(move |event| sink.borrow_mut().push(event.clone()))
            .build()
            .unwrap();
        game.start();

        assert_eq!(
            *seen.borrow(),
            vec![
                BattleEvent::LevelLoading,
                BattleEvent::UnitAdded { unit: UnitId(0) },
                BattleEvent::UnitAdded { unit: UnitId(1) },
                BattleEvent::LevelLoadingDone,
                BattleEvent::GameStarted,
            ]
        );
        assert_eq!(game.battle().state(), &GridState::WaitingForInput);
    }

    #[test]
    fn test_human_turn_waits_for_end_turn() {
        let mut game = builder(5)
            .player(Box::new(HumanPlayer::new(0)))
            .player(Box::new(HumanPlayer::new(1)))
            .build()
            .unwrap();
        game.start();
        for _ in 0..5 {
            game.tick(Fixed::ONE);
        }
        assert_eq!(game.battle().current_player(), 0);
        assert_eq!(game.end_turn(), Some(1));
        assert_eq!(game.battle().state(), &GridState::WaitingForInput);
    }

    #[test]
    fn test_ai_duel_finishes() {
        let mut game = builder(7)
            .player(Box::new(AiPlayer::new(0)))
            .player(Box::new(AiPlayer::new(1)))
            .build()
            .unwrap();
        game.start();
        for _ in 0..500 {
            if game.is_over() {
                break;
            }
            game.tick(Fixed::ONE);
        }
        assert!(game.is_over());
        // Player 1 closes the gap first and lands the opening hit.
        assert_eq!(game.battle().winner(), Some(1));
    }

    #[test]
    fn test_human_input_is_forwarded() {
        let mut game = builder(5)
            .player(Box::new(HumanPlayer::new(0)))
            .player(Box::new(HumanPlayer::new(1)))
            .build()
            .unwrap();
        game.start();
        game.on_unit_clicked(UnitId(0));
        game.on_cell_clicked(CellId(2));
        assert_eq!(game.battle().unit(UnitId(0)).unwrap().cell(), CellId(2));
        assert_eq!(game.modify_style(10), 10);
    }
}
