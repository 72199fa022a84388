//! Interactive session: host input for human players over JSON lines.
//!
//! AI players in the scenario keep playing their own turns; they advance on
//! `tick` commands like everything else.

use std::io::{self, BufRead, Write};

use tactics_core::abilities::UnitAbility;
use tactics_core::cell::CellId;
use tactics_core::data::ScenarioData;
use tactics_core::game::{Game, GameBuilder};
use tactics_core::grid_state::GridState;
use tactics_core::math::Fixed;
use tactics_core::unit::UnitId;
use tracing::{debug, info, warn};

use crate::protocol::{Command, Response, StateSnapshot, UnitSnapshot};
use crate::runner::{RunConfig, RunError};

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Host tick length in milliseconds.
    pub tick_millis: u32,
    /// Output state after every `tick` command (vs only on query).
    pub auto_state: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_millis: RunConfig::default().tick_millis,
            auto_state: false,
        }
    }
}

/// A started game driven by protocol commands.
#[derive(Debug)]
pub struct Session {
    game: Game,
    dt: Fixed,
    ticks: u64,
    auto_state: bool,
    reported_over: bool,
}

impl Session {
    /// Build and start the scenario's game.
    pub fn new(scenario: &ScenarioData, config: SessionConfig) -> Result<Self, RunError> {
        let mut game = GameBuilder::from_scenario(scenario).build()?;
        game.start();
        info!(scenario = %scenario.name, "Interactive session started");
        Ok(Self {
            game,
            dt: RunConfig {
                tick_millis: config.tick_millis,
                max_ticks: 0,
            }
            .tick(),
            ticks: 0,
            auto_state: config.auto_state,
            reported_over: false,
        })
    }

    /// The game being played.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Host ticks played so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current battle state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let battle = self.game.battle();
        let (grid_state, selected, reachable) = match battle.state() {
            GridState::WaitingForInput => ("waiting_for_input", None, Vec::new()),
            GridState::UnitSelected(selection) => (
                "unit_selected",
                Some(selection.unit.0),
                selection.reachable.iter().map(|cell| cell.0).collect(),
            ),
            GridState::TurnChanging => ("turn_changing", None, Vec::new()),
        };
        StateSnapshot {
            turn: battle.turn(),
            current_player: battle.current_player(),
            grid_state: grid_state.to_string(),
            selected,
            reachable,
            units: battle.units().map(UnitSnapshot::from).collect(),
            style_points: battle.style_points(),
            hash: battle.state_hash(),
        }
    }

    fn selected_ability(&self, index: usize) -> Option<UnitAbility> {
        let battle = self.game.battle();
        let unit = battle.state().selected_unit()?;
        battle.unit(unit)?.abilities().get(index).cloned()
    }

    /// Apply one command and collect the responses.
    ///
    /// Events raised by the command come first, then its reply, then a
    /// `game_over` the first time the battle is found decided.
    pub fn handle(&mut self, command: &Command) -> Vec<Response> {
        let name = command.name();
        let reply = match *command {
            Command::Tick { count } => {
                for _ in 0..count {
                    if self.game.is_over() {
                        break;
                    }
                    self.game.tick(self.dt);
                    self.ticks += 1;
                }
                None
            }
            Command::Query => Some(Response::State(self.snapshot())),
            Command::ClickCell { cell } => {
                self.game.on_cell_clicked(CellId(cell));
                None
            }
            Command::HoverCell { cell } => {
                self.game.on_cell_selected(CellId(cell));
                None
            }
            Command::LeaveCell { cell } => {
                self.game.on_cell_deselected(CellId(cell));
                None
            }
            Command::ClickUnit { unit } => {
                self.game.on_unit_clicked(UnitId(unit));
                None
            }
            Command::HoverUnit { unit } => {
                self.game.on_unit_highlighted(UnitId(unit));
                None
            }
            Command::LeaveUnit { unit } => {
                self.game.on_unit_dehighlighted(UnitId(unit));
                None
            }
            Command::Ability { index } => match self.selected_ability(index) {
                Some(ability) => {
                    self.game.unit_ability(&ability);
                    None
                }
                None => Some(Response::error(
                    format!("No ability {index} on the selected unit"),
                    Some(name),
                )),
            },
            Command::EndTurn => {
                self.game.end_turn();
                None
            }
            Command::Taunt => {
                self.game.taunt();
                None
            }
            Command::Style { delta } => {
                self.game.modify_style(delta);
                None
            }
            Command::Hash => Some(Response::StateHash {
                ticks: self.ticks,
                hash: self.game.battle().state_hash(),
            }),
            Command::Quit => Some(Response::Bye),
        };

        let mut responses = Vec::new();
        let events = self.game.battle_mut().drain_events();
        if !events.is_empty() {
            responses.push(Response::Events { events });
        }
        responses.push(reply.unwrap_or_else(|| Response::ack(name)));
        if self.auto_state && matches!(command, Command::Tick { .. }) {
            responses.push(Response::State(self.snapshot()));
        }
        if self.game.is_over() && !self.reported_over {
            self.reported_over = true;
            let battle = self.game.battle();
            responses.push(Response::GameOver {
                winner: battle.winner(),
                turns: battle.turn(),
            });
        }
        responses
    }

    /// Read commands from `input` until EOF or `quit`, writing responses to
    /// `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        let battle = self.game.battle();
        let ready = Response::ready(battle.turn(), battle.current_player());
        output.write_all(ready.to_json_line().as_bytes())?;
        let events = self.game.battle_mut().drain_events();
        if !events.is_empty() {
            output.write_all(Response::Events { events }.to_json_line().as_bytes())?;
        }
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Command::from_json(line) {
                Ok(command) => {
                    debug!(cmd = command.name(), "Command");
                    for response in self.handle(&command) {
                        output.write_all(response.to_json_line().as_bytes())?;
                    }
                    if command == Command::Quit {
                        output.flush()?;
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Unparseable command");
                    let error = Response::error(format!("Parse error: {e}"), None);
                    output.write_all(error.to_json_line().as_bytes())?;
                }
            }
            output.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::from_ron_str;
    use tactics_core::events::BattleEvent;
    use tactics_core::unit_state::UnitState;

    const DUEL: &str = r#"
ScenarioData(
    name: "Duel",
    map: MapData(width: 6, height: 1),
    units: {
        "fencer": UnitData(
            name: "Fencer",
            stats: StatBlock(hit_points: 10, attack: 2, movement_points: 3),
            abilities: [UnitAbility(name: "Lunge", attack_factor: 20, attack_range: 1)],
        ),
    },
    placements: [
        Placement(template: "fencer", player: 0, column: 0, row: 0),
        Placement(template: "fencer", player: 1, column: 3, row: 0),
    ],
    players: [
        PlayerSlot(number: 0, controller: Human),
        PlayerSlot(number: 1, controller: Human),
    ],
)
"#;

    fn duel() -> Session {
        Session::new(&from_ron_str(DUEL).unwrap(), SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_select_move_and_strike() {
        let mut session = duel();
        session.game.battle_mut().drain_events();

        let responses = session.handle(&Command::ClickUnit { unit: 0 });
        assert_eq!(
            responses[0],
            Response::Events {
                events: vec![BattleEvent::UnitSelected { unit: UnitId(0) }]
            }
        );
        assert_eq!(responses[1], Response::ack("click_unit"));

        let state = session.snapshot();
        assert_eq!(state.grid_state, "unit_selected");
        assert_eq!(state.selected, Some(0));
        assert_eq!(state.reachable, vec![1, 2]);

        session.handle(&Command::ClickCell { cell: 2 });
        session.handle(&Command::Ability { index: 0 });
        let unit = session.game().battle().unit(UnitId(1)).unwrap();
        assert_eq!(unit.state(), UnitState::ReachableEnemy);

        let responses = session.handle(&Command::ClickUnit { unit: 1 });
        assert_eq!(
            responses.last(),
            Some(&Response::GameOver {
                winner: Some(0),
                turns: 0
            })
        );

        // Reported once.
        let responses = session.handle(&Command::Query);
        assert!(!responses
            .iter()
            .any(|r| matches!(r, Response::GameOver { .. })));
    }

    #[test]
    fn test_ability_without_selection_is_an_error() {
        let mut session = duel();
        let responses = session.handle(&Command::Ability { index: 0 });
        assert!(matches!(
            responses.last(),
            Some(Response::Error { cmd: Some(cmd), .. }) if cmd == "ability"
        ));
    }

    #[test]
    fn test_end_turn_hands_over() {
        let mut session = duel();
        session.handle(&Command::EndTurn);
        let state = session.snapshot();
        assert_eq!(state.current_player, 1);
        assert_eq!(state.turn, 1);
        assert_eq!(state.grid_state, "waiting_for_input");
    }

    #[test]
    fn test_run_over_json_lines() {
        let mut session = Session::new(
            &from_ron_str(DUEL).unwrap(),
            SessionConfig {
                tick_millis: 100,
                auto_state: true,
            },
        )
        .unwrap();
        let input = b"{\"cmd\":\"tick\",\"count\":2}\nnot json\n\n{\"cmd\":\"quit\"}\n{\"cmd\":\"query\"}\n";
        let mut output = Vec::new();
        session.run(&input[..], &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert!(lines[0].contains(r#""type":"ready""#));
        assert!(lines[1].contains(r#""type":"events""#));
        assert!(lines[1].contains("GameStarted"));
        assert!(lines[2].contains(r#""cmd":"tick""#));
        assert!(lines[3].contains(r#""type":"state""#));
        assert!(lines[4].contains("Parse error"));
        assert!(lines[5].contains(r#""type":"bye""#));
        assert_eq!(lines.len(), 6);
        assert_eq!(session.ticks(), 2);
    }
}
