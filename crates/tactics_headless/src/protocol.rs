//! JSON protocol for interactive sessions.
//!
//! One JSON object per line in both directions:
//!
//! **Input (stdin):** host input for the human players
//! **Output (stdout):** acknowledgements, battle events and state
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","turn":0,"current_player":0}
//! -> {"cmd":"click_unit","unit":0}
//! <- {"type":"events","events":[{"UnitSelected":{"unit":0}}]}
//! <- {"type":"ack","cmd":"click_unit"}
//! -> {"cmd":"click_cell","cell":3}
//! -> {"cmd":"end_turn"}
//! -> {"cmd":"tick","count":40}
//! -> {"cmd":"query"}
//! <- {"type":"state","turn":2,...}
//! ```

use serde::{Deserialize, Serialize};
use tactics_core::events::BattleEvent;
use tactics_core::player::PlayerNumber;
use tactics_core::unit::Unit;
use tactics_core::unit_state::UnitState;

/// Commands accepted by an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the battle by N host ticks (default: 1).
    Tick {
        /// Number of ticks.
        #[serde(default = "default_tick_count")]
        count: u32,
    },
    /// Report the current state without advancing time.
    Query,
    /// Click a cell.
    ClickCell {
        /// Cell id.
        cell: u32,
    },
    /// Move the cursor onto a cell.
    HoverCell {
        /// Cell id.
        cell: u32,
    },
    /// Move the cursor off a cell.
    LeaveCell {
        /// Cell id.
        cell: u32,
    },
    /// Click a unit.
    ClickUnit {
        /// Unit id.
        unit: u32,
    },
    /// Move the cursor onto a unit.
    HoverUnit {
        /// Unit id.
        unit: u32,
    },
    /// Move the cursor off a unit.
    LeaveUnit {
        /// Unit id.
        unit: u32,
    },
    /// Arm one of the selected unit's abilities, by menu index.
    Ability {
        /// Index into the unit's ability list.
        index: usize,
    },
    /// Hand the turn to the next living player.
    EndTurn,
    /// Taunt the opponent.
    Taunt,
    /// Change the style meter.
    Style {
        /// Signed change.
        delta: i32,
    },
    /// Report the battle state hash.
    Hash,
    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for acknowledgements.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::ClickCell { .. } => "click_cell",
            Self::HoverCell { .. } => "hover_cell",
            Self::LeaveCell { .. } => "leave_cell",
            Self::ClickUnit { .. } => "click_unit",
            Self::HoverUnit { .. } => "hover_unit",
            Self::LeaveUnit { .. } => "leave_unit",
            Self::Ability { .. } => "ability",
            Self::EndTurn => "end_turn",
            Self::Taunt => "taunt",
            Self::Style { .. } => "style",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

/// Responses written by an interactive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Completed turns.
        turn: u32,
        /// Player to move.
        current_player: PlayerNumber,
    },
    /// Acknowledgement of a command.
    Ack {
        /// Command name.
        cmd: String,
    },
    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if it parsed.
        cmd: Option<String>,
    },
    /// Events raised while handling the last command.
    Events {
        /// Events in raise order.
        events: Vec<BattleEvent>,
    },
    /// Current battle state.
    State(StateSnapshot),
    /// The battle is decided.
    GameOver {
        /// Surviving player.
        winner: Option<PlayerNumber>,
        /// Completed turns.
        turns: u32,
    },
    /// State hash for determinism checks.
    StateHash {
        /// Host ticks played.
        ticks: u64,
        /// Battle state hash.
        hash: u64,
    },
    /// Goodbye message before shutdown.
    Bye,
}

/// Battle state as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Completed turns.
    pub turn: u32,
    /// Player to move.
    pub current_player: PlayerNumber,
    /// Grid input mode: `waiting_for_input`, `unit_selected` or `turn_changing`.
    pub grid_state: String,
    /// Selected unit, if any.
    pub selected: Option<u32>,
    /// Destinations of the selected unit.
    pub reachable: Vec<u32>,
    /// Living units.
    pub units: Vec<UnitSnapshot>,
    /// Style meter.
    pub style_points: u32,
    /// Battle state hash.
    pub hash: u64,
}

/// A living unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Owning player.
    pub player: PlayerNumber,
    /// Occupied cell.
    pub cell: u32,
    /// Hit points left.
    pub hit_points: i32,
    /// Movement points left.
    pub movement_points: u32,
    /// Action points left.
    pub action_points: u32,
    /// Lifecycle state.
    pub state: UnitState,
    /// Whether it may act this turn.
    pub ready: bool,
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id().0,
            name: unit.name().to_string(),
            player: unit.player(),
            cell: unit.cell().0,
            hit_points: unit.stats.hit_points,
            movement_points: unit.stats.movement_points,
            action_points: unit.stats.action_points,
            state: unit.state(),
            ready: unit.is_ready(),
        }
    }
}

impl Response {
    /// Create a ready response.
    pub fn ready(turn: u32, current_player: PlayerNumber) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            turn,
            current_player,
        }
    }

    /// Create an acknowledgement.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_click_cell() {
        let cmd = Command::from_json(r#"{"cmd":"click_cell","cell":12}"#).unwrap();
        assert_eq!(cmd, Command::ClickCell { cell: 12 });
        assert_eq!(cmd.name(), "click_cell");
    }

    #[test]
    fn test_default_tick_count() {
        let cmd = Command::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 1 });
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::from_json(r#"{"cmd":"teleport","unit":1}"#).is_err());
    }

    #[test]
    fn test_serialize_events_response() {
        let resp = Response::Events {
            events: vec![BattleEvent::GameStarted],
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"events""#));
        assert!(json.contains("GameStarted"));
    }

    #[test]
    fn test_serialize_state_response() {
        let resp = Response::State(StateSnapshot {
            turn: 3,
            current_player: 1,
            grid_state: "waiting_for_input".to_string(),
            selected: None,
            reachable: vec![],
            units: vec![],
            style_points: 0,
            hash: 42,
        });
        let json = resp.to_json_line();
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""turn":3"#));
        assert!(json.contains(r#""hash":42"#));
    }
}
