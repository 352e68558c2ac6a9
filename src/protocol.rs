//! # Wire Protocol
//!
//! JSON payloads exchanged with the Fog of Wall game server on
//! `POST /fog-of-wall`.
//!
//! The first request of a game carries a `test_case`; every later one
//! carries the outcome of the action we asked for in `previous_action`.
//! Outcomes are kept as raw JSON so that a malformed sensor reading only
//! spoils that reading, not the whole request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::budget::Decision;
use crate::grid::Direction;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRequest {
    #[serde(default)]
    pub challenger_id: Option<String>,
    #[serde(default, alias = "session_id")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_action: Option<PreviousAction>,
}

impl GameRequest {
    /// `test_case` counts as present unless it is missing, `null` or `"null"`.
    pub fn init_payload(&self) -> Option<&Value> {
        match &self.test_case {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "null" => None,
            Some(v) => Some(v),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousAction {
    #[serde(default)]
    pub crow_id: Option<String>,
    #[serde(default)]
    pub your_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_result: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResponse {
    pub challenger_id: String,
    pub game_id: String,
    #[serde(flatten)]
    pub action: WireAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "lowercase")]
pub enum WireAction {
    Scan { crow_id: String },
    Move { crow_id: String, direction: Direction },
    Submit { submission: Vec<String> },
}

impl From<Decision> for WireAction {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Scan { agent } => WireAction::Scan { crow_id: agent },
            Decision::Move { agent, direction } => WireAction::Move {
                crow_id: agent,
                direction,
            },
            Decision::Submit { walls } => WireAction::Submit { submission: walls },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
