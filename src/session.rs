//! # Game Sessions
//!
//! A `Session` is one independent Fog of Wall game: the grid dimensions, the
//! crows and everything learned so far. Sessions are created from the
//! `test_case` payload of the first request and are owned by the
//! [`SessionRegistry`](crate::registry::SessionRegistry).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{FogError, Result};
use crate::grid::Pos;
use crate::knowledge::Knowledge;
use crate::policy::PolicyState;

pub const MIN_GRID_SIZE: i64 = 10;
/// Larger grids are clamped so that coordinate arithmetic cannot overflow.
pub const MAX_GRID_SIZE: i64 = 10_000;
pub const MIN_MOVE_BUDGET: u64 = 20;
pub const MAX_MOVE_BUDGET: u64 = 50;
/// Length of the rolling move history.
pub const RECENT_MOVES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub id: String,
    pub pos: Pos,
}

/// Validated contents of a `test_case` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitData {
    pub grid_size: i64,
    pub wall_budget: i64,
    pub agents: Vec<Agent>,
}

impl InitData {
    /// Parses and validates a `test_case` payload.
    ///
    /// Unusable crows are skipped; an unusable grid size or wall count falls
    /// back to its default. Fails when no crow survives.
    pub fn from_json(test_case: Option<&Value>) -> Result<Self> {
        let test_case = match test_case {
            None | Some(Value::Null) => {
                return Err(FogError::InvalidInitialization(
                    "test_case cannot be empty".to_string(),
                ));
            }
            Some(Value::String(s)) if s == "null" => {
                return Err(FogError::InvalidInitialization(
                    "test_case cannot be empty".to_string(),
                ));
            }
            Some(v) => v,
        };
        let obj = test_case.as_object().ok_or_else(|| {
            FogError::InvalidInitialization(format!(
                "test_case must be an object, got {}",
                json_type(test_case)
            ))
        })?;

        let grid_size = match obj.get("length_of_grid") {
            None => MIN_GRID_SIZE,
            Some(v) => match coerce_int(v) {
                Some(n) if n > 0 => n,
                _ => {
                    warn!(value = %v, "invalid length_of_grid, using default");
                    MIN_GRID_SIZE
                }
            },
        };
        let grid_size = if grid_size > MAX_GRID_SIZE {
            warn!(grid_size, max = MAX_GRID_SIZE, "length_of_grid too large, clamping");
            MAX_GRID_SIZE
        } else {
            grid_size.max(MIN_GRID_SIZE)
        };

        let wall_budget = match obj.get("num_of_walls") {
            None => 0,
            Some(v) => match coerce_int(v) {
                Some(n) if n >= 0 => n,
                _ => {
                    warn!(value = %v, "invalid num_of_walls, using 0");
                    0
                }
            },
        };

        let crows = match obj.get("crows") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(crows)) => &crows[..],
            Some(other) => {
                return Err(FogError::InvalidInitialization(format!(
                    "crows must be a list, got {}",
                    json_type(other)
                )));
            }
        };

        let mut agents: Vec<Agent> = Vec::with_capacity(crows.len());
        for (i, crow) in crows.iter().enumerate() {
            let Some(agent) = parse_agent(crow, grid_size) else {
                warn!(index = i, crow = %crow, "skipping unusable crow");
                continue;
            };
            // A repeated id keeps its first slot and takes the latest position.
            match agents.iter_mut().find(|a| a.id == agent.id) {
                Some(existing) => existing.pos = agent.pos,
                None => agents.push(agent),
            }
        }
        if agents.is_empty() {
            return Err(FogError::InvalidInitialization(
                "no valid crows found in test_case".to_string(),
            ));
        }

        Ok(Self {
            grid_size,
            wall_budget,
            agents,
        })
    }
}

fn parse_agent(crow: &Value, grid_size: i64) -> Option<Agent> {
    let obj = crow.as_object()?;
    let id = match obj.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let pos = Pos::new(coerce_int(obj.get("x")?)?, coerce_int(obj.get("y")?)?);
    pos.in_bounds(grid_size).then_some(Agent { id, pos })
}

/// Integer coercion accepted for coordinates and sizes: integers, finite
/// floats (truncated) and decimal strings.
pub fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// `clamp(20, 50, 2 * wall_budget)`.
pub fn move_budget_for(wall_budget: i64) -> u64 {
    (wall_budget.max(0) as u64)
        .saturating_mul(2)
        .clamp(MIN_MOVE_BUDGET, MAX_MOVE_BUDGET)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub agent: String,
    pub from: Pos,
    pub to: Pos,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub grid_size: i64,
    pub wall_budget: i64,
    pub agents: Vec<Agent>,
    pub knowledge: Knowledge,
    pub move_count: u64,
    pub move_budget: u64,
    pub recent_moves: VecDeque<MoveRecord>,
    pub terminal: bool,
    /// Set together with `terminal`.
    pub last_submission: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: &str, init: InitData) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            grid_size: init.grid_size,
            wall_budget: init.wall_budget,
            agents: init.agents,
            knowledge: Knowledge::new(init.grid_size),
            move_count: 0,
            move_budget: move_budget_for(init.wall_budget),
            recent_moves: VecDeque::with_capacity(RECENT_MOVES),
            terminal: false,
            last_submission: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    pub fn agent_mut(&mut self, agent_id: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == agent_id)
    }

    /// Counts one processed action against the budget.
    pub fn tick(&mut self) {
        self.move_count += 1;
        self.updated_at = Utc::now();
    }

    pub fn record_move(&mut self, record: MoveRecord) {
        if self.recent_moves.len() == RECENT_MOVES {
            self.recent_moves.pop_front();
        }
        self.recent_moves.push_back(record);
    }

    pub fn is_complete(&self) -> bool {
        self.knowledge.num_walls() as i64 >= self.wall_budget
    }

    /// Freezes the session and returns the submitted walls.
    pub fn finish(&mut self) -> Vec<String> {
        if let Some(submission) = &self.last_submission {
            return submission.clone();
        }
        let submission = self.knowledge.submission();
        self.terminal = true;
        self.last_submission = Some(submission.clone());
        self.updated_at = Utc::now();
        submission
    }

    pub fn policy_state(&self) -> PolicyState<'_, Knowledge> {
        PolicyState {
            knowledge: &self.knowledge,
            agents: &self.agents,
            wall_budget: self.wall_budget,
            move_count: self.move_count,
        }
    }

    pub fn stats(&self) -> SessionStats {
        let walls = self.knowledge.num_walls();
        SessionStats {
            walls_discovered: walls,
            total_walls: self.wall_budget,
            cells_explored: self.knowledge.num_explored(),
            move_count: self.move_count,
            move_budget: self.move_budget,
            completion_percentage: if self.wall_budget == 0 {
                100.0
            } else {
                walls as f64 / self.wall_budget as f64 * 100.0
            },
            terminal: self.terminal,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionStats {
    pub walls_discovered: usize,
    pub total_walls: i64,
    pub cells_explored: usize,
    pub move_count: u64,
    pub move_budget: u64,
    pub completion_percentage: f64,
    pub terminal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
