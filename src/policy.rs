//! # Exploration Policy
//!
//! Chooses the next action of a game from what is currently known. The
//! policy is a pure function of a [`PolicyState`]; it never mutates the
//! session and never looks at the clock.
//!
//! Decision order, first applicable wins:
//! 1. all walls found: submit;
//! 2. `move_count` reached `min(grid_size^2, wall_budget * multiplier)`: submit;
//! 3. the best unscanned agent position is worth scanning: scan;
//! 4. the best single step of any agent: move;
//! 5. some agent stands on an unscanned position: scan there;
//! 6. submit.

use thiserror::Error;
use tracing::debug;

use crate::SetMinMax;
use crate::config::PolicyConfig;
use crate::grid::{Direction, GridKnowledge, Pos};
use crate::session::Agent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Scan { agent: String },
    Move { agent: String, direction: Direction },
    Submit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("session has no agents")]
    NoAgents,
    #[error("agent {agent} is outside the grid at {pos:?}")]
    AgentOutOfGrid { agent: String, pos: Pos },
}

/// Everything the policy reads.
pub struct PolicyState<'a, K> {
    pub knowledge: &'a K,
    pub agents: &'a [Agent],
    pub wall_budget: i64,
    pub move_count: u64,
}

/// `min(grid_size^2, wall_budget * multiplier)`.
pub fn reasonable_limit(grid_size: i64, wall_budget: i64, config: &PolicyConfig) -> u64 {
    let cells = grid_size.saturating_mul(grid_size);
    let thorough = wall_budget.saturating_mul(config.wall_multiplier);
    cells.min(thorough).max(0) as u64
}

pub fn choose_action<K: GridKnowledge>(
    state: &PolicyState<'_, K>,
    config: &PolicyConfig,
) -> Result<Action, PolicyError> {
    let k = state.knowledge;
    let n = k.grid_size();
    if state.agents.is_empty() {
        return Err(PolicyError::NoAgents);
    }
    if let Some(a) = state.agents.iter().find(|a| !a.pos.in_bounds(n)) {
        return Err(PolicyError::AgentOutOfGrid {
            agent: a.id.clone(),
            pos: a.pos,
        });
    }

    let walls_found = k.walls_found();
    if walls_found as i64 >= state.wall_budget {
        debug!(walls_found, wall_budget = state.wall_budget, "all walls found");
        return Ok(Action::Submit);
    }
    let limit = reasonable_limit(n, state.wall_budget, config);
    if state.move_count >= limit {
        debug!(move_count = state.move_count, limit, "move limit reached");
        return Ok(Action::Submit);
    }

    let mut best_scan: Option<(&Agent, i64)> = None;
    for agent in state.agents.iter().filter(|a| !k.is_scanned(a.pos)) {
        let value = scan_value(k, agent.pos, config);
        if best_scan.is_none_or(|(_, best)| value > best) {
            best_scan = Some((agent, value));
        }
    }
    if let Some((agent, value)) = best_scan
        && value > config.scan_threshold
    {
        debug!(agent = %agent.id, pos = %agent.pos, value, "scan");
        return Ok(Action::Scan {
            agent: agent.id.clone(),
        });
    }

    let mut best_move: Option<(&Agent, Direction)> = None;
    let mut best_score = 0;
    for agent in state.agents {
        for dir in Direction::ALL {
            let to = agent.pos.step(dir);
            if !to.in_bounds(n) || k.is_wall(to) {
                continue;
            }
            if best_score.setmax(move_score(k, to, config)) {
                best_move = Some((agent, dir));
            }
        }
    }
    if let Some((agent, direction)) = best_move {
        debug!(agent = %agent.id, from = %agent.pos, %direction, score = best_score, "move");
        return Ok(Action::Move {
            agent: agent.id.clone(),
            direction,
        });
    }

    if let Some(agent) = state.agents.iter().find(|a| !k.is_scanned(a.pos)) {
        debug!(agent = %agent.id, pos = %agent.pos, "forced scan");
        return Ok(Action::Scan {
            agent: agent.id.clone(),
        });
    }

    debug!("no productive action left");
    Ok(Action::Submit)
}

/// Expected information gain of scanning at `pos`.
///
/// Every cell not yet explored counts, known walls included. Cells far from
/// anything explored weigh more, up to
/// `max_cell_weight`. Positions near a border get `edge_bonus` since walls
/// cluster along the edges.
pub fn scan_value<K: GridKnowledge>(k: &K, pos: Pos, config: &PolicyConfig) -> i64 {
    let n = k.grid_size();
    let any_explored = k.any_explored();
    let mut value: i64 = pos
        .window()
        .filter(|&c| c.in_bounds(n) && !k.is_explored(c))
        .map(|c| {
            if any_explored {
                let reach = config.max_cell_weight - 1;
                let d = nearest_explored(k, c, reach).unwrap_or(reach);
                (1 + d).min(config.max_cell_weight)
            } else {
                config.unexplored_scan_weight
            }
        })
        .sum();
    if pos.edge_distance(n) <= config.edge_margin {
        value += config.edge_bonus;
    }
    value
}

/// Value of stepping onto `to`. Known walls score 0, revisits score
/// `revisit_score`, other cells score by how much around them is not yet
/// explored.
pub fn move_score<K: GridKnowledge>(k: &K, to: Pos, config: &PolicyConfig) -> i64 {
    let n = k.grid_size();
    if k.is_wall(to) {
        return 0;
    }
    if k.is_explored(to) {
        return config.revisit_score;
    }
    let potential = to
        .window()
        .filter(|&c| c.in_bounds(n) && !k.is_explored(c))
        .count() as i64;
    let frontier = to
        .neighbors8()
        .any(|c| c.in_bounds(n) && k.is_explored(c));
    config.base_move_score + potential + if frontier { config.frontier_bonus } else { 0 }
}

/// Manhattan distance from `from` to the closest explored cell, searching
/// diamond rings up to `max_radius`.
fn nearest_explored<K: GridKnowledge>(k: &K, from: Pos, max_radius: i64) -> Option<i64> {
    let n = k.grid_size();
    (0..=max_radius).find(|&r| {
        (-r..=r).any(|dx| {
            let dy = r - dx.abs();
            [from.offset(dx, dy), from.offset(dx, -dy)]
                .into_iter()
                .any(|c| c.in_bounds(n) && k.is_explored(c))
        })
    })
}
