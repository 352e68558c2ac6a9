//! # Sensor Fusion
//!
//! Applies the outcome of the previously issued action to a session. The
//! environment is authoritative: reported positions are taken as-is and
//! never re-simulated locally. Malformed outcomes are logged and ignored,
//! but still count against the move budget.

use serde_json::Value;
use tracing::{debug, warn};

use crate::grid::{Marker, Pos, SCAN_RADIUS, SCAN_SIZE, Snapshot};
use crate::session::{MoveRecord, Session, coerce_int};

/// Outcome of applying a sensor or move result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The result was merged into the session's knowledge.
    Merged { new_walls: usize },
    /// The result was rejected; only the move counter advanced.
    Ignored,
}

/// Validates the raw `scan_result` payload as a `SCAN_SIZE` square of strings.
/// Non-string cells become unreadable markers.
pub fn parse_snapshot(raw: &Value) -> Option<Snapshot> {
    let rows = raw.as_array()?;
    if rows.len() != SCAN_SIZE {
        return None;
    }
    rows.iter()
        .map(|row| {
            let cells = row.as_array()?;
            (cells.len() == SCAN_SIZE).then(|| {
                cells
                    .iter()
                    .map(|c| c.as_str().unwrap_or(Marker::Other.symbol()).to_string())
                    .collect()
            })
        })
        .collect()
}

/// Parses a `move_result` payload: `[x, y]` or `{"x": .., "y": ..}`.
pub fn parse_position(raw: &Value) -> Option<Pos> {
    let (x, y) = match raw {
        Value::Array(xy) if xy.len() == 2 => (&xy[0], &xy[1]),
        Value::Object(obj) => (obj.get("x")?, obj.get("y")?),
        _ => return None,
    };
    // Only numbers are accepted here, unlike the lenient initialization.
    if !x.is_number() || !y.is_number() {
        return None;
    }
    Some(Pos::new(coerce_int(x)?, coerce_int(y)?))
}

/// Merges a scan taken by `agent_id` at its current position.
pub fn apply_scan(session: &mut Session, agent_id: &str, snapshot: Option<Snapshot>) -> Applied {
    session.tick();
    let Some(at) = session.agent(agent_id).map(|a| a.pos) else {
        warn!(game_id = %session.id, agent = agent_id, "scan result for unknown crow");
        return Applied::Ignored;
    };
    let Some(snapshot) = snapshot.filter(|s| {
        s.len() == SCAN_SIZE && s.iter().all(|row| row.len() == SCAN_SIZE)
    }) else {
        warn!(game_id = %session.id, agent = agent_id, "malformed scan result");
        return Applied::Ignored;
    };

    let knowledge = &mut session.knowledge;
    knowledge.mark_occupied(at);
    let mut new_walls = 0;
    for (i, row) in snapshot.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let pos = at.offset(j as i64 - SCAN_RADIUS, i as i64 - SCAN_RADIUS);
            if pos == at {
                continue;
            }
            match Marker::parse(cell) {
                Marker::Wall => new_walls += knowledge.mark_wall(pos) as usize,
                Marker::Empty => {
                    knowledge.mark_explored(pos);
                }
                Marker::Other => {}
            }
        }
    }
    knowledge.cache_scan(at, snapshot);
    debug!(
        game_id = %session.id,
        agent = agent_id,
        pos = %at,
        new_walls,
        walls = session.knowledge.num_walls(),
        "scan merged"
    );
    Applied::Merged { new_walls }
}

/// Moves `agent_id` to the position reported by the environment.
pub fn apply_move(session: &mut Session, agent_id: &str, new_position: Option<Pos>) -> Applied {
    session.tick();
    let grid_size = session.grid_size;
    let Some(to) = new_position.filter(|p| p.in_bounds(grid_size)) else {
        warn!(game_id = %session.id, agent = agent_id, ?new_position, "invalid move result");
        return Applied::Ignored;
    };
    let Some(agent) = session.agent_mut(agent_id) else {
        warn!(game_id = %session.id, agent = agent_id, "move result for unknown crow");
        return Applied::Ignored;
    };
    let from = std::mem::replace(&mut agent.pos, to);
    session.knowledge.mark_occupied(to);
    session.record_move(MoveRecord {
        agent: agent_id.to_string(),
        from,
        to,
    });
    debug!(game_id = %session.id, agent = agent_id, %from, %to, "crow moved");
    Applied::Merged { new_walls: 0 }
}
