//! # Local Judge
//!
//! An in-process stand-in for the Fog of Wall game server. It owns a hidden
//! layout, answers scans and moves the way the real server does, and scores
//! the final submission. [`play`] drives a complete game against any
//! [`Player`], either the in-process service or a remote agent over HTTP.

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::grid::{Direction, Marker, Pos, SCAN_RADIUS, Snapshot};
use crate::mapgen::random::{self, Layout};
use crate::protocol::{GameRequest, GameResponse, PreviousAction, WireAction};
use crate::service::FogService;

/// Something that answers game requests.
pub trait Player {
    fn respond(&mut self, req: &GameRequest) -> Result<GameResponse>;
}

impl Player for &FogService {
    fn respond(&mut self, req: &GameRequest) -> Result<GameResponse> {
        Ok(self.handle(req, Instant::now())?)
    }
}

pub struct LocalJudge {
    game_id: String,
    grid_size: i64,
    walls: BTreeSet<Pos>,
    crows: Vec<(String, Pos)>,
    actions: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub found: usize,
    pub wrong: usize,
    pub missed: usize,
    pub actions: u64,
}

impl Verdict {
    pub fn is_perfect(&self) -> bool {
        self.wrong == 0 && self.missed == 0
    }
}

impl LocalJudge {
    pub fn new(game_id: &str, layout: Layout) -> Self {
        let crows = layout
            .crows
            .iter()
            .enumerate()
            .map(|(i, &p)| (format!("crow{}", i + 1), p))
            .collect();
        Self {
            game_id: game_id.to_string(),
            grid_size: layout.grid_size,
            walls: layout.walls,
            crows,
            actions: 0,
        }
    }

    pub fn random(
        game_id: &str,
        grid_size: i64,
        num_walls: usize,
        num_crows: usize,
        seed: u64,
    ) -> Self {
        Self::new(
            game_id,
            random::generate(grid_size, num_walls, num_crows, Some(seed)),
        )
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn actions(&self) -> u64 {
        self.actions
    }

    pub fn test_case(&self) -> Value {
        json!({
            "length_of_grid": self.grid_size,
            "num_of_walls": self.walls.len(),
            "crows": self
                .crows
                .iter()
                .map(|(id, p)| json!({"id": id, "x": p.x, "y": p.y}))
                .collect_vec(),
        })
    }

    fn crow(&self, crow_id: &str) -> Result<Pos> {
        self.crows
            .iter()
            .find(|(id, _)| id == crow_id)
            .map(|&(_, p)| p)
            .with_context(|| format!("unknown crow: {}", crow_id))
    }

    /// The 5x5 view around a crow: `W` wall, `_` empty, `X` outside the
    /// grid, `C` the crow itself.
    pub fn scan(&mut self, crow_id: &str) -> Result<Snapshot> {
        let at = self.crow(crow_id)?;
        self.actions += 1;
        let snapshot = (-SCAN_RADIUS..=SCAN_RADIUS)
            .map(|dy| {
                (-SCAN_RADIUS..=SCAN_RADIUS)
                    .map(|dx| {
                        let p = at.offset(dx, dy);
                        if p == at {
                            "C"
                        } else if !p.in_bounds(self.grid_size) {
                            Marker::Other.symbol()
                        } else if self.walls.contains(&p) {
                            Marker::Wall.symbol()
                        } else {
                            Marker::Empty.symbol()
                        }
                        .to_string()
                    })
                    .collect()
            })
            .collect();
        Ok(snapshot)
    }

    /// Moves a crow one cell. Walls and the border block the move and the
    /// crow stays where it is.
    pub fn step(&mut self, crow_id: &str, dir: Direction) -> Result<Pos> {
        let at = self.crow(crow_id)?;
        self.actions += 1;
        let to = at.step(dir);
        let end = if to.in_bounds(self.grid_size) && !self.walls.contains(&to) {
            to
        } else {
            at
        };
        if let Some(slot) = self.crows.iter_mut().find(|(id, _)| id == crow_id) {
            slot.1 = end;
        }
        Ok(end)
    }

    pub fn score(&self, submission: &[String]) -> Result<Verdict> {
        let submitted: BTreeSet<Pos> = submission
            .iter()
            .map(|s| s.parse::<Pos>())
            .collect::<Result<_, _>>()
            .context("invalid submission")?;
        if submitted.len() != submission.len() {
            bail!("submission contains duplicates");
        }
        let found = submitted.intersection(&self.walls).count();
        Ok(Verdict {
            found,
            wrong: submitted.len() - found,
            missed: self.walls.len() - found,
            actions: self.actions,
        })
    }
}

/// Plays one full game and returns the judge's verdict.
///
/// Fails if the player errors, names an unknown crow, or has not submitted
/// after `max_requests` requests.
pub fn play<P: Player>(
    judge: &mut LocalJudge,
    mut player: P,
    max_requests: usize,
) -> Result<Verdict> {
    let mut req = GameRequest {
        challenger_id: Some("local".to_string()),
        game_id: Some(judge.game_id().to_string()),
        test_case: Some(judge.test_case()),
        previous_action: None,
    };
    for _ in 0..max_requests {
        let resp = player.respond(&req)?;
        let prev = match resp.action {
            WireAction::Scan { crow_id } => {
                let snapshot = judge.scan(&crow_id)?;
                PreviousAction {
                    crow_id: Some(crow_id),
                    your_action: Some("scan".to_string()),
                    move_result: None,
                    scan_result: Some(serde_json::to_value(snapshot)?),
                }
            }
            WireAction::Move { crow_id, direction } => {
                let end = judge.step(&crow_id, direction)?;
                debug!(crow_id = %crow_id, %direction, to = %end, "moved");
                PreviousAction {
                    crow_id: Some(crow_id),
                    your_action: Some("move".to_string()),
                    move_result: Some(json!([end.x, end.y])),
                    scan_result: None,
                }
            }
            WireAction::Submit { submission } => {
                let verdict = judge.score(&submission)?;
                info!(game_id = judge.game_id(), ?verdict, "game over");
                return Ok(verdict);
            }
        };
        req = GameRequest {
            test_case: None,
            previous_action: Some(prev),
            ..req
        };
    }
    bail!("no submission after {} requests", max_requests)
}
