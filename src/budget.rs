//! # Budget Controller
//!
//! Wraps every policy evaluation with the termination checks: a finished game
//! replays its submission, an exhausted wall-clock or move budget submits
//! right away, and any failure inside the policy (error or panic) degrades to
//! submitting what is known instead of failing the request.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{BudgetConfig, PolicyConfig};
use crate::grid::Direction;
use crate::policy::{self, Action};
use crate::session::Session;

/// The next instruction for the game server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Scan { agent: String },
    Move { agent: String, direction: Direction },
    Submit { walls: Vec<String> },
}

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitReason {
    AlreadyFinished,
    Deadline,
    MoveBudget,
    Policy,
    PolicyFailure,
}

#[derive(Clone, Debug)]
pub struct BudgetController {
    policy: PolicyConfig,
    request_time_budget: Duration,
}

impl BudgetController {
    pub fn new(policy: PolicyConfig, budget: &BudgetConfig) -> Self {
        Self {
            policy,
            request_time_budget: budget.request_time_budget(),
        }
    }

    fn out_of_time(&self, started_at: Instant) -> bool {
        started_at.elapsed() >= self.request_time_budget
    }

    /// Decides the next action for `session`. `started_at` is when the
    /// current request arrived.
    pub fn decide(&self, session: &mut Session, started_at: Instant) -> Decision {
        if session.terminal {
            return submit(session, SubmitReason::AlreadyFinished);
        }
        if self.out_of_time(started_at) {
            return submit(session, SubmitReason::Deadline);
        }
        if session.move_count >= session.move_budget {
            return submit(session, SubmitReason::MoveBudget);
        }

        let action = match self.evaluate(session) {
            Ok(action) => action,
            Err(e) => {
                warn!(game_id = %session.id, error = %e, "policy failed, submitting");
                return submit(session, SubmitReason::PolicyFailure);
            }
        };
        if self.out_of_time(started_at) {
            warn!(
                game_id = %session.id,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "policy overran the request budget, submitting"
            );
            return submit(session, SubmitReason::Deadline);
        }
        match action {
            Action::Scan { agent } => Decision::Scan { agent },
            Action::Move { agent, direction } => Decision::Move { agent, direction },
            Action::Submit => submit(session, SubmitReason::Policy),
        }
    }

    /// The only place where policy failures are caught.
    fn evaluate(&self, session: &Session) -> Result<Action, String> {
        let state = session.policy_state();
        match panic::catch_unwind(AssertUnwindSafe(|| {
            policy::choose_action(&state, &self.policy)
        })) {
            Ok(Ok(action)) => Ok(action),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "policy panicked".to_string())),
        }
    }
}

impl Default for BudgetController {
    fn default() -> Self {
        Self::new(PolicyConfig::default(), &BudgetConfig::default())
    }
}

fn submit(session: &mut Session, reason: SubmitReason) -> Decision {
    let walls = session.finish();
    if reason != SubmitReason::AlreadyFinished {
        info!(
            game_id = %session.id,
            ?reason,
            walls = walls.len(),
            num_walls = session.wall_budget,
            moves = session.move_count,
            "submitting"
        );
    }
    Decision::Submit { walls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Pos;
    use crate::session::{Agent, InitData};

    fn session(wall_budget: i64, agents: Vec<Agent>) -> Session {
        Session::new(
            "g",
            InitData {
                grid_size: 10,
                wall_budget,
                agents,
            },
        )
    }

    fn crow(x: i64, y: i64) -> Agent {
        Agent {
            id: "c".into(),
            pos: Pos::new(x, y),
        }
    }

    #[test]
    fn finished_games_replay_their_submission() {
        let bc = BudgetController::new(PolicyConfig::default(), &BudgetConfig::default());
        let mut s = session(0, vec![crow(0, 0)]);
        assert_eq!(
            bc.decide(&mut s, Instant::now()),
            Decision::Submit { walls: vec![] }
        );
        assert!(s.terminal);
        s.wall_budget = 5;
        assert_eq!(
            bc.decide(&mut s, Instant::now()),
            Decision::Submit { walls: vec![] }
        );
    }

    #[test]
    fn deadline_short_circuits_the_policy() {
        let bc = BudgetController::new(
            PolicyConfig::default(),
            &BudgetConfig {
                request_time_budget_ms: 0,
            },
        );
        let mut s = session(3, vec![crow(0, 0)]);
        s.knowledge.mark_wall(Pos::new(4, 4));
        assert_eq!(
            bc.decide(&mut s, Instant::now()),
            Decision::Submit {
                walls: vec!["4-4".into()]
            }
        );
    }

    #[test]
    fn move_budget_is_enforced() {
        let bc = BudgetController::default();
        let mut s = session(3, vec![crow(0, 0)]);
        s.move_count = s.move_budget;
        assert!(matches!(
            bc.decide(&mut s, Instant::now()),
            Decision::Submit { .. }
        ));
    }

    #[test]
    fn policy_failure_degrades_to_submit() {
        let bc = BudgetController::new(PolicyConfig::default(), &BudgetConfig::default());
        let mut s = session(3, vec![crow(0, 0)]);
        s.knowledge.mark_wall(Pos::new(9, 9));
        // Corrupt the state: the crow is outside the grid.
        s.agents[0].pos = Pos::new(-5, 0);
        assert_eq!(
            bc.decide(&mut s, Instant::now()),
            Decision::Submit {
                walls: vec!["9-9".into()]
            }
        );
        assert!(s.terminal);
    }

    #[test]
    fn fresh_game_scans_first() {
        let bc = BudgetController::new(PolicyConfig::default(), &BudgetConfig::default());
        let mut s = session(2, vec![crow(0, 0)]);
        assert_eq!(
            bc.decide(&mut s, Instant::now()),
            Decision::Scan { agent: "c".into() }
        );
        assert!(!s.terminal);
    }
}
