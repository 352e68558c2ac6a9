//! # Game Service
//!
//! Request flow of the game endpoint: validate the payload, create or fetch
//! the session, merge the outcome of the previous action, then let the
//! budget controller pick the next action.

use std::time::Instant;

use tracing::{info, warn};

use crate::budget::BudgetController;
use crate::config::Config;
use crate::error::{FogError, Result};
use crate::protocol::{GameRequest, GameResponse, PreviousAction};
use crate::registry::{SessionRegistry, lock_session};
use crate::sensor;
use crate::session::{InitData, Session, SessionStats};

pub struct FogService {
    registry: SessionRegistry,
    controller: BudgetController,
}

impl FogService {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: SessionRegistry::new(&config.registry),
            controller: BudgetController::new(config.policy.clone(), &config.budget),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handles one request. `started_at` is when the request arrived and
    /// anchors the per-request time budget.
    pub fn handle(&self, req: &GameRequest, started_at: Instant) -> Result<GameResponse> {
        let (challenger_id, game_id) = match (non_empty(&req.challenger_id), non_empty(&req.game_id)) {
            (Some(c), Some(g)) => (c, g),
            _ => {
                return Err(FogError::MalformedRequest(
                    "missing challenger_id or game_id".to_string(),
                ));
            }
        };

        let decision = if let Some(test_case) = req.init_payload() {
            let init = InitData::from_json(Some(test_case))?;
            let handle = self.registry.replace(game_id, init);
            let mut session = lock_session(&handle);
            self.controller.decide(&mut session, started_at)
        } else {
            let prev = req.previous_action.as_ref().ok_or_else(|| {
                FogError::MalformedRequest(
                    "must provide either test_case or previous_action".to_string(),
                )
            })?;
            let (Some(action), Some(crow_id)) =
                (non_empty(&prev.your_action), non_empty(&prev.crow_id))
            else {
                return Err(FogError::MalformedRequest(
                    "missing your_action or crow_id in previous_action".to_string(),
                ));
            };
            let handle = self.registry.get(game_id)?;
            let mut session = lock_session(&handle);
            if !session.terminal {
                apply_outcome(&mut session, action, crow_id, prev);
            }
            self.controller.decide(&mut session, started_at)
        };

        info!(
            challenger_id,
            game_id,
            ?decision,
            elapsed_us = started_at.elapsed().as_micros() as u64,
            "responding"
        );
        Ok(GameResponse {
            challenger_id: challenger_id.to_string(),
            game_id: game_id.to_string(),
            action: decision.into(),
        })
    }

    pub fn stats(&self, game_id: &str) -> Result<SessionStats> {
        self.registry.stats(game_id)
    }
}

impl Default for FogService {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

fn apply_outcome(session: &mut Session, action: &str, crow_id: &str, prev: &PreviousAction) {
    match action {
        "move" => {
            let to = prev.move_result.as_ref().and_then(sensor::parse_position);
            sensor::apply_move(session, crow_id, to);
        }
        "scan" => {
            let snapshot = prev.scan_result.as_ref().and_then(sensor::parse_snapshot);
            sensor::apply_scan(session, crow_id, snapshot);
        }
        other => {
            warn!(game_id = %session.id, action = other, "unknown previous action type");
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Direction, Pos};
    use crate::protocol::WireAction;
    use serde_json::{Value, json};

    fn init(service: &FogService, test_case: Value) -> Result<GameResponse> {
        let req: GameRequest = serde_json::from_value(json!({
            "challenger_id": "team",
            "game_id": "g",
            "test_case": test_case,
        }))
        .unwrap();
        service.handle(&req, Instant::now())
    }

    fn follow_up(service: &FogService, prev: Value) -> Result<GameResponse> {
        let req: GameRequest = serde_json::from_value(json!({
            "challenger_id": "team",
            "game_id": "g",
            "previous_action": prev,
        }))
        .unwrap();
        service.handle(&req, Instant::now())
    }

    fn empty_scan() -> Value {
        json!(vec![vec!["_"; 5]; 5])
    }

    fn snapshot(s: &FogService) -> (u64, usize, usize) {
        s.registry()
            .with_session("g", |s| {
                (s.move_count, s.knowledge.num_walls(), s.knowledge.num_explored())
            })
            .unwrap()
    }

    #[test]
    fn single_crow_scans_then_keeps_exploring() {
        let s = FogService::default();
        let r = init(
            &s,
            json!({"length_of_grid": 10, "num_of_walls": 2, "crows": [{"id": "c", "x": 0, "y": 0}]}),
        )
        .unwrap();
        assert_eq!(r.action, WireAction::Scan { crow_id: "c".into() });
        assert_eq!((r.challenger_id.as_str(), r.game_id.as_str()), ("team", "g"));

        let r = follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "scan", "scan_result": empty_scan()}),
        )
        .unwrap();
        assert!(
            matches!(r.action, WireAction::Scan { .. } | WireAction::Move { .. }),
            "{:?}",
            r.action
        );
    }

    #[test]
    fn zero_walls_submits_on_the_first_request() {
        let s = FogService::default();
        let r = init(
            &s,
            json!({"length_of_grid": 10, "num_of_walls": 0, "crows": [{"id": "c", "x": 3, "y": 3}]}),
        )
        .unwrap();
        assert_eq!(r.action, WireAction::Submit { submission: vec![] });
    }

    #[test]
    fn move_limit_submits_the_walls_found_so_far() {
        let s = FogService::default();
        init(
            &s,
            json!({"length_of_grid": 10, "num_of_walls": 2, "crows": [{"id": "c", "x": 5, "y": 5}]}),
        )
        .unwrap();
        // reasonable_limit = min(100, 2 * 5) = 10.
        let mut scan = vec![vec!["_"; 5]; 5];
        scan[0][0] = "W";
        follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "scan", "scan_result": scan}),
        )
        .unwrap();
        let mut last = None;
        for i in 0..8 {
            let r = follow_up(
                &s,
                json!({"crow_id": "c", "your_action": "move", "move_result": [5, 5 - (i % 2)]}),
            )
            .unwrap();
            last = Some(r.action);
        }
        assert_eq!(snapshot(&s).0, 9);
        assert!(!matches!(last, Some(WireAction::Submit { .. })));

        let r = follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "move", "move_result": [5, 5]}),
        )
        .unwrap();
        assert_eq!(
            r.action,
            WireAction::Submit {
                submission: vec!["3-3".into()]
            }
        );
        let walls: Vec<Pos> = match r.action {
            WireAction::Submit { submission } => {
                submission.iter().map(|w| w.parse().unwrap()).collect()
            }
            _ => unreachable!(),
        };
        assert_eq!(walls, vec![Pos::new(3, 3)]);
    }

    #[test]
    fn finished_games_are_frozen() {
        let s = FogService::default();
        init(
            &s,
            json!({"length_of_grid": 10, "num_of_walls": 0, "crows": [{"id": "c", "x": 3, "y": 3}]}),
        )
        .unwrap();
        let before = snapshot(&s);
        let r = follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "scan", "scan_result": empty_scan()}),
        )
        .unwrap();
        assert_eq!(r.action, WireAction::Submit { submission: vec![] });
        assert_eq!(snapshot(&s), before);
    }

    #[test]
    fn malformed_outcomes_still_count() {
        let s = FogService::default();
        init(
            &s,
            json!({"length_of_grid": 20, "num_of_walls": 9, "crows": [{"id": "c", "x": 10, "y": 10}]}),
        )
        .unwrap();
        follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "scan", "scan_result": [["_"]]}),
        )
        .unwrap();
        follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "move", "move_result": "north"}),
        )
        .unwrap();
        let (moves, walls, explored) = snapshot(&s);
        assert_eq!((moves, walls, explored), (2, 0, 0));
    }

    #[test]
    fn error_classes() {
        let s = FogService::default();
        let err = s.handle(&GameRequest::default(), Instant::now()).unwrap_err();
        assert!(matches!(err, FogError::MalformedRequest(_)));

        let err = follow_up(&s, json!({"crow_id": "c", "your_action": "scan"})).unwrap_err();
        assert_eq!(err, FogError::SessionNotFound("g".into()));
        assert_eq!(err.status_code(), 404);

        let err = follow_up(&s, json!({"your_action": "scan"})).unwrap_err();
        assert!(matches!(err, FogError::MalformedRequest(_)));

        let err = init(&s, json!({"crows": []})).unwrap_err();
        assert!(matches!(err, FogError::InvalidInitialization(_)));
        assert!(s.registry().is_empty());
    }

    #[test]
    fn reinitialization_restarts_the_game() {
        let s = FogService::default();
        let tc = json!({"length_of_grid": 10, "num_of_walls": 3, "crows": [{"id": "c", "x": 5, "y": 5}]});
        init(&s, tc.clone()).unwrap();
        follow_up(
            &s,
            json!({"crow_id": "c", "your_action": "move", "move_result": [5, 4]}),
        )
        .unwrap();
        init(&s, tc).unwrap();
        assert_eq!(snapshot(&s).0, 0);
        assert_eq!(
            s.registry()
                .with_session("g", |s| s.agents[0].pos)
                .unwrap(),
            Pos::new(5, 5)
        );
    }

    #[test]
    fn concurrent_initializations_all_start_the_game() {
        let s = std::sync::Arc::new(FogService::default());
        let tc = json!({"length_of_grid": 10, "num_of_walls": 3, "crows": [{"id": "c", "x": 5, "y": 5}]});
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let s = s.clone();
                let tc = tc.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let r = init(&s, tc.clone()).unwrap();
                        assert_eq!(r.action, WireAction::Scan { crow_id: "c".into() });
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(s.registry().len(), 1);
    }

    #[test]
    fn oversized_grids_do_not_abort_the_game() {
        let s = FogService::default();
        let r = init(
            &s,
            json!({
                "length_of_grid": i64::MAX,
                "num_of_walls": 3,
                "crows": [{"id": "far", "x": i64::MAX - 1, "y": 0}, {"id": "c", "x": 5, "y": 5}],
            }),
        )
        .unwrap();
        assert_eq!(r.action, WireAction::Scan { crow_id: "c".into() });
    }

    #[test]
    fn two_crows_get_distinct_instructions() {
        let s = FogService::default();
        let r = init(
            &s,
            json!({
                "length_of_grid": 10,
                "num_of_walls": 4,
                "crows": [{"id": "a", "x": 5, "y": 5}, {"id": "b", "x": 0, "y": 9}],
            }),
        )
        .unwrap();
        // The center crow sees more unknown cells than the corner one.
        assert_eq!(r.action, WireAction::Scan { crow_id: "a".into() });
        let r = follow_up(
            &s,
            json!({"crow_id": "a", "your_action": "scan", "scan_result": empty_scan()}),
        )
        .unwrap();
        assert_eq!(r.action, WireAction::Scan { crow_id: "b".into() });
        let r = follow_up(
            &s,
            json!({"crow_id": "b", "your_action": "scan", "scan_result": empty_scan()}),
        )
        .unwrap();
        assert!(matches!(r.action, WireAction::Move { .. }));
        if let WireAction::Move { direction, .. } = r.action {
            assert!(Direction::ALL.contains(&direction));
        }
    }
}
