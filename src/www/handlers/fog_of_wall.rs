//! # Game Endpoint Handlers
//!
//! `POST /fog-of-wall` plays one turn; `GET /fog-of-wall/stats/{game_id}`
//! reports progress of a game.

use std::time::Instant;

use actix_web::{Responder, web};
use tracing::{info, warn};

use crate::error::FogError;
use crate::protocol::GameRequest;
use crate::service::FogService;
use crate::www::handlers::response;

/// Handles one turn of a game.
///
/// The body is parsed by hand so that broken JSON gets the same error shape
/// as every other client error.
pub async fn post_game(service: web::Data<FogService>, body: web::Bytes) -> impl Responder {
    let started_at = Instant::now();
    let result = parse_request(&body).and_then(|req| {
        info!(
            challenger_id = req.challenger_id.as_deref().unwrap_or(""),
            game_id = req.game_id.as_deref().unwrap_or(""),
            test_case = req.init_payload().is_some(),
            previous_action = req.previous_action.is_some(),
            "request"
        );
        service.handle(&req, started_at)
    });
    if let Err(e) = &result {
        warn!(error = %e, "rejecting request");
    }
    response::to_response(result)
}

fn parse_request(body: &[u8]) -> Result<GameRequest, FogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FogError::MalformedRequest("empty request body".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| FogError::MalformedRequest(format!("invalid JSON in request body: {}", e)))
}

pub async fn get_stats(service: web::Data<FogService>, path: web::Path<String>) -> impl Responder {
    response::to_response(service.stats(&path.into_inner()))
}
