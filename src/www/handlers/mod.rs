//! # Request Handlers
//!
//! Game endpoints live in `fog_of_wall`, JSON response helpers in
//! `response`. The liveness probe is small enough to sit here.

use actix_web::{HttpResponse, Responder};
use serde_json::json;

pub mod fog_of_wall;
pub mod response;

/// Liveness probe for the hosting platform.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "fog-of-wall",
    }))
}
