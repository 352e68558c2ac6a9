//! # Web Server Implementation
//!
//! HTTP surface of the Fog of Wall agent. The game server POSTs every turn
//! to `/fog-of-wall` and receives the next action in the response.
//!
//! ## Submodules
//! - `handlers`: actix-web request handlers for the routes below.

use actix_web::web;

/// Request handlers for the web server's routes.
pub mod handlers;

/// Registers every route of the service.
///
/// The caller provides a `web::Data<FogService>` as application data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::health))
        .route("/health", web::get().to(handlers::health))
        .route(
            "/fog-of-wall",
            web::post().to(handlers::fog_of_wall::post_game),
        )
        .route(
            "/fog-of-wall/stats/{game_id}",
            web::get().to(handlers::fog_of_wall::get_stats),
        );
}
