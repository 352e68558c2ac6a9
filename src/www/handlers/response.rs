//! # JSON Response Helpers
//!
//! Every route answers with JSON; errors use `{"error": "..."}` with the
//! status code of the error class.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::error::FogError;
use crate::protocol::ErrorBody;

/// Creates a JSON error response for a caller-visible error.
pub fn to_error_response(err: &FogError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorBody {
        error: err.to_string(),
    })
}

/// Converts a service result into a `200 OK` JSON response or an error response.
pub fn to_response<T: Serialize>(result: Result<T, FogError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => to_error_response(&e),
    }
}
