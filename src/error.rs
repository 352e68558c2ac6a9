use thiserror::Error;

/// Errors visible to the caller of the game endpoint.
///
/// Failures inside the exploration policy are not listed here: they never
/// reach the caller and degrade to a submission instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FogError {
    /// Missing required fields or fields of the wrong type.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// The initialization payload cannot produce a playable session.
    #[error("invalid initialization: {0}")]
    InvalidInitialization(String),
    #[error("game not found: {0}")]
    SessionNotFound(String),
}

impl FogError {
    /// HTTP status code the protocol adapter answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            FogError::MalformedRequest(_) | FogError::InvalidInitialization(_) => 400,
            FogError::SessionNotFound(_) => 404,
        }
    }
}

pub type Result<T, E = FogError> = std::result::Result<T, E>;
