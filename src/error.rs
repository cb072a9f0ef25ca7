use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl MutationError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            MutationError::Transport(_) => "TRANSPORT_ERROR",
            MutationError::Backend { .. } => "BACKEND_ERROR",
            MutationError::Parse(_) => "PARSE_ERROR",
            MutationError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MutationError>;
