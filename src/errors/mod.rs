use std::io;
use std::path::PathBuf;

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

/// Errors produced by the page store and the credential store
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Malformed credential store {}: {source}", path.display())]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported authentication method: {0}")]
    InvalidCredentialMethod(String),
}

pub type Result<T> = std::result::Result<T, WikiError>;

impl WikiError {
    fn status(&self) -> StatusCode {
        match self {
            WikiError::NotFound(_) => StatusCode::NOT_FOUND,
            WikiError::AlreadyExists(_) => StatusCode::CONFLICT,
            WikiError::InvalidPath(_) | WikiError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            WikiError::InvalidCredentialMethod(_) => StatusCode::UNAUTHORIZED,
            WikiError::Io(_) | WikiError::MalformedStore { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
