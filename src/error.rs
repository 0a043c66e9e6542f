use crate::token::TokenError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("document encoding failed: {0}")]
    Encoding(String),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing authorization header")]
    MissingCredentials,
    #[error("invalid bearer token")]
    InvalidCredentials,
    #[error("token owner does not match requested email")]
    ForbiddenAccess,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingCredentials | ApiError::InvalidCredentials => {
                debug!(err = %self, "rejecting request");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": true, "message": "unauthorized access" })),
                )
                    .into_response()
            }
            ApiError::ForbiddenAccess => {
                debug!(err = %self, "rejecting request");
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": 1, "message": "forbidden access" })),
                )
                    .into_response()
            }
            ApiError::MalformedBody(_) => {
                debug!(err = %self, "rejecting request");
                (StatusCode::BAD_REQUEST, "Bad Request").into_response()
            }
            ApiError::Store(_) | ApiError::Token(_) => {
                error!(err = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
