use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a request failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no authorization header")]
    Missing,
    #[error("invalid authorization header format")]
    Malformed,
    #[error("invalid token")]
    Unknown,
    #[error("token expired")]
    Expired,
    #[error("invalid credentials")]
    InvalidCredential,
}

/// Failures of the config file persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persisted config is not valid JSON: {0}")]
    MalformedPersisted(#[from] serde_json::Error),
}

/// Boundary error type for the HTTP layer. Auth and validation errors are
/// caller faults; storage errors are server faults and get an opaque body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{entity} not found")),
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::Auth(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_unauthorized() {
        for e in [
            AuthError::Missing,
            AuthError::Malformed,
            AuthError::Unknown,
            AuthError::Expired,
            AuthError::InvalidCredential,
        ] {
            let resp = ApiError::Auth(e).into_response();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = ApiError::Validation("too short".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_maps_to_internal_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let resp = ApiError::Storage(StorageError::Io(io)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
