use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            PortalError::Validation(fields) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "VALIDATION_FAILED".to_string(),
                    message: "One or more fields are invalid.".to_string(),
                    fields: Some(fields),
                };
                (status, body)
            }
            PortalError::Unauthorized(_) | PortalError::Jwt(_) => {
                let status = StatusCode::UNAUTHORIZED;
                let body = ApiErrorBody::new("UNAUTHORIZED", "Authentication required.");
                (status, body)
            }
            PortalError::NotFound(what) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody::new("NOT_FOUND", format!("{what} not found."));
                (status, body)
            }
            PortalError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                let body = ApiErrorBody::new("CONFLICT", message);
                (status, body)
            }
            PortalError::JsonError(_) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody::new("BAD_REQUEST", "Malformed request body.");
                (status, body)
            }
            PortalError::Timeout(_) => {
                let status = StatusCode::GATEWAY_TIMEOUT;
                let body = ApiErrorBody::new("TIMEOUT", "The operation timed out.");
                (status, body)
            }
            PortalError::DatabaseError(_)
            | PortalError::Config(_)
            | PortalError::InvalidConfig { .. }
            | PortalError::Io(_)
            | PortalError::PasswordHash(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body =
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred.");
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            fields: None,
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// SQLSTATE classes that mean "the object or row is already there".
const ALREADY_EXISTS_CODES: &[&str] = &["42P07", "42P06", "42710", "42701", "23505"];

/// True when a database error only reports that an object or row already exists.
pub fn is_already_exists(err: &SqlxError) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| ALREADY_EXISTS_CODES.contains(&code.as_ref()))
}

/// `err` followed by each `source()` beneath it, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    std::iter::successors(Some(err), |e| e.source())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_lists_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "Please enter a valid email address".to_string());
        let resp = PortalError::Validation(fields).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(
            body["error"]["fields"]["email"],
            "Please enter a valid email address"
        );
    }

    #[tokio::test]
    async fn database_errors_are_not_leaked() {
        let resp = PortalError::DatabaseError(SqlxError::Protocol("secret detail".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret detail"));
        assert!(!text.contains("fields"));
    }

    #[test]
    fn error_chain_walks_sources() {
        let err = PortalError::from(std::io::Error::other("disk gone"));
        assert_eq!(error_chain(&err), vec!["IO error: disk gone", "disk gone"]);

        let leaf = PortalError::Unauthorized("no token".to_string());
        assert_eq!(error_chain(&leaf).len(), 1);
    }

    #[test]
    fn protocol_errors_are_not_already_exists() {
        assert!(!is_already_exists(&SqlxError::Protocol("boom".into())));
    }
}
