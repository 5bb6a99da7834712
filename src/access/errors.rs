use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AccessError {
    #[error("{0}")]
    #[diagnostic(
        code(portcullis::access::validation),
        help("Correct the request payload and resubmit; malformed input is never retried automatically")
    )]
    Validation(String),

    #[error("Access request `{0}` not found")]
    #[diagnostic(code(portcullis::access::not_found))]
    NotFound(String),

    #[error("{0}")]
    #[diagnostic(
        code(portcullis::access::forbidden),
        help("Only roles with the decide capability (DATA_OWNER, ADMIN) may decide access requests")
    )]
    Forbidden(String),

    #[error("{0}")]
    #[diagnostic(
        code(portcullis::access::conflict),
        help("Re-fetch the request to observe its current state instead of retrying blindly")
    )]
    Conflict(String),

    #[error("Request `{request_id}` was decided but grant materialization failed")]
    #[diagnostic(
        code(portcullis::access::partial_failure),
        help("Retry via the grant reconciliation operation for this request id; it is idempotent")
    )]
    PartialFailure { request_id: String },

    #[error("Stored {entity} row is corrupt: {detail}")]
    #[diagnostic(code(portcullis::access::corrupt))]
    Corrupt {
        entity: &'static str,
        detail: String,
    },

    #[error("Database error: {0}")]
    #[diagnostic(code(portcullis::access::db))]
    Db(#[from] sea_orm::DbErr),
}

impl AccessError {
    /// Stable machine-readable kind, carried on every error response.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::Validation(_) => "validation",
            AccessError::NotFound(_) => "not_found",
            AccessError::Forbidden(_) => "forbidden",
            AccessError::Conflict(_) => "conflict",
            AccessError::PartialFailure { .. } => "partial_failure",
            AccessError::Corrupt { .. } => "corrupt",
            AccessError::Db(_) => "db",
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccessError::Validation(_) => StatusCode::BAD_REQUEST,
            AccessError::NotFound(_) => StatusCode::NOT_FOUND,
            AccessError::Forbidden(_) => StatusCode::FORBIDDEN,
            AccessError::Conflict(_) => StatusCode::CONFLICT,
            AccessError::PartialFailure { .. }
            | AccessError::Corrupt { .. }
            | AccessError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "kind": self.kind(), "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
