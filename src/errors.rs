//! # Error handling
//!
//! Client input that cannot be interpreted is never an error here: the
//! query grammar is permissive and unknown filter, sort or relation names
//! are ignored. What remains are the conditions that end a request:
//!
//! - a single item that does not exist (404)
//! - a query string that is not valid URL encoding (400)
//! - data layer and configuration failures (500, details logged only)
//!
//! ```rust,ignore
//! async fn show(State(state): State<AppState>, params: RequestParams) -> Result<Response, ApiError> {
//!     let row = executor.item(select, &state.executor).await?;
//!     Ok(response::item(row))
//! }
//! ```
//!
//! Internal details are logged through `tracing` and never sent to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        /// Resource type (e.g. "users")
        resource: String,
        id: Option<String>,
    },

    /// 400 Bad Request
    BadRequest { message: String },

    /// 500 Internal Server Error raised by the data layer
    Database {
        message: String,
        /// Logged, not sent to the user
        internal: DbErr,
    },

    /// 500 Internal Server Error
    Internal {
        message: String,
        /// Logged, not sent to the user
        internal: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Wraps a data layer failure. The error itself is only logged.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Sanitized message safe to send to clients
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `DbErr::RecordNotFound` becomes 404, every other `DbErr` becomes 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_id() {
        let err = ApiError::not_found("users", Some("123".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "users with ID '123' not found");
    }

    #[test]
    fn test_not_found_without_id() {
        let err = ApiError::not_found("users", None);
        assert_eq!(err.user_message(), "users not found");
    }

    #[test]
    fn test_bad_request() {
        let err = ApiError::bad_request("Invalid query string");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid query string");
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let err = ApiError::database(DbErr::Custom("no such table: users".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "A database error occurred");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ApiError::internal("Invalid REST configuration", Some("maxValue".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Invalid REST configuration");
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let api_err: ApiError = DbErr::RecordNotFound("users row not found".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(api_err.user_message(), "users not found");
    }

    #[test]
    fn test_other_dberr_become_500() {
        for db_err in [
            DbErr::Custom("custom".to_string()),
            DbErr::Type("type".to_string()),
            DbErr::Json("json".to_string()),
        ] {
            let api_err: ApiError = db_err.into();
            assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::not_found("users", None).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
