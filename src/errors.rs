use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("upstream query failed: {0}")]
    Upstream(String),

    #[error("This time slot is no longer available ({buffer_minutes}-minute buffer required between matches)")]
    Conflict { buffer_minutes: i64 },

    #[error("cannot change booking status from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<rusqlite::Error>() {
            Ok(db) => AppError::Database(db),
            Err(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_buffer_window() {
        let err = AppError::Conflict { buffer_minutes: 15 };
        let msg = err.to_string();
        assert!(msg.contains("15-minute buffer"), "{msg}");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AppError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Approved,
        };
        assert!(err.to_string().contains("cancelled"));
        assert!(err.to_string().contains("approved"));
    }
}
