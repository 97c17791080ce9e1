use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::models::vote::VoteCategory;

/// Error taxonomy for the vote/complaint ledgers and the menu window.
///
/// Validation, duplicate and authorization errors carry the specific
/// day/category/item so handlers can surface a precise user-facing message.
/// Store failures are not retried here — retrying is the caller's decision.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("a vote for {category} on {day} already exists")]
    DuplicateVote {
        day: NaiveDate,
        category: VoteCategory,
    },

    #[error("a complaint for '{food_item}' already exists on {day}")]
    DuplicateComplaint { day: NaiveDate, food_item: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateVote { .. } | ApiError::DuplicateComplaint { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_)
            | ApiError::Cache(_)
            | ApiError::Serialization(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::DuplicateVote { .. } => "duplicate_vote",
            ApiError::DuplicateComplaint { .. } => "duplicate_complaint",
            ApiError::NotFound(_) => "not_found",
            ApiError::Authentication(_) => "unauthorized",
            ApiError::Authorization(_) => "forbidden",
            ApiError::Database(_) | ApiError::Cache(_) => "remote",
            ApiError::Serialization(_) | ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }
        let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_vote_names_day_and_category() {
        let err = ApiError::DuplicateVote {
            day: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            category: VoteCategory::Breakfast,
        };
        let msg = err.to_string();
        assert!(msg.contains("breakfast"));
        assert!(msg.contains("2025-03-14"));
    }

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(
            ApiError::Validation("empty selection".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("complaint".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Authentication("missing token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Authorization("management only".into()).status(),
            StatusCode::FORBIDDEN
        );
    }
}
