use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Item,
    Booking,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::Item => f.write_str("item"),
            Entity::Booking => f.write_str("booking"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forbidden {
    OwnerCannotBookOwnItem,
    NotItemOwner,
    NotBookerOrOwner,
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forbidden::OwnerCannotBookOwnItem => f.write_str("owner cannot book their own item"),
            Forbidden::NotItemOwner => f.write_str("only the item owner may do this"),
            Forbidden::NotBookerOrOwner => {
                f.write_str("only the booking initiator or the item owner may view this booking")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("booking start must be strictly before its end")]
    InvalidTimeRange,

    #[error("{0} {1} not found")]
    NotFound(Entity, i64),

    #[error("item {0} is not available for booking")]
    ItemUnavailable(i64),

    #[error("forbidden: {0}")]
    Forbidden(Forbidden),

    #[error("booking {booking_id} has already been decided: {}", .status.as_str())]
    Conflict {
        booking_id: i64,
        status: BookingStatus,
    },

    #[error("Unknown state: {0}")]
    UnsupportedState(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("user {0} still owns items, bookings or comments")]
    UserInUse(i64),

    #[error("only users who have completed an approved booking of this item may comment")]
    CommentNotAllowed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidTimeRange => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ItemUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::UnsupportedState(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::UserInUse(_) => StatusCode::CONFLICT,
            AppError::CommentNotAllowed => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::Conflict { status: current, .. } => {
                serde_json::json!({ "error": self.to_string(), "status": current.as_str() })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
