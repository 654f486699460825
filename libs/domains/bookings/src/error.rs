use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::BookingAction;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Property not found: {0}")]
    PropertyNotFound(Uuid),

    #[error("Not allowed to {action} booking {booking_id}")]
    Forbidden {
        action: BookingAction,
        booking_id: Uuid,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BookingResult<T> = Result<T, BookingError>;

impl From<sea_orm::DbErr> for BookingError {
    fn from(err: sea_orm::DbErr) -> Self {
        BookingError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(err: validator::ValidationErrors) -> Self {
        BookingError::Validation(err.to_string())
    }
}
