//! Error conversions from the engine layers into [`AppError`]
//!
//! Handlers and the coordinator speak `AppError`; the floor, storage and
//! manager layers keep their own error types and are lifted here with `?`.

use crate::db::StorageError;
use crate::floor::FloorError;
use crate::reservations::{ManagerError, TransitionError};
use crate::utils::AppError;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ReservationNotFound(id) => {
                AppError::not_found(format!("Reservation {id} not found"))
            }
            StorageError::NotFound(msg) => AppError::not_found(msg),
            StorageError::Duplicate(msg) => AppError::validation(msg),
            StorageError::InUse(msg) => AppError::validation(msg),
            other => AppError::database(other.to_string()),
        }
    }
}

impl From<FloorError> for AppError {
    fn from(err: FloorError) -> Self {
        match err {
            FloorError::NoFloorPlan => AppError::NoFloorPlan,
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition {
            from: err.from.to_string(),
            event: err.event,
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => e.into(),
            ManagerError::ReservationNotFound(id) => {
                AppError::not_found(format!("Reservation {id} not found"))
            }
            ManagerError::Transition(e) => e.into(),
        }
    }
}
