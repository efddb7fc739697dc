//! Reservation lifecycle and persistence
//!
//! Event-sourced: every admission decision and status change is an immutable
//! event in redb, with a snapshot cache for reads. The manager is the only
//! writer; the booking coordinator serializes admission ahead of it.

pub mod lifecycle;
pub mod manager;
pub mod storage;

pub use lifecycle::TransitionError;
pub use manager::{AdmittedBooking, ManagerError, ManagerResult, ReservationsManager};
pub use storage::{ReservationStorage, StorageStats};
