//! Shared types for the Mesa reservation engine
//!
//! Common types used by the booking server and its clients: floor-plan
//! models, the operating schedule, reservation state and events, and the
//! request/response shapes of the booking API.

pub mod models;
pub mod reservation;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Reservation re-exports (for convenient access)
pub use reservation::{Reservation, ReservationEvent, ReservationStatus, TransitionEvent};
