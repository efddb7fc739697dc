//! Reservation domain types
//!
//! The reservation snapshot, its status, the immutable event records the
//! server persists, and the booking API request/response shapes.

pub mod event;
pub mod request;
pub mod snapshot;
pub mod types;

pub use event::{EventPayload, ReservationEvent, ReservationEventType};
pub use request::{
    AvailabilityReport, BookingRequest, CancelRequest, RescheduleRequest, StatusChangeRequest,
};
pub use snapshot::Reservation;
pub use types::{Customer, ReservationSource, ReservationStatus, TimeSlot, TransitionEvent};
