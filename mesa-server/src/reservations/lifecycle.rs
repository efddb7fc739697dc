//! Reservation lifecycle - the sole authority on status transitions
//!
//! ```text
//! pending ──confirm──▶ confirmed ──seat──▶ seated ──complete──▶ completed
//!    │                     │
//!    ├──cancel──▶ cancelled ◀──cancel──┤
//!    └──mark_no_show──▶ no_show ◀──mark_no_show──┘   (before seating only)
//! ```
//!
//! Anything not in the table below is an [`TransitionError`] - a logic bug
//! in the caller, never retried. Terminal states (`completed`, `cancelled`,
//! `no_show`) accept nothing.

use shared::reservation::{
    EventPayload, Reservation, ReservationEvent, ReservationStatus, TransitionEvent,
};
use thiserror::Error;

/// Illegal `(from, event)` pair
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid transition: cannot {event} a {from} reservation")]
pub struct TransitionError {
    pub from: ReservationStatus,
    /// Event name; includes RESCHEDULE, which is window-guarded rather than
    /// a status move
    pub event: String,
}

impl TransitionError {
    fn new(from: ReservationStatus, event: impl std::fmt::Display) -> Self {
        Self {
            from,
            event: event.to_string(),
        }
    }
}

/// Resolve the target status for `(from, event)`, or fail
///
/// This table is exhaustive on purpose: adding a status or event without
/// deciding its legality will not compile past the match.
pub fn next_status(
    from: ReservationStatus,
    event: &TransitionEvent,
) -> Result<ReservationStatus, TransitionError> {
    use ReservationStatus as S;
    use TransitionEvent as E;

    match (from, event) {
        (S::Pending, E::Confirm) => Ok(S::Confirmed),
        (S::Pending | S::Confirmed, E::Cancel) => Ok(S::Cancelled),
        (S::Confirmed, E::Seat) => Ok(S::Seated),
        (S::Seated, E::Complete) => Ok(S::Completed),
        (S::Pending | S::Confirmed, E::MarkNoShow) => Ok(S::NoShow),

        // Everything else is illegal, spelled out so the compiler keeps us
        // honest when the enum grows
        (
            S::Pending | S::Confirmed | S::Seated | S::Completed | S::Cancelled | S::NoShow,
            E::Confirm | E::Cancel | E::Seat | E::Complete | E::MarkNoShow,
        ) => Err(TransitionError::new(from, event)),
    }
}

/// Rescheduling moves the window, not the status; it is only admissible
/// while capacity is merely held (before the party sits down)
pub fn ensure_reschedulable(from: ReservationStatus) -> Result<(), TransitionError> {
    match from {
        ReservationStatus::Pending | ReservationStatus::Confirmed => Ok(()),
        _ => Err(TransitionError::new(from, "RESCHEDULE")),
    }
}

/// Fold one event into a snapshot
///
/// Used both on the write path and when rebuilding a snapshot from the
/// event log for verification.
pub fn apply_event(reservation: &mut Reservation, event: &ReservationEvent) {
    match &event.payload {
        EventPayload::ReservationCreated { .. } => {
            // Creation is handled by `from_created_event`; replaying it onto
            // an existing snapshot is a no-op
        }
        EventPayload::ReservationConfirmed => {
            reservation.status = ReservationStatus::Confirmed;
        }
        EventPayload::ReservationCancelled { reason } => {
            reservation.status = ReservationStatus::Cancelled;
            reservation.cancel_reason = reason.clone();
        }
        EventPayload::PartySeated { table_ids } => {
            reservation.status = ReservationStatus::Seated;
            reservation.assigned_table_ids = table_ids.clone();
        }
        EventPayload::ReservationCompleted => {
            reservation.status = ReservationStatus::Completed;
        }
        EventPayload::MarkedNoShow => {
            reservation.status = ReservationStatus::NoShow;
        }
        EventPayload::TablesReassigned { table_ids, .. } => {
            reservation.assigned_table_ids = table_ids.clone();
        }
        EventPayload::Rescheduled {
            requested_at,
            duration_minutes,
            assigned_table_ids,
            ..
        } => {
            reservation.requested_at = *requested_at;
            reservation.duration_minutes = *duration_minutes;
            reservation.assigned_table_ids = assigned_table_ids.clone();
        }
    }
    reservation.updated_at = event.timestamp;
}

/// Build the initial snapshot from a creation event
pub fn from_created_event(event: &ReservationEvent) -> Option<Reservation> {
    let EventPayload::ReservationCreated {
        reservation_number,
        customer,
        party_size,
        requested_at,
        duration_minutes,
        assigned_table_ids,
        source,
        initial_status,
        special_requests,
    } = &event.payload
    else {
        return None;
    };
    Some(Reservation {
        id: event.reservation_id,
        reservation_number: reservation_number.clone(),
        customer: customer.clone(),
        party_size: *party_size,
        requested_at: *requested_at,
        duration_minutes: *duration_minutes,
        assigned_table_ids: assigned_table_ids.clone(),
        status: *initial_status,
        source: *source,
        special_requests: special_requests.clone(),
        cancel_reason: None,
        created_at: event.timestamp,
        updated_at: event.timestamp,
    })
}
