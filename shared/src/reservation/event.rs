//! Reservation events - immutable facts recorded after admission decisions

use super::types::{Customer, ReservationSource, ReservationStatus};
use serde::{Deserialize, Serialize};

/// Reservation event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Reservation this event belongs to
    pub reservation_id: i64,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command that triggered this event (for idempotency and audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: ReservationEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl ReservationEvent {
    pub fn new(
        sequence: u64,
        reservation_id: i64,
        command_id: String,
        event_type: ReservationEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            reservation_id,
            timestamp: crate::util::now_millis(),
            command_id,
            event_type,
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationEventType {
    // Lifecycle
    ReservationCreated,
    ReservationConfirmed,
    ReservationCancelled,
    PartySeated,
    ReservationCompleted,
    MarkedNoShow,

    // Table operations
    TablesReassigned,
    Rescheduled,
}

impl std::fmt::Display for ReservationEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservationCreated => write!(f, "RESERVATION_CREATED"),
            Self::ReservationConfirmed => write!(f, "RESERVATION_CONFIRMED"),
            Self::ReservationCancelled => write!(f, "RESERVATION_CANCELLED"),
            Self::PartySeated => write!(f, "PARTY_SEATED"),
            Self::ReservationCompleted => write!(f, "RESERVATION_COMPLETED"),
            Self::MarkedNoShow => write!(f, "MARKED_NO_SHOW"),
            Self::TablesReassigned => write!(f, "TABLES_REASSIGNED"),
            Self::Rescheduled => write!(f, "RESCHEDULED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    ReservationCreated {
        reservation_number: String,
        customer: Customer,
        party_size: i32,
        requested_at: i64,
        duration_minutes: i64,
        assigned_table_ids: Vec<i64>,
        source: ReservationSource,
        /// Trusted sources start CONFIRMED, everything else PENDING
        initial_status: ReservationStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },

    ReservationConfirmed,

    ReservationCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    PartySeated {
        /// Tables actually occupied; may differ from the original assignment
        /// when walk-in pressure or an outage forced a swap
        table_ids: Vec<i64>,
    },

    ReservationCompleted,

    MarkedNoShow,

    // ========== Table operations ==========
    TablesReassigned {
        previous_table_ids: Vec<i64>,
        table_ids: Vec<i64>,
    },

    Rescheduled {
        previous_requested_at: i64,
        requested_at: i64,
        duration_minutes: i64,
        assigned_table_ids: Vec<i64>,
    },
}
