//! Booking API request/response shapes

use super::types::{Customer, ReservationSource, TimeSlot, TransitionEvent};
use serde::{Deserialize, Serialize};

/// POST /api/reservations body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer: Customer,
    pub party_size: i32,
    /// Requested date, `YYYY-MM-DD` (business timezone)
    pub date: String,
    /// Requested start, `HH:MM`
    pub time: String,
    #[serde(default)]
    pub source: ReservationSource,
    /// Restrict assignment to one zone (e.g. terrace)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<i64>,
    /// Preferred table; honored when it fits and is free
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_table_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    /// Client-generated idempotency key; retries with the same key return
    /// the original outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
}

/// DELETE /api/reservations/{id} body
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CancelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// PATCH /api/reservations/{id}/status body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub event: TransitionEvent,
    /// For SEAT: explicit tables; omitted = keep/resolve the assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// POST /api/reservations/{id}/reschedule body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub time: String,
}

/// GET /api/availability response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub available: bool,
    /// Nearest same-day alternatives when the exact slot is taken,
    /// nearest-first, capped by config
    #[serde(default)]
    pub alternative_slots: Vec<TimeSlot>,
}
