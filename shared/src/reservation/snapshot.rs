//! Reservation snapshot - current state of one booking

use super::types::{Customer, ReservationSource, ReservationStatus};
use serde::{Deserialize, Serialize};

/// Reservation entity
///
/// Owned exclusively by the server's `ReservationsManager`; everything else
/// reads or proposes, never mutates directly. Mutations land as
/// [`super::ReservationEvent`]s and are folded into this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: i64,
    /// Human-facing number, `RSV<yyyymmdd><counter>` (crash-safe counter)
    pub reservation_number: String,
    pub customer: Customer,
    pub party_size: i32,
    /// Requested start, Unix millis (falls within an open interval)
    pub requested_at: i64,
    /// Seating duration; default 90 min for parties of 4 or fewer, 120 above
    pub duration_minutes: i64,
    /// Assigned physical tables; set on successful admission, may be swapped
    /// once at seat time, final afterwards
    #[serde(default)]
    pub assigned_table_ids: Vec<i64>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub source: ReservationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reservation {
    /// End of the occupied window, exclusive
    pub fn ends_at(&self) -> i64 {
        self.requested_at + self.duration_minutes * 60_000
    }

    /// Whether this reservation occupies `table_id` anywhere in
    /// `[start, end)` while holding capacity
    pub fn blocks_table(&self, table_id: i64, start: i64, end: i64) -> bool {
        self.status.holds_capacity()
            && self.assigned_table_ids.contains(&table_id)
            && self.requested_at < end
            && start < self.ends_at()
    }
}
