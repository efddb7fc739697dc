//! Shared types for the reservation lifecycle

use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Reservation status - a closed enumeration
///
/// Legal moves are defined solely by the lifecycle transition table on the
/// server; nothing else may invent a transition. Loose status strings from
/// clients are rejected at the serde boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created, capacity tentatively held
    Pending,
    /// Confirmed by staff or a trusted source, capacity held
    Confirmed,
    /// Party is at the table
    Seated,
    /// Party left, table released (terminal)
    Completed,
    /// Cancelled before seating (terminal)
    Cancelled,
    /// Party never showed (terminal)
    NoShow,
}

impl ReservationStatus {
    /// Terminal states are immutable except for audit fields
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Statuses that hold table capacity (overlap checks consider only these)
    pub fn holds_capacity(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Seated)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Seated => write!(f, "SEATED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::NoShow => write!(f, "NO_SHOW"),
        }
    }
}

// ============================================================================
// Transition events
// ============================================================================

/// Lifecycle events a caller may request on an existing reservation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionEvent {
    Confirm,
    Cancel,
    Seat,
    Complete,
    MarkNoShow,
}

impl std::fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirm => write!(f, "CONFIRM"),
            Self::Cancel => write!(f, "CANCEL"),
            Self::Seat => write!(f, "SEAT"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::MarkNoShow => write!(f, "MARK_NO_SHOW"),
        }
    }
}

// ============================================================================
// Source
// ============================================================================

/// Where the booking request came from
///
/// Trusted sources (staff-entered) skip the `PENDING` stage and start
/// directly in `CONFIRMED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationSource {
    #[default]
    Online,
    Phone,
    WalkIn,
    Admin,
}

impl ReservationSource {
    /// Staff-entered bookings are trusted and start confirmed
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Phone | Self::WalkIn | Self::Admin)
    }
}

// ============================================================================
// Customer
// ============================================================================

/// Customer contact snapshot embedded in the reservation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ============================================================================
// Time slots
// ============================================================================

/// A discrete bookable start time within an open interval
///
/// Computed on demand by quantizing the operating schedule; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    /// Clock time in the business timezone, `HH:MM`
    pub time: String,
    /// Absolute start, Unix millis
    pub timestamp_millis: i64,
}
