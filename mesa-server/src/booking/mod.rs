//! Booking coordination - admission, assignment and slot locking
//!
//! The coordinator is the single concurrency boundary for capacity:
//! availability answers are advisory, admission under the slot locks is
//! authoritative.

pub mod coordinator;
pub mod error;
pub mod locks;
pub mod solver;

pub use coordinator::BookingCoordinator;
pub use locks::SlotLockRegistry;
