//! Floor-plan and schedule models
//!
//! Read-mostly entities managed through the admin API. The booking path
//! only ever reads them through a cached snapshot.

pub mod dining_table;
pub mod schedule;
pub mod zone;

pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate};
pub use schedule::{OpenInterval, OperatingSchedule};
pub use zone::{Zone, ZoneCreate, ZoneUpdate};
