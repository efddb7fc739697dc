//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (桌台)
///
/// `combinable_with` is an explicit relation: table A may only be merged
/// with table B when each lists the other. The solver never infers
/// adjacency on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    pub zone_id: i64,
    /// Maximum covers this table seats
    pub capacity: i32,
    /// Smallest party worth seating here (avoids burning a 6-top on a duo)
    #[serde(default = "default_min_capacity")]
    pub min_capacity: i32,
    /// Tables this one may be merged with for large parties
    #[serde(default)]
    pub combinable_with: Vec<i64>,
    /// Temporarily unusable (spill, repair) - excluded at seat time
    #[serde(default)]
    pub out_of_service: bool,
    pub is_active: bool,
}

fn default_min_capacity() -> i32 {
    1
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub zone_id: i64,
    pub capacity: Option<i32>,
    pub min_capacity: Option<i32>,
    pub combinable_with: Option<Vec<i64>>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub name: Option<String>,
    pub zone_id: Option<i64>,
    pub capacity: Option<i32>,
    pub min_capacity: Option<i32>,
    pub combinable_with: Option<Vec<i64>>,
    pub out_of_service: Option<bool>,
    pub is_active: Option<bool>,
}
