//! Floor model - tables, zones, combinability
//!
//! Static-ish description of the physical floor plan. The booking path only
//! reads it through [`FloorService`], which caches a snapshot and is
//! invalidated whenever an administrative edit lands.
//!
//! Fit quality: candidates are ordered by total capacity ascending (smallest
//! table that still seats the party wins), ties broken by table IDs for
//! determinism. Combinations come only from the explicit `combinable_with`
//! relation; adjacency is never inferred.

mod repository;

pub use repository::FloorRepository;

use parking_lot::RwLock;
use shared::models::DiningTable;
use std::sync::Arc;
use thiserror::Error;

use crate::db::StorageResult;

/// Floor model errors
#[derive(Debug, Error)]
pub enum FloorError {
    #[error("No floor plan configured: restaurant has zero active tables")]
    NoFloorPlan,
}

/// One assignable unit: a single table or an explicitly combinable pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableChoice {
    /// Sorted table IDs (one entry for singles, two for combinations)
    pub table_ids: Vec<i64>,
    pub total_capacity: i32,
}

impl TableChoice {
    fn single(table: &DiningTable) -> Self {
        Self {
            table_ids: vec![table.id],
            total_capacity: table.capacity,
        }
    }

    fn pair(a: &DiningTable, b: &DiningTable) -> Self {
        let mut ids = vec![a.id, b.id];
        ids.sort_unstable();
        Self {
            table_ids: ids,
            total_capacity: a.capacity + b.capacity,
        }
    }
}

/// Immutable snapshot of the active floor plan
#[derive(Debug, Clone, Default)]
pub struct FloorModel {
    tables: Vec<DiningTable>,
}

impl FloorModel {
    pub fn new(mut tables: Vec<DiningTable>) -> Self {
        tables.retain(|t| t.is_active);
        tables.sort_unstable_by_key(|t| t.id);
        Self { tables }
    }

    /// All active tables, sorted by ID
    pub fn tables(&self) -> &[DiningTable] {
        &self.tables
    }

    pub fn table(&self, id: i64) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Whether the given tables form a legal assignment for the party:
    /// combined capacity suffices and every pair is mutually combinable.
    pub fn is_valid_assignment(&self, table_ids: &[i64], party_size: i32) -> bool {
        if table_ids.is_empty() {
            return false;
        }
        let mut total = 0;
        for (i, &id) in table_ids.iter().enumerate() {
            let Some(table) = self.table(id) else {
                return false;
            };
            total += table.capacity;
            for &other in &table_ids[i + 1..] {
                let Some(peer) = self.table(other) else {
                    return false;
                };
                if !table.combinable_with.contains(&peer.id)
                    || !peer.combinable_with.contains(&table.id)
                {
                    return false;
                }
            }
        }
        total >= party_size
    }

    /// Candidates able to seat `party_size`, ordered by fit quality
    ///
    /// Singles require `min_capacity <= party_size <= capacity`. A pair is
    /// offered only when the party exceeds both members on their own -
    /// burning two tables on a party one of them could seat is never a
    /// useful answer.
    ///
    /// Errors with [`FloorError::NoFloorPlan`] when the restaurant has no
    /// active tables at all; an empty result for a given party/zone is a
    /// capacity question, not a configuration one.
    pub fn candidates_for_party(
        &self,
        party_size: i32,
        zone_id: Option<i64>,
    ) -> Result<Vec<TableChoice>, FloorError> {
        if self.tables.is_empty() {
            return Err(FloorError::NoFloorPlan);
        }

        let in_zone: Vec<&DiningTable> = self
            .tables
            .iter()
            .filter(|t| zone_id.is_none_or(|z| t.zone_id == z))
            .collect();

        let mut choices: Vec<TableChoice> = Vec::new();

        // Singles
        for table in &in_zone {
            if table.capacity >= party_size && table.min_capacity <= party_size {
                choices.push(TableChoice::single(table));
            }
        }

        // Explicitly combinable pairs
        for (i, a) in in_zone.iter().enumerate() {
            for b in &in_zone[i + 1..] {
                if !a.combinable_with.contains(&b.id) || !b.combinable_with.contains(&a.id) {
                    continue;
                }
                if party_size <= a.capacity || party_size <= b.capacity {
                    continue;
                }
                if a.capacity + b.capacity >= party_size {
                    choices.push(TableChoice::pair(a, b));
                }
            }
        }

        choices.sort_by(|x, y| {
            x.total_capacity
                .cmp(&y.total_capacity)
                .then_with(|| x.table_ids.cmp(&y.table_ids))
        });

        Ok(choices)
    }
}

/// Floor service - repository plus cached snapshot
///
/// The cache is invalidated on every administrative edit; the booking path
/// never hits the database for floor data.
pub struct FloorService {
    repo: FloorRepository,
    cache: RwLock<Option<Arc<FloorModel>>>,
}

impl FloorService {
    pub fn new(repo: FloorRepository) -> Self {
        Self {
            repo,
            cache: RwLock::new(None),
        }
    }

    /// Current floor model, loading from the store on a cold cache
    pub fn model(&self) -> StorageResult<Arc<FloorModel>> {
        if let Some(model) = self.cache.read().as_ref() {
            return Ok(model.clone());
        }
        let tables = self.repo.find_all_tables()?;
        let model = Arc::new(FloorModel::new(tables));
        *self.cache.write() = Some(model.clone());
        Ok(model)
    }

    /// Drop the cached snapshot; next read reloads from the store
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    pub fn repository(&self) -> &FloorRepository {
        &self.repo
    }
}
