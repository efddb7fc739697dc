//! Operating schedule storage
//!
//! The weekly schedule is a single settings record; like the floor plan it
//! is read-mostly and served from a cached snapshot on the booking path.

use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, TableDefinition};
use shared::models::OperatingSchedule;
use std::sync::Arc;

use crate::db::StorageResult;

/// Table for store settings: key = setting name, value = JSON
const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

const SCHEDULE_KEY: &str = "operating_schedule";

#[derive(Clone)]
pub struct ScheduleRepository {
    db: Arc<Database>,
}

impl ScheduleRepository {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(SETTINGS)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    /// Load the schedule; a never-configured restaurant is closed every day
    pub fn get(&self) -> StorageResult<OperatingSchedule> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        match table.get(SCHEDULE_KEY)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(OperatingSchedule::default()),
        }
    }

    /// Replace the weekly schedule
    pub fn put(&self, schedule: &OperatingSchedule) -> StorageResult<()> {
        let bytes = serde_json::to_vec(schedule)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(SCHEDULE_KEY, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// Schedule service - repository plus cached snapshot
pub struct ScheduleService {
    repo: ScheduleRepository,
    cache: RwLock<Option<Arc<OperatingSchedule>>>,
}

impl ScheduleService {
    pub fn new(repo: ScheduleRepository) -> Self {
        Self {
            repo,
            cache: RwLock::new(None),
        }
    }

    /// Current schedule, loading from the store on a cold cache
    pub fn schedule(&self) -> StorageResult<Arc<OperatingSchedule>> {
        if let Some(schedule) = self.cache.read().as_ref() {
            return Ok(schedule.clone());
        }
        let schedule = Arc::new(self.repo.get()?);
        *self.cache.write() = Some(schedule.clone());
        Ok(schedule)
    }

    /// Persist a new schedule and refresh the cache
    pub fn update(&self, schedule: OperatingSchedule) -> StorageResult<Arc<OperatingSchedule>> {
        self.repo.put(&schedule)?;
        let schedule = Arc::new(schedule);
        *self.cache.write() = Some(schedule.clone());
        Ok(schedule)
    }
}
