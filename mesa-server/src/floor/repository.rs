//! Floor plan repository
//!
//! redb-backed CRUD for dining tables and zones. Keys are snowflake IDs,
//! values JSON-serialized models.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, Zone, ZoneCreate, ZoneUpdate,
};
use shared::util::snowflake_id;
use std::sync::Arc;

use crate::db::{StorageError, StorageResult};

/// Table for dining tables: key = table id, value = JSON-serialized DiningTable
const DINING_TABLES: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

/// Table for zones: key = zone id, value = JSON-serialized Zone
const ZONES: TableDefinition<i64, &[u8]> = TableDefinition::new("zones");

#[derive(Clone)]
pub struct FloorRepository {
    db: Arc<Database>,
}

impl FloorRepository {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(DINING_TABLES)?;
            let _ = txn.open_table(ZONES)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    // ========== Dining tables ==========

    /// Find all active dining tables, sorted by name
    pub fn find_all_tables(&self) -> StorageResult<Vec<DiningTable>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DINING_TABLES)?;
        let mut tables = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let t: DiningTable = serde_json::from_slice(value.value())?;
            if t.is_active {
                tables.push(t);
            }
        }
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    /// Find table by id
    pub fn find_table(&self, id: i64) -> StorageResult<Option<DiningTable>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DINING_TABLES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_name_in_zone(&self, zone_id: i64, name: &str) -> StorageResult<Option<DiningTable>> {
        Ok(self
            .find_all_tables()?
            .into_iter()
            .find(|t| t.zone_id == zone_id && t.name == name))
    }

    /// Create a new dining table
    pub fn create_table(&self, data: DiningTableCreate) -> StorageResult<DiningTable> {
        // Check duplicate name in same zone
        if self.find_by_name_in_zone(data.zone_id, &data.name)?.is_some() {
            return Err(StorageError::Duplicate(format!(
                "Table '{}' already exists in this zone",
                data.name
            )));
        }

        let table = DiningTable {
            id: snowflake_id(),
            name: data.name,
            zone_id: data.zone_id,
            capacity: data.capacity.unwrap_or(4),
            min_capacity: data.min_capacity.unwrap_or(1),
            combinable_with: data.combinable_with.unwrap_or_default(),
            out_of_service: false,
            is_active: true,
        };

        self.put_table(&table)?;
        Ok(table)
    }

    /// Update a dining table
    pub fn update_table(&self, id: i64, data: DiningTableUpdate) -> StorageResult<DiningTable> {
        let mut existing = self
            .find_table(id)?
            .ok_or_else(|| StorageError::NotFound(format!("Dining table {id} not found")))?;

        if let Some(name) = data.name {
            existing.name = name;
        }
        if let Some(zone_id) = data.zone_id {
            existing.zone_id = zone_id;
        }
        if let Some(capacity) = data.capacity {
            existing.capacity = capacity;
        }
        if let Some(min_capacity) = data.min_capacity {
            existing.min_capacity = min_capacity;
        }
        if let Some(combinable_with) = data.combinable_with {
            existing.combinable_with = combinable_with;
        }
        if let Some(out_of_service) = data.out_of_service {
            existing.out_of_service = out_of_service;
        }
        if let Some(is_active) = data.is_active {
            existing.is_active = is_active;
        }

        self.put_table(&existing)?;
        Ok(existing)
    }

    /// Soft delete a dining table (history keeps referencing the id)
    pub fn delete_table(&self, id: i64) -> StorageResult<bool> {
        match self.find_table(id)? {
            Some(mut table) => {
                table.is_active = false;
                self.put_table(&table)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn put_table(&self, table: &DiningTable) -> StorageResult<()> {
        let bytes = serde_json::to_vec(table)?;
        let txn = self.db.begin_write()?;
        {
            let mut t = txn.open_table(DINING_TABLES)?;
            t.insert(table.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Zones ==========

    /// Find all zones, sorted by name
    pub fn find_all_zones(&self) -> StorageResult<Vec<Zone>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ZONES)?;
        let mut zones = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            zones.push(serde_json::from_slice::<Zone>(value.value())?);
        }
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(zones)
    }

    /// Find zone by id
    pub fn find_zone(&self, id: i64) -> StorageResult<Option<Zone>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ZONES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Create a new zone
    pub fn create_zone(&self, data: ZoneCreate) -> StorageResult<Zone> {
        let zone = Zone {
            id: snowflake_id(),
            name: data.name,
            description: data.description,
        };
        self.put_zone(&zone)?;
        Ok(zone)
    }

    /// Update a zone
    pub fn update_zone(&self, id: i64, data: ZoneUpdate) -> StorageResult<Zone> {
        let mut existing = self
            .find_zone(id)?
            .ok_or_else(|| StorageError::NotFound(format!("Zone {id} not found")))?;
        if let Some(name) = data.name {
            existing.name = name;
        }
        if let Some(description) = data.description {
            existing.description = Some(description);
        }
        self.put_zone(&existing)?;
        Ok(existing)
    }

    /// Hard delete a zone
    ///
    /// Refused while any active table still references the zone; the check
    /// runs inside the write transaction so a concurrent table create cannot
    /// slip in between check and removal.
    pub fn delete_zone(&self, id: i64) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let tables = txn.open_table(DINING_TABLES)?;
            for entry in tables.iter()? {
                let (_, value) = entry?;
                let t: DiningTable = serde_json::from_slice(value.value())?;
                if t.is_active && t.zone_id == id {
                    return Err(StorageError::InUse(format!(
                        "Zone {id} still has active tables"
                    )));
                }
            }
            let mut zones = txn.open_table(ZONES)?;
            zones.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    fn put_zone(&self, zone: &Zone) -> StorageResult<()> {
        let bytes = serde_json::to_vec(zone)?;
        let txn = self.db.begin_write()?;
        {
            let mut t = txn.open_table(ZONES)?;
            t.insert(zone.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}
