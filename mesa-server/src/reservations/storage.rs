//! redb-based storage layer for reservation event sourcing
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `reservation_events` | `(reservation_id, sequence)` | `ReservationEvent` | Event stream (append-only) |
//! | `reservation_snapshots` | `reservation_id` | `Reservation` | Snapshot cache |
//! | `reservation_day_index` | `(day, reservation_id)` | `()` | Service-day index |
//! | `processed_commands` | `command_id` | `reservation_id` | Idempotency check |
//! | `sequence_counter` | key string | `u64` | Global sequence + daily number counter |
//!
//! The idempotency table stores the reservation id the command produced, so a
//! duplicate submission can be answered with the original outcome instead of a
//! bare "already processed".
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: once `commit()` returns the
//! admission decision survives power loss. On the create path the event,
//! snapshot, day index entry and idempotency marker all land in ONE write
//! transaction, so a crash can never leave a half-admitted reservation.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::reservation::{Reservation, ReservationEvent};
use std::sync::Arc;

use crate::db::{StorageError, StorageResult};

/// Table for storing events: key = (reservation_id, sequence), value = JSON-serialized ReservationEvent
const EVENTS_TABLE: TableDefinition<(i64, u64), &[u8]> =
    TableDefinition::new("reservation_events");

/// Table for storing snapshots: key = reservation_id, value = JSON-serialized Reservation
const SNAPSHOTS_TABLE: TableDefinition<i64, &[u8]> =
    TableDefinition::new("reservation_snapshots");

/// Table for the service-day index: key = (day "YYYY-MM-DD", reservation_id)
const DAY_INDEX_TABLE: TableDefinition<(&str, i64), ()> =
    TableDefinition::new("reservation_day_index");

/// Table for tracking processed commands: key = command_id, value = reservation_id
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, i64> =
    TableDefinition::new("processed_commands");

/// Table for counters: key = "seq" / "rsv_date" / "rsv_count", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";
const NUMBER_DATE_KEY: &str = "rsv_date";
const NUMBER_COUNT_KEY: &str = "rsv_count";

/// Reservation storage backed by redb
#[derive(Clone)]
pub struct ReservationStorage {
    db: Arc<Database>,
}

impl ReservationStorage {
    /// Open the reservation tables on the shared database handle
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(DAY_INDEX_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Increment and return the global sequence number (within transaction)
    pub fn increment_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Get current sequence (read-only)
    pub fn current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    // ========== Reservation Number (human-facing) ==========

    /// Allocate the next reservation number for `day` (a `YYYYMMDD` string)
    ///
    /// The counter resets when the stored date changes and the allocation is
    /// part of the surrounding write transaction, so a crash cannot hand out
    /// the same number twice.
    pub fn next_reservation_number(
        &self,
        txn: &WriteTransaction,
        day: &str,
    ) -> StorageResult<String> {
        let day_u64: u64 = day.parse().unwrap_or(0);

        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let stored_date = table
            .get(NUMBER_DATE_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);

        let count = if stored_date != day_u64 {
            table.insert(NUMBER_DATE_KEY, day_u64)?;
            table.insert(NUMBER_COUNT_KEY, 1u64)?;
            1
        } else {
            let next = table
                .get(NUMBER_COUNT_KEY)?
                .map(|g| g.value())
                .unwrap_or(0)
                + 1;
            table.insert(NUMBER_COUNT_KEY, next)?;
            next
        };

        Ok(format!("RSV{day}{count:04}"))
    }

    // ========== Command Idempotency ==========

    /// Reservation id produced by a previously processed command, if any
    pub fn processed_command(&self, command_id: &str) -> StorageResult<Option<i64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value()))
    }

    /// Same check inside an open write transaction
    pub fn processed_command_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<i64>> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value()))
    }

    /// Mark a command as processed, recording the reservation it touched
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        reservation_id: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, reservation_id)?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(
        &self,
        txn: &WriteTransaction,
        event: &ReservationEvent,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.reservation_id, event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for a reservation, in sequence order
    pub fn events_for_reservation(
        &self,
        reservation_id: i64,
    ) -> StorageResult<Vec<ReservationEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        let range_start = (reservation_id, 0u64);
        let range_end = (reservation_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let event: ReservationEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events past a given global sequence (across all reservations)
    pub fn events_since(&self, since_sequence: u64) -> StorageResult<Vec<ReservationEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: ReservationEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &Reservation,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.id, value.as_slice())?;
        Ok(())
    }

    /// Get a snapshot by reservation id
    pub fn snapshot(&self, reservation_id: i64) -> StorageResult<Option<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(reservation_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a snapshot, failing if absent
    pub fn require_snapshot(&self, reservation_id: i64) -> StorageResult<Reservation> {
        self.snapshot(reservation_id)?
            .ok_or(StorageError::ReservationNotFound(reservation_id))
    }

    /// Get a snapshot inside an open write transaction
    pub fn snapshot_txn(
        &self,
        txn: &WriteTransaction,
        reservation_id: i64,
    ) -> StorageResult<Option<Reservation>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(reservation_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Day Index ==========

    /// Index a reservation under its service day (`YYYY-MM-DD`)
    pub fn index_day(
        &self,
        txn: &WriteTransaction,
        day: &str,
        reservation_id: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(DAY_INDEX_TABLE)?;
        table.insert((day, reservation_id), ())?;
        Ok(())
    }

    /// Drop a day index entry (reschedules move the reservation between days)
    pub fn unindex_day(
        &self,
        txn: &WriteTransaction,
        day: &str,
        reservation_id: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(DAY_INDEX_TABLE)?;
        table.remove((day, reservation_id))?;
        Ok(())
    }

    /// All reservations indexed under a service day, any status
    pub fn reservations_for_day(&self, day: &str) -> StorageResult<Vec<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(DAY_INDEX_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let range_start = (day, i64::MIN);
        let range_end = (day, i64::MAX);

        let mut reservations = Vec::new();
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let (_, reservation_id) = key.value();
            if let Some(value) = snapshots.get(reservation_id)? {
                reservations.push(serde_json::from_slice::<Reservation>(value.value())?);
            }
        }

        reservations.sort_by_key(|r| (r.requested_at, r.id));
        Ok(reservations)
    }

    // ========== Statistics ==========

    /// Storage counters for the health endpoint
    pub fn stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let snapshots_table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let commands_table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            event_count: events_table.len()?,
            snapshot_count: snapshots_table.len()?,
            processed_command_count: commands_table.len()?,
            current_sequence: seq_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub event_count: u64,
    pub snapshot_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}
