//! ReservationsManager - command processing and event generation
//!
//! Sole owner of reservation state. Everything else proposes; the manager
//! validates against the lifecycle table, persists, and broadcasts.
//!
//! # Command Flow
//!
//! ```text
//! create / transition / reschedule
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Idempotency check (command_id) → replay original outcome
//!     ├─ 3. Validate against the lifecycle transition table
//!     ├─ 4. Allocate global sequence, build event(s)
//!     ├─ 5. Fold event(s) into the snapshot
//!     ├─ 6. Persist events + snapshot + day index + command marker
//!     ├─ 7. Commit transaction
//!     └─ 8. Broadcast event(s)
//! ```
//!
//! Steps 1-7 are one redb transaction: a crash leaves either the full
//! decision or nothing. Broadcast happens after commit only.

use chrono_tz::Tz;
use shared::reservation::{
    Customer, EventPayload, Reservation, ReservationEvent, ReservationEventType,
    ReservationSource, ReservationStatus, TransitionEvent,
};
use shared::util::snowflake_id;
use thiserror::Error;
use tokio::sync::broadcast;

use super::lifecycle::{self, TransitionError};
use super::storage::ReservationStorage;
use crate::db::StorageError;
use crate::utils::time::{millis_to_date, millis_to_date_string};

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(i64),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

// `?` on `txn.commit()` needs a direct conversion; route it through the
// shared storage error
impl From<redb::CommitError> for ManagerError {
    fn from(err: redb::CommitError) -> Self {
        ManagerError::Storage(err.into())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Validated admission decision handed over by the booking coordinator
///
/// The manager trusts these fields; schedule, capacity and overlap checks
/// happened under the slot lock before this struct was built.
#[derive(Debug, Clone)]
pub struct AdmittedBooking {
    pub command_id: String,
    pub customer: Customer,
    pub party_size: i32,
    pub requested_at: i64,
    pub duration_minutes: i64,
    pub assigned_table_ids: Vec<i64>,
    pub source: ReservationSource,
    pub special_requests: Option<String>,
}

/// Reservations manager
pub struct ReservationsManager {
    storage: ReservationStorage,
    tz: Tz,
    event_tx: broadcast::Sender<ReservationEvent>,
}

impl ReservationsManager {
    pub fn new(storage: ReservationStorage, tz: Tz) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            storage,
            tz,
            event_tx,
        }
    }

    /// Subscribe to the post-commit event stream
    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &ReservationStorage {
        &self.storage
    }

    // ========== Queries ==========

    pub fn get(&self, id: i64) -> ManagerResult<Reservation> {
        self.storage
            .snapshot(id)?
            .ok_or(ManagerError::ReservationNotFound(id))
    }

    /// Reservations whose service day (business timezone) is `day`
    pub fn find_by_day(&self, day: &str) -> ManagerResult<Vec<Reservation>> {
        Ok(self.storage.reservations_for_day(day)?)
    }

    /// Capacity-holding reservations overlapping `[start, end)`
    ///
    /// The day index keys a reservation by the day its window STARTS on, so a
    /// late booking can spill past midnight into the queried window; the
    /// previous day is scanned as well.
    pub fn find_overlapping(&self, start: i64, end: i64) -> ManagerResult<Vec<Reservation>> {
        let mut days = Vec::new();
        if let Some(first) = millis_to_date(start, self.tz) {
            if let Some(prev) = first.pred_opt() {
                days.push(prev.format("%Y-%m-%d").to_string());
            }
            days.push(first.format("%Y-%m-%d").to_string());
        }
        let last_day = millis_to_date_string(end - 1, self.tz);
        if !days.contains(&last_day) && !last_day.is_empty() {
            days.push(last_day);
        }

        let mut found = Vec::new();
        for day in days {
            for r in self.storage.reservations_for_day(&day)? {
                if r.status.holds_capacity() && r.requested_at < end && start < r.ends_at() {
                    found.push(r);
                }
            }
        }
        found.sort_by_key(|r| (r.requested_at, r.id));
        found.dedup_by_key(|r| r.id);
        Ok(found)
    }

    // ========== Create ==========

    /// Persist an admitted booking as a new reservation
    ///
    /// Idempotent on `command_id`: a replayed command returns the snapshot
    /// the first execution produced, without allocating anything.
    pub fn create(&self, booking: AdmittedBooking) -> ManagerResult<Reservation> {
        let txn = self.storage.begin_write()?;

        if let Some(existing_id) = self
            .storage
            .processed_command_txn(&txn, &booking.command_id)?
        {
            drop(txn);
            return self.get(existing_id);
        }

        let reservation_id = snowflake_id();
        let sequence = self.storage.increment_sequence(&txn)?;

        let number_day = millis_to_date(booking.requested_at, self.tz)
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| "00000000".to_string());
        let reservation_number = self.storage.next_reservation_number(&txn, &number_day)?;

        let initial_status = if booking.source.is_trusted() {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };

        let event = ReservationEvent::new(
            sequence,
            reservation_id,
            booking.command_id.clone(),
            ReservationEventType::ReservationCreated,
            EventPayload::ReservationCreated {
                reservation_number,
                customer: booking.customer,
                party_size: booking.party_size,
                requested_at: booking.requested_at,
                duration_minutes: booking.duration_minutes,
                assigned_table_ids: booking.assigned_table_ids,
                source: booking.source,
                initial_status,
                special_requests: booking.special_requests,
            },
        );

        let snapshot = lifecycle::from_created_event(&event)
            .ok_or(ManagerError::ReservationNotFound(reservation_id))?;

        self.storage.store_event(&txn, &event)?;
        self.storage.store_snapshot(&txn, &snapshot)?;
        let day = millis_to_date_string(snapshot.requested_at, self.tz);
        self.storage.index_day(&txn, &day, reservation_id)?;
        self.storage
            .mark_command_processed(&txn, &booking.command_id, reservation_id)?;
        txn.commit()?;

        tracing::info!(
            reservation_id,
            number = %snapshot.reservation_number,
            party_size = snapshot.party_size,
            tables = ?snapshot.assigned_table_ids,
            status = %snapshot.status,
            "Reservation created"
        );
        let _ = self.event_tx.send(event);
        Ok(snapshot)
    }

    // ========== Lifecycle transitions ==========

    pub fn confirm(&self, id: i64, command_id: &str) -> ManagerResult<Reservation> {
        self.apply_transition(
            id,
            TransitionEvent::Confirm,
            command_id,
            ReservationEventType::ReservationConfirmed,
            EventPayload::ReservationConfirmed,
        )
    }

    pub fn cancel(
        &self,
        id: i64,
        reason: Option<String>,
        command_id: &str,
    ) -> ManagerResult<Reservation> {
        self.apply_transition(
            id,
            TransitionEvent::Cancel,
            command_id,
            ReservationEventType::ReservationCancelled,
            EventPayload::ReservationCancelled { reason },
        )
    }

    pub fn complete(&self, id: i64, command_id: &str) -> ManagerResult<Reservation> {
        self.apply_transition(
            id,
            TransitionEvent::Complete,
            command_id,
            ReservationEventType::ReservationCompleted,
            EventPayload::ReservationCompleted,
        )
    }

    pub fn mark_no_show(&self, id: i64, command_id: &str) -> ManagerResult<Reservation> {
        self.apply_transition(
            id,
            TransitionEvent::MarkNoShow,
            command_id,
            ReservationEventType::MarkedNoShow,
            EventPayload::MarkedNoShow,
        )
    }

    /// Seat the party, optionally on different tables than originally assigned
    ///
    /// A swap is recorded as its own `TABLES_REASSIGNED` event before the
    /// `PARTY_SEATED` event, both in the same transaction, so the audit trail
    /// shows the reassignment explicitly.
    pub fn seat(
        &self,
        id: i64,
        table_ids: Vec<i64>,
        command_id: &str,
    ) -> ManagerResult<Reservation> {
        let txn = self.storage.begin_write()?;

        if let Some(existing_id) = self.storage.processed_command_txn(&txn, command_id)? {
            drop(txn);
            return self.get(existing_id);
        }

        let mut snapshot = self
            .storage
            .snapshot_txn(&txn, id)?
            .ok_or(ManagerError::ReservationNotFound(id))?;
        lifecycle::next_status(snapshot.status, &TransitionEvent::Seat)?;

        let mut events = Vec::with_capacity(2);
        if table_ids != snapshot.assigned_table_ids {
            let sequence = self.storage.increment_sequence(&txn)?;
            events.push(ReservationEvent::new(
                sequence,
                id,
                command_id.to_string(),
                ReservationEventType::TablesReassigned,
                EventPayload::TablesReassigned {
                    previous_table_ids: snapshot.assigned_table_ids.clone(),
                    table_ids: table_ids.clone(),
                },
            ));
        }
        let sequence = self.storage.increment_sequence(&txn)?;
        events.push(ReservationEvent::new(
            sequence,
            id,
            command_id.to_string(),
            ReservationEventType::PartySeated,
            EventPayload::PartySeated { table_ids },
        ));

        for event in &events {
            lifecycle::apply_event(&mut snapshot, event);
            self.storage.store_event(&txn, event)?;
        }
        self.storage.store_snapshot(&txn, &snapshot)?;
        self.storage.mark_command_processed(&txn, command_id, id)?;
        txn.commit()?;

        tracing::info!(
            reservation_id = id,
            tables = ?snapshot.assigned_table_ids,
            "Party seated"
        );
        for event in events {
            let _ = self.event_tx.send(event);
        }
        Ok(snapshot)
    }

    /// Move a reservation to a new window and assignment
    ///
    /// The caller re-ran admission for the new window under the slot locks;
    /// the manager enforces only the lifecycle guard and the day reindex.
    pub fn reschedule(
        &self,
        id: i64,
        requested_at: i64,
        duration_minutes: i64,
        assigned_table_ids: Vec<i64>,
        command_id: &str,
    ) -> ManagerResult<Reservation> {
        let txn = self.storage.begin_write()?;

        if let Some(existing_id) = self.storage.processed_command_txn(&txn, command_id)? {
            drop(txn);
            return self.get(existing_id);
        }

        let mut snapshot = self
            .storage
            .snapshot_txn(&txn, id)?
            .ok_or(ManagerError::ReservationNotFound(id))?;
        lifecycle::ensure_reschedulable(snapshot.status)?;

        let previous_requested_at = snapshot.requested_at;
        let sequence = self.storage.increment_sequence(&txn)?;
        let event = ReservationEvent::new(
            sequence,
            id,
            command_id.to_string(),
            ReservationEventType::Rescheduled,
            EventPayload::Rescheduled {
                previous_requested_at,
                requested_at,
                duration_minutes,
                assigned_table_ids,
            },
        );

        lifecycle::apply_event(&mut snapshot, &event);
        self.storage.store_event(&txn, &event)?;
        self.storage.store_snapshot(&txn, &snapshot)?;

        let old_day = millis_to_date_string(previous_requested_at, self.tz);
        let new_day = millis_to_date_string(requested_at, self.tz);
        if old_day != new_day {
            self.storage.unindex_day(&txn, &old_day, id)?;
            self.storage.index_day(&txn, &new_day, id)?;
        }
        self.storage.mark_command_processed(&txn, command_id, id)?;
        txn.commit()?;

        tracing::info!(
            reservation_id = id,
            from = previous_requested_at,
            to = requested_at,
            "Reservation rescheduled"
        );
        let _ = self.event_tx.send(event);
        Ok(snapshot)
    }

    fn apply_transition(
        &self,
        id: i64,
        transition: TransitionEvent,
        command_id: &str,
        event_type: ReservationEventType,
        payload: EventPayload,
    ) -> ManagerResult<Reservation> {
        let txn = self.storage.begin_write()?;

        if let Some(existing_id) = self.storage.processed_command_txn(&txn, command_id)? {
            drop(txn);
            return self.get(existing_id);
        }

        let mut snapshot = self
            .storage
            .snapshot_txn(&txn, id)?
            .ok_or(ManagerError::ReservationNotFound(id))?;
        lifecycle::next_status(snapshot.status, &transition)?;

        let sequence = self.storage.increment_sequence(&txn)?;
        let event = ReservationEvent::new(sequence, id, command_id.to_string(), event_type, payload);

        lifecycle::apply_event(&mut snapshot, &event);
        self.storage.store_event(&txn, &event)?;
        self.storage.store_snapshot(&txn, &snapshot)?;
        self.storage.mark_command_processed(&txn, command_id, id)?;
        txn.commit()?;

        tracing::info!(
            reservation_id = id,
            event = %transition,
            status = %snapshot.status,
            "Reservation transition applied"
        );
        let _ = self.event_tx.send(event);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::utils::time::{date_time_to_millis, parse_date, parse_hhmm};

    const TZ: Tz = chrono_tz::Europe::Madrid;

    fn manager() -> ReservationsManager {
        let db = DbService::in_memory().unwrap();
        let storage = ReservationStorage::new(db.database()).unwrap();
        ReservationsManager::new(storage, TZ)
    }

    fn at(date: &str, time: &str) -> i64 {
        date_time_to_millis(parse_date(date).unwrap(), parse_hhmm(time).unwrap(), TZ)
    }

    fn booking(command_id: &str, date: &str, time: &str, source: ReservationSource) -> AdmittedBooking {
        AdmittedBooking {
            command_id: command_id.to_string(),
            customer: Customer {
                name: "Marta".into(),
                phone: "+34611222333".into(),
                email: Some("marta@example.com".into()),
            },
            party_size: 4,
            requested_at: at(date, time),
            duration_minutes: 90,
            assigned_table_ids: vec![10],
            source,
            special_requests: None,
        }
    }

    #[test]
    fn events_broadcast_only_after_commit() {
        let mgr = manager();
        let mut rx = mgr.subscribe();

        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.reservation_id, r.id);
        assert_eq!(event.event_type, ReservationEventType::ReservationCreated);

        // A rejected transition commits nothing and broadcasts nothing
        mgr.complete(r.id, "c2").unwrap_err();
        assert!(rx.try_recv().is_err());

        mgr.confirm(r.id, "c3").unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, ReservationEventType::ReservationConfirmed);
    }

    #[test]
    fn online_bookings_start_pending_trusted_start_confirmed() {
        let mgr = manager();
        let online = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();
        assert_eq!(online.status, ReservationStatus::Pending);

        let phone = mgr
            .create(booking("c2", "2026-03-06", "21:00", ReservationSource::Phone))
            .unwrap();
        assert_eq!(phone.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn duplicate_command_replays_the_original_outcome() {
        let mgr = manager();
        let first = mgr
            .create(booking("dup", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();
        let replay = mgr
            .create(booking("dup", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();

        assert_eq!(first.id, replay.id);
        assert_eq!(first.reservation_number, replay.reservation_number);
        // Only one event was written
        assert_eq!(mgr.storage().events_for_reservation(first.id).unwrap().len(), 1);
        assert_eq!(mgr.storage().current_sequence().unwrap(), 1);
    }

    #[test]
    fn full_happy_path_to_completed() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();

        let r = mgr.confirm(r.id, "c2").unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);

        let r = mgr.seat(r.id, vec![10], "c3").unwrap();
        assert_eq!(r.status, ReservationStatus::Seated);

        let r = mgr.complete(r.id, "c4").unwrap();
        assert_eq!(r.status, ReservationStatus::Completed);

        // CREATED, CONFIRMED, SEATED, COMPLETED
        let events = mgr.storage().events_for_reservation(r.id).unwrap();
        assert_eq!(events.len(), 4);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn seating_on_different_tables_records_the_swap() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Phone))
            .unwrap();
        assert_eq!(r.assigned_table_ids, vec![10]);

        let seated = mgr.seat(r.id, vec![11], "c2").unwrap();
        assert_eq!(seated.assigned_table_ids, vec![11]);

        let events = mgr.storage().events_for_reservation(r.id).unwrap();
        let types: Vec<ReservationEventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                ReservationEventType::ReservationCreated,
                ReservationEventType::TablesReassigned,
                ReservationEventType::PartySeated,
            ]
        );
    }

    #[test]
    fn illegal_transition_is_rejected_without_side_effects() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();

        // pending → seat is not legal
        let err = mgr.seat(r.id, vec![10], "c2").unwrap_err();
        assert!(matches!(err, ManagerError::Transition(_)));

        let unchanged = mgr.get(r.id).unwrap();
        assert_eq!(unchanged.status, ReservationStatus::Pending);
        assert_eq!(mgr.storage().events_for_reservation(r.id).unwrap().len(), 1);
        // The failed command was not marked processed, a retry may succeed later
        assert!(mgr.storage().processed_command("c2").unwrap().is_none());
    }

    #[test]
    fn cancelled_reservations_free_their_window() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Phone))
            .unwrap();

        let start = at("2026-03-06", "20:00");
        let end = at("2026-03-06", "21:30");
        assert_eq!(mgr.find_overlapping(start, end).unwrap().len(), 1);

        mgr.cancel(r.id, Some("guest called".into()), "c2").unwrap();
        assert!(mgr.find_overlapping(start, end).unwrap().is_empty());

        let cancelled = mgr.get(r.id).unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("guest called"));
    }

    #[test]
    fn reschedule_moves_between_day_indexes() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Phone))
            .unwrap();

        mgr.reschedule(r.id, at("2026-03-07", "19:00"), 90, vec![12], "c2")
            .unwrap();

        assert!(mgr.find_by_day("2026-03-06").unwrap().is_empty());
        let moved = mgr.find_by_day("2026-03-07").unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].assigned_table_ids, vec![12]);
    }

    #[test]
    fn reschedule_is_refused_after_seating() {
        let mgr = manager();
        let r = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Phone))
            .unwrap();
        mgr.seat(r.id, vec![10], "c2").unwrap();

        let err = mgr
            .reschedule(r.id, at("2026-03-07", "19:00"), 90, vec![10], "c3")
            .unwrap_err();
        assert!(matches!(err, ManagerError::Transition(_)));
    }

    #[test]
    fn overlap_query_sees_late_windows_from_the_previous_day() {
        let mgr = manager();
        let mut late = booking("c1", "2026-03-06", "23:30", ReservationSource::Phone);
        late.duration_minutes = 120; // runs to 01:30 next day
        mgr.create(late).unwrap();

        let start = at("2026-03-07", "00:30");
        let end = at("2026-03-07", "02:00");
        assert_eq!(mgr.find_overlapping(start, end).unwrap().len(), 1);
    }

    #[test]
    fn reservation_numbers_are_daily_and_sequential() {
        let mgr = manager();
        let a = mgr
            .create(booking("c1", "2026-03-06", "20:00", ReservationSource::Online))
            .unwrap();
        let b = mgr
            .create(booking("c2", "2026-03-06", "21:00", ReservationSource::Online))
            .unwrap();
        let c = mgr
            .create(booking("c3", "2026-03-07", "20:00", ReservationSource::Online))
            .unwrap();

        assert_eq!(a.reservation_number, "RSV202603060001");
        assert_eq!(b.reservation_number, "RSV202603060002");
        assert_eq!(c.reservation_number, "RSV202603070001");
    }
}
