//! Booking coordinator - the admission boundary
//!
//! Every operation that consumes or moves table capacity passes through
//! here. The recipe is always the same: take the slot locks for the touched
//! window(s), read the committed overlap set, decide, persist through the
//! manager, release. Between lock and commit nothing else can admit into
//! the same buckets, so double-booking is structurally impossible.
//!
//! A `Busy` rejection from the lock registry is retried once internally
//! with a small random backoff before it reaches the client.

use chrono::{NaiveDate, NaiveTime};
use rand::Rng;
use shared::models::OperatingSchedule;
use shared::reservation::{
    AvailabilityReport, BookingRequest, RescheduleRequest, Reservation, StatusChangeRequest,
    TimeSlot, TransitionEvent,
};
use std::sync::Arc;
use std::time::Duration;

use super::locks::SlotLockRegistry;
use super::solver::{self, AssignmentRequest};
use crate::availability::{self, AvailabilityInputs};
use crate::core::config::Config;
use crate::floor::{FloorModel, FloorService};
use crate::reservations::{AdmittedBooking, ReservationsManager};
use crate::schedule::ScheduleService;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_party_size, validate_required_text,
};
use crate::utils::{
    AppError, AppResult,
    time::{date_time_to_millis, parse_date, parse_hhmm},
};

pub struct BookingCoordinator {
    config: Arc<Config>,
    floor: Arc<FloorService>,
    schedule: Arc<ScheduleService>,
    manager: Arc<ReservationsManager>,
    locks: SlotLockRegistry,
}

impl BookingCoordinator {
    pub fn new(
        config: Arc<Config>,
        floor: Arc<FloorService>,
        schedule: Arc<ScheduleService>,
        manager: Arc<ReservationsManager>,
    ) -> Self {
        let locks = SlotLockRegistry::new(
            config.slot_granularity_minutes,
            Duration::from_millis(config.lock_wait_ms),
        );
        Self {
            config,
            floor,
            schedule,
            manager,
            locks,
        }
    }

    pub fn manager(&self) -> &Arc<ReservationsManager> {
        &self.manager
    }

    // ========== Availability (read-only, lock-free) ==========

    /// Point query: can this party book this exact slot?
    pub fn check_availability(
        &self,
        date: &str,
        time: &str,
        party_size: i32,
        zone_id: Option<i64>,
    ) -> AppResult<AvailabilityReport> {
        validate_party_size(party_size)?;
        let date = parse_date(date)?;
        let time = parse_hhmm(time)?;

        let floor = self.floor.model()?;
        let schedule = self.schedule.schedule()?;
        let duration = self.config.duration_for_party(party_size);
        let reservations = self.day_reservations(date)?;
        let inputs = self.inputs(&floor, &schedule, &reservations);

        Ok(availability::check(
            &inputs,
            date,
            time,
            party_size,
            duration,
            zone_id,
            self.config.max_alternative_slots,
        )?)
    }

    /// All bookable slots for a party on one day
    pub fn available_slots(
        &self,
        date: &str,
        party_size: i32,
        zone_id: Option<i64>,
    ) -> AppResult<Vec<TimeSlot>> {
        validate_party_size(party_size)?;
        let date = parse_date(date)?;

        let floor = self.floor.model()?;
        let schedule = self.schedule.schedule()?;
        let duration = self.config.duration_for_party(party_size);
        let reservations = self.day_reservations(date)?;
        let inputs = self.inputs(&floor, &schedule, &reservations);

        Ok(availability::available_slots(
            &inputs, date, party_size, duration, zone_id,
        )?)
    }

    // ========== Booking ==========

    /// Admit a booking request: decide, assign tables, persist - atomically
    /// with respect to every other admission touching the same window
    pub async fn book(&self, request: BookingRequest) -> AppResult<Reservation> {
        self.validate_booking(&request)?;
        let date = parse_date(&request.date)?;
        let time = parse_hhmm(&request.time)?;

        let command_id = request
            .command_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        // Replay fast path, no locks needed for an already-decided command
        if let Some(existing) = self.manager.storage().processed_command(&command_id)? {
            return Ok(self.manager.get(existing)?);
        }

        let duration = self.config.duration_for_party(request.party_size);
        let start = date_time_to_millis(date, time, self.config.timezone);
        let end = start + duration * 60_000;

        match self
            .admit(&request, date, time, start, end, duration, &command_id)
            .await
        {
            Err(AppError::Busy) => {
                // One internal retry with jitter before surfacing 503
                let backoff = { rand::thread_rng().gen_range(25..75) };
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                self.admit(&request, date, time, start, end, duration, &command_id)
                    .await
            }
            other => other,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn admit(
        &self,
        request: &BookingRequest,
        date: NaiveDate,
        time: NaiveTime,
        start: i64,
        end: i64,
        duration: i64,
        command_id: &str,
    ) -> AppResult<Reservation> {
        let _window = self.locks.lock_window(start, end).await?;

        let floor = self.floor.model()?;
        let schedule = self.schedule.schedule()?;
        let day_reservations = self.day_reservations(date)?;
        let inputs = self.inputs(&floor, &schedule, &day_reservations);

        let report = availability::check(
            &inputs,
            date,
            time,
            request.party_size,
            duration,
            request.zone_id,
            self.config.max_alternative_slots,
        )?;
        if !report.available {
            return Err(AppError::NoCapacity {
                alternatives: report.alternative_slots,
            });
        }

        let overlapping = self.manager.find_overlapping(start, end)?;
        let choice = solver::assign(&AssignmentRequest {
            floor: &floor,
            reservations: &overlapping,
            party_size: request.party_size,
            zone_id: request.zone_id,
            start_millis: start,
            end_millis: end,
            preferred_table_id: request.preferred_table_id,
            exclude_out_of_service: false,
            ignore_reservation: None,
        })?
        .ok_or(AppError::NoCapacity {
            alternatives: report.alternative_slots,
        })?;

        let reservation = self.manager.create(AdmittedBooking {
            command_id: command_id.to_string(),
            customer: request.customer.clone(),
            party_size: request.party_size,
            requested_at: start,
            duration_minutes: duration,
            assigned_table_ids: choice.table_ids,
            source: request.source,
            special_requests: request.special_requests.clone(),
        })?;
        Ok(reservation)
    }

    // ========== Lifecycle ==========

    /// Confirm a pending reservation (no capacity change, no locks)
    pub fn confirm(&self, id: i64) -> AppResult<Reservation> {
        Ok(self
            .manager
            .confirm(id, &uuid::Uuid::new_v4().to_string())?)
    }

    /// Cancel; freeing capacity can never double-book, so no locks either
    pub fn cancel(&self, id: i64, reason: Option<String>) -> AppResult<Reservation> {
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;
        Ok(self
            .manager
            .cancel(id, reason, &uuid::Uuid::new_v4().to_string())?)
    }

    pub fn complete(&self, id: i64) -> AppResult<Reservation> {
        Ok(self
            .manager
            .complete(id, &uuid::Uuid::new_v4().to_string())?)
    }

    pub fn mark_no_show(&self, id: i64) -> AppResult<Reservation> {
        Ok(self
            .manager
            .mark_no_show(id, &uuid::Uuid::new_v4().to_string())?)
    }

    /// Seat the party, validating or re-solving the table assignment
    ///
    /// Out-of-service tables are refused here even though admission counted
    /// them; if the original assignment went out of service the solver looks
    /// for a replacement within the same window.
    pub async fn seat(&self, id: i64, table_ids: Option<Vec<i64>>) -> AppResult<Reservation> {
        let reservation = self.manager.get(id)?;
        let start = reservation.requested_at;
        let end = reservation.ends_at();
        let _window = self.locks.lock_window(start, end).await?;

        let floor = self.floor.model()?;
        let overlapping = self.manager.find_overlapping(start, end)?;

        let target = match table_ids {
            Some(explicit) => {
                self.validate_seat_tables(&floor, &explicit, &reservation, &overlapping)?;
                explicit
            }
            None => {
                let current_usable = self.assignment_in_service(&floor, &reservation)
                    && self.tables_free(
                        &reservation.assigned_table_ids,
                        &overlapping,
                        id,
                        start,
                        end,
                    );
                if current_usable {
                    reservation.assigned_table_ids.clone()
                } else {
                    // Re-solve: original tables unavailable at seat time
                    solver::assign(&AssignmentRequest {
                        floor: &floor,
                        reservations: &overlapping,
                        party_size: reservation.party_size,
                        zone_id: None,
                        start_millis: start,
                        end_millis: end,
                        preferred_table_id: None,
                        exclude_out_of_service: true,
                        ignore_reservation: Some(id),
                    })?
                    .ok_or(AppError::NoCapacity {
                        alternatives: Vec::new(),
                    })?
                    .table_ids
                }
            }
        };

        Ok(self
            .manager
            .seat(id, target, &uuid::Uuid::new_v4().to_string())?)
    }

    /// Move a reservation to a new window, re-running admission for it
    ///
    /// Both the old and the new window are locked together (sorted bucket
    /// order, so two concurrent reschedules cannot deadlock).
    pub async fn reschedule(&self, id: i64, request: RescheduleRequest) -> AppResult<Reservation> {
        let date = parse_date(&request.date)?;
        let time = parse_hhmm(&request.time)?;

        let reservation = self.manager.get(id)?;
        let duration = self.config.duration_for_party(reservation.party_size);
        let new_start = date_time_to_millis(date, time, self.config.timezone);
        let new_end = new_start + duration * 60_000;
        let old_start = reservation.requested_at;
        let old_end = reservation.ends_at();

        let _windows = self
            .locks
            .lock_windows(&[(old_start, old_end), (new_start, new_end)])
            .await?;

        let floor = self.floor.model()?;
        let schedule = self.schedule.schedule()?;
        // The reservation's own hold must not block its new window
        let mut day_reservations = self.day_reservations(date)?;
        day_reservations.retain(|r| r.id != id);
        let inputs = self.inputs(&floor, &schedule, &day_reservations);

        let report = availability::check(
            &inputs,
            date,
            time,
            reservation.party_size,
            duration,
            None,
            self.config.max_alternative_slots,
        )?;
        if !report.available {
            return Err(AppError::NoCapacity {
                alternatives: report.alternative_slots,
            });
        }

        let overlapping = self.manager.find_overlapping(new_start, new_end)?;
        let choice = solver::assign(&AssignmentRequest {
            floor: &floor,
            reservations: &overlapping,
            party_size: reservation.party_size,
            zone_id: None,
            start_millis: new_start,
            end_millis: new_end,
            preferred_table_id: reservation.assigned_table_ids.first().copied(),
            exclude_out_of_service: false,
            ignore_reservation: Some(id),
        })?
        .ok_or(AppError::NoCapacity {
            alternatives: report.alternative_slots,
        })?;

        Ok(self.manager.reschedule(
            id,
            new_start,
            duration,
            choice.table_ids,
            &uuid::Uuid::new_v4().to_string(),
        )?)
    }

    /// Dispatch a status-change request to the right operation
    pub async fn apply_status_change(
        &self,
        id: i64,
        request: StatusChangeRequest,
    ) -> AppResult<Reservation> {
        match request.event {
            TransitionEvent::Confirm => self.confirm(id),
            TransitionEvent::Cancel => self.cancel(id, request.reason),
            TransitionEvent::Seat => self.seat(id, request.table_ids).await,
            TransitionEvent::Complete => self.complete(id),
            TransitionEvent::MarkNoShow => self.mark_no_show(id),
        }
    }

    // ========== Internals ==========

    fn validate_booking(&self, request: &BookingRequest) -> AppResult<()> {
        validate_required_text(&request.customer.name, "customer.name", MAX_NAME_LEN)?;
        validate_required_text(&request.customer.phone, "customer.phone", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&request.customer.email, "customer.email", MAX_EMAIL_LEN)?;
        validate_optional_text(
            &request.special_requests,
            "special_requests",
            MAX_NOTE_LEN,
        )?;
        validate_party_size(request.party_size)?;
        Ok(())
    }

    fn validate_seat_tables(
        &self,
        floor: &FloorModel,
        table_ids: &[i64],
        reservation: &Reservation,
        overlapping: &[Reservation],
    ) -> AppResult<()> {
        if !floor.is_valid_assignment(table_ids, reservation.party_size) {
            return Err(AppError::validation(format!(
                "Tables {table_ids:?} cannot host a party of {}",
                reservation.party_size
            )));
        }
        for &table_id in table_ids {
            if floor.table(table_id).is_some_and(|t| t.out_of_service) {
                return Err(AppError::validation(format!(
                    "Table {table_id} is out of service"
                )));
            }
        }
        if !self.tables_free(
            table_ids,
            overlapping,
            reservation.id,
            reservation.requested_at,
            reservation.ends_at(),
        ) {
            return Err(AppError::validation(format!(
                "Tables {table_ids:?} are occupied for this window"
            )));
        }
        Ok(())
    }

    fn assignment_in_service(&self, floor: &FloorModel, reservation: &Reservation) -> bool {
        !reservation.assigned_table_ids.is_empty()
            && reservation.assigned_table_ids.iter().all(|&id| {
                floor
                    .table(id)
                    .is_some_and(|t| t.is_active && !t.out_of_service)
            })
    }

    fn tables_free(
        &self,
        table_ids: &[i64],
        overlapping: &[Reservation],
        own_id: i64,
        start: i64,
        end: i64,
    ) -> bool {
        table_ids.iter().all(|&table_id| {
            !overlapping
                .iter()
                .any(|r| r.id != own_id && r.blocks_table(table_id, start, end))
        })
    }

    fn day_reservations(&self, date: NaiveDate) -> AppResult<Vec<Reservation>> {
        let day = date.format("%Y-%m-%d").to_string();
        Ok(self.manager.find_by_day(&day)?)
    }

    fn inputs<'a>(
        &self,
        floor: &'a FloorModel,
        schedule: &'a OperatingSchedule,
        reservations: &'a [Reservation],
    ) -> AvailabilityInputs<'a> {
        AvailabilityInputs {
            floor,
            schedule,
            reservations,
            tz: self.config.timezone,
            now_millis: shared::util::now_millis(),
            granularity_minutes: self.config.slot_granularity_minutes,
        }
    }
}
