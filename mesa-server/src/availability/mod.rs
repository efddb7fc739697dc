//! Availability calculator
//!
//! Pure functions over `(floor model, schedule, reservation set, now)`.
//! No side effects, no interior state: calling twice with identical inputs
//! yields identical output, which is what makes the admission path testable
//! and the coordinator free to re-check under its lock.
//!
//! A slot is available when at least one fit-quality candidate from the
//! floor model has no capacity-holding reservation anywhere in
//! `[slot, slot + duration)`. Slots whose window would cross the interval
//! close are excluded - parties must be seatable without being rushed out.
//! Same-day slots already in the past are excluded as well.

use chrono::{Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use shared::models::OperatingSchedule;
use shared::reservation::{AvailabilityReport, Reservation, TimeSlot};

use crate::floor::{FloorError, FloorModel, TableChoice};
use crate::utils::time;

/// Everything slot computation depends on, captured explicitly
#[derive(Clone, Copy)]
pub struct AvailabilityInputs<'a> {
    pub floor: &'a FloorModel,
    pub schedule: &'a OperatingSchedule,
    /// Reservations that may block tables on the queried day; statuses that
    /// no longer hold capacity are ignored internally
    pub reservations: &'a [Reservation],
    pub tz: Tz,
    /// "Now" for same-day past-slot exclusion, Unix millis
    pub now_millis: i64,
    pub granularity_minutes: i64,
}

/// Whether `choice` has every table free over `[start, end)`
fn choice_is_free(choice: &TableChoice, reservations: &[Reservation], start: i64, end: i64) -> bool {
    choice.table_ids.iter().all(|&table_id| {
        !reservations
            .iter()
            .any(|r| r.blocks_table(table_id, start, end))
    })
}

/// Whether some candidate can seat the party over `[start, start+duration)`
pub fn slot_is_available(
    inputs: &AvailabilityInputs<'_>,
    start_millis: i64,
    duration_minutes: i64,
    party_size: i32,
    zone_id: Option<i64>,
) -> Result<bool, FloorError> {
    let end = start_millis + duration_minutes * 60_000;
    let candidates = inputs.floor.candidates_for_party(party_size, zone_id)?;
    Ok(candidates
        .iter()
        .any(|c| choice_is_free(c, inputs.reservations, start_millis, end)))
}

/// All bookable slots on `date` for a party, in chronological order
///
/// Candidate starts come from quantizing each open interval of the weekday
/// at the configured granularity.
pub fn available_slots(
    inputs: &AvailabilityInputs<'_>,
    date: NaiveDate,
    party_size: i32,
    duration_minutes: i64,
    zone_id: Option<i64>,
) -> Result<Vec<TimeSlot>, FloorError> {
    let step = inputs.granularity_minutes * 60_000;
    let duration = duration_minutes * 60_000;
    let mut slots = Vec::new();

    for interval in inputs.schedule.intervals_for(date.weekday()) {
        let (Some(open), Some(close)) = (interval.open_time(), interval.close_time()) else {
            tracing::warn!(
                open = %interval.open,
                close = %interval.close,
                "Skipping malformed schedule interval"
            );
            continue;
        };
        let open_millis = time::date_time_to_millis(date, open, inputs.tz);
        let close_millis = time::date_time_to_millis(date, close, inputs.tz);

        let mut start = open_millis;
        // Last admissible start leaves the full duration before close
        while start + duration <= close_millis {
            if start >= inputs.now_millis
                && slot_is_available(inputs, start, duration_minutes, party_size, zone_id)?
            {
                slots.push(TimeSlot {
                    time: time::millis_to_hhmm(start, inputs.tz),
                    timestamp_millis: start,
                });
            }
            start += step;
        }
    }

    slots.sort_by_key(|s| s.timestamp_millis);
    Ok(slots)
}

/// Exact-slot check with nearest same-day alternatives on rejection
///
/// Alternatives are ordered nearest-first by absolute distance to the
/// requested time, earlier slot winning ties, capped at `max_alternatives`.
pub fn check(
    inputs: &AvailabilityInputs<'_>,
    date: NaiveDate,
    requested: NaiveTime,
    party_size: i32,
    duration_minutes: i64,
    zone_id: Option<i64>,
    max_alternatives: usize,
) -> Result<AvailabilityReport, FloorError> {
    let requested_millis = time::date_time_to_millis(date, requested, inputs.tz);

    let within_schedule = inputs.schedule.intervals_for(date.weekday()).iter().any(|i| {
        match (i.open_time(), i.close_time()) {
            (Some(open), Some(close)) => {
                let open_millis = time::date_time_to_millis(date, open, inputs.tz);
                let close_millis = time::date_time_to_millis(date, close, inputs.tz);
                requested_millis >= open_millis
                    && requested_millis + duration_minutes * 60_000 <= close_millis
            }
            _ => false,
        }
    });

    let available = within_schedule
        && requested_millis >= inputs.now_millis
        && slot_is_available(inputs, requested_millis, duration_minutes, party_size, zone_id)?;

    if available {
        return Ok(AvailabilityReport {
            available: true,
            alternative_slots: vec![],
        });
    }

    let mut alternatives =
        available_slots(inputs, date, party_size, duration_minutes, zone_id)?;
    alternatives.retain(|s| s.timestamp_millis != requested_millis);
    alternatives.sort_by_key(|s| {
        (
            (s.timestamp_millis - requested_millis).abs(),
            s.timestamp_millis,
        )
    });
    alternatives.truncate(max_alternatives);

    Ok(AvailabilityReport {
        available: false,
        alternative_slots: alternatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{DiningTable, OpenInterval};
    use shared::reservation::{Customer, ReservationSource, ReservationStatus};

    const TZ: Tz = chrono_tz::Europe::Madrid;

    fn table(id: i64, capacity: i32) -> DiningTable {
        DiningTable {
            id,
            name: format!("T{id}"),
            zone_id: 1,
            capacity,
            min_capacity: 1,
            combinable_with: vec![],
            out_of_service: false,
            is_active: true,
        }
    }

    fn reservation(id: i64, table_id: i64, start_hhmm: &str, duration: i64) -> Reservation {
        let date = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
        let start = time::date_time_to_millis(
            date,
            NaiveTime::parse_from_str(start_hhmm, "%H:%M").unwrap(),
            TZ,
        );
        Reservation {
            id,
            reservation_number: format!("RSV2026090410{id:03}"),
            customer: Customer {
                name: "Ana".into(),
                phone: "600000000".into(),
                email: None,
            },
            party_size: 2,
            requested_at: start,
            duration_minutes: duration,
            assigned_table_ids: vec![table_id],
            status: ReservationStatus::Confirmed,
            source: ReservationSource::Online,
            special_requests: None,
            cancel_reason: None,
            created_at: start,
            updated_at: start,
        }
    }

    /// Dinner service 19:00-22:30, one slot every 30 minutes
    fn dinner_schedule() -> OperatingSchedule {
        OperatingSchedule::uniform(vec![OpenInterval::new("19:00", "22:30")])
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 4).unwrap()
    }

    fn inputs<'a>(
        floor: &'a FloorModel,
        schedule: &'a OperatingSchedule,
        reservations: &'a [Reservation],
    ) -> AvailabilityInputs<'a> {
        AvailabilityInputs {
            floor,
            schedule,
            reservations,
            tz: TZ,
            now_millis: 0, // far past: nothing excluded as stale
            granularity_minutes: 30,
        }
    }

    #[test]
    fn slots_respect_the_close_boundary() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        let ctx = inputs(&floor, &schedule, &[]);

        let slots = available_slots(&ctx, test_date(), 2, 90, None).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        // 21:00 + 90min = 22:30 exactly fits the close; 21:30 would not
        assert_eq!(times, vec!["19:00", "19:30", "20:00", "20:30", "21:00"]);
    }

    #[test]
    fn closed_day_has_no_slots() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = OperatingSchedule::default();
        let ctx = inputs(&floor, &schedule, &[]);
        let slots = available_slots(&ctx, test_date(), 2, 90, None).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn past_slots_are_excluded_for_same_day() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        let mut ctx = inputs(&floor, &schedule, &[]);
        // "Now" is 20:10 on the query day
        ctx.now_millis = time::date_time_to_millis(
            test_date(),
            NaiveTime::from_hms_opt(20, 10, 0).unwrap(),
            TZ,
        );

        let slots = available_slots(&ctx, test_date(), 2, 90, None).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["20:30", "21:00"]);
    }

    #[test]
    fn computation_is_deterministic() {
        let floor = FloorModel::new(vec![table(1, 2), table(2, 4)]);
        let schedule = dinner_schedule();
        let existing = [reservation(1, 1, "19:30", 90)];
        let ctx = inputs(&floor, &schedule, &existing);

        let first = available_slots(&ctx, test_date(), 2, 90, None).unwrap();
        let second = available_slots(&ctx, test_date(), 2, 90, None).unwrap();
        assert_eq!(first, second);
    }

    /// Spec scenario: single cap-2 table booked 19:30-21:00; a request for
    /// 19:00 overlaps and the only alternative is 21:00 (21:00+90 = close).
    #[test]
    fn single_table_alternatives_skip_the_blocked_window() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        let existing = [reservation(1, 1, "19:30", 90)];
        let ctx = inputs(&floor, &schedule, &existing);

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            2,
            90,
            None,
            3,
        )
        .unwrap();

        assert!(!report.available);
        let times: Vec<&str> = report.alternative_slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["21:00"]);
    }

    /// Same scenario with a second free table: the exact slot is available.
    #[test]
    fn second_table_absorbs_the_overlap() {
        let floor = FloorModel::new(vec![table(1, 2), table(2, 2)]);
        let schedule = dinner_schedule();
        let existing = [reservation(1, 1, "19:30", 90)];
        let ctx = inputs(&floor, &schedule, &existing);

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            2,
            90,
            None,
            3,
        )
        .unwrap();
        assert!(report.available);
        assert!(report.alternative_slots.is_empty());
    }

    #[test]
    fn no_alternatives_when_every_window_collides() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        // A 20:00-21:30 booking on the only table leaves no 90-minute
        // window anywhere in 19:00-22:30
        let existing = [reservation(1, 1, "20:00", 90)];
        let ctx = inputs(&floor, &schedule, &existing);

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            2,
            90,
            None,
            3,
        )
        .unwrap();

        assert!(!report.available);
        assert!(report.alternative_slots.is_empty());
    }

    #[test]
    fn alternatives_prefer_the_closer_slot() {
        // Two tables so there are plenty of free slots around a blocked one
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = OperatingSchedule::uniform(vec![OpenInterval::new("12:00", "23:00")]);
        let existing = [reservation(1, 1, "15:00", 60)];
        let mut ctx = inputs(&floor, &schedule, &existing);
        ctx.granularity_minutes = 60;

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            2,
            60,
            None,
            3,
        )
        .unwrap();

        assert!(!report.available);
        let times: Vec<&str> = report.alternative_slots.iter().map(|s| s.time.as_str()).collect();
        // 14:00 and 16:00 are equidistant: earlier wins; 13:00 comes third
        assert_eq!(times, vec!["14:00", "16:00", "13:00"]);
    }

    #[test]
    fn cancelled_reservations_do_not_block() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        let mut existing = reservation(1, 1, "19:30", 90);
        existing.status = ReservationStatus::Cancelled;
        let held = [existing];
        let ctx = inputs(&floor, &schedule, &held);

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            2,
            90,
            None,
            3,
        )
        .unwrap();
        assert!(report.available);
    }

    #[test]
    fn outside_schedule_is_unavailable_with_alternatives() {
        let floor = FloorModel::new(vec![table(1, 2)]);
        let schedule = dinner_schedule();
        let ctx = inputs(&floor, &schedule, &[]);

        let report = check(
            &ctx,
            test_date(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            2,
            90,
            None,
            2,
        )
        .unwrap();
        assert!(!report.available);
        let times: Vec<&str> = report.alternative_slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["19:00", "19:30"]);
    }
}
