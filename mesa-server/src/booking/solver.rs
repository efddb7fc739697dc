//! Assignment solver - picks the concrete tables for an admitted window
//!
//! Candidates come from the floor model already sorted by fit quality
//! (smallest sufficient capacity first, ties by table id); the solver takes
//! the first candidate whose every table is free for the whole window. The
//! result is deterministic for a given floor plan and reservation set.
//!
//! Out-of-service tables are counted at admission time (they are expected
//! back in service) but refused at seat time; callers pick the policy via
//! [`AssignmentRequest::exclude_out_of_service`].

use shared::reservation::Reservation;

use crate::floor::{FloorError, FloorModel, TableChoice};

pub struct AssignmentRequest<'a> {
    pub floor: &'a FloorModel,
    /// Capacity-holding reservations overlapping the window
    pub reservations: &'a [Reservation],
    pub party_size: i32,
    pub zone_id: Option<i64>,
    pub start_millis: i64,
    pub end_millis: i64,
    /// Hint only: candidates containing this table are tried first, in fit
    /// order; admission never fails because the preference is taken
    pub preferred_table_id: Option<i64>,
    pub exclude_out_of_service: bool,
    /// Skip this reservation's own hold (reschedule and seat re-solve)
    pub ignore_reservation: Option<i64>,
}

/// First free candidate in fit-quality order, or `None` when the window is
/// fully booked for this party
pub fn assign(req: &AssignmentRequest<'_>) -> Result<Option<TableChoice>, FloorError> {
    let mut candidates = req
        .floor
        .candidates_for_party(req.party_size, req.zone_id)?;

    if req.exclude_out_of_service {
        candidates.retain(|c| {
            c.table_ids
                .iter()
                .all(|id| req.floor.table(*id).is_some_and(|t| !t.out_of_service))
        });
    }

    // Stable partition: preferred-table candidates keep their fit order,
    // everything else follows
    if let Some(preferred) = req.preferred_table_id {
        let (with, without): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.table_ids.contains(&preferred));
        candidates = with;
        candidates.extend(without);
    }

    Ok(candidates.into_iter().find(|c| choice_is_free(req, c)))
}

fn choice_is_free(req: &AssignmentRequest<'_>, choice: &TableChoice) -> bool {
    choice.table_ids.iter().all(|&table_id| {
        !req.reservations.iter().any(|r| {
            req.ignore_reservation != Some(r.id)
                && r.blocks_table(table_id, req.start_millis, req.end_millis)
        })
    })
}
