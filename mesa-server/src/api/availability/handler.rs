//! Availability API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::reservation::{AvailabilityReport, TimeSlot};

use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    /// `YYYY-MM-DD` (business timezone)
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub party_size: i32,
    pub zone_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsParams {
    pub date: String,
    pub party_size: i32,
    pub zone_id: Option<i64>,
}

/// GET /api/availability - 单时段可订性 (含替代时段)
pub async fn check(
    State(state): State<ServerState>,
    Query(params): Query<CheckParams>,
) -> AppResult<Json<AvailabilityReport>> {
    let report = state.coordinator.check_availability(
        &params.date,
        &params.time,
        params.party_size,
        params.zone_id,
    )?;
    Ok(Json(report))
}

/// GET /api/availability/slots - 当日全部可订时段
pub async fn slots(
    State(state): State<ServerState>,
    Query(params): Query<SlotsParams>,
) -> AppResult<Json<Vec<TimeSlot>>> {
    let slots =
        state
            .coordinator
            .available_slots(&params.date, params.party_size, params.zone_id)?;
    Ok(Json(slots))
}
