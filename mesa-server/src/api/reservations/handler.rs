//! Reservations API Handlers
//!
//! 所有写操作都走 BookingCoordinator；处理器只做参数提取与响应包装。

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::reservation::{
    BookingRequest, CancelRequest, RescheduleRequest, Reservation, ReservationEvent,
    StatusChangeRequest,
};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, time::parse_date};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// `YYYY-MM-DD` (business timezone)
    pub date: String,
}

/// POST /api/reservations - 预订准入
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state.coordinator.book(payload).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// GET /api/reservations?date= - 按营业日列出 (按开始时间排序)
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Reservation>>> {
    // 校验日期格式，避免把任意字符串当索引键
    parse_date(&params.date)?;
    let reservations = state.manager.find_by_day(&params.date)?;
    Ok(Json(reservations))
}

/// GET /api/reservations/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    Ok(Json(state.manager.get(id)?))
}

/// GET /api/reservations/{id}/events - 审计事件流 (顺序号升序)
pub async fn events(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<ReservationEvent>>> {
    let events = state.manager.storage().events_for_reservation(id)?;
    if events.is_empty() {
        return Err(AppError::not_found(format!("Reservation {id} not found")));
    }
    Ok(Json(events))
}

/// POST /api/reservations/{id}/reschedule - 改期
pub async fn reschedule(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RescheduleRequest>,
) -> AppResult<Json<Reservation>> {
    Ok(Json(state.coordinator.reschedule(id, payload).await?))
}

/// POST /api/reservations/{id}/confirm - 确认 (PATCH status 的便捷别名)
pub async fn confirm(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    Ok(Json(state.coordinator.confirm(id)?))
}

/// PATCH /api/reservations/{id}/status - 生命周期迁移
pub async fn change_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusChangeRequest>,
) -> AppResult<Json<Reservation>> {
    Ok(Json(state.coordinator.apply_status_change(id, payload).await?))
}

/// DELETE /api/reservations/{id} - 取消 (body 可省略)
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    payload: Option<Json<CancelRequest>>,
) -> AppResult<Json<Reservation>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    Ok(Json(state.coordinator.cancel(id, reason)?))
}
