//! Zone API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Zone, ZoneCreate, ZoneUpdate};

use crate::core::ServerState;
use crate::utils::{
    AppError, AppResult,
    validation::{MAX_NAME_LEN, validate_required_text},
};

const RESOURCE: &str = "zone";

/// GET /api/zones - 获取所有区域
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Zone>>> {
    let zones = state.floor.repository().find_all_zones()?;
    Ok(Json(zones))
}

/// GET /api/zones/:id - 获取单个区域
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Zone>> {
    let zone = state
        .floor
        .repository()
        .find_zone(id)?
        .ok_or_else(|| AppError::not_found(format!("Zone {id} not found")))?;
    Ok(Json(zone))
}

/// POST /api/zones - 创建区域
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ZoneCreate>,
) -> AppResult<Json<Zone>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let zone = state.floor.repository().create_zone(payload)?;

    let version = state.resource_versions.increment(RESOURCE);
    tracing::info!(zone_id = zone.id, version, "Zone created");
    Ok(Json(zone))
}

/// PUT /api/zones/:id - 更新区域
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ZoneUpdate>,
) -> AppResult<Json<Zone>> {
    let zone = state.floor.repository().update_zone(id, payload)?;

    let version = state.resource_versions.increment(RESOURCE);
    tracing::info!(zone_id = id, version, "Zone updated");
    Ok(Json(zone))
}

/// DELETE /api/zones/:id - 删除区域 (仍有活动桌台时拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = state.floor.repository().delete_zone(id)?;
    if removed {
        let version = state.resource_versions.increment(RESOURCE);
        tracing::info!(zone_id = id, version, "Zone deleted");
    }
    Ok(Json(removed))
}
