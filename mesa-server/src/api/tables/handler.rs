//! Dining Table API Handlers
//!
//! 桌台变更会使楼面模型缓存失效；已存在的预订保留其桌台引用，
//! 失效桌台在入座时由协调器重新求解。

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

use crate::core::ServerState;
use crate::utils::{
    AppError, AppResult,
    validation::{MAX_NAME_LEN, validate_capacity, validate_required_text},
};

const RESOURCE: &str = "dining_table";

/// GET /api/tables - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = state.floor.repository().find_all_tables()?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .floor
        .repository()
        .find_table(id)?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))?;
    Ok(Json(table))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(capacity) = payload.capacity {
        validate_capacity(capacity, payload.min_capacity.unwrap_or(1))?;
    }
    state
        .floor
        .repository()
        .find_zone(payload.zone_id)?
        .ok_or_else(|| AppError::validation(format!("Zone {} does not exist", payload.zone_id)))?;

    let table = state.floor.repository().create_table(payload)?;
    state.floor.invalidate();

    let version = state.resource_versions.increment(RESOURCE);
    tracing::info!(table_id = table.id, version, "Dining table created");
    Ok(Json(table))
}

/// PUT /api/tables/:id - 更新桌台
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    if let (Some(capacity), min) = (payload.capacity, payload.min_capacity) {
        validate_capacity(capacity, min.unwrap_or(1))?;
    }

    let table = state.floor.repository().update_table(id, payload)?;
    state.floor.invalidate();

    let version = state.resource_versions.increment(RESOURCE);
    tracing::info!(table_id = id, version, "Dining table updated");
    Ok(Json(table))
}

/// DELETE /api/tables/:id - 删除桌台 (软删除，历史预订保留引用)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = state.floor.repository().delete_table(id)?;
    if removed {
        state.floor.invalidate();
        let version = state.resource_versions.increment(RESOURCE);
        tracing::info!(table_id = id, version, "Dining table deleted");
    }
    Ok(Json(removed))
}
