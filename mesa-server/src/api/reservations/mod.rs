//! Reservations API 模块 - 准入与生命周期
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/reservations | POST | 预订准入 (幂等, command_id) |
//! | /api/reservations?date= | GET | 按营业日列出 |
//! | /api/reservations/{id} | GET | 单条查询 |
//! | /api/reservations/{id}/events | GET | 审计事件流 |
//! | /api/reservations/{id}/confirm | POST | 确认 |
//! | /api/reservations/{id}/reschedule | POST | 改期 (重新准入) |
//! | /api/reservations/{id}/status | PATCH | 生命周期迁移 |
//! | /api/reservations/{id} | DELETE | 取消 |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        .route("/{id}/events", get(handler::events))
        .route("/{id}/confirm", post(handler::confirm))
        .route("/{id}/reschedule", post(handler::reschedule))
        .route("/{id}/status", patch(handler::change_status))
}
