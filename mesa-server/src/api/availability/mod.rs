//! Availability API 模块 - 只读可订性查询
//!
//! 查询结果是建议性的：真正的准入判定发生在 POST /api/reservations
//! 的时段锁之内，两次查询之间时段可能被订走。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/availability", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::check))
        .route("/slots", get(handler::slots))
}
