//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`availability`] - 可订性查询 (只读)
//! - [`reservations`] - 预订准入与生命周期
//! - [`tables`] - 桌台管理接口
//! - [`zones`] - 区域管理接口
//! - [`schedule`] - 营业时间表接口

pub mod availability;
pub mod health;
pub mod reservations;
pub mod schedule;
pub mod tables;
pub mod zones;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(availability::router())
        .merge(reservations::router())
        .merge(tables::router())
        .merge(zones::router())
        .merge(schedule::router())
}

/// Build the full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}
