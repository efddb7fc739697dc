//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - API 响应结构
//!
//! # 错误码规范
//!
//! | 前缀 | 分类 | 示例 |
//! |------|------|------|
//! | E0xxx | 请求错误 | E0002 验证失败 |
//! | E41xx | 预订业务错误 | E4101 无可用桌台 |
//! | E9xxx | 系统错误 | E9002 数据库错误 |
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::not_found("Reservation 42 not found"))
//!
//! // 返回成功响应
//! Ok(Json(reservation))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::reservation::TimeSlot;
use tracing::error;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E4101",
///   "message": "No table available",
///   "data": { "alternative_slots": [...] }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功)
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Body attached to a NoCapacity rejection so the front end can offer
/// alternatives without a second round trip
#[derive(Debug, Serialize)]
struct NoCapacityBody {
    alternative_slots: Vec<TimeSlot>,
}

/// 应用错误枚举
///
/// # 错误分类
///
/// | 分类 | 说明 | 可重试 |
/// |------|------|--------|
/// | 请求错误 | 验证失败、资源不存在 | 否 |
/// | 预订业务错误 | 无容量、非法状态迁移、锁竞争、无桌台配置 | 仅 Busy |
/// | 系统错误 | 数据库错误、内部错误 | 否 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 请求错误 (4xx) ==========
    #[error("Validation failed: {0}")]
    /// 验证失败 (400) - 永不重试
    Validation(String),

    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    // ========== 预订业务错误 ==========
    #[error("No table satisfies the request")]
    /// 无可用桌台 (409) - 确定性拒绝，附带替代时段
    NoCapacity { alternatives: Vec<TimeSlot> },

    #[error("Invalid transition: {from} -> {event}")]
    /// 非法状态迁移 (422) - 调用方逻辑错误，永不重试
    InvalidTransition { from: String, event: String },

    #[error("Booking window is busy, retry later")]
    /// 锁竞争 (503) - 瞬态，可退避重试
    Busy,

    #[error("No floor plan configured")]
    /// 无桌台配置 (500) - 需管理员修复
    NoFloorPlan,

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // NoCapacity carries structure: alternatives ride in `data`
        if let AppError::NoCapacity { alternatives } = self {
            let body = Json(AppResponse {
                code: "E4101".to_string(),
                message: "No table available for the requested slot".to_string(),
                data: Some(NoCapacityBody {
                    alternative_slots: alternatives,
                }),
            });
            return (StatusCode::CONFLICT, body).into_response();
        }

        let (status, code, message) = match &self {
            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),

            // Invalid transition (422)
            AppError::InvalidTransition { from, event } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "E4102",
                format!("Illegal transition: cannot {} a {} reservation", event, from),
            ),

            // Lock contention (503)
            AppError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "E4103",
                "Booking window is busy, retry later".to_string(),
            ),

            // Configuration error (500)
            AppError::NoFloorPlan => {
                error!(target: "floor", "No floor plan configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E4104",
                    "No floor plan configured for this restaurant".to_string(),
                )
            }

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }

            AppError::NoCapacity { .. } => unreachable!("handled above"),
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
