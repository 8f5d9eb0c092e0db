//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`orders`] - 订单接口 (用户侧)
//! - [`admin`] - 订单管理接口 (管理侧)
//! - [`identity`] - 请求身份提取
//!
//! 处理器只做薄薄一层：提取身份与参数，调用订单引擎，把领域错误
//! 映射成统一响应。所有业务规则都在 [`crate::orders`] 内。

pub mod admin;
pub mod health;
pub mod identity;
pub mod orders;

use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Build the full application router
pub fn router(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(admin::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
}
