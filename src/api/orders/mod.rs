//! Order API Module
//!
//! 用户侧订单接口。所有写操作都经由订单引擎的原子事务。

pub mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 全部路由要求 x-user-id 身份头 (由 CurrentUser 提取器强制)
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
}
