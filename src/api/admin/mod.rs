//! Admin Order API Module
//!
//! 管理侧订单接口：跨用户列表与状态推进。
//! 权限控制在上游网关完成 (认证本身不在本服务范围内)。

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

/// Admin order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", patch(handler::update_status))
}
