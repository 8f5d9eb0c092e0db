//! Admin Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::orders::handler::{OrderPage, default_limit, default_page};
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus, StatusUpdate};
use crate::orders::OrderFilter;
use crate::utils::{AppResponse, AppResult, ok};

/// Query params for the admin order list
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// List all orders, optionally filtered by status
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<AppResponse<OrderPage>>> {
    let filter = OrderFilter {
        status: query.status,
    };
    let (orders, total) = state
        .orders
        .list_all_orders(filter, query.page, query.limit)
        .await?;
    Ok(ok(OrderPage {
        orders,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

/// Update order status and/or payment status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.update_order_status(&id, payload).await?;
    Ok(ok(order))
}
