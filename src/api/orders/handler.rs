//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::api::identity::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CreateOrderRequest, Order, OrderDetail};
use crate::utils::{AppResponse, AppResult, ok};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_limit() -> u32 {
    20
}

/// Paginated order list
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Create an order from the caller's cart
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = state.orders.create_order(&user.user_id, payload).await?;
    Ok(ok(detail))
}

/// List the caller's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<OrderPage>>> {
    let (orders, total) = state
        .orders
        .list_orders(&user.user_id, query.page, query.limit)
        .await?;
    Ok(ok(OrderPage {
        orders,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

/// Get one order with items, owner only
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = state.orders.get_order(&id, &user.user_id).await?;
    Ok(ok(detail))
}

/// Cancel a PENDING order, releasing its stock
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.orders.cancel_order(&id, &user.user_id).await?;
    Ok(ok(()))
}
