//! Order Repository
//!
//! Read access to orders and line items. All order mutations go through the
//! transaction engine's atomic commits; nothing here updates state.

use std::sync::Arc;

use surrealdb::RecordId;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::ConnectionManager;
use crate::db::models::{Order, OrderDetail, OrderItem, OrderStatus};

#[derive(Debug, serde::Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    /// Find order by record id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .await?
            .query("SELECT * FROM orders WHERE id = $id")
            .bind(("id", id.clone()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Line items of an order (immutable once created)
    pub async fn items_of(&self, order: &RecordId) -> RepoResult<Vec<OrderItem>> {
        let items: Vec<OrderItem> = self
            .base
            .db()
            .await?
            .query("SELECT * FROM order_item WHERE order_id = $order_ref ORDER BY product_id")
            .bind(("order_ref", order.to_string()))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Fully materialized order with its line items
    pub async fn detail(&self, order: &RecordId) -> RepoResult<OrderDetail> {
        let record = self
            .find_by_id(order)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order)))?;
        let items = self.items_of(order).await?;
        Ok(OrderDetail {
            order: record,
            items,
        })
    }

    /// Orders of one user, newest first, with total count
    pub async fn list_for_user(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let start = page.saturating_sub(1) as i64 * limit as i64;
        let mut result = self
            .base
            .db()
            .await?
            .query(
                "SELECT * FROM orders WHERE user_id = $user ORDER BY created_at DESC \
                 LIMIT $limit START $start;\n\
                 SELECT count() AS count FROM orders WHERE user_id = $user GROUP ALL",
            )
            .bind(("user", user_id.to_string()))
            .bind(("limit", limit as i64))
            .bind(("start", start))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((orders, total))
    }

    /// All orders (admin view), optionally filtered by status, newest first
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let start = page.saturating_sub(1) as i64 * limit as i64;
        let filter = if status.is_some() {
            "WHERE status = $status "
        } else {
            ""
        };
        let sql = format!(
            "SELECT * FROM orders {filter}ORDER BY created_at DESC LIMIT $limit START $start;\n\
             SELECT count() AS count FROM orders {filter}GROUP ALL"
        );

        let db = self.base.db().await?;
        let mut query = db
            .query(sql)
            .bind(("limit", limit as i64))
            .bind(("start", start));
        if let Some(status) = status {
            let value = serde_json::to_value(status)
                .map_err(|e| RepoError::Database(e.to_string()))?;
            query = query.bind(("status", value));
        }

        let mut result = query.await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((orders, total))
    }
}
