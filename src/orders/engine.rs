//! Order Transaction Engine
//!
//! 把校验过的购物车变成持久化的订单 + 行项目 + 库存预留，作为单个
//! 全有或全无的原子单元；取消走完全相反的路径。
//!
//! 语义为 at-most-once-per-call：不做跨客户端重试的幂等去重，网络超时
//! 后客户端重试可能产生第二笔订单 (见 DESIGN.md 的公开问题决策)。

use std::sync::Arc;

use chrono::Utc;
use surrealdb::RecordId;
use validator::Validate;

use super::{OrderError, OrderResult, number, pricing, status};
use crate::db::models::{
    Address, AddressSnapshot, CreateOrderRequest, Order, OrderDetail, OrderItem, OrderStatus,
    PaymentStatus, StatusUpdate,
};
use crate::db::repository::{AddressRepository, OrderRepository, ProductRepository, Tx};
use crate::db::{ConnectionError, ConnectionManager};
use crate::inventory::{self, InventoryLedger, LedgerError, StockLine};

// `order` is a SurrealQL keyword, the table is plural
const ORDER_TABLE: &str = "orders";

/// Markers thrown inside transactions, mapped back to domain errors
const NOT_CANCELLABLE_MARKER: &str = "ORDER_NOT_CANCELLABLE";
const STATUS_CONFLICT_MARKER: &str = "ORDER_STATUS_CONFLICT";

/// Admin list filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// A cart line after the validation pass, with the price frozen
struct OrderLine {
    record: RecordId,
    name: String,
    unit_price: f64,
    quantity: i64,
    size: Option<String>,
    color: Option<String>,
}

/// 订单事务引擎
///
/// 所有数据访问都经由注入的 [`ConnectionManager`]；
/// 引擎自身无内部线程，但在并发调用下安全 (Clone 成本为几个 Arc)。
#[derive(Clone)]
pub struct OrderEngine {
    conn: Arc<ConnectionManager>,
    orders: OrderRepository,
    products: ProductRepository,
    addresses: AddressRepository,
    ledger: InventoryLedger,
}

impl OrderEngine {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self {
            orders: OrderRepository::new(Arc::clone(&conn)),
            products: ProductRepository::new(Arc::clone(&conn)),
            addresses: AddressRepository::new(Arc::clone(&conn)),
            ledger: InventoryLedger::new(Arc::clone(&conn)),
            conn,
        }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Create an order from a proposed cart
    ///
    /// 1. 输入校验 (非空、数量为正)
    /// 2. 地址必须属于下单用户
    /// 3. 只读校验：商品存在、激活、库存充足；当前目录价在此刻冻结
    /// 4. 定价 (Decimal 精度)
    /// 5. 单事务提交：订单 + 行项目 + 库存预留；任何一步失败则无任何痕迹
    ///
    /// 订单编号的唯一索引冲突会重新生成编号并重试一次。
    pub async fn create_order(
        &self,
        user_id: &str,
        request: CreateOrderRequest,
    ) -> OrderResult<OrderDetail> {
        request.validate()?;

        let address = self
            .addresses
            .find_owned(&request.address_id, user_id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        let lines = self.validate_cart(&request).await?;
        let priced: Vec<(f64, i64)> = lines.iter().map(|l| (l.unit_price, l.quantity)).collect();
        let totals = pricing::price_cart(&priced);

        let mut retried = false;
        loop {
            let order_number = number::generate();
            match self
                .commit_creation(user_id, &request, &address, &lines, &totals, &order_number)
                .await
            {
                Ok(detail) => {
                    tracing::info!(
                        order = %order_number,
                        user = %user_id,
                        total = totals.total_amount,
                        "Order created"
                    );
                    return Ok(detail);
                }
                Err(OrderError::DuplicateOrderNumber) if !retried => {
                    retried = true;
                    tracing::warn!(order = %order_number, "Order number collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Read-only validation pass over the cart
    async fn validate_cart(&self, request: &CreateOrderRequest) -> OrderResult<Vec<OrderLine>> {
        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = self
                .products
                .find_by_id(&item.product_id)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound(item.product_id.clone()))?;
            if !product.is_active {
                return Err(OrderError::ProductInactive(item.product_id.clone()));
            }
            if product.stock < item.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id.clone(),
                });
            }
            let record = product
                .id
                .ok_or_else(|| OrderError::Storage("product record without id".into()))?;
            lines.push(OrderLine {
                record,
                name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
            });
        }
        Ok(lines)
    }

    /// Commit order + items + reservation as one atomic unit
    async fn commit_creation(
        &self,
        user_id: &str,
        request: &CreateOrderRequest,
        address: &Address,
        lines: &[OrderLine],
        totals: &pricing::CartTotals,
        order_number: &str,
    ) -> OrderResult<OrderDetail> {
        let db = self.acquire().await?;

        // Record key derived from the unique order number keeps the two in
        // lockstep; a number collision therefore also collides on the id.
        let order_key = RecordId::from_table_key(ORDER_TABLE, order_number);

        let order = Order {
            id: None,
            order_number: order_number.to_string(),
            user_id: user_id.to_string(),
            address_id: request.address_id.clone(),
            shipping_address: AddressSnapshot::from(address),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: request.payment_method.clone(),
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            notes: request.notes.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        let mut tx = Tx::new();

        // Stock first: the conditional decrement is the race-free guard
        let reserve: Vec<StockLine> = lines
            .iter()
            .map(|l| (l.record.clone(), l.quantity))
            .collect();
        self.ledger.stage_reserve(&mut tx, &reserve);

        tx.push("CREATE $order_id CONTENT $order_data");
        tx.bind_record("order_id", order_key.clone());
        tx.bind_json(
            "order_data",
            serde_json::to_value(&order).map_err(|e| OrderError::Storage(e.to_string()))?,
        );

        for (idx, line) in lines.iter().enumerate() {
            let item = OrderItem {
                id: None,
                order_id: order_key.to_string(),
                product_id: line.record.to_string(),
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                size: line.size.clone(),
                color: line.color.clone(),
            };
            let key = format!("item{idx}");
            tx.push(format!("CREATE order_item CONTENT ${key}"));
            tx.bind_json(
                key,
                serde_json::to_value(&item).map_err(|e| OrderError::Storage(e.to_string()))?,
            );
        }

        if let Err(err) = tx.commit(&db).await {
            return Err(self.map_commit_error(err).await);
        }

        Ok(self.orders.detail(&order_key).await?)
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// Cancel a PENDING order owned by the user
    ///
    /// 单事务：状态翻转 (以所有者 + PENDING 为条件) + 释放全部行项目库存。
    /// 条件不满足 (订单不存在 / 非本人 / 状态不对) 统一返回
    /// [`OrderError::NotCancellable`]。
    pub async fn cancel_order(&self, order_id: &str, user_id: &str) -> OrderResult<()> {
        let record: RecordId = order_id.parse().map_err(|_| OrderError::NotCancellable)?;

        // Line items are immutable once created, safe to read outside the tx
        let items = self.orders.items_of(&record).await?;
        let release: Vec<StockLine> = items
            .iter()
            .filter_map(|i| i.product_id.parse().ok().map(|r| (r, i.quantity)))
            .collect();

        let db = self.acquire().await?;
        let mut tx = Tx::new();
        tx.push(
            "LET $cancelled = (UPDATE $order_id SET status = $to_status \
             WHERE user_id = $user_id AND status IN $from_statuses)",
        );
        tx.push(format!(
            "IF array::len($cancelled) == 0 {{ THROW \"{NOT_CANCELLABLE_MARKER}\" }}"
        ));
        tx.bind_record("order_id", record);
        tx.bind_json("user_id", serde_json::Value::from(user_id));
        tx.bind_json(
            "from_statuses",
            serde_json::to_value(status::user_cancellable())
                .map_err(|e| OrderError::Storage(e.to_string()))?,
        );
        tx.bind_json("to_status", status_value(OrderStatus::Cancelled)?);
        self.ledger.stage_release(&mut tx, &release);

        tx.commit(&db).await.map_err(|err| {
            let message = err.to_string();
            if message.contains(NOT_CANCELLABLE_MARKER) {
                OrderError::NotCancellable
            } else {
                OrderError::Storage(message)
            }
        })?;

        tracing::info!(order = %order_id, user = %user_id, "Order cancelled, stock released");
        Ok(())
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Fetch one order with items, scoped to its owner
    ///
    /// 非本人访问统一返回 NotFound，不区分"不存在"和"无权"。
    pub async fn get_order(&self, order_id: &str, user_id: &str) -> OrderResult<OrderDetail> {
        let record: RecordId = order_id
            .parse()
            .map_err(|_| OrderError::NotFound(order_id.to_string()))?;
        let detail = self.orders.detail(&record).await?;
        if detail.order.user_id != user_id {
            return Err(OrderError::NotFound(order_id.to_string()));
        }
        Ok(detail)
    }

    /// User's orders, newest first, with total count
    pub async fn list_orders(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> OrderResult<(Vec<Order>, i64)> {
        Ok(self.orders.list_for_user(user_id, page, limit).await?)
    }

    /// All orders without the ownership restriction (admin surface)
    pub async fn list_all_orders(
        &self,
        filter: OrderFilter,
        page: u32,
        limit: u32,
    ) -> OrderResult<(Vec<Order>, i64)> {
        Ok(self.orders.list_all(filter.status, page, limit).await?)
    }

    // =========================================================================
    // Admin status updates
    // =========================================================================

    /// Update order and/or payment status (admin surface)
    ///
    /// 状态机唯一约束是 CANCELLED 为终态；转入 CANCELLED 时在同一事务中
    /// 释放库存，保证账本与未取消行项目的一致性。
    /// 乐观守卫：以读取到的当前状态为条件，并发变更会使更新落空并中止。
    pub async fn update_order_status(
        &self,
        order_id: &str,
        update: StatusUpdate,
    ) -> OrderResult<Order> {
        let record: RecordId = order_id
            .parse()
            .map_err(|_| OrderError::NotFound(order_id.to_string()))?;
        let current = self
            .orders
            .find_by_id(&record)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        let mut tx = Tx::new();
        let mut assignments: Vec<&str> = Vec::new();

        if let Some(to) = update.status {
            if !status::can_transition(current.status, to) {
                return Err(OrderError::InvalidTransition {
                    from: current.status,
                    to,
                });
            }
            assignments.push("status = $status");
            tx.bind_json("status", status_value(to)?);

            if to == OrderStatus::Cancelled {
                // Cancelling administratively still returns the reservation
                let items = self.orders.items_of(&record).await?;
                let release: Vec<StockLine> = items
                    .iter()
                    .filter_map(|i| i.product_id.parse().ok().map(|r| (r, i.quantity)))
                    .collect();
                self.ledger.stage_release(&mut tx, &release);
            }
        }

        if let Some(payment) = update.payment_status {
            assignments.push("payment_status = $payment_status");
            tx.bind_json(
                "payment_status",
                serde_json::to_value(payment).map_err(|e| OrderError::Storage(e.to_string()))?,
            );
        }

        if assignments.is_empty() {
            return Ok(current);
        }

        tx.push(format!(
            "LET $updated = (UPDATE $order_id SET {} WHERE status = $current)",
            assignments.join(", ")
        ));
        tx.push(format!(
            "IF array::len($updated) == 0 {{ THROW \"{STATUS_CONFLICT_MARKER}\" }}"
        ));
        tx.bind_record("order_id", record.clone());
        tx.bind_json("current", status_value(current.status)?);

        let db = self.acquire().await?;
        tx.commit(&db).await.map_err(|err| {
            let message = err.to_string();
            if message.contains(STATUS_CONFLICT_MARKER) {
                OrderError::Conflict("order status changed concurrently".to_string())
            } else {
                OrderError::Storage(message)
            }
        })?;

        tracing::info!(
            order = %order_id,
            status = ?update.status,
            payment_status = ?update.payment_status,
            "Order status updated"
        );

        self.orders
            .find_by_id(&record)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn acquire(&self) -> OrderResult<surrealdb::Surreal<surrealdb::engine::any::Any>> {
        self.conn.acquire().await.map_err(|err: ConnectionError| {
            tracing::error!(error = %err, "Datastore unavailable at request time");
            OrderError::Unavailable
        })
    }

    /// Map a creation-transaction failure back to the domain taxonomy
    ///
    /// 预留失败走账本的类型化分类；`PRODUCT_UNAVAILABLE` 再探一次商品，
    /// 区分"事务中途被删除"和"事务中途被下架"。
    async fn map_commit_error(&self, err: surrealdb::Error) -> OrderError {
        let message = err.to_string();
        if let Some(ledger_err) = inventory::classify_failure(&message) {
            return match ledger_err {
                LedgerError::InsufficientStock { product_id } => {
                    OrderError::InsufficientStock { product_id }
                }
                LedgerError::ProductUnavailable { product_id } => {
                    match self.products.find_by_id(&product_id).await {
                        Ok(None) => OrderError::ProductNotFound(product_id),
                        _ => OrderError::ProductInactive(product_id),
                    }
                }
                LedgerError::Repo(repo_err) => repo_err.into(),
            };
        }
        if message.contains("uniq_order_number") || message.contains("already exists") {
            return OrderError::DuplicateOrderNumber;
        }
        OrderError::Storage(message)
    }
}

/// Serialize a status enum for use as a query binding
fn status_value(status: OrderStatus) -> OrderResult<serde_json::Value> {
    serde_json::to_value(status).map_err(|e| OrderError::Storage(e.to_string()))
}
