//! Order Model
//!
//! 订单及其行项目。行项目在创建后不可变 (商品、数量、单价快照均冻结)，
//! 订单从不物理删除，生命周期由状态字段表达。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::address::AddressSnapshot;
use super::serde_helpers;

// =============================================================================
// Status enums
// =============================================================================

/// Order status. CANCELLED is the only terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status — an independent axis, not linked to order status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

// =============================================================================
// Order (主表)
// =============================================================================

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Human-readable number, `ORD-<millis>-<6 chars>`, globally unique
    pub order_number: String,
    pub user_id: String,
    pub address_id: String,
    /// Address frozen at order time
    pub shipping_address: AddressSnapshot,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub tax_amount: f64,
    /// Always equals subtotal + shipping_cost + tax_amount
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_at: String,
}

// =============================================================================
// Order Item (行项目)
// =============================================================================

/// One product line within an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub order_id: String,
    pub product_id: String,
    /// Product name snapshot
    pub name: String,
    pub quantity: i64,
    /// Catalog price at order time, immutable afterwards
    pub unit_price: f64,
    pub size: Option<String>,
    pub color: Option<String>,
}

// =============================================================================
// API Request Types
// =============================================================================

/// One line of a proposed cart
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItem {
    pub product_id: String,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i64,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub address_id: String,
    #[validate(length(min = 1, message = "items cannot be empty"), nested)]
    pub items: Vec<CartItem>,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Admin status update payload — both axes optional and independent
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

// =============================================================================
// API Response Types
// =============================================================================

/// Fully materialized order (with line items)
///
/// 身份归上游服务所有，本服务只持有用户 id；扁平化后的 `user_id`
/// 就是这里的用户摘要，调用方需要更多资料时自行向身份服务解引。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
