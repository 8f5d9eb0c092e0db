//! Orders Module
//!
//! 订单事务引擎及其配套：
//!
//! - [`engine`] - 校验、定价、原子提交与取消
//! - [`pricing`] - Decimal 精度的购物车定价
//! - [`number`] - 订单编号生成 (稳定外部契约)
//! - [`status`] - 订单状态机

pub mod engine;
pub mod number;
pub mod pricing;
pub mod status;

pub use engine::{OrderEngine, OrderFilter};

use thiserror::Error;

use crate::db::models::OrderStatus;
use crate::db::repository::RepoError;

/// 订单域错误
///
/// 领域错误在事务边界处解决，绝不留下半应用状态；
/// 基础设施错误保证同样的全有或全无性质。
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("address not found")]
    AddressNotFound,

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("product inactive: {0}")]
    ProductInactive(String),

    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    #[error("order not found: {0}")]
    NotFound(String),

    /// Covers both "missing order" and "wrong status" — the distinction is
    /// deliberately not surfaced to the caller.
    #[error("order cannot be cancelled")]
    NotCancellable,

    #[error("illegal status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("duplicate order number")]
    DuplicateOrderNumber,

    #[error("datastore unavailable")]
    Unavailable,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => OrderError::NotFound(msg),
            RepoError::Duplicate(_) => OrderError::DuplicateOrderNumber,
            RepoError::Validation(msg) => OrderError::Validation(msg),
            RepoError::Database(msg) => OrderError::Storage(msg),
            RepoError::Unavailable(_) => OrderError::Unavailable,
        }
    }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrderError::Validation(err.to_string())
    }
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;
