//! Order State Machine
//!
//! PENDING 为初始状态；CANCELLED 为唯一终态。
//!
//! 用户取消只允许从 [`user_cancellable`] 列出的状态发起 (目前仅 PENDING)，
//! 取消事务的 SQL 守卫直接绑定这份列表。管理端可在非终态之间任意切换，
//! 未强制正向推进 (见 DESIGN.md)；唯一收紧：不允许从 CANCELLED 转出，
//! 否则库存账本会失去同步 (取消时库存已释放)。
//!
//! 支付状态是独立的轴 (UNPAID → PAID → REFUNDED)，与订单状态无联动。

use crate::db::models::OrderStatus;

/// Whether an admin transition `from -> to` is legal
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    let _ = to;
    !matches!(from, OrderStatus::Cancelled)
}

/// Statuses from which the owning user may cancel an order
pub fn user_cancellable() -> &'static [OrderStatus] {
    &[OrderStatus::Pending]
}
