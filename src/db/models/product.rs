//! Product Model
//!
//! 商品目录归外部目录服务所有；核心只读取 `price`/`stock`/`is_active`，
//! 且只通过库存账本修改 `stock`。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub description: Option<String>,
    /// Current catalog price; frozen into order items at order time
    pub price: f64,
    /// Non-negative stock counter, mutated only by the inventory ledger
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub is_active: Option<bool>,
}
