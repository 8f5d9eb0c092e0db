//! Inventory Ledger
//!
//! 保持商品库存与全部未取消订单行项目的一致性。
//!
//! 扣减是单条原子条件更新 (`UPDATE … SET stock -= $q WHERE stock >= $q`)，
//! 不是先读后写：两个并发预留不可能都通过检查再各自扣减，库存在构造上
//! 不可能为负。预留/释放语句并入订单引擎的事务，与订单持久化同生共死。
//!
//! 预留失败分两类：商品不存在或已下架 (`ProductUnavailable`)，以及
//! 库存不足 (`InsufficientStock`)。事务内通过两个不同的 THROW 标记区分，
//! [`classify_failure`] 把它们映射回类型化错误。

use std::sync::Arc;

use surrealdb::RecordId;
use thiserror::Error;

use crate::db::ConnectionManager;
use crate::db::repository::{BaseRepository, RepoError, Tx};

/// Marker thrown when the conditional decrement finds the product short
pub const INSUFFICIENT_STOCK_MARKER: &str = "INSUFFICIENT_STOCK";

/// Marker thrown when the product is missing or inactive
pub const PRODUCT_UNAVAILABLE_MARKER: &str = "PRODUCT_UNAVAILABLE";

/// A stock movement: product record and quantity
pub type StockLine = (RecordId, i64);

/// 库存账本错误
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    #[error("product missing or inactive: {product_id}")]
    ProductUnavailable { product_id: String },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Map a transaction failure message to a typed ledger error, if it carries
/// one of the ledger's THROW markers.
pub fn classify_failure(message: &str) -> Option<LedgerError> {
    if let Some(product_id) = marker_product(message, INSUFFICIENT_STOCK_MARKER) {
        return Some(LedgerError::InsufficientStock { product_id });
    }
    if let Some(product_id) = marker_product(message, PRODUCT_UNAVAILABLE_MARKER) {
        return Some(LedgerError::ProductUnavailable { product_id });
    }
    None
}

/// Extract the product id following a marker in a THROW message
fn marker_product(message: &str, marker: &str) -> Option<String> {
    let pos = message.find(marker)?;
    let product = message[pos + marker.len()..]
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .trim_matches(|c: char| c == '"' || c == '\'');
    Some(product.to_string())
}

#[derive(Clone)]
pub struct InventoryLedger {
    base: BaseRepository,
}

impl InventoryLedger {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    /// Append atomic reservation statements to a transaction
    ///
    /// Per product, two guards: availability (record exists and is active)
    /// throws [`PRODUCT_UNAVAILABLE_MARKER`]; the conditional decrement
    /// (`stock >= quantity`) throws [`INSUFFICIENT_STOCK_MARKER`]. Either
    /// `THROW` cancels the whole transaction.
    pub fn stage_reserve(&self, tx: &mut Tx, items: &[StockLine]) {
        for (idx, (product, quantity)) in items.iter().enumerate() {
            let p = format!("rp{idx}");
            let q = format!("rq{idx}");
            tx.push(format!(
                "LET $avail{idx} = (SELECT * FROM ${p} WHERE is_active = true)"
            ));
            tx.push(format!(
                "IF array::len($avail{idx}) == 0 {{ \
                 THROW \"{PRODUCT_UNAVAILABLE_MARKER} {product}\" }}"
            ));
            tx.push(format!(
                "LET $reserved{idx} = (UPDATE ${p} SET stock -= ${q} WHERE stock >= ${q})"
            ));
            tx.push(format!(
                "IF array::len($reserved{idx}) == 0 {{ \
                 THROW \"{INSUFFICIENT_STOCK_MARKER} {product}\" }}"
            ));
            tx.bind_record(p, product.clone());
            tx.bind_json(q, serde_json::Value::from(*quantity));
        }
    }

    /// Append stock release statements to a transaction (cancellation path)
    pub fn stage_release(&self, tx: &mut Tx, items: &[StockLine]) {
        for (idx, (product, quantity)) in items.iter().enumerate() {
            let p = format!("lp{idx}");
            let q = format!("lq{idx}");
            tx.push(format!("UPDATE ${p} SET stock += ${q}"));
            tx.bind_record(p, product.clone());
            tx.bind_json(q, serde_json::Value::from(*quantity));
        }
    }

    /// Reserve stock as a standalone atomic unit
    pub async fn reserve(&self, items: &[StockLine]) -> Result<(), LedgerError> {
        let db = self.base.db().await?;
        let mut tx = Tx::new();
        self.stage_reserve(&mut tx, items);
        tx.commit(&db).await.map_err(|err| {
            let message = err.to_string();
            classify_failure(&message)
                .unwrap_or_else(|| LedgerError::Repo(RepoError::Database(message)))
        })
    }

    /// Release stock as a standalone atomic unit
    pub async fn release(&self, items: &[StockLine]) -> Result<(), LedgerError> {
        let db = self.base.db().await?;
        let mut tx = Tx::new();
        self.stage_release(&mut tx, items);
        tx.commit(&db)
            .await
            .map_err(|err| LedgerError::Repo(RepoError::from(err)))
    }
}
