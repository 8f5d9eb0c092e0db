//! Schema Definitions
//!
//! Applied idempotently on every connection establishment. The unique index
//! on `order_number` backs the duplicate-order-number detection in the
//! transaction engine. The table is `orders` (plural) because `order` is a
//! SurrealQL keyword.

use surrealdb::Surreal;
use surrealdb::engine::any::Any;

const DEFINITIONS: &str = r#"
DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
DEFINE TABLE IF NOT EXISTS address SCHEMALESS;
DEFINE TABLE IF NOT EXISTS orders SCHEMALESS;
DEFINE TABLE IF NOT EXISTS order_item SCHEMALESS;
DEFINE INDEX IF NOT EXISTS uniq_order_number ON TABLE orders FIELDS order_number UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_order_user ON TABLE orders FIELDS user_id;
DEFINE INDEX IF NOT EXISTS idx_order_item_order ON TABLE order_item FIELDS order_id;
DEFINE INDEX IF NOT EXISTS idx_address_user ON TABLE address FIELDS user_id;
"#;

/// Apply table and index definitions (idempotent)
pub async fn apply(db: &Surreal<Any>) -> Result<(), surrealdb::Error> {
    db.query(DEFINITIONS).await?.check()?;
    Ok(())
}
