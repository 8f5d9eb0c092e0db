//! Repository Module
//!
//! Data access over the resilient connection manager. Repositories never
//! hold a connection of their own; every operation acquires the current
//! handle from [`ConnectionManager`].

pub mod address;
pub mod order;
pub mod product;

// Re-exports
pub use address::AddressRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;

use std::sync::Arc;

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::any::Any;
use thiserror::Error;

use crate::db::{ConnectionError, ConnectionManager};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Datastore unavailable: {0}")]
    Unavailable(#[from] ConnectionError),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "product:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("product", "abc");
//   - API 边界收到裸 key 时回退到 from_table_key

/// Parse a full "table:id" reference, falling back to a bare key
pub fn parse_ref(table: &str, id: &str) -> RecordId {
    id.parse::<RecordId>()
        .unwrap_or_else(|_| RecordId::from_table_key(table, id))
}

/// Base repository with a shared connection manager reference
#[derive(Clone)]
pub struct BaseRepository {
    conn: Arc<ConnectionManager>,
}

impl BaseRepository {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    /// Acquire the current datastore handle
    pub async fn db(&self) -> RepoResult<Surreal<Any>> {
        Ok(self.conn.acquire().await?)
    }
}

// =============================================================================
// Transaction builder
// =============================================================================

/// Typed binding value for [`Tx`]
enum BindValue {
    Json(serde_json::Value),
    Record(RecordId),
}

/// Multi-statement `BEGIN … COMMIT` transaction builder
///
/// Collects statements and bindings, then runs them as one atomic unit in a
/// single query call. Any statement failure (including `THROW`) cancels the
/// whole transaction; partial effects are never observable.
pub struct Tx {
    statements: Vec<String>,
    bindings: Vec<(String, BindValue)>,
}

impl Tx {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn bind_json(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.bindings.push((key.into(), BindValue::Json(value)));
    }

    pub fn bind_record(&mut self, key: impl Into<String>, id: RecordId) {
        self.bindings.push((key.into(), BindValue::Record(id)));
    }

    /// Execute all statements atomically
    pub async fn commit(self, db: &Surreal<Any>) -> Result<(), surrealdb::Error> {
        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for statement in &self.statements {
            sql.push_str(statement);
            sql.push_str(";\n");
        }
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = db.query(sql);
        for (key, value) in self.bindings {
            query = match value {
                BindValue::Json(v) => query.bind((key, v)),
                BindValue::Record(r) => query.bind((key, r)),
            };
        }
        query.await?.check()?;
        Ok(())
    }
}

impl Default for Tx {
    fn default() -> Self {
        Self::new()
    }
}
