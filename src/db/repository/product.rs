//! Product Repository
//!
//! 目录协作方接口：订单引擎读取价格/库存/激活状态；库存修改只通过
//! 库存账本的原子条件更新，此处不提供。

use std::sync::Arc;

use chrono::Utc;

use super::{BaseRepository, RepoError, RepoResult, parse_ref};
use crate::db::ConnectionManager;
use crate::db::models::{Product, ProductCreate};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    /// Find product by id ("product:abc" or bare key)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record = parse_ref(PRODUCT_TABLE, id);
        let mut result = self
            .base
            .db()
            .await?
            .query("SELECT * FROM product WHERE id = $id")
            .bind(("id", record))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Create a new catalog entry
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("price cannot be negative".into()));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation("stock cannot be negative".into()));
        }

        let product = Product {
            id: None,
            name: data.name,
            description: data.description,
            price: data.price,
            stock: data.stock,
            is_active: data.is_active.unwrap_or(true),
            created_at: Some(Utc::now().to_rfc3339()),
        };

        let created: Option<Product> = self
            .base
            .db()
            .await?
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }
}
