//! Address Repository
//!
//! 地址协作方接口：核心唯一关心的不变量是引用的地址属于下单用户。

use std::sync::Arc;

use super::{BaseRepository, RepoError, RepoResult, parse_ref};
use crate::db::ConnectionManager;
use crate::db::models::{Address, AddressCreate};

const ADDRESS_TABLE: &str = "address";

#[derive(Clone)]
pub struct AddressRepository {
    base: BaseRepository,
}

impl AddressRepository {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    /// Find an address only if it belongs to the given user
    pub async fn find_owned(&self, id: &str, user_id: &str) -> RepoResult<Option<Address>> {
        let record = parse_ref(ADDRESS_TABLE, id);
        let mut result = self
            .base
            .db()
            .await?
            .query("SELECT * FROM address WHERE id = $id AND user_id = $user")
            .bind(("id", record))
            .bind(("user", user_id.to_string()))
            .await?;
        let addresses: Vec<Address> = result.take(0)?;
        Ok(addresses.into_iter().next())
    }

    /// Create a new address entry
    pub async fn create(&self, data: AddressCreate) -> RepoResult<Address> {
        let address = Address {
            id: None,
            user_id: data.user_id,
            full_name: data.full_name,
            line1: data.line1,
            line2: data.line2,
            city: data.city,
            postal_code: data.postal_code,
            country: data.country,
            phone: data.phone,
        };

        let created: Option<Address> = self
            .base
            .db()
            .await?
            .create(ADDRESS_TABLE)
            .content(address)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create address".to_string()))
    }
}
