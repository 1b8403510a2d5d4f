use panen_common::Rupiah;

use crate::{
    db_types::{Product, Store, UserId},
    traits::GroupBuyError,
};

/// Read access to the marketplace catalogue.
///
/// Stores and products are owned by the wider marketplace. The insert methods exist so that operators and tests can
/// seed a database.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, GroupBuyError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, GroupBuyError>;

    async fn insert_store(&self, owner_id: &UserId, store_name: &str) -> Result<Store, GroupBuyError>;

    async fn insert_product(&self, store_id: i64, title: &str, price: Rupiah) -> Result<Product, GroupBuyError>;
}
