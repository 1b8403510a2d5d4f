use log::debug;
use panen_common::Rupiah;
use sqlx::SqliteConnection;

use crate::db_types::{Product, Store, UserId};

pub async fn fetch_store(store_id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, sqlx::Error> {
    let store = sqlx::query_as("SELECT * FROM stores WHERE id = $1").bind(store_id).fetch_optional(conn).await?;
    Ok(store)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_store(
    owner_id: &UserId,
    store_name: &str,
    conn: &mut SqliteConnection,
) -> Result<Store, sqlx::Error> {
    let store: Store = sqlx::query_as("INSERT INTO stores (owner_id, store_name) VALUES ($1, $2) RETURNING *")
        .bind(owner_id)
        .bind(store_name)
        .fetch_all(conn)
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Store #{} ({}) created for {owner_id}", store.id, store.store_name);
    Ok(store)
}

pub async fn insert_product(
    store_id: i64,
    title: &str,
    price: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let product: Product =
        sqlx::query_as("INSERT INTO products (store_id, title, price) VALUES ($1, $2, $3) RETURNING *")
            .bind(store_id)
            .bind(title)
            .bind(price)
            .fetch_all(conn)
            .await?
            .pop()
            .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Product #{} ({}) added to store #{store_id}", product.id, product.title);
    Ok(product)
}
