use chrono::{DateTime, Duration, Utc};
use log::*;
use panen_common::Rupiah;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db::sqlite::db::MIGRATOR,
    db_types::{Campaign, NewCampaign, Product, Store, UserId},
    traits::{CatalogManagement, GroupBuyDatabase},
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A fresh database URL in the system's temp directory.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/panen_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    MIGRATOR.run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Creates a migrated database at a random path and connects to it.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 25).await.expect("Error creating connection to database")
}

/// Inserts a store owned by `owner` and one product in it.
pub async fn seed_store(db: &SqliteDatabase, owner: &str) -> (Store, Product) {
    let store = db.insert_store(&UserId::from(owner), "Toko Tani Makmur").await.expect("Error creating store");
    let product =
        db.insert_product(store.id, "Beras Pandan Wangi 5kg", Rupiah::from(95_000)).await.expect("Error creating product");
    (store, product)
}

/// Inserts an active campaign straight into the database, with the given start and end dates.
pub async fn seed_campaign(
    db: &SqliteDatabase,
    product: &Product,
    group_price: i64,
    target_quantity: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Campaign {
    let campaign = NewCampaign {
        product_id: product.id,
        store_id: product.store_id,
        group_price: Rupiah::from(group_price),
        target_quantity,
        start_date,
        end_date,
    };
    db.insert_campaign(campaign).await.expect("Error creating campaign")
}

/// An active campaign that started an hour ago and ends in a day.
pub async fn seed_open_campaign(db: &SqliteDatabase, product: &Product, group_price: i64, target: i64) -> Campaign {
    let now = Utc::now();
    seed_campaign(db, product, group_price, target, now - Duration::hours(1), now + Duration::days(1)).await
}
