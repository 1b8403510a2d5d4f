use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use groupbuy_engine::{db_types::UserId, traits::CatalogManagement, SqliteDatabase};
use panen_common::Rupiah;
use sqlx::migrate::Migrator;

use crate::formatting::{format_product, format_store};

/// Setup commands work directly on the database. They assume that `PANEN_DATABASE_URL` points at it; the file is
/// created if it does not exist.
#[derive(Debug, Subcommand)]
pub enum SetupCommand {
    /// Run the database migrations.
    Migrate(MigrateParams),
    /// Add a store, owned by the given user.
    AddStore(AddStoreParams),
    /// Add a product to a store.
    AddProduct(AddProductParams),
}

#[derive(Debug, Args)]
pub struct MigrateParams {
    /// The path to the migrations directory. The migrations are embedded in the binary by default, and so this
    /// parameter is optional. If provided, the migrations at <path> will be executed instead.
    #[arg(short, long)]
    pub path: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddStoreParams {
    /// The user id of the store owner, as issued by the identity provider
    #[arg(short, long)]
    pub owner: String,
    #[arg(short, long)]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct AddProductParams {
    #[arg(short, long)]
    pub store: i64,
    #[arg(short, long)]
    pub title: String,
    /// The regular (non group-buy) price, in whole rupiah
    #[arg(short, long)]
    pub price: i64,
}

pub async fn handle_setup_command(command: SetupCommand) -> Result<()> {
    let db = SqliteDatabase::new(1).await?;
    match command {
        SetupCommand::Migrate(params) => migrate_db(&db, params).await,
        SetupCommand::AddStore(params) => add_store(&db, params).await,
        SetupCommand::AddProduct(params) => add_product(&db, params).await,
    }
}

async fn migrate_db(db: &SqliteDatabase, params: MigrateParams) -> Result<()> {
    match &params.path {
        Some(path) => {
            println!("Running migrations at: {path}");
            let migrator = Migrator::new(Path::new(path)).await?;
            migrator.run(db.pool()).await?;
        },
        None => {
            println!("Running embedded migrations");
            db.migrate().await?;
        },
    }
    println!("Migrations complete");
    Ok(())
}

async fn add_store(db: &SqliteDatabase, params: AddStoreParams) -> Result<()> {
    let name = params.name.trim();
    anyhow::ensure!(!name.is_empty(), "The store name cannot be empty");
    let store = db.insert_store(&UserId::from(params.owner), name).await?;
    println!("Store added");
    println!("{}", format_store(&store));
    Ok(())
}

async fn add_product(db: &SqliteDatabase, params: AddProductParams) -> Result<()> {
    anyhow::ensure!(params.price > 0, "The price must be greater than zero");
    if db.fetch_store(params.store).await?.is_none() {
        anyhow::bail!("Store #{} does not exist", params.store);
    }
    let product = db.insert_product(params.store, params.title.trim(), Rupiah::from(params.price)).await?;
    println!("Product added");
    println!("{}", format_product(&product));
    Ok(())
}
