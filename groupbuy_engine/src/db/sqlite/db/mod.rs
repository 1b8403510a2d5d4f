//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqliteConnection,
    SqlitePool,
};

pub mod campaigns;
pub mod orders;
pub mod participants;
pub mod stores;

const SQLITE_DB_URL: &str = "sqlite://data/panen.db";
/// How long a statement waits for another connection's write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// `RETURNING` arrived in SQLite 3.35.0. The conditional inserts and updates depend on it.
pub const MIN_SQLITE_VERSION: (u32, u32) = (3, 35);

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/db/sqlite/migrations");

pub fn db_url() -> String {
    let result = env::var("PANEN_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PANEN_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// The SQLite library version, e.g. `3.45.1`
pub async fn sqlite_version(conn: &mut SqliteConnection) -> Result<String, SqlxError> {
    let version: String = sqlx::query_scalar("SELECT sqlite_version()").fetch_one(conn).await?;
    Ok(version)
}

/// True if `version` (as reported by `sqlite_version()`) is at least [`MIN_SQLITE_VERSION`].
pub fn version_is_supported(version: &str) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) >= MIN_SQLITE_VERSION
}

/// Migrations that are known to the binary but have not been applied to the database.
pub async fn pending_migrations(conn: &mut SqliteConnection) -> Result<Vec<i64>, SqlxError> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(&mut *conn)
    .await?;
    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1").fetch_all(&mut *conn).await?
    } else {
        Vec::new()
    };
    let pending = MIGRATOR.iter().map(|m| m.version).filter(|v| !applied.contains(v)).collect();
    Ok(pending)
}
