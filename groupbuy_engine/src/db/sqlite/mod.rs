//! SQLite backend for the group-buy engine.
//!
//! [`SqliteDatabase`] implements the store accessor traits. The low-level queries it composes live in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
