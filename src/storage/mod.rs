//! Storage Layer - SQLite-backed shelf
//!
//! System of record is a single SQLite table:
//! - llm_books(id, title UNIQUE, author, price, link)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore, UpsertFailure, UpsertReport};
