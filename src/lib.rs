//! # Shelfscrape - Bookstore search scraper
//!
//! Walks a bookstore's paginated search listing and keeps what it finds in a
//! local SQLite shelf.
//!
//! Shelfscrape provides:
//! - A page-source provider abstraction with a headless Chrome implementation
//! - A pagination-driven extractor that tolerates broken listings
//! - SQLite-backed storage with title deduplication and substring lookup
//! - An interactive menu and one-shot subcommands on top of both

pub mod book;
pub mod config;
pub mod extractor;
pub mod menu;
pub mod provider;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use book::{BookRecord, BookSummary, QueryField};
pub use extractor::{ExtractionReport, Extractor, ExtractorConfig};
pub use storage::{SqliteStore, UpsertReport};

/// Result type alias for Shelfscrape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Shelfscrape operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid query field '{0}' (expected 'title' or 'author')")]
    InvalidField(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
