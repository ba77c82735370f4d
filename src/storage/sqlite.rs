//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params};
use serde::Serialize;
use crate::Result;
use crate::book::{BookRecord, BookSummary, QueryField, UNKNOWN_AUTHOR};
use super::schema;

const SEARCH_BY_TITLE: &str = r#"
SELECT title, author, price FROM llm_books
WHERE title LIKE ?1 ESCAPE '\'
ORDER BY price ASC, title ASC
"#;

const SEARCH_BY_AUTHOR: &str = r#"
SELECT title, author, price FROM llm_books
WHERE author LIKE ?1 ESCAPE '\'
ORDER BY price ASC, title ASC
"#;

/// SQLite-backed storage for scraped books
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Create the schema if it is missing. Safe to call repeatedly.
    pub fn init(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Book Operations ==========

    /// Insert a single book unless its title is already shelved.
    ///
    /// Returns `true` when a new row was written.
    pub fn insert_book(&self, book: &BookRecord) -> Result<bool> {
        book.validate()?;
        let changed = self.conn.execute(
            r#"
            INSERT INTO llm_books (title, author, price, link)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(title) DO NOTHING
            "#,
            params![book.title, book.author, book.price, book.link],
        )?;
        Ok(changed > 0)
    }

    /// Insert every record, skipping titles already on the shelf.
    ///
    /// A failing record never aborts the batch; it is reported in
    /// [`UpsertReport::failures`] and excluded from the new-row count.
    pub fn upsert(&self, books: &[BookRecord]) -> UpsertReport {
        let mut report = UpsertReport::default();

        for book in books {
            match self.insert_book(book) {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!("Failed to store '{}': {}", book.title, e);
                    report.failures.push(UpsertFailure {
                        title: book.title.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Upserted {} books: {} new, {} duplicates, {} failed",
            books.len(),
            report.inserted,
            report.duplicates,
            report.failures.len()
        );
        report
    }

    /// Find books whose `field` contains `pattern` as a literal substring.
    ///
    /// Matching follows SQLite's default LIKE rules (ASCII case-insensitive).
    /// Results are ordered by price, then title.
    pub fn query(&self, field: QueryField, pattern: &str) -> Result<Vec<BookSummary>> {
        let sql = match field {
            QueryField::Title => SEARCH_BY_TITLE,
            QueryField::Author => SEARCH_BY_AUTHOR,
        };
        let like = format!("%{}%", escape_like(pattern));

        let mut stmt = self.conn.prepare(sql)?;
        let books = stmt
            .query_map([like], |row| {
                Ok(BookSummary {
                    title: row.get(0)?,
                    author: row.get(1)?,
                    price: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(books)
    }

    /// Same as [`query`](Self::query), with the field given by name.
    ///
    /// Names outside `title`/`author` fail with `Error::InvalidField`.
    pub fn query_by(&self, field: &str, pattern: &str) -> Result<Vec<BookSummary>> {
        let field: QueryField = field.parse()?;
        self.query(field, pattern)
    }

    /// Count all books
    pub fn count_books(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM llm_books", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let unknown_author: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM llm_books WHERE author IS NULL OR author = ?1",
            [UNKNOWN_AUTHOR],
            |row| row.get(0),
        )?;
        let without_link: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM llm_books WHERE link IS NULL",
            [],
            |row| row.get(0),
        )?;
        let (min_price, max_price): (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(price), MAX(price) FROM llm_books WHERE price > 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DbStats {
            books: self.count_books()?,
            unknown_author: unknown_author as usize,
            without_link: without_link as usize,
            min_price,
            max_price,
        })
    }
}

/// Escape LIKE wildcards so the pattern matches literally
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Outcome of a batch upsert
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpsertReport {
    /// Rows that did not exist before
    pub inserted: usize,
    /// Records whose title was already shelved
    pub duplicates: usize,
    pub failures: Vec<UpsertFailure>,
}

/// A record the shelf refused
#[derive(Debug, Clone, Serialize)]
pub struct UpsertFailure {
    pub title: String,
    pub reason: String,
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub books: usize,
    pub unknown_author: usize,
    pub without_link: usize,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}
