//! Database schema definitions

/// SQL to create the books table
pub const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS llm_books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    author TEXT,
    price INTEGER,
    link TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_llm_books_author ON llm_books(author)",
    "CREATE INDEX IF NOT EXISTS idx_llm_books_price ON llm_books(price)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_BOOKS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
