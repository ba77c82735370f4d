//! Book types - what the extractor produces and what the shelf hands back
//!
//! - `BookRecord`: one listing scraped from a results page
//! - `BookSummary`: the projection returned by shelf lookups
//! - `QueryField`: the closed set of columns a lookup may match against

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Author sentinel used when a listing names nobody
pub const UNKNOWN_AUTHOR: &str = "N/A";

/// A single listing scraped from a search results page.
///
/// `title` is the deduplication key on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    /// Authors joined by ", ", or [`UNKNOWN_AUTHOR`]
    pub author: String,
    pub price: u32,
    pub link: Option<String>,
}

impl BookRecord {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        price: u32,
        link: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            price,
            link,
        }
    }

    /// Check the record can be shelved
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidRecord("title is empty".to_string()));
        }
        Ok(())
    }
}

/// Row projection returned by shelf lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: Option<String>,
    pub price: Option<i64>,
}

/// Columns a lookup is allowed to match against.
///
/// Anything outside this set is rejected before a statement is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    Title,
    Author,
}

impl QueryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryField::Title => "title",
            QueryField::Author => "author",
        }
    }

    pub fn all() -> &'static [QueryField] {
        &[QueryField::Title, QueryField::Author]
    }
}

impl FromStr for QueryField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(QueryField::Title),
            "author" => Ok(QueryField::Author),
            _ => Err(Error::InvalidField(s.to_string())),
        }
    }
}

impl std::fmt::Display for QueryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_field_roundtrip() {
        for field in QueryField::all() {
            let parsed: QueryField = field.as_str().parse().unwrap();
            assert_eq!(*field, parsed);
        }
        assert_eq!(" Author ".parse::<QueryField>().unwrap(), QueryField::Author);
    }

    #[test]
    fn test_query_field_rejects_other_columns() {
        for bad in ["price", "link", "id", "title; DROP TABLE llm_books", ""] {
            let err = bad.parse::<QueryField>().unwrap_err();
            assert!(matches!(err, Error::InvalidField(ref f) if f == bad));
        }
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let record = BookRecord::new("   ", UNKNOWN_AUTHOR, 100, None);
        assert!(matches!(record.validate(), Err(Error::InvalidRecord(_))));

        let record = BookRecord::new("Intro to LLMs", "A. Smith", 390, None);
        assert!(record.validate().is_ok());
    }
}
