//! Per-listing extraction
//!
//! One result item becomes either a [`BookRecord`] or a [`SkipReason`]; a broken
//! listing never takes its page down with it.

use std::sync::OnceLock;

use regex::Regex;

use super::Selectors;
use crate::book::{BookRecord, UNKNOWN_AUTHOR};
use crate::provider::{PageElement, ProviderError};

static PRICE_DIGITS: OnceLock<Regex> = OnceLock::new();

/// Why a listing was left out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no title link matching '{0}'")]
    MissingTitle(String),

    #[error("title link has no text")]
    EmptyTitle,

    #[error("no price matching '{0}'")]
    MissingPrice(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<ProviderError> for SkipReason {
    fn from(e: ProviderError) -> Self {
        SkipReason::Provider(e.to_string())
    }
}

/// A listing that was skipped, with where it sat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    /// 1-based page number
    pub page: usize,
    /// 1-based position on the page
    pub index: usize,
    pub reason: SkipReason,
}

impl std::fmt::Display for SkippedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} item {}: {}", self.page, self.index, self.reason)
    }
}

pub type ItemOutcome = Result<BookRecord, SkippedItem>;

/// Extract title, link, authors and price from one result item
pub fn parse_item<E: PageElement>(item: &E, selectors: &Selectors) -> Result<BookRecord, SkipReason> {
    let heading = item.find_element(&selectors.title).map_err(|e| match e {
        ProviderError::NotFound(_) => SkipReason::MissingTitle(selectors.title.clone()),
        other => other.into(),
    })?;
    let title = heading.text()?.trim().to_string();
    if title.is_empty() {
        return Err(SkipReason::EmptyTitle);
    }
    let link = heading.attribute("href")?;

    let names = item
        .find_elements(&selectors.author)?
        .iter()
        .map(|a| a.text().map(|t| t.trim().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let author = join_authors(names);

    let price_text = item
        .find_element(&selectors.price)
        .map_err(|e| match e {
            ProviderError::NotFound(_) => SkipReason::MissingPrice(selectors.price.clone()),
            other => other.into(),
        })?
        .text()?;
    let price = parse_price(&price_text);

    Ok(BookRecord {
        title,
        author,
        price,
        link,
    })
}

/// First run of decimal digits in `text`, or 0 when there is none
pub fn parse_price(text: &str) -> u32 {
    let digits = PRICE_DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("price pattern is valid"));
    digits
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Join author names with ", ", falling back to the unknown-author sentinel
pub fn join_authors(names: impl IntoIterator<Item = String>) -> String {
    let names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        names.join(", ")
    }
}
