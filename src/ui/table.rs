use tabled::{settings::Style, Table, Tabled};

use crate::book::BookSummary;

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Price")]
    price: String,
}

impl From<&BookSummary> for BookRow {
    fn from(book: &BookSummary) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone().unwrap_or_else(|| "-".to_string()),
            price: book.price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render query results; empty input renders nothing
pub fn books_table(books: &[BookSummary]) -> String {
    if books.is_empty() {
        return String::new();
    }
    let rows: Vec<BookRow> = books.iter().map(BookRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<StatRow> = stats
        .iter()
        .map(|(label, value)| StatRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
