//! Interactive menu
//!
//! ```text
//! 1. Update the shelf      -> scrape, then upsert
//! 2. Search the shelf      -> a. by title / b. by author / c. back
//! 3. Exit
//! ```
//!
//! Recoverable failures are printed and the menu prompts again. End of input
//! behaves like choosing Exit.

use std::io::{self, BufRead, Write};

use crate::book::QueryField;
use crate::extractor::ExtractionReport;
use crate::storage::{SqliteStore, UpsertReport};
use crate::ui::{books_table, Icons};

/// Menu over a shelf, reading choices from `input` and writing to `out`.
///
/// `update` performs one scrape; the menu stores whatever it returns.
pub struct Menu<'a, R, W, U> {
    store: &'a SqliteStore,
    input: R,
    out: W,
    update: U,
}

enum Flow {
    Continue,
    Exit,
}

impl<'a, R, W, U> Menu<'a, R, W, U>
where
    R: BufRead,
    W: Write,
    U: FnMut() -> ExtractionReport,
{
    pub fn new(store: &'a SqliteStore, input: R, out: W, update: U) -> Self {
        Self {
            store,
            input,
            out,
            update,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out)?;
            writeln!(self.out, "----- {} Book Shelf -----", Icons::BOOKS)?;
            writeln!(self.out, "1. Update the shelf")?;
            writeln!(self.out, "2. Search the shelf")?;
            writeln!(self.out, "3. Exit")?;
            writeln!(self.out, "{}", "-".repeat(26))?;

            let Some(choice) = self.prompt("Select an option (1-3): ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.update()?,
                "2" => {
                    if let Flow::Exit = self.search()? {
                        return Ok(());
                    }
                }
                "3" => {
                    writeln!(self.out, "Goodbye.")?;
                    return Ok(());
                }
                _ => writeln!(self.out, "Invalid option, please try again.")?,
            }
        }
    }

    fn update(&mut self) -> io::Result<()> {
        writeln!(self.out, "{} Scraping the latest listings...", Icons::GLOBE)?;
        let report = (self.update)();
        let upserted = self.store.upsert(&report.records);
        write_update_summary(&mut self.out, &report, &upserted)
    }

    fn search(&mut self) -> io::Result<Flow> {
        loop {
            writeln!(self.out)?;
            writeln!(self.out, "--- {} Search ---", Icons::SEARCH)?;
            writeln!(self.out, "a. By title")?;
            writeln!(self.out, "b. By author")?;
            writeln!(self.out, "c. Back")?;

            let Some(choice) = self.prompt("Select a search (a-c): ")? else {
                return Ok(Flow::Exit);
            };
            let field = match choice.to_lowercase().as_str() {
                "a" => QueryField::Title,
                "b" => QueryField::Author,
                "c" => return Ok(Flow::Continue),
                _ => {
                    writeln!(self.out, "Invalid option, please try again.")?;
                    continue;
                }
            };

            let Some(keyword) = self.prompt("Keyword: ")? else {
                return Ok(Flow::Exit);
            };
            match self.store.query(field, &keyword) {
                Ok(books) if books.is_empty() => {
                    writeln!(self.out, "{} No matching books.", Icons::EMPTY)?
                }
                Ok(books) => writeln!(self.out, "{}", books_table(&books))?,
                Err(e) => writeln!(self.out, "{} Search failed: {}", Icons::CROSS, e)?,
            }
        }
    }

    /// Print `label` and read one trimmed line; `None` at end of input
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Summarize a scrape and the upsert that followed it
pub fn write_update_summary<W: Write>(
    out: &mut W,
    report: &ExtractionReport,
    upserted: &UpsertReport,
) -> io::Result<()> {
    for skipped in &report.skipped {
        writeln!(out, "{} Skipped {}", Icons::SKIP, skipped)?;
    }
    for failure in &upserted.failures {
        writeln!(out, "{} Not stored '{}': {}", Icons::CROSS, failure.title, failure.reason)?;
    }
    if let Some(err) = &report.aborted {
        writeln!(out, "{} Scrape ended early: {}", Icons::WARN, err)?;
    }

    if report.records.is_empty() {
        writeln!(out, "{} Nothing scraped, the shelf is unchanged.", Icons::EMPTY)?;
        return Ok(());
    }
    writeln!(
        out,
        "{} Shelf updated: {} scraped from {} pages, {} new, {} already shelved.",
        Icons::CHECK,
        report.records.len(),
        report.pages,
        upserted.inserted,
        upserted.duplicates
    )
}
