//! Extractor - drives a page-source provider through a search listing
//!
//! The run has two phases:
//! 1. Setup: open the site, submit the keyword, apply the category filter and
//!    wait for results. Any failure here ends the run.
//! 2. Pagination: [`ResultPages`] yields one batch of item outcomes per page
//!    until a page is empty or no "next" control is left.
//!
//! Provider failures never discard what was already collected: the
//! [`ExtractionReport`] carries the records gathered so far plus the error.

pub mod item;
pub mod wait;

pub use item::{ItemOutcome, SkipReason, SkippedItem, parse_item, parse_price};
pub use wait::{WaitError, WaitPolicy};

use tracing::{debug, info, warn};

use crate::book::BookRecord;
use crate::provider::{PageElement, PageSource, ProviderError, SessionLauncher};

/// CSS selectors for the listing markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub search_input: String,
    /// One search result; also the "results are present" signal
    pub item: String,
    /// Heading link inside an item (title text + href)
    pub title: String,
    pub author: String,
    pub price: String,
    pub next_page: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_input: "input[name='q']".to_string(),
            item: "div.table-td".to_string(),
            title: "h4 a".to_string(),
            author: "p.author a".to_string(),
            price: "ul.price strong b".to_string(),
            next_page: "a[rel='next']".to_string(),
        }
    }
}

/// What to search and how to find it
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub site_url: String,
    pub keyword: String,
    /// Category filter id; the control is `label[for='<category>']`
    pub category: String,
    pub selectors: Selectors,
    pub wait: WaitPolicy,
    /// Stop after this many pages
    pub max_pages: Option<usize>,
}

impl ExtractorConfig {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn category_selector(&self) -> String {
        format!("label[for='{}']", self.category)
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.books.com.tw/".to_string(),
            keyword: "LLM".to_string(),
            category: "BKA".to_string(),
            selectors: Selectors::default(),
            wait: WaitPolicy::default(),
            max_pages: None,
        }
    }
}

/// Setup steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    OpenSite,
    Search,
    CategoryFilter,
    Results,
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SetupStage::OpenSite => "opening the site",
            SetupStage::Search => "submitting the search",
            SetupStage::CategoryFilter => "applying the category filter",
            SetupStage::Results => "waiting for results",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not start provider session: {0}")]
    Launch(ProviderError),

    #[error("Setup failed while {stage}: {source}")]
    Setup {
        stage: SetupStage,
        #[source]
        source: WaitError,
    },

    #[error("Pagination failed on page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: WaitError,
    },
}

/// Item outcomes for one results page
#[derive(Debug, Clone)]
pub struct PageBatch {
    /// 1-based page number
    pub number: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl PageBatch {
    pub fn extracted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub records: Vec<BookRecord>,
    pub skipped: Vec<SkippedItem>,
    /// Pages that yielded a batch
    pub pages: usize,
    /// Set when the run ended on a provider failure instead of running out of pages
    pub aborted: Option<ExtractError>,
}

impl ExtractionReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    fn absorb(&mut self, batch: PageBatch) {
        self.pages += 1;
        for outcome in batch.outcomes {
            match outcome {
                Ok(record) => self.records.push(record),
                Err(skipped) => self.skipped.push(skipped),
            }
        }
    }
}

/// Scrapes a search listing through a [`SessionLauncher`]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Launch a session, walk every results page, and tear the session down.
    pub fn run<L: SessionLauncher>(&self, launcher: &L) -> ExtractionReport {
        self.run_with_progress(launcher, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_page` after each page is parsed.
    pub fn run_with_progress<L, F>(&self, launcher: &L, mut on_page: F) -> ExtractionReport
    where
        L: SessionLauncher,
        F: FnMut(&PageBatch),
    {
        let mut report = ExtractionReport::default();

        let mut session = match launcher.launch() {
            Ok(session) => session,
            Err(e) => {
                warn!("Provider session failed to start: {}", e);
                report.aborted = Some(ExtractError::Launch(e));
                return report;
            }
        };

        match self.pages(&mut session) {
            Ok(pages) => {
                for batch in pages {
                    match batch {
                        Ok(batch) => {
                            on_page(&batch);
                            report.absorb(batch);
                        }
                        Err(e) => {
                            warn!("Extraction stopped early: {}", e);
                            report.aborted = Some(e);
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Extraction setup failed: {}", e);
                report.aborted = Some(e);
            }
        }

        info!(
            "Extraction finished: {} records from {} pages ({} skipped)",
            report.records.len(),
            report.pages,
            report.skipped.len()
        );
        report
    }

    /// Run setup on `page` and return the lazy sequence of result pages.
    pub fn pages<'a, P: PageSource>(
        &'a self,
        page: &'a mut P,
    ) -> Result<ResultPages<'a, P>, ExtractError> {
        self.open_results(page)?;
        Ok(ResultPages::new(page, &self.config))
    }

    fn open_results<P: PageSource>(&self, page: &mut P) -> Result<(), ExtractError> {
        let cfg = &self.config;
        let policy = cfg.wait;
        let setup = |stage: SetupStage| move |source: WaitError| ExtractError::Setup { stage, source };

        info!("Opening {}", cfg.site_url);
        page.navigate(&cfg.site_url)
            .map_err(WaitError::from)
            .map_err(setup(SetupStage::OpenSite))?;
        wait::document_ready(&*page, policy).map_err(setup(SetupStage::OpenSite))?;

        info!("Searching for '{}'", cfg.keyword);
        let input = wait::element_present(&*page, &cfg.selectors.search_input, policy)
            .map_err(setup(SetupStage::Search))?;
        input
            .send_keys(&cfg.keyword)
            .and_then(|_| input.submit())
            .map_err(WaitError::from)
            .map_err(setup(SetupStage::Search))?;

        info!("Applying category filter '{}'", cfg.category);
        let filter = wait::element_clickable(&*page, &cfg.category_selector(), policy)
            .map_err(setup(SetupStage::CategoryFilter))?;
        filter
            .click()
            .map_err(WaitError::from)
            .map_err(setup(SetupStage::CategoryFilter))?;

        wait::element_present(&*page, &cfg.selectors.item, policy)
            .map_err(setup(SetupStage::Results))?;
        info!("Search results loaded");
        Ok(())
    }
}

/// Finite, non-restartable sequence of result pages.
///
/// Each call to `next` parses the current page, then moves to the following
/// one. The sequence ends on an empty page, when no usable "next" control is
/// left, or after `max_pages`. A provider failure is yielded once as `Err`,
/// after which the sequence is exhausted.
pub struct ResultPages<'a, P: PageSource> {
    page: &'a mut P,
    config: &'a ExtractorConfig,
    number: usize,
    pending: Option<ExtractError>,
    done: bool,
}

impl<'a, P: PageSource> ResultPages<'a, P> {
    fn new(page: &'a mut P, config: &'a ExtractorConfig) -> Self {
        Self {
            page,
            config,
            number: 1,
            pending: None,
            done: false,
        }
    }

    fn page_error(&self, source: impl Into<WaitError>) -> ExtractError {
        ExtractError::Page {
            page: self.number,
            source: source.into(),
        }
    }

    /// Move to the next page. `Ok(false)` means the listing is exhausted.
    fn advance(&mut self) -> Result<bool, ExtractError> {
        let selector = &self.config.selectors.next_page;
        let policy = self.config.wait;

        let next = match wait::element_clickable(&*self.page, selector, policy) {
            Ok(next) => next,
            Err(WaitError::Timeout { .. }) => {
                info!("No clickable next page control after page {}", self.number);
                return Ok(false);
            }
            Err(e) => return Err(self.page_error(e)),
        };

        next.click().map_err(|e| self.page_error(e))?;
        wait::stale(&next, policy).map_err(|e| self.page_error(e))?;
        Ok(true)
    }
}

impl<P: PageSource> Iterator for ResultPages<'_, P> {
    type Item = Result<PageBatch, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        if self.done {
            return None;
        }

        info!("Scraping page {}", self.number);
        let items = match self.page.find_elements(&self.config.selectors.item) {
            Ok(items) => items,
            Err(e) => {
                self.done = true;
                return Some(Err(self.page_error(e)));
            }
        };
        if items.is_empty() {
            info!("Page {} has no results, stopping", self.number);
            self.done = true;
            return None;
        }

        let number = self.number;
        let outcomes: Vec<ItemOutcome> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                parse_item(item, &self.config.selectors).map_err(|reason| {
                    warn!("Skipping page {} item {}: {}", number, i + 1, reason);
                    SkippedItem {
                        page: number,
                        index: i + 1,
                        reason,
                    }
                })
            })
            .collect();
        let batch = PageBatch { number, outcomes };
        debug!("Page {}: {} of {} items extracted", number, batch.extracted(), items.len());

        if self.config.max_pages.is_some_and(|max| number >= max) {
            info!("Reached page limit ({})", number);
            self.done = true;
        } else {
            match self.advance() {
                Ok(true) => self.number += 1,
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    self.pending = Some(e);
                }
            }
        }

        Some(Ok(batch))
    }
}
