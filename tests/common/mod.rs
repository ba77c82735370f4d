//! In-memory bookstore used to drive the extractor without a browser.
//!
//! The stub understands exactly the default selectors. Clicking "next" swaps
//! the current page and bumps a generation counter, which is how elements
//! from the previous page go stale.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use shelfscrape::extractor::{ExtractorConfig, Selectors, WaitPolicy};
use shelfscrape::provider::{
    PageElement, PageSource, ProviderError, ProviderResult, SessionLauncher,
};

/// One listing on a stub results page
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub title: Option<String>,
    pub href: Option<String>,
    pub authors: Vec<String>,
    pub price: Option<String>,
}

impl Listing {
    pub fn book(title: &str, author: &str, price: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            href: Some(format!("https://shop.test/item/{}", title.replace(' ', "-"))),
            authors: vec![author.to_string()],
            price: Some(price.to_string()),
        }
    }

    pub fn without_price(mut self) -> Self {
        self.price = None;
        self
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn with_authors(mut self, authors: &[&str]) -> Self {
        self.authors = authors.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Shape and failure modes of the stub site
#[derive(Debug, Clone)]
pub struct StubSite {
    pub pages: Vec<Vec<Listing>>,
    pub category: String,
    pub has_category: bool,
    pub has_search_input: bool,
    pub navigation_fails: bool,
    pub next_actionable: bool,
    /// Lookups of the next control that miss on each page before it renders
    pub next_delay: usize,
    /// Whether clicking next replaces the document (and detaches the old control)
    pub next_detaches: bool,
    /// Listing enumeration on this 1-based page fails with a browser error
    pub broken_page: Option<usize>,
}

impl StubSite {
    pub fn new(pages: Vec<Vec<Listing>>) -> Self {
        Self {
            pages,
            category: "BKA".to_string(),
            has_category: true,
            has_search_input: true,
            navigation_fails: false,
            next_actionable: true,
            next_delay: 0,
            next_detaches: true,
            broken_page: None,
        }
    }

    /// `count` pages of `per_page` well-formed listings
    pub fn uniform(count: usize, per_page: usize) -> Self {
        let pages = (1..=count)
            .map(|p| {
                (1..=per_page)
                    .map(|i| Listing::book(&format!("LLM Book {p}-{i}"), &format!("Author {i}"), &format!("{}", p * 100 + i)))
                    .collect()
            })
            .collect();
        Self::new(pages)
    }
}

/// What the extractor did to the stub
#[derive(Debug, Default)]
pub struct Trace {
    pub launches: usize,
    pub closed: usize,
    pub visited: Vec<String>,
    pub typed: String,
    pub submitted: bool,
    pub filtered: bool,
    pub current_page: usize,
    pub generation: usize,
    /// Next-control lookups on the current page
    pub next_lookups: usize,
}

type Shared = Rc<RefCell<Trace>>;

pub struct StubLauncher {
    site: Rc<StubSite>,
    pub trace: Shared,
    available: bool,
}

impl StubLauncher {
    pub fn new(site: StubSite) -> Self {
        Self {
            site: Rc::new(site),
            trace: Rc::default(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(StubSite::new(Vec::new()))
        }
    }
}

impl SessionLauncher for StubLauncher {
    type Session = StubSession;

    fn launch(&self) -> ProviderResult<StubSession> {
        if !self.available {
            return Err(ProviderError::Unavailable("stub browser missing".to_string()));
        }
        {
            let mut trace = self.trace.borrow_mut();
            trace.launches += 1;
            trace.current_page = 0;
            trace.generation = 0;
            trace.next_lookups = 0;
        }
        Ok(StubSession {
            site: Rc::clone(&self.site),
            trace: Rc::clone(&self.trace),
            selectors: Selectors::default(),
        })
    }
}

pub struct StubSession {
    site: Rc<StubSite>,
    trace: Shared,
    selectors: Selectors,
}

impl StubSession {
    fn element(&self, node: Node) -> StubElement {
        StubElement {
            node,
            generation: self.trace.borrow().generation,
            site: Rc::clone(&self.site),
            trace: Rc::clone(&self.trace),
            selectors: self.selectors.clone(),
        }
    }

    fn current_listings(&self) -> ProviderResult<Vec<StubElement>> {
        let trace = self.trace.borrow();
        if !trace.filtered {
            return Ok(Vec::new());
        }
        let page = trace.current_page;
        if self.site.broken_page == Some(page + 1) {
            return Err(ProviderError::Browser("browser disconnected".to_string()));
        }
        let count = self.site.pages.get(page).map_or(0, Vec::len);
        drop(trace);
        Ok((0..count).map(|i| self.element(Node::Item(page, i))).collect())
    }
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.trace.borrow_mut().closed += 1;
    }
}

impl PageSource for StubSession {
    type Element = StubElement;

    fn navigate(&mut self, url: &str) -> ProviderResult<()> {
        if self.site.navigation_fails {
            return Err(ProviderError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.trace.borrow_mut().visited.push(url.to_string());
        Ok(())
    }

    fn is_ready(&self) -> ProviderResult<bool> {
        Ok(!self.trace.borrow().visited.is_empty())
    }

    fn find_element(&self, selector: &str) -> ProviderResult<StubElement> {
        let not_found = || ProviderError::NotFound(selector.to_string());
        let category = format!("label[for='{}']", self.site.category);

        if selector == self.selectors.search_input {
            if !self.site.has_search_input {
                return Err(not_found());
            }
            return Ok(self.element(Node::SearchInput));
        }
        if selector == category {
            let trace = self.trace.borrow();
            if !self.site.has_category || !trace.submitted {
                return Err(not_found());
            }
            drop(trace);
            return Ok(self.element(Node::CategoryLabel));
        }
        if selector == self.selectors.item {
            return self.current_listings()?.into_iter().next().ok_or_else(not_found);
        }
        if selector == self.selectors.next_page {
            let mut trace = self.trace.borrow_mut();
            trace.next_lookups += 1;
            let rendered = trace.next_lookups > self.site.next_delay;
            let page = trace.current_page;
            drop(trace);
            if rendered && page + 1 < self.site.pages.len() {
                return Ok(self.element(Node::Next));
            }
        }
        Err(not_found())
    }

    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<StubElement>> {
        if selector == self.selectors.item {
            return self.current_listings();
        }
        Ok(self.find_element(selector).into_iter().collect())
    }
}

#[derive(Debug, Clone)]
enum Node {
    SearchInput,
    CategoryLabel,
    Item(usize, usize),
    Heading(usize, usize),
    Author(String),
    Price(String),
    Next,
}

pub struct StubElement {
    node: Node,
    generation: usize,
    site: Rc<StubSite>,
    trace: Shared,
    selectors: Selectors,
}

impl StubElement {
    fn listing(&self, page: usize, index: usize) -> &Listing {
        &self.site.pages[page][index]
    }

    fn child(&self, node: Node) -> StubElement {
        StubElement {
            node,
            generation: self.generation,
            site: Rc::clone(&self.site),
            trace: Rc::clone(&self.trace),
            selectors: self.selectors.clone(),
        }
    }
}

impl PageElement for StubElement {
    fn find_element(&self, selector: &str) -> ProviderResult<Self> {
        let not_found = || ProviderError::NotFound(selector.to_string());
        let Node::Item(page, index) = self.node else {
            return Err(not_found());
        };
        let listing = self.listing(page, index);

        if selector == self.selectors.title {
            return listing
                .title
                .as_ref()
                .map(|_| self.child(Node::Heading(page, index)))
                .ok_or_else(not_found);
        }
        if selector == self.selectors.price {
            return listing
                .price
                .clone()
                .map(|p| self.child(Node::Price(p)))
                .ok_or_else(not_found);
        }
        Err(not_found())
    }

    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<Self>> {
        match self.node {
            Node::Item(page, index) if selector == self.selectors.author => Ok(self
                .listing(page, index)
                .authors
                .iter()
                .map(|a| self.child(Node::Author(a.clone())))
                .collect()),
            _ => Ok(self.find_element(selector).into_iter().collect()),
        }
    }

    fn text(&self) -> ProviderResult<String> {
        Ok(match &self.node {
            Node::Heading(page, index) => self.listing(*page, *index).title.clone().unwrap_or_default(),
            Node::Author(name) => name.clone(),
            Node::Price(text) => text.clone(),
            Node::Next => "Next".to_string(),
            _ => String::new(),
        })
    }

    fn attribute(&self, name: &str) -> ProviderResult<Option<String>> {
        match &self.node {
            Node::Heading(page, index) if name == "href" => Ok(self.listing(*page, *index).href.clone()),
            _ => Ok(None),
        }
    }

    fn click(&self) -> ProviderResult<()> {
        let mut trace = self.trace.borrow_mut();
        match self.node {
            Node::CategoryLabel => trace.filtered = true,
            Node::Next => {
                trace.current_page += 1;
                trace.next_lookups = 0;
                if self.site.next_detaches {
                    trace.generation += 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn send_keys(&self, keys: &str) -> ProviderResult<()> {
        self.trace.borrow_mut().typed.push_str(keys);
        Ok(())
    }

    fn submit(&self) -> ProviderResult<()> {
        self.trace.borrow_mut().submitted = true;
        Ok(())
    }

    fn is_actionable(&self) -> ProviderResult<bool> {
        Ok(match self.node {
            Node::Next => self.site.next_actionable,
            _ => true,
        })
    }

    fn is_stale(&self) -> ProviderResult<bool> {
        Ok(self.generation != self.trace.borrow().generation)
    }
}

/// Extractor settings with waits short enough for tests
pub fn quick_config() -> ExtractorConfig {
    ExtractorConfig {
        site_url: "https://shop.test/".to_string(),
        wait: WaitPolicy {
            timeout: Duration::from_millis(60),
            poll_interval: Duration::from_millis(5),
        },
        ..ExtractorConfig::default()
    }
}
