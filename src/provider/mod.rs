//! Page-source providers
//!
//! The extractor never talks to a browser directly. It sees a page through
//! [`PageSource`] and the nodes on it through [`PageElement`]; any automation
//! layer that can answer those calls is substitutable. Sessions come from a
//! [`SessionLauncher`] and are torn down when dropped.

pub mod chrome;

pub use chrome::{ChromeLauncher, ChromeSession};

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failures reported by a page-source provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The session could not be started (browser missing, launch failure)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Any other failure talking to the browser
    #[error("Browser error: {0}")]
    Browser(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// A loaded page that can be navigated and searched with CSS selectors
pub trait PageSource {
    type Element: PageElement;

    fn navigate(&mut self, url: &str) -> ProviderResult<()>;

    /// Whether the document has finished loading
    fn is_ready(&self) -> ProviderResult<bool>;

    /// First match, or `ProviderError::NotFound`
    fn find_element(&self, selector: &str) -> ProviderResult<Self::Element>;

    /// All matches; an empty list is not an error
    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<Self::Element>>;
}

/// A node on a page
pub trait PageElement: Sized {
    fn find_element(&self, selector: &str) -> ProviderResult<Self>;

    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<Self>>;

    /// Rendered text content
    fn text(&self) -> ProviderResult<String>;

    fn attribute(&self, name: &str) -> ProviderResult<Option<String>>;

    fn click(&self) -> ProviderResult<()>;

    fn send_keys(&self, keys: &str) -> ProviderResult<()>;

    /// Submit the form this element belongs to
    fn submit(&self) -> ProviderResult<()>;

    /// Visible, enabled and attached, i.e. safe to click
    fn is_actionable(&self) -> ProviderResult<bool>;

    /// Detached from the document, e.g. after the page was replaced
    fn is_stale(&self) -> ProviderResult<bool>;
}

/// Starts provider sessions
pub trait SessionLauncher {
    type Session: PageSource;

    fn launch(&self) -> ProviderResult<Self::Session>;
}
