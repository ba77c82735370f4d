//! Headless Chrome provider backed by chromiumoxide
//!
//! chromiumoxide speaks the DevTools protocol asynchronously. Each session owns
//! a small tokio runtime and blocks on every call, so callers stay synchronous.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{PageElement, PageSource, ProviderError, ProviderResult, SessionLauncher};

const ACTIONABLE_JS: &str = r#"function() {
    if (!this.isConnected || this.disabled) { return false; }
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
}"#;

const STALE_JS: &str = "function() { return !this.isConnected; }";

const CLICK_JS: &str = "function() { this.click(); }";

/// Linux, macOS and Windows install locations, checked in order
const BROWSER_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Explicit executable; discovered when `None`
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub request_timeout: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Launches one Chrome process per session
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    options: ChromeOptions,
}

impl ChromeLauncher {
    pub fn new(options: ChromeOptions) -> Self {
        Self { options }
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> ProviderResult<ChromeSession> {
        ChromeSession::launch(&self.options)
    }
}

/// Find Chrome/Chromium: explicit path, then `CHROMIUM_PATH`, then common locations.
pub fn find_browser_executable(explicit: Option<&Path>) -> ProviderResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ProviderError::Unavailable(format!(
            "configured browser executable does not exist: {}",
            path.display()
        )));
    }

    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!("CHROMIUM_PATH points to non-existent file: {}", path.display());
    }

    BROWSER_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            ProviderError::Unavailable(
                "no Chrome/Chromium executable found (set CHROMIUM_PATH or chrome_path)".to_string(),
            )
        })
}

/// Fresh profile directory, unique per session
fn profile_dir() -> ProviderResult<TempDir> {
    tempfile::Builder::new()
        .prefix("shelfscrape_chrome_")
        .tempdir()
        .map_err(|e| ProviderError::Unavailable(format!("failed to create user data directory: {e}")))
}

/// A running browser with a single tab
pub struct ChromeSession {
    runtime: Runtime,
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    /// Browser profile; `None` once removed on teardown
    user_data_dir: Option<TempDir>,
}

impl ChromeSession {
    pub fn launch(options: &ChromeOptions) -> ProviderResult<Self> {
        let executable = find_browser_executable(options.executable.as_deref())?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to start runtime: {e}")))?;

        let user_data_dir = profile_dir()?;

        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.path())
            .chrome_executable(executable)
            .arg("--disable-notifications")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("invalid browser config: {e}")))?;

        info!("Launching browser");
        let launched = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(config).await?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        debug!("Browser handler event error: {:?}", e);
                    }
                }
                debug!("Browser event handler task completed");
            });
            let page = browser.new_page("about:blank").await?;
            Ok::<_, chromiumoxide::error::CdpError>((browser, handler, page))
        });

        match launched {
            Ok((browser, handler, page)) => Ok(Self {
                runtime,
                browser,
                handler,
                page,
                user_data_dir: Some(user_data_dir),
            }),
            Err(e) => {
                // dropping the TempDir removes the profile
                Err(ProviderError::Unavailable(format!("failed to launch browser: {e}")))
            }
        }
    }

    fn wrap(&self, inner: Element) -> ChromeElement {
        ChromeElement {
            inner,
            handle: self.runtime.handle().clone(),
        }
    }
}

impl PageSource for ChromeSession {
    type Element = ChromeElement;

    fn navigate(&mut self, url: &str) -> ProviderResult<()> {
        info!("Navigating to {}", url);
        let page = &self.page;
        self.runtime
            .block_on(async {
                page.goto(url).await?;
                page.wait_for_navigation().await?;
                Ok::<_, chromiumoxide::error::CdpError>(())
            })
            .map_err(|e| ProviderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn is_ready(&self) -> ProviderResult<bool> {
        let state = self
            .runtime
            .block_on(self.page.evaluate("document.readyState"))
            .map_err(classify)?
            .into_value::<String>()
            .map_err(|e| ProviderError::Browser(e.to_string()))?;
        Ok(state == "complete")
    }

    fn find_element(&self, selector: &str) -> ProviderResult<ChromeElement> {
        self.runtime
            .block_on(self.page.find_element(selector))
            .map(|el| self.wrap(el))
            .map_err(|e| not_found_or(selector, e))
    }

    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<ChromeElement>> {
        let found = self
            .runtime
            .block_on(self.page.find_elements(selector))
            .map_err(|e| not_found_or(selector, e));
        match found {
            Ok(els) => Ok(els.into_iter().map(|el| self.wrap(el)).collect()),
            Err(ProviderError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        info!("Closing browser");
        let Self {
            runtime,
            browser,
            handler,
            user_data_dir,
            ..
        } = self;

        runtime.block_on(async {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
        });
        handler.abort();

        if let Some(dir) = user_data_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to clean up temp directory {}: {}", path.display(), e);
            }
        }
    }
}

/// A DOM node inside a [`ChromeSession`]
pub struct ChromeElement {
    inner: Element,
    handle: Handle,
}

impl ChromeElement {
    fn wrap(&self, inner: Element) -> Self {
        Self {
            inner,
            handle: self.handle.clone(),
        }
    }

    fn call_bool(&self, function: &str) -> ProviderResult<bool> {
        let returned = self
            .handle
            .block_on(self.inner.call_js_fn(function, false))
            .map_err(classify)?;
        Ok(returned
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

impl PageElement for ChromeElement {
    fn find_element(&self, selector: &str) -> ProviderResult<Self> {
        self.handle
            .block_on(self.inner.find_element(selector))
            .map(|el| self.wrap(el))
            .map_err(|e| not_found_or(selector, e))
    }

    fn find_elements(&self, selector: &str) -> ProviderResult<Vec<Self>> {
        match self.handle.block_on(self.inner.find_elements(selector)) {
            Ok(els) => Ok(els.into_iter().map(|el| self.wrap(el)).collect()),
            Err(e) => match not_found_or(selector, e) {
                ProviderError::NotFound(_) => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    fn text(&self) -> ProviderResult<String> {
        self.handle
            .block_on(self.inner.inner_text())
            .map(Option::unwrap_or_default)
            .map_err(classify)
    }

    fn attribute(&self, name: &str) -> ProviderResult<Option<String>> {
        self.handle
            .block_on(self.inner.attribute(name))
            .map_err(classify)
    }

    fn click(&self) -> ProviderResult<()> {
        let native = self.handle.block_on(async {
            self.inner.scroll_into_view().await?;
            self.inner.click().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        });
        if let Err(e) = native {
            // overlays can swallow the synthetic mouse event; let the DOM click instead
            debug!("Native click failed ({}), falling back to DOM click", e);
            self.handle
                .block_on(self.inner.call_js_fn(CLICK_JS, false))
                .map_err(classify)?;
        }
        Ok(())
    }

    fn send_keys(&self, keys: &str) -> ProviderResult<()> {
        self.handle
            .block_on(async {
                self.inner.focus().await?;
                self.inner.type_str(keys).await?;
                Ok::<_, chromiumoxide::error::CdpError>(())
            })
            .map_err(classify)
    }

    fn submit(&self) -> ProviderResult<()> {
        self.handle
            .block_on(self.inner.press_key("Enter"))
            .map(|_| ())
            .map_err(classify)
    }

    fn is_actionable(&self) -> ProviderResult<bool> {
        self.call_bool(ACTIONABLE_JS)
    }

    fn is_stale(&self) -> ProviderResult<bool> {
        // once the document is replaced the remote object can no longer be resolved
        Ok(self.call_bool(STALE_JS).unwrap_or(true))
    }
}

/// Connection-level failures mean the browser is gone; everything else on a
/// lookup means the selector matched nothing.
fn not_found_or(selector: &str, error: chromiumoxide::error::CdpError) -> ProviderError {
    match classify(error) {
        ProviderError::Browser(reason) if is_connection_failure(&reason) => {
            ProviderError::Browser(reason)
        }
        _ => ProviderError::NotFound(selector.to_string()),
    }
}

fn classify(error: chromiumoxide::error::CdpError) -> ProviderError {
    ProviderError::Browser(error.to_string())
}

fn is_connection_failure(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    reason.contains("websocket")
        || reason.contains("channel")
        || reason.contains("no response")
        || reason.contains("browser closed")
        || reason.contains("connection")
}
