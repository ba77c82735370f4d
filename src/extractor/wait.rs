//! Bounded waits on provider readiness conditions
//!
//! Every wait polls until its condition holds or the policy's timeout passes.
//! A `NotFound` from the provider means "not yet"; any other provider error
//! ends the wait immediately.

use std::time::{Duration, Instant};

use crate::provider::{PageElement, PageSource, ProviderError, ProviderResult};

/// How long to wait and how often to look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WaitError {
    #[error("Timed out after {waited:?} waiting for {condition}")]
    Timeout { condition: String, waited: Duration },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Poll `probe` until it yields a value.
///
/// `Ok(None)` and `Err(NotFound)` keep polling; the probe always runs at least once.
pub fn wait_until<T>(
    policy: WaitPolicy,
    condition: &str,
    mut probe: impl FnMut() -> ProviderResult<Option<T>>,
) -> Result<T, WaitError> {
    let start = Instant::now();
    loop {
        match probe() {
            Ok(Some(value)) => {
                tracing::trace!("{} satisfied after {:?}", condition, start.elapsed());
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(WaitError::Timeout {
                condition: condition.to_string(),
                waited,
            });
        }
        std::thread::sleep(policy.poll_interval.min(policy.timeout - waited));
    }
}

/// Wait for the document to finish loading
pub fn document_ready<P: PageSource>(page: &P, policy: WaitPolicy) -> Result<(), WaitError> {
    wait_until(policy, "document ready", || {
        Ok(page.is_ready()?.then_some(()))
    })
}

/// Wait for `selector` to match something
pub fn element_present<P: PageSource>(
    page: &P,
    selector: &str,
    policy: WaitPolicy,
) -> Result<P::Element, WaitError> {
    wait_until(policy, &format!("'{selector}' to be present"), || {
        page.find_element(selector).map(Some)
    })
}

/// Wait for `selector` to match an element that can be clicked
pub fn element_clickable<P: PageSource>(
    page: &P,
    selector: &str,
    policy: WaitPolicy,
) -> Result<P::Element, WaitError> {
    wait_until(policy, &format!("'{selector}' to be clickable"), || {
        let element = page.find_element(selector)?;
        Ok(element.is_actionable()?.then_some(element))
    })
}

/// Wait until `element` is detached from the document
pub fn stale<E: PageElement>(element: &E, policy: WaitPolicy) -> Result<(), WaitError> {
    wait_until(policy, "previous page to go stale", || {
        Ok(element.is_stale()?.then_some(()))
    })
}
