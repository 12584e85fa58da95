//! Base interaction layer.
//!
//! Every page object talks to the browser through an [`Interactor`]. Lookups
//! poll the driver until the element appears or the timeout passes; a lookup
//! that gives up logs one error with the selector and the timeout and
//! returns `None`/`false` instead of failing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::Timeouts;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Locator;
use crate::result::AcceptorResult;
use crate::wait::{poll_until, WaitOptions};

/// Timeout-bounded element operations for one screen
#[derive(Debug, Clone)]
pub struct Interactor {
    driver: Arc<dyn BrowserDriver>,
    timeouts: Timeouts,
    page: &'static str,
}

impl Interactor {
    /// Create an interactor for the named screen
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts, page: &'static str) -> Self {
        Self {
            driver,
            timeouts,
            page,
        }
    }

    /// Shared driver handle
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Configured timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Screen name used in logs
    #[must_use]
    pub const fn page(&self) -> &'static str {
        self.page
    }

    fn wait_options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout)
            .with_poll_interval(self.timeouts.poll_interval)
    }

    async fn locate(
        &self,
        locator: &Locator,
        timeout: Duration,
        require_visible: bool,
    ) -> Option<ElementHandle> {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(self.wait_options(timeout), || async move {
            match driver.find(selector).await {
                Ok(Some(element)) if !require_visible || element.displayed => Some(element),
                Ok(_) => None,
                Err(e) => {
                    debug!(%selector, error = %e, "lookup failed");
                    None
                }
            }
        })
        .await;

        if outcome.value.is_none() {
            let state = if require_visible { "visible" } else { "present" };
            error!(
                page = self.page,
                locator = locator.name(),
                %selector,
                timeout_ms = timeout.as_millis() as u64,
                "element not {state} within timeout"
            );
        }
        outcome.value
    }

    /// Wait for an element to be present
    pub async fn find(&self, locator: &Locator, timeout: Duration) -> Option<ElementHandle> {
        self.locate(locator, timeout, false).await
    }

    /// Wait for an element to be present and displayed
    pub async fn find_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Option<ElementHandle> {
        self.locate(locator, timeout, true).await
    }

    /// Click an element once it is visible
    pub async fn click(&self, locator: &Locator, timeout: Duration) -> bool {
        if self.find_visible(locator, timeout).await.is_none() {
            return false;
        }
        match self.driver.click(locator.selector()).await {
            Ok(()) => {
                info!(page = self.page, locator = locator.name(), "clicked");
                true
            }
            Err(e) => {
                error!(page = self.page, locator = locator.name(), error = %e, "click failed");
                false
            }
        }
    }

    /// Clear an input once present, then type `text` into it
    pub async fn enter_text(&self, locator: &Locator, text: &str, timeout: Duration) -> bool {
        if self.find(locator, timeout).await.is_none() {
            return false;
        }
        let selector = locator.selector();
        let typed = match self.driver.clear(selector).await {
            Ok(()) => self.driver.type_text(selector, text).await,
            Err(e) => Err(e),
        };
        match typed {
            Ok(()) => {
                info!(page = self.page, locator = locator.name(), "entered text");
                true
            }
            Err(e) => {
                error!(page = self.page, locator = locator.name(), error = %e, "typing failed");
                false
            }
        }
    }

    /// Trimmed text of a visible element
    pub async fn text(&self, locator: &Locator, timeout: Duration) -> Option<String> {
        self.find_visible(locator, timeout)
            .await
            .map(|element| element.text.trim().to_string())
    }

    /// Whether the element becomes present within the timeout
    pub async fn is_present(&self, locator: &Locator, timeout: Duration) -> bool {
        self.find(locator, timeout).await.is_some()
    }

    /// Whether the element becomes visible within the timeout
    pub async fn is_visible(&self, locator: &Locator, timeout: Duration) -> bool {
        self.find_visible(locator, timeout).await.is_some()
    }

    /// Current URL, empty when the driver cannot report one
    pub async fn current_url(&self) -> String {
        match self.driver.current_url().await {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "current url unavailable");
                String::new()
            }
        }
    }

    /// Wait until the current URL contains `fragment`
    pub async fn wait_for_url_contains(&self, fragment: &str, timeout: Duration) -> bool {
        self.wait_for_url(fragment, timeout, false).await
    }

    /// Case-insensitive variant of [`Self::wait_for_url_contains`]
    pub async fn wait_for_url_contains_ignore_case(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> bool {
        self.wait_for_url(fragment, timeout, true).await
    }

    async fn wait_for_url(&self, fragment: &str, timeout: Duration, ignore_case: bool) -> bool {
        let needle = if ignore_case {
            fragment.to_lowercase()
        } else {
            fragment.to_string()
        };
        let needle = needle.as_str();
        let outcome = poll_until(self.wait_options(timeout), || async move {
            let url = self.current_url().await;
            let url = if ignore_case { url.to_lowercase() } else { url };
            url.contains(needle).then_some(())
        })
        .await;

        if !outcome.is_success() {
            error!(
                page = self.page,
                fragment,
                timeout_ms = timeout.as_millis() as u64,
                "url did not match within timeout"
            );
        }
        outcome.is_success()
    }

    /// Navigate to `url`
    pub async fn navigate(&self, url: &str) -> AcceptorResult<()> {
        info!(page = self.page, url, "navigating");
        self.driver.navigate(url).await
    }

    /// Reload the current page
    pub async fn refresh(&self) -> AcceptorResult<()> {
        info!(page = self.page, "refreshing");
        self.driver.refresh().await
    }

    /// Document title, empty when unavailable
    pub async fn title(&self) -> String {
        self.driver.title().await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Driver with a single element that renders at a fixed instant
    #[derive(Debug)]
    struct DelayedElement {
        selector: Selector,
        present_at: Instant,
        visible_at: Instant,
        typed: Mutex<Vec<String>>,
        clicks: Mutex<u32>,
    }

    impl DelayedElement {
        fn new(selector: Selector, present_after: Duration, visible_after: Duration) -> Self {
            let now = Instant::now();
            Self {
                selector,
                present_at: now + present_after,
                visible_at: now + visible_after,
                typed: Mutex::new(Vec::new()),
                clicks: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl BrowserDriver for DelayedElement {
        async fn navigate(&self, _url: &str) -> AcceptorResult<()> {
            Ok(())
        }
        async fn refresh(&self) -> AcceptorResult<()> {
            Ok(())
        }
        async fn current_url(&self) -> AcceptorResult<String> {
            Ok("https://www.saucedemo.com/inventory.html".to_string())
        }
        async fn title(&self) -> AcceptorResult<String> {
            Ok("Swag Labs".to_string())
        }
        async fn find(&self, selector: &Selector) -> AcceptorResult<Option<ElementHandle>> {
            let now = Instant::now();
            if *selector != self.selector || now < self.present_at {
                return Ok(None);
            }
            Ok(Some(
                ElementHandle::new(selector.value(), "span")
                    .with_text("  Products \n")
                    .with_displayed(now >= self.visible_at),
            ))
        }
        async fn click(&self, _selector: &Selector) -> AcceptorResult<()> {
            *self.clicks.lock().unwrap() += 1;
            Ok(())
        }
        async fn clear(&self, _selector: &Selector) -> AcceptorResult<()> {
            self.typed.lock().unwrap().clear();
            Ok(())
        }
        async fn type_text(&self, _selector: &Selector, text: &str) -> AcceptorResult<()> {
            self.typed.lock().unwrap().push(text.to_string());
            Ok(())
        }
        async fn quit(&self) -> AcceptorResult<()> {
            Ok(())
        }
    }

    const TITLE: Locator = Locator::xpath("title", "//span[@class='title']");

    fn interactor(driver: Arc<DelayedElement>) -> Interactor {
        let timeouts = Timeouts::uniform(Duration::from_secs(1), Duration::from_millis(100));
        Interactor::new(driver, timeouts, "test")
    }

    mod lookup_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_element_before_deadline_is_found() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::from_millis(450),
                Duration::ZERO,
            ));
            let ui = interactor(driver);
            let found = ui.find(&TITLE, Duration::from_secs(1)).await;
            assert!(found.is_some());
        }

        #[tokio::test(start_paused = true)]
        async fn test_element_at_deadline_is_missing() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::from_secs(1),
                Duration::ZERO,
            ));
            let ui = interactor(driver);
            let start = Instant::now();
            assert!(ui.find(&TITLE, Duration::from_secs(1)).await.is_none());
            assert_eq!(start.elapsed(), Duration::from_secs(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_visibility_is_stricter_than_presence() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::ZERO,
                Duration::from_secs(5),
            ));
            let ui = interactor(driver);
            assert!(ui.is_present(&TITLE, Duration::from_millis(300)).await);
            assert!(!ui.is_visible(&TITLE, Duration::from_millis(300)).await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_text_is_trimmed() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::ZERO,
                Duration::ZERO,
            ));
            let ui = interactor(driver);
            assert_eq!(
                ui.text(&TITLE, Duration::from_millis(100)).await.as_deref(),
                Some("Products")
            );
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_requires_visibility() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::ZERO,
                Duration::from_secs(5),
            ));
            let ui = interactor(Arc::clone(&driver));
            assert!(!ui.click(&TITLE, Duration::from_millis(200)).await);
            assert_eq!(*driver.clicks.lock().unwrap(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_enter_text_clears_first() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::ZERO,
                Duration::ZERO,
            ));
            driver.typed.lock().unwrap().push("stale".to_string());
            let ui = interactor(Arc::clone(&driver));
            assert!(ui.enter_text(&TITLE, "standard_user", Duration::from_millis(100)).await);
            assert_eq!(*driver.typed.lock().unwrap(), vec!["standard_user".to_string()]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_url() {
            let driver = Arc::new(DelayedElement::new(
                TITLE.selector().clone(),
                Duration::ZERO,
                Duration::ZERO,
            ));
            let ui = interactor(driver);
            assert!(ui.wait_for_url_contains("inventory.html", Duration::from_millis(100)).await);
            assert!(!ui.wait_for_url_contains("INVENTORY", Duration::from_millis(100)).await);
            assert!(
                ui.wait_for_url_contains_ignore_case("INVENTORY", Duration::from_millis(100))
                    .await
            );
        }
    }
}
