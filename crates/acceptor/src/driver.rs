//! BrowserDriver - Abstract Browser Automation Trait
//!
//! The interaction layer and page objects only ever talk to a
//! `dyn BrowserDriver`. Implementations:
//!
//! - `ChromiumDriver` (feature `browser`) - CDP via chromiumoxide
//! - [`FakeStore`](crate::mock::FakeStore) - in-process storefront for tests
//!
//! Lookups never wait: polling is the interaction layer's job.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::AcceptorResult;

/// Snapshot of a located element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector text the element was found with
    pub selector: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
    /// Rendered text content
    pub text: String,
    /// Whether the element is rendered and visible
    pub displayed: bool,
}

impl ElementHandle {
    /// Create a new visible element handle
    #[must_use]
    pub fn new(selector: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag_name: tag_name.into(),
            text: String::new(),
            displayed: true,
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }
}

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Timeout for launching the browser
    pub launch_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            executable_path: None,
            sandbox: true,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set executable path
    #[must_use]
    pub fn executable(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Capability set the suite needs from a browser.
///
/// `find` returns `Ok(None)` when nothing matches; `Err` is reserved for
/// driver failures. Element actions address the first match of a selector.
#[async_trait]
pub trait BrowserDriver: Send + Sync + fmt::Debug {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> AcceptorResult<()>;

    /// Reload the current page
    async fn refresh(&self) -> AcceptorResult<()>;

    /// Get current URL
    async fn current_url(&self) -> AcceptorResult<String>;

    /// Get the document title
    async fn title(&self) -> AcceptorResult<String>;

    /// Query the first element matching the selector
    async fn find(&self, selector: &Selector) -> AcceptorResult<Option<ElementHandle>>;

    /// Click element
    async fn click(&self, selector: &Selector) -> AcceptorResult<()>;

    /// Clear an input element
    async fn clear(&self, selector: &Selector) -> AcceptorResult<()>;

    /// Type text into element
    async fn type_text(&self, selector: &Selector, text: &str) -> AcceptorResult<()>;

    /// Close the browser
    async fn quit(&self) -> AcceptorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("//button[@id='finish']", "button");
            assert_eq!(elem.tag_name, "button");
            assert!(elem.text.is_empty());
            assert!(elem.displayed);
        }

        #[test]
        fn test_element_handle_builders() {
            let elem = ElementHandle::new("//span", "span")
                .with_text("Products")
                .with_displayed(false);
            assert_eq!(elem.text, "Products");
            assert!(!elem.displayed);
        }
    }

    mod driver_config_tests {
        use super::*;

        #[test]
        fn test_config_default() {
            let config = DriverConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!(config.window_width, 1920);
            assert_eq!(config.window_height, 1080);
        }

        #[test]
        fn test_config_builder() {
            let config = DriverConfig::new()
                .headless(false)
                .window(800, 600)
                .executable("/usr/bin/chromium")
                .no_sandbox();

            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.window_width, 800);
            assert_eq!(config.executable_path.as_deref(), Some("/usr/bin/chromium"));
        }
    }
}
