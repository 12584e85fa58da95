//! Chromium-backed [`BrowserDriver`] over the Chrome `DevTools` Protocol.
//!
//! Compiled with the `browser` feature. The CDP event handler runs on its
//! own task for the lifetime of the driver.

use std::fmt;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::driver::{BrowserDriver, DriverConfig, ElementHandle};
use crate::locator::Selector;
use crate::result::{AcceptorError, AcceptorResult};

const IS_DISPLAYED_FN: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.visibility !== 'hidden' && style.display !== 'none' \
        && rect.width > 0 && rect.height > 0; }";

const TAG_NAME_FN: &str = "function() { return this.tagName.toLowerCase(); }";

const CLEAR_FN: &str = "function() { \
    this.value = ''; \
    this.dispatchEvent(new Event('input', { bubbles: true })); }";

/// Browser driver with a real CDP connection
pub struct ChromiumDriver {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

impl fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumDriver").finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    /// Launch chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns `BrowserNotFound` when no executable can be located and
    /// `BrowserLaunch` when the process fails to start.
    pub async fn launch(config: &DriverConfig) -> AcceptorResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height)
            .launch_timeout(config.launch_timeout);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|message| {
            if config.executable_path.is_none() && message.contains("detect") {
                AcceptorError::BrowserNotFound
            } else {
                AcceptorError::BrowserLaunch { message }
            }
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| AcceptorError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AcceptorError::BrowserLaunch {
                message: e.to_string(),
            })?;

        tracing::info!(headless = config.headless, "chromium launched");
        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    async fn element(&self, selector: &Selector) -> Option<Element> {
        let found = match selector {
            Selector::XPath(xpath) => self.page.find_xpath(xpath.to_string()).await,
            other => {
                let css = other.to_css().unwrap_or_default();
                self.page.find_element(css).await
            }
        };
        match found {
            Ok(element) => Some(element),
            Err(e) => {
                tracing::trace!(%selector, error = %e, "no match");
                None
            }
        }
    }

    async fn require(&self, selector: &Selector) -> AcceptorResult<Element> {
        self.element(selector)
            .await
            .ok_or_else(|| AcceptorError::driver(format!("no element matches {selector}")))
    }
}

async fn js_value(element: &Element, function: &str) -> AcceptorResult<serde_json::Value> {
    let returns = element
        .call_js_fn(function, false)
        .await
        .map_err(|e| AcceptorError::driver(e.to_string()))?;
    Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> AcceptorResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AcceptorError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn refresh(&self) -> AcceptorResult<()> {
        self.page
            .reload()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> AcceptorResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn title(&self) -> AcceptorResult<String> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn find(&self, selector: &Selector) -> AcceptorResult<Option<ElementHandle>> {
        let Some(element) = self.element(selector).await else {
            return Ok(None);
        };
        let text = element
            .inner_text()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?
            .unwrap_or_default();
        let displayed = js_value(&element, IS_DISPLAYED_FN)
            .await?
            .as_bool()
            .unwrap_or(false);
        let tag_name = js_value(&element, TAG_NAME_FN)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(Some(ElementHandle {
            selector: selector.value().to_string(),
            tag_name,
            text,
            displayed,
        }))
    }

    async fn click(&self, selector: &Selector) -> AcceptorResult<()> {
        self.require(selector)
            .await?
            .click()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> AcceptorResult<()> {
        let element = self.require(selector).await?;
        js_value(&element, CLEAR_FN).await?;
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> AcceptorResult<()> {
        let element = self.require(selector).await?;
        element
            .focus()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        Ok(())
    }

    async fn quit(&self) -> AcceptorResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| AcceptorError::driver(e.to_string()))?;
        self.handler.abort();
        tracing::info!("chromium closed");
        Ok(())
    }
}
