use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::{PageDescriptor, Screen, TitleSource};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;
use crate::result::AcceptorResult;

/// Prefix every storefront error banner starts with
const ERROR_PREFIX: &str = "Epic sadface:";

/// Login form at the storefront root
#[derive(Debug)]
pub struct LoginPage {
    descriptor: PageDescriptor,
    ui: Interactor,
    url: String,
}

impl LoginPage {
    /// Bind the login screen to a driver
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, store_url: &str, timeouts: Timeouts) -> Self {
        let descriptor =
            PageDescriptor::new("login", store_url, locators::LOGIN_BUTTON, "Swag Labs")
                .with_title_source(TitleSource::Document);
        Self {
            descriptor,
            ui: Interactor::new(driver, timeouts, "login"),
            url: store_url.to_string(),
        }
    }

    /// Navigate to the login form
    pub async fn open(&self) -> AcceptorResult<()> {
        self.ui.navigate(&self.url).await?;
        info!("navigated to login page");
        Ok(())
    }

    pub async fn enter_username(&self, username: &str) -> bool {
        self.ui
            .enter_text(&locators::USERNAME_FIELD, username, self.ui.timeouts().element)
            .await
    }

    pub async fn enter_password(&self, password: &str) -> bool {
        self.ui
            .enter_text(&locators::PASSWORD_FIELD, password, self.ui.timeouts().element)
            .await
    }

    pub async fn click_login_button(&self) -> bool {
        self.ui
            .click(&locators::LOGIN_BUTTON, self.ui.timeouts().element)
            .await
    }

    /// Fill both fields and submit
    pub async fn login(&self, username: &str, password: &str) -> bool {
        info!(username, "attempting login");
        let username_ok = self.enter_username(username).await;
        let password_ok = self.enter_password(password).await;
        if !(username_ok && password_ok) {
            error!("failed to enter credentials");
            return false;
        }
        self.click_login_button().await
    }

    /// Whether the error banner shows up within the error timeout
    pub async fn is_error_message_displayed(&self) -> bool {
        self.ui
            .is_present(
                &locators::ERROR_MESSAGE_CONTAINER,
                self.ui.timeouts().error_banner,
            )
            .await
    }

    /// The `Epic sadface:` line of the error banner, if one is shown
    pub async fn error_message(&self) -> Option<String> {
        if !self.is_error_message_displayed().await {
            return None;
        }
        let text = self
            .ui
            .text(&locators::ERROR_MESSAGE_CONTAINER, self.ui.timeouts().logout)
            .await?;
        Some(extract_error_line(&text))
    }

    /// Empty both credential fields
    pub async fn clear_credentials(&self) {
        self.enter_username("").await;
        self.enter_password("").await;
        info!("cleared credentials");
    }

    /// URL reaches the inventory, then the products title appears
    pub async fn is_login_successful(&self) -> bool {
        let timeouts = self.ui.timeouts();
        if !self
            .ui
            .wait_for_url_contains("inventory.html", timeouts.navigation)
            .await
        {
            return false;
        }
        self.ui
            .is_present(&locators::PRODUCT_PAGE, timeouts.presence)
            .await
    }
}

/// The banner may also carry the close button's text
fn extract_error_line(text: &str) -> String {
    text.lines()
        .find(|line| line.contains(ERROR_PREFIX))
        .unwrap_or(text)
        .trim()
        .to_string()
}

#[async_trait]
impl Screen for LoginPage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
