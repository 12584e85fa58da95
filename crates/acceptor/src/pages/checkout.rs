use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{PageDescriptor, Screen};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;

/// Buyer information for checkout step one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
}

impl CheckoutInfo {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            postal_code: postal_code.into(),
        }
    }
}

impl Default for CheckoutInfo {
    fn default() -> Self {
        Self::new("John", "Doe", "12345")
    }
}

/// Checkout step one: buyer information form
#[derive(Debug)]
pub struct CheckoutPage {
    descriptor: PageDescriptor,
    ui: Interactor,
}

impl CheckoutPage {
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts) -> Self {
        Self {
            descriptor: PageDescriptor::new(
                "checkout",
                "checkout-step-one",
                locators::CHECKOUT_PAGE,
                "Checkout: Your Information",
            ),
            ui: Interactor::new(driver, timeouts, "checkout"),
        }
    }

    pub async fn enter_first_name(&self, first_name: &str) -> bool {
        self.ui
            .enter_text(&locators::FIRST_NAME, first_name, self.ui.timeouts().element)
            .await
    }

    pub async fn enter_last_name(&self, last_name: &str) -> bool {
        self.ui
            .enter_text(&locators::LAST_NAME, last_name, self.ui.timeouts().element)
            .await
    }

    pub async fn enter_postal_code(&self, postal_code: &str) -> bool {
        self.ui
            .enter_text(&locators::POSTAL_CODE, postal_code, self.ui.timeouts().element)
            .await
    }

    /// Attempt all three fields; true only if every one succeeded
    pub async fn fill_checkout_form(&self, info: &CheckoutInfo) -> bool {
        info!(?info, "filling checkout form");
        let first = self.enter_first_name(&info.first_name).await;
        let last = self.enter_last_name(&info.last_name).await;
        let postal = self.enter_postal_code(&info.postal_code).await;
        first && last && postal
    }

    pub async fn click_continue_button(&self) -> bool {
        self.ui
            .click(&locators::CONTINUE_BUTTON, self.ui.timeouts().element)
            .await
    }

    pub async fn complete_checkout_form(&self, info: &CheckoutInfo) -> bool {
        if !self.fill_checkout_form(info).await {
            error!("failed to fill checkout form");
            return false;
        }
        self.click_continue_button().await
    }
}

#[async_trait]
impl Screen for CheckoutPage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
