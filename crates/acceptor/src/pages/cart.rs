use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use super::{PageDescriptor, Screen, UrlMatch};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;

/// Shopping cart
#[derive(Debug)]
pub struct CartPage {
    descriptor: PageDescriptor,
    ui: Interactor,
}

impl CartPage {
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts) -> Self {
        Self {
            descriptor: PageDescriptor::new("cart", "cart", locators::CART_PAGE_TITLE, "Your Cart")
                .with_url_match(UrlMatch::ContainsIgnoreCase),
            ui: Interactor::new(driver, timeouts, "cart"),
        }
    }

    /// Whether a row with exactly this product label is present
    pub async fn is_product_in_cart(&self, product_name: &str) -> bool {
        self.ui
            .is_present(
                &locators::cart_item(product_name),
                self.ui.timeouts().presence,
            )
            .await
    }

    pub async fn cart_item_text(&self, product_name: &str) -> Option<String> {
        self.ui
            .text(
                &locators::cart_item(product_name),
                self.ui.timeouts().element,
            )
            .await
    }

    pub async fn click_checkout_button(&self) -> bool {
        self.ui
            .click(&locators::CHECKOUT_BUTTON, self.ui.timeouts().element)
            .await
    }

    /// Loaded, correct title, product present
    pub async fn verify_cart_contents(&self, product_name: &str) -> bool {
        if !self.verify().await {
            return false;
        }
        if !self.is_product_in_cart(product_name).await {
            error!(product = product_name, "product not found in cart");
            return false;
        }
        true
    }
}

#[async_trait]
impl Screen for CartPage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
