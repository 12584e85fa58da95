use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use super::{PageDescriptor, Screen};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;

/// Inventory listing shown after login
#[derive(Debug)]
pub struct ProductPage {
    descriptor: PageDescriptor,
    ui: Interactor,
    store_url: String,
}

impl ProductPage {
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, store_url: &str, timeouts: Timeouts) -> Self {
        Self {
            descriptor: PageDescriptor::new(
                "product",
                "inventory.html",
                locators::PRODUCT_PAGE,
                "Products",
            ),
            ui: Interactor::new(driver, timeouts, "product"),
            store_url: store_url.to_string(),
        }
    }

    pub async fn open_navigation_menu(&self) -> bool {
        self.ui
            .click(&locators::REACT_BURGER, self.ui.timeouts().element)
            .await
    }

    pub async fn click_logout(&self) -> bool {
        self.ui
            .click(&locators::LOGOUT, self.ui.timeouts().logout)
            .await
    }

    /// Open the menu, then follow the logout link
    pub async fn logout(&self) -> bool {
        info!("performing logout");
        if !self.open_navigation_menu().await {
            error!("failed to open navigation menu");
            return false;
        }
        if !self.click_logout().await {
            error!("failed to click logout link");
            return false;
        }
        true
    }

    /// Back on the storefront root, away from the inventory
    pub async fn is_logged_out(&self) -> bool {
        self.ui
            .wait_for_url_contains(&self.store_url, self.ui.timeouts().navigation)
            .await
            && !self.ui.current_url().await.contains("inventory")
    }

    /// Wait for the inventory container to become visible
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui
            .is_visible(&locators::INVENTORY_CONTAINER, timeout)
            .await
    }

    pub async fn add_product_to_cart(&self, product_name: &str) -> bool {
        info!(product = product_name, "adding product to cart");
        self.ui
            .click(
                &locators::add_to_cart_button(product_name),
                self.ui.timeouts().element,
            )
            .await
    }

    /// Click the cart icon and wait for the cart URL
    pub async fn click_cart_icon(&self) -> bool {
        info!("clicking cart icon");
        let timeouts = self.ui.timeouts();
        self.ui.click(&locators::CART_ICON, timeouts.element).await
            && self
                .ui
                .wait_for_url_contains("cart", timeouts.navigation)
                .await
    }

    pub async fn add_product_and_go_to_cart(&self, product_name: &str) -> bool {
        if !self.add_product_to_cart(product_name).await {
            error!(product = product_name, "failed to add product to cart");
            return false;
        }
        self.click_cart_icon().await
    }
}

#[async_trait]
impl Screen for ProductPage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
