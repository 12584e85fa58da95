//! Lazily built page objects, one per screen per scenario.

use std::sync::{Arc, OnceLock};

use super::{
    CartPage, CheckoutCompletePage, CheckoutOverviewPage, CheckoutPage, LoginPage, PageKind,
    ProductPage, Screen,
};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;

/// Creates each page object on first access and hands out the same
/// instance afterwards
#[derive(Debug)]
pub struct PageFactory {
    driver: Arc<dyn BrowserDriver>,
    store_url: String,
    timeouts: Timeouts,
    login: OnceLock<LoginPage>,
    product: OnceLock<ProductPage>,
    cart: OnceLock<CartPage>,
    checkout: OnceLock<CheckoutPage>,
    overview: OnceLock<CheckoutOverviewPage>,
    complete: OnceLock<CheckoutCompletePage>,
}

impl PageFactory {
    /// Create a factory bound to one driver
    #[must_use]
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        store_url: impl Into<String>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            driver,
            store_url: store_url.into(),
            timeouts,
            login: OnceLock::new(),
            product: OnceLock::new(),
            cart: OnceLock::new(),
            checkout: OnceLock::new(),
            overview: OnceLock::new(),
            complete: OnceLock::new(),
        }
    }

    /// The shared driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    pub fn login_page(&self) -> &LoginPage {
        self.login.get_or_init(|| {
            LoginPage::new(Arc::clone(&self.driver), &self.store_url, self.timeouts)
        })
    }

    pub fn product_page(&self) -> &ProductPage {
        self.product.get_or_init(|| {
            ProductPage::new(Arc::clone(&self.driver), &self.store_url, self.timeouts)
        })
    }

    pub fn cart_page(&self) -> &CartPage {
        self.cart
            .get_or_init(|| CartPage::new(Arc::clone(&self.driver), self.timeouts))
    }

    pub fn checkout_page(&self) -> &CheckoutPage {
        self.checkout
            .get_or_init(|| CheckoutPage::new(Arc::clone(&self.driver), self.timeouts))
    }

    pub fn checkout_overview_page(&self) -> &CheckoutOverviewPage {
        self.overview
            .get_or_init(|| CheckoutOverviewPage::new(Arc::clone(&self.driver), self.timeouts))
    }

    pub fn checkout_complete_page(&self) -> &CheckoutCompletePage {
        self.complete
            .get_or_init(|| CheckoutCompletePage::new(Arc::clone(&self.driver), self.timeouts))
    }

    /// The page object for a screen, behind the shared contract
    pub fn screen(&self, kind: PageKind) -> &dyn Screen {
        match kind {
            PageKind::Login => self.login_page(),
            PageKind::Product => self.product_page(),
            PageKind::Cart => self.cart_page(),
            PageKind::Checkout => self.checkout_page(),
            PageKind::CheckoutOverview => self.checkout_overview_page(),
            PageKind::CheckoutComplete => self.checkout_complete_page(),
        }
    }

    /// The page object matching `url`, if any
    pub fn page_for_url(&self, url: &str) -> Option<&dyn Screen> {
        page_kind_for_url(&self.store_url, url).map(|kind| self.screen(kind))
    }
}

/// Which screen a URL belongs to.
///
/// The storefront root with no screen-specific path is the login page.
#[must_use]
pub fn page_kind_for_url(store_url: &str, url: &str) -> Option<PageKind> {
    let lower = url.to_lowercase();
    if url.contains("inventory.html") {
        Some(PageKind::Product)
    } else if lower.contains("cart") {
        Some(PageKind::Cart)
    } else if url.contains("checkout-step-one") {
        Some(PageKind::Checkout)
    } else if url.contains("checkout-step-two") {
        Some(PageKind::CheckoutOverview)
    } else if url.contains("checkout-complete") {
        Some(PageKind::CheckoutComplete)
    } else if url.starts_with(store_url) && !url.contains("inventory") && !url.contains("checkout")
    {
        Some(PageKind::Login)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeStore;

    const STORE: &str = "https://www.saucedemo.com/";

    mod url_tests {
        use super::*;

        #[test]
        fn test_each_screen_url() {
            let cases = [
                ("https://www.saucedemo.com/", Some(PageKind::Login)),
                ("https://www.saucedemo.com/inventory.html", Some(PageKind::Product)),
                ("https://www.saucedemo.com/cart.html", Some(PageKind::Cart)),
                ("https://www.saucedemo.com/Cart.html", Some(PageKind::Cart)),
                ("https://www.saucedemo.com/checkout-step-one.html", Some(PageKind::Checkout)),
                (
                    "https://www.saucedemo.com/checkout-step-two.html",
                    Some(PageKind::CheckoutOverview),
                ),
                (
                    "https://www.saucedemo.com/checkout-complete.html",
                    Some(PageKind::CheckoutComplete),
                ),
                ("https://example.com/", None),
            ];
            for (url, expected) in cases {
                assert_eq!(page_kind_for_url(STORE, url), expected, "{url}");
            }
        }

        #[test]
        fn test_inventory_item_detail_is_not_login() {
            assert_eq!(
                page_kind_for_url(STORE, "https://www.saucedemo.com/inventory-item.html?id=4"),
                None
            );
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_same_instance_on_every_access() {
            let driver: Arc<dyn BrowserDriver> = Arc::new(FakeStore::new(STORE));
            let factory = PageFactory::new(driver, STORE, Timeouts::default());
            assert!(std::ptr::eq(factory.login_page(), factory.login_page()));
            assert!(std::ptr::eq(factory.cart_page(), factory.cart_page()));
            assert!(std::ptr::eq(
                factory.checkout_complete_page(),
                factory.checkout_complete_page()
            ));
        }

        #[test]
        fn test_screen_dispatch_matches_kind() {
            let driver: Arc<dyn BrowserDriver> = Arc::new(FakeStore::new(STORE));
            let factory = PageFactory::new(driver, STORE, Timeouts::default());
            for kind in PageKind::ALL {
                let screen = factory.screen(kind);
                assert_eq!(screen.descriptor().name, kind.to_string());
            }
        }

        #[test]
        fn test_page_for_url() {
            let driver: Arc<dyn BrowserDriver> = Arc::new(FakeStore::new(STORE));
            let factory = PageFactory::new(driver, STORE, Timeouts::default());
            let screen = factory
                .page_for_url("https://www.saucedemo.com/checkout-step-two.html")
                .unwrap();
            assert_eq!(screen.descriptor().expected_title, "Checkout: Overview");
        }
    }
}
