//! Page objects for the storefront screens.
//!
//! A screen is data: a [`PageDescriptor`] naming its URL fragment, its
//! identifying element and its expected title. The shared [`Screen`] trait
//! turns any descriptor plus an [`Interactor`] into the loaded / title /
//! verify contract; each page type only adds its own actions.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::interaction::Interactor;
use crate::locator::Locator;

mod cart;
mod checkout;
mod complete;
pub mod factory;
mod login;
mod overview;
mod product;

pub use cart::CartPage;
pub use checkout::{CheckoutInfo, CheckoutPage};
pub use complete::CheckoutCompletePage;
pub use factory::{page_kind_for_url, PageFactory};
pub use login::LoginPage;
pub use overview::CheckoutOverviewPage;
pub use product::ProductPage;

/// The six storefront screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Login form
    Login,
    /// Inventory listing
    Product,
    /// Shopping cart
    Cart,
    /// Checkout step one (buyer information)
    Checkout,
    /// Checkout step two
    CheckoutOverview,
    /// Order confirmation
    CheckoutComplete,
}

impl PageKind {
    /// All screens in flow order
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::Product,
        Self::Cart,
        Self::Checkout,
        Self::CheckoutOverview,
        Self::CheckoutComplete,
    ];
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::CheckoutOverview => "checkout overview",
            Self::CheckoutComplete => "checkout complete",
        };
        f.write_str(name)
    }
}

/// How a screen's URL fragment is compared with the current URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMatch {
    /// Plain substring
    #[default]
    Contains,
    /// Substring after lowercasing both sides
    ContainsIgnoreCase,
}

impl UrlMatch {
    /// Whether `url` matches `fragment`
    #[must_use]
    pub fn matches(self, url: &str, fragment: &str) -> bool {
        match self {
            Self::Contains => url.contains(fragment),
            Self::ContainsIgnoreCase => url.to_lowercase().contains(&fragment.to_lowercase()),
        }
    }
}

/// Where a screen's title is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleSource {
    /// Text of the marker element
    #[default]
    Marker,
    /// The document title
    Document,
}

/// Data-only description of one screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Screen name used in logs
    pub name: &'static str,
    /// Fragment the URL must contain while the screen is shown
    pub url_fragment: String,
    /// URL comparison mode
    pub url_match: UrlMatch,
    /// Element that identifies the screen
    pub marker: Locator,
    /// Where the title comes from
    pub title_source: TitleSource,
    /// Exact expected title
    pub expected_title: &'static str,
}

impl PageDescriptor {
    /// Create a descriptor whose title is the marker text
    #[must_use]
    pub fn new(
        name: &'static str,
        url_fragment: impl Into<String>,
        marker: Locator,
        expected_title: &'static str,
    ) -> Self {
        Self {
            name,
            url_fragment: url_fragment.into(),
            url_match: UrlMatch::Contains,
            marker,
            title_source: TitleSource::Marker,
            expected_title,
        }
    }

    /// Set URL comparison mode
    #[must_use]
    pub const fn with_url_match(mut self, url_match: UrlMatch) -> Self {
        self.url_match = url_match;
        self
    }

    /// Set title source
    #[must_use]
    pub const fn with_title_source(mut self, title_source: TitleSource) -> Self {
        self.title_source = title_source;
        self
    }

    /// Whether `url` belongs to this screen
    #[must_use]
    pub fn url_matches(&self, url: &str) -> bool {
        self.url_match.matches(url, &self.url_fragment)
    }
}

/// Exact title comparison; `None` never matches
#[must_use]
pub fn title_matches(expected: &str, actual: Option<&str>) -> bool {
    actual == Some(expected)
}

/// Loaded / title / verify contract shared by every screen
#[async_trait]
pub trait Screen: Send + Sync + fmt::Debug {
    /// The screen's descriptor
    fn descriptor(&self) -> &PageDescriptor;

    /// The interaction layer bound to this screen
    fn ui(&self) -> &Interactor;

    /// URL contains the fragment AND the marker element is present
    async fn is_loaded(&self) -> bool {
        let descriptor = self.descriptor();
        let ui = self.ui();
        let url = ui.current_url().await;
        descriptor.url_matches(&url)
            && ui
                .is_present(&descriptor.marker, ui.timeouts().presence)
                .await
    }

    /// Current title according to the descriptor's title source
    async fn title(&self) -> Option<String> {
        let descriptor = self.descriptor();
        let ui = self.ui();
        match descriptor.title_source {
            TitleSource::Marker => ui.text(&descriptor.marker, ui.timeouts().element).await,
            TitleSource::Document => Some(ui.title().await),
        }
    }

    /// Title equals the expected constant
    async fn has_correct_title(&self) -> bool {
        let title = self.title().await;
        title_matches(self.descriptor().expected_title, title.as_deref())
    }

    /// Loaded, then title; stops and logs at the first failure
    async fn verify(&self) -> bool {
        let name = self.descriptor().name;
        if !self.is_loaded().await {
            error!(page = name, "page not loaded");
            return false;
        }
        if !self.has_correct_title().await {
            error!(
                page = name,
                expected = self.descriptor().expected_title,
                "incorrect page title"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators;

    mod title_tests {
        use super::*;

        #[test]
        fn test_exact_match() {
            assert!(title_matches("Products", Some("Products")));
        }

        #[test]
        fn test_case_and_whitespace_rejected() {
            assert!(!title_matches("Products", Some("products")));
            assert!(!title_matches("Products", Some(" Products")));
            assert!(!title_matches("Products", Some("Products\n")));
            assert!(!title_matches("Products", None));
        }
    }

    mod descriptor_tests {
        use super::*;

        #[test]
        fn test_url_match_modes() {
            let cart = PageDescriptor::new("cart", "cart", locators::CART_PAGE_TITLE, "Your Cart")
                .with_url_match(UrlMatch::ContainsIgnoreCase);
            assert!(cart.url_matches("https://www.saucedemo.com/Cart.html"));

            let product = PageDescriptor::new(
                "product",
                "inventory.html",
                locators::PRODUCT_PAGE,
                "Products",
            );
            assert!(product.url_matches("https://www.saucedemo.com/inventory.html"));
            assert!(!product.url_matches("https://www.saucedemo.com/INVENTORY.html"));
        }

        #[test]
        fn test_defaults() {
            let d = PageDescriptor::new("x", "x", locators::PRODUCT_PAGE, "X");
            assert_eq!(d.url_match, UrlMatch::Contains);
            assert_eq!(d.title_source, TitleSource::Marker);
        }
    }

    #[test]
    fn test_page_kind_display() {
        assert_eq!(PageKind::CheckoutOverview.to_string(), "checkout overview");
        assert_eq!(PageKind::ALL.len(), 6);
    }
}
