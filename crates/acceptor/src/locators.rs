//! Locator registry for the storefront screens.
//!
//! Every locator the page objects use lives here. Static entries are
//! `const`; product-dependent entries are functions.

use crate::locator::{Locator, Selector};

// Login
pub const LOGIN_BUTTON: Locator = Locator::xpath("login button", "//input[@id='login-button']");
pub const USERNAME_FIELD: Locator = Locator::xpath("username field", "//input[@id='user-name']");
pub const PASSWORD_FIELD: Locator = Locator::xpath("password field", "//input[@id='password']");

// Screen titles
pub const PRODUCT_PAGE: Locator = Locator::xpath(
    "products title",
    "//span[@class='title' and text()='Products']",
);
pub const CHECKOUT_PAGE: Locator = Locator::xpath(
    "checkout information title",
    "//span[@class='title' and text()='Checkout: Your Information']",
);
pub const CART_PAGE_TITLE: Locator = Locator::xpath(
    "cart title",
    "//span[@class='title' and text()='Your Cart']",
);
pub const CHECKOUT_OVERVIEW: Locator = Locator::xpath(
    "checkout overview title",
    "//span[@class='title' and text()='Checkout: Overview']",
);
pub const CHECKOUT_COMPLETE: Locator = Locator::xpath(
    "checkout complete title",
    "//span[@class='title' and text()='Checkout: Complete!']",
);

// Checkout flow
pub const FIRST_NAME: Locator = Locator::xpath("first name field", "//input[@id='first-name']");
pub const LAST_NAME: Locator = Locator::xpath("last name field", "//input[@id='last-name']");
pub const POSTAL_CODE: Locator = Locator::xpath("postal code field", "//input[@id='postal-code']");
pub const CHECKOUT_BUTTON: Locator = Locator::xpath("checkout button", "//button[@id='checkout']");
pub const CONTINUE_BUTTON: Locator = Locator::xpath("continue button", "//input[@id='continue']");
pub const FINISH_BUTTON: Locator = Locator::xpath("finish button", "//button[@id='finish']");

// Navigation
pub const CART_ICON: Locator = Locator::xpath("cart icon", "//a[@class='shopping_cart_link']");
pub const REACT_BURGER: Locator = Locator::xpath(
    "navigation menu button",
    "//button[@id='react-burger-menu-btn']",
);
pub const LOGOUT: Locator = Locator::xpath("logout link", "//a[@id='logout_sidebar_link']");
pub const INVENTORY_CONTAINER: Locator = Locator::id("inventory container", "inventory_container");

// Error messages
pub const ERROR_MESSAGE_CONTAINER: Locator =
    Locator::xpath("error message", "//h3[@data-test='error']");
pub const ERROR_BANNER: Locator =
    Locator::class_name("error banner", "error-message-container");
pub const UN_PW_ERROR: Locator = Locator::xpath(
    "credentials mismatch error",
    "//h3[contains(text(),'Epic sadface: Username and password do not match any user in this service')]",
);
pub const LOCKED_OUT_ERROR: Locator = Locator::xpath(
    "locked out error",
    "//h3[contains(text(),'Epic sadface: Sorry, this user has been locked out.')]",
);

/// Error text shown for unknown credentials
pub const UN_PW_ERROR_TEXT: &str =
    "Epic sadface: Username and password do not match any user in this service";

/// Error text shown for a locked account
pub const LOCKED_OUT_ERROR_TEXT: &str = "Epic sadface: Sorry, this user has been locked out.";

/// Locator of the specific error element for a known error message
#[must_use]
pub fn error_for_message(message: &str) -> Option<Locator> {
    match message {
        UN_PW_ERROR_TEXT => Some(UN_PW_ERROR),
        LOCKED_OUT_ERROR_TEXT => Some(LOCKED_OUT_ERROR),
        _ => None,
    }
}

/// Cart row for a product; matches the exact on-screen label
#[must_use]
pub fn cart_item(product_name: &str) -> Locator {
    Locator::from_selector(
        format!("cart item '{product_name}'"),
        Selector::xpath(format!("//div[text()={}]", xpath_literal(product_name))),
    )
}

/// Add-to-cart button for a product
#[must_use]
pub fn add_to_cart_button(product_name: &str) -> Locator {
    let id = format!("add-to-cart-{}", product_slug(product_name));
    Locator::from_selector(
        format!("add to cart '{product_name}'"),
        Selector::xpath(format!(
            "//button[contains(@id, {})]",
            xpath_literal(&id)
        )),
    )
}

/// XPath 1.0 string literal for arbitrary text.
///
/// XPath has no escapes, so text holding both quote kinds becomes a
/// `concat()` of single-quoted pieces joined by `"'"`.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let pieces: Vec<String> = text.split('\'').map(|piece| format!("'{piece}'")).collect();
    format!("concat({})", pieces.join(", \"'\", "))
}

/// Product name as used in element ids: lowercased, spaces become hyphens
#[must_use]
pub fn product_slug(product_name: &str) -> String {
    product_name.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_to_cart_button() {
        let locator = add_to_cart_button("Sauce Labs Backpack");
        assert_eq!(
            locator.selector().value(),
            "//button[contains(@id, 'add-to-cart-sauce-labs-backpack')]"
        );
    }

    #[test]
    fn test_cart_item_keeps_case() {
        let locator = cart_item("Sauce Labs Bike Light");
        assert_eq!(
            locator.selector().value(),
            "//div[text()='Sauce Labs Bike Light']"
        );
    }

    #[test]
    fn test_apostrophe_in_product_name() {
        let locator = cart_item("Sauce Labs Kid's Tee");
        assert_eq!(
            locator.selector().value(),
            "//div[text()=\"Sauce Labs Kid's Tee\"]"
        );
        let button = add_to_cart_button("Kid's Tee");
        assert_eq!(
            button.selector().value(),
            "//button[contains(@id, \"add-to-cart-kid's-tee\")]"
        );
    }

    #[test]
    fn test_xpath_literal_with_both_quotes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(
            xpath_literal(r#"the "Kid's" tee"#),
            r#"concat('the "Kid', "'", 's" tee')"#
        );
        assert_eq!(xpath_literal("'"), r#"concat('', "'", '')"#);
    }

    #[test]
    fn test_error_for_message() {
        assert_eq!(error_for_message(UN_PW_ERROR_TEXT), Some(UN_PW_ERROR));
        assert_eq!(error_for_message(LOCKED_OUT_ERROR_TEXT), Some(LOCKED_OUT_ERROR));
        assert_eq!(error_for_message("Epic sadface: something else"), None);
    }

    #[test]
    fn test_error_locators_embed_their_text() {
        assert!(UN_PW_ERROR.selector().value().contains(UN_PW_ERROR_TEXT));
        assert!(LOCKED_OUT_ERROR
            .selector()
            .value()
            .contains(LOCKED_OUT_ERROR_TEXT));
    }

    proptest! {
        #[test]
        fn prop_slug_has_no_spaces_or_uppercase(name in "[A-Za-z ()]{0,40}") {
            let slug = product_slug(&name);
            prop_assert!(!slug.contains(' '));
            prop_assert!(!slug.chars().any(char::is_uppercase));
            prop_assert_eq!(slug.chars().count(), name.chars().count());
        }

        #[test]
        fn prop_slug_ignores_case(name in "[A-Za-z ]{0,40}") {
            prop_assert_eq!(product_slug(&name), product_slug(&name.to_uppercase()));
        }
    }
}
