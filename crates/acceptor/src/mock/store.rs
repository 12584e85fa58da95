//! In-process storefront that answers [`BrowserDriver`] calls.
//!
//! Models the SauceDemo screens closely enough for the page objects: the
//! same locators, URLs, login rules and error banners. Screens render after
//! a configurable delay measured on `tokio::time::Instant`, so tests with a
//! paused clock can place an element's appearance exactly.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::{Locator, Selector};
use crate::locators;
use crate::result::{AcceptorError, AcceptorResult};

/// Password shared by every storefront user
pub const PASSWORD: &str = "secret_sauce";

/// Products on the inventory screen, in display order
pub const PRODUCTS: [&str; 6] = [
    "Sauce Labs Backpack",
    "Sauce Labs Bike Light",
    "Sauce Labs Bolt T-Shirt",
    "Sauce Labs Fleece Jacket",
    "Sauce Labs Onesie",
    "Test.allTheThings() T-Shirt (Red)",
];

const DOCUMENT_TITLE: &str = "Swag Labs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Blank,
    Login,
    Inventory,
    Cart,
    CheckoutInfo,
    Overview,
    Complete,
}

impl View {
    const fn path(self) -> &'static str {
        match self {
            Self::Blank | Self::Login => "",
            Self::Inventory => "inventory.html",
            Self::Cart => "cart.html",
            Self::CheckoutInfo => "checkout-step-one.html",
            Self::Overview => "checkout-step-two.html",
            Self::Complete => "checkout-complete.html",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        [
            Self::Login,
            Self::Inventory,
            Self::Cart,
            Self::CheckoutInfo,
            Self::Overview,
            Self::Complete,
        ]
        .into_iter()
        .find(|view| view.path() == path)
    }

    const fn needs_session(self) -> bool {
        !matches!(self, Self::Blank | Self::Login)
    }

    const fn has_menu(self) -> bool {
        matches!(
            self,
            Self::Inventory | Self::Cart | Self::CheckoutInfo | Self::Overview | Self::Complete
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Login,
    OpenMenu,
    Logout,
    AddToCart(String),
    OpenCart,
    Checkout,
    Continue,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    PostalCode,
}

#[derive(Debug)]
struct Rendered {
    selector: Selector,
    tag: &'static str,
    text: String,
    displayed: bool,
    action: Action,
    field: Option<Field>,
}

impl Rendered {
    fn new(locator: &Locator, tag: &'static str) -> Self {
        Self {
            selector: locator.selector().clone(),
            tag,
            text: String::new(),
            displayed: true,
            action: Action::None,
            field: None,
        }
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    fn field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }
}

#[derive(Debug)]
struct StoreState {
    view: View,
    rendered_at: Instant,
    session: Option<String>,
    error: Option<String>,
    menu_open: bool,
    cart: Vec<String>,
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    postal_code: String,
    history: Vec<String>,
    closed: bool,
}

impl StoreState {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::PostalCode => &mut self.postal_code,
        }
    }
}

/// Fake storefront implementing [`BrowserDriver`]
#[derive(Debug)]
pub struct FakeStore {
    base_url: String,
    render_delay: Duration,
    slow_user_delay: Duration,
    state: Mutex<StoreState>,
}

impl FakeStore {
    /// Create a store served under `base_url` (must end with `/`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            render_delay: Duration::ZERO,
            slow_user_delay: Duration::from_millis(1500),
            state: Mutex::new(StoreState {
                view: View::Blank,
                rendered_at: Instant::now(),
                session: None,
                error: None,
                menu_open: false,
                cart: Vec::new(),
                username: String::new(),
                password: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                postal_code: String::new(),
                history: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Delay between a screen change and its elements appearing
    #[must_use]
    pub const fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Extra delay the inventory takes for `performance_glitch_user`
    #[must_use]
    pub const fn with_slow_user_delay(mut self, delay: Duration) -> Self {
        self.slow_user_delay = delay;
        self
    }

    /// Products currently in the cart
    #[must_use]
    pub fn cart(&self) -> Vec<String> {
        self.lock().cart.clone()
    }

    /// Logged-in user, if any
    #[must_use]
    pub fn session(&self) -> Option<String> {
        self.lock().session.clone()
    }

    /// Every driver call received, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url_of(&self, view: View) -> String {
        match view {
            View::Blank => "about:blank".to_string(),
            other => format!("{}{}", self.base_url, other.path()),
        }
    }

    fn show(&self, state: &mut StoreState, view: View, extra_delay: Duration) {
        state.view = view;
        state.menu_open = false;
        state.rendered_at = Instant::now() + self.render_delay + extra_delay;
        state.error = None;
    }

    fn render(state: &StoreState) -> Vec<Rendered> {
        let mut elements = Vec::new();
        match state.view {
            View::Blank => {}
            View::Login => {
                elements.push(
                    Rendered::new(&locators::USERNAME_FIELD, "input").field(Field::Username),
                );
                elements.push(
                    Rendered::new(&locators::PASSWORD_FIELD, "input").field(Field::Password),
                );
                elements.push(
                    Rendered::new(&locators::LOGIN_BUTTON, "input").action(Action::Login),
                );
            }
            View::Inventory => {
                elements.push(Rendered::new(&locators::PRODUCT_PAGE, "span").text("Products"));
                elements.push(Rendered::new(&locators::INVENTORY_CONTAINER, "div"));
                for product in PRODUCTS {
                    if !state.cart.iter().any(|p| p == product) {
                        elements.push(
                            Rendered::new(&locators::add_to_cart_button(product), "button")
                                .text("Add to cart")
                                .action(Action::AddToCart(product.to_string())),
                        );
                    }
                }
            }
            View::Cart => {
                elements.push(Rendered::new(&locators::CART_PAGE_TITLE, "span").text("Your Cart"));
                for product in &state.cart {
                    elements.push(
                        Rendered::new(&locators::cart_item(product), "div").text(product.clone()),
                    );
                }
                elements.push(
                    Rendered::new(&locators::CHECKOUT_BUTTON, "button").action(Action::Checkout),
                );
            }
            View::CheckoutInfo => {
                elements.push(
                    Rendered::new(&locators::CHECKOUT_PAGE, "span")
                        .text("Checkout: Your Information"),
                );
                elements.push(
                    Rendered::new(&locators::FIRST_NAME, "input").field(Field::FirstName),
                );
                elements.push(Rendered::new(&locators::LAST_NAME, "input").field(Field::LastName));
                elements.push(
                    Rendered::new(&locators::POSTAL_CODE, "input").field(Field::PostalCode),
                );
                elements.push(
                    Rendered::new(&locators::CONTINUE_BUTTON, "input").action(Action::Continue),
                );
            }
            View::Overview => {
                elements.push(
                    Rendered::new(&locators::CHECKOUT_OVERVIEW, "span").text("Checkout: Overview"),
                );
                elements.push(
                    Rendered::new(&locators::FINISH_BUTTON, "button").action(Action::Finish),
                );
            }
            View::Complete => {
                elements.push(
                    Rendered::new(&locators::CHECKOUT_COMPLETE, "span").text("Checkout: Complete!"),
                );
            }
        }

        if state.view.has_menu() {
            elements.push(Rendered::new(&locators::CART_ICON, "a").action(Action::OpenCart));
            elements.push(
                Rendered::new(&locators::REACT_BURGER, "button").action(Action::OpenMenu),
            );
            elements.push(
                Rendered::new(&locators::LOGOUT, "a")
                    .text("Logout")
                    .displayed(state.menu_open)
                    .action(Action::Logout),
            );
        }

        if let Some(ref message) = state.error {
            elements.push(
                Rendered::new(&locators::ERROR_MESSAGE_CONTAINER, "h3").text(message.clone()),
            );
            elements.push(Rendered::new(&locators::ERROR_BANNER, "div").text(message.clone()));
            if let Some(specific) = locators::error_for_message(message) {
                elements.push(Rendered::new(&specific, "h3").text(message.clone()));
            }
        }
        elements
    }

    fn login_outcome(username: &str, password: &str) -> Result<(), String> {
        if username.is_empty() {
            return Err("Epic sadface: Username is required".to_string());
        }
        if password.is_empty() {
            return Err("Epic sadface: Password is required".to_string());
        }
        let known = matches!(
            username,
            "standard_user" | "locked_out_user" | "performance_glitch_user"
        );
        if !known || password != PASSWORD {
            return Err(locators::UN_PW_ERROR_TEXT.to_string());
        }
        if username == "locked_out_user" {
            return Err(locators::LOCKED_OUT_ERROR_TEXT.to_string());
        }
        Ok(())
    }

    fn perform(&self, state: &mut StoreState, action: Action) {
        match action {
            Action::None => {}
            Action::Login => match Self::login_outcome(&state.username, &state.password) {
                Ok(()) => {
                    let user = state.username.clone();
                    let extra = if user == "performance_glitch_user" {
                        self.slow_user_delay
                    } else {
                        Duration::ZERO
                    };
                    state.session = Some(user);
                    state.error = None;
                    self.show(state, View::Inventory, extra);
                }
                Err(message) => state.error = Some(message),
            },
            Action::OpenMenu => state.menu_open = true,
            Action::Logout => {
                state.session = None;
                state.cart.clear();
                state.username.clear();
                state.password.clear();
                self.show(state, View::Login, Duration::ZERO);
            }
            Action::AddToCart(product) => state.cart.push(product),
            Action::OpenCart => self.show(state, View::Cart, Duration::ZERO),
            Action::Checkout => self.show(state, View::CheckoutInfo, Duration::ZERO),
            Action::Continue => {
                let missing = [
                    (&state.first_name, "First Name"),
                    (&state.last_name, "Last Name"),
                    (&state.postal_code, "Postal Code"),
                ]
                .into_iter()
                .find(|(value, _)| value.is_empty())
                .map(|(_, label)| label);
                match missing {
                    Some(label) => state.error = Some(format!("Error: {label} is required")),
                    None => self.show(state, View::Overview, Duration::ZERO),
                }
            }
            Action::Finish => {
                state.cart.clear();
                self.show(state, View::Complete, Duration::ZERO);
            }
        }
    }

    fn ensure_open(state: &StoreState) -> AcceptorResult<()> {
        if state.closed {
            Err(AcceptorError::driver("browser has been closed"))
        } else {
            Ok(())
        }
    }

    fn interactable(state: &StoreState, selector: &Selector) -> AcceptorResult<Rendered> {
        if Instant::now() < state.rendered_at {
            return Err(AcceptorError::driver(format!("no element matches {selector}")));
        }
        let element = Self::render(state)
            .into_iter()
            .find(|element| element.selector == *selector)
            .ok_or_else(|| AcceptorError::driver(format!("no element matches {selector}")))?;
        if element.displayed {
            Ok(element)
        } else {
            Err(AcceptorError::driver(format!("element not interactable: {selector}")))
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeStore {
    async fn navigate(&self, url: &str) -> AcceptorResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.history.push(format!("navigate {url}"));

        let view = url
            .strip_prefix(self.base_url.as_str())
            .and_then(View::from_path)
            .ok_or_else(|| AcceptorError::Navigation {
                url: url.to_string(),
                message: "unknown page".to_string(),
            })?;

        if view.needs_session() && state.session.is_none() {
            self.show(&mut state, View::Login, Duration::ZERO);
            state.error = Some(format!(
                "Epic sadface: You can only access '/{}' when you are logged in.",
                view.path()
            ));
        } else {
            self.show(&mut state, view, Duration::ZERO);
        }
        Ok(())
    }

    async fn refresh(&self) -> AcceptorResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.history.push("refresh".to_string());
        let view = state.view;
        self.show(&mut state, view, Duration::ZERO);
        Ok(())
    }

    async fn current_url(&self) -> AcceptorResult<String> {
        let state = self.lock();
        Self::ensure_open(&state)?;
        Ok(self.url_of(state.view))
    }

    async fn title(&self) -> AcceptorResult<String> {
        let state = self.lock();
        Self::ensure_open(&state)?;
        Ok(if state.view == View::Blank {
            String::new()
        } else {
            DOCUMENT_TITLE.to_string()
        })
    }

    async fn find(&self, selector: &Selector) -> AcceptorResult<Option<ElementHandle>> {
        let state = self.lock();
        Self::ensure_open(&state)?;
        if Instant::now() < state.rendered_at {
            return Ok(None);
        }
        Ok(Self::render(&state)
            .into_iter()
            .find(|element| element.selector == *selector)
            .map(|element| {
                ElementHandle::new(selector.value(), element.tag)
                    .with_text(element.text)
                    .with_displayed(element.displayed)
            }))
    }

    async fn click(&self, selector: &Selector) -> AcceptorResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.history.push(format!("click {}", selector.value()));
        let element = Self::interactable(&state, selector)?;
        self.perform(&mut state, element.action);
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> AcceptorResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let element = Self::interactable(&state, selector)?;
        let field = element
            .field
            .ok_or_else(|| AcceptorError::driver(format!("element is not editable: {selector}")))?;
        state.field_mut(field).clear();
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> AcceptorResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.history.push(format!("type {}", selector.value()));
        let element = Self::interactable(&state, selector)?;
        let field = element
            .field
            .ok_or_else(|| AcceptorError::driver(format!("element is not editable: {selector}")))?;
        state.field_mut(field).push_str(text);
        Ok(())
    }

    async fn quit(&self) -> AcceptorResult<()> {
        let mut state = self.lock();
        state.closed = true;
        state.history.push("quit".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.saucedemo.com/";

    async fn type_into(store: &FakeStore, locator: &Locator, text: &str) {
        store.clear(locator.selector()).await.unwrap();
        store.type_text(locator.selector(), text).await.unwrap();
    }

    async fn log_in(store: &FakeStore, user: &str, password: &str) {
        store.navigate(BASE).await.unwrap();
        type_into(store, &locators::USERNAME_FIELD, user).await;
        type_into(store, &locators::PASSWORD_FIELD, password).await;
        store.click(locators::LOGIN_BUTTON.selector()).await.unwrap();
    }

    mod login_tests {
        use super::*;

        #[tokio::test]
        async fn test_standard_user_reaches_inventory() {
            let store = FakeStore::new(BASE);
            log_in(&store, "standard_user", PASSWORD).await;
            assert_eq!(
                store.current_url().await.unwrap(),
                "https://www.saucedemo.com/inventory.html"
            );
            assert_eq!(store.session().as_deref(), Some("standard_user"));
        }

        #[tokio::test]
        async fn test_locked_out_user_sees_banner() {
            let store = FakeStore::new(BASE);
            log_in(&store, "locked_out_user", PASSWORD).await;
            let banner = store
                .find(locators::LOCKED_OUT_ERROR.selector())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(banner.text, locators::LOCKED_OUT_ERROR_TEXT);
            assert_eq!(store.current_url().await.unwrap(), BASE);
        }

        #[tokio::test]
        async fn test_missing_username() {
            let store = FakeStore::new(BASE);
            log_in(&store, "", PASSWORD).await;
            let banner = store
                .find(locators::ERROR_MESSAGE_CONTAINER.selector())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(banner.text, "Epic sadface: Username is required");
        }

        #[tokio::test]
        async fn test_deep_link_requires_session() {
            let store = FakeStore::new(BASE);
            store.navigate("https://www.saucedemo.com/cart.html").await.unwrap();
            assert_eq!(store.current_url().await.unwrap(), BASE);
            assert!(store
                .find(locators::ERROR_BANNER.selector())
                .await
                .unwrap()
                .is_some());
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test]
        async fn test_logout_link_hidden_until_menu_opens() {
            let store = FakeStore::new(BASE);
            log_in(&store, "standard_user", PASSWORD).await;
            let hidden = store.find(locators::LOGOUT.selector()).await.unwrap().unwrap();
            assert!(!hidden.displayed);
            assert!(store.click(locators::LOGOUT.selector()).await.is_err());

            store.click(locators::REACT_BURGER.selector()).await.unwrap();
            store.click(locators::LOGOUT.selector()).await.unwrap();
            assert_eq!(store.session(), None);
        }

        #[tokio::test]
        async fn test_add_to_cart_removes_button() {
            let store = FakeStore::new(BASE);
            log_in(&store, "standard_user", PASSWORD).await;
            let button = locators::add_to_cart_button("Sauce Labs Backpack");
            store.click(button.selector()).await.unwrap();
            assert_eq!(store.cart(), vec!["Sauce Labs Backpack".to_string()]);
            assert!(store.find(button.selector()).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_continue_requires_all_fields() {
            let store = FakeStore::new(BASE);
            log_in(&store, "standard_user", PASSWORD).await;
            store.click(locators::CART_ICON.selector()).await.unwrap();
            store.click(locators::CHECKOUT_BUTTON.selector()).await.unwrap();
            type_into(&store, &locators::FIRST_NAME, "Ada").await;
            store.click(locators::CONTINUE_BUTTON.selector()).await.unwrap();
            assert!(store.current_url().await.unwrap().ends_with("checkout-step-one.html"));

            type_into(&store, &locators::LAST_NAME, "Lovelace").await;
            type_into(&store, &locators::POSTAL_CODE, "10115").await;
            store.click(locators::CONTINUE_BUTTON.selector()).await.unwrap();
            assert!(store.current_url().await.unwrap().ends_with("checkout-step-two.html"));
        }
    }

    mod timing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_render_delay_hides_elements() {
            let store = FakeStore::new(BASE).with_render_delay(Duration::from_millis(300));
            store.navigate(BASE).await.unwrap();
            assert!(store.find(locators::LOGIN_BUTTON.selector()).await.unwrap().is_none());
            tokio::time::advance(Duration::from_millis(300)).await;
            assert!(store.find(locators::LOGIN_BUTTON.selector()).await.unwrap().is_some());
        }

        #[tokio::test]
        async fn test_quit_closes_driver() {
            let store = FakeStore::new(BASE);
            store.quit().await.unwrap();
            assert!(store.is_closed());
            assert!(store.navigate(BASE).await.is_err());
        }
    }
}
