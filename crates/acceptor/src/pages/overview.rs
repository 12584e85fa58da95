use std::sync::Arc;

use async_trait::async_trait;

use super::{PageDescriptor, Screen};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;

/// Checkout step two: order summary
#[derive(Debug)]
pub struct CheckoutOverviewPage {
    descriptor: PageDescriptor,
    ui: Interactor,
}

impl CheckoutOverviewPage {
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts) -> Self {
        Self {
            descriptor: PageDescriptor::new(
                "checkout overview",
                "checkout-step-two",
                locators::CHECKOUT_OVERVIEW,
                "Checkout: Overview",
            ),
            ui: Interactor::new(driver, timeouts, "checkout overview"),
        }
    }

    pub async fn click_finish_button(&self) -> bool {
        self.ui
            .click(&locators::FINISH_BUTTON, self.ui.timeouts().element)
            .await
    }
}

#[async_trait]
impl Screen for CheckoutOverviewPage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
