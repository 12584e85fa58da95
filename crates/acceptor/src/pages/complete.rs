use std::sync::Arc;

use async_trait::async_trait;

use super::{PageDescriptor, Screen};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators;

/// Order confirmation
#[derive(Debug)]
pub struct CheckoutCompletePage {
    descriptor: PageDescriptor,
    ui: Interactor,
}

impl CheckoutCompletePage {
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts) -> Self {
        Self {
            descriptor: PageDescriptor::new(
                "checkout complete",
                "checkout-complete",
                locators::CHECKOUT_COMPLETE,
                "Checkout: Complete!",
            ),
            ui: Interactor::new(driver, timeouts, "checkout complete"),
        }
    }
}

#[async_trait]
impl Screen for CheckoutCompletePage {
    fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    fn ui(&self) -> &Interactor {
        &self.ui
    }
}
