//! Acceptor: page-object UI and booking-API acceptance suite
//!
//! Feature files describe storefront and booking scenarios in Gherkin.
//! Each step resolves through an ordered [`StepTable`] to a handler that
//! drives either the page objects (over a [`BrowserDriver`]) or the
//! [`BookingClient`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │ .feature │──►│  Runner  │──►│ StepTable  │──►│ Page objects │──► BrowserDriver
//! │ (Gherkin)│   │          │   │ (handlers) │   ├──────────────┤
//! └──────────┘   └──────────┘   └────────────┘   │ BookingClient│──► Restful-Booker
//!                                                └──────────────┘
//! ```

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod driver;
mod interaction;
mod locator;
mod result;
mod wait;

#[cfg(feature = "browser")]
mod browser;

/// Booking API payloads, client and schema validation
pub mod booking;

/// Run configuration from the environment
pub mod config;

/// Feature file parsing and tag selection
pub mod gherkin;

/// Named element locators for every storefront screen
pub mod locators;

/// In-process storefront and booking API fakes
pub mod mock;

/// Page objects and their factory
pub mod pages;

/// Scenario execution and reporting
pub mod runner;

/// Step definitions
pub mod steps;

pub use booking::{ApiResponse, Auth, Booking, BookingClient, SchemaStore};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{Credentials, RunConfig, Timeouts};
pub use driver::{BrowserDriver, DriverConfig, ElementHandle};
pub use gherkin::{Feature, Scenario, Step, TagFilter};
pub use interaction::Interactor;
pub use locator::{Locator, Selector};
pub use pages::{PageFactory, PageKind, Screen};
pub use result::{AcceptorError, AcceptorResult};
pub use runner::{launch_browser, RunReport, Runner, ScenarioStatus, StepStatus};
pub use steps::{ScenarioContext, StepArgs, StepTable};
pub use wait::{poll_until, wait_for, WaitOptions, WaitOutcome};

/// Everything a suite author usually needs
pub mod prelude {
    pub use super::booking::*;
    pub use super::config::*;
    pub use super::gherkin::{parse_file, parse_str, Feature, TagFilter};
    pub use super::mock::{BookingStub, FakeStore};
    pub use super::pages::*;
    pub use super::runner::*;
    pub use super::steps::*;
    pub use super::{
        AcceptorError, AcceptorResult, BrowserDriver, DriverConfig, ElementHandle, Interactor,
        Locator, Selector,
    };
}
