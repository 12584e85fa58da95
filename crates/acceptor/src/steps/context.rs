//! Per-scenario state shared between steps.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::time::Instant;

use crate::booking::{ApiResponse, Auth, Booking, BookingClient, BookingPatch, SchemaStore};
use crate::config::{Credentials, RunConfig};
use crate::driver::BrowserDriver;
use crate::pages::PageFactory;
use crate::result::{AcceptorError, AcceptorResult};

/// State carried from one step to the next within a scenario.
///
/// A fresh context is built for every scenario; the browser handle, the
/// HTTP client and the schema cache are shared across the run.
#[derive(Debug)]
pub struct ScenarioContext {
    config: Arc<RunConfig>,
    driver: Option<Arc<dyn BrowserDriver>>,
    pages: OnceLock<PageFactory>,
    api: BookingClient,
    schemas: Arc<SchemaStore>,

    /// Set just before the login click; read by the page-load step
    pub start: Option<Instant>,
    /// Credentials supplied by the credentials step
    pub credentials: Option<Credentials>,
    /// Token (or its absence) used by mutating calls
    pub auth: Auth,
    /// Last HTTP response
    pub response: Option<ApiResponse>,
    /// Id of the booking under test
    pub booking_id: Option<String>,
    /// Body of the last booking read or created
    pub booking: Option<Value>,
    /// Details to create
    pub booking_details: Option<Booking>,
    /// Replacement details for a full update
    pub updated_details: Option<Booking>,
    /// Fields for a partial update
    pub partial_update: Option<BookingPatch>,
    /// What the server should hold for `booking_id`
    pub expected: Option<Booking>,
}

impl ScenarioContext {
    /// Fresh context for one scenario
    #[must_use]
    pub fn new(
        config: Arc<RunConfig>,
        driver: Option<Arc<dyn BrowserDriver>>,
        api: BookingClient,
        schemas: Arc<SchemaStore>,
    ) -> Self {
        Self {
            config,
            driver,
            pages: OnceLock::new(),
            api,
            schemas,
            start: None,
            credentials: None,
            auth: Auth::None,
            response: None,
            booking_id: None,
            booking: None,
            booking_details: None,
            updated_details: None,
            partial_update: None,
            expected: None,
        }
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Whether a browser is attached
    #[must_use]
    pub const fn has_browser(&self) -> bool {
        self.driver.is_some()
    }

    /// Page objects, built on first use
    pub fn pages(&self) -> AcceptorResult<&PageFactory> {
        let driver = self
            .driver
            .as_ref()
            .ok_or(AcceptorError::BrowserUnavailable)?;
        Ok(self.pages.get_or_init(|| {
            PageFactory::new(
                Arc::clone(driver),
                self.config.store_url.clone(),
                self.config.timeouts,
            )
        }))
    }

    /// Booking API client
    #[must_use]
    pub const fn api(&self) -> &BookingClient {
        &self.api
    }

    /// JSON schema cache
    #[must_use]
    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    /// Credentials from the scenario, else from the configuration
    #[must_use]
    pub fn credentials_or_default(&self) -> Credentials {
        self.credentials
            .clone()
            .unwrap_or_else(|| self.config.credentials.clone())
    }

    /// The last response, or an error naming the missing state
    pub fn last_response(&self) -> AcceptorResult<&ApiResponse> {
        self.response
            .as_ref()
            .ok_or_else(|| AcceptorError::missing("response"))
    }

    /// The booking id under test
    pub fn booking_id(&self) -> AcceptorResult<&str> {
        self.booking_id
            .as_deref()
            .ok_or_else(|| AcceptorError::missing("booking id"))
    }

    /// Fetch a token unless the scenario already holds one
    pub async fn ensure_token(&mut self) -> AcceptorResult<()> {
        if self.auth.is_none() {
            let credentials = self.credentials_or_default();
            self.auth = self.api.token(&credentials).await?;
        }
        Ok(())
    }
}
