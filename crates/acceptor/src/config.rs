//! Run configuration.
//!
//! Built from environment variables, with builder-style overrides. The
//! lookup is injectable so tests never touch the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::driver::DriverConfig;
use crate::result::{AcceptorError, AcceptorResult};

/// Default storefront URL
pub const DEFAULT_STORE_URL: &str = "https://www.saucedemo.com/";

/// Default booking API URL
pub const DEFAULT_API_URL: &str = "http://localhost:3001/";

/// Timeouts used by the interaction layer and the API client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Default element wait
    pub element: Duration,
    /// Presence checks used by loaded-predicates
    pub presence: Duration,
    /// Login error banner
    pub error_banner: Duration,
    /// Logout link after opening the menu
    pub logout: Duration,
    /// URL changes after navigation-triggering clicks
    pub navigation: Duration,
    /// Poll interval for every wait
    pub poll_interval: Duration,
    /// HTTP request timeout
    pub http: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(10),
            presence: Duration::from_secs(5),
            error_banner: Duration::from_secs(3),
            logout: Duration::from_secs(2),
            navigation: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            http: Duration::from_secs(5),
        }
    }
}

impl Timeouts {
    /// Scale every UI timeout down to `element` (fast fakes in tests)
    #[must_use]
    pub fn uniform(element: Duration, poll_interval: Duration) -> Self {
        Self {
            element,
            presence: element,
            error_banner: element,
            logout: element,
            navigation: element,
            poll_interval,
            ..Self::default()
        }
    }
}

/// API credentials for the auth endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
        }
    }
}

/// Configuration for one run of the suite
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Storefront base URL
    pub store_url: String,
    /// Booking API base URL (always ends with `/`)
    pub api_url: String,
    /// Whether browser-backed scenarios run at all
    pub run_ui: bool,
    /// Browser launch settings
    pub driver: DriverConfig,
    /// Wait and request timeouts
    pub timeouts: Timeouts,
    /// Booking API credentials
    pub credentials: Credentials,
    /// Directory holding JSON schemas
    pub schema_dir: PathBuf,
    /// Stop after the first failed scenario
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            run_ui: false,
            driver: DriverConfig::default(),
            timeouts: Timeouts::default(),
            credentials: Credentials::default(),
            schema_dir: PathBuf::from("schemas"),
            fail_fast: false,
        }
    }
}

impl RunConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the process environment
    pub fn from_env() -> AcceptorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Recognised variables: `RUN_UI_TESTS`, `BASE_URL`, `STORE_URL`,
    /// `HEADLESS`, `CHROMIUM_PATH`, `API_USERNAME`, `API_PASSWORD`,
    /// `SCHEMA_DIR`.
    pub fn from_lookup<F>(lookup: F) -> AcceptorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("RUN_UI_TESTS") {
            config.run_ui = value == "true";
        }
        if let Some(url) = lookup("BASE_URL") {
            config = config.with_api_url(url)?;
        }
        if let Some(url) = lookup("STORE_URL") {
            config = config.with_store_url(url)?;
        }
        if let Some(value) = lookup("HEADLESS") {
            config.driver.headless = parse_flag("HEADLESS", &value)?;
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            config.driver.executable_path = Some(path);
        }
        if let Some(username) = lookup("API_USERNAME") {
            config.credentials.username = username;
        }
        if let Some(password) = lookup("API_PASSWORD") {
            config.credentials.password = password;
        }
        if let Some(dir) = lookup("SCHEMA_DIR") {
            config.schema_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Set the booking API base URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> AcceptorResult<Self> {
        self.api_url = normalize_base_url("BASE_URL", url.into())?;
        Ok(self)
    }

    /// Set the storefront base URL
    pub fn with_store_url(mut self, url: impl Into<String>) -> AcceptorResult<Self> {
        self.store_url = normalize_base_url("STORE_URL", url.into())?;
        Ok(self)
    }

    /// Enable or disable browser scenarios
    #[must_use]
    pub const fn with_run_ui(mut self, run_ui: bool) -> Self {
        self.run_ui = run_ui;
        self
    }

    /// Set timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set schema directory
    #[must_use]
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = dir.into();
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

fn normalize_base_url(field: &str, url: String) -> AcceptorResult<String> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AcceptorError::Config {
            message: format!("{field} must be an http(s) URL, got {trimmed:?}"),
        });
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/"))
    }
}

fn parse_flag(field: &str, value: &str) -> AcceptorResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(AcceptorError::Config {
            message: format!("{field} must be true or false, got {value:?}"),
        }),
    }
}
