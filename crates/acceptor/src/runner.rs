//! Scenario runner.
//!
//! Executes parsed features against a [`StepTable`], one scenario at a
//! time, and collects a serializable [`RunReport`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::booking::{BookingClient, SchemaStore};
use crate::config::RunConfig;
use crate::driver::BrowserDriver;
use crate::gherkin::{Feature, Scenario, Step, TagFilter};
use crate::result::{AcceptorError, AcceptorResult};
use crate::steps::{ScenarioContext, StepTable};

/// Tag marking scenarios that need a browser
pub const UI_TAG: &str = "ui";

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    /// Not run because an earlier step failed (or dry run)
    Skipped,
    /// No definition matches the text
    Undefined,
}

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// Keyword as written
    pub keyword: String,
    /// Step text
    pub text: String,
    /// Line in the feature file
    pub line: usize,
    pub status: StepStatus,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    fn new(step: &Step, status: StepStatus) -> Self {
        Self {
            keyword: step.keyword_text.clone(),
            text: step.text.clone(),
            line: step.line,
            status,
            error: None,
        }
    }

    fn failed(step: &Step, status: StepStatus, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(step, status)
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Line in the feature file
    pub line: usize,
    pub status: ScenarioStatus,
    /// Background steps followed by scenario steps
    pub steps: Vec<StepResult>,
    /// Why the scenario failed or was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioResult {
    fn skipped(scenario: &Scenario, steps: &[&Step], reason: impl Into<String>) -> Self {
        Self {
            name: scenario.name.clone(),
            line: scenario.line,
            status: ScenarioStatus::Skipped,
            steps: steps
                .iter()
                .map(|step| StepResult::new(step, StepStatus::Skipped))
                .collect(),
            error: Some(reason.into()),
            duration_ms: 0,
        }
    }

    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Steps with no matching definition
    pub fn undefined_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Undefined)
    }
}

/// Results for one feature file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureResult {
    /// Feature name
    pub name: String,
    /// Source file
    pub path: PathBuf,
    /// Selected scenarios, in file order
    pub scenarios: Vec<ScenarioResult>,
}

/// Results for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-feature results
    pub features: Vec<FeatureResult>,
    /// Scenarios that passed
    pub passed: usize,
    /// Scenarios that failed
    pub failed: usize,
    /// Scenarios that were skipped
    pub skipped: usize,
    /// Whether the run stopped early after a failure
    pub stopped_early: bool,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Whether no scenario failed
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed == 0
    }

    /// Number of scenarios reported
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Every failed scenario with its feature
    pub fn failures(&self) -> impl Iterator<Item = (&FeatureResult, &ScenarioResult)> {
        self.features.iter().flat_map(|feature| {
            feature
                .scenarios
                .iter()
                .filter(|s| s.status == ScenarioStatus::Failed)
                .map(move |s| (feature, s))
        })
    }

    /// Fold a later run into this one
    pub fn merge(&mut self, other: Self) {
        self.features.extend(other.features);
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.stopped_early |= other.stopped_early;
        self.duration_ms += other.duration_ms;
    }

    fn record(&mut self, result: &ScenarioResult) {
        match result.status {
            ScenarioStatus::Passed => self.passed += 1,
            ScenarioStatus::Failed => self.failed += 1,
            ScenarioStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Runs scenarios one at a time with a fresh context each
#[derive(Debug)]
pub struct Runner {
    config: Arc<RunConfig>,
    steps: StepTable,
    driver: Option<Arc<dyn BrowserDriver>>,
    api: BookingClient,
    schemas: Arc<SchemaStore>,
    dry_run: bool,
}

impl Runner {
    /// Create a runner without a browser
    pub fn new(config: RunConfig, steps: StepTable) -> AcceptorResult<Self> {
        let api = BookingClient::new(&config.api_url, config.timeouts.http)?;
        let schemas = Arc::new(SchemaStore::new(&config.schema_dir));
        Ok(Self {
            config: Arc::new(config),
            steps,
            driver: None,
            api,
            schemas,
            dry_run: false,
        })
    }

    /// Attach the browser shared by every scenario
    #[must_use]
    pub fn with_driver(mut self, driver: Arc<dyn BrowserDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Match steps without executing them
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    #[must_use]
    pub const fn steps(&self) -> &StepTable {
        &self.steps
    }

    /// Whether a browser is attached
    #[must_use]
    pub const fn has_browser(&self) -> bool {
        self.driver.is_some()
    }

    /// Run every selected scenario of every feature.
    ///
    /// Only setup problems are returned as errors; scenario failures are
    /// recorded in the report.
    pub async fn run(&self, features: &[Feature], filter: &TagFilter) -> AcceptorResult<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        'features: for feature in features {
            let mut feature_result = FeatureResult {
                name: feature.name.clone(),
                path: feature.path.clone(),
                scenarios: Vec::new(),
            };
            for scenario in &feature.scenarios {
                if !filter.matches(&feature.effective_tags(scenario)) {
                    continue;
                }
                let result = self.run_scenario(feature, scenario).await?;
                report.record(&result);
                let failed = result.status == ScenarioStatus::Failed;
                feature_result.scenarios.push(result);
                if failed && self.config.fail_fast {
                    warn!(scenario = %scenario.name, "stopping after first failure");
                    report.stopped_early = true;
                    report.features.push(feature_result);
                    break 'features;
                }
            }
            report.features.push(feature_result);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "run finished"
        );
        Ok(report)
    }

    /// Run one scenario: background steps, then its own steps.
    ///
    /// The first failing or undefined step fails the scenario and the
    /// remaining steps are reported as skipped.
    pub async fn run_scenario(
        &self,
        feature: &Feature,
        scenario: &Scenario,
    ) -> AcceptorResult<ScenarioResult> {
        let steps: Vec<&Step> = feature.background.iter().chain(&scenario.steps).collect();

        let tags = feature.effective_tags(scenario);
        if !self.dry_run && self.driver.is_none() && tags.iter().any(|t| t == UI_TAG) {
            info!(scenario = %scenario.name, "skipping browser scenario, no browser attached");
            return Ok(ScenarioResult::skipped(scenario, &steps, "no browser attached"));
        }

        let span = info_span!("scenario", feature = %feature.name, name = %scenario.name);
        self.execute(scenario, &steps).instrument(span).await
    }

    async fn execute(
        &self,
        scenario: &Scenario,
        steps: &[&Step],
    ) -> AcceptorResult<ScenarioResult> {
        let start = Instant::now();
        let mut ctx = ScenarioContext::new(
            Arc::clone(&self.config),
            self.driver.clone(),
            self.api.clone(),
            Arc::clone(&self.schemas),
        );

        let mut results = Vec::with_capacity(steps.len());
        let mut failure: Option<String> = None;

        for step in steps {
            if failure.is_some() {
                results.push(StepResult::new(step, StepStatus::Skipped));
                continue;
            }
            let Some(found) = self.steps.find_step(step) else {
                let err = AcceptorError::UndefinedStep {
                    text: step.text.clone(),
                };
                error!(line = step.line, step = %step, "undefined step");
                failure = Some(err.to_string());
                results.push(StepResult::failed(step, StepStatus::Undefined, err.to_string()));
                continue;
            };
            if self.dry_run {
                results.push(StepResult::new(step, StepStatus::Skipped));
                continue;
            }

            let handler = found.definition.handler();
            match handler(&mut ctx, &found.args).await {
                Ok(()) => results.push(StepResult::new(step, StepStatus::Passed)),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!(line = step.line, step = %step, error = %err, "step failed");
                    failure = Some(err.to_string());
                    results.push(StepResult::failed(step, StepStatus::Failed, err.to_string()));
                }
            }
        }

        let status = match (&failure, self.dry_run) {
            (Some(_), _) => ScenarioStatus::Failed,
            (None, true) => ScenarioStatus::Skipped,
            (None, false) => ScenarioStatus::Passed,
        };
        if status == ScenarioStatus::Passed {
            info!(scenario = %scenario.name, "scenario passed");
        }
        Ok(ScenarioResult {
            name: scenario.name.clone(),
            line: scenario.line,
            status,
            steps: results,
            error: failure,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Close the shared browser, if any
    pub async fn shutdown(&self) -> AcceptorResult<()> {
        if let Some(driver) = &self.driver {
            driver.quit().await?;
        }
        Ok(())
    }
}

/// Start the browser for a run when UI scenarios are enabled
pub async fn launch_browser(config: &RunConfig) -> AcceptorResult<Option<Arc<dyn BrowserDriver>>> {
    if !config.run_ui {
        return Ok(None);
    }
    #[cfg(feature = "browser")]
    {
        let driver = crate::browser::ChromiumDriver::launch(&config.driver).await?;
        Ok(Some(Arc::new(driver)))
    }
    #[cfg(not(feature = "browser"))]
    {
        Err(AcceptorError::Config {
            message: "RUN_UI_TESTS=true but acceptor was built without the `browser` feature"
                .to_string(),
        })
    }
}
