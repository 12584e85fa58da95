//! Output formatting and progress reporting

use acceptor::runner::{FeatureResult, RunReport, ScenarioResult, StepResult};
use acceptor::{ScenarioStatus, StepStatus};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CliResult;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress and result reporter
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print every step, not just failing ones
    pub show_steps: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
            show_steps: false,
        }
    }

    /// Print every step of every scenario
    #[must_use]
    pub const fn with_steps(mut self, show_steps: bool) -> Self {
        self.show_steps = show_steps;
        self
    }

    /// Start a progress bar over `total` feature files
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Advance the bar
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Show the feature being run
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Remove the progress bar before printing results
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// `✓`/`PASS` line, hidden when quiet
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// `✗`/`FAIL` line, always shown
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// `⚠`/`WARN` line, hidden when quiet
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(message);
    }

    /// Print a header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let line = if self.use_color {
            style(title).bold().cyan().to_string()
        } else {
            title.to_string()
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&line);
    }

    /// Print a whole run report as text
    pub fn report(&self, report: &RunReport) {
        for feature in &report.features {
            self.feature(feature);
        }
        if report.stopped_early {
            self.warning("stopped after the first failure (--fail-fast)");
        }
        self.summary(
            report.passed,
            report.failed,
            report.skipped,
            Duration::from_millis(report.duration_ms),
        );
    }

    fn feature(&self, feature: &FeatureResult) {
        self.header(&format!("Feature: {} ({})", feature.name, feature.path.display()));
        for scenario in &feature.scenarios {
            self.scenario(scenario);
        }
    }

    fn scenario(&self, scenario: &ScenarioResult) {
        let label = format!(
            "{} (line {}, {}ms)",
            scenario.name, scenario.line, scenario.duration_ms
        );
        match scenario.status {
            ScenarioStatus::Passed => self.success(&label),
            ScenarioStatus::Failed => self.failure(&label),
            ScenarioStatus::Skipped => {
                let reason = scenario.error.as_deref().unwrap_or("skipped");
                self.warning(&format!("{} (line {}, {reason})", scenario.name, scenario.line));
            }
        }

        let failed = scenario.status == ScenarioStatus::Failed;
        for step in &scenario.steps {
            let interesting = matches!(step.status, StepStatus::Failed | StepStatus::Undefined);
            if self.show_steps || (failed && interesting) {
                self.step(step);
            }
        }
    }

    fn step(&self, step: &StepResult) {
        let marker = match step.status {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Undefined => "undefined",
        };
        let marker = if self.use_color {
            let style = match step.status {
                StepStatus::Passed => Style::new().green(),
                StepStatus::Failed | StepStatus::Undefined => Style::new().red(),
                StepStatus::Skipped => Style::new().dim(),
            };
            style.apply_to(marker).to_string()
        } else {
            marker.to_string()
        };
        let _ = self.term.write_line(&format!(
            "    {marker:>9} {} {} (line {})",
            step.keyword, step.text, step.line
        ));
        if let Some(error) = &step.error {
            let _ = self.term.write_line(&format!("              {error}"));
        }
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");

        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

/// Render a report as pretty JSON
pub fn render_json(report: &RunReport) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }

        #[test]
        fn test_empty_report_as_json() {
            let json = render_json(&RunReport::default()).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["passed"], 0);
            assert_eq!(value["stopped_early"], false);
            assert!(value["features"].as_array().unwrap().is_empty());
        }
    }

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
            assert!(!reporter.show_steps);
        }

        #[test]
        fn test_with_steps() {
            let reporter = ProgressReporter::new(false, false).with_steps(true);
            assert!(reporter.show_steps);
        }

        #[test]
        fn test_messages() {
            let reporter = ProgressReporter::new(false, false);
            reporter.success("passed");
            reporter.failure("failed");
            reporter.warning("skipped");
            reporter.info("info");
            reporter.header("Feature: Login");
        }

        #[test]
        fn test_summary() {
            let reporter = ProgressReporter::new(false, false);
            reporter.summary(10, 0, 2, Duration::from_secs(5));
            reporter.summary(8, 2, 0, Duration::from_secs(3));
        }

        #[test]
        fn test_progress_bar() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(3, "running features");
            reporter.increment(1);
            reporter.set_message("login.feature");
            reporter.increment(2);
            reporter.finish();
        }

        #[test]
        fn test_quiet_mode_has_no_progress_bar() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(10, "running features");
            assert!(reporter.progress_bar.is_none());
            reporter.report(&RunReport::default());
        }
    }
}
