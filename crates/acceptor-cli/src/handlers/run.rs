//! `run`: execute feature files and print the report

use acceptor::runner::RunReport;
use acceptor::{launch_browser, Feature, RunConfig, Runner, StepTable, TagFilter};
use tracing::{info, warn};

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{render_json, OutputFormat, ProgressReporter};

use super::load_features;

/// Layer command-line overrides on top of an environment-derived config
pub fn apply_overrides(mut config: RunConfig, args: &RunArgs) -> CliResult<RunConfig> {
    config = config.with_fail_fast(args.fail_fast);
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url.clone())?;
    }
    if let Some(url) = &args.store_url {
        config = config.with_store_url(url.clone())?;
    }
    if let Some(dir) = &args.schemas {
        config = config.with_schema_dir(dir.clone());
    }
    Ok(config)
}

/// Run the selected scenarios.
///
/// Returns `Ok(false)` when any scenario failed.
pub async fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let features = load_features(&args.paths)?;
    let filter = TagFilter::parse(&args.tags)?;
    let run_config = apply_overrides(RunConfig::from_env()?, args)?;
    let format = OutputFormat::from(args.format);

    info!(
        features = features.len(),
        api = %run_config.api_url,
        ui = run_config.run_ui,
        dry_run = args.dry_run,
        "starting run"
    );

    let driver = if args.dry_run {
        None
    } else {
        launch_browser(&run_config).await?
    };
    let mut runner = Runner::new(run_config, StepTable::standard()?)?.with_dry_run(args.dry_run);
    if let Some(driver) = driver {
        runner = runner.with_driver(driver);
    }

    let quiet = config.verbosity.is_quiet() || format == OutputFormat::Json;
    let mut reporter = ProgressReporter::new(config.color.should_color(), quiet)
        .with_steps(config.verbosity.is_verbose());

    let outcome = run_features(&runner, &features, &filter, &mut reporter).await;
    if let Err(err) = runner.shutdown().await {
        warn!(error = %err, "browser shutdown failed");
    }
    let report = outcome?;

    match format {
        OutputFormat::Text => reporter.report(&report),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }
    Ok(report.success())
}

/// Run one feature at a time so the progress bar advances per file
async fn run_features(
    runner: &Runner,
    features: &[Feature],
    filter: &TagFilter,
    reporter: &mut ProgressReporter,
) -> CliResult<RunReport> {
    reporter.start_progress(features.len() as u64, "running features");
    let mut report = RunReport::default();
    for feature in features {
        reporter.set_message(&feature.name);
        let part = runner.run(std::slice::from_ref(feature), filter).await;
        reporter.increment(1);
        let part = match part {
            Ok(part) => part,
            Err(err) => {
                reporter.finish();
                return Err(err.into());
            }
        };
        let stop = part.stopped_early;
        report.merge(part);
        if stop {
            break;
        }
    }
    reporter.finish();
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use acceptor::gherkin::parse_str;
    use acceptor::mock::BookingStub;
    use clap::Parser;
    use std::path::PathBuf;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["acceptor", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_no_overrides_keeps_config() {
            let config = apply_overrides(RunConfig::default(), &run_args(&[])).unwrap();
            assert_eq!(config.api_url, RunConfig::default().api_url);
            assert!(!config.fail_fast);
        }

        #[test]
        fn test_overrides_apply() {
            let args = run_args(&[
                "--api-url",
                "http://127.0.0.1:4000",
                "--schemas",
                "contracts",
                "--fail-fast",
            ]);
            let config = apply_overrides(RunConfig::default(), &args).unwrap();
            assert_eq!(config.api_url, "http://127.0.0.1:4000/");
            assert_eq!(config.schema_dir, PathBuf::from("contracts"));
            assert!(config.fail_fast);
        }

        #[test]
        fn test_bad_url_rejected() {
            let args = run_args(&["--api-url", "not a url"]);
            assert!(apply_overrides(RunConfig::default(), &args).is_err());
        }
    }

    mod run_features_tests {
        use super::*;

        fn feature(name: &str, passes: bool) -> Feature {
            let then = if passes {
                "the response should have a 201 status code"
            } else {
                "I should receive a not found error"
            };
            parse_str(
                &format!(
                    "Feature: {name}\n  Scenario: Ping\n    Given the booking service is healthy\n    Then {then}\n"
                ),
                format!("{name}.feature"),
            )
            .unwrap()
        }

        fn runner(stub: &BookingStub, fail_fast: bool) -> Runner {
            let config = RunConfig::default()
                .with_api_url(stub.base_url())
                .unwrap()
                .with_fail_fast(fail_fast);
            Runner::new(config, StepTable::standard().unwrap()).unwrap()
        }

        #[tokio::test]
        async fn test_reports_merge_across_features() {
            let stub = BookingStub::spawn().await.unwrap();
            let runner = runner(&stub, false);
            let features = vec![
                feature("One", true),
                feature("Two", false),
                feature("Three", true),
            ];
            let mut reporter = ProgressReporter::new(false, true);
            let report = run_features(&runner, &features, &TagFilter::all(), &mut reporter)
                .await
                .unwrap();
            assert_eq!(report.features.len(), 3);
            assert_eq!(report.passed, 2);
            assert_eq!(report.failed, 1);
        }

        #[tokio::test]
        async fn test_fail_fast_stops_at_first_failing_feature() {
            let stub = BookingStub::spawn().await.unwrap();
            let runner = runner(&stub, true);
            let features = vec![feature("One", false), feature("Two", true)];
            let mut reporter = ProgressReporter::new(false, true);
            let report = run_features(&runner, &features, &TagFilter::all(), &mut reporter)
                .await
                .unwrap();
            assert!(report.stopped_early);
            assert_eq!(report.features.len(), 1);
            assert_eq!(report.total(), 1);
        }
    }
}
