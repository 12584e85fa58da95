//! `check` and `steps`: static inspection of feature files and the step table

use std::collections::HashSet;

use acceptor::steps::StepGroup;
use acceptor::{Feature, Step, StepTable};

use crate::commands::{CheckArgs, StepsArgs};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;

use super::load_features;

/// Steps with no matching definition, once per source line
pub fn undefined_steps<'f>(
    table: &StepTable,
    features: &'f [Feature],
) -> Vec<(&'f Feature, &'f Step)> {
    let mut undefined = Vec::new();
    for feature in features {
        let mut seen = HashSet::new();
        let steps = feature
            .background
            .iter()
            .chain(feature.scenarios.iter().flat_map(|s| &s.steps));
        for step in steps {
            if table.find_step(step).is_none() && seen.insert(step.line) {
                undefined.push((feature, step));
            }
        }
    }
    undefined
}

/// Parse every feature and report undefined steps.
///
/// Returns `Ok(false)` when any step is undefined.
pub fn execute_check(config: &CliConfig, args: &CheckArgs) -> CliResult<bool> {
    let features = load_features(&args.paths)?;
    let table = StepTable::standard()?;
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let undefined = undefined_steps(&table, &features);
    for (feature, step) in &undefined {
        reporter.failure(&format!(
            "{}:{} undefined step: {step}",
            feature.path.display(),
            step.line
        ));
    }

    let scenarios: usize = features.iter().map(|f| f.scenarios.len()).sum();
    if undefined.is_empty() {
        reporter.success(&format!(
            "{} features, {scenarios} scenarios, every step defined",
            features.len()
        ));
    } else {
        reporter.info(&format!("{} undefined steps", undefined.len()));
    }
    Ok(undefined.is_empty())
}

/// Registered phrases in match order, optionally limited to one group
pub fn list_phrases(table: &StepTable, group: Option<StepGroup>) -> Vec<String> {
    table
        .definitions()
        .iter()
        .filter(|def| group.map_or(true, |g| def.group() == g))
        .map(|def| format!("{:<3} {}", def.group(), def.phrase()))
        .collect()
}

/// Print the registered phrases
pub fn execute_steps(_config: &CliConfig, args: &StepsArgs) -> CliResult<bool> {
    let table = StepTable::standard()?;
    for line in list_phrases(&table, args.group.map(StepGroup::from)) {
        println!("{line}");
    }
    Ok(true)
}
