//! Gherkin feature files.
//!
//! Documents are parsed with the `gherkin` crate and flattened into the
//! types below: `Rule` scenarios join the feature's list, and outlines are
//! expanded at parse time so the runner only ever sees plain scenarios.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ::gherkin::{Feature as RawFeature, GherkinEnv, StepType};
use regex::Regex;
use serde::Serialize;

use crate::result::{AcceptorError, AcceptorResult};

/// Step keyword after `And`/`But`/`*` have been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepKeyword {
    /// Precondition
    Given,
    /// Action
    When,
    /// Outcome
    Then,
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        })
    }
}

/// A step data table; the first row is the header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataTable {
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Create a table from raw rows
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// All rows including the header
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Header row
    #[must_use]
    pub fn header(&self) -> &[String] {
        self.rows.first().map_or(&[], Vec::as_slice)
    }

    /// Body rows keyed by header cell
    #[must_use]
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, String>> {
        let header = self.header();
        self.rows
            .iter()
            .skip(1)
            .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    /// First body row keyed by header cell
    pub fn first_row(&self) -> AcceptorResult<HashMap<String, String>> {
        self.rows_as_maps()
            .into_iter()
            .next()
            .ok_or_else(|| AcceptorError::missing("data table row"))
    }

    fn substitute(&self, values: &HashMap<&str, &str>) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| substitute(cell, values)).collect())
                .collect(),
        }
    }
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Resolved keyword
    pub keyword: StepKeyword,
    /// Keyword as written (`Given`, `And`, `*`, ...)
    pub keyword_text: String,
    /// Step text after the keyword
    pub text: String,
    /// 1-based line number
    pub line: usize,
    /// Attached data table
    pub table: Option<DataTable>,
    /// Attached doc string
    pub docstring: Option<String>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword_text, self.text)
    }
}

/// A runnable scenario (outlines already expanded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Own tags plus example tags, without `@`
    pub tags: Vec<String>,
    /// Steps in order
    pub steps: Vec<Step>,
    /// 1-based line of the `Scenario` keyword (or of the example row)
    pub line: usize,
}

impl Scenario {
    /// Whether the scenario itself carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }
}

/// A parsed feature file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    /// Feature name
    pub name: String,
    /// Free text under the `Feature` line
    pub description: String,
    /// Feature tags, without `@`
    pub tags: Vec<String>,
    /// Steps run before every scenario
    pub background: Vec<Step>,
    /// Scenarios in file order
    pub scenarios: Vec<Scenario>,
    /// Source file
    pub path: PathBuf,
}

impl Feature {
    /// Feature tags followed by the scenario's tags
    #[must_use]
    pub fn effective_tags(&self, scenario: &Scenario) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.extend(scenario.tags.iter().cloned());
        tags
    }
}

/// Parse a feature file from disk
pub fn parse_file(path: impl AsRef<Path>) -> AcceptorResult<Feature> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, path)
}

/// Parse feature text; `path` is only used in errors
pub fn parse_str(text: &str, path: impl AsRef<Path>) -> AcceptorResult<Feature> {
    let path = path.as_ref();
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let raw = RawFeature::parse(&text, GherkinEnv::default())
        .map_err(|err| syntax_error(path, error_line(&err), error_message(&err)))?;
    convert(raw, path)
}

// ============================================================================
// Conversion from the parsed document
// ============================================================================

fn convert(raw: RawFeature, path: &Path) -> AcceptorResult<Feature> {
    let background = match raw.background {
        Some(background) => convert_steps(background.steps, path)?,
        None => Vec::new(),
    };
    let mut feature = Feature {
        name: raw.name.trim().to_string(),
        description: raw.description.as_deref().map(description).unwrap_or_default(),
        tags: strip_tags(raw.tags),
        background,
        scenarios: Vec::new(),
        path: path.to_path_buf(),
    };

    for scenario in raw.scenarios {
        expand(scenario, &[], &[], &mut feature.scenarios, path)?;
    }
    for rule in raw.rules {
        let rule_background = match rule.background {
            Some(background) => convert_steps(background.steps, path)?,
            None => Vec::new(),
        };
        let rule_tags = strip_tags(rule.tags);
        for scenario in rule.scenarios {
            expand(scenario, &rule_tags, &rule_background, &mut feature.scenarios, path)?;
        }
    }
    Ok(feature)
}

fn convert_steps(steps: Vec<::gherkin::Step>, path: &Path) -> AcceptorResult<Vec<Step>> {
    steps
        .into_iter()
        .map(|step| {
            let line = step.position.line;
            Ok(Step {
                keyword: match step.ty {
                    StepType::Given => StepKeyword::Given,
                    StepType::When => StepKeyword::When,
                    StepType::Then => StepKeyword::Then,
                },
                keyword_text: step.keyword.trim().to_string(),
                text: step.value.trim().to_string(),
                line,
                table: step
                    .table
                    .map(|table| convert_table(table, path))
                    .transpose()?,
                docstring: step.docstring.as_deref().map(dedent),
            })
        })
        .collect()
}

fn convert_table(table: ::gherkin::Table, path: &Path) -> AcceptorResult<DataTable> {
    let start = table.position.line;
    let rows: Vec<Vec<String>> = table
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(|cell| cell.trim().to_string()).collect())
        .collect();
    let width = rows.first().map_or(0, Vec::len);
    if let Some(index) = rows.iter().position(|row| row.len() != width) {
        return Err(syntax_error(path, start + index, "inconsistent number of cells"));
    }
    Ok(DataTable::new(rows))
}

/// Free text with per-line indentation and blank lines removed
fn description(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Doc string with surrounding blank lines and common indentation removed
fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let body = &lines[first..=last];
    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    body.iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim_start_matches('@').to_string())
        .collect()
}

fn syntax_error(path: &Path, line: usize, message: impl Into<String>) -> AcceptorError {
    AcceptorError::Gherkin {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn error_chain<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn error_message(err: &(dyn Error + 'static)) -> String {
    error_chain(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// `line:column` reported by the grammar, or the first line when absent
fn error_line(err: &(dyn Error + 'static)) -> usize {
    static LOCATION: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(location) = LOCATION.get_or_init(|| Regex::new(r"\b(\d+):(\d+)\b").ok()) else {
        return 1;
    };
    error_chain(err)
        .find_map(|e| {
            location
                .captures(&e.to_string())
                .and_then(|caps| caps[1].parse::<usize>().ok())
        })
        .filter(|line| *line > 0)
        .unwrap_or(1)
}

/// Replace `<name>` placeholders in one left-to-right pass.
///
/// Substituted values are never rescanned, and unknown names are kept as
/// written.
fn substitute(text: &str, values: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('>').and_then(|close| {
            let name = &after[..close];
            values.get(name).map(|value| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand(
    raw: ::gherkin::Scenario,
    inherited_tags: &[String],
    background: &[Step],
    out: &mut Vec<Scenario>,
    path: &Path,
) -> AcceptorResult<()> {
    let line = raw.position.line;
    let mut tags = inherited_tags.to_vec();
    tags.extend(strip_tags(raw.tags));
    let mut steps = background.to_vec();
    steps.extend(convert_steps(raw.steps, path)?);
    let name = raw.name.trim().to_string();
    let outline = raw.keyword.contains("Outline") || raw.keyword.contains("Template");

    if raw.examples.is_empty() && !outline {
        out.push(Scenario {
            name,
            tags,
            steps,
            line,
        });
        return Ok(());
    }

    let mut blocks = Vec::new();
    for examples in raw.examples {
        let Some(table) = examples.table else {
            continue;
        };
        let table_line = table.position.line;
        blocks.push((strip_tags(examples.tags), table_line, convert_table(table, path)?));
    }
    if blocks.iter().all(|(_, _, table)| table.rows().len() < 2) {
        return Err(syntax_error(
            path,
            line,
            format!("Scenario Outline '{name}' has no example rows"),
        ));
    }

    for (block_index, (example_tags, table_line, table)) in blocks.iter().enumerate() {
        let Some((header, body)) = table.rows().split_first() else {
            continue;
        };
        for (row_index, row) in body.iter().enumerate() {
            let values: HashMap<&str, &str> = header
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect();
            let mut row_tags = tags.clone();
            row_tags.extend(example_tags.iter().cloned());
            out.push(Scenario {
                name: format!(
                    "{} -- @{}.{}",
                    substitute(&name, &values),
                    block_index + 1,
                    row_index + 1
                ),
                tags: row_tags,
                steps: steps
                    .iter()
                    .map(|step| Step {
                        text: substitute(&step.text, &values),
                        table: step.table.as_ref().map(|t| t.substitute(&values)),
                        docstring: step.docstring.as_ref().map(|d| substitute(d, &values)),
                        ..step.clone()
                    })
                    .collect(),
                line: table_line + row_index + 1,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Tag filter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct TagTerm {
    tag: String,
    negated: bool,
}

impl TagTerm {
    fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        let (negated, tag) = if let Some(rest) = term.strip_prefix("not ") {
            (true, rest.trim())
        } else if let Some(rest) = term.strip_prefix('~').or_else(|| term.strip_prefix('-')) {
            (true, rest)
        } else {
            (false, term)
        };
        let tag = tag.trim_start_matches('@');
        (!tag.is_empty() && !tag.contains(char::is_whitespace)).then(|| Self {
            tag: tag.to_string(),
            negated,
        })
    }

    fn matches(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| *t == self.tag) != self.negated
    }
}

/// Tag selection in the behave style.
///
/// Each expression is an OR of comma-separated terms; separate expressions
/// are ANDed. A term is `@tag`, or a negation written `~@tag`, `-@tag` or
/// `not @tag`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    clauses: Vec<Vec<TagTerm>>,
}

impl TagFilter {
    /// Filter that accepts everything
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a list of `--tags` expressions
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> AcceptorResult<Self> {
        let mut clauses = Vec::new();
        for expression in expressions {
            let expression = expression.as_ref();
            let clause = expression
                .split(',')
                .map(|term| {
                    TagTerm::parse(term).ok_or_else(|| AcceptorError::Config {
                        message: format!("invalid tag expression '{expression}'"),
                    })
                })
                .collect::<AcceptorResult<Vec<_>>>()?;
            clauses.push(clause);
        }
        Ok(Self { clauses })
    }

    /// Whether no expression was given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether a scenario with these tags is selected
    #[must_use]
    pub fn matches(&self, tags: &[String]) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|term| term.matches(tags)))
    }
}
