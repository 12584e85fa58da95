//! Step definitions.
//!
//! One ordered table maps phrase patterns to handlers. Phrases use the
//! behave placeholder syntax: `{name}` captures any text (non-greedy) and
//! `{name:d}` captures an integer. The first definition whose pattern
//! matches the whole step text wins; the step keyword plays no part.

use std::collections::HashMap;
use std::fmt;

use futures::future::BoxFuture;
use regex::Regex;

use crate::gherkin::{DataTable, Step};
use crate::result::{AcceptorError, AcceptorResult};

mod api;
mod context;
mod ui;

pub use context::ScenarioContext;

/// Future returned by every step handler
pub type StepFuture<'a> = BoxFuture<'a, AcceptorResult<()>>;

/// Step handler signature
pub type StepHandler = for<'a> fn(&'a mut ScenarioContext, &'a StepArgs) -> StepFuture<'a>;

/// Which half of the suite a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepGroup {
    /// Browser steps
    Ui,
    /// Booking API steps
    Api,
}

impl fmt::Display for StepGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Ui => "ui",
            Self::Api => "api",
        })
    }
}

/// A compiled step definition
#[derive(Clone)]
pub struct StepDefinition {
    phrase: String,
    pattern: Regex,
    group: StepGroup,
    handler: StepHandler,
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("phrase", &self.phrase)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl StepDefinition {
    /// Phrase as registered
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Compiled pattern
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub const fn group(&self) -> StepGroup {
        self.group
    }

    #[must_use]
    pub const fn handler(&self) -> StepHandler {
        self.handler
    }
}

/// Arguments handed to a handler: captures plus the step's attachments
#[derive(Debug, Clone, Default)]
pub struct StepArgs {
    captures: HashMap<String, String>,
    table: Option<DataTable>,
    docstring: Option<String>,
}

impl StepArgs {
    /// Arguments with only captures
    #[must_use]
    pub fn from_captures(captures: HashMap<String, String>) -> Self {
        Self {
            captures,
            ..Self::default()
        }
    }

    /// Attach a data table
    #[must_use]
    pub fn with_table(mut self, table: Option<DataTable>) -> Self {
        self.table = table;
        self
    }

    /// Attach a doc string
    #[must_use]
    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    /// Captured text
    pub fn get(&self, name: &str) -> AcceptorResult<&str> {
        self.captures
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AcceptorError::missing(format!("step argument '{name}'")))
    }

    /// Captured integer
    pub fn get_int(&self, name: &str) -> AcceptorResult<i64> {
        let value = self.get(name)?;
        value
            .parse()
            .map_err(|_| AcceptorError::invalid(name, value))
    }

    /// The step's data table
    pub fn table(&self) -> AcceptorResult<&DataTable> {
        self.table
            .as_ref()
            .ok_or_else(|| AcceptorError::missing("data table"))
    }

    /// The step's data table, if any
    #[must_use]
    pub const fn table_opt(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    /// The step's doc string, if any
    #[must_use]
    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }
}

/// A matched definition plus the arguments for the handler
#[derive(Debug)]
pub struct StepMatch<'t> {
    /// The matching definition
    pub definition: &'t StepDefinition,
    /// Arguments built from the step
    pub args: StepArgs,
}

/// Ordered phrase-to-handler table
#[derive(Debug, Clone, Default)]
pub struct StepTable {
    definitions: Vec<StepDefinition>,
}

impl StepTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every UI and API step
    pub fn standard() -> AcceptorResult<Self> {
        let mut table = Self::new();
        ui::register(&mut table)?;
        api::register(&mut table)?;
        Ok(table)
    }

    /// Append a definition; a phrase may only be registered once
    pub fn register(
        &mut self,
        group: StepGroup,
        phrase: &str,
        handler: StepHandler,
    ) -> AcceptorResult<()> {
        if self.definitions.iter().any(|d| d.phrase == phrase) {
            return Err(AcceptorError::DuplicateStep {
                phrase: phrase.to_string(),
            });
        }
        let pattern = compile_phrase(phrase)?;
        self.definitions.push(StepDefinition {
            phrase: phrase.to_string(),
            pattern,
            group,
            handler,
        });
        Ok(())
    }

    /// First definition matching the whole step text
    #[must_use]
    pub fn find(&self, text: &str) -> Option<StepMatch<'_>> {
        self.definitions.iter().find_map(|definition| {
            let caps = definition.pattern.captures(text)?;
            let captures = definition
                .pattern
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect();
            Some(StepMatch {
                definition,
                args: StepArgs::from_captures(captures),
            })
        })
    }

    /// Match a parsed step, attaching its table and doc string
    #[must_use]
    pub fn find_step(&self, step: &Step) -> Option<StepMatch<'_>> {
        self.find(&step.text).map(|mut found| {
            found.args = found
                .args
                .with_table(step.table.clone())
                .with_docstring(step.docstring.clone());
            found
        })
    }

    /// Registered definitions in lookup order
    #[must_use]
    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Turn a behave-style phrase into an anchored regex
fn compile_phrase(phrase: &str) -> AcceptorResult<Regex> {
    let invalid = |message: String| AcceptorError::InvalidPhrase {
        phrase: phrase.to_string(),
        message,
    };

    let mut pattern = String::from("^");
    let mut rest = phrase;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
        let placeholder = &after[..close];
        let (name, kind) = placeholder.split_once(':').unwrap_or((placeholder, ""));
        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(invalid(format!("invalid placeholder name '{name}'")));
        }
        match kind {
            "" => pattern.push_str(&format!("(?P<{name}>.*?)")),
            "d" => pattern.push_str(&format!(r"(?P<{name}>-?\d+)")),
            other => return Err(invalid(format!("unsupported placeholder type '{other}'"))),
        }
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(invalid("unmatched '}'".to_string()));
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| invalid(e.to_string()))
}

/// Fail the step with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> AcceptorResult<()> {
    if condition {
        Ok(())
    } else {
        Err(AcceptorError::assertion(message))
    }
}
