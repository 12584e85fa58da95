//! Locator abstraction for element selection.
//!
//! A [`Locator`] pairs a semantic name with a [`Selector`]. Registry locators
//! are `const` values (see [`crate::locators`]); parameterised locators are
//! built at runtime and own their selector text.

use std::borrow::Cow;
use std::fmt;

/// Selector strategy plus selector text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// XPath expression
    XPath(Cow<'static, str>),
    /// CSS selector (e.g., "button.primary")
    Css(Cow<'static, str>),
    /// Element id attribute
    Id(Cow<'static, str>),
    /// Single class name
    ClassName(Cow<'static, str>),
}

impl Selector {
    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(Cow::Owned(expr.into()))
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(Cow::Owned(selector.into()))
    }

    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(Cow::Owned(id.into()))
    }

    /// Create a class-name selector
    #[must_use]
    pub fn class_name(class: impl Into<String>) -> Self {
        Self::ClassName(Cow::Owned(class.into()))
    }

    /// WebDriver strategy name
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::XPath(_) => "xpath",
            Self::Css(_) => "css selector",
            Self::Id(_) => "id",
            Self::ClassName(_) => "class name",
        }
    }

    /// Raw selector text
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) | Self::Id(s) | Self::ClassName(s) => s,
        }
    }

    /// CSS equivalent, `None` for XPath
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::XPath(_) => None,
            Self::Css(s) => Some(s.to_string()),
            Self::Id(id) => Some(format!("[id={id:?}]")),
            Self::ClassName(class) => Some(format!(".{class}")),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// A named locator for one element on a screen
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    name: Cow<'static, str>,
    selector: Selector,
}

impl Locator {
    /// Registry constructor for a static XPath locator
    #[must_use]
    pub const fn xpath(name: &'static str, expr: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            selector: Selector::XPath(Cow::Borrowed(expr)),
        }
    }

    /// Registry constructor for a static id locator
    #[must_use]
    pub const fn id(name: &'static str, id: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            selector: Selector::Id(Cow::Borrowed(id)),
        }
    }

    /// Registry constructor for a static class-name locator
    #[must_use]
    pub const fn class_name(name: &'static str, class: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            selector: Selector::ClassName(Cow::Borrowed(class)),
        }
    }

    /// Create a locator from a runtime selector
    #[must_use]
    pub fn from_selector(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            selector,
        }
    }

    /// Semantic name (for logs)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.selector)
    }
}
