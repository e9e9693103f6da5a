//! Values flowing between the parser and controller methods.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CommandError;

/// A parameter default, a parsed command-line value, or a projected call
/// argument.
///
/// Parsed values are never coerced: a value given on the command line always
/// arrives as [`ArgValue::Text`], regardless of what the parameter's default
/// looks like. Only toggles produce [`ArgValue::Bool`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// No value; the equivalent of an absent optional argument.
    #[default]
    Unset,
    /// A toggle state.
    Bool(bool),
    /// A textual value exactly as typed.
    Text(String),
}

impl ArgValue {
    /// Builds a textual value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text when the value is textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Unset | Self::Bool(_) => None,
        }
    }

    /// Consumes the value, returning the text when the value is textual.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Unset | Self::Bool(_) => None,
        }
    }

    /// Returns `true` only for an enabled toggle.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<String>> for ArgValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unset, Self::Text)
    }
}

/// The structured result of parsing one invocation.
///
/// Holds the selected plugin and method, the debug toggle, and one
/// value per parameter of the selected method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    plugin: String,
    method: String,
    debug: bool,
    values: BTreeMap<String, ArgValue>,
}

impl Namespace {
    /// Creates an empty namespace selecting `plugin` and `method`.
    #[must_use]
    pub fn new(plugin: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            method: method.into(),
            debug: false,
            values: BTreeMap::new(),
        }
    }

    /// Sets the debug toggle.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Adds or replaces the value recorded for a parameter.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Replaces every recorded parameter value.
    #[must_use]
    pub fn with_values(mut self, values: BTreeMap<String, ArgValue>) -> Self {
        self.values = values;
        self
    }

    /// Name of the selected plugin.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Name of the selected method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether `-d/--debug` was passed before the command.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Value recorded for `name`, if any.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Every recorded parameter value.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, ArgValue> {
        &self.values
    }
}

/// Positional arguments handed to a controller method, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs(Vec<ArgValue>);

impl CallArgs {
    /// Wraps already ordered arguments.
    #[must_use]
    pub const fn new(values: Vec<ArgValue>) -> Self {
        Self(values)
    }

    /// Number of arguments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the method takes no arguments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ArgValue> {
        self.0.iter()
    }

    /// Returns the arguments as a plain vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<ArgValue> {
        self.0
    }

    /// Destructures the arguments into a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Arity`] when the method table declared a
    /// different number of parameters than the handler expects.
    pub fn into_array<const N: usize>(self) -> Result<[ArgValue; N], CommandError> {
        let actual = self.0.len();
        <[ArgValue; N]>::try_from(self.0).map_err(|_| CommandError::Arity {
            expected: N,
            actual,
        })
    }
}

impl FromIterator<ArgValue> for CallArgs {
    fn from_iter<T: IntoIterator<Item = ArgValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to report.
    Done,
    /// A line of text for the user.
    Message(String),
    /// Structured data rendered by the caller as a table or JSON.
    Data(serde_json::Value),
}

/// Result returned by every controller method.
pub type CommandResult = Result<Outcome, CommandError>;
