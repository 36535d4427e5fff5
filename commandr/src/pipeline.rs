//! Transform and validate raw argument input
//!
//! For each argument the effective transformer runs first, then the effective
//! validator. A rule declared on the command wins over a global rule for the
//! same argument name; the two are never combined.

use crate::documentation::first_paragraph;
use crate::error::{CommandrError, Result};
use crate::schema::{ArgumentKind, ArgumentSpec};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type TransformFn = dyn Fn(&str, &str) -> std::result::Result<Value, String> + Send + Sync;
type PredicateFn = dyn Fn(&str, &Value) -> bool + Send + Sync;

/// Converts an argument's raw text into a typed value
///
/// Receives the argument name and the raw text. Its output replaces the
/// conversion the argument's kind would otherwise apply.
#[derive(Clone)]
pub struct Transformer(Arc<TransformFn>);

impl Transformer {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&str, &str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    pub fn apply(&self, name: &str, raw: &str) -> std::result::Result<Value, String> {
        (self.0)(name, raw)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transformer(..)")
    }
}

/// Accepts or rejects a transformed value
#[derive(Clone)]
pub enum Validator {
    /// The value must equal one of these
    OneOf(Vec<Value>),
    /// The predicate must return true; the description is shown on failure
    Predicate {
        check: Arc<PredicateFn>,
        description: String,
    },
}

impl Validator {
    /// Accept only the listed values
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Accept values for which `check(name, value)` is true
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate {
            check: Arc::new(check),
            description: String::new(),
        }
    }

    /// Attach documentation shown when a predicate rejects a value
    ///
    /// Only the first paragraph is kept. Has no effect on [`Validator::OneOf`].
    pub fn with_description(self, text: &str) -> Self {
        match self {
            Self::Predicate { check, .. } => Self::Predicate {
                check,
                description: first_paragraph(text),
            },
            one_of => one_of,
        }
    }

    /// Check `value`, returning the rejection reason on failure
    pub fn check(&self, name: &str, value: &Value) -> std::result::Result<(), String> {
        match self {
            Self::OneOf(allowed) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    let choices = allowed.iter().map(display).collect::<Vec<_>>().join(", ");
                    Err(format!("'{}' is not one of: {choices}", display(value)))
                }
            }
            Self::Predicate { check, description } => {
                if check(name, value) {
                    Ok(())
                } else if description.is_empty() {
                    Err(format!("'{}' was rejected", display(value)))
                } else {
                    Err(description.clone())
                }
            }
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Predicate { description, .. } => f
                .debug_struct("Predicate")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A set of transform and validate rules keyed by argument name
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    validate: IndexMap<String, Validator>,
    transform: IndexMap<String, Transformer>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_validator(&mut self, argument: impl Into<String>, validator: Validator) {
        self.validate.insert(argument.into(), validator);
    }

    pub fn set_transformer(&mut self, argument: impl Into<String>, transformer: Transformer) {
        self.transform.insert(argument.into(), transformer);
    }

    pub fn validator(&self, argument: &str) -> Option<&Validator> {
        self.validate.get(argument)
    }

    pub fn transformer(&self, argument: &str) -> Option<&Transformer> {
        self.transform.get(argument)
    }

    /// Every argument name any rule refers to
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.validate
            .keys()
            .chain(self.transform.keys())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.validate.is_empty() && self.transform.is_empty()
    }
}

/// Raw input for one argument as produced by the flag parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Text supplied to a value-taking flag or positionally
    Text(String),
    /// A presence flag that appeared on the command line
    Present,
}

/// Applies the effective rules for one command
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    command: &'a str,
    global: &'a RuleSet,
}

impl<'a> Pipeline<'a> {
    pub fn new(command: &'a str, global: &'a RuleSet) -> Self {
        Self { command, global }
    }

    /// The transformer that applies to `spec`: its own, else the global one
    pub fn effective_transformer(&self, spec: &'a ArgumentSpec) -> Option<&'a Transformer> {
        spec.transformer()
            .or_else(|| self.global.transformer(spec.name()))
    }

    /// The validator that applies to `spec`: its own, else the global one
    pub fn effective_validator(&self, spec: &'a ArgumentSpec) -> Option<&'a Validator> {
        spec.validator().or_else(|| self.global.validator(spec.name()))
    }

    /// Convert and check one supplied value
    pub fn process(&self, spec: &'a ArgumentSpec, raw: RawValue) -> Result<Value> {
        let value = match raw {
            RawValue::Present => {
                let default = spec.default().and_then(Value::as_bool).unwrap_or(false);
                Value::Bool(!default)
            }
            RawValue::Text(text) => match self.effective_transformer(spec) {
                Some(transformer) => transformer.apply(spec.name(), &text).map_err(|message| {
                    CommandrError::argument_parse(self.command, spec.name(), message)
                })?,
                None => self.convert(spec, text)?,
            },
        };

        tracing::trace!("{}.{} => {}", self.command, spec.name(), value);

        if let Some(validator) = self.effective_validator(spec) {
            validator
                .check(spec.name(), &value)
                .map_err(|reason| CommandrError::Validation {
                    command: self.command.to_string(),
                    argument: spec.name().to_string(),
                    reason,
                })?;
        }

        Ok(value)
    }

    fn convert(&self, spec: &ArgumentSpec, text: String) -> Result<Value> {
        match spec.kind() {
            ArgumentKind::Integer => text.trim().parse::<i64>().map(Value::from).map_err(|_| {
                CommandrError::argument_parse(
                    self.command,
                    spec.name(),
                    format!("expected an integer, got '{text}'"),
                )
            }),
            ArgumentKind::Other => serde_json::from_str(&text).map_err(|e| {
                CommandrError::argument_parse(
                    self.command,
                    spec.name(),
                    format!("expected a JSON value, got '{text}': {e}"),
                )
            }),
            ArgumentKind::Flag | ArgumentKind::String => Ok(Value::String(text)),
        }
    }
}
