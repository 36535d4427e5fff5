//! Command schemas derived from declarations
//!
//! A [`CommandSpec`] is what a declaration hands over at registration time:
//! the callable plus an optional explicit name and per-command rules.
//! [`CommandSpec::build`] merges the extracted signature with the parsed
//! documentation into a [`CommandSchema`] with one [`ArgumentSpec`] per
//! parameter.

use crate::documentation::Documentation;
use crate::error::{CommandrError, Result};
use crate::pipeline::{RuleSet, Transformer, Validator};
use crate::signature::{self, Callable};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// How an argument's raw input is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Boolean default: a presence flag that negates the default
    Flag,
    /// Integer default: raw text is parsed as an integer
    Integer,
    /// Text; also used when there is no default or the default is null
    String,
    /// Any other default (floats, objects, arrays): raw text is parsed as JSON
    Other,
}

impl ArgumentKind {
    /// Infer the kind from a default value
    pub fn infer(default: Option<&Value>) -> Self {
        match default {
            Some(Value::Bool(_)) => Self::Flag,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Self::Integer,
            None | Some(Value::Null) | Some(Value::String(_)) => Self::String,
            Some(_) => Self::Other,
        }
    }

    /// Whether the flag for this kind consumes a value
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Flag)
    }
}

/// The derived schema of one parameter
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    name: String,
    default: Option<Value>,
    kind: ArgumentKind,
    help: String,
    validator: Option<Validator>,
    transformer: Option<Transformer>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, default: Option<Value>) -> Self {
        let kind = ArgumentKind::infer(default.as_ref());
        Self {
            name: name.into(),
            default,
            kind,
            help: String::new(),
            validator: None,
            transformer: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Arguments without a default must be supplied
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn transformer(&self) -> Option<&Transformer> {
        self.transformer.as_ref()
    }

    /// The flag name shown on the command line
    ///
    /// With hyphenation, `caps_lock` becomes `caps-lock`; the internal name
    /// never changes.
    pub fn flag_name(&self, hyphenate: bool) -> String {
        if hyphenate {
            self.name.replace('_', "-")
        } else {
            self.name.clone()
        }
    }
}

/// A registered command: its arguments, summary, and the callable behind it
#[derive(Clone)]
pub struct CommandSchema {
    name: String,
    summary: String,
    arguments: Vec<ArgumentSpec>,
    callable: Arc<dyn Callable>,
}

impl fmt::Debug for CommandSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSchema")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl CommandSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full summary text from the documentation
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    pub fn callable(&self) -> &dyn Callable {
        self.callable.as_ref()
    }
}

/// A command declaration waiting to be registered
///
/// ```
/// use commandr::{json, Arguments, CommandSpec, Declared, Parameter, Signature, Validator};
///
/// let declared = Declared::new(
///     Signature::new("simple_greet").param(Parameter::required("name")),
///     "Greet someone.\n\nArguments:\n  name - Name to greet.",
///     |args: &Arguments| -> anyhow::Result<()> {
///         println!("Hi {}!", args.get::<String>("name")?);
///         Ok(())
///     },
/// );
/// let schema = CommandSpec::new(declared)
///     .name("hello")
///     .validate("name", Validator::one_of(["Kevin", "Nick"]))
///     .build()
///     .unwrap();
/// assert_eq!(schema.name(), "hello");
/// assert_eq!(schema.argument("name").unwrap().help(), "Name to greet.");
/// ```
#[derive(Clone)]
pub struct CommandSpec {
    callable: Arc<dyn Callable>,
    name: Option<String>,
    rules: RuleSet,
}

impl CommandSpec {
    pub fn new<C: Callable + 'static>(callable: C) -> Self {
        Self::from_arc(Arc::new(callable))
    }

    pub fn from_arc(callable: Arc<dyn Callable>) -> Self {
        Self {
            callable,
            name: None,
            rules: RuleSet::new(),
        }
    }

    /// Explicit command name; takes precedence over the declared identifier
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Per-command validation rule for `argument`
    pub fn validate(mut self, argument: impl Into<String>, validator: Validator) -> Self {
        self.rules.set_validator(argument, validator);
        self
    }

    /// Per-command transform rule for `argument`
    pub fn transform<F>(mut self, argument: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str, &str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.rules.set_transformer(argument, Transformer::new(transform));
        self
    }

    /// The name this spec will register under
    pub fn command_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.callable.name())
    }

    /// Derive the schema from the callable's signature and documentation
    pub fn build(self) -> Result<CommandSchema> {
        let name = self.command_name().to_string();
        let extracted = signature::extract(self.callable.as_ref())?;
        let documentation = Documentation::parse(extracted.doc);

        let mut seen = HashSet::new();
        let mut arguments = Vec::with_capacity(extracted.signature.parameters().len());
        for parameter in extracted.signature.parameters() {
            if !seen.insert(parameter.name()) {
                return Err(CommandrError::InvalidSchema {
                    command: name,
                    message: format!("parameter '{}' is declared twice", parameter.name()),
                });
            }

            let mut spec = ArgumentSpec::new(parameter.name(), parameter.default().cloned())
                .with_help(documentation.help_for(parameter.name()));
            if let Some(validator) = self.rules.validator(parameter.name()) {
                spec = spec.with_validator(validator.clone());
            }
            if let Some(transformer) = self.rules.transformer(parameter.name()) {
                spec = spec.with_transformer(transformer.clone());
            }
            arguments.push(spec);
        }

        if let Some(unknown) = self.rules.argument_names().find(|arg| !seen.contains(arg)) {
            return Err(CommandrError::InvalidSchema {
                command: name,
                message: format!("rule refers to unknown argument '{unknown}'"),
            });
        }

        tracing::debug!(
            "Built schema for '{}' with {} argument(s){}",
            name,
            arguments.len(),
            if extracted.is_wrapper {
                " (unwrapped)"
            } else {
                ""
            }
        );

        Ok(CommandSchema {
            name,
            summary: documentation.summary().to_string(),
            arguments,
            callable: self.callable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::signature::{wraps, Declared, Parameter, Signature};
    use serde_json::json;

    fn say_greeting() -> Declared {
        Declared::new(
            Signature::new("say_greeting")
                .param(Parameter::required("name"))
                .param(Parameter::optional("title", json!("Mr.")))
                .param(Parameter::optional("times", json!(1)))
                .param(Parameter::optional("comma", json!(false)))
                .param(Parameter::optional("caps_lock", json!(false))),
            "Greet someone.

Arguments:
  name - Name to greet.
  title - Title of the person to greet.
  times - Number of time to say the greeting.
  comma - Whether to add a comma after the greeting.",
            |_args: &Arguments| (),
        )
    }

    fn shape(schema: &CommandSchema) -> Vec<(String, Option<Value>, ArgumentKind, String)> {
        schema
            .arguments()
            .iter()
            .map(|arg| {
                (
                    arg.name().to_string(),
                    arg.default().cloned(),
                    arg.kind(),
                    arg.help().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(ArgumentKind::infer(Some(&json!(false))), ArgumentKind::Flag);
        assert_eq!(ArgumentKind::infer(Some(&json!(3))), ArgumentKind::Integer);
        assert_eq!(ArgumentKind::infer(Some(&json!("x"))), ArgumentKind::String);
        assert_eq!(ArgumentKind::infer(Some(&Value::Null)), ArgumentKind::String);
        assert_eq!(ArgumentKind::infer(None), ArgumentKind::String);
        assert_eq!(ArgumentKind::infer(Some(&json!(0.5))), ArgumentKind::Other);
        assert_eq!(
            ArgumentKind::infer(Some(&json!({"hi": "Aloha"}))),
            ArgumentKind::Other
        );
        assert!(!ArgumentKind::Flag.takes_value());
        assert!(ArgumentKind::Other.takes_value());
    }

    #[test]
    fn test_build_greet_schema() {
        let schema = CommandSpec::new(say_greeting()).name("greet").build().unwrap();

        assert_eq!(schema.name(), "greet");
        assert_eq!(schema.summary(), "Greet someone.");
        let shape = shape(&schema);
        assert_eq!(shape.len(), 5);
        assert_eq!(
            shape[0],
            (
                "name".to_string(),
                None,
                ArgumentKind::String,
                "Name to greet.".to_string()
            )
        );
        assert_eq!(shape[2].2, ArgumentKind::Integer);
        assert_eq!(shape[3].2, ArgumentKind::Flag);
        assert_eq!(shape[4].3, "");
        assert!(schema.argument("name").unwrap().is_required());
        assert!(!schema.argument("title").unwrap().is_required());
    }

    #[test]
    fn test_declared_name_is_default_command_name() {
        let spec = CommandSpec::new(say_greeting());
        assert_eq!(spec.command_name(), "say_greeting");
        assert_eq!(spec.name("greet").command_name(), "greet");
    }

    #[test]
    fn test_wrapped_callable_has_same_arguments() {
        let direct = CommandSpec::new(say_greeting()).build().unwrap();
        let wrapped = CommandSpec::new(wraps(say_greeting(), |inner, args| inner.call(args)))
            .build()
            .unwrap();

        assert_eq!(wrapped.name(), "say_greeting");
        assert_eq!(shape(&direct), shape(&wrapped));
        assert_eq!(direct.summary(), wrapped.summary());
    }

    #[test]
    fn test_rules_attach_to_arguments() {
        let schema = CommandSpec::new(say_greeting())
            .validate("name", Validator::one_of(["Kevin", "Nick"]))
            .transform("name", |_, raw| Ok(json!(raw.to_uppercase())))
            .build()
            .unwrap();

        let name = schema.argument("name").unwrap();
        assert!(name.validator().is_some());
        assert!(name.transformer().is_some());
        assert!(schema.argument("title").unwrap().validator().is_none());
    }

    #[test]
    fn test_rule_for_unknown_argument_is_rejected() {
        let error = CommandSpec::new(say_greeting())
            .validate("nickname", Validator::one_of(["x"]))
            .build()
            .unwrap_err();
        assert!(matches!(error, CommandrError::InvalidSchema { .. }));
        assert!(error.to_string().contains("nickname"));
    }

    #[test]
    fn test_duplicate_parameter_is_rejected() {
        let declared = Declared::new(
            Signature::new("twice")
                .param(Parameter::required("name"))
                .param(Parameter::required("name")),
            "",
            |_args: &Arguments| (),
        );
        let error = CommandSpec::new(declared).build().unwrap_err();
        assert!(error.to_string().contains("declared twice"));
    }

    #[test]
    fn test_zero_argument_command() {
        let declared = Declared::new(Signature::new("ping"), "", |_args: &Arguments| ());
        let schema = CommandSpec::new(declared).build().unwrap();
        assert!(schema.arguments().is_empty());
        assert_eq!(schema.summary(), "");
    }

    #[test]
    fn test_flag_name_hyphenation() {
        let spec = ArgumentSpec::new("caps_lock", Some(json!(false)));
        assert_eq!(spec.flag_name(true), "caps-lock");
        assert_eq!(spec.flag_name(false), "caps_lock");
        assert_eq!(spec.name(), "caps_lock");
    }
}
