//! Options for the run entry point

use crate::pipeline::{RuleSet, Transformer, Validator};
use serde_json::Value;
use std::path::Path;

const DEFAULT_PROGRAM: &str = "commandr";

/// Process-wide dispatch options
///
/// ```
/// use commandr::{RunOptions, Validator};
///
/// let options = RunOptions::new()
///     .hyphenate(true)
///     .validate("name", Validator::predicate(|_, v| v.as_str().is_some_and(|s| !s.is_empty())));
/// assert!(options.is_hyphenated());
/// assert!(options.rules().validator("name").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    hyphenate: bool,
    show_all_help_variants: bool,
    rules: RuleSet,
    main: Option<String>,
    program: Option<String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `multi_word` argument names as `--multi-word` flags
    pub fn hyphenate(mut self, hyphenate: bool) -> Self {
        self.hyphenate = hyphenate;
        self
    }

    /// With hyphenation, also list the underscore spelling in help
    ///
    /// Both spellings are always accepted; this only affects help output.
    pub fn show_all_help_variants(mut self, show: bool) -> Self {
        self.show_all_help_variants = show;
        self
    }

    /// Global validation rule, used when a command has none for `argument`
    pub fn validate(mut self, argument: impl Into<String>, validator: Validator) -> Self {
        self.rules.set_validator(argument, validator);
        self
    }

    /// Global transform rule, used when a command has none for `argument`
    pub fn transform<F>(mut self, argument: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str, &str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.rules.set_transformer(argument, Transformer::new(transform));
        self
    }

    /// Command to run when the input names none
    pub fn main(mut self, command: impl Into<String>) -> Self {
        self.main = Some(command.into());
        self
    }

    /// Program name shown in help and usage lines
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn is_hyphenated(&self) -> bool {
        self.hyphenate
    }

    pub fn shows_all_help_variants(&self) -> bool {
        self.show_all_help_variants
    }

    /// Global rules
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn main_command(&self) -> Option<&str> {
        self.main.as_deref()
    }

    /// Configured program name, else the file name of the running executable
    pub fn program_name(&self) -> String {
        if let Some(program) = &self.program {
            return program.clone();
        }
        std::env::args()
            .next()
            .as_deref()
            .and_then(|arg0| Path::new(arg0).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
    }
}
