//! The run entry point
//!
//! One invocation goes through these steps:
//!
//! 1. **Resolve** the first non-flag token as the command name. Flags may
//!    come before the name, but only presence flags: in `--count 3 repeat`
//!    the name is `3`. Put value-taking flags after the command name.
//! 2. **Build flags** for the command's arguments with clap, hyphenated when
//!    configured. Boolean arguments become presence flags; the rest take one
//!    value.
//! 3. **Parse** the remaining tokens against those flags.
//! 4. **Pipeline** each supplied value through its transformer and validator,
//!    in declaration order.
//! 5. **Invoke** the callable.
//!
//! Usage-class [`CommandrError`]s raised anywhere in these steps, including
//! from inside the command body, come back as [`DispatchError::Usage`] along
//! with the help text of the offending command. Everything else is
//! [`DispatchError::Fatal`].

use crate::arguments::Arguments;
use crate::config::RunOptions;
use crate::documentation::first_paragraph;
use crate::error::CommandrError;
use crate::exit_codes::{to_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use crate::pipeline::{Pipeline, RawValue};
use crate::registry::Registry;
use crate::schema::CommandSchema;
use clap::error::{ContextKind, ErrorKind};
use clap::{Arg, ArgAction, Command};
use serde_json::Value;
use std::collections::VecDeque;
use std::process::ExitCode;
use thiserror::Error as ThisError;

/// Hidden catch-all for values given without a flag
const POSITIONAL: &str = "__positional";

const HELP_COMMAND: &str = "help";

/// What a successful dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The named command ran to completion
    Completed { command: String },
    /// Help was requested; the text is ready to print
    Help(String),
}

/// Why a dispatch failed
#[derive(Debug, ThisError)]
pub enum DispatchError {
    /// The user got something wrong, or the command signalled a usage error
    #[error("{error}")]
    Usage {
        error: CommandrError,
        /// Help for the offending command, or the command listing
        help: String,
    },

    /// Any other failure from the command body
    #[error(transparent)]
    Fatal(anyhow::Error),
}

impl DispatchError {
    /// The usage error, if this is one
    pub fn usage_error(&self) -> Option<&CommandrError> {
        match self {
            Self::Usage { error, .. } => Some(error),
            Self::Fatal(_) => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } => EXIT_USAGE,
            Self::Fatal(_) => EXIT_ERROR,
        }
    }

    /// Text to show the user
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Usage { error, help } => format!("{}\n\nError: {error}", help.trim_end()),
            Self::Fatal(error) => format!("Error: {error:#}"),
        }
    }
}

enum Parsed {
    Help(String),
    Arguments(Arguments),
}

/// Resolves and runs commands from a frozen [`Registry`]
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    options: RunOptions,
}

impl Dispatcher {
    pub fn new(registry: Registry, options: RunOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Dispatch the process arguments and turn the result into an exit code
    ///
    /// Usage errors are printed to stderr and give [`EXIT_USAGE`]. Fatal
    /// errors are returned to the caller.
    pub fn run(&self) -> anyhow::Result<ExitCode> {
        self.run_from(std::env::args().skip(1))
    }

    /// [`Dispatcher::run`] over explicit tokens (without the program name)
    pub fn run_from<I, T>(&self, tokens: I) -> anyhow::Result<ExitCode>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        match self.dispatch(tokens) {
            Ok(Outcome::Help(text)) => {
                print!("{text}");
                Ok(to_exit_code(EXIT_SUCCESS))
            }
            Ok(Outcome::Completed { .. }) => Ok(to_exit_code(EXIT_SUCCESS)),
            Err(DispatchError::Fatal(error)) => Err(error),
            Err(usage) => {
                eprintln!("{}", usage.diagnostic());
                Ok(to_exit_code(usage.exit_code()))
            }
        }
    }

    /// Resolve, parse, validate and invoke one command
    pub fn dispatch<I, T>(&self, tokens: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        tracing::debug!("Dispatching {:?}", tokens);

        let Some(index) = tokens.iter().position(|token| !token.starts_with('-')) else {
            return match self.options.main_command() {
                Some(main) => self.dispatch_command(main, tokens),
                None if tokens.iter().any(|token| is_help_flag(token)) => {
                    Ok(Outcome::Help(self.listing()))
                }
                None => Err(self.listing_failure(CommandrError::Usage {
                    message: "no command given".to_string(),
                })),
            };
        };

        let name = &tokens[index];
        if name == HELP_COMMAND && !self.registry.contains(HELP_COMMAND) {
            return self.help(&tokens[index + 1..]);
        }

        if !self.registry.contains(name) {
            if let Some(main) = self.options.main_command() {
                return self.dispatch_command(main, tokens);
            }
        }

        let mut rest = tokens[..index].to_vec();
        rest.extend_from_slice(&tokens[index + 1..]);
        self.dispatch_command(name, rest)
    }

    fn dispatch_command(&self, name: &str, tokens: Vec<String>) -> Result<Outcome, DispatchError> {
        let schema = self
            .registry
            .resolve(name)
            .map_err(|error| self.listing_failure(error))?;
        tracing::debug!("Resolved command '{}'", schema.name());

        let arguments = match self.parse(schema, tokens) {
            Ok(Parsed::Help(text)) => return Ok(Outcome::Help(text)),
            Ok(Parsed::Arguments(arguments)) => arguments,
            Err(error) => return Err(self.command_failure(schema, error)),
        };

        match schema.callable().call(&arguments) {
            Ok(()) => {
                tracing::debug!("Command '{}' completed", schema.name());
                Ok(Outcome::Completed {
                    command: schema.name().to_string(),
                })
            }
            Err(error) => match error.downcast::<CommandrError>() {
                Ok(error) if error.is_usage() => Err(self.command_failure(schema, error)),
                Ok(error) => Err(DispatchError::Fatal(error.into())),
                Err(error) => Err(DispatchError::Fatal(error)),
            },
        }
    }

    fn parse(&self, schema: &CommandSchema, tokens: Vec<String>) -> Result<Parsed, CommandrError> {
        let matches = match self.build_command(schema).try_get_matches_from(tokens) {
            Ok(matches) => matches,
            Err(error) => {
                return match error.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        Ok(Parsed::Help(error.to_string()))
                    }
                    _ => Err(CommandrError::ArgumentParse {
                        command: schema.name().to_string(),
                        argument: invalid_arg(&error),
                        message: clap_message(&error),
                    }),
                };
            }
        };

        let pipeline = Pipeline::new(schema.name(), self.options.rules());
        let mut positional: VecDeque<String> = matches
            .get_many::<String>(POSITIONAL)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let mut arguments = Arguments::new(schema.name());

        for spec in schema.arguments() {
            let value = if spec.kind().takes_value() {
                let supplied = matches
                    .get_one::<String>(spec.name())
                    .cloned()
                    .or_else(|| positional.pop_front());
                match (supplied, spec.default()) {
                    (Some(text), _) => pipeline.process(spec, RawValue::Text(text))?,
                    (None, Some(default)) => default.clone(),
                    (None, None) => {
                        return Err(CommandrError::argument_parse(
                            schema.name(),
                            spec.name(),
                            format!(
                                "missing required value for '--{}'",
                                spec.flag_name(self.options.is_hyphenated())
                            ),
                        ));
                    }
                }
            } else if matches.get_flag(spec.name()) {
                pipeline.process(spec, RawValue::Present)?
            } else {
                spec.default().cloned().unwrap_or(Value::Bool(false))
            };
            arguments.insert(spec.name(), value);
        }

        if let Some(extra) = positional.pop_front() {
            return Err(CommandrError::ArgumentParse {
                command: schema.name().to_string(),
                argument: None,
                message: format!("unexpected positional value '{extra}'"),
            });
        }

        Ok(Parsed::Arguments(arguments))
    }

    /// The clap command carrying one flag per argument
    fn build_command(&self, schema: &CommandSchema) -> Command {
        let hyphenate = self.options.is_hyphenated();
        let mut command = Command::new(leak(schema.name()))
            .bin_name(format!("{} {}", self.options.program_name(), schema.name()))
            .no_binary_name(true)
            .disable_version_flag(true)
            .about(first_paragraph(schema.summary()));
        if !schema.summary().is_empty() {
            command = command.long_about(schema.summary().to_string());
        }
        if schema.argument("help").is_some() {
            command = command.disable_help_flag(true);
        }

        for spec in schema.arguments() {
            let flag = spec.flag_name(hyphenate);
            let mut help = spec.help().to_string();
            if spec.is_required() {
                help = join_help(&help, "[required]");
            } else if let Some(default) = spec.default().filter(|_| spec.kind().takes_value()) {
                help = join_help(&help, &format!("[default: {}]", render_default(default)));
            }

            let mut arg = Arg::new(leak(spec.name())).long(leak(&flag)).help(help);
            if flag != spec.name() {
                arg = if self.options.shows_all_help_variants() {
                    arg.visible_alias(leak(spec.name()))
                } else {
                    arg.alias(leak(spec.name()))
                };
            }

            arg = if spec.kind().takes_value() {
                arg.action(ArgAction::Set)
                    .num_args(1)
                    .allow_negative_numbers(true)
                    .value_name(leak(&flag.to_uppercase().replace('-', "_")))
            } else {
                arg.action(ArgAction::SetTrue)
            };
            command = command.arg(arg);
        }

        command.arg(
            Arg::new(POSITIONAL)
                .num_args(0..)
                .action(ArgAction::Append)
                .value_name("VALUES")
                .hide(true),
        )
    }

    fn help(&self, rest: &[String]) -> Result<Outcome, DispatchError> {
        match rest.iter().find(|token| !token.starts_with('-')) {
            None => Ok(Outcome::Help(self.listing())),
            Some(name) => {
                let schema = self
                    .registry
                    .resolve(name)
                    .map_err(|error| self.listing_failure(error))?;
                Ok(Outcome::Help(
                    self.build_command(schema).render_long_help().to_string(),
                ))
            }
        }
    }

    /// Help text listing every registered command
    pub fn listing(&self) -> String {
        let program = self.options.program_name();
        let mut command = Command::new(leak(&program))
            .no_binary_name(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .subcommand_value_name("COMMAND")
            .override_usage(format!("{program} <COMMAND> [OPTIONS]"));
        if !self.registry.contains(HELP_COMMAND) {
            command = command.subcommand(
                Command::new(HELP_COMMAND).about("Print this listing or the help of a command"),
            );
        }
        for name in self.registry.names() {
            let about = self
                .registry
                .resolve(name)
                .map(|schema| first_paragraph(schema.summary()))
                .unwrap_or_default();
            command = command.subcommand(Command::new(leak(name)).about(about));
        }
        command.render_help().to_string()
    }

    fn listing_failure(&self, error: CommandrError) -> DispatchError {
        tracing::debug!("Usage error before resolution: {}", error);
        DispatchError::Usage {
            error,
            help: self.listing(),
        }
    }

    fn command_failure(&self, schema: &CommandSchema, error: CommandrError) -> DispatchError {
        tracing::debug!("Usage error in '{}': {}", schema.name(), error);
        DispatchError::Usage {
            error,
            help: self.build_command(schema).render_help().to_string(),
        }
    }
}

fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

fn join_help(help: &str, note: &str) -> String {
    if help.is_empty() {
        note.to_string()
    } else {
        format!("{help} {note}")
    }
}

fn render_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

/// The flag clap complained about, without its value placeholder
fn invalid_arg(error: &clap::Error) -> Option<String> {
    let arg = error.get(ContextKind::InvalidArg)?.to_string();
    arg.split_whitespace().next().map(String::from)
}

/// The first line of a clap error without its `error: ` prefix
fn clap_message(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// clap wants `'static` names; commands are built a handful of times per process
fn leak(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}
