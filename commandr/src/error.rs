//! Error types for commandr
//!
//! Every failure a user can cause from the command line is a [`CommandrError`].
//! These are "usage class" errors: the dispatcher catches them once, prints a
//! diagnostic next to the offending command's help, and exits non-zero.
//! Anything else a command body returns is treated as fatal and propagated.

use thiserror::Error as ThisError;

/// Result type alias for commandr operations
pub type Result<T> = std::result::Result<T, CommandrError>;

/// Errors raised while registering, resolving, parsing or validating commands
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CommandrError {
    /// The requested command name is not in the registry
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// The name that was requested
        name: String,
    },

    /// A strict registry was asked to register a name twice
    #[error("Command already registered: {name}")]
    DuplicateCommand {
        /// The name registered twice
        name: String,
    },

    /// Unknown flag, missing value, or a raw value that could not be converted
    #[error("{}", describe_parse_error(.command, .argument.as_deref(), .message))]
    ArgumentParse {
        /// Command being parsed
        command: String,
        /// Argument at fault, when one can be named
        argument: Option<String>,
        /// What went wrong
        message: String,
    },

    /// A transformed value was rejected by its validator
    #[error("Invalid value for argument '{argument}' of command '{command}': {reason}")]
    Validation {
        /// Command being validated
        command: String,
        /// Argument whose value was rejected
        argument: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Raised explicitly by a command body through [`usage`]
    #[error("{message}")]
    Usage {
        /// Message shown to the user
        message: String,
    },

    /// A command declaration does not hang together (duplicate parameters,
    /// rules for arguments that do not exist, a callable with no signature)
    #[error("Invalid schema for command '{command}': {message}")]
    InvalidSchema {
        /// Command being registered
        command: String,
        /// What is wrong with it
        message: String,
    },
}

impl CommandrError {
    /// Build an [`CommandrError::ArgumentParse`] naming an argument
    pub fn argument_parse(
        command: impl Into<String>,
        argument: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ArgumentParse {
            command: command.into(),
            argument: Some(argument.into()),
            message: message.into(),
        }
    }

    /// Whether this error is handled at the dispatch boundary as a usage failure
    ///
    /// Registration-time errors are programming mistakes and are not.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand { .. }
                | Self::ArgumentParse { .. }
                | Self::Validation { .. }
                | Self::Usage { .. }
        )
    }

    /// The argument this error is about, if any
    pub fn argument(&self) -> Option<&str> {
        match self {
            Self::ArgumentParse { argument, .. } => argument.as_deref(),
            Self::Validation { argument, .. } => Some(argument),
            _ => None,
        }
    }
}

fn describe_parse_error(command: &str, argument: Option<&str>, message: &str) -> String {
    match argument {
        Some(argument) => {
            format!("Invalid argument '{argument}' for command '{command}': {message}")
        }
        None => format!("Invalid arguments for command '{command}': {message}"),
    }
}

/// Abort the running command with a message
///
/// Return the result from a command body; the dispatcher treats it exactly
/// like a parse or validation failure.
///
/// ```
/// use commandr::usage;
///
/// fn simple_greet(name: String) -> anyhow::Result<()> {
///     if name == "John" {
///         return Err(usage("We don't like John"));
///     }
///     println!("Hi {name}!");
///     Ok(())
/// }
/// # assert!(simple_greet("John".to_string()).is_err());
/// ```
pub fn usage(message: impl Into<String>) -> anyhow::Error {
    CommandrError::Usage {
        message: message.into(),
    }
    .into()
}
