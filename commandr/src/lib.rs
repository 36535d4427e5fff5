//! # commandr
//!
//! Turn plain functions into command-line subcommands.
//!
//! A function's parameters become flags, its documentation becomes help text,
//! and per-argument rules transform and validate what the user typed before
//! the function ever runs.
//!
//! ## Example
//!
//! ```ignore
//! use commandr::{command, logging, Dispatcher, Registry, RunOptions};
//!
//! /// Greet someone.
//! ///
//! /// Arguments:
//! ///   name - Name to greet.
//! ///   times - Number of times to say the greeting.
//! #[command("greet", validate(name = ["Kevin", "Nick"]))]
//! fn say_greeting(name: String, #[arg(default = 1)] times: i64) {
//!     for _ in 0..times {
//!         println!("Hello, {name}!");
//!     }
//! }
//!
//! fn main() -> anyhow::Result<std::process::ExitCode> {
//!     logging::init();
//!     let registry = Registry::new().with(say_greeting_command())?;
//!     Dispatcher::new(registry, RunOptions::new().hyphenate(true)).run()
//! }
//! ```
//!
//! Without the macro, a [`Declared`] callable carries an explicit
//! [`Signature`] and is registered through a [`CommandSpec`].

mod arguments;
mod config;
mod dispatcher;
mod documentation;
mod error;
pub mod exit_codes;
pub mod logging;
mod pipeline;
mod registry;
mod schema;
mod signature;

pub use arguments::{Arguments, IntoOutcome};
pub use config::RunOptions;
pub use dispatcher::{DispatchError, Dispatcher, Outcome};
pub use documentation::{first_paragraph, Documentation};
pub use error::{usage, CommandrError, Result};
pub use pipeline::{Pipeline, RawValue, RuleSet, Transformer, Validator};
pub use registry::Registry;
pub use schema::{ArgumentKind, ArgumentSpec, CommandSchema, CommandSpec};
pub use signature::{
    extract, innermost, wraps, Callable, Declared, ExtractedSignature, Parameter, Signature,
    Wrapper,
};

// Re-export the attribute macro
pub use commandr_macros::command;

// Re-exported for generated code and command implementations
pub use anyhow;
pub use serde_json::{json, Value};
