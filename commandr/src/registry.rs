//! Command registry
//!
//! Filled once during start-up, then handed to the
//! [`Dispatcher`](crate::Dispatcher) which only reads from it.

use crate::error::{CommandrError, Result};
use crate::schema::{CommandSchema, CommandSpec};
use indexmap::IndexMap;

/// Mapping from command name to its schema and callable
#[derive(Debug, Default)]
pub struct Registry {
    commands: IndexMap<String, CommandSchema>,
    strict: bool,
}

impl Registry {
    /// A registry where a later registration replaces an earlier one
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that rejects a second registration under the same name
    pub fn strict() -> Self {
        Self {
            commands: IndexMap::new(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Build the schema for `spec` and register it
    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        let schema = spec.build()?;
        self.insert(schema)
    }

    /// Builder form of [`Registry::register`]
    pub fn with(mut self, spec: CommandSpec) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    /// Insert a schema under its own name
    pub fn insert(&mut self, schema: CommandSchema) -> Result<()> {
        let name = schema.name().to_string();
        if self.commands.contains_key(&name) {
            if self.strict {
                return Err(CommandrError::DuplicateCommand { name });
            }
            tracing::warn!("Command '{}' registered twice; keeping the later one", name);
        }

        tracing::debug!("Registered command '{}'", name);
        self.commands.insert(name, schema);
        Ok(())
    }

    /// Look up a command by name
    pub fn resolve(&self, name: &str) -> Result<&CommandSchema> {
        self.commands
            .get(name)
            .ok_or_else(|| CommandrError::UnknownCommand {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Schemas in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CommandSchema> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::signature::{Declared, Parameter, Signature};

    fn spec(function: &str, doc: &str) -> CommandSpec {
        CommandSpec::new(Declared::new(
            Signature::new(function).param(Parameter::required("name")),
            doc,
            |_args: &Arguments| (),
        ))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = Registry::new();
        registry.register(spec("simple_greet", "Say hi.")).unwrap();

        let schema = registry.resolve("simple_greet").unwrap();
        assert_eq!(schema.summary(), "Say hi.");
        assert!(registry.contains("simple_greet"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_command() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("nope").unwrap_err(),
            CommandrError::UnknownCommand {
                name: "nope".to_string()
            }
        );
    }

    #[test_log::test]
    fn test_last_registration_wins() {
        let registry = Registry::new()
            .with(spec("first", "First.").name("greet"))
            .unwrap()
            .with(spec("second", "Second.").name("greet"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("greet").unwrap().summary(), "Second.");
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let mut registry = Registry::strict();
        assert!(registry.is_strict());
        registry.register(spec("first", "First.").name("greet")).unwrap();
        let error = registry
            .register(spec("second", "Second.").name("greet"))
            .unwrap_err();

        assert_eq!(
            error,
            CommandrError::DuplicateCommand {
                name: "greet".to_string()
            }
        );
        assert_eq!(registry.resolve("greet").unwrap().summary(), "First.");
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = Registry::new()
            .with(spec("zeta", ""))
            .unwrap()
            .with(spec("alpha", ""))
            .unwrap();
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        let order: Vec<&str> = registry.iter().map(CommandSchema::name).collect();
        assert_eq!(order, vec!["zeta", "alpha"]);
    }
}
