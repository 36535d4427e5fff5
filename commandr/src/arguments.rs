//! Resolved arguments handed to a command body

use crate::error::{CommandrError, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Fully resolved, transformed and validated argument values for one invocation
///
/// Values keep the declaration order of the command's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    command: String,
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Create an empty argument set for `command`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            values: IndexMap::new(),
        }
    }

    /// Add or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`Arguments::insert`]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Name of the command these arguments belong to
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Raw JSON value for `name`
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Typed value for `name`
    ///
    /// A missing argument deserializes from `null`, so `Option<T>` parameters
    /// come back as `None`. A value that does not fit `T` is a
    /// [`CommandrError::ArgumentParse`] naming the argument.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.values.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            CommandrError::argument_parse(
                &self.command,
                name,
                format!("cannot convert value: {e}"),
            )
        })
    }

    /// Iterate name/value pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Conversion of a command body's return value into the dispatcher's outcome
///
/// Success values are discarded; output is the command's own business.
pub trait IntoOutcome {
    fn into_outcome(self) -> anyhow::Result<()>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn into_outcome(self) -> anyhow::Result<()> {
        self.map(|_| ()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_typed_extraction() {
        let args = Arguments::new("greet")
            .with("name", json!("Ana"))
            .with("times", json!(2))
            .with("comma", json!(true))
            .with("extra", json!({"hi": "Aloha", "end": "!"}));

        assert_eq!(args.get::<String>("name").unwrap(), "Ana");
        assert_eq!(args.get::<i64>("times").unwrap(), 2);
        assert_eq!(args.get::<u8>("times").unwrap(), 2);
        assert!(args.get::<bool>("comma").unwrap());
        let extra: BTreeMap<String, String> = args.get("extra").unwrap();
        assert_eq!(extra["hi"], "Aloha");
    }

    #[test]
    fn test_missing_value_is_null() {
        let args = Arguments::new("another_simple_greet");
        assert_eq!(args.get::<Option<String>>("name").unwrap(), None);
        assert!(args.get::<String>("name").is_err());
    }

    #[test]
    fn test_type_mismatch_names_argument() {
        let args = Arguments::new("greet").with("times", json!("lots"));
        let error = args.get::<i64>("times").unwrap_err();
        assert_eq!(error.argument(), Some("times"));
        assert!(error.is_usage());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let args = Arguments::new("greet")
            .with("name", json!("Ana"))
            .with("title", json!("Mr."))
            .with("times", json!(1));
        let names: Vec<&str> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "title", "times"]);
        assert_eq!(args.len(), 3);
        assert_eq!(args.command(), "greet");
    }

    #[test]
    fn test_into_outcome() {
        assert!(().into_outcome().is_ok());
        assert!(Ok::<_, anyhow::Error>(42).into_outcome().is_ok());
        let failed: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        assert_eq!(failed.into_outcome().unwrap_err().to_string(), "disk on fire");
    }
}
