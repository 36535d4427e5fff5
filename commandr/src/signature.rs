//! Callables and their declared signatures
//!
//! Rust has no runtime reflection over function declarations, so a command's
//! parameter list is declared explicitly as a [`Signature`], usually emitted by
//! the `#[command]` attribute macro from the function itself.
//!
//! Cross-cutting wrappers built with [`wraps`] publish the callable they wrap
//! through [`Callable::wrapped`]. [`extract`] follows that chain to the
//! originally declared function so a wrapped command keeps its real
//! parameters instead of the wrapper's generic "anything goes" shape.

use crate::arguments::{Arguments, IntoOutcome};
use crate::error::{CommandrError, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: Option<Value>,
}

impl Parameter {
    /// A parameter with no default value
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a default value (`Value::Null` stands for "none")
    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
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
}

/// A function's declared name and ordered parameter list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    name: String,
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter, keeping declaration order
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// Something the dispatcher can invoke with resolved [`Arguments`]
pub trait Callable: Send + Sync {
    /// Run the callable
    fn call(&self, args: &Arguments) -> anyhow::Result<()>;

    /// Declared identifier, used when no explicit command name is given
    fn name(&self) -> &str;

    /// The parameter list, for callables that declare one
    fn signature(&self) -> Option<&Signature> {
        None
    }

    /// Attached documentation text
    fn doc(&self) -> Option<&str> {
        None
    }

    /// The callable this one wraps, if it is a transparent wrapper
    fn wrapped(&self) -> Option<&dyn Callable> {
        None
    }
}

type Body = dyn Fn(&Arguments) -> anyhow::Result<()> + Send + Sync;
type WrapperBody = dyn Fn(&dyn Callable, &Arguments) -> anyhow::Result<()> + Send + Sync;

/// An originally authored function together with its signature and docs
#[derive(Clone)]
pub struct Declared {
    signature: Signature,
    doc: String,
    body: Arc<Body>,
}

impl Declared {
    pub fn new<F, R>(signature: Signature, doc: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Self {
            signature,
            doc: doc.into(),
            body: Arc::new(move |args: &Arguments| body(args).into_outcome()),
        }
    }
}

impl fmt::Debug for Declared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declared")
            .field("signature", &self.signature)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

impl Callable for Declared {
    fn call(&self, args: &Arguments) -> anyhow::Result<()> {
        (self.body)(args)
    }

    fn name(&self) -> &str {
        self.signature.name()
    }

    fn signature(&self) -> Option<&Signature> {
        Some(&self.signature)
    }

    fn doc(&self) -> Option<&str> {
        Some(&self.doc)
    }
}

/// A cross-cutting layer around another callable
///
/// The wrapper has no signature of its own. Its name and documentation are
/// those of the callable it wraps, and [`Callable::wrapped`] points back at it.
pub struct Wrapper {
    inner: Arc<dyn Callable>,
    body: Box<WrapperBody>,
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("wraps", &self.inner.name())
            .finish_non_exhaustive()
    }
}

impl Callable for Wrapper {
    fn call(&self, args: &Arguments) -> anyhow::Result<()> {
        (self.body)(self.inner.as_ref(), args)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn doc(&self) -> Option<&str> {
        self.inner.doc()
    }

    fn wrapped(&self) -> Option<&dyn Callable> {
        Some(self.inner.as_ref())
    }
}

/// Wrap `inner` with `body`, which receives the inner callable and the arguments
///
/// ```
/// use commandr::{wraps, Arguments, Callable, Declared, Signature, Parameter};
///
/// let declared = Declared::new(
///     Signature::new("decorated").param(Parameter::required("arg1")),
///     "",
///     |_args: &Arguments| (),
/// );
/// let logged = wraps(declared, |inner, args| {
///     println!("Wrapper Here!");
///     inner.call(args)
/// });
/// assert_eq!(logged.name(), "decorated");
/// assert!(logged.wrapped().is_some());
/// ```
pub fn wraps<C, F>(inner: C, body: F) -> Wrapper
where
    C: Callable + 'static,
    F: Fn(&dyn Callable, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Wrapper {
        inner: Arc::new(inner),
        body: Box::new(body),
    }
}

/// Follow the wrapping chain to the originally declared callable
pub fn innermost(callable: &dyn Callable) -> &dyn Callable {
    unwrap_chain(callable).0
}

/// The innermost callable and the number of wrapping layers above it
fn unwrap_chain(callable: &dyn Callable) -> (&dyn Callable, usize) {
    let mut current = callable;
    let mut depth = 0;
    while let Some(inner) = current.wrapped() {
        current = inner;
        depth += 1;
    }
    (current, depth)
}

/// What the extractor learned about a callable
#[derive(Debug, Clone, Copy)]
pub struct ExtractedSignature<'a> {
    /// The declared signature of the innermost callable
    pub signature: &'a Signature,
    /// Documentation of the innermost callable, empty when absent
    pub doc: &'a str,
    /// Whether the callable handed in was itself a wrapper
    pub is_wrapper: bool,
    /// Number of wrapping layers walked through
    pub depth: usize,
}

/// Extract the real parameter list of `callable`, seeing through wrappers
pub fn extract(callable: &dyn Callable) -> Result<ExtractedSignature<'_>> {
    let (current, depth) = unwrap_chain(callable);

    let signature = current
        .signature()
        .ok_or_else(|| CommandrError::InvalidSchema {
            command: current.name().to_string(),
            message: "callable does not declare a signature".to_string(),
        })?;

    tracing::trace!(
        "Extracted signature of '{}' through {} wrapper layer(s)",
        signature.name(),
        depth
    );

    Ok(ExtractedSignature {
        signature,
        doc: current.doc().unwrap_or(""),
        is_wrapper: depth > 0,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn decorated_function() -> Declared {
        Declared::new(
            Signature::new("decorated_function")
                .param(Parameter::required("arg1"))
                .param(Parameter::optional("arg2", json!(1))),
            "An example usage of stacked decorators.",
            |_args: &Arguments| (),
        )
    }

    struct Opaque;

    impl Callable for Opaque {
        fn call(&self, _args: &Arguments) -> anyhow::Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "opaque"
        }
    }

    #[test]
    fn test_extract_declared() {
        let declared = decorated_function();
        let extracted = extract(&declared).unwrap();

        assert!(!extracted.is_wrapper);
        assert_eq!(extracted.depth, 0);
        let names: Vec<&str> = extracted
            .signature
            .parameters()
            .iter()
            .map(Parameter::name)
            .collect();
        assert_eq!(names, vec!["arg1", "arg2"]);
        assert_eq!(extracted.signature.parameters()[1].default(), Some(&json!(1)));
        assert_eq!(extracted.doc, "An example usage of stacked decorators.");
    }

    #[test]
    fn test_extract_sees_through_wrappers() {
        let twice = wraps(
            wraps(decorated_function(), |inner, args| inner.call(args)),
            |inner, args| inner.call(args),
        );

        let extracted = extract(&twice).unwrap();
        assert!(extracted.is_wrapper);
        assert_eq!(extracted.depth, 2);
        assert_eq!(extracted.signature, decorated_function().signature().unwrap());
        assert_eq!(twice.name(), "decorated_function");
        assert!(twice.signature().is_none());
        assert_eq!(innermost(&twice).name(), "decorated_function");
    }

    #[test]
    fn test_innermost_and_extract_agree() {
        let declared = decorated_function();
        assert_eq!(innermost(&declared).name(), "decorated_function");
        assert_eq!(extract(&declared).unwrap().depth, 0);

        let three = wraps(
            wraps(
                wraps(decorated_function(), |inner, args| inner.call(args)),
                |inner, args| inner.call(args),
            ),
            |inner, args| inner.call(args),
        );
        let extracted = extract(&three).unwrap();
        assert_eq!(extracted.depth, 3);
        assert_eq!(
            Some(extracted.signature),
            innermost(&three).signature()
        );
    }

    #[test]
    fn test_wrapper_runs_around_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner_calls = calls.clone();
        let declared = Declared::new(Signature::new("count"), "", move |_args: &Arguments| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
        });
        let outer_calls = calls.clone();
        let wrapper = wraps(declared, move |inner, args| {
            outer_calls.fetch_add(10, Ordering::SeqCst);
            inner.call(args)
        });

        wrapper.call(&Arguments::new("count")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_zero_parameter_signature() {
        let declared = Declared::new(Signature::new("ping"), "", |_args: &Arguments| ());
        let extracted = extract(&declared).unwrap();
        assert!(extracted.signature.parameters().is_empty());
    }

    #[test]
    fn test_undeclared_callable_is_rejected() {
        let error = extract(&Opaque).unwrap_err();
        assert!(matches!(error, CommandrError::InvalidSchema { .. }));
        assert!(extract(&wraps(Opaque, |inner, args| inner.call(args))).is_err());
    }
}
