//! The runtime binding: host capabilities callable from expressions.
//!
//! A [`Runtime`] stores named methods. When one is passed through
//! [`GenerateOptions::runtime`](crate::GenerateOptions::runtime),
//! expressions reach it under the configured runtime name, e.g.
//! `__runtime.changeToDoge("cate")`.
//!
//! There are two ways to provide methods:
//!
//! - **Closure-based**: [`ClosureMethod`] for one-off methods.
//! - **Trait-based**: implement [`RuntimeMethod`] directly, or let the
//!   `#[runtime_method]` macro from `sugarml-macros` generate the
//!   implementation (and argument validation) from a function signature.

use std::collections::HashMap;

use crate::ast::value::Value;
use crate::error::{EvalError, EvalErrorKind};

// ── Trait definitions ───────────────────────────────────────────────────

/// A method callable as `<runtimeName>.name(args)` from expressions.
///
/// Methods receive pre-evaluated positional arguments. They are shared
/// between concurrent renders and must not rely on per-call state.
pub trait RuntimeMethod: Send + Sync {
    fn call(&self, args: Vec<Value>) -> Result<Value, EvalError>;

    /// Declare this method's name and parameter expectations.
    fn signature(&self) -> MethodSignature;
}

// ── Signatures ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ParamDef>,
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub expected_type: Option<ValueType>,
    pub required: bool,
}

/// Type tag used in signatures for argument validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Bool,
    Array,
    Object,
    /// Accepts any value type.
    Any,
}

impl ValueType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::String => matches!(value, Value::String(_)),
            ValueType::Number => matches!(value, Value::Number(_)),
            ValueType::Bool => matches!(value, Value::Bool(_)),
            ValueType::Array => matches!(value, Value::Array(_)),
            ValueType::Object => matches!(value, Value::Object(_)),
        }
    }
}

// ── Runtime ─────────────────────────────────────────────────────────────

/// Registered runtime methods, keyed by name.
///
/// ```rust
/// use std::sync::Arc;
/// use sugarml_gen::{generate_function, ClosureMethod, GenerateOptions, Node, Runtime, Value};
///
/// let mut runtime = Runtime::new();
/// runtime.register(ClosureMethod::new("changeToDoge", |_args| Ok(Value::from("doge"))));
///
/// let options = GenerateOptions::new().runtime(Arc::new(runtime));
/// let tree = vec![
///     Node::text("it's a "),
///     Node::code(r#"__runtime.changeToDoge("cate")"#),
///     Node::text("!"),
/// ];
/// let render = generate_function(&tree, &options).unwrap();
/// assert_eq!(render.render_default().unwrap(), "it's a doge!");
/// ```
pub struct Runtime {
    methods: HashMap<String, Box<dyn RuntimeMethod>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register a method. A method with the same name is replaced.
    pub fn register(&mut self, method: impl RuntimeMethod + 'static) {
        let sig = method.signature();
        self.methods.insert(sig.name, Box::new(method));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, method: impl RuntimeMethod + 'static) -> Self {
        self.register(method);
        self
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Dispatch a call. Unregistered names fail with
    /// [`EvalErrorKind::UndefinedMethod`].
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        match self.methods.get(name) {
            Some(method) => method.call(args),
            None => Err(EvalError::new(
                EvalErrorKind::UndefinedMethod,
                format!("runtime method not found: {name}"),
            )),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("Runtime").field("methods", &names).finish()
    }
}

// ── Closure-based convenience wrapper ───────────────────────────────────

/// A [`RuntimeMethod`] backed by a closure.
///
/// ```rust
/// use sugarml_gen::{ClosureMethod, Value};
///
/// let shout = ClosureMethod::new("shout", |args| {
///     let text = args.first().and_then(|v| v.as_string()).unwrap_or("");
///     Ok(Value::String(text.to_uppercase()))
/// });
/// ```
pub struct ClosureMethod<F>
where
    F: Fn(Vec<Value>) -> Result<Value, EvalError> + Send + Sync,
{
    sig: MethodSignature,
    func: F,
}

impl<F> ClosureMethod<F>
where
    F: Fn(Vec<Value>) -> Result<Value, EvalError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            sig: MethodSignature {
                name: name.into(),
                params: Vec::new(),
            },
            func,
        }
    }
}

impl<F> RuntimeMethod for ClosureMethod<F>
where
    F: Fn(Vec<Value>) -> Result<Value, EvalError> + Send + Sync,
{
    fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        (self.func)(args)
    }

    fn signature(&self) -> MethodSignature {
        self.sig.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_call() {
        let runtime = Runtime::new().with(ClosureMethod::new("double", |args| {
            let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::Number(n * 2.0))
        }));
        assert!(runtime.has_method("double"));
        assert_eq!(
            runtime.call("double", vec![Value::Number(21.0)]).unwrap(),
            Value::Number(42.0)
        );
    }

    #[test]
    fn test_missing_method() {
        let err = Runtime::new().call("nope", Vec::new()).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::UndefinedMethod);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut runtime = Runtime::new();
        runtime.register(ClosureMethod::new("v", |_| Ok(Value::from(1i64))));
        runtime.register(ClosureMethod::new("v", |_| Ok(Value::from(2i64))));
        assert_eq!(runtime.call("v", Vec::new()).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_value_type_matches() {
        assert!(ValueType::Any.matches(&Value::Null));
        assert!(ValueType::Object.matches(&Value::Object(Default::default())));
        assert!(!ValueType::String.matches(&Value::Number(1.0)));
    }
}
