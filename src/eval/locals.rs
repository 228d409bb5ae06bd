use indexmap::IndexMap;

use crate::ast::value::Value;
use crate::error::EvalError;

/// The runtime values a render function is called with.
///
/// With flat addressing (the default) every key is a free identifier in
/// expressions; with scoped addressing the whole mapping is reachable as
/// `locals`.
///
/// ```rust
/// use sugarml_gen::{Locals, Value};
///
/// let mut locals = Locals::new();
/// locals.set("planet", "world");
/// locals.set("count", 3i64);
///
/// let same = Locals::new().with("planet", "world").with("count", 3i64);
/// assert_eq!(locals, same);
///
/// let from_json = Locals::from_json(serde_json::json!({ "planet": "world" })).unwrap();
/// assert_eq!(from_json.get("planet"), Some(&Value::from("world")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    values: IndexMap<String, Value>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. Accepts any type that implements `Into<Value>`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// The whole mapping as one object value, as bound to `locals`.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Build locals from a JSON object. Any other JSON value is rejected.
    pub fn from_json(json: serde_json::Value) -> Result<Self, EvalError> {
        match Value::from(json) {
            Value::Object(values) => Ok(Self { values }),
            other => Err(EvalError::type_error("object for locals", other.type_name())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Locals {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<IndexMap<String, Value>> for Locals {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}
