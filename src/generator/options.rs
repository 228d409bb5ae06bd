use std::sync::Arc;

use serde::Deserialize;

use crate::error::GenerateError;
use crate::runtime::Runtime;

/// Default name of the runtime binding inside expressions.
pub const DEFAULT_RUNTIME_NAME: &str = "__runtime";

/// Configuration for one generation call.
///
/// Create with [`GenerateOptions::new()`] and chain builder methods, or
/// load the serializable part from JSON:
///
/// ```rust
/// use sugarml_gen::GenerateOptions;
///
/// let opts = GenerateOptions::new()
///     .self_closing("slash")
///     .scoped_locals(true);
///
/// let from_host = GenerateOptions::from_json(
///     r#"{ "selfClosing": "slash", "scopedLocals": true }"#,
/// ).unwrap();
/// assert_eq!(from_host.self_closing, opts.self_closing);
/// ```
///
/// `selfClosing` is kept as the raw string the host supplied; it is
/// checked by [`validate`](Self::validate) at the start of every
/// generation call.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Identifier the runtime binding is exposed under.
    pub runtime_name: String,

    /// One of `close`, `tag` or `slash`.
    pub self_closing: String,

    /// Produce render-function source text instead of a callable.
    pub return_string: bool,

    /// Expose locals only through a single `locals` object.
    pub scoped_locals: bool,

    /// Host capabilities reachable from expressions. Never read from
    /// global state; each call gets exactly what is passed here.
    #[serde(skip)]
    pub runtime: Option<Arc<Runtime>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            runtime_name: DEFAULT_RUNTIME_NAME.to_string(),
            self_closing: SelfClosing::Tag.as_str().to_string(),
            return_string: false,
            scoped_locals: false,
            runtime: None,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the serializable options from a JSON object. Missing fields
    /// take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn runtime_name(mut self, name: impl Into<String>) -> Self {
        self.runtime_name = name.into();
        self
    }

    pub fn self_closing(mut self, mode: impl Into<String>) -> Self {
        self.self_closing = mode.into();
        self
    }

    pub fn return_string(mut self, enabled: bool) -> Self {
        self.return_string = enabled;
        self
    }

    pub fn scoped_locals(mut self, enabled: bool) -> Self {
        self.scoped_locals = enabled;
        self
    }

    pub fn runtime(mut self, runtime: Arc<Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Check enumerated options before any traversal work.
    pub fn validate(&self) -> Result<ValidatedOptions, GenerateError> {
        let self_closing = self.self_closing.parse()?;
        Ok(ValidatedOptions {
            runtime_name: self.runtime_name.clone(),
            self_closing,
            return_string: self.return_string,
            scoped_locals: self.scoped_locals,
            runtime: self.runtime.clone(),
        })
    }
}

impl std::fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("runtime_name", &self.runtime_name)
            .field("self_closing", &self.self_closing)
            .field("return_string", &self.return_string)
            .field("scoped_locals", &self.scoped_locals)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// How a tag without body content is written.
///
/// `Tag` and `Close` currently produce identical output; both are
/// accepted because hosts configure them by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfClosing {
    /// `br`
    Tag,
    /// `br`
    Close,
    /// `br /`
    Slash,
}

impl SelfClosing {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelfClosing::Tag => "tag",
            SelfClosing::Close => "close",
            SelfClosing::Slash => "slash",
        }
    }
}

impl std::str::FromStr for SelfClosing {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tag" => Ok(SelfClosing::Tag),
            "close" => Ok(SelfClosing::Close),
            "slash" => Ok(SelfClosing::Slash),
            other => Err(GenerateError::InvalidOption {
                option: "selfClosing",
                value: other.to_string(),
                allowed: "'close', 'tag', or 'slash'",
            }),
        }
    }
}

/// Options after validation, as used by the walker.
#[derive(Clone)]
pub struct ValidatedOptions {
    pub runtime_name: String,
    pub self_closing: SelfClosing,
    pub return_string: bool,
    pub scoped_locals: bool,
    pub runtime: Option<Arc<Runtime>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GenerateOptions::default().validate().unwrap();
        assert_eq!(opts.runtime_name, "__runtime");
        assert_eq!(opts.self_closing, SelfClosing::Tag);
        assert!(!opts.return_string);
        assert!(!opts.scoped_locals);
        assert!(opts.runtime.is_none());
    }

    #[test]
    fn test_all_self_closing_modes_validate() {
        for (raw, mode) in [
            ("tag", SelfClosing::Tag),
            ("close", SelfClosing::Close),
            ("slash", SelfClosing::Slash),
        ] {
            let opts = GenerateOptions::new().self_closing(raw).validate().unwrap();
            assert_eq!(opts.self_closing, mode);
        }
    }

    #[test]
    fn test_invalid_self_closing() {
        let err = GenerateOptions::new()
            .self_closing("snargle")
            .validate()
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "'snargle' is an invalid option for 'selfClosing'. You can use 'close', 'tag', or 'slash'"
        );
    }

    #[test]
    fn test_from_json_partial() {
        let opts = GenerateOptions::from_json(r#"{ "runtimeName": "__funtime__" }"#).unwrap();
        assert_eq!(opts.runtime_name, "__funtime__");
        assert_eq!(opts.self_closing, "tag");
    }

    #[test]
    fn test_from_json_invalid_value_fails_validation_not_parsing() {
        let opts = GenerateOptions::from_json(r#"{ "selfClosing": "snargle" }"#).unwrap();
        assert!(matches!(
            opts.validate(),
            Err(GenerateError::InvalidOption { value, .. }) if value == "snargle"
        ));
    }
}
