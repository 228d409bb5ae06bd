//! Error types for generation, parsing and rendering.
//!
//! [`GenerateError`] is returned while turning a tree into an artifact and
//! is always raised before any artifact exists. [`ParseError`] carries
//! source spans for expression and program syntax problems.
//! [`EvalError`] is produced when a render function runs and can originate
//! from the evaluator or from a host [`Runtime`](crate::Runtime) method.

use crate::ast::span::Span;
use std::sync::Arc;
use thiserror::Error;

// ── Generation errors ───────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// An enumerated option carries a value outside its legal set.
    #[error("'{value}' is an invalid option for '{option}'. You can use {allowed}")]
    InvalidOption {
        option: &'static str,
        value: String,
        allowed: &'static str,
    },

    /// A node's `type` discriminator is not one of tag/text/code/comment.
    #[error("unrecognized node type: '{node_type}'")]
    UnrecognizedNodeType { node_type: String },

    /// A code node's content does not parse as an expression.
    #[error("invalid expression `{expression}`: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: ParseError,
    },
}

// ── Parse errors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with a caret line under the offending source.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let source_line = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
        let width = self.span.slice(source).chars().count().max(1);
        let pointer = " ".repeat(col.saturating_sub(1)) + &"^".repeat(width);

        let mut output = format!(
            "Error: {}\n --> {line}:{col}\n  |\n{line:>3} | {source_line}\n    | {pointer}",
            self.message
        );

        if let Some(hint) = &self.hint {
            output.push_str(&format!("\n  = hint: {hint}"));
        }

        output
    }
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

// ── Eval errors ─────────────────────────────────────────────────────────

/// An error raised while a render function runs.
///
/// Carries a structured [`EvalErrorKind`], a human-readable message, an
/// optional [`Span`] into the failing expression, and an optional
/// underlying cause.
///
/// Runtime methods that wrap fallible host work can keep the original
/// error with [`with_source`](EvalError::with_source):
///
/// ```rust
/// use sugarml_gen::EvalError;
///
/// fn lookup() -> Result<(), EvalError> {
///     let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
///     Err(EvalError::host_error("failed to load partial").with_source(io_err))
/// }
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
    pub message: String,
    /// Wrapped in `Arc` so that `EvalError` remains `Clone`.
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            span: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the span only if none has been recorded closer to the failure.
    pub fn or_span(self, span: Span) -> Self {
        if self.span.is_none() {
            self.with_span(span)
        } else {
            self
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UndefinedVariable,
            format!("{name} is not defined"),
        )
    }

    pub fn undefined_method(runtime: &str, name: &str) -> Self {
        Self::new(
            EvalErrorKind::UndefinedMethod,
            format!("{runtime}.{name} is not a function"),
        )
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(
            EvalErrorKind::TypeError,
            format!("expected {expected}, got {got}"),
        )
    }

    pub fn host_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::HostError, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    UndefinedVariable,
    UndefinedMethod,
    TypeError,
    HostError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_message() {
        let err = GenerateError::InvalidOption {
            option: "selfClosing",
            value: "snargle".to_string(),
            allowed: "'close', 'tag', or 'slash'",
        };
        assert_eq!(
            err.to_string(),
            "'snargle' is an invalid option for 'selfClosing'. You can use 'close', 'tag', or 'slash'"
        );
    }

    #[test]
    fn test_format_with_source_points_at_span() {
        let err = ParseError::new(Span::new(4, 7), "unexpected token").with_hint("close the paren");
        let formatted = err.format_with_source("a + )))");
        assert!(formatted.contains(" --> 1:5"));
        assert!(formatted.contains("    ^^^"));
        assert!(formatted.ends_with("= hint: close the paren"));
    }
}
