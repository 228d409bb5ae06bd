//! # sugarml-gen
//!
//! Code generator for sugarml, the whitespace-significant markup syntax.
//! It takes the tag/text/code/comment tree produced by an upstream parser
//! and turns it back into indented sugarml text, packaged as a render
//! function that resolves embedded expressions against caller-supplied
//! locals.
//!
//! The crate is split into two phases:
//!
//! - **Generation** ([`generate`]) validates options and walks the tree
//!   once, producing a [`RenderFunction`] or, with `returnString`, the
//!   source text of one.
//! - **Rendering** ([`RenderFunction::render`]) evaluates the embedded
//!   expressions against [`Locals`] and an optional host [`Runtime`].
//!
//! ## Quick start
//!
//! ```rust
//! use sugarml_gen::{render, GenerateOptions, Locals, Node};
//!
//! let tree: Vec<Node> = vec![
//!     Node::tag("p")
//!         .attr("foo", Node::text("bar"))
//!         .content(vec![Node::text("hello "), Node::code("planet"), Node::text("!")])
//!         .into(),
//! ];
//! let locals = Locals::new().with("planet", "world");
//! let output = render(&tree, &GenerateOptions::default(), &locals).unwrap();
//! assert_eq!(output, "p(foo=\"bar\") hello world!");
//! ```
//!
//! ## Generate once, render many times
//!
//! ```rust
//! use sugarml_gen::{generate_function, parse_nodes_json, GenerateOptions, Locals};
//!
//! let tree = parse_nodes_json(r#"[
//!     { "type": "tag", "name": "div", "attrs": { "id": { "type": "code", "content": "id" } } }
//! ]"#).unwrap();
//! let render = generate_function(&tree, &GenerateOptions::default()).unwrap();
//!
//! assert_eq!(render.render(&Locals::new().with("id", "a")).unwrap(), "div(id=\"a\")");
//! assert_eq!(render.render(&Locals::new().with("id", "b")).unwrap(), "div(id=\"b\")");
//! ```
//!
//! ## Source artifacts
//!
//! With `returnString`, the generator returns deterministic source text
//! that [`RenderFunction::from_source`] compiles back:
//!
//! ```rust
//! use sugarml_gen::{generate_source, GenerateOptions, Node, RenderFunction};
//!
//! let source = generate_source(&[Node::text("hello")], &GenerateOptions::default()).unwrap();
//! let render = RenderFunction::from_source(&source, None).unwrap();
//! assert_eq!(render.render_default().unwrap(), "hello");
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod eval;
pub mod generator;
mod parser;
pub mod runtime;

pub use ast::node::{Attributes, CodeNode, CommentNode, Node, TagNode, TextNode};
pub use ast::span::{Span, Spanned};
pub use ast::value::Value;
pub use compile::RenderFunction;
pub use error::{EvalError, EvalErrorKind, GenerateError, ParseError};
pub use eval::Locals;
pub use generator::{
    Artifact, GenerateOptions, SelfClosing, generate, generate_function, generate_source,
};
pub use parser::parse_expr;
pub use runtime::{ClosureMethod, MethodSignature, ParamDef, Runtime, RuntimeMethod, ValueType};

use thiserror::Error;

/// Generate a render function and call it once.
///
/// `returnString` is ignored; the output is always rendered text.
pub fn render(
    nodes: &[Node],
    options: &GenerateOptions,
    locals: &Locals,
) -> Result<String, RenderError> {
    let function = generate_function(nodes, options)?;
    Ok(function.render(locals)?)
}

/// Load a node list from the upstream parser's JSON output.
pub fn parse_nodes_json(json: &str) -> Result<Vec<Node>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Combined error type returned by [`render`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
