//! Compiled render programs and the callable render function.
//!
//! The tree walker lowers a markup tree into a [`Program`]: a flat list
//! of literal text, expression placeholders and dynamic attributes.
//! A [`RenderFunction`] pairs a program with its locals addressing mode and
//! runtime binding, and can be rendered any number of times, from any
//! number of threads.

use std::sync::Arc;

use crate::ast::expr::Expr;
use crate::error::{EvalError, ParseError};
use crate::eval::{Evaluator, Locals};
use crate::parser;
use crate::runtime::Runtime;

mod source;

/// Ordered output segments. Rendering concatenates them.
#[derive(Debug, Clone, Default)]
pub struct Program {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub enum Segment {
    /// Literal output.
    Text(String),
    /// An expression whose string value is spliced in as-is.
    Code(CodeSegment),
    /// An attribute inside a parenthesized list whose value is only known
    /// at render time. Renders `name="value"`, or a bare `name` when the
    /// value comes out empty.
    Attr(AttrSegment),
}

#[derive(Debug, Clone)]
pub struct CodeSegment {
    /// Expression source, exactly as emitted into render-function source.
    pub source: String,
    pub expr: Expr,
    /// Sub-programs addressable as `__nodes[i]`, rendered on demand.
    pub nodes: Vec<Program>,
}

#[derive(Debug, Clone)]
pub struct AttrSegment {
    pub name: String,
    pub value: Program,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append literal text, merging with a preceding text segment.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Text(text) => self.push_text(&text),
            other => self.segments.push(other),
        }
    }

    /// Append every segment of `other`.
    pub fn append(&mut self, other: Program) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    /// The full output if the program has no dynamic segments.
    pub fn as_static(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Text(text)] => Some(text),
            _ => None,
        }
    }
}

/// The callable render artifact.
///
/// ```rust
/// use sugarml_gen::{generate_function, GenerateOptions, Locals, Node};
///
/// let tree = vec![
///     Node::text("hello "),
///     Node::code("planet"),
/// ];
/// let render = generate_function(&tree, &GenerateOptions::default()).unwrap();
///
/// let locals = Locals::new().with("planet", "world");
/// assert_eq!(render.render(&locals).unwrap(), "hello world");
/// ```
#[derive(Clone)]
pub struct RenderFunction {
    program: Program,
    scoped_locals: bool,
    runtime_name: String,
    runtime: Option<Arc<Runtime>>,
}

impl RenderFunction {
    pub(crate) fn new(
        program: Program,
        scoped_locals: bool,
        runtime_name: String,
        runtime: Option<Arc<Runtime>>,
    ) -> Self {
        Self {
            program,
            scoped_locals,
            runtime_name,
            runtime,
        }
    }

    /// Compile render-function source text produced with `returnString`.
    ///
    /// The source names the runtime binding but cannot carry it, so the
    /// caller supplies the runtime the expressions should see.
    pub fn from_source(source: &str, runtime: Option<Arc<Runtime>>) -> Result<Self, Vec<ParseError>> {
        let parsed = parser::parse_program(source)?;
        Ok(Self::new(
            parsed.program,
            parsed.scoped_locals,
            parsed.runtime_name,
            runtime,
        ))
    }

    /// Render with the given locals.
    pub fn render(&self, locals: &Locals) -> Result<String, EvalError> {
        tracing::debug!(locals = locals.len(), scoped = self.scoped_locals, "rendering");
        let evaluator = Evaluator::new(
            locals,
            self.scoped_locals,
            &self.runtime_name,
            self.runtime.as_deref(),
        );
        evaluator.render_program(&self.program)
    }

    /// Render with an empty locals mapping.
    pub fn render_default(&self) -> Result<String, EvalError> {
        self.render(&Locals::new())
    }

    /// Deterministic source text of this function, loadable with
    /// [`from_source`](Self::from_source).
    pub fn to_source(&self) -> String {
        source::emit(&self.program, self.scoped_locals, &self.runtime_name)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn scoped_locals(&self) -> bool {
        self.scoped_locals
    }

    pub fn runtime_name(&self) -> &str {
        &self.runtime_name
    }
}

impl std::fmt::Debug for RenderFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderFunction")
            .field("program", &self.program)
            .field("scoped_locals", &self.scoped_locals)
            .field("runtime_name", &self.runtime_name)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}
