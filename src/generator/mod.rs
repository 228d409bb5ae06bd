//! Tree-to-artifact generation.
//!
//! [`generate`] validates the options, walks the tree once and hands back
//! either a callable [`RenderFunction`] or its source text, depending on
//! `returnString`. Nothing is cached between calls.

use crate::ast::node::Node;
use crate::compile::RenderFunction;
use crate::error::GenerateError;

mod attrs;
pub mod options;
mod walker;

pub use options::{DEFAULT_RUNTIME_NAME, GenerateOptions, SelfClosing, ValidatedOptions};

/// The result of a generation call.
#[derive(Debug, Clone)]
pub enum Artifact {
    Function(RenderFunction),
    /// Render-function source, loadable with [`RenderFunction::from_source`].
    Source(String),
}

impl Artifact {
    pub fn as_function(&self) -> Option<&RenderFunction> {
        match self {
            Artifact::Function(f) => Some(f),
            Artifact::Source(_) => None,
        }
    }

    pub fn as_source(&self) -> Option<&str> {
        match self {
            Artifact::Function(_) => None,
            Artifact::Source(s) => Some(s),
        }
    }
}

/// Generate an artifact from `nodes`.
///
/// ```rust
/// use sugarml_gen::{generate, Artifact, GenerateOptions, Node};
///
/// let tree = vec![Node::from(Node::tag("br"))];
/// let artifact = generate(&tree, &GenerateOptions::new().self_closing("slash")).unwrap();
/// let Artifact::Function(render) = artifact else { unreachable!() };
/// assert_eq!(render.render_default().unwrap(), "br /");
/// ```
pub fn generate(nodes: &[Node], options: &GenerateOptions) -> Result<Artifact, GenerateError> {
    let render = build(nodes, options)?;
    if options.return_string {
        let source = render.to_source();
        tracing::debug!(bytes = source.len(), "generated render-function source");
        Ok(Artifact::Source(source))
    } else {
        tracing::debug!("generated render function");
        Ok(Artifact::Function(render))
    }
}

/// Generate a callable render function, regardless of `returnString`.
pub fn generate_function(
    nodes: &[Node],
    options: &GenerateOptions,
) -> Result<RenderFunction, GenerateError> {
    build(nodes, options)
}

/// Generate render-function source text, regardless of `returnString`.
pub fn generate_source(nodes: &[Node], options: &GenerateOptions) -> Result<String, GenerateError> {
    Ok(build(nodes, options)?.to_source())
}

fn build(nodes: &[Node], options: &GenerateOptions) -> Result<RenderFunction, GenerateError> {
    let options = options.validate()?;
    tracing::debug!(
        nodes = nodes.len(),
        self_closing = options.self_closing.as_str(),
        scoped_locals = options.scoped_locals,
        "generating"
    );

    let mut walker = walker::Walker::new(&options);
    walker.walk_nodes(nodes, 0, false)?;

    Ok(RenderFunction::new(
        walker.finish(),
        options.scoped_locals,
        options.runtime_name,
        options.runtime,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_string_selects_source() {
        let tree = vec![Node::text("hello")];
        let artifact = generate(&tree, &GenerateOptions::new().return_string(true)).unwrap();
        assert_eq!(
            artifact.as_source(),
            Some("render(locals: flat, runtime: \"__runtime\") {\n    write \"hello\";\n}")
        );
        assert!(artifact.as_function().is_none());
    }

    #[test]
    fn test_invalid_option_checked_before_traversal() {
        // The unknown node would fail too, but options are checked first.
        let tree = vec![Node::Unknown {
            node_type: "snargle".to_string(),
        }];
        let err = generate(&tree, &GenerateOptions::new().self_closing("snargle")).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidOption { .. }));
    }

    #[test]
    fn test_source_is_deterministic() {
        let tree: Vec<Node> = vec![
            Node::tag("p")
                .attr("title", Node::code("t"))
                .content(vec![Node::code("x")])
                .into(),
        ];
        let options = GenerateOptions::new();
        assert_eq!(
            generate_source(&tree, &options).unwrap(),
            generate_source(&tree, &options).unwrap()
        );
    }
}
