//! Syntax trees consumed and produced by sugarml-gen.
//!
//! There are two layers:
//!
//! - **Markup layer** ([`node`]): the tag/text/code/comment tree handed
//!   over by the upstream parser. The generator walks it once.
//! - **Expression layer** ([`expr`]): the parsed form of a code node's
//!   `content`, evaluated against locals at render time. Results are
//!   coerced to strings only when spliced into the output.

pub mod expr;
pub mod node;
pub mod span;
pub mod value;

pub use expr::*;
pub use node::{Attributes, CodeNode, CommentNode, Node, TagNode, TextNode};
pub use span::{Span, Spanned};
pub use value::Value;
