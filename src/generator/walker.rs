//! Depth-first tree walker that lowers nodes into a [`Program`].
//!
//! Lines are separated by `\n` and indented two spaces per depth level.
//! Text and code flow along the current line; tags and comments start
//! new ones. An inline run that cannot continue a head line is written on
//! its own line behind the `| ` continuation marker.

use crate::ast::node::{CodeNode, Node};
use crate::compile::{CodeSegment, Program, Segment};
use crate::error::GenerateError;
use crate::parser::parse_expr;

use super::attrs::compile_head;
use super::options::ValidatedOptions;

const INDENT: &str = "  ";
const CONTINUATION: &str = "| ";

pub(crate) struct Walker<'o> {
    options: &'o ValidatedOptions,
    program: Program,
    started: bool,
}

/// A sibling list split into what flows and what breaks lines.
enum Item<'n> {
    Inline(&'n [Node]),
    Block(&'n Node),
}

impl<'o> Walker<'o> {
    pub(crate) fn new(options: &'o ValidatedOptions) -> Self {
        Self {
            options,
            program: Program::new(),
            started: false,
        }
    }

    pub(crate) fn finish(self) -> Program {
        self.program
    }

    /// Walk a sibling list. With `in_tag` set, a leading inline run is
    /// appended to the head line that was just written.
    pub(crate) fn walk_nodes(
        &mut self,
        nodes: &[Node],
        depth: usize,
        in_tag: bool,
    ) -> Result<(), GenerateError> {
        let items = split_items(nodes);
        let has_blocks = items.iter().any(|item| matches!(item, Item::Block(_)));

        for (index, item) in items.into_iter().enumerate() {
            match item {
                Item::Inline(run) => {
                    if has_blocks && run.iter().all(Node::is_whitespace_text) {
                        continue;
                    }
                    if index == 0 {
                        if in_tag {
                            self.program.push_text(" ");
                        }
                    } else {
                        self.newline(depth);
                        self.program.push_text(CONTINUATION);
                    }
                    self.started = true;
                    for node in run {
                        self.walk_inline(node)?;
                    }
                }
                Item::Block(node) => self.walk_block(node, depth)?,
            }
        }
        Ok(())
    }

    fn walk_inline(&mut self, node: &Node) -> Result<(), GenerateError> {
        match node {
            Node::Text(text) => self.program.push_text(&text.content),
            Node::Code(code) => {
                let segment = compile_code(code, self.options)?;
                self.program.push(Segment::Code(segment));
            }
            // split_items only puts text and code into runs
            other => self.walk_block(other, 0)?,
        }
        Ok(())
    }

    fn walk_block(&mut self, node: &Node, depth: usize) -> Result<(), GenerateError> {
        match node {
            Node::Tag(tag) => {
                tracing::trace!(tag = %tag.name, depth, "visiting tag");
                let head = compile_head(tag, self.options)?;
                self.newline(depth);
                self.program.append(head);
                if !tag.is_empty()
                    && let Some(content) = &tag.content
                {
                    self.walk_nodes(content, depth + 1, true)?;
                }
            }
            Node::Comment(comment) => {
                self.newline(depth);
                self.program.push_text("// ");
                self.program.push_text(&comment.content);
            }
            Node::Unknown { node_type } => {
                return Err(GenerateError::UnrecognizedNodeType {
                    node_type: node_type.clone(),
                });
            }
            Node::Text(_) | Node::Code(_) => self.walk_inline(node)?,
        }
        Ok(())
    }

    fn newline(&mut self, depth: usize) {
        if self.started {
            self.program.push_text("\n");
        }
        self.program.push_text(&INDENT.repeat(depth));
        self.started = true;
    }
}

fn split_items(nodes: &[Node]) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    let mut run_start = None;

    for (i, node) in nodes.iter().enumerate() {
        if node.is_inline() {
            run_start.get_or_insert(i);
        } else {
            if let Some(start) = run_start.take() {
                items.push(Item::Inline(&nodes[start..i]));
            }
            items.push(Item::Block(node));
        }
    }
    if let Some(start) = run_start {
        items.push(Item::Inline(&nodes[start..]));
    }
    items
}

/// Parse a code node and compile each of its side nodes into its own
/// program.
pub(crate) fn compile_code(
    code: &CodeNode,
    options: &ValidatedOptions,
) -> Result<CodeSegment, GenerateError> {
    let source = code.content.trim();
    let expr = parse_expr(source).map_err(|source_err| GenerateError::InvalidExpression {
        expression: source.to_string(),
        source: source_err,
    })?;

    let nodes = code
        .nodes
        .iter()
        .flatten()
        .map(|node| {
            let mut walker = Walker::new(options);
            walker.walk_nodes(std::slice::from_ref(node), 0, false)?;
            Ok(walker.finish())
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;

    Ok(CodeSegment {
        source: source.to_string(),
        expr,
        nodes,
    })
}
