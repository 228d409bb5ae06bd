use indexmap::IndexMap;
use serde::Deserialize;

/// Attribute name to value nodes, in declaration order.
///
/// Each value is one or more `text`/`code` nodes whose rendered parts are
/// concatenated. Insertion order is the render order, which is why this is
/// an [`IndexMap`] rather than a hash map.
pub type Attributes = IndexMap<String, Vec<Node>>;

/// One node of the markup tree handed over by the parser.
///
/// Nodes deserialize from the parser's JSON shape:
///
/// ```rust
/// use sugarml_gen::Node;
///
/// let node: Node = serde_json::from_str(r#"{
///     "type": "tag",
///     "name": "p",
///     "attrs": { "class": { "type": "text", "content": "intro" } },
///     "content": [{ "type": "text", "content": "hello" }]
/// }"#).unwrap();
/// assert!(matches!(node, Node::Tag(_)));
/// ```
///
/// A `type` discriminator this crate does not know becomes
/// [`Node::Unknown`] rather than a deserialization failure; the generator
/// rejects it when it reaches it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub enum Node {
    Tag(TagNode),
    Text(TextNode),
    Code(CodeNode),
    Comment(CommentNode),
    Unknown { node_type: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagNode {
    pub name: String,
    pub attrs: Option<Attributes>,
    pub content: Option<Vec<Node>>,
}

/// Literal text, emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
}

/// An embedded expression evaluated at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeNode {
    /// Expression source.
    pub content: String,
    /// Raw sub-trees exposed to the expression as `__nodes[i]`.
    pub nodes: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub content: String,
}

impl Node {
    pub fn tag(name: impl Into<String>) -> TagNode {
        TagNode {
            name: name.into(),
            attrs: None,
            content: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Node {
        Node::Text(TextNode {
            content: content.into(),
        })
    }

    pub fn code(content: impl Into<String>) -> Node {
        Node::Code(CodeNode {
            content: content.into(),
            nodes: None,
        })
    }

    /// A code node whose expression can address `nodes` through `__nodes`.
    pub fn code_with_nodes(content: impl Into<String>, nodes: Vec<Node>) -> Node {
        Node::Code(CodeNode {
            content: content.into(),
            nodes: Some(nodes),
        })
    }

    pub fn comment(content: impl Into<String>) -> Node {
        Node::Comment(CommentNode {
            content: content.into(),
        })
    }

    /// The `type` discriminator this node was (or would be) serialized with.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Tag(_) => "tag",
            Node::Text(_) => "text",
            Node::Code(_) => "code",
            Node::Comment(_) => "comment",
            Node::Unknown { node_type } => node_type,
        }
    }

    /// Text and code nodes flow along a line; everything else starts one.
    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Text(_) | Node::Code(_))
    }

    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.content.trim().is_empty())
    }
}

impl TagNode {
    /// Append an attribute with a single value node.
    pub fn attr(self, name: impl Into<String>, value: Node) -> Self {
        self.attr_parts(name, vec![value])
    }

    /// Append an attribute whose value is the concatenation of `parts`.
    pub fn attr_parts(mut self, name: impl Into<String>, parts: Vec<Node>) -> Self {
        self.attrs
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), parts);
        self
    }

    pub fn content(mut self, content: Vec<Node>) -> Self {
        self.content = Some(content);
        self
    }

    /// True when the tag has nothing to nest: no content, or only
    /// whitespace text.
    pub fn is_empty(&self) -> bool {
        self.content
            .as_deref()
            .is_none_or(|nodes| nodes.iter().all(Node::is_whitespace_text))
    }
}

impl From<TagNode> for Node {
    fn from(tag: TagNode) -> Self {
        Node::Tag(tag)
    }
}

// ── Wire format ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    attrs: Option<IndexMap<String, OneOrMany>>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    nodes: Option<Vec<Node>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Nodes(Vec<Node>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Node),
    Many(Vec<Node>),
}

impl From<OneOrMany> for Vec<Node> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(node) => vec![node],
            OneOrMany::Many(nodes) => nodes,
        }
    }
}

impl RawContent {
    fn into_text(self) -> String {
        match self {
            RawContent::Text(s) => s,
            RawContent::Nodes(_) => String::new(),
        }
    }

    fn into_nodes(self) -> Vec<Node> {
        match self {
            RawContent::Text(s) => vec![Node::text(s)],
            RawContent::Nodes(nodes) => nodes,
        }
    }
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let text = |content: Option<RawContent>| content.map(RawContent::into_text).unwrap_or_default();

        match raw.node_type.as_str() {
            "tag" => Node::Tag(TagNode {
                name: raw.name.unwrap_or_default(),
                attrs: raw.attrs.map(|attrs| {
                    attrs
                        .into_iter()
                        .map(|(name, value)| (name, Vec::from(value)))
                        .collect()
                }),
                content: raw.content.map(RawContent::into_nodes),
            }),
            "text" => Node::Text(TextNode {
                content: text(raw.content),
            }),
            "code" => Node::Code(CodeNode {
                content: text(raw.content),
                nodes: raw.nodes,
            }),
            "comment" => Node::Comment(CommentNode {
                content: text(raw.content),
            }),
            _ => Node::Unknown {
                node_type: raw.node_type,
            },
        }
    }
}
