//! Tag heads: name, `#id`/`.class` shorthand and the attribute list.

use crate::ast::node::{Attributes, Node, TagNode};
use crate::compile::{AttrSegment, Program, Segment};
use crate::error::GenerateError;

use super::options::{SelfClosing, ValidatedOptions};
use super::walker::{Walker, compile_code};

/// Tags that are never written as `name /` even when empty.
pub(super) const ALWAYS_HAS_BODY: &[&str] = &[
    "script", "style", "textarea", "title", "iframe", "template", "canvas", "video", "audio",
    "object",
];

/// Compile the head line of `tag` (without indentation).
pub(super) fn compile_head(tag: &TagNode, options: &ValidatedOptions) -> Result<Program, GenerateError> {
    let mut head = Program::new();
    head.push_text(&tag.name);

    let empty = Attributes::new();
    let attrs = tag.attrs.as_ref().unwrap_or(&empty);

    let id = static_id(attrs);
    if let Some(id) = id {
        head.push_text("#");
        head.push_text(id);
    }
    let classes = static_classes(attrs);
    if let Some(classes) = &classes {
        head.push_text(".");
        head.push_text(&classes.join("."));
    }

    let mut first = true;
    for (name, value) in attrs {
        if (name == "id" && id.is_some()) || (name == "class" && classes.is_some()) {
            continue;
        }
        head.push_text(if first { "(" } else { " " });
        first = false;
        compile_attr(&mut head, name, value, options)?;
    }
    if !first {
        head.push_text(")");
    }

    if tag.is_empty()
        && options.self_closing == SelfClosing::Slash
        && !ALWAYS_HAS_BODY.contains(&tag.name.as_str())
    {
        head.push_text(" /");
    }

    Ok(head)
}

/// `id` qualifies for shorthand when it is one non-empty text node.
fn static_id(attrs: &Attributes) -> Option<&str> {
    match attrs.get("id").map(Vec::as_slice) {
        Some([Node::Text(text)]) if !text.content.is_empty() => Some(&text.content),
        _ => None,
    }
}

/// `class` qualifies for shorthand when it is one text node with at least
/// one token.
fn static_classes(attrs: &Attributes) -> Option<Vec<&str>> {
    match attrs.get("class").map(Vec::as_slice) {
        Some([Node::Text(text)]) => {
            let tokens: Vec<&str> = text.content.split_whitespace().collect();
            (!tokens.is_empty()).then_some(tokens)
        }
        _ => None,
    }
}

fn compile_attr(
    head: &mut Program,
    name: &str,
    value: &[Node],
    options: &ValidatedOptions,
) -> Result<(), GenerateError> {
    let value = compile_attr_value(value, options)?;

    match value.as_static() {
        Some("") => head.push_text(name),
        Some(text) => head.push_text(&format!("{name}=\"{text}\"")),
        None => head.push(Segment::Attr(AttrSegment {
            name: name.to_string(),
            value,
        })),
    }
    Ok(())
}

/// Concatenate the parts of one attribute value.
pub(super) fn compile_attr_value(
    parts: &[Node],
    options: &ValidatedOptions,
) -> Result<Program, GenerateError> {
    let mut value = Program::new();
    for part in parts {
        match part {
            Node::Text(text) => value.push_text(&text.content),
            Node::Code(code) => value.push(Segment::Code(compile_code(code, options)?)),
            // Tolerated: the nested node is written out in its own syntax.
            Node::Tag(_) | Node::Comment(_) => {
                let mut walker = Walker::new(options);
                walker.walk_nodes(std::slice::from_ref(part), 0, false)?;
                value.append(walker.finish());
            }
            Node::Unknown { node_type } => {
                return Err(GenerateError::UnrecognizedNodeType {
                    node_type: node_type.clone(),
                });
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::options::GenerateOptions;

    fn head(tag: TagNode) -> Program {
        compile_head(&tag, &GenerateOptions::default().validate().unwrap()).unwrap()
    }

    fn static_head(tag: TagNode) -> String {
        head(tag).as_static().expect("static head").to_string()
    }

    #[test]
    fn test_plain_name() {
        assert_eq!(static_head(Node::tag("div")), "div");
    }

    #[test]
    fn test_class_tokens_join_with_dots() {
        let tag = Node::tag("div").attr("class", Node::text(" a  b "));
        assert_eq!(static_head(tag), "div.a.b");
    }

    #[test]
    fn test_blank_class_falls_through_to_flag() {
        let tag = Node::tag("div").attr("class", Node::text("   "));
        assert_eq!(static_head(tag), "div(class=\"   \")");
    }

    #[test]
    fn test_empty_id_is_a_flag() {
        let tag = Node::tag("div").attr("id", Node::text(""));
        assert_eq!(static_head(tag), "div(id)");
    }

    #[test]
    fn test_id_and_class_shorthand_with_remaining_list() {
        let tag = Node::tag("a")
            .attr("href", Node::text("/"))
            .attr("class", Node::text("nav"))
            .attr("id", Node::text("home"));
        assert_eq!(static_head(tag), "a#home.nav(href=\"/\")");
    }

    #[test]
    fn test_dynamic_value_stays_a_segment() {
        let tag = Node::tag("div").attr("id", Node::code("id"));
        let program = head(tag);
        assert!(program.as_static().is_none());
        assert!(matches!(
            program.segments(),
            [Segment::Text(open), Segment::Attr(attr), Segment::Text(close)]
                if open == "div(" && attr.name == "id" && close == ")"
        ));
    }

    #[test]
    fn test_unknown_node_in_attribute_fails() {
        let tag = Node::tag("div").attr(
            "x",
            Node::Unknown {
                node_type: "snargle".to_string(),
            },
        );
        let err = compile_head(&tag, &GenerateOptions::default().validate().unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::UnrecognizedNodeType { node_type } if node_type == "snargle"));
    }

    #[test]
    fn test_slash_respects_always_has_body() {
        let options = GenerateOptions::new().self_closing("slash").validate().unwrap();
        let br = compile_head(&Node::tag("br"), &options).unwrap();
        let script = compile_head(&Node::tag("script"), &options).unwrap();
        assert_eq!(br.as_static(), Some("br /"));
        assert_eq!(script.as_static(), Some("script"));
    }
}
