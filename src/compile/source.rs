//! Render-function source emission.
//!
//! The emitted text is a small statement language (parsed back by
//! `parser::parse_program`):
//!
//! ```text
//! render(locals: flat, runtime: "__runtime") {
//!     write "p(foo=\"bar\") hello ";
//!     write (planet);
//!     attr "checked" {
//!         write (flag);
//!     }
//!     write (cond ? __nodes[0] : __nodes[1]) with {
//!         write "truth";
//!     } {
//!         write "lies";
//!     };
//! }
//! ```
//!
//! Output depends only on the program, so identical trees and options
//! always produce byte-identical source.

use super::{Program, Segment};

const INDENT: &str = "    ";

pub(super) fn emit(program: &Program, scoped_locals: bool, runtime_name: &str) -> String {
    let mode = if scoped_locals { "scoped" } else { "flat" };
    let mut out = format!(
        "render(locals: {mode}, runtime: {}) ",
        quote(runtime_name)
    );
    emit_block(&mut out, program, 0);
    out
}

fn emit_block(out: &mut String, program: &Program, depth: usize) {
    out.push_str("{\n");
    let indent = INDENT.repeat(depth + 1);

    for segment in program.segments() {
        out.push_str(&indent);
        match segment {
            Segment::Text(text) => {
                out.push_str("write ");
                out.push_str(&quote(text));
                out.push_str(";\n");
            }
            Segment::Code(code) => {
                out.push_str("write (");
                out.push_str(&code.source);
                out.push(')');
                if !code.nodes.is_empty() {
                    out.push_str(" with");
                    for node in &code.nodes {
                        out.push(' ');
                        emit_block(out, node, depth + 1);
                    }
                }
                out.push_str(";\n");
            }
            Segment::Attr(attr) => {
                out.push_str("attr ");
                out.push_str(&quote(&attr.name));
                out.push(' ');
                emit_block(out, &attr.value, depth + 1);
                out.push('\n');
            }
        }
    }

    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{AttrSegment, CodeSegment};
    use crate::parser::parse_expr;

    fn code(source: &str, nodes: Vec<Program>) -> Segment {
        Segment::Code(CodeSegment {
            source: source.to_string(),
            expr: parse_expr(source).unwrap(),
            nodes,
        })
    }

    fn text(s: &str) -> Program {
        let mut p = Program::new();
        p.push_text(s);
        p
    }

    #[test]
    fn test_emit_layout() {
        let mut program = Program::new();
        program.push_text("p(foo=\"bar\") hello ");
        program.push(code("planet", Vec::new()));
        program.push(Segment::Attr(AttrSegment {
            name: "checked".to_string(),
            value: {
                let mut v = Program::new();
                v.push(code("flag", Vec::new()));
                v
            },
        }));
        program.push(code(
            "cond ? __nodes[0] : __nodes[1]",
            vec![text("truth"), text("lies")],
        ));

        let expected = r#"render(locals: flat, runtime: "__runtime") {
    write "p(foo=\"bar\") hello ";
    write (planet);
    attr "checked" {
        write (flag);
    }
    write (cond ? __nodes[0] : __nodes[1]) with {
        write "truth";
    } {
        write "lies";
    };
}"#;
        assert_eq!(emit(&program, false, "__runtime"), expected);
    }

    #[test]
    fn test_emit_empty_program() {
        assert_eq!(
            emit(&Program::new(), true, "rt"),
            "render(locals: scoped, runtime: \"rt\") {\n}"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd\te"), r#""a\"b\\c\nd\te""#);
    }
}
