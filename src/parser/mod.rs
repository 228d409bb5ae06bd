//! Expression and program parser, built on [pest](https://pest.rs/).
//!
//! The grammar is defined in `sugarml.pest`. This module converts pest's
//! parse tree into the typed expression AST in [`crate::ast`] and, for
//! render-function source text, into a compiled [`Program`].

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;

use crate::ast::expr::*;
use crate::ast::span::{Span, Spanned};
use crate::ast::value::Value;
use crate::compile::{AttrSegment, CodeSegment, Program, Segment};
use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "parser/sugarml.pest"]
struct SugarmlParser;

/// Parse a code node's content into an expression.
///
/// Spans in the returned AST (and in the error) are byte offsets into
/// `source`.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let mut pairs = SugarmlParser::parse(Rule::expression, source).map_err(pest_error)?;
    let expression = child(&mut pairs, Span::new(0, source.len()))?;
    let span = pair_span(&expression);
    let expr = child(&mut expression.into_inner(), span)?;
    build_expr(expr)
}

/// A render function recovered from its source text.
pub(crate) struct ParsedProgram {
    pub scoped_locals: bool,
    pub runtime_name: String,
    pub program: Program,
}

/// Parse render-function source text (see [`crate::RenderFunction::to_source`]).
pub(crate) fn parse_program(source: &str) -> Result<ParsedProgram, Vec<ParseError>> {
    let mut pairs =
        SugarmlParser::parse(Rule::program, source).map_err(|e| vec![pest_error(e)])?;
    build_program(child(&mut pairs, Span::new(0, source.len())).map_err(|e| vec![e])?)
        .map_err(|e| vec![e])
}

fn pest_error(e: pest::error::Error<Rule>) -> ParseError {
    let span = match &e.location {
        pest::error::InputLocation::Pos(p) => Span::new(*p, *p + 1),
        pest::error::InputLocation::Span((s, e)) => Span::new(*s, *e),
    };
    ParseError::new(span, format!("parse error: {}", e.variant.message()))
}

fn pair_span(pair: &Pair<Rule>) -> Span {
    let s = pair.as_span();
    Span::new(s.start(), s.end())
}

/// Next child of a pair the grammar guarantees to be present.
fn child<'i>(pairs: &mut Pairs<'i, Rule>, span: Span) -> Result<Pair<'i, Rule>, ParseError> {
    pairs
        .next()
        .ok_or_else(|| ParseError::new(span, "malformed parse tree: missing child"))
}

// -- Expression building -------------------------------------------------

fn build_expr(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair_span(&pair);
    let mut inner = pair.into_inner();
    let test = build_binary(child(&mut inner, span)?)?;

    let Some(consequent) = inner.next() else {
        return Ok(test);
    };
    let alternate = child(&mut inner, span)?;

    Ok(Spanned::new(
        ExprKind::Conditional {
            test: Box::new(test),
            consequent: Box::new(build_expr(consequent)?),
            alternate: Box::new(build_expr(alternate)?),
        },
        span,
    ))
}

fn build_binary(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair_span(&pair);
    let mut inner = pair.into_inner();
    let first = build_unary(child(&mut inner, span)?)?;

    let mut rest: Vec<(BinOp, Expr)> = Vec::new();
    while let Some(op_pair) = inner.next() {
        let op = parse_bin_op(op_pair.as_str()).ok_or_else(|| {
            ParseError::new(
                pair_span(&op_pair),
                format!("unknown operator: {}", op_pair.as_str()),
            )
        })?;
        let right = build_unary(child(&mut inner, span)?)?;
        rest.push((op, right));
    }

    let mut rest = rest.into_iter().peekable();
    Ok(climb(first, &mut rest, 0))
}

/// Precedence climbing over a flat `operand (op operand)*` list. All
/// binary operators are left-associative.
fn climb(
    mut left: Expr,
    rest: &mut std::iter::Peekable<std::vec::IntoIter<(BinOp, Expr)>>,
    min_prec: u8,
) -> Expr {
    while let Some((op, mut right)) = rest.next_if(|(op, _)| op.precedence() >= min_prec) {
        while rest
            .peek()
            .is_some_and(|(next, _)| next.precedence() > op.precedence())
        {
            right = climb(right, rest, op.precedence() + 1);
        }
        let span = left.span.merge(right.span);
        left = Spanned::new(
            ExprKind::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        );
    }
    left
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair_span(&pair);
    let mut ops = Vec::new();
    let mut operand = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::unary_op => ops.push(match inner.as_str() {
                "!" => UnaryOp::Not,
                _ => UnaryOp::Neg,
            }),
            _ => operand = Some(build_postfix(inner)?),
        }
    }

    let mut expr =
        operand.ok_or_else(|| ParseError::new(span, "malformed parse tree: missing operand"))?;
    for op in ops.into_iter().rev() {
        expr = Spanned::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(expr),
            },
            span,
        );
    }
    Ok(expr)
}

fn build_postfix(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair_span(&pair);
    let mut inner = pair.into_inner();
    let mut expr = build_primary(child(&mut inner, span)?)?;

    for op in inner {
        let merged = expr.span.merge(pair_span(&op));
        let kind = match op.as_rule() {
            Rule::member => {
                let property = child(&mut op.into_inner(), merged)?.as_str().to_string();
                ExprKind::Member {
                    object: Box::new(expr),
                    property,
                }
            }
            Rule::index => {
                let index = build_expr(child(&mut op.into_inner(), merged)?)?;
                ExprKind::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                }
            }
            Rule::call => {
                let args = op
                    .into_inner()
                    .map(build_expr)
                    .collect::<Result<Vec<_>, _>>()?;
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                }
            }
            rule => {
                return Err(ParseError::new(
                    merged,
                    format!("unexpected rule in postfix position: {rule:?}"),
                ));
            }
        };
        expr = Spanned::new(kind, merged);
    }

    Ok(expr)
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair_span(&pair);
    let rule = pair.as_rule();

    match rule {
        Rule::expr => build_expr(pair),
        Rule::identifier => Ok(Spanned::new(
            ExprKind::Identifier(pair.as_str().to_string()),
            span,
        )),
        Rule::string => {
            let s = extract_string_content(pair);
            Ok(Spanned::new(ExprKind::Literal(Value::String(s)), span))
        }
        Rule::number => {
            let n: f64 = pair
                .as_str()
                .parse()
                .map_err(|_| ParseError::new(span, format!("invalid number: {}", pair.as_str())))?;
            Ok(Spanned::new(ExprKind::Literal(Value::Number(n)), span))
        }
        Rule::bool_literal => {
            let b = pair.as_str() == "true";
            Ok(Spanned::new(ExprKind::Literal(Value::Bool(b)), span))
        }
        Rule::null_literal => Ok(Spanned::new(ExprKind::Literal(Value::Null), span)),
        Rule::array_literal => {
            let elements = pair
                .into_inner()
                .map(build_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Spanned::new(ExprKind::ArrayLiteral(elements), span))
        }
        _ => Err(ParseError::new(
            span,
            format!("unexpected rule in atom position: {rule:?}"),
        )),
    }
}

// -- Program building ----------------------------------------------------

fn build_program(pair: Pair<Rule>) -> Result<ParsedProgram, ParseError> {
    let span = pair_span(&pair);
    let mut inner = pair.into_inner();

    let header = child(&mut inner, span)?;
    let mut header_inner = header.into_inner();
    let scoped_locals = child(&mut header_inner, span)?.as_str() == "scoped";
    let runtime_name = extract_string_content(child(&mut header_inner, span)?);

    let program = build_block(child(&mut inner, span)?)?;

    Ok(ParsedProgram {
        scoped_locals,
        runtime_name,
        program,
    })
}

fn build_block(pair: Pair<Rule>) -> Result<Program, ParseError> {
    let mut program = Program::new();

    for statement in pair.into_inner() {
        let span = pair_span(&statement);
        match statement.as_rule() {
            Rule::write_text => {
                let text = extract_string_content(child(&mut statement.into_inner(), span)?);
                program.push_text(&text);
            }
            Rule::write_code => {
                let mut inner = statement.into_inner();
                let expr_pair = child(&mut inner, span)?;
                let source = expr_pair.as_str().trim().to_string();
                // Reparse standalone so spans are relative to the expression.
                let expr = parse_expr(&source)?;
                let nodes = match inner.next() {
                    Some(side) => side
                        .into_inner()
                        .map(build_block)
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                program.push(Segment::Code(CodeSegment {
                    source,
                    expr,
                    nodes,
                }));
            }
            Rule::attr_stmt => {
                let mut inner = statement.into_inner();
                let name = extract_string_content(child(&mut inner, span)?);
                let value = build_block(child(&mut inner, span)?)?;
                program.push(Segment::Attr(AttrSegment { name, value }));
            }
            rule => {
                return Err(ParseError::new(
                    span,
                    format!("unexpected statement: {rule:?}"),
                ));
            }
        }
    }

    Ok(program)
}

// -- Helpers -------------------------------------------------------------

fn extract_string_content(pair: Pair<Rule>) -> String {
    // string = ${ "\"" ~ dq_inner ~ "\"" | "'" ~ sq_inner ~ "'" }
    let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");

    let mut result = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('\\') => result.push('\\'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }
    result
}

fn parse_bin_op(s: &str) -> Option<BinOp> {
    Some(match s {
        "==" => BinOp::Eq,
        "!=" => BinOp::NotEq,
        "===" => BinOp::StrictEq,
        "!==" => BinOp::StrictNotEq,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        "<=" => BinOp::LtEq,
        ">=" => BinOp::GtEq,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Rem,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        let expr = parse_expr("planet").unwrap();
        assert!(matches!(&expr.node, ExprKind::Identifier(name) if name == "planet"));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let expr = parse_expr("trueish").unwrap();
        assert!(matches!(&expr.node, ExprKind::Identifier(name) if name == "trueish"));
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3").unwrap();
        match &expr.node {
            ExprKind::BinaryOp { op, right, .. } => {
                assert_eq!(*op, BinOp::Add);
                assert!(matches!(
                    &right.node,
                    ExprKind::BinaryOp { op: BinOp::Mul, .. }
                ));
            }
            other => panic!("expected binary op, got {other:?}"),
        }
    }

    #[test]
    fn test_left_associative() {
        // 8 - 4 - 2 parses as (8 - 4) - 2
        let expr = parse_expr("8 - 4 - 2").unwrap();
        match &expr.node {
            ExprKind::BinaryOp { op, left, .. } => {
                assert_eq!(*op, BinOp::Sub);
                assert!(matches!(
                    &left.node,
                    ExprKind::BinaryOp { op: BinOp::Sub, .. }
                ));
            }
            other => panic!("expected binary op, got {other:?}"),
        }
    }

    #[test]
    fn test_ternary_with_nodes_index() {
        let expr = parse_expr("cond ? __nodes[0] : __nodes[1]").unwrap();
        match &expr.node {
            ExprKind::Conditional {
                consequent,
                alternate,
                ..
            } => {
                assert!(matches!(&consequent.node, ExprKind::Index { .. }));
                assert!(matches!(&alternate.node, ExprKind::Index { .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_runtime_method_call() {
        let expr = parse_expr(r#"__runtime.changeToDoge("cate")"#).unwrap();
        match &expr.node {
            ExprKind::Call { callee, args } => {
                assert_eq!(args.len(), 1);
                match &callee.node {
                    ExprKind::Member { object, property } => {
                        assert_eq!(property, "changeToDoge");
                        assert!(
                            matches!(&object.node, ExprKind::Identifier(n) if n == "__runtime")
                        );
                    }
                    other => panic!("expected member callee, got {other:?}"),
                }
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_single_quoted_string_escapes() {
        let expr = parse_expr(r"'it\'s'").unwrap();
        assert!(matches!(&expr.node, ExprKind::Literal(Value::String(s)) if s == "it's"));
    }

    #[test]
    fn test_unary_chain() {
        let expr = parse_expr("!!flag").unwrap();
        match &expr.node {
            ExprKind::UnaryOp { op, operand } => {
                assert_eq!(*op, UnaryOp::Not);
                assert!(matches!(
                    &operand.node,
                    ExprKind::UnaryOp { op: UnaryOp::Not, .. }
                ));
            }
            other => panic!("expected unary op, got {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_has_span() {
        let err = parse_expr("foo +").unwrap_err();
        assert!(err.message.starts_with("parse error"));
        assert!(err.span.start <= 5);
    }

    #[test]
    fn test_program_round_trip_shape() {
        let src = r#"render(locals: scoped, runtime: "__funtime__") {
    write "p ";
    write (locals.name);
    attr "checked" {
        write (flag);
    }
    write (c ? __nodes[0] : __nodes[1]) with {
        write "truth";
    } {
        write "lies";
    };
}"#;
        let parsed = parse_program(src).unwrap();
        assert!(parsed.scoped_locals);
        assert_eq!(parsed.runtime_name, "__funtime__");
        let segments = parsed.program.segments();
        assert_eq!(segments.len(), 4);
        assert!(matches!(&segments[0], Segment::Text(t) if t == "p "));
        assert!(matches!(&segments[1], Segment::Code(c) if c.source == "locals.name"));
        assert!(matches!(&segments[2], Segment::Attr(a) if a.name == "checked"));
        match &segments[3] {
            Segment::Code(code) => assert_eq!(code.nodes.len(), 2),
            other => panic!("expected code segment, got {other:?}"),
        }
    }
}
