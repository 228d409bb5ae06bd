//! Render-time evaluation.
//!
//! The evaluator walks a compiled [`Program`] and produces the output
//! string. Code segments are evaluated against the caller's [`Locals`],
//! the optional [`Runtime`] binding, and the `__nodes` side list of the
//! code segment being evaluated.
//!
//! An [`Evaluator`] borrows everything it needs and holds no mutable
//! state, so a single compiled program can be rendered concurrently.

use crate::ast::expr::*;
use crate::ast::span::Span;
use crate::ast::value::Value;
use crate::compile::{CodeSegment, Program, Segment};
use crate::error::{EvalError, EvalErrorKind};
use crate::runtime::Runtime;

mod locals;

pub use locals::Locals;

/// Name under which a code segment's side list is bound.
pub const NODES_BINDING: &str = "__nodes";

/// Name of the whole-mapping binding in scoped-locals mode.
pub const LOCALS_BINDING: &str = "locals";

pub(crate) struct Evaluator<'a> {
    locals: &'a Locals,
    scoped_locals: bool,
    runtime_name: &'a str,
    runtime: Option<&'a Runtime>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        locals: &'a Locals,
        scoped_locals: bool,
        runtime_name: &'a str,
        runtime: Option<&'a Runtime>,
    ) -> Self {
        Self {
            locals,
            scoped_locals,
            runtime_name,
            runtime,
        }
    }

    // ── Program rendering ───────────────────────────────────────────────

    pub(crate) fn render_program(&self, program: &Program) -> Result<String, EvalError> {
        let mut output = String::new();

        for segment in program.segments() {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Code(code) => {
                    let value = self.eval_code(code)?;
                    output.push_str(&value.to_output_string());
                }
                Segment::Attr(attr) => {
                    let value = self.render_program(&attr.value)?;
                    output.push_str(&attr.name);
                    if !value.is_empty() {
                        output.push_str("=\"");
                        output.push_str(&value);
                        output.push('"');
                    }
                }
            }
        }

        Ok(output)
    }

    fn eval_code(&self, code: &CodeSegment) -> Result<Value, EvalError> {
        self.eval_expr(&code.expr, &code.nodes)
    }

    // ── Expression evaluation ───────────────────────────────────────────

    /// `nodes` is the side list of the code segment being evaluated.
    fn eval_expr(&self, expr: &Expr, nodes: &[Program]) -> Result<Value, EvalError> {
        let span = expr.span;
        match &expr.node {
            ExprKind::Literal(val) => Ok(val.clone()),

            ExprKind::ArrayLiteral(elements) => elements
                .iter()
                .map(|elem| self.eval_expr(elem, nodes))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            ExprKind::Identifier(name) => self.resolve_identifier(name, nodes, span),

            ExprKind::Member { object, property } => {
                if self.scoped_locals && is_identifier(object, LOCALS_BINDING) {
                    return Ok(self.locals.get(property).cloned().unwrap_or(Value::Null));
                }
                let target = self.eval_expr(object, nodes)?;
                get_property(&target, property).map_err(|e| e.or_span(span))
            }

            ExprKind::Index { object, index } => {
                let key = self.eval_expr(index, nodes)?;
                if is_identifier(object, NODES_BINDING) {
                    return self.render_side_node(nodes, &key);
                }
                let target = self.eval_expr(object, nodes)?;
                get_index(&target, &key).map_err(|e| e.or_span(span))
            }

            ExprKind::Call { callee, args } => self.eval_call(callee, args, nodes, span),

            ExprKind::BinaryOp { left, op, right } => {
                let left_val = self.eval_expr(left, nodes)?;
                match op {
                    BinOp::And if !left_val.is_truthy() => Ok(left_val),
                    BinOp::Or if left_val.is_truthy() => Ok(left_val),
                    BinOp::And | BinOp::Or => self.eval_expr(right, nodes),
                    _ => {
                        let right_val = self.eval_expr(right, nodes)?;
                        Ok(eval_binary_op(&left_val, *op, &right_val))
                    }
                }
            }

            ExprKind::UnaryOp { op, operand } => {
                let val = self.eval_expr(operand, nodes)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!val.is_truthy()),
                    UnaryOp::Neg => Value::Number(-to_number(&val)),
                })
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, nodes)?.is_truthy() {
                    self.eval_expr(consequent, nodes)
                } else {
                    self.eval_expr(alternate, nodes)
                }
            }
        }
    }

    /// Identifier lookup order: the `__nodes` side list, the runtime
    /// binding, then locals (flat keys, or the single `locals` object).
    fn resolve_identifier(
        &self,
        name: &str,
        nodes: &[Program],
        span: Span,
    ) -> Result<Value, EvalError> {
        if name == NODES_BINDING {
            return nodes
                .iter()
                .map(|program| self.render_program(program).map(Value::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        }

        if name == self.runtime_name && self.runtime.is_some() {
            return Err(EvalError::new(
                EvalErrorKind::TypeError,
                format!("{name} can only be used to call its methods"),
            )
            .with_span(span));
        }

        let found = if self.scoped_locals {
            (name == LOCALS_BINDING).then(|| self.locals.to_value())
        } else {
            self.locals.get(name).cloned()
        };

        found.ok_or_else(|| EvalError::undefined_variable(name).with_span(span))
    }

    /// `__nodes[i]`: render only the addressed side node.
    fn render_side_node(&self, nodes: &[Program], key: &Value) -> Result<Value, EvalError> {
        let index = to_number(key);
        if index.fract() != 0.0 || index < 0.0 {
            return Ok(Value::Null);
        }
        match nodes.get(index as usize) {
            Some(program) => self.render_program(program).map(Value::String),
            None => Ok(Value::Null),
        }
    }

    fn eval_call(
        &self,
        callee: &Expr,
        args: &[Expr],
        nodes: &[Program],
        span: Span,
    ) -> Result<Value, EvalError> {
        let ExprKind::Member { object, property } = &callee.node else {
            return Err(EvalError::new(
                EvalErrorKind::TypeError,
                "only methods can be called",
            )
            .with_span(span));
        };

        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg, nodes))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(runtime) = self.runtime
            && is_identifier(object, self.runtime_name)
        {
            return runtime
                .call(property, args)
                .map_err(|e| match e.kind {
                    EvalErrorKind::UndefinedMethod => {
                        EvalError::undefined_method(self.runtime_name, property)
                    }
                    _ => e,
                })
                .map_err(|e| e.or_span(span));
        }

        let target = self.eval_expr(object, nodes)?;
        call_builtin(&target, property, &args).map_err(|e| e.or_span(span))
    }
}

fn is_identifier(expr: &Expr, name: &str) -> bool {
    matches!(&expr.node, ExprKind::Identifier(n) if n == name)
}

// ── Property access ─────────────────────────────────────────────────────

fn get_property(target: &Value, property: &str) -> Result<Value, EvalError> {
    match (target, property) {
        (Value::Null, _) => Err(EvalError::new(
            EvalErrorKind::TypeError,
            format!("cannot read property '{property}' of null"),
        )),
        (Value::Object(map), _) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        (Value::String(s), "length") => Ok(Value::Number(s.chars().count() as f64)),
        (Value::Array(items), "length") => Ok(Value::Number(items.len() as f64)),
        _ => Ok(Value::Null),
    }
}

fn get_index(target: &Value, key: &Value) -> Result<Value, EvalError> {
    match (target, key) {
        (Value::Array(items), Value::Number(n)) => Ok(array_slot(*n)
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::String(s), Value::Number(n)) => Ok(array_slot(*n)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        _ => get_property(target, &key.to_output_string()),
    }
}

fn array_slot(n: f64) -> Option<usize> {
    (n.fract() == 0.0 && n >= 0.0).then_some(n as usize)
}

// ── Built-in methods ────────────────────────────────────────────────────

fn call_builtin(target: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (target, method) {
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::Array(items), "join") => {
            let sep = args
                .first()
                .map(|v| v.to_output_string())
                .unwrap_or_else(|| ",".to_string());
            Ok(Value::String(
                items
                    .iter()
                    .map(Value::to_output_string)
                    .collect::<Vec<_>>()
                    .join(&sep),
            ))
        }
        (Value::Null, _) => Err(EvalError::new(
            EvalErrorKind::TypeError,
            format!("cannot read property '{method}' of null"),
        )),
        (_, "toString") => Ok(Value::String(target.to_output_string())),
        _ => Err(EvalError::new(
            EvalErrorKind::TypeError,
            format!("{}.{method} is not a function", target.type_name()),
        )),
    }
}

// ── Pure operator evaluation ────────────────────────────────────────────

fn eval_binary_op(left: &Value, op: BinOp, right: &Value) -> Value {
    match op {
        BinOp::Eq | BinOp::StrictEq => Value::Bool(values_equal(left, right)),
        BinOp::NotEq | BinOp::StrictNotEq => Value::Bool(!values_equal(left, right)),

        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
            let ordering = match (left, right) {
                (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
                _ => to_number(left).partial_cmp(&to_number(right)),
            };
            let result = ordering.is_some_and(|ord| match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Gt => ord.is_gt(),
                BinOp::LtEq => ord.is_le(),
                _ => ord.is_ge(),
            });
            Value::Bool(result)
        }

        // Short-circuited by the caller; only reached with both sides known.
        BinOp::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinOp::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }

        BinOp::Add => {
            if is_stringish(left) || is_stringish(right) {
                Value::String(format!(
                    "{}{}",
                    left.to_output_string(),
                    right.to_output_string()
                ))
            } else {
                Value::Number(to_number(left) + to_number(right))
            }
        }
        BinOp::Sub => Value::Number(to_number(left) - to_number(right)),
        BinOp::Mul => Value::Number(to_number(left) * to_number(right)),
        BinOp::Div => Value::Number(to_number(left) / to_number(right)),
        BinOp::Rem => Value::Number(to_number(left) % to_number(right)),
    }
}

fn is_stringish(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

/// Numeric coercion: booleans are 0/1, null is 0, strings parse (empty
/// is 0), anything else is NaN.
fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left == right,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
