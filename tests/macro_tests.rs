use std::sync::Arc;

use sugarml_gen::runtime::{RuntimeMethod, ValueType};
use sugarml_gen::{EvalError, EvalErrorKind, GenerateOptions, Locals, Node, Runtime, Value, render};
use sugarml_macros::runtime_method;

// ── Any value: the classic doge swap ────────────────────────────────────

#[runtime_method(name = "changeToDoge")]
fn change_to_doge(_input: Value) -> Result<Value, EvalError> {
    Ok(Value::from("doge"))
}

// ── String method: wraps text in brackets ───────────────────────────────

#[runtime_method(name = "bracket")]
fn bracket(text: String) -> Result<Value, EvalError> {
    Ok(Value::String(format!("[{text}]")))
}

// ── Numeric method, named after the function ────────────────────────────

#[runtime_method]
fn double(n: f64) -> Result<Value, EvalError> {
    Ok(Value::Number(n * 2.0))
}

// ── Bool method ─────────────────────────────────────────────────────────

#[runtime_method(name = "yesNo")]
fn yes_no(value: bool) -> Result<Value, EvalError> {
    Ok(Value::String(if value { "yes" } else { "no" }.to_string()))
}

// ── Array method ────────────────────────────────────────────────────────

#[runtime_method(name = "first")]
fn first_item(items: Vec<Value>) -> Result<Value, EvalError> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::new(EvalErrorKind::HostError, "empty array"))
}

// ── Multi-param method ──────────────────────────────────────────────────

#[runtime_method(name = "repeat")]
fn repeat_text(text: String, count: f64) -> Result<Value, EvalError> {
    Ok(Value::String(text.repeat(count.round() as usize)))
}

// ── Tests ───────────────────────────────────────────────────────────────

fn make_runtime() -> Arc<Runtime> {
    Arc::new(
        Runtime::new()
            .with(ChangeToDogeMethod)
            .with(BracketMethod)
            .with(DoubleMethod)
            .with(YesNoMethod)
            .with(FirstItemMethod)
            .with(RepeatTextMethod),
    )
}

fn eval(expression: &str) -> Result<String, sugarml_gen::RenderError> {
    let options = GenerateOptions::new().runtime(make_runtime());
    render(&[Node::code(expression)], &options, &Locals::new())
}

#[test]
fn test_macro_any_value_method() {
    assert_eq!(eval(r#"__runtime.changeToDoge("cate")"#).unwrap(), "doge");
    // Missing `Value` arguments become null instead of failing.
    assert_eq!(eval("__runtime.changeToDoge()").unwrap(), "doge");
}

#[test]
fn test_macro_string_method() {
    assert_eq!(eval(r#"__runtime.bracket("hello")"#).unwrap(), "[hello]");
}

#[test]
fn test_macro_number_method() {
    assert_eq!(eval("__runtime.double(21)").unwrap(), "42");
}

#[test]
fn test_macro_bool_method() {
    assert_eq!(eval("__runtime.yesNo(1 < 2)").unwrap(), "yes");
    assert_eq!(eval("__runtime.yesNo(false)").unwrap(), "no");
}

#[test]
fn test_macro_array_method() {
    assert_eq!(
        eval(r#"__runtime.first(["alpha", "beta", "gamma"])"#).unwrap(),
        "alpha"
    );
}

#[test]
fn test_macro_multi_param_method() {
    assert_eq!(eval(r#"__runtime.repeat("ab", 3)"#).unwrap(), "ababab");
}

#[test]
fn test_macro_type_mismatch() {
    let err = eval("__runtime.double(\"nope\")").unwrap_err();
    match err {
        sugarml_gen::RenderError::Eval(e) => assert_eq!(e.kind, EvalErrorKind::TypeError),
        other => panic!("expected eval error, got {other:?}"),
    }
}

#[test]
fn test_macro_missing_required_argument() {
    let err = eval(r#"__runtime.repeat("ab")"#).unwrap_err();
    let sugarml_gen::RenderError::Eval(e) = err else {
        panic!("expected eval error");
    };
    assert_eq!(e.kind, EvalErrorKind::TypeError);
    assert!(e.message.contains("count"), "message: {}", e.message);
}

#[test]
fn test_macro_host_error_propagates() {
    let err = eval("__runtime.first([])").unwrap_err();
    let sugarml_gen::RenderError::Eval(e) = err else {
        panic!("expected eval error");
    };
    assert_eq!(e.kind, EvalErrorKind::HostError);
    assert_eq!(e.message, "empty array");
}

#[test]
fn test_macro_signature() {
    let sig = RepeatTextMethod.signature();
    assert_eq!(sig.name, "repeat");
    assert_eq!(sig.params.len(), 2);
    assert_eq!(sig.params[0].name, "text");
    assert_eq!(sig.params[0].expected_type, Some(ValueType::String));
    assert_eq!(sig.params[1].expected_type, Some(ValueType::Number));
    assert!(sig.params.iter().all(|p| p.required));

    let sig = ChangeToDogeMethod.signature();
    assert_eq!(sig.params[0].expected_type, Some(ValueType::Any));
    assert!(!sig.params[0].required);

    assert_eq!(DoubleMethod.signature().name, "double");
}

#[test]
fn test_macro_method_with_custom_runtime_name() {
    let options = GenerateOptions::new()
        .runtime_name("__funtime__")
        .runtime(make_runtime());
    let tree = vec![
        Node::text("it's a "),
        Node::code(r#"__funtime__.changeToDoge("cate")"#),
        Node::text("!"),
    ];
    assert_eq!(render(&tree, &options, &Locals::new()).unwrap(), "it's a doge!");
}
