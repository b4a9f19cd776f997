// Buddy Script interpreter tests for canonical programs
// Covers: arithmetic, scoping, closures, loops, classes, named args, exports

mod util;

use buddyscript::{ScriptConfig, Value};
use serde_json::json;
use util::*;

fn returned(result: &buddyscript::ScriptResult) -> Value {
    assert!(result.success, "script failed: {:?}", result.error);
    result.return_value.clone().expect("return value")
}

#[tokio::test]
async fn plus_and_repeat_follow_text_rules() {
    let result = run(vec![
        print(vec![bin("+", text("3"), num(4.0))]),
        print(vec![bin("+", num(3.0), text("4"))]),
        print(vec![bin("Plus", num(3.0), num(4.0))]),
        print(vec![bin("*", text("ab"), num(3.0))]),
        print(vec![bin("/", num(1.0), num(0.0))]),
    ])
    .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.output, vec!["34", "34", "7", "ababab", "Infinity"]);
}

#[tokio::test]
async fn block_scoped_variable_is_invisible_afterwards() {
    let result = run(vec![
        block(vec![let_("inner", num(1.0))]),
        print(vec![ident("inner")]),
    ])
    .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Undefined variable: inner"));
}

#[tokio::test]
async fn closures_see_later_writes_to_captured_variables() {
    let result = run(vec![
        let_("x", num(1.0)),
        func("read", &[], vec![ret(ident("x"))]),
        expr(assign(ident("x"), num(2.0))),
        ret(call_fn("read", vec![])),
    ])
    .await;
    assert_eq!(returned(&result), Value::Number(2.0));
}

#[tokio::test]
async fn named_arguments_bind_by_name_regardless_of_order() {
    let f = json!({
        "type": "FunctionDeclaration",
        "name": "f",
        "params": [
            { "name": "a" },
            { "name": "b", "default": { "type": "Literal", "value": 2 } }
        ],
        "body": block(vec![ret(json!({ "type": "Array", "elements": [ident("a"), ident("b")] }))])
    });
    let named_call = json!({
        "type": "Call",
        "callee": ident("f"),
        "arguments": [],
        "namedArguments": { "b": num(5.0), "a": num(1.0) }
    });
    let result = run(vec![
        f,
        let_("named", named_call),
        let_("defaulted", call_fn("f", vec![num(1.0)])),
        let_("missing", call_fn("f", vec![])),
        ret(json!({ "type": "Array", "elements": [ident("named"), ident("defaulted"), ident("missing")] })),
    ])
    .await;
    let expected = Value::array(vec![
        Value::array(vec![Value::Number(1.0), Value::Number(5.0)]),
        Value::array(vec![Value::Number(1.0), Value::Number(2.0)]),
        Value::array(vec![Value::Null, Value::Number(2.0)]),
    ]);
    assert_eq!(returned(&result), expected);
}

#[tokio::test]
async fn defaults_evaluate_in_the_defining_scope() {
    let f = json!({
        "type": "FunctionDeclaration",
        "name": "f",
        "params": [{ "name": "v", "default": ident("base") }],
        "body": block(vec![ret(ident("v"))])
    });
    let caller = func("caller", &[], vec![let_("base", num(99.0)), ret(call_fn("f", vec![]))]);
    let result = run(vec![let_("base", num(1.0)), f, caller, ret(call_fn("caller", vec![]))]).await;
    assert_eq!(returned(&result), Value::Number(1.0));
}

#[tokio::test]
async fn c_style_continue_still_runs_update() {
    // for (let i = 0; i < 6; i += 1) { if (i % 2 == 0) continue; total += i }
    let loop_node = json!({
        "type": "ForCStyle",
        "init": let_("i", num(0.0)),
        "test": bin("<", ident("i"), num(6.0)),
        "update": { "type": "Assignment", "operator": "PlusEqual", "target": ident("i"), "value": num(1.0) },
        "body": block(vec![
            json!({
                "type": "If",
                "condition": bin("==", bin("%", ident("i"), num(2.0)), num(0.0)),
                "thenBranch": { "type": "Continue" }
            }),
            expr(json!({ "type": "Assignment", "operator": "+=", "target": ident("total"), "value": ident("i") })),
        ])
    });
    let result = run(vec![let_("total", num(0.0)), loop_node, ret(ident("total"))]).await;
    assert_eq!(returned(&result), Value::Number(9.0));
}

#[tokio::test]
async fn break_exits_without_update_and_null_test_loops_forever() {
    let loop_node = json!({
        "type": "ForCStyle",
        "init": let_("i", num(0.0)),
        "update": { "type": "Assignment", "operator": "+=", "target": ident("i"), "value": num(1.0) },
        "body": block(vec![json!({
            "type": "If",
            "condition": bin(">=", ident("i"), num(3.0)),
            "thenBranch": block(vec![expr(assign(ident("seen"), ident("i"))), json!({ "type": "Break" })])
        })])
    });
    let result = run(vec![let_("seen", lit(json!(null))), loop_node, ret(ident("seen"))]).await;
    assert_eq!(returned(&result), Value::Number(3.0));
}

#[tokio::test]
async fn for_in_visits_arrays_dict_keys_and_characters() {
    let for_each = |iterable| {
        json!({
            "type": "For",
            "variable": "item",
            "iterable": iterable,
            "body": block(vec![print(vec![ident("item")])])
        })
    };
    let result = run(vec![
        for_each(json!({ "type": "Array", "elements": [num(1.0), text("two")] })),
        for_each(json!({ "type": "Dict", "entries": { "b": num(1.0), "a": num(2.0) } })),
        for_each(text("hi")),
    ])
    .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.output, vec!["1", "two", "a", "b", "h", "i"]);
}

#[tokio::test]
async fn while_loop_with_break() {
    let result = run(vec![
        let_("n", num(0.0)),
        json!({
            "type": "While",
            "condition": lit(json!(true)),
            "body": block(vec![
                expr(json!({ "type": "Assignment", "operator": "+=", "target": ident("n"), "value": num(1.0) })),
                json!({ "type": "If", "condition": bin("==", ident("n"), num(4.0)), "thenBranch": { "type": "Break" } }),
            ])
        }),
        ret(ident("n")),
    ])
    .await;
    assert_eq!(returned(&result), Value::Number(4.0));
}

#[tokio::test]
async fn classes_build_instances_with_bound_methods() {
    let class = json!({
        "type": "ClassDeclaration",
        "name": "Counter",
        "members": [
            let_("count", num(0.0)),
            func("constructor", &["start"], vec![expr(assign(member(ident("this"), "count"), ident("start")))]),
            func("bump", &[], vec![
                expr(json!({ "type": "Assignment", "operator": "+=", "target": member(ident("this"), "count"), "value": num(1.0) })),
                ret(member(ident("this"), "count")),
            ]),
        ]
    });
    let result = run(vec![
        class,
        let_("c", call_fn("Counter", vec![num(5.0)])),
        expr(call(member(ident("c"), "bump"), vec![])),
        let_("bumped", call(member(ident("c"), "bump"), vec![])),
        print(vec![call_fn("type", vec![ident("c")])]),
        ret(ident("bumped")),
    ])
    .await;
    assert_eq!(returned(&result), Value::Number(7.0));
    assert_eq!(result.output, vec!["object"]);
}

#[tokio::test]
async fn lambdas_return_expression_or_block_value() {
    let double = json!({ "type": "Lambda", "params": ["x"], "body": bin("*", ident("x"), num(2.0)) });
    let negate = json!({ "type": "Lambda", "params": ["x"], "body": block(vec![ret(json!({ "type": "Unary", "operator": "Minus", "operand": ident("x") }))]) });
    let result = run(vec![
        let_("double", double),
        let_("negate", negate),
        ret(call_fn("negate", vec![call_fn("double", vec![num(21.0)])])),
    ])
    .await;
    assert_eq!(returned(&result), Value::Number(-42.0));
}

#[tokio::test]
async fn interpolation_ternary_and_await() {
    let greeting = json!({
        "type": "Interpolation",
        "parts": ["Hello, ", ident("name"), "! You have ", ident("count"), " items."]
    });
    let result = run(vec![
        let_("name", text("Ada")),
        let_("count", num(3.0)),
        print(vec![json!({ "type": "Await", "expression": greeting })]),
        print(vec![json!({
            "type": "Ternary",
            "condition": bin(">", ident("count"), num(1.0)),
            "consequent": text("many"),
            "alternate": text("few")
        })]),
    ])
    .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.output, vec!["Hello, Ada! You have 3 items.", "many"]);
}

#[tokio::test]
async fn logical_operators_short_circuit() {
    let result = run(vec![
        func("boom", &[], vec![json!({ "type": "Throw", "value": text("evaluated") })]),
        print(vec![bin("&&", num(0.0), call_fn("boom", vec![]))]),
        print(vec![bin("||", text("left"), call_fn("boom", vec![]))]),
        print(vec![bin("||", lit(json!(null)), text("fallback"))]),
    ])
    .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.output, vec!["0", "left", "fallback"]);
}

#[tokio::test]
async fn compound_assignment_on_members_and_indexes() {
    let index = |object, i| json!({ "type": "Index", "object": object, "index": i });
    let result = run(vec![
        let_("totals", json!({ "type": "Dict", "entries": { "hits": num(1.0) } })),
        let_("list", json!({ "type": "Array", "elements": [num(10.0)] })),
        expr(json!({ "type": "Assignment", "operator": "+=", "target": member(ident("totals"), "hits"), "value": num(2.0) })),
        expr(json!({ "type": "Assignment", "operator": "*=", "target": index(ident("list"), num(0.0)), "value": num(3.0) })),
        expr(assign(index(ident("totals"), text("misses")), num(0.0))),
        print(vec![ident("totals"), ident("list"), member(ident("list"), "length")]),
        print(vec![member(ident("totals"), "absent")]),
    ])
    .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.output,
        vec!["{hits: 3, misses: 0} [30] 1", "undefined"]
    );
}

#[tokio::test]
async fn containers_compare_by_identity() {
    let result = run(vec![
        let_("a", json!({ "type": "Array", "elements": [num(1.0)] })),
        let_("b", json!({ "type": "Array", "elements": [num(1.0)] })),
        let_("alias", ident("a")),
        expr(call_fn("push", vec![ident("alias"), num(2.0)])),
        print(vec![bin("==", ident("a"), ident("b")), bin("===", ident("a"), ident("alias")), ident("a")]),
    ])
    .await;
    assert_eq!(result.output, vec!["false true [1, 2]"]);
}

#[tokio::test]
async fn top_level_return_stops_the_program() {
    let result = run(vec![print(vec![text("before")]), ret(num(42.0)), print(vec![text("after")])]).await;
    assert_eq!(returned(&result), Value::Number(42.0));
    assert_eq!(result.output, vec!["before"]);
}

#[tokio::test]
async fn injected_variables_are_globals() {
    let config = config()
        .with_variable("project", json!("demo"))
        .with_variable("limits", json!({ "retries": 3 }));
    let result = run_with(
        config,
        vec![ret(bin("+", ident("project"), member(ident("limits"), "retries")))],
    )
    .await;
    assert_eq!(returned(&result), Value::string("demo3"));
}

#[tokio::test]
async fn const_bindings_reject_reassignment() {
    let result = run(vec![
        json!({ "type": "VarDeclaration", "name": "limit", "initializer": num(1.0), "isConst": true }),
        expr(assign(ident("limit"), num(2.0))),
    ])
    .await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Cannot assign to constant variable 'limit'")
    );
}

#[tokio::test]
async fn exports_are_recorded() {
    let result = run(vec![
        json!({ "type": "Export", "declaration": func("helper", &[], vec![ret(num(1.0))]) }),
        json!({ "type": "Export", "declaration": let_("answer", num(42.0)) }),
        ret(call_fn("helper", vec![])),
    ])
    .await;
    assert_eq!(returned(&result), Value::Number(1.0));
    assert_eq!(result.exports, vec!["helper", "answer"]);
}

#[tokio::test]
async fn globals_persist_but_output_is_per_execution() {
    let mut interpreter = buddyscript::Interpreter::new(ScriptConfig::default());
    let first = interpreter
        .execute(&program(vec![let_("kept", num(1.0)), print(vec![text("first")])]))
        .await;
    let second = interpreter
        .execute(&program(vec![print(vec![ident("kept")])]))
        .await;
    assert_eq!(first.output, vec!["first"]);
    assert_eq!(second.output, vec!["1"]);
}
