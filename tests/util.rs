//=====================================================
// File: tests/util.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Shared integration-test helpers
// Objective: Build JSON ASTs tersely and run them through the interpreter
//=====================================================

#![allow(dead_code)]

use buddyscript::{Interpreter, Program, ScriptConfig, ScriptResult};
use serde_json::{json, Value as Json};

pub fn program(statements: Vec<Json>) -> Program {
    serde_json::from_value(json!({ "type": "Program", "statements": statements }))
        .expect("program json")
}

pub fn config() -> ScriptConfig {
    ScriptConfig::default().with_timeout(5_000)
}

pub async fn run(statements: Vec<Json>) -> ScriptResult {
    run_with(config(), statements).await
}

pub async fn run_with(config: ScriptConfig, statements: Vec<Json>) -> ScriptResult {
    let mut interpreter = Interpreter::new(config);
    interpreter.execute(&program(statements)).await
}

pub fn lit(value: Json) -> Json {
    json!({ "type": "Literal", "value": value })
}

pub fn num(n: f64) -> Json {
    lit(json!(n))
}

pub fn text(s: &str) -> Json {
    lit(json!(s))
}

pub fn ident(name: &str) -> Json {
    json!({ "type": "Identifier", "name": name })
}

pub fn bin(operator: &str, left: Json, right: Json) -> Json {
    json!({ "type": "Binary", "operator": operator, "left": left, "right": right })
}

pub fn assign(target: Json, value: Json) -> Json {
    json!({ "type": "Assignment", "operator": "Equal", "target": target, "value": value })
}

pub fn member(object: Json, property: &str) -> Json {
    json!({ "type": "Member", "object": object, "property": property })
}

pub fn call(callee: Json, arguments: Vec<Json>) -> Json {
    json!({ "type": "Call", "callee": callee, "arguments": arguments })
}

pub fn call_fn(name: &str, arguments: Vec<Json>) -> Json {
    call(ident(name), arguments)
}

pub fn expr(expression: Json) -> Json {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

pub fn print(arguments: Vec<Json>) -> Json {
    expr(call_fn("print", arguments))
}

pub fn let_(name: &str, initializer: Json) -> Json {
    json!({ "type": "VarDeclaration", "name": name, "initializer": initializer })
}

pub fn ret(value: Json) -> Json {
    json!({ "type": "Return", "value": value })
}

pub fn block(statements: Vec<Json>) -> Json {
    json!({ "type": "Block", "statements": statements })
}

pub fn func(name: &str, params: &[&str], body: Vec<Json>) -> Json {
    let params: Vec<Json> = params.iter().map(|p| json!({ "name": p })).collect();
    json!({ "type": "FunctionDeclaration", "name": name, "params": params, "body": block(body) })
}

//=====================================================
// End of file
//=====================================================
