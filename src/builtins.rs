//=====================================================
// File: builtins.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Generic builtin functions
// Objective: Register the host-independent builtins (output, collections,
//            strings, math, time, JSON) in an interpreter's global scope
//=====================================================

use crate::interpreter::value::{format_number, NativeArity, MAX_COLLECTION_LEN};
use crate::interpreter::{Interpreter, RuntimeError, Value};
use chrono::Utc;
use rand::Rng;
use std::collections::BTreeMap;

type BuiltinResult = Result<Value, RuntimeError>;

//=====================================================
// Section 1: Registration
//=====================================================

pub fn register_all(interpreter: &mut Interpreter) {
    use NativeArity::{Exact, Range};
    let variadic = |min| Range { min, max: None };

    interpreter.register_builtin("print", variadic(0), builtin_print);
    interpreter.register_builtin("println", variadic(0), builtin_print);
    interpreter.register_builtin("len", Exact(1), builtin_len);
    interpreter.register_builtin("type", Exact(1), builtin_type);
    interpreter.register_builtin("str", Exact(1), builtin_str);
    interpreter.register_builtin("num", Exact(1), builtin_num);
    interpreter.register_builtin("keys", Exact(1), builtin_keys);
    interpreter.register_builtin("values", Exact(1), builtin_values);
    interpreter.register_builtin("push", variadic(2), builtin_push);
    interpreter.register_builtin("pop", Exact(1), builtin_pop);
    interpreter.register_builtin("join", Range { min: 1, max: Some(2) }, builtin_join);
    interpreter.register_builtin("split", Exact(2), builtin_split);
    interpreter.register_builtin("upper", Exact(1), builtin_upper);
    interpreter.register_builtin("lower", Exact(1), builtin_lower);
    interpreter.register_builtin("trim", Exact(1), builtin_trim);
    interpreter.register_builtin("contains", Exact(2), builtin_contains);
    interpreter.register_builtin("range", Range { min: 1, max: Some(3) }, builtin_range);
    interpreter.register_builtin("abs", Exact(1), builtin_abs);
    interpreter.register_builtin("floor", Exact(1), builtin_floor);
    interpreter.register_builtin("ceil", Exact(1), builtin_ceil);
    interpreter.register_builtin("round", Exact(1), builtin_round);
    interpreter.register_builtin("sqrt", Exact(1), builtin_sqrt);
    interpreter.register_builtin("min", variadic(1), builtin_min);
    interpreter.register_builtin("max", variadic(1), builtin_max);
    interpreter.register_builtin("random", Range { min: 0, max: Some(2) }, builtin_random);
    interpreter.register_builtin("now", Exact(0), builtin_now);
    interpreter.register_builtin("json_stringify", Range { min: 1, max: Some(2) }, builtin_json_stringify);
    interpreter.register_builtin("json_parse", Exact(1), builtin_json_parse);
}

//=====================================================
// Section 2: Argument Helpers
//=====================================================

fn expect_number(args: &[Value], index: usize, name: &str) -> Result<f64, RuntimeError> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(RuntimeError::TypeError(format!(
            "{}() expects a number, got {}",
            name,
            other.type_name()
        ))),
        None => Err(RuntimeError::ArgumentError(format!(
            "{}() is missing argument {}",
            name,
            index + 1
        ))),
    }
}

fn expect_string<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, RuntimeError> {
    match args.get(index) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(RuntimeError::TypeError(format!(
            "{}() expects a string, got {}",
            name,
            other.type_name()
        ))),
        None => Err(RuntimeError::ArgumentError(format!(
            "{}() is missing argument {}",
            name,
            index + 1
        ))),
    }
}

fn not_supported(name: &str, value: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!("{}() does not support {}", name, value.type_name()))
}

//=====================================================
// Section 3: Output And Introspection
//=====================================================

fn builtin_print(interpreter: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.push_output(line);
    Ok(Value::Null)
}

fn builtin_len(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let len = match &args[0] {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Dict(fields) => fields.borrow().len(),
        Value::Instance(instance) => instance.fields.borrow().len(),
        other => return Err(not_supported("len", other)),
    };
    Ok(Value::Number(len as f64))
}

fn builtin_type(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::string(args[0].type_name()))
}

fn builtin_str(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::String(args[0].to_string()))
}

fn builtin_num(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let n = match &args[0] {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    };
    Ok(Value::Number(n))
}

//=====================================================
// Section 4: Collections
//=====================================================

fn field_snapshot(name: &str, value: &Value) -> Result<BTreeMap<String, Value>, RuntimeError> {
    match value {
        Value::Dict(fields) => Ok(fields.borrow().clone()),
        Value::Instance(instance) => Ok(instance.fields.borrow().clone()),
        other => Err(not_supported(name, other)),
    }
}

fn builtin_keys(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let fields = field_snapshot("keys", &args[0])?;
    Ok(Value::array(fields.into_keys().map(Value::String).collect()))
}

fn builtin_values(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let fields = field_snapshot("values", &args[0])?;
    Ok(Value::array(fields.into_values().collect()))
}

fn builtin_push(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let Value::Array(items) = &args[0] else {
        return Err(not_supported("push", &args[0]));
    };
    let mut items = items.borrow_mut();
    items.extend(args[1..].iter().cloned());
    Ok(Value::Number(items.len() as f64))
}

fn builtin_pop(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let Value::Array(items) = &args[0] else {
        return Err(not_supported("pop", &args[0]));
    };
    Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined))
}

fn builtin_join(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let Value::Array(items) = &args[0] else {
        return Err(not_supported("join", &args[0]));
    };
    let separator = match args.get(1) {
        Some(_) => expect_string(args, 1, "join")?,
        None => ",",
    };
    let joined = items
        .borrow()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(separator);
    Ok(Value::String(joined))
}

fn builtin_contains(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let found = match (&args[0], &args[1]) {
        (Value::String(text), Value::String(needle)) => text.contains(needle.as_str()),
        (Value::Array(items), needle) => items.borrow().iter().any(|item| item.strict_equals(needle)),
        (Value::Dict(fields), Value::String(key)) => fields.borrow().contains_key(key),
        (Value::Instance(instance), Value::String(key)) => {
            instance.fields.borrow().contains_key(key)
        }
        (haystack, _) => return Err(not_supported("contains", haystack)),
    };
    Ok(Value::Bool(found))
}

fn builtin_range(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let (start, end) = match args.len() {
        1 => (0.0, expect_number(args, 0, "range")?),
        _ => (expect_number(args, 0, "range")?, expect_number(args, 1, "range")?),
    };
    let step = match args.get(2) {
        Some(_) => expect_number(args, 2, "range")?,
        None => 1.0,
    };
    if step == 0.0 || !step.is_finite() {
        return Err(RuntimeError::ArgumentError(
            "range() step must be a non-zero number".to_string(),
        ));
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(RuntimeError::ArgumentError(
            "range() bounds must be finite numbers".to_string(),
        ));
    }
    let count = ((end - start) / step).ceil();
    if count > MAX_COLLECTION_LEN as f64 {
        return Err(RuntimeError::ArgumentError(format!(
            "range() would produce {} elements",
            format_number(count)
        )));
    }
    let items = (0..count.max(0.0) as usize)
        .map(|i| Value::Number(start + i as f64 * step))
        .collect();
    Ok(Value::array(items))
}

//=====================================================
// Section 5: Strings
//=====================================================

fn builtin_split(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let text = expect_string(args, 0, "split")?;
    let separator = expect_string(args, 1, "split")?;
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator).map(Value::string).collect()
    };
    Ok(Value::array(parts))
}

fn builtin_upper(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::String(expect_string(args, 0, "upper")?.to_uppercase()))
}

fn builtin_lower(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::String(expect_string(args, 0, "lower")?.to_lowercase()))
}

fn builtin_trim(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::string(expect_string(args, 0, "trim")?.trim()))
}

//=====================================================
// Section 6: Math
//=====================================================

fn builtin_abs(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::Number(expect_number(args, 0, "abs")?.abs()))
}

fn builtin_floor(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::Number(expect_number(args, 0, "floor")?.floor()))
}

fn builtin_ceil(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::Number(expect_number(args, 0, "ceil")?.ceil()))
}

/// Halves round toward positive infinity.
fn builtin_round(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::Number((expect_number(args, 0, "round")? + 0.5).floor()))
}

fn builtin_sqrt(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    Ok(Value::Number(expect_number(args, 0, "sqrt")?.sqrt()))
}

/// Accepts either numbers or a single array of numbers.
fn numeric_operands(args: &[Value], name: &str) -> Result<Vec<f64>, RuntimeError> {
    let values: Vec<Value> = match args {
        [Value::Array(items)] => items.borrow().clone(),
        _ => args.to_vec(),
    };
    if values.is_empty() {
        return Err(RuntimeError::ArgumentError(format!(
            "{}() needs at least one number",
            name
        )));
    }
    (0..values.len())
        .map(|index| expect_number(&values, index, name))
        .collect()
}

fn builtin_min(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let numbers = numeric_operands(args, "min")?;
    Ok(Value::Number(numbers.into_iter().fold(f64::INFINITY, f64::min)))
}

fn builtin_max(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let numbers = numeric_operands(args, "max")?;
    Ok(Value::Number(numbers.into_iter().fold(f64::NEG_INFINITY, f64::max)))
}

/// `random()` is in [0, 1), `random(max)` in [0, max), and
/// `random(min, max)` an integer in [min, max].
fn builtin_random(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let mut rng = rand::thread_rng();
    let value = match args.len() {
        0 => rng.gen_range(0.0..1.0),
        1 => rng.gen_range(0.0..1.0) * expect_number(args, 0, "random")?,
        _ => {
            let low = expect_number(args, 0, "random")?.ceil();
            let high = expect_number(args, 1, "random")?.floor();
            if !(low <= high) {
                return Err(RuntimeError::ArgumentError(format!(
                    "random() range is empty: {}..={}",
                    format_number(low),
                    format_number(high)
                )));
            }
            rng.gen_range(low as i64..=high as i64) as f64
        }
    };
    Ok(Value::Number(value))
}

//=====================================================
// Section 7: Time And JSON
//=====================================================

fn builtin_now(_: &mut Interpreter, _: &[Value]) -> BuiltinResult {
    Ok(Value::String(Utc::now().to_rfc3339()))
}

fn builtin_json_stringify(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let json = args[0].to_json();
    let pretty = args.get(1).is_some_and(Value::is_truthy);
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    }
    .map_err(|err| RuntimeError::Host(format!("json_stringify failed: {}", err)))?;
    Ok(Value::String(text))
}

fn builtin_json_parse(_: &mut Interpreter, args: &[Value]) -> BuiltinResult {
    let text = expect_string(args, 0, "json_parse")?;
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| RuntimeError::ArgumentError(format!("Invalid JSON: {}", err)))?;
    Ok(Value::from_json(&json))
}

//=====================================================
// Section 8: Tests
//=====================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScriptConfig;
    use crate::interpreter::NativeHandler;

    fn call(name: &str, args: Vec<Value>) -> BuiltinResult {
        let mut interpreter = Interpreter::new(ScriptConfig::default());
        let Some(Value::Native(native)) = interpreter.global(name) else {
            panic!("builtin {name} not registered");
        };
        assert!(native.arity.accepts(args.len()), "{name} arity");
        let NativeHandler::Builtin(func) = &native.handler else {
            panic!("{name} is not a builtin");
        };
        func(&mut interpreter, &args)
    }

    fn nums(values: &[f64]) -> Value {
        Value::array(values.iter().copied().map(Value::Number).collect())
    }

    #[test]
    fn test_print_joins_with_spaces() {
        let mut interpreter = Interpreter::new(ScriptConfig::default());
        builtin_print(&mut interpreter, &[Value::string("a"), Value::Number(1.0), Value::Null]).unwrap();
        let Some(Value::Native(_)) = interpreter.global("println") else {
            panic!("println missing");
        };
        assert_eq!(interpreter.output().to_vec(), vec!["a 1 null".to_string()]);
    }

    #[test]
    fn test_collection_builtins() {
        let array = nums(&[1.0, 2.0]);
        assert_eq!(call("push", vec![array.clone(), Value::Number(3.0)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("len", vec![array.clone()]).unwrap(), Value::Number(3.0));
        assert_eq!(call("pop", vec![array.clone()]).unwrap(), Value::Number(3.0));
        assert_eq!(call("join", vec![array.clone(), Value::string("-")]).unwrap(), Value::string("1-2"));
        assert_eq!(call("contains", vec![array, Value::Number(2.0)]).unwrap(), Value::Bool(true));

        let dict = Value::from_json(&serde_json::json!({ "b": 2, "a": 1 }));
        assert_eq!(call("keys", vec![dict.clone()]).unwrap(), Value::array(vec![Value::string("a"), Value::string("b")]));
        assert_eq!(call("values", vec![dict]).unwrap(), nums(&[1.0, 2.0]));
    }

    #[test]
    fn test_range() {
        assert_eq!(call("range", vec![Value::Number(3.0)]).unwrap(), nums(&[0.0, 1.0, 2.0]));
        assert_eq!(
            call("range", vec![Value::Number(5.0), Value::Number(0.0), Value::Number(-2.0)]).unwrap(),
            nums(&[5.0, 3.0, 1.0])
        );
        assert!(call("range", vec![Value::Number(0.0), Value::Number(3.0), Value::Number(0.0)]).is_err());
        assert!(call("range", vec![Value::Number(0.0), Value::Number(f64::INFINITY)]).is_err());
        assert!(call("range", vec![Value::Number(0.0), Value::Number(1e12)]).is_err());
        assert_eq!(
            call("range", vec![Value::Number(0.0), Value::Number(1.0), Value::Number(0.25)]).unwrap(),
            nums(&[0.0, 0.25, 0.5, 0.75])
        );
    }

    #[test]
    fn test_string_builtins() {
        assert_eq!(
            call("split", vec![Value::string("a,b"), Value::string(",")]).unwrap(),
            Value::array(vec![Value::string("a"), Value::string("b")])
        );
        assert_eq!(call("upper", vec![Value::string("hi")]).unwrap(), Value::string("HI"));
        assert_eq!(call("trim", vec![Value::string("  x ")]).unwrap(), Value::string("x"));
        assert_eq!(call("str", vec![Value::Number(4.0)]).unwrap(), Value::string("4"));
        assert_eq!(call("num", vec![Value::string(" 2.5 ")]).unwrap(), Value::Number(2.5));
        assert_eq!(call("type", vec![Value::array(vec![])]).unwrap(), Value::string("array"));
    }

    #[test]
    fn test_math_builtins() {
        assert_eq!(call("round", vec![Value::Number(2.5)]).unwrap(), Value::Number(3.0));
        assert_eq!(call("round", vec![Value::Number(-2.5)]).unwrap(), Value::Number(-2.0));
        assert_eq!(call("max", vec![nums(&[1.0, 9.0, 4.0])]).unwrap(), Value::Number(9.0));
        assert_eq!(call("min", vec![Value::Number(3.0), Value::Number(-1.0)]).unwrap(), Value::Number(-1.0));
        let Value::Number(roll) = call("random", vec![Value::Number(1.0), Value::Number(6.0)]).unwrap() else {
            panic!("expected number");
        };
        assert!((1.0..=6.0).contains(&roll) && roll.fract() == 0.0);
        assert!(call("abs", vec![Value::string("x")]).is_err());
    }

    #[test]
    fn test_json_builtins() {
        let parsed = call("json_parse", vec![Value::string(r#"{"a":[1,true,null]}"#)]).unwrap();
        assert_eq!(
            call("json_stringify", vec![parsed]).unwrap(),
            Value::string(r#"{"a":[1,true,null]}"#)
        );
        assert!(call("json_parse", vec![Value::string("{")]).is_err());
        let Value::String(stamp) = call("now", vec![]).unwrap() else {
            panic!("expected string");
        };
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}

//=====================================================
// End of file
//=====================================================
