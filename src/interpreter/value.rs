//=====================================================
// File: interpreter/value.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script runtime values
// Objective: Closed value sum type with truthiness, equality, display, and
//            JSON conversion rules
//=====================================================

use super::errors::RuntimeError;
use super::scope::ScopeRef;
use super::Interpreter;
use crate::ast::{NodeRef, Param};
use crate::bindings::HostBinding;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

//=====================================================
// Section 1: Native Function Arity
//=====================================================

/// Supported arity constraints for native (built-in) functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    /// The function expects exactly this many arguments.
    Exact(usize),
    /// Inclusive minimum and optional maximum; `None` means no upper bound.
    Range { min: usize, max: Option<usize> },
}

impl NativeArity {
    pub const ANY: NativeArity = NativeArity::Range { min: 0, max: None };

    pub fn accepts(&self, count: usize) -> bool {
        match self {
            NativeArity::Exact(n) => *n == count,
            NativeArity::Range { min, max } => {
                count >= *min && max.is_none_or(|max| count <= max)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NativeArity::Exact(1) => "1 argument".to_string(),
            NativeArity::Exact(n) => format!("{} arguments", n),
            NativeArity::Range { min, max } => match max {
                Some(max) if min == max => format!("{} arguments", min),
                Some(max) => format!("{}..={} arguments", min, max),
                None if *min == 0 => "any number of arguments".to_string(),
                None => format!("at least {} arguments", min),
            },
        }
    }
}

//=====================================================
// Section 2: Callables
//=====================================================

/// Reserved key marking the trailing dict a call site appends to carry
/// named arguments.
pub const NAMED_ARGS_MARKER: &str = "__namedArgs";

/// Signature of builtins from the generic builtins table.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

pub enum NativeHandler {
    Builtin(NativeFn),
    Host(Rc<dyn HostBinding>),
}

pub struct NativeFunction {
    pub name: String,
    pub arity: NativeArity,
    pub handler: NativeHandler,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Declared with `function`: named-argument bag and defaults apply.
    Declared,
    /// Purely positional; an expression body is its own return value.
    Lambda,
}

/// User-defined closure. `closure` is the defining scope, captured by reference.
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub body: NodeRef,
    pub closure: ScopeRef,
    pub kind: FunctionKind,
    pub is_async: bool,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

pub struct Class {
    pub name: String,
    pub members: Vec<NodeRef>,
    pub closure: ScopeRef,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class_name: String,
    pub fields: RefCell<BTreeMap<String, Value>>,
}

impl Instance {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: RefCell::new(BTreeMap::new()),
        }
    }
}

//=====================================================
// Section 3: Runtime Values
//=====================================================

/// Buddy Script runtime values. Containers are shared and mutable, so
/// member/index assignment is visible through every alias.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<BTreeMap<String, Value>>>),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn dict(entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn native(name: impl Into<String>, arity: NativeArity, handler: NativeHandler) -> Self {
        Value::Native(Rc::new(NativeFunction {
            name: name.into(),
            arity,
            handler,
        }))
    }

    /// `null`, `undefined`, `false`, `0` and `""` are falsy; everything
    /// else, empty containers included, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Dict(_)
            | Value::Function(_)
            | Value::Native(_)
            | Value::Class(_)
            | Value::Instance(_) => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::Class(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Script-level `==`: primitives by value, everything else by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Display form used inside containers: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }

    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Undefined | Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(|num| {
                    if n.fract() == 0.0 && n.abs() < 9.0e15 {
                        JsonValue::from(*n as i64)
                    } else {
                        JsonValue::Number(num)
                    }
                })
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => {
                JsonValue::Array(items.borrow().iter().map(Value::to_json).collect())
            }
            Value::Dict(map) => JsonValue::Object(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Instance(instance) => JsonValue::Object(
                instance
                    .fields
                    .borrow()
                    .iter()
                    .filter(|(_, v)| !v.is_callable())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            callable => JsonValue::String(callable.to_string()),
        }
    }
}

/// Structural comparison for host code and tests; scripts use
/// [`Value::strict_equals`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => *a.borrow() == *b.borrow(),
            (Value::Dict(a), Value::Dict(b)) => *a.borrow() == *b.borrow(),
            (Value::Instance(a), Value::Instance(b)) => {
                a.class_name == b.class_name && *a.fields.borrow() == *b.fields.borrow()
            }
            _ => self.strict_equals(other),
        }
    }
}

/// Upper bound on elements or bytes a single script operation may allocate.
pub const MAX_COLLECTION_LEN: usize = 1 << 24;

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.repr())?;
                }
                write!(f, "]")
            }
            Value::Dict(map) => write_fields(f, &map.borrow()),
            Value::Function(function) => write!(f, "<function {}>", function.name),
            Value::Native(native) => write!(f, "<native function {}>", native.name),
            Value::Class(class) => write!(f, "<class {}>", class.name),
            Value::Instance(instance) => {
                write!(f, "{} ", instance.class_name)?;
                write_fields(f, &instance.fields.borrow())
            }
        }
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &BTreeMap<String, Value>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", key, value.repr())?;
    }
    write!(f, "}}")
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

//=====================================================
// Section 4: Tests
//=====================================================


//=====================================================
// End of file
//=====================================================
