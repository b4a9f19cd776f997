//=====================================================
// File: interpreter/errors.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Runtime failure taxonomy
// Objective: Define the interpreter's error type, its stable error codes, and
//            the value a script sees when it catches a failure
//=====================================================

use super::value::Value;
use crate::tokenizer::LexError;
use std::collections::BTreeMap;
use thiserror::Error;

//=====================================================
// Section 1: Error Codes
//=====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    ModuleResolution,
    TypeMismatch,
    InvalidOperation,
    RuntimePanic,
    Assertion,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::ModuleResolution => "E002",
            ErrorCode::TypeMismatch => "E003",
            ErrorCode::InvalidOperation => "E004",
            ErrorCode::RuntimePanic => "E005",
            ErrorCode::Assertion => "E006",
            ErrorCode::Timeout => "E007",
        }
    }
}

//=====================================================
// Section 2: Runtime Errors
//=====================================================

/// Failures raised while executing a program.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Cannot read property of null or undefined (reading '{0}')")]
    NullAccess(String),
    #[error("{0} is not callable")]
    NotCallable(String),
    #[error("Unknown binary operator: {0}")]
    UnknownBinaryOperator(String),
    #[error("Unknown unary operator: {0}")]
    UnknownUnaryOperator(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Argument error: {0}")]
    ArgumentError(String),
    #[error("Cannot assign to constant variable '{0}'")]
    ConstAssignment(String),
    #[error("Maximum call depth exceeded ({0})")]
    StackOverflow(usize),
    #[error("Unsupported node type: {0}")]
    UnsupportedNode(String),
    #[error("{0} statement outside loop")]
    StrayControlFlow(&'static str),
    #[error("Script execution timed out after {0}ms")]
    Timeout(u64),
    #[error("{0}")]
    Assertion(String),
    /// `throw` of a string message.
    #[error("{0}")]
    Raised(String),
    /// `throw` of any other value; it reaches catch clauses untouched.
    #[error("{0}")]
    Thrown(Value),
    #[error("{0}")]
    Host(String),
    #[error("Import error: {0}")]
    Import(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl RuntimeError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RuntimeError::TypeError(_) | RuntimeError::NotCallable(_) => ErrorCode::TypeMismatch,
            RuntimeError::UndefinedVariable(_)
            | RuntimeError::NullAccess(_)
            | RuntimeError::UnknownBinaryOperator(_)
            | RuntimeError::UnknownUnaryOperator(_)
            | RuntimeError::ArgumentError(_)
            | RuntimeError::ConstAssignment(_)
            | RuntimeError::UnsupportedNode(_)
            | RuntimeError::StrayControlFlow(_) => ErrorCode::InvalidOperation,
            RuntimeError::Import(_) => ErrorCode::ModuleResolution,
            RuntimeError::Assertion(_) => ErrorCode::Assertion,
            RuntimeError::Timeout(_) => ErrorCode::Timeout,
            RuntimeError::StackOverflow(_)
            | RuntimeError::Raised(_)
            | RuntimeError::Thrown(_)
            | RuntimeError::Host(_)
            | RuntimeError::Io(_) => ErrorCode::RuntimePanic,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error_code().as_str()
    }

    /// Failure for a script-level `throw`. Strings are wrapped like host
    /// failures; other values are kept as-is for catch clauses to inspect.
    pub fn thrown(value: Value) -> Self {
        match value {
            Value::String(message) => RuntimeError::Raised(message),
            other => RuntimeError::Thrown(other),
        }
    }

    /// Timeouts bypass `try` and test isolation.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, RuntimeError::Timeout(_))
    }

    /// Value bound to a catch clause's variable. Thrown values pass through;
    /// every other failure becomes `{ message, stack, code }`.
    pub fn to_catch_value(&self, stack: &[String]) -> Value {
        if let RuntimeError::Thrown(value) = self {
            return value.clone();
        }
        let mut fields = BTreeMap::new();
        fields.insert("message".to_string(), Value::String(self.to_string()));
        fields.insert(
            "stack".to_string(),
            Value::array(stack.iter().cloned().map(Value::String).collect()),
        );
        fields.insert("code".to_string(), Value::string(self.code()));
        Value::dict(fields)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> Self {
        RuntimeError::Io(error.to_string())
    }
}

//=====================================================
// Section 3: Script Errors
//=====================================================

/// Code-tagged failure reported at the CLI boundary.
#[derive(Debug, Clone)]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code_str(), self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<LexError> for ScriptError {
    fn from(value: LexError) -> Self {
        ScriptError::new(ErrorCode::Syntax, value.to_string())
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(value: RuntimeError) -> Self {
        ScriptError::new(value.error_code(), value.to_string())
    }
}

//=====================================================
// Section 4: Tests
//=====================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_taxonomy() {
        assert_eq!(RuntimeError::TypeError("x".into()).code(), "E003");
        assert_eq!(RuntimeError::UndefinedVariable("x".into()).code(), "E004");
        assert_eq!(RuntimeError::Import("tool".into()).code(), "E002");
        assert_eq!(RuntimeError::StackOverflow(256).code(), "E005");
        assert_eq!(RuntimeError::Assertion("boom".into()).code(), "E006");
        assert_eq!(RuntimeError::Timeout(10).code(), "E007");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RuntimeError::NullAccess("name".into()).to_string(),
            "Cannot read property of null or undefined (reading 'name')"
        );
        assert_eq!(
            RuntimeError::Timeout(250).to_string(),
            "Script execution timed out after 250ms"
        );
        assert_eq!(RuntimeError::Assertion("boom".into()).to_string(), "boom");
        assert_eq!(
            RuntimeError::Thrown(Value::string("bad input")).to_string(),
            "bad input"
        );
    }

    #[test]
    fn test_catch_value_shapes() {
        let thrown = RuntimeError::thrown(Value::Number(42.0));
        assert_eq!(thrown.to_catch_value(&[]), Value::Number(42.0));

        let raised = RuntimeError::thrown(Value::string("boom"));
        assert_eq!(raised.code(), "E005");
        let Value::Dict(fields) = raised.to_catch_value(&["f".into()]) else {
            panic!("expected dict");
        };
        assert_eq!(fields.borrow()["message"], Value::string("boom"));
        assert_eq!(fields.borrow()["stack"], Value::array(vec![Value::string("f")]));

        let host = RuntimeError::UndefinedVariable("y".into());
        let Value::Dict(fields) = host.to_catch_value(&["inner".into(), "outer".into()]) else {
            panic!("expected dict");
        };
        let fields = fields.borrow();
        assert_eq!(fields["message"], Value::string("Undefined variable: y"));
        assert_eq!(fields["code"], Value::string("E004"));
        assert_eq!(
            fields["stack"],
            Value::array(vec![Value::string("inner"), Value::string("outer")])
        );
    }

    #[test]
    fn test_timeout_is_not_catchable() {
        assert!(!RuntimeError::Timeout(1).is_catchable());
        assert!(RuntimeError::Host("x".into()).is_catchable());
    }

    #[test]
    fn test_lex_error_maps_to_e001() {
        let err = crate::tokenizer::tokenize("let a = @").unwrap_err();
        let script_err: ScriptError = err.into();
        assert_eq!(script_err.code_str(), "E001");
    }
}

//=====================================================
// End of file
//=====================================================
