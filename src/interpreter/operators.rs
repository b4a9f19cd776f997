//=====================================================
// File: interpreter/operators.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Operator semantics
// Objective: Apply binary, unary, and compound-assignment operators to
//            runtime values without implicit coercion beyond string `+`
//=====================================================

use super::errors::RuntimeError;
use super::value::{format_number, Value, MAX_COLLECTION_LEN};
use crate::ast::Operator;
use crate::tokenizer::TokenKind;

/// Operator kinds `binary_op` understands. `&&`/`||` are listed so they pass
/// resolution; the evaluator short-circuits them before reaching `binary_op`.
fn is_binary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::StarStar
            | TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::AndAnd
            | TokenKind::OrOr
    )
}

pub fn resolve_binary(operator: &Operator) -> Result<TokenKind, RuntimeError> {
    match operator {
        Operator::Tag(kind) if is_binary(*kind) => Ok(*kind),
        other => Err(RuntimeError::UnknownBinaryOperator(other.to_string())),
    }
}

pub fn resolve_unary(operator: &Operator) -> Result<TokenKind, RuntimeError> {
    match operator {
        Operator::Tag(kind @ (TokenKind::Minus | TokenKind::Plus | TokenKind::Bang)) => Ok(*kind),
        other => Err(RuntimeError::UnknownUnaryOperator(other.to_string())),
    }
}

/// Resolve an assignment operator. `None` means plain `=`; otherwise the
/// binary operator the compound form combines with.
pub fn resolve_assignment(operator: &Operator) -> Result<Option<TokenKind>, RuntimeError> {
    match operator {
        Operator::Tag(TokenKind::Equal) => Ok(None),
        Operator::Tag(TokenKind::PlusEqual) => Ok(Some(TokenKind::Plus)),
        Operator::Tag(TokenKind::MinusEqual) => Ok(Some(TokenKind::Minus)),
        Operator::Tag(TokenKind::StarEqual) => Ok(Some(TokenKind::Star)),
        Operator::Tag(TokenKind::SlashEqual) => Ok(Some(TokenKind::Slash)),
        Operator::Tag(TokenKind::PercentEqual) => Ok(Some(TokenKind::Percent)),
        other => Err(RuntimeError::UnknownBinaryOperator(other.to_string())),
    }
}

fn mismatch(kind: TokenKind, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!(
        "Cannot apply '{}' to {} and {}",
        kind.symbol().unwrap_or("?"),
        left.type_name(),
        right.type_name()
    ))
}

fn repeat(text: &str, count: f64) -> Result<Value, RuntimeError> {
    if text.is_empty() || count.is_nan() || count < 1.0 {
        return Ok(Value::string(""));
    }
    let count = count.trunc();
    if (text.len() as f64) * count > MAX_COLLECTION_LEN as f64 {
        return Err(RuntimeError::ArgumentError(format!(
            "String repeat count {} is too large",
            format_number(count)
        )));
    }
    Ok(Value::String(text.repeat(count as usize)))
}

pub fn binary_op(kind: TokenKind, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    use TokenKind::*;
    match kind {
        Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(mismatch(kind, left, right)),
        },
        Star => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
                repeat(s, *n)
            }
            _ => Err(mismatch(kind, left, right)),
        },
        Minus | Slash | Percent | StarStar => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(mismatch(kind, left, right));
            };
            Ok(Value::Number(match kind {
                Minus => a - b,
                Slash => a / b,
                Percent => a % b,
                _ => a.powf(*b),
            }))
        }
        EqualEqual => Ok(Value::Bool(left.strict_equals(right))),
        BangEqual => Ok(Value::Bool(!left.strict_equals(right))),
        Less | LessEqual | Greater | GreaterEqual => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => return Err(mismatch(kind, left, right)),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match kind {
                Less => ordering.is_lt(),
                LessEqual => ordering.is_le(),
                Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        AndAnd => Ok(if left.is_truthy() { right.clone() } else { left.clone() }),
        OrOr => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
        other => Err(RuntimeError::UnknownBinaryOperator(other.to_string())),
    }
}

pub fn unary_op(kind: TokenKind, operand: &Value) -> Result<Value, RuntimeError> {
    match (kind, operand) {
        (TokenKind::Bang, value) => Ok(Value::Bool(!value.is_truthy())),
        (TokenKind::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
        (TokenKind::Plus, Value::Number(n)) => Ok(Value::Number(*n)),
        (TokenKind::Minus | TokenKind::Plus, value) => Err(RuntimeError::TypeError(format!(
            "Cannot apply unary '{}' to {}",
            kind.symbol().unwrap_or("?"),
            value.type_name()
        ))),
        (other, _) => Err(RuntimeError::UnknownUnaryOperator(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_plus_concatenates_when_either_side_is_text() {
        assert_eq!(binary_op(TokenKind::Plus, &Value::string("3"), &num(4.0)).unwrap(), Value::string("34"));
        assert_eq!(binary_op(TokenKind::Plus, &num(3.0), &Value::string("4")).unwrap(), Value::string("34"));
        assert_eq!(binary_op(TokenKind::Plus, &num(3.0), &num(4.0)).unwrap(), num(7.0));
        assert_eq!(
            binary_op(TokenKind::Plus, &Value::string("n="), &Value::Null).unwrap(),
            Value::string("n=null")
        );
    }

    #[test]
    fn test_string_repeat() {
        assert_eq!(binary_op(TokenKind::Star, &Value::string("ab"), &num(3.0)).unwrap(), Value::string("ababab"));
        assert_eq!(binary_op(TokenKind::Star, &num(2.0), &Value::string("x")).unwrap(), Value::string("xx"));
        assert_eq!(binary_op(TokenKind::Star, &Value::string("x"), &num(-1.0)).unwrap(), Value::string(""));
        assert_eq!(binary_op(TokenKind::Star, &Value::string(""), &num(f64::INFINITY)).unwrap(), Value::string(""));
    }

    #[test]
    fn test_string_repeat_rejects_huge_counts() {
        let err = binary_op(TokenKind::Star, &Value::string("ab"), &num(1e19)).unwrap_err();
        assert!(matches!(err, RuntimeError::ArgumentError(_)));
        assert!(err.is_catchable());
        assert!(binary_op(TokenKind::Star, &num(f64::INFINITY), &Value::string("x")).is_err());
    }

    #[test]
    fn test_float_semantics() {
        assert_eq!(binary_op(TokenKind::Slash, &num(1.0), &num(0.0)).unwrap(), num(f64::INFINITY));
        let Value::Number(nan) = binary_op(TokenKind::Percent, &num(1.0), &num(0.0)).unwrap() else {
            panic!("expected number");
        };
        assert!(nan.is_nan());
        assert_eq!(binary_op(TokenKind::StarStar, &num(2.0), &num(10.0)).unwrap(), num(1024.0));
        assert_eq!(binary_op(TokenKind::Percent, &num(-7.0), &num(3.0)).unwrap(), num(-1.0));
    }

    #[test]
    fn test_equality_is_strict() {
        assert_eq!(binary_op(TokenKind::EqualEqual, &num(1.0), &Value::string("1")).unwrap(), Value::Bool(false));
        assert_eq!(binary_op(TokenKind::BangEqual, &Value::Null, &Value::Undefined).unwrap(), Value::Bool(true));
        assert_eq!(binary_op(TokenKind::EqualEqual, &Value::string("a"), &Value::string("a")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_comparison_rejects_mixed_types() {
        assert_eq!(binary_op(TokenKind::Less, &num(1.0), &num(2.0)).unwrap(), Value::Bool(true));
        assert_eq!(binary_op(TokenKind::GreaterEqual, &Value::string("b"), &Value::string("a")).unwrap(), Value::Bool(true));
        let err = binary_op(TokenKind::Less, &num(1.0), &Value::string("2")).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError(_)));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary_op(TokenKind::Bang, &Value::string("")).unwrap(), Value::Bool(true));
        assert_eq!(unary_op(TokenKind::Minus, &num(5.0)).unwrap(), num(-5.0));
        assert!(unary_op(TokenKind::Minus, &Value::string("5")).is_err());
    }

    #[test]
    fn test_unknown_operators() {
        let err = resolve_binary(&Operator::Symbol(">>>".into())).unwrap_err();
        assert_eq!(err.to_string(), "Unknown binary operator: >>>");
        assert!(resolve_unary(&Operator::Tag(TokenKind::Star)).is_err());
        assert_eq!(resolve_assignment(&Operator::Tag(TokenKind::PlusEqual)).unwrap(), Some(TokenKind::Plus));
        assert_eq!(resolve_assignment(&Operator::Tag(TokenKind::Equal)).unwrap(), None);
    }
}

//=====================================================
// End of file
//=====================================================
