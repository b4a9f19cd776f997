//=====================================================
// File: interpreter/expressions.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Expression evaluation
// Objective: Evaluate expression nodes, dispatch calls to closures, natives
//            and classes, and implement member/index reads and writes
//=====================================================

use super::errors::RuntimeError;
use super::operators::{binary_op, resolve_assignment, resolve_binary, resolve_unary, unary_op};
use super::scope::{self, RuntimeContext, ScopeRef};
use super::value::{
    Class, Function, FunctionKind, Instance, NativeHandler, Value, MAX_COLLECTION_LEN,
    NAMED_ARGS_MARKER,
};
use super::{Flow, Interpreter};
use crate::ast::{normalize, Ast, InterpolationPart, LiteralValue, Node, Param};
use crate::tokenizer::TokenKind;
use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::BTreeMap;
use std::rc::Rc;

//=====================================================
// Section 1: Evaluation Entry Points
//=====================================================

impl Interpreter {
    /// Evaluate an expression node in either dialect.
    pub fn evaluate<'a>(
        &'a mut self,
        node: &'a Ast,
        scope: ScopeRef,
    ) -> LocalBoxFuture<'a, Result<Value, RuntimeError>> {
        async move {
            self.check_deadline()?;
            let normalized = normalize(node);
            let Ast::Canonical(node) = normalized.as_ref() else {
                return Err(RuntimeError::UnsupportedNode(normalized.type_tag()));
            };
            self.evaluate_expression(node, scope).await
        }
        .boxed_local()
    }

    pub(crate) fn evaluate_expression<'a>(
        &'a mut self,
        node: &'a Node,
        scope: ScopeRef,
    ) -> LocalBoxFuture<'a, Result<Value, RuntimeError>> {
        async move {
            match node {
                Node::Literal { value } => Ok(literal_value(value)),
                Node::Identifier { name } => match scope::lookup(&scope, name) {
                    Some(value) => Ok(value),
                    None if name == "undefined" => Ok(Value::Undefined),
                    None => Err(RuntimeError::UndefinedVariable(name.clone())),
                },
                Node::Binary {
                    operator,
                    left,
                    right,
                } => {
                    let kind = resolve_binary(operator)?;
                    let left = self.evaluate(left, Rc::clone(&scope)).await?;
                    match kind {
                        TokenKind::AndAnd if !left.is_truthy() => Ok(left),
                        TokenKind::OrOr if left.is_truthy() => Ok(left),
                        TokenKind::AndAnd | TokenKind::OrOr => self.evaluate(right, scope).await,
                        _ => {
                            let right = self.evaluate(right, scope).await?;
                            binary_op(kind, &left, &right)
                        }
                    }
                }
                Node::Unary { operator, operand } => {
                    let kind = resolve_unary(operator)?;
                    let operand = self.evaluate(operand, scope).await?;
                    unary_op(kind, &operand)
                }
                Node::Assignment {
                    operator,
                    target,
                    value,
                } => {
                    let combine = resolve_assignment(operator)?;
                    self.assign(target, combine, value, scope).await
                }
                Node::Call {
                    callee,
                    arguments,
                    named_arguments,
                } => {
                    let callee = self.evaluate(callee, Rc::clone(&scope)).await?;
                    let mut args = Vec::with_capacity(arguments.len() + 1);
                    for argument in arguments {
                        args.push(self.evaluate(argument, Rc::clone(&scope)).await?);
                    }
                    if let Some(named) = named_arguments.as_ref().filter(|named| !named.is_empty()) {
                        let mut bag = BTreeMap::new();
                        for (name, argument) in named {
                            let value = self.evaluate(argument, Rc::clone(&scope)).await?;
                            bag.insert(name.clone(), value);
                        }
                        bag.insert(NAMED_ARGS_MARKER.to_string(), Value::Bool(true));
                        args.push(Value::dict(bag));
                    }
                    self.call_value(callee, args).await
                }
                Node::Member { object, property } => {
                    let object = self.evaluate(object, scope).await?;
                    get_member(&object, property)
                }
                Node::Index { object, index } => {
                    let object = self.evaluate(object, Rc::clone(&scope)).await?;
                    let index = self.evaluate(index, scope).await?;
                    get_index(&object, &index)
                }
                Node::Array { elements } => {
                    let mut items = Vec::with_capacity(elements.len());
                    for element in elements {
                        items.push(self.evaluate(element, Rc::clone(&scope)).await?);
                    }
                    Ok(Value::array(items))
                }
                Node::Dict { entries } => {
                    let mut fields = BTreeMap::new();
                    for (key, entry) in entries {
                        let value = self.evaluate(entry, Rc::clone(&scope)).await?;
                        fields.insert(key.clone(), value);
                    }
                    Ok(Value::dict(fields))
                }
                Node::Lambda { .. } | Node::FunctionDeclaration { .. } => {
                    Ok(self.make_function(node, &scope))
                }
                Node::Interpolation { parts } => {
                    let mut text = String::new();
                    for part in parts {
                        match part {
                            InterpolationPart::Text(literal) => text.push_str(literal),
                            InterpolationPart::Expression(expression) => {
                                let value = self.evaluate(expression, Rc::clone(&scope)).await?;
                                text.push_str(&value.to_string());
                            }
                        }
                    }
                    Ok(Value::String(text))
                }
                Node::Ternary {
                    condition,
                    consequent,
                    alternate,
                } => {
                    if self.evaluate(condition, Rc::clone(&scope)).await?.is_truthy() {
                        self.evaluate(consequent, scope).await
                    } else {
                        self.evaluate(alternate, scope).await
                    }
                }
                // The whole evaluation path is already one suspension chain.
                Node::Await { expression } => self.evaluate(expression, scope).await,
                statement => Err(RuntimeError::UnsupportedNode(format!(
                    "{} in expression position",
                    statement.type_tag()
                ))),
            }
        }
        .boxed_local()
    }

    /// Closure value for a `FunctionDeclaration` or `Lambda` node.
    pub(crate) fn make_function(&self, node: &Node, scope: &ScopeRef) -> Value {
        let function = match node {
            Node::FunctionDeclaration {
                name,
                params,
                body,
                is_async,
            } => Function {
                name: name.clone(),
                params: params.clone(),
                body: Rc::clone(body),
                closure: Rc::clone(scope),
                kind: FunctionKind::Declared,
                is_async: *is_async,
            },
            Node::Lambda { params, body } => Function {
                name: "<lambda>".to_string(),
                params: params.iter().map(Param::named).collect(),
                body: Rc::clone(body),
                closure: Rc::clone(scope),
                kind: FunctionKind::Lambda,
                is_async: false,
            },
            other => unreachable!("make_function called with {}", other.type_tag()),
        };
        Value::Function(Rc::new(function))
    }

    //=====================================================
    // Section 2: Assignment
    //=====================================================

    /// Write `value` into `target`. Compound forms read the target before
    /// the right-hand side is evaluated.
    async fn assign(
        &mut self,
        target: &Ast,
        combine: Option<TokenKind>,
        value: &Ast,
        scope: ScopeRef,
    ) -> Result<Value, RuntimeError> {
        let normalized = normalize(target);
        match normalized.as_ref() {
            Ast::Canonical(Node::Identifier { name }) => {
                let current = match combine {
                    Some(_) => Some(
                        scope::lookup(&scope, name)
                            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?,
                    ),
                    None => None,
                };
                let rhs = self.evaluate(value, Rc::clone(&scope)).await?;
                let new_value = combined(combine, current, rhs)?;
                scope::assign(&scope, name, new_value.clone())?;
                Ok(new_value)
            }
            Ast::Canonical(Node::Member { object, property }) => {
                let object = self.evaluate(object, Rc::clone(&scope)).await?;
                let current = match combine {
                    Some(_) => Some(get_member(&object, property)?),
                    None => None,
                };
                let rhs = self.evaluate(value, scope).await?;
                let new_value = combined(combine, current, rhs)?;
                set_member(&object, property, new_value.clone())?;
                Ok(new_value)
            }
            Ast::Canonical(Node::Index { object, index }) => {
                let object = self.evaluate(object, Rc::clone(&scope)).await?;
                let index = self.evaluate(index, Rc::clone(&scope)).await?;
                let current = match combine {
                    Some(_) => Some(get_index(&object, &index)?),
                    None => None,
                };
                let rhs = self.evaluate(value, scope).await?;
                let new_value = combined(combine, current, rhs)?;
                set_index(&object, &index, new_value.clone())?;
                Ok(new_value)
            }
            other => Err(RuntimeError::TypeError(format!(
                "Invalid assignment target: {}",
                other.type_tag()
            ))),
        }
    }

    //=====================================================
    // Section 3: Calls
    //=====================================================

    /// Invoke any callable value with already-evaluated arguments.
    pub fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
    ) -> LocalBoxFuture<'_, Result<Value, RuntimeError>> {
        async move {
            match callee {
                Value::Function(function) => {
                    if self.call_stack.len() >= self.config.max_call_depth {
                        return Err(RuntimeError::StackOverflow(self.config.max_call_depth));
                    }
                    self.call_stack.push(function.name.clone());
                    let result = self.call_function(&function, args).await;
                    if result.is_err() {
                        self.record_failure_frames();
                    }
                    self.call_stack.pop();
                    result
                }
                Value::Native(native) => {
                    let args = strip_named_marker(args);
                    if !native.arity.accepts(args.len()) {
                        return Err(RuntimeError::ArgumentError(format!(
                            "Function '{}' expects {}, got {}",
                            native.name,
                            native.arity.describe(),
                            args.len()
                        )));
                    }
                    match &native.handler {
                        NativeHandler::Builtin(func) => func(self, &args),
                        NativeHandler::Host(binding) => {
                            let binding = Rc::clone(binding);
                            let ctx = self.binding_context.clone();
                            binding.call(&ctx, args).await
                        }
                    }
                }
                Value::Class(class) => self.instantiate(&class, args).await,
                other => Err(RuntimeError::NotCallable(other.repr())),
            }
        }
        .boxed_local()
    }

    async fn call_function(
        &mut self,
        function: &Function,
        mut args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let call_scope = RuntimeContext::child(&function.closure);
        match function.kind {
            FunctionKind::Lambda => {
                for (index, param) in function.params.iter().enumerate() {
                    let value = args.get(index).cloned().unwrap_or(Value::Null);
                    call_scope.borrow_mut().define(param.name.as_str(), value);
                }
            }
            FunctionKind::Declared => {
                let named = take_named_args(&mut args);
                let mut positional = args.into_iter();
                for param in &function.params {
                    let value = match named.as_ref().and_then(|bag| bag.get(&param.name)) {
                        Some(value) => value.clone(),
                        None => match positional.next() {
                            Some(value) => value,
                            None => match &param.default {
                                Some(default) => {
                                    self.evaluate(default, Rc::clone(&function.closure)).await?
                                }
                                None => Value::Null,
                            },
                        },
                    };
                    call_scope.borrow_mut().define(param.name.as_str(), value);
                }
            }
        }

        let body = normalize(&function.body);
        let flow = match body.as_ref() {
            Ast::Canonical(Node::Block { statements }) => {
                self.execute_block(statements, call_scope).await?
            }
            Ast::Canonical(expression) if function.kind == FunctionKind::Lambda => {
                Flow::Return(self.evaluate_expression(expression, call_scope).await?)
            }
            _ => self.execute_statement(&function.body, call_scope).await?,
        };
        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Break => Err(RuntimeError::StrayControlFlow("Break")),
            Flow::Continue => Err(RuntimeError::StrayControlFlow("Continue")),
        }
    }

    /// Build an instance: fields are evaluated eagerly, methods close over a
    /// scope with `this` bound, then a callable `constructor` runs.
    async fn instantiate(&mut self, class: &Class, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let instance = Rc::new(Instance::new(class.name.as_str()));
        let this = Value::Instance(Rc::clone(&instance));
        let method_scope = RuntimeContext::child(&class.closure);
        method_scope.borrow_mut().define_const("this", this.clone());

        for member in &class.members {
            let normalized = normalize(member);
            match normalized.as_ref() {
                Ast::Canonical(Node::VarDeclaration {
                    name, initializer, ..
                }) => {
                    let value = match initializer {
                        Some(init) => self.evaluate(init, Rc::clone(&method_scope)).await?,
                        None => Value::Null,
                    };
                    instance.fields.borrow_mut().insert(name.clone(), value);
                }
                Ast::Canonical(node @ Node::FunctionDeclaration { name, .. }) => {
                    let method = self.make_function(node, &method_scope);
                    instance.fields.borrow_mut().insert(name.clone(), method);
                }
                other => {
                    return Err(RuntimeError::UnsupportedNode(format!(
                        "{} as a class member",
                        other.type_tag()
                    )));
                }
            }
        }

        let constructor = instance.fields.borrow().get("constructor").cloned();
        if let Some(constructor) = constructor.filter(Value::is_callable) {
            self.call_value(constructor, args).await?;
        }
        Ok(this)
    }
}

//=====================================================
// Section 4: Helpers
//=====================================================

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Null => Value::Null,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::String(s.clone()),
    }
}

fn combined(
    combine: Option<TokenKind>,
    current: Option<Value>,
    rhs: Value,
) -> Result<Value, RuntimeError> {
    match (combine, current) {
        (Some(kind), Some(current)) => binary_op(kind, &current, &rhs),
        _ => Ok(rhs),
    }
}

fn is_named_bag(value: &Value) -> bool {
    matches!(value, Value::Dict(fields) if fields.borrow().contains_key(NAMED_ARGS_MARKER))
}

/// Pop a trailing named-argument bag, marker removed.
fn take_named_args(args: &mut Vec<Value>) -> Option<BTreeMap<String, Value>> {
    if !args.last().is_some_and(is_named_bag) {
        return None;
    }
    let Some(Value::Dict(fields)) = args.pop() else {
        return None;
    };
    let mut fields = fields.borrow().clone();
    fields.remove(NAMED_ARGS_MARKER);
    Some(fields)
}

/// Natives receive named arguments as a plain trailing options dict.
fn strip_named_marker(mut args: Vec<Value>) -> Vec<Value> {
    if let Some(fields) = take_named_args(&mut args) {
        args.push(Value::dict(fields));
    }
    args
}

pub(crate) fn get_member(object: &Value, property: &str) -> Result<Value, RuntimeError> {
    match object {
        Value::Null | Value::Undefined => Err(RuntimeError::NullAccess(property.to_string())),
        Value::Dict(fields) => Ok(fields.borrow().get(property).cloned().unwrap_or(Value::Undefined)),
        Value::Instance(instance) => Ok(instance
            .fields
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or(Value::Undefined)),
        Value::String(text) if property == "length" => {
            Ok(Value::Number(text.chars().count() as f64))
        }
        Value::Array(items) if property == "length" => Ok(Value::Number(items.borrow().len() as f64)),
        _ => Ok(Value::Undefined),
    }
}

fn set_member(object: &Value, property: &str, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::Null | Value::Undefined => Err(RuntimeError::NullAccess(property.to_string())),
        Value::Dict(fields) => {
            fields.borrow_mut().insert(property.to_string(), value);
            Ok(())
        }
        Value::Instance(instance) => {
            instance.fields.borrow_mut().insert(property.to_string(), value);
            Ok(())
        }
        other => Err(RuntimeError::TypeError(format!(
            "Cannot set property '{}' on {}",
            property,
            other.type_name()
        ))),
    }
}

/// Non-negative integral index, if `index` is one.
fn array_position(index: f64) -> Option<usize> {
    (index >= 0.0 && index.fract() == 0.0 && index.is_finite()).then_some(index as usize)
}

fn key_of(index: &Value) -> String {
    match index {
        Value::String(key) => key.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn get_index(object: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (object, index) {
        (Value::Null | Value::Undefined, _) => Err(RuntimeError::NullAccess(index.to_string())),
        (Value::Array(items), Value::Number(n)) => Ok(array_position(*n)
            .and_then(|position| items.borrow().get(position).cloned())
            .unwrap_or(Value::Undefined)),
        (Value::String(text), Value::Number(n)) => Ok(array_position(*n)
            .and_then(|position| text.chars().nth(position))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Undefined)),
        (Value::Dict(_) | Value::Instance(_), key) => get_member(object, &key_of(key)),
        (Value::Array(_) | Value::String(_), Value::String(property)) => {
            get_member(object, property)
        }
        (other, index) => Err(RuntimeError::TypeError(format!(
            "Cannot index {} with {}",
            other.type_name(),
            index.type_name()
        ))),
    }
}

fn set_index(object: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
    match (object, index) {
        (Value::Null | Value::Undefined, _) => Err(RuntimeError::NullAccess(index.to_string())),
        (Value::Array(items), Value::Number(n)) => {
            let Some(position) = array_position(*n).filter(|p| *p < MAX_COLLECTION_LEN) else {
                return Err(RuntimeError::ArgumentError(format!(
                    "Invalid array index {}",
                    index
                )));
            };
            let mut items = items.borrow_mut();
            if position >= items.len() {
                items.resize(position + 1, Value::Undefined);
            }
            items[position] = value;
            Ok(())
        }
        (Value::Dict(_) | Value::Instance(_), key) => set_member(object, &key_of(key), value),
        (other, index) => Err(RuntimeError::TypeError(format!(
            "Cannot assign to index {} of {}",
            index.type_name(),
            other.type_name()
        ))),
    }
}

//=====================================================
// Section 5: Tests
//=====================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_reads() {
        let dict = Value::dict(BTreeMap::from([("a".to_string(), Value::Number(1.0))]));
        assert_eq!(get_member(&dict, "a").unwrap(), Value::Number(1.0));
        assert_eq!(get_member(&dict, "b").unwrap(), Value::Undefined);
        assert_eq!(get_member(&Value::string("héllo"), "length").unwrap(), Value::Number(5.0));
        let err = get_member(&Value::Null, "name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot read property of null or undefined (reading 'name')"
        );
    }

    #[test]
    fn test_index_reads_and_writes() {
        let array = Value::array(vec![Value::Number(1.0)]);
        assert_eq!(get_index(&array, &Value::Number(0.0)).unwrap(), Value::Number(1.0));
        assert_eq!(get_index(&array, &Value::Number(5.0)).unwrap(), Value::Undefined);
        assert_eq!(get_index(&array, &Value::Number(-1.0)).unwrap(), Value::Undefined);
        set_index(&array, &Value::Number(2.0), Value::string("z")).unwrap();
        assert_eq!(
            array,
            Value::array(vec![Value::Number(1.0), Value::Undefined, Value::string("z")])
        );
        assert!(set_index(&Value::string("abc"), &Value::Number(0.0), Value::Null).is_err());
    }

    #[test]
    fn test_named_bag_is_popped() {
        let mut bag = BTreeMap::new();
        bag.insert("b".to_string(), Value::Number(5.0));
        bag.insert(NAMED_ARGS_MARKER.to_string(), Value::Bool(true));
        let mut args = vec![Value::Number(1.0), Value::dict(bag)];
        let named = take_named_args(&mut args).unwrap();
        assert_eq!(args, vec![Value::Number(1.0)]);
        assert_eq!(named.get("b"), Some(&Value::Number(5.0)));
        assert!(!named.contains_key(NAMED_ARGS_MARKER));

        let mut plain = vec![Value::dict(BTreeMap::new())];
        assert!(take_named_args(&mut plain).is_none());
        assert_eq!(plain.len(), 1);
    }
}

//=====================================================
// End of file
//=====================================================
