//=====================================================
// File: interpreter/mod.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script tree-walking interpreter
// Objective: Execute normalized AST statements against a scope chain under a
//            wall-clock budget and report a ScriptResult
//=====================================================

pub mod errors;
pub mod expressions;
pub mod operators;
pub mod result;
pub mod scope;
pub mod value;

pub use errors::{ErrorCode, RuntimeError, ScriptError};
pub use result::{BuddyScriptResult, FcsScriptResult, ScriptResult, TestResult};
pub use scope::{RuntimeContext, ScopeRef};
pub use value::{
    Class, Function, FunctionKind, Instance, NativeArity, NativeFn, NativeFunction, NativeHandler,
    Value,
};

use crate::ast::{normalize, Ast, Node, NodeRef, Program};
use crate::bindings::{BindingContext, HostBindings};
use crate::builtins;
use crate::config::ScriptConfig;
use futures::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

//=====================================================
// Section 1: Control-Flow Signals
//=====================================================

/// Outcome of executing one statement.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

//=====================================================
// Section 2: Interpreter State
//=====================================================

pub struct Interpreter {
    config: ScriptConfig,
    globals: ScopeRef,
    binding_context: BindingContext,
    output: Vec<String>,
    test_results: Vec<TestResult>,
    exports: Vec<String>,
    call_stack: Vec<String>,
    /// Frames active when the current failure left its innermost function.
    failure_stack: Option<Vec<String>>,
    deadline: Instant,
}

impl Interpreter {
    pub fn new(config: ScriptConfig) -> Self {
        Self::with_bindings(config, HostBindings::default())
    }

    /// Build an interpreter whose global scope holds the builtins, one dict
    /// per binding namespace, and the configured variables.
    pub fn with_bindings(config: ScriptConfig, bindings: HostBindings) -> Self {
        let mut interpreter = Self {
            binding_context: BindingContext::from_config(&config),
            globals: RuntimeContext::global(),
            output: Vec::new(),
            test_results: Vec::new(),
            exports: Vec::new(),
            call_stack: Vec::new(),
            failure_stack: None,
            deadline: Instant::now() + config.timeout_duration(),
            config,
        };
        builtins::register_all(&mut interpreter);
        for (namespace, value) in bindings.namespace_values() {
            interpreter.globals.borrow_mut().define_function(namespace, value);
        }
        let variables: Vec<(String, Value)> = interpreter
            .config
            .variables
            .iter()
            .map(|(name, json)| (name.clone(), Value::from_json(json)))
            .collect();
        for (name, value) in variables {
            interpreter.define_global(name, value);
        }
        interpreter
    }

    pub fn register_builtin(&mut self, name: &str, arity: NativeArity, func: NativeFn) {
        self.globals.borrow_mut().define_function(
            name,
            Value::native(name, arity, NativeHandler::Builtin(func)),
        );
    }

    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        scope::lookup(&self.globals, name)
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn binding_context(&self) -> &BindingContext {
        &self.binding_context
    }

    /// Lines written since the last `execute` began.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn push_output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn reset(&mut self, started: Instant) {
        self.output.clear();
        self.test_results.clear();
        self.exports.clear();
        self.call_stack.clear();
        self.failure_stack = None;
        self.deadline = started + self.config.timeout_duration();
    }

    pub(crate) fn check_deadline(&self) -> Result<(), RuntimeError> {
        if Instant::now() >= self.deadline {
            return Err(RuntimeError::Timeout(self.config.timeout));
        }
        Ok(())
    }

    /// Frames captured for the failure being handled, innermost first. A
    /// failure caught inside the function that raised it sees the live stack.
    pub(crate) fn take_failure_stack(&mut self) -> Vec<String> {
        self.failure_stack
            .take()
            .unwrap_or_else(|| self.call_stack.iter().rev().cloned().collect())
    }

    pub(crate) fn record_failure_frames(&mut self) {
        if self.failure_stack.is_none() {
            self.failure_stack = Some(self.call_stack.iter().rev().cloned().collect());
        }
    }

    //=====================================================
    // Section 3: Program Execution
    //=====================================================

    /// Run `program` to completion or first uncaught failure. Globals persist
    /// across calls; output, test results and timing are per call.
    pub async fn execute(&mut self, program: &Program) -> ScriptResult {
        let started = Instant::now();
        self.reset(started);
        debug!(
            statements = program.statements.len(),
            timeout_ms = self.config.timeout,
            verbose = self.config.verbose,
            "executing program"
        );

        let mut return_value = None;
        let mut error = None;
        for statement in &program.statements {
            let globals = Rc::clone(&self.globals);
            match self.execute_statement(statement, globals).await {
                Ok(Flow::Normal(_)) => {}
                Ok(Flow::Return(value)) => {
                    return_value = Some(value);
                    break;
                }
                Ok(Flow::Break) => {
                    error = Some(RuntimeError::StrayControlFlow("Break"));
                    break;
                }
                Ok(Flow::Continue) => {
                    error = Some(RuntimeError::StrayControlFlow("Continue"));
                    break;
                }
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        let duration = started.elapsed();
        if let Some(err) = &error {
            warn!(code = err.code(), error = %err, "script failed");
        }
        debug!(
            success = error.is_none(),
            duration_ms = duration_ms(duration),
            output_lines = self.output.len(),
            "program finished"
        );

        ScriptResult {
            success: error.is_none(),
            output: std::mem::take(&mut self.output),
            error: error.map(|err| err.to_string()),
            return_value,
            duration: duration_ms(duration),
            test_results: self
                .config
                .verbose
                .then(|| std::mem::take(&mut self.test_results)),
            exports: std::mem::take(&mut self.exports),
        }
    }

    //=====================================================
    // Section 4: Statements
    //=====================================================

    pub fn execute_statement<'a>(
        &'a mut self,
        node: &'a Ast,
        scope: ScopeRef,
    ) -> LocalBoxFuture<'a, Result<Flow, RuntimeError>> {
        async move {
            self.check_deadline()?;
            let normalized = normalize(node);
            let Ast::Canonical(node) = normalized.as_ref() else {
                return Err(RuntimeError::UnsupportedNode(normalized.type_tag()));
            };
            self.execute_node(node, scope).await
        }
        .boxed_local()
    }

    fn execute_node<'a>(
        &'a mut self,
        node: &'a Node,
        scope: ScopeRef,
    ) -> LocalBoxFuture<'a, Result<Flow, RuntimeError>> {
        async move {
            match node {
                Node::Block { statements } => {
                    let block_scope = RuntimeContext::child(&scope);
                    self.execute_block(statements, block_scope).await
                }
                Node::ExpressionStatement { expression } => {
                    Ok(Flow::Normal(self.evaluate(expression, scope).await?))
                }
                Node::VarDeclaration {
                    name,
                    initializer,
                    is_const,
                } => {
                    let value = match initializer {
                        Some(init) => self.evaluate(init, Rc::clone(&scope)).await?,
                        None => Value::Null,
                    };
                    if *is_const {
                        scope.borrow_mut().define_const(name.as_str(), value);
                    } else {
                        scope.borrow_mut().define(name.as_str(), value);
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Node::FunctionDeclaration { name, .. } => {
                    let function = self.make_function(node, &scope);
                    scope.borrow_mut().define_function(name.as_str(), function);
                    Ok(Flow::Normal(Value::Null))
                }
                Node::ClassDeclaration { name, members } => {
                    let class = Value::Class(Rc::new(Class {
                        name: name.clone(),
                        members: members.clone(),
                        closure: Rc::clone(&scope),
                    }));
                    scope.borrow_mut().define_function(name.as_str(), class);
                    Ok(Flow::Normal(Value::Null))
                }
                Node::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    if self.evaluate(condition, Rc::clone(&scope)).await?.is_truthy() {
                        self.execute_statement(then_branch, scope).await
                    } else if let Some(else_branch) = else_branch {
                        self.execute_statement(else_branch, scope).await
                    } else {
                        Ok(Flow::Normal(Value::Null))
                    }
                }
                Node::While { condition, body } => {
                    while self.evaluate(condition, Rc::clone(&scope)).await?.is_truthy() {
                        match self.execute_statement(body, Rc::clone(&scope)).await? {
                            Flow::Break => break,
                            Flow::Return(value) => return Ok(Flow::Return(value)),
                            Flow::Continue | Flow::Normal(_) => {}
                        }
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Node::For {
                    variable,
                    iterable,
                    body,
                } => {
                    let items = self.evaluate(iterable, Rc::clone(&scope)).await?;
                    for item in iteration_items(&items)? {
                        let loop_scope = RuntimeContext::child(&scope);
                        loop_scope.borrow_mut().define(variable.as_str(), item);
                        match self.execute_statement(body, loop_scope).await? {
                            Flow::Break => break,
                            Flow::Return(value) => return Ok(Flow::Return(value)),
                            Flow::Continue | Flow::Normal(_) => {}
                        }
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Node::ForCStyle {
                    init,
                    test,
                    update,
                    body,
                } => {
                    let loop_scope = RuntimeContext::child(&scope);
                    if let Some(init) = init {
                        self.execute_statement(init, Rc::clone(&loop_scope)).await?;
                    }
                    loop {
                        if let Some(test) = test {
                            if !self.evaluate(test, Rc::clone(&loop_scope)).await?.is_truthy() {
                                break;
                            }
                        } else {
                            self.check_deadline()?;
                        }
                        match self.execute_statement(body, Rc::clone(&loop_scope)).await? {
                            Flow::Break => break,
                            Flow::Return(value) => return Ok(Flow::Return(value)),
                            Flow::Continue | Flow::Normal(_) => {}
                        }
                        if let Some(update) = update {
                            self.evaluate(update, Rc::clone(&loop_scope)).await?;
                        }
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Node::Return { value } => {
                    let value = match value {
                        Some(value) => self.evaluate(value, scope).await?,
                        None => Value::Null,
                    };
                    Ok(Flow::Return(value))
                }
                Node::Break => Ok(Flow::Break),
                Node::Continue => Ok(Flow::Continue),
                Node::Try {
                    try_block,
                    catch_clauses,
                    finally_block,
                } => {
                    let outcome = self.execute_statement(try_block, Rc::clone(&scope)).await;
                    let outcome = match (outcome, catch_clauses.first()) {
                        (Err(err), Some(clause)) if err.is_catchable() => {
                            let stack = self.take_failure_stack();
                            debug!(code = err.code(), error = %err, "caught failure");
                            let catch_scope = RuntimeContext::child(&scope);
                            if let Some(param) = &clause.param {
                                catch_scope
                                    .borrow_mut()
                                    .define(param.as_str(), err.to_catch_value(&stack));
                            }
                            self.execute_statement(&clause.body, catch_scope).await
                        }
                        (outcome, _) => outcome,
                    };
                    if let Err(err) = &outcome {
                        if !err.is_catchable() {
                            return outcome;
                        }
                    }
                    if let Some(finally_block) = finally_block {
                        match self.execute_statement(finally_block, scope).await? {
                            Flow::Normal(_) => {}
                            signal => return Ok(signal),
                        }
                    }
                    outcome
                }
                Node::Throw { value } => {
                    let value = self.evaluate(value, scope).await?;
                    Err(RuntimeError::thrown(value))
                }
                Node::Import {
                    source,
                    names,
                    alias,
                } => {
                    self.import(source, names, alias.as_deref(), &scope)?;
                    Ok(Flow::Normal(Value::Null))
                }
                Node::Export { declaration } => {
                    let flow = self.execute_statement(declaration, Rc::clone(&scope)).await?;
                    if let Some(name) = exported_name(declaration) {
                        if !self.exports.contains(&name) {
                            self.exports.push(name);
                        }
                    }
                    Ok(flow)
                }
                Node::TestDeclaration { name, body, tags } => {
                    if !self.config.verbose {
                        trace!(test = %name, "skipping test outside verbose mode");
                        return Ok(Flow::Normal(Value::Null));
                    }
                    trace!(test = %name, tags = ?tags, "running test");
                    let test_scope = RuntimeContext::child(&scope);
                    match self.execute_statement(body, test_scope).await {
                        Ok(_) => {
                            self.output.push(format!("✓ {}", name));
                            self.test_results.push(TestResult::passed(name.as_str()));
                        }
                        Err(err) if err.is_catchable() => {
                            self.failure_stack = None;
                            let message = err.to_string();
                            self.output.push(format!("✗ {}: {}", name, message));
                            self.test_results.push(TestResult::failed(name.as_str(), message));
                        }
                        Err(err) => return Err(err),
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Node::Assert { condition, message } => {
                    if self.evaluate(condition, Rc::clone(&scope)).await?.is_truthy() {
                        return Ok(Flow::Normal(Value::Null));
                    }
                    let message = match message {
                        Some(message) => self.evaluate(message, scope).await?.to_string(),
                        None => "Assertion failed".to_string(),
                    };
                    Err(RuntimeError::Assertion(message))
                }
                expression => Ok(Flow::Normal(
                    self.evaluate_expression(expression, scope).await?,
                )),
            }
        }
        .boxed_local()
    }

    /// Run statements in order until one yields a signal.
    pub(crate) async fn execute_block(
        &mut self,
        statements: &[NodeRef],
        scope: ScopeRef,
    ) -> Result<Flow, RuntimeError> {
        let mut last = Value::Null;
        for statement in statements {
            match self.execute_statement(statement, Rc::clone(&scope)).await? {
                Flow::Normal(value) => last = value,
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn import(
        &mut self,
        source: &str,
        names: &[String],
        alias: Option<&str>,
        scope: &ScopeRef,
    ) -> Result<(), RuntimeError> {
        let namespace = match scope::lookup(&self.globals, source) {
            Some(namespace @ (Value::Dict(_) | Value::Instance(_))) => namespace,
            _ => {
                return Err(RuntimeError::Import(format!(
                    "Unknown module '{}'",
                    source
                )));
            }
        };
        for name in names {
            let member = match &namespace {
                Value::Dict(entries) => entries.borrow().get(name).cloned(),
                Value::Instance(instance) => instance.fields.borrow().get(name).cloned(),
                _ => None,
            };
            let Some(member) = member else {
                return Err(RuntimeError::Import(format!(
                    "'{}' is not exported by '{}'",
                    name, source
                )));
            };
            scope.borrow_mut().define(name.as_str(), member);
        }
        if let Some(alias) = alias {
            scope.borrow_mut().define(alias, namespace);
        }
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Snapshot of what a `for ... in` loop visits.
fn iteration_items(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().clone()),
        Value::Dict(entries) => Ok(entries.borrow().keys().cloned().map(Value::String).collect()),
        Value::Instance(instance) => Ok(instance
            .fields
            .borrow()
            .keys()
            .cloned()
            .map(Value::String)
            .collect()),
        Value::String(text) => Ok(text.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(RuntimeError::TypeError(format!(
            "Value of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn exported_name(declaration: &Ast) -> Option<String> {
    match normalize(declaration).as_ref() {
        Ast::Canonical(Node::Identifier { name }) => Some(name.clone()),
        Ast::Canonical(node) => node.declared_name().map(str::to_string),
        _ => None,
    }
}

//=====================================================
// End of file
//=====================================================
