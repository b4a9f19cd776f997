//=====================================================
// File: interpreter/scope.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Lexical scope chain
// Objective: Provide the RuntimeContext chain used for variable lookup,
//            declaration, and assignment during interpretation
//=====================================================

use super::errors::RuntimeError;
use super::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub type ScopeRef = Rc<RefCell<RuntimeContext>>;

/// One lexical scope. Closures hold a `ScopeRef` to their defining scope, so
/// later writes to a captured variable are visible inside the closure.
#[derive(Debug, Default)]
pub struct RuntimeContext {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Value>,
    constants: HashSet<String>,
    parent: Option<ScopeRef>,
}

impl RuntimeContext {
    pub fn global() -> ScopeRef {
        Rc::new(RefCell::new(RuntimeContext::default()))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(RuntimeContext {
            parent: Some(Rc::clone(parent)),
            ..RuntimeContext::default()
        }))
    }

    /// Declare (or redeclare) a mutable binding in this scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.constants.remove(&name);
        self.variables.insert(name, value);
    }

    pub fn define_const(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.constants.insert(name.clone());
        self.variables.insert(name, value);
    }

    pub fn define_function(&mut self, name: impl Into<String>, value: Value) {
        self.functions.insert(name.into(), value);
    }

    fn local(&self, name: &str) -> Option<Value> {
        self.variables
            .get(name)
            .or_else(|| self.functions.get(name))
            .cloned()
    }
}

/// Walk the chain outward from `scope`.
pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
    let mut current = Some(Rc::clone(scope));
    while let Some(context) = current {
        let context = context.borrow();
        if let Some(value) = context.local(name) {
            return Some(value);
        }
        current = context.parent.clone();
    }
    None
}

/// Assign to the scope that declared `name`; unknown names are declared in
/// `scope` itself.
pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<(), RuntimeError> {
    let mut current = Some(Rc::clone(scope));
    while let Some(context) = current {
        let mut ctx = context.borrow_mut();
        if ctx.variables.contains_key(name) {
            if ctx.constants.contains(name) {
                return Err(RuntimeError::ConstAssignment(name.to_string()));
            }
            ctx.variables.insert(name.to_string(), value);
            return Ok(());
        }
        if ctx.functions.contains_key(name) {
            ctx.functions.insert(name.to_string(), value);
            return Ok(());
        }
        current = ctx.parent.clone();
    }
    scope.borrow_mut().define(name, value);
    Ok(())
}

//=====================================================
// Section: Tests
//=====================================================


//=====================================================
// End of file
//=====================================================
