//=====================================================
// File: bindings/mod.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host binding registry
// Objective: Expose host-provided callables to scripts under fixed
//            namespaces, gated by the capabilities the host enables
//=====================================================

pub mod local;

use crate::config::ScriptConfig;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::value::{NativeArity, NativeFunction, NativeHandler, Value};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

//=====================================================
// Section 1: Binding Context
//=====================================================

/// Host settings forwarded to every binding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingContext {
    pub workdir: PathBuf,
    pub dry_run: bool,
    pub enable_ai: bool,
    pub enable_bash: bool,
    pub enable_file_ops: bool,
}

impl BindingContext {
    pub fn from_config(config: &ScriptConfig) -> Self {
        Self {
            workdir: config.workdir.clone(),
            dry_run: config.dry_run,
            enable_ai: config.enable_ai,
            enable_bash: config.enable_bash,
            enable_file_ops: config.enable_file_ops,
        }
    }

    /// Resolve a script-supplied path against `workdir`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workdir.join(candidate)
        }
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::from_config(&ScriptConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Ai,
    Bash,
    FileOps,
}

impl Capability {
    pub fn enabled(self, ctx: &BindingContext) -> bool {
        match self {
            Capability::Ai => ctx.enable_ai,
            Capability::Bash => ctx.enable_bash,
            Capability::FileOps => ctx.enable_file_ops,
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Capability::Ai => "enableAI",
            Capability::Bash => "enableBash",
            Capability::FileOps => "enableFileOps",
        }
    }
}

/// Required namespaces, the capability each needs, and their members.
pub const NAMESPACES: &[(&str, Option<Capability>, &[&str])] = &[
    (
        "grok",
        Some(Capability::Ai),
        &["ask", "chat", "generate", "explain", "review", "clearHistory", "history"],
    ),
    (
        "tool",
        Some(Capability::FileOps),
        &["read", "write", "edit", "multiEdit", "glob", "grep", "rg", "ls", "stat"],
    ),
    (
        "context",
        None,
        &["add", "remove", "clear", "list", "content", "size"],
    ),
    (
        "agent",
        Some(Capability::Ai),
        &["run", "parallel", "securityReview", "codeReview", "generateTests", "refactor"],
    ),
    ("mcp", None, &["servers", "tools", "call"]),
    (
        "git",
        Some(Capability::Bash),
        &["status", "diff", "add", "commit", "log", "branch"],
    ),
    ("session", None, &["save", "list", "load"]),
];

fn capability_for(namespace: &str) -> Option<Capability> {
    NAMESPACES
        .iter()
        .find(|(name, _, _)| *name == namespace)
        .and_then(|(_, capability, _)| *capability)
}

//=====================================================
// Section 2: Binding Trait
//=====================================================

/// A host-provided callable. The interpreter invokes it exactly like any
/// other function; the returned future is awaited in program order.
#[async_trait(?Send)]
pub trait HostBinding {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError>;

    fn arity(&self) -> NativeArity {
        NativeArity::ANY
    }
}

/// Placeholder for a required name the host has not supplied.
pub struct Unavailable {
    name: String,
}

#[async_trait(?Send)]
impl HostBinding for Unavailable {
    async fn call(&self, _ctx: &BindingContext, _args: Vec<Value>) -> Result<Value, RuntimeError> {
        Err(RuntimeError::Host(format!(
            "{} is unavailable in this host",
            self.name
        )))
    }
}

/// Rejects calls while the namespace's capability is switched off.
pub struct Gated {
    name: String,
    capability: Capability,
    inner: Rc<dyn HostBinding>,
}

#[async_trait(?Send)]
impl HostBinding for Gated {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if !self.capability.enabled(ctx) {
            return Err(RuntimeError::Host(format!(
                "{} requires {} to be enabled",
                self.name,
                self.capability.flag()
            )));
        }
        self.inner.call(ctx, args).await
    }

    fn arity(&self) -> NativeArity {
        self.inner.arity()
    }
}

/// Adapter for synchronous host callbacks.
pub struct FnBinding<F> {
    arity: NativeArity,
    func: F,
}

impl<F> FnBinding<F>
where
    F: Fn(&BindingContext, Vec<Value>) -> Result<Value, RuntimeError>,
{
    pub fn new(arity: NativeArity, func: F) -> Self {
        Self { arity, func }
    }
}

#[async_trait(?Send)]
impl<F> HostBinding for FnBinding<F>
where
    F: Fn(&BindingContext, Vec<Value>) -> Result<Value, RuntimeError>,
{
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.func)(ctx, args)
    }

    fn arity(&self) -> NativeArity {
        self.arity
    }
}

//=====================================================
// Section 3: Registry
//=====================================================

/// Namespaced binding table injected into an interpreter's global scope.
pub struct HostBindings {
    namespaces: BTreeMap<String, BTreeMap<String, Rc<dyn HostBinding>>>,
}

impl fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (namespace, members) in &self.namespaces {
            map.entry(namespace, &members.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl HostBindings {
    /// Every required name, each reporting itself unavailable.
    pub fn empty() -> Self {
        let mut namespaces = BTreeMap::new();
        for (namespace, _, members) in NAMESPACES {
            let table: BTreeMap<String, Rc<dyn HostBinding>> = members
                .iter()
                .map(|member| {
                    let binding: Rc<dyn HostBinding> = Rc::new(Unavailable {
                        name: format!("{}.{}", namespace, member),
                    });
                    (member.to_string(), binding)
                })
                .collect();
            namespaces.insert(namespace.to_string(), table);
        }
        Self { namespaces }
    }

    /// Required names plus the workspace-local `tool.*` implementations.
    pub fn new() -> Self {
        let mut bindings = Self::empty();
        local::register(&mut bindings);
        bindings
    }

    pub fn register(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        binding: impl HostBinding + 'static,
    ) {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(name.into(), Rc::new(binding));
    }

    pub fn register_fn<F>(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        arity: NativeArity,
        func: F,
    ) where
        F: Fn(&BindingContext, Vec<Value>) -> Result<Value, RuntimeError> + 'static,
    {
        self.register(namespace, name, FnBinding::new(arity, func));
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Rc<dyn HostBinding>> {
        self.namespaces.get(namespace)?.get(name).cloned()
    }

    /// One dict per namespace, members wrapped in their capability gate.
    pub fn namespace_values(&self) -> Vec<(String, Value)> {
        self.namespaces
            .iter()
            .map(|(namespace, members)| {
                let capability = capability_for(namespace);
                let entries = members
                    .iter()
                    .map(|(member, binding)| {
                        let qualified = format!("{}.{}", namespace, member);
                        let handler: Rc<dyn HostBinding> = match capability {
                            Some(capability) => Rc::new(Gated {
                                name: qualified.clone(),
                                capability,
                                inner: Rc::clone(binding),
                            }),
                            None => Rc::clone(binding),
                        };
                        let native = NativeFunction {
                            name: qualified,
                            arity: handler.arity(),
                            handler: NativeHandler::Host(handler),
                        };
                        (member.clone(), Value::Native(Rc::new(native)))
                    })
                    .collect();
                (namespace.clone(), Value::dict(entries))
            })
            .collect()
    }
}

impl Default for HostBindings {
    fn default() -> Self {
        Self::new()
    }
}

//=====================================================
// Section 4: Tests
//=====================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_required_name_is_present() {
        let bindings = HostBindings::empty();
        for (namespace, _, members) in NAMESPACES {
            for member in *members {
                assert!(
                    bindings.get(namespace, member).is_some(),
                    "missing {namespace}.{member}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_unavailable_binding_reports_its_name() {
        let bindings = HostBindings::empty();
        let binding = bindings.get("grok", "ask").unwrap();
        let err = binding
            .call(&BindingContext::default(), vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "grok.ask is unavailable in this host");
    }

    #[tokio::test]
    async fn test_gate_blocks_disabled_capability() {
        let mut bindings = HostBindings::empty();
        bindings.register_fn("git", "status", NativeArity::Exact(0), |_, _| {
            Ok(Value::string("clean"))
        });
        let values = bindings.namespace_values();
        let (_, git) = values.iter().find(|(name, _)| name == "git").unwrap();
        let Value::Dict(members) = git else {
            panic!("expected dict");
        };
        let Value::Native(status) = members.borrow()["status"].clone() else {
            panic!("expected native");
        };
        let NativeHandler::Host(handler) = &status.handler else {
            panic!("expected host handler");
        };

        let ctx = BindingContext {
            enable_bash: false,
            ..BindingContext::default()
        };
        let err = handler.call(&ctx, vec![]).await.unwrap_err();
        assert_eq!(err.to_string(), "git.status requires enableBash to be enabled");

        let ok = handler
            .call(&BindingContext::default(), vec![])
            .await
            .unwrap();
        assert_eq!(ok, Value::string("clean"));
        assert_eq!(status.arity, NativeArity::Exact(0));
    }

    #[test]
    fn test_resolve_relative_to_workdir() {
        let ctx = BindingContext {
            workdir: PathBuf::from("/work"),
            ..BindingContext::default()
        };
        assert_eq!(ctx.resolve("a/b.txt"), PathBuf::from("/work/a/b.txt"));
        assert_eq!(ctx.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}

//=====================================================
// End of file
//=====================================================
