//=====================================================
// File: lib.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script library root
// Objective: Expose the lexer, AST model, normalizer, interpreter, builtins,
//            host bindings, and configuration as one crate
//=====================================================

pub mod ast;
pub mod bindings;
pub mod builtins;
pub mod config;
pub mod interpreter;
pub mod tokenizer;

pub use ast::{normalize, Ast, Node, Program};
pub use bindings::{BindingContext, HostBinding, HostBindings};
pub use config::{ConfigError, ScriptConfig};
pub use interpreter::{
    BuddyScriptResult, FcsScriptResult, Interpreter, RuntimeError, ScriptResult, TestResult, Value,
};
pub use tokenizer::{tokenize, LexError, Token, TokenKind, Tokenizer};

//=====================================================
// End of file
//=====================================================
