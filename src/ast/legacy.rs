//=====================================================
// File: ast/legacy.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: FCS-era node shapes
// Objective: Describe the older AST dialect so it can be accepted as input
//            and rewritten into canonical form by the normalizer
//=====================================================

use super::NodeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Single catch handler of a legacy `TryStatement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyHandler {
    #[serde(default)]
    pub param: Option<String>,
    pub body: NodeRef,
}

/// `{ key, value }` entry of a legacy `ObjectExpression`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyProperty {
    pub key: String,
    pub value: NodeRef,
}

/// Legacy node shapes. Field names follow the older parser verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LegacyNode {
    VariableDeclaration {
        name: String,
        #[serde(default)]
        init: Option<NodeRef>,
        #[serde(default = "default_kind")]
        kind: String,
    },
    FunctionStatement {
        name: String,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        defaults: HashMap<String, NodeRef>,
        body: NodeRef,
        #[serde(default, rename = "async")]
        is_async: bool,
    },
    ClassStatement {
        name: String,
        #[serde(default)]
        body: Vec<NodeRef>,
    },
    BlockStatement {
        #[serde(default)]
        body: Vec<NodeRef>,
    },
    IfStatement {
        test: NodeRef,
        consequent: NodeRef,
        #[serde(default)]
        alternate: Option<NodeRef>,
    },
    WhileStatement {
        test: NodeRef,
        body: NodeRef,
    },
    /// Generic loop; splits into C-style or for-in during normalization.
    ForStatement {
        #[serde(default)]
        init: Option<NodeRef>,
        #[serde(default)]
        test: Option<NodeRef>,
        #[serde(default)]
        update: Option<NodeRef>,
        #[serde(default)]
        left: Option<String>,
        #[serde(default)]
        right: Option<NodeRef>,
        body: NodeRef,
    },
    ForInStatement {
        left: String,
        right: NodeRef,
        body: NodeRef,
    },
    ReturnStatement {
        #[serde(default)]
        argument: Option<NodeRef>,
    },
    BreakStatement,
    ContinueStatement,
    TryStatement {
        block: NodeRef,
        #[serde(default)]
        handler: Option<LegacyHandler>,
        #[serde(default)]
        finalizer: Option<NodeRef>,
    },
    ThrowStatement {
        argument: NodeRef,
    },
    ImportDeclaration {
        source: String,
        #[serde(default)]
        specifiers: Vec<String>,
        #[serde(default)]
        alias: Option<String>,
    },
    ExportNamedDeclaration {
        declaration: NodeRef,
    },
    TestStatement {
        description: String,
        body: NodeRef,
        #[serde(default)]
        tags: Vec<String>,
    },
    AssertStatement {
        test: NodeRef,
        #[serde(default)]
        message: Option<NodeRef>,
    },
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: f64,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral,
    BinaryExpression {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    LogicalExpression {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    UnaryExpression {
        operator: String,
        argument: NodeRef,
    },
    UpdateExpression {
        operator: String,
        argument: NodeRef,
    },
    AssignmentExpression {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    CallExpression {
        callee: NodeRef,
        #[serde(default)]
        arguments: Vec<NodeRef>,
        #[serde(default, rename = "namedArguments")]
        named_arguments: Option<HashMap<String, NodeRef>>,
    },
    MemberExpression {
        object: NodeRef,
        property: NodeRef,
        #[serde(default)]
        computed: bool,
    },
    ArrayExpression {
        #[serde(default)]
        elements: Vec<NodeRef>,
    },
    ObjectExpression {
        #[serde(default)]
        properties: Vec<LegacyProperty>,
    },
    ArrowFunctionExpression {
        #[serde(default)]
        params: Vec<String>,
        body: NodeRef,
    },
    TemplateLiteral {
        #[serde(default)]
        quasis: Vec<String>,
        #[serde(default)]
        expressions: Vec<NodeRef>,
    },
    ConditionalExpression {
        test: NodeRef,
        consequent: NodeRef,
        alternate: NodeRef,
    },
    AwaitExpression {
        argument: NodeRef,
    },
}

fn default_kind() -> String {
    "let".to_string()
}

impl LegacyNode {
    pub fn type_tag(&self) -> &'static str {
        match self {
            LegacyNode::VariableDeclaration { .. } => "VariableDeclaration",
            LegacyNode::FunctionStatement { .. } => "FunctionStatement",
            LegacyNode::ClassStatement { .. } => "ClassStatement",
            LegacyNode::BlockStatement { .. } => "BlockStatement",
            LegacyNode::IfStatement { .. } => "IfStatement",
            LegacyNode::WhileStatement { .. } => "WhileStatement",
            LegacyNode::ForStatement { .. } => "ForStatement",
            LegacyNode::ForInStatement { .. } => "ForInStatement",
            LegacyNode::ReturnStatement { .. } => "ReturnStatement",
            LegacyNode::BreakStatement => "BreakStatement",
            LegacyNode::ContinueStatement => "ContinueStatement",
            LegacyNode::TryStatement { .. } => "TryStatement",
            LegacyNode::ThrowStatement { .. } => "ThrowStatement",
            LegacyNode::ImportDeclaration { .. } => "ImportDeclaration",
            LegacyNode::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            LegacyNode::TestStatement { .. } => "TestStatement",
            LegacyNode::AssertStatement { .. } => "AssertStatement",
            LegacyNode::StringLiteral { .. } => "StringLiteral",
            LegacyNode::NumericLiteral { .. } => "NumericLiteral",
            LegacyNode::BooleanLiteral { .. } => "BooleanLiteral",
            LegacyNode::NullLiteral => "NullLiteral",
            LegacyNode::BinaryExpression { .. } => "BinaryExpression",
            LegacyNode::LogicalExpression { .. } => "LogicalExpression",
            LegacyNode::UnaryExpression { .. } => "UnaryExpression",
            LegacyNode::UpdateExpression { .. } => "UpdateExpression",
            LegacyNode::AssignmentExpression { .. } => "AssignmentExpression",
            LegacyNode::CallExpression { .. } => "CallExpression",
            LegacyNode::MemberExpression { .. } => "MemberExpression",
            LegacyNode::ArrayExpression { .. } => "ArrayExpression",
            LegacyNode::ObjectExpression { .. } => "ObjectExpression",
            LegacyNode::ArrowFunctionExpression { .. } => "ArrowFunctionExpression",
            LegacyNode::TemplateLiteral { .. } => "TemplateLiteral",
            LegacyNode::ConditionalExpression { .. } => "ConditionalExpression",
            LegacyNode::AwaitExpression { .. } => "AwaitExpression",
        }
    }
}

//=====================================================
// End of file
//=====================================================
