//=====================================================
// File: ast/mod.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script Abstract Syntax Tree definitions
// Objective: Define the canonical node shapes the interpreter executes and
//            the dialect-agnostic wrapper the external parser produces
//=====================================================

pub mod legacy;
pub mod normalize;

pub use legacy::LegacyNode;
pub use normalize::{normalize, operator_from_symbol};

use crate::tokenizer::TokenKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared child pointer. Normalization re-shapes a node's direct fields
/// only, so children are reference counted rather than deep-copied.
pub type NodeRef = Rc<Ast>;

//=====================================================
// Section 1: Dialect Wrapper
//=====================================================

/// A node as delivered by the parser, in either dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ast {
    Canonical(Node),
    Legacy(LegacyNode),
    /// Shape with no known rule. Kept verbatim so normalization stays an
    /// identity transform; executing it is a runtime failure.
    Unrecognized(serde_json::Value),
}

impl Ast {
    /// The node's `type` tag, whichever dialect it is in.
    pub fn type_tag(&self) -> String {
        match self {
            Ast::Canonical(node) => node.type_tag().to_string(),
            Ast::Legacy(node) => node.type_tag().to_string(),
            Ast::Unrecognized(raw) => raw
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("<untyped>")
                .to_string(),
        }
    }
}

impl From<Node> for Ast {
    fn from(node: Node) -> Self {
        Ast::Canonical(node)
    }
}

/// Root of an executable script. The legacy dialect calls the list `body`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(alias = "body", default)]
    pub statements: Vec<NodeRef>,
}

impl Program {
    pub fn new(statements: Vec<NodeRef>) -> Self {
        Self { statements }
    }

    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

//=====================================================
// Section 2: Supporting Shapes
//=====================================================

/// Operator slot of `Binary`/`Unary`/`Assignment`. Canonical input carries a
/// token-kind tag; a raw symbol survives only when it has no mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operator {
    Tag(TokenKind),
    Symbol(String),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Tag(kind) => write!(f, "{}", kind),
            Operator::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl From<TokenKind> for Operator {
    fn from(kind: TokenKind) -> Self {
        Operator::Tag(kind)
    }
}

/// Literal payloads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Function parameter with an optional default-value expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<NodeRef>,
}

impl Param {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }
}

/// One `catch` clause; the bound variable is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default, alias = "variable")]
    pub param: Option<String>,
    pub body: NodeRef,
}

/// Piece of an interpolated string: literal text or an expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterpolationPart {
    Text(String),
    Expression(NodeRef),
}

//=====================================================
// Section 3: Canonical Nodes
//=====================================================

/// Every node shape the interpreter pattern-matches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Node {
    // Statements and declarations
    Block {
        #[serde(default)]
        statements: Vec<NodeRef>,
    },
    ExpressionStatement {
        expression: NodeRef,
    },
    VarDeclaration {
        name: String,
        #[serde(default)]
        initializer: Option<NodeRef>,
        #[serde(default)]
        is_const: bool,
    },
    FunctionDeclaration {
        name: String,
        #[serde(default)]
        params: Vec<Param>,
        body: NodeRef,
        #[serde(default)]
        is_async: bool,
    },
    ClassDeclaration {
        name: String,
        #[serde(default)]
        members: Vec<NodeRef>,
    },
    If {
        condition: NodeRef,
        then_branch: NodeRef,
        #[serde(default)]
        else_branch: Option<NodeRef>,
    },
    While {
        condition: NodeRef,
        body: NodeRef,
    },
    For {
        variable: String,
        iterable: NodeRef,
        body: NodeRef,
    },
    ForCStyle {
        #[serde(default)]
        init: Option<NodeRef>,
        #[serde(default)]
        test: Option<NodeRef>,
        #[serde(default)]
        update: Option<NodeRef>,
        body: NodeRef,
    },
    Return {
        #[serde(default)]
        value: Option<NodeRef>,
    },
    Break,
    Continue,
    Try {
        try_block: NodeRef,
        #[serde(default)]
        catch_clauses: Vec<CatchClause>,
        #[serde(default)]
        finally_block: Option<NodeRef>,
    },
    Throw {
        value: NodeRef,
    },
    Import {
        source: String,
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        alias: Option<String>,
    },
    Export {
        declaration: NodeRef,
    },
    TestDeclaration {
        name: String,
        body: NodeRef,
        #[serde(default)]
        tags: Vec<String>,
    },
    Assert {
        condition: NodeRef,
        #[serde(default)]
        message: Option<NodeRef>,
    },

    // Expressions
    Literal {
        #[serde(default)]
        value: LiteralValue,
    },
    Identifier {
        name: String,
    },
    Binary {
        operator: Operator,
        left: NodeRef,
        right: NodeRef,
    },
    Unary {
        operator: Operator,
        #[serde(alias = "argument")]
        operand: NodeRef,
    },
    Assignment {
        operator: Operator,
        #[serde(alias = "left")]
        target: NodeRef,
        #[serde(alias = "right")]
        value: NodeRef,
    },
    Call {
        callee: NodeRef,
        #[serde(default)]
        arguments: Vec<NodeRef>,
        #[serde(default)]
        named_arguments: Option<HashMap<String, NodeRef>>,
    },
    Member {
        object: NodeRef,
        property: String,
    },
    Index {
        object: NodeRef,
        index: NodeRef,
    },
    Array {
        #[serde(default)]
        elements: Vec<NodeRef>,
    },
    Dict {
        #[serde(default)]
        entries: HashMap<String, NodeRef>,
    },
    Lambda {
        #[serde(default)]
        params: Vec<String>,
        body: NodeRef,
    },
    Interpolation {
        #[serde(default)]
        parts: Vec<InterpolationPart>,
    },
    Ternary {
        condition: NodeRef,
        consequent: NodeRef,
        alternate: NodeRef,
    },
    Await {
        expression: NodeRef,
    },
}

impl Node {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Node::Block { .. } => "Block",
            Node::ExpressionStatement { .. } => "ExpressionStatement",
            Node::VarDeclaration { .. } => "VarDeclaration",
            Node::FunctionDeclaration { .. } => "FunctionDeclaration",
            Node::ClassDeclaration { .. } => "ClassDeclaration",
            Node::If { .. } => "If",
            Node::While { .. } => "While",
            Node::For { .. } => "For",
            Node::ForCStyle { .. } => "ForCStyle",
            Node::Return { .. } => "Return",
            Node::Break => "Break",
            Node::Continue => "Continue",
            Node::Try { .. } => "Try",
            Node::Throw { .. } => "Throw",
            Node::Import { .. } => "Import",
            Node::Export { .. } => "Export",
            Node::TestDeclaration { .. } => "TestDeclaration",
            Node::Assert { .. } => "Assert",
            Node::Literal { .. } => "Literal",
            Node::Identifier { .. } => "Identifier",
            Node::Binary { .. } => "Binary",
            Node::Unary { .. } => "Unary",
            Node::Assignment { .. } => "Assignment",
            Node::Call { .. } => "Call",
            Node::Member { .. } => "Member",
            Node::Index { .. } => "Index",
            Node::Array { .. } => "Array",
            Node::Dict { .. } => "Dict",
            Node::Lambda { .. } => "Lambda",
            Node::Interpolation { .. } => "Interpolation",
            Node::Ternary { .. } => "Ternary",
            Node::Await { .. } => "Await",
        }
    }

    /// Declared name for nodes that introduce a binding.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Node::VarDeclaration { name, .. }
            | Node::FunctionDeclaration { name, .. }
            | Node::ClassDeclaration { name, .. } => Some(name),
            _ => None,
        }
    }
}

//=====================================================
// Section 4: Tests
//=====================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ast(value: serde_json::Value) -> Ast {
        serde_json::from_value(value).expect("deserialize node")
    }

    #[test]
    fn test_canonical_shape_deserializes_as_canonical() {
        let node = ast(json!({
            "type": "VarDeclaration",
            "name": "x",
            "initializer": { "type": "Literal", "value": 1 },
            "isConst": true
        }));
        match node {
            Ast::Canonical(Node::VarDeclaration { name, is_const, initializer }) => {
                assert_eq!(name, "x");
                assert!(is_const);
                assert!(initializer.is_some());
            }
            other => panic!("expected canonical var declaration, found {other:?}"),
        }
    }

    #[test]
    fn test_legacy_shape_deserializes_as_legacy() {
        let node = ast(json!({
            "type": "VariableDeclaration",
            "name": "x",
            "init": { "type": "NumericLiteral", "value": 1 },
            "kind": "let"
        }));
        assert!(matches!(node, Ast::Legacy(LegacyNode::VariableDeclaration { .. })));
        assert_eq!(node.type_tag(), "VariableDeclaration");
    }

    #[test]
    fn test_operator_tag_and_symbol() {
        let tagged = ast(json!({
            "type": "Binary", "operator": "Plus",
            "left": { "type": "Literal", "value": 1 },
            "right": { "type": "Literal", "value": 2 }
        }));
        let Ast::Canonical(Node::Binary { operator, .. }) = tagged else {
            panic!("expected binary");
        };
        assert_eq!(operator, Operator::Tag(TokenKind::Plus));

        let raw = ast(json!({
            "type": "Binary", "operator": "+",
            "left": { "type": "Literal", "value": 1 },
            "right": { "type": "Literal", "value": 2 }
        }));
        let Ast::Canonical(Node::Binary { operator, .. }) = raw else {
            panic!("expected binary");
        };
        assert_eq!(operator, Operator::Symbol("+".into()));
    }

    #[test]
    fn test_unknown_tag_is_kept_verbatim() {
        let node = ast(json!({ "type": "SpreadElement", "argument": null }));
        assert!(matches!(node, Ast::Unrecognized(_)));
        assert_eq!(node.type_tag(), "SpreadElement");
    }

    #[test]
    fn test_program_accepts_body_alias() {
        let program: Program = serde_json::from_value(json!({
            "type": "Program",
            "body": [ { "type": "Break" } ]
        }))
        .unwrap();
        assert_eq!(program.statements.len(), 1);
    }
}

//=====================================================
// End of file
//=====================================================
