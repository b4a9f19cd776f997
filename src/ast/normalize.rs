//=====================================================
// File: ast/normalize.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Dialect normalization
// Objective: Rewrite legacy-shaped nodes into canonical shape, one node at a
//            time, so the interpreter only ever matches canonical tags
//=====================================================

use super::legacy::{LegacyHandler, LegacyNode};
use super::{Ast, CatchClause, InterpolationPart, LiteralValue, Node, NodeRef, Operator, Param};
use crate::tokenizer::TokenKind;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

//=====================================================
// Section 1: Operator Table
//=====================================================

static OPERATORS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("+", Plus),
        ("-", Minus),
        ("*", Star),
        ("/", Slash),
        ("%", Percent),
        ("**", StarStar),
        ("==", EqualEqual),
        ("===", EqualEqual),
        ("!=", BangEqual),
        ("!==", BangEqual),
        ("<", Less),
        ("<=", LessEqual),
        (">", Greater),
        (">=", GreaterEqual),
        ("&&", AndAnd),
        ("||", OrOr),
        ("!", Bang),
        ("=", Equal),
        ("+=", PlusEqual),
        ("-=", MinusEqual),
        ("*=", StarEqual),
        ("/=", SlashEqual),
        ("%=", PercentEqual),
    ])
});

/// Map a source-level operator symbol to its token-kind tag.
pub fn operator_from_symbol(symbol: &str) -> Option<TokenKind> {
    OPERATORS.get(symbol).copied()
}

fn map_operator(symbol: &str) -> Operator {
    match operator_from_symbol(symbol) {
        Some(kind) => Operator::Tag(kind),
        None => Operator::Symbol(symbol.to_string()),
    }
}

fn canonical_operator(operator: &Operator) -> Option<Operator> {
    match operator {
        Operator::Symbol(symbol) => operator_from_symbol(symbol).map(Operator::Tag),
        Operator::Tag(_) => None,
    }
}

//=====================================================
// Section 2: Normalize
//=====================================================

/// Rewrite `ast` into canonical shape.
///
/// Only the node's direct fields are touched; children stay in whatever
/// dialect they arrived in and are normalized when the interpreter visits
/// them. Canonical input comes back borrowed, so calling this redundantly is
/// free, and `normalize(normalize(n)) == normalize(n)` for every node.
/// Shapes without a rule pass through unchanged.
pub fn normalize(ast: &Ast) -> Cow<'_, Ast> {
    match ast {
        Ast::Canonical(node) => match with_canonical_operator(node) {
            Some(rewritten) => Cow::Owned(Ast::Canonical(rewritten)),
            None => Cow::Borrowed(ast),
        },
        Ast::Legacy(node) => Cow::Owned(Ast::Canonical(from_legacy(node))),
        Ast::Unrecognized(_) => Cow::Borrowed(ast),
    }
}

/// Canonical nodes may still carry a mappable raw operator symbol.
fn with_canonical_operator(node: &Node) -> Option<Node> {
    match node {
        Node::Binary {
            operator,
            left,
            right,
        } => canonical_operator(operator).map(|operator| Node::Binary {
            operator,
            left: left.clone(),
            right: right.clone(),
        }),
        Node::Unary { operator, operand } => {
            canonical_operator(operator).map(|operator| Node::Unary {
                operator,
                operand: operand.clone(),
            })
        }
        Node::Assignment {
            operator,
            target,
            value,
        } => canonical_operator(operator).map(|operator| Node::Assignment {
            operator,
            target: target.clone(),
            value: value.clone(),
        }),
        _ => None,
    }
}

fn from_legacy(node: &LegacyNode) -> Node {
    match node {
        LegacyNode::VariableDeclaration { name, init, kind } => Node::VarDeclaration {
            name: name.clone(),
            initializer: init.clone(),
            is_const: kind == "const",
        },
        LegacyNode::FunctionStatement {
            name,
            params,
            defaults,
            body,
            is_async,
        } => Node::FunctionDeclaration {
            name: name.clone(),
            params: params
                .iter()
                .map(|param| Param {
                    name: param.clone(),
                    default: defaults.get(param).cloned(),
                })
                .collect(),
            body: body.clone(),
            is_async: *is_async,
        },
        LegacyNode::ClassStatement { name, body } => Node::ClassDeclaration {
            name: name.clone(),
            members: body.clone(),
        },
        LegacyNode::BlockStatement { body } => Node::Block {
            statements: body.clone(),
        },
        LegacyNode::IfStatement {
            test,
            consequent,
            alternate,
        } => Node::If {
            condition: test.clone(),
            then_branch: consequent.clone(),
            else_branch: alternate.clone(),
        },
        LegacyNode::WhileStatement { test, body } => Node::While {
            condition: test.clone(),
            body: body.clone(),
        },
        LegacyNode::ForStatement {
            init,
            test,
            update,
            left,
            right,
            body,
        } => {
            let c_style = init.is_some() || test.is_some() || update.is_some();
            match (c_style, left, right) {
                (false, Some(variable), Some(iterable)) => Node::For {
                    variable: variable.clone(),
                    iterable: iterable.clone(),
                    body: body.clone(),
                },
                _ => Node::ForCStyle {
                    init: init.clone(),
                    test: test.clone(),
                    update: update.clone(),
                    body: body.clone(),
                },
            }
        }
        LegacyNode::ForInStatement { left, right, body } => Node::For {
            variable: left.clone(),
            iterable: right.clone(),
            body: body.clone(),
        },
        LegacyNode::ReturnStatement { argument } => Node::Return {
            value: argument.clone(),
        },
        LegacyNode::BreakStatement => Node::Break,
        LegacyNode::ContinueStatement => Node::Continue,
        LegacyNode::TryStatement {
            block,
            handler,
            finalizer,
        } => Node::Try {
            try_block: block.clone(),
            catch_clauses: handler
                .iter()
                .map(|LegacyHandler { param, body }| CatchClause {
                    param: param.clone(),
                    body: body.clone(),
                })
                .collect(),
            finally_block: finalizer.clone(),
        },
        LegacyNode::ThrowStatement { argument } => Node::Throw {
            value: argument.clone(),
        },
        LegacyNode::ImportDeclaration {
            source,
            specifiers,
            alias,
        } => Node::Import {
            source: source.clone(),
            names: specifiers.clone(),
            alias: alias.clone(),
        },
        LegacyNode::ExportNamedDeclaration { declaration } => Node::Export {
            declaration: declaration.clone(),
        },
        LegacyNode::TestStatement {
            description,
            body,
            tags,
        } => Node::TestDeclaration {
            name: description.clone(),
            body: body.clone(),
            tags: tags.clone(),
        },
        LegacyNode::AssertStatement { test, message } => Node::Assert {
            condition: test.clone(),
            message: message.clone(),
        },
        LegacyNode::StringLiteral { value } => Node::Literal {
            value: LiteralValue::String(value.clone()),
        },
        LegacyNode::NumericLiteral { value } => Node::Literal {
            value: LiteralValue::Number(*value),
        },
        LegacyNode::BooleanLiteral { value } => Node::Literal {
            value: LiteralValue::Bool(*value),
        },
        LegacyNode::NullLiteral => Node::Literal {
            value: LiteralValue::Null,
        },
        LegacyNode::BinaryExpression {
            operator,
            left,
            right,
        }
        | LegacyNode::LogicalExpression {
            operator,
            left,
            right,
        } => Node::Binary {
            operator: map_operator(operator),
            left: left.clone(),
            right: right.clone(),
        },
        LegacyNode::UnaryExpression { operator, argument } => Node::Unary {
            operator: map_operator(operator),
            operand: argument.clone(),
        },
        LegacyNode::UpdateExpression { operator, argument } => {
            let operator = match operator.as_str() {
                "++" => Operator::Tag(TokenKind::PlusEqual),
                "--" => Operator::Tag(TokenKind::MinusEqual),
                other => Operator::Symbol(other.to_string()),
            };
            Node::Assignment {
                operator,
                target: argument.clone(),
                value: Rc::new(Ast::Canonical(Node::Literal {
                    value: LiteralValue::Number(1.0),
                })),
            }
        }
        LegacyNode::AssignmentExpression {
            operator,
            left,
            right,
        } => Node::Assignment {
            operator: map_operator(operator),
            target: left.clone(),
            value: right.clone(),
        },
        LegacyNode::CallExpression {
            callee,
            arguments,
            named_arguments,
        } => Node::Call {
            callee: callee.clone(),
            arguments: arguments.clone(),
            named_arguments: named_arguments.clone(),
        },
        LegacyNode::MemberExpression {
            object,
            property,
            computed,
        } => match static_property_name(property, *computed) {
            Some(name) => Node::Member {
                object: object.clone(),
                property: name,
            },
            None => Node::Index {
                object: object.clone(),
                index: property.clone(),
            },
        },
        LegacyNode::ArrayExpression { elements } => Node::Array {
            elements: elements.clone(),
        },
        LegacyNode::ObjectExpression { properties } => Node::Dict {
            entries: properties
                .iter()
                .map(|property| (property.key.clone(), property.value.clone()))
                .collect(),
        },
        LegacyNode::ArrowFunctionExpression { params, body } => Node::Lambda {
            params: params.clone(),
            body: body.clone(),
        },
        LegacyNode::TemplateLiteral {
            quasis,
            expressions,
        } => Node::Interpolation {
            parts: interleave(quasis, expressions),
        },
        LegacyNode::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => Node::Ternary {
            condition: test.clone(),
            consequent: consequent.clone(),
            alternate: alternate.clone(),
        },
        LegacyNode::AwaitExpression { argument } => Node::Await {
            expression: argument.clone(),
        },
    }
}

/// `a.b` carries its property as an identifier (or string) node; only that
/// direct child is inspected.
fn static_property_name(property: &Ast, computed: bool) -> Option<String> {
    if computed {
        return None;
    }
    match property {
        Ast::Canonical(Node::Identifier { name }) => Some(name.clone()),
        Ast::Canonical(Node::Literal {
            value: LiteralValue::String(name),
        })
        | Ast::Legacy(LegacyNode::StringLiteral { value: name }) => Some(name.clone()),
        _ => None,
    }
}

fn interleave(quasis: &[String], expressions: &[NodeRef]) -> Vec<InterpolationPart> {
    let mut parts = Vec::with_capacity(quasis.len() + expressions.len());
    for index in 0..quasis.len().max(expressions.len()) {
        if let Some(text) = quasis.get(index).filter(|text| !text.is_empty()) {
            parts.push(InterpolationPart::Text(text.clone()));
        }
        if let Some(expression) = expressions.get(index) {
            parts.push(InterpolationPart::Expression(expression.clone()));
        }
    }
    parts
}

//=====================================================
// Section 3: Tests
//=====================================================


//=====================================================
// End of file
//=====================================================
