//! Structural evaluation of metadata literals.
//!
//! Metadata objects are plain data written in source, e.g.
//! `Button.metadata = { name: "button", sizes: ["s", "m"] }`. They are
//! converted into JSON by walking the literal; nothing is executed.
//! Expressions without a literal reading keep their source text.

use oxc_ast::ast::{ArrayExpressionElement, Expression, ObjectPropertyKind, UnaryOperator};
use oxc_span::GetSpan;
use serde_json::{Map, Value};

use storymap_graph::args::{number_to_json, FUNCTION_PLACEHOLDER};
use storymap_graph::{BuildContext, DiagnosticKind};

use crate::names::{expression_kind, property_key_name};

/// Evaluate an object literal into a JSON object.
///
/// Anything other than an object literal is a structural mismatch: it is
/// reported and yields `None`.
pub fn evaluate_object(
    expr: &Expression<'_>,
    source: &str,
    ctx: &BuildContext,
) -> Option<Map<String, Value>> {
    match unwrap_type_wrappers(expr) {
        expr @ Expression::ObjectExpression(_) => match evaluate(expr, source, ctx) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        other => {
            ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!(
                    "Expected metadata to be an object literal. Got {}.",
                    expression_kind(other)
                ),
            );
            None
        }
    }
}

/// Strip `as`, `satisfies`, `!` and parentheses.
pub(crate) fn unwrap_type_wrappers<'e, 'a>(mut expr: &'e Expression<'a>) -> &'e Expression<'a> {
    loop {
        expr = match expr {
            Expression::TSAsExpression(inner) => &inner.expression,
            Expression::TSSatisfiesExpression(inner) => &inner.expression,
            Expression::TSNonNullExpression(inner) => &inner.expression,
            Expression::TSTypeAssertion(inner) => &inner.expression,
            Expression::ParenthesizedExpression(inner) => &inner.expression,
            _ => return expr,
        };
    }
}

/// JSON value of a literal expression. `undefined` yields `None`, so it is
/// dropped from objects the same way `JSON.stringify` drops it.
pub fn evaluate(expr: &Expression<'_>, source: &str, ctx: &BuildContext) -> Option<Value> {
    let expr = unwrap_type_wrappers(expr);
    let value = match expr {
        Expression::NullLiteral(_) => Value::Null,
        Expression::BooleanLiteral(lit) => Value::Bool(lit.value),
        Expression::NumericLiteral(lit) => number_to_json(lit.value),
        Expression::StringLiteral(lit) => Value::String(lit.value.to_string()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => Value::String(
            tpl.quasis
                .iter()
                .map(|quasi| {
                    quasi
                        .value
                        .cooked
                        .as_ref()
                        .map_or_else(|| quasi.value.raw.to_string(), ToString::to_string)
                })
                .collect(),
        ),
        Expression::Identifier(ident) if ident.name == "undefined" => return None,
        Expression::UnaryExpression(unary) => {
            let number = match &unary.argument {
                Expression::NumericLiteral(lit) => Some(lit.value),
                _ => None,
            };
            match (unary.operator, number) {
                (UnaryOperator::UnaryNegation, Some(n)) => number_to_json(-n),
                (UnaryOperator::UnaryPlus, Some(n)) => number_to_json(n),
                _ => printed(expr, source, ctx),
            }
        }
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
            Value::String(FUNCTION_PLACEHOLDER.to_string())
        }
        Expression::ArrayExpression(array) => Value::Array(
            array
                .elements
                .iter()
                .filter_map(|element| match element {
                    ArrayExpressionElement::Elision(_) => Some(Value::Null),
                    ArrayExpressionElement::SpreadElement(spread) => {
                        ctx.unhandled("evaluate", "SpreadElement in array");
                        Some(Value::String(spread.span.source_text(source).to_string()))
                    }
                    other => other
                        .as_expression()
                        .map(|e| evaluate(e, source, ctx).unwrap_or(Value::Null)),
                })
                .collect(),
        ),
        Expression::ObjectExpression(object) => {
            let mut map = Map::new();
            for property in &object.properties {
                match property {
                    ObjectPropertyKind::ObjectProperty(prop) => {
                        let Some(key) = property_key_name(&prop.key, ctx) else {
                            continue;
                        };
                        if let Some(value) = evaluate(&prop.value, source, ctx) {
                            map.insert(key, value);
                        }
                    }
                    ObjectPropertyKind::SpreadProperty(spread) => {
                        match evaluate(&spread.argument, source, ctx) {
                            Some(Value::Object(inner)) => map.extend(inner),
                            _ => ctx.unhandled("evaluate", "non-literal object spread"),
                        }
                    }
                }
            }
            Value::Object(map)
        }
        _ => printed(expr, source, ctx),
    };
    Some(value)
}

/// Source text of an expression that has no literal value.
fn printed(expr: &Expression<'_>, source: &str, ctx: &BuildContext) -> Value {
    ctx.unhandled("evaluate", expression_kind(expr));
    Value::String(expr.span().source_text(source).to_string())
}
