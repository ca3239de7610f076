//! Access-path names.
//!
//! Turns member chains such as `Button.docs?.meta` or `this.props["size"]`
//! into a single dotted string. Shapes without a name yield `None` and are
//! reported as unhandled syntax (debug builds only).

use oxc_ast::ast::{AssignmentTarget, ChainElement, Expression, PropertyKey};

use storymap_graph::BuildContext;

pub const CONNECTOR: &str = ".";
pub const OPTIONAL_CONNECTOR: &str = "?.";
/// Name used for the `this` keyword.
pub const THIS_NAME: &str = "[this]";

/// Join two access segments. A missing side drops the connector; an empty
/// result is `None`.
pub fn compose_access_name(
    left: Option<&str>,
    right: Option<&str>,
    optional: bool,
) -> Option<String> {
    if left.is_none() && right.is_none() {
        return None;
    }

    let connector = match left {
        Some(_) if optional => OPTIONAL_CONNECTOR,
        Some(_) => CONNECTOR,
        None => "",
    };

    let composed = format!("{}{connector}{}", left.unwrap_or(""), right.unwrap_or(""));
    let trimmed = composed.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Dotted name of an expression, e.g. `a.b?.c` for `a.b?.c` and `a.0` for
/// `a[0]`.
pub fn expression_name(expr: &Expression<'_>, ctx: &BuildContext) -> Option<String> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.to_string()),
        Expression::ThisExpression(_) => Some(THIS_NAME.to_string()),
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::NumericLiteral(lit) => Some(lit.value.to_string()),
        Expression::StaticMemberExpression(member) => {
            let left = expression_name(&member.object, ctx);
            let right = member.property.name.as_str();
            compose_access_name(left.as_deref(), Some(right), member.optional)
        }
        Expression::ComputedMemberExpression(member) => {
            let left = expression_name(&member.object, ctx);
            let right = expression_name(&member.expression, ctx);
            compose_access_name(left.as_deref(), right.as_deref(), member.optional)
        }
        Expression::PrivateFieldExpression(field) => {
            let left = expression_name(&field.object, ctx);
            let right = format!("#{}", field.field.name);
            compose_access_name(left.as_deref(), Some(&right), field.optional)
        }
        Expression::ChainExpression(chain) => match &chain.expression {
            ChainElement::StaticMemberExpression(member) => {
                let left = expression_name(&member.object, ctx);
                let right = member.property.name.as_str();
                compose_access_name(left.as_deref(), Some(right), member.optional)
            }
            ChainElement::ComputedMemberExpression(member) => {
                let left = expression_name(&member.object, ctx);
                let right = expression_name(&member.expression, ctx);
                compose_access_name(left.as_deref(), right.as_deref(), member.optional)
            }
            ChainElement::TSNonNullExpression(inner) => expression_name(&inner.expression, ctx),
            _ => {
                ctx.unhandled("expression_name", "ChainElement");
                None
            }
        },
        Expression::TSNonNullExpression(inner) => expression_name(&inner.expression, ctx),
        Expression::TSAsExpression(inner) => expression_name(&inner.expression, ctx),
        Expression::TSSatisfiesExpression(inner) => expression_name(&inner.expression, ctx),
        Expression::ParenthesizedExpression(inner) => expression_name(&inner.expression, ctx),
        _ => {
            ctx.unhandled("expression_name", expression_kind(expr));
            None
        }
    }
}

/// Dotted name of the left-hand side of an assignment, e.g. `Button.metadata`.
pub fn assignment_target_name(target: &AssignmentTarget<'_>, ctx: &BuildContext) -> Option<String> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(ident) => Some(ident.name.to_string()),
        AssignmentTarget::StaticMemberExpression(member) => {
            let left = expression_name(&member.object, ctx);
            let right = member.property.name.as_str();
            compose_access_name(left.as_deref(), Some(right), member.optional)
        }
        AssignmentTarget::ComputedMemberExpression(member) => {
            let left = expression_name(&member.object, ctx);
            let right = expression_name(&member.expression, ctx);
            compose_access_name(left.as_deref(), right.as_deref(), member.optional)
        }
        _ => {
            ctx.unhandled("assignment_target_name", "AssignmentTarget");
            None
        }
    }
}

/// Name of an object key: identifiers, string and numeric literals, and
/// computed keys that have a name themselves.
pub fn property_key_name(key: &PropertyKey<'_>, ctx: &BuildContext) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::PrivateIdentifier(ident) => Some(format!("#{}", ident.name)),
        _ => match key.as_expression() {
            Some(expr) => expression_name(expr, ctx),
            None => {
                ctx.unhandled("property_key_name", "PropertyKey");
                None
            }
        },
    }
}

/// Short label of an expression variant for diagnostics.
pub(crate) fn expression_kind(expr: &Expression<'_>) -> &'static str {
    match expr {
        Expression::ArrayExpression(_) => "ArrayExpression",
        Expression::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
        Expression::AssignmentExpression(_) => "AssignmentExpression",
        Expression::AwaitExpression(_) => "AwaitExpression",
        Expression::BinaryExpression(_) => "BinaryExpression",
        Expression::CallExpression(_) => "CallExpression",
        Expression::ClassExpression(_) => "ClassExpression",
        Expression::ConditionalExpression(_) => "ConditionalExpression",
        Expression::FunctionExpression(_) => "FunctionExpression",
        Expression::JSXElement(_) => "JSXElement",
        Expression::JSXFragment(_) => "JSXFragment",
        Expression::LogicalExpression(_) => "LogicalExpression",
        Expression::NewExpression(_) => "NewExpression",
        Expression::ObjectExpression(_) => "ObjectExpression",
        Expression::SequenceExpression(_) => "SequenceExpression",
        Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
        Expression::TemplateLiteral(_) => "TemplateLiteral",
        Expression::UnaryExpression(_) => "UnaryExpression",
        Expression::UpdateExpression(_) => "UpdateExpression",
        _ => "Expression",
    }
}
