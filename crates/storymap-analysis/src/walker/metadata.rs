//! Locating `<Component>.<metadataKey> = {...}` assignments.

use oxc_ast::ast::{AssignmentOperator, Expression, Program, Statement};
use serde_json::{Map, Value};

use storymap_graph::{BuildContext, DiagnosticKind};

use crate::evaluate::evaluate_object;
use crate::names::{assignment_target_name, CONNECTOR};

/// Metadata object assigned to `component` at the top level of `program`.
///
/// `metadata_path` holds the segments of the metadata key, so `docs.meta`
/// matches `Button.docs.meta = {...}`. Segments are compared exactly.
/// Compound assignments (`+=`, `??=`, ...) are reported but still read.
pub fn find_metadata(
    program: &Program<'_>,
    source: &str,
    component: &str,
    metadata_path: &[&str],
    ctx: &BuildContext,
) -> Option<Map<String, Value>> {
    for stmt in &program.body {
        let Statement::ExpressionStatement(expr_stmt) = stmt else {
            continue;
        };
        let Expression::AssignmentExpression(assign) = &expr_stmt.expression else {
            continue;
        };
        let Some(target) = assignment_target_name(&assign.left, ctx) else {
            continue;
        };

        let mut segments = target.split(CONNECTOR);
        if segments.next() != Some(component) || !segments.eq(metadata_path.iter().copied()) {
            continue;
        }

        if assign.operator != AssignmentOperator::Assign {
            ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!(
                    "Metadata of {component} assigned with {}. Expected a plain `=` assignment.",
                    assign.operator.as_str()
                ),
            );
        }
        return evaluate_object(&assign.right, source, ctx);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;
    use serde_json::json;

    fn metadata(source: &str, component: &str, path: &[&str]) -> (Option<Value>, BuildContext) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        let ctx = BuildContext::new(false);
        let found = find_metadata(&ret.program, source, component, path, &ctx);
        (found.map(Value::Object), ctx)
    }

    #[test]
    fn finds_the_matching_assignment() {
        let source = r#"
            export const Icon = () => null;
            Icon.metadata = { name: "icon" };
            export const Button = () => null;
            Button.displayName = "Button";
            Button.metadata = { name: "button", sizes: ["s", "m"] };
        "#;
        let (found, ctx) = metadata(source, "Button", &["metadata"]);
        assert_eq!(found, Some(json!({ "name": "button", "sizes": ["s", "m"] })));
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn nested_keys_match_whole_segments() {
        let source = r#"
            Card.docsExtra.meta = { wrong: true };
            Card.docs.meta = { right: true };
        "#;
        let (found, _) = metadata(source, "Card", &["docs", "meta"]);
        assert_eq!(found, Some(json!({ "right": true })));

        let (missing, _) = metadata(source, "Card", &["docs"]);
        assert_eq!(missing, None);
    }

    #[test]
    fn compound_assignment_is_reported() {
        let (found, ctx) = metadata("Tag.metadata ??= { a: 1 };", "Tag", &["metadata"]);
        assert_eq!(found, Some(json!({ "a": 1 })));
        assert_eq!(ctx.diagnostics_of(DiagnosticKind::StructuralMismatch).len(), 1);
    }

    #[test]
    fn non_object_value_is_reported() {
        let (found, ctx) = metadata("Tag.metadata = makeMeta();", "Tag", &["metadata"]);
        assert_eq!(found, None);
        assert_eq!(ctx.diagnostics_of(DiagnosticKind::StructuralMismatch).len(), 1);
    }
}
