//! Module specifiers a file depends on.

use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression,
    Program,
};
use oxc_ast_visit::{walk, Visit};

/// Collects specifiers of static imports (type-only ones included),
/// re-exports and `import()` calls with a static argument, in source order
/// and without duplicates.
#[derive(Debug, Default)]
struct ImportCollector {
    specifiers: Vec<String>,
    dynamic_skipped: usize,
}

impl ImportCollector {
    fn push(&mut self, specifier: &str) {
        if !self.specifiers.iter().any(|s| s == specifier) {
            self.specifiers.push(specifier.to_string());
        }
    }
}

impl<'a> Visit<'a> for ImportCollector {
    fn visit_import_declaration(&mut self, import: &ImportDeclaration<'a>) {
        self.push(&import.source.value);
    }

    fn visit_export_named_declaration(&mut self, export: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &export.source {
            self.push(&source.value);
        }
        walk::walk_export_named_declaration(self, export);
    }

    fn visit_export_all_declaration(&mut self, export: &ExportAllDeclaration<'a>) {
        self.push(&export.source.value);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        match &expr.source {
            Expression::StringLiteral(lit) => self.push(&lit.value),
            Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
                if let Some(quasi) = tpl.quasis.first() {
                    self.push(&quasi.value.raw);
                }
            }
            _ => self.dynamic_skipped += 1,
        }
        walk::walk_import_expression(self, expr);
    }
}

/// Dependencies of `program` and the number of `import()` calls whose
/// argument is not a static string.
pub fn collect_import_specifiers(program: &Program<'_>) -> (Vec<String>, usize) {
    let mut collector = ImportCollector::default();
    collector.visit_program(program);
    (collector.specifiers, collector.dynamic_skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn specifiers(source: &str) -> (Vec<String>, usize) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        collect_import_specifiers(&ret.program)
    }

    #[test]
    fn static_type_and_reexport_sources() {
        let (found, _) = specifiers(
            r#"
            import React from 'react';
            import type { Props } from './types';
            import './styles.css';
            export { Badge } from './Badge';
            export * from './icons';
            export const local = 1;
            import again from 'react';
            "#,
        );
        assert_eq!(found, ["react", "./types", "./styles.css", "./Badge", "./icons"]);
    }

    #[test]
    fn dynamic_imports_inside_functions() {
        let (found, skipped) = specifiers(
            r#"
            const Lazy = React.lazy(() => import('./Lazy'));
            async function load(name) {
              await import(`./pages/Home`);
              return import(`./pages/${name}`);
            }
            "#,
        );
        assert_eq!(found, ["./Lazy", "./pages/Home"]);
        assert_eq!(skipped, 1);
    }
}
