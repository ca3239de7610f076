//! Module-level import and export bindings of a parsed file.
//!
//! Only top-level declarations are read; nothing here walks into function
//! bodies.

use oxc_ast::ast::{
    BindingPatternKind, Declaration, ExportDefaultDeclarationKind, Expression,
    ImportDeclarationSpecifier, ModuleDeclaration, ModuleExportName, Program,
};

/// Name `default`, as used for default imports and exports.
pub const DEFAULT_EXPORT: &str = "default";

/// What an import binding refers to in the imported module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Namespace,
    Named(String),
}

impl ImportedName {
    /// Export name in the source module; `*` for namespace imports.
    pub fn export_name(&self) -> &str {
        match self {
            ImportedName::Default => DEFAULT_EXPORT,
            ImportedName::Namespace => "*",
            ImportedName::Named(name) => name,
        }
    }
}

/// One local binding created by an `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub source: String,
    pub is_type: bool,
}

/// A re-export with a source: `export { a as b } from './x'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExport {
    pub exported: String,
    pub imported: String,
    pub source: String,
}

/// Import and export tables of one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleBindings {
    pub imports: Vec<ImportBinding>,
    /// `(exported, local)` for exports declared or re-bound in this file.
    pub local_exports: Vec<(String, String)>,
    /// Local name behind `export default`; `None` for anonymous defaults.
    pub default_local: Option<String>,
    pub has_default: bool,
    pub re_exports: Vec<ReExport>,
    /// Sources of `export * from '...'`.
    pub star_exports: Vec<String>,
    /// Every module specifier that appears in an import or export statement.
    pub sources: Vec<String>,
}

impl ModuleBindings {
    pub fn import_for_local(&self, local: &str) -> Option<&ImportBinding> {
        self.imports.iter().find(|binding| binding.local == local)
    }

    pub fn local_export(&self, exported: &str) -> Option<&str> {
        self.local_exports
            .iter()
            .find(|(name, _)| name == exported)
            .map(|(_, local)| local.as_str())
    }
}

pub(crate) fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .filter_map(|decl| match &decl.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Collect the module bindings of `program`.
pub fn collect_bindings(program: &Program<'_>) -> ModuleBindings {
    let mut bindings = ModuleBindings::default();

    for stmt in &program.body {
        let Some(module_decl) = stmt.as_module_declaration() else {
            continue;
        };

        match module_decl {
            ModuleDeclaration::ImportDeclaration(import) => {
                let source = import.source.value.to_string();
                bindings.sources.push(source.clone());
                let Some(specifiers) = &import.specifiers else {
                    continue;
                };

                for spec in specifiers {
                    let (local, imported, spec_is_type) = match spec {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default_spec) => {
                            (default_spec.local.name.to_string(), ImportedName::Default, false)
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns_spec) => {
                            (ns_spec.local.name.to_string(), ImportedName::Namespace, false)
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(named_spec) => {
                            let imported = module_export_name(&named_spec.imported);
                            let imported = if imported == DEFAULT_EXPORT {
                                ImportedName::Default
                            } else {
                                ImportedName::Named(imported)
                            };
                            (
                                named_spec.local.name.to_string(),
                                imported,
                                named_spec.import_kind.is_type(),
                            )
                        }
                    };

                    bindings.imports.push(ImportBinding {
                        local,
                        imported,
                        source: source.clone(),
                        is_type: import.import_kind.is_type() || spec_is_type,
                    });
                }
            }
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                if let Some(src) = &named.source {
                    let source = src.value.to_string();
                    bindings.sources.push(source.clone());
                    for spec in &named.specifiers {
                        bindings.re_exports.push(ReExport {
                            exported: module_export_name(&spec.exported),
                            imported: module_export_name(&spec.local),
                            source: source.clone(),
                        });
                    }
                } else if let Some(decl) = &named.declaration {
                    for name in declared_names(decl) {
                        bindings.local_exports.push((name.clone(), name));
                    }
                } else {
                    for spec in &named.specifiers {
                        let exported = module_export_name(&spec.exported);
                        let local = module_export_name(&spec.local);
                        if exported == DEFAULT_EXPORT {
                            bindings.has_default = true;
                            bindings.default_local = Some(local.clone());
                        }
                        bindings.local_exports.push((exported, local));
                    }
                }
            }
            ModuleDeclaration::ExportDefaultDeclaration(default) => {
                bindings.has_default = true;
                bindings.default_local = match &default.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id.as_ref().map(|id| id.name.to_string())
                    }
                    other => match other.as_expression() {
                        Some(Expression::Identifier(ident)) => Some(ident.name.to_string()),
                        _ => None,
                    },
                };
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                let source = all.source.value.to_string();
                bindings.sources.push(source.clone());
                match &all.exported {
                    // `export * as ns from` only adds a namespace binding.
                    Some(exported) => bindings.re_exports.push(ReExport {
                        exported: module_export_name(exported),
                        imported: "*".to_string(),
                        source,
                    }),
                    None => bindings.star_exports.push(source),
                }
            }
            _ => {}
        }
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn bindings_of(source: &str) -> ModuleBindings {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        collect_bindings(&ret.program)
    }

    #[test]
    fn imports_with_aliases_and_kinds() {
        let bindings = bindings_of(
            r#"
            import Button, { Card as Tile, type Props } from './ui';
            import * as icons from './icons';
            import type { Theme } from './theme';
            "#,
        );

        assert_eq!(bindings.imports.len(), 5);
        let tile = bindings.import_for_local("Tile").unwrap();
        assert_eq!(tile.imported, ImportedName::Named("Card".to_string()));
        assert_eq!(tile.source, "./ui");
        assert!(!tile.is_type);
        assert_eq!(bindings.import_for_local("Button").unwrap().imported, ImportedName::Default);
        assert!(bindings.import_for_local("Props").unwrap().is_type);
        assert!(bindings.import_for_local("Theme").unwrap().is_type);
        assert_eq!(bindings.import_for_local("icons").unwrap().imported.export_name(), "*");
        assert_eq!(bindings.sources, ["./ui", "./icons", "./theme"]);
    }

    #[test]
    fn exports_of_all_shapes() {
        let bindings = bindings_of(
            r#"
            export const Button = () => null, other = 1;
            export function helper() {}
            const Card = () => null;
            export { Card as Tile };
            export { Badge as Label } from './badge';
            export * from './icons';
            export default Card;
            "#,
        );

        assert_eq!(bindings.local_export("Button"), Some("Button"));
        assert_eq!(bindings.local_export("other"), Some("other"));
        assert_eq!(bindings.local_export("helper"), Some("helper"));
        assert_eq!(bindings.local_export("Tile"), Some("Card"));
        assert_eq!(bindings.re_exports[0].exported, "Label");
        assert_eq!(bindings.re_exports[0].imported, "Badge");
        assert_eq!(bindings.star_exports, ["./icons"]);
        assert!(bindings.has_default);
        assert_eq!(bindings.default_local.as_deref(), Some("Card"));
    }

    #[test]
    fn anonymous_default_export() {
        let bindings = bindings_of("export default function () {}");
        assert!(bindings.has_default);
        assert_eq!(bindings.default_local, None);
    }
}
