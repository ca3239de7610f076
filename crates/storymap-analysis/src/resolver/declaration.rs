//! Cross-file symbol lookup: where is an imported value declared?
//!
//! Follows `export { a as b } from`, `export * from` and
//! `import` + `export { local }` chains until a file declares the binding
//! itself.

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use rustc_hash::FxHashSet;

use super::ModuleResolver;
use crate::module_syntax::{collect_bindings, ImportedName, ModuleBindings, DEFAULT_EXPORT};

/// The file declaring a value and the binding name it has there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub path: PathBuf,
    /// `default` for anonymous default exports.
    pub local_name: String,
}

type Visited = FxHashSet<(PathBuf, String)>;

impl ModuleResolver<'_> {
    /// Bindings of a program file; `None` when the file is not loaded.
    pub(crate) fn bindings(&self, path: &Path) -> Option<ModuleBindings> {
        let file = self.program.get(path)?;
        let allocator = Allocator::default();
        let program = file.parse(&allocator, &self.ctx);
        Some(collect_bindings(&program))
    }

    /// Declaration behind `import { <imported> } from '<specifier>'` written
    /// in `from_file`.
    ///
    /// Returns `None` (logged at verbose level) when the chain leaves the
    /// program or cannot be followed statically.
    pub fn find_declaring_file(
        &self,
        from_file: &Path,
        specifier: &str,
        imported: &ImportedName,
    ) -> Option<Declaration> {
        if *imported == ImportedName::Namespace {
            self.ctx.verbose(format!(
                "Namespace import of {specifier} in {} has no single declaration",
                from_file.display()
            ));
            return None;
        }

        let target = match self.resolve_from_file(specifier, from_file) {
            Ok(target) => target,
            Err(err) => {
                self.ctx.verbose(&err);
                return None;
            }
        };

        let mut visited = Visited::default();
        let found = self.find_export(&target, imported.export_name(), &mut visited);
        if found.is_none() {
            self.ctx.verbose(format!(
                "Missing declaration for {} imported from {specifier} in {}",
                imported.export_name(),
                from_file.display()
            ));
        }
        found
    }

    fn find_export(&self, file: &Path, name: &str, visited: &mut Visited) -> Option<Declaration> {
        if !visited.insert((file.to_path_buf(), name.to_string())) {
            return None;
        }

        let Some(bindings) = self.bindings(file) else {
            self.ctx
                .verbose(format!("{} is not part of the program", file.display()));
            return None;
        };

        if name == DEFAULT_EXPORT {
            if let Some(local) = &bindings.default_local {
                return self.find_local(file, local, &bindings, visited);
            }
            if bindings.has_default {
                return Some(Declaration {
                    path: file.to_path_buf(),
                    local_name: DEFAULT_EXPORT.to_string(),
                });
            }
        } else if let Some(local) = bindings.local_export(name) {
            return self.find_local(file, local, &bindings, visited);
        }

        for re_export in bindings.re_exports.iter().filter(|r| r.exported == name) {
            if re_export.imported == "*" {
                continue;
            }
            let Ok(target) = self.resolve_from_file(&re_export.source, file) else {
                continue;
            };
            if let Some(found) = self.find_export(&target, &re_export.imported, visited) {
                return Some(found);
            }
        }

        // `export *` never forwards the default export.
        if name != DEFAULT_EXPORT {
            for source in &bindings.star_exports {
                let Ok(target) = self.resolve_from_file(source, file) else {
                    continue;
                };
                if let Some(found) = self.find_export(&target, name, visited) {
                    return Some(found);
                }
            }
        }

        None
    }

    /// A local binding is either declared here or imported from elsewhere.
    fn find_local(
        &self,
        file: &Path,
        local: &str,
        bindings: &ModuleBindings,
        visited: &mut Visited,
    ) -> Option<Declaration> {
        match bindings.import_for_local(local) {
            Some(import) if import.imported == ImportedName::Namespace => None,
            Some(import) => {
                let target = self.resolve_from_file(&import.source, file).ok()?;
                self.find_export(&target, import.imported.export_name(), visited)
            }
            None => Some(Declaration {
                path: file.to_path_buf(),
                local_name: local.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoryMapConfig;
    use crate::program::SourceProgram;
    use storymap_graph::BuildContext;

    fn program(files: &[(&str, &str)]) -> SourceProgram {
        SourceProgram::new(
            "/app",
            files
                .iter()
                .map(|(path, text)| (PathBuf::from(path), text.to_string())),
            &StoryMapConfig::default(),
        )
        .unwrap()
    }

    fn named(name: &str) -> ImportedName {
        ImportedName::Named(name.to_string())
    }

    #[test]
    fn direct_declaration() {
        let program = program(&[("/app/Button.tsx", "export const Button = () => null;")]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);

        let found = resolver
            .find_declaring_file(Path::new("/app/Button.stories.tsx"), "./Button", &named("Button"))
            .unwrap();
        assert_eq!(found.path, PathBuf::from("/app/Button.tsx"));
        assert_eq!(found.local_name, "Button");
    }

    #[test]
    fn follows_barrels_and_renames() {
        let program = program(&[
            ("/app/index.ts", "export * from './ui';"),
            ("/app/ui/index.ts", "export { Base as Button } from './Button';"),
            (
                "/app/ui/Button.tsx",
                "import { Impl } from './impl';\nexport { Impl as Base };",
            ),
            ("/app/ui/impl.tsx", "export function Impl() { return null; }"),
        ]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);

        let found = resolver
            .find_declaring_file(Path::new("/app/App.tsx"), "./index", &named("Button"))
            .unwrap();
        assert_eq!(found.path, PathBuf::from("/app/ui/impl.tsx"));
        assert_eq!(found.local_name, "Impl");
    }

    #[test]
    fn default_exports() {
        let program = program(&[
            ("/app/Card.tsx", "const Card = () => null;\nexport default Card;"),
            ("/app/Anon.tsx", "export default () => null;"),
        ]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);
        let from = Path::new("/app/App.tsx");

        let card = resolver
            .find_declaring_file(from, "./Card", &ImportedName::Default)
            .unwrap();
        assert_eq!(card.local_name, "Card");

        let anon = resolver
            .find_declaring_file(from, "./Anon", &ImportedName::Default)
            .unwrap();
        assert_eq!(anon.local_name, "default");
    }

    #[test]
    fn cycles_and_unknown_names_end_in_none() {
        let program = program(&[
            ("/app/a.ts", "export * from './b';"),
            ("/app/b.ts", "export * from './a';"),
        ]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);

        let from = Path::new("/app/App.tsx");
        assert_eq!(resolver.find_declaring_file(from, "./a", &named("Nope")), None);
        assert_eq!(
            resolver.find_declaring_file(from, "./a", &ImportedName::Namespace),
            None
        );
        assert_eq!(resolver.find_declaring_file(from, "./missing", &named("X")), None);
    }
}
