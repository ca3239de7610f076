//! Module resolution over the in-memory program.
//!
//! Implements the TypeScript flavour of node resolution closely enough for
//! component projects: relative and absolute specifiers, extension and
//! index probing, configured aliases, tsconfig `paths` and `baseUrl`.
//! A file exists when it is part of the [`SourceProgram`].

mod aliases;
mod declaration;
mod extensions;

pub use aliases::{match_paths_pattern, resolve_path_alias, resolve_tsconfig_paths};
pub use declaration::Declaration;
pub use extensions::{candidates, resolve_with_extensions, EXTENSIONS};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use storymap_graph::path::{clean_join, is_third_party};
use storymap_graph::{BuildContext, ModuleResolution, ResolutionError};

use crate::program::SourceProgram;

/// Resolves specifiers to files of a [`SourceProgram`].
#[derive(Debug)]
pub struct ModuleResolver<'p> {
    program: &'p SourceProgram,
    path_aliases: IndexMap<String, String>,
    ctx: BuildContext,
}

impl<'p> ModuleResolver<'p> {
    pub fn new(program: &'p SourceProgram, ctx: &BuildContext) -> Self {
        Self {
            program,
            path_aliases: IndexMap::new(),
            ctx: ctx.scoped("resolver"),
        }
    }

    pub fn with_path_aliases(mut self, aliases: IndexMap<String, String>) -> Self {
        self.path_aliases = aliases;
        self
    }

    pub fn program(&self) -> &'p SourceProgram {
        self.program
    }

    fn exists(&self, path: &Path) -> bool {
        self.program.contains(path)
    }

    fn probe(&self, base: &Path) -> Option<PathBuf> {
        resolve_with_extensions(base, |candidate| self.exists(candidate))
    }

    /// Resolve a bare specifier through aliases, tsconfig `paths` and
    /// `baseUrl`. `None` means it names a package.
    pub fn resolve_bare(&self, specifier: &str) -> Option<PathBuf> {
        if let Some(base) = resolve_path_alias(specifier, self.program.root(), &self.path_aliases) {
            if let Some(found) = self.probe(&base) {
                return Some(found);
            }
        }

        let options = self.program.compiler_options();
        let paths_base = options.paths_base(self.program.tsconfig_dir());
        for target in resolve_tsconfig_paths(specifier, paths_base, &options.paths) {
            if let Some(found) = self.probe(&target) {
                return Some(found);
            }
        }

        let base_url = options.base_url.as_deref()?;
        self.probe(&clean_join(base_url, specifier))
    }

    /// Resolve relative to the directory of `from_file`.
    pub fn resolve_from_file(
        &self,
        specifier: &str,
        from_file: &Path,
    ) -> Result<PathBuf, ResolutionError> {
        let from_dir = from_file.parent().unwrap_or(self.program.root());
        self.resolve(specifier, from_dir)
    }
}

impl ModuleResolution for ModuleResolver<'_> {
    fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, ResolutionError> {
        let found = if is_third_party(specifier) {
            self.resolve_bare(specifier)
        } else {
            self.probe(&clean_join(from_dir, specifier))
        };

        found.ok_or_else(|| {
            let error = ResolutionError {
                specifier: specifier.to_string(),
                from: from_dir.to_path_buf(),
                reason: "no matching source file".to_string(),
            };
            self.ctx.verbose(&error);
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoryMapConfig;
    use crate::program::CompilerOptions;

    fn program(files: &[&str]) -> SourceProgram {
        SourceProgram::new(
            "/app",
            files.iter().map(|f| (PathBuf::from(f), String::new())),
            &StoryMapConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn relative_with_extension_and_index() {
        let program = program(&["/app/src/Button.tsx", "/app/src/card/index.ts"]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);
        let from = Path::new("/app/src");

        assert_eq!(
            resolver.resolve("./Button", from).unwrap(),
            PathBuf::from("/app/src/Button.tsx")
        );
        assert_eq!(
            resolver.resolve("./card", from).unwrap(),
            PathBuf::from("/app/src/card/index.ts")
        );
        assert_eq!(
            resolver.resolve("../src/Button.tsx", from).unwrap(),
            PathBuf::from("/app/src/Button.tsx")
        );
    }

    #[test]
    fn missing_module_is_an_error() {
        let program = program(&[]);
        let ctx = BuildContext::default();
        let resolver = ModuleResolver::new(&program, &ctx);

        let err = resolver.resolve("./Nope", Path::new("/app/src")).unwrap_err();
        assert_eq!(err.specifier, "./Nope");
        assert_eq!(
            err.to_string(),
            "Could not resolve file path ./Nope from /app/src: no matching source file"
        );
    }

    #[test]
    fn bare_specifiers_use_aliases_paths_and_base_url() {
        let mut options = CompilerOptions {
            base_url: Some(PathBuf::from("/app/src")),
            ..CompilerOptions::default()
        };
        options
            .paths
            .insert("~ui/*".to_string(), vec!["components/*".to_string()]);

        let program = program(&[
            "/app/src/components/Button.tsx",
            "/app/src/utils/format.ts",
            "/app/lib/index.ts",
        ])
        .with_compiler_options(options, PathBuf::from("/app"));

        let ctx = BuildContext::default();
        let mut aliases = IndexMap::new();
        aliases.insert("@lib".to_string(), "lib".to_string());
        let resolver = ModuleResolver::new(&program, &ctx).with_path_aliases(aliases);
        let from = Path::new("/app/src/pages");

        assert_eq!(
            resolver.resolve("~ui/Button", from).unwrap(),
            PathBuf::from("/app/src/components/Button.tsx")
        );
        assert_eq!(
            resolver.resolve("utils/format", from).unwrap(),
            PathBuf::from("/app/src/utils/format.ts")
        );
        assert_eq!(
            resolver.resolve("@lib", from).unwrap(),
            PathBuf::from("/app/lib/index.ts")
        );
        assert!(resolver.resolve("react", from).is_err());
    }
}
