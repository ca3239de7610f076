//! Per-node processing of the usage tree.
//!
//! [`SyntaxWalker::walk_node`] is called once for every node the graph
//! traversal reaches. It decides whether the node needs parsing at all,
//! discovers the node's imports as child nodes, and generates identifiers
//! for components that carry metadata and have stories.

mod imports;
mod metadata;

pub use imports::collect_import_specifiers;
pub use metadata::find_metadata;

use std::path::Path;

use oxc_allocator::Allocator;
use rustc_hash::FxHashSet;

use storymap_graph::path::is_third_party;
use storymap_graph::{
    BuildContext, DependencyGraph, DiagnosticKind, ExampleCatalog, ExampleId, ExampleRecord,
    NodeId, NodeSpec, Result,
};

use crate::module_syntax::{ImportBinding, ImportedName, DEFAULT_EXPORT};
use crate::program::SourceProgram;
use crate::resolver::{Declaration, ModuleResolver};

/// Packages whose presence marks the importing tree as routed.
const ROUTER_PACKAGES: &[&str] = &["react-router", "react-router-dom"];
/// Packages that bind components to a global store.
const STATE_BINDING_PACKAGES: &[&str] = &["react-redux"];

/// What a walk step does besides bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkMode {
    /// Parse imports and attach them as children.
    pub discover_children: bool,
    /// Extract metadata and register identifiers.
    pub generate_uids: bool,
}

/// Why a node was not parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyParsed,
    VirtualRoot,
    ThirdParty,
    ResolutionError,
}

/// Result of one [`SyntaxWalker::walk_node`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Skipped(SkipReason),
    Parsed {
        children: usize,
        identifiers: usize,
    },
}

/// Walks graph nodes: import discovery and identifier generation.
#[derive(Debug)]
pub struct SyntaxWalker<'b> {
    program: &'b SourceProgram,
    resolver: &'b ModuleResolver<'b>,
    metadata_path: Vec<String>,
    /// Records whose identifiers were generated already.
    processed: FxHashSet<ExampleId>,
    ctx: BuildContext,
}

impl<'b> SyntaxWalker<'b> {
    pub fn new(resolver: &'b ModuleResolver<'b>, metadata_key: &str, ctx: &BuildContext) -> Self {
        Self {
            program: resolver.program(),
            resolver,
            metadata_path: metadata_key.split('.').map(str::to_string).collect(),
            processed: FxHashSet::default(),
            ctx: ctx.scoped("walker"),
        }
    }

    /// Process one node. Every node ends up marked as parsed.
    ///
    /// Fails only when a linked story file is missing from the program.
    pub fn walk_node(
        &mut self,
        graph: &mut DependencyGraph,
        catalog: &mut ExampleCatalog,
        id: NodeId,
        mode: WalkMode,
    ) -> Result<WalkOutcome> {
        if let Some(reason) = self.check_node(graph, id) {
            graph.node_mut(id).parsed = true;
            return Ok(WalkOutcome::Skipped(reason));
        }

        let file_path = graph.node(id).file_path.clone();
        let example = if graph.node(id).is_story_file {
            catalog.find_for_story(&file_path)
        } else {
            catalog.find_for_component(&file_path)
        };
        if let Some(example) = example {
            graph.link_example(id, example);
            catalog.mark_used(example);
        }

        let children = if mode.discover_children {
            self.discover_children(graph, id, &file_path)
        } else {
            0
        };

        let identifiers = match example {
            Some(example) if mode.generate_uids && self.processed.insert(example) => {
                match catalog.get(example) {
                    Some(record) => self.generate_identifiers(graph, record)?,
                    None => 0,
                }
            }
            _ => 0,
        };

        graph.node_mut(id).parsed = true;
        Ok(WalkOutcome::Parsed {
            children,
            identifiers,
        })
    }

    /// The skip checks, in order. Third-party nodes get their framework
    /// flags here.
    fn check_node(&self, graph: &mut DependencyGraph, id: NodeId) -> Option<SkipReason> {
        let node = graph.node_mut(id);

        if node.parsed {
            self.ctx
                .verbose(format!("{} has already been parsed", node.file_path.display()));
            return Some(SkipReason::AlreadyParsed);
        }

        if node.is_virtual_root {
            self.ctx.verbose("Skipping virtual root");
            return Some(SkipReason::VirtualRoot);
        }

        if node.is_third_party {
            let package = package_name(&node.import_path);
            node.uses_router |= ROUTER_PACKAGES.contains(&package);
            node.uses_state_binding |= STATE_BINDING_PACKAGES.contains(&package);
            self.ctx
                .verbose(format!("Skipping third-party module {}", node.import_path));
            return Some(SkipReason::ThirdParty);
        }

        if let Some(error) = &node.resolution_error {
            self.ctx.error(DiagnosticKind::Resolution, error.to_string());
            return Some(SkipReason::ResolutionError);
        }

        None
    }

    fn discover_children(&self, graph: &mut DependencyGraph, id: NodeId, path: &Path) -> usize {
        let Some(file) = self.program.get(path) else {
            self.ctx.warn(
                DiagnosticKind::Other,
                format!("{} is not part of the program", path.display()),
            );
            return 0;
        };

        let allocator = Allocator::default();
        let program = file.parse(&allocator, &self.ctx);
        let (specifiers, dynamic_skipped) = collect_import_specifiers(&program);
        if dynamic_skipped > 0 {
            self.ctx.verbose(format!(
                "{dynamic_skipped} dynamic import(s) without a static path in {}",
                path.display()
            ));
        }

        let count = specifiers.len();
        for specifier in specifiers {
            // Aliased bare specifiers resolve inside the project and must not
            // be taken for packages.
            let aliased = is_third_party(&specifier)
                .then(|| self.resolver.resolve_bare(&specifier))
                .flatten();
            let mut spec = NodeSpec::child(specifier, id);
            if let Some(path) = aliased {
                spec = spec.with_resolved(path);
            }

            let child = graph.create_or_get_node(spec, self.resolver);
            graph.add_child(id, child);
        }
        count
    }

    /// Extract the component's metadata and register its identifiers.
    fn generate_identifiers(
        &self,
        graph: &mut DependencyGraph,
        record: &ExampleRecord,
    ) -> Result<usize> {
        let story_file = self.program.source(&record.story_file_path)?;
        let Some(component_path) = record.component_path.as_deref() else {
            self.ctx.verbose(format!(
                "No component path for {}",
                record.story_file_path.display()
            ));
            return Ok(0);
        };

        let Some(import) = self.component_import(record, component_path) else {
            self.ctx.warn(
                DiagnosticKind::StructuralMismatch,
                format!(
                    "Could not find the import of {} in {}",
                    record.component_alias,
                    story_file.path.display()
                ),
            );
            return Ok(0);
        };

        let imported = match &import.imported {
            ImportedName::Namespace => ImportedName::Named(record.component_name.clone()),
            other => other.clone(),
        };
        let declaration = self
            .resolver
            .find_declaring_file(&story_file.path, &import.source, &imported)
            .unwrap_or_else(|| Declaration {
                path: component_path.to_path_buf(),
                local_name: imported.export_name().to_string(),
            });

        if declaration.local_name == DEFAULT_EXPORT {
            self.ctx.verbose(format!(
                "Anonymous default export in {} cannot carry metadata",
                declaration.path.display()
            ));
            return Ok(0);
        }

        let declaring_file = self.program.source(&declaration.path)?;
        let allocator = Allocator::default();
        let program = declaring_file.parse(&allocator, &self.ctx);
        let metadata_path: Vec<&str> = self.metadata_path.iter().map(String::as_str).collect();
        let Some(metadata) = find_metadata(
            &program,
            &declaring_file.text,
            &declaration.local_name,
            &metadata_path,
            &self.ctx,
        ) else {
            self.ctx.verbose(format!(
                "No metadata for {} in {}",
                declaration.local_name,
                declaration.path.display()
            ));
            return Ok(0);
        };

        let entries = record.select_entries();
        let component_name = if record.component_name == DEFAULT_EXPORT {
            record.component_alias.as_str()
        } else {
            record.component_name.as_str()
        };

        Ok(graph.generate_identifiers(
            component_name,
            &metadata,
            &entries,
            Some(&record.story_file_path),
        ))
    }

    /// The story file's import that binds the record's component: same local
    /// name and resolving to the component path.
    fn component_import(
        &self,
        record: &ExampleRecord,
        component_path: &Path,
    ) -> Option<ImportBinding> {
        let local_root = record
            .component_alias
            .split('.')
            .next()
            .unwrap_or(&record.component_alias);
        let bindings = self.resolver.bindings(&record.story_file_path)?;

        bindings.imports.into_iter().find(|import| {
            !import.is_type
                && import.local == local_root
                && self
                    .resolver
                    .resolve_from_file(&import.source, &record.story_file_path)
                    .is_ok_and(|resolved| resolved == component_path)
        })
    }
}

/// `@scope/pkg/sub` -> `@scope/pkg`, `pkg/sub` -> `pkg`.
fn package_name(specifier: &str) -> &str {
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next().unwrap_or(specifier);
    match (first.starts_with('@'), parts.next()) {
        (true, Some(second)) => &specifier[..first.len() + 1 + second.len()],
        _ => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names() {
        assert_eq!(package_name("react-router-dom"), "react-router-dom");
        assert_eq!(package_name("react-router/server"), "react-router");
        assert_eq!(package_name("@scope/pkg/deep/file"), "@scope/pkg");
        assert_eq!(package_name("@scope"), "@scope");
    }
}
