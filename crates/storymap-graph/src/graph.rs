//! Usage tree of a build.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; a second index maps
//! each resolved path to its node so that every file exists exactly once, no
//! matter how many importers reach it. Import cycles are therefore just edges
//! back to existing ids.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::args::arguments_match;
use crate::context::{BuildContext, DiagnosticKind};
use crate::error::{ResolutionError, Result};
use crate::example::{ExampleEntry, ExampleId};
use crate::node::{DependencyNode, NodeId, NodeSpec, SerializedNode};
use crate::path::{clean_join, display_name, is_story_file, is_third_party, normalize_entry_path};
use crate::uid::{
    DefaultUidGenerator, GeneratedIdentifier, GeneratedUid, IdentifierMap, UidGenerator,
};

/// Maps import specifiers to files.
///
/// `from_dir` is the directory of the importing file (or the graph base path
/// for entry points).
pub trait ModuleResolution {
    fn resolve(
        &self,
        specifier: &str,
        from_dir: &Path,
    ) -> std::result::Result<PathBuf, ResolutionError>;
}

/// Where a batch of identifiers comes from.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierSource<'a> {
    pub component_id: &'a str,
    pub component_name: &'a str,
    pub story_file: Option<&'a Path>,
    /// Filtered stories to match against.
    pub entries: &'a [&'a ExampleEntry],
}

pub struct DependencyGraph {
    base_path: PathBuf,
    nodes: Vec<DependencyNode>,
    by_path: FxHashMap<PathBuf, NodeId>,
    root: Option<NodeId>,
    identifiers: IdentifierMap,
    uid_generator: Arc<dyn UidGenerator>,
    ctx: BuildContext,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("base_path", &self.base_path)
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("identifiers", &self.identifiers.len())
            .finish()
    }
}

impl DependencyGraph {
    pub fn new(base_path: impl Into<PathBuf>, ctx: &BuildContext) -> Self {
        Self {
            base_path: base_path.into(),
            nodes: Vec::new(),
            by_path: FxHashMap::default(),
            root: None,
            identifiers: IdentifierMap::default(),
            uid_generator: Arc::new(DefaultUidGenerator),
            ctx: ctx.scoped("component-tree"),
        }
    }

    pub fn with_uid_generator(mut self, generator: Arc<dyn UidGenerator>) -> Self {
        self.uid_generator = generator;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DependencyNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[DependencyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn identifiers(&self) -> &IdentifierMap {
        &self.identifiers
    }

    pub fn into_identifiers(self) -> IdentifierMap {
        self.identifiers
    }

    /// Resolve `spec` and return the node for the resulting path, creating it
    /// on first encounter.
    ///
    /// Package specifiers are never resolved, and a path resolved by the
    /// caller is taken as is. A failed resolution still yields
    /// a node, carrying the error so the walker can skip it.
    pub fn create_or_get_node(
        &mut self,
        spec: NodeSpec,
        resolver: &dyn ModuleResolution,
    ) -> NodeId {
        if spec.is_virtual_root {
            return self.push_node(spec, self.base_path.clone(), None, false);
        }

        let from_dir = spec
            .parent
            .and_then(|parent| self.nodes[parent.0].file_path.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_path.clone());

        let third_party = spec.resolved.is_none() && is_third_party(&spec.import_path);
        let (file_path, error) = if let Some(resolved) = &spec.resolved {
            (resolved.clone(), None)
        } else if third_party {
            (PathBuf::from(&spec.import_path), None)
        } else {
            match resolver.resolve(&spec.import_path, &from_dir) {
                Ok(path) => (path, None),
                Err(err) => (clean_join(&from_dir, &spec.import_path), Some(err)),
            }
        };

        if let Some(&existing) = self.by_path.get(&file_path) {
            if spec.expect_fresh {
                self.ctx.warn(
                    DiagnosticKind::DuplicateKey,
                    format!(
                        "{} resolves to existing node {}",
                        spec.import_path,
                        file_path.display()
                    ),
                );
            }
            return existing;
        }

        let id = self.push_node(spec, file_path.clone(), error, third_party);
        self.by_path.insert(file_path, id);
        id
    }

    fn push_node(
        &mut self,
        spec: NodeSpec,
        file_path: PathBuf,
        resolution_error: Option<ResolutionError>,
        is_third_party: bool,
    ) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string());

        let node = DependencyNode {
            id: Uuid::new_v4().simple().to_string(),
            node_id,
            name: display_name(&file_path),
            is_story_file: is_story_file(&file_name),
            import_path: spec.import_path,
            file_path,
            file_name,
            is_root: spec.is_root || spec.is_virtual_root,
            is_virtual_root: spec.is_virtual_root,
            is_third_party,
            uses_router: false,
            uses_state_binding: false,
            parsed: false,
            resolution_error,
            example: None,
            children: Vec::new(),
        };
        self.ctx
            .verbose(format!("Node created: {}", node.file_path.display()));
        self.nodes.push(node);
        node_id
    }

    /// Record `child` as imported by `parent`. Repeated edges are ignored.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    pub fn link_example(&mut self, node: NodeId, example: ExampleId) {
        self.nodes[node.0].example = Some(example);
    }

    /// Create the single start node of the tree.
    ///
    /// One entry becomes the root itself; several entries hang below a virtual
    /// root that does not correspond to any file.
    pub fn build_root(
        &mut self,
        entries: &[String],
        resolver: &dyn ModuleResolution,
    ) -> Option<NodeId> {
        let entries: Vec<String> = entries.iter().map(|e| normalize_entry_path(e)).collect();

        let root = match entries.as_slice() {
            [] => {
                self.ctx.warn(DiagnosticKind::Other, "No entry files to build the tree from");
                return None;
            }
            [single] => self.create_or_get_node(NodeSpec::entry(single.clone()), resolver),
            many => {
                let virtual_root =
                    self.create_or_get_node(NodeSpec::virtual_root(&self.base_path), resolver);
                for entry in many {
                    let child = self.create_or_get_node(NodeSpec::entry(entry.clone()), resolver);
                    self.add_child(virtual_root, child);
                }
                virtual_root
            }
        };

        self.root = Some(root);
        Some(root)
    }

    /// Depth-first pre-order walk from the root, visiting every reachable
    /// node once.
    ///
    /// The visitor may add nodes and edges; children are read after the
    /// visitor returns, so newly discovered imports are walked as well.
    pub fn traverse<F>(&mut self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&mut Self, NodeId) -> Result<()>,
    {
        let Some(root) = self.root else {
            return Ok(());
        };

        let mut visited = FxHashSet::default();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            visitor(self, id)?;

            for &child in self.nodes[id.0].children.iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }

        Ok(())
    }

    /// Link `generated` to the entries whose arguments carry its property
    /// values and store it. The first identifier for a key wins.
    pub fn register_identifier(
        &mut self,
        generated: GeneratedUid,
        source: &IdentifierSource<'_>,
    ) -> bool {
        let mut story_ids: Vec<String> = Vec::new();
        for entry in source.entries {
            if arguments_match(&entry.args, &generated.props) && !story_ids.contains(&entry.id) {
                story_ids.push(entry.id.clone());
            }
        }

        let identifier = GeneratedIdentifier {
            component_id: source.component_id.to_string(),
            component_name: source.component_name.to_string(),
            uid: generated.uid,
            is_alias: generated.is_alias.unwrap_or(false),
            props: generated.props,
            story_file_path: source.story_file.map(Path::to_path_buf),
            story_ids,
        };

        let key = identifier.key();
        if self.identifiers.contains_key(&key) {
            self.ctx.warn(
                DiagnosticKind::DuplicateKey,
                format!(
                    "UID {} already exists for {}.",
                    identifier.uid, identifier.component_id
                ),
            );
            return false;
        }

        self.identifiers.insert(key, identifier);
        true
    }

    /// Run the UID generator for one component and register the results.
    ///
    /// Returns the number of identifiers stored. Empty metadata produces none.
    pub fn generate_identifiers(
        &mut self,
        component_name: &str,
        metadata: &Map<String, Value>,
        entries: &[&ExampleEntry],
        story_file: Option<&Path>,
    ) -> usize {
        if metadata.is_empty() {
            return 0;
        }

        let component_id = Uuid::new_v4().to_string();
        let generator = Arc::clone(&self.uid_generator);
        let source = IdentifierSource {
            component_id: &component_id,
            component_name,
            story_file,
            entries,
        };

        let mut stored = 0;
        for generated in generator.generate(metadata, &component_id) {
            if self.register_identifier(generated, &source) {
                stored += 1;
            }
        }

        self.ctx
            .verbose(format!("Generated {stored} UID(s) for {component_name}"));
        stored
    }

    /// Snapshot of the tree below the root.
    ///
    /// A node reached a second time (shared dependency or cycle) is emitted
    /// without its children.
    pub fn serialize(&self) -> Option<SerializedNode> {
        let root = self.root?;
        let mut emitted = FxHashSet::default();
        Some(self.serialize_node(root, &mut emitted))
    }

    fn serialize_node(&self, id: NodeId, emitted: &mut FxHashSet<NodeId>) -> SerializedNode {
        let node = &self.nodes[id.0];
        let file_path = node.file_path.to_string_lossy().to_string();

        if !emitted.insert(id) {
            return SerializedNode {
                file_path,
                children: Vec::new(),
            };
        }

        SerializedNode {
            file_path,
            children: node
                .children
                .iter()
                .map(|&child| self.serialize_node(child, emitted))
                .collect(),
        }
    }
}
