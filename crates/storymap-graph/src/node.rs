use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ResolutionError;
use crate::example::ExampleId;

/// Index of a node inside its [`DependencyGraph`](crate::DependencyGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Request to create (or look up) a node.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Specifier as written in the importing file, or the entry path.
    pub import_path: String,
    /// Importing node. Entry points resolve against the graph base path.
    pub parent: Option<NodeId>,
    pub is_root: bool,
    pub is_virtual_root: bool,
    /// The caller expects a new node; finding an existing one is reported.
    pub expect_fresh: bool,
    /// Path the caller already resolved `import_path` to, e.g. through an
    /// alias. Such a node is never treated as a package.
    pub resolved: Option<PathBuf>,
}

impl NodeSpec {
    pub fn entry(path: impl Into<String>) -> Self {
        Self {
            import_path: path.into(),
            parent: None,
            is_root: true,
            is_virtual_root: false,
            expect_fresh: true,
            resolved: None,
        }
    }

    pub fn child(import_path: impl Into<String>, parent: NodeId) -> Self {
        Self {
            import_path: import_path.into(),
            parent: Some(parent),
            is_root: false,
            is_virtual_root: false,
            expect_fresh: false,
            resolved: None,
        }
    }

    pub fn with_resolved(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolved = Some(path.into());
        self
    }

    pub(crate) fn virtual_root(base_path: &Path) -> Self {
        Self {
            import_path: base_path.to_string_lossy().to_string(),
            parent: None,
            is_root: true,
            is_virtual_root: true,
            expect_fresh: true,
            resolved: None,
        }
    }
}

/// One source file (or package) in the usage tree.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// Opaque unique id.
    pub id: String,
    pub node_id: NodeId,
    pub import_path: String,
    /// Resolved absolute path; the raw specifier for packages.
    pub file_path: PathBuf,
    pub file_name: String,
    pub name: String,
    /// Set for the root and for every real entry under a virtual root.
    pub is_root: bool,
    pub is_virtual_root: bool,
    pub is_third_party: bool,
    pub is_story_file: bool,
    pub uses_router: bool,
    pub uses_state_binding: bool,
    pub parsed: bool,
    pub resolution_error: Option<ResolutionError>,
    /// Linked story record, either the node's own (story files) or the one
    /// documenting it (components).
    pub example: Option<ExampleId>,
    pub(crate) children: Vec<NodeId>,
}

impl DependencyNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Snapshot of the tree for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub file_path: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<SerializedNode>,
}
