//! # storymap-graph
//!
//! Data structures for the component usage tree.
//!
//! This crate owns everything that does not need a parser: the
//! [`DependencyGraph`] of source files, the story records
//! ([`ExampleRecord`]) with their typed arguments ([`ArgumentValue`]), the
//! identifier generation that links component metadata to matching stories,
//! and the [`Runtime`](runtime::Runtime) abstraction used at the I/O edges of
//! a build.
//!
//! ```rust,ignore
//! use storymap_graph::{BuildContext, DependencyGraph, NodeSpec};
//!
//! let ctx = BuildContext::new(false);
//! let mut graph = DependencyGraph::new("/app", &ctx);
//! let root = graph.build_root(&["src/main.tsx".to_string()], &resolver);
//! graph.traverse(|graph, id| {
//!     println!("{}", graph.node(id).file_path.display());
//!     Ok(())
//! })?;
//! ```

pub mod args;
pub mod context;
mod error;
pub mod example;
mod graph;
mod node;
pub mod path;
pub mod runtime;
pub mod uid;

pub use args::{ArgumentMap, ArgumentValue};
pub use context::{BuildContext, Diagnostic, DiagnosticKind};
pub use error::{Error, ResolutionError, Result};
pub use example::{ExampleCatalog, ExampleEntry, ExampleFilter, ExampleId, ExampleRecord};
pub use graph::{DependencyGraph, IdentifierSource, ModuleResolution};
pub use node::{DependencyNode, NodeId, NodeSpec, SerializedNode};
pub use uid::{
    DefaultUidGenerator, GeneratedIdentifier, GeneratedUid, IdentifierMap, UidGenerator,
};

#[cfg(test)]
mod tests;
