//! # storymap-analysis
//!
//! Static analysis of a component project: loads the sources, reads the
//! story files, resolves imports into a usage tree and links component
//! metadata to the stories that exercise it.
//!
//! ```rust,ignore
//! use storymap_analysis::{run_build, StoryMapConfig};
//! use storymap_graph::runtime::NativeRuntime;
//!
//! let config = StoryMapConfig::load(Path::new("."), None)?;
//! let runtime = NativeRuntime::new();
//! if let Some(output) = run_build(&runtime, &config, None).await? {
//!     output.write_snapshot(&runtime, Path::new(".storymap"), &config.id).await?;
//! }
//! ```

pub mod config;
pub mod csf;
pub mod evaluate;
pub mod logger;
pub mod module_syntax;
pub mod names;
pub mod orchestrator;
pub mod output;
pub mod program;
pub mod resolver;
pub mod walker;

pub use config::StoryMapConfig;
pub use csf::{ExampleAstExtractor, StoryReader};
pub use orchestrator::{run_build, BuildMode, GraphOrchestrator};
pub use output::BuildOutput;
pub use program::{SourceFile, SourceProgram};
pub use resolver::{Declaration, ModuleResolver};
pub use walker::{SkipReason, SyntaxWalker, WalkMode, WalkOutcome};

#[cfg(test)]
mod tests;
