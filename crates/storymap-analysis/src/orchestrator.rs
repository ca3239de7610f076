//! Build orchestration.
//!
//! A build loads the [`SourceProgram`] through a [`Runtime`], reads the story
//! catalog, chooses the entry points, and then drives one synchronous
//! traversal of the [`DependencyGraph`] with a [`SyntaxWalker`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use storymap_graph::context::format_elapsed;
use storymap_graph::path::{clean_join, normalize_entry_path};
use storymap_graph::runtime::Runtime;
use storymap_graph::{
    BuildContext, DefaultUidGenerator, DependencyGraph, ExampleCatalog, Result, UidGenerator,
};

use crate::config::StoryMapConfig;
use crate::csf::StoryReader;
use crate::output::BuildOutput;
use crate::program::SourceProgram;
use crate::resolver::ModuleResolver;
use crate::walker::{SyntaxWalker, WalkMode};

/// What a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Full usage tree, optionally with identifiers.
    Tree { generate_uids: bool },
    /// Identifiers only: story files are walked without import discovery.
    UidsOnly,
}

impl BuildMode {
    /// Mode selected by the configuration flags; `None` when both are off.
    pub fn from_config(config: &StoryMapConfig) -> Option<Self> {
        match (config.generate_tree, config.generate_uids) {
            (true, generate_uids) => Some(BuildMode::Tree { generate_uids }),
            (false, true) => Some(BuildMode::UidsOnly),
            (false, false) => None,
        }
    }

    fn walk_mode(self) -> WalkMode {
        match self {
            BuildMode::Tree { generate_uids } => WalkMode {
                discover_children: true,
                generate_uids,
            },
            BuildMode::UidsOnly => WalkMode {
                discover_children: false,
                generate_uids: true,
            },
        }
    }
}

/// Runs builds over a loaded program.
pub struct GraphOrchestrator<'b> {
    program: &'b SourceProgram,
    config: &'b StoryMapConfig,
    uid_generator: Arc<dyn UidGenerator>,
    ctx: BuildContext,
}

impl std::fmt::Debug for GraphOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOrchestrator")
            .field("root", &self.program.root())
            .field("files", &self.program.len())
            .finish()
    }
}

impl<'b> GraphOrchestrator<'b> {
    pub fn new(program: &'b SourceProgram, config: &'b StoryMapConfig, ctx: &BuildContext) -> Self {
        Self {
            program,
            config,
            uid_generator: Arc::new(DefaultUidGenerator),
            ctx: ctx.scoped("orchestrator"),
        }
    }

    pub fn with_uid_generator(mut self, generator: Arc<dyn UidGenerator>) -> Self {
        self.uid_generator = generator;
        self
    }

    fn resolver(&self) -> ModuleResolver<'b> {
        ModuleResolver::new(self.program, &self.ctx)
            .with_path_aliases(self.config.path_aliases.clone())
    }

    /// Entry points of the tree.
    ///
    /// Configured entries win. Otherwise tree builds start from the
    /// components that have stories, and identifier-only builds from the
    /// story files themselves.
    pub fn entry_files(&self, catalog: &ExampleCatalog, mode: BuildMode) -> Vec<String> {
        if !self.config.entry_files.is_empty() {
            let root = self.program.root();
            return self
                .config
                .entry_files
                .iter()
                .map(|entry| absolute_entry(root, entry))
                .collect();
        }

        let mut entries: Vec<PathBuf> = match mode {
            BuildMode::Tree { .. } => catalog
                .records()
                .iter()
                .filter_map(|record| record.component_path.clone())
                .collect(),
            BuildMode::UidsOnly => catalog
                .records()
                .iter()
                .map(|record| record.story_file_path.clone())
                .collect(),
        };
        entries.sort();
        entries.dedup();
        entries
            .into_iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect()
    }

    /// Run one build.
    pub fn build(&self, mode: BuildMode) -> Result<BuildOutput> {
        let started = Instant::now();
        let resolver = self.resolver();

        let mut catalog =
            StoryReader::new(&resolver, &self.config.placeholder_functions, &self.ctx)
                .read_catalog();
        let entries = self.entry_files(&catalog, mode);
        self.ctx
            .verbose(format!("Building from {} entry file(s)", entries.len()));

        let mut graph = DependencyGraph::new(self.program.root(), &self.ctx)
            .with_uid_generator(Arc::clone(&self.uid_generator));
        graph.build_root(&entries, &resolver);

        let mut walker = SyntaxWalker::new(&resolver, &self.config.metadata_key, &self.ctx);
        let walk_mode = mode.walk_mode();
        graph.traverse(|graph, id| {
            walker
                .walk_node(graph, &mut catalog, id, walk_mode)
                .map(|_| ())
        })?;

        let tree = match mode {
            BuildMode::Tree { .. } => graph.serialize(),
            BuildMode::UidsOnly => None,
        };
        let output = BuildOutput {
            base_path: self.program.root().to_path_buf(),
            tree,
            unused_stories: catalog.unused().into_iter().cloned().collect(),
            uids: graph.into_identifiers(),
        };

        self.ctx.info(format!(
            "Built {} node(s) and {} UID(s) in {}",
            output.tree.as_ref().map_or(0, count_nodes),
            output.uids.len(),
            format_elapsed(started.elapsed())
        ));
        Ok(output)
    }

    /// Rebuild after `changed_file` changed on disk.
    ///
    /// Incremental updates are not supported; callers rebuild from scratch.
    pub fn update_tree(&self, changed_file: &Path) {
        self.ctx.info(format!(
            "Incremental update for {} is not yet implemented, rebuild required",
            changed_file.display()
        ));
    }
}

fn absolute_entry(root: &Path, entry: &str) -> String {
    let normalized = normalize_entry_path(entry);
    clean_join(root, &normalized).to_string_lossy().to_string()
}

fn count_nodes(node: &storymap_graph::SerializedNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// Load the program for `config` through `runtime` and run the build the
/// configuration asks for.
///
/// Returns `None` when the configuration disables both the tree and the
/// identifiers.
pub async fn run_build(
    runtime: &dyn Runtime,
    config: &StoryMapConfig,
    uid_generator: Option<Arc<dyn UidGenerator>>,
) -> Result<Option<BuildOutput>> {
    let ctx = BuildContext::new(config.debug);
    let Some(mode) = BuildMode::from_config(config) else {
        ctx.info("Tree and UID generation are both disabled, nothing to build");
        return Ok(None);
    };

    config.validate()?;
    let program = SourceProgram::load(runtime, config, &ctx).await?;
    let mut orchestrator = GraphOrchestrator::new(&program, config, &ctx);
    if let Some(generator) = uid_generator {
        orchestrator = orchestrator.with_uid_generator(generator);
    }
    orchestrator.build(mode).map(Some)
}
