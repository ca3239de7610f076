//! In-memory source program.
//!
//! All project sources are read through the [`Runtime`] once, before the
//! synchronous graph traversal starts. Everything after that (resolution,
//! parsing, metadata extraction) works on these in-memory texts.

mod tsconfig;

pub use tsconfig::{CompilerOptions, TsConfigFile};

use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::GlobSet;
use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;
use rustc_hash::FxHashSet;

use storymap_graph::context::format_elapsed;
use storymap_graph::runtime::Runtime;
use storymap_graph::{BuildContext, DiagnosticKind, Error, Result};

use crate::config::{build_glob_set, StoryMapConfig};

const TSCONFIG_FILE_NAME: &str = "tsconfig.json";

/// One loaded source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// OXC source type inferred from the extension. Unknown extensions parse
    /// as TSX, the most permissive dialect.
    pub fn source_type(&self) -> SourceType {
        source_type_for(&self.path)
    }

    /// Parse into `allocator`. Syntax errors are logged; the recovered
    /// program is returned either way.
    pub fn parse<'a>(&'a self, allocator: &'a Allocator, ctx: &BuildContext) -> Program<'a> {
        let ret = Parser::new(allocator, &self.text, self.source_type()).parse();
        if !ret.errors.is_empty() {
            ctx.warn(
                DiagnosticKind::Other,
                format!(
                    "{} syntax error(s) in {}, continuing with the recovered tree",
                    ret.errors.len(),
                    self.path.display()
                ),
            );
        }
        ret.program
    }
}

pub(crate) fn source_type_for(path: &Path) -> SourceType {
    SourceType::from_path(path).unwrap_or_else(|_| SourceType::tsx())
}

/// The set of source files a build sees, plus the compiler options that
/// steer module resolution.
#[derive(Debug, Clone)]
pub struct SourceProgram {
    root: PathBuf,
    files: IndexMap<PathBuf, SourceFile>,
    story_globs: GlobSet,
    compiler_options: CompilerOptions,
    tsconfig_dir: PathBuf,
}

impl SourceProgram {
    /// Build a program from already loaded sources.
    pub fn new(
        root: impl Into<PathBuf>,
        sources: impl IntoIterator<Item = (PathBuf, String)>,
        config: &StoryMapConfig,
    ) -> Result<Self> {
        let root = root.into();
        let files = sources
            .into_iter()
            .map(|(path, text)| (path.clone(), SourceFile { path, text }))
            .collect();

        Ok(Self {
            tsconfig_dir: root.clone(),
            root,
            files,
            story_globs: build_glob_set(&config.stories)?,
            compiler_options: CompilerOptions::default(),
        })
    }

    pub fn with_compiler_options(
        mut self,
        options: CompilerOptions,
        tsconfig_dir: PathBuf,
    ) -> Self {
        self.compiler_options = options;
        self.tsconfig_dir = tsconfig_dir;
        self
    }

    /// Crawl the project root and read every matching source file.
    pub async fn load(
        runtime: &dyn Runtime,
        config: &StoryMapConfig,
        ctx: &BuildContext,
    ) -> Result<Self> {
        let ctx = ctx.scoped("program");
        let started = Instant::now();

        let root = match &config.root_dir {
            Some(root) => root.clone(),
            None => runtime.get_cwd()?,
        };

        let include = build_glob_set(&config.include)?;
        let exclude = build_glob_set(&config.exclude)?;
        let stories = build_glob_set(&config.stories)?;

        let mut sources = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            // Only an unreadable root fails the build; anything below it is
            // reported and skipped.
            let mut entries = match runtime.read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == root => return Err(e.into()),
                Err(e) => {
                    ctx.warn(
                        DiagnosticKind::Other,
                        format!("Skipping unreadable directory {}: {e}", dir.display()),
                    );
                    continue;
                }
            };
            entries.sort();

            for name in entries {
                let path = dir.join(&name);
                let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
                let metadata = match runtime.metadata(&path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        ctx.warn(
                            DiagnosticKind::Other,
                            format!("Skipping {}: {e}", path.display()),
                        );
                        continue;
                    }
                };

                if metadata.is_dir {
                    if metadata.is_symlink {
                        ctx.verbose(format!("Not following linked directory {}", path.display()));
                        continue;
                    }
                    // `**/node_modules/**` matches the directory's contents,
                    // not the directory itself.
                    if !exclude.is_match(relative.join("_")) {
                        pending.push(path);
                    }
                    continue;
                }

                let wanted = include.is_match(&relative) || stories.is_match(&relative);
                if !metadata.is_file || !wanted || exclude.is_match(&relative) {
                    continue;
                }

                let bytes = match runtime.read_file(&path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        ctx.warn(
                            DiagnosticKind::Other,
                            format!("Skipping unreadable source {}: {e}", path.display()),
                        );
                        continue;
                    }
                };
                match String::from_utf8(bytes) {
                    Ok(text) => sources.push((path, text)),
                    Err(_) => ctx.warn(
                        DiagnosticKind::Other,
                        format!("Skipping non UTF-8 source {}", path.display()),
                    ),
                }
            }
        }

        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let (compiler_options, tsconfig_dir) = load_tsconfig(runtime, config, &root, &ctx).await?;

        let program = Self {
            tsconfig_dir,
            root,
            files: sources
                .into_iter()
                .map(|(path, text)| (path.clone(), SourceFile { path, text }))
                .collect(),
            story_globs: stories,
            compiler_options,
        };

        ctx.verbose(format!(
            "Loaded {} source file(s) in {}",
            program.len(),
            format_elapsed(started.elapsed())
        ));

        Ok(program)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    /// Source of a file the caller knows must be loaded.
    pub fn source(&self, path: &Path) -> Result<&SourceFile> {
        self.files.get(path).ok_or_else(|| Error::MissingSource {
            path: path.to_path_buf(),
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn is_story_path(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.story_globs.is_match(relative)
    }

    /// Story files in path order. `.md`/`.mdx` documents are not story modules.
    pub fn story_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values().filter(|file| {
            let is_doc = matches!(
                file.path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("mdx")
            );
            !is_doc && self.is_story_path(&file.path)
        })
    }

    pub fn compiler_options(&self) -> &CompilerOptions {
        &self.compiler_options
    }

    /// Directory holding the tsconfig (the root when there is none).
    pub fn tsconfig_dir(&self) -> &Path {
        &self.tsconfig_dir
    }
}

async fn load_tsconfig(
    runtime: &dyn Runtime,
    config: &StoryMapConfig,
    root: &Path,
    ctx: &BuildContext,
) -> Result<(CompilerOptions, PathBuf)> {
    let path = match &config.tsconfig {
        Some(path) => path_clean::clean(root.join(path)),
        None => {
            let default = root.join(TSCONFIG_FILE_NAME);
            if !runtime.exists(&default) {
                return Ok((CompilerOptions::default(), root.to_path_buf()));
            }
            default
        }
    };

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());

    // Post-order over the `extends` graph, so bases are applied first.
    enum Step {
        Enter(PathBuf),
        Apply(TsConfigFile),
    }

    let mut options = CompilerOptions::default();
    let mut seen = FxHashSet::default();
    let mut steps = vec![Step::Enter(path.clone())];

    while let Some(step) = steps.pop() {
        let current = match step {
            Step::Apply(file) => {
                ctx.verbose(format!("Using compiler options from {}", file.path.display()));
                options.overlay(file);
                continue;
            }
            Step::Enter(current) => current,
        };
        if !seen.insert(current.clone()) {
            ctx.warn(
                DiagnosticKind::Other,
                format!("{} is extended more than once, ignoring repeat", current.display()),
            );
            continue;
        }

        // The configured file must be readable; extended bases are optional.
        let bytes = match runtime.read_file(&current).await {
            Ok(bytes) => bytes,
            Err(e) if current == path => return Err(e.into()),
            Err(e) => {
                ctx.warn(
                    DiagnosticKind::Other,
                    format!("Could not read {}: {e}", current.display()),
                );
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        let file = match TsConfigFile::parse(&current, &text) {
            Ok(file) => file,
            Err(e) => {
                ctx.warn(
                    DiagnosticKind::Other,
                    format!("Could not parse {}: {e}. Ignoring it.", current.display()),
                );
                continue;
            }
        };

        let bases: Vec<PathBuf> = file
            .extends
            .iter()
            .filter_map(|base| {
                let candidates = file.extends_candidates(base);
                let found = candidates.iter().find(|c| runtime.exists(c)).cloned();
                if found.is_none() {
                    ctx.warn(
                        DiagnosticKind::Other,
                        format!("{} extends missing config {base}", current.display()),
                    );
                }
                found
            })
            .collect();

        steps.push(Step::Apply(file));
        steps.extend(bases.into_iter().rev().map(Step::Enter));
    }

    Ok((options, dir))
}
