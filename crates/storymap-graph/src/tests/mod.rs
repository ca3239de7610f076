//! Integration tests for graph construction and identifier generation.

mod graph_tests;

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::path::clean_join;
use crate::{ModuleResolution, ResolutionError};

/// Resolver over a fixed set of files, trying `.ts` and `.tsx` suffixes.
pub(crate) struct FakeResolver {
    files: FxHashSet<PathBuf>,
}

impl FakeResolver {
    pub(crate) fn new(files: &[&str]) -> Self {
        Self {
            files: files.iter().map(PathBuf::from).collect(),
        }
    }
}

impl ModuleResolution for FakeResolver {
    fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, ResolutionError> {
        let base = clean_join(from_dir, specifier);
        let candidates = [
            base.clone(),
            PathBuf::from(format!("{}.ts", base.display())),
            PathBuf::from(format!("{}.tsx", base.display())),
        ];

        candidates
            .into_iter()
            .find(|candidate| self.files.contains(candidate))
            .ok_or_else(|| ResolutionError {
                specifier: specifier.to_string(),
                from: from_dir.to_path_buf(),
                reason: "no such file".to_string(),
            })
    }
}
