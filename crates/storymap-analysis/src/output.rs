//! Build results and their JSON snapshot.

use std::path::{Path, PathBuf};

use serde::Serialize;

use storymap_graph::runtime::Runtime;
use storymap_graph::{ExampleRecord, IdentifierMap, Result, SerializedNode};

/// Everything one build produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub base_path: PathBuf,
    /// Usage tree; absent for identifier-only builds or without entries.
    pub tree: Option<SerializedNode>,
    pub uids: IdentifierMap,
    /// Story files whose component never showed up in the tree.
    pub unused_stories: Vec<ExampleRecord>,
}

impl BuildOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Path of the snapshot for build `id` inside `dir`.
    pub fn snapshot_path(dir: &Path, id: &str) -> PathBuf {
        dir.join(format!("{id}.json"))
    }

    /// Write the snapshot to `<dir>/<id>.json`, creating `dir` when needed.
    pub async fn write_snapshot(
        &self,
        runtime: &dyn Runtime,
        dir: &Path,
        id: &str,
    ) -> Result<PathBuf> {
        if !runtime.exists(dir) {
            runtime.create_dir(dir, true).await?;
        }

        let path = Self::snapshot_path(dir, id);
        let json = self.to_json()?;
        runtime.write_file(&path, json.as_bytes()).await?;
        tracing::debug!(path = %path.display(), "Snapshot written");
        Ok(path)
    }
}
