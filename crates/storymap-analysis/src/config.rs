//! Build configuration.
//!
//! Values are layered with `figment`: built-in defaults, then
//! `storymap.config.json` in the project root (or an explicit file), then
//! `STORYMAP_*` environment variables.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use storymap_graph::{Error, Result};

/// Default config file name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "storymap.config.json";

/// Prefix of the environment variables read by [`StoryMapConfig::load`].
pub const ENV_PREFIX: &str = "STORYMAP_";

/// Options for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryMapConfig {
    /// Base path of the project. Falls back to the runtime's working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Explicit entry points of the usage tree.
    pub entry_files: Vec<String>,

    /// Globs selecting the story files among the crawled sources.
    pub stories: Vec<String>,

    /// Crawl include globs, relative to the root.
    pub include: Vec<String>,

    /// Crawl exclude globs, relative to the root.
    pub exclude: Vec<String>,

    /// tsconfig to read `baseUrl` and `paths` from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsconfig: Option<PathBuf>,

    /// Dotted property path of the metadata object, e.g. `metadata` for
    /// `Button.metadata = {...}`.
    pub metadata_key: String,

    pub generate_tree: bool,
    pub generate_uids: bool,

    /// Snapshot identifier, also used as the output file stem.
    pub id: String,

    pub debug: bool,

    /// Callees whose calls stand in for functions in story args, e.g. `fn()`.
    pub placeholder_functions: Vec<String>,

    /// Alias prefix to directory (relative to the root) rewrites.
    pub path_aliases: IndexMap<String, String>,
}

impl Default for StoryMapConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            entry_files: Vec::new(),
            stories: vec!["**/*.stories.{js,jsx,ts,tsx}".to_string()],
            include: vec!["**/*.{js,jsx,ts,tsx}".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/*.test.*".to_string(),
                "**/*.spec.*".to_string(),
            ],
            tsconfig: None,
            metadata_key: "metadata".to_string(),
            generate_tree: true,
            generate_uids: true,
            id: "defaultStorybook".to_string(),
            debug: false,
            placeholder_functions: vec!["fn".to_string()],
            path_aliases: IndexMap::new(),
        }
    }
}

impl StoryMapConfig {
    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(Path::to_path_buf).or_else(|| {
            let default_path = root.join(CONFIG_FILE_NAME);
            default_path.exists().then_some(default_path)
        });

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        // STORYMAP_METADATA_KEY -> metadataKey
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .map(|key| env_key_to_field(key.as_str()).into()),
        );

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        if config.root_dir.is_none() {
            config.root_dir = Some(root.to_path_buf());
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot drive a build.
    pub fn validate(&self) -> Result<()> {
        if self.metadata_key.split('.').any(str::is_empty) {
            return Err(Error::InvalidConfig(format!(
                "metadataKey '{}' must be a dotted property path",
                self.metadata_key
            )));
        }
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("id must not be empty".to_string()));
        }
        build_glob_set(&self.stories)?;
        build_glob_set(&self.include)?;
        build_glob_set(&self.exclude)?;
        Ok(())
    }

    pub fn with_root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root.into());
        self
    }

    pub fn with_entry_files<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_files = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.metadata_key = key.into();
        self
    }

    pub fn with_tsconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.tsconfig = Some(path.into());
        self
    }

    pub fn with_generate_tree(mut self, enabled: bool) -> Self {
        self.generate_tree = enabled;
        self
    }

    pub fn with_generate_uids(mut self, enabled: bool) -> Self {
        self.generate_uids = enabled;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_path_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.path_aliases.insert(alias.into(), target.into());
        self
    }

    /// Metadata property path split into segments.
    pub fn metadata_path(&self) -> Vec<&str> {
        self.metadata_key.split('.').collect()
    }
}

/// Compile a list of globs. Invalid patterns are configuration errors.
pub(crate) fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::InvalidConfig(format!("invalid glob set: {e}")))
}

fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !field.is_empty();
        } else if upper_next {
            field.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            field.push(ch.to_ascii_lowercase());
        }
    }
    field
}
