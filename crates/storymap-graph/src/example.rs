//! Example (story) records and the catalog the build step owns.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::args::ArgumentMap;

/// One named example of a component.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleEntry {
    /// Export name of the story, e.g. `Primary`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Storybook id, e.g. `components-button--primary`.
    pub story_id: String,
    pub args: ArgumentMap,
}

/// `includeStories` / `excludeStories` of a story file.
#[derive(Debug, Clone, Default)]
pub enum ExampleFilter {
    #[default]
    Empty,
    /// Explicit export names.
    Names(Vec<String>),
    /// Regular expression matched against export names.
    Pattern(Regex),
}

impl ExampleFilter {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            ExampleFilter::Empty
        } else {
            ExampleFilter::Names(names)
        }
    }

    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(ExampleFilter::Pattern)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ExampleFilter::Empty => true,
            ExampleFilter::Names(names) => names.is_empty(),
            ExampleFilter::Pattern(_) => false,
        }
    }

    pub fn matches(&self, entry: &ExampleEntry) -> bool {
        match self {
            ExampleFilter::Empty => false,
            ExampleFilter::Names(names) => names.iter().any(|n| n == &entry.id),
            ExampleFilter::Pattern(regex) => regex.is_match(&entry.id),
        }
    }
}

impl Serialize for ExampleFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExampleFilter::Empty => serializer.collect_seq(std::iter::empty::<&str>()),
            ExampleFilter::Names(names) => serializer.collect_seq(names),
            ExampleFilter::Pattern(regex) => serializer.serialize_str(regex.as_str()),
        }
    }
}

/// Everything known about one story file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleRecord {
    pub story_file_path: PathBuf,
    /// Resolved path of the module the stories document.
    pub component_path: Option<PathBuf>,
    /// Export name of the component (`default` for default imports).
    pub component_name: String,
    /// Local name the story file imports the component as.
    pub component_alias: String,
    pub id: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    #[serde(rename = "includeStories")]
    pub include: ExampleFilter,
    #[serde(rename = "excludeStories")]
    pub exclude: ExampleFilter,
    #[serde(rename = "stories")]
    pub entries: Vec<ExampleEntry>,
    pub used: bool,
}

impl ExampleRecord {
    pub fn new(story_file_path: impl Into<PathBuf>) -> Self {
        Self {
            story_file_path: story_file_path.into(),
            component_path: None,
            component_name: String::new(),
            component_alias: String::new(),
            id: None,
            title: String::new(),
            tags: Vec::new(),
            include: ExampleFilter::Empty,
            exclude: ExampleFilter::Empty,
            entries: Vec::new(),
            used: false,
        }
    }

    /// Entries left after applying the filters. Exclude wins over include.
    pub fn select_entries(&self) -> Vec<&ExampleEntry> {
        if !self.exclude.is_empty() {
            self.entries
                .iter()
                .filter(|entry| !self.exclude.matches(entry))
                .collect()
        } else if !self.include.is_empty() {
            self.entries
                .iter()
                .filter(|entry| self.include.matches(entry))
                .collect()
        } else {
            self.entries.iter().collect()
        }
    }
}

/// Index of a record inside an [`ExampleCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExampleId(pub usize);

/// The story records of one build.
#[derive(Debug, Clone, Default)]
pub struct ExampleCatalog {
    records: Vec<ExampleRecord>,
}

impl ExampleCatalog {
    pub fn new(records: Vec<ExampleRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExampleRecord] {
        &self.records
    }

    pub fn get(&self, id: ExampleId) -> Option<&ExampleRecord> {
        self.records.get(id.0)
    }

    /// Record parsed from the story file at `path`.
    pub fn find_for_story(&self, path: &Path) -> Option<ExampleId> {
        self.records
            .iter()
            .position(|r| r.story_file_path == path)
            .map(ExampleId)
    }

    /// Record documenting the component at `path`.
    pub fn find_for_component(&self, path: &Path) -> Option<ExampleId> {
        self.records
            .iter()
            .position(|r| r.component_path.as_deref() == Some(path))
            .map(ExampleId)
    }

    pub fn mark_used(&mut self, id: ExampleId) {
        if let Some(record) = self.records.get_mut(id.0) {
            record.used = true;
        }
    }

    /// Records never matched into the tree.
    pub fn unused(&self) -> Vec<&ExampleRecord> {
        self.records.iter().filter(|r| !r.used).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ExampleEntry {
        ExampleEntry {
            id: id.to_string(),
            name: id.to_string(),
            story_id: format!("button--{}", id.to_lowercase()),
            args: ArgumentMap::new(),
        }
    }

    fn record() -> ExampleRecord {
        let mut record = ExampleRecord::new("/app/Button.stories.tsx");
        record.entries = vec![entry("Primary"), entry("Secondary"), entry("Large")];
        record
    }

    fn ids(entries: Vec<&ExampleEntry>) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn no_filters_keep_everything() {
        assert_eq!(ids(record().select_entries()), ["Primary", "Secondary", "Large"]);
    }

    #[test]
    fn include_filter_keeps_matches() {
        let mut record = record();
        record.include = ExampleFilter::names(["Primary"]);
        assert_eq!(ids(record.select_entries()), ["Primary"]);
    }

    #[test]
    fn exclude_takes_priority_over_include() {
        let mut record = record();
        record.include = ExampleFilter::names(["Primary"]);
        record.exclude = ExampleFilter::pattern("^S").unwrap();
        assert_eq!(ids(record.select_entries()), ["Primary", "Large"]);
    }

    #[test]
    fn catalog_lookup_and_unused() {
        let mut first = record();
        first.component_path = Some(PathBuf::from("/app/Button.tsx"));
        let second = ExampleRecord::new("/app/Card.stories.tsx");
        let mut catalog = ExampleCatalog::new(vec![first, second]);

        let id = catalog
            .find_for_component(Path::new("/app/Button.tsx"))
            .unwrap();
        assert_eq!(
            catalog.find_for_story(Path::new("/app/Button.stories.tsx")),
            Some(id)
        );
        catalog.mark_used(id);

        let unused = catalog.unused();
        assert_eq!(unused.len(), 1);
        assert_eq!(
            unused[0].story_file_path,
            PathBuf::from("/app/Card.stories.tsx")
        );
    }
}
