//! Identifier (UID) generation.
//!
//! A [`UidGenerator`] turns the metadata object of a component into one or
//! more [`GeneratedUid`]s. The graph then links each of them to the stories
//! whose arguments carry the required property values.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of a UID generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedUid {
    pub uid: String,
    /// Property values a story must have for this UID to apply.
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Alias names are not guaranteed to be unique across components.
    #[serde(default)]
    pub is_alias: Option<bool>,
}

impl GeneratedUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            props: Map::new(),
            is_alias: None,
        }
    }

    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
    }

    pub fn alias(mut self) -> Self {
        self.is_alias = Some(true);
        self
    }
}

/// A UID linked to its component and matching stories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIdentifier {
    /// Internal id minted per metadata-bearing component.
    pub component_id: String,
    pub component_name: String,
    pub uid: String,
    pub is_alias: bool,
    pub props: Map<String, Value>,
    pub story_file_path: Option<PathBuf>,
    /// Ids of the stories whose arguments match `props`.
    pub story_ids: Vec<String>,
}

impl GeneratedIdentifier {
    pub fn key(&self) -> String {
        identifier_key(&self.component_id, &self.uid)
    }
}

/// Composite map key: `<componentId>-<uid>`.
pub fn identifier_key(component_id: &str, uid: &str) -> String {
    format!("{component_id}-{uid}")
}

/// Identifiers of a build in insertion order.
pub type IdentifierMap = IndexMap<String, GeneratedIdentifier>;

/// Produces UIDs from component metadata.
///
/// Any `Fn(&Map<String, Value>, &str) -> Vec<GeneratedUid>` closure is a
/// generator.
pub trait UidGenerator: Send + Sync {
    fn generate(&self, metadata: &Map<String, Value>, component_id: &str) -> Vec<GeneratedUid>;
}

impl<F> UidGenerator for F
where
    F: Fn(&Map<String, Value>, &str) -> Vec<GeneratedUid> + Send + Sync,
{
    fn generate(&self, metadata: &Map<String, Value>, component_id: &str) -> Vec<GeneratedUid> {
        self(metadata, component_id)
    }
}

/// Concatenates every `key-<json value>` pair into a single UID that applies
/// to all stories.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUidGenerator;

impl UidGenerator for DefaultUidGenerator {
    fn generate(&self, metadata: &Map<String, Value>, _component_id: &str) -> Vec<GeneratedUid> {
        if metadata.is_empty() {
            return Vec::new();
        }

        let uid: String = metadata
            .iter()
            .map(|(key, value)| format!("{key}-{value}"))
            .collect();

        vec![GeneratedUid::new(uid)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_generator_concatenates_pairs() {
        let metadata = json!({"name": "button", "version": 2});
        let uids = DefaultUidGenerator.generate(metadata.as_object().unwrap(), "c1");

        assert_eq!(uids.len(), 1);
        assert_eq!(uids[0].uid, r#"name-"button"version-2"#);
        assert!(uids[0].props.is_empty());
        assert_eq!(uids[0].is_alias, None);
    }

    #[test]
    fn closures_are_generators() {
        let generator = |metadata: &Map<String, Value>, id: &str| {
            vec![GeneratedUid::new(format!("{id}:{}", metadata.len())).alias()]
        };
        let metadata = json!({"a": 1});

        let uids = generator.generate(metadata.as_object().unwrap(), "c1");
        assert_eq!(uids[0].uid, "c1:1");
        assert_eq!(uids[0].is_alias, Some(true));
    }

    #[test]
    fn key_format() {
        assert_eq!(identifier_key("abc", "btn"), "abc-btn");
    }
}
