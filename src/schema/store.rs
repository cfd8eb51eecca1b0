//! Run-scoped store of inferred schema definitions.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::{
    Result,
    schema::infer::{SchemaNode, build_schema_with},
};

/// Body-definition seed map: definition name to an example JSON value.
pub type Definitions = BTreeMap<String, Value>;

/// Mapping from definition name to the schema inferred for it so far.
///
/// Owned by the crawler for exactly one run. Seeding from the document's
/// already-documented definitions lets live observations narrow `required`
/// against existing documentation instead of starting blind.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    entries: BTreeMap<String, SchemaNode>,
}

impl SchemaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a document's definitions subtree.
    ///
    /// Entries that do not parse as schema nodes are skipped; they will be
    /// replaced outright by the first live observation.
    pub fn seed(
        &mut self,
        definitions: Option<&serde_json::Map<String, Value>>,
    ) {
        let Some(definitions) = definitions else {
            return;
        };

        for (name, definition) in definitions {
            match serde_json::from_value::<SchemaNode>(definition.clone()) {
                Ok(node) => {
                    self.entries.insert(name.clone(), node);
                }
                Err(e) => {
                    debug!("definition '{}' is not an inferable schema node, skipping seed: {}", name, e);
                }
            }
        }
    }

    /// Fold one observed payload into the schema stored under `name`.
    ///
    /// Returns the merged node, which has also replaced the stored entry.
    pub fn observe(
        &mut self,
        name: &str,
        data: &Value,
    ) -> Result<SchemaNode> {
        let merged = build_schema_with(data, self.entries.get(name))?;
        self.entries.insert(name.to_string(), merged.clone());
        Ok(merged)
    }

    /// The schema currently stored under `name`.
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&SchemaNode> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::infer::build_schema;

    #[test]
    fn test_observe_narrows_against_seeded_documentation() {
        let documented = serde_json::to_value(build_schema(&json!({ "a": 1, "b": 2 })).unwrap()).unwrap();
        let mut definitions = serde_json::Map::new();
        definitions.insert("Budget".to_string(), documented);

        let mut store = SchemaStore::new();
        store.seed(Some(&definitions));

        let merged = store.observe("Budget", &json!({ "a": 5 })).unwrap();
        assert_eq!(merged.required, Some(vec!["a".to_string()]));
        assert!(merged.properties.unwrap().contains_key("b"));
    }

    #[test]
    fn test_observe_unseeded_definition() {
        let mut store = SchemaStore::new();
        let node = store.observe("Fresh", &json!({ "x": true })).unwrap();
        assert_eq!(node.required, Some(vec!["x".to_string()]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_seed_skips_unparseable_entries() {
        let mut definitions = serde_json::Map::new();
        definitions.insert("Weird".to_string(), json!({ "required": "not-a-list" }));

        let mut store = SchemaStore::new();
        store.seed(Some(&definitions));
        assert!(store.is_empty());
    }
}
