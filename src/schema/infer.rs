//! Runtime schema inference.
//!
//! Converts arbitrary JSON payloads into schema nodes for the definitions
//! section of a specification document. Repeated observations of the same
//! definition are merged: a field stays `required` only while it has
//! appeared in every sample, and properties accumulate with their type and
//! example refreshed from the latest sample.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiflowError, Result};

/// Tag for every JSON shape a payload value can take.
///
/// All shape-dependent logic matches on this exhaustively; there is no other
/// type probing anywhere in the inference path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum JsonKind {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

/// Classify a JSON value into its shape tag.
pub fn classify(value: &Value) -> JsonKind {
    match value {
        Value::String(_) => JsonKind::String,
        Value::Number(_) => JsonKind::Number,
        Value::Bool(_) => JsonKind::Boolean,
        Value::Null => JsonKind::Null,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
    }
}

/// One node of an inferred schema tree.
///
/// Serializes into the `{type, required, properties, items, example}` shape
/// used by the definitions section; absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<JsonKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl SchemaNode {
    /// Leaf node for a primitive value.
    pub fn primitive(
        kind: JsonKind,
        example: Value,
    ) -> Self {
        Self {
            kind: Some(kind),
            example: Some(example),
            ..Default::default()
        }
    }
}

/// Infer a schema node from one concrete payload.
pub fn build_schema(data: &Value) -> Result<SchemaNode> {
    match classify(data) {
        JsonKind::String | JsonKind::Number | JsonKind::Boolean | JsonKind::Null => Ok(SchemaNode::primitive(classify(data), data.clone())),
        JsonKind::Array => array_schema(data),
        JsonKind::Object => object_schema(data),
    }
}

/// Infer a schema node from one payload, merging with a schema observed for
/// the same definition in prior samples.
///
/// The merged `required` list is the intersection of the existing list and
/// the keys present in the new sample; properties are the union, with keys
/// present in the new sample refreshed from it.
pub fn build_schema_with(
    data: &Value,
    existing: Option<&SchemaNode>,
) -> Result<SchemaNode> {
    let mut node = build_schema(data)?;

    let Some(existing) = existing else {
        return Ok(node);
    };

    if let (Some(object), Some(previous)) = (data.as_object(), existing.properties.as_ref()) {
        if let Some(required) = existing.required.as_ref() {
            node.required = Some(required.iter().filter(|key| object.contains_key(*key)).cloned().collect());
        }

        let mut merged = previous.clone();
        if let Some(properties) = node.properties.take() {
            for (key, property) in properties {
                merged.insert(key, property);
            }
        }
        node.properties = Some(merged);
    }

    Ok(node)
}

fn object_schema(data: &Value) -> Result<SchemaNode> {
    let object = data.as_object().expect("classified as object");

    let mut properties = BTreeMap::new();
    for (key, value) in object {
        properties.insert(key.clone(), build_schema(value)?);
    }

    Ok(SchemaNode {
        kind: Some(JsonKind::Object),
        required: Some(object.keys().cloned().collect()),
        properties: Some(properties),
        items: None,
        example: None,
    })
}

fn array_schema(data: &Value) -> Result<SchemaNode> {
    let elements = data.as_array().expect("classified as array");

    // Only element 0 is inspected; heterogeneous tails are not modeled.
    let Some(first) = elements.first() else {
        return Ok(SchemaNode {
            kind: Some(JsonKind::Array),
            example: Some(data.clone()),
            ..Default::default()
        });
    };

    match classify(first) {
        JsonKind::Array => Err(ApiflowError::Schema("complex object (array of array etc...)".to_string())),
        JsonKind::Object => {
            let element = object_schema(first)?;
            Ok(SchemaNode {
                kind: Some(JsonKind::Array),
                required: element.properties.as_ref().map(|p| p.keys().cloned().collect()),
                properties: None,
                items: Some(Box::new(SchemaNode {
                    kind: Some(JsonKind::Object),
                    properties: element.properties,
                    ..Default::default()
                })),
                example: Some(data.clone()),
            })
        }
        kind => Ok(SchemaNode {
            kind: Some(JsonKind::Array),
            required: None,
            properties: None,
            items: Some(Box::new(SchemaNode {
                kind: Some(kind),
                ..Default::default()
            })),
            example: Some(data.clone()),
        }),
    }
}

/// Invert a definitions subtree back into a map of example values.
///
/// Used to seed dependency extraction: request bodies whose definition is
/// already documented contribute their documented examples before any live
/// traffic has been observed.
pub fn example_map(definitions: Option<&serde_json::Map<String, Value>>) -> BTreeMap<String, Value> {
    let mut examples = BTreeMap::new();
    let Some(definitions) = definitions else {
        return examples;
    };

    for (name, definition) in definitions {
        examples.insert(name.clone(), definition_example(definition));
    }
    examples
}

fn definition_example(definition: &Value) -> Value {
    if let Some(properties) = definition.get("properties").and_then(Value::as_object) {
        let mut example = serde_json::Map::new();
        for (key, property) in properties {
            example.insert(key.clone(), definition_example(property));
        }
        return Value::Object(example);
    }

    definition.get("example").cloned().unwrap_or(Value::Null)
}
