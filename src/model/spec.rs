//! Specification document model.
//!
//! `SpecModel` keeps the raw document for in-place annotation alongside an
//! order-preserving route table used to build the dependency graph. The
//! document shape (Swagger v2 vs OpenAPI v3) is resolved once at parse time;
//! everything downstream addresses definitions and response references
//! through `SpecVersion` instead of probing the document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    ApiflowError, Result,
    model::route::{HttpMethod, OrderedMap, PathItemModel},
    schema::SchemaNode,
};

/// Which shape of specification document a crawl is working against.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpecVersion {
    /// Swagger v2: `swagger` key, definitions under `#/definitions`.
    V2,
    /// OpenAPI v3: `openapi` key, definitions under `#/components/schemas`.
    V3,
}

impl SpecVersion {
    /// Resolve the document shape from its version marker key.
    pub fn detect(document: &Value) -> Result<Self> {
        if document.get("swagger").is_some() {
            Ok(SpecVersion::V2)
        } else if document.get("openapi").is_some() {
            Ok(SpecVersion::V3)
        } else {
            Err(ApiflowError::Spec("unrecognized specification shape: expected a 'swagger' or 'openapi' version key".to_string()))
        }
    }

    /// Prefix for `$ref` strings pointing into the definitions section.
    pub fn ref_prefix(&self) -> &'static str {
        match self {
            SpecVersion::V2 => "#/definitions",
            SpecVersion::V3 => "#/components/schemas",
        }
    }

    /// Key path of the definitions section inside the document.
    pub fn definitions_path(&self) -> &'static [&'static str] {
        match self {
            SpecVersion::V2 => &["definitions"],
            SpecVersion::V3 => &["components", "schemas"],
        }
    }
}

/// Ordered route table parsed directly from the document text.
#[derive(Debug, Clone, Default, Deserialize)]
struct RouteTable {
    #[serde(default)]
    paths: OrderedMap<PathItemModel>,
}

/// A parsed specification document.
#[derive(Debug, Clone)]
pub struct SpecModel {
    version: SpecVersion,
    document: Value,
    paths: OrderedMap<PathItemModel>,
}

impl SpecModel {
    /// Parse a specification from JSON text.
    ///
    /// The text is deserialized twice: once into the raw document that gets
    /// annotated and returned, and once into the route table, which has to
    /// come from the text because JSON maps do not preserve declaration
    /// order once parsed into a generic value.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        let version = SpecVersion::detect(&document)?;
        let table: RouteTable = serde_json::from_str(text).map_err(|e| ApiflowError::Spec(format!("malformed paths section: {}", e)))?;

        Ok(Self {
            version,
            document,
            paths: table.paths,
        })
    }

    /// Parse a specification from an already-loaded JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_json(&serde_json::to_string(value)?)
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// The annotated document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume the model, yielding the annotated document.
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Serialize the annotated document as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// Route table in declaration order.
    pub fn paths(&self) -> &OrderedMap<PathItemModel> {
        &self.paths
    }

    /// The definitions/schemas subtree, if the document has one.
    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        let mut current = &self.document;
        for key in self.version.definitions_path() {
            current = current.get(key)?;
        }
        current.as_object()
    }

    /// Write an inferred schema under `name` in the definitions section,
    /// creating the section if the document lacks one.
    pub fn set_definition(
        &mut self,
        name: &str,
        schema: &SchemaNode,
    ) -> Result<()> {
        let value = serde_json::to_value(schema)?;
        let section = descend_mut(&mut self.document, self.version.definitions_path());
        match section.as_object_mut() {
            Some(map) => {
                map.insert(name.to_string(), value);
                Ok(())
            }
            None => Err(ApiflowError::Spec("definitions section is not an object".to_string())),
        }
    }

    /// Documented definition name for a response status, if the spec carries
    /// a `$ref` for it.
    pub fn response_ref(
        &self,
        route: &str,
        method: HttpMethod,
        status: u16,
        content_type: &str,
    ) -> Option<String> {
        let entry = self.document.get("paths")?.get(route)?.get(method.as_ref())?.get("responses")?.get(status.to_string())?;

        let reference = match self.version {
            SpecVersion::V2 => entry.get("schema")?.get("$ref")?,
            SpecVersion::V3 => entry.get("content")?.get(content_type)?.get("schema")?.get("$ref")?,
        };

        reference.as_str().and_then(|r| r.rsplit('/').next()).map(|r| r.to_string())
    }

    /// Patch the document's `responses` section with a reference to a newly
    /// minted definition for an undocumented status code.
    pub fn patch_response(
        &mut self,
        route: &str,
        method: HttpMethod,
        status: u16,
        content_type: &str,
        reference: &str,
    ) {
        let entry = swagger_ref(self.version, content_type, reference);
        let status_key = status.to_string();
        let target = descend_mut(&mut self.document, &["paths", route, method.as_ref(), "responses", status_key.as_str()]);
        *target = entry;
    }
}

/// Build the response-reference subtree pointing at a definition.
pub fn swagger_ref(
    version: SpecVersion,
    content_type: &str,
    reference: &str,
) -> Value {
    let target = format!("{}/{}", version.ref_prefix(), reference);
    match version {
        SpecVersion::V2 => json!({
            "schema": {
                "$ref": target,
            },
        }),
        SpecVersion::V3 => json!({
            "content": {
                (content_type): {
                    "schema": {
                        "$ref": target,
                    },
                },
            },
        }),
    }
}

/// Descend into nested objects, creating intermediate objects as needed.
fn descend_mut<'a>(
    value: &'a mut Value,
    keys: &[&str],
) -> &'a mut Value {
    let mut current = value;
    for key in keys {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current.as_object_mut().unwrap().entry(key.to_string()).or_insert(Value::Null);
    }
    current
}
