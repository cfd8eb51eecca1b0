//! Route-level models parsed from the specification document.
//!
//! The graph builder walks routes in the order they are declared in the
//! source document, and the scheduler's tie-break depends on that order, so
//! the path table, the method table, and request-body content maps are all
//! parsed into order-preserving structures instead of plain JSON maps.

use std::{fmt, marker::PhantomData, str::FromStr};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{IgnoredAny, MapAccess, Visitor},
};
use serde_json::Value;

/// Unique identifier assigned to one documented operation, used as the
/// dependency-graph vertex key.
pub type RouteName = String;

/// HTTP methods a route can be documented under.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Uppercase form, used for request dispatch and log output.
    pub fn as_upper(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method carry a body template.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// JSON object deserialized into a vector of entries so that declaration
/// order survives parsing.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> OrderedMap<T> {
    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Get the first entry declared under `key`.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de, T> Deserialize<'de> for OrderedMap<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for OrderedMapVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = OrderedMap<T>;

            fn expecting(
                &self,
                formatter: &mut fmt::Formatter,
            ) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap { entries })
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// All operations documented under one route path, in declaration order.
///
/// Keys that are not HTTP methods (path-level `parameters`, `summary` and
/// friends) are ignored.
#[derive(Debug, Clone, Default)]
pub struct PathItemModel {
    operations: Vec<(HttpMethod, OperationModel)>,
}

impl PathItemModel {
    /// Iterate `(method, operation)` pairs in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &OperationModel)> {
        self.operations.iter().map(|(m, op)| (*m, op))
    }
}

impl<'de> Deserialize<'de> for PathItemModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PathItemVisitor;

        impl<'de> Visitor<'de> for PathItemVisitor {
            type Value = PathItemModel;

            fn expecting(
                &self,
                formatter: &mut fmt::Formatter,
            ) -> fmt::Result {
                formatter.write_str("a path item object keyed by HTTP method")
            }

            fn visit_map<A>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut operations = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    match HttpMethod::from_str(&key) {
                        Ok(method) => {
                            let operation = access.next_value::<OperationModel>()?;
                            operations.push((method, operation));
                        }
                        Err(_) => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(PathItemModel { operations })
            }
        }

        deserializer.deserialize_map(PathItemVisitor)
    }
}

/// One documented operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationModel {
    /// Unique route name, required for participation in the dependency graph.
    pub name: Option<RouteName>,
    /// Raw `parameters` value; validated as an array at graph-build time.
    pub parameters: Option<Value>,
    /// OpenAPI v3 request body declaration.
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBodyModel>,
}

/// OpenAPI v3 request body: content types in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBodyModel {
    #[serde(default)]
    pub content: OrderedMap<MediaTypeModel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypeModel {
    pub schema: Option<SchemaRefModel>,
}

/// A `$ref` into the definitions/schemas section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaRefModel {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

impl SchemaRefModel {
    /// Last segment of the reference, i.e. the definition name.
    pub fn definition_name(&self) -> Option<&str> {
        self.reference.as_deref().and_then(|r| r.rsplit('/').next())
    }
}

/// One declared parameter of an operation.
///
/// Fields are optional so that a partially documented parameter does not
/// abort parsing; the graph builder only consults complete ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterModel {
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    /// Symbolic reference supplying the parameter's value at crawl time.
    #[serde(rename = "defaultTemplate")]
    pub default_template: Option<String>,
    /// Swagger v2 body parameters reference their definition here.
    pub schema: Option<SchemaRefModel>,
}

impl ParameterModel {
    pub fn is_path(&self) -> bool {
        self.location.as_deref() == Some("path")
    }

    pub fn is_body(&self) -> bool {
        self.location.as_deref() == Some("body")
    }
}

/// Everything needed to issue one crawl request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData {
    /// Route name, the graph vertex key.
    pub name: RouteName,
    /// Documented HTTP method.
    pub method: HttpMethod,
    /// Path exactly as declared in the spec, `{param}` placeholders intact.
    pub original_route: String,
    /// Path with placeholders statically replaced by their symbolic
    /// templates; resolved against the run context at request time.
    pub api_route: String,
    /// Request body template, possibly containing symbolic references.
    pub request_body: Option<Value>,
    /// Definition the request body was resolved from.
    pub definition_name: Option<String>,
}
