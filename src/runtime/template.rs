//! Symbolic reference extraction and resolution.
//!
//! Paths and request bodies reference values produced by earlier routes
//! through tokens like `$Org`, `$Org[0]` or `$Org[0].id`. References are
//! parsed into an identifier plus a chain of index/field accessors and
//! evaluated against the run context; no other expression forms exist, and
//! nothing is ever interpreted as code.

use regex::Regex;
use serde_json::Value;

use crate::{ApiflowError, Result, runtime::Context};

/// Reserved reference namespace exposing run environment metadata instead
/// of a route's response: `$process.env.NAME`.
pub const METADATA_NAMESPACE: &str = "process";

/// Matches documented route placeholders: `/api/v1/{value}`
const ROUTE_PARAMETER_PATTERN: &str = r"\{(\w+)\}";
/// Matches symbolic references in route strings: `/$Org[0]/blanks`
const ROUTE_DEPENDENCY_PATTERN: &str = r"\$\w+(?:\[\w+\]|\.\w+)*";
/// Matches symbolic references quoted inside serialized bodies: `{"key": "$Org"}`
const BODY_DEPENDENCY_PATTERN: &str = r#""\$\w+(?:\[\w+\]|\.\w+)*""#;

/// One accessor step of a reference chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `[0]`: array element lookup.
    Index(usize),
    /// `.field` or `[field]`: object member lookup.
    Key(String),
}

/// A parsed symbolic reference: `$Name` plus its accessor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub accessors: Vec<Accessor>,
}

impl Reference {
    /// Parse a reference token, e.g. `$Org[0].id`.
    pub fn parse(token: &str) -> Result<Self> {
        let rest = token.strip_prefix('$').ok_or_else(|| ApiflowError::Reference(format!("reference must start with '$': {}", token)))?;

        let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
        if name.is_empty() {
            return Err(ApiflowError::Reference(format!("reference has no identifier: {}", token)));
        }

        let mut accessors = Vec::new();
        let mut chars = rest[name.len()..].chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '[' => {
                    let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                    if inner.is_empty() {
                        return Err(ApiflowError::Reference(format!("empty index accessor in reference: {}", token)));
                    }
                    match inner.parse::<usize>() {
                        Ok(index) => accessors.push(Accessor::Index(index)),
                        Err(_) => accessors.push(Accessor::Key(inner)),
                    }
                }
                '.' => {
                    let mut field = String::new();
                    while let Some(c) = chars.peek() {
                        if c.is_alphanumeric() || *c == '_' {
                            field.push(*c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if field.is_empty() {
                        return Err(ApiflowError::Reference(format!("empty field accessor in reference: {}", token)));
                    }
                    accessors.push(Accessor::Key(field));
                }
                _ => {
                    return Err(ApiflowError::Reference(format!("unexpected character '{}' in reference: {}", c, token)));
                }
            }
        }

        Ok(Self { name, accessors })
    }

    /// Evaluate the accessor chain against the run context.
    pub fn evaluate(
        &self,
        ctx: &Context,
    ) -> Result<Value> {
        if self.name == METADATA_NAMESPACE {
            return self.evaluate_metadata(ctx);
        }

        let mut current = ctx.response(&self.name).ok_or_else(|| ApiflowError::Reference(format!("dependency '{}' has not produced a value", self.name)))?;

        for accessor in &self.accessors {
            current = match accessor {
                Accessor::Index(index) => current
                    .as_array()
                    .and_then(|a| a.get(*index))
                    .cloned()
                    .ok_or_else(|| ApiflowError::Reference(format!("index [{}] not present while resolving ${}", index, self.name)))?,
                Accessor::Key(key) => current
                    .get(key)
                    .cloned()
                    .ok_or_else(|| ApiflowError::Reference(format!("field '{}' not present while resolving ${}", key, self.name)))?,
            };
        }

        Ok(current)
    }

    /// `$process.env.NAME` reads the run's environment metadata.
    fn evaluate_metadata(
        &self,
        ctx: &Context,
    ) -> Result<Value> {
        match &self.accessors[..] {
            [Accessor::Key(section), Accessor::Key(name)] if section == "env" => ctx
                .env()
                .get(name)
                .map(Value::String)
                .ok_or_else(|| ApiflowError::Reference(format!("env variable '{}' not found", name))),
            _ => Err(ApiflowError::Reference(format!("only 'env' metadata is available under ${}", METADATA_NAMESPACE))),
        }
    }
}

/// Names of the `{param}` placeholders declared in a route path.
pub fn route_parameters(route: &str) -> Vec<String> {
    let re = Regex::new(ROUTE_PARAMETER_PATTERN).unwrap();
    re.captures_iter(route).map(|caps| caps[1].to_string()).collect()
}

/// The node name a single template string refers to.
pub fn dependency_name(template: &str) -> Result<String> {
    Ok(Reference::parse(template.trim())?.name)
}

/// Distinct node names referenced by a serialized request body, in order of
/// first appearance. Metadata references are not dependencies.
pub fn body_dependencies(serialized: &str) -> Vec<String> {
    let re = Regex::new(BODY_DEPENDENCY_PATTERN).unwrap();
    let mut names: Vec<String> = Vec::new();
    for token in re.find_iter(serialized) {
        if let Ok(reference) = Reference::parse(token.as_str().trim_matches('"')) {
            if reference.name != METADATA_NAMESPACE && !names.contains(&reference.name) {
                names.push(reference.name);
            }
        }
    }
    names
}

/// Resolve every symbolic reference in a route string, replacing each token
/// with the resolved value's textual form.
pub fn resolve_route(
    ctx: &Context,
    route: &str,
) -> Result<String> {
    let re = Regex::new(ROUTE_DEPENDENCY_PATTERN).unwrap();
    let mut result = String::with_capacity(route.len());
    let mut consumed = 0;

    for token in re.find_iter(route) {
        let reference = Reference::parse(token.as_str())?;
        let value = reference.evaluate(ctx)?;
        result.push_str(&route[consumed..token.start()]);
        result.push_str(&value_text(&value));
        consumed = token.end();
    }
    result.push_str(&route[consumed..]);

    Ok(result)
}

/// Resolve symbolic references in a JSON body template recursively.
///
/// A string that is exactly one reference takes the resolved value with its
/// JSON type preserved; references embedded in longer strings interpolate
/// textually.
pub fn resolve_value(
    ctx: &Context,
    value: &Value,
) -> Result<Value> {
    match value {
        Value::String(s) => {
            let re = Regex::new(ROUTE_DEPENDENCY_PATTERN).unwrap();
            if let Some(token) = re.find(s) {
                if token.start() == 0 && token.end() == s.len() {
                    let reference = Reference::parse(token.as_str())?;
                    return reference.evaluate(ctx);
                }
            }
            Ok(Value::String(resolve_route(ctx, s)?))
        }
        Value::Array(elements) => {
            let resolved: Result<Vec<Value>> = elements.iter().map(|v| resolve_value(ctx, v)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(object) => {
            let resolved: Result<serde_json::Map<String, Value>> = object.iter().map(|(k, v)| resolve_value(ctx, v).map(|rv| (k.clone(), rv))).collect();
            Ok(Value::Object(resolved?))
        }
        _ => Ok(value.clone()),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Objects and arrays interpolate as their JSON form.
        v => v.to_string(),
    }
}
