//! Graph construction from the specification's route table.
//!
//! Walks every `(path, method)` pair in declaration order, extracts the
//! route's prerequisites from its parameter templates and request-body
//! definition, and stores one node per uniquely-named route.

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    ApiflowError, Result,
    config::Mode,
    graph::graph::{DependencyGraph, RouteNode},
    model::{HttpMethod, OperationModel, ParameterModel, RequestData, SpecModel, SpecVersion},
    runtime::template,
    schema::Definitions,
};

/// Build the dependency graph for a specification.
///
/// `definitions` maps definition names to example bodies: caller-supplied
/// seeds merged over examples recovered from the document's own definitions
/// section. Routes whose body schema resolves to one of these names get
/// their body dependencies extracted from the example's serialized form.
pub fn build(
    spec: &SpecModel,
    definitions: &Definitions,
    mode: Mode,
) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();

    for (path, item) in spec.paths().iter() {
        for (method, operation) in item.operations() {
            debug!("parsing documentation under {} {}", method.as_upper(), path);

            let Some(name) = operation.name.clone() else {
                if mode.is_strict() {
                    return Err(ApiflowError::Route(format!("define name for route: {} {}", method.as_upper(), path)));
                }
                warn!("route {} {} has no name, excluding it from the crawl", method.as_upper(), path);
                continue;
            };

            if graph.contains(&name) && mode.is_strict() {
                return Err(ApiflowError::DuplicateRoute(name));
            }

            let parameters = parse_parameters(operation, method, path)?;
            let (api_route, parameter_dependencies) = parameter_dependencies(path, &parameters)?;
            let (request_body, definition_name, body_dependencies) = body_dependencies(spec.version(), method, operation, &parameters, definitions)?;

            let mut dependencies = parameter_dependencies;
            for dependency in body_dependencies {
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }

            debug!("obtained dependencies for node {}: [{}]", name, dependencies.join(", "));

            graph.insert(RouteNode {
                dependencies,
                request: RequestData {
                    name,
                    method,
                    original_route: path.clone(),
                    api_route,
                    request_body,
                    definition_name,
                },
            });
        }
    }

    Ok(graph)
}

fn parse_parameters(
    operation: &OperationModel,
    method: HttpMethod,
    path: &str,
) -> Result<Vec<ParameterModel>> {
    let Some(raw) = operation.parameters.as_ref() else {
        return Ok(Vec::new());
    };

    let Some(entries) = raw.as_array() else {
        return Err(ApiflowError::Route(format!("parameters must be an array on {} {}", method.as_upper(), path)));
    };

    entries
        .iter()
        .map(|entry| serde_json::from_value::<ParameterModel>(entry.clone()).map_err(|e| ApiflowError::Route(format!("malformed parameter on {} {}: {}", method.as_upper(), path, e))))
        .collect()
}

/// Static substitution of `{param}` placeholders by their symbolic
/// templates, plus the names those templates refer to.
fn parameter_dependencies(
    path: &str,
    parameters: &[ParameterModel],
) -> Result<(String, Vec<String>)> {
    let mut route = path.to_string();
    let mut dependencies = Vec::new();
    let placeholders = template::route_parameters(path);

    for parameter in parameters {
        let Some(default_template) = parameter.default_template.as_deref() else {
            continue;
        };

        if let Some(name) = parameter.name.as_deref() {
            if parameter.is_path() && placeholders.iter().any(|p| p == name) {
                route = route.replace(&format!("{{{}}}", name), default_template);
            }
        }

        let dependency = template::dependency_name(default_template)?;
        if dependency != template::METADATA_NAMESPACE && !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    }

    Ok((route, dependencies))
}

/// Resolve the request body's definition and scan its serialized example
/// for symbolic references.
fn body_dependencies(
    version: SpecVersion,
    method: HttpMethod,
    operation: &OperationModel,
    parameters: &[ParameterModel],
    definitions: &Definitions,
) -> Result<(Option<Value>, Option<String>, Vec<String>)> {
    if !method.has_body() {
        return Ok((None, None, Vec::new()));
    }

    let definition_name = match version {
        // The first declared content type resolving to a known definition
        // is authoritative.
        SpecVersion::V3 => operation.request_body.as_ref().and_then(|request_body| {
            request_body
                .content
                .iter()
                .filter_map(|(_, media)| media.schema.as_ref().and_then(|schema| schema.definition_name()))
                .find(|name| definitions.contains_key(*name))
                .map(str::to_string)
        }),
        SpecVersion::V2 => parameters
            .iter()
            .filter(|parameter| parameter.is_body())
            .filter_map(|parameter| parameter.schema.as_ref().and_then(|schema| schema.definition_name()))
            .find(|name| definitions.contains_key(*name))
            .map(str::to_string),
    };

    let Some(definition_name) = definition_name else {
        return Ok((None, None, Vec::new()));
    };

    let body = definitions.get(&definition_name).cloned().expect("definition presence checked above");
    let serialized = serde_json::to_string(&body)?;
    let dependencies = template::body_dependencies(&serialized);

    Ok((Some(body), Some(definition_name), dependencies))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn org_spec() -> SpecModel {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/api/v1/org": {
                    "get": { "name": "Organization" },
                },
                "/api/v1/org/{orgId}": {
                    "get": {
                        "name": "OrganizationID",
                        "parameters": [
                            { "name": "orgId", "in": "path", "defaultTemplate": "$Organization[0].id" },
                        ],
                    },
                },
                "/api/v1/budget": {
                    "post": {
                        "name": "Budget",
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BudgetRequest" },
                                },
                            },
                        },
                    },
                },
                "/api/v1/budget/{budgetId}": {
                    "get": {
                        "name": "GetBudget",
                        "parameters": [
                            { "name": "budgetId", "in": "path", "defaultTemplate": "$Budget.id" },
                        ],
                    },
                },
            },
        })
        .to_string();
        SpecModel::from_json(&text).unwrap()
    }

    fn seed_definitions() -> Definitions {
        let mut definitions = Definitions::new();
        definitions.insert("BudgetRequest".to_string(), json!({ "orgId": "$Organization[0].id" }));
        definitions
    }

    #[test]
    fn test_build_collects_nodes_in_declaration_order() {
        let graph = build(&org_spec(), &seed_definitions(), Mode::Lenient).unwrap();
        assert_eq!(graph.names(), ["Organization", "OrganizationID", "Budget", "GetBudget"]);
    }

    #[test]
    fn test_path_dependencies_and_substitution() {
        let graph = build(&org_spec(), &seed_definitions(), Mode::Lenient).unwrap();
        let node = graph.get("OrganizationID").unwrap();
        assert_eq!(node.dependencies, ["Organization"]);
        assert_eq!(node.request.api_route, "/api/v1/org/$Organization[0].id");
        assert_eq!(node.request.original_route, "/api/v1/org/{orgId}");
    }

    #[test]
    fn test_body_dependencies_from_seeded_definition() {
        let graph = build(&org_spec(), &seed_definitions(), Mode::Lenient).unwrap();
        let node = graph.get("Budget").unwrap();
        assert_eq!(node.dependencies, ["Organization"]);
        assert_eq!(node.request.definition_name.as_deref(), Some("BudgetRequest"));
        assert_eq!(node.request.request_body, Some(json!({ "orgId": "$Organization[0].id" })));
    }

    #[test]
    fn test_body_without_known_definition_has_no_dependencies() {
        let graph = build(&org_spec(), &Definitions::new(), Mode::Lenient).unwrap();
        let node = graph.get("Budget").unwrap();
        assert!(node.dependencies.is_empty());
        assert!(node.request.request_body.is_none());
    }

    #[test]
    fn test_unnamed_route_excluded_in_lenient_mode() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/api/v1/anonymous": { "get": {} },
                "/api/v1/org": { "get": { "name": "Organization" } },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let graph = build(&spec, &Definitions::new(), Mode::Lenient).unwrap();
        assert_eq!(graph.names(), ["Organization"]);
    }

    #[test]
    fn test_unnamed_route_fails_in_strict_mode() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/api/v1/anonymous": { "get": {} },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let result = build(&spec, &Definitions::new(), Mode::Strict);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("define name for route"));
    }

    #[test]
    fn test_duplicate_name_fails_in_strict_mode() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": { "get": { "name": "Twice" } },
                "/b": { "get": { "name": "Twice" } },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let result = build(&spec, &Definitions::new(), Mode::Strict);
        assert_eq!(result.unwrap_err(), ApiflowError::DuplicateRoute("Twice".to_string()));
    }

    #[test]
    fn test_duplicate_name_overwrites_in_lenient_mode() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": { "get": { "name": "Twice" } },
                "/b": { "get": { "name": "Twice" } },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let graph = build(&spec, &Definitions::new(), Mode::Lenient).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("Twice").unwrap().request.original_route, "/b");
    }

    #[test]
    fn test_parameters_must_be_an_array() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/a": { "get": { "name": "Bad", "parameters": { "name": "x" } } },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let result = build(&spec, &Definitions::new(), Mode::Lenient);
        assert!(result.unwrap_err().to_string().contains("parameters must be an array"));
    }

    #[test]
    fn test_env_metadata_template_is_not_a_dependency() {
        let text = json!({
            "openapi": "3.0.0",
            "paths": {
                "/api/{version}/org": {
                    "get": {
                        "name": "Organization",
                        "parameters": [
                            { "name": "version", "in": "path", "defaultTemplate": "$process.env.API_VERSION" },
                        ],
                    },
                },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let graph = build(&spec, &Definitions::new(), Mode::Lenient).unwrap();
        let node = graph.get("Organization").unwrap();
        assert!(node.dependencies.is_empty());
        assert_eq!(node.request.api_route, "/api/$process.env.API_VERSION/org");
    }

    #[test]
    fn test_v2_body_parameter_extraction() {
        let text = json!({
            "swagger": "2.0",
            "paths": {
                "/api/v1/budget": {
                    "post": {
                        "name": "Budget",
                        "parameters": [
                            { "name": "budget", "in": "body", "schema": { "$ref": "#/definitions/BudgetRequest" } },
                        ],
                    },
                },
            },
        })
        .to_string();
        let spec = SpecModel::from_json(&text).unwrap();

        let graph = build(&spec, &seed_definitions(), Mode::Lenient).unwrap();
        let node = graph.get("Budget").unwrap();
        assert_eq!(node.dependencies, ["Organization"]);
        assert_eq!(node.request.definition_name.as_deref(), Some("BudgetRequest"));
    }
}
