//! Error types for Apiflow.
//!
//! All errors in Apiflow are represented by the `ApiflowError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Apiflow operations.
///
/// Each variant represents a specific category of error that can occur
/// while parsing the specification, building and validating the dependency
/// graph, or crawling the described API.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum ApiflowError {
    /// Specification document errors (unrecognized shape, malformed paths).
    #[error("{0}")]
    Spec(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML, etc.).
    #[error("{0}")]
    Convert(String),

    /// Route declaration errors (missing name, malformed parameters).
    #[error("{0}")]
    Route(String),

    /// Two routes were declared under the same name.
    #[error("duplicate dependency name: {0}")]
    DuplicateRoute(String),

    /// Dependencies referencing names that are not nodes of the graph.
    #[error("dependencies are not satisfied: {}", names.join(", "))]
    Unsatisfied {
        names: Vec<String>,
    },

    /// Cyclic dependency chains detected before scheduling.
    #[error("cyclic dependency detected on route: {}", chains.iter().map(|c| c.join("->")).collect::<Vec<_>>().join("; "))]
    Cycle {
        chains: Vec<Vec<String>>,
    },

    /// Scheduling errors (no schedulable node left).
    #[error("{0}")]
    Schedule(String),

    /// A symbolic reference could not be resolved against the run context.
    #[error("{0}")]
    Reference(String),

    /// Response handling errors (undocumented status, data path descent).
    #[error("{0}")]
    Response(String),

    /// Network-level failure with no response at all.
    #[error("error occurred querying route for dependency {node} on {method} {url}: {message}")]
    Transport {
        node: String,
        method: String,
        url: String,
        message: String,
    },

    /// Schema inference errors (unsupported payload shapes).
    #[error("{0}")]
    Schema(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<ApiflowError> for String {
    fn from(val: ApiflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for ApiflowError {
    fn from(error: std::io::Error) -> Self {
        ApiflowError::IoError(error.to_string())
    }
}

impl From<ApiflowError> for std::io::Error {
    fn from(val: ApiflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for ApiflowError {
    fn from(error: serde_json::Error) -> Self {
        ApiflowError::Convert(error.to_string())
    }
}
