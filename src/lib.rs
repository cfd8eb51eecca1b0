//! # Apiflow
//!
//! Apiflow is a lightweight, dependency-ordered API crawler written in Rust.
//! Given an OpenAPI/Swagger-shaped specification whose routes carry symbolic
//! "default value" templates, it works out which routes must be called before
//! others, executes them in a valid order against the live API, and back-fills
//! the specification's schema definitions from the observed responses.
//!
//! ## Core Features
//!
//! - **Dependency Graph**: one node per named route, prerequisites inferred
//!   from path and request-body templates, validated for satisfaction and
//!   cycles before anything touches the network
//! - **Deterministic Scheduling**: Kahn's algorithm with declaration-order
//!   tie-breaking, so a crawl is reproducible run to run
//! - **Template Resolution**: `$Name[0].field` references resolved against
//!   earlier responses through a restricted accessor grammar
//! - **Schema Inference**: every captured payload is folded into the spec's
//!   definitions, with `required` narrowing across repeated observations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apiflow::{CrawlerBuilder, Definitions, SpecModel};
//!
//! let crawler = CrawlerBuilder::new()
//!     .base_url("http://localhost:3000")
//!     .data_path(["data"])
//!     .build()?;
//!
//! let spec = SpecModel::from_json(&std::fs::read_to_string("swagger.json")?)?;
//! let report = crawler.run(spec, Definitions::new()).await?;
//!
//! println!("{}", report.graph.schema());
//! std::fs::write("swagger.out.json", report.spec.to_json()?)?;
//! ```

mod builder;
mod common;
mod config;
mod crawler;
mod error;
mod graph;
mod model;
mod runtime;
mod schema;
mod transport;
mod utils;

pub use builder::CrawlerBuilder;
pub use common::ExecutionQueue;
pub use config::{Config, Mode, RequestConfig};
pub use crawler::{CrawlReport, Crawler};
pub use error::ApiflowError;
pub use graph::{DependencyGraph, RouteNode};
pub use model::{HttpMethod, RequestData, RouteName, SpecModel, SpecVersion};
pub use runtime::Context;
pub use schema::{Definitions, JsonKind, SchemaNode, SchemaStore};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Result type alias for Apiflow operations.
pub type Result<T> = std::result::Result<T, ApiflowError>;
