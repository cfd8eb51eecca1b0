mod infer;
mod store;

pub use infer::{JsonKind, SchemaNode, build_schema, build_schema_with, classify, example_map};
pub use store::{Definitions, SchemaStore};
