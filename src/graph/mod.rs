mod builder;
mod graph;
mod sort;
mod validate;

pub use builder::build;
pub use graph::{DependencyGraph, RouteNode};
pub use sort::topological_sort;
pub use validate::validate;
