//! Dependency graph module, the structural backbone of archlint.
//!
//! Provides the graph data model, the mtime-keyed extraction cache, and the
//! builder that drives extractor + resolver across a file set.

pub mod builder;
pub mod cache;
pub mod types;

pub use builder::build_dependency_graph;
pub use cache::DependencyGraphCache;
pub use types::{DependencyGraph, ImportReference};
