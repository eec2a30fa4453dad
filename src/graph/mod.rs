//! Embedded property graph
//!
//! A small in-memory store with MERGE-style upserts for nodes and
//! relationships. It backs the embedded backend used for local runs and tests:
//! - Single-label nodes with scalar properties
//! - Directed, typed edges
//! - Hash indices for label, relationship type, and merge keys

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{props, PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
