//! Directed, typed edges for the embedded property graph

use super::types::{EdgeId, EdgeType, NodeId};

/// A directed edge in the property graph
///
/// Relationships in the shipment graph carry no properties; identity is the
/// `(source, target, edge_type)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,

    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    /// Type of relationship (e.g., "HAS_SID", "CONTAINS_PART")
    pub edge_type: EdgeType,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, edge_type: impl Into<EdgeType>) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: edge_type.into(),
        }
    }

    /// Whether this edge connects `source` to `target` with the given type
    pub fn connects(&self, source: NodeId, target: NodeId, edge_type: &EdgeType) -> bool {
        self.source == source && self.target == target && &self.edge_type == edge_type
    }
}
