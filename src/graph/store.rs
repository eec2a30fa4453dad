//! In-memory graph storage implementation
//!
//! Backs the embedded backend. Nodes are never deleted, so they live in a
//! dense arena; edges can be pruned (stale derived edges) and live in a map.
//! Both carry MERGE indices so upserts are O(1).

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, EdgeType, Label, NodeId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Cannot merge {0} on an empty key")]
    EmptyMergeKey(Label),

    #[error("Cannot merge {label} with null value for key '{key}'")]
    NullMergeKey { label: Label, key: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// - nodes: dense arena, `NodeId(n)` lives at index `n - 1`
/// - edges: EdgeId -> Edge
/// - outgoing / incoming: adjacency lists
/// - label_index: Label -> nodes
/// - merge_index: (Label, key properties) -> node
/// - edge_index: (source, target, type) -> edge
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: HashMap<EdgeId, Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    label_index: HashMap<Label, Vec<NodeId>>,
    edge_type_index: HashMap<EdgeType, HashSet<EdgeId>>,
    merge_index: HashMap<(Label, PropertyMap), NodeId>,
    edge_index: HashMap<(NodeId, NodeId, EdgeType), EdgeId>,
    next_edge_id: u64,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with a label and properties, bypassing merge semantics
    pub fn create_node_with_properties(&mut self, label: impl Into<Label>, properties: PropertyMap) -> NodeId {
        let node_id = NodeId::new(self.nodes.len() as u64 + 1);
        let label = label.into();

        self.label_index
            .entry(label.clone())
            .or_default()
            .push(node_id);

        self.nodes.push(Node::new_with_properties(node_id, label, properties));
        node_id
    }

    /// Find the node carrying `label` whose merge key equals `key`
    pub fn find_node(&self, label: &Label, key: &PropertyMap) -> Option<NodeId> {
        self.merge_index
            .get(&(label.clone(), key.clone()))
            .copied()
    }

    /// MERGE a node: return the node with `label` and exactly this key, creating it if absent.
    ///
    /// The key properties become the new node's only properties.
    pub fn merge_node(&mut self, label: impl Into<Label>, key: PropertyMap) -> GraphResult<NodeId> {
        let label = label.into();
        if key.is_empty() {
            return Err(GraphError::EmptyMergeKey(label));
        }
        if let Some((k, _)) = key.iter().find(|(_, v)| v.is_null()) {
            return Err(GraphError::NullMergeKey {
                label,
                key: k.clone(),
            });
        }

        if let Some(&existing) = self.merge_index.get(&(label.clone(), key.clone())) {
            return Ok(existing);
        }

        let node_id = self.create_node_with_properties(label.clone(), key.clone());
        self.merge_index.insert((label, key), node_id);
        Ok(node_id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        let idx = id.as_u64().checked_sub(1)? as usize;
        self.nodes.get(idx)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Create an edge between two nodes
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        self.next_edge_id += 1;
        let edge_id = EdgeId::new(self.next_edge_id);
        let edge_type = edge_type.into();

        self.outgoing.entry(source).or_default().push(edge_id);
        self.incoming.entry(target).or_default().push(edge_id);
        self.edge_type_index
            .entry(edge_type.clone())
            .or_default()
            .insert(edge_id);
        // First edge of a given type between a pair wins the merge slot
        self.edge_index
            .entry((source, target, edge_type.clone()))
            .or_insert(edge_id);

        self.edges
            .insert(edge_id, Edge::new(edge_id, source, target, edge_type));
        Ok(edge_id)
    }

    /// MERGE a relationship: at most one edge of `edge_type` from `source` to `target`
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        let edge_type = edge_type.into();
        if let Some(&existing) = self.edge_index.get(&(source, target, edge_type.clone())) {
            return Ok(existing);
        }
        self.create_edge(source, target, edge_type)
    }

    pub fn has_edge_between(&self, source: NodeId, target: NodeId, edge_type: &EdgeType) -> bool {
        self.edge_index
            .contains_key(&(source, target, edge_type.clone()))
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Delete an edge
    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.edges.remove(&id).ok_or(GraphError::EdgeNotFound(id))?;

        if let Some(set) = self.edge_type_index.get_mut(&edge.edge_type) {
            set.remove(&id);
        }
        if let Some(adj) = self.outgoing.get_mut(&edge.source) {
            adj.retain(|&eid| eid != id);
        }
        if let Some(adj) = self.incoming.get_mut(&edge.target) {
            adj.retain(|&eid| eid != id);
        }

        let slot = (edge.source, edge.target, edge.edge_type.clone());
        if self.edge_index.get(&slot) == Some(&id) {
            self.edge_index.remove(&slot);
            // Hand the merge slot to a surviving parallel edge, if any
            let survivor = self
                .outgoing
                .get(&edge.source)
                .into_iter()
                .flatten()
                .filter_map(|eid| self.edges.get(eid))
                .find(|e| e.connects(edge.source, edge.target, &edge.edge_type))
                .map(|e| e.id);
            if let Some(survivor) = survivor {
                self.edge_index.insert(slot, survivor);
            }
        }

        Ok(edge)
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Targets of `node_id`'s outgoing edges of one type
    pub fn neighbors(&self, node_id: NodeId, edge_type: &EdgeType) -> Vec<NodeId> {
        self.get_outgoing_edges(node_id)
            .into_iter()
            .filter(|e| &e.edge_type == edge_type)
            .map(|e| e.target)
            .collect()
    }

    /// Get all nodes with a specific label, in creation order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    /// Nodes with `label` whose properties contain every entry of `filter`
    pub fn find_nodes(&self, label: &Label, filter: &PropertyMap) -> Vec<&Node> {
        self.get_nodes_by_label(label)
            .into_iter()
            .filter(|n| n.matches_key(filter))
            .collect()
    }

    /// Get all edges of a specific type, ordered by id
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .edge_type_index
            .get(edge_type)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default();
        edges.sort_by_key(|e| e.id);
        edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn count_label(&self, label: &Label) -> usize {
        self.label_index.get(label).map_or(0, Vec::len)
    }

    pub fn count_edge_type(&self, edge_type: &EdgeType) -> usize {
        self.edge_type_index.get(edge_type).map_or(0, HashSet::len)
    }
}
