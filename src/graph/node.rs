//! Node implementation for the embedded property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};

/// A node in the property graph
///
/// Every node in the shipment graph carries exactly one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    pub label: Label,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        Node {
            id,
            label: label.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Create a new node with a label and properties
    pub fn new_with_properties(id: NodeId, label: impl Into<Label>, properties: PropertyMap) -> Self {
        Node {
            id,
            label: label.into(),
            properties,
        }
    }

    pub fn has_label(&self, label: &Label) -> bool {
        &self.label == label
    }

    /// Set a property value, returning the previous one
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// True when every `(key, value)` in `key` is present on this node with an equal value
    pub fn matches_key(&self, key: &PropertyMap) -> bool {
        key.iter()
            .all(|(k, v)| self.properties.get(k) == Some(v))
    }
}
