//! Embedded backend over the in-process [`GraphStore`]
//!
//! A transaction holds the store's write lock for its whole life and mutates a
//! private copy; commit swaps the copy in. Write transactions are therefore
//! serialized, and a dropped or rolled-back transaction leaves no trace.

use super::{BackendResult, GraphBackend, GraphTransaction};
use crate::graph::{props, EdgeType, GraphResult, GraphStore, Label, NodeId, PropertyMap, PropertyValue};
use crate::ingest::ShipmentRow;
use crate::schema;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

/// In-process graph backend
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<GraphStore>>,
}

impl MemoryBackend {
    /// Create a backend over a fresh empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed store, for direct reads
    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        let guard = Arc::clone(&self.store).write_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<GraphStore>,
    working: GraphStore,
}

impl MemoryTransaction {
    fn merge_trailer(&mut self, trailer_id: &str) -> GraphResult<NodeId> {
        self.working
            .merge_node(schema::TRAILER, props([("id", trailer_id)]))
    }

    fn link_shipment(&mut self, row: &ShipmentRow) -> GraphResult<()> {
        let trailer = self.merge_trailer(&row.trailer_id)?;
        let sid = self.working.merge_node(
            schema::SID,
            props([("id", row.sid.as_str()), ("ciscoID", row.cisco_id.as_str())]),
        )?;
        let part = self.working.merge_node(
            schema::PART,
            props([
                ("number", PropertyValue::from(row.part_number.as_str())),
                ("quantity", row.quantity.into()),
            ]),
        )?;

        self.working.merge_edge(trailer, sid, schema::HAS_SID)?;
        self.working.merge_edge(sid, trailer, schema::BELONGS_TO)?;
        self.working.merge_edge(sid, part, schema::HAS_PART)?;
        Ok(())
    }

    fn link_cisco_row(&mut self, row: &ShipmentRow) -> GraphResult<()> {
        let trailer = self.merge_trailer(&row.trailer_id)?;
        let cisco = self
            .working
            .merge_node(schema::CISCO, props([("id", row.cisco_id.as_str())]))?;
        self.working.merge_edge(trailer, cisco, schema::HAS_CISCO)?;
        Ok(())
    }

    fn has_schedule(&self, trailer: NodeId) -> bool {
        let schedule = Label::new(schema::SCHEDULE);
        self.working
            .neighbors(trailer, &EdgeType::new(schema::HAS_SCHEDULE))
            .into_iter()
            .filter_map(|id| self.working.get_node(id))
            .any(|n| n.has_label(&schedule))
    }

    /// Targets of `node`'s `edge_type` edges that carry `label`
    fn linked(&self, node: NodeId, edge_type: &EdgeType, label: &Label) -> Vec<NodeId> {
        self.working
            .neighbors(node, edge_type)
            .into_iter()
            .filter(|&id| self.working.get_node(id).is_some_and(|n| n.has_label(label)))
            .collect()
    }
}

fn default_schedule(trailer_id: PropertyValue) -> PropertyMap {
    let mut schedule = PropertyMap::new();
    schedule.insert("TrailerID".to_string(), trailer_id);
    for field in schema::SCHEDULE_TEXT_FIELDS {
        schedule.insert(field.to_string(), "".into());
    }
    schedule.insert("LoadStatus".to_string(), schema::DEFAULT_LOAD_STATUS.into());
    schedule.insert("IsHot".to_string(), false.into());
    schedule
}

#[async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn link_shipments(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        for row in rows {
            self.link_shipment(row)?;
        }
        Ok(())
    }

    async fn link_cisco(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        for row in rows {
            self.link_cisco_row(row)?;
        }
        Ok(())
    }

    async fn backfill_schedules(&mut self) -> BackendResult<u64> {
        let pending: Vec<(NodeId, PropertyValue)> = self
            .working
            .get_nodes_by_label(&Label::new(schema::TRAILER))
            .into_iter()
            .filter(|t| !self.has_schedule(t.id))
            .map(|t| (t.id, t.get_property("id").cloned().unwrap_or(PropertyValue::Null)))
            .collect();

        for (trailer, trailer_id) in &pending {
            let schedule = self
                .working
                .create_node_with_properties(schema::SCHEDULE, default_schedule(trailer_id.clone()));
            self.working
                .create_edge(*trailer, schedule, schema::HAS_SCHEDULE)?;
        }
        Ok(pending.len() as u64)
    }

    async fn materialize_contains_part(&mut self) -> BackendResult<u64> {
        let has_sid = EdgeType::new(schema::HAS_SID);
        let has_part = EdgeType::new(schema::HAS_PART);
        let contains = EdgeType::new(schema::CONTAINS_PART);
        let sid_label = Label::new(schema::SID);
        let part_label = Label::new(schema::PART);

        let mut wanted = BTreeSet::new();
        for trailer in self.working.get_nodes_by_label(&Label::new(schema::TRAILER)) {
            for sid in self.linked(trailer.id, &has_sid, &sid_label) {
                for part in self.linked(sid, &has_part, &part_label) {
                    wanted.insert((trailer.id, part));
                }
            }
        }

        let stale: Vec<_> = self
            .working
            .get_edges_by_type(&contains)
            .into_iter()
            .filter(|e| !wanted.contains(&(e.source, e.target)))
            .map(|e| e.id)
            .collect();
        for edge in &stale {
            self.working.delete_edge(*edge)?;
        }
        if !stale.is_empty() {
            debug!(removed = stale.len(), "pruned stale CONTAINS_PART edges");
        }

        for (trailer, part) in wanted {
            self.working.merge_edge(trailer, part, contains.clone())?;
        }
        Ok(self.working.count_edge_type(&contains) as u64)
    }

    async fn commit(self: Box<Self>) -> BackendResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}
