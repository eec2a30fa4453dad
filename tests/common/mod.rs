//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trailer_graph::backend::{BackendError, BackendResult, GraphBackend, GraphTransaction, MemoryBackend};
use trailer_graph::graph::GraphStore;
use trailer_graph::ingest::{parse_rows, IngestPipeline, IngestReport, PipelineStep, ShipmentRow};
use trailer_graph::schema;
use trailer_graph::{GraphSession, IngestResult};

pub const HEADER: &str = "TrailerID,SID,CiscoID,PartNumber,Quantity\n";

/// Prefix `rows` with the manifest header
pub fn manifest(rows: &[&str]) -> String {
    let mut csv = HEADER.to_string();
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}

/// Parse and ingest one manifest in its own session
pub async fn ingest(backend: &dyn GraphBackend, csv: &str) -> IngestResult<IngestReport> {
    let rows = parse_rows(csv.as_bytes())?;
    GraphSession::open(backend, Duration::from_secs(30))
        .await?
        .ingest(&IngestPipeline::default(), &rows)
        .await
}

/// Node counts per label and edge counts per relationship type
pub fn census(store: &GraphStore) -> BTreeMap<&'static str, usize> {
    use trailer_graph::graph::{EdgeType, Label};

    let mut counts = BTreeMap::new();
    for label in [schema::TRAILER, schema::SID, schema::PART, schema::CISCO, schema::SCHEDULE] {
        counts.insert(label, store.count_label(&Label::new(label)));
    }
    for rel in [
        schema::HAS_SID,
        schema::BELONGS_TO,
        schema::HAS_PART,
        schema::HAS_CISCO,
        schema::HAS_SCHEDULE,
        schema::CONTAINS_PART,
    ] {
        counts.insert(rel, store.count_edge_type(&EdgeType::new(rel)));
    }
    counts
}

/// Wraps a backend and fails one pipeline step in every transaction
pub struct FaultyBackend {
    pub inner: MemoryBackend,
    pub fail_on: PipelineStep,
}

struct FaultyTransaction {
    inner: Box<dyn GraphTransaction>,
    fail_on: PipelineStep,
}

impl FaultyTransaction {
    fn check(&self, step: PipelineStep) -> BackendResult<()> {
        if self.fail_on == step {
            return Err(BackendError::Store(format!("simulated fault in step {}", step.number())));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphTransaction for FaultyTransaction {
    async fn link_shipments(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        self.inner.link_shipments(rows).await?;
        self.check(PipelineStep::LinkShipments)
    }

    async fn link_cisco(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        self.inner.link_cisco(rows).await?;
        self.check(PipelineStep::LinkCisco)
    }

    async fn backfill_schedules(&mut self) -> BackendResult<u64> {
        let created = self.inner.backfill_schedules().await?;
        self.check(PipelineStep::BackfillSchedules)?;
        Ok(created)
    }

    async fn materialize_contains_part(&mut self) -> BackendResult<u64> {
        let edges = self.inner.materialize_contains_part().await?;
        self.check(PipelineStep::MaterializeContainsPart)?;
        Ok(edges)
    }

    async fn commit(self: Box<Self>) -> BackendResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> BackendResult<()> {
        self.inner.rollback().await
    }
}

#[async_trait]
impl GraphBackend for FaultyBackend {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin_write().await?,
            fail_on: self.fail_on,
        }))
    }

    async fn ping(&self) -> BackendResult<()> {
        self.inner.ping().await
    }

    async fn close(&self) -> BackendResult<()> {
        self.inner.close().await
    }
}

/// Counts how often a session is opened
#[derive(Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    pub sessions: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_write().await
    }

    async fn ping(&self) -> BackendResult<()> {
        self.inner.ping().await
    }

    async fn close(&self) -> BackendResult<()> {
        self.inner.close().await
    }
}
