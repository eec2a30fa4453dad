//! The four-step ingestion pipeline
//!
//! Steps run strictly in order inside one caller-supplied transaction:
//!
//! 1. Trailer/SID/Part linkage (row batches)
//! 2. Trailer/Cisco linkage (row batches)
//! 3. Schedule backfill for every Trailer without one
//! 4. `CONTAINS_PART` materialization from Trailer→SID→Part paths
//!
//! Step 3 must see the Trailers added in step 1, and step 4 the `HAS_SID` and
//! `HAS_PART` edges. The pipeline never commits; see [`crate::session`].

use super::record::ShipmentRow;
use crate::backend::{BackendError, GraphTransaction};
use crate::error::{IngestError, IngestResult};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Default rows per UNWIND batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One ingestion step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    LinkShipments,
    LinkCisco,
    BackfillSchedules,
    MaterializeContainsPart,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 4] = [
        PipelineStep::LinkShipments,
        PipelineStep::LinkCisco,
        PipelineStep::BackfillSchedules,
        PipelineStep::MaterializeContainsPart,
    ];

    /// 1-based position in the pipeline
    pub fn number(&self) -> usize {
        match self {
            PipelineStep::LinkShipments => 1,
            PipelineStep::LinkCisco => 2,
            PipelineStep::BackfillSchedules => 3,
            PipelineStep::MaterializeContainsPart => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStep::LinkShipments => "link trailers, SIDs and parts",
            PipelineStep::LinkCisco => "link trailers and Cisco devices",
            PipelineStep::BackfillSchedules => "backfill schedules",
            PipelineStep::MaterializeContainsPart => "materialize CONTAINS_PART edges",
        }
    }

    fn fail(self, err: BackendError) -> IngestError {
        IngestError::GraphWrite {
            step: self,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one committed ingestion did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub rows: usize,
    /// Batches sent per row-driven step
    pub batches: usize,
    pub schedules_created: u64,
    /// `CONTAINS_PART` edges present after materialization
    pub contains_part_edges: u64,
}

impl IngestReport {
    /// Plain-text success message for the uploader
    pub fn success_message(&self, file_name: &str, stored_at: &Path) -> String {
        format!(
            "File {} uploaded successfully to {} and processed: {} rows, {} new schedules, {} CONTAINS_PART edges",
            file_name,
            stored_at.display(),
            self.rows,
            self.schedules_created,
            self.contains_part_edges
        )
    }
}

/// Ordered, batched ingestion over a single transaction
#[derive(Debug, Clone, Copy)]
pub struct IngestPipeline {
    batch_size: usize,
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl IngestPipeline {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run all four steps. On error the transaction is left for the caller to roll back.
    pub async fn run(
        &self,
        txn: &mut dyn GraphTransaction,
        rows: &[ShipmentRow],
    ) -> IngestResult<IngestReport> {
        let mut batches = 0;

        for (i, chunk) in rows.chunks(self.batch_size).enumerate() {
            debug!(step = 1, batch = i, rows = chunk.len(), "linking shipments");
            txn.link_shipments(chunk)
                .await
                .map_err(|e| PipelineStep::LinkShipments.fail(e))?;
            batches += 1;
        }

        for (i, chunk) in rows.chunks(self.batch_size).enumerate() {
            debug!(step = 2, batch = i, rows = chunk.len(), "linking cisco devices");
            txn.link_cisco(chunk)
                .await
                .map_err(|e| PipelineStep::LinkCisco.fail(e))?;
        }

        let schedules_created = txn
            .backfill_schedules()
            .await
            .map_err(|e| PipelineStep::BackfillSchedules.fail(e))?;
        debug!(step = 3, schedules_created, "schedules backfilled");

        let contains_part_edges = txn
            .materialize_contains_part()
            .await
            .map_err(|e| PipelineStep::MaterializeContainsPart.fail(e))?;
        debug!(step = 4, contains_part_edges, "CONTAINS_PART materialized");

        let report = IngestReport {
            rows: rows.len(),
            batches,
            schedules_created,
            contains_part_edges,
        };
        info!(
            rows = report.rows,
            batches = report.batches,
            schedules_created = report.schedules_created,
            "ingestion steps complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records calls instead of writing anything
    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<PipelineStep>,
    }

    impl Recorder {
        fn check(&self, step: PipelineStep, call: String) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(call);
            if self.fail_on == Some(step) {
                return Err(BackendError::Store("injected".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl GraphTransaction for Recorder {
        async fn link_shipments(&mut self, rows: &[ShipmentRow]) -> Result<(), BackendError> {
            self.check(PipelineStep::LinkShipments, format!("shipments:{}", rows.len()))
        }

        async fn link_cisco(&mut self, rows: &[ShipmentRow]) -> Result<(), BackendError> {
            self.check(PipelineStep::LinkCisco, format!("cisco:{}", rows.len()))
        }

        async fn backfill_schedules(&mut self) -> Result<u64, BackendError> {
            self.check(PipelineStep::BackfillSchedules, "schedules".into())?;
            Ok(2)
        }

        async fn materialize_contains_part(&mut self) -> Result<u64, BackendError> {
            self.check(PipelineStep::MaterializeContainsPart, "contains".into())?;
            Ok(7)
        }

        async fn commit(self: Box<Self>) -> Result<(), BackendError> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn rows(n: usize) -> Vec<ShipmentRow> {
        (0..n)
            .map(|i| ShipmentRow::new(format!("T{}", i % 3), format!("S{}", i), "C1", "P1", 1))
            .collect()
    }

    #[tokio::test]
    async fn test_steps_run_in_order_with_batches() {
        let mut txn = Recorder::default();
        let calls = Arc::clone(&txn.calls);

        let report = IngestPipeline::new(100).run(&mut txn, &rows(250)).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "shipments:100", "shipments:100", "shipments:50",
                "cisco:100", "cisco:100", "cisco:50",
                "schedules", "contains",
            ]
        );
        assert_eq!(
            report,
            IngestReport { rows: 250, batches: 3, schedules_created: 2, contains_part_edges: 7 }
        );
    }

    #[tokio::test]
    async fn test_empty_file_still_backfills_and_materializes() {
        let mut txn = Recorder::default();
        let calls = Arc::clone(&txn.calls);

        let report = IngestPipeline::default().run(&mut txn, &[]).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["schedules", "contains"]);
        assert_eq!(report.batches, 0);
    }

    #[tokio::test]
    async fn test_failure_stops_pipeline_and_names_step() {
        let mut txn = Recorder {
            fail_on: Some(PipelineStep::BackfillSchedules),
            ..Recorder::default()
        };
        let calls = Arc::clone(&txn.calls);

        let err = IngestPipeline::new(10).run(&mut txn, &rows(5)).await.unwrap_err();

        match err {
            IngestError::GraphWrite { step, .. } => assert_eq!(step, PipelineStep::BackfillSchedules),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!calls.lock().unwrap().contains(&"contains".to_string()));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        assert_eq!(IngestPipeline::new(0).batch_size(), 1);
    }

    #[test]
    fn test_step_numbering() {
        let numbers: Vec<usize> = PipelineStep::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_success_message_names_file_and_path() {
        let report = IngestReport { rows: 1, batches: 1, schedules_created: 1, contains_part_edges: 1 };
        let msg = report.success_message("load.csv", Path::new("/srv/import/load.csv"));
        assert!(msg.starts_with("File load.csv uploaded successfully to /srv/import/load.csv"));
    }
}
