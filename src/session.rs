//! Graph session management
//!
//! One upload gets exactly one write transaction. All four pipeline steps run
//! inside it, and it is released on every exit path:
//! - success: commit
//! - step failure or deadline: explicit rollback
//! - future dropped (client gone, request timeout): the transaction is dropped,
//!   which discards it in every backend

use crate::backend::{BackendError, GraphBackend, GraphTransaction};
use crate::error::{IngestError, IngestResult};
use crate::ingest::{IngestPipeline, IngestReport, ShipmentRow};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{info, warn};

/// Time a rollback gets on top of the session deadline
pub const ROLLBACK_GRACE: Duration = Duration::from_secs(10);

/// A write session bounded by a deadline
pub struct GraphSession {
    txn: Box<dyn GraphTransaction>,
    deadline: Instant,
    backend: &'static str,
}

fn session_error(stage: &'static str, err: BackendError) -> IngestError {
    IngestError::Session {
        stage,
        message: err.to_string(),
    }
}

async fn within<T>(
    deadline: Instant,
    stage: &'static str,
    fut: impl Future<Output = IngestResult<T>>,
) -> IngestResult<T> {
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(IngestError::Timeout { stage }),
    }
}

impl GraphSession {
    /// Open a write transaction; `limit` bounds the whole session, open included
    pub async fn open(backend: &dyn GraphBackend, limit: Duration) -> IngestResult<Self> {
        let deadline = Instant::now() + limit;
        let txn = within(deadline, "opening graph session", async {
            backend
                .begin_write()
                .await
                .map_err(|e| session_error("opening graph session", e))
        })
        .await?;

        Ok(Self {
            txn,
            deadline,
            backend: backend.name(),
        })
    }

    /// Run the pipeline and commit, or roll back on any failure
    pub async fn ingest(
        mut self,
        pipeline: &IngestPipeline,
        rows: &[ShipmentRow],
    ) -> IngestResult<IngestReport> {
        let outcome = within(self.deadline, "ingestion", pipeline.run(self.txn.as_mut(), rows)).await;

        match outcome {
            Ok(report) => {
                let txn = self.txn;
                within(self.deadline, "commit", async {
                    txn.commit().await.map_err(|e| session_error("commit", e))
                })
                .await?;
                info!(backend = self.backend, rows = report.rows, "ingestion committed");
                Ok(report)
            }
            Err(err) => {
                warn!(backend = self.backend, error = %err, "ingestion aborted, rolling back");
                // The deadline may already be spent; rollback still gets a short window
                let limit = self.deadline.saturating_duration_since(Instant::now()) + ROLLBACK_GRACE;
                match timeout(limit, self.txn.rollback()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(rollback_err)) => {
                        warn!(backend = self.backend, error = %rollback_err, "rollback failed");
                    }
                    Err(_) => {
                        warn!(backend = self.backend, "rollback timed out, dropping transaction");
                    }
                }
                Err(err)
            }
        }
    }
}
