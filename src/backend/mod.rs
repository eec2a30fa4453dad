//! Graph store backends
//!
//! [`GraphBackend`] is the process-lifetime handle; [`GraphTransaction`] is one
//! write transaction holding the four ingestion mutations. Implemented by:
//! - `Neo4jBackend`: Neo4j over Bolt, parameterized Cypher
//! - `MemoryBackend`: the embedded [`crate::graph::GraphStore`], for local runs and tests

pub mod memory;
pub mod neo4j;

use crate::config::{BackendKind, ServerConfig};
use crate::graph::GraphError;
use crate::ingest::ShipmentRow;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryBackend;
pub use neo4j::Neo4jBackend;

/// Errors raised by a backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Graph store error: {0}")]
    Graph(#[from] GraphError),

    #[error("Unexpected result: {0}")]
    Decode(String),

    #[error("{0}")]
    Store(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A single write transaction. Nothing it does is visible until [`commit`](GraphTransaction::commit).
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait GraphTransaction: Send {
    /// MERGE Trailer, SID and Part per row; link `HAS_SID`, `BELONGS_TO` and `HAS_PART`
    async fn link_shipments(&mut self, rows: &[ShipmentRow]) -> BackendResult<()>;

    /// MERGE Trailer and Cisco per row; link `HAS_CISCO`
    async fn link_cisco(&mut self, rows: &[ShipmentRow]) -> BackendResult<()>;

    /// Create a default Schedule for every Trailer without one; returns how many were created
    async fn backfill_schedules(&mut self) -> BackendResult<u64>;

    /// Make `CONTAINS_PART` match the Trailer→SID→Part paths exactly; returns the edge count
    async fn materialize_contains_part(&mut self) -> BackendResult<u64>;

    async fn commit(self: Box<Self>) -> BackendResult<()>;

    async fn rollback(self: Box<Self>) -> BackendResult<()>;
}

/// Process-lifetime connection to a graph store
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Open a write transaction
    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>>;

    /// Verify the store answers; used as the startup connectivity check
    async fn ping(&self) -> BackendResult<()>;

    /// Release the connection pool
    async fn close(&self) -> BackendResult<()>;
}

/// Build the backend selected in `config`
pub async fn connect(config: &ServerConfig) -> BackendResult<Arc<dyn GraphBackend>> {
    match config.backend {
        BackendKind::Neo4j => Ok(Arc::new(Neo4jBackend::connect(&config.neo4j).await?)),
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}
