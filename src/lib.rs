//! Trailer Graph
//!
//! Receives shipment manifests (CSV) over HTTP, stages them in the graph
//! engine's import directory, and builds a trailer/shipment knowledge graph
//! from them.
//!
//! # Flow
//!
//! `POST /upload` → [`staging`] → [`ingest::reader`] → [`session`] →
//! [`ingest::pipeline`] (four ordered steps, one transaction) → plain-text report.
//!
//! # Graph model
//!
//! - `(:Trailer {id})-[:HAS_SID]->(:SID {id, ciscoID})-[:BELONGS_TO]->(:Trailer)`
//! - `(:SID)-[:HAS_PART]->(:Part {number, quantity})`
//! - `(:Trailer)-[:HAS_CISCO]->(:Cisco {id})`
//! - `(:Trailer)-[:HAS_SCHEDULE]->(:Schedule)`, backfilled once per trailer
//! - `(:Trailer)-[:CONTAINS_PART]->(:Part)`, derived from SID paths
//!
//! ## Example Usage
//!
//! ```rust
//! use trailer_graph::backend::MemoryBackend;
//! use trailer_graph::ingest::{parse_rows, IngestPipeline};
//! use trailer_graph::session::GraphSession;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! let rows = parse_rows(b"TrailerID,SID,CiscoID,PartNumber,Quantity\nT1,S1,C1,P1,5\n").unwrap();
//!
//! let session = GraphSession::open(&backend, Duration::from_secs(30)).await.unwrap();
//! let report = session.ingest(&IngestPipeline::default(), &rows).await.unwrap();
//! assert_eq!(report.schedules_created, 1);
//! # });
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod ingest;
pub mod schema;
pub mod session;
pub mod staging;

// Re-export main types for convenience
pub use backend::{BackendError, GraphBackend, GraphTransaction, MemoryBackend, Neo4jBackend};
pub use config::{BackendKind, Cli, Neo4jConfig, ServerConfig};
pub use error::{ConfigError, IngestError, IngestResult};
pub use http::{router, AppState, HttpServer};
pub use ingest::{IngestPipeline, IngestReport, PipelineStep, ShipmentRow};
pub use session::GraphSession;
pub use staging::{StagedFileName, Stager};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
