//! CSV manifest ingestion
//!
//! Parsing turns the staged file into validated [`ShipmentRow`]s; the
//! [`IngestPipeline`] then issues the four graph mutation steps.

pub mod pipeline;
pub mod reader;
pub mod record;

pub use pipeline::{IngestPipeline, IngestReport, PipelineStep, DEFAULT_BATCH_SIZE};
pub use reader::{parse_rows, REQUIRED_COLUMNS};
pub use record::ShipmentRow;
