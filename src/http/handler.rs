//! HTTP handler for manifest uploads

use crate::backend::GraphBackend;
use crate::config::ServerConfig;
use crate::error::{IngestError, IngestResult};
use crate::ingest::{parse_rows, IngestPipeline};
use crate::session::GraphSession;
use crate::staging::{StagedFileName, Stager};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Form field carrying the CSV
pub const FILE_FIELD: &str = "file";

/// Shared handler state
pub struct AppState {
    pub backend: Arc<dyn GraphBackend>,
    pub stager: Stager,
    pub pipeline: IngestPipeline,
    pub graph_timeout: Duration,
}

impl AppState {
    pub fn new(backend: Arc<dyn GraphBackend>, config: &ServerConfig) -> Self {
        Self {
            backend,
            stager: Stager::new(&config.staging_dir),
            pipeline: IngestPipeline::new(config.batch_size),
            graph_timeout: config.graph_timeout(),
        }
    }
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Pull the `file` field out of the form; other fields are skipped
async fn read_file_field(multipart: &mut Multipart) -> IngestResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IngestError::Validation(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| IngestError::Validation("form field 'file' has no filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| IngestError::Validation(format!("could not read uploaded file: {}", e)))?;
        return Ok(Upload { file_name, bytes });
    }
    Err(IngestError::Validation("missing form field 'file'".into()))
}

async fn process_upload(state: &AppState, multipart: &mut Multipart) -> IngestResult<String> {
    // Received
    let upload = read_file_field(multipart).await?;
    let name = StagedFileName::parse(&upload.file_name)?;
    info!(file = %name, bytes = upload.bytes.len(), "upload received");

    // Staged
    let stored_at = state.stager.stage(&name, &upload.bytes).await?;
    let rows = parse_rows(&state.stager.read(&name).await?)?;

    // Ingesting, then Committed or Aborted
    let session = GraphSession::open(state.backend.as_ref(), state.graph_timeout).await?;
    let report = session.ingest(&state.pipeline, &rows).await?;

    Ok(report.success_message(name.as_str(), &stored_at))
}

/// `POST /upload`
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, IngestError> {
    let mut multipart = multipart.map_err(|e| IngestError::Validation(e.body_text()))?;

    process_upload(&state, &mut multipart).await.inspect_err(|err| {
        warn!(
            status = err.status().as_u16(),
            rolled_back = err.touched_graph(),
            error = %err,
            "upload failed"
        );
    })
}
