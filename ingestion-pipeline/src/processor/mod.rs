mod services;

pub use services::{DefaultProcessorServices, ProcessorServices};

use std::{path::Path, sync::Arc};

use serde_json::Value;
use tracing::{info, warn};

use common::{
    error::AppError,
    storage::types::{
        chunk::ChunkRecord,
        metrics::{CallOutcome, ProcessingMetrics},
    },
    utils::config::AppConfig,
};

use crate::vector_store::{CollectionSpec, VectorStore};

/// Fixed token budget handed to the vector service at insertion time.
const CHUNK_SIZE_IN_TOKENS: usize = 512;

/// Target collection parameters for one processor run.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub vector_db_id: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub provider_id: String,
}

impl ProcessorConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            vector_db_id: cfg.vector_db_id.clone(),
            embedding_model: cfg.embedding_model.clone(),
            embedding_dimension: cfg.embedding_dimension,
            provider_id: cfg.provider_id.clone(),
        }
    }

    fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec {
            vector_db_id: self.vector_db_id.clone(),
            embedding_model: self.embedding_model.clone(),
            embedding_dimension: self.embedding_dimension,
            provider_id: self.provider_id.clone(),
        }
    }
}

/// Run-scoped mutable state: the chunk-id counter and the accumulating
/// metrics. Constructed per invocation so repeated runs are independent.
struct RunContext {
    next_chunk_id: u64,
    records: Vec<ChunkRecord>,
    metrics: ProcessingMetrics,
}

impl RunContext {
    fn new(document_count: usize) -> Self {
        Self {
            next_chunk_id: 0,
            records: Vec::new(),
            metrics: ProcessingMetrics::new(document_count),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_chunk_id = self.next_chunk_id.saturating_add(1);
        self.next_chunk_id
    }
}

/// Pipeline stage that converts, chunks, filters, and loads documents into
/// the vector database.
///
/// The contract is best-effort ingestion with a complete failure report:
/// per-document and per-service-call failures degrade the metrics but never
/// raise past this boundary.
pub struct Processor {
    services: Arc<dyn ProcessorServices>,
    vector_store: Arc<dyn VectorStore>,
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(
        services: Arc<dyn ProcessorServices>,
        vector_store: Arc<dyn VectorStore>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            services,
            vector_store,
            config,
        }
    }

    /// Process the manifest (or single document) at `input_path`, load the
    /// retained chunks, and write the metrics report to `metrics_path`.
    ///
    /// Returns the total count of retained chunks regardless of the
    /// registration and insertion outcomes.
    #[tracing::instrument(skip_all, fields(input = %input_path.display()))]
    pub async fn run(&self, input_path: &Path, metrics_path: &Path) -> Result<usize, AppError> {
        let documents = resolve_documents(input_path).await;
        let mut ctx = RunContext::new(documents.len());

        for file_path in &documents {
            info!(file = %file_path, "processing document");
            match self.process_document(file_path, &mut ctx).await {
                Ok(chunk_count) => {
                    ctx.metrics.record_processed(file_path.as_str(), chunk_count);
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(file = %file_path, error = %message, "document processing failed");
                    ctx.metrics.record_failed(file_path.as_str(), message);
                }
            }
        }

        ctx.metrics.total_chunks = ctx.records.len();
        info!(total_chunks = ctx.records.len(), "prepared chunk records");

        let spec = self.config.collection_spec();
        ctx.metrics.vector_db_registration =
            Some(match self.vector_store.register_collection(&spec).await {
                Ok(()) => {
                    info!(collection = %spec.vector_db_id, "vector collection registered");
                    CallOutcome::success()
                }
                Err(err) => {
                    warn!(collection = %spec.vector_db_id, error = %err, "vector collection registration failed");
                    CallOutcome::failure(err.to_string())
                }
            });

        // Insertion runs regardless of the registration outcome.
        ctx.metrics.vector_db_insertion = Some(
            match self
                .vector_store
                .insert(&ctx.records, &self.config.vector_db_id, CHUNK_SIZE_IN_TOKENS)
                .await
            {
                Ok(()) => {
                    info!(
                        collection = %self.config.vector_db_id,
                        count = ctx.records.len(),
                        "chunk records inserted"
                    );
                    CallOutcome::success()
                }
                Err(err) => {
                    warn!(collection = %self.config.vector_db_id, error = %err, "chunk insertion failed");
                    CallOutcome::failure(err.to_string())
                }
            },
        );

        ctx.metrics.write(metrics_path).await?;

        Ok(ctx.records.len())
    }

    /// Convert and chunk one document, appending retained chunk records to
    /// the run context. Returns the count of retained chunks.
    async fn process_document(
        &self,
        file_path: &str,
        ctx: &mut RunContext,
    ) -> Result<usize, AppError> {
        let document = self.services.convert(Path::new(file_path)).await?;
        let chunks = self.services.chunk(&document)?;

        let mut chunk_count = 0usize;
        for chunk in chunks {
            if !chunk.has_prose() {
                continue;
            }
            let id = ctx.next_id();
            ctx.records.push(ChunkRecord::new(id, chunk.text, file_path));
            chunk_count = chunk_count.saturating_add(1);
        }

        Ok(chunk_count)
    }
}

/// Extract the document list from the input artifact.
///
/// A `.json` input is read as a manifest in one of three legacy shapes: a
/// bare list, `{"document_paths": [...]}`, or `{"documents": [...]}`.
/// Unreadable or malformed JSON, and any other shape, fall back to treating
/// the input path itself as a single document.
async fn resolve_documents(input_path: &Path) -> Vec<String> {
    let is_json = input_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        if let Ok(raw) = tokio::fs::read_to_string(input_path).await {
            if let Ok(value) = serde_json::from_str::<Value>(&raw) {
                if let Some(paths) = document_list_from_value(&value) {
                    return paths;
                }
            }
        }
    }

    vec![input_path.to_string_lossy().into_owned()]
}

fn document_list_from_value(value: &Value) -> Option<Vec<String>> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("document_paths")
            .or_else(|| map.get("documents"))?
            .as_array()?,
        _ => return None,
    };

    Some(
        list.iter()
            .filter_map(|entry| entry.as_str().map(str::to_owned))
            .collect(),
    )
}
