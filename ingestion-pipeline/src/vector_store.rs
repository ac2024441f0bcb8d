use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use common::{error::AppError, storage::types::chunk::ChunkRecord, utils::config::AppConfig};

/// Attributes of the target vector collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSpec {
    pub vector_db_id: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub provider_id: String,
}

/// Remote vector-database operations used by the processor.
///
/// Both calls are best-effort from the caller's perspective: failures are
/// recorded in the run metrics, never retried.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Register the target collection. Idempotent on the service side.
    async fn register_collection(&self, spec: &CollectionSpec) -> Result<(), AppError>;

    /// Insert all chunk records into the named collection in one call.
    async fn insert(
        &self,
        documents: &[ChunkRecord],
        vector_db_id: &str,
        chunk_size_in_tokens: usize,
    ) -> Result<(), AppError>;
}

const REGISTER_PATH: &str = "v1/vector-dbs";
const INSERT_PATH: &str = "v1/tool-runtime/rag-tool/insert";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// HTTP client for the vector-database service.
#[derive(Debug)]
pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct InsertRequest<'a> {
    documents: &'a [ChunkRecord],
    vector_db_id: &'a str,
    chunk_size_in_tokens: usize,
}

impl HttpVectorStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| AppError::Validation(format!("invalid vector service URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn from_app_config(cfg: &AppConfig) -> Result<Self, AppError> {
        Self::new(&cfg.vector_db_url, cfg.vector_db_api_key.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Validation(format!("invalid vector service path '{path}': {e}")))
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), AppError> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "posting to vector service");

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorStore(format!("{status}: {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn register_collection(&self, spec: &CollectionSpec) -> Result<(), AppError> {
        self.post_json(REGISTER_PATH, spec).await
    }

    async fn insert(
        &self,
        documents: &[ChunkRecord],
        vector_db_id: &str,
        chunk_size_in_tokens: usize,
    ) -> Result<(), AppError> {
        let request = InsertRequest {
            documents,
            vector_db_id,
            chunk_size_in_tokens,
        };
        self.post_json(INSERT_PATH, &request).await
    }
}
