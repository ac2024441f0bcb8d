use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectMeta, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Storage manager wrapping the configured object-store backend.
///
/// The remote backend speaks the S3 API against a configurable endpoint
/// (MinIO-compatible); the local and memory backends exist for development
/// and tests and expose the same listing/retrieval surface.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
}

impl StorageManager {
    /// Create a new StorageManager with the specified configuration.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let store = create_storage_backend(cfg).await?;
        tracing::debug!(backend = ?backend_kind, "initialized storage backend");

        Ok(Self {
            store,
            backend_kind,
        })
    }

    /// Create a StorageManager with a custom storage backend.
    ///
    /// Useful for testing scenarios where you want to inject a specific
    /// backend, typically an in-memory one.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
        }
    }

    /// Get the storage backend kind.
    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Stream object metadata below the specified prefix.
    ///
    /// The underlying client paginates the listing; consuming the stream
    /// lazily means enumeration can be abandoned mid-page without fetching
    /// the remaining pages.
    pub fn list_stream(
        &self,
        prefix: Option<&str>,
    ) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        let prefix_path = prefix.map(ObjPath::from);
        self.store.list(prefix_path.as_ref())
    }

    /// List all objects below the specified prefix, fully buffered.
    pub async fn list(
        &self,
        prefix: Option<&str>,
    ) -> object_store::Result<Vec<ObjectMeta>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Retrieve the full contents of an object, buffered in memory.
    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Store bytes at the specified location.
    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    /// Check if an object exists at the specified location.
    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(cfg: &AppConfig) -> object_store::Result<DynStore> {
    match cfg.storage {
        StorageKind::Remote => {
            let store = AmazonS3Builder::new()
                .with_bucket_name(&cfg.bucket_name)
                .with_endpoint(&cfg.bucket_endpoint)
                .with_region(&cfg.bucket_region)
                .with_access_key_id(&cfg.bucket_access_key)
                .with_secret_access_key(&cfg.bucket_secret_key)
                .with_allow_http(true)
                .build()?;
            Ok(Arc::new(store))
        }
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base)?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            let store = InMemory::new();
            Ok(Arc::new(store))
        }
    }
}

/// Resolve the absolute base directory used for local storage from config.
///
/// If `data_dir` is relative, it is resolved against the current working directory.
pub fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    if cfg.data_dir.starts_with('/') {
        PathBuf::from(&cfg.data_dir)
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cfg.data_dir)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Create a test configuration with memory storage.
    pub fn test_config_memory() -> AppConfig {
        AppConfig {
            data_dir: "/tmp/unused".into(), // Ignored for memory storage
            storage: StorageKind::Memory,
            ..test_defaults()
        }
    }

    /// Create a test configuration rooted at the given local directory.
    pub fn test_config_local(root: &str) -> AppConfig {
        AppConfig {
            data_dir: root.into(),
            storage: StorageKind::Local,
            ..test_defaults()
        }
    }

    fn test_defaults() -> AppConfig {
        AppConfig {
            bucket_name: "test".into(),
            bucket_endpoint: "http://localhost:9000".into(),
            bucket_region: "us-east-1".into(),
            bucket_access_key: "test".into(),
            bucket_secret_key: "test".into(),
            file_prefix: String::new(),
            file_extensions: ".pdf".into(),
            max_files: 100,
            download_dir: "/tmp/documents".into(),
            vector_db_url: "http://localhost:8321".into(),
            vector_db_api_key: None,
            embedding_model: "all-MiniLM-L6-v2".into(),
            embedding_dimension: 384,
            provider_id: "pgvector".into(),
            vector_db_id: "test".into(),
            data_dir: "./data".into(),
            storage: StorageKind::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{test_config_local, test_config_memory};
    use super::*;
    use bytes::Bytes;
    use futures::StreamExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_storage_manager_memory_basic_operations() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let location = "test/data/file.txt";
        let data = b"test data for storage manager";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert!(storage.exists(location).await.expect("exists check"));
        assert!(!storage
            .exists("test/data/missing.txt")
            .await
            .expect("exists check for missing"));
    }

    #[tokio::test]
    async fn test_storage_manager_local_basic_operations() {
        let base = format!("/tmp/ingest_storage_test_{}", Uuid::new_v4());
        let cfg = test_config_local(&base);
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let location = "test/data/file.txt";
        let data = b"test data for local storage";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert!(storage.exists(location).await.expect("exists check"));

        // Clean up
        let _ = tokio::fs::remove_dir_all(&base).await;
    }

    #[tokio::test]
    async fn test_storage_manager_list_operations() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let files = vec![
            ("dir1/file1.txt", b"content1"),
            ("dir1/file2.txt", b"content2"),
            ("dir2/file3.txt", b"content3"),
        ];

        for (location, data) in &files {
            storage
                .put(location, Bytes::from(data.to_vec()))
                .await
                .expect("put");
        }

        let all_files = storage.list(None).await.expect("list all");
        assert_eq!(all_files.len(), 3);

        let dir1_files = storage.list(Some("dir1/")).await.expect("list dir1");
        assert_eq!(dir1_files.len(), 2);
        assert!(dir1_files
            .iter()
            .any(|meta| meta.location.as_ref().contains("file1.txt")));

        let empty_files = storage
            .list(Some("nonexistent/"))
            .await
            .expect("list nonexistent");
        assert_eq!(empty_files.len(), 0);
    }

    #[tokio::test]
    async fn test_storage_manager_list_stream_partial_consumption() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        for idx in 0..5 {
            storage
                .put(&format!("docs/file{idx}.pdf"), Bytes::from_static(b"pdf"))
                .await
                .expect("put");
        }

        // Abandoning the stream after one item must not error or hang.
        let mut stream = storage.list_stream(Some("docs/"));
        let first = stream.next().await.expect("one item").expect("meta");
        assert!(first.location.as_ref().starts_with("docs/"));
        drop(stream);
    }

    #[tokio::test]
    async fn test_storage_manager_with_custom_backend() {
        let custom_store = InMemory::new();
        let storage = StorageManager::with_backend(Arc::new(custom_store), StorageKind::Memory);

        let location = "custom/test.txt";
        let data = b"custom backend test";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert_eq!(*storage.backend_kind(), StorageKind::Memory);
    }
}
