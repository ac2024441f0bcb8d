use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use object_store::ObjectMeta;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use common::{
    error::AppError,
    storage::{
        store::StorageManager,
        types::manifest::{DocumentDetail, DocumentManifest},
    },
    utils::config::AppConfig,
};

/// Settings for one bucket fetch.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub bucket: String,
    pub endpoint: String,
    /// Only keys with this prefix are enumerated; empty means the whole bucket.
    pub file_prefix: String,
    /// Lowercase-insensitive suffix allow-list, e.g. `[".pdf", ".docx"]`.
    pub file_extensions: Vec<String>,
    /// Hard cap on downloads; enumeration stops the moment it is reached.
    pub max_files: usize,
    pub download_dir: PathBuf,
}

impl ProviderConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            bucket: cfg.bucket_name.clone(),
            endpoint: cfg.bucket_endpoint.clone(),
            file_prefix: cfg.file_prefix.clone(),
            file_extensions: cfg.extension_list(),
            max_files: cfg.max_files,
            download_dir: PathBuf::from(&cfg.download_dir),
        }
    }
}

/// Pipeline stage that sources raw documents from the object store.
pub struct DocumentProvider {
    storage: StorageManager,
    config: ProviderConfig,
}

impl DocumentProvider {
    pub fn new(storage: StorageManager, config: ProviderConfig) -> Self {
        Self { storage, config }
    }

    /// Enumerate the bucket, download matching objects, and emit the manifest.
    ///
    /// A failed download is logged and skipped; enumeration continues with the
    /// remaining objects. Listing errors abort the fetch.
    #[tracing::instrument(skip_all, fields(bucket = %self.config.bucket, prefix = %self.config.file_prefix))]
    pub async fn fetch(&self) -> Result<DocumentManifest, AppError> {
        tokio::fs::create_dir_all(&self.config.download_dir).await?;

        info!(
            bucket = %self.config.bucket,
            prefix = %self.config.file_prefix,
            "fetching documents from bucket"
        );

        let mut details: Vec<DocumentDetail> = Vec::new();

        if self.config.max_files > 0 {
            let prefix =
                (!self.config.file_prefix.is_empty()).then_some(self.config.file_prefix.as_str());
            let mut entries = self.storage.list_stream(prefix);

            while let Some(entry) = entries.next().await {
                let meta = entry?;
                let key = meta.location.as_ref();

                if !matches_extension(key, &self.config.file_extensions) {
                    continue;
                }

                match self.download(&meta).await {
                    Ok(detail) => {
                        details.push(detail);
                        if details.len() >= self.config.max_files {
                            info!(max_files = self.config.max_files, "reached max files limit");
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(key = %meta.location, error = %err, "failed to download object");
                    }
                }
            }
        }

        info!(
            file_count = details.len(),
            download_dir = %self.config.download_dir.display(),
            "bucket fetch finished"
        );

        Ok(DocumentManifest::from_bucket(
            &self.config.bucket,
            &self.config.endpoint,
            details,
        ))
    }

    async fn download(&self, meta: &ObjectMeta) -> Result<DocumentDetail, AppError> {
        let key = meta.location.as_ref();
        let file_name = meta.location.filename().ok_or_else(|| {
            AppError::Processing(format!("object key '{key}' has no file name"))
        })?;
        let local_path = self.config.download_dir.join(file_name);

        debug!(key = %key, target = %local_path.display(), "downloading object");
        let bytes = self.storage.get(key).await?;
        tokio::fs::write(&local_path, &bytes).await?;

        Ok(DocumentDetail {
            file_path: local_path.to_string_lossy().into_owned(),
            key: key.to_string(),
            size: u64::try_from(meta.size).unwrap_or(u64::MAX),
            last_modified: meta.last_modified,
        })
    }
}

/// Local-files variant of the provider: scan a directory instead of a bucket.
///
/// Non-recursive, sorted by file name for deterministic output. A missing
/// directory is a configuration error.
pub async fn local_files_manifest(
    directory: &Path,
    extensions: &[String],
) -> Result<DocumentManifest, AppError> {
    if !directory.is_dir() {
        return Err(AppError::Validation(format!(
            "local files directory '{}' does not exist",
            directory.display()
        )));
    }

    let mut details: Vec<DocumentDetail> = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !matches_extension(&file_name, extensions) {
            continue;
        }

        let metadata = entry.metadata().map_err(std::io::Error::from)?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        details.push(DocumentDetail {
            file_path: entry.path().to_string_lossy().into_owned(),
            key: file_name,
            size: metadata.len(),
            last_modified,
        });
    }

    info!(
        file_count = details.len(),
        directory = %directory.display(),
        "scanned local files"
    );

    Ok(DocumentManifest::from_local_files(
        &directory.to_string_lossy(),
        details,
    ))
}

/// Case-insensitive suffix match against the extension allow-list.
fn matches_extension(key: &str, extensions: &[String]) -> bool {
    let lowered = key.to_lowercase();
    extensions
        .iter()
        .any(|ext| lowered.ends_with(&ext.to_lowercase()))
}
