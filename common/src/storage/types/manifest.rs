use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Provenance tag for manifests produced from a bucket listing.
pub const SOURCE_BUCKET: &str = "bucket";
/// Provenance tag for manifests produced from a local directory scan.
pub const SOURCE_LOCAL_FILES: &str = "local_files";

/// Per-object record of a successful download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub file_path: String,
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Provenance metadata attached to a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub file_count: usize,
    pub details: Vec<DocumentDetail>,
}

/// Artifact handed from the document provider to the processor.
///
/// Immutable once written; `document_paths` are local filesystem paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentManifest {
    pub document_paths: Vec<String>,
    pub metadata: ManifestMetadata,
}

impl DocumentManifest {
    /// Build a manifest from a completed bucket fetch.
    pub fn from_bucket(bucket: &str, endpoint: &str, details: Vec<DocumentDetail>) -> Self {
        let document_paths = details.iter().map(|d| d.file_path.clone()).collect();
        Self {
            document_paths,
            metadata: ManifestMetadata {
                source: SOURCE_BUCKET.to_string(),
                bucket: Some(bucket.to_string()),
                endpoint: Some(endpoint.to_string()),
                directory: None,
                file_count: details.len(),
                details,
            },
        }
    }

    /// Build a manifest from a local directory scan.
    pub fn from_local_files(directory: &str, details: Vec<DocumentDetail>) -> Self {
        let document_paths = details.iter().map(|d| d.file_path.clone()).collect();
        Self {
            document_paths,
            metadata: ManifestMetadata {
                source: SOURCE_LOCAL_FILES.to_string(),
                bucket: None,
                endpoint: None,
                directory: Some(directory.to_string()),
                file_count: details.len(),
                details,
            },
        }
    }

    /// Write the manifest as pretty JSON to the given path.
    pub async fn write(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Read a manifest back from disk.
    pub async fn read(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_detail(name: &str) -> DocumentDetail {
        DocumentDetail {
            file_path: format!("/tmp/documents/{name}"),
            key: format!("reports/{name}"),
            size: 1024,
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn bucket_manifest_carries_paths_and_provenance() {
        let manifest = DocumentManifest::from_bucket(
            "documents",
            "http://localhost:9000",
            vec![sample_detail("a.pdf"), sample_detail("b.pdf")],
        );

        assert_eq!(manifest.document_paths.len(), 2);
        assert_eq!(manifest.metadata.source, SOURCE_BUCKET);
        assert_eq!(manifest.metadata.bucket.as_deref(), Some("documents"));
        assert_eq!(manifest.metadata.file_count, 2);
        assert_eq!(
            manifest.document_paths.first().map(String::as_str),
            Some("/tmp/documents/a.pdf")
        );
    }

    #[test]
    fn local_manifest_is_tagged_local_files() {
        let manifest = DocumentManifest::from_local_files("/srv/docs", vec![sample_detail("a.pdf")]);
        assert_eq!(manifest.metadata.source, SOURCE_LOCAL_FILES);
        assert_eq!(manifest.metadata.directory.as_deref(), Some("/srv/docs"));
        assert!(manifest.metadata.bucket.is_none());
    }

    #[tokio::test]
    async fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manifest.json");

        let manifest =
            DocumentManifest::from_bucket("documents", "http://localhost:9000", vec![sample_detail("a.pdf")]);
        manifest.write(&path).await.expect("write manifest");

        let read_back = DocumentManifest::read(&path).await.expect("read manifest");
        assert_eq!(read_back, manifest);
    }
}
