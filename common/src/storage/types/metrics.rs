use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Per-document success entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub file: String,
    pub chunks: usize,
}

/// Per-document failure entry, carrying the converter/chunker message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub file: String,
    pub error: String,
}

/// Outcome of a remote service call as reported in the metrics file.
///
/// Serializes either as the bare string `"success"` or as
/// `{"status": "failed", "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallOutcome {
    Status(String),
    Failure { status: String, error: String },
}

impl CallOutcome {
    pub fn success() -> Self {
        Self::Status("success".to_string())
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            status: "failed".to_string(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Status(status) if status == "success")
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status) => write!(f, "{status}"),
            Self::Failure { status, error } => write!(f, "{status}: {error}"),
        }
    }
}

/// Accumulated report of one processor run.
///
/// Written once when the run finishes; never partially flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub document_count: usize,
    pub processed_documents: Vec<ProcessedDocument>,
    pub failed_documents: Vec<FailedDocument>,
    pub total_chunks: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_db_registration: Option<CallOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_db_insertion: Option<CallOutcome>,
}

impl ProcessingMetrics {
    pub fn new(document_count: usize) -> Self {
        Self {
            document_count,
            processed_documents: Vec::new(),
            failed_documents: Vec::new(),
            total_chunks: 0,
            vector_db_registration: None,
            vector_db_insertion: None,
        }
    }

    pub fn record_processed(&mut self, file: impl Into<String>, chunks: usize) {
        self.processed_documents.push(ProcessedDocument {
            file: file.into(),
            chunks,
        });
    }

    pub fn record_failed(&mut self, file: impl Into<String>, error: impl Into<String>) {
        self.failed_documents.push(FailedDocument {
            file: file.into(),
            error: error.into(),
        });
    }

    /// Write the report as pretty JSON to the given path.
    pub async fn write(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Read a report back from disk.
    pub async fn read(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
