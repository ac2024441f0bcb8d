use std::path::Path;

use async_trait::async_trait;

use common::{
    error::AppError,
    storage::types::chunk::{ConvertedDocument, DocumentChunk},
};

use crate::utils::{
    chunking::{chunk_document, ChunkerConfig},
    text_extraction::{extract_document, ConverterOptions},
};

/// Conversion and chunking seams of the processor.
///
/// The default implementation delegates to the bundled converter and text
/// splitter; tests substitute mocks to drive the orchestration directly.
#[async_trait]
pub trait ProcessorServices: Send + Sync {
    /// Convert a source document into its structured representation.
    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, AppError>;

    /// Split a converted document into a finite sequence of labeled chunks.
    fn chunk(&self, document: &ConvertedDocument) -> Result<Vec<DocumentChunk>, AppError>;
}

#[derive(Default)]
pub struct DefaultProcessorServices {
    converter_options: ConverterOptions,
    chunker_config: ChunkerConfig,
}

impl DefaultProcessorServices {
    pub fn new(converter_options: ConverterOptions, chunker_config: ChunkerConfig) -> Self {
        Self {
            converter_options,
            chunker_config,
        }
    }
}

#[async_trait]
impl ProcessorServices for DefaultProcessorServices {
    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, AppError> {
        extract_document(path, &self.converter_options).await
    }

    fn chunk(&self, document: &ConvertedDocument) -> Result<Vec<DocumentChunk>, AppError> {
        chunk_document(document, &self.chunker_config)
    }
}
