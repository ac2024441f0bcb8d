use text_splitter::{ChunkCapacity, ChunkConfig, TextSplitter};

use common::{
    error::AppError,
    storage::types::chunk::{ConvertedDocument, DocItemLabel, DocumentChunk},
};

/// Character budgets for chunk assembly.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub min_chars: usize,
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chars: 500,
            max_chars: 2_000,
            overlap: 0,
        }
    }
}

/// Labels that always form a chunk of their own instead of packing into a
/// prose window.
fn is_standalone(label: DocItemLabel) -> bool {
    matches!(
        label,
        DocItemLabel::Table | DocItemLabel::Picture | DocItemLabel::Code | DocItemLabel::Formula
    )
}

#[derive(Default)]
struct Window {
    text: String,
    labels: Vec<DocItemLabel>,
}

impl Window {
    fn push(&mut self, label: DocItemLabel, text: &str) {
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(text);
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    fn flush(&mut self, chunks: &mut Vec<DocumentChunk>) {
        if self.labels.is_empty() {
            return;
        }
        chunks.push(DocumentChunk {
            text: std::mem::take(&mut self.text),
            labels: std::mem::take(&mut self.labels),
        });
    }
}

/// Split a converted document into labeled chunks.
///
/// Consecutive non-standalone items pack into windows under the character
/// budget; oversized items are split with the text splitter. Each chunk
/// carries the label set of the items that produced it.
pub fn chunk_document(
    document: &ConvertedDocument,
    config: &ChunkerConfig,
) -> Result<Vec<DocumentChunk>, AppError> {
    validate(config)?;

    let mut chunks: Vec<DocumentChunk> = Vec::new();
    let mut window = Window::default();

    for item in &document.items {
        if is_standalone(item.label) {
            window.flush(&mut chunks);
            chunks.push(DocumentChunk {
                text: item.text.clone(),
                labels: vec![item.label],
            });
            continue;
        }

        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }

        if text.len() > config.max_chars {
            window.flush(&mut chunks);
            for piece in split_oversized(text, config)? {
                chunks.push(DocumentChunk {
                    text: piece,
                    labels: vec![item.label],
                });
            }
            continue;
        }

        let projected = window
            .text
            .len()
            .saturating_add(text.len())
            .saturating_add(2);
        if !window.text.is_empty() && projected > config.max_chars {
            window.flush(&mut chunks);
        }
        window.push(item.label, text);
    }

    window.flush(&mut chunks);
    Ok(chunks)
}

fn split_oversized(text: &str, config: &ChunkerConfig) -> Result<Vec<String>, AppError> {
    let capacity = ChunkCapacity::new(config.min_chars)
        .with_max(config.max_chars)
        .map_err(|e| AppError::Validation(format!("invalid chunk bounds: {e}")))?;
    let chunk_config = ChunkConfig::new(capacity)
        .with_overlap(config.overlap)
        .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?;
    let splitter = TextSplitter::new(chunk_config);

    Ok(splitter.chunks(text).map(str::to_owned).collect())
}

fn validate(config: &ChunkerConfig) -> Result<(), AppError> {
    if config.min_chars == 0 || config.max_chars == 0 || config.min_chars > config.max_chars {
        return Err(AppError::Validation(
            "invalid chunk bounds; ensure 0 < min <= max".into(),
        ));
    }

    if config.overlap >= config.min_chars {
        return Err(AppError::Validation(format!(
            "chunk min_chars must be greater than the configured overlap of {}",
            config.overlap
        )));
    }

    Ok(())
}
