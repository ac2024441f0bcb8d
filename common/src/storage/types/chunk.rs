use serde::{Deserialize, Serialize};

/// Classification label carried by a converted document item.
///
/// Mirrors the label vocabulary of the document-conversion engine; only
/// `Text` and `Paragraph` count as prose for chunk retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocItemLabel {
    Caption,
    Code,
    Formula,
    ListItem,
    PageFooter,
    PageHeader,
    Paragraph,
    Picture,
    SectionHeader,
    Table,
    Text,
    Title,
}

impl DocItemLabel {
    /// Whether this label marks prose content worth indexing.
    pub fn is_prose(self) -> bool {
        matches!(self, Self::Text | Self::Paragraph)
    }
}

/// A single labeled span of a converted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocItem {
    pub label: DocItemLabel,
    pub text: String,
}

impl DocItem {
    pub fn new(label: DocItemLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Structured representation of a converted source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Originating file path.
    pub source: String,
    pub items: Vec<DocItem>,
}

impl ConvertedDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            items: Vec::new(),
        }
    }
}

/// A bounded span of converted content together with the labels of the
/// items it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub text: String,
    pub labels: Vec<DocItemLabel>,
}

impl DocumentChunk {
    /// A chunk is retained iff at least one source item is prose.
    pub fn has_prose(&self) -> bool {
        self.labels.iter().any(|label| label.is_prose())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating file path of the chunk.
    pub source: String,
}

/// Record shipped to the vector database for one retained chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub document_id: String,
    pub content: String,
    pub mime_type: String,
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    /// Build a record from a run-scoped chunk id and its originating path.
    pub fn new(id: u64, content: impl Into<String>, source: &str) -> Self {
        Self {
            document_id: format!("doc-{id}"),
            content: content.into(),
            mime_type: "text/plain".to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_labels_are_text_and_paragraph() {
        assert!(DocItemLabel::Text.is_prose());
        assert!(DocItemLabel::Paragraph.is_prose());
        assert!(!DocItemLabel::Table.is_prose());
        assert!(!DocItemLabel::Picture.is_prose());
        assert!(!DocItemLabel::SectionHeader.is_prose());
    }

    #[test]
    fn chunk_prose_check_depends_only_on_labels() {
        let prose = DocumentChunk {
            text: "body".into(),
            labels: vec![DocItemLabel::Table, DocItemLabel::Text],
        };
        let non_prose = DocumentChunk {
            text: "body".into(),
            labels: vec![DocItemLabel::Table, DocItemLabel::Picture],
        };
        assert!(prose.has_prose());
        assert!(!non_prose.has_prose());
    }

    #[test]
    fn chunk_record_formats_document_id() {
        let record = ChunkRecord::new(7, "chunk body", "/tmp/a.pdf");
        assert_eq!(record.document_id, "doc-7");
        assert_eq!(record.mime_type, "text/plain");
        assert_eq!(record.metadata.source, "/tmp/a.pdf");
    }

    #[test]
    fn labels_serialize_snake_case() {
        let json = serde_json::to_string(&DocItemLabel::SectionHeader).expect("serialize");
        assert_eq!(json, "\"section_header\"");
    }
}
