use std::path::Path;

use lopdf::{Document, Object};
use tracing::warn;

use common::{
    error::AppError,
    storage::types::chunk::{ConvertedDocument, DocItem, DocItemLabel},
};

/// Format-specific options passed through to the converter.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Emit picture items for images embedded in page-image formats.
    pub extract_images: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
        }
    }
}

/// Convert a source file into its structured item representation.
///
/// Dispatches on the guessed mime type; unsupported types are a
/// per-document error the processor records and moves past.
pub async fn extract_document(
    path: &Path,
    options: &ConverterOptions,
) -> Result<ConvertedDocument, AppError> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let source = path.to_string_lossy().into_owned();

    match mime.essence_str() {
        "text/plain" | "application/octet-stream" => {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(plain_text_document(source, &content))
        }
        "text/markdown" => {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(markdown_document(source, &content))
        }
        "application/pdf" => pdf_document(path, source, options).await,
        other => Err(AppError::NotFound(other.to_string())),
    }
}

/// Plain text: blank-line-separated blocks, all labeled as text.
fn plain_text_document(source: String, content: &str) -> ConvertedDocument {
    let mut document = ConvertedDocument::new(source);
    for block in text_blocks(content) {
        document
            .items
            .push(DocItem::new(DocItemLabel::Text, block));
    }
    document
}

/// Markdown: headings, fenced code, and list runs become their own items;
/// everything else is paragraph blocks.
fn markdown_document(source: String, content: &str) -> ConvertedDocument {
    let mut document = ConvertedDocument::new(source);
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code: Option<Vec<&str>> = None;
    let mut list: Vec<&str> = Vec::new();

    let flush_paragraph = |buf: &mut Vec<&str>, items: &mut Vec<DocItem>| {
        if !buf.is_empty() {
            items.push(DocItem::new(DocItemLabel::Paragraph, buf.join("\n")));
            buf.clear();
        }
    };
    let flush_list = |buf: &mut Vec<&str>, items: &mut Vec<DocItem>| {
        if !buf.is_empty() {
            items.push(DocItem::new(DocItemLabel::ListItem, buf.join("\n")));
            buf.clear();
        }
    };

    for line in content.lines() {
        if let Some(buf) = code.as_mut() {
            if line.trim_start().starts_with("```") {
                document
                    .items
                    .push(DocItem::new(DocItemLabel::Code, buf.join("\n")));
                code = None;
            } else {
                buf.push(line);
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            flush_paragraph(&mut paragraph, &mut document.items);
            flush_list(&mut list, &mut document.items);
            code = Some(Vec::new());
        } else if trimmed.starts_with('#') {
            flush_paragraph(&mut paragraph, &mut document.items);
            flush_list(&mut list, &mut document.items);
            document.items.push(DocItem::new(
                DocItemLabel::SectionHeader,
                trimmed.trim_start_matches('#').trim(),
            ));
        } else if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
            flush_paragraph(&mut paragraph, &mut document.items);
            list.push(trimmed);
        } else if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut document.items);
            flush_list(&mut list, &mut document.items);
        } else {
            flush_list(&mut list, &mut document.items);
            paragraph.push(trimmed);
        }
    }

    if let Some(buf) = code {
        document
            .items
            .push(DocItem::new(DocItemLabel::Code, buf.join("\n")));
    }
    flush_paragraph(&mut paragraph, &mut document.items);
    flush_list(&mut list, &mut document.items);

    document
}

/// PDF: run `pdf-extract` off the async executor, block-split the text
/// layer, and optionally scan for embedded page images with `lopdf`.
async fn pdf_document(
    path: &Path,
    source: String,
    options: &ConverterOptions,
) -> Result<ConvertedDocument, AppError> {
    let pdf_bytes = tokio::fs::read(path).await?;

    let text = {
        let bytes = pdf_bytes.clone();
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map(|s| s.trim().to_string())
        })
        .await?
        .map_err(|err| AppError::Processing(format!("Failed to extract text from PDF: {err}")))?
    };

    let mut document = ConvertedDocument::new(source);
    for block in text_blocks(&text) {
        document
            .items
            .push(DocItem::new(DocItemLabel::Text, block));
    }

    if options.extract_images {
        // Best effort; a malformed image dictionary must not fail the document.
        match count_embedded_images(pdf_bytes).await {
            Ok(count) => {
                for _ in 0..count {
                    document
                        .items
                        .push(DocItem::new(DocItemLabel::Picture, String::new()));
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to scan PDF for embedded images");
            }
        }
    }

    Ok(document)
}

/// Parses the PDF structure off the async executor and counts image streams.
async fn count_embedded_images(pdf_bytes: Vec<u8>) -> Result<usize, AppError> {
    let count = tokio::task::spawn_blocking(move || -> Result<usize, AppError> {
        let document = Document::load_mem(&pdf_bytes)
            .map_err(|err| AppError::Processing(format!("Failed to parse PDF: {err}")))?;

        let mut count = 0usize;
        for object in document.objects.values() {
            if let Object::Stream(stream) = object {
                let is_image = stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false);
                if is_image {
                    count = count.saturating_add(1);
                }
            }
        }
        Ok(count)
    })
    .await??;

    Ok(count)
}

/// Split raw text into blank-line-separated blocks, dropping empties.
fn text_blocks(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_splits_into_text_blocks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "first block\nstill first\n\nsecond block\n")
            .await
            .expect("write");

        let document = extract_document(&path, &ConverterOptions::default())
            .await
            .expect("convert");

        assert_eq!(document.items.len(), 2);
        assert!(document
            .items
            .iter()
            .all(|item| item.label == DocItemLabel::Text));
        assert_eq!(
            document.items.first().map(|i| i.text.as_str()),
            Some("first block\nstill first")
        );
    }

    #[tokio::test]
    async fn markdown_labels_structure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.md");
        let content = "# Title\n\nA paragraph\nof prose.\n\n- one\n- two\n\n```\nlet x = 1;\n```\n";
        tokio::fs::write(&path, content).await.expect("write");

        let document = extract_document(&path, &ConverterOptions::default())
            .await
            .expect("convert");

        let labels: Vec<DocItemLabel> = document.items.iter().map(|i| i.label).collect();
        assert_eq!(
            labels,
            vec![
                DocItemLabel::SectionHeader,
                DocItemLabel::Paragraph,
                DocItemLabel::ListItem,
                DocItemLabel::Code,
            ]
        );
        assert_eq!(
            document.items.get(1).map(|i| i.text.as_str()),
            Some("A paragraph\nof prose.")
        );
    }

    #[tokio::test]
    async fn unsupported_mime_type_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("photo.png");
        tokio::fs::write(&path, b"not really a png").await.expect("write");

        let err = extract_document(&path, &ConverterOptions::default())
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = extract_document(Path::new("/no/such/file.txt"), &ConverterOptions::default())
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn text_blocks_drop_empty_segments() {
        assert_eq!(
            text_blocks("a\n\n\n\nb\n\n  \n\nc"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(text_blocks("").is_empty());
    }
}
