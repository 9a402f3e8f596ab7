//! File → [`DocumentPage`] loading.
//!
//! - `.pdf`: text via `pdf-extract`, one page per form-feed section (no tables)
//! - `.json`: `[{"text": "...", "tables": [[["cell", null]]]}]`
//! - anything else: UTF-8 text, one page per form-feed section

use std::path::Path;

use tracing::{debug, instrument};

use super::document::DocumentPage;
use super::error::IngestError;

const PAGE_BREAK: char = '\x0c';

#[instrument(skip_all, fields(path = %path.display()))]
pub async fn load_document(path: &Path) -> Result<Vec<DocumentPage>, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let pages = match extension.as_deref() {
        Some("pdf") => load_pdf(path).await?,
        Some("json") => parse_page_file(path, &read_to_string(path).await?)?,
        _ => split_pages(&read_to_string(path).await?),
    };

    debug!(pages = pages.len(), "Document loaded");
    Ok(pages)
}

async fn read_to_string(path: &Path) -> Result<String, IngestError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn load_pdf(path: &Path) -> Result<Vec<DocumentPage>, IngestError> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| IngestError::TaskFailed {
            reason: e.to_string(),
        })?
        .map_err(|e| IngestError::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(split_pages(&text))
}

pub(crate) fn split_pages(text: &str) -> Vec<DocumentPage> {
    text.split(PAGE_BREAK)
        .filter(|page| !page.trim().is_empty())
        .map(DocumentPage::new)
        .collect()
}

pub(crate) fn parse_page_file(path: &Path, contents: &str) -> Result<Vec<DocumentPage>, IngestError> {
    serde_json::from_str(contents).map_err(|e| IngestError::InvalidPageFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
