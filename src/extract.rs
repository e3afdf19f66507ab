//! Per-page PDF text extraction.
//!
//! Uploads arrive as bytes; this module returns one [`PageText`] per page
//! (1-based) so chunks can be attributed to the page they came from.
//! Blank pages are kept in the output and skipped later by the chunker.

use docintel_core::models::PageText;
use thiserror::Error;

/// The `%PDF-` header may be preceded by junk, but only within this window.
const HEADER_SEARCH_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not a PDF (missing %PDF- header)")]
    NotPdf,
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("PDF contains no extractable text")]
    NoText,
}

/// True if a `%PDF-` header appears near the start of `bytes`.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_BYTES)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Extract the text of every page.
///
/// Fails if the bytes are not a PDF, cannot be parsed, or no page has any
/// non-whitespace text.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::NotPdf);
    }

    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let pages = pages_from_texts(texts);
    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(ExtractError::NoText);
    }
    Ok(pages)
}

/// Number raw page texts from 1 and normalize line endings.
pub fn pages_from_texts(texts: Vec<String>) -> Vec<PageText> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText::new(i as i64 + 1, text.replace("\r\n", "\n")))
        .collect()
}
