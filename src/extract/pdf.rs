use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::ChatError;

/// Text of every page in order, each page terminated by a newline
pub(super) fn extract_text(path: &Path) -> Result<String, ChatError> {
    let bytes = std::fs::read(path)?;
    let pages = page_texts(&bytes)?;
    Ok(join_pages(&pages))
}

pub(super) fn page_texts(bytes: &[u8]) -> Result<Vec<String>, ChatError> {
    // pdf-extract panics on some malformed inputs
    panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ChatError::Extraction("PDF parser panicked".to_string()))?
    .map_err(|e| ChatError::Extraction(format!("PDF parse error: {}", e)))
}

pub(super) fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
        text.push('\n');
    }
    text
}
