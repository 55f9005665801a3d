// Text extraction from source documents
// Dispatches on file extension; failures are logged and yield empty text


mod docx;
mod pdf;

use std::path::Path;
use tracing::{debug, error, warn};

use crate::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detect the kind from the file extension, ignoring case
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    /// Extract text, surfacing failures to the caller
    #[inline]
    pub fn extract(self, path: &Path) -> Result<String, ChatError> {
        match self {
            DocumentKind::Pdf => pdf::extract_text(path),
            DocumentKind::Docx => docx::extract_text(path),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::Docx => write!(f, "DOCX"),
        }
    }
}

/// Extract the raw text of a PDF or DOCX file
///
/// Returns an empty string for unsupported extensions and for any read or
/// parse failure; an empty result means "skip this file".
#[inline]
pub fn extract_text(path: &Path) -> String {
    let Some(kind) = DocumentKind::from_path(path) else {
        warn!(
            "Unsupported file type: {}",
            path.extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(none)".to_string())
        );
        return String::new();
    };

    match kind.extract(path) {
        Ok(text) => {
            debug!(
                "Extracted {} characters from {} {}",
                text.chars().count(),
                kind,
                path.display()
            );
            text
        }
        Err(e) => {
            error!("{} extraction error for {}: {}", kind, path.display(), e);
            String::new()
        }
    }
}
