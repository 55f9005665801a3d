use fancy_regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use crate::ChatError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Text runs, tabs, breaks and paragraph ends of WordprocessingML
///
/// A self-closing `<w:t/>` carries no text and must not open a run.
static TEXT_LAYER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?(?<!/)>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|</w:p>")
        .expect("docx text pattern is valid")
});

pub(super) fn extract_text(path: &Path) -> Result<String, ChatError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ChatError::Extraction(format!("not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ChatError::Extraction(format!("missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    text_from_document_xml(&xml)
}

/// Flatten `word/document.xml` into plain text, one line per paragraph
pub(super) fn text_from_document_xml(xml: &str) -> Result<String, ChatError> {
    let mut text = String::new();

    for captures in TEXT_LAYER.captures_iter(xml) {
        let captures =
            captures.map_err(|e| ChatError::Extraction(format!("docx scan failed: {}", e)))?;

        if let Some(run) = captures.get(1) {
            text.push_str(&decode_entities(run.as_str()));
            continue;
        }

        let Some(token) = captures.get(0) else {
            continue;
        };
        if token.as_str().starts_with("<w:tab") {
            text.push('\t');
        } else {
            text.push('\n');
        }
    }

    Ok(text)
}

/// Decode the predefined XML entities and numeric character references
pub(super) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];

        let Some(end) = tail.find(';') else {
            decoded.push_str(tail);
            return decoded;
        };

        let entity = &tail[1..end];
        let replacement = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };

        match replacement {
            Some(c) => {
                decoded.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}
