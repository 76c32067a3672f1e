//! `---` delimited YAML headers on markdown files.
//!
//! ```text
//! ---
//! title: Sine Wave
//! tags: [trig]
//! ---
//!
//! Free-text body in markdown.
//! ```

use crate::error::{Result, SnapError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const DELIMITER: &str = "---";

/// Splits a document into its raw header and body.
///
/// Returns `None` when the document does not open with a header block or the
/// block is never closed.
pub fn split(document: &str) -> Option<(&str, &str)> {
    let text = document.strip_prefix('\u{feff}').unwrap_or(document);
    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != DELIMITER {
        return None;
    }

    let rest = &text[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Parses a document's header into `T` and returns it with the trimmed body.
///
/// An empty header parses as an empty mapping, so a file holding only `---`
/// lines is valid when every field of `T` has a default.
pub fn parse<T: DeserializeOwned>(path: &Path, document: &str) -> Result<(T, String)> {
    let (header, body) = split(document).ok_or_else(|| SnapError::MalformedHeader {
        path: path.to_path_buf(),
        reason: "missing '---' header block".to_string(),
    })?;

    let header = if header.trim().is_empty() { "{}" } else { header };
    let meta = serde_yaml::from_str(header).map_err(|e| SnapError::MalformedHeader {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok((meta, body.trim().to_string()))
}

/// Renders a header and body back into a document.
pub fn compose<T: Serialize>(meta: &T, body: &str) -> Result<String> {
    let header = serde_yaml::to_string(meta)?;
    let mut document = String::with_capacity(header.len() + body.len() + 16);
    document.push_str(DELIMITER);
    document.push('\n');
    document.push_str(&header);
    if !header.ends_with('\n') {
        document.push('\n');
    }
    document.push_str(DELIMITER);
    document.push_str("\n\n");
    let body = body.trim();
    if !body.is_empty() {
        document.push_str(body);
        document.push('\n');
    }
    Ok(document)
}
