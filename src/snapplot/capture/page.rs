//! The self-contained HTML page written next to each capture.

use crate::error::Result;
use crate::highlight::{self, Language};
use crate::model::CaptureRecord;
use crate::site::templates::GENERATOR;
use serde::Serialize;

const SNAPSHOT_TEMPLATE: &str = include_str!("snapshot.html");

#[derive(Debug, Serialize)]
struct SnapshotPage<'a> {
    title: &'a str,
    filename: &'a str,
    function_name: &'a str,
    date: String,
    author: Option<&'a str>,
    notes: Option<&'a str>,
    plot_filename: Option<String>,
    code_html: String,
    language: &'static str,
    generator: &'static str,
}

/// Default page title when the capture was not given one.
pub fn default_title(function_name: &str) -> String {
    format!("Snapshot: {}", function_name)
}

/// Renders the documentation page of one capture.
///
/// `code_ext` selects the highlighter. The image is referenced by file name only,
/// since the page lives in the same directory.
pub fn render_page(record: &CaptureRecord, code_ext: &str) -> Result<String> {
    let language = Language::from_extension(code_ext);
    let plot_filename = record
        .image
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    let page = SnapshotPage {
        title: &record.title,
        filename: &record.file_name,
        function_name: &record.function_name,
        date: record.token.display_time(),
        author: record.author.as_deref().filter(|a| !a.is_empty()),
        notes: record.notes.as_deref().filter(|n| !n.is_empty()),
        plot_filename,
        code_html: highlight::highlight(&record.source, language),
        language: language.name(),
        generator: GENERATOR,
    };
    Ok(stencil::render(SNAPSHOT_TEMPLATE, &page)?)
}
