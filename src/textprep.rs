use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

/// Character budget for one generation chunk.
///
/// Greedy paragraph packing keeps chunks at or under this size, except
/// that a single paragraph longer than the budget is kept whole rather
/// than hard-truncated.
pub const MAX_CHUNK_CHARS: usize = 15_000;

#[derive(Error, Debug)]
pub enum TextPrepError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Cannot read file: {0}")]
    Unreadable(String),
}

/// Document formats the extractor knows how to read.
///
/// Uploads also accept legacy .doc and .ppt/.pptx files for storage and
/// streaming, but text extraction is not available for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

fn unreadable(err: impl std::fmt::Display) -> TextPrepError {
    TextPrepError::Unreadable(err.to_string())
}

/// Extracts plain text from an uploaded document.
///
/// Dispatches on the file extension of `original_name` (the name as
/// uploaded, since stored names are randomized) and reads the bytes at
/// `path`.
///
/// ### Errors
///
/// `UnsupportedType` for extensions without an extractor; `Unreadable`
/// for any read or parse failure.
#[instrument(skip(path), fields(original_name = %original_name))]
pub fn extract_text(path: &Path, original_name: &str) -> Result<String, TextPrepError> {
    let ext = original_name.rsplit('.').next().unwrap_or("");
    let kind = DocumentKind::from_extension(ext)
        .ok_or_else(|| TextPrepError::UnsupportedType(ext.to_string()))?;

    debug!("Extracting text from {:?} document", kind);

    match kind {
        DocumentKind::Text => fs::read_to_string(path).map_err(unreadable),
        DocumentKind::Pdf => pdf_extract::extract_text(path).map_err(unreadable),
        DocumentKind::Docx => docx_text(path),
    }
}

/// Pulls the paragraph text out of a DOCX archive's `word/document.xml`.
fn docx_text(path: &Path) -> Result<String, TextPrepError> {
    let file = fs::File::open(path).map_err(unreadable)?;
    let mut archive = zip::ZipArchive::new(file).map_err(unreadable)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(unreadable)?
        .read_to_string(&mut xml)
        .map_err(unreadable)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Text(t)) => {
                out.push_str(&t.unescape().map_err(unreadable)?);
            }
            // Word paragraphs become line breaks in the extracted text
            Ok(quick_xml::events::Event::End(e)) if e.name().as_ref() == b"w:p" => {
                out.push('\n');
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(unreadable(e)),
            _ => {}
        }
    }
    Ok(out)
}

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{B}\u{C}\r]+").expect("static regex"));
static NEWLINE_PADDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\n *").expect("static regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

/// Normalizes whitespace in extracted text.
///
/// Runs of horizontal whitespace collapse to one space, runs of blank
/// lines collapse to a single blank line (so paragraph boundaries are
/// exactly `\n\n`), and the ends are trimmed. Idempotent.
pub fn clean_text(text: &str) -> String {
    let text = HORIZONTAL_WS.replace_all(text, " ");
    let text = NEWLINE_PADDING.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Splits cleaned text into generation-sized chunks.
///
/// Paragraphs (separated by `\n\n`) are packed greedily into chunks of
/// at most `max_chars`; a single paragraph over the budget becomes its
/// own oversized chunk. Joining the returned chunks with `\n\n`
/// reproduces the input exactly.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        if current.is_empty() {
            current.push_str(paragraph);
        } else if current.len() + 2 + paragraph.len() <= max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
