//! Text extraction — turns an uploaded resume file into normalized plain text.
//!
//! The extractor is infallible by contract: corrupt files, unsupported
//! extensions, and encoding problems all degrade to an empty string. Callers
//! decide what "no signal" means for them — the batch pipeline fails the
//! document, a reparse keeps the applicant but clears its derived state.

pub mod dates;
pub mod fields;
pub mod llm;
pub mod prompts;

use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::warn;

/// Upper bound on extracted text, roughly the first three pages of a resume.
/// Bounds LLM and embedding cost per document.
pub const MAX_TEXT_CHARS: usize = 12_000;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Extracts normalized text from a resume file, selecting the strategy by
/// file extension (pdf, docx, txt). Returns `""` on any failure.
pub async fn extract_text(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let raw = match ext.as_deref() {
        Some("pdf") => extract_pdf(path).await,
        Some("docx") => extract_docx(path).await,
        Some("txt") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        _ => Err(anyhow!("unrecognized resume format: {}", path.display())),
    };

    match raw {
        Ok(text) => normalize_text(&text),
        Err(e) => {
            warn!("Text extraction failed for {}: {e:#}", path.display());
            String::new()
        }
    }
}

async fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    // pdf-extract is CPU-bound and occasionally slow on scanned documents.
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).context("extracting PDF text")
    })
    .await
    .context("PDF extraction task panicked")?
}

/// A .docx file is a zip container; the document body lives in
/// `word/document.xml`. Paragraph closes become spaces, remaining tags drop.
async fn extract_docx(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    tokio::task::spawn_blocking(move || {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor).context("opening docx archive")?;
        let mut file = archive
            .by_name("word/document.xml")
            .context("docx has no document body")?;
        let mut xml = String::new();
        file.read_to_string(&mut xml).context("reading docx body")?;
        Ok(strip_docx_markup(&xml))
    })
    .await
    .context("DOCX extraction task panicked")?
}

fn strip_docx_markup(xml: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());

    let with_breaks = xml.replace("</w:p>", " ").replace("<w:br/>", " ");
    let text = tag_re.replace_all(&with_breaks, "");
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// Collapses whitespace runs to single spaces, trims, and bounds the result
/// to [`MAX_TEXT_CHARS`] on a char boundary.
fn normalize_text(text: &str) -> String {
    let bounded = truncate_chars(text, MAX_TEXT_CHARS);
    whitespace_re().replace_all(&bounded, " ").trim().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_unrecognized_extension_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.odt");
        std::fs::write(&path, b"some bytes").unwrap();
        assert_eq!(extract_text(&path).await, "");
    }

    #[tokio::test]
    async fn test_missing_file_returns_empty() {
        assert_eq!(extract_text(Path::new("/nonexistent/resume.txt")).await, "");
    }

    #[tokio::test]
    async fn test_txt_is_read_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Jane  Doe\n\nPython   Django\t engineer\n").unwrap();
        assert_eq!(extract_text(&path).await, "Jane Doe Python Django engineer");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"not a real pdf").unwrap();
        assert_eq!(extract_text(&path).await, "");
    }

    #[tokio::test]
    async fn test_corrupt_docx_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert_eq!(extract_text(&path).await, "");
    }

    #[test]
    fn test_strip_docx_markup() {
        let xml = r#"<w:document><w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>Python &amp; Django</w:t></w:r></w:p></w:document>"#;
        let text = normalize_text(&strip_docx_markup(xml));
        assert_eq!(text, "Jane Doe Python & Django");
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        let text = "é".repeat(MAX_TEXT_CHARS + 10);
        let out = normalize_text(&text);
        assert_eq!(out.chars().count(), MAX_TEXT_CHARS);
    }
}
