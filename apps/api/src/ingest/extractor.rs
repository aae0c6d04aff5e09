//! Plain-text extraction for PDF and DOCX uploads.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use bytes::Bytes;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ingest::file_validator::FileType;

const DOCX_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    Pdf(String),

    #[error("DOCX parsing failed: {0}")]
    Docx(String),

    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

/// Runs `extract_text` on the blocking pool. A panic inside the PDF library
/// surfaces as `ExtractionError::Aborted` instead of tearing down the worker.
pub async fn extract_text_blocking(
    bytes: Bytes,
    file_type: FileType,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, file_type))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
}

pub fn extract_text(bytes: &[u8], file_type: FileType) -> Result<String, ExtractionError> {
    let text = match file_type {
        FileType::Pdf => {
            let raw = pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
            normalize_pdf_text(&raw)
        }
        FileType::Docx => {
            let xml = read_docx_body(bytes)?;
            normalize_whitespace(&docx_xml_to_text(&xml))
        }
    };

    debug!(
        file_type = file_type.as_str(),
        chars = text.chars().count(),
        "Extracted text"
    );
    Ok(text)
}

fn read_docx_body(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut part = archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCX_BODY_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    Ok(xml)
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

fn re_docx_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("valid regex"))
}

fn re_docx_tab() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"))
}

fn re_xml_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

/// Converts the WordprocessingML body to raw text. Drawings and tables are
/// not rendered specially; their presence is logged.
fn docx_xml_to_text(xml: &str) -> String {
    if xml.contains("<w:drawing") || xml.contains("<w:pict") {
        warn!("DOCX contains images; image content is not extracted");
    }
    if xml.contains("<w:tbl>") || xml.contains("<w:tbl ") {
        warn!("DOCX contains tables; cell text is extracted without table structure");
    }

    let text = re_docx_break().replace_all(xml, "\n");
    let text = re_docx_tab().replace_all(&text, " ");
    let text = re_xml_tag().replace_all(&text, "");
    decode_xml_entities(&text)
}

fn decode_xml_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;", not "<".
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

fn re_horizontal_ws() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\S\n]+").expect("valid regex"))
}

fn re_page_of() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bpage\s+\d+\s+of\s+\d+\b").expect("valid regex"))
}

fn re_page_fraction_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s*/\s*\d+$").expect("valid regex"))
}

/// Short enough that a year ("2016") never qualifies.
fn re_bare_page_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}$").expect("valid regex"))
}

/// Collapses horizontal whitespace runs to one space and drops blank lines.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = re_horizontal_ws().replace_all(text, " ");
    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// PDF normalization: "Page N of M" is removed anywhere, lines holding only
/// "N/M" are dropped, and a bare page number is dropped only when it sits
/// directly against a form-feed page break. Form feeds become line breaks.
pub fn normalize_pdf_text(text: &str) -> String {
    let text = re_page_of().replace_all(text, "");
    let pages: Vec<&str> = text.split('\u{c}').collect();
    let last_page = pages.len() - 1;

    let mut lines: Vec<&str> = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let mut page_lines: Vec<&str> = page
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let is_page_number = |line: &&str| re_bare_page_number().is_match(line);
        if i < last_page && page_lines.last().is_some_and(is_page_number) {
            page_lines.pop();
        }
        if i > 0 && page_lines.first().is_some_and(is_page_number) {
            page_lines.remove(0);
        }
        lines.extend(
            page_lines
                .into_iter()
                .filter(|line| !re_page_fraction_line().is_match(line)),
        );
    }

    normalize_whitespace(&lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("[Content_Types].xml", FileOptions::default())
                .unwrap();
            writer.write_all(b"<Types/>").unwrap();
            writer
                .start_file(DOCX_BODY_PART, FileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let body = r#"<w:document><w:body>
            <w:p><w:r><w:t>Jane   Smith</w:t></w:r></w:p>
            <w:p><w:r><w:t>Experience</w:t><w:tab/><w:t>Acme &amp; Co</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_text(&docx_with_body(body), FileType::Docx).unwrap();
        assert_eq!(text, "Jane Smith\nExperience Acme & Co");
    }

    #[test]
    fn test_docx_entities_decode_once() {
        let text = docx_xml_to_text("<w:t>&amp;lt;tag&amp;gt; &lt;b&gt;</w:t>");
        assert_eq!(text, "&lt;tag&gt; <b>");
    }

    #[test]
    fn test_docx_without_document_part_fails() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer.start_file("other.xml", FileOptions::default()).unwrap();
            writer.write_all(b"<x/>").unwrap();
            writer.finish().unwrap();
        }
        let err = extract_text(&cursor.into_inner(), FileType::Docx).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_docx_garbage_zip_fails() {
        let err = extract_text(b"PK\x03\x04not really a zip", FileType::Docx).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    /// Single-page PDF with one Helvetica text run and a correct xref table.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[test]
    fn test_pdf_text_is_extracted() {
        let text = extract_text(&minimal_pdf("Jane Doe Staff Engineer"), FileType::Pdf).unwrap();
        let compact: String = text.split_whitespace().collect();
        assert!(compact.contains("JaneDoeStaffEngineer"), "{text:?}");
    }

    #[tokio::test]
    async fn test_pdf_garbage_is_an_error() {
        // Parser panics surface as `Aborted`, parse failures as `Pdf`.
        let err = extract_text_blocking(Bytes::from_static(b"%PDF-1.7 broken"), FileType::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Pdf(_) | ExtractionError::Aborted(_)
        ));
    }

    #[tokio::test]
    async fn test_blocking_extraction_reports_errors() {
        let err = extract_text_blocking(Bytes::from_static(b"PK\x03\x04junk"), FileType::Docx)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_pdf_normalization_strips_pagination() {
        let raw = "John Doe\n\nSummary   of\tthings\nPage 1 of 2\n  1  \u{c}Experience\n2/2\nEnded 06/2019";
        assert_eq!(
            normalize_pdf_text(raw),
            "John Doe\nSummary of things\nExperience\nEnded 06/2019"
        );
    }

    #[test]
    fn test_pdf_normalization_keeps_year_lines() {
        let out = normalize_pdf_text("B.S. Computer Science\nState University\n2016\nSKILLS");
        assert_eq!(out, "B.S. Computer Science\nState University\n2016\nSKILLS");
    }

    #[test]
    fn test_pdf_normalization_keeps_numbers_away_from_page_breaks() {
        assert_eq!(
            normalize_pdf_text("Team size\n12\nEnd\u{c}3\nEducation\n2016\u{c}2014"),
            "Team size\n12\nEnd\nEducation\n2016\n2014"
        );
    }

    #[test]
    fn test_pdf_normalization_inline_page_marker() {
        assert_eq!(normalize_pdf_text("Skills PAGE 3 OF 4 Rust"), "Skills Rust");
    }

    #[test]
    fn test_normalize_whitespace_trims() {
        assert_eq!(normalize_whitespace("  \n a \t b \n\n"), "a b");
    }
}
