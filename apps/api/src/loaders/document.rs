//! Resume document loader.
//!
//! Format is picked from the filename extension first, then from magic bytes
//! (`%PDF` / `PK\x03\x04`), falling back to PDF. Legacy `.doc` files are rejected
//! outright; there is no conversion path.

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::loaders::LoaderError;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn detect(bytes: &[u8], filename: &str) -> Result<Self, LoaderError> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".docx") {
            return Ok(DocumentKind::Docx);
        }
        if lower.ends_with(".doc") {
            return Err(LoaderError::Unsupported(
                "Old .doc format is not supported. Please convert to .docx or PDF.".to_string(),
            ));
        }
        if lower.ends_with(".pdf") {
            return Ok(DocumentKind::Pdf);
        }

        if bytes.starts_with(PDF_MAGIC) {
            Ok(DocumentKind::Pdf)
        } else if bytes.starts_with(ZIP_MAGIC) {
            Ok(DocumentKind::Docx)
        } else {
            Ok(DocumentKind::Pdf)
        }
    }
}

/// Extracts raw (uncleaned) text from a resume file's bytes.
pub fn load_document(bytes: &[u8], filename: &str) -> Result<String, LoaderError> {
    match DocumentKind::detect(bytes, filename)? {
        DocumentKind::Pdf => extract_pdf_text(bytes),
        DocumentKind::Docx => extract_docx_text(bytes),
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, LoaderError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(LoaderError::Pdf(e.to_string())),
        Err(_) => Err(LoaderError::Pdf("malformed PDF".to_string())),
    }
}

/// Body paragraphs first, then table cells, one per line, blanks dropped.
fn extract_docx_text(bytes: &[u8]) -> Result<String, LoaderError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| LoaderError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| LoaderError::Docx(format!("{DOCX_BODY}: {e}")))?
        .read_to_string(&mut xml)?;

    let DocxText { paragraphs, cells } = parse_document_xml(&xml)?;

    Ok(paragraphs
        .into_iter()
        .chain(cells)
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[derive(Debug, Default)]
struct DocxText {
    paragraphs: Vec<String>,
    cells: Vec<String>,
}

fn parse_document_xml(xml: &str) -> Result<DocxText, LoaderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = DocxText::default();
    let mut table_depth = 0usize;
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut cell_paragraphs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"tc" => cell_paragraphs.clear(),
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| LoaderError::Docx(e.to_string()))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = std::mem::take(&mut paragraph);
                    if table_depth > 0 {
                        cell_paragraphs.push(text);
                    } else {
                        out.paragraphs.push(text);
                    }
                }
                b"tc" => out.cells.push(cell_paragraphs.join("\n")),
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoaderError::Docx(e.to_string())),
            _ => {}
        }
    }

    Ok(out)
}

/// Builds a minimal `.docx` archive around the given `word/document.xml` body.
#[cfg(test)]
pub(crate) fn docx_fixture(body_xml: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", FileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file(DOCX_BODY, FileOptions::default()).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// A `<w:p>` with a single run.
#[cfg(test)]
pub(crate) fn docx_paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
}
