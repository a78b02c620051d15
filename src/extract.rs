//! Plain-text extraction from PDF and DOCX documents.
//!
//! A [`Document`] is raw bytes plus a declared [`DocumentKind`], built either
//! from a filesystem path or from an uploaded byte buffer. The kind comes
//! from the file extension (`.pdf` / `.docx`, case-insensitive); anything
//! else is [`ExtractError::UnsupportedFormat`].
//!
//! - **PDF**: per-page text joined with newlines, trimmed.
//! - **DOCX**: the body of `word/document.xml`. Paragraph ends and `<w:br/>`
//!   become newlines and `<w:tab/>` becomes a tab, so words from adjacent
//!   paragraphs never fuse into a single token.
//!
//! No OCR and no layout: scanned PDFs without a text layer yield an empty
//! string.

use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum decompressed bytes to read from `word/document.xml` (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
const DOCX_BODY_ENTRY: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{0}': use PDF or DOCX")]
    UnsupportedFormat(String),

    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{name} is {size} bytes, over the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detect the kind from a file name or path.
    pub fn from_name(name: &str) -> Result<Self, ExtractError> {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") {
            Ok(DocumentKind::Docx)
        } else {
            Err(ExtractError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// An uploaded or on-disk document, consumed once by extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name (file name for paths, the upload name otherwise).
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    /// Wrap an in-memory upload.
    pub fn from_upload(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let name = name.into();
        let kind = DocumentKind::from_name(&name)?;
        Ok(Self { name, kind, bytes })
    }

    /// Read a document from disk.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        Extractor::unbounded().load(path)
    }
}

/// Extraction with a per-document size limit.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    max_bytes: u64,
}

impl Extractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn unbounded() -> Self {
        Self { max_bytes: u64::MAX }
    }

    /// Check extension, existence, and size, then read the file.
    pub fn load(&self, path: &Path) -> Result<Document, ExtractError> {
        let display = path.to_string_lossy().to_string();
        let kind = DocumentKind::from_name(&display)?;

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractError::NotFound(path.to_path_buf()))
            }
            Err(e) => {
                return Err(ExtractError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        if !metadata.is_file() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(display);
        self.check_size(&name, metadata.len())?;

        let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Document { name, kind, bytes })
    }

    /// Extract plain text from a loaded document.
    pub fn extract(&self, doc: &Document) -> Result<String, ExtractError> {
        self.check_size(&doc.name, doc.bytes.len() as u64)?;
        extract_text(doc)
    }

    /// Load and extract in one step.
    pub fn extract_path(&self, path: &Path) -> Result<String, ExtractError> {
        let doc = self.load(path)?;
        extract_text(&doc)
    }

    fn check_size(&self, name: &str, size: u64) -> Result<(), ExtractError> {
        if size > self.max_bytes {
            return Err(ExtractError::TooLarge {
                name: name.to_string(),
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Extract plain text from a document, dispatching on its kind.
pub fn extract_text(doc: &Document) -> Result<String, ExtractError> {
    let text = match doc.kind {
        DocumentKind::Pdf => extract_pdf(&doc.bytes)?,
        DocumentKind::Docx => extract_docx(&doc.bytes)?,
    };
    Ok(text.trim().to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages: Vec<&str> = pages.iter().map(|page| page.trim()).collect();
    Ok(pages.join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive.by_name(DOCX_BODY_ENTRY).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            ExtractError::Docx(format!("{} not found", DOCX_BODY_ENTRY))
        }
        other => ExtractError::Docx(other.to_string()),
    })?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(format!(
            "{} exceeds size limit ({} bytes)",
            DOCX_BODY_ENTRY, MAX_XML_ENTRY_BYTES
        )));
    }

    docx_body_text(&xml)
}

fn docx_body_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
