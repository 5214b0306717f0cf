/**
Plain text extraction from uploaded documents. `.txt`, `.odt`, `.docx` and `.pdf` are read in
process, `.doc` goes through the external `antiword` tool. A `|` in the extracted text becomes a tab.
*/
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(String),
    #[error("Could not extract the text of {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Txt,
    Odt,
    Docx,
    Pdf,
    Doc,
}

impl DocumentFormat {
    /// Format of `path`, guessed from its extension.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(Self::Txt),
            "odt" => Ok(Self::Odt),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            "doc" => Ok(Self::Doc),
            _ => Err(IngestError::UnsupportedFormat(extension)),
        }
    }
}

/// Extracts the plain text of a document.
pub trait DocumentIngestor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

/// Reads documents from the local file system.
#[derive(Debug, Clone)]
pub struct FileIngestor {
    antiword: PathBuf,
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self::new("antiword")
    }
}

impl FileIngestor {
    /// `antiword` is the program used for `.doc` files.
    pub fn new(antiword: impl Into<PathBuf>) -> Self {
        FileIngestor {
            antiword: antiword.into(),
        }
    }

    fn extract_doc(&self, path: &Path) -> Result<String, IngestError> {
        let extraction_error = |reason: String| IngestError::Extraction {
            path: path.to_path_buf(),
            reason,
        };
        let output = Command::new(&self.antiword)
            .args(["-w", "0"])
            .arg(path)
            .output()
            .map_err(|e| extraction_error(format!("{}: {}", self.antiword.display(), e)))?;
        if !output.status.success() {
            return Err(extraction_error(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DocumentIngestor for FileIngestor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let format = DocumentFormat::from_path(path)?;
        let extraction_error = |reason: String| IngestError::Extraction {
            path: path.to_path_buf(),
            reason,
        };
        let text = match format {
            DocumentFormat::Doc => self.extract_doc(path)?,
            DocumentFormat::Txt => String::from_utf8(std::fs::read(path)?)
                .map_err(|e| extraction_error(e.to_string()))?,
            DocumentFormat::Odt => odt_text(&std::fs::read(path)?).map_err(extraction_error)?,
            DocumentFormat::Docx => {
                let docx = docx_rs::read_docx(&std::fs::read(path)?)
                    .map_err(|e| extraction_error(format!("{:?}", e)))?;
                docx_text(&docx)
            }
            DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(&std::fs::read(path)?)
                .map_err(|e| extraction_error(e.to_string()))?,
        };
        debug!(
            "Extracted {} chars from {}",
            text.chars().count(),
            path.display()
        );
        Ok(text.replace('|', "\t"))
    }
}

/// Text of every paragraph, one per line.
fn docx_text(docx: &docx_rs::Docx) -> String {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};
    let mut paragraphs = Vec::new();
    for child in docx.document.children.iter() {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for paragraph_child in paragraph.children.iter() {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children.iter() {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }
    paragraphs.join("\n")
}

const ODT_TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

fn is_odt_paragraph(node: &roxmltree::Node) -> bool {
    node.tag_name().namespace() == Some(ODT_TEXT_NS) && matches!(node.tag_name().name(), "p" | "h")
}

/// Text of an OpenDocument paragraph. Nested paragraphs (notes, frames) are left to their own
/// line.
fn odt_paragraph_text(node: roxmltree::Node, text: &mut String) {
    for child in node.children() {
        if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
            continue;
        }
        if child.tag_name().namespace() != Some(ODT_TEXT_NS) || is_odt_paragraph(&child) {
            continue;
        }
        match child.tag_name().name() {
            "s" => {
                let count = child
                    .attribute((ODT_TEXT_NS, "c"))
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(1);
                text.push_str(&" ".repeat(count));
            }
            "tab" => text.push('\t'),
            "line-break" => text.push('\n'),
            _ => odt_paragraph_text(child, text),
        }
    }
}

/// Text of every `text:p` and `text:h` of the `content.xml` entry, one per line.
fn odt_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut content = String::new();
    archive
        .by_name("content.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut content)
        .map_err(|e| e.to_string())?;
    let xml = roxmltree::Document::parse(&content).map_err(|e| e.to_string())?;
    let paragraphs: Vec<String> = xml
        .descendants()
        .filter(is_odt_paragraph)
        .map(|node| {
            let mut text = String::new();
            odt_paragraph_text(node, &mut text);
            text
        })
        .collect();
    Ok(paragraphs.join("\n"))
}
