//! Document loading by file extension.
//!
//! [`load_document`] turns a file on disk into ordered [`RawUnit`]s:
//!
//! - `.pdf`: one unit per page, with the 1-based page number in the metadata
//! - `.txt`: one unit for the whole file
//! - `.docx`: one unit holding the body paragraphs, separated by blank lines
//!
//! PDF and DOCX extraction are behind the `pdf` and `docx` features.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::document::{RawUnit, SourceMetadata};
use crate::error::{RagError, Result};

/// The document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from the path's extension, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for any other extension, or
    /// when the format's cargo feature is disabled.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let format = match extension.as_str() {
            "pdf" => Self::Pdf,
            "txt" => Self::Text,
            "docx" => Self::Docx,
            _ => return Err(RagError::UnsupportedFormat { extension }),
        };

        if !format.is_enabled() {
            return Err(RagError::UnsupportedFormat { extension });
        }
        Ok(format)
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::Pdf => cfg!(feature = "pdf"),
            Self::Text => true,
            Self::Docx => cfg!(feature = "docx"),
        }
    }
}

/// Load a document into ordered raw units.
///
/// The `source` metadata of every unit is the path as given.
///
/// # Errors
///
/// - [`RagError::UnsupportedFormat`] for unknown extensions
/// - [`RagError::Io`] if the file cannot be read
/// - [`RagError::DocumentLoad`] if a PDF or DOCX cannot be parsed
pub fn load_document(path: impl AsRef<Path>) -> Result<Vec<RawUnit>> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let source = path.to_string_lossy().into_owned();

    let units = match format {
        DocumentFormat::Text => load_text(path, &source)?,
        DocumentFormat::Pdf => load_pdf(path, &source)?,
        DocumentFormat::Docx => load_docx(path, &source)?,
    };

    info!(source = %source, ?format, unit_count = units.len(), "loaded document");
    Ok(units)
}

fn load_text(path: &Path, source: &str) -> Result<Vec<RawUnit>> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(source, "file is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(vec![RawUnit::new(text, SourceMetadata::new(source))])
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path, source: &str) -> Result<Vec<RawUnit>> {
    let document = lopdf::Document::load(path).map_err(|e| load_error(source, e))?;

    let mut units = Vec::new();
    for page in document.get_pages().into_keys() {
        let text = match document.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                // Image-only or malformed pages still occupy their slot.
                warn!(source, page, error = %e, "no extractable text on page");
                String::new()
            }
        };
        units.push(RawUnit::new(text, SourceMetadata::with_page(source, page)));
    }
    Ok(units)
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(_path: &Path, _source: &str) -> Result<Vec<RawUnit>> {
    Err(RagError::UnsupportedFormat { extension: "pdf".to_string() })
}

#[cfg(feature = "docx")]
fn load_docx(path: &Path, source: &str) -> Result<Vec<RawUnit>> {
    use docx_rs::DocumentChild;

    let bytes = fs::read(path)?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| load_error(source, e))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                docx_text::push_paragraph(paragraph, &mut paragraphs)
            }
            DocumentChild::Table(table) => docx_text::push_table(table, &mut paragraphs),
            _ => {}
        }
    }

    Ok(vec![RawUnit::new(paragraphs.join("\n\n"), SourceMetadata::new(source))])
}

/// Text extraction from the DOCX element tree. Table cells contribute their
/// paragraphs in row order, nested tables included.
#[cfg(feature = "docx")]
mod docx_text {
    use docx_rs::{
        InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
        TableChild, TableRowChild,
    };

    pub(super) fn push_paragraph(paragraph: &Paragraph, out: &mut Vec<String>) {
        let mut text = String::new();
        collect_paragraph(&paragraph.children, &mut text);
        if !text.trim().is_empty() {
            out.push(text);
        }
    }

    pub(super) fn push_table(table: &Table, out: &mut Vec<String>) {
        for TableChild::TableRow(row) in &table.rows {
            for TableRowChild::TableCell(cell) in &row.cells {
                for content in &cell.children {
                    match content {
                        TableCellContent::Paragraph(paragraph) => push_paragraph(paragraph, out),
                        TableCellContent::Table(nested) => push_table(nested, out),
                        _ => {}
                    }
                }
            }
        }
    }

    fn collect_paragraph(children: &[ParagraphChild], text: &mut String) {
        for child in children {
            match child {
                ParagraphChild::Run(run) => collect_run(run, text),
                ParagraphChild::Hyperlink(link) => collect_paragraph(&link.children, text),
                ParagraphChild::Insert(insert) => {
                    for child in &insert.children {
                        if let InsertChild::Run(run) = child {
                            collect_run(run, text);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_run(run: &Run, text: &mut String) {
        for child in &run.children {
            match child {
                RunChild::Text(t) => text.push_str(&t.text),
                RunChild::Tab(_) => text.push('\t'),
                RunChild::Break(_) => text.push('\n'),
                _ => {}
            }
        }
    }
}

#[cfg(not(feature = "docx"))]
fn load_docx(_path: &Path, _source: &str) -> Result<Vec<RawUnit>> {
    Err(RagError::UnsupportedFormat { extension: "docx".to_string() })
}

#[cfg(any(feature = "pdf", feature = "docx"))]
fn load_error(source: &str, error: impl std::fmt::Display) -> RagError {
    tracing::error!(source, error = %error, "document extraction failed");
    RagError::DocumentLoad { path: source.to_string(), message: error.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_ignoring_case() {
        assert_eq!(DocumentFormat::from_path(Path::new("notes.TXT")).unwrap(), DocumentFormat::Text);
        #[cfg(feature = "pdf")]
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.pdf")).unwrap(), DocumentFormat::Pdf);
        #[cfg(feature = "docx")]
        assert_eq!(DocumentFormat::from_path(Path::new("c.Docx")).unwrap(), DocumentFormat::Docx);
    }

    #[test]
    fn rejects_unknown_and_missing_extensions() {
        let err = load_document("slides.pptx").unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { extension } if extension == "pptx"));

        let err = load_document("README").unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { extension } if extension.is_empty()));
    }

    #[test]
    fn unsupported_format_is_checked_before_reading() {
        // The file does not exist; the extension check must win over the I/O error.
        let err = load_document("/definitely/missing/file.csv").unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { .. }));
    }

    #[test]
    fn text_file_becomes_a_single_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "first paragraph\n\nsecond paragraph").unwrap();

        let units = load_document(&path).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "first paragraph\n\nsecond paragraph");
        assert_eq!(units[0].metadata.source, path.to_string_lossy());
        assert_eq!(units[0].metadata.page, None);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let units = load_document(&path).unwrap();
        assert!(units[0].text.starts_with("caf"));
    }

    #[test]
    fn missing_text_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }

    /// Writes a PDF with one line of text per page.
    #[cfg(feature = "pdf")]
    fn write_pdf(path: &Path, pages: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{Object, Stream, dictionary};

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_yields_one_unit_per_page_numbered_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.pdf");
        write_pdf(&path, &["Refunds take five days.", "Shipping is free."]);

        let units = load_document(&path).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].metadata.page, Some(1));
        assert_eq!(units[1].metadata.page, Some(2));
        assert!(units.iter().all(|u| u.metadata.source == path.to_string_lossy()));
        assert!(units[0].text.contains("Refunds take five days."));
        assert!(units[1].text.contains("Shipping is free."));
        assert!(!units[0].text.contains("Shipping"));
    }

    #[cfg(feature = "docx")]
    fn write_docx(path: &Path, docx: docx_rs::Docx) {
        let file = fs::File::create(path).unwrap();
        docx.build().pack(file).unwrap();
    }

    #[cfg(feature = "docx")]
    fn paragraph(text: &str) -> docx_rs::Paragraph {
        docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(text))
    }

    #[cfg(feature = "docx")]
    #[test]
    fn docx_paragraphs_are_joined_by_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.docx");
        write_docx(
            &path,
            docx_rs::Docx::new()
                .add_paragraph(paragraph("First paragraph."))
                .add_paragraph(paragraph("   "))
                .add_paragraph(paragraph("Second paragraph.")),
        );

        let units = load_document(&path).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "First paragraph.\n\nSecond paragraph.");
        assert_eq!(units[0].metadata.source, path.to_string_lossy());
        assert_eq!(units[0].metadata.page, None);
    }

    #[cfg(feature = "docx")]
    #[test]
    fn docx_table_cells_are_extracted_in_order() {
        use docx_rs::{Table, TableCell, TableRow};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.docx");
        let table = Table::new(vec![
            TableRow::new(vec![
                TableCell::new().add_paragraph(paragraph("Refund window is 30 days")),
                TableCell::new().add_paragraph(paragraph("Store credit only")),
            ]),
            TableRow::new(vec![TableCell::new().add_table(Table::new(vec![TableRow::new(
                vec![TableCell::new().add_paragraph(paragraph("Nested cell"))],
            )]))]),
        ]);
        write_docx(
            &path,
            docx_rs::Docx::new()
                .add_paragraph(paragraph("Intro paragraph"))
                .add_table(table)
                .add_paragraph(paragraph("Closing paragraph")),
        );

        let units = load_document(&path).unwrap();
        assert_eq!(
            units[0].text,
            "Intro paragraph\n\nRefund window is 30 days\n\nStore credit only\n\n\
             Nested cell\n\nClosing paragraph"
        );
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn corrupt_pdf_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, RagError::DocumentLoad { .. }));
    }
}
