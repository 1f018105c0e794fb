//! Whole-document journal archive export.
//!
//! The journal archive is the legacy interchange format: gzip-compressed
//! XML holding every page, its background and its strokes. It ignores the
//! page range.

use super::host::Progress;
use super::job::{ExportPlan, ExportReport};
use crate::error::{Error, Result};
use crate::model::{Background, Document, Element, SharedDocument};
use crate::output::write_atomically;
use flate2::write::GzEncoder;
use flate2::Compression;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

/// Version written to the root element.
pub const JOURNAL_VERSION: u32 = 1;

/// Serializer for the legacy archive format.
pub trait ArchiveWriter: Send {
    /// Capture the document. Called while the document is locked.
    fn prepare_save(&mut self, document: &Document);

    /// Write what was captured to `path`.
    fn save_to(&mut self, path: &Path) -> std::result::Result<(), String>;
}

/// Gzip-compressed XML journal writer.
#[derive(Debug, Clone)]
pub struct JournalArchive {
    prepared: Option<std::result::Result<String, String>>,
    compression: Compression,
}

impl JournalArchive {
    /// Create a writer with default compression.
    pub fn new() -> Self {
        Self {
            prepared: None,
            compression: Compression::default(),
        }
    }

    /// Set the gzip compression level (0-9).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// The XML captured by the last successful `prepare_save`.
    pub fn prepared_xml(&self) -> Option<&str> {
        self.prepared
            .as_ref()
            .and_then(|xml| xml.as_deref().ok())
    }
}

impl Default for JournalArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for JournalArchive {
    fn prepare_save(&mut self, document: &Document) {
        self.prepared = Some(to_xml(document).map_err(|e| e.to_string()));
    }

    fn save_to(&mut self, path: &Path) -> std::result::Result<(), String> {
        let xml = self
            .prepared
            .as_ref()
            .ok_or_else(|| "no document prepared for saving".to_string())?
            .as_ref()
            .map_err(|e| e.clone())?;

        write_atomically(path, |w| {
            let mut encoder = GzEncoder::new(w, self.compression);
            encoder.write_all(xml.as_bytes())?;
            encoder.finish()?;
            Ok(())
        })
        .map_err(|e| e.to_string())
    }
}

/// Serialize the whole document as journal XML.
pub fn to_xml(document: &Document) -> Result<String> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let version = JOURNAL_VERSION.to_string();
    let creator = concat!("inkport ", env!("CARGO_PKG_VERSION"));
    let mut root = BytesStart::new("journal");
    root.push_attribute(("version", version.as_str()));
    root.push_attribute(("creator", creator));
    xml.write_event(Event::Start(root))?;

    if let Some(ref title) = document.metadata.title {
        write_text_element(&mut xml, "title", title)?;
    }
    if let Some(ref modified) = document.metadata.modified {
        write_text_element(&mut xml, "modified", &modified.to_rfc3339())?;
    }

    let source = document
        .reference
        .as_ref()
        .and_then(|r| r.source.as_ref())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    for page in &document.pages {
        let width = format!("{:.2}", page.width);
        let height = format!("{:.2}", page.height);
        let mut start = BytesStart::new("page");
        start.push_attribute(("width", width.as_str()));
        start.push_attribute(("height", height.as_str()));
        xml.write_event(Event::Start(start))?;

        let mut background = BytesStart::new("background");
        match &page.background {
            Background::Solid { color, style } => {
                let color = color.to_hex();
                background.push_attribute(("type", "solid"));
                background.push_attribute(("color", color.as_str()));
                background.push_attribute(("style", style.as_str()));
            }
            Background::Reference { page } => {
                let pageno = (page + 1).to_string();
                background.push_attribute(("type", "reference"));
                background.push_attribute(("source", source.as_str()));
                background.push_attribute(("pageno", pageno.as_str()));
            }
        }
        xml.write_event(Event::Empty(background))?;

        for layer in &page.layers {
            xml.write_event(Event::Start(BytesStart::new("layer")))?;
            for element in &layer.elements {
                match element {
                    Element::Stroke(stroke) => {
                        let color = stroke.color.to_hex();
                        let width = format!("{:.2}", stroke.width);
                        let mut start = BytesStart::new("stroke");
                        start.push_attribute(("tool", stroke.tool.as_str()));
                        start.push_attribute(("color", color.as_str()));
                        start.push_attribute(("width", width.as_str()));
                        xml.write_event(Event::Start(start))?;

                        let coords: Vec<String> = stroke
                            .points
                            .iter()
                            .map(|p| format!("{:.2} {:.2}", p.x, p.y))
                            .collect();
                        xml.write_event(Event::Text(BytesText::new(&coords.join(" "))))?;
                        xml.write_event(Event::End(BytesEnd::new("stroke")))?;
                    }
                }
            }
            xml.write_event(Event::End(BytesEnd::new("layer")))?;
        }
        xml.write_event(Event::End(BytesEnd::new("page")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("journal")))?;
    String::from_utf8(xml.into_inner()).map_err(|e| Error::Other(e.to_string()))
}

fn write_text_element(xml: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn run(
    writer: &mut dyn ArchiveWriter,
    document: &SharedDocument,
    plan: &ExportPlan,
    progress: &mut Progress<'_>,
    report: &mut ExportReport,
) -> Result<()> {
    progress.begin(1);
    progress.checkpoint()?;

    let pages = {
        let doc = document
            .read()
            .map_err(|_| Error::Other("document lock poisoned".into()))?;
        writer.prepare_save(&doc);
        doc.page_count()
    };

    writer
        .save_to(&plan.output)
        .map_err(|e| Error::BackendExport(format!("Save file error: {}", e)))?;

    progress.advance();
    report.files.push(plan.output.clone());
    report.pages_written = pages;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Page, PaperStyle, Point, ReferenceDocument, Stroke};
    use flate2::read::GzDecoder;
    use quick_xml::escape::unescape;
    use quick_xml::Reader;
    use std::io::Read;
    use std::path::PathBuf;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.metadata.title = Some("Tom & Jerry <3>".into());
        doc.reference = Some(ReferenceDocument {
            source: Some(PathBuf::from("lecture \"A\" & B.pdf")),
            pages: vec![],
        });

        let mut lined = Page::letter().with_background(Background::Solid {
            color: Color::WHITE,
            style: PaperStyle::Lined,
        });
        lined.add_stroke(Stroke::new(
            Color::BLACK,
            1.5,
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        ));
        doc.add_page(lined);
        doc.add_page(Page::letter().with_background(Background::Reference { page: 4 }));
        doc
    }

    /// Text of the first `<name>` element, unescaped.
    fn element_text(xml: &str, name: &str) -> Option<String> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == name.as_bytes() => {
                    let raw = reader.read_text(e.name()).unwrap();
                    return Some(unescape(&raw).unwrap().into_owned());
                }
                Event::Eof => return None,
                _ => {}
            }
        }
    }

    /// Attribute values of every `<background>` element, unescaped.
    fn background_attr(xml: &str, attr: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut values = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Empty(e) if e.name().as_ref() == b"background" => {
                    if let Some(a) = e.try_get_attribute(attr).unwrap() {
                        let raw = std::str::from_utf8(&a.value).unwrap();
                        values.push(unescape(raw).unwrap().into_owned());
                    }
                }
                Event::Eof => return values,
                _ => {}
            }
        }
    }

    #[test]
    fn test_to_xml() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;3"));
        assert!(xml.contains("style=\"lined\""));
        assert!(xml.contains(
            "<stroke tool=\"pen\" color=\"#000000ff\" width=\"1.50\">1.00 2.00 3.00 4.00</stroke>"
        ));
        assert_eq!(xml.matches("<page ").count(), 2);
        assert!(xml.trim_end().ends_with("</journal>"));
    }

    #[test]
    fn test_to_xml_parses_back() {
        let xml = to_xml(&sample()).unwrap();

        assert_eq!(
            element_text(&xml, "title").as_deref(),
            Some("Tom & Jerry <3>")
        );
        assert_eq!(background_attr(&xml, "source"), vec!["lecture \"A\" & B.pdf"]);
        assert_eq!(background_attr(&xml, "pageno"), vec!["5"]);
        assert_eq!(background_attr(&xml, "type"), vec!["solid", "reference"]);
    }

    #[test]
    fn test_save_requires_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JournalArchive::new();
        assert!(writer.save_to(&dir.path().join("a.jnl")).is_err());
    }

    #[test]
    fn test_save_is_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jnl");

        let mut writer = JournalArchive::new().with_compression(9);
        writer.prepare_save(&sample());
        writer.save_to(&path).unwrap();

        let mut xml = String::new();
        GzDecoder::new(std::fs::File::open(&path).unwrap())
            .read_to_string(&mut xml)
            .unwrap();
        assert_eq!(Some(xml.as_str()), writer.prepared_xml());
        assert_eq!(
            element_text(&xml, "title").as_deref(),
            Some("Tom & Jerry <3>")
        );
    }
}
