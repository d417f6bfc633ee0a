//! Word output: assemble recognised pages into a `.docx` package.
//!
//! A `.docx` file is a ZIP archive of WordprocessingML XML parts. Only what
//! the converter needs is modelled: an ordered list of [`Block`]s, each either
//! a plain-text paragraph or a page break. `word/document.xml` and
//! `docProps/core.xml` are generated with `quick-xml` so recognised text is
//! always escaped; the remaining parts are fixed boilerplate.
//!
//! Within a paragraph, `\n` becomes a line break (`<w:br/>`) and `\t` a tab
//! (`<w:tab/>`), the same mapping Word uses when text is pasted into a run.
//! Characters XML 1.0 cannot carry (form feeds and other C0 controls) are
//! dropped, whether or not the text was cleaned first.

use crate::error::Pdf2DocxError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// MIME type served for generated documents.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Complex-script font used for Sinhala runs. Ships with Windows; Word and
/// LibreOffice substitute a Sinhala-capable font elsewhere.
const SINHALA_FONT: &str = "Iskoola Pota";

const APPLICATION: &str = "sinhala-pdf2docx";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// One unit of body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph of plain text.
    Paragraph(String),
    /// A paragraph holding only a page-type break.
    PageBreak,
}

/// An in-memory Word document built page by page.
#[derive(Debug, Clone, Default)]
pub struct WordDocument {
    title: Option<String>,
    blocks: Vec<Block>,
}

impl WordDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `dc:title` document property.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }

    pub fn add_page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    pub fn page_break_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }

    /// Serialise `word/document.xml`.
    pub fn document_xml(&self) -> Result<String, Pdf2DocxError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut document = BytesStart::new("w:document");
        document.push_attribute(("xmlns:w", W_NS));
        writer.write_event(Event::Start(document))?;
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => write_paragraph(&mut writer, text)?,
                Block::PageBreak => write_page_break(&mut writer)?,
            }
        }

        write_section_properties(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        writer.write_event(Event::End(BytesEnd::new("w:document")))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Pdf2DocxError::DocumentBuildFailed(e.to_string()))
    }

    /// Serialise `docProps/core.xml`.
    fn core_xml(&self) -> Result<String, Pdf2DocxError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut props = BytesStart::new("cp:coreProperties");
        props.push_attribute((
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ));
        props.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
        props.push_attribute(("xmlns:dcterms", "http://purl.org/dc/terms/"));
        props.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        writer.write_event(Event::Start(props))?;

        if let Some(ref title) = self.title {
            write_simple_element(&mut writer, "dc:title", title)?;
        }
        write_simple_element(&mut writer, "dc:creator", APPLICATION)?;

        writer.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Pdf2DocxError::DocumentBuildFailed(e.to_string()))
    }

    fn app_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{}</Application><Pages>{}</Pages></Properties>"#,
            APPLICATION,
            self.page_break_count()
        )
    }

    /// Write the complete `.docx` package to `out`.
    pub fn write_to<W: Write + Seek>(&self, out: W) -> Result<W, Pdf2DocxError> {
        let mut zip = ZipWriter::new(out);

        let parts: [(&str, String); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("word/document.xml", self.document_xml()?),
            ("word/styles.xml", styles_xml()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
            ("docProps/core.xml", self.core_xml()?),
            ("docProps/app.xml", self.app_xml()),
        ];

        for (name, body) in parts.iter() {
            zip.start_file(*name, deflated())?;
            zip.write_all(body.as_bytes())
                .map_err(|e| Pdf2DocxError::DocumentBuildFailed(format!("{name}: {e}")))?;
        }

        Ok(zip.finish()?)
    }

    /// Save to `path` atomically: write `<path>.tmp`, then rename.
    ///
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn save(&self, path: &Path) -> Result<(), Pdf2DocxError> {
        let write_err = |source: std::io::Error| Pdf2DocxError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp_path = path.with_extension("docx.tmp");
        let result = File::create(&tmp_path)
            .map_err(write_err)
            .and_then(|file| self.write_to(BufWriter::new(file)))
            .and_then(|mut buf| buf.flush().map_err(write_err))
            .and_then(|_| std::fs::rename(&tmp_path, path).map_err(write_err));

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        } else {
            debug!("Saved {} blocks to {}", self.blocks.len(), path.display());
        }
        result
    }
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn write_simple_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), Pdf2DocxError> {
    let value = xml_safe(value);
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(&value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `Char` production of XML 1.0.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn xml_safe(text: &str) -> std::borrow::Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        std::borrow::Cow::Borrowed(text)
    } else {
        std::borrow::Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn write_paragraph<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), Pdf2DocxError> {
    let text = xml_safe(text);
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("w:p")))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
        }
        for (j, chunk) in line.split('\t').enumerate() {
            if j > 0 {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            if chunk.is_empty() {
                continue;
            }
            let mut t = BytesStart::new("w:t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(chunk)))?;
            writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_page_break<W: Write>(writer: &mut Writer<W>) -> Result<(), Pdf2DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    let mut br = BytesStart::new("w:br");
    br.push_attribute(("w:type", "page"));
    writer.write_event(Event::Empty(br))?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

/// A4 portrait, one-inch margins.
fn write_section_properties<W: Write>(writer: &mut Writer<W>) -> Result<(), Pdf2DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;

    let mut size = BytesStart::new("w:pgSz");
    size.push_attribute(("w:w", "11906"));
    size.push_attribute(("w:h", "16838"));
    writer.write_event(Event::Empty(size))?;

    let mut margins = BytesStart::new("w:pgMar");
    for (k, v) in [
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "708"),
        ("w:footer", "708"),
        ("w:gutter", "0"),
    ] {
        margins.push_attribute((k, v));
    }
    writer.write_event(Event::Empty(margins))?;

    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
    Ok(())
}

fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="{SINHALA_FONT}"/><w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="en-US" w:bidi="si-LK"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style></w:styles>"#
    )
}
