//! Plain-text extraction from template files.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::TemplateError;
use crate::model::TemplateFormat;

pub(crate) const DOCUMENT_XML: &str = "word/document.xml";

/// One `<w:p>` paragraph element including its contents.
pub(crate) static RE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>])?>.*?</w:p>").unwrap());

/// One `<w:t>` text run; group 1 is the escaped text.
pub(crate) static RE_TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*[^/>])?>(.*?)</w:t>").unwrap());

/// Extracts the text of a template, one line per DOCX paragraph.
pub fn extract_text(path: &Path, format: TemplateFormat) -> Result<String, TemplateError> {
    match format {
        TemplateFormat::Text => {
            std::fs::read_to_string(path).map_err(|e| TemplateError::ReadTemplate {
                path: path.to_path_buf(),
                source: e,
            })
        }
        TemplateFormat::Docx => {
            let xml = read_document_xml(path)?;
            Ok(docx_xml_to_text(&xml))
        }
    }
}

/// Reads `word/document.xml` out of a DOCX archive.
pub(crate) fn read_document_xml(path: &Path) -> Result<String, TemplateError> {
    let file = std::fs::File::open(path).map_err(|e| TemplateError::ReadTemplate {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| TemplateError::Extraction(format!("Failed to open DOCX: {}", e)))?;

    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| TemplateError::Extraction(format!("Failed to find document.xml: {}", e)))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| TemplateError::Extraction(format!("Failed to read document.xml: {}", e)))?;

    Ok(xml)
}

/// Concatenated, unescaped run text of one paragraph.
pub(crate) fn paragraph_text(paragraph_xml: &str) -> String {
    RE_TEXT_RUN
        .captures_iter(paragraph_xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_lossy(m.as_str()))
        .collect()
}

pub(crate) fn docx_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    for paragraph in RE_PARAGRAPH.find_iter(xml) {
        text.push_str(&paragraph_text(paragraph.as_str()));
        text.push('\n');
    }
    text
}

fn unescape_lossy(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(s) => s.into_owned(),
        Err(e) => {
            log::warn!("Keeping escaped DOCX text run: {}", e);
            raw.to_string()
        }
    }
}
