//! Marker substitution for text and DOCX templates.
//!
//! Filling is a single left-to-right pass over the four marker syntaxes.
//! Markers whose name has no content are left in place. Newlines in the
//! content become `<w:br/>` line breaks inside DOCX paragraphs.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use zip::write::SimpleFileOptions;

use super::AssemblyError;
use crate::model::GeneratedSection;
use crate::template::extract::{paragraph_text, DOCUMENT_XML, RE_PARAGRAPH, RE_TEXT_RUN};

/// Section name (uppercase) to the text that replaces its marker.
pub type SectionContent = BTreeMap<String, String>;

/// All four syntaxes in one alternation; `{{X}}` wins over `{X}` at the same offset.
static RE_ANY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_]+)\}\}|<<([A-Za-z_]+)>>|\[([A-Za-z_]+)\]|\{([A-Za-z_]+)\}").unwrap()
});

const DOCX_LINE_BREAK: &str = "</w:t><w:br/><w:t xml:space=\"preserve\">";

/// Merges generated sections into one content map.
///
/// When several topics write the same section their texts are joined in
/// topic order with a blank line in between.
pub fn merge_sections(sections: &[GeneratedSection]) -> SectionContent {
    let mut ordered: Vec<&GeneratedSection> = sections.iter().collect();
    ordered.sort_by_key(|s| s.topic_index);

    let mut content = SectionContent::new();
    for section in ordered {
        let text = section.content.trim();
        content
            .entry(section.section_name.to_uppercase())
            .and_modify(|existing: &mut String| {
                existing.push_str("\n\n");
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());
    }
    content
}

/// Replaces every marker with content for its (case-insensitive) name.
pub fn fill_text(text: &str, content: &SectionContent) -> String {
    RE_ANY_MARKER
        .replace_all(text, |caps: &Captures| {
            let name = (1..=4)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().to_uppercase())
                .unwrap_or_default();
            match content.get(&name) {
                Some(replacement) => replacement.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Produces a filled copy of a DOCX template.
///
/// Every entry is copied over unchanged except the main document part, the
/// only part sections are detected in. Headers and footers keep their text.
pub fn fill_docx(template_path: &Path, content: &SectionContent) -> Result<Vec<u8>, AssemblyError> {
    let file = std::fs::File::open(template_path).map_err(|e| {
        AssemblyError::Fill(format!(
            "Failed to open template '{}': {}",
            template_path.display(),
            e
        ))
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AssemblyError::Fill(format!("Failed to open DOCX: {}", e)))?;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| AssemblyError::Fill(format!("Failed to read DOCX entry {}: {}", i, e)))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| AssemblyError::Fill(format!("Failed to write '{}': {}", name, e)))?;
            continue;
        }

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| AssemblyError::Fill(format!("Failed to read '{}': {}", name, e)))?;

        if name == DOCUMENT_XML {
            let xml = String::from_utf8(data)
                .map_err(|e| AssemblyError::Fill(format!("'{}' is not UTF-8: {}", name, e)))?;
            data = fill_document_xml(&xml, content).into_bytes();
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| AssemblyError::Fill(format!("Failed to write '{}': {}", name, e)))?;
        writer
            .write_all(&data)
            .map_err(|e| AssemblyError::Fill(format!("Failed to write '{}': {}", name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| AssemblyError::Fill(format!("Failed to finish DOCX: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Fills markers in WordprocessingML.
///
/// A marker is often split over several runs, so matching happens on the
/// paragraph's joined text. When that text changes, the whole text goes into
/// the first run and the remaining runs are emptied, keeping the first run's
/// formatting for the paragraph.
pub(crate) fn fill_document_xml(xml: &str, content: &SectionContent) -> String {
    RE_PARAGRAPH
        .replace_all(xml, |caps: &Captures| {
            let paragraph = &caps[0];
            let text = paragraph_text(paragraph);
            let filled = fill_text(&text, content);
            if filled == text {
                paragraph.to_string()
            } else {
                rewrite_runs(paragraph, &filled)
            }
        })
        .into_owned()
}

fn rewrite_runs(paragraph: &str, text: &str) -> String {
    let escaped = quick_xml::escape::escape(text)
        .replace("\r\n", "\n")
        .replace('\n', DOCX_LINE_BREAK);

    let mut out = String::with_capacity(paragraph.len() + escaped.len());
    let mut last = 0;
    for (i, run) in RE_TEXT_RUN.find_iter(paragraph).enumerate() {
        out.push_str(&paragraph[last..run.start()]);
        if i == 0 {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escaped);
            out.push_str("</w:t>");
        } else {
            out.push_str("<w:t></w:t>");
        }
        last = run.end();
    }
    out.push_str(&paragraph[last..]);
    out
}
