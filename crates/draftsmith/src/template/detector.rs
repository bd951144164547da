//! Section marker detection.
//!
//! Four bracketing syntaxes are recognized over the alphabetic+underscore
//! vocabulary: `{{NAME}}`, `[NAME]`, `{NAME}` and `<<NAME>>`. Each pattern is
//! applied independently over the whole text and the matches are unioned by
//! normalized name, keeping the position of the first occurrence.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::TemplateError;
use crate::model::{MarkerSyntax, Section};

/// One pattern per syntax, in `MarkerSyntax::ALL` order.
static RE_MARKERS: LazyLock<[(MarkerSyntax, Regex); 4]> = LazyLock::new(|| {
    [
        (
            MarkerSyntax::DoubleBrace,
            Regex::new(r"\{\{([A-Za-z_]+)\}\}").unwrap(),
        ),
        (
            MarkerSyntax::SquareBracket,
            Regex::new(r"\[([A-Za-z_]+)\]").unwrap(),
        ),
        (
            MarkerSyntax::SingleBrace,
            Regex::new(r"\{([A-Za-z_]+)\}").unwrap(),
        ),
        (MarkerSyntax::DoubleAngle, Regex::new(r"<<([A-Za-z_]+)>>").unwrap()),
    ]
});

/// Detects sections in template text, in order of first appearance.
///
/// Returns [`TemplateError::NoPlaceholdersFound`] when the text has no
/// markers at all.
pub fn detect_sections(text: &str) -> Result<Vec<Section>, TemplateError> {
    // (offset, pattern rank, section)
    let mut hits: Vec<(usize, usize, Section)> = Vec::new();

    for (rank, (syntax, regex)) in RE_MARKERS.iter().enumerate() {
        for caps in regex.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            hits.push((
                whole.start(),
                rank,
                Section {
                    name: name.as_str().to_uppercase(),
                    marker: whole.as_str().to_string(),
                    syntax: *syntax,
                    required: true,
                },
            ));
        }
    }

    hits.sort_by_key(|(offset, rank, _)| (*offset, *rank));

    let mut seen = HashSet::new();
    let sections: Vec<Section> = hits
        .into_iter()
        .filter_map(|(_, _, section)| seen.insert(section.name.clone()).then_some(section))
        .collect();

    if sections.is_empty() {
        return Err(TemplateError::NoPlaceholdersFound);
    }

    log::debug!(
        "Detected {} section(s): {}",
        sections.len(),
        sections
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(sections)
}

/// Convenience wrapper returning only the section names.
pub fn detect_placeholders(text: &str) -> Result<Vec<String>, TemplateError> {
    Ok(detect_sections(text)?.into_iter().map(|s| s.name).collect())
}
