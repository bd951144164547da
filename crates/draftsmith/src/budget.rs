//! Word budget allocation.
//!
//! A requested page count is turned into a total word target and split
//! across sections by fixed per-section weights. Weights are not normalized,
//! so the per-section targets of a template need not sum to the total.

use serde::Serialize;

/// Words assumed per printed page, in both directions of the conversion.
pub const WORDS_PER_PAGE: u32 = 475;

/// Weight for any section name not listed in [`section_weight`].
pub const DEFAULT_SECTION_WEIGHT: f64 = 0.20;

/// Target word count for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBudget {
    pub section_name: String,
    pub word_count: u32,
}

pub fn words_for_pages(pages: u32) -> u32 {
    pages.saturating_mul(WORDS_PER_PAGE)
}

/// Pages needed for `words`, rounded up.
pub fn pages_for_words(words: u64) -> u64 {
    words.div_ceil(u64::from(WORDS_PER_PAGE))
}

/// Share of the total word target given to a section.
pub fn section_weight(section_name: &str) -> f64 {
    match section_name.to_uppercase().as_str() {
        "OBJECTIVE" => 0.10,
        "INTRODUCTION" => 0.15,
        "CONTENT" | "BODY" => 0.50,
        "ANALYSIS" | "DISCUSSION" => 0.30,
        "REFERENCES" => 0.10,
        "CONCLUSION" | "SUMMARY" => 0.15,
        _ => DEFAULT_SECTION_WEIGHT,
    }
}

/// Word target for one section out of `total_words`.
pub fn section_target(total_words: u32, section_name: &str) -> u32 {
    (f64::from(total_words) * section_weight(section_name)).round() as u32
}

/// Allocates `total_words` over `sections`, preserving their order.
pub fn allocate<S: AsRef<str>>(total_words: u32, sections: &[S]) -> Vec<SectionBudget> {
    sections
        .iter()
        .map(|name| SectionBudget {
            section_name: name.as_ref().to_string(),
            word_count: section_target(total_words, name.as_ref()),
        })
        .collect()
}
