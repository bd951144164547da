use std::path::Path;

use chrono::Utc;

use super::{detect_sections, extract_text};
use crate::budget::pages_for_words;
use crate::error::{Result, TemplateError};
use crate::generation::count_words;
use crate::model::{Section, Template, TemplateFormat, TemplateUsage};
use crate::sanitize::redact_path;
use crate::storage::ArtifactStore;
use crate::store::TemplateStore;

/// Accepts uploaded templates: stores the file, detects sections and
/// records the template.
#[derive(Clone)]
pub struct TemplateIngestor {
    templates: TemplateStore,
    artifacts: ArtifactStore,
}

/// Sections and size estimate read from a template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAnalysis {
    pub sections: Vec<Section>,
    pub word_count: u32,
    pub page_count: u32,
}

impl TemplateIngestor {
    pub fn new(templates: TemplateStore, artifacts: ArtifactStore) -> Self {
        Self {
            templates,
            artifacts,
        }
    }

    /// Stores and registers a template for `owner_id`.
    ///
    /// Nothing is left behind when the template is rejected: the stored file
    /// is removed again if analysis or the insert fails.
    pub fn ingest(&self, owner_id: &str, original_name: &str, content: &[u8]) -> Result<Template> {
        let name_path = Path::new(original_name);
        let extension = name_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = TemplateFormat::from_extension(extension).ok_or_else(|| {
            TemplateError::UnsupportedFormat(if extension.is_empty() {
                original_name.to_string()
            } else {
                format!(".{}", extension)
            })
        })?;
        if content.is_empty() {
            return Err(TemplateError::Extraction("template file is empty".to_string()).into());
        }

        let file_path = self.artifacts.store_template(content, extension)?;

        let analysis = match analyze(&file_path, format) {
            Ok(analysis) => analysis,
            Err(e) => {
                self.discard(&file_path);
                return Err(e.into());
            }
        };

        let template = Template {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            original_name: original_name.to_string(),
            format,
            mime_type: mime_guess::from_path(name_path)
                .first()
                .map(|m| m.essence_str().to_string()),
            file_path,
            file_size: content.len() as u64,
            sections: analysis.sections,
            page_count: analysis.page_count,
            usage: TemplateUsage::default(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.templates.insert(&template) {
            self.discard(&template.file_path);
            return Err(e.into());
        }

        log::info!(
            "Registered template {} ({}, {} section(s), ~{} page(s))",
            template.id,
            template.format,
            template.sections.len(),
            template.page_count
        );
        Ok(template)
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = self.artifacts.remove(path) {
            log::warn!("Failed to remove rejected template {}: {}", redact_path(path), e);
        }
    }
}

/// Extracts a template's text and detects its sections.
pub fn analyze(path: &Path, format: TemplateFormat) -> std::result::Result<TemplateAnalysis, TemplateError> {
    let text = extract_text(path, format)?;
    let sections = detect_sections(&text)?;
    let word_count = count_words(&text);
    let page_count = pages_for_words(u64::from(word_count)).clamp(1, u64::from(u32::MAX)) as u32;

    Ok(TemplateAnalysis {
        sections,
        word_count,
        page_count,
    })
}
