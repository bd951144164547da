//! Document assembly: fill a template with generated content, then convert.

pub mod convert;
pub mod error;
pub mod fill;

use std::path::Path;
use std::sync::Arc;

pub use convert::{DocumentConverter, LibreOfficeConverter};
pub use error::AssemblyError;
pub use fill::{fill_docx, fill_text, merge_sections, SectionContent};

use crate::model::{JobArtifacts, Template, TemplateFormat};
use crate::sanitize::redact_path;
use crate::storage::ArtifactStore;

/// Produces the primary and converted artifacts of a job.
#[derive(Clone)]
pub struct DocumentAssembler {
    store: ArtifactStore,
    converter: Arc<dyn DocumentConverter>,
}

impl DocumentAssembler {
    pub fn new(store: ArtifactStore, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { store, converter }
    }

    /// Fills `template` with `content` and converts the result.
    ///
    /// Both artifacts land in the job's own directory. Fails with
    /// [`AssemblyError::ConversionFailed`] when the converter reports success
    /// but its output is missing.
    pub async fn assemble(
        &self,
        job_id: &str,
        template: &Template,
        content: &SectionContent,
    ) -> Result<JobArtifacts, AssemblyError> {
        let output_dir = self.store.job_directory(job_id)?;
        let primary_path = self
            .store
            .job_artifact_path(job_id, template.format.output_extension());

        let filled = fill_template(&template.file_path, template.format, content)?;
        self.store.write_new(&primary_path, &filled)?;
        log::info!(
            "Filled template {} into {}",
            template.id,
            redact_path(&primary_path)
        );

        let converted_path = self.converter.convert(&primary_path, &output_dir).await?;
        if converted_path == primary_path || !converted_path.is_file() {
            return Err(AssemblyError::ConversionFailed(format!(
                "expected output {} was not produced",
                redact_path(&converted_path)
            )));
        }
        log::info!("Converted {}", redact_path(&converted_path));

        Ok(JobArtifacts {
            primary_path,
            converted_path,
        })
    }
}

fn fill_template(
    path: &Path,
    format: TemplateFormat,
    content: &SectionContent,
) -> Result<Vec<u8>, AssemblyError> {
    match format {
        TemplateFormat::Docx => fill_docx(path, content),
        TemplateFormat::Text => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AssemblyError::Fill(format!("Failed to read template '{}': {}", path.display(), e))
            })?;
            Ok(fill_text(&text, content).into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarkerSyntax, Section, TemplateUsage};
    use async_trait::async_trait;
    use std::path::PathBuf;

    /// Copies the source to `<stem>.pdf` so the output exists.
    struct CopyConverter;

    #[async_trait]
    impl DocumentConverter for CopyConverter {
        fn target_extension(&self) -> &str {
            "pdf"
        }

        async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
            let out = convert::expected_output(source, output_dir, "pdf");
            std::fs::copy(source, &out).unwrap();
            Ok(out)
        }
    }

    /// Claims success without writing anything.
    struct SilentConverter;

    #[async_trait]
    impl DocumentConverter for SilentConverter {
        fn target_extension(&self) -> &str {
            "pdf"
        }

        async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
            Ok(convert::expected_output(source, output_dir, "pdf"))
        }
    }

    fn text_template(dir: &Path) -> Template {
        let file_path = dir.join("template.txt");
        std::fs::write(&file_path, "Intro: {{INTRODUCTION}}\nEnd: [SUMMARY]\n").unwrap();
        Template {
            id: "tpl-1".to_string(),
            owner_id: "owner".to_string(),
            original_name: "template.txt".to_string(),
            format: TemplateFormat::Text,
            mime_type: Some("text/plain".to_string()),
            file_path,
            file_size: 0,
            sections: vec![Section {
                name: "INTRODUCTION".to_string(),
                marker: "{{INTRODUCTION}}".to_string(),
                syntax: MarkerSyntax::DoubleBrace,
                required: true,
            }],
            page_count: 1,
            usage: TemplateUsage::default(),
            created_at: chrono::Utc::now(),
        }
    }

    fn content() -> SectionContent {
        [
            ("INTRODUCTION".to_string(), "Hello.".to_string()),
            ("SUMMARY".to_string(), "Bye.".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_assemble_text_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = text_template(dir.path());
        let assembler =
            DocumentAssembler::new(ArtifactStore::new(dir.path().join("data")), Arc::new(CopyConverter));

        let artifacts = assembler.assemble("job-1", &template, &content()).await.unwrap();

        assert!(artifacts.primary_path.ends_with("documents/job-1/assignment-job-1.txt"));
        assert!(artifacts.converted_path.ends_with("documents/job-1/assignment-job-1.pdf"));
        assert_eq!(
            std::fs::read_to_string(&artifacts.primary_path).unwrap(),
            "Intro: Hello.\nEnd: Bye.\n"
        );
    }

    #[tokio::test]
    async fn test_missing_converted_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let template = text_template(dir.path());
        let assembler = DocumentAssembler::new(
            ArtifactStore::new(dir.path().join("data")),
            Arc::new(SilentConverter),
        );

        let err = assembler.assemble("job-2", &template, &content()).await.unwrap_err();
        assert!(matches!(err, AssemblyError::ConversionFailed(_)));
    }

    #[tokio::test]
    async fn test_existing_artifact_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let template = text_template(dir.path());
        let store = ArtifactStore::new(dir.path().join("data"));
        let assembler = DocumentAssembler::new(store.clone(), Arc::new(CopyConverter));

        assembler.assemble("job-3", &template, &content()).await.unwrap();
        let err = assembler.assemble("job-3", &template, &content()).await.unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Storage(crate::error::StorageError::FileExists(_))
        ));
    }
}
