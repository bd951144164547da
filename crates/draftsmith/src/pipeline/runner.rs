use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::assembly::{merge_sections, DocumentAssembler};
use crate::budget::{allocate, words_for_pages};
use crate::generation::{ContentAcquirer, ContentRequest};
use crate::model::{GeneratedSection, GenerationJob, JobMetadata, JobStatus};
use crate::sanitize::truncate;
use crate::store::{JobStore, TemplateStore};
use crate::worker::job::JobOutcome;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;

/// Drives one job from `pending` to a terminal status.
///
/// Content is requested one (topic, section) pair at a time, topics in
/// request order and sections in template order, so a job never has more
/// than one provider call in flight.
pub struct GenerationPipeline {
    config: Arc<PipelineConfig>,
    templates: TemplateStore,
    jobs: JobStore,
    acquirer: ContentAcquirer,
    assembler: DocumentAssembler,
}

impl GenerationPipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        templates: TemplateStore,
        jobs: JobStore,
        acquirer: ContentAcquirer,
        assembler: DocumentAssembler,
    ) -> Self {
        Self {
            config,
            templates,
            jobs,
            acquirer,
            assembler,
        }
    }

    /// Runs the full pipeline for one job. Never panics; every failure ends
    /// with the job recorded as `failed`.
    pub async fn run(&self, job: GenerationJob) -> JobOutcome {
        let span = info_span!("generation",
            job_id = %job.id,
            template_id = %job.template_id,
            topics = job.topics.len(),
            pages = job.requested_pages,
        );

        async move {
            match self.jobs.mark_processing(&job.id) {
                Ok(true) => {}
                Ok(false) => return self.rejected(&job.id),
                Err(e) => {
                    log::error!("Failed to start job {}: {}", job.id, e);
                    return self.record_failure(&job.id, &e.to_string(), 0, 0);
                }
            }
            log::info!("Job {} is processing", job.id);

            let mut ctx = PipelineContext::new(job);
            match self.execute(&mut ctx).await {
                Ok(metadata) => {
                    let artifacts = ctx.artifacts.clone();
                    log::info!(
                        "Job {} completed: {} words in {} ms",
                        ctx.job.id,
                        metadata.total_word_count,
                        metadata.generation_time_ms
                    );
                    JobOutcome::completed(&ctx.job.id, artifacts, &metadata)
                }
                Err(e) => {
                    let message = e.to_string();
                    log::error!("Job {} failed: {}", ctx.job.id, message);
                    self.record_failure(
                        &ctx.job.id,
                        &message,
                        ctx.total_word_count(),
                        ctx.elapsed_ms(),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fails a job that will never run, e.g. because the pool is stopping.
    pub fn abandon(&self, job: &GenerationJob, reason: &str) -> JobOutcome {
        log::warn!("Abandoning job {}: {}", job.id, reason);
        self.record_failure(&job.id, reason, 0, 0)
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<JobMetadata, PipelineError> {
        self.step_load_template(ctx)?;
        self.step_allocate(ctx);
        self.step_generate(ctx)
            .instrument(info_span!("generate_sections"))
            .await?;
        self.step_assemble(ctx)
            .instrument(info_span!("assemble"))
            .await?;
        self.step_complete(ctx)
    }

    fn step_load_template(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let template = self
            .templates
            .get(&ctx.job.template_id, &ctx.job.owner_id)?
            .ok_or_else(|| PipelineError::TemplateMissing(ctx.job.template_id.clone()))?;
        ctx.template = Some(template);
        Ok(())
    }

    fn step_allocate(&self, ctx: &mut PipelineContext) {
        let Some(template) = ctx.template.as_ref() else {
            return;
        };
        let total = words_for_pages(ctx.job.requested_pages);
        ctx.budgets = allocate(total, &template.section_names());
        log::debug!(
            "Allocated {} words over {} section(s)",
            total,
            ctx.budgets.len()
        );
    }

    async fn step_generate(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let interval = self.config.min_call_interval;
        // Gaps are measured from the end of the previous call.
        let mut last_finished: Option<tokio::time::Instant> = None;

        for (topic_index, topic) in ctx.job.topics.iter().enumerate() {
            for budget in &ctx.budgets {
                if let Some(previous) = last_finished {
                    tokio::time::sleep_until(previous + interval).await;
                }

                let request = ContentRequest {
                    topic: topic.name.clone(),
                    section: budget.section_name.clone(),
                    style: topic.style,
                    word_count: budget.word_count,
                };
                let span = info_span!("section",
                    topic = %truncate(&topic.name, 40),
                    section = %budget.section_name,
                );
                let result = self.acquirer.acquire(&request).instrument(span).await;
                last_finished = Some(tokio::time::Instant::now());
                let acquired = result.map_err(|source| PipelineError::Generation {
                    topic: topic.name.clone(),
                    section: budget.section_name.clone(),
                    source,
                })?;

                let section = GeneratedSection {
                    section_name: budget.section_name.clone(),
                    topic_index,
                    content: acquired.content,
                    word_count: acquired.word_count,
                };
                if !self.jobs.append_section(&ctx.job.id, section.clone())? {
                    return Err(PipelineError::TransitionRejected(ctx.job.id.clone()));
                }
                ctx.generated.push(section);
            }
        }
        Ok(())
    }

    async fn step_assemble(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let Some(template) = ctx.template.as_ref() else {
            return Err(PipelineError::TemplateMissing(ctx.job.template_id.clone()));
        };
        let content = merge_sections(&ctx.generated);
        let artifacts = self
            .assembler
            .assemble(&ctx.job.id, template, &content)
            .await?;
        ctx.artifacts = Some(artifacts);
        Ok(())
    }

    fn step_complete(&self, ctx: &mut PipelineContext) -> Result<JobMetadata, PipelineError> {
        let Some(artifacts) = ctx.artifacts.clone() else {
            return Err(PipelineError::TransitionRejected(ctx.job.id.clone()));
        };
        let metadata = JobMetadata {
            total_word_count: ctx.total_word_count(),
            generation_time_ms: ctx.elapsed_ms(),
            error: None,
        };

        if !self
            .jobs
            .complete(&ctx.job.id, artifacts, metadata.clone())?
        {
            return Err(PipelineError::TransitionRejected(ctx.job.id.clone()));
        }

        match self.templates.increment_usage(&ctx.job.template_id) {
            Ok(true) => {}
            Ok(false) => log::warn!(
                "Template {} vanished before its usage could be recorded",
                ctx.job.template_id
            ),
            Err(e) => log::warn!(
                "Failed to record usage of template {}: {}",
                ctx.job.template_id,
                e
            ),
        }

        Ok(metadata)
    }

    fn record_failure(
        &self,
        job_id: &str,
        message: &str,
        total_word_count: u64,
        generation_time_ms: u64,
    ) -> JobOutcome {
        match self.jobs.fail(job_id, message, generation_time_ms) {
            Ok(true) => {}
            Ok(false) => log::warn!("Job {} was already terminal, failure not recorded", job_id),
            Err(e) => log::error!("Failed to record failure of job {}: {}", job_id, e),
        }
        JobOutcome::failed(job_id, message, total_word_count, generation_time_ms)
    }

    fn rejected(&self, job_id: &str) -> JobOutcome {
        let status = match self.jobs.get(job_id) {
            Ok(Some(job)) => job.status,
            Ok(None) => JobStatus::Failed,
            Err(e) => {
                log::error!("Failed to look up job {}: {}", job_id, e);
                JobStatus::Failed
            }
        };
        log::warn!("Job {} is {}, not pending; skipping", job_id, status);
        JobOutcome {
            status,
            ..JobOutcome::failed(job_id, &format!("Job is {}, not pending", status), 0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{AssemblyError, DocumentConverter};
    use crate::db::Database;
    use crate::generation::{ContentProvider, GenerationError};
    use crate::model::{FormatStyle, MarkerSyntax, Section, Template, TemplateFormat, TemplateUsage, Topic};
    use crate::storage::ArtifactStore;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Echo {
        fail_at: Option<usize>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ContentProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &ContentRequest) -> Result<String, GenerationError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_at == Some(call) {
                return Err(GenerationError::Provider {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(format!("{} about {}", request.section, request.topic))
        }
    }

    struct CopyConverter;

    #[async_trait]
    impl DocumentConverter for CopyConverter {
        fn target_extension(&self) -> &str {
            "pdf"
        }

        async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
            let out = crate::assembly::convert::expected_output(source, output_dir, "pdf");
            std::fs::copy(source, &out).unwrap();
            Ok(out)
        }
    }

    struct Fixture {
        _temp: TempDir,
        pipeline: GenerationPipeline,
        templates: TemplateStore,
        jobs: JobStore,
        template: Template,
    }

    fn fixture(fail_at: Option<usize>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let templates = TemplateStore::new(db.clone());
        let jobs = JobStore::new(db);

        let file_path = temp.path().join("t.txt");
        std::fs::write(&file_path, "{{INTRODUCTION}}\n{{CONTENT}}\n").unwrap();
        let template = Template {
            id: "tpl".to_string(),
            owner_id: "alice".to_string(),
            original_name: "t.txt".to_string(),
            format: TemplateFormat::Text,
            mime_type: None,
            file_path,
            file_size: 30,
            sections: ["INTRODUCTION", "CONTENT"]
                .iter()
                .map(|name| Section {
                    name: name.to_string(),
                    marker: MarkerSyntax::DoubleBrace.render(name),
                    syntax: MarkerSyntax::DoubleBrace,
                    required: true,
                })
                .collect(),
            page_count: 1,
            usage: TemplateUsage::default(),
            created_at: chrono::Utc::now(),
        };
        templates.insert(&template).unwrap();

        let pipeline = GenerationPipeline::new(
            Arc::new(PipelineConfig::default()),
            templates.clone(),
            jobs.clone(),
            ContentAcquirer::new(Arc::new(Echo {
                fail_at,
                calls: Mutex::new(0),
            })),
            DocumentAssembler::new(ArtifactStore::new(temp.path().join("data")), Arc::new(CopyConverter)),
        );

        Fixture {
            _temp: temp,
            pipeline,
            templates,
            jobs,
            template,
        }
    }

    fn job(f: &Fixture) -> GenerationJob {
        let job = GenerationJob::pending(
            "alice",
            &f.template.id,
            vec![Topic {
                name: "Tides".to_string(),
                style: FormatStyle::Paragraph,
            }],
            1,
        );
        f.jobs.create(&job).unwrap();
        job
    }

    #[tokio::test]
    async fn test_run_completes_job() {
        let f = fixture(None);
        let job = job(&f);

        let outcome = f.pipeline.run(job.clone()).await;
        assert_eq!(outcome.status, JobStatus::Completed, "{:?}", outcome.error);

        let stored = f.jobs.get(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.generated.len(), 2);
        assert_eq!(stored.metadata.total_word_count, outcome.total_word_count);
        assert!(stored.completed_at.is_some());

        let primary = std::fs::read_to_string(&outcome.artifacts.unwrap().primary_path).unwrap();
        assert_eq!(primary, "INTRODUCTION about Tides\nCONTENT about Tides\n");

        let template = f.templates.get("tpl", "alice").unwrap().unwrap();
        assert_eq!(template.usage.times_used, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_fails_job() {
        let f = fixture(Some(2));
        let job = job(&f);

        let outcome = f.pipeline.run(job.clone()).await;
        assert_eq!(outcome.status, JobStatus::Failed);

        let stored = f.jobs.get(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.generated.len(), 1);
        let error = stored.metadata.error.unwrap();
        assert!(error.contains("CONTENT"), "{}", error);
        assert!(error.contains("boom"), "{}", error);

        let template = f.templates.get("tpl", "alice").unwrap().unwrap();
        assert_eq!(template.usage.times_used, 0);
    }

    #[tokio::test]
    async fn test_missing_template_fails_job() {
        let f = fixture(None);
        let job = job(&f);
        f.templates.delete("tpl", "alice").unwrap();

        let outcome = f.pipeline.run(job.clone()).await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.error.unwrap().contains("no longer exists"));
    }

    #[tokio::test]
    async fn test_terminal_job_is_not_rerun() {
        let f = fixture(None);
        let job = job(&f);
        f.jobs.fail(&job.id, "cancelled", 0).unwrap();

        let outcome = f.pipeline.run(job.clone()).await;
        assert_eq!(outcome.status, JobStatus::Failed);

        let stored = f.jobs.get(&job.id).unwrap().unwrap();
        assert_eq!(stored.metadata.error.as_deref(), Some("cancelled"));
        assert!(stored.generated.is_empty());
    }
}
