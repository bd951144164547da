//! Entry point tying the stores, the ingestor and the worker pool together.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::assembly::{DocumentAssembler, DocumentConverter, LibreOfficeConverter};
use crate::config::Config;
use crate::db::Database;
use crate::error::{ConfigError, DraftsmithError, ResourceKind, Result};
use crate::generation::{ContentAcquirer, ContentProvider, GeminiClient};
use crate::model::{
    ArtifactKind, GenerationJob, GenerationRequest, HistoryQuery, JobHistory, JobStats, JobStatus,
    Template,
};
use crate::pipeline::{GenerationPipeline, PipelineConfig};
use crate::sanitize::redact_path;
use crate::secrets::resolve_secret;
use crate::storage::ArtifactStore;
use crate::store::{JobStore, TemplateStore};
use crate::template::TemplateIngestor;
use crate::worker::{JobHandle, WorkerPool};

/// Immediate answer to a generation request.
///
/// The job is reported as `processing` as soon as it is queued; the stored
/// record moves out of `pending` when a worker picks it up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAccepted {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip)]
    pub handle: JobHandle,
}

pub struct DocumentService {
    templates: TemplateStore,
    jobs: JobStore,
    artifacts: ArtifactStore,
    ingestor: TemplateIngestor,
    pool: WorkerPool,
}

impl DocumentService {
    /// Production constructor: opens the database, resolves the provider
    /// credential and starts the workers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.database_file().ok_or_else(|| ConfigError::Validation {
            message: "Cannot determine a database location; set database_path".to_string(),
        })?;
        let db = Database::open(&db_path)?;

        let generation = &config.generation;
        let api_key = resolve_secret(
            generation.api_key.as_deref(),
            generation.api_key_file.as_deref(),
            generation.api_key_env_var.as_deref(),
        )?;
        let provider = GeminiClient::new(generation, api_key)?;
        let converter = LibreOfficeConverter::new(&config.converter);

        Self::new(config, db, Arc::new(provider), Arc::new(converter))
    }

    /// Builds the service around explicit provider and converter instances.
    pub fn new(
        config: &Config,
        db: Database,
        provider: Arc<dyn ContentProvider>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self> {
        let artifacts = ArtifactStore::new(config.storage_path());
        let templates = TemplateStore::new(db.clone());
        let jobs = JobStore::new(db);

        let pipeline = GenerationPipeline::new(
            Arc::new(PipelineConfig::from_config(config)),
            templates.clone(),
            jobs.clone(),
            ContentAcquirer::new(provider),
            DocumentAssembler::new(artifacts.clone(), converter),
        );
        let pool = WorkerPool::new(
            Arc::new(pipeline),
            config.worker_count,
            config.queue_capacity,
        )?;

        Ok(Self {
            ingestor: TemplateIngestor::new(templates.clone(), artifacts.clone()),
            templates,
            jobs,
            artifacts,
            pool,
        })
    }

    // ── Templates ──────────────────────────────────────────────────────────

    pub fn ingest_template(
        &self,
        owner_id: &str,
        original_name: &str,
        content: &[u8],
    ) -> Result<Template> {
        self.ingestor.ingest(owner_id, original_name, content)
    }

    pub fn list_templates(&self, owner_id: &str) -> Result<Vec<Template>> {
        Ok(self.templates.list(owner_id)?)
    }

    pub fn template(&self, owner_id: &str, template_id: &str) -> Result<Template> {
        self.templates
            .get(template_id, owner_id)?
            .ok_or_else(|| DraftsmithError::template_not_found(template_id))
    }

    /// Deletes a template and its stored file. Jobs that used it are kept.
    pub fn delete_template(&self, owner_id: &str, template_id: &str) -> Result<()> {
        let template = self.template(owner_id, template_id)?;
        if !self.templates.delete(template_id, owner_id)? {
            return Err(DraftsmithError::template_not_found(template_id));
        }
        if let Err(e) = self.artifacts.remove(&template.file_path) {
            log::warn!(
                "Template {} deleted but its file {} was not removed: {}",
                template_id,
                redact_path(&template.file_path),
                e
            );
        }
        log::info!("Deleted template {}", template_id);
        Ok(())
    }

    // ── Generation ─────────────────────────────────────────────────────────

    /// Validates a request, records a `pending` job and queues it.
    ///
    /// If the queue is full the job is recorded as `failed` and the error is
    /// returned.
    pub fn request_generation(
        &self,
        owner_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationAccepted> {
        let validated = request.validate()?;
        let template = self.template(owner_id, &validated.template_id)?;

        let job = GenerationJob::pending(
            owner_id,
            &template.id,
            validated.topics,
            validated.requested_pages,
        );
        let job_id = self.jobs.create(&job)?;

        match self.pool.submit(job) {
            Ok(handle) => {
                log::info!(
                    "Queued job {} for template {} ({} queued)",
                    job_id,
                    template.id,
                    self.pool.queued()
                );
                Ok(GenerationAccepted {
                    job_id,
                    status: JobStatus::Processing,
                    handle,
                })
            }
            Err(e) => {
                log::error!("Could not queue job {}: {}", job_id, e);
                if let Err(db_err) = self.jobs.fail(&job_id, &e.to_string(), 0) {
                    log::error!("Failed to record failure of job {}: {}", job_id, db_err);
                }
                Err(e.into())
            }
        }
    }

    // ── Jobs ───────────────────────────────────────────────────────────────

    pub fn job(&self, owner_id: &str, job_id: &str) -> Result<GenerationJob> {
        self.jobs
            .get_for_owner(job_id, owner_id)?
            .ok_or_else(|| DraftsmithError::job_not_found(job_id))
    }

    pub fn history(&self, owner_id: &str, query: HistoryQuery) -> Result<JobHistory> {
        Ok(self.jobs.history(owner_id, query)?)
    }

    pub fn stats(&self, owner_id: &str) -> Result<JobStats> {
        Ok(self.jobs.stats(owner_id)?)
    }

    /// Path of a completed job's artifact.
    pub fn artifact(&self, owner_id: &str, job_id: &str, kind: ArtifactKind) -> Result<PathBuf> {
        let job = self.job(owner_id, job_id)?;
        if job.status != JobStatus::Completed {
            return Err(DraftsmithError::NotReady { status: job.status });
        }
        let artifacts = job
            .artifacts
            .ok_or(DraftsmithError::NotReady { status: job.status })?;

        let path = match kind {
            ArtifactKind::Primary => artifacts.primary_path,
            ArtifactKind::Converted => artifacts.converted_path,
        };
        if !path.is_file() {
            log::warn!("Artifact {} of job {} is missing", redact_path(&path), job_id);
            return Err(DraftsmithError::NotFound {
                kind: ResourceKind::Artifact,
                id: job_id.to_string(),
            });
        }
        Ok(path)
    }

    /// Stops the workers. Jobs still queued are recorded as `failed`.
    pub fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait();
    }
}
