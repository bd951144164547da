//! Job status store.
//!
//! Every mutation is a partial update touching only its own columns, and
//! every status change is guarded on the current status in the same SQL
//! statement, using [`JobStatus::allowed_predecessors`] as the source list.
//! A `false` result means the transition was rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::db::job_repo::{self, JobFilter, JobRow, SectionRow};
use crate::db::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::model::{
    GeneratedSection, GenerationJob, HistoryQuery, JobArtifacts, JobHistory, JobMetadata,
    JobStats, JobStatus, Topic,
};

// ── Partial updates ─────────────────────────────────────────────────────────

/// One non-clobbering change to a stored job.
#[derive(Debug, Clone)]
pub enum JobUpdate {
    /// `pending -> processing`
    Start,
    /// Append a section result. Only accepted while processing.
    AppendSection(GeneratedSection),
    /// `processing -> completed`
    Complete {
        artifacts: JobArtifacts,
        metadata: JobMetadata,
    },
    /// `pending | processing -> failed`
    Fail { error: String, generation_time_ms: u64 },
}

// ── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JobStore {
    db: Database,
}

impl JobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persists a new job in `pending` and returns its id.
    pub fn create(&self, job: &GenerationJob) -> Result<String, DatabaseError> {
        let topics = serde_json::to_string(&job.topics).map_err(|e| corrupt(&job.id, e))?;
        let row = JobRow {
            id: job.id.clone(),
            owner_id: job.owner_id.clone(),
            template_id: job.template_id.clone(),
            topics,
            requested_pages: i64::from(job.requested_pages),
            status: JobStatus::Pending.as_str().to_string(),
            primary_path: None,
            converted_path: None,
            total_word_count: 0,
            generation_time_ms: 0,
            error: None,
            created_at: format_timestamp(&job.created_at),
            updated_at: format_timestamp(&job.created_at),
            completed_at: None,
            template_name: None,
        };
        job_repo::insert(&self.db, &row)?;
        log::debug!("Created job {} for template {}", job.id, job.template_id);
        Ok(job.id.clone())
    }

    /// Loads a job with its generated sections.
    pub fn get(&self, id: &str) -> Result<Option<GenerationJob>, DatabaseError> {
        let Some(row) = job_repo::find_by_id(&self.db, id)? else {
            return Ok(None);
        };
        let sections = job_repo::sections_for_job(&self.db, id)?;
        let mut job = job_from_row(&row)?;
        job.generated = sections.into_iter().map(section_from_row).collect();
        Ok(Some(job))
    }

    /// Like [`JobStore::get`], but only returns jobs owned by `owner_id`.
    pub fn get_for_owner(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<GenerationJob>, DatabaseError> {
        Ok(self.get(id)?.filter(|job| job.owner_id == owner_id))
    }

    /// Applies one partial update. Returns whether it was accepted.
    pub fn update(&self, id: &str, update: JobUpdate) -> Result<bool, DatabaseError> {
        let now = format_timestamp(&Utc::now());
        match update {
            JobUpdate::Start => job_repo::transition(
                &self.db,
                id,
                &sources(JobStatus::Processing),
                JobStatus::Processing.as_str(),
                &now,
            ),
            JobUpdate::AppendSection(section) => Ok(job_repo::append_section(
                &self.db,
                id,
                JobStatus::Processing.as_str(),
                &section.section_name,
                section.topic_index as i64,
                &section.content,
                i64::from(section.word_count),
                &now,
            )?
            .is_some()),
            JobUpdate::Complete {
                artifacts,
                metadata,
            } => job_repo::complete(
                &self.db,
                id,
                &sources(JobStatus::Completed),
                &artifacts.primary_path.to_string_lossy(),
                &artifacts.converted_path.to_string_lossy(),
                metadata.total_word_count as i64,
                metadata.generation_time_ms as i64,
                &now,
            ),
            JobUpdate::Fail {
                error,
                generation_time_ms,
            } => job_repo::fail(
                &self.db,
                id,
                &sources(JobStatus::Failed),
                &error,
                generation_time_ms as i64,
                &now,
            ),
        }
    }

    pub fn mark_processing(&self, id: &str) -> Result<bool, DatabaseError> {
        self.update(id, JobUpdate::Start)
    }

    pub fn append_section(&self, id: &str, section: GeneratedSection) -> Result<bool, DatabaseError> {
        self.update(id, JobUpdate::AppendSection(section))
    }

    pub fn complete(
        &self,
        id: &str,
        artifacts: JobArtifacts,
        metadata: JobMetadata,
    ) -> Result<bool, DatabaseError> {
        self.update(
            id,
            JobUpdate::Complete {
                artifacts,
                metadata,
            },
        )
    }

    pub fn fail(&self, id: &str, error: &str, generation_time_ms: u64) -> Result<bool, DatabaseError> {
        self.update(
            id,
            JobUpdate::Fail {
                error: error.to_string(),
                generation_time_ms,
            },
        )
    }

    /// An owner's jobs, newest first, without generated content.
    pub fn history(&self, owner_id: &str, query: HistoryQuery) -> Result<JobHistory, DatabaseError> {
        let filter = JobFilter {
            owner_id: Some(owner_id.to_string()),
            limit: Some(u64::from(query.limit)),
            offset: Some(query.offset()),
            ..Default::default()
        };
        let (rows, total) = job_repo::query(&self.db, &filter)?;

        let jobs = rows
            .iter()
            .map(|row| -> Result<_, DatabaseError> {
                Ok(job_from_row(row)?.summary(row.template_name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobHistory {
            jobs,
            page: query.page,
            limit: query.limit,
            total,
            pages: total.div_ceil(u64::from(query.limit)),
        })
    }

    pub fn stats(&self, owner_id: &str) -> Result<JobStats, DatabaseError> {
        let (counts, total_words) = job_repo::stats(&self.db, owner_id)?;

        let mut by_status: BTreeMap<String, u64> = [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ]
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();

        let mut total_jobs = 0;
        for (status, count) in counts {
            total_jobs += count;
            *by_status.entry(status).or_insert(0) += count;
        }

        Ok(JobStats {
            total_jobs,
            total_words,
            by_status,
        })
    }
}

// ── Row conversion ──────────────────────────────────────────────────────────

fn parse_status(s: &str, job_id: &str) -> Result<JobStatus, DatabaseError> {
    JobStatus::parse(s).ok_or_else(|| {
        log::warn!("Unknown job status '{}' for job {}", s, job_id);
        DatabaseError::Corrupt {
            table: "generation_jobs",
            id: job_id.to_string(),
            reason: format!("unknown status '{}'", s),
        }
    })
}

fn timestamp_or_now(value: &str, job_id: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap_or_else(|| {
        log::warn!("Job {} has unparseable timestamp '{}'", job_id, value);
        Utc::now()
    })
}

fn job_from_row(row: &JobRow) -> Result<GenerationJob, DatabaseError> {
    let status = parse_status(&row.status, &row.id)?;
    let topics: Vec<Topic> = serde_json::from_str(&row.topics).map_err(|e| corrupt(&row.id, e))?;

    let artifacts = match (&row.primary_path, &row.converted_path) {
        (Some(primary), Some(converted)) => Some(JobArtifacts {
            primary_path: PathBuf::from(primary),
            converted_path: PathBuf::from(converted),
        }),
        _ => None,
    };

    Ok(GenerationJob {
        id: row.id.clone(),
        owner_id: row.owner_id.clone(),
        template_id: row.template_id.clone(),
        topics,
        requested_pages: u32::try_from(row.requested_pages).unwrap_or(0),
        status,
        generated: Vec::new(),
        artifacts,
        metadata: JobMetadata {
            total_word_count: row.total_word_count.max(0) as u64,
            generation_time_ms: row.generation_time_ms.max(0) as u64,
            error: row.error.clone(),
        },
        created_at: timestamp_or_now(&row.created_at, &row.id),
        completed_at: row
            .completed_at
            .as_deref()
            .map(|ts| timestamp_or_now(ts, &row.id)),
    })
}

fn section_from_row(row: SectionRow) -> GeneratedSection {
    GeneratedSection {
        section_name: row.section_name,
        topic_index: row.topic_index.max(0) as usize,
        content: row.content,
        word_count: u32::try_from(row.word_count).unwrap_or(u32::MAX),
    }
}

fn corrupt(id: &str, e: serde_json::Error) -> DatabaseError {
    DatabaseError::Corrupt {
        table: "generation_jobs",
        id: id.to_string(),
        reason: e.to_string(),
    }
}

/// Status strings a job may hold right before moving to `to`.
fn sources(to: JobStatus) -> Vec<&'static str> {
    to.allowed_predecessors().iter().map(JobStatus::as_str).collect()
}
