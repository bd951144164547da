use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How generated content for a topic should be laid out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FormatStyle {
    #[serde(rename = "bullets")]
    Bullets,
    #[serde(rename = "bullets-paragraph", alias = "bullets-and-paragraph")]
    BulletsAndParagraph,
    #[serde(rename = "paragraph")]
    Paragraph,
}

impl FormatStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatStyle::Bullets => "bullets",
            FormatStyle::BulletsAndParagraph => "bullets-paragraph",
            FormatStyle::Paragraph => "paragraph",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bullets" => Some(FormatStyle::Bullets),
            "bullets-paragraph" | "bullets-and-paragraph" => Some(FormatStyle::BulletsAndParagraph),
            "paragraph" => Some(FormatStyle::Paragraph),
            _ => None,
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub style: FormatStyle,
}

/// Job lifecycle: `pending -> processing -> completed | failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// States a job may be in immediately before moving to `self`.
    /// The job store builds its SQL status guards from this table.
    pub fn allowed_predecessors(&self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[],
            JobStatus::Processing => &[JobStatus::Pending],
            JobStatus::Completed => &[JobStatus::Processing],
            // A job that could not be dispatched fails straight from pending.
            JobStatus::Failed => &[JobStatus::Pending, JobStatus::Processing],
        }
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        next.allowed_predecessors().contains(self)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one content acquisition call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSection {
    pub section_name: String,
    /// Index into the job's topic list.
    pub topic_index: usize,
    pub content: String,
    pub word_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    pub total_word_count: u64,
    pub generation_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// References to the two artifacts of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobArtifacts {
    pub primary_path: PathBuf,
    pub converted_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: String,
    pub owner_id: String,
    pub template_id: String,
    pub topics: Vec<Topic>,
    pub requested_pages: u32,
    pub status: JobStatus,
    #[serde(default)]
    pub generated: Vec<GeneratedSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<JobArtifacts>,
    pub metadata: JobMetadata,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    /// A freshly accepted job in `pending`.
    pub fn pending(
        owner_id: &str,
        template_id: &str,
        topics: Vec<Topic>,
        requested_pages: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            template_id: template_id.to_string(),
            topics,
            requested_pages,
            status: JobStatus::Pending,
            generated: Vec::new(),
            artifacts: None,
            metadata: JobMetadata::default(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn summary(&self, template_name: Option<String>) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            template_id: self.template_id.clone(),
            template_name,
            topics: self.topics.clone(),
            requested_pages: self.requested_pages,
            status: self.status,
            metadata: self.metadata.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Requested artifact of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The filled template in its original format.
    Primary,
    /// The converted distributable document.
    Converted,
}

/// History row: a job without its generated content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    pub topics: Vec<Topic>,
    pub requested_pages: u32,
    pub status: JobStatus,
    pub metadata: JobMetadata,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHistory {
    pub jobs: Vec<JobSummary>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: u64,
    pub total_words: u64,
    pub by_status: BTreeMap<String, u64>,
}
