use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::JobStatus;

#[derive(Error, Debug)]
pub enum DraftsmithError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Document is {status}")]
    NotReady { status: JobStatus },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Content provider error: {0}")]
    Generation(#[from] crate::generation::GenerationError),
}

impl DraftsmithError {
    pub fn template_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: ResourceKind::Template,
            id: id.to_string(),
        }
    }

    pub fn job_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: ResourceKind::Job,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Template,
    Job,
    Artifact,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Template => write!(f, "Template"),
            ResourceKind::Job => write!(f, "Job"),
            ResourceKind::Artifact => write!(f, "Artifact"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("No section placeholders detected in template. Use {{{{SECTION}}}} format.")]
    NoPlaceholdersFound,

    #[error("Unsupported template format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read template '{path}': {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract template text: {0}")]
    Extraction(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Template ID is required")]
    MissingTemplateId,

    #[error("At least one topic is required")]
    NoTopics,

    #[error("Cannot exceed {max} topics (got {count})")]
    TooManyTopics { count: usize, max: usize },

    #[error("Topic {index}: {reason}")]
    TopicName { index: usize, reason: String },

    #[error("Requested pages must be between {min} and {max} (got {pages})")]
    PageCount { pages: u32, min: u32, max: u32 },

    #[error("Invalid pagination: {reason}")]
    Pagination { reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Generation queue is full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, DraftsmithError>;
