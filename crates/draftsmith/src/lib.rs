//! Template-driven document generation.
//!
//! A template is uploaded once and scanned for section markers. A generation
//! request names a template, one or more topics and a page count; the page
//! count becomes a word budget split across the sections, every
//! (topic, section) pair is written by the content provider, and the results
//! are filled into the template and converted for distribution. Jobs run on
//! a background worker pool and move through
//! `pending -> processing -> completed | failed`.

pub mod assembly;
pub mod budget;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod model;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod template;
pub mod worker;

pub use assembly::{DocumentAssembler, DocumentConverter, LibreOfficeConverter};
pub use budget::{allocate, words_for_pages, SectionBudget, WORDS_PER_PAGE};
pub use config::{load_config, Config};
pub use db::Database;
pub use error::{DraftsmithError, Result};
pub use generation::{ContentProvider, ContentRequest, GeminiClient, GenerationError};
pub use model::{
    ArtifactKind, FormatStyle, GenerationJob, GenerationRequest, HistoryQuery, JobStatus,
    Template, TemplateFormat, TopicRequest,
};
pub use service::{DocumentService, GenerationAccepted};
pub use telemetry::init_logging;
pub use template::{detect_placeholders, detect_sections};
pub use worker::{JobHandle, JobOutcome};
