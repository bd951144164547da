//! Template analysis: text extraction, section detection and ingestion.

pub mod detector;
pub mod extract;
pub mod ingest;

pub use detector::{detect_placeholders, detect_sections};
pub use extract::extract_text;
pub use ingest::{analyze, TemplateAnalysis, TemplateIngestor};
