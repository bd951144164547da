//! Test harness for isolated service execution.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use draftsmith::config::load_config_from_str;
use draftsmith::model::{FormatStyle, GenerationRequest, TopicRequest};
use draftsmith::{Config, ContentProvider, Database, DocumentConverter, DocumentService};

/// Isolated storage root and database for one test.
pub struct TestHarness {
    temp_dir: TempDir,
    pub storage_dir: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage_dir = temp_dir.path().join("storage");
        let db = Database::open(&temp_dir.path().join("data").join("draftsmith.db"))
            .expect("Failed to open database");

        Self {
            temp_dir,
            storage_dir,
            db,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config with an inline key and no pause between provider calls.
    pub fn config(&self, worker_count: usize, queue_capacity: usize, min_call_interval_ms: u64) -> Config {
        let json = serde_json::json!({
            "version": "1.0",
            "storage_directory": self.storage_dir.to_string_lossy(),
            "worker_count": worker_count,
            "queue_capacity": queue_capacity,
            "generation": {
                "api_key": "test-key",
                "min_call_interval_ms": min_call_interval_ms
            }
        });
        load_config_from_str(&json.to_string()).expect("Test config should be valid")
    }

    pub fn service(
        &self,
        provider: Arc<dyn ContentProvider>,
        converter: Arc<dyn DocumentConverter>,
    ) -> DocumentService {
        self.service_with(&self.config(2, 16, 0), provider, converter)
    }

    pub fn service_with(
        &self,
        config: &Config,
        provider: Arc<dyn ContentProvider>,
        converter: Arc<dyn DocumentConverter>,
    ) -> DocumentService {
        DocumentService::new(config, self.db.clone(), provider, converter)
            .expect("Failed to build service")
    }

    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// Builds a minimal DOCX archive around WordprocessingML paragraphs.
pub fn docx_bytes(paragraphs: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    write!(
        zip,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        paragraphs
    )
    .unwrap();
    zip.finish().unwrap().into_inner()
}

/// One paragraph per line of `text`.
pub fn docx_paragraphs(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", line))
        .collect()
}

pub fn request(template_id: &str, topics: &[&str], style: FormatStyle, pages: u32) -> GenerationRequest {
    GenerationRequest {
        template_id: template_id.to_string(),
        topics: topics
            .iter()
            .map(|name| TopicRequest {
                name: name.to_string(),
                style,
            })
            .collect(),
        requested_pages: pages,
    }
}

pub const WAIT: Duration = Duration::from_secs(30);
