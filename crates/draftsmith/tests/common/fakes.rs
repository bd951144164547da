//! Stand-ins for the content provider and the document converter.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender};

use draftsmith::assembly::convert::expected_output;
use draftsmith::assembly::AssemblyError;
use draftsmith::{ContentProvider, ContentRequest, DocumentConverter, GenerationError};

/// A provider call as observed by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ContentRequest,
    pub at: Instant,
    /// When the call returned, success or not.
    pub finished: Option<Instant>,
}

/// Returns `<SECTION> of <topic>` padded to the requested word count.
///
/// Can fail at a given call (1-based), take a fixed time per call, and can
/// hold every call until released.
pub struct ScriptedProvider {
    calls: Mutex<Vec<RecordedCall>>,
    fail_at: Option<usize>,
    latency: Duration,
    gate: Option<Gate>,
}

struct Gate {
    entered: Sender<()>,
    release: Receiver<()>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: None,
            latency: Duration::ZERO,
            gate: None,
        }
    }

    /// A provider that takes `latency` to answer every call.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::new()
        }
    }

    pub fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::new()
        }
    }

    /// A provider whose calls block until a unit is sent on `release`.
    /// Every call announces itself on `entered` first.
    pub fn gated(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            gate: Some(Gate { entered, release }),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ContentRequest) -> Result<String, GenerationError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                request: request.clone(),
                at: Instant::now(),
                finished: None,
            });
            calls.len()
        };

        if let Some(gate) = &self.gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv_timeout(Duration::from_secs(30));
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = self.respond(call, request);
        self.calls.lock().unwrap()[call - 1].finished = Some(Instant::now());
        result
    }
}

impl ScriptedProvider {
    fn respond(&self, call: usize, request: &ContentRequest) -> Result<String, GenerationError> {
        if self.fail_at == Some(call) {
            return Err(GenerationError::Provider {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }

        let head = format!("{} of {}", request.section, request.topic);
        let head_words = head.split_whitespace().count() as u32;
        let padding = request.word_count.saturating_sub(head_words) as usize;
        Ok(format!("{}{}", head, " lorem".repeat(padding)))
    }
}

/// Writes a small file where the real converter would put its output.
pub struct FakeConverter;

#[async_trait]
impl DocumentConverter for FakeConverter {
    fn target_extension(&self) -> &str {
        "pdf"
    }

    async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
        let out = expected_output(source, output_dir, "pdf");
        std::fs::write(&out, b"%PDF-1.4 fake").map_err(|e| AssemblyError::ConversionFailed(e.to_string()))?;
        Ok(out)
    }
}

/// Reports success but produces nothing.
pub struct NoOutputConverter;

#[async_trait]
impl DocumentConverter for NoOutputConverter {
    fn target_extension(&self) -> &str {
        "pdf"
    }

    async fn convert(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
        Ok(expected_output(source, output_dir, "pdf"))
    }
}
