//! Content acquisition from an external text generator.

pub mod adapter;
pub mod client;
pub mod error;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::FormatStyle;

pub use adapter::{count_words, AcquiredContent, ContentAcquirer};
pub use client::GeminiClient;
pub use error::GenerationError;

/// What to write for one (topic, section) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub topic: String,
    pub section: String,
    pub style: FormatStyle,
    pub word_count: u32,
}

/// A text generator. Implementations must not retry internally.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Returns the raw generated text for one request.
    async fn generate(&self, request: &ContentRequest) -> Result<String, GenerationError>;
}
