use std::sync::Arc;

use super::{ContentProvider, ContentRequest, GenerationError};

/// Provider output with its measured length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredContent {
    pub content: String,
    pub word_count: u32,
}

/// Whitespace-delimited token count.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Boundary to the content provider: one call per request, no retries.
#[derive(Clone)]
pub struct ContentAcquirer {
    provider: Arc<dyn ContentProvider>,
}

impl ContentAcquirer {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    pub async fn acquire(&self, request: &ContentRequest) -> Result<AcquiredContent, GenerationError> {
        log::info!(
            "Requesting {} words for section {} of '{}' from {}",
            request.word_count,
            request.section,
            request.topic,
            self.provider.name()
        );

        let raw = self.provider.generate(request).await.map_err(|e| {
            log::error!(
                "Content generation failed for section {} of '{}': {}",
                request.section,
                request.topic,
                e
            );
            e
        })?;

        let content = raw.trim();
        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        let word_count = count_words(content);

        log::info!(
            "Generated section {} of '{}': {} words (target {})",
            request.section,
            request.topic,
            word_count,
            request.word_count
        );

        Ok(AcquiredContent {
            content: content.to_string(),
            word_count,
        })
    }
}
