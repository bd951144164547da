//! Boundary payloads, validated once into typed values.

use serde::Deserialize;

use super::job::{FormatStyle, Topic};
use crate::error::ValidationError;

pub const MIN_TOPICS: usize = 1;
pub const MAX_TOPICS: usize = 10;
pub const MAX_TOPIC_NAME_CHARS: usize = 200;
pub const MIN_PAGES: u32 = 1;
pub const MAX_PAGES: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    pub name: String,
    pub style: FormatStyle,
}

/// A generation request as received from a caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub template_id: String,
    pub topics: Vec<TopicRequest>,
    pub requested_pages: u32,
}

/// A request that passed validation. Topic names are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub template_id: String,
    pub topics: Vec<Topic>,
    pub requested_pages: u32,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let template_id = self.template_id.trim();
        if template_id.is_empty() {
            return Err(ValidationError::MissingTemplateId);
        }

        if self.topics.len() < MIN_TOPICS {
            return Err(ValidationError::NoTopics);
        }
        if self.topics.len() > MAX_TOPICS {
            return Err(ValidationError::TooManyTopics {
                count: self.topics.len(),
                max: MAX_TOPICS,
            });
        }

        let mut topics = Vec::with_capacity(self.topics.len());
        for (index, topic) in self.topics.iter().enumerate() {
            let name = topic.name.trim();
            if name.is_empty() {
                return Err(ValidationError::TopicName {
                    index,
                    reason: "name is required".to_string(),
                });
            }
            let chars = name.chars().count();
            if chars > MAX_TOPIC_NAME_CHARS {
                return Err(ValidationError::TopicName {
                    index,
                    reason: format!(
                        "name must be at most {} characters (got {})",
                        MAX_TOPIC_NAME_CHARS, chars
                    ),
                });
            }
            topics.push(Topic {
                name: name.to_string(),
                style: topic.style,
            });
        }

        if !(MIN_PAGES..=MAX_PAGES).contains(&self.requested_pages) {
            return Err(ValidationError::PageCount {
                pages: self.requested_pages,
                min: MIN_PAGES,
                max: MAX_PAGES,
            });
        }

        Ok(ValidatedRequest {
            template_id: template_id.to_string(),
            topics,
            requested_pages: self.requested_pages,
        })
    }
}

/// Page selection for the history listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl HistoryQuery {
    pub fn new(page: u32, limit: u32) -> Result<Self, ValidationError> {
        if page < 1 {
            return Err(ValidationError::Pagination {
                reason: "page must be at least 1".to_string(),
            });
        }
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(ValidationError::Pagination {
                reason: format!("limit must be between 1 and {}", MAX_HISTORY_LIMIT),
            });
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(topics: usize, pages: u32) -> GenerationRequest {
        GenerationRequest {
            template_id: "tpl-1".to_string(),
            topics: (0..topics)
                .map(|i| TopicRequest {
                    name: format!("Topic {}", i),
                    style: FormatStyle::Paragraph,
                })
                .collect(),
            requested_pages: pages,
        }
    }

    #[test]
    fn test_valid_request() {
        let validated = request(3, 2).validate().unwrap();
        assert_eq!(validated.topics.len(), 3);
        assert_eq!(validated.requested_pages, 2);
    }

    #[test]
    fn test_topic_count_bounds() {
        assert_eq!(request(0, 1).validate(), Err(ValidationError::NoTopics));
        assert!(request(10, 1).validate().is_ok());
        assert_eq!(
            request(11, 1).validate(),
            Err(ValidationError::TooManyTopics { count: 11, max: 10 })
        );
    }

    #[test]
    fn test_page_bounds() {
        assert!(request(1, 1).validate().is_ok());
        assert!(request(1, 50).validate().is_ok());
        assert!(matches!(
            request(1, 0).validate(),
            Err(ValidationError::PageCount { pages: 0, .. })
        ));
        assert!(matches!(
            request(1, 51).validate(),
            Err(ValidationError::PageCount { pages: 51, .. })
        ));
    }

    #[test]
    fn test_topic_name_trimmed_and_bounded() {
        let mut req = request(1, 1);
        req.topics[0].name = "   ".to_string();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::TopicName { index: 0, .. })
        ));

        req.topics[0].name = "  Photosynthesis  ".to_string();
        assert_eq!(req.validate().unwrap().topics[0].name, "Photosynthesis");

        req.topics[0].name = "x".repeat(200);
        assert!(req.validate().is_ok());
        req.topics[0].name = "x".repeat(201);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_missing_template_id() {
        let mut req = request(1, 1);
        req.template_id = " ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::MissingTemplateId));
    }

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let json = r#"{"templateId":"t","topics":[{"name":"A","style":"bullets-and-paragraph"}],"requestedPages":3}"#;
        let req: GenerationRequest = serde_json::from_str(json).unwrap();
        let validated = req.validate().unwrap();
        assert_eq!(validated.topics[0].style, FormatStyle::BulletsAndParagraph);
    }

    #[test]
    fn test_history_query_bounds() {
        assert!(HistoryQuery::new(0, 10).is_err());
        assert!(HistoryQuery::new(1, 0).is_err());
        assert!(HistoryQuery::new(1, 101).is_err());
        let q = HistoryQuery::new(3, 20).unwrap();
        assert_eq!(q.offset(), 40);
    }
}
