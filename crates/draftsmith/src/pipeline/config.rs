use std::time::Duration;

use crate::config::Config;

pub struct PipelineConfig {
    /// Minimum spacing between the starts of two provider calls.
    pub min_call_interval: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_call_interval: config.generation.min_call_interval(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_call_interval: Duration::ZERO,
        }
    }
}
