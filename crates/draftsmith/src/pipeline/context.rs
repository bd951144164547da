use std::time::Instant;

use crate::budget::SectionBudget;
use crate::model::{GeneratedSection, GenerationJob, JobArtifacts, Template};

pub struct PipelineContext {
    // Input
    pub job: GenerationJob,
    pub started: Instant,

    // Step 1 result, guaranteed Some after step_load_template
    pub template: Option<Template>,

    // Step 2 result
    pub budgets: Vec<SectionBudget>,

    // Step 3 result, in generation order
    pub generated: Vec<GeneratedSection>,

    // Step 4 result
    pub artifacts: Option<JobArtifacts>,
}

impl PipelineContext {
    pub fn new(job: GenerationJob) -> Self {
        Self {
            job,
            started: Instant::now(),
            template: None,
            budgets: Vec::new(),
            generated: Vec::new(),
            artifacts: None,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn total_word_count(&self) -> u64 {
        self.generated.iter().map(|s| u64::from(s.word_count)).sum()
    }
}
