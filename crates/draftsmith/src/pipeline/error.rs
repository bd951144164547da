use thiserror::Error;

use crate::assembly::AssemblyError;
use crate::db::DatabaseError;
use crate::generation::GenerationError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Template '{0}' no longer exists")]
    TemplateMissing(String),

    #[error("Generation failed for section {section} of topic '{topic}': {source}")]
    Generation {
        topic: String,
        section: String,
        #[source]
        source: GenerationError,
    },

    #[error("Document assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Job store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("Job '{0}' is no longer processing")]
    TransitionRejected(String),
}
