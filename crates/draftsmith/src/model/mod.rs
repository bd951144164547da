pub mod job;
pub mod request;
pub mod template;

pub use job::{
    ArtifactKind, FormatStyle, GeneratedSection, GenerationJob, JobArtifacts, JobHistory,
    JobMetadata, JobStats, JobStatus, JobSummary, Topic,
};
pub use request::{GenerationRequest, HistoryQuery, TopicRequest, ValidatedRequest};
pub use template::{MarkerSyntax, Section, Template, TemplateFormat, TemplateUsage};
