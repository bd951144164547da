pub mod job_store;
pub mod template_store;

pub use job_store::{JobStore, JobUpdate};
pub use template_store::TemplateStore;
