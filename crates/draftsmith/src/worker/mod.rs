pub mod job;
pub mod pool;

pub use job::{GenerationTask, JobHandle, JobOutcome};
pub use pool::WorkerPool;
