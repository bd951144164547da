use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::WorkerError;
use crate::model::{GenerationJob, JobArtifacts, JobMetadata, JobStatus};

/// A queued job plus the channel its outcome is reported on.
#[derive(Debug)]
pub struct GenerationTask {
    pub job: GenerationJob,
    reply: Sender<JobOutcome>,
}

impl GenerationTask {
    /// Creates a task and the handle that will receive its outcome.
    pub fn new(job: GenerationJob) -> (Self, JobHandle) {
        let (reply, receiver) = bounded(1);
        let handle = JobHandle {
            job_id: job.id.clone(),
            receiver,
        };
        (Self { job, reply }, handle)
    }

    /// Reports the outcome. A dropped handle is fine; nobody was waiting.
    pub fn finish(self, outcome: JobOutcome) {
        if self.reply.send(outcome).is_err() {
            log::debug!("No one is waiting on job {}", self.job.id);
        }
    }
}

/// Final state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    pub artifacts: Option<JobArtifacts>,
    pub error: Option<String>,
    pub total_word_count: u64,
    pub generation_time_ms: u64,
}

impl JobOutcome {
    pub fn completed(job_id: &str, artifacts: Option<JobArtifacts>, metadata: &JobMetadata) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Completed,
            artifacts,
            error: None,
            total_word_count: metadata.total_word_count,
            generation_time_ms: metadata.generation_time_ms,
        }
    }

    pub fn failed(job_id: &str, error: &str, total_word_count: u64, generation_time_ms: u64) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            artifacts: None,
            error: Some(error.to_string()),
            total_word_count,
            generation_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Lets a caller block until a submitted job reaches a terminal status.
///
/// Dropping the handle does not affect the job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: String,
    receiver: Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn wait(self) -> Result<JobOutcome, WorkerError> {
        self.receiver.recv().map_err(|_| WorkerError::ChannelClosed)
    }

    /// `Ok(None)` when the job is still running after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<JobOutcome>, WorkerError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::ChannelClosed),
        }
    }
}
