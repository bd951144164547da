use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::model::GenerationJob;
use crate::pipeline::GenerationPipeline;
use crate::worker::job::{GenerationTask, JobHandle};

const SHUTDOWN_REASON: &str = "Generation service shut down before the job started";

/// Fixed set of worker threads draining a bounded job queue.
///
/// Each worker runs its jobs on its own single-threaded runtime, one job at
/// a time. Submission never blocks: a full queue is reported as
/// [`WorkerError::QueueFull`].
pub struct WorkerPool {
    task_sender: Sender<GenerationTask>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        pipeline: Arc<GenerationPipeline>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }
        let (task_sender, task_receiver) = bounded::<GenerationTask>(queue_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let spawned = thread::Builder::new()
                .name(format!("draftsmith-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, task_rx, shutdown_flag, worker_pipeline);
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shutdown.store(true, Ordering::Relaxed);
                    return Err(WorkerError::SpawnFailed(e.to_string()));
                }
            }
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            task_sender,
            workers,
            shutdown,
        })
    }

    /// Queues a job and returns a handle to its outcome.
    pub fn submit(&self, job: GenerationJob) -> Result<JobHandle, WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let (task, handle) = GenerationTask::new(job);
        match self.task_sender.try_send(task) {
            Ok(()) => Ok(handle),
            Err(TrySendError::Full(_)) => Err(WorkerError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(WorkerError::ChannelClosed),
        }
    }

    pub fn queued(&self) -> usize {
        self.task_sender.len()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<GenerationTask>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<GenerationPipeline>,
) {
    debug!("Worker {} started", worker_id);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Worker {} failed to build runtime: {}", worker_id, e);
            drain(&task_receiver, &pipeline);
            return;
        }
    };

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            drain(&task_receiver, &pipeline);
            break;
        }

        match task_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(task) => {
                debug!("Worker {} processing job {}", worker_id, task.job.id);
                let outcome = rt.block_on(pipeline.run(task.job.clone()));
                task.finish(outcome);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Fails every job still queued so none is left `pending`.
fn drain(task_receiver: &Receiver<GenerationTask>, pipeline: &GenerationPipeline) {
    while let Ok(task) = task_receiver.try_recv() {
        let outcome = pipeline.abandon(&task.job, SHUTDOWN_REASON);
        task.finish(outcome);
    }
}
