//! Background worker draining the email job queue.
//!
//! The queue is small (three email job types on a single server), so the
//! loop stays simple: claim one job, run its registered handler under a
//! concurrency permit, record the outcome. The worker only sleeps when the
//! queue is empty; a successful claim immediately tries for the next job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch, Semaphore};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hearth_core::defaults::{
    EVENT_BUS_CAPACITY, JOB_MAX_CONCURRENT, JOB_POLL_INTERVAL_MS, JOB_TIMEOUT_SECS,
};
use hearth_core::{Job, JobRepository, JobType};
use hearth_db::Database;

use crate::handler::{JobContext, JobHandler, JobResult};

/// Worker tuning.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | `JOB_WORKER_ENABLED` | `true` | `false`/`0` disables processing |
/// | `JOB_MAX_CONCURRENT` | `2` | jobs executing at once |
/// | `JOB_POLL_INTERVAL_MS` | `1000` | sleep between polls of an empty queue |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub max_concurrent: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: JOB_MAX_CONCURRENT,
            poll_interval: Duration::from_millis(JOB_POLL_INTERVAL_MS),
        }
    }
}

impl WorkerConfig {
    /// Read worker settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            enabled: std::env::var("JOB_WORKER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(base.enabled),
            max_concurrent: std::env::var("JOB_MAX_CONCURRENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.max_concurrent)
                .max(1),
            poll_interval: std::env::var("JOB_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(base.poll_interval),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Lifecycle notifications, broadcast to any interested subscriber.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    WorkerStarted,
    WorkerStopped,
    JobStarted {
        job_id: Uuid,
        job_type: JobType,
    },
    JobCompleted {
        job_id: Uuid,
        job_type: JobType,
    },
    JobFailed {
        job_id: Uuid,
        job_type: JobType,
        error: String,
    },
}

/// Control handle for a started worker.
pub struct WorkerHandle {
    stop: watch::Sender<bool>,
    events: broadcast::Sender<WorkerEvent>,
}

impl WorkerHandle {
    /// Request shutdown. The worker stops claiming new jobs; jobs already
    /// executing run to completion.
    pub fn shutdown(&self) {
        let _ = self.stop.send(true);
    }

    /// Subscribe to worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }
}

/// Processes queued jobs with the handlers registered at build time.
pub struct JobWorker {
    jobs: Arc<dyn JobRepository>,
    config: WorkerConfig,
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
    events: broadcast::Sender<WorkerEvent>,
}

impl JobWorker {
    /// Subscribe to worker events before the worker starts.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    /// Spawn the processing loop and return its control handle.
    pub fn start(self) -> WorkerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let events = self.events.clone();
        tokio::spawn(self.run(stop_rx));
        WorkerHandle {
            stop: stop_tx,
            events,
        }
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        if !self.config.enabled {
            info!(subsystem = "jobs", "Job worker disabled by configuration");
            return;
        }

        info!(
            subsystem = "jobs",
            max_concurrent = self.config.max_concurrent,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Job worker running"
        );
        let _ = self.events.send(WorkerEvent::WorkerStarted);

        // The permit is held for the lifetime of one job execution, so at
        // most max_concurrent jobs run at a time.
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let worker = Arc::new(self);

        loop {
            if *stop.borrow() {
                break;
            }
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };

            match worker.jobs.claim_next().await {
                Ok(Some(job)) => {
                    let runner = worker.clone();
                    tokio::spawn(async move {
                        runner.process(job).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = stop.changed() => {}
                        _ = sleep(worker.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(subsystem = "jobs", error = %e, "Claiming a job failed");
                    tokio::select! {
                        _ = stop.changed() => {}
                        _ = sleep(worker.config.poll_interval) => {}
                    }
                }
            }
        }

        let _ = worker.events.send(WorkerEvent::WorkerStopped);
        info!(subsystem = "jobs", "Job worker stopped");
    }

    /// Run one claimed job and record its outcome.
    async fn process(&self, job: Job) {
        let started = Instant::now();
        let job_id = job.id;
        let job_type = job.job_type;
        let attempt = job.attempts;

        let _ = self
            .events
            .send(WorkerEvent::JobStarted { job_id, job_type });

        let outcome = match self.handlers.get(&job_type) {
            Some(handler) => {
                let budget = Duration::from_secs(JOB_TIMEOUT_SECS);
                match timeout(budget, handler.execute(JobContext::new(job))).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        JobResult::Failed(format!("timed out after {}s", JOB_TIMEOUT_SECS))
                    }
                }
            }
            None => JobResult::Failed(format!("no handler registered for {:?}", job_type)),
        };

        match outcome {
            JobResult::Success => {
                if let Err(e) = self.jobs.complete(job_id).await {
                    error!(
                        subsystem = "jobs",
                        job_id = %job_id,
                        error = %e,
                        "Recording job completion failed"
                    );
                    return;
                }
                debug!(
                    subsystem = "jobs",
                    job_id = %job_id,
                    ?job_type,
                    attempt,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                );
                let _ = self
                    .events
                    .send(WorkerEvent::JobCompleted { job_id, job_type });
            }
            JobResult::Failed(reason) | JobResult::Retry(reason) => {
                if let Err(e) = self.jobs.fail(job_id, &reason).await {
                    error!(
                        subsystem = "jobs",
                        job_id = %job_id,
                        error = %e,
                        "Recording job failure failed"
                    );
                    return;
                }
                warn!(
                    subsystem = "jobs",
                    job_id = %job_id,
                    ?job_type,
                    attempt,
                    reason = %reason,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Job failed"
                );
                let _ = self.events.send(WorkerEvent::JobFailed {
                    job_id,
                    job_type,
                    error: reason,
                });
            }
        }
    }
}

/// Assembles a [`JobWorker`] from a job repository and its handlers.
pub struct WorkerBuilder {
    jobs: Arc<dyn JobRepository>,
    config: WorkerConfig,
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl WorkerBuilder {
    /// Build against the application database.
    pub fn new(db: Database) -> Self {
        Self::with_repository(Arc::new(db.jobs))
    }

    /// Build against any job repository.
    pub fn with_repository(jobs: Arc<dyn JobRepository>) -> Self {
        Self {
            jobs,
            config: WorkerConfig::default(),
            handlers: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a handler. A later registration for the same job type wins.
    pub fn with_handler<H: JobHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.insert(handler.job_type(), Arc::new(handler));
        self
    }

    pub fn build(self) -> JobWorker {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        JobWorker {
            jobs: self.jobs,
            config: self.config,
            handlers: self.handlers,
            events,
        }
    }
}
