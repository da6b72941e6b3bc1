//! Bounded-concurrency work queue with retry and backoff.
//!
//! Tasks are synchronous closures run on tokio's blocking pool. At most
//! `concurrency` tasks execute at once; a failed attempt is retried after an
//! exponentially growing, jittered delay when the error is retryable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{Result, ScrubError};

/// Default number of tasks run at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// When and how often failed tasks are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per task, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
    /// Maximum random extra delay as a fraction of the computed delay.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Run every task exactly once.
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before the next attempt after `failed` attempts (1-based).
    pub fn delay_for(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1 << exponent);
        let extra = delay.mul_f64(self.jitter.clamp(0.0, 1.0) * fastrand::f64());
        delay + extra
    }
}

/// Runs blocking tasks with bounded concurrency.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    permits: Arc<Semaphore>,
    concurrency: usize,
    retry: RetryPolicy,
}

impl WorkQueue {
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run every task and return their outcomes in submission order.
    pub async fn run_all<T, F>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        let handles: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                let permits = Arc::clone(&self.permits);
                let retry = self.retry.clone();
                tokio::spawn(run_with_retry(index, Arc::new(task), permits, retry))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ScrubError::Queue(format!("Worker failed: {}", e))),
            });
        }
        outcomes
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

async fn run_with_retry<T, F>(
    index: usize,
    task: Arc<F>,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
) -> Result<T>
where
    T: Send + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
{
    let attempts = retry.attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = {
            let _permit = permits
                .acquire()
                .await
                .map_err(|e| ScrubError::Queue(format!("Queue closed: {}", e)))?;
            let task = Arc::clone(&task);
            tokio::task::spawn_blocking(move || task())
                .await
                .map_err(|e| ScrubError::Queue(format!("Task {} panicked: {}", index, e)))?
        };

        match outcome {
            Ok(value) => {
                debug!(task = index, attempt, "Task finished");
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                let delay = retry.delay_for(attempt);
                warn!(task = index, attempt, error = %e, ?delay, "Task failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
