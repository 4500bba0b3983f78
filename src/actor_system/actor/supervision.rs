//! Supervision strategies applied when an actor fails to start.

use std::time::Duration;

use backoff::backoff::Backoff as InnerBackoff;

/// Defines what to do when an actor fails at startup.
#[derive(Debug)]
pub enum SupervisionStrategy {
    Stop,
    Retry(Box<dyn RetryStrategy>),
}

/// Trait to define a retry strategy.
pub trait RetryStrategy: std::fmt::Debug + Send + Sync {
    /// Maximum number of tries before permanently failing an actor.
    fn max_retries(&self) -> usize;
    /// Wait duration before retrying.
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// Retries immediately.
#[derive(Debug, Default)]
pub struct NoIntervalStrategy {
    max_retries: usize,
}

impl NoIntervalStrategy {
    pub fn new(max_retries: usize) -> Self {
        NoIntervalStrategy { max_retries }
    }
}

impl RetryStrategy for NoIntervalStrategy {
    fn max_retries(&self) -> usize {
        self.max_retries
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        None
    }
}

/// Retries after a fixed wait.
#[derive(Debug, Default)]
pub struct FixedIntervalStrategy {
    max_retries: usize,
    duration: Duration,
}

impl FixedIntervalStrategy {
    pub fn new(max_retries: usize, duration: Duration) -> Self {
        FixedIntervalStrategy {
            max_retries,
            duration,
        }
    }
}

impl RetryStrategy for FixedIntervalStrategy {
    fn max_retries(&self) -> usize {
        self.max_retries
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        Some(self.duration)
    }
}

/// Retries with exponentially growing, jittered waits.
#[derive(Debug)]
pub struct ExponentialBackoffStrategy {
    max_retries: usize,
    inner: backoff::ExponentialBackoff,
}

impl ExponentialBackoffStrategy {
    pub fn new(max_retries: usize) -> Self {
        Self::with_intervals(max_retries, Duration::from_millis(50), Duration::from_secs(5))
    }

    pub fn with_intervals(max_retries: usize, initial: Duration, max: Duration) -> Self {
        let inner = backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(initial)
            .with_max_interval(max)
            .with_max_elapsed_time(None)
            .build();
        ExponentialBackoffStrategy { max_retries, inner }
    }
}

impl RetryStrategy for ExponentialBackoffStrategy {
    fn max_retries(&self) -> usize {
        self.max_retries
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.inner.next_backoff()
    }
}
