//! Batch execution reporting

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::task::TaskId;

/// Events emitted during a processor run
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A run is starting
    RunStarted { tasks: usize },
    /// A batch is being handed to the handler
    BatchFlushed { batch: usize, size: usize },
    /// The handler returned successfully
    BatchCompleted {
        batch: usize,
        size: usize,
        unresolved: usize,
        duration: Duration,
    },
    /// The handler failed, panicked or timed out
    BatchFailed {
        batch: usize,
        size: usize,
        failed: usize,
        error: String,
        duration: Duration,
    },
    /// A task body returned a value
    TaskCompleted { id: TaskId },
    /// A task ended with a failure
    TaskFailed { id: TaskId, error: String },
    /// All tasks finished
    AllCompleted {
        tasks: usize,
        succeeded: usize,
        failed: usize,
        batches: usize,
        requests: usize,
        duration: Duration,
    },
}

/// Trait for observing batch execution
pub trait BatchReporter: Send + Sync {
    /// Handle a batch event
    fn report(&self, event: &BatchEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl BatchReporter for TracingReporter {
    fn report(&self, event: &BatchEvent) {
        match event {
            BatchEvent::RunStarted { tasks } => {
                tracing::debug!(tasks, "starting batch run");
            }
            BatchEvent::BatchFlushed { batch, size } => {
                tracing::debug!(batch, size, "flushing batch");
            }
            BatchEvent::BatchCompleted {
                batch,
                size,
                unresolved,
                duration,
            } => {
                if *unresolved > 0 {
                    tracing::warn!(
                        batch,
                        size,
                        unresolved,
                        "batch handler left requests unresolved"
                    );
                } else {
                    tracing::debug!(
                        batch,
                        size,
                        "batch completed in {:.3}s",
                        duration.as_secs_f64()
                    );
                }
            }
            BatchEvent::BatchFailed {
                batch,
                size,
                failed,
                error,
                duration,
            } => {
                tracing::warn!(
                    batch,
                    size,
                    failed,
                    "batch failed after {:.3}s: {}",
                    duration.as_secs_f64(),
                    error
                );
            }
            BatchEvent::TaskCompleted { id } => {
                tracing::trace!(task = %id, "task completed");
            }
            BatchEvent::TaskFailed { id, error } => {
                tracing::debug!(task = %id, %error, "task failed");
            }
            BatchEvent::AllCompleted {
                tasks,
                succeeded,
                failed,
                batches,
                requests,
                duration,
            } => {
                tracing::debug!(
                    tasks,
                    succeeded,
                    failed,
                    batches,
                    requests,
                    "batch run complete in {:.3}s",
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<BatchEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<BatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sizes of the batches flushed so far, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                BatchEvent::BatchFlushed { size, .. } => Some(*size),
                _ => None,
            })
            .collect()
    }
}

impl BatchReporter for CollectingReporter {
    fn report(&self, event: &BatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Registry of batch reporters
pub struct BatchReporterRegistry {
    reporters: Vec<Arc<dyn BatchReporter>>,
}

impl BatchReporterRegistry {
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register<R: BatchReporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Arc::new(reporter));
    }

    pub fn register_shared(&mut self, reporter: Arc<dyn BatchReporter>) {
        self.reporters.push(reporter);
    }

    pub fn all(&self) -> &[Arc<dyn BatchReporter>] {
        &self.reporters
    }

    /// Broadcast an event to all registered reporters
    pub fn broadcast(&self, event: &BatchEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl BatchReporter for BatchReporterRegistry {
    fn report(&self, event: &BatchEvent) {
        self.broadcast(event);
    }
}

impl Default for BatchReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
