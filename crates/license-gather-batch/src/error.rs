//! Error types for the batching engine

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// A failure cause that can be handed to several requests at once
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Convert any error into a shareable cause, keeping its source chain
pub fn share(error: impl Into<anyhow::Error>) -> SharedError {
    let error: anyhow::Error = error.into();
    let boxed: Box<dyn StdError + Send + Sync + 'static> = error.into();
    Arc::from(boxed)
}

/// Failure of a request or a task
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    /// The handler failed this one request
    #[error("Request failed: {0}")]
    Request(#[source] SharedError),

    /// The handler failed before completing the request
    #[error("Batch handler failed: {0}")]
    Handler(#[source] SharedError),

    /// The handler did not finish within the configured limit
    #[error("Batch handler timed out after {0:?}")]
    HandlerTimeout(Duration),

    /// The handler returned without completing or keeping the request
    #[error("Batch handler returned without completing the request")]
    Unresolved,

    /// The completing side went away without a result
    #[error("Result was abandoned before completion")]
    Abandoned,

    /// A second completion of a single-assignment handle
    #[error("Result was already completed")]
    AlreadyCompleted,

    /// The task body itself failed
    #[error("Task failed: {0}")]
    Task(#[source] SharedError),

    /// The task body panicked
    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl BatchError {
    /// Classify an error returned from a task body.
    ///
    /// Request and handler failures propagated with `?` surface unchanged;
    /// anything else is the task's own failure.
    pub fn from_task(error: anyhow::Error) -> Self {
        match error.downcast::<BatchError>() {
            Ok(batch_error) => batch_error,
            Err(other) => Self::Task(share(other)),
        }
    }

    /// Whether the failure originated in the batch handler rather than the task
    pub fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Handler(_) | Self::HandlerTimeout(_) | Self::Unresolved
        )
    }
}

/// Readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
