//! Task identity and result handles

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::completion::Outcome;
use crate::error::BatchError;

/// Registration index of a task within one processor run
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Zero-based registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Awaitable result of one registered task.
///
/// Resolves once the task body returns, fails or panics. Awaiting it before
/// the processor runs simply waits for the run.
#[derive(Debug)]
pub struct TaskHandle<R> {
    id: TaskId,
    receiver: oneshot::Receiver<Outcome<R>>,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(id: TaskId, receiver: oneshot::Receiver<Outcome<R>>) -> Self {
        Self { id, receiver }
    }

    /// Task this handle belongs to
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<R> Future for TaskHandle<R> {
    type Output = Result<R, BatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BatchError::Abandoned)))
    }
}
