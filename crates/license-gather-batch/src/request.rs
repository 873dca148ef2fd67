//! Batch requests handed to the handler

use std::fmt;

use crate::completion::Completion;
use crate::error::{share, BatchError};
use crate::task::TaskId;

/// Sequence number of a request within one processor run
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// One outstanding ask: an input and the handle its task is waiting on.
///
/// The handler must resolve every request it receives exactly once, either
/// before returning or later from work it spawned while keeping the request
/// (or its [`completion`](Self::completion)) alive.
pub struct BatchRequest<In, Out> {
    id: RequestId,
    task: TaskId,
    input: In,
    completion: Completion<Out>,
}

impl<In, Out> BatchRequest<In, Out> {
    pub(crate) fn new(id: RequestId, task: TaskId, input: In, completion: Completion<Out>) -> Self {
        Self {
            id,
            task,
            input,
            completion,
        }
    }

    /// Request sequence number
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Task that issued the request
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// The value the task asked about
    pub fn input(&self) -> &In {
        &self.input
    }

    /// Resolve the request with a value
    pub fn complete(&self, value: Out) -> Result<(), BatchError> {
        self.completion.complete(value)
    }

    /// Fail only this request; the issuing task sees [`BatchError::Request`]
    pub fn fail(&self, error: impl Into<anyhow::Error>) -> Result<(), BatchError> {
        self.completion.fail(BatchError::Request(share(error)))
    }

    /// Whether the request has been resolved
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    /// Handle for resolving the request from elsewhere
    pub fn completion(&self) -> &Completion<Out> {
        &self.completion
    }
}

impl<In: fmt::Debug, Out> fmt::Debug for BatchRequest<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRequest")
            .field("id", &self.id)
            .field("task", &self.task)
            .field("input", &self.input)
            .field("completed", &self.is_completed())
            .finish()
    }
}
