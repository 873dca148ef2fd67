//! The suspension point handed to task bodies

use std::sync::Arc;

use crate::error::BatchError;
use crate::state::Coordination;
use crate::task::TaskId;

/// A task's only way to reach the batch handler.
///
/// Each [`load`](Self::load) call adds one request to the open batch and
/// suspends the task until the handler resolves that request. `load` takes
/// `&mut self`, so a task has at most one request outstanding.
///
/// The future returned by `load` must be awaited to completion: dropping it
/// while the request is pending (for example inside a `select!`) leaves the
/// task counted as waiting and can stall the batch.
pub struct Loader<In, Out> {
    task: TaskId,
    coordination: Arc<Coordination<In, Out>>,
    calls: usize,
}

impl<In, Out> Loader<In, Out> {
    pub(crate) fn new(task: TaskId, coordination: Arc<Coordination<In, Out>>) -> Self {
        Self {
            task,
            coordination,
            calls: 0,
        }
    }

    /// Task this loader belongs to
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Number of requests issued so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Ask the batch handler for the value of `input`
    pub async fn load(&mut self, input: In) -> Result<Out, BatchError> {
        self.calls += 1;
        let receiver = self.coordination.submit(self.task, input);
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(BatchError::Abandoned),
        }
    }
}

impl<In, Out> std::fmt::Debug for Loader<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("task", &self.task)
            .field("calls", &self.calls)
            .finish()
    }
}
