//! Shared scheduling state between the coordinator and its tasks

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, Notify};

use crate::completion::{completion_pair, Outcome};
use crate::request::{BatchRequest, RequestId};
use crate::task::TaskId;

/// Counters and the open batch, always mutated together under one lock
struct ScheduleState<In, Out> {
    /// Requests accumulated since the last flush, in issue order
    open: Vec<BatchRequest<In, Out>>,
    /// Live tasks not currently waiting in the open batch
    runnable: usize,
    /// Tasks that have not finished yet
    live: usize,
    next_request: u64,
}

/// What the coordinator should do next
pub(crate) enum Step<In, Out> {
    /// Hand this batch to the handler
    Flush(Vec<BatchRequest<In, Out>>),
    /// Nothing to flush yet
    Wait,
    /// Every task has finished
    Done,
}

/// Coordination point shared by the processor and every loader
pub(crate) struct Coordination<In, Out> {
    state: Mutex<ScheduleState<In, Out>>,
    wake: Notify,
    max_batch_size: Option<usize>,
}

impl<In, Out> Coordination<In, Out> {
    pub(crate) fn new(tasks: usize, max_batch_size: Option<usize>) -> Self {
        Self {
            state: Mutex::new(ScheduleState {
                open: Vec::new(),
                runnable: tasks,
                live: tasks,
                next_request: 0,
            }),
            wake: Notify::new(),
            max_batch_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScheduleState<In, Out>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_ready(&self, state: &ScheduleState<In, Out>) -> bool {
        if state.open.is_empty() {
            return false;
        }
        state.runnable == 0
            || self
                .max_batch_size
                .is_some_and(|max| state.open.len() >= max)
    }

    /// Append a request to the open batch and suspend the calling task
    pub(crate) fn submit(&self, task: TaskId, input: In) -> oneshot::Receiver<Outcome<Out>> {
        let (completion, receiver) = completion_pair();
        let ready = {
            let mut state = self.lock();
            let id = RequestId(state.next_request);
            state.next_request += 1;
            state
                .open
                .push(BatchRequest::new(id, task, input, completion));
            state.runnable = state.runnable.saturating_sub(1);
            self.is_ready(&state)
        };
        if ready {
            self.wake.notify_one();
        }
        receiver
    }

    /// Record that a task body returned (or unwound)
    pub(crate) fn task_finished(&self) {
        let wake = {
            let mut state = self.lock();
            state.runnable = state.runnable.saturating_sub(1);
            state.live = state.live.saturating_sub(1);
            state.live == 0 || self.is_ready(&state)
        };
        if wake {
            self.wake.notify_one();
        }
    }

    /// Decide the next coordinator step.
    ///
    /// Flushed requests are counted as runnable again before the lock is
    /// released, so quiescence is only reached after their tasks resume and
    /// either wait again or finish.
    pub(crate) fn next_step(&self) -> Step<In, Out> {
        let mut state = self.lock();
        if state.live == 0 {
            return Step::Done;
        }
        if !self.is_ready(&state) {
            return Step::Wait;
        }

        let take = self
            .max_batch_size
            .map_or(state.open.len(), |max| max.min(state.open.len()));
        let batch: Vec<_> = state.open.drain(..take).collect();
        state.runnable += batch.len();
        Step::Flush(batch)
    }

    /// Wait until a task signals a possible state change
    pub(crate) async fn changed(&self) {
        self.wake.notified().await;
    }
}

/// Marks its task finished when dropped, including on panic
pub(crate) struct LiveGuard<In, Out> {
    coordination: Arc<Coordination<In, Out>>,
}

impl<In, Out> LiveGuard<In, Out> {
    pub(crate) fn new(coordination: Arc<Coordination<In, Out>>) -> Self {
        Self { coordination }
    }
}

impl<In, Out> Drop for LiveGuard<In, Out> {
    fn drop(&mut self) {
        self.coordination.task_finished();
    }
}
