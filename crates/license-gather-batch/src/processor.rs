//! Batch processor: coordinates tasks and the batch handler on tokio

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::completion::{completion_pair, Completion};
use crate::error::{panic_message, share, BatchError};
use crate::handler::BatchHandler;
use crate::loader::Loader;
use crate::reporter::{BatchEvent, BatchReporter, TracingReporter};
use crate::request::BatchRequest;
use crate::state::{Coordination, LiveGuard, Step};
use crate::task::{TaskHandle, TaskId};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type TaskBody<In, Out, R> = Box<dyn FnOnce(Loader<In, Out>) -> BoxFuture<anyhow::Result<R>> + Send>;

/// Options for the batch processor
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Flush as soon as this many requests are open, even if some tasks are
    /// still running. `None` flushes only on quiescence.
    pub max_batch_size: Option<usize>,
    /// Abort the handler and fail its pending requests after this long.
    /// `None` waits forever: a handler that never resolves its batch hangs
    /// the run.
    pub handler_timeout: Option<Duration>,
}

impl BatchOptions {
    /// Cap batch sizes; zero is treated as no cap
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = (max > 0).then_some(max);
        self
    }

    /// Bound handler run time
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }
}

/// Statistics of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Tasks registered
    pub tasks: usize,
    /// Tasks that returned a value
    pub succeeded: usize,
    /// Tasks that ended with a failure
    pub failed: usize,
    /// Handler invocations
    pub batches: usize,
    /// Requests issued across all tasks
    pub requests: usize,
    /// Size of the largest batch
    pub largest_batch: usize,
    /// Wall-clock time of the run
    pub duration: Duration,
}

struct RegisteredTask<In, Out, R> {
    id: TaskId,
    body: TaskBody<In, Out, R>,
    completion: Completion<R>,
}

/// Coordinates a set of tasks that share one batch handler.
///
/// Register task bodies with [`task`](Self::task), then [`run`](Self::run)
/// drives them to completion. Each body receives a [`Loader`]; every request
/// it issues is pooled into the open batch, which is flushed to the handler
/// once all live tasks are waiting (or `max_batch_size` is reached).
pub struct BatchProcessor<In, Out, R> {
    handler: Arc<dyn BatchHandler<In, Out>>,
    options: BatchOptions,
    reporter: Arc<dyn BatchReporter>,
    tasks: Vec<RegisteredTask<In, Out, R>>,
}

impl<In, Out, R> BatchProcessor<In, Out, R>
where
    In: Send + 'static,
    Out: Send + 'static,
    R: Send + 'static,
{
    /// Create a processor with default options
    pub fn new<H>(handler: H) -> Self
    where
        H: BatchHandler<In, Out> + 'static,
    {
        Self::with_options(handler, BatchOptions::default())
    }

    /// Create a processor with custom options
    pub fn with_options<H>(handler: H, options: BatchOptions) -> Self
    where
        H: BatchHandler<In, Out> + 'static,
    {
        Self {
            handler: Arc::new(handler),
            options,
            reporter: Arc::new(TracingReporter),
            tasks: Vec::new(),
        }
    }

    /// Replace the reporter (defaults to [`TracingReporter`])
    pub fn with_reporter(mut self, reporter: Arc<dyn BatchReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Options in effect
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task has been registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Register a task body; returns the handle its result arrives on
    pub fn task<F, Fut>(&mut self, body: F) -> TaskHandle<R>
    where
        F: FnOnce(Loader<In, Out>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let id = TaskId(self.tasks.len());
        let (completion, receiver) = completion_pair();
        self.tasks.push(RegisteredTask {
            id,
            body: Box::new(move |loader: Loader<In, Out>| -> BoxFuture<anyhow::Result<R>> {
                Box::pin(body(loader))
            }),
            completion,
        });
        TaskHandle::new(id, receiver)
    }

    /// Run every registered task to completion
    #[instrument(skip_all, fields(tasks = self.tasks.len()))]
    pub async fn run(mut self) -> RunSummary {
        let start = Instant::now();
        let task_count = self.tasks.len();
        let coordination = Arc::new(Coordination::new(
            task_count,
            self.options.max_batch_size,
        ));

        self.reporter
            .report(&BatchEvent::RunStarted { tasks: task_count });

        let mut running = Vec::with_capacity(task_count);
        for task in std::mem::take(&mut self.tasks) {
            let RegisteredTask {
                id,
                body,
                completion,
            } = task;
            let loader = Loader::new(id, coordination.clone());
            let guard = LiveGuard::new(coordination.clone());
            let reporter = self.reporter.clone();
            let task_completion = completion.clone();

            let join = tokio::spawn(async move {
                let _guard = guard;
                let outcome = body(loader).await.map_err(BatchError::from_task);
                let succeeded = outcome.is_ok();
                match &outcome {
                    Ok(_) => reporter.report(&BatchEvent::TaskCompleted { id }),
                    Err(e) => reporter.report(&BatchEvent::TaskFailed {
                        id,
                        error: e.to_string(),
                    }),
                }
                let _ = task_completion.resolve(outcome);
                succeeded
            });
            running.push((id, join, completion));
        }

        let mut summary = RunSummary {
            tasks: task_count,
            ..Default::default()
        };

        loop {
            match coordination.next_step() {
                Step::Done => break,
                Step::Wait => coordination.changed().await,
                Step::Flush(batch) => {
                    summary.batches += 1;
                    summary.requests += batch.len();
                    summary.largest_batch = summary.largest_batch.max(batch.len());
                    self.dispatch(summary.batches, batch).await;
                }
            }
        }

        for (id, join, completion) in running {
            match join.await {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(join_error) => {
                    summary.failed += 1;
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic().as_ref())
                    } else {
                        join_error.to_string()
                    };
                    self.reporter.report(&BatchEvent::TaskFailed {
                        id,
                        error: format!("panicked: {}", message),
                    });
                    completion.fail_if_pending(BatchError::Panicked(message));
                }
            }
        }

        summary.duration = start.elapsed();
        self.reporter.report(&BatchEvent::AllCompleted {
            tasks: summary.tasks,
            succeeded: summary.succeeded,
            failed: summary.failed,
            batches: summary.batches,
            requests: summary.requests,
            duration: summary.duration,
        });

        summary
    }

    /// Hand one batch to the handler and settle whatever it left pending
    async fn dispatch(&self, index: usize, batch: Vec<BatchRequest<In, Out>>) {
        let size = batch.len();
        let completions: Vec<Completion<Out>> =
            batch.iter().map(|r| r.completion().clone()).collect();

        self.reporter
            .report(&BatchEvent::BatchFlushed { batch: index, size });
        debug!(batch = index, size, "dispatching batch");

        let started = Instant::now();
        let handler = self.handler.clone();
        let mut join = tokio::spawn(async move { handler.handle(batch).await });

        let result = match self.options.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut join).await {
                Ok(joined) => joined,
                Err(_) => {
                    join.abort();
                    self.fail_pending(
                        index,
                        &completions,
                        BatchError::HandlerTimeout(limit),
                        started,
                    );
                    return;
                }
            },
            None => join.await,
        };

        match result {
            Ok(Ok(())) => {
                // Requests the handler still holds are being completed
                // elsewhere; ones it dropped can never be.
                let unresolved = completions
                    .iter()
                    .filter(|c| c.holders() == 1)
                    .filter(|c| c.fail_if_pending(BatchError::Unresolved))
                    .count();
                self.reporter.report(&BatchEvent::BatchCompleted {
                    batch: index,
                    size,
                    unresolved,
                    duration: started.elapsed(),
                });
            }
            Ok(Err(error)) => {
                self.fail_pending(index, &completions, BatchError::Handler(share(error)), started);
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic().as_ref())
                } else {
                    join_error.to_string()
                };
                let cause = share(anyhow::anyhow!("batch handler panicked: {}", message));
                self.fail_pending(index, &completions, BatchError::Handler(cause), started);
            }
        }
    }

    fn fail_pending(
        &self,
        index: usize,
        completions: &[Completion<Out>],
        error: BatchError,
        started: Instant,
    ) {
        let failed = completions
            .iter()
            .filter(|c| c.fail_if_pending(error.clone()))
            .count();
        self.reporter.report(&BatchEvent::BatchFailed {
            batch: index,
            size: completions.len(),
            failed,
            error: error.to_string(),
            duration: started.elapsed(),
        });
    }
}

/// Run `bodies` against `handler` and collect their results in
/// registration order.
pub async fn batch<In, Out, R, H, I, F, Fut>(handler: H, bodies: I) -> Vec<Result<R, BatchError>>
where
    In: Send + 'static,
    Out: Send + 'static,
    R: Send + 'static,
    H: BatchHandler<In, Out> + 'static,
    I: IntoIterator<Item = F>,
    F: FnOnce(Loader<In, Out>) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    batch_with_options(handler, BatchOptions::default(), bodies).await
}

/// [`batch`] with a batch size cap or handler timeout
pub async fn batch_with_options<In, Out, R, H, I, F, Fut>(
    handler: H,
    options: BatchOptions,
    bodies: I,
) -> Vec<Result<R, BatchError>>
where
    In: Send + 'static,
    Out: Send + 'static,
    R: Send + 'static,
    H: BatchHandler<In, Out> + 'static,
    I: IntoIterator<Item = F>,
    F: FnOnce(Loader<In, Out>) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    let mut processor = BatchProcessor::with_options(handler, options);
    let handles: Vec<_> = bodies.into_iter().map(|body| processor.task(body)).collect();
    processor.run().await;

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await);
    }
    results
}
