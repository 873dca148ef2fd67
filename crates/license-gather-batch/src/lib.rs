//! License Gather Batch - Asynchronous request batching engine
//!
//! Many independent tasks each ask for values one at a time through a
//! [`Loader`]. Their requests are pooled into batches, a single
//! [`BatchHandler`] call services each batch, and every task resumes with the
//! value assigned to its own request. A batch is flushed once every live task
//! is waiting on a request (or an optional size cap is reached), so one
//! expensive bulk call replaces many small ones.
//!
//! ```no_run
//! use license_gather_batch::{batch, BatchRequest, Loader};
//!
//! # async fn demo() {
//! let results = batch(
//!     |requests: Vec<BatchRequest<u32, u32>>| async move {
//!         for request in &requests {
//!             request.complete(request.input() * 2)?;
//!         }
//!         anyhow::Ok(())
//!     },
//!     (1..=3).map(|n| move |mut loader: Loader<u32, u32>| async move {
//!         Ok(loader.load(n).await? + 1)
//!     }),
//! )
//! .await;
//! # }
//! ```

pub mod completion;
pub mod error;
pub mod handler;
pub mod loader;
pub mod processor;
pub mod reporter;
pub mod request;
mod state;
pub mod task;

pub use completion::Completion;
pub use error::{BatchError, SharedError};
pub use handler::BatchHandler;
pub use loader::Loader;
pub use processor::{batch, batch_with_options, BatchOptions, BatchProcessor, RunSummary};
pub use reporter::{
    BatchEvent, BatchReporter, BatchReporterRegistry, CollectingReporter, TracingReporter,
};
pub use request::{BatchRequest, RequestId};
pub use task::{TaskHandle, TaskId};
