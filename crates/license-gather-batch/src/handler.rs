//! Batch handler trait

use std::future::Future;

use async_trait::async_trait;

use crate::request::BatchRequest;

/// Services a whole batch of requests in one call.
///
/// Every request must be resolved exactly once through
/// [`BatchRequest::complete`] or [`BatchRequest::fail`]. Returning `Err`
/// fails every request that is still pending with that cause; requests that
/// are dropped unresolved fail with [`BatchError::Unresolved`].
///
/// Async closures taking `Vec<BatchRequest<In, Out>>` implement this trait.
///
/// [`BatchError::Unresolved`]: crate::BatchError::Unresolved
#[async_trait]
pub trait BatchHandler<In, Out>: Send + Sync
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Resolve the requests of one batch, given in issue order
    async fn handle(&self, batch: Vec<BatchRequest<In, Out>>) -> anyhow::Result<()>;
}

#[async_trait]
impl<In, Out, F, Fut> BatchHandler<In, Out> for F
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(Vec<BatchRequest<In, Out>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, batch: Vec<BatchRequest<In, Out>>) -> anyhow::Result<()> {
        (self)(batch).await
    }
}
