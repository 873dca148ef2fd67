//! Single-assignment completion handles

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::BatchError;

/// Final state delivered through a completion handle
pub type Outcome<T> = Result<T, BatchError>;

type Slot<T> = Arc<Mutex<Option<oneshot::Sender<Outcome<T>>>>>;

/// Write-once handle for a value or a failure.
///
/// Clones share the same slot. The first call to [`complete`](Self::complete)
/// or [`fail`](Self::fail) wins; later calls return
/// [`BatchError::AlreadyCompleted`].
pub struct Completion<T> {
    slot: Slot<T>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Create a completion handle and the receiver observing it
pub(crate) fn completion_pair<T>() -> (Completion<T>, oneshot::Receiver<Outcome<T>>) {
    let (tx, rx) = oneshot::channel();
    (
        Completion {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        rx,
    )
}

impl<T> Completion<T> {
    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<Outcome<T>>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve with a value
    pub fn complete(&self, value: T) -> Result<(), BatchError> {
        self.resolve(Ok(value))
    }

    /// Resolve with a failure
    pub fn fail(&self, error: BatchError) -> Result<(), BatchError> {
        self.resolve(Err(error))
    }

    /// Resolve with an outcome
    pub fn resolve(&self, outcome: Outcome<T>) -> Result<(), BatchError> {
        let sender = self.lock().take().ok_or(BatchError::AlreadyCompleted)?;
        // The waiting side may already be gone; the slot is still consumed.
        let _ = sender.send(outcome);
        Ok(())
    }

    /// Whether a result has been assigned
    pub fn is_completed(&self) -> bool {
        self.lock().is_none()
    }

    /// Fail the handle unless it is already resolved; returns whether it failed it
    pub(crate) fn fail_if_pending(&self, error: BatchError) -> bool {
        self.fail(error).is_ok()
    }

    /// Number of live clones of this handle
    pub(crate) fn holders(&self) -> usize {
        Arc::strong_count(&self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_delivers_value() {
        let (completion, rx) = completion_pair::<u32>();
        assert!(!completion.is_completed());
        completion.complete(7).unwrap();
        assert!(completion.is_completed());
        assert_eq!(rx.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_fail_delivers_error() {
        let (completion, rx) = completion_pair::<u32>();
        completion.fail(BatchError::Unresolved).unwrap();
        assert!(matches!(rx.await.unwrap(), Err(BatchError::Unresolved)));
    }

    #[test]
    fn test_second_completion_is_rejected() {
        let (completion, _rx) = completion_pair::<u32>();
        completion.complete(1).unwrap();
        assert!(matches!(
            completion.complete(2),
            Err(BatchError::AlreadyCompleted)
        ));
        assert!(matches!(
            completion.fail(BatchError::Abandoned),
            Err(BatchError::AlreadyCompleted)
        ));
    }

    #[tokio::test]
    async fn test_clones_share_slot() {
        let (completion, rx) = completion_pair::<&str>();
        let clone = completion.clone();
        assert_eq!(completion.holders(), 2);
        clone.complete("first").unwrap();
        assert!(completion.is_completed());
        assert!(!completion.fail_if_pending(BatchError::Abandoned));
        assert_eq!(rx.await.unwrap().unwrap(), "first");
    }

    #[test]
    fn test_completion_with_dropped_receiver_still_consumes_slot() {
        let (completion, rx) = completion_pair::<u32>();
        drop(rx);
        completion.complete(1).unwrap();
        assert!(completion.is_completed());
    }
}
