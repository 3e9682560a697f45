//! Deferred destruction of device-owned objects.

use tracing::debug;

use crate::error::QueueError;
use crate::fence_queue::FenceTrackedQueue;
use crate::token::CompletionToken;

/// Guarantees a device-owned object is destroyed only after every piece of
/// work that might reference it has finished.
///
/// The queue does not interpret the objects it holds; destruction is
/// supplied by the caller at reclaim time (the context passes its backend's
/// destroy operation).
pub struct DeferredDeletionQueue<T> {
    pending: FenceTrackedQueue<T>,
}

impl<T> DeferredDeletionQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: FenceTrackedQueue::new(),
        }
    }

    /// Schedule `object` for destruction once `token` is observed complete.
    pub fn schedule(&mut self, token: CompletionToken, object: T) {
        self.pending.push(token, object);
    }

    /// Destroy every ready object, in token order.
    ///
    /// A destruction failure is not retried: the object is device state, so
    /// a failed release is an unrecoverable device error. The error is
    /// returned immediately and the remaining entries stay queued.
    pub fn reclaim<D>(&mut self, completed: CompletionToken, mut destroy: D) -> Result<(), QueueError>
    where
        D: FnMut(T) -> Result<(), QueueError>,
    {
        let mut destroyed = 0usize;
        for object in self.pending.drain_completed(completed) {
            destroy(object)?;
            destroyed += 1;
        }
        if destroyed > 0 {
            debug!(
                completed = completed.value(),
                destroyed,
                still_pending = self.pending.len(),
                "destroyed deferred objects"
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for DeferredDeletionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
