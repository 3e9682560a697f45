//! The single entry point collaborators use to run work on a hardware queue.

use std::ops::{Deref, DerefMut};

use tracing::{debug, error, info, warn};

use crate::backend::{ContextDesc, DeviceHandle, QueueBackend, QueueHandle};
use crate::config::PoolConfig;
use crate::deletion::DeferredDeletionQueue;
use crate::error::QueueError;
use crate::pool::ExecutionUnitPool;
use crate::token::CompletionToken;

/// Orchestrates one hardware queue, its completion counter, an
/// execution-unit pool, and a deferred-deletion queue.
///
/// The submit/track/reclaim discipline: [`execute`](Self::execute) hands
/// recorded work to the device and tags the unit with a fresh completion
/// token; the unit and any scheduled deletions are only acted on once the
/// device reports that token complete. [`synchronize`](Self::synchronize)
/// is the sole blocking operation.
///
/// A context is designed for single-threaded host-side use and performs no
/// internal locking; concurrent calls from multiple host threads require
/// external mutual exclusion. There is no cancellation or timeout for work
/// already submitted.
pub struct CommandQueueContext<B: QueueBackend> {
    desc: ContextDesc,
    backend: B,
    pool: ExecutionUnitPool<B::Factory>,
    deletions: DeferredDeletionQueue<B::Resource>,
    last_submitted: CompletionToken,
    device_lost: bool,
}

impl<B: QueueBackend> CommandQueueContext<B> {
    /// Create a context over caller-supplied device/queue handles.
    ///
    /// Fails with [`QueueError::Configuration`] on null handles; the
    /// context is not created. Pool warm-up failures surface as
    /// [`QueueError::Allocation`].
    pub fn new(
        desc: ContextDesc,
        backend: B,
        factory: B::Factory,
        config: &PoolConfig,
    ) -> Result<Self, QueueError> {
        desc.validate()?;
        let pool = ExecutionUnitPool::new(factory, config)?;
        info!(
            device = desc.device.0,
            queue = desc.queue.0,
            node_mask = desc.node_mask,
            warm_units = config.warm_units,
            "command queue context created"
        );
        Ok(Self {
            desc,
            backend,
            pool,
            deletions: DeferredDeletionQueue::new(),
            last_submitted: CompletionToken::ZERO,
            device_lost: false,
        })
    }

    /// Borrow a ready-to-record execution unit from the pool.
    ///
    /// Never blocks on device completion: if nothing is free, the pool
    /// grows. Fails only if the factory fails or the device is lost.
    pub fn acquire_unit(&mut self) -> Result<B::Unit, QueueError> {
        self.check_alive()?;
        let result = self.pool.acquire();
        self.latch(result)
    }

    /// Return a borrowed unit that was never submitted. It is immediately
    /// acquirable again.
    ///
    /// Accepted even after device loss: the unit is host-side bookkeeping
    /// only at this point.
    pub fn release_unit(&mut self, unit: B::Unit) {
        self.pool.return_unused(unit);
    }

    /// Submit a unit's recorded work to the hardware queue.
    ///
    /// Returns as soon as the work is handed off, not when it finishes. On
    /// success the unit is tagged with the new completion token and parked
    /// for reuse, and both the pool and the deletion queue are
    /// opportunistically reclaimed against the last observed completed
    /// token (amortized cleanup; correctness never depends on it).
    ///
    /// A rejected submission is abandoned, not retried; the unit returns to
    /// the free list since the device never received the work.
    pub fn execute(&mut self, mut unit: B::Unit) -> Result<CompletionToken, QueueError> {
        self.check_alive()?;
        let token = self.last_submitted.next();
        if let Err(err) = self.backend.submit(&mut unit, token) {
            self.pool.return_unused(unit);
            return self.latch(Err(err));
        }
        self.last_submitted = token;
        self.pool.recycle(token, unit);
        debug!(token = token.value(), "submitted execution unit");

        let completed = self.observe_completed()?;
        let result = self.reclaim_up_to(completed);
        self.latch(result)?;
        Ok(token)
    }

    /// Block the calling thread until the device reports completion of the
    /// most recently submitted token, then fully reclaim both pending
    /// queues. After this returns, no pending entries remain.
    pub fn synchronize(&mut self) -> Result<(), QueueError> {
        self.check_alive()?;
        let target = self.last_submitted;
        let result = self.backend.wait(target);
        self.latch(result)?;
        debug!(token = target.value(), "device reached synchronization point");
        let result = self.reclaim_up_to(target);
        self.latch(result)
    }

    /// Schedule a device-owned object for destruction once every piece of
    /// work submitted so far has finished.
    pub fn schedule_deletion(&mut self, resource: B::Resource) -> Result<(), QueueError> {
        self.check_alive()?;
        self.deletions.schedule(self.last_submitted, resource);
        Ok(())
    }

    /// Reclaim both pending queues against the device's current completed
    /// token without blocking. Idempotent.
    pub fn reclaim(&mut self) -> Result<(), QueueError> {
        self.check_alive()?;
        let completed = self.observe_completed()?;
        let result = self.reclaim_up_to(completed);
        self.latch(result)
    }

    /// Acquire a unit behind an RAII guard: dropping the guard without
    /// submitting returns the unit to the pool.
    pub fn scoped_unit(&mut self) -> Result<ScopedUnit<'_, B>, QueueError> {
        let unit = self.acquire_unit()?;
        Ok(ScopedUnit {
            context: self,
            unit: Some(unit),
        })
    }

    pub fn device_handle(&self) -> DeviceHandle {
        self.desc.device
    }

    pub fn queue_handle(&self) -> QueueHandle {
        self.desc.queue
    }

    pub fn node_mask(&self) -> u32 {
        self.desc.node_mask
    }

    /// Token of the most recent submission (`ZERO` before the first).
    pub fn last_submitted(&self) -> CompletionToken {
        self.last_submitted
    }

    /// Units still gated on an unreached token.
    pub fn pending_units(&self) -> usize {
        self.pool.pending_len()
    }

    /// Scheduled deletions not yet destroyed.
    pub fn pending_deletions(&self) -> usize {
        self.deletions.len()
    }

    fn check_alive(&self) -> Result<(), QueueError> {
        if self.device_lost {
            Err(QueueError::DeviceLost)
        } else {
            Ok(())
        }
    }

    /// Latch device loss: after the first `DeviceLost`, every subsequent
    /// device-touching operation fails immediately. Recovery requires
    /// recreating the context.
    fn latch<T>(&mut self, result: Result<T, QueueError>) -> Result<T, QueueError> {
        if let Err(QueueError::DeviceLost) = &result {
            if !self.device_lost {
                error!("device lost; context must be destroyed and recreated");
            }
            self.device_lost = true;
        }
        result
    }

    fn observe_completed(&mut self) -> Result<CompletionToken, QueueError> {
        let result = self.backend.completed();
        self.latch(result)
    }

    fn reclaim_up_to(&mut self, completed: CompletionToken) -> Result<(), QueueError> {
        self.pool.reclaim(completed);
        let backend = &mut self.backend;
        self.deletions
            .reclaim(completed, |resource| backend.destroy(resource))
    }
}

impl<B: QueueBackend> Drop for CommandQueueContext<B> {
    fn drop(&mut self) {
        if !self.device_lost && self.last_submitted > CompletionToken::ZERO {
            if let Err(err) = self.backend.wait(self.last_submitted) {
                warn!(%err, "failed to synchronize during context teardown");
                self.device_lost = true;
            }
        }
        if !self.device_lost {
            let target = self.last_submitted;
            self.pool.reclaim(target);
            let backend = &mut self.backend;
            if let Err(err) = self
                .deletions
                .reclaim(target, |resource| backend.destroy(resource))
            {
                warn!(%err, "failed to destroy deferred objects during teardown");
            }
        }
        if self.pool.pending_len() > 0 || !self.deletions.is_empty() {
            // Units or objects the device may still reference; leaking them
            // beats a use-after-free on a lost device.
            warn!(
                pending_units = self.pool.pending_len(),
                pending_deletions = self.deletions.len(),
                "context dropped with unreclaimed entries"
            );
        }
        self.pool.teardown();
    }
}

/// RAII borrow of an execution unit, in the spirit of a scoped lock guard.
///
/// Derefs to the unit for recording. [`submit`](Self::submit) consumes the
/// guard through [`CommandQueueContext::execute`]; dropping an unsubmitted
/// guard releases the unit back to the pool.
pub struct ScopedUnit<'a, B: QueueBackend> {
    context: &'a mut CommandQueueContext<B>,
    unit: Option<B::Unit>,
}

impl<B: QueueBackend> ScopedUnit<'_, B> {
    /// Submit the recorded work, returning the completion token it will
    /// signal.
    pub fn submit(mut self) -> Result<CompletionToken, QueueError> {
        // Present by construction; only taken here or in drop.
        let unit = self.unit.take().expect("unit already taken");
        self.context.execute(unit)
    }
}

impl<B: QueueBackend> Deref for ScopedUnit<'_, B> {
    type Target = B::Unit;

    fn deref(&self) -> &B::Unit {
        self.unit.as_ref().expect("unit already taken")
    }
}

impl<B: QueueBackend> DerefMut for ScopedUnit<'_, B> {
    fn deref_mut(&mut self) -> &mut B::Unit {
        self.unit.as_mut().expect("unit already taken")
    }
}

impl<B: QueueBackend> Drop for ScopedUnit<'_, B> {
    fn drop(&mut self) {
        if let Some(unit) = self.unit.take() {
            self.context.release_unit(unit);
        }
    }
}
