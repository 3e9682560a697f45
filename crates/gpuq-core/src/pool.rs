//! Readiness-gated pool of reusable execution units.

use tracing::debug;

use crate::config::PoolConfig;
use crate::error::QueueError;
use crate::fence_queue::FenceTrackedQueue;
use crate::token::CompletionToken;

/// Creation, reset, and release of pooled execution units.
///
/// Backends implement this for their recorder/storage pairing (a Vulkan
/// backend pairs a command pool with a primary command buffer). The pool
/// never calls into the device itself; everything hardware-specific goes
/// through the factory.
pub trait UnitFactory {
    type Unit;

    /// Produce a brand-new unit, ready for recording.
    fn allocate(&mut self) -> Result<Self::Unit, QueueError>;

    /// Clear a unit's recording state so it can be reused.
    fn reset(&mut self, unit: &mut Self::Unit) -> Result<(), QueueError>;

    /// Destroy a unit for good.
    fn release(&mut self, unit: Self::Unit);
}

/// Hands out ready-to-use execution units and makes reuse safe relative to
/// outstanding device work.
///
/// A unit handed back via [`recycle`](Self::recycle) stays in an internal
/// [`FenceTrackedQueue`] until its submission token is observed complete;
/// only then does [`reclaim`](Self::reclaim) move it to the free list. The
/// pool never blocks waiting for the device: if nothing is free, it grows.
pub struct ExecutionUnitPool<F: UnitFactory> {
    factory: F,
    free: Vec<F::Unit>,
    pending: FenceTrackedQueue<F::Unit>,
    max_free: Option<usize>,
}

impl<F: UnitFactory> ExecutionUnitPool<F> {
    pub fn new(factory: F, config: &PoolConfig) -> Result<Self, QueueError> {
        let mut pool = Self {
            factory,
            free: Vec::new(),
            pending: FenceTrackedQueue::new(),
            max_free: config.max_free_units.map(|n| n as usize),
        };
        for _ in 0..config.warm_units {
            let unit = pool.factory.allocate()?;
            pool.free.push(unit);
        }
        Ok(pool)
    }

    /// Pop and reset a free unit, or grow the pool via the factory.
    ///
    /// Fails only if the factory fails; never waits for device completion.
    pub fn acquire(&mut self) -> Result<F::Unit, QueueError> {
        match self.free.pop() {
            Some(mut unit) => {
                self.factory.reset(&mut unit)?;
                Ok(unit)
            }
            None => self.factory.allocate(),
        }
    }

    /// Park a submitted unit until `token` is observed complete.
    pub fn recycle(&mut self, token: CompletionToken, unit: F::Unit) {
        self.pending.push(token, unit);
    }

    /// Return a borrowed unit that was never submitted straight to the free
    /// list. No token has to advance before it is acquirable again.
    pub fn return_unused(&mut self, unit: F::Unit) {
        self.free.push(unit);
    }

    /// Move every pending unit whose token is `<= completed` to the free
    /// list, releasing any surplus beyond the configured free-list cap.
    ///
    /// Idempotent; safe to call opportunistically and often.
    pub fn reclaim(&mut self, completed: CompletionToken) {
        let before = self.pending.len();
        self.free.extend(self.pending.drain_completed(completed));
        let moved = before - self.pending.len();
        if moved > 0 {
            debug!(
                completed = completed.value(),
                moved,
                still_pending = self.pending.len(),
                "reclaimed execution units"
            );
        }

        if let Some(cap) = self.max_free {
            while self.free.len() > cap {
                // Pops the most recently freed unit; order is irrelevant on
                // the free list.
                if let Some(unit) = self.free.pop() {
                    self.factory.release(unit);
                }
            }
        }
    }

    /// Number of units still gated on an unreached token.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of immediately acquirable units.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Release every free unit through the factory. Pending units are
    /// expected to have been reclaimed first.
    pub fn teardown(&mut self) {
        for unit in self.free.drain(..) {
            self.factory.release(unit);
        }
    }
}
