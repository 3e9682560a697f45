//! The seam between the lifecycle core and a concrete hardware queue.

use crate::error::QueueError;
use crate::pool::UnitFactory;
use crate::token::CompletionToken;

/// Opaque handle to a device, as supplied by the embedder.
///
/// Zero is never a valid handle; construction of a context rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// Opaque handle to a hardware execution queue on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueHandle(pub u64);

/// Immutable context configuration: which device, which queue, and the
/// node/engine-affinity mask. Bound at construction, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ContextDesc {
    pub device: DeviceHandle,
    pub queue: QueueHandle,
    pub node_mask: u32,
}

impl ContextDesc {
    /// Reject null handles. The handles themselves are created by the
    /// embedder, never by this crate.
    pub(crate) fn validate(&self) -> Result<(), QueueError> {
        if self.device.0 == 0 {
            return Err(QueueError::Configuration("null device handle".into()));
        }
        if self.queue.0 == 0 {
            return Err(QueueError::Configuration("null queue handle".into()));
        }
        Ok(())
    }
}

/// A hardware queue with token-based completion reporting.
///
/// Implementations wrap one asynchronous device queue: `submit` hands work
/// off and returns immediately; completion is observed only by comparing
/// `completed()` against the token a submission was tagged with. There is
/// no cancellation or timeout for in-flight work -- once submitted, work
/// runs to completion.
pub trait QueueBackend {
    /// The recorder/storage pairing collaborators record work into.
    type Unit;

    /// A device-owned object the backend knows how to destroy.
    type Resource;

    /// Factory for [`Self::Unit`], driven by the context's pool.
    type Factory: UnitFactory<Unit = Self::Unit>;

    /// Submit the unit's recorded work and arrange for `signal` to be
    /// reported once it (and everything before it) has finished.
    fn submit(&mut self, unit: &mut Self::Unit, signal: CompletionToken)
        -> Result<(), QueueError>;

    /// The last completion token the device has reported.
    fn completed(&mut self) -> Result<CompletionToken, QueueError>;

    /// Block the calling thread until the device reports `token` complete.
    fn wait(&mut self, token: CompletionToken) -> Result<(), QueueError>;

    /// Destroy a device-owned object. Only called once the object's gating
    /// token has been observed complete.
    fn destroy(&mut self, resource: Self::Resource) -> Result<(), QueueError>;
}
