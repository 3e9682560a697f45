//! Device-independent GPU command-submission and resource-lifecycle core.
//!
//! Host code records work into pooled execution units and submits them to a
//! hardware queue that executes asynchronously. Anything a submitted unit
//! touches must not be reused or destroyed until the device reports the
//! work finished; this crate implements that submit/track/reclaim
//! discipline around monotonically increasing completion tokens.
//!
//! The hardware itself sits behind the [`QueueBackend`] trait (see the
//! `gpuq-vk` crate for a Vulkan implementation); everything here is
//! in-process and driver-agnostic.

pub mod backend;
pub mod config;
pub mod context;
pub mod deletion;
pub mod error;
pub mod fence_queue;
pub mod pool;
pub mod token;

pub use backend::{ContextDesc, DeviceHandle, QueueBackend, QueueHandle};
pub use config::{GpuqConfig, PoolConfig};
pub use context::{CommandQueueContext, ScopedUnit};
pub use deletion::DeferredDeletionQueue;
pub use error::QueueError;
pub use fence_queue::FenceTrackedQueue;
pub use pool::{ExecutionUnitPool, UnitFactory};
pub use token::CompletionToken;
