//! Vulkan backend for the GPUQ submission core, via `ash`.
//!
//! Wraps a caller-supplied device and queue; device and queue creation stay
//! with the embedder. Completion tokens map onto a timeline semaphore: each
//! submission signals the semaphore with its token value, and the host
//! observes or waits on the counter. Requires the Vulkan 1.2
//! `timelineSemaphore` feature on the supplied device.

pub mod backend;
pub mod resource;

pub use backend::{VulkanBackend, VulkanExecutionUnit, VulkanUnitFactory};
pub use resource::VulkanResource;
