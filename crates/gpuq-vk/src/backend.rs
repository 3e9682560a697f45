//! Queue backend and execution-unit factory over `ash`.

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, info};

use gpuq_core::{
    CompletionToken, ContextDesc, DeviceHandle, QueueBackend, QueueError, QueueHandle, UnitFactory,
};

use crate::resource::VulkanResource;

/// One hardware queue plus the timeline semaphore its completion tokens are
/// signaled on.
///
/// The device and queue are supplied by the embedder and must outlive the
/// backend; the backend only creates (and destroys) its own timeline
/// semaphore. Like the core context, a backend is single-threaded
/// host-side: the queue must not be submitted to from other threads while
/// the backend owns it.
pub struct VulkanBackend {
    device: ash::Device,
    queue: vk::Queue,
    queue_family_index: u32,
    node_mask: u32,
    timeline: vk::Semaphore,
}

impl VulkanBackend {
    /// Wrap an existing device/queue pair, creating the timeline semaphore.
    ///
    /// `node_mask` selects device nodes on the embedder's device group (0
    /// means "all"/single-node). The supplied device must have the
    /// `timelineSemaphore` feature enabled.
    pub fn new(
        device: ash::Device,
        queue: vk::Queue,
        queue_family_index: u32,
        node_mask: u32,
    ) -> Result<Self, QueueError> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(0);
        let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);
        let timeline =
            unsafe { device.create_semaphore(&create_info, None) }.map_err(|e| match e {
                vk::Result::ERROR_DEVICE_LOST => QueueError::DeviceLost,
                other => QueueError::Configuration(format!(
                    "vkCreateSemaphore (timeline) failed: {other:?}"
                )),
            })?;

        info!(
            queue = queue.as_raw(),
            queue_family_index, node_mask, "vulkan queue backend created"
        );
        Ok(Self {
            device,
            queue,
            queue_family_index,
            node_mask,
            timeline,
        })
    }

    /// The immutable description a `CommandQueueContext` is built with.
    pub fn context_desc(&self) -> ContextDesc {
        ContextDesc {
            device: DeviceHandle(self.device.handle().as_raw()),
            queue: QueueHandle(self.queue.as_raw()),
            node_mask: self.node_mask,
        }
    }

    /// A factory producing execution units for this backend's queue family.
    pub fn unit_factory(&self) -> VulkanUnitFactory {
        VulkanUnitFactory {
            device: self.device.clone(),
            queue_family_index: self.queue_family_index,
        }
    }
}

impl QueueBackend for VulkanBackend {
    type Unit = VulkanExecutionUnit;
    type Resource = VulkanResource;
    type Factory = VulkanUnitFactory;

    fn submit(
        &mut self,
        unit: &mut VulkanExecutionUnit,
        signal: CompletionToken,
    ) -> Result<(), QueueError> {
        let signal_values = [signal.value()];
        let mut timeline_info =
            vk::TimelineSemaphoreSubmitInfo::default().signal_semaphore_values(&signal_values);
        let command_buffers = [unit.command_buffer];
        let signal_semaphores = [self.timeline];
        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .push_next(&mut timeline_info);

        unsafe {
            self.device
                .queue_submit(self.queue, &[submit_info], vk::Fence::null())
        }
        .map_err(|e| map_vk_err(e, "vkQueueSubmit"))
    }

    fn completed(&mut self) -> Result<CompletionToken, QueueError> {
        let value = unsafe { self.device.get_semaphore_counter_value(self.timeline) }
            .map_err(|e| map_vk_err(e, "vkGetSemaphoreCounterValue"))?;
        Ok(CompletionToken::new(value))
    }

    fn wait(&mut self, token: CompletionToken) -> Result<(), QueueError> {
        let semaphores = [self.timeline];
        let values = [token.value()];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);
        unsafe { self.device.wait_semaphores(&wait_info, u64::MAX) }
            .map_err(|e| map_vk_err(e, "vkWaitSemaphores"))
    }

    fn destroy(&mut self, resource: VulkanResource) -> Result<(), QueueError> {
        debug!(?resource, "destroying deferred vulkan object");
        unsafe {
            match resource {
                VulkanResource::Buffer(b) => self.device.destroy_buffer(b, None),
                VulkanResource::Memory(m) => self.device.free_memory(m, None),
                VulkanResource::Image(i) => self.device.destroy_image(i, None),
                VulkanResource::ImageView(v) => self.device.destroy_image_view(v, None),
                VulkanResource::Sampler(s) => self.device.destroy_sampler(s, None),
                VulkanResource::CommandPool(p) => self.device.destroy_command_pool(p, None),
            }
        }
        Ok(())
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        // The owning context has already synchronized by the time the
        // backend drops.
        unsafe { self.device.destroy_semaphore(self.timeline, None) };
    }
}

/// A command pool paired with the single primary command buffer allocated
/// from it. Resetting the pool resets the recording in one call.
pub struct VulkanExecutionUnit {
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
}

impl VulkanExecutionUnit {
    /// The command buffer collaborators record into.
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// The pool backing this unit's recording storage.
    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }
}

/// Creates, resets, and releases [`VulkanExecutionUnit`]s.
pub struct VulkanUnitFactory {
    device: ash::Device,
    queue_family_index: u32,
}

impl UnitFactory for VulkanUnitFactory {
    type Unit = VulkanExecutionUnit;

    fn allocate(&mut self) -> Result<VulkanExecutionUnit, QueueError> {
        let pool_info =
            vk::CommandPoolCreateInfo::default().queue_family_index(self.queue_family_index);
        let command_pool = unsafe { self.device.create_command_pool(&pool_info, None) }
            .map_err(|e| map_vk_alloc_err(e, "vkCreateCommandPool"))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = match unsafe { self.device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers.into_iter().next().ok_or_else(|| {
                QueueError::Allocation("vkAllocateCommandBuffers returned no buffers".into())
            })?,
            Err(e) => {
                unsafe { self.device.destroy_command_pool(command_pool, None) };
                return Err(map_vk_alloc_err(e, "vkAllocateCommandBuffers"));
            }
        };

        debug!(
            pool = command_pool.as_raw(),
            "allocated vulkan execution unit"
        );
        Ok(VulkanExecutionUnit {
            command_pool,
            command_buffer,
        })
    }

    fn reset(&mut self, unit: &mut VulkanExecutionUnit) -> Result<(), QueueError> {
        unsafe {
            self.device
                .reset_command_pool(unit.command_pool, vk::CommandPoolResetFlags::empty())
        }
        .map_err(|e| map_vk_alloc_err(e, "vkResetCommandPool"))
    }

    fn release(&mut self, unit: VulkanExecutionUnit) {
        // Destroying the pool frees its command buffer with it.
        unsafe { self.device.destroy_command_pool(unit.command_pool, None) };
    }
}

fn map_vk_err(err: vk::Result, call: &str) -> QueueError {
    match err {
        vk::Result::ERROR_DEVICE_LOST => QueueError::DeviceLost,
        other => QueueError::Submission(format!("{call} failed: {other:?}")),
    }
}

fn map_vk_alloc_err(err: vk::Result, call: &str) -> QueueError {
    match err {
        vk::Result::ERROR_DEVICE_LOST => QueueError::DeviceLost,
        other => QueueError::Allocation(format!("{call} failed: {other:?}")),
    }
}
