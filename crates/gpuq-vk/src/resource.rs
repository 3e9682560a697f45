use ash::vk;

/// A device-owned Vulkan object whose destruction must wait for in-flight
/// work. Scheduled through `CommandQueueContext::schedule_deletion`.
#[derive(Debug, Clone, Copy)]
pub enum VulkanResource {
    Buffer(vk::Buffer),
    Memory(vk::DeviceMemory),
    Image(vk::Image),
    ImageView(vk::ImageView),
    Sampler(vk::Sampler),
    CommandPool(vk::CommandPool),
}
