//! Smoke test: VulkanBackend on a real driver.
//!
//! Creates an instance and a device with timeline semaphores, runs one
//! empty submission through a CommandQueueContext, and checks reuse and
//! deferred deletion end to end. Ignored by default since it needs a
//! Vulkan 1.2 capable driver.
//!
//! Run with: cargo test -p gpuq-vk --test vulkan_backend_test -- --ignored --nocapture

use ash::vk;
use gpuq_core::{CommandQueueContext, PoolConfig};
use gpuq_vk::{VulkanBackend, VulkanResource};

#[test]
#[ignore = "requires a Vulkan 1.2 driver"]
fn submit_synchronize_and_deferred_delete() {
    gpuq_common::logging::init_logging();

    let entry = match unsafe { ash::Entry::load() } {
        Ok(e) => e,
        Err(err) => {
            println!("no Vulkan loader available: {err}");
            return;
        }
    };

    let app_info = vk::ApplicationInfo::default().api_version(vk::API_VERSION_1_2);
    let instance_info = vk::InstanceCreateInfo::default().application_info(&app_info);
    let instance = unsafe { entry.create_instance(&instance_info, None) }.expect("instance");

    let physical_devices =
        unsafe { instance.enumerate_physical_devices() }.expect("physical devices");
    let Some(&physical_device) = physical_devices.first() else {
        println!("no Vulkan physical device present");
        unsafe { instance.destroy_instance(None) };
        return;
    };
    let queue_family_index = 0u32;

    let priorities = [1.0f32];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(queue_family_index)
        .queue_priorities(&priorities)];
    let mut vk12 = vk::PhysicalDeviceVulkan12Features::default().timeline_semaphore(true);
    let device_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .push_next(&mut vk12);
    let device =
        unsafe { instance.create_device(physical_device, &device_info, None) }.expect("device");
    let queue = unsafe { device.get_device_queue(queue_family_index, 0) };

    let backend =
        VulkanBackend::new(device.clone(), queue, queue_family_index, 0).expect("backend");
    let desc = backend.context_desc();
    let factory = backend.unit_factory();
    let mut context =
        CommandQueueContext::new(desc, backend, factory, &PoolConfig::default()).expect("context");

    // Record an empty command buffer and run it through the queue.
    let unit = context.acquire_unit().expect("acquire");
    let cb = unit.command_buffer();
    let begin =
        vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe { device.begin_command_buffer(cb, &begin) }.expect("begin");
    unsafe { device.end_command_buffer(cb) }.expect("end");
    let token = context.execute(unit).expect("execute");
    assert_eq!(token.value(), 1);

    // Defer-delete a small buffer gated on that submission.
    let buffer_info = vk::BufferCreateInfo::default()
        .size(64)
        .usage(vk::BufferUsageFlags::TRANSFER_SRC)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let buffer = unsafe { device.create_buffer(&buffer_info, None) }.expect("buffer");
    context
        .schedule_deletion(VulkanResource::Buffer(buffer))
        .expect("schedule deletion");

    context.synchronize().expect("synchronize");
    assert_eq!(context.pending_units(), 0);
    assert_eq!(context.pending_deletions(), 0);

    // The submitted unit comes back from the pool after synchronize.
    let unit = context.acquire_unit().expect("acquire after synchronize");
    context.release_unit(unit);

    drop(context);
    unsafe { device.destroy_device(None) };
    unsafe { instance.destroy_instance(None) };
}
