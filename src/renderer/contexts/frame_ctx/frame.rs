use std::sync::Arc;
use ash::vk;

/// Per-slot command recording and synchronization state.
///
/// Every handle starts out null and is filled in as it is created, so a slot
/// that fails halfway through construction still releases what it got.
pub struct FrameSlot {
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,

    // Signaled by the presentation engine once the acquired image can be rendered to.
    pub image_available: vk::Semaphore,

    // Signaled when the submitted commands finish. Presentation waits on it.
    pub render_complete: vk::Semaphore,

    // Signaled when the GPU retires this slot's submission. Created signaled.
    pub in_flight: vk::Fence,

    device: Arc<ash::Device>,
}

impl FrameSlot {
    pub fn new(
        device: Arc<ash::Device>,
        queue_family_index: u32,
    ) -> Result<Self, vk::Result> {
        let mut slot = Self {
            command_pool: vk::CommandPool::null(),
            command_buffer: vk::CommandBuffer::null(),
            image_available: vk::Semaphore::null(),
            render_complete: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
            device,
        };

        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);
        slot.command_pool = unsafe {
            slot.device.create_command_pool(&pool_info, None)?
        };

        let buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(slot.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        slot.command_buffer = unsafe {
            slot.device.allocate_command_buffers(&buffer_info)?[0]
        };

        unsafe {
            slot.image_available = slot.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?;
            slot.render_complete = slot.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?;
            slot.in_flight = slot.device.create_fence(
                &vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED),
                None,
            )?;
        }

        Ok(slot)
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        unsafe {
            // Frees the command buffer with it
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_semaphore(self.render_complete, None);
            self.device.destroy_fence(self.in_flight, None);
        }
    }
}
