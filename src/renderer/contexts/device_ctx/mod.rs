pub mod instance;
pub mod device;
pub mod queue;
pub mod target;

use std::sync::Mutex;
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use winit::window::Window;
use crate::renderer::contexts::device_ctx::device::RenderDevice;
use crate::renderer::contexts::device_ctx::instance::RenderInstance;
use crate::renderer::contexts::device_ctx::queue::Queue;
use crate::renderer::error::InitError;

/// Responsibilities:
/// - Manage the Vulkan instance, device, and queue
/// - Own the memory allocator
/// - Answer memory type queries for raw device allocations
pub struct RenderDeviceContext {
    // Field order is drop order: the device goes before the instance
    pub device: RenderDevice,
    pub instance: RenderInstance,
}

impl RenderDeviceContext {
    pub fn new(window: &Window) -> Result<Self, InitError> {
        let instance = RenderInstance::new(window)?;
        let device = RenderDevice::new(&instance)?;

        Ok(Self {
            device,
            instance,
        })
    }

    pub fn logical(&self) -> &ash::Device {
        &self.device.logical
    }

    pub fn physical(&self) -> vk::PhysicalDevice {
        self.device.physical
    }

    pub fn queue(&self) -> &Queue {
        &self.device.queue
    }

    pub fn queue_family_index(&self) -> u32 {
        self.device.queue.family.index
    }

    pub fn memory_allocator(&self) -> &Mutex<Allocator> {
        self.device.memory_allocator()
    }

    pub fn find_memory_type(
        &self,
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<u32, InitError> {
        self.device.find_memory_type(type_bits, properties)
    }

    /// Blocks until every queue of the device is idle.
    pub fn wait_idle(&self) -> Result<(), vk::Result> {
        unsafe {
            self.device.logical.device_wait_idle()
        }
    }
}
