use std::ffi::{c_char, CStr};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use crate::renderer::contexts::device_ctx::instance::RenderInstance;
use crate::renderer::contexts::device_ctx::queue::{Queue, QueueFamily};
use crate::renderer::error::InitError;

/// Logical device, its only queue and the memory allocator bound to them
pub struct RenderDevice {
    pub logical: Arc<ash::Device>,
    pub physical: vk::PhysicalDevice,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,

    // Graphics + transfer, also used for presentation
    pub queue: Queue,

    // Must be dropped before the logical device
    memory_allocator: ManuallyDrop<Mutex<Allocator>>,
}

impl RenderDevice {
    pub fn new(instance: &RenderInstance) -> Result<Self, InitError> {
        let (physical_device, queue_family) = Self::select_physical_device(&instance.instance)?;

        let properties = unsafe {
            instance.instance.get_physical_device_properties(physical_device)
        };
        let memory_properties = unsafe {
            instance.instance.get_physical_device_memory_properties(physical_device)
        };
        log_device(&properties, &memory_properties);

        let (logical_device, queue) = Self::create_logical_device(
            &instance.instance,
            &physical_device,
            queue_family,
        )?;

        let memory_allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: logical_device.clone(),
            physical_device,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_memory_information: cfg!(debug_assertions),
                log_leaks_on_shutdown: true,
                store_stack_traces: false,
                log_allocations: false,
                log_frees: false,
                log_stack_traces: false,
            },
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let memory_allocator = match memory_allocator {
            Ok(allocator) => allocator,
            Err(err) => {
                unsafe {
                    logical_device.destroy_device(None);
                }
                return Err(err.into());
            }
        };

        Ok(Self {
            logical: Arc::new(logical_device),
            physical: physical_device,
            memory_properties,
            queue,
            memory_allocator: ManuallyDrop::new(Mutex::new(memory_allocator)),
        })
    }

    pub fn memory_allocator(&self) -> &Mutex<Allocator> {
        &self.memory_allocator
    }

    pub fn find_memory_type(
        &self,
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<u32, InitError> {
        find_memory_type(&self.memory_properties, type_bits, properties)
    }

    fn select_physical_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, QueueFamily), InitError> {
        let devices = unsafe {
            instance.enumerate_physical_devices()?
        };
        let device_types = devices
            .iter()
            .map(|device| unsafe {
                instance.get_physical_device_properties(*device).device_type
            })
            .collect::<Vec<_>>();

        let device = pick_physical_device(&device_types)
            .map(|i| devices[i])
            .ok_or(InitError::NoSuitableDevice)?;

        let queue_families = unsafe {
            instance.get_physical_device_queue_family_properties(device)
        };
        let queue_family = QueueFamily::select_graphics_transfer(&queue_families)
            .ok_or(InitError::NoSuitableQueue)?;

        Ok((device, queue_family))
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: &vk::PhysicalDevice,
        queue_family: QueueFamily,
    ) -> Result<(ash::Device, Queue), InitError> {
        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family.index)
                .queue_priorities(&queue_priorities),
        ];

        let enabled_extension_names = Self::get_required_device_extensions()
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();
        let enabled_features = vk::PhysicalDeviceFeatures::default();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&enabled_extension_names)
            .enabled_features(&enabled_features);

        let device = unsafe {
            instance.create_device(*physical_device, &device_create_info, None)?
        };

        let queue = unsafe {
            let handle = device.get_device_queue(queue_family.index, 0);
            Queue::new(queue_family, handle)
        };

        Ok((device, queue))
    }

    fn get_required_device_extensions() -> Vec<&'static CStr> {
        vec![
            ash::khr::swapchain::NAME,

            #[cfg(target_os = "macos")]
            ash::khr::portability_subset::NAME,
        ]
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        unsafe {
            ManuallyDrop::drop(&mut self.memory_allocator);
            self.logical.destroy_device(None);
        }
        log::debug!("Destroyed logical device");
    }
}

/// First discrete GPU, otherwise the first device enumerated.
pub fn pick_physical_device(device_types: &[vk::PhysicalDeviceType]) -> Option<usize> {
    device_types
        .iter()
        .position(|ty| *ty == vk::PhysicalDeviceType::DISCRETE_GPU)
        .or(if device_types.is_empty() { None } else { Some(0) })
}

/// Index of the first memory type allowed by `type_bits` whose flags contain `properties`.
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Result<u32, InitError> {
    find_memory_type_index(memory_properties, type_bits, properties)
        .ok_or(InitError::NoSuitableMemoryType { type_bits, properties })
}

pub fn find_memory_type_index(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Option<u32> {
    memory_properties.memory_types[..memory_properties.memory_type_count as usize]
        .iter()
        .enumerate()
        .position(|(i, memory_type)| {
            type_bits & (1 << i) != 0 && memory_type.property_flags.contains(properties)
        })
        .map(|i| i as u32)
}

fn log_device(
    properties: &vk::PhysicalDeviceProperties,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
) {
    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from("<unnamed>"));
    log::info!("Selected device {} ({:?})", name, properties.device_type);

    let types = &memory_properties.memory_types[..memory_properties.memory_type_count as usize];
    for (i, memory_type) in types.iter().enumerate() {
        let heap = &memory_properties.memory_heaps[memory_type.heap_index as usize];
        log::debug!(
            "Memory type {}: heap {} ({} MiB), {:?}",
            i,
            memory_type.heap_index,
            heap.size / (1024 * 1024),
            memory_type.property_flags,
        );
    }
}
