use std::ffi::{c_char, c_void, CStr};
use ash::vk;
use raw_window_handle::HasDisplayHandle;
use winit::window::Window;
use crate::renderer::error::InitError;

/// Initializes Vulkan and keeps the Vulkan instance alive
pub struct RenderInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    debug_utils: Option<DebugUtils>,
}

struct DebugUtils {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl RenderInstance {
    const ENABLE_VALIDATION_LAYERS: bool = cfg!(debug_assertions);
    const REQUIRED_VALIDATION_LAYERS: &'static [&'static CStr] = &[
        c"VK_LAYER_KHRONOS_validation",
    ];

    pub fn new(window: &Window) -> Result<Self, InitError> {
        let entry = ash::Entry::linked();

        let validation = Self::ENABLE_VALIDATION_LAYERS
            && Self::validation_supported(&entry);

        let instance = Self::create_instance(&entry, window, validation)?;

        let debug_utils = if validation {
            match Self::create_debug_utils_messenger(&entry, &instance) {
                Ok(debug_utils) => Some(debug_utils),
                Err(err) => {
                    unsafe {
                        instance.destroy_instance(None);
                    }
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
        })
    }

    fn create_instance(
        entry: &ash::Entry,
        window: &Window,
        validation: bool,
    ) -> Result<ash::Instance, InitError> {
        let application_info = vk::ApplicationInfo::default()
            .application_name(c"vkswap")
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"vkswap")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_2);
        let enabled_layer_names = if validation {
            Self::REQUIRED_VALIDATION_LAYERS
                .iter()
                .map(|layer| layer.as_ptr())
                .collect::<Vec<*const c_char>>()
        } else {
            Vec::new()
        };
        let enabled_extension_names = Self::get_required_instance_extensions(window, validation)?
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();
        let mut debug_info = debug_utils_messenger_create_info();
        let mut instance_info = vk::InstanceCreateInfo::default()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);
        // Also reports problems inside vkCreateInstance/vkDestroyInstance
        if validation {
            instance_info = instance_info.push_next(&mut debug_info);
        }

        #[cfg(target_os = "macos")]
        let instance_info = instance_info
            .flags(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR);

        Ok(unsafe {
            entry.create_instance(&instance_info, None)?
        })
    }

    fn create_debug_utils_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<DebugUtils, vk::Result> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_utils_info = debug_utils_messenger_create_info();
        let messenger = unsafe {
            loader.create_debug_utils_messenger(&debug_utils_info, None)?
        };
        Ok(DebugUtils { loader, messenger })
    }

    fn get_required_instance_extensions(
        window: &Window,
        validation: bool,
    ) -> Result<Vec<&'static CStr>, InitError> {
        let mut exts = ash_window::enumerate_required_extensions(
            window.display_handle()?.as_raw()
        )?
            .iter()
            .map(|ext| unsafe {
                CStr::from_ptr(*ext)
            })
            .collect::<Vec<_>>();

        if validation {
            exts.push(ash::ext::debug_utils::NAME);
        }

        #[cfg(target_os = "macos")]
        {
            exts.push(ash::khr::portability_enumeration::NAME);
            exts.push(ash::khr::get_physical_device_properties2::NAME);
        }

        Ok(exts)
    }

    /// Validation needs both the Khronos layer and the debug utils extension.
    fn validation_supported(entry: &ash::Entry) -> bool {
        let supported_layers = unsafe {
            entry.enumerate_instance_layer_properties()
        }.unwrap_or_default();
        let supported_exts = unsafe {
            entry.enumerate_instance_extension_properties(None)
        }.unwrap_or_default();

        for layer in Self::REQUIRED_VALIDATION_LAYERS {
            let found = supported_layers
                .iter()
                .any(|props| props.layer_name_as_c_str().is_ok_and(|name| name == *layer));
            if !found {
                log::warn!("Validation layer {:?} not available, continuing without it", layer);
                return false;
            }
        }

        let has_debug_utils = supported_exts
            .iter()
            .any(|props| {
                props.extension_name_as_c_str().is_ok_and(|name| name == ash::ext::debug_utils::NAME)
            });
        if !has_debug_utils {
            log::warn!("{:?} not available, continuing without validation", ash::ext::debug_utils::NAME);
        }
        has_debug_utils
    }
}

impl Drop for RenderInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some(debug_utils) = self.debug_utils.take() {
                debug_utils.loader.destroy_debug_utils_messenger(debug_utils.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::debug!("Destroyed Vulkan instance");
    }
}

fn debug_utils_messenger_create_info(
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    let message_severity = vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    let message_type = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(message_severity)
        .message_type(message_type)
        .pfn_user_callback(Some(debug_callback))
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let msg_type = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "[Unknown]",
    };
    let msg = unsafe {
        if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
            c"<no message>"
        } else {
            CStr::from_ptr((*p_callback_data).p_message)
        }
    };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            log::trace!("[Verbose]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Warning]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Error]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::info!("[Info]{} {:?}", msg_type, msg);
        }
        _ => {
            log::warn!("[Unknown]{} {:?}", msg_type, msg);
        }
    }

    vk::FALSE
}
