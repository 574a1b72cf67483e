/// VulkanInstance - loader entry, instance and validation messenger

use ash::vk;
use std::ffi::{CStr, CString};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::Config;
use vkforge_engine::{engine_error, engine_info, engine_warn};

/// Name of the Khronos validation layer
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Surface extensions enabled whenever the loader exposes them, so any window
/// created later can get a surface.
const SURFACE_EXTENSIONS: [&CStr; 7] = [
    ash::khr::surface::NAME,
    ash::khr::xlib_surface::NAME,
    ash::khr::xcb_surface::NAME,
    ash::khr::wayland_surface::NAME,
    ash::khr::win32_surface::NAME,
    ash::khr::android_surface::NAME,
    ash::ext::metal_surface::NAME,
];

/// Surface extensions from `SURFACE_EXTENSIONS` that appear in `available`
pub fn surface_extensions_available(available: &[&CStr]) -> Vec<&'static CStr> {
    SURFACE_EXTENSIONS
        .iter()
        .copied()
        .filter(|name| available.contains(name))
        .collect()
}

/// Vulkan instance wrapper
///
/// Destruction is driven by `VulkanDevice::drop`, which owns the only instance.
pub struct VulkanInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    /// Surface loader, shared by every window
    pub surface_loader: ash::khr::surface::Instance,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Load Vulkan and create the instance
    ///
    /// Validation is enabled only when requested, compiled in (`vulkan-validation`)
    /// and the layer is actually installed.
    pub fn new(config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("vkforge::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.clone())
                .unwrap_or_else(|_| CString::from(c"VkForge Application"));

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"VkForge")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_0);

            let available_extensions = entry.enumerate_instance_extension_properties(None)
                .map_err(|e| {
                    engine_error!("vkforge::vulkan", "Failed to enumerate instance extensions: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate instance extensions: {:?}", e))
                })?;
            let available_names: Vec<&CStr> = available_extensions
                .iter()
                .filter_map(|ext| ext.extension_name_as_c_str().ok())
                .collect();

            let mut extension_names: Vec<*const std::os::raw::c_char> = surface_extensions_available(&available_names)
                .into_iter()
                .map(|name| name.as_ptr())
                .collect();

            let validation = config.enable_validation
                && cfg!(feature = "vulkan-validation")
                && Self::validation_layer_present(&entry);

            if config.enable_validation && !validation {
                engine_warn!("vkforge::vulkan", "Validation requested but unavailable, continuing without it");
            }

            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("vkforge::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(crate::debug::MessengerConfig {
                    severity: config.debug_severity,
                    output: config.debug_output.clone(),
                    message_filter: config.debug_message_filter,
                    break_on_error: config.break_on_validation_error,
                    panic_on_error: config.panic_on_error,
                    enable_stats: config.enable_validation_stats,
                });

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!("vkforge::vulkan", "Failed to create debug messenger: {:?}", e);
                        instance.destroy_instance(None);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;

                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            engine_info!("vkforge::vulkan", "Vulkan instance created (validation: {})", validation);

            Ok(Self {
                entry,
                instance,
                surface_loader,
                debug_utils_loader,
                debug_messenger,
            })
        }
    }

    fn validation_layer_present(entry: &ash::Entry) -> bool {
        unsafe { entry.enumerate_instance_layer_properties() }
            .map(|layers| {
                layers
                    .iter()
                    .any(|layer| layer.layer_name_as_c_str().map(|n| n == VALIDATION_LAYER).unwrap_or(false))
            })
            .unwrap_or(false)
    }

    /// Destroy the messenger and the instance. Called last during device teardown.
    pub(crate) unsafe fn destroy(&mut self) {
        if let (Some(loader), Some(messenger)) = (self.debug_utils_loader.as_ref(), self.debug_messenger.take()) {
            loader.destroy_debug_utils_messenger(messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

#[cfg(test)]
#[path = "vulkan_instance_tests.rs"]
mod tests;
