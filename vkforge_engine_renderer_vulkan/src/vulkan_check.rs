/// Turning `vk::Result` failures into engine errors

use ash::vk;
use vkforge_engine::vkforge::Error;
use vkforge_engine::engine_error;

/// Map a failed Vulkan call to an engine error (pure, no logging)
pub fn error_from_vk(call: &'static str, code: vk::Result) -> Error {
    match code {
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
        vk::Result::TIMEOUT | vk::Result::NOT_READY => Error::Timeout,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY
        | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
        | vk::Result::ERROR_OUT_OF_POOL_MEMORY => Error::OutOfMemory,
        _ => Error::ApiCallFailed { call, code: code.as_raw() },
    }
}

/// Log a failed Vulkan call and build the matching error
///
/// Used as `.map_err(|e| vk_check("vkCreateBuffer", e))?`.
pub fn vk_check(call: &'static str, code: vk::Result) -> Error {
    engine_error!("vkforge::vulkan", "{} failed: {:?}", call, code);
    error_from_vk(call, code)
}

#[cfg(test)]
#[path = "vulkan_check_tests.rs"]
mod tests;
