/// Device memory for buffers and images
///
/// Every resource gets its own dedicated allocation. The memory type is
/// resolved up front so an impossible request fails with
/// `NoSuitableMemoryType` before the allocator is touched.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::{AllocationError, MemoryLocation};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::{engine_error, engine_trace};

use crate::vulkan_check::vk_check;
use crate::vulkan_device::VulkanDevice;

/// Allocator location matching a set of memory property flags
pub fn memory_location_for(properties: vk::MemoryPropertyFlags) -> MemoryLocation {
    if !properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
        MemoryLocation::GpuOnly
    } else if properties.contains(vk::MemoryPropertyFlags::HOST_CACHED) {
        MemoryLocation::GpuToCpu
    } else {
        MemoryLocation::CpuToGpu
    }
}

fn allocation_error(name: &str, size: u64, e: AllocationError) -> Error {
    let size_mb = size as f64 / (1024.0 * 1024.0);
    match e {
        AllocationError::OutOfMemory => {
            engine_error!("vkforge::vulkan", "Out of GPU memory for {} ({:.2} MB)", name, size_mb);
            Error::OutOfMemory
        }
        other => {
            engine_error!("vkforge::vulkan", "Allocation of {} ({:.2} MB) failed: {:?}", name, size_mb, other);
            Error::BackendError(format!("Allocation of {} failed: {:?}", name, other))
        }
    }
}

/// Allocate and bind memory for `buffer`
pub(crate) fn allocate_buffer_memory(
    device: &VulkanDevice,
    buffer: vk::Buffer,
    properties: vk::MemoryPropertyFlags,
    name: &str,
) -> Result<Allocation> {
    let requirements = unsafe { device.device().get_buffer_memory_requirements(buffer) };
    // gpu-allocator picks the actual type, this only rejects impossible requests early
    let memory_type = device.find_memory_type(requirements.memory_type_bits, properties)?;
    engine_trace!("vkforge::vulkan", "{}: {} bytes, memory type {} satisfies {:?}", name, requirements.size, memory_type, properties);

    let allocation = device.allocator()?
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: memory_location_for(properties),
            linear: true,
            allocation_scheme: AllocationScheme::DedicatedBuffer(buffer),
        })
        .map_err(|e| allocation_error(name, requirements.size, e))?;

    if let Err(e) = unsafe { device.device().bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) } {
        free_memory(device, allocation);
        return Err(vk_check("vkBindBufferMemory", e));
    }

    Ok(allocation)
}

/// Allocate and bind memory for `image`
pub(crate) fn allocate_image_memory(
    device: &VulkanDevice,
    image: vk::Image,
    properties: vk::MemoryPropertyFlags,
    name: &str,
) -> Result<Allocation> {
    let requirements = unsafe { device.device().get_image_memory_requirements(image) };
    // gpu-allocator picks the actual type, this only rejects impossible requests early
    let memory_type = device.find_memory_type(requirements.memory_type_bits, properties)?;
    engine_trace!("vkforge::vulkan", "{}: {} bytes, memory type {} satisfies {:?}", name, requirements.size, memory_type, properties);

    let allocation = device.allocator()?
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: memory_location_for(properties),
            linear: false,
            allocation_scheme: AllocationScheme::DedicatedImage(image),
        })
        .map_err(|e| allocation_error(name, requirements.size, e))?;

    if let Err(e) = unsafe { device.device().bind_image_memory(image, allocation.memory(), allocation.offset()) } {
        free_memory(device, allocation);
        return Err(vk_check("vkBindImageMemory", e));
    }

    Ok(allocation)
}

/// Return an allocation to the allocator. Never fails loudly, used on teardown paths.
pub(crate) fn free_memory(device: &VulkanDevice, allocation: Allocation) {
    if let Ok(mut allocator) = device.allocator() {
        allocator.free(allocation).ok();
    }
}

#[cfg(test)]
#[path = "vulkan_memory_tests.rs"]
mod tests;
