//! Unit tests for vulkan_memory.rs
//!
//! Property flags to allocator location mapping.

use ash::vk;
use gpu_allocator::MemoryLocation;
use crate::vulkan_memory::memory_location_for;

// ============================================================================
// MEMORY LOCATION
// ============================================================================

#[test]
fn test_device_local_maps_to_gpu_only() {
    assert_eq!(memory_location_for(vk::MemoryPropertyFlags::DEVICE_LOCAL), MemoryLocation::GpuOnly);
}

#[test]
fn test_host_visible_maps_to_upload() {
    let flags = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    assert_eq!(memory_location_for(flags), MemoryLocation::CpuToGpu);
}

#[test]
fn test_host_cached_maps_to_readback() {
    let flags = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED;
    assert_eq!(memory_location_for(flags), MemoryLocation::GpuToCpu);
}

#[test]
fn test_device_local_host_visible_is_upload() {
    let flags = vk::MemoryPropertyFlags::DEVICE_LOCAL | vk::MemoryPropertyFlags::HOST_VISIBLE;
    assert_eq!(memory_location_for(flags), MemoryLocation::CpuToGpu);
}
