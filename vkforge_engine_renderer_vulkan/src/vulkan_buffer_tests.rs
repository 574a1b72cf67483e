//! Unit tests for vulkan_buffer.rs
//!
//! Usage flag derivation, memory class selection and range validation.

use ash::vk;
use vkforge_engine::vkforge::Error;
use vkforge_engine::vkforge::render::{AccessHint, BufferBinding, BufferDesc, BufferUsage};
use crate::vulkan_buffer::{buffer_memory_properties, buffer_usage_flags, check_range};

fn desc(usage: BufferUsage, binding: BufferBinding, access_hint: AccessHint) -> BufferDesc {
    BufferDesc {
        usage,
        access_hint,
        binding,
        size_in_bytes: 256,
        structure_byte_stride: 0,
    }
}

// ============================================================================
// USAGE FLAGS
// ============================================================================

#[test]
fn test_static_buffers_are_transfer_targets() {
    let flags = buffer_usage_flags(&desc(BufferUsage::Static, BufferBinding::Vertex, AccessHint::GPU_READ));
    assert!(flags.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
    assert!(flags.contains(vk::BufferUsageFlags::TRANSFER_DST));
}

#[test]
fn test_dynamic_buffers_skip_transfer_bits() {
    let flags = buffer_usage_flags(&desc(BufferUsage::Dynamic, BufferBinding::Constant, AccessHint::CPU_WRITE));
    assert_eq!(flags, vk::BufferUsageFlags::UNIFORM_BUFFER);
}

#[test]
fn test_binding_selects_buffer_kind() {
    let index = buffer_usage_flags(&desc(BufferUsage::Dynamic, BufferBinding::Index, AccessHint::GPU_READ));
    assert!(index.contains(vk::BufferUsageFlags::INDEX_BUFFER));

    let unordered = buffer_usage_flags(&desc(BufferUsage::Dynamic, BufferBinding::Vertex, AccessHint::GPU_UNORDERED));
    assert!(unordered.contains(vk::BufferUsageFlags::STORAGE_BUFFER));
}

// ============================================================================
// MEMORY CLASS
// ============================================================================

#[test]
fn test_static_is_device_local() {
    assert_eq!(buffer_memory_properties(BufferUsage::Static), vk::MemoryPropertyFlags::DEVICE_LOCAL);
}

#[test]
fn test_dynamic_is_host_coherent() {
    let props = buffer_memory_properties(BufferUsage::Dynamic);
    assert!(props.contains(vk::MemoryPropertyFlags::HOST_VISIBLE));
    assert!(props.contains(vk::MemoryPropertyFlags::HOST_COHERENT));
    assert!(!props.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL));
}

// ============================================================================
// RANGES
// ============================================================================

#[test]
fn test_range_inside_buffer() {
    assert!(check_range(256, 0, 256).is_ok());
    assert!(check_range(256, 128, 128).is_ok());
    assert!(check_range(256, 256, 0).is_ok());
}

#[test]
fn test_range_outside_buffer() {
    assert!(matches!(check_range(256, 200, 57), Err(Error::InvalidResource(_))));
    assert!(check_range(256, u64::MAX, 2).is_err());
}
