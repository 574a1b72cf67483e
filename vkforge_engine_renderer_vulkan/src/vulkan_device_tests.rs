//! Unit tests for vulkan_device.rs
//!
//! Device suitability, queue family selection, memory type lookup and
//! format feature checks. None of these need a GPU.

use ash::vk;
use vkforge_engine::vkforge::Error;
use crate::vulkan_device::{
    find_memory_type, format_features_supported, is_device_suitable, select_queue_family_index,
    QueueFamilyIndices, QueueKind,
};

fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: 1,
        ..Default::default()
    }
}

fn memory_properties(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
    let mut props = vk::PhysicalDeviceMemoryProperties::default();
    for (i, flags) in types.iter().enumerate() {
        props.memory_types[i].property_flags = *flags;
    }
    props.memory_type_count = types.len() as u32;
    props
}

// ============================================================================
// DEVICE SUITABILITY
// ============================================================================

#[test]
fn test_empty_requirement_is_always_suitable() {
    let required: [&str; 0] = [];
    let supported: [&str; 0] = [];
    assert!(is_device_suitable(&required, &supported));
}

#[test]
fn test_missing_extension_is_unsuitable() {
    let required = ["VK_KHR_swapchain", "VK_KHR_maintenance1"];
    let supported = vec!["VK_KHR_swapchain".to_string()];
    assert!(!is_device_suitable(&required, &supported));
}

#[test]
fn test_superset_is_suitable() {
    let required = ["VK_KHR_swapchain"];
    let supported = ["VK_KHR_maintenance1", "VK_KHR_swapchain", "VK_EXT_memory_budget"];
    assert!(is_device_suitable(&required, &supported));
}

// ============================================================================
// QUEUE FAMILY SELECTION
// ============================================================================

#[test]
fn test_single_universal_family_aliases_everything() {
    let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)];
    let indices = QueueFamilyIndices::resolve(&families).unwrap();

    assert_eq!(indices.graphics, 0);
    assert_eq!(indices.compute, 0);
    assert_eq!(indices.transfer, 0);
    assert_eq!(indices.unique(), vec![0]);
}

#[test]
fn test_dedicated_compute_preferred() {
    let families = [
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
    ];
    assert_eq!(select_queue_family_index(&families, vk::QueueFlags::COMPUTE).unwrap(), 1);
}

#[test]
fn test_dedicated_transfer_preferred() {
    let families = [
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        family(vk::QueueFlags::TRANSFER),
    ];
    let indices = QueueFamilyIndices::resolve(&families).unwrap();

    assert_eq!(indices.graphics, 0);
    assert_eq!(indices.compute, 1);
    assert_eq!(indices.transfer, 2);
    assert_eq!(indices.unique(), vec![0, 1, 2]);
    assert_eq!(indices.get(QueueKind::Transfer), 2);
}

#[test]
fn test_transfer_falls_back_to_any_family_with_bit() {
    let families = [
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
    ];
    // No family has transfer without compute, so the first one carrying it wins
    assert_eq!(select_queue_family_index(&families, vk::QueueFlags::TRANSFER).unwrap(), 0);
}

#[test]
fn test_missing_capability_fails() {
    let families = [family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)];
    let result = select_queue_family_index(&families, vk::QueueFlags::GRAPHICS);
    assert!(matches!(result, Err(Error::NoSuitableQueueFamily(_))));
}

#[test]
fn test_unique_keeps_graphics_first_and_dedups() {
    let indices = QueueFamilyIndices { graphics: 2, compute: 0, transfer: 2 };
    assert_eq!(indices.unique(), vec![2, 0]);
}

// ============================================================================
// MEMORY TYPES
// ============================================================================

#[test]
fn test_find_memory_type_respects_type_bits() {
    let props = memory_properties(&[
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    ]);

    let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    assert_eq!(find_memory_type(&props, 0b111, host).unwrap(), 1);
    assert_eq!(find_memory_type(&props, 0b100, host).unwrap(), 2);
    assert_eq!(find_memory_type(&props, 0b111, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 0);
}

#[test]
fn test_find_memory_type_no_match() {
    let props = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
    let result = find_memory_type(&props, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE);

    assert_eq!(
        result,
        Err(Error::NoSuitableMemoryType {
            type_bits: 0b1,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw(),
        })
    );
}

#[test]
fn test_find_memory_type_ignores_types_past_count() {
    let mut props = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
    props.memory_types[1].property_flags = vk::MemoryPropertyFlags::HOST_VISIBLE;
    assert!(find_memory_type(&props, 0b11, vk::MemoryPropertyFlags::HOST_VISIBLE).is_err());
}

// ============================================================================
// FORMAT FEATURES
// ============================================================================

#[test]
fn test_format_features_per_tiling() {
    let props = vk::FormatProperties {
        linear_tiling_features: vk::FormatFeatureFlags::TRANSFER_SRC,
        optimal_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE | vk::FormatFeatureFlags::TRANSFER_DST,
        ..Default::default()
    };

    assert!(format_features_supported(&props, vk::ImageTiling::OPTIMAL, vk::FormatFeatureFlags::SAMPLED_IMAGE));
    assert!(!format_features_supported(&props, vk::ImageTiling::LINEAR, vk::FormatFeatureFlags::SAMPLED_IMAGE));
    assert!(format_features_supported(&props, vk::ImageTiling::LINEAR, vk::FormatFeatureFlags::TRANSFER_SRC));
}

#[test]
fn test_format_features_monotonic() {
    let props = vk::FormatProperties {
        optimal_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE,
        ..Default::default()
    };
    let wider = vk::FormatFeatureFlags::SAMPLED_IMAGE | vk::FormatFeatureFlags::COLOR_ATTACHMENT;

    // Not supported for F implies not supported for any superset of F
    assert!(!format_features_supported(&props, vk::ImageTiling::OPTIMAL, vk::FormatFeatureFlags::COLOR_ATTACHMENT));
    assert!(!format_features_supported(&props, vk::ImageTiling::OPTIMAL, wider));
    assert!(format_features_supported(&props, vk::ImageTiling::OPTIMAL, vk::FormatFeatureFlags::empty()));
}
