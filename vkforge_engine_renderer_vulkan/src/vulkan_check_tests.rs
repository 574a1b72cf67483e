//! Unit tests for vulkan_check.rs

use ash::vk;
use vkforge_engine::vkforge::Error;
use crate::vulkan_check::error_from_vk;

// ============================================================================
// RESULT CODE MAPPING
// ============================================================================

#[test]
fn test_device_lost_maps_to_device_lost() {
    assert_eq!(error_from_vk("vkQueueSubmit", vk::Result::ERROR_DEVICE_LOST), Error::DeviceLost);
}

#[test]
fn test_timeouts_map_to_timeout() {
    assert_eq!(error_from_vk("vkWaitForFences", vk::Result::TIMEOUT), Error::Timeout);
    assert_eq!(error_from_vk("vkAcquireNextImageKHR", vk::Result::NOT_READY), Error::Timeout);
}

#[test]
fn test_out_of_memory_codes() {
    assert_eq!(error_from_vk("vkAllocateMemory", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY), Error::OutOfMemory);
    assert_eq!(error_from_vk("vkAllocateMemory", vk::Result::ERROR_OUT_OF_HOST_MEMORY), Error::OutOfMemory);
}

#[test]
fn test_other_codes_keep_call_and_raw_code() {
    let err = error_from_vk("vkCreateImage", vk::Result::ERROR_FORMAT_NOT_SUPPORTED);
    assert_eq!(
        err,
        Error::ApiCallFailed { call: "vkCreateImage", code: vk::Result::ERROR_FORMAT_NOT_SUPPORTED.as_raw() }
    );
    assert!(err.to_string().contains("vkCreateImage"));
}
