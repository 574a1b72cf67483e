//! Unit tests for error.rs
//!
//! Tests Error variants, their Display output and propagation through Result.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkCreateImage failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkCreateImage failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_unsupported_format_display() {
    let err = Error::UnsupportedFormat("BC7 with OPTIMAL tiling".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Unsupported format"));
    assert!(display.contains("BC7"));
}

#[test]
fn test_no_suitable_memory_type_display_is_hex() {
    let err = Error::NoSuitableMemoryType { type_bits: 0b1010, properties: 0x6 };
    let display = format!("{}", err);
    assert!(display.contains("0xa"));
    assert!(display.contains("0x6"));
}

#[test]
fn test_api_call_failed_display() {
    let err = Error::ApiCallFailed { call: "vkQueueSubmit", code: -4 };
    let display = format!("{}", err);
    assert!(display.contains("vkQueueSubmit"));
    assert!(display.contains("-4"));
}

#[test]
fn test_not_implemented_display() {
    let err = Error::NotImplemented("texture map");
    assert_eq!(format!("{}", err), "Not implemented: texture map");
}

#[test]
fn test_wait_errors_display() {
    assert_eq!(format!("{}", Error::Timeout), "Wait timed out");
    assert_eq!(format!("{}", Error::DeviceLost), "Device lost");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_names_variant() {
    assert!(format!("{:?}", Error::ResourceNotReady("srv".into())).contains("ResourceNotReady"));
    assert!(format!("{:?}", Error::NoSuitableQueueFamily("COMPUTE".into())).contains("NoSuitableQueueFamily"));
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::ApiCallFailed { call: "vkAllocateMemory", code: -2 };
    assert_eq!(err.clone(), err);
    assert_ne!(Error::Timeout, Error::DeviceLost);
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::NotImplemented("copy to texture"))
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::NotImplemented("copy to texture")));
}
