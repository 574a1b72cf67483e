//! Unit tests for vulkan_staging.rs
//!
//! Bounds checking of staged transfers.

use vkforge_engine::vkforge::Error;
use crate::vulkan_staging::{check_staging_fits, STAGING_BUFFER_SIZE};

// ============================================================================
// BOUNDS
// ============================================================================

#[test]
fn test_capacity_is_128_mib() {
    assert_eq!(STAGING_BUFFER_SIZE, 134_217_728);
}

#[test]
fn test_transfer_filling_buffer_exactly_fits() {
    assert!(check_staging_fits(STAGING_BUFFER_SIZE, 0, STAGING_BUFFER_SIZE).is_ok());
    assert!(check_staging_fits(1024, 1000, 24).is_ok());
}

#[test]
fn test_oversized_transfer_rejected() {
    let result = check_staging_fits(STAGING_BUFFER_SIZE, 0, STAGING_BUFFER_SIZE + 1);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_offset_past_end_rejected() {
    assert!(check_staging_fits(1024, 1000, 25).is_err());
    assert!(check_staging_fits(1024, u64::MAX, 1).is_err());
}
