//! Unit tests for vulkan_render_window.rs
//!
//! Swapchain parameter choices, the fixed two-value clear list and the
//! frame-in-flight bookkeeping.

use ash::vk;
use vkforge_engine::vkforge::Error;
use vkforge_engine::vkforge::render::{ClearFlags, Color, ElementFormat};
use crate::vulkan_frame_buffer::{AttachmentClear, DEFAULT_CLEAR_COLOR};
use crate::vulkan_render_window::{
    choose_depth_format, choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
    window_clear_values, window_subpass_dependency, FrameCursor, WindowClear,
};

fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

fn capabilities(min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: min_count,
        max_image_count: max_count,
        min_image_extent: vk::Extent2D { width: 16, height: 16 },
        max_image_extent: vk::Extent2D { width: 1920, height: 1080 },
        ..Default::default()
    }
}

// ============================================================================
// SURFACE FORMAT
// ============================================================================

#[test]
fn test_requested_format_kept_when_offered() {
    let formats = [surface_format(vk::Format::R8G8B8A8_UNORM), surface_format(vk::Format::B8G8R8A8_UNORM)];
    let chosen = choose_surface_format(&formats, vk::Format::B8G8R8A8_UNORM).unwrap();
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
}

#[test]
fn test_missing_format_falls_back_to_first() {
    let formats = [surface_format(vk::Format::R8G8B8A8_SRGB), surface_format(vk::Format::B8G8R8A8_SRGB)];
    let chosen = choose_surface_format(&formats, vk::Format::R16G16B16A16_SFLOAT).unwrap();
    assert_eq!(chosen.format, vk::Format::R8G8B8A8_SRGB);

    // Deterministic: same input, same answer
    let again = choose_surface_format(&formats, vk::Format::R16G16B16A16_SFLOAT).unwrap();
    assert_eq!(again.format, chosen.format);
}

#[test]
fn test_color_space_must_match_too() {
    let formats = [
        surface_format(vk::Format::R8G8B8A8_UNORM),
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        },
    ];
    let chosen = choose_surface_format(&formats, vk::Format::B8G8R8A8_UNORM).unwrap();
    assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
}

#[test]
fn test_undefined_surface_accepts_anything() {
    let formats = [surface_format(vk::Format::UNDEFINED)];
    let chosen = choose_surface_format(&formats, vk::Format::B8G8R8A8_UNORM).unwrap();
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_no_formats() {
    assert!(choose_surface_format(&[], vk::Format::B8G8R8A8_UNORM).is_none());
}

// ============================================================================
// PRESENT MODE
// ============================================================================

#[test]
fn test_mailbox_preferred() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
    assert_eq!(choose_present_mode(&modes, 1), vk::PresentModeKHR::MAILBOX);
}

#[test]
fn test_fifo_fallback() {
    assert_eq!(choose_present_mode(&[vk::PresentModeKHR::FIFO], 1), vk::PresentModeKHR::FIFO);
    assert_eq!(choose_present_mode(&[], 1), vk::PresentModeKHR::FIFO);
}

#[test]
fn test_zero_sync_interval_prefers_immediate() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
    assert_eq!(choose_present_mode(&modes, 0), vk::PresentModeKHR::IMMEDIATE);
    assert_eq!(choose_present_mode(&modes[..2], 0), vk::PresentModeKHR::MAILBOX);
}

// ============================================================================
// EXTENT AND IMAGE COUNT
// ============================================================================

#[test]
fn test_extent_clamped_to_surface_limits() {
    let caps = capabilities(2, 3);
    assert_eq!(choose_extent(&caps, 800, 600), vk::Extent2D { width: 800, height: 600 });
    assert_eq!(choose_extent(&caps, 4000, 8), vk::Extent2D { width: 1920, height: 16 });
}

#[test]
fn test_image_count_min_plus_one() {
    assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
}

#[test]
fn test_image_count_clamped_to_max() {
    assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
}

#[test]
fn test_image_count_unbounded_max() {
    assert_eq!(choose_image_count(&capabilities(4, 0)), 5);
}

// ============================================================================
// DEPTH FORMAT
// ============================================================================

#[test]
fn test_requested_depth_format_first() {
    let chosen = choose_depth_format(ElementFormat::D32F, |_| true);
    assert_eq!(chosen, Some(ElementFormat::D32F));
}

#[test]
fn test_depth_format_fallback_order() {
    let chosen = choose_depth_format(ElementFormat::D24S8, |format| format == ElementFormat::D16);
    assert_eq!(chosen, Some(ElementFormat::D16));
}

#[test]
fn test_color_format_never_chosen_for_depth() {
    let chosen = choose_depth_format(ElementFormat::ARGB8, |_| true);
    assert_eq!(chosen, Some(ElementFormat::D24S8));
    assert_eq!(choose_depth_format(ElementFormat::D16, |_| false), None);
}

// ============================================================================
// CLEAR VALUES
// ============================================================================

#[test]
fn test_always_two_values_with_defaults() {
    let values = window_clear_values(None);
    assert_eq!(values[0], AttachmentClear::Color(DEFAULT_CLEAR_COLOR));
    assert_eq!(values[1], AttachmentClear::DepthStencil { depth: 1.0, stencil: 0 });
}

#[test]
fn test_flags_select_staged_values() {
    let staged = WindowClear {
        flags: ClearFlags::COLOR | ClearFlags::STENCIL,
        color: Color::new(0.5, 0.5, 0.5, 1.0),
        depth: 0.25,
        stencil: 3,
    };
    let values = window_clear_values(Some(staged));

    assert_eq!(values[0], AttachmentClear::Color(Color::new(0.5, 0.5, 0.5, 1.0)));
    // DEPTH flag missing: depth stays at the default
    assert_eq!(values[1], AttachmentClear::DepthStencil { depth: 1.0, stencil: 3 });
}

#[test]
fn test_window_dependency_covers_depth() {
    let dependency = window_subpass_dependency();
    assert_eq!(dependency.src_subpass, vk::SUBPASS_EXTERNAL);
    assert!(dependency.dst_stage_mask.contains(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));
    assert!(dependency.dst_access_mask.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
    assert!(dependency.dst_access_mask.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
}

// ============================================================================
// FRAME CURSOR
// ============================================================================

/// Acquire `index` and start a frame on it, as `begin_frame` does
fn run_frame(cursor: &mut FrameCursor, index: u32) -> usize {
    cursor.check_can_begin().unwrap();
    if cursor.held_image().is_none() {
        cursor.on_acquired(index);
    }
    cursor.start_frame().unwrap();
    let (submitted, slot) = cursor.submission().unwrap();
    assert_eq!(submitted, index);
    cursor.finish_frame();
    slot
}

#[test]
fn test_slots_rotate_per_submitted_frame() {
    let mut cursor = FrameCursor::new(2, 3);
    assert_eq!(run_frame(&mut cursor, 0), 0);
    assert_eq!(run_frame(&mut cursor, 1), 1);
    assert_eq!(run_frame(&mut cursor, 2), 0);
    assert_eq!(cursor.current_frame(), 1);
}

#[test]
fn test_out_of_order_image_waits_on_its_last_slot() {
    let mut cursor = FrameCursor::new(2, 3);
    run_frame(&mut cursor, 0);
    run_frame(&mut cursor, 1);

    // Slot 0 again: image 1 was rendered by slot 1, which must be waited on
    assert_eq!(cursor.current_frame(), 0);
    assert_eq!(cursor.image_owner(1), Some(1));
    // Image 0 belongs to the current slot, whose fence is waited on before acquire
    assert_eq!(cursor.image_owner(0), None);
    // Never rendered
    assert_eq!(cursor.image_owner(2), None);
}

#[test]
fn test_failed_wait_keeps_acquired_image() {
    let mut cursor = FrameCursor::new(2, 3);
    cursor.on_acquired(2);
    // Fence wait timed out here: start_frame never ran

    assert_eq!(cursor.held_image(), Some(2));
    assert_eq!(cursor.current_image(), None);
    assert_eq!(cursor.current_frame(), 0);
    // A retry is allowed and resumes with the held image instead of acquiring
    assert!(cursor.check_can_begin().is_ok());
    assert_eq!(cursor.start_frame().unwrap(), 2);
    assert_eq!(cursor.current_image(), Some(2));
}

#[test]
fn test_released_frame_resumes_on_same_image() {
    let mut cursor = FrameCursor::new(2, 3);
    cursor.on_acquired(1);
    cursor.start_frame().unwrap();
    assert!(cursor.check_can_begin().is_err());

    cursor.release();
    assert!(cursor.check_can_begin().is_ok());
    assert_eq!(cursor.held_image(), Some(1));
    assert!(matches!(cursor.submission(), Err(Error::ResourceNotReady(_))));

    assert_eq!(cursor.start_frame().unwrap(), 1);
    assert_eq!(cursor.submission().unwrap(), (1, 0));
}

#[test]
fn test_start_frame_without_image_fails() {
    let mut cursor = FrameCursor::new(2, 3);
    assert!(matches!(cursor.start_frame(), Err(Error::ResourceNotReady(_))));
}

#[test]
fn test_image_index_beyond_swapchain_rejected() {
    let mut cursor = FrameCursor::new(2, 2);
    cursor.on_acquired(5);
    assert!(matches!(cursor.start_frame(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_reset_images_forgets_owners_and_held_image() {
    let mut cursor = FrameCursor::new(2, 3);
    run_frame(&mut cursor, 1);
    cursor.on_acquired(0);

    cursor.reset_images(4);
    assert_eq!(cursor.held_image(), None);
    assert!((0..4).all(|index| cursor.image_owner(index).is_none()));
    // The slot keeps rotating across swapchain rebuilds
    assert_eq!(cursor.current_frame(), 1);
}

#[test]
fn test_zero_frames_in_flight_still_has_one_slot() {
    let mut cursor = FrameCursor::new(0, 2);
    assert_eq!(run_frame(&mut cursor, 0), 0);
    assert_eq!(run_frame(&mut cursor, 1), 0);
}
