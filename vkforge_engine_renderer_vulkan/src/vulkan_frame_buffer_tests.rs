//! Unit tests for vulkan_frame_buffer.rs
//!
//! Clear value lists, attachment size checks and render pass attachment
//! descriptions.

use ash::vk;
use vkforge_engine::vkforge::Error;
use vkforge_engine::vkforge::render::Color;
use crate::vulkan_frame_buffer::{
    attachment_descriptions, collect_clear_values, common_attachment_extent, offscreen_subpass_dependencies, AttachmentClear,
    DEFAULT_CLEAR_COLOR,
};
use crate::vulkan_render_view::PendingClear;

// ============================================================================
// CLEAR VALUES
// ============================================================================

#[test]
fn test_staged_color_consumed_once() {
    let red = Color::new(1.0, 0.0, 0.0, 1.0);
    let pending = PendingClear::new();
    pending.stage(red);

    let first = collect_clear_values([pending.take()], None);
    let second = collect_clear_values([pending.take()], None);

    assert_eq!(first, vec![AttachmentClear::Color(red)]);
    assert_eq!(second, vec![AttachmentClear::Color(DEFAULT_CLEAR_COLOR)]);
}

#[test]
fn test_depth_stencil_goes_last_with_defaults() {
    let values = collect_clear_values([None, Some(Color::ONE)], Some((None, Some(7))));

    assert_eq!(values.len(), 3);
    assert_eq!(values[1], AttachmentClear::Color(Color::ONE));
    assert_eq!(values[2], AttachmentClear::DepthStencil { depth: 1.0, stencil: 7 });
}

#[test]
fn test_no_attachments_no_values() {
    assert!(collect_clear_values(std::iter::empty(), None).is_empty());
}

// ============================================================================
// ATTACHMENT SIZES
// ============================================================================

#[test]
fn test_matching_attachments_give_their_size() {
    assert_eq!(common_attachment_extent([(128, 64), (128, 64), (128, 64)]).unwrap(), (128, 64));
}

#[test]
fn test_depth_size_mismatch_rejected() {
    // Two colors agree, the trailing depth attachment does not
    let result = common_attachment_extent([(128, 64), (128, 64), (64, 64)]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_no_attachment_rejected() {
    let result = common_attachment_extent(std::iter::empty());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_to_vk_color() {
    let value = AttachmentClear::Color(Color::new(0.5, 0.25, 0.0, 1.0)).to_vk();
    let color = unsafe { value.color.float32 };
    assert_eq!(color, [0.5, 0.25, 0.0, 1.0]);
}

// ============================================================================
// ATTACHMENTS
// ============================================================================

#[test]
fn test_color_attachments_clear_and_store() {
    let descriptions = attachment_descriptions(
        &[vk::Format::R8G8B8A8_UNORM, vk::Format::R16G16B16A16_SFLOAT],
        None,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    );

    assert_eq!(descriptions.len(), 2);
    for description in &descriptions {
        assert_eq!(description.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(description.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(description.final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    }
}

#[test]
fn test_depth_attachment_is_discarded() {
    let descriptions = attachment_descriptions(
        &[vk::Format::B8G8R8A8_UNORM],
        Some(vk::Format::D24_UNORM_S8_UINT),
        vk::ImageLayout::PRESENT_SRC_KHR,
    );

    assert_eq!(descriptions[0].final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    assert_eq!(descriptions[1].format, vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(descriptions[1].load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(descriptions[1].store_op, vk::AttachmentStoreOp::DONT_CARE);
    assert_eq!(descriptions[1].final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
}

#[test]
fn test_dependencies_bracket_the_subpass() {
    let [before, after] = offscreen_subpass_dependencies();

    assert_eq!(before.src_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(before.dst_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(after.dst_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(after.dst_access_mask, vk::AccessFlags::SHADER_READ);
}
