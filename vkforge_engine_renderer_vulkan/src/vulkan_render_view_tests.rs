//! Unit tests for vulkan_render_view.rs
//!
//! View type selection, sampler defaults and staged clear values.

use ash::vk;
use vkforge_engine::vkforge::render::{Color, TextureType};
use crate::vulkan_render_view::{default_sampler_info, view_type_for, PendingClear};

// ============================================================================
// VIEW TYPE
// ============================================================================

#[test]
fn test_view_type_follows_texture_shape() {
    assert_eq!(view_type_for(TextureType::Tex2D, 1), vk::ImageViewType::TYPE_2D);
    assert_eq!(view_type_for(TextureType::Tex2D, 4), vk::ImageViewType::TYPE_2D_ARRAY);
    assert_eq!(view_type_for(TextureType::Tex3D, 1), vk::ImageViewType::TYPE_3D);
    assert_eq!(view_type_for(TextureType::Tex1D, 1), vk::ImageViewType::TYPE_1D);
}

// ============================================================================
// SAMPLER
// ============================================================================

#[test]
fn test_default_sampler() {
    let info = default_sampler_info();
    assert_eq!(info.mag_filter, vk::Filter::LINEAR);
    assert_eq!(info.min_filter, vk::Filter::LINEAR);
    assert_eq!(info.address_mode_u, vk::SamplerAddressMode::CLAMP_TO_EDGE);
    assert_eq!(info.address_mode_w, vk::SamplerAddressMode::CLAMP_TO_EDGE);
    assert_eq!(info.anisotropy_enable, vk::FALSE);
    assert_eq!(info.compare_enable, vk::FALSE);
}

// ============================================================================
// PENDING CLEARS
// ============================================================================

#[test]
fn test_pending_clear_consumed_once() {
    let pending = PendingClear::new();
    pending.stage(Color::new(1.0, 0.0, 0.0, 1.0));

    assert_eq!(pending.take(), Some(Color::new(1.0, 0.0, 0.0, 1.0)));
    assert_eq!(pending.take(), None);
}

#[test]
fn test_pending_clear_last_write_wins() {
    let pending = PendingClear::new();
    pending.stage(0.25f32);
    pending.stage(0.75f32);

    assert_eq!(pending.take(), Some(0.75));
}

#[test]
fn test_pending_clear_starts_empty() {
    let pending: PendingClear<u32> = PendingClear::new();
    assert_eq!(pending.take(), None);
}
