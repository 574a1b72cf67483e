//! Unit tests for vulkan_render_factory.rs
//!
//! Paths that never touch the device: descriptor checks, unsupported
//! creation paths and shader object construction.

use vkforge_engine::vkforge::Error;
use vkforge_engine::vkforge::render::{
    AccessHint, Config, ElementFormat, RenderFactory, ShaderStage, TextureDesc, TextureType,
};
use crate::vulkan_render_factory::{check_texture_type, VulkanRenderFactory};

fn factory() -> VulkanRenderFactory {
    VulkanRenderFactory::new(Config {
        app_name: "factory tests".to_string(),
        enable_validation: false,
        ..Default::default()
    })
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[test]
fn test_matching_texture_type_accepted() {
    let desc = TextureDesc::tex2d(64, 64, 1, 1, ElementFormat::ARGB8, AccessHint::GPU_READ);
    assert!(check_texture_type(&desc, TextureType::Tex2D).is_ok());
}

#[test]
fn test_mismatched_texture_type_rejected() {
    let desc = TextureDesc::tex3d(16, 16, 16, 1, ElementFormat::R8, AccessHint::GPU_READ);
    let result = check_texture_type(&desc, TextureType::Tex2D);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// FACTORY
// ============================================================================

#[test]
fn test_factory_keeps_config() {
    let factory = factory();
    assert_eq!(factory.config().app_name, "factory tests");
    assert!(!factory.config().enable_validation);
}

#[test]
fn test_1d_textures_not_implemented() {
    let mut factory = factory();
    let desc = TextureDesc {
        texture_type: TextureType::Tex1D,
        ..TextureDesc::tex2d(64, 1, 1, 1, ElementFormat::R8, AccessHint::GPU_READ)
    };
    let result = factory.make_texture_1d(&desc, None);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
}

#[test]
fn test_cube_textures_not_implemented() {
    let mut factory = factory();
    let desc = TextureDesc {
        texture_type: TextureType::Cube,
        ..TextureDesc::tex2d(64, 64, 1, 6, ElementFormat::ARGB8, AccessHint::GPU_READ)
    };
    let result = factory.make_texture_cube(&desc, None);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
}

#[test]
fn test_shader_object_starts_empty() {
    let mut factory = factory();
    let shader = factory.make_shader_object().unwrap();

    assert!(!shader.is_valid());
    assert!(!shader.hw_resource_ready());
    assert!(ShaderStage::ALL.iter().all(|&stage| shader.stage(stage).is_none()));
}
