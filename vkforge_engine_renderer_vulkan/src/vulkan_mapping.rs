/// Engine enums to Vulkan enums

use ash::vk;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{ElementFormat, ShaderStage};

/// Engine format <-> Vulkan format table. First match wins for the reverse lookup.
const FORMAT_TABLE: &[(ElementFormat, vk::Format)] = &[
    (ElementFormat::R5G6B5, vk::Format::R5G6B5_UNORM_PACK16),
    (ElementFormat::A1RGB5, vk::Format::A1R5G5B5_UNORM_PACK16),
    (ElementFormat::ARGB4, vk::Format::R4G4B4A4_UNORM_PACK16),
    (ElementFormat::R8, vk::Format::R8_UNORM),
    (ElementFormat::SIGNED_R8, vk::Format::R8_SNORM),
    (ElementFormat::R8UI, vk::Format::R8_UINT),
    (ElementFormat::GR8, vk::Format::R8G8_UNORM),
    (ElementFormat::SIGNED_GR8, vk::Format::R8G8_SNORM),
    (ElementFormat::ARGB8, vk::Format::R8G8B8A8_UNORM),
    (ElementFormat::ABGR8, vk::Format::A8B8G8R8_UNORM_PACK32),
    (ElementFormat::SIGNED_ABGR8, vk::Format::A8B8G8R8_SNORM_PACK32),
    (ElementFormat::A2BGR10, vk::Format::A2B10G10R10_UNORM_PACK32),
    (ElementFormat::R16, vk::Format::R16_UNORM),
    (ElementFormat::R16F, vk::Format::R16_SFLOAT),
    (ElementFormat::GR16, vk::Format::R16G16_UNORM),
    (ElementFormat::GR16F, vk::Format::R16G16_SFLOAT),
    (ElementFormat::R32F, vk::Format::R32_SFLOAT),
    (ElementFormat::R32UI, vk::Format::R32_UINT),
    (ElementFormat::B10G11R11F, vk::Format::B10G11R11_UFLOAT_PACK32),
    (ElementFormat::ARGB8_SRGB, vk::Format::R8G8B8A8_SRGB),
    (ElementFormat::ABGR8_SRGB, vk::Format::A8B8G8R8_SRGB_PACK32),
    (ElementFormat::ABGR16, vk::Format::R16G16B16A16_UNORM),
    (ElementFormat::ABGR16F, vk::Format::R16G16B16A16_SFLOAT),
    (ElementFormat::GR32F, vk::Format::R32G32_SFLOAT),
    (ElementFormat::BGR32F, vk::Format::R32G32B32_SFLOAT),
    (ElementFormat::ABGR32F, vk::Format::R32G32B32A32_SFLOAT),
    (ElementFormat::BC1, vk::Format::BC1_RGBA_UNORM_BLOCK),
    (ElementFormat::BC1_SRGB, vk::Format::BC1_RGBA_SRGB_BLOCK),
    (ElementFormat::BC2, vk::Format::BC2_UNORM_BLOCK),
    (ElementFormat::BC2_SRGB, vk::Format::BC2_SRGB_BLOCK),
    (ElementFormat::BC3, vk::Format::BC3_UNORM_BLOCK),
    (ElementFormat::BC3_SRGB, vk::Format::BC3_SRGB_BLOCK),
    (ElementFormat::BC4, vk::Format::BC4_UNORM_BLOCK),
    (ElementFormat::SIGNED_BC4, vk::Format::BC4_SNORM_BLOCK),
    (ElementFormat::BC5, vk::Format::BC5_UNORM_BLOCK),
    (ElementFormat::SIGNED_BC5, vk::Format::BC5_SNORM_BLOCK),
    (ElementFormat::BC6, vk::Format::BC6H_UFLOAT_BLOCK),
    (ElementFormat::SIGNED_BC6, vk::Format::BC6H_SFLOAT_BLOCK),
    (ElementFormat::BC7, vk::Format::BC7_UNORM_BLOCK),
    (ElementFormat::BC7_SRGB, vk::Format::BC7_SRGB_BLOCK),
    (ElementFormat::D16, vk::Format::D16_UNORM),
    (ElementFormat::D24S8, vk::Format::D24_UNORM_S8_UINT),
    (ElementFormat::D32F, vk::Format::D32_SFLOAT),
];

/// Vulkan format for an engine format
///
/// Formats without a Vulkan equivalent (A8, BC4_SRGB, BC5_SRGB) fail with
/// `UnsupportedFormat`.
pub fn to_vk_format(format: ElementFormat) -> Result<vk::Format> {
    FORMAT_TABLE
        .iter()
        .find(|(ef, _)| *ef == format)
        .map(|(_, vk_format)| *vk_format)
        .ok_or_else(|| Error::UnsupportedFormat(format!("{:?} has no Vulkan equivalent", format)))
}

/// Engine format for a Vulkan format (used for swapchain images)
pub fn from_vk_format(format: vk::Format) -> Result<ElementFormat> {
    match format {
        vk::Format::B8G8R8A8_UNORM => return Ok(ElementFormat::ARGB8),
        vk::Format::B8G8R8A8_SRGB => return Ok(ElementFormat::ARGB8_SRGB),
        _ => {}
    }
    FORMAT_TABLE
        .iter()
        .find(|(_, vk_format)| *vk_format == format)
        .map(|(ef, _)| *ef)
        .ok_or_else(|| Error::UnsupportedFormat(format!("{:?} has no engine equivalent", format)))
}

/// Aspect mask of a whole image of `format`
pub fn aspect_mask(format: ElementFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        let mut aspect = vk::ImageAspectFlags::DEPTH;
        if format.is_stencil() {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }
        aspect
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Sample count flag for a power-of-two sample count
pub fn sample_count_flags(count: u32) -> vk::SampleCountFlags {
    match count {
        0 | 1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        32 => vk::SampleCountFlags::TYPE_32,
        _ => vk::SampleCountFlags::TYPE_64,
    }
}

/// Pipeline stage flag of a shader stage
pub fn shader_stage_flags(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Pixel => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
        ShaderStage::Hull => vk::ShaderStageFlags::TESSELLATION_CONTROL,
        ShaderStage::Domain => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
    }
}

#[cfg(test)]
#[path = "vulkan_mapping_tests.rs"]
mod tests;
