/// Render views - shader resource, render target and depth-stencil views
///
/// Every view wraps one `vk::ImageView` over a sub-range of a `VulkanTexture`
/// and keeps the texture alive. Shader resource views also own a default
/// sampler. Render target and depth-stencil views stage clear values that the
/// owning frame buffer consumes on its next render pass begin.

use ash::vk;
use std::sync::{Arc, Mutex};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{Color, ElementFormat, TextureType};
use vkforge_engine::engine_fail;

use crate::vulkan_check::vk_check;
use crate::vulkan_texture::VulkanTexture;

/// View type for a texture shape
pub fn view_type_for(texture_type: TextureType, layer_count: u32) -> vk::ImageViewType {
    match texture_type {
        TextureType::Tex1D if layer_count > 1 => vk::ImageViewType::TYPE_1D_ARRAY,
        TextureType::Tex1D => vk::ImageViewType::TYPE_1D,
        TextureType::Tex3D => vk::ImageViewType::TYPE_3D,
        TextureType::Cube => vk::ImageViewType::CUBE,
        TextureType::Tex2D if layer_count > 1 => vk::ImageViewType::TYPE_2D_ARRAY,
        TextureType::Tex2D => vk::ImageViewType::TYPE_2D,
    }
}

/// Linear filtering, clamp to edge, no anisotropy, no compare
pub fn default_sampler_info() -> vk::SamplerCreateInfo<'static> {
    vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
        .unnormalized_coordinates(false)
}

/// A value staged for the next render pass begin
///
/// Last write wins, `take` empties it.
#[derive(Debug, Default)]
pub struct PendingClear<T> {
    value: Mutex<Option<T>>,
}

impl<T> PendingClear<T> {
    pub fn new() -> Self {
        Self { value: Mutex::new(None) }
    }

    pub fn stage(&self, value: T) {
        if let Ok(mut pending) = self.value.lock() {
            *pending = Some(value);
        }
    }

    pub fn take(&self) -> Option<T> {
        self.value.lock().ok().and_then(|mut pending| pending.take())
    }
}

fn create_view(
    texture: &VulkanTexture,
    aspect_mask: vk::ImageAspectFlags,
    first_level: u32,
    num_levels: u32,
    first_array_index: u32,
    array_size: u32,
) -> Result<vk::ImageView> {
    if !texture.hw_resource_ready() {
        return Err(engine_fail!(
            "vkforge::vulkan",
            Error::ResourceNotReady("cannot create a view of a texture without an image".to_string())
        ));
    }
    if first_level + num_levels > texture.num_mip_maps() || first_array_index + array_size > texture.array_size() {
        return Err(engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource(format!(
                "view range levels {}+{} slices {}+{} outside texture ({} levels, {} slices)",
                first_level, num_levels, first_array_index, array_size,
                texture.num_mip_maps(), texture.array_size()
            ))
        ));
    }

    let create_info = vk::ImageViewCreateInfo::default()
        .image(texture.image())
        .view_type(view_type_for(texture.texture_type(), array_size))
        .format(texture.vk_format())
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: first_level,
            level_count: num_levels,
            base_array_layer: first_array_index,
            layer_count: array_size,
        });

    unsafe { texture.device().device().create_image_view(&create_info, None) }
        .map_err(|e| vk_check("vkCreateImageView", e))
}

// ============================================================================
// Shader resource view
// ============================================================================

/// Sampled view with its default sampler
pub struct VulkanShaderResourceView {
    texture: Arc<VulkanTexture>,
    format: ElementFormat,
    first_array_index: u32,
    array_size: u32,
    first_level: u32,
    num_levels: u32,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
}

impl VulkanShaderResourceView {
    pub fn new(
        texture: Arc<VulkanTexture>,
        format: ElementFormat,
        first_array_index: u32,
        array_size: u32,
        first_level: u32,
        num_levels: u32,
    ) -> Result<Self> {
        let image_view = create_view(
            &texture,
            texture.aspect_mask(),
            first_level,
            num_levels,
            first_array_index,
            array_size,
        )?;

        let device = texture.device().device();
        let sampler = match unsafe { device.create_sampler(&default_sampler_info(), None) } {
            Ok(sampler) => sampler,
            Err(e) => {
                unsafe { device.destroy_image_view(image_view, None) };
                return Err(vk_check("vkCreateSampler", e));
            }
        };

        Ok(Self {
            texture,
            format,
            first_array_index,
            array_size,
            first_level,
            num_levels,
            image_view,
            sampler,
        })
    }

    pub fn texture(&self) -> &Arc<VulkanTexture> {
        &self.texture
    }

    pub fn format(&self) -> ElementFormat {
        self.format
    }

    pub fn first_array_index(&self) -> u32 {
        self.first_array_index
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn first_level(&self) -> u32 {
        self.first_level
    }

    pub fn num_levels(&self) -> u32 {
        self.num_levels
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for VulkanShaderResourceView {
    fn drop(&mut self) {
        let device = self.texture.device().device();
        unsafe {
            device.destroy_sampler(self.sampler, None);
            device.destroy_image_view(self.image_view, None);
        }
    }
}

// ============================================================================
// Render target view
// ============================================================================

/// Single-level color attachment view
pub struct VulkanRenderTargetView {
    texture: Arc<VulkanTexture>,
    format: ElementFormat,
    first_array_index: u32,
    array_size: u32,
    level: u32,
    image_view: vk::ImageView,
    next_clear_color: PendingClear<Color>,
}

impl VulkanRenderTargetView {
    pub fn new(texture: Arc<VulkanTexture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Self> {
        if texture.format().is_depth() {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::UnsupportedFormat(format!("{:?} cannot back a render target view", texture.format()))
            ));
        }
        let image_view = create_view(&texture, vk::ImageAspectFlags::COLOR, level, 1, first_array_index, array_size)?;

        Ok(Self {
            texture,
            format,
            first_array_index,
            array_size,
            level,
            image_view,
            next_clear_color: PendingClear::new(),
        })
    }

    pub fn texture(&self) -> &Arc<VulkanTexture> {
        &self.texture
    }

    pub fn format(&self) -> ElementFormat {
        self.format
    }

    pub fn vk_format(&self) -> vk::Format {
        self.texture.vk_format()
    }

    pub fn width(&self) -> u32 {
        self.texture.width(self.level)
    }

    pub fn height(&self) -> u32 {
        self.texture.height(self.level)
    }

    pub fn first_array_index(&self) -> u32 {
        self.first_array_index
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Stage a clear color for the next render pass
    pub fn clear_color(&self, color: Color) {
        self.next_clear_color.stage(color);
    }

    /// Consume the staged clear color
    pub fn take_clear_color(&self) -> Option<Color> {
        self.next_clear_color.take()
    }
}

impl Drop for VulkanRenderTargetView {
    fn drop(&mut self) {
        unsafe { self.texture.device().device().destroy_image_view(self.image_view, None) };
    }
}

// ============================================================================
// Depth-stencil view
// ============================================================================

/// Single-level depth-stencil attachment view
pub struct VulkanDepthStencilView {
    texture: Arc<VulkanTexture>,
    format: ElementFormat,
    first_array_index: u32,
    array_size: u32,
    level: u32,
    image_view: vk::ImageView,
    next_clear_depth: PendingClear<f32>,
    next_clear_stencil: PendingClear<u32>,
}

impl VulkanDepthStencilView {
    pub fn new(texture: Arc<VulkanTexture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Self> {
        if !texture.format().is_depth() {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::UnsupportedFormat(format!("{:?} cannot back a depth-stencil view", texture.format()))
            ));
        }
        let image_view = create_view(&texture, texture.aspect_mask(), level, 1, first_array_index, array_size)?;

        Ok(Self {
            texture,
            format,
            first_array_index,
            array_size,
            level,
            image_view,
            next_clear_depth: PendingClear::new(),
            next_clear_stencil: PendingClear::new(),
        })
    }

    pub fn texture(&self) -> &Arc<VulkanTexture> {
        &self.texture
    }

    pub fn format(&self) -> ElementFormat {
        self.format
    }

    pub fn vk_format(&self) -> vk::Format {
        self.texture.vk_format()
    }

    pub fn width(&self) -> u32 {
        self.texture.width(self.level)
    }

    pub fn height(&self) -> u32 {
        self.texture.height(self.level)
    }

    pub fn first_array_index(&self) -> u32 {
        self.first_array_index
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    pub fn clear_depth(&self, depth: f32) {
        self.next_clear_depth.stage(depth);
    }

    pub fn clear_stencil(&self, stencil: u32) {
        self.next_clear_stencil.stage(stencil);
    }

    pub fn clear_depth_stencil(&self, depth: f32, stencil: u32) {
        self.clear_depth(depth);
        self.clear_stencil(stencil);
    }

    /// Consume the staged depth and stencil values
    pub fn take_clear_depth_stencil(&self) -> (Option<f32>, Option<u32>) {
        (self.next_clear_depth.take(), self.next_clear_stencil.take())
    }
}

impl Drop for VulkanDepthStencilView {
    fn drop(&mut self) {
        unsafe { self.texture.device().device().destroy_image_view(self.image_view, None) };
    }
}

#[cfg(test)]
#[path = "vulkan_render_view_tests.rs"]
mod tests;
