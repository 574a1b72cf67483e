/// VulkanRenderFactory - creates every Vulkan resource the engine asks for
///
/// The device is created on first use and shared by everything the factory
/// makes afterwards, render engine included.

use std::sync::Arc;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{
    AccessHint, BufferBinding, BufferDesc, BufferUsage, Config, ElementFormat, ElementInitData,
    RenderDeviceCaps, RenderFactory, RenderSettings, ShaderStage, TextureDesc, TextureType,
};
use vkforge_engine::{engine_fail, engine_info};
use winit::window::Window;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_frame_buffer::VulkanFrameBuffer;
use crate::vulkan_render_engine::{device_caps, stage_available, VulkanRenderEngine};
use crate::vulkan_render_view::{VulkanDepthStencilView, VulkanRenderTargetView, VulkanShaderResourceView};
use crate::vulkan_shader::{VulkanShaderObject, VulkanShaderStageObject};
use crate::vulkan_texture::VulkanTexture;

/// Check that a texture descriptor matches the `make_texture_*` call it was passed to
pub fn check_texture_type(desc: &TextureDesc, expected: TextureType) -> Result<()> {
    if desc.texture_type != expected {
        return Err(engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource(format!(
                "{:?} descriptor passed where a {:?} texture was requested",
                desc.texture_type, expected
            ))
        ));
    }
    Ok(())
}

fn not_implemented<T>(what: &'static str) -> Result<T> {
    Err(engine_fail!("vkforge::vulkan", Error::NotImplemented(what)))
}

pub struct VulkanRenderFactory {
    config: Config,
    device: Option<Arc<VulkanDevice>>,
    caps: Option<RenderDeviceCaps>,
}

impl VulkanRenderFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            device: None,
            caps: None,
        }
    }

    /// Shared device, created with the factory's config on first call
    pub fn device(&mut self) -> Result<Arc<VulkanDevice>> {
        if let Some(device) = &self.device {
            return Ok(Arc::clone(device));
        }

        let device = Arc::new(VulkanDevice::new(&self.config)?);
        engine_info!(
            "vkforge::vulkan",
            "Render factory device created for '{}'",
            self.config.app_name
        );
        self.device = Some(Arc::clone(&device));
        Ok(device)
    }

    /// Caps of the shared device, computed once
    pub fn device_caps(&mut self) -> Result<&RenderDeviceCaps> {
        let device = self.device()?;
        Ok(self.caps.get_or_insert_with(|| device_caps(&device)))
    }

    fn make_texture(
        &mut self,
        desc: &TextureDesc,
        expected: TextureType,
        init_data: Option<&[ElementInitData<'_>]>,
    ) -> Result<Arc<VulkanTexture>> {
        check_texture_type(desc, expected)?;
        let mut texture = VulkanTexture::new(self.device()?, desc)?;
        texture.create_hw_resource(init_data)?;
        Ok(Arc::new(texture))
    }

    fn make_buffer(
        &mut self,
        binding: BufferBinding,
        usage: BufferUsage,
        access_hint: AccessHint,
        size_in_bytes: u32,
        init_data: Option<&[u8]>,
        structure_byte_stride: u32,
    ) -> Result<Arc<VulkanBuffer>> {
        let desc = BufferDesc {
            usage,
            access_hint,
            binding,
            size_in_bytes,
            structure_byte_stride,
        };
        let mut buffer = VulkanBuffer::new(self.device()?, desc);
        buffer.create_hw_resource(init_data)?;
        Ok(Arc::new(buffer))
    }
}

impl RenderFactory for VulkanRenderFactory {
    type RenderEngine = VulkanRenderEngine;
    type Texture = VulkanTexture;
    type Buffer = VulkanBuffer;
    type FrameBuffer = VulkanFrameBuffer;
    type ShaderResourceView = VulkanShaderResourceView;
    type RenderTargetView = VulkanRenderTargetView;
    type DepthStencilView = VulkanDepthStencilView;
    type ShaderObject = VulkanShaderObject;
    type ShaderStageObject = VulkanShaderStageObject;

    fn config(&self) -> &Config {
        &self.config
    }

    fn make_render_engine(&mut self, window: &Window, settings: RenderSettings) -> Result<VulkanRenderEngine> {
        VulkanRenderEngine::new(self.device()?, window, settings)
    }

    fn make_texture_1d(&mut self, _desc: &TextureDesc, _init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<VulkanTexture>> {
        not_implemented("1D textures")
    }

    fn make_texture_2d(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<VulkanTexture>> {
        self.make_texture(desc, TextureType::Tex2D, init_data)
    }

    fn make_texture_3d(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<VulkanTexture>> {
        self.make_texture(desc, TextureType::Tex3D, init_data)
    }

    fn make_texture_cube(&mut self, _desc: &TextureDesc, _init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<VulkanTexture>> {
        not_implemented("cube textures")
    }

    fn make_frame_buffer(&mut self) -> Result<VulkanFrameBuffer> {
        Ok(VulkanFrameBuffer::new(self.device()?))
    }

    fn make_vertex_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<VulkanBuffer>> {
        self.make_buffer(BufferBinding::Vertex, usage, access_hint, size_in_bytes, init_data, structure_byte_stride)
    }

    fn make_index_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<VulkanBuffer>> {
        self.make_buffer(BufferBinding::Index, usage, access_hint, size_in_bytes, init_data, structure_byte_stride)
    }

    fn make_constant_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<VulkanBuffer>> {
        self.make_buffer(BufferBinding::Constant, usage, access_hint, size_in_bytes, init_data, structure_byte_stride)
    }

    fn make_texture_srv(
        &mut self,
        texture: &Arc<VulkanTexture>,
        format: ElementFormat,
        first_array_index: u32,
        array_size: u32,
        first_level: u32,
        num_levels: u32,
    ) -> Result<Arc<VulkanShaderResourceView>> {
        let view = VulkanShaderResourceView::new(
            Arc::clone(texture),
            format,
            first_array_index,
            array_size,
            first_level,
            num_levels,
        )?;
        Ok(Arc::new(view))
    }

    fn make_texture_srv_2d(&mut self, texture: &Arc<VulkanTexture>) -> Result<Arc<VulkanShaderResourceView>> {
        let (format, array_size, num_levels) = (texture.format(), texture.array_size(), texture.num_mip_maps());
        self.make_texture_srv(texture, format, 0, array_size, 0, num_levels)
    }

    fn make_rtv_2d(&mut self, texture: &Arc<VulkanTexture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Arc<VulkanRenderTargetView>> {
        VulkanRenderTargetView::new(Arc::clone(texture), format, first_array_index, array_size, level).map(Arc::new)
    }

    fn make_dsv_2d(&mut self, texture: &Arc<VulkanTexture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Arc<VulkanDepthStencilView>> {
        VulkanDepthStencilView::new(Arc::clone(texture), format, first_array_index, array_size, level).map(Arc::new)
    }

    fn make_buffer_srv(&mut self, _buffer: &Arc<VulkanBuffer>, _format: ElementFormat) -> Result<Arc<VulkanShaderResourceView>> {
        not_implemented("buffer shader resource views")
    }

    fn make_shader_object(&mut self) -> Result<VulkanShaderObject> {
        Ok(VulkanShaderObject::new())
    }

    fn make_shader_stage_object(&mut self, stage: ShaderStage) -> Result<VulkanShaderStageObject> {
        let is_available = stage_available(self.device_caps()?, stage);
        Ok(VulkanShaderStageObject::new(self.device()?, stage, is_available))
    }
}

#[cfg(test)]
#[path = "vulkan_render_factory_tests.rs"]
mod tests;
