/// Render engine and render factory traits - the seams a backend implements

use std::sync::Arc;
use winit::window::Window;

use crate::error::Result;
use crate::render::{
    AccessHint, BufferUsage, Capability, CapabilityValue, Config, ElementFormat,
    ElementInitData, Rect, RenderDeviceCaps, RenderSettings, ShaderStage, TextureDesc,
};

/// Frame-level interface of a backend
///
/// Object safe, so the engine can keep backends as `Arc<Mutex<dyn RenderEngine>>`.
pub trait RenderEngine: Send + Sync {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Capabilities of the device behind this engine
    fn device_caps(&self) -> &RenderDeviceCaps;

    /// Default shading-language profile of a stage ("" when the stage is unavailable)
    fn shader_profile(&self, stage: ShaderStage) -> &str;

    /// Query a capability, `None` when the backend does not expose it
    fn capability(&self, capability: Capability) -> Option<CapabilityValue>;

    /// Override a capability
    fn set_capability(&mut self, value: CapabilityValue);

    /// Acquire the next back buffer and start recording
    fn begin_frame(&mut self) -> Result<()>;

    /// Submit the recorded frame and present it
    fn end_frame(&mut self) -> Result<()>;

    /// Window size changed
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Restrict rasterization of the current frame to `rect`
    fn scissor_rect(&mut self, rect: Rect) -> Result<()>;

    /// Block until the GPU is idle
    fn wait_idle(&self) -> Result<()>;
}

/// Resource factory of a backend
///
/// Every `make_*` call returns a resource whose hardware object already exists.
pub trait RenderFactory {
    type RenderEngine: RenderEngine;
    type Texture;
    type Buffer;
    type FrameBuffer;
    type ShaderResourceView;
    type RenderTargetView;
    type DepthStencilView;
    type ShaderObject;
    type ShaderStageObject;

    /// Configuration the factory was built with
    fn config(&self) -> &Config;

    /// Create the render engine with its window frame buffer
    fn make_render_engine(&mut self, window: &Window, settings: RenderSettings) -> Result<Self::RenderEngine>;

    fn make_texture_1d(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<Self::Texture>>;
    fn make_texture_2d(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<Self::Texture>>;
    fn make_texture_3d(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<Self::Texture>>;
    fn make_texture_cube(&mut self, desc: &TextureDesc, init_data: Option<&[ElementInitData<'_>]>) -> Result<Arc<Self::Texture>>;

    fn make_frame_buffer(&mut self) -> Result<Self::FrameBuffer>;

    fn make_vertex_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<Self::Buffer>>;
    fn make_index_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<Self::Buffer>>;
    fn make_constant_buffer(&mut self, usage: BufferUsage, access_hint: AccessHint, size_in_bytes: u32, init_data: Option<&[u8]>, structure_byte_stride: u32) -> Result<Arc<Self::Buffer>>;

    /// Shader resource view over a mip/array sub-range
    fn make_texture_srv(&mut self, texture: &Arc<Self::Texture>, format: ElementFormat, first_array_index: u32, array_size: u32, first_level: u32, num_levels: u32) -> Result<Arc<Self::ShaderResourceView>>;

    /// Shader resource view over the whole texture
    fn make_texture_srv_2d(&mut self, texture: &Arc<Self::Texture>) -> Result<Arc<Self::ShaderResourceView>>;

    fn make_rtv_2d(&mut self, texture: &Arc<Self::Texture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Arc<Self::RenderTargetView>>;
    fn make_dsv_2d(&mut self, texture: &Arc<Self::Texture>, format: ElementFormat, first_array_index: u32, array_size: u32, level: u32) -> Result<Arc<Self::DepthStencilView>>;

    fn make_buffer_srv(&mut self, buffer: &Arc<Self::Buffer>, format: ElementFormat) -> Result<Arc<Self::ShaderResourceView>>;

    fn make_shader_object(&mut self) -> Result<Self::ShaderObject>;
    fn make_shader_stage_object(&mut self, stage: ShaderStage) -> Result<Self::ShaderStageObject>;
}
