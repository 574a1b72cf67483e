/// VulkanRenderEngine - frame-level Vulkan backend
///
/// Owns the render window and one draw command buffer per swapchain image.
/// `begin_frame` acquires an image and records the screen clear into its
/// command buffer, `end_frame` submits it and presents.

use ash::vk;
use std::sync::Arc;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{
    Capability, CapabilityValue, ClearFlags, Color, ElementFormat, Rect, RenderDeviceCaps,
    RenderEngine, RenderSettings, ShaderCompiler, ShaderStage, NUM_SHADER_STAGES,
};
use vkforge_engine::{engine_bail, engine_debug, engine_error, engine_fail, engine_info};
use winit::window::Window;

use crate::vulkan_check::vk_check;
use crate::vulkan_device::{QueueKind, VulkanDevice};
use crate::vulkan_mapping::to_vk_format;
use crate::vulkan_render_window::VulkanRenderWindow;
use crate::vulkan_shader::{default_shader_profile, CompileContext};
use crate::vulkan_texture::VulkanTexture;

/// Shader platform reported until the application overrides it
pub const DEFAULT_PLATFORM: &str = "vulkan_1_0";

/// "SPIR" as a little-endian four character code
pub const NATIVE_SHADER_FOURCC: u32 = u32::from_le_bytes(*b"SPIR");

/// Color the screen is cleared to at the start of every frame
pub const SCREEN_CLEAR_COLOR: Color = Color::new(0.5, 0.5, 0.5, 1.0);

// ============================================================================
// Device caps
// ============================================================================

const VERTEX_FORMATS: &[ElementFormat] = &[
    ElementFormat::A8, ElementFormat::R8, ElementFormat::GR8, ElementFormat::ARGB8,
    ElementFormat::ABGR8, ElementFormat::R8UI, ElementFormat::SIGNED_R8, ElementFormat::SIGNED_GR8,
    ElementFormat::SIGNED_ABGR8, ElementFormat::A2BGR10, ElementFormat::R16, ElementFormat::GR16,
    ElementFormat::ABGR16, ElementFormat::R32UI, ElementFormat::R32F, ElementFormat::GR32F,
    ElementFormat::BGR32F, ElementFormat::ABGR32F, ElementFormat::R16F, ElementFormat::GR16F,
    ElementFormat::ABGR16F,
];

const TEXTURE_FORMATS: &[ElementFormat] = &[
    ElementFormat::A8, ElementFormat::ARGB4, ElementFormat::R8, ElementFormat::SIGNED_R8,
    ElementFormat::GR8, ElementFormat::SIGNED_GR8, ElementFormat::GR16, ElementFormat::SIGNED_ABGR8,
    ElementFormat::ARGB8, ElementFormat::ABGR8, ElementFormat::A2BGR10, ElementFormat::R16,
    ElementFormat::R8UI, ElementFormat::R32UI, ElementFormat::ABGR16, ElementFormat::R16F,
    ElementFormat::GR16F, ElementFormat::B10G11R11F, ElementFormat::ABGR16F, ElementFormat::R32F,
    ElementFormat::GR32F, ElementFormat::BGR32F, ElementFormat::ABGR32F,
    ElementFormat::BC1, ElementFormat::BC1_SRGB, ElementFormat::BC2, ElementFormat::BC2_SRGB,
    ElementFormat::BC3, ElementFormat::BC3_SRGB, ElementFormat::BC4, ElementFormat::BC5,
    ElementFormat::SIGNED_BC4, ElementFormat::SIGNED_BC5, ElementFormat::BC6, ElementFormat::SIGNED_BC6,
    ElementFormat::BC7, ElementFormat::BC7_SRGB, ElementFormat::D16, ElementFormat::D24S8,
    ElementFormat::D32F, ElementFormat::ARGB8_SRGB, ElementFormat::ABGR8_SRGB, ElementFormat::BC4_SRGB,
    ElementFormat::BC5_SRGB,
];

const RENDER_TARGET_FORMATS: &[ElementFormat] = &[
    ElementFormat::R8, ElementFormat::GR8, ElementFormat::ARGB8, ElementFormat::ABGR8,
    ElementFormat::SIGNED_ABGR8, ElementFormat::A2BGR10, ElementFormat::R16, ElementFormat::GR16,
    ElementFormat::ABGR16, ElementFormat::R32UI, ElementFormat::R16F, ElementFormat::GR16F,
    ElementFormat::R32F, ElementFormat::GR32F, ElementFormat::ABGR16F, ElementFormat::B10G11R11F,
    ElementFormat::ABGR32F, ElementFormat::D16, ElementFormat::D24S8, ElementFormat::D32F,
    ElementFormat::ARGB8_SRGB, ElementFormat::ABGR8_SRGB,
];

/// What a format is checked for when filling the caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatUsage {
    Vertex,
    Texture,
    RenderTarget,
}

/// Whether `properties` allow `format` to be used as `usage`
pub fn format_usage_supported(properties: &vk::FormatProperties, format: ElementFormat, usage: FormatUsage) -> bool {
    match usage {
        FormatUsage::Vertex => properties.buffer_features.contains(vk::FormatFeatureFlags::VERTEX_BUFFER),
        FormatUsage::Texture => properties.optimal_tiling_features.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE),
        FormatUsage::RenderTarget if format.is_depth() => properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT),
        FormatUsage::RenderTarget => properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT),
    }
}

/// Device caps from the limits and features of a physical device
///
/// The fixed format lists are filtered through `is_supported`. Every render
/// target format gets the sample counts 1, 2, 4 up to `max_samples`, each at
/// quality 1. Compute is never advertised.
pub fn fill_device_caps<F>(
    limits: &vk::PhysicalDeviceLimits,
    features: &vk::PhysicalDeviceFeatures,
    max_samples: u32,
    is_supported: F,
) -> RenderDeviceCaps
where
    F: Fn(ElementFormat, FormatUsage) -> bool,
{
    let filter = |formats: &[ElementFormat], usage: FormatUsage| -> Vec<ElementFormat> {
        formats.iter().copied().filter(|&f| is_supported(f, usage)).collect()
    };

    let mut sample_keys = Vec::new();
    let mut count = 1;
    while count <= max_samples.max(1) {
        sample_keys.push(RenderDeviceCaps::encode_sample_count_quality(count, 1));
        count *= 2;
    }

    let render_target_formats = filter(RENDER_TARGET_FORMATS, FormatUsage::RenderTarget)
        .into_iter()
        .map(|format| (format, sample_keys.clone()))
        .collect();

    let max_texture_anisotropy = if features.sampler_anisotropy != vk::FALSE {
        limits.max_sampler_anisotropy as u32
    } else {
        1
    };

    RenderDeviceCaps {
        max_texture_width: limits.max_image_dimension2_d,
        max_texture_height: limits.max_image_dimension2_d,
        max_texture_depth: limits.max_image_dimension3_d,
        max_texture_array_length: limits.max_image_array_layers,
        max_simultaneous_rts: limits.max_color_attachments,
        max_texture_anisotropy,
        cs_support: false,
        gs_support: features.geometry_shader != vk::FALSE,
        hs_support: features.tessellation_shader != vk::FALSE,
        ds_support: features.tessellation_shader != vk::FALSE,
        vertex_formats: filter(VERTEX_FORMATS, FormatUsage::Vertex),
        texture_formats: filter(TEXTURE_FORMATS, FormatUsage::Texture),
        render_target_formats,
    }
}

/// Caps of the physical device behind `device`
pub fn device_caps(device: &VulkanDevice) -> RenderDeviceCaps {
    fill_device_caps(
        &device.properties.limits,
        &device.features,
        device.max_color_sample_count(),
        |format, usage| {
            to_vk_format(format)
                .map(|vk_format| format_usage_supported(&device.format_properties(vk_format), format, usage))
                .unwrap_or(false)
        },
    )
}

/// Whether the device can run shaders of `stage`
pub fn stage_available(caps: &RenderDeviceCaps, stage: ShaderStage) -> bool {
    match stage {
        ShaderStage::Vertex | ShaderStage::Pixel => true,
        ShaderStage::Geometry => caps.gs_support,
        ShaderStage::Compute => caps.cs_support,
        ShaderStage::Hull => caps.hs_support,
        ShaderStage::Domain => caps.ds_support,
    }
}

// ============================================================================
// Engine attributes
// ============================================================================

/// Default profile of every stage for a shader platform
///
/// Platforms whose name starts with `d3d_12` use the `*_5_1` family.
pub fn profiles_for_platform(platform: &str) -> [String; NUM_SHADER_STAGES] {
    let d3d12 = platform.starts_with("d3d_12");
    ShaderStage::ALL.map(|stage| default_shader_profile(stage, d3d12).to_string())
}

/// Queryable state of a render engine, independent of any GPU object
#[derive(Debug, Clone)]
pub struct EngineAttributes {
    pub caps: RenderDeviceCaps,
    pub platform: String,
    pub shader_profiles: [String; NUM_SHADER_STAGES],
    pub major_version: u32,
    pub minor_version: u32,
    pub requires_flipping: bool,
    pub native_shader_fourcc: u32,
    pub native_shader_version: u32,
    pub frag_depth_support: bool,
}

impl EngineAttributes {
    pub fn new(caps: RenderDeviceCaps) -> Self {
        Self {
            caps,
            platform: DEFAULT_PLATFORM.to_string(),
            shader_profiles: profiles_for_platform(DEFAULT_PLATFORM),
            major_version: 1,
            minor_version: 0,
            requires_flipping: false,
            native_shader_fourcc: NATIVE_SHADER_FOURCC,
            native_shader_version: 1,
            frag_depth_support: true,
        }
    }

    /// Default profile of `stage`, "" when the device cannot run it
    pub fn shader_profile(&self, stage: ShaderStage) -> &str {
        if stage_available(&self.caps, stage) {
            &self.shader_profiles[stage.index()]
        } else {
            ""
        }
    }

    pub fn get(&self, capability: Capability) -> CapabilityValue {
        match capability {
            Capability::Platform => CapabilityValue::Platform(self.platform.clone()),
            Capability::MajorVersion => CapabilityValue::MajorVersion(self.major_version),
            Capability::MinorVersion => CapabilityValue::MinorVersion(self.minor_version),
            Capability::RequiresFlipping => CapabilityValue::RequiresFlipping(self.requires_flipping),
            Capability::NativeShaderFourcc => CapabilityValue::NativeShaderFourcc(self.native_shader_fourcc),
            Capability::NativeShaderVersion => CapabilityValue::NativeShaderVersion(self.native_shader_version),
            Capability::DeviceCaps => CapabilityValue::DeviceCaps(Box::new(self.caps.clone())),
            Capability::FragDepthSupport => CapabilityValue::FragDepthSupport(self.frag_depth_support),
        }
    }

    /// Apply an override; a new platform also resets every stage profile
    pub fn set(&mut self, value: CapabilityValue) {
        match value {
            CapabilityValue::Platform(name) => {
                self.shader_profiles = profiles_for_platform(&name);
                self.platform = name;
            }
            CapabilityValue::MajorVersion(v) => self.major_version = v,
            CapabilityValue::MinorVersion(v) => self.minor_version = v,
            CapabilityValue::RequiresFlipping(v) => self.requires_flipping = v,
            CapabilityValue::NativeShaderFourcc(v) => self.native_shader_fourcc = v,
            CapabilityValue::NativeShaderVersion(v) => self.native_shader_version = v,
            CapabilityValue::DeviceCaps(caps) => self.caps = *caps,
            CapabilityValue::FragDepthSupport(v) => self.frag_depth_support = v,
        }
    }
}

// ============================================================================
// VulkanRenderEngine
// ============================================================================

pub struct VulkanRenderEngine {
    device: Arc<VulkanDevice>,
    attributes: EngineAttributes,
    window: VulkanRenderWindow,
    /// One per swapchain image, reused once the image's fence has signaled
    draw_command_buffers: Vec<vk::CommandBuffer>,
    /// Command buffer of the frame between `begin_frame` and `end_frame`
    recording: Option<vk::CommandBuffer>,
}

impl VulkanRenderEngine {
    /// Fill the device caps, create the render window and its draw command buffers
    pub fn new(device: Arc<VulkanDevice>, window: &Window, settings: RenderSettings) -> Result<Self> {
        let attributes = EngineAttributes::new(device_caps(&device));
        let render_window = VulkanRenderWindow::new(Arc::clone(&device), window, settings)?;
        let draw_command_buffers =
            device.allocate_command_buffers(QueueKind::Graphics, render_window.image_count() as u32)?;

        engine_info!(
            "vkforge::vulkan",
            "Render engine ready: {}x{}, {} swapchain images, platform {}",
            render_window.width(),
            render_window.height(),
            draw_command_buffers.len(),
            attributes.platform
        );

        Ok(Self {
            device,
            attributes,
            window: render_window,
            draw_command_buffers,
            recording: None,
        })
    }

    pub fn device(&self) -> &Arc<VulkanDevice> {
        &self.device
    }

    pub fn attributes(&self) -> &EngineAttributes {
        &self.attributes
    }

    pub fn window(&self) -> &VulkanRenderWindow {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut VulkanRenderWindow {
        &mut self.window
    }

    /// Depth-stencil texture shared by every swapchain image
    pub fn screen_depth_stencil_texture(&self) -> Option<&Arc<VulkanTexture>> {
        self.window.depth_texture()
    }

    /// Everything a stage compilation needs from this engine
    pub fn compile_context<'a>(&'a self, compiler: &'a dyn ShaderCompiler) -> CompileContext<'a> {
        CompileContext {
            compiler,
            caps: &self.attributes.caps,
            default_profiles: &self.attributes.shader_profiles,
        }
    }

    /// Command buffer being recorded for the current frame
    pub fn current_command_buffer(&self) -> Option<vk::CommandBuffer> {
        self.recording
    }

    fn recording_command_buffer(&self) -> Result<vk::CommandBuffer> {
        self.recording.ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady("no frame is being recorded".to_string())
            )
        })
    }

    /// Reset and begin the draw command buffer of `image_index` and record the screen clear
    fn record_frame_start(&self, image_index: u32) -> Result<vk::CommandBuffer> {
        let command_buffer = *self
            .draw_command_buffers
            .get(image_index as usize)
            .ok_or_else(|| {
                engine_fail!(
                    "vkforge::vulkan",
                    Error::InvalidResource(format!("no draw command buffer for image {}", image_index))
                )
            })?;
        let raw = self.device.device();

        unsafe {
            raw.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::RELEASE_RESOURCES)
                .map_err(|e| vk_check("vkResetCommandBuffer", e))?;
            raw.begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::default())
                .map_err(|e| vk_check("vkBeginCommandBuffer", e))?;
        }

        self.window.clear(ClearFlags::COLOR | ClearFlags::DEPTH, SCREEN_CLEAR_COLOR, 1.0, 0);
        let begin = self.window.render_pass_info()?;
        unsafe {
            raw.cmd_begin_render_pass(command_buffer, &begin.info(), vk::SubpassContents::INLINE);
            raw.cmd_end_render_pass(command_buffer);
        }
        Ok(command_buffer)
    }

    /// Match the draw command buffers to a new swapchain image count
    fn reallocate_command_buffers(&mut self) -> Result<()> {
        let image_count = self.window.image_count();
        if image_count == self.draw_command_buffers.len() {
            return Ok(());
        }

        self.device.free_command_buffers(QueueKind::Graphics, &self.draw_command_buffers);
        self.draw_command_buffers.clear();
        self.draw_command_buffers = self
            .device
            .allocate_command_buffers(QueueKind::Graphics, image_count as u32)?;
        engine_debug!("vkforge::vulkan", "Reallocated {} draw command buffers", image_count);
        Ok(())
    }
}

impl RenderEngine for VulkanRenderEngine {
    fn name(&self) -> &str {
        "Vulkan Render Engine"
    }

    fn device_caps(&self) -> &RenderDeviceCaps {
        &self.attributes.caps
    }

    fn shader_profile(&self, stage: ShaderStage) -> &str {
        self.attributes.shader_profile(stage)
    }

    fn capability(&self, capability: Capability) -> Option<CapabilityValue> {
        Some(self.attributes.get(capability))
    }

    fn set_capability(&mut self, value: CapabilityValue) {
        engine_debug!("vkforge::vulkan", "Capability override: {:?}", value.capability());
        self.attributes.set(value);
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.recording.is_some() {
            engine_bail!("vkforge::vulkan", "begin_frame called twice without end_frame");
        }

        let image_index = self.window.begin_frame()?;
        match self.record_frame_start(image_index) {
            Ok(command_buffer) => {
                self.recording = Some(command_buffer);
                Ok(())
            }
            Err(e) => {
                // Keep the image for the next attempt instead of leaving the frame open
                self.window.release_frame();
                Err(e)
            }
        }
    }

    fn end_frame(&mut self) -> Result<()> {
        let command_buffer = self.recording_command_buffer()?;
        self.recording = None;

        if self.window.swap_buffers(command_buffer)? {
            let (width, height) = (self.window.width(), self.window.height());
            self.resize(width, height)?;
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.recording = None;
        self.window.resize(width, height)?;
        self.reallocate_command_buffers()
    }

    fn scissor_rect(&mut self, rect: Rect) -> Result<()> {
        let command_buffer = self.recording_command_buffer()?;
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: rect.x, y: rect.y },
            extent: vk::Extent2D { width: rect.width, height: rect.height },
        };
        unsafe { self.device.device().cmd_set_scissor(command_buffer, 0, &[scissor]) };
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }
}

impl Drop for VulkanRenderEngine {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_error!("vkforge::vulkan", "Render engine teardown without idle device: {}", e);
        }
        self.device.free_command_buffers(QueueKind::Graphics, &self.draw_command_buffers);
    }
}

#[cfg(test)]
#[path = "vulkan_render_engine_tests.rs"]
mod tests;
