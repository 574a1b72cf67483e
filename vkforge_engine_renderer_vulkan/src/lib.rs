/*!
# VkForge Engine - Vulkan Renderer Backend

Vulkan implementation of the VkForge rendering engine.

This crate implements the `vkforge_engine` render traits on top of Ash for the
Vulkan bindings and gpu-allocator for device memory. Resources are created
through [`VulkanRenderFactory`], which shares one [`VulkanDevice`] between the
render engine and everything else it makes.

## Modules

- **Device**: instance, physical device selection, queues, command pools
- **Resources**: buffers and textures with staged uploads, views, frame buffers
- **Screen**: swapchain-backed render window and the frame-level render engine
- **Shaders**: stage objects compiled to SPIR-V, reflected and linked to effects
*/

mod debug;
mod vulkan_buffer;
mod vulkan_check;
mod vulkan_device;
mod vulkan_frame_buffer;
mod vulkan_instance;
mod vulkan_mapping;
mod vulkan_memory;
mod vulkan_render_engine;
mod vulkan_render_factory;
mod vulkan_render_view;
mod vulkan_render_window;
mod vulkan_shader;
mod vulkan_staging;
mod vulkan_texture;

use std::sync::{Arc, Mutex};
use vkforge_engine::vkforge::{Engine, Result};
use vkforge_engine::vkforge::render::{Config, RenderEngine, RenderFactory, RenderSettings};
use vkforge_engine::engine_info;
use winit::window::Window;

pub use vulkan_buffer::{MappedBuffer, VulkanBuffer};
pub use vulkan_check::{error_from_vk, vk_check};
pub use vulkan_device::{QueueKind, VulkanDevice};
pub use vulkan_frame_buffer::{AttachmentClear, RenderPassBegin, VulkanFrameBuffer};
pub use vulkan_instance::VulkanInstance;
pub use vulkan_mapping::{from_vk_format, to_vk_format};
pub use vulkan_render_engine::{EngineAttributes, VulkanRenderEngine};
pub use vulkan_render_factory::VulkanRenderFactory;
pub use vulkan_render_view::{VulkanDepthStencilView, VulkanRenderTargetView, VulkanShaderResourceView};
pub use vulkan_render_window::{AcquiredImage, FrameCursor, VulkanRenderWindow, WindowClear};
pub use vulkan_shader::{
    CompileContext, ShaderReflection, StageState, VulkanShaderObject, VulkanShaderStageObject,
};
pub use vulkan_texture::VulkanTexture;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};

/// Entry point of the backend: a factory that creates its device on first use
pub fn make_render_factory(config: Config) -> VulkanRenderFactory {
    VulkanRenderFactory::new(config)
}

/// Create a render engine for `window` and register it with the engine under `name`
///
/// # Example
///
/// ```no_run
/// use vkforge_engine_renderer_vulkan::{make_render_factory, register};
///
/// # fn run(window: &winit::window::Window) -> vkforge_engine::vkforge::Result<()> {
/// let mut factory = make_render_factory(Default::default());
/// let main = register(&mut factory, "main", window, Default::default())?;
/// main.lock().unwrap().begin_frame()?;
/// # Ok(())
/// # }
/// ```
pub fn register(
    factory: &mut VulkanRenderFactory,
    name: &str,
    window: &Window,
    settings: RenderSettings,
) -> Result<Arc<Mutex<dyn RenderEngine>>> {
    Engine::initialize()?;
    let render_engine = factory.make_render_engine(window, settings)?;
    let handle = Engine::create_render_engine(name, render_engine)?;
    engine_info!("vkforge::vulkan", "Vulkan render engine '{}' registered", name);
    Ok(handle)
}
