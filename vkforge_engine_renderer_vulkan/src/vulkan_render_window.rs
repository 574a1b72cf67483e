/// VulkanRenderWindow - swapchain-backed screen frame buffer
///
/// Owns the surface, the swapchain with one view, framebuffer and
/// render-finished semaphore per image, a depth-stencil buffer shared by every
/// image, and one fence plus one image-available semaphore per frame in flight.
///
/// Frame flow: `begin_frame` waits on the frame slot's fence, acquires an image
/// and waits on the fence of the slot that last rendered into it. The caller
/// records into its own command buffer using `render_pass_info`, then
/// `swap_buffers` submits that command buffer and presents.

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{
    AccessHint, ClearFlags, Color, ElementFormat, RenderSettings, TextureDesc,
};
use vkforge_engine::{engine_bail, engine_debug, engine_error, engine_fail, engine_info, engine_warn};
use winit::window::Window;

use crate::vulkan_check::vk_check;
use crate::vulkan_device::{QueueKind, VulkanDevice};
use crate::vulkan_frame_buffer::{
    create_render_pass, AttachmentClear, RenderPassBegin, DEFAULT_CLEAR_COLOR, DEFAULT_CLEAR_DEPTH,
    DEFAULT_CLEAR_STENCIL,
};
use crate::vulkan_mapping::{from_vk_format, to_vk_format};
use crate::vulkan_render_view::{PendingClear, VulkanDepthStencilView};
use crate::vulkan_texture::VulkanTexture;

/// Frames recorded ahead of the GPU when the settings ask for none
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Depth formats tried, in order, after the requested one
const DEPTH_FORMAT_FALLBACKS: [ElementFormat; 3] = [ElementFormat::D24S8, ElementFormat::D32F, ElementFormat::D16];

// ============================================================================
// Swapchain parameter selection
// ============================================================================

/// Back-buffer format: the requested one if the surface offers it, else the first offered
///
/// A single `UNDEFINED` entry means the surface accepts any format.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR], requested: vk::Format) -> Option<vk::SurfaceFormatKHR> {
    let wanted = vk::SurfaceFormatKHR {
        format: requested,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    match formats {
        [] => None,
        [only] if only.format == vk::Format::UNDEFINED => Some(wanted),
        _ => formats
            .iter()
            .find(|f| f.format == wanted.format && f.color_space == wanted.color_space)
            .or_else(|| formats.first())
            .copied(),
    }
}

/// Present mode: mailbox when available, FIFO otherwise
///
/// A zero sync interval prefers immediate presentation.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR], sync_interval: u32) -> vk::PresentModeKHR {
    if sync_interval == 0 && modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
        return vk::PresentModeKHR::IMMEDIATE;
    }
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Requested size clamped to the surface limits
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// One image more than the minimum, bounded by the maximum (0 = unbounded)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// First usable depth format, starting with the requested one
pub fn choose_depth_format<F>(requested: ElementFormat, is_supported: F) -> Option<ElementFormat>
where
    F: Fn(ElementFormat) -> bool,
{
    std::iter::once(requested)
        .chain(DEPTH_FORMAT_FALLBACKS)
        .filter(|format| format.is_depth())
        .find(|&format| is_supported(format))
}

/// External dependency of the screen pass: wait for the previous use of the
/// color image and of the shared depth buffer
pub fn window_subpass_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
        .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_READ
                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
}

/// Staged window clear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowClear {
    pub flags: ClearFlags,
    pub color: Color,
    pub depth: f32,
    pub stencil: u32,
}

/// Always two values, color then depth-stencil, defaults where the staged flags leave a gap
pub fn window_clear_values(staged: Option<WindowClear>) -> [AttachmentClear; 2] {
    let mut color = DEFAULT_CLEAR_COLOR;
    let mut depth = DEFAULT_CLEAR_DEPTH;
    let mut stencil = DEFAULT_CLEAR_STENCIL;

    if let Some(clear) = staged {
        if clear.flags.contains(ClearFlags::COLOR) {
            color = clear.color;
        }
        if clear.flags.contains(ClearFlags::DEPTH) {
            depth = clear.depth;
        }
        if clear.flags.contains(ClearFlags::STENCIL) {
            stencil = clear.stencil;
        }
    }

    [AttachmentClear::Color(color), AttachmentClear::DepthStencil { depth, stencil }]
}

// ============================================================================
// Frame bookkeeping
// ============================================================================

/// Swapchain image held between acquire and present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    pub index: u32,
    /// False while the image is held but no frame records into it yet
    pub in_frame: bool,
}

/// Which frame slot is current, which image is held, and which slot last
/// rendered into each image
///
/// An acquired image stays held across a failed `begin_frame`, so the next
/// attempt resumes with it instead of acquiring again on a semaphore that is
/// already signaled.
#[derive(Debug, Clone)]
pub struct FrameCursor {
    frames_in_flight: usize,
    current_frame: usize,
    acquired: Option<AcquiredImage>,
    image_owners: Vec<Option<usize>>,
}

impl FrameCursor {
    pub fn new(frames_in_flight: usize, image_count: usize) -> Self {
        Self {
            frames_in_flight: frames_in_flight.max(1),
            current_frame: 0,
            acquired: None,
            image_owners: vec![None; image_count],
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Image held by the window, whether or not a frame records into it
    pub fn held_image(&self) -> Option<u32> {
        self.acquired.map(|acquired| acquired.index)
    }

    /// Image the current frame records into
    pub fn current_image(&self) -> Option<u32> {
        self.acquired
            .filter(|acquired| acquired.in_frame)
            .map(|acquired| acquired.index)
    }

    pub fn check_can_begin(&self) -> Result<()> {
        if self.current_image().is_some() {
            engine_bail!("vkforge::vulkan", "begin_frame called twice without swap_buffers");
        }
        Ok(())
    }

    pub fn on_acquired(&mut self, index: u32) {
        self.acquired = Some(AcquiredImage { index, in_frame: false });
    }

    /// Slot whose fence guards `index`, when it is not the current slot
    pub fn image_owner(&self, index: u32) -> Option<usize> {
        self.image_owners
            .get(index as usize)
            .copied()
            .flatten()
            .filter(|&slot| slot != self.current_frame)
    }

    /// Mark the held image as recorded by the current slot
    pub fn start_frame(&mut self) -> Result<u32> {
        let Some(acquired) = self.acquired.as_mut() else {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady("no swapchain image acquired".to_string())
            ));
        };
        let Some(owner) = self.image_owners.get_mut(acquired.index as usize) else {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::InvalidResource(format!("swapchain image {} out of range", acquired.index))
            ));
        };
        *owner = Some(self.current_frame);
        acquired.in_frame = true;
        Ok(acquired.index)
    }

    /// Give up the current frame but keep the image for the next `begin_frame`
    pub fn release(&mut self) {
        if let Some(acquired) = self.acquired.as_mut() {
            acquired.in_frame = false;
        }
    }

    /// Image and slot of the frame being submitted
    pub fn submission(&self) -> Result<(u32, usize)> {
        let index = self.current_image().ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady("swap_buffers without an acquired image".to_string())
            )
        })?;
        Ok((index, self.current_frame))
    }

    /// The frame was submitted: drop the image and move to the next slot
    pub fn finish_frame(&mut self) {
        self.acquired = None;
        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;
    }

    /// Forget every image after the swapchain was rebuilt
    pub fn reset_images(&mut self, image_count: usize) {
        self.acquired = None;
        self.image_owners = vec![None; image_count];
    }
}

// ============================================================================
// Per-swapchain objects
// ============================================================================

/// Everything rebuilt when the swapchain is recreated
struct SwapchainTargets {
    swapchain: vk::SwapchainKHR,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    depth_stencil_view: Option<Arc<VulkanDepthStencilView>>,
    framebuffers: Vec<vk::Framebuffer>,
    /// Signaled by the frame submit, waited on by present. One per image.
    render_finished: Vec<vk::Semaphore>,
}

impl SwapchainTargets {
    fn empty() -> Self {
        Self {
            swapchain: vk::SwapchainKHR::null(),
            extent: vk::Extent2D { width: 0, height: 0 },
            images: Vec::new(),
            image_views: Vec::new(),
            depth_stencil_view: None,
            framebuffers: Vec::new(),
            render_finished: Vec::new(),
        }
    }

    /// Destroy everything but the swapchain itself
    fn destroy_image_objects(&mut self, device: &VulkanDevice) {
        let raw = device.device();
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                raw.destroy_framebuffer(framebuffer, None);
            }
            for view in self.image_views.drain(..) {
                raw.destroy_image_view(view, None);
            }
            for semaphore in self.render_finished.drain(..) {
                raw.destroy_semaphore(semaphore, None);
            }
        }
        self.depth_stencil_view = None;
        self.images.clear();
    }

    fn destroy(&mut self, device: &VulkanDevice) {
        self.destroy_image_objects(device);
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe { device.swapchain_loader().destroy_swapchain(self.swapchain, None) };
            self.swapchain = vk::SwapchainKHR::null();
        }
    }
}

// ============================================================================
// Render window
// ============================================================================

/// Screen frame buffer presenting to a window surface
pub struct VulkanRenderWindow {
    device: Arc<VulkanDevice>,
    settings: RenderSettings,
    surface: vk::SurfaceKHR,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    depth_format: ElementFormat,
    render_pass: vk::RenderPass,
    targets: SwapchainTargets,
    /// Signaled by acquire, waited on by the frame submit. One per frame in flight.
    image_available: Vec<vk::Semaphore>,
    /// Signaled when the GPU finished the frame submitted from the slot
    frame_fences: Vec<vk::Fence>,
    cursor: FrameCursor,
    pending_clear: PendingClear<WindowClear>,
}

impl VulkanRenderWindow {
    /// Create the surface for `window` and build the swapchain
    pub fn new(device: Arc<VulkanDevice>, window: &Window, settings: RenderSettings) -> Result<Self> {
        let surface = create_surface(&device, window)?;

        match Self::with_surface(device.clone(), surface, settings) {
            Ok(render_window) => Ok(render_window),
            Err(e) => {
                unsafe { device.instance().surface_loader.destroy_surface(surface, None) };
                Err(e)
            }
        }
    }

    fn with_surface(device: Arc<VulkanDevice>, surface: vk::SurfaceKHR, settings: RenderSettings) -> Result<Self> {
        let surface_loader = &device.instance().surface_loader;
        let physical_device = device.physical_device;
        let graphics_family = device.queue_family(QueueKind::Graphics);

        let present_support = unsafe {
            surface_loader.get_physical_device_surface_support(physical_device, graphics_family, surface)
        }
        .map_err(|e| vk_check("vkGetPhysicalDeviceSurfaceSupportKHR", e))?;
        if !present_support {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::InitializationFailed(format!("Graphics queue family {} cannot present to the surface", graphics_family))
            ));
        }

        let (formats, present_modes) = unsafe {
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| vk_check("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
            let modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(|e| vk_check("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;
            (formats, modes)
        };

        let requested = to_vk_format(settings.color_fmt).unwrap_or(vk::Format::UNDEFINED);
        let surface_format = choose_surface_format(&formats, requested).ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::UnsupportedFormat("surface reports no formats".to_string())
            )
        })?;
        if surface_format.format != requested {
            engine_warn!(
                "vkforge::vulkan",
                "Back-buffer format {:?} not offered by the surface, using {:?}",
                settings.color_fmt, surface_format.format
            );
        }
        let present_mode = choose_present_mode(&present_modes, settings.sync_interval);

        let depth_format = choose_depth_format(settings.depth_stencil_fmt, |format| {
            to_vk_format(format).is_ok_and(|vk_format| {
                device.is_format_supported(
                    vk_format,
                    vk::ImageTiling::OPTIMAL,
                    vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT | vk::FormatFeatureFlags::SAMPLED_IMAGE,
                )
            })
        })
        .ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::UnsupportedFormat(format!("no usable depth format (requested {:?})", settings.depth_stencil_fmt))
            )
        })?;

        let render_pass = create_render_pass(
            device.device(),
            &[surface_format.format],
            Some(to_vk_format(depth_format)?),
            vk::ImageLayout::PRESENT_SRC_KHR,
            &[window_subpass_dependency()],
        )?;

        let mut render_window = Self {
            device,
            settings,
            surface,
            surface_format,
            present_mode,
            depth_format,
            render_pass,
            targets: SwapchainTargets::empty(),
            image_available: Vec::new(),
            frame_fences: Vec::new(),
            cursor: FrameCursor::new(1, 0),
            pending_clear: PendingClear::new(),
        };

        // From here on Drop releases whatever was built, but not the surface
        // which `new` destroys on failure.
        let built = render_window
            .create_frame_sync()
            .and_then(|_| render_window.build_targets(settings.width, settings.height));
        if let Err(e) = built {
            render_window.surface = vk::SurfaceKHR::null();
            return Err(e);
        }
        render_window.cursor = FrameCursor::new(render_window.frames_in_flight(), render_window.targets.images.len());

        engine_info!(
            "vkforge::vulkan",
            "Render window {}x{} ({:?}, {:?}, {} images, depth {:?})",
            render_window.targets.extent.width, render_window.targets.extent.height,
            surface_format.format, present_mode, render_window.targets.images.len(), depth_format
        );
        Ok(render_window)
    }

    fn frames_in_flight(&self) -> usize {
        match self.settings.frames_in_flight {
            0 => MAX_FRAMES_IN_FLIGHT,
            n => n as usize,
        }
    }

    fn create_frame_sync(&mut self) -> Result<()> {
        let raw = self.device.device();
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        for _ in 0..self.frames_in_flight() {
            let semaphore = unsafe { raw.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
                .map_err(|e| vk_check("vkCreateSemaphore", e))?;
            self.image_available.push(semaphore);
            let fence = unsafe { raw.create_fence(&fence_info, None) }
                .map_err(|e| vk_check("vkCreateFence", e))?;
            self.frame_fences.push(fence);
        }
        Ok(())
    }

    /// Swap a slot's image-available semaphore for an unsignaled one
    ///
    /// The device must be idle.
    fn replace_image_available(&mut self, slot: usize) -> Result<()> {
        let raw = self.device.device();
        let semaphore = unsafe { raw.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
            .map_err(|e| vk_check("vkCreateSemaphore", e))?;
        let old = std::mem::replace(&mut self.image_available[slot], semaphore);
        unsafe { raw.destroy_semaphore(old, None) };
        Ok(())
    }

    fn wait_frame_fence(&self, slot: usize, timeout_ns: u64) -> Result<()> {
        let fence = self.frame_fences[slot];
        unsafe { self.device.device().wait_for_fences(&[fence], true, timeout_ns) }
            .map_err(|e| vk_check("vkWaitForFences", e))
    }

    /// Create the swapchain (replacing the current one) and every per-image object
    fn build_targets(&mut self, width: u32, height: u32) -> Result<()> {
        let capabilities = unsafe {
            self.device
                .instance()
                .surface_loader
                .get_physical_device_surface_capabilities(self.device.physical_device, self.surface)
        }
        .map_err(|e| vk_check("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;

        let extent = choose_extent(&capabilities, width, height);
        let old_swapchain = self.targets.swapchain;

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(choose_image_count(&capabilities))
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { self.device.swapchain_loader().create_swapchain(&create_info, None) }
            .map_err(|e| vk_check("vkCreateSwapchainKHR", e))?;

        self.targets.destroy(&self.device);
        self.targets.swapchain = swapchain;
        self.targets.extent = extent;

        if let Err(e) = self.build_image_objects() {
            self.targets.destroy(&self.device);
            return Err(e);
        }
        Ok(())
    }

    fn build_image_objects(&mut self) -> Result<()> {
        let raw = self.device.device();
        let extent = self.targets.extent;

        self.targets.images = unsafe { self.device.swapchain_loader().get_swapchain_images(self.targets.swapchain) }
            .map_err(|e| vk_check("vkGetSwapchainImagesKHR", e))?;

        let mut depth_texture = VulkanTexture::new(
            self.device.clone(),
            &TextureDesc::tex2d(
                extent.width,
                extent.height,
                1,
                1,
                self.depth_format,
                AccessHint::GPU_READ | AccessHint::GPU_WRITE,
            ),
        )?;
        depth_texture.create_hw_resource(None)?;
        let depth_stencil_view = Arc::new(VulkanDepthStencilView::new(
            Arc::new(depth_texture),
            self.depth_format,
            0,
            1,
            0,
        )?);
        let depth_image_view = depth_stencil_view.image_view();
        self.targets.depth_stencil_view = Some(depth_stencil_view);

        for i in 0..self.targets.images.len() {
            let image = self.targets.images[i];
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let image_view = unsafe { raw.create_image_view(&view_info, None) }
                .map_err(|e| vk_check("vkCreateImageView", e))?;
            self.targets.image_views.push(image_view);

            let attachments = [image_view, depth_image_view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);
            let framebuffer = unsafe { raw.create_framebuffer(&framebuffer_info, None) }
                .map_err(|e| vk_check("vkCreateFramebuffer", e))?;
            self.targets.framebuffers.push(framebuffer);

            let semaphore = unsafe { raw.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
                .map_err(|e| vk_check("vkCreateSemaphore", e))?;
            self.targets.render_finished.push(semaphore);
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn width(&self) -> u32 {
        self.targets.extent.width
    }

    pub fn height(&self) -> u32 {
        self.targets.extent.height
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.targets.extent
    }

    pub fn image_count(&self) -> usize {
        self.targets.images.len()
    }

    pub fn vk_format(&self) -> vk::Format {
        self.surface_format.format
    }

    /// Back-buffer format, when it has an engine equivalent
    pub fn format(&self) -> Option<ElementFormat> {
        from_vk_format(self.surface_format.format).ok()
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn depth_stencil_view(&self) -> Option<&Arc<VulkanDepthStencilView>> {
        self.targets.depth_stencil_view.as_ref()
    }

    /// Depth buffer shared by every swapchain image
    pub fn depth_texture(&self) -> Option<&Arc<VulkanTexture>> {
        self.targets.depth_stencil_view.as_ref().map(|view| view.texture())
    }

    /// Image acquired by the last `begin_frame`, until `swap_buffers`
    pub fn current_image(&self) -> Option<u32> {
        self.cursor.current_image()
    }

    pub fn current_frame(&self) -> usize {
        self.cursor.current_frame()
    }

    // ===== FRAME =====

    /// Acquire the next image and wait until the GPU is done with it, without a timeout
    pub fn begin_frame(&mut self) -> Result<u32> {
        self.begin_frame_with_timeout(u64::MAX)
    }

    /// Acquire the next image and wait until the GPU is done with it, each
    /// wait bounded by `timeout_ns`
    ///
    /// Fails with `Timeout` or `DeviceLost` instead of blocking forever. An
    /// image acquired before a failed wait is kept and reused by the next call.
    pub fn begin_frame_with_timeout(&mut self, timeout_ns: u64) -> Result<u32> {
        self.cursor.check_can_begin()?;

        // The slot's semaphore is free again once its last submit completed
        let frame = self.cursor.current_frame();
        self.wait_frame_fence(frame, timeout_ns)?;

        let image_index = match self.cursor.held_image() {
            Some(index) => index,
            None => {
                let (index, suboptimal) = unsafe {
                    self.device.swapchain_loader().acquire_next_image(
                        self.targets.swapchain,
                        timeout_ns,
                        self.image_available[frame],
                        vk::Fence::null(),
                    )
                }
                .map_err(|e| vk_check("vkAcquireNextImageKHR", e))?;
                if suboptimal {
                    engine_debug!("vkforge::vulkan", "Swapchain suboptimal on acquire");
                }
                self.cursor.on_acquired(index);
                index
            }
        };

        if let Some(owner) = self.cursor.image_owner(image_index) {
            self.wait_frame_fence(owner, timeout_ns)?;
        }
        self.cursor.start_frame()
    }

    /// Abandon the frame started by `begin_frame` without presenting
    ///
    /// The acquired image stays with the window and the next `begin_frame`
    /// records into it.
    pub fn release_frame(&mut self) {
        self.cursor.release();
    }

    /// Stage the clear for the next `render_pass_info`
    pub fn clear(&self, flags: ClearFlags, color: Color, depth: f32, stencil: u32) {
        self.pending_clear.stage(WindowClear { flags, color, depth, stencil });
    }

    /// Render pass begin data for the acquired image, consuming the staged clear
    pub fn render_pass_info(&self) -> Result<RenderPassBegin> {
        let image_index = self.cursor.current_image().ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady("no swapchain image acquired".to_string())
            )
        })?;

        Ok(RenderPassBegin::new(
            self.render_pass,
            self.targets.framebuffers[image_index as usize],
            self.targets.extent,
            window_clear_values(self.pending_clear.take()).to_vec(),
        ))
    }

    /// End `command_buffer`, submit it for the acquired image and present
    ///
    /// Returns true when the swapchain no longer matches the surface and
    /// should be resized.
    pub fn swap_buffers(&mut self, command_buffer: vk::CommandBuffer) -> Result<bool> {
        let (image_index, frame) = self.cursor.submission()?;
        let raw = self.device.device();
        let fence = self.frame_fences[frame];
        let wait_semaphores = [self.image_available[frame]];
        let signal_semaphores = [self.targets.render_finished[image_index as usize]];

        if let Err(e) = unsafe { raw.end_command_buffer(command_buffer) } {
            self.cursor.release();
            return Err(vk_check("vkEndCommandBuffer", e));
        }

        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // Reset right before the submit so an early failure leaves the fence signaled
        unsafe { raw.reset_fences(&[fence]) }.map_err(|e| vk_check("vkResetFences", e))?;
        self.device.submit(QueueKind::Graphics, &[submit_info], fence)?;
        self.cursor.finish_frame();

        let swapchains = [self.targets.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match self.device.present(&present_info) {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_debug!("vkforge::vulkan", "Swapchain out of date on present");
                Ok(true)
            }
            Err(e) => Err(vk_check("vkQueuePresentKHR", e)),
        }
    }

    /// Recreate the swapchain and every per-image object for a new window size
    ///
    /// A zero-sized (minimized) window is ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            engine_debug!("vkforge::vulkan", "Ignoring resize to {}x{}", width, height);
            return Ok(());
        }

        self.device.wait_idle()?;
        // A held image left its slot's semaphore signaled
        if self.cursor.held_image().is_some() {
            self.replace_image_available(self.cursor.current_frame())?;
        }
        self.cursor.reset_images(0);
        self.settings.width = width;
        self.settings.height = height;
        self.targets.destroy_image_objects(&self.device);
        self.build_targets(width, height)?;
        self.cursor.reset_images(self.targets.images.len());

        engine_debug!(
            "vkforge::vulkan",
            "Swapchain recreated at {}x{}",
            self.targets.extent.width, self.targets.extent.height
        );
        Ok(())
    }
}

impl Drop for VulkanRenderWindow {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_error!("vkforge::vulkan", "Render window teardown without idle device: {}", e);
        }

        self.targets.destroy(&self.device);
        let raw = self.device.device();
        unsafe {
            for semaphore in self.image_available.drain(..) {
                raw.destroy_semaphore(semaphore, None);
            }
            for fence in self.frame_fences.drain(..) {
                raw.destroy_fence(fence, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                raw.destroy_render_pass(self.render_pass, None);
            }
            if self.surface != vk::SurfaceKHR::null() {
                self.device.instance().surface_loader.destroy_surface(self.surface, None);
            }
        }
    }
}

fn create_surface(device: &VulkanDevice, window: &Window) -> Result<vk::SurfaceKHR> {
    let display_handle = window
        .display_handle()
        .map_err(|e| engine_fail!("vkforge::vulkan", Error::InitializationFailed(format!("Failed to get display handle: {}", e))))?;
    let window_handle = window
        .window_handle()
        .map_err(|e| engine_fail!("vkforge::vulkan", Error::InitializationFailed(format!("Failed to get window handle: {}", e))))?;

    let instance = device.instance();
    unsafe {
        ash_window::create_surface(
            &instance.entry,
            &instance.instance,
            display_handle.as_raw(),
            window_handle.as_raw(),
            None,
        )
    }
    .map_err(|e| vk_check("vkCreateSurfaceKHR", e))
}

#[cfg(test)]
#[path = "vulkan_render_window_tests.rs"]
mod tests;
