/// VulkanFrameBuffer - render pass and framebuffer built from attached views
///
/// Attachments are ordered slots (a slot may be empty) plus an optional
/// depth-stencil view. The render pass and framebuffer are rebuilt lazily on
/// bind, and only when the attachment set changed since the last build.

use ash::vk;
use std::sync::Arc;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{ClearFlags, Color};
use vkforge_engine::{engine_fail, engine_trace};

use crate::vulkan_check::vk_check;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_render_view::{VulkanDepthStencilView, VulkanRenderTargetView};

/// Color used when no clear was staged
pub const DEFAULT_CLEAR_COLOR: Color = Color::new(0.0, 0.0, 0.0, 1.0);
pub const DEFAULT_CLEAR_DEPTH: f32 = 1.0;
pub const DEFAULT_CLEAR_STENCIL: u32 = 0;

/// Clear value of one attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachmentClear {
    Color(Color),
    DepthStencil { depth: f32, stencil: u32 },
}

impl AttachmentClear {
    pub fn to_vk(self) -> vk::ClearValue {
        match self {
            AttachmentClear::Color(color) => vk::ClearValue {
                color: vk::ClearColorValue { float32: color.to_array() },
            },
            AttachmentClear::DepthStencil { depth, stencil } => vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
            },
        }
    }
}

/// Clear list in attachment order: colors first, then depth-stencil
///
/// Missing staged values fall back to the defaults.
pub fn collect_clear_values<I>(colors: I, depth_stencil: Option<(Option<f32>, Option<u32>)>) -> Vec<AttachmentClear>
where
    I: IntoIterator<Item = Option<Color>>,
{
    let mut values: Vec<AttachmentClear> = colors
        .into_iter()
        .map(|color| AttachmentClear::Color(color.unwrap_or(DEFAULT_CLEAR_COLOR)))
        .collect();

    if let Some((depth, stencil)) = depth_stencil {
        values.push(AttachmentClear::DepthStencil {
            depth: depth.unwrap_or(DEFAULT_CLEAR_DEPTH),
            stencil: stencil.unwrap_or(DEFAULT_CLEAR_STENCIL),
        });
    }
    values
}

/// Common size of every attachment, or `InvalidResource` when two differ
pub fn common_attachment_extent<I>(extents: I) -> Result<(u32, u32)>
where
    I: IntoIterator<Item = (u32, u32)>,
{
    let mut extents = extents.into_iter();
    let Some(first) = extents.next() else {
        return Err(engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource("frame buffer has no attachments".to_string())
        ));
    };
    match extents.find(|&extent| extent != first) {
        None => Ok(first),
        Some((width, height)) => Err(engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource(format!(
                "attachment sizes differ: {}x{} and {}x{}",
                first.0, first.1, width, height
            ))
        )),
    }
}

/// Attachment descriptions: every color attachment cleared and stored, depth cleared and discarded
pub fn attachment_descriptions(
    color_formats: &[vk::Format],
    depth_format: Option<vk::Format>,
    color_final_layout: vk::ImageLayout,
) -> Vec<vk::AttachmentDescription> {
    let mut descriptions: Vec<vk::AttachmentDescription> = color_formats
        .iter()
        .map(|&format| {
            vk::AttachmentDescription::default()
                .format(format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(color_final_layout)
        })
        .collect();

    if let Some(format) = depth_format {
        descriptions.push(
            vk::AttachmentDescription::default()
                .format(format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::CLEAR)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        );
    }
    descriptions
}

/// Dependencies ordering fragment shader reads against color writes on both sides of the subpass
pub fn offscreen_subpass_dependencies() -> [vk::SubpassDependency; 2] {
    [
        vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::SHADER_READ)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dependency_flags(vk::DependencyFlags::BY_REGION),
        vk::SubpassDependency::default()
            .src_subpass(0)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ)
            .dependency_flags(vk::DependencyFlags::BY_REGION),
    ]
}

/// Create a single-subpass render pass
pub(crate) fn create_render_pass(
    device: &ash::Device,
    color_formats: &[vk::Format],
    depth_format: Option<vk::Format>,
    color_final_layout: vk::ImageLayout,
    dependencies: &[vk::SubpassDependency],
) -> Result<vk::RenderPass> {
    let attachments = attachment_descriptions(color_formats, depth_format, color_final_layout);

    let color_refs: Vec<vk::AttachmentReference> = (0..color_formats.len() as u32)
        .map(|attachment| vk::AttachmentReference {
            attachment,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        })
        .collect();
    let depth_ref = vk::AttachmentReference {
        attachment: color_formats.len() as u32,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    };

    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);
    if depth_format.is_some() {
        subpass = subpass.depth_stencil_attachment(&depth_ref);
    }
    let subpasses = [subpass];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(dependencies);

    unsafe { device.create_render_pass(&create_info, None) }
        .map_err(|e| vk_check("vkCreateRenderPass", e))
}

/// Everything needed to begin the frame buffer's render pass
#[derive(Clone)]
pub struct RenderPassBegin {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub clear_values: Vec<AttachmentClear>,
    vk_clear_values: Vec<vk::ClearValue>,
}

impl RenderPassBegin {
    pub fn new(render_pass: vk::RenderPass, framebuffer: vk::Framebuffer, extent: vk::Extent2D, clear_values: Vec<AttachmentClear>) -> Self {
        let vk_clear_values = clear_values.iter().map(|clear| clear.to_vk()).collect();
        Self {
            render_pass,
            framebuffer,
            extent,
            clear_values,
            vk_clear_values,
        }
    }

    pub fn info(&self) -> vk::RenderPassBeginInfo<'_> {
        vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(self.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.extent,
            })
            .clear_values(&self.vk_clear_values)
    }
}

/// Off-screen frame buffer
pub struct VulkanFrameBuffer {
    device: Arc<VulkanDevice>,
    rt_views: Vec<Option<Arc<VulkanRenderTargetView>>>,
    ds_view: Option<Arc<VulkanDepthStencilView>>,
    width: u32,
    height: u32,
    views_dirty: bool,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    rebuild_count: u32,
}

impl VulkanFrameBuffer {
    pub fn new(device: Arc<VulkanDevice>) -> Self {
        Self {
            device,
            rt_views: Vec::new(),
            ds_view: None,
            width: 0,
            height: 0,
            views_dirty: true,
            render_pass: vk::RenderPass::null(),
            framebuffer: vk::Framebuffer::null(),
            rebuild_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_dirty(&self) -> bool {
        self.views_dirty
    }

    /// Number of render pass / framebuffer builds so far
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild_count
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    pub fn render_target(&self, slot: usize) -> Option<&Arc<VulkanRenderTargetView>> {
        self.rt_views.get(slot).and_then(|view| view.as_ref())
    }

    pub fn depth_stencil(&self) -> Option<&Arc<VulkanDepthStencilView>> {
        self.ds_view.as_ref()
    }

    fn update_size(&mut self) {
        let first_color = self.rt_views.iter().flatten().next().map(|v| (v.width(), v.height()));
        let depth = self.ds_view.as_ref().map(|v| (v.width(), v.height()));
        let (width, height) = first_color.or(depth).unwrap_or((0, 0));
        self.width = width;
        self.height = height;
    }

    /// Put `view` into color slot `slot`, `None` empties the slot
    pub fn attach(&mut self, slot: usize, view: Option<Arc<VulkanRenderTargetView>>) {
        if self.rt_views.len() <= slot {
            self.rt_views.resize(slot + 1, None);
        }
        self.rt_views[slot] = view;
        while matches!(self.rt_views.last(), Some(None)) {
            self.rt_views.pop();
        }
        self.views_dirty = true;
        self.update_size();
    }

    pub fn detach(&mut self, slot: usize) {
        self.attach(slot, None);
    }

    pub fn attach_depth_stencil(&mut self, view: Option<Arc<VulkanDepthStencilView>>) {
        self.ds_view = view;
        self.views_dirty = true;
        self.update_size();
    }

    /// Build the render pass and framebuffer if the attachments changed
    pub fn on_bind(&mut self) -> Result<()> {
        if !self.views_dirty {
            return Ok(());
        }

        let extents = self
            .rt_views
            .iter()
            .flatten()
            .map(|v| (v.width(), v.height()))
            .chain(self.ds_view.as_ref().map(|v| (v.width(), v.height())));
        common_attachment_extent(extents)?;

        self.destroy_objects();

        let color_views: Vec<&Arc<VulkanRenderTargetView>> = self.rt_views.iter().flatten().collect();

        let color_formats: Vec<vk::Format> = color_views.iter().map(|v| v.vk_format()).collect();
        let mut attachments: Vec<vk::ImageView> = color_views.iter().map(|v| v.image_view()).collect();
        let depth_format = self.ds_view.as_ref().map(|v| v.vk_format());
        if let Some(ds) = &self.ds_view {
            attachments.push(ds.image_view());
        }

        let device = self.device.device();
        let render_pass = create_render_pass(
            device,
            &color_formats,
            depth_format,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            &offscreen_subpass_dependencies(),
        )?;

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(self.width)
            .height(self.height)
            .layers(1);

        let framebuffer = match unsafe { device.create_framebuffer(&create_info, None) } {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                unsafe { device.destroy_render_pass(render_pass, None) };
                return Err(vk_check("vkCreateFramebuffer", e));
            }
        };

        self.render_pass = render_pass;
        self.framebuffer = framebuffer;
        self.views_dirty = false;
        self.rebuild_count += 1;

        engine_trace!(
            "vkforge::vulkan",
            "Frame buffer rebuilt ({} color, depth: {}, {}x{})",
            color_formats.len(), depth_format.is_some(), self.width, self.height
        );
        Ok(())
    }

    pub fn on_unbind(&mut self) {}

    /// Stage clears on the attached views
    pub fn clear(&self, flags: ClearFlags, color: Color, depth: f32, stencil: u32) {
        if flags.contains(ClearFlags::COLOR) {
            for view in self.rt_views.iter().flatten() {
                view.clear_color(color);
            }
        }
        if let Some(ds) = &self.ds_view {
            if flags.contains(ClearFlags::DEPTH) {
                ds.clear_depth(depth);
            }
            if flags.contains(ClearFlags::STENCIL) {
                ds.clear_stencil(stencil);
            }
        }
    }

    /// Render pass begin data, consuming every staged clear
    pub fn render_pass_info(&self) -> Result<RenderPassBegin> {
        if self.views_dirty {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady("frame buffer was not bound since its attachments changed".to_string())
            ));
        }

        let clear_values = collect_clear_values(
            self.rt_views.iter().flatten().map(|view| view.take_clear_color()),
            self.ds_view.as_ref().map(|ds| ds.take_clear_depth_stencil()),
        );

        Ok(RenderPassBegin::new(
            self.render_pass,
            self.framebuffer,
            vk::Extent2D { width: self.width, height: self.height },
            clear_values,
        ))
    }

    fn destroy_objects(&mut self) {
        let device = self.device.device();
        unsafe {
            if self.framebuffer != vk::Framebuffer::null() {
                device.destroy_framebuffer(self.framebuffer, None);
                self.framebuffer = vk::Framebuffer::null();
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
        }
    }
}

impl Drop for VulkanFrameBuffer {
    fn drop(&mut self) {
        self.destroy_objects();
    }
}

#[cfg(test)]
#[path = "vulkan_frame_buffer_tests.rs"]
mod tests;
