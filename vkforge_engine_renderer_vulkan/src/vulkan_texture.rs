/// VulkanTexture - 2D and 3D images with staged uploads and tracked layouts
///
/// One struct covers every dimensionality; `TextureType` is carried from
/// construction. The image layout is tracked explicitly and updated by every
/// transition recorded through this type.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::{Arc, Mutex};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{AccessHint, ElementFormat, ElementInitData, TextureDesc, TextureType};
use vkforge_engine::{engine_bail, engine_debug, engine_err, engine_fail};

use crate::vulkan_check::vk_check;
use crate::vulkan_device::{QueueKind, VulkanDevice};
use crate::vulkan_mapping::{aspect_mask, to_vk_format};
use crate::vulkan_memory::{allocate_image_memory, free_memory};

// ============================================================================
// Layout and size helpers
// ============================================================================

/// Extent of `base` at mip `level`, never below 1
pub fn mip_extent(base: u32, level: u32) -> u32 {
    base.checked_shr(level).unwrap_or(0).max(1)
}

/// Per-level byte offsets inside one array slice
///
/// `num_mips + 1` entries: `[0]` is 0 and the last entry is the slice size.
pub fn mip_offsets(format: ElementFormat, width: u32, height: u32, depth: u32, num_mips: u32) -> Vec<u64> {
    let mut offsets = Vec::with_capacity(num_mips as usize + 1);
    let mut offset = 0u64;
    offsets.push(offset);
    for level in 0..num_mips {
        offset += format.image_size(mip_extent(width, level), mip_extent(height, level), mip_extent(depth, level));
        offsets.push(offset);
    }
    offsets
}

/// Image usage derived from access hints
pub fn image_usage_flags(access_hint: AccessHint, is_depth: bool, has_init_data: bool) -> vk::ImageUsageFlags {
    let mut usage = vk::ImageUsageFlags::empty();
    if access_hint.contains(AccessHint::GPU_READ) {
        usage |= vk::ImageUsageFlags::SAMPLED;
        if has_init_data {
            usage |= vk::ImageUsageFlags::TRANSFER_DST;
        }
        if !access_hint.contains(AccessHint::IMMUTABLE) {
            usage |= vk::ImageUsageFlags::TRANSFER_SRC;
        }
    }
    if access_hint.contains(AccessHint::GPU_WRITE) {
        usage |= if is_depth {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }
    if access_hint.contains(AccessHint::GPU_UNORDERED) {
        usage |= vk::ImageUsageFlags::STORAGE;
    }
    usage
}

/// Optimal-tiling features an image with `usage` needs from its format
pub fn required_format_features(usage: vk::ImageUsageFlags) -> vk::FormatFeatureFlags {
    let mut features = vk::FormatFeatureFlags::empty();
    if usage.contains(vk::ImageUsageFlags::SAMPLED) {
        features |= vk::FormatFeatureFlags::SAMPLED_IMAGE;
    }
    if usage.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT) {
        features |= vk::FormatFeatureFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT) {
        features |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(vk::ImageUsageFlags::STORAGE) {
        features |= vk::FormatFeatureFlags::STORAGE_IMAGE;
    }
    features
}

/// Source and destination access masks of a layout transition
pub fn barrier_access_masks(old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> (vk::AccessFlags, vk::AccessFlags) {
    let mut src = match old_layout {
        vk::ImageLayout::PREINITIALIZED => vk::AccessFlags::HOST_WRITE,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
        _ => vk::AccessFlags::empty(),
    };

    let dst = match new_layout {
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => {
            if src.is_empty() {
                src = vk::AccessFlags::HOST_WRITE | vk::AccessFlags::TRANSFER_WRITE;
            }
            vk::AccessFlags::SHADER_READ
        }
        _ => vk::AccessFlags::empty(),
    };

    (src, dst)
}

/// Pipeline stage that produces or consumes an image in `layout`
pub fn stage_for_layout(layout: vk::ImageLayout) -> vk::PipelineStageFlags {
    match layout {
        vk::ImageLayout::UNDEFINED => vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::ImageLayout::PREINITIALIZED => vk::PipelineStageFlags::HOST,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL | vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::PipelineStageFlags::TRANSFER,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::PipelineStageFlags::FRAGMENT_SHADER,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        vk::ImageLayout::PRESENT_SRC_KHR => vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        _ => vk::PipelineStageFlags::ALL_COMMANDS,
    }
}

/// One copy region per (array slice, mip level), slice-major, tightly packed
pub fn upload_regions(
    format: ElementFormat,
    width: u32,
    height: u32,
    depth: u32,
    num_mips: u32,
    array_size: u32,
) -> Vec<vk::BufferImageCopy> {
    let offsets = mip_offsets(format, width, height, depth, num_mips);
    let slice_size = offsets.last().copied().unwrap_or(0);

    let mut regions = Vec::with_capacity((num_mips * array_size) as usize);
    for array_index in 0..array_size {
        for level in 0..num_mips {
            regions.push(
                vk::BufferImageCopy::default()
                    .buffer_offset(array_index as u64 * slice_size + offsets[level as usize])
                    .image_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: level,
                        base_array_layer: array_index,
                        layer_count: 1,
                    })
                    .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                    .image_extent(vk::Extent3D {
                        width: mip_extent(width, level),
                        height: mip_extent(height, level),
                        depth: mip_extent(depth, level),
                    }),
            );
        }
    }
    regions
}

#[allow(clippy::too_many_arguments)]
fn record_barrier(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    range: vk::ImageSubresourceRange,
    src_stage: vk::PipelineStageFlags,
    dst_stage: vk::PipelineStageFlags,
) {
    let (src_access, dst_access) = barrier_access_masks(old_layout, new_layout);
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(range)
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    unsafe {
        device.cmd_pipeline_barrier(cmd, src_stage, dst_stage, vk::DependencyFlags::empty(), &[], &[], &[barrier]);
    }
}

// ============================================================================
// VulkanTexture
// ============================================================================

/// Shape checks done before any Vulkan object exists
pub fn check_texture_desc(desc: &TextureDesc) -> Result<()> {
    match desc.texture_type {
        TextureType::Tex2D | TextureType::Tex3D => {}
        TextureType::Tex1D => return Err(Error::NotImplemented("1D textures")),
        TextureType::Cube => return Err(Error::NotImplemented("cube textures")),
    }
    if desc.width == 0 || desc.height == 0 || desc.depth == 0 || desc.array_size == 0 {
        return Err(Error::InvalidResource(format!(
            "texture extent {}x{}x{} with {} slices",
            desc.width, desc.height, desc.depth, desc.array_size
        )));
    }
    // Vulkan has no 3D image arrays
    if desc.texture_type == TextureType::Tex3D && desc.array_size > 1 {
        return Err(Error::InvalidResource(format!(
            "3D texture with {} array slices",
            desc.array_size
        )));
    }
    Ok(())
}

/// Vulkan texture
pub struct VulkanTexture {
    device: Arc<VulkanDevice>,
    desc: TextureDesc,
    vk_format: vk::Format,
    /// Per-level offsets inside one array slice
    mip_offsets: Vec<u64>,
    image: vk::Image,
    allocation: Option<Allocation>,
    current_layout: Mutex<vk::ImageLayout>,
}

impl VulkanTexture {
    /// Describe a texture. No image exists until `create_hw_resource`.
    pub fn new(device: Arc<VulkanDevice>, desc: &TextureDesc) -> Result<Self> {
        check_texture_desc(desc)?;

        let vk_format = to_vk_format(desc.format)?;

        let mut desc = *desc;
        desc.num_mip_maps = desc.resolved_mip_count();
        if desc.texture_type == TextureType::Tex2D {
            desc.depth = 1;
        }

        let mip_offsets = mip_offsets(desc.format, desc.width, desc.height, desc.depth, desc.num_mip_maps);

        Ok(Self {
            device,
            desc,
            vk_format,
            mip_offsets,
            image: vk::Image::null(),
            allocation: None,
            current_layout: Mutex::new(vk::ImageLayout::UNDEFINED),
        })
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &Arc<VulkanDevice> {
        &self.device
    }

    pub fn texture_type(&self) -> TextureType {
        self.desc.texture_type
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn format(&self) -> ElementFormat {
        self.desc.format
    }

    pub fn vk_format(&self) -> vk::Format {
        self.vk_format
    }

    pub fn num_mip_maps(&self) -> u32 {
        self.desc.num_mip_maps
    }

    pub fn array_size(&self) -> u32 {
        self.desc.array_size
    }

    pub fn access_hint(&self) -> AccessHint {
        self.desc.access_hint
    }

    pub fn width(&self, level: u32) -> u32 {
        mip_extent(self.desc.width, level)
    }

    pub fn height(&self, level: u32) -> u32 {
        mip_extent(self.desc.height, level)
    }

    pub fn depth(&self, level: u32) -> u32 {
        mip_extent(self.desc.depth, level)
    }

    pub fn mip_offsets(&self) -> &[u64] {
        &self.mip_offsets
    }

    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn hw_resource_ready(&self) -> bool {
        self.allocation.is_some()
    }

    pub fn current_layout(&self) -> vk::ImageLayout {
        self.current_layout
            .lock()
            .map(|layout| *layout)
            .unwrap_or(vk::ImageLayout::UNDEFINED)
    }

    pub fn aspect_mask(&self) -> vk::ImageAspectFlags {
        aspect_mask(self.desc.format)
    }

    /// Range covering every level and slice
    pub fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask(),
            base_mip_level: 0,
            level_count: self.desc.num_mip_maps,
            base_array_layer: 0,
            layer_count: self.desc.array_size,
        }
    }

    fn set_layout(&self, layout: vk::ImageLayout) -> Result<()> {
        let mut current = self.current_layout
            .lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Texture layout lock poisoned"))?;
        *current = layout;
        Ok(())
    }

    // ===== HARDWARE RESOURCE =====

    /// Create the image, bind device-local memory and perform the initial upload or transition
    ///
    /// `init_data` holds one entry per (array slice, mip level), slice-major.
    pub fn create_hw_resource(&mut self, init_data: Option<&[ElementInitData<'_>]>) -> Result<()> {
        if self.hw_resource_ready() {
            self.delete_hw_resource();
        }

        let init_data = init_data.filter(|data| !data.is_empty());
        let is_depth = self.desc.format.is_depth();
        let usage = image_usage_flags(self.desc.access_hint, is_depth, init_data.is_some() && !is_depth);
        if usage.is_empty() {
            engine_bail!("vkforge::vulkan", "Texture access hint {:?} gives the image no usage", self.desc.access_hint);
        }

        let features = required_format_features(usage);
        if !self.device.is_format_supported(self.vk_format, vk::ImageTiling::OPTIMAL, features) {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::UnsupportedFormat(format!("{:?} with optimal tiling and {:?}", self.desc.format, features))
            ));
        }

        if let Some(data) = init_data {
            let expected = (self.desc.num_mip_maps * self.desc.array_size) as usize;
            if data.len() < expected {
                engine_bail!("vkforge::vulkan", "Texture needs {} init data entries, got {}", expected, data.len());
            }
        }

        let image_type = match self.desc.texture_type {
            TextureType::Tex3D => vk::ImageType::TYPE_3D,
            _ => vk::ImageType::TYPE_2D,
        };

        let create_info = vk::ImageCreateInfo::default()
            .image_type(image_type)
            .format(self.vk_format)
            .extent(vk::Extent3D {
                width: self.desc.width,
                height: self.desc.height,
                depth: self.desc.depth,
            })
            .mip_levels(self.desc.num_mip_maps)
            .array_layers(self.desc.array_size)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { self.device.device().create_image(&create_info, None) }
            .map_err(|e| vk_check("vkCreateImage", e))?;

        let allocation = match allocate_image_memory(&self.device, image, vk::MemoryPropertyFlags::DEVICE_LOCAL, "texture") {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.device.device().destroy_image(image, None) };
                return Err(e);
            }
        };

        self.image = image;
        self.allocation = Some(allocation);
        *self.current_layout.get_mut().map_err(|_| engine_err!("vkforge::vulkan", "Texture layout lock poisoned"))? =
            vk::ImageLayout::UNDEFINED;

        let initialized = if is_depth {
            self.transition_to(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
        } else if let Some(data) = init_data {
            self.upload(data)
        } else if usage.contains(vk::ImageUsageFlags::SAMPLED) {
            self.transition_to(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        } else {
            Ok(())
        };

        if let Err(e) = initialized {
            self.delete_hw_resource();
            return Err(e);
        }

        engine_debug!(
            "vkforge::vulkan",
            "Created {:?} texture {}x{}x{} ({:?}, {} mips, {} slices)",
            self.desc.texture_type, self.desc.width, self.desc.height, self.desc.depth,
            self.desc.format, self.desc.num_mip_maps, self.desc.array_size
        );
        Ok(())
    }

    /// Copy every (slice, level) into staging and upload it in one command buffer
    fn upload(&self, init_data: &[ElementInitData<'_>]) -> Result<()> {
        let format = self.desc.format;
        let regions = upload_regions(
            format,
            self.desc.width,
            self.desc.height,
            self.desc.depth,
            self.desc.num_mip_maps,
            self.desc.array_size,
        );

        let range = self.full_range();
        let image = self.image;
        let old_layout = self.current_layout();
        let final_layout = if self.desc.access_hint.contains(AccessHint::GPU_READ) {
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        } else {
            vk::ImageLayout::TRANSFER_DST_OPTIMAL
        };

        self.device.with_staging(|staging| {
            for (region, data) in regions.iter().zip(init_data) {
                let level = region.image_subresource.mip_level;
                let size = self.mip_offsets[level as usize + 1] - self.mip_offsets[level as usize];
                let bytes = data.data.get(..size as usize).ok_or_else(|| {
                    engine_err!(
                        "vkforge::vulkan",
                        "Init data for slice {} level {} has {} bytes, {} needed",
                        region.image_subresource.base_array_layer, level, data.data.len(), size
                    )
                })?;
                staging.write(region.buffer_offset, bytes)?;
            }

            self.device.single_time_command(QueueKind::Graphics, |device, cmd| {
                record_barrier(
                    device, cmd, image, old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL, range,
                    stage_for_layout(old_layout), vk::PipelineStageFlags::TRANSFER,
                );
                unsafe {
                    device.cmd_copy_buffer_to_image(cmd, staging.buffer, image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &regions);
                }
                if final_layout != vk::ImageLayout::TRANSFER_DST_OPTIMAL {
                    record_barrier(
                        device, cmd, image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, final_layout, range,
                        vk::PipelineStageFlags::TRANSFER, stage_for_layout(final_layout),
                    );
                }
            })
        })?;

        self.set_layout(final_layout)
    }

    /// Destroy image and memory. Safe to call repeatedly.
    pub fn delete_hw_resource(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            free_memory(&self.device, allocation);
        }
        if self.image != vk::Image::null() {
            unsafe { self.device.device().destroy_image(self.image, None) };
            self.image = vk::Image::null();
        }
        if let Ok(layout) = self.current_layout.get_mut() {
            *layout = vk::ImageLayout::UNDEFINED;
        }
    }

    // ===== LAYOUT TRANSITIONS =====

    /// Record a layout barrier from the tracked layout on the graphics queue and wait for it
    pub fn transition_image_layout(
        &self,
        new_layout: vk::ImageLayout,
        range: vk::ImageSubresourceRange,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    ) -> Result<()> {
        if !self.hw_resource_ready() {
            return Err(Error::ResourceNotReady("texture has no image".to_string()));
        }

        let old_layout = self.current_layout();
        let image = self.image;
        self.device.single_time_command(QueueKind::Graphics, |device, cmd| {
            record_barrier(device, cmd, image, old_layout, new_layout, range, src_stage, dst_stage);
        })?;

        self.set_layout(new_layout)
    }

    /// Transition the whole image, stages derived from the layouts
    pub fn transition_to(&self, new_layout: vk::ImageLayout) -> Result<()> {
        let old_layout = self.current_layout();
        self.transition_image_layout(new_layout, self.full_range(), stage_for_layout(old_layout), stage_for_layout(new_layout))
    }

    // ===== READ BACK =====

    /// Download one (slice, level) subresource, tightly packed
    ///
    /// The image goes through transfer-src and returns to its previous layout.
    pub fn read_back_level(&self, array_index: u32, level: u32) -> Result<Vec<u8>> {
        if !self.hw_resource_ready() {
            return Err(Error::ResourceNotReady("texture has no image".to_string()));
        }
        if array_index >= self.desc.array_size || level >= self.desc.num_mip_maps {
            return Err(Error::InvalidResource(format!(
                "subresource (slice {}, level {}) out of range",
                array_index, level
            )));
        }
        if self.desc.format.is_depth() {
            return Err(engine_fail!("vkforge::vulkan", Error::NotImplemented("depth texture read back")));
        }

        let size = self.mip_offsets[level as usize + 1] - self.mip_offsets[level as usize];
        let image = self.image;
        let previous = self.current_layout();
        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: level,
            level_count: 1,
            base_array_layer: array_index,
            layer_count: 1,
        };
        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: level,
                base_array_layer: array_index,
                layer_count: 1,
            })
            .image_extent(vk::Extent3D {
                width: self.width(level),
                height: self.height(level),
                depth: self.depth(level),
            });
        // Undefined content cannot be restored, park the image in a readable layout
        let restore = if previous == vk::ImageLayout::UNDEFINED {
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL
        } else {
            previous
        };

        let bytes = self.device.with_staging(|staging| {
            self.device.single_time_command(QueueKind::Graphics, |device, cmd| {
                record_barrier(
                    device, cmd, image, previous, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, range,
                    stage_for_layout(previous), vk::PipelineStageFlags::TRANSFER,
                );
                unsafe {
                    device.cmd_copy_image_to_buffer(cmd, image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, staging.buffer, &[region]);
                }
                if restore != vk::ImageLayout::TRANSFER_SRC_OPTIMAL {
                    record_barrier(
                        device, cmd, image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, restore, range,
                        vk::PipelineStageFlags::TRANSFER, stage_for_layout(restore),
                    );
                }
            })?;
            staging.read(0, size as usize)
        })?;

        if restore != previous {
            self.set_layout(restore)?;
        }
        Ok(bytes)
    }

    // ===== UNIMPLEMENTED CONTRACT =====

    pub fn map_2d(&self, _array_index: u32, _level: u32, _x_offset: u32, _y_offset: u32, _width: u32, _height: u32) -> Result<(*mut u8, u32)> {
        Err(Error::NotImplemented("texture map"))
    }

    pub fn unmap_2d(&self, _array_index: u32, _level: u32) -> Result<()> {
        Err(Error::NotImplemented("texture unmap"))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_subresource_2d(
        &self,
        _array_index: u32,
        _level: u32,
        _x_offset: u32,
        _y_offset: u32,
        _width: u32,
        _height: u32,
        _data: &[u8],
        _row_pitch: u32,
    ) -> Result<()> {
        Err(Error::NotImplemented("texture subresource update"))
    }

    pub fn copy_to_texture(&self, _target: &VulkanTexture) -> Result<()> {
        Err(Error::NotImplemented("texture to texture copy"))
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        if self.hw_resource_ready() {
            engine_debug!("vkforge::vulkan", "Destroying {:?} texture {}x{}", self.desc.texture_type, self.desc.width, self.desc.height);
        }
        self.delete_hw_resource();
    }
}

#[cfg(test)]
#[path = "vulkan_texture_tests.rs"]
mod tests;
