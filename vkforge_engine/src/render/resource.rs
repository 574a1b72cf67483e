/// Semantic resource descriptors: access hints, buffer usage, texture shapes

use bitflags::bitflags;

use crate::render::ElementFormat;

bitflags! {
    /// How the CPU and GPU are going to touch a resource
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessHint: u32 {
        const CPU_READ = 1 << 0;
        const CPU_WRITE = 1 << 1;
        const GPU_READ = 1 << 2;
        const GPU_WRITE = 1 << 3;
        const GPU_UNORDERED = 1 << 4;
        const GPU_STRUCTURED = 1 << 5;
        const GENERATE_MIPS = 1 << 6;
        const IMMUTABLE = 1 << 7;
        const RAW = 1 << 8;
        const APPEND = 1 << 9;
        const COUNTER = 1 << 10;
        const DRAW_INDIRECT_ARGS = 1 << 11;
    }
}

/// Buffer update frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, device-local
    Static,
    /// Rewritten often, host-visible
    Dynamic,
}

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferBinding {
    Vertex,
    Index,
    Constant,
}

/// Buffer creation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub usage: BufferUsage,
    pub access_hint: AccessHint,
    pub binding: BufferBinding,
    pub size_in_bytes: u32,
    /// Element stride for structured buffers, 0 otherwise
    pub structure_byte_stride: u32,
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Tex1D,
    Tex2D,
    Tex3D,
    Cube,
}

/// Texture creation descriptor
///
/// `num_mip_maps == 0` requests a full mip chain down to 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub num_mip_maps: u32,
    pub array_size: u32,
    pub format: ElementFormat,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub access_hint: AccessHint,
}

impl TextureDesc {
    /// Single-sampled 2D texture descriptor
    pub fn tex2d(width: u32, height: u32, num_mip_maps: u32, array_size: u32, format: ElementFormat, access_hint: AccessHint) -> Self {
        Self {
            texture_type: TextureType::Tex2D,
            width,
            height,
            depth: 1,
            num_mip_maps,
            array_size,
            format,
            sample_count: 1,
            sample_quality: 0,
            access_hint,
        }
    }

    /// Single-sampled 3D texture descriptor
    pub fn tex3d(width: u32, height: u32, depth: u32, num_mip_maps: u32, format: ElementFormat, access_hint: AccessHint) -> Self {
        Self {
            texture_type: TextureType::Tex3D,
            width,
            height,
            depth,
            num_mip_maps,
            array_size: 1,
            format,
            sample_count: 1,
            sample_quality: 0,
            access_hint,
        }
    }

    /// Mip count after resolving the "full chain" request
    pub fn resolved_mip_count(&self) -> u32 {
        if self.num_mip_maps > 0 {
            return self.num_mip_maps;
        }
        let largest = self.width.max(self.height).max(self.depth).max(1);
        32 - largest.leading_zeros()
    }
}

/// Initial data for one (array slice, mip level) subresource
#[derive(Debug, Clone, Copy)]
pub struct ElementInitData<'a> {
    pub data: &'a [u8],
    pub row_pitch: u32,
    pub slice_pitch: u32,
}

impl<'a> ElementInitData<'a> {
    /// Tightly packed init data
    pub fn packed(data: &'a [u8]) -> Self {
        Self { data, row_pitch: 0, slice_pitch: 0 }
    }
}
