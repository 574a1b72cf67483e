/// Element format shared by textures, vertex streams and render targets

/// Engine-side pixel/element format
///
/// Channel order follows the engine convention (lowest bits last), so `ABGR8`
/// stores R in the first byte. Block-compressed formats store 4x4 texel blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum ElementFormat {
    // 8-bit
    A8,
    R8,
    SIGNED_R8,
    R8UI,

    // 16-bit
    R5G6B5,
    A1RGB5,
    ARGB4,
    GR8,
    SIGNED_GR8,
    R16,
    R16F,

    // 32-bit
    ARGB8,
    ABGR8,
    SIGNED_ABGR8,
    A2BGR10,
    GR16,
    GR16F,
    R32F,
    R32UI,
    B10G11R11F,
    ARGB8_SRGB,
    ABGR8_SRGB,

    // 64/96/128-bit
    ABGR16,
    ABGR16F,
    GR32F,
    BGR32F,
    ABGR32F,

    // Block compressed
    BC1,
    BC1_SRGB,
    BC2,
    BC2_SRGB,
    BC3,
    BC3_SRGB,
    BC4,
    BC4_SRGB,
    SIGNED_BC4,
    BC5,
    BC5_SRGB,
    SIGNED_BC5,
    BC6,
    SIGNED_BC6,
    BC7,
    BC7_SRGB,

    // Depth / stencil
    D16,
    D24S8,
    D32F,
}

impl ElementFormat {
    /// True for 4x4 block-compressed formats
    pub fn is_compressed(self) -> bool {
        use ElementFormat::*;
        matches!(
            self,
            BC1 | BC1_SRGB | BC2 | BC2_SRGB | BC3 | BC3_SRGB
                | BC4 | BC4_SRGB | SIGNED_BC4 | BC5 | BC5_SRGB | SIGNED_BC5
                | BC6 | SIGNED_BC6 | BC7 | BC7_SRGB
        )
    }

    /// True for formats with a depth component
    pub fn is_depth(self) -> bool {
        matches!(self, ElementFormat::D16 | ElementFormat::D24S8 | ElementFormat::D32F)
    }

    /// True for formats with a stencil component
    pub fn is_stencil(self) -> bool {
        matches!(self, ElementFormat::D24S8)
    }

    /// True for sRGB-encoded color formats
    pub fn is_srgb(self) -> bool {
        use ElementFormat::*;
        matches!(
            self,
            ARGB8_SRGB | ABGR8_SRGB | BC1_SRGB | BC2_SRGB | BC3_SRGB | BC4_SRGB | BC5_SRGB | BC7_SRGB
        )
    }

    /// Bytes per texel for uncompressed formats, 0 for block-compressed ones
    pub fn texel_bytes(self) -> u32 {
        use ElementFormat::*;
        match self {
            A8 | R8 | SIGNED_R8 | R8UI => 1,
            R5G6B5 | A1RGB5 | ARGB4 | GR8 | SIGNED_GR8 | R16 | R16F | D16 => 2,
            ARGB8 | ABGR8 | SIGNED_ABGR8 | A2BGR10 | GR16 | GR16F | R32F | R32UI
                | B10G11R11F | ARGB8_SRGB | ABGR8_SRGB | D24S8 | D32F => 4,
            ABGR16 | ABGR16F | GR32F => 8,
            BGR32F => 12,
            ABGR32F => 16,
            _ => 0,
        }
    }

    /// Bytes per 4x4 block for block-compressed formats, 0 otherwise
    pub fn block_bytes(self) -> u32 {
        use ElementFormat::*;
        match self {
            BC1 | BC1_SRGB | BC4 | BC4_SRGB | SIGNED_BC4 => 8,
            BC2 | BC2_SRGB | BC3 | BC3_SRGB | BC5 | BC5_SRGB | SIGNED_BC5
                | BC6 | SIGNED_BC6 | BC7 | BC7_SRGB => 16,
            _ => 0,
        }
    }

    /// Byte footprint of one `width x height x depth` image in this format
    ///
    /// Block-compressed formats round each dimension up to whole 4x4 blocks.
    pub fn image_size(self, width: u32, height: u32, depth: u32) -> u64 {
        if self.is_compressed() {
            let blocks_x = width.div_ceil(4) as u64;
            let blocks_y = height.div_ceil(4) as u64;
            blocks_x * blocks_y * depth as u64 * self.block_bytes() as u64
        } else {
            width as u64 * height as u64 * depth as u64 * self.texel_bytes() as u64
        }
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
