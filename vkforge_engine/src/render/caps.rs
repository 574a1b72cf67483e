/// Device capabilities and typed capability queries

use rustc_hash::FxHashMap;

use crate::render::ElementFormat;

/// What the active device can do, as seen by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderDeviceCaps {
    /// Maximum 2D texture width
    pub max_texture_width: u32,
    /// Maximum 2D texture height
    pub max_texture_height: u32,
    /// Maximum 3D texture depth
    pub max_texture_depth: u32,
    /// Maximum array layers
    pub max_texture_array_length: u32,
    /// Maximum color attachments bound at once
    pub max_simultaneous_rts: u32,
    /// Maximum sampler anisotropy
    pub max_texture_anisotropy: u32,
    pub cs_support: bool,
    pub gs_support: bool,
    pub hs_support: bool,
    pub ds_support: bool,
    /// Formats usable as vertex attributes
    pub vertex_formats: Vec<ElementFormat>,
    /// Formats usable as sampled textures
    pub texture_formats: Vec<ElementFormat>,
    /// Formats usable as render targets, with their encoded sample count/quality pairs
    pub render_target_formats: FxHashMap<ElementFormat, Vec<u32>>,
}

impl RenderDeviceCaps {
    /// Pack a sample count and quality into one key
    pub fn encode_sample_count_quality(count: u32, quality: u32) -> u32 {
        (count & 0xFFFF) | (quality << 16)
    }

    /// Unpack a key built by `encode_sample_count_quality`
    pub fn decode_sample_count_quality(encoded: u32) -> (u32, u32) {
        (encoded & 0xFFFF, encoded >> 16)
    }

    pub fn vertex_format_support(&self, format: ElementFormat) -> bool {
        self.vertex_formats.contains(&format)
    }

    pub fn texture_format_support(&self, format: ElementFormat) -> bool {
        self.texture_formats.contains(&format)
    }

    /// True if `format` can be rendered to with the given sample count and quality
    pub fn render_target_format_support(&self, format: ElementFormat, sample_count: u32, sample_quality: u32) -> bool {
        self.render_target_formats
            .get(&format)
            .map(|samples| {
                samples.iter().any(|&encoded| {
                    let (count, quality) = Self::decode_sample_count_quality(encoded);
                    count == sample_count && sample_quality < quality
                })
            })
            .unwrap_or(false)
    }
}

/// Capability that can be queried on a render engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Platform,
    MajorVersion,
    MinorVersion,
    RequiresFlipping,
    NativeShaderFourcc,
    NativeShaderVersion,
    DeviceCaps,
    FragDepthSupport,
}

/// Typed capability value, used both for queries and for overrides
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    /// Native shader platform name, e.g. "vulkan_1_0" or "d3d_12_0"
    Platform(String),
    MajorVersion(u32),
    MinorVersion(u32),
    RequiresFlipping(bool),
    NativeShaderFourcc(u32),
    NativeShaderVersion(u32),
    DeviceCaps(Box<RenderDeviceCaps>),
    FragDepthSupport(bool),
}

impl CapabilityValue {
    /// Capability this value belongs to
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityValue::Platform(_) => Capability::Platform,
            CapabilityValue::MajorVersion(_) => Capability::MajorVersion,
            CapabilityValue::MinorVersion(_) => Capability::MinorVersion,
            CapabilityValue::RequiresFlipping(_) => Capability::RequiresFlipping,
            CapabilityValue::NativeShaderFourcc(_) => Capability::NativeShaderFourcc,
            CapabilityValue::NativeShaderVersion(_) => Capability::NativeShaderVersion,
            CapabilityValue::DeviceCaps(_) => Capability::DeviceCaps,
            CapabilityValue::FragDepthSupport(_) => Capability::FragDepthSupport,
        }
    }
}

#[cfg(test)]
#[path = "caps_tests.rs"]
mod tests;
