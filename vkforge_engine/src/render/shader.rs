/// Shader stages, effect layout and the cross-compiler seam
///
/// The effect (parameters + constant buffers) and the shading-language
/// compiler live outside the backends. Backends only talk to them through
/// `ShaderEffect` and `ShaderCompiler`.

use std::hash::Hasher;
use rustc_hash::FxHasher;

use crate::error::Result;

/// Number of programmable stages
pub const NUM_SHADER_STAGES: usize = 6;

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Compute,
    Hull,
    Domain,
}

impl ShaderStage {
    /// All stages in table order
    pub const ALL: [ShaderStage; NUM_SHADER_STAGES] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Compute,
        ShaderStage::Hull,
        ShaderStage::Domain,
    ];

    /// Index into per-stage tables
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-stage entry of an effect: which function to compile with which profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDesc {
    /// Profile name such as "vs_5_0", or "auto"
    pub profile: String,
    /// Entry point function name
    pub func_name: String,
}

/// Type of an effect parameter, as far as constant-buffer packing cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Int,
    UInt,
    Float,
    Float2,
    Float3,
    Float4,
    Float4x4,
    Struct,
}

/// Where a parameter lives inside a constant buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CBufferBinding {
    pub cbuffer: u32,
    pub offset: u32,
    pub stride: u32,
}

/// Hash used to match reflected constant buffers against effect constant buffers
pub fn name_hash(name: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(name.as_bytes());
    hasher.finish()
}

/// Engine-side effect, seen from a backend
pub trait ShaderEffect {
    /// Shading-language source of the whole effect
    fn source(&self) -> &str;

    /// Per-stage shader description by id
    fn shader_desc(&self, id: u32) -> Option<&ShaderDesc>;

    fn num_cbuffers(&self) -> u32;

    fn cbuffer_name_hash(&self, index: u32) -> Option<u64>;

    /// Parameter indices of a constant buffer, in declaration order
    fn cbuffer_parameters(&self, index: u32) -> &[u32];

    fn resize_cbuffer(&mut self, index: u32, size: u32);

    fn parameter_type(&self, param: u32) -> Option<ParamType>;

    fn bind_parameter(&mut self, param: u32, binding: CBufferBinding);
}

/// One constant buffer of an `EffectLayout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectConstantBuffer {
    pub name: String,
    pub name_hash: u64,
    pub size: u32,
    pub parameters: Vec<u32>,
}

/// One parameter of an `EffectLayout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectParameter {
    pub name: String,
    pub param_type: ParamType,
    pub binding: Option<CBufferBinding>,
}

/// Plain in-memory effect description
#[derive(Debug, Clone, Default)]
pub struct EffectLayout {
    pub source: String,
    pub shader_descs: Vec<ShaderDesc>,
    pub cbuffers: Vec<EffectConstantBuffer>,
    pub parameters: Vec<EffectParameter>,
}

impl EffectLayout {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Register a shader description, returning its id
    pub fn add_shader_desc(&mut self, profile: &str, func_name: &str) -> u32 {
        self.shader_descs.push(ShaderDesc {
            profile: profile.to_string(),
            func_name: func_name.to_string(),
        });
        (self.shader_descs.len() - 1) as u32
    }

    /// Register a constant buffer with its parameters, returning the buffer index
    pub fn add_cbuffer(&mut self, name: &str, params: &[(&str, ParamType)]) -> u32 {
        let mut indices = Vec::with_capacity(params.len());
        for (param_name, param_type) in params {
            self.parameters.push(EffectParameter {
                name: param_name.to_string(),
                param_type: *param_type,
                binding: None,
            });
            indices.push((self.parameters.len() - 1) as u32);
        }
        self.cbuffers.push(EffectConstantBuffer {
            name: name.to_string(),
            name_hash: name_hash(name),
            size: 0,
            parameters: indices,
        });
        (self.cbuffers.len() - 1) as u32
    }
}

impl ShaderEffect for EffectLayout {
    fn source(&self) -> &str {
        &self.source
    }

    fn shader_desc(&self, id: u32) -> Option<&ShaderDesc> {
        self.shader_descs.get(id as usize)
    }

    fn num_cbuffers(&self) -> u32 {
        self.cbuffers.len() as u32
    }

    fn cbuffer_name_hash(&self, index: u32) -> Option<u64> {
        self.cbuffers.get(index as usize).map(|cb| cb.name_hash)
    }

    fn cbuffer_parameters(&self, index: u32) -> &[u32] {
        self.cbuffers
            .get(index as usize)
            .map(|cb| cb.parameters.as_slice())
            .unwrap_or(&[])
    }

    fn resize_cbuffer(&mut self, index: u32, size: u32) {
        if let Some(cb) = self.cbuffers.get_mut(index as usize) {
            cb.size = size;
        }
    }

    fn parameter_type(&self, param: u32) -> Option<ParamType> {
        self.parameters.get(param as usize).map(|p| p.param_type)
    }

    fn bind_parameter(&mut self, param: u32, binding: CBufferBinding) {
        if let Some(p) = self.parameters.get_mut(param as usize) {
            p.binding = Some(binding);
        }
    }
}

/// Input of one cross-compilation
#[derive(Debug, Clone, Copy)]
pub struct ShaderCompileRequest<'a> {
    pub stage: ShaderStage,
    pub source: &'a str,
    pub func_name: &'a str,
    pub profile: &'a str,
    pub macros: &'a [(String, String)],
}

/// Output of one cross-compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderCompileOutput {
    /// Portable intermediate bytecode (SPIR-V words). Empty on failure.
    pub spirv: Vec<u32>,
    /// Texture/sampler pairs combined by the compiler
    pub tex_sampler_pairs: Vec<(String, String)>,
}

/// Shading-language to bytecode cross-compiler
pub trait ShaderCompiler: Send + Sync {
    fn compile(&self, request: &ShaderCompileRequest<'_>) -> Result<ShaderCompileOutput>;
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
