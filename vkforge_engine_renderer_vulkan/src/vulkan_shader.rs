/// Shader stage objects and linked shader objects
///
/// A stage object moves through `Empty -> Compiled -> HardwareReady -> Linked`:
/// compilation produces SPIR-V and its constant-buffer reflection, the
/// hardware step wraps the SPIR-V in a shader module, and linking (done by the
/// owning `VulkanShaderObject`) binds every reflected constant-buffer variable
/// to the effect.
///
/// Compilation failures are not errors: they leave the stage invalid and the
/// caller checks `is_valid`. Inconsistencies between the reflected layout and
/// the effect are errors.

use ash::vk;
use std::ffi::CString;
use std::io::Write;
use std::sync::{Arc, Mutex};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{
    name_hash, CBufferBinding, ElementFormat, ParamType, RenderDeviceCaps, ShaderCompileRequest,
    ShaderCompiler, ShaderEffect, ShaderStage, NUM_SHADER_STAGES,
};
use vkforge_engine::{engine_bail, engine_debug, engine_err, engine_fail, engine_warn};

use crate::vulkan_check::vk_check;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_mapping::shader_stage_flags;

// ============================================================================
// Profiles and macros
// ============================================================================

/// Default profile of a stage, `*_5_1` for the D3D12 shader platform and `*_5_0` otherwise
pub fn default_shader_profile(stage: ShaderStage, d3d12_platform: bool) -> &'static str {
    match (stage, d3d12_platform) {
        (ShaderStage::Vertex, false) => "vs_5_0",
        (ShaderStage::Pixel, false) => "ps_5_0",
        (ShaderStage::Geometry, false) => "gs_5_0",
        (ShaderStage::Compute, false) => "cs_5_0",
        (ShaderStage::Hull, false) => "hs_5_0",
        (ShaderStage::Domain, false) => "ds_5_0",
        (ShaderStage::Vertex, true) => "vs_5_1",
        (ShaderStage::Pixel, true) => "ps_5_1",
        (ShaderStage::Geometry, true) => "gs_5_1",
        (ShaderStage::Compute, true) => "cs_5_1",
        (ShaderStage::Hull, true) => "hs_5_1",
        (ShaderStage::Domain, true) => "ds_5_1",
    }
}

/// Profile a stage compiles with
///
/// Unavailable stages get an empty profile. "auto" resolves to the stage default.
pub fn resolve_shader_profile(requested: &str, stage_available: bool, default_profile: &str) -> String {
    if !stage_available {
        String::new()
    } else if requested == "auto" {
        default_profile.to_string()
    } else {
        requested.to_string()
    }
}

/// Preprocessor macros advertising the backend and its format workarounds
pub fn compile_macros(caps: &RenderDeviceCaps) -> Vec<(String, String)> {
    let mut macros = vec![("VKFORGE_VULKAN".to_string(), "1".to_string())];
    if !caps.texture_format_support(ElementFormat::BC5) || !caps.texture_format_support(ElementFormat::BC5_SRGB) {
        macros.push(("VKFORGE_BC5_AS_AG".to_string(), "1".to_string()));
    }
    if !caps.texture_format_support(ElementFormat::BC4) || !caps.texture_format_support(ElementFormat::BC4_SRGB) {
        macros.push(("VKFORGE_BC4_AS_G".to_string(), "1".to_string()));
    }
    macros.push(("VKFORGE_FRAG_DEPTH".to_string(), "1".to_string()));
    macros
}

/// Byte stride of a constant-buffer parameter
///
/// Struct parameters are bound byte-wise. Array elements occupy a full
/// 16-byte register (64 bytes for a 4x4 matrix).
pub fn cbuffer_param_stride(param_type: ParamType, elements: u32) -> u32 {
    let is_matrix = param_type == ParamType::Float4x4;
    match param_type {
        ParamType::Struct => 1,
        _ if elements > 0 => if is_matrix { 64 } else { 16 },
        _ => if is_matrix { 16 } else { 4 },
    }
}

// ============================================================================
// Reflection
// ============================================================================

/// One variable of a reflected constant buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedVariable {
    pub name: String,
    pub start_offset: u32,
    pub size: u32,
    /// Array element count, 0 for non-arrays
    pub elements: u32,
}

/// A reflected uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedCBuffer {
    pub name: String,
    pub name_hash: u64,
    pub size: u32,
    pub variables: Vec<ReflectedVariable>,
}

/// Everything compilation learns about a stage's bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub cbuffers: Vec<ReflectedCBuffer>,
    /// Textures, samplers and storage resources
    pub resources: Vec<String>,
}

impl ShaderReflection {
    /// Names of every constant-buffer variable, in buffer order
    pub fn parameter_names(&self) -> Vec<String> {
        self.cbuffers
            .iter()
            .flat_map(|cb| cb.variables.iter().map(|v| v.name.clone()))
            .collect()
    }
}

/// Constant buffer name from the block variable, or from its type name
///
/// HLSL front ends name the block type `type.<Name>` and may leave the variable unnamed.
pub fn cbuffer_block_name(var_name: Option<&str>, type_name: Option<&str>) -> String {
    match (var_name, type_name) {
        (Some(name), _) if !name.is_empty() => name.to_string(),
        (_, Some(name)) => name.strip_prefix("type.").unwrap_or(name).to_string(),
        _ => String::new(),
    }
}

fn reflected_cbuffer(var_name: Option<&str>, ty: &spirq::ty::Type) -> Option<ReflectedCBuffer> {
    let spirq::ty::Type::Struct(st) = ty else {
        return None;
    };

    let variables = st
        .members
        .iter()
        .map(|m| ReflectedVariable {
            name: m.name.clone().unwrap_or_default(),
            start_offset: m.offset.unwrap_or(0) as u32,
            size: m.ty.nbyte().unwrap_or(0) as u32,
            elements: match &m.ty {
                spirq::ty::Type::Array(a) => a.nelement.unwrap_or(0),
                _ => 0,
            },
        })
        .collect();

    let name = cbuffer_block_name(var_name, st.name.as_deref());
    Some(ReflectedCBuffer {
        name_hash: name_hash(&name),
        name,
        size: ty.nbyte().unwrap_or(0) as u32,
        variables,
    })
}

/// Reflect uniform blocks and resource names out of SPIR-V
pub fn reflect_spirv(code: &[u32]) -> Result<ShaderReflection> {
    use spirq::ty::DescriptorType;

    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("vkforge::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut reflection = ShaderReflection::default();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            let spirq::var::Variable::Descriptor { name, desc_ty, ty, .. } = var else {
                continue;
            };
            match desc_ty {
                DescriptorType::UniformBuffer() => {
                    if let Some(cbuffer) = reflected_cbuffer(name.as_deref(), ty) {
                        if !reflection.cbuffers.iter().any(|cb| cb.name_hash == cbuffer.name_hash) {
                            reflection.cbuffers.push(cbuffer);
                        }
                    }
                }
                _ => {
                    let name = name.clone().unwrap_or_default();
                    if !name.is_empty() && !reflection.resources.contains(&name) {
                        reflection.resources.push(name);
                    }
                }
            }
        }
    }
    Ok(reflection)
}

/// Index of the effect constant buffer matching every reflected one, by name hash
pub fn match_cbuffer_indices(cbuffers: &[ReflectedCBuffer], effect: &dyn ShaderEffect) -> Result<Vec<u32>> {
    cbuffers
        .iter()
        .map(|cb| {
            (0..effect.num_cbuffers())
                .find(|&i| effect.cbuffer_name_hash(i) == Some(cb.name_hash))
                .ok_or_else(|| {
                    engine_fail!(
                        "vkforge::vulkan",
                        Error::InvalidResource(format!("reflected constant buffer '{}' is not declared by the effect", cb.name))
                    )
                })
        })
        .collect()
}

// ============================================================================
// Blob
// ============================================================================

fn push_name(block: &mut Vec<u8>, name: &str) -> Result<()> {
    let len = u8::try_from(name.len()).map_err(|_| {
        engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource(format!("name '{}' is longer than 255 bytes", name))
        )
    })?;
    block.push(len);
    block.extend_from_slice(name.as_bytes());
    Ok(())
}

fn push_count(block: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = u16::try_from(count).map_err(|_| {
        engine_fail!(
            "vkforge::vulkan",
            Error::InvalidResource(format!("{} names do not fit a 16-bit count", count))
        )
    })?;
    block.extend_from_slice(&count.to_le_bytes());
    Ok(())
}

/// Serialized stage: `u32` block length, then the block
///
/// The block holds the SPIR-V word count (the words themselves are not
/// stored), parameter names, resource names and texture/sampler pairs, all
/// little-endian with `u8`-prefixed names. A stage without SPIR-V writes an
/// empty block.
pub fn write_stage_blob(
    spirv_word_count: usize,
    param_names: &[String],
    resource_names: &[String],
    tex_sampler_pairs: &[(String, String)],
) -> Result<Vec<u8>> {
    let mut block = Vec::new();

    if spirv_word_count > 0 {
        let words = u32::try_from(spirv_word_count)
            .map_err(|_| engine_err!("vkforge::vulkan", "SPIR-V of {} words is too large", spirv_word_count))?;
        block.extend_from_slice(&words.to_le_bytes());

        push_count(&mut block, param_names.len())?;
        for name in param_names {
            push_name(&mut block, name)?;
        }

        push_count(&mut block, resource_names.len())?;
        for name in resource_names {
            push_name(&mut block, name)?;
        }

        push_count(&mut block, tex_sampler_pairs.len())?;
        for (texture, sampler) in tex_sampler_pairs {
            push_name(&mut block, texture)?;
            push_name(&mut block, sampler)?;
        }
    }

    let mut blob = Vec::with_capacity(block.len() + 4);
    blob.extend_from_slice(&(block.len() as u32).to_le_bytes());
    blob.extend_from_slice(&block);
    Ok(blob)
}

// ============================================================================
// Stage object
// ============================================================================

/// Lifecycle of a stage object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageState {
    Empty,
    Compiled,
    HardwareReady,
    Linked,
}

/// What a stage compilation needs from the render engine
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub compiler: &'a dyn ShaderCompiler,
    pub caps: &'a RenderDeviceCaps,
    /// Default profile per stage, indexed by `ShaderStage::index`
    pub default_profiles: &'a [String; NUM_SHADER_STAGES],
}

/// One programmable stage of a shader object
pub struct VulkanShaderStageObject {
    device: Arc<VulkanDevice>,
    stage: ShaderStage,
    /// The device supports this stage
    is_available: bool,
    is_valid: bool,
    state: Mutex<StageState>,
    func_name: String,
    spirv: Vec<u32>,
    reflection: ShaderReflection,
    cbuffer_indices: Vec<u32>,
    tex_sampler_pairs: Vec<(String, String)>,
    module: vk::ShaderModule,
}

impl VulkanShaderStageObject {
    pub fn new(device: Arc<VulkanDevice>, stage: ShaderStage, is_available: bool) -> Self {
        Self {
            device,
            stage,
            is_available,
            is_valid: false,
            state: Mutex::new(StageState::Empty),
            func_name: String::new(),
            spirv: Vec::new(),
            reflection: ShaderReflection::default(),
            cbuffer_indices: Vec::new(),
            tex_sampler_pairs: Vec::new(),
            module: vk::ShaderModule::null(),
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn state(&self) -> StageState {
        self.state.lock().map(|state| *state).unwrap_or(StageState::Empty)
    }

    pub fn hw_resource_ready(&self) -> bool {
        self.state() >= StageState::HardwareReady
    }

    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    pub fn spirv(&self) -> &[u32] {
        &self.spirv
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Effect constant-buffer index of every reflected constant buffer
    pub fn cbuffer_indices(&self) -> &[u32] {
        &self.cbuffer_indices
    }

    pub fn tex_sampler_pairs(&self) -> &[(String, String)] {
        &self.tex_sampler_pairs
    }

    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    fn set_state(&mut self, state: StageState) {
        if let Ok(current) = self.state.get_mut() {
            *current = state;
        }
    }

    fn mark_linked(&self) {
        if let Ok(mut state) = self.state.lock() {
            if *state == StageState::HardwareReady {
                *state = StageState::Linked;
            }
        }
    }

    /// Cross-compile the stage's entry point of `effect` and reflect the result
    ///
    /// Compilation failure only marks the stage invalid. A reflected constant
    /// buffer that the effect does not declare is an error.
    pub fn compile(&mut self, effect: &dyn ShaderEffect, shader_desc_id: u32, context: &CompileContext<'_>) -> Result<()> {
        let desc = effect.shader_desc(shader_desc_id).ok_or_else(|| {
            engine_fail!(
                "vkforge::vulkan",
                Error::InvalidResource(format!("effect has no shader description {}", shader_desc_id))
            )
        })?;

        self.destroy_module();
        self.func_name = desc.func_name.clone();
        self.spirv.clear();
        self.reflection = ShaderReflection::default();
        self.cbuffer_indices.clear();
        self.tex_sampler_pairs.clear();
        self.set_state(StageState::Compiled);

        let profile = resolve_shader_profile(
            &desc.profile,
            self.is_available,
            &context.default_profiles[self.stage.index()],
        );
        self.is_valid = !profile.is_empty();
        if !self.is_valid {
            engine_debug!("vkforge::vulkan", "{:?} stage unavailable, '{}' not compiled", self.stage, self.func_name);
            return Ok(());
        }

        let macros = compile_macros(context.caps);
        let request = ShaderCompileRequest {
            stage: self.stage,
            source: effect.source(),
            func_name: &desc.func_name,
            profile: &profile,
            macros: &macros,
        };

        let output = match context.compiler.compile(&request) {
            Ok(output) => output,
            Err(e) => {
                engine_warn!("vkforge::vulkan", "Compiling {:?} '{}' ({}) failed: {}", self.stage, self.func_name, profile, e);
                self.is_valid = false;
                return Ok(());
            }
        };
        if output.spirv.is_empty() {
            engine_warn!("vkforge::vulkan", "Compiling {:?} '{}' ({}) produced no SPIR-V", self.stage, self.func_name, profile);
            self.is_valid = false;
            return Ok(());
        }

        let reflection = match reflect_spirv(&output.spirv) {
            Ok(reflection) => reflection,
            Err(_) => {
                self.is_valid = false;
                return Ok(());
            }
        };

        self.cbuffer_indices = match_cbuffer_indices(&reflection.cbuffers, effect)?;
        self.reflection = reflection;
        self.spirv = output.spirv;
        self.tex_sampler_pairs = output.tex_sampler_pairs;

        engine_debug!(
            "vkforge::vulkan",
            "Compiled {:?} '{}' ({}): {} words, {} cbuffers, {} resources",
            self.stage, self.func_name, profile, self.spirv.len(),
            self.reflection.cbuffers.len(), self.reflection.resources.len()
        );
        Ok(())
    }

    /// Wrap the SPIR-V in a shader module
    ///
    /// A stage without SPIR-V becomes invalid instead of failing.
    pub fn create_hw_shader(&mut self) -> Result<()> {
        if self.state() == StageState::Empty {
            return Err(engine_fail!(
                "vkforge::vulkan",
                Error::ResourceNotReady(format!("{:?} stage was never compiled", self.stage))
            ));
        }

        self.destroy_module();
        if self.spirv.is_empty() {
            self.is_valid = false;
        } else {
            let create_info = vk::ShaderModuleCreateInfo::default().code(&self.spirv);
            self.module = unsafe { self.device.device().create_shader_module(&create_info, None) }
                .map_err(|e| vk_check("vkCreateShaderModule", e))?;
        }

        self.set_state(StageState::HardwareReady);
        Ok(())
    }

    /// Read back a streamed stage
    ///
    /// Blobs do not carry the SPIR-V words, so the stage comes back invalid
    /// and must be compiled again. Returns the bytes consumed.
    pub fn stream_in(&mut self, effect: &dyn ShaderEffect, shader_desc_id: u32, data: &[u8]) -> Result<usize> {
        let Some(len_bytes) = data.get(..4) else {
            engine_bail!("vkforge::vulkan", "Stage blob truncated: {} bytes", data.len());
        };
        let mut len = [0u8; 4];
        len.copy_from_slice(len_bytes);
        let block_len = u32::from_le_bytes(len) as usize;
        if data.len() < 4 + block_len {
            engine_bail!("vkforge::vulkan", "Stage blob declares {} bytes, {} present", block_len, data.len() - 4);
        }

        if let Some(desc) = effect.shader_desc(shader_desc_id) {
            self.func_name = desc.func_name.clone();
        }
        self.is_valid = false;
        Ok(4 + block_len)
    }

    /// Write the stage blob to `out`
    pub fn stream_out<W: Write>(&self, out: &mut W) -> Result<()> {
        let blob = write_stage_blob(
            self.spirv.len(),
            &self.reflection.parameter_names(),
            &self.reflection.resources,
            &self.tex_sampler_pairs,
        )?;
        out.write_all(&blob)
            .map_err(|e| engine_err!("vkforge::vulkan", "Writing {:?} stage blob failed: {}", self.stage, e))
    }

    fn destroy_module(&mut self) {
        if self.module != vk::ShaderModule::null() {
            unsafe { self.device.device().destroy_shader_module(self.module, None) };
            self.module = vk::ShaderModule::null();
        }
    }
}

impl Drop for VulkanShaderStageObject {
    fn drop(&mut self) {
        self.destroy_module();
    }
}

// ============================================================================
// Shader object
// ============================================================================

/// A linked stage, ready for pipeline creation
#[derive(Debug, Clone)]
struct LinkedStage {
    flags: vk::ShaderStageFlags,
    module: vk::ShaderModule,
    entry_point: CString,
}

/// Up to one stage object per programmable stage, linked against an effect
pub struct VulkanShaderObject {
    stages: [Option<Arc<VulkanShaderStageObject>>; NUM_SHADER_STAGES],
    is_valid: bool,
    hw_resource_ready: bool,
    linked_stages: Vec<LinkedStage>,
}

impl Default for VulkanShaderObject {
    fn default() -> Self {
        Self::new()
    }
}

impl VulkanShaderObject {
    pub fn new() -> Self {
        Self {
            stages: Default::default(),
            is_valid: false,
            hw_resource_ready: false,
            linked_stages: Vec::new(),
        }
    }

    /// Put a stage object in its slot, replacing any previous one
    pub fn attach_stage(&mut self, stage_object: Arc<VulkanShaderStageObject>) {
        let index = stage_object.stage().index();
        self.stages[index] = Some(stage_object);
        self.hw_resource_ready = false;
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&Arc<VulkanShaderStageObject>> {
        self.stages[stage.index()].as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn hw_resource_ready(&self) -> bool {
        self.hw_resource_ready
    }

    /// Pipeline stage descriptions of every linked stage
    pub fn pipeline_stage_infos(&self) -> Vec<vk::PipelineShaderStageCreateInfo<'_>> {
        self.linked_stages
            .iter()
            .map(|linked| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(linked.flags)
                    .module(linked.module)
                    .name(&linked.entry_point)
            })
            .collect()
    }

    /// Gather the pipeline stages and bind every reflected constant buffer to `effect`
    pub fn link(&mut self, effect: &mut dyn ShaderEffect) -> Result<()> {
        let mut linked_stages = Vec::new();
        let mut all_valid = true;

        for stage_object in self.stages.iter().flatten() {
            if !stage_object.hw_resource_ready() {
                return Err(engine_fail!(
                    "vkforge::vulkan",
                    Error::ResourceNotReady(format!("{:?} stage has no shader module", stage_object.stage()))
                ));
            }
            if !stage_object.is_valid() {
                all_valid = false;
                continue;
            }

            let entry_point = CString::new(stage_object.func_name()).map_err(|_| {
                engine_err!("vkforge::vulkan", "Entry point '{}' contains a NUL byte", stage_object.func_name())
            })?;
            linked_stages.push(LinkedStage {
                flags: shader_stage_flags(stage_object.stage()),
                module: stage_object.module(),
                entry_point,
            });
        }

        self.bind_cbuffers(effect)?;

        for stage_object in self.stages.iter().flatten() {
            stage_object.mark_linked();
        }

        self.is_valid = all_valid && !linked_stages.is_empty();
        self.linked_stages = linked_stages;
        self.hw_resource_ready = true;

        engine_debug!(
            "vkforge::vulkan",
            "Linked shader object: {} stages, valid: {}",
            self.linked_stages.len(), self.is_valid
        );
        Ok(())
    }

    /// Size the effect's constant buffers and bind each parameter to its offset and stride
    fn bind_cbuffers(&self, effect: &mut dyn ShaderEffect) -> Result<()> {
        for stage_object in self.stages.iter().flatten().filter(|s| s.is_valid()) {
            let reflected = &stage_object.reflection().cbuffers;
            for (cbuffer, &index) in reflected.iter().zip(stage_object.cbuffer_indices()) {
                effect.resize_cbuffer(index, cbuffer.size);

                let params = effect.cbuffer_parameters(index).to_vec();
                if params.len() != cbuffer.variables.len() {
                    return Err(engine_fail!(
                        "vkforge::vulkan",
                        Error::InvalidResource(format!(
                            "constant buffer '{}' has {} parameters in the effect, {} in the shader",
                            cbuffer.name, params.len(), cbuffer.variables.len()
                        ))
                    ));
                }

                for (&param, variable) in params.iter().zip(&cbuffer.variables) {
                    let param_type = effect.parameter_type(param).ok_or_else(|| {
                        engine_fail!(
                            "vkforge::vulkan",
                            Error::InvalidResource(format!("effect has no parameter {}", param))
                        )
                    })?;
                    effect.bind_parameter(
                        param,
                        CBufferBinding {
                            cbuffer: index,
                            offset: variable.start_offset,
                            stride: cbuffer_param_stride(param_type, variable.elements),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Write one stage's blob, or an empty block when the slot is empty
    pub fn stream_out<W: Write>(&self, stage: ShaderStage, out: &mut W) -> Result<()> {
        match self.stage(stage) {
            Some(stage_object) => stage_object.stream_out(out),
            None => out
                .write_all(&0u32.to_le_bytes())
                .map_err(|e| engine_err!("vkforge::vulkan", "Writing {:?} stage blob failed: {}", stage, e)),
        }
    }

    /// A shader object sharing the same stages, bound to another effect
    pub fn clone_for(&self, effect: &mut dyn ShaderEffect) -> Result<Self> {
        let cloned = Self {
            stages: self.stages.clone(),
            is_valid: self.is_valid,
            hw_resource_ready: self.hw_resource_ready,
            linked_stages: self.linked_stages.clone(),
        };
        if cloned.hw_resource_ready {
            cloned.bind_cbuffers(effect)?;
        }
        Ok(cloned)
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
