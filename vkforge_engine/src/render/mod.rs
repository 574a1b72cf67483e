/// Render module - API-agnostic rendering types shared with the backends

pub mod caps;
pub mod config;
pub mod format;
pub mod frame;
pub mod render_engine;
pub mod resource;
pub mod shader;

pub use caps::{Capability, CapabilityValue, RenderDeviceCaps};
pub use config::{
    Config, DebugMessageFilter, DebugOutput, DebugSeverity, RenderSettings, ValidationStats,
};
pub use format::ElementFormat;
pub use frame::{ClearFlags, Color, Rect};
pub use render_engine::{RenderEngine, RenderFactory};
pub use resource::{
    AccessHint, BufferBinding, BufferDesc, BufferUsage, ElementInitData, TextureDesc, TextureType,
};
pub use shader::{
    name_hash, CBufferBinding, EffectConstantBuffer, EffectLayout, EffectParameter, ParamType,
    ShaderCompileOutput, ShaderCompileRequest, ShaderCompiler, ShaderDesc, ShaderEffect,
    ShaderStage, NUM_SHADER_STAGES,
};
