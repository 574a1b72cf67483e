//! Unit tests for shader.rs
//!
//! Tests stage indexing, name hashing and the in-memory effect layout.

use crate::render::{name_hash, CBufferBinding, EffectLayout, ParamType, ShaderEffect, ShaderStage};

// ============================================================================
// STAGES
// ============================================================================

#[test]
fn test_stage_indices_follow_table_order() {
    for (i, stage) in ShaderStage::ALL.iter().enumerate() {
        assert_eq!(stage.index(), i);
    }
    assert_eq!(ShaderStage::Pixel.index(), 1);
    assert_eq!(ShaderStage::Domain.index(), 5);
}

// ============================================================================
// NAME HASH
// ============================================================================

#[test]
fn test_name_hash_is_stable_and_distinguishes_names() {
    assert_eq!(name_hash("PerFrame"), name_hash("PerFrame"));
    assert_ne!(name_hash("PerFrame"), name_hash("PerObject"));
}

// ============================================================================
// EFFECT LAYOUT
// ============================================================================

#[test]
fn test_effect_layout_registers_cbuffers_and_params() {
    let mut effect = EffectLayout::new("float4 main() : SV_Target { return 1; }");
    let cb = effect.add_cbuffer("PerFrame", &[("view_proj", ParamType::Float4x4), ("time", ParamType::Float)]);
    let other = effect.add_cbuffer("PerObject", &[("world", ParamType::Float4x4)]);

    assert_eq!(effect.num_cbuffers(), 2);
    assert_eq!(effect.cbuffer_name_hash(cb), Some(name_hash("PerFrame")));
    assert_eq!(effect.cbuffer_parameters(cb), &[0, 1]);
    assert_eq!(effect.cbuffer_parameters(other), &[2]);
    assert_eq!(effect.parameter_type(1), Some(ParamType::Float));
    assert_eq!(effect.cbuffer_parameters(9), &[] as &[u32]);
}

#[test]
fn test_effect_layout_resize_and_bind() {
    let mut effect = EffectLayout::new("");
    let cb = effect.add_cbuffer("PerFrame", &[("color", ParamType::Float4)]);

    effect.resize_cbuffer(cb, 16);
    effect.bind_parameter(0, CBufferBinding { cbuffer: cb, offset: 0, stride: 4 });

    assert_eq!(effect.cbuffers[0].size, 16);
    assert_eq!(effect.parameters[0].binding, Some(CBufferBinding { cbuffer: cb, offset: 0, stride: 4 }));
}

#[test]
fn test_effect_layout_shader_descs() {
    let mut effect = EffectLayout::new("");
    let vs = effect.add_shader_desc("auto", "VSMain");
    let ps = effect.add_shader_desc("ps_5_0", "PSMain");

    assert_eq!(effect.shader_desc(vs).map(|d| d.func_name.as_str()), Some("VSMain"));
    assert_eq!(effect.shader_desc(ps).map(|d| d.profile.as_str()), Some("ps_5_0"));
    assert!(effect.shader_desc(7).is_none());
}
