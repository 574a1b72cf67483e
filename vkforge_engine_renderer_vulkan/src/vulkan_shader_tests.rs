//! Unit tests for vulkan_shader.rs
//!
//! Profile resolution, compile macros, the constant-buffer stride rule,
//! constant-buffer matching and the stage blob layout.

use vkforge_engine::vkforge::Error;
use vkforge_engine::vkforge::render::{
    name_hash, ElementFormat, EffectLayout, ParamType, RenderDeviceCaps, ShaderStage,
};
use crate::vulkan_shader::{
    cbuffer_block_name, cbuffer_param_stride, compile_macros, default_shader_profile,
    match_cbuffer_indices, resolve_shader_profile, write_stage_blob, ReflectedCBuffer,
    ReflectedVariable, ShaderReflection, StageState,
};

fn reflected(name: &str, size: u32, variables: &[(&str, u32, u32)]) -> ReflectedCBuffer {
    ReflectedCBuffer {
        name: name.to_string(),
        name_hash: name_hash(name),
        size,
        variables: variables
            .iter()
            .map(|&(name, start_offset, elements)| ReflectedVariable {
                name: name.to_string(),
                start_offset,
                size: 16,
                elements,
            })
            .collect(),
    }
}

// ============================================================================
// PROFILES
// ============================================================================

#[test]
fn test_default_profiles() {
    assert_eq!(default_shader_profile(ShaderStage::Vertex, false), "vs_5_0");
    assert_eq!(default_shader_profile(ShaderStage::Pixel, false), "ps_5_0");
    assert_eq!(default_shader_profile(ShaderStage::Domain, false), "ds_5_0");
    assert_eq!(default_shader_profile(ShaderStage::Vertex, true), "vs_5_1");
    assert_eq!(default_shader_profile(ShaderStage::Compute, true), "cs_5_1");
}

#[test]
fn test_auto_resolves_to_default() {
    assert_eq!(resolve_shader_profile("auto", true, "ps_5_0"), "ps_5_0");
    assert_eq!(resolve_shader_profile("ps_4_0", true, "ps_5_0"), "ps_4_0");
}

#[test]
fn test_unavailable_stage_gets_empty_profile() {
    assert_eq!(resolve_shader_profile("auto", false, "gs_5_0"), "");
    assert_eq!(resolve_shader_profile("gs_5_0", false, "gs_5_0"), "");
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_macros_without_bc4_bc5() {
    let macros = compile_macros(&RenderDeviceCaps::default());
    let names: Vec<&str> = macros.iter().map(|(name, _)| name.as_str()).collect();

    assert_eq!(names, vec!["VKFORGE_VULKAN", "VKFORGE_BC5_AS_AG", "VKFORGE_BC4_AS_G", "VKFORGE_FRAG_DEPTH"]);
    assert!(macros.iter().all(|(_, value)| value == "1"));
}

#[test]
fn test_macros_with_native_bc4_bc5() {
    let caps = RenderDeviceCaps {
        texture_formats: vec![ElementFormat::BC4, ElementFormat::BC4_SRGB, ElementFormat::BC5, ElementFormat::BC5_SRGB],
        ..Default::default()
    };
    let names: Vec<String> = compile_macros(&caps).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["VKFORGE_VULKAN", "VKFORGE_FRAG_DEPTH"]);
}

#[test]
fn test_srgb_variant_missing_still_emulates() {
    let caps = RenderDeviceCaps {
        texture_formats: vec![ElementFormat::BC5, ElementFormat::BC4, ElementFormat::BC4_SRGB],
        ..Default::default()
    };
    let names: Vec<String> = compile_macros(&caps).into_iter().map(|(name, _)| name).collect();
    assert!(names.contains(&"VKFORGE_BC5_AS_AG".to_string()));
    assert!(!names.contains(&"VKFORGE_BC4_AS_G".to_string()));
}

// ============================================================================
// STRIDE RULE
// ============================================================================

#[test]
fn test_struct_stride_is_one() {
    assert_eq!(cbuffer_param_stride(ParamType::Struct, 0), 1);
    assert_eq!(cbuffer_param_stride(ParamType::Struct, 8), 1);
}

#[test]
fn test_array_strides() {
    assert_eq!(cbuffer_param_stride(ParamType::Float, 4), 16);
    assert_eq!(cbuffer_param_stride(ParamType::Float4, 2), 16);
    assert_eq!(cbuffer_param_stride(ParamType::Float4x4, 3), 64);
}

#[test]
fn test_scalar_strides() {
    assert_eq!(cbuffer_param_stride(ParamType::Float, 0), 4);
    assert_eq!(cbuffer_param_stride(ParamType::Int, 0), 4);
    assert_eq!(cbuffer_param_stride(ParamType::Float3, 0), 4);
    assert_eq!(cbuffer_param_stride(ParamType::Float4x4, 0), 16);
}

// ============================================================================
// REFLECTION
// ============================================================================

#[test]
fn test_block_name_prefers_variable() {
    assert_eq!(cbuffer_block_name(Some("PerFrame"), Some("type.PerFrame")), "PerFrame");
}

#[test]
fn test_block_name_from_type() {
    assert_eq!(cbuffer_block_name(None, Some("type.PerObject")), "PerObject");
    assert_eq!(cbuffer_block_name(Some(""), Some("Lights")), "Lights");
    assert_eq!(cbuffer_block_name(None, None), "");
}

#[test]
fn test_parameter_names_in_buffer_order() {
    let reflection = ShaderReflection {
        cbuffers: vec![
            reflected("a", 32, &[("x", 0, 0), ("y", 16, 0)]),
            reflected("b", 16, &[("z", 0, 0)]),
        ],
        resources: vec!["albedo_tex".to_string()],
    };
    assert_eq!(reflection.parameter_names(), vec!["x", "y", "z"]);
}

#[test]
fn test_cbuffers_matched_by_name_hash() {
    let mut effect = EffectLayout::new("");
    effect.add_cbuffer("global_cb", &[("time", ParamType::Float)]);
    effect.add_cbuffer("per_object", &[("world", ParamType::Float4x4)]);

    let cbuffers = [reflected("per_object", 64, &[("world", 0, 0)]), reflected("global_cb", 16, &[("time", 0, 0)])];
    let indices = match_cbuffer_indices(&cbuffers, &effect).unwrap();
    assert_eq!(indices, vec![1, 0]);
}

#[test]
fn test_unregistered_cbuffer_is_an_error() {
    let mut effect = EffectLayout::new("");
    effect.add_cbuffer("global_cb", &[]);

    let cbuffers = [reflected("missing", 16, &[])];
    let result = match_cbuffer_indices(&cbuffers, &effect);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// BLOB
// ============================================================================

#[test]
fn test_empty_stage_writes_empty_block() {
    let blob = write_stage_blob(0, &["ignored".to_string()], &[], &[]).unwrap();
    assert_eq!(blob, vec![0, 0, 0, 0]);
}

#[test]
fn test_blob_layout_little_endian() {
    let blob = write_stage_blob(
        0x0102,
        &["mvp".to_string()],
        &["tex".to_string(), "smp".to_string()],
        &[("t".to_string(), "s".to_string())],
    )
    .unwrap();

    let mut expected_block: Vec<u8> = vec![0x02, 0x01, 0x00, 0x00]; // word count, no words follow
    expected_block.extend_from_slice(&[1, 0, 3]);
    expected_block.extend_from_slice(b"mvp");
    expected_block.extend_from_slice(&[2, 0, 3]);
    expected_block.extend_from_slice(b"tex");
    expected_block.push(3);
    expected_block.extend_from_slice(b"smp");
    expected_block.extend_from_slice(&[1, 0, 1, b't', 1, b's']);

    assert_eq!(&blob[..4], &(expected_block.len() as u32).to_le_bytes());
    assert_eq!(&blob[4..], &expected_block[..]);
}

#[test]
fn test_overlong_name_rejected() {
    let long = "n".repeat(256);
    let result = write_stage_blob(1, &[long], &[], &[]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// STATE
// ============================================================================

#[test]
fn test_stage_states_are_ordered() {
    assert!(StageState::Empty < StageState::Compiled);
    assert!(StageState::Compiled < StageState::HardwareReady);
    assert!(StageState::HardwareReady < StageState::Linked);
}
