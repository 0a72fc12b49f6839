// ============================================================================
// MAP SHADER — WGSL source for embedders with a programmable pipeline
// ============================================================================
//
// The crate's own harness composites on the CPU (see `compositor`); engines
// that render the parchment quad themselves can bind the three layer
// textures and run this instead. The fragment blend must stay byte-for-byte
// in agreement with `compositor::composite`.

/// Three-layer parchment compositing: base map, drawing layer, selection
/// overlay, sampled at the same UV.
///
/// Bindings: group 0 holds the three textures plus one sampler in slot
/// order base / drawing / overlay / sampler.
pub const MAP_COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0) var base_tex: texture_2d<f32>;
@group(0) @binding(1) var drawing_tex: texture_2d<f32>;
@group(0) @binding(2) var overlay_tex: texture_2d<f32>;
@group(0) @binding(3) var samp: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_map(@location(0) pos: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    // Quad transform is supplied by the host scene; positions arrive in clip space.
    out.position = vec4<f32>(pos, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_map(in: VertexOutput) -> @location(0) vec4<f32> {
    let base_color = textureSample(base_tex, samp, in.uv);
    let drawing_color = textureSample(drawing_tex, samp, in.uv);
    let overlay_color = textureSample(overlay_tex, samp, in.uv);

    // Ink at 0.8 of its own alpha, then the selection overlay on top.
    let combined = mix(base_color, drawing_color, drawing_color.a * 0.8);
    return mix(combined, overlay_color, overlay_color.a);
}
"#;
