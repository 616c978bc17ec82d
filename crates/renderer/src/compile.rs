//! GLSL wrapping and validation.
//!
//! Effect sources are written against a loose-uniform, GLSL ES 3.00 style
//! contract (`uniform float time_f;`, `in vec2 TexCoord;`). Vulkan-flavoured
//! GLSL, which is what `wgpu` accepts, needs every non-opaque uniform inside a
//! block and explicit locations on stage interfaces. [`wrap_fragment`]
//! rewrites one into the other:
//!
//! 1. Drop `#version` and `precision` lines and every uniform declaration that
//!    belongs to the contract, remembering which ones the source asked for.
//! 2. Give each global `in`/`out` declaration a `layout(location = N)`.
//! 3. Prepend [`HEADER`] (the `EffectParams` block plus texture bindings) and a
//!    `#define` alias for each contract uniform the source declared, then
//!    `#line 1` so diagnostics count from the first line of the effect.
//!
//! [`validate`] runs the result through naga so syntax and type errors come
//! back as strings instead of device errors.
use std::borrow::Cow;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

/// `(glsl name, block member, member type)` for every scalar or vector
/// uniform of the effect contract. Order does not matter here; the block
/// layout lives in [`HEADER`].
const CONTRACT: &[(&str, &str, &str)] = &[
    ("iMouse", "_iMouse", "vec4"),
    ("iResolution", "_iResolution", "vec2"),
    ("iMouseNormalized", "_iMouseNormalized", "vec2"),
    ("iMouseVelocity", "_iMouseVelocity", "vec2"),
    ("time_f", "_time_f", "float"),
    ("iTimeDelta", "_iTimeDelta", "float"),
    ("iCameraPos", "_iCameraPos", "vec3"),
    ("iFrame", "_iFrame", "float"),
    ("iTime", "_iTime", "float"),
    ("iSeconds", "_iSeconds", "float"),
    ("iMinutes", "_iMinutes", "float"),
    ("iHours", "_iHours", "float"),
    ("iMouseActive", "_iMouseActive", "float"),
    ("iMouseClick", "_iMouseClick", "float"),
    ("iAspectRatio", "_iAspectRatio", "float"),
    ("iSpeed", "_iSpeed", "float"),
    ("iFrequency", "_iFrequency", "float"),
    ("iAmplitude", "_iAmplitude", "float"),
    ("iHueShift", "_iHueShift", "float"),
    ("iSaturation", "_iSaturation", "float"),
    ("iBrightness", "_iBrightness", "float"),
    ("iContrast", "_iContrast", "float"),
    ("iZoom", "_iZoom", "float"),
    ("iRotation", "_iRotation", "float"),
    ("iBeat", "_iBeat", "float"),
    ("iAudioLevel", "_iAudioLevel", "float"),
    ("iDebugMode", "_iDebugMode", "float"),
    ("iQuality", "_iQuality", "float"),
    ("alpha", "_alpha", "float"),
    ("amp", "_amp", "float"),
    ("uamp", "_uamp", "float"),
];

/// The sampled base texture.
const TEXTURE_UNIFORM: &str = "textTexture";

/// Block layout must match `gallery::UniformBlock` byte for byte.
const HEADER: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform EffectParams {
    vec4 _iMouse;
    vec2 _iResolution;
    vec2 _iMouseNormalized;
    vec2 _iMouseVelocity;
    float _time_f;
    float _iTimeDelta;
    vec3 _iCameraPos;
    float _iFrame;
    float _iTime;
    float _iSeconds;
    float _iMinutes;
    float _iHours;
    float _iMouseActive;
    float _iMouseClick;
    float _iAspectRatio;
    float _iSpeed;
    float _iFrequency;
    float _iAmplitude;
    float _iHueShift;
    float _iSaturation;
    float _iBrightness;
    float _iContrast;
    float _iZoom;
    float _iRotation;
    float _iBeat;
    float _iAudioLevel;
    float _iDebugMode;
    float _iQuality;
    float _alpha;
    float _amp;
    float _uamp;
    float _padding;
} fx_params;

layout(set = 0, binding = 2) uniform texture2D fx_texture;
layout(set = 0, binding = 3) uniform sampler fx_sampler;
";

/// Clip-space quad for the letterboxed 2D path. The viewport is the display
/// rectangle, so the quad always covers it exactly. `TexCoord` has its origin
/// at the bottom-left corner.
pub(crate) const QUAD_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 TexCoord;

const vec2 corners[6] = vec2[6](
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0),
    vec2(1.0, 1.0),
    vec2(-1.0, -1.0),
    vec2(1.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    vec2 pos = corners[gl_VertexIndex];
    TexCoord = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Mesh path: interleaved position/normal/texcoord through the transform
/// block at binding 1.
pub(crate) const MESH_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 texcoord;
layout(location = 0) out vec2 TexCoord;

layout(std140, set = 0, binding = 1) uniform Transform {
    mat4 uModelView;
    mat4 uProjection;
} transform;

void main() {
    TexCoord = texcoord;
    gl_Position = transform.uProjection * transform.uModelView * vec4(position, 1.0);
}
";

/// A wrapped fragment source and the contract uniforms it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WrappedFragment {
    pub source: String,
    pub declared: Vec<String>,
}

/// Rewrites an effect fragment into Vulkan GLSL. See the module docs.
pub(crate) fn wrap_fragment(source: &str) -> WrappedFragment {
    let mut body = String::with_capacity(source.len());
    let mut aliases = String::new();
    let mut declared = Vec::new();
    let mut in_location = 0u32;
    let mut out_location = 0u32;

    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            // Keep line numbers stable for error messages.
            body.push('\n');
            continue;
        }
        if let Some((ty, name)) = parse_uniform(trimmed) {
            if let Some(alias) = contract_alias(ty, name) {
                if !declared.iter().any(|known| known == name) {
                    aliases.push_str(&alias);
                    declared.push(name.to_string());
                }
                body.push('\n');
                continue;
            }
        }
        if let Some(rest) = interface_declaration(trimmed, "in") {
            body.push_str(&format!("layout(location = {in_location}) in {rest}\n"));
            in_location += 1;
            continue;
        }
        if let Some(rest) = interface_declaration(trimmed, "out") {
            body.push_str(&format!("layout(location = {out_location}) out {rest}\n"));
            out_location += 1;
            continue;
        }
        body.push_str(&line.replace("main(void)", "main()"));
        body.push('\n');
    }

    WrappedFragment {
        source: format!("{HEADER}{aliases}#line 1\n{body}"),
        declared,
    }
}

/// Splits `uniform [precision] TYPE NAME;` into `(TYPE, NAME)`.
fn parse_uniform(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("uniform ")?;
    let decl = rest.strip_suffix(';')?.trim();
    if decl.contains(['{', '(', ',', '[']) {
        return None;
    }
    let tokens: Vec<&str> = decl.split_whitespace().collect();
    match tokens.as_slice() {
        [.., ty, name] => Some((*ty, *name)),
        _ => None,
    }
}

fn contract_alias(declared_ty: &str, name: &str) -> Option<String> {
    if name == TEXTURE_UNIFORM {
        return (declared_ty == "sampler2D")
            .then(|| format!("#define {name} sampler2D(fx_texture, fx_sampler)\n"));
    }
    let (_, member, member_ty) = CONTRACT.iter().find(|(glsl, _, _)| *glsl == name)?;
    let alias = if declared_ty == *member_ty {
        format!("#define {name} fx_params.{member}\n")
    } else if matches!(declared_ty, "int" | "uint" | "bool") && *member_ty == "float" {
        format!("#define {name} {declared_ty}(fx_params.{member})\n")
    } else {
        return None;
    };
    Some(alias)
}

/// Matches a global `in`/`out` declaration without an explicit layout and
/// returns the text after the qualifier.
fn interface_declaration<'a>(line: &'a str, qualifier: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(qualifier)?.strip_prefix(' ')?;
    if !rest.trim_end().ends_with(';') || rest.contains('(') {
        return None;
    }
    Some(rest.trim_start())
}

/// Parses and validates GLSL with naga, returning a printable diagnostic on
/// failure.
pub(crate) fn validate(source: &str, stage: ShaderStage) -> Result<(), String> {
    let module = Frontend::default()
        .parse(&Options::from(stage), source)
        .map_err(|err| err.emit_to_string(source))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| err.emit_to_string(source))?;
    Ok(())
}

pub(crate) fn create_module(
    device: &wgpu::Device,
    label: &str,
    source: String,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source),
            stage,
            defines: &[],
        },
    })
}
