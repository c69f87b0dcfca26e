//! Stage interface reflection over validated naga modules.
//!
//! Everything here is plain data so that link checks and uniform staging can
//! run without a GPU.

use std::fmt;

use naga::{Binding, Handle, ImageClass, ImageDimension, Interpolation, Sampling, ScalarKind, TypeInner};

/// Scalar component type of a shader value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarType {
    Float,
    Sint,
    Uint,
    Bool,
}

/// Shader-visible value type, detached from the naga type arena.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ValueType {
    Scalar(ScalarType),
    Vector { size: u8, scalar: ScalarType },
    /// `f32` matrix; `columns` × `rows`.
    Matrix { columns: u8, rows: u8 },
    Struct {
        name: Option<String>,
        members: Vec<Member>,
        span: u32,
    },
    Array {
        base: Box<ValueType>,
        len: Option<u32>,
        stride: u32,
    },
    /// Anything the engine never reads or writes (images, atomics, f16, ...).
    Other(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Member {
    pub name: String,
    pub offset: u32,
    pub ty: ValueType,
}

impl ValueType {
    /// Size in bytes under WGSL uniform layout rules.
    pub fn size(&self) -> Option<u32> {
        match self {
            Self::Scalar(_) => Some(4),
            Self::Vector { size, .. } => Some(*size as u32 * 4),
            Self::Matrix { columns, rows } => Some(*columns as u32 * matrix_column_stride(*rows)),
            Self::Struct { span, .. } => Some(*span),
            Self::Array { len, stride, .. } => len.map(|n| n * stride),
            Self::Other(_) => None,
        }
    }

    /// Number of `f32` components for vertex-attribute compatible types.
    pub fn float_components(&self) -> Option<u32> {
        match self {
            Self::Scalar(ScalarType::Float) => Some(1),
            Self::Vector { size, scalar: ScalarType::Float } => Some(*size as u32),
            _ => None,
        }
    }
}

/// Byte distance between matrix columns in uniform memory.
pub fn matrix_column_stride(rows: u8) -> u32 {
    if rows == 2 { 8 } else { 16 }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Float => "f32",
            Self::Sint => "i32",
            Self::Uint => "u32",
            Self::Bool => "bool",
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Vector { size, scalar } => write!(f, "vec{size}<{scalar}>"),
            Self::Matrix { columns, rows } => write!(f, "mat{columns}x{rows}<f32>"),
            Self::Struct { name: Some(name), .. } => write!(f, "{name}"),
            Self::Struct { name: None, .. } => f.write_str("struct"),
            Self::Array { base, len: Some(n), .. } => write!(f, "array<{base}, {n}>"),
            Self::Array { base, len: None, .. } => write!(f, "array<{base}>"),
            Self::Other(desc) => f.write_str(desc),
        }
    }
}

/// One `@location` input or output of an entry point.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Varying {
    pub location: u32,
    pub name: String,
    pub ty: ValueType,
    /// `@interpolate` type, with the WGSL default already applied.
    pub interpolation: Option<Interpolation>,
    pub sampling: Option<Sampling>,
}

impl Varying {
    /// `@interpolate(...)` as written in WGSL, e.g. `perspective, center`.
    pub fn qualifiers(&self) -> String {
        let interpolation = match self.interpolation {
            Some(Interpolation::Perspective) => "perspective",
            Some(Interpolation::Linear) => "linear",
            Some(Interpolation::Flat) => "flat",
            None => return "none".to_string(),
        };
        let sampling = match self.sampling {
            Some(Sampling::Center) => "center",
            Some(Sampling::Centroid) => "centroid",
            Some(Sampling::Sample) => "sample",
            Some(Sampling::First) => "first",
            Some(Sampling::Either) => "either",
            None => return interpolation.to_string(),
        };
        format!("{interpolation}, {sampling}")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    /// `var<uniform>`; `ty` carries the member layout.
    Uniform { ty: ValueType, size: u32 },
    /// `texture_2d<f32>`.
    Texture,
    /// Filtering `sampler`.
    Sampler,
}

/// A bound global (`@group(g) @binding(b)`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resource {
    pub group: u32,
    pub binding: u32,
    pub name: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn describe(&self) -> String {
        let ty = match &self.kind {
            ResourceKind::Uniform { ty, .. } => format!("uniform {ty}"),
            ResourceKind::Texture => "texture_2d<f32>".to_string(),
            ResourceKind::Sampler => "sampler".to_string(),
        };
        format!("`{}: {ty}` at @group({}) @binding({})", self.name, self.group, self.binding)
    }
}

/// Everything one stage exposes to the rest of the pipeline.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StageInterface {
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub resources: Vec<Resource>,
}

/// Reflects the interface of `entry` within `module`.
///
/// Errors describe bindings the engine cannot feed (storage buffers,
/// non-2D textures, comparison samplers).
pub(crate) fn stage_interface(
    module: &naga::Module,
    entry: &naga::EntryPoint,
) -> Result<StageInterface, String> {
    let mut iface = StageInterface::default();

    for arg in &entry.function.arguments {
        collect_varyings(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut iface.inputs);
    }
    if let Some(result) = &entry.function.result {
        collect_varyings(module, None, result.ty, result.binding.as_ref(), &mut iface.outputs);
    }

    iface.inputs.sort_by_key(|v| v.location);
    iface.outputs.sort_by_key(|v| v.location);

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.clone().unwrap_or_else(|| format!("binding{}", binding.binding));

        let kind = match var.space {
            naga::AddressSpace::Uniform => {
                let ty = value_type(module, var.ty);
                let size = ty
                    .size()
                    .ok_or_else(|| format!("uniform `{name}` has no fixed size"))?;
                ResourceKind::Uniform { ty, size }
            }
            naga::AddressSpace::Handle => match &module.types[var.ty].inner {
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class: ImageClass::Sampled { kind: ScalarKind::Float, multi: false },
                } => ResourceKind::Texture,
                TypeInner::Sampler { comparison: false } => ResourceKind::Sampler,
                _ => {
                    return Err(format!(
                        "`{name}`: only texture_2d<f32> and sampler handles are supported"
                    ));
                }
            },
            _ => {
                return Err(format!(
                    "`{name}`: only uniform buffers, textures and samplers can be bound"
                ));
            }
        };

        iface.resources.push(Resource {
            group: binding.group,
            binding: binding.binding,
            name,
            kind,
        });
    }
    iface.resources.sort_by_key(|r| (r.group, r.binding));

    Ok(iface)
}

fn collect_varyings(
    module: &naga::Module,
    name: Option<&str>,
    ty: Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => out.push(Varying {
            location: *location,
            name: name.unwrap_or("<unnamed>").to_string(),
            ty: value_type(module, ty),
            interpolation: *interpolation,
            sampling: *sampling,
        }),
        Some(Binding::BuiltIn(_)) => {}
        // Unbound arguments/results are structs whose members carry the bindings.
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_varyings(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn value_type(module: &naga::Module, ty: Handle<naga::Type>) -> ValueType {
    let ty_def = &module.types[ty];
    match &ty_def.inner {
        TypeInner::Scalar(s) => match scalar_type(*s) {
            Some(s) => ValueType::Scalar(s),
            None => ValueType::Other(format!("{:?}", s)),
        },
        TypeInner::Vector { size, scalar } => match scalar_type(*scalar) {
            Some(s) => ValueType::Vector { size: *size as u8, scalar: s },
            None => ValueType::Other(format!("vec{}<{:?}>", *size as u8, scalar.kind)),
        },
        TypeInner::Matrix { columns, rows, scalar } if scalar.width == 4 => ValueType::Matrix {
            columns: *columns as u8,
            rows: *rows as u8,
        },
        TypeInner::Struct { members, span } => ValueType::Struct {
            name: ty_def.name.clone(),
            members: members
                .iter()
                .map(|m| Member {
                    name: m.name.clone().unwrap_or_default(),
                    offset: m.offset,
                    ty: value_type(module, m.ty),
                })
                .collect(),
            span: *span,
        },
        TypeInner::Array { base, size, stride } => ValueType::Array {
            base: Box::new(value_type(module, *base)),
            len: match size {
                naga::ArraySize::Constant(n) => Some(n.get()),
                _ => None,
            },
            stride: *stride,
        },
        other => ValueType::Other(format!("{other:?}")),
    }
}

fn scalar_type(s: naga::Scalar) -> Option<ScalarType> {
    match (s.kind, s.width) {
        (ScalarKind::Float, 4) => Some(ScalarType::Float),
        (ScalarKind::Sint, 4) => Some(ScalarType::Sint),
        (ScalarKind::Uint, 4) => Some(ScalarType::Uint),
        (ScalarKind::Bool, _) => Some(ScalarType::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reflect(src: &str) -> StageInterface {
        let module = naga::front::wgsl::parse_str(src).expect("test shader parses");
        stage_interface(&module, &module.entry_points[0]).expect("supported bindings")
    }

    #[test]
    fn struct_result_members_become_outputs() {
        let iface = reflect(
            r#"
            struct VsOut {
                @builtin(position) clip: vec4<f32>,
                @location(1) uv: vec2<f32>,
                @location(0) color: vec3<f32>,
            };
            @vertex
            fn vs_main(@location(0) pos: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.clip = vec4<f32>(pos, 1.0);
                out.uv = pos.xy;
                out.color = pos;
                return out;
            }
            "#,
        );

        assert_eq!(
            iface.inputs,
            vec![Varying {
                location: 0,
                name: "pos".into(),
                ty: ValueType::Vector { size: 3, scalar: ScalarType::Float },
                interpolation: Some(Interpolation::Perspective),
                sampling: Some(Sampling::Center),
            }]
        );
        let names: Vec<_> = iface.outputs.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["color", "uv"]);
    }

    #[test]
    fn uniform_struct_members_keep_offsets() {
        let iface = reflect(
            r#"
            struct Globals { tint: vec3<f32>, time: f32, model: mat4x4<f32> };
            @group(0) @binding(0) var<uniform> globals: Globals;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(globals.tint * globals.time, 1.0);
            }
            "#,
        );

        let [res] = iface.resources.as_slice() else { panic!("one resource expected") };
        let ResourceKind::Uniform { ty: ValueType::Struct { members, .. }, size } = &res.kind else {
            panic!("uniform struct expected");
        };
        assert_eq!(*size, 80);
        let offsets: Vec<_> = members.iter().map(|m| (m.name.as_str(), m.offset)).collect();
        assert_eq!(offsets, [("tint", 0), ("time", 12), ("model", 16)]);
    }

    #[test]
    fn textures_and_samplers_are_reflected() {
        let iface = reflect(
            r#"
            @group(0) @binding(1) var tex: texture_2d<f32>;
            @group(0) @binding(2) var samp: sampler;
            @fragment
            fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return textureSample(tex, samp, uv);
            }
            "#,
        );

        let kinds: Vec<_> = iface.resources.iter().map(|r| (r.name.as_str(), r.kind.clone())).collect();
        assert_eq!(kinds, [("tex", ResourceKind::Texture), ("samp", ResourceKind::Sampler)]);
    }

    #[test]
    fn interpolation_qualifiers_are_reflected() {
        let iface = reflect(
            r#"
            @fragment
            fn fs_main(
                @location(0) @interpolate(flat) id: vec3<f32>,
                @location(1) @interpolate(linear, centroid) uv: vec2<f32>,
                @location(2) tint: vec3<f32>,
            ) -> @location(0) vec4<f32> {
                return vec4<f32>(id + tint, uv.x);
            }
            "#,
        );

        let qualifiers: Vec<_> = iface.inputs.iter().map(Varying::qualifiers).collect();
        assert_eq!(qualifiers, ["flat", "linear, centroid", "perspective, center"]);
    }

    #[test]
    fn matrix_sizes_follow_uniform_layout() {
        assert_eq!(ValueType::Matrix { columns: 2, rows: 2 }.size(), Some(16));
        assert_eq!(ValueType::Matrix { columns: 3, rows: 3 }.size(), Some(48));
        assert_eq!(ValueType::Matrix { columns: 4, rows: 4 }.size(), Some(64));
    }

    #[test]
    fn display_uses_wgsl_spelling() {
        assert_eq!(ValueType::Vector { size: 2, scalar: ScalarType::Float }.to_string(), "vec2<f32>");
        assert_eq!(ValueType::Matrix { columns: 3, rows: 3 }.to_string(), "mat3x3<f32>");
    }
}
