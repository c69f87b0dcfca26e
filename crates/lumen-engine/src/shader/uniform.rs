use std::collections::{HashMap, HashSet};

use super::link::ProgramInterface;
use super::reflect::{matrix_column_stride, ResourceKind, ScalarType, ValueType};

/// A value that can be written to a named uniform.
///
/// Matrices are column-major: `Mat3(m)` has `m[column][row]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([[f32; 2]; 2]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }

    /// Encodes `self` for a field of type `ty`, or `None` when the types differ.
    ///
    /// Uniform memory cannot hold WGSL `bool`, so booleans target `u32`/`i32`.
    fn encode(&self, ty: &ValueType) -> Option<Vec<u8>> {
        use ScalarType as S;
        use ValueType as T;

        let bytes = match (self, ty) {
            (Self::Bool(b), T::Scalar(S::Uint | S::Sint)) => (*b as u32).to_le_bytes().to_vec(),
            (Self::Int(v), T::Scalar(S::Sint)) => v.to_le_bytes().to_vec(),
            (Self::Int(v), T::Scalar(S::Uint)) if *v >= 0 => (*v as u32).to_le_bytes().to_vec(),
            (Self::Float(v), T::Scalar(S::Float)) => v.to_le_bytes().to_vec(),
            (Self::Vec2(v), T::Vector { size: 2, scalar: S::Float }) => floats(v),
            (Self::Vec3(v), T::Vector { size: 3, scalar: S::Float }) => floats(v),
            (Self::Vec4(v), T::Vector { size: 4, scalar: S::Float }) => floats(v),
            (Self::Mat2(m), T::Matrix { columns: 2, rows: 2 }) => columns(m.as_slice(), 2),
            (Self::Mat3(m), T::Matrix { columns: 3, rows: 3 }) => columns(m.as_slice(), 3),
            (Self::Mat4(m), T::Matrix { columns: 4, rows: 4 }) => columns(m.as_slice(), 4),
            _ => return None,
        };
        Some(bytes)
    }
}

fn floats(v: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(v).to_vec()
}

/// Lays matrix columns out at the uniform column stride (vec3 columns pad to 16 bytes).
fn columns<const R: usize>(m: &[[f32; R]], rows: u8) -> Vec<u8> {
    let stride = matrix_column_stride(rows) as usize;
    let mut out = vec![0u8; stride * m.len()];
    for (i, col) in m.iter().enumerate() {
        let bytes: &[u8] = bytemuck::cast_slice(col);
        out[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
    }
    out
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

uniform_from! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    [f32; 2] => Vec2,
    [f32; 3] => Vec3,
    [f32; 4] => Vec4,
    [[f32; 2]; 2] => Mat2,
    [[f32; 3]; 3] => Mat3,
    [[f32; 4]; 4] => Mat4,
}

/// Outcome of a `set` call. Exposed for diagnostics and tests.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformWrite {
    Written,
    /// No uniform of that name exists; nothing changed.
    Unknown,
    /// The uniform exists but has another type; nothing changed.
    TypeMismatch,
}

#[derive(Debug, Clone)]
enum Target {
    Field { block: usize, offset: u32, ty: ValueType },
    /// Index into `ProgramInterface::resources` of a texture or sampler.
    Slot { resource: usize },
}

/// CPU copy of one `var<uniform>` buffer.
#[derive(Debug, Clone)]
pub(crate) struct UniformBlock {
    pub resource: usize,
    pub bytes: Vec<u8>,
    dirty: bool,
}

/// Staged uniform values of a program plus its texture-slot assignments.
///
/// Writes land here and are uploaded by the next draw using the program.
#[derive(Debug, Clone)]
pub struct UniformStorage {
    blocks: Vec<UniformBlock>,
    targets: HashMap<String, Target>,
    slots: Vec<Option<u32>>,
    /// Sampler resource -> texture resource declared at `binding - 1`.
    sampler_pairs: HashMap<usize, usize>,
    reported: HashSet<String>,
}

impl UniformStorage {
    pub fn new(program: &ProgramInterface) -> Self {
        let mut blocks = Vec::new();
        let mut targets = HashMap::new();
        let mut bare = Vec::new();
        let mut sampler_pairs = HashMap::new();

        for (index, pr) in program.resources.iter().enumerate() {
            let res = &pr.resource;
            match &res.kind {
                ResourceKind::Uniform { ty, size } => {
                    let block = blocks.len();
                    // Uniform bindings are sized in 16-byte units.
                    blocks.push(UniformBlock {
                        resource: index,
                        bytes: vec![0; size.next_multiple_of(16) as usize],
                        dirty: true,
                    });
                    register_field(&mut targets, &res.name, block, 0, ty);
                    if let ValueType::Struct { members, .. } = ty {
                        for m in members {
                            bare.push((m.name.clone(), Target::Field {
                                block,
                                offset: m.offset,
                                ty: m.ty.clone(),
                            }));
                        }
                    }
                }
                ResourceKind::Texture => {
                    targets.insert(res.name.clone(), Target::Slot { resource: index });
                }
                ResourceKind::Sampler => {
                    targets.insert(res.name.clone(), Target::Slot { resource: index });
                    let texture = program.resources.iter().position(|t| {
                        t.resource.kind == ResourceKind::Texture
                            && t.resource.group == res.group
                            && t.resource.binding + 1 == res.binding
                    });
                    if let Some(texture) = texture {
                        sampler_pairs.insert(index, texture);
                    }
                }
            }
        }

        // A bare member name resolves only when exactly one block declares it
        // and it does not shadow a qualified or top-level name.
        let mut declared: HashMap<&str, usize> = HashMap::new();
        for (name, _) in &bare {
            *declared.entry(name.as_str()).or_default() += 1;
        }
        let unique: Vec<_> = bare
            .iter()
            .filter(|(name, _)| declared[name.as_str()] == 1)
            .cloned()
            .collect();
        for (name, target) in unique {
            if targets.contains_key(&name) {
                continue;
            }
            targets.insert(name, target);
        }

        Self {
            blocks,
            targets,
            slots: vec![None; program.resources.len()],
            sampler_pairs,
            reported: HashSet::new(),
        }
    }

    /// Stages `value` for uniform `name`.
    ///
    /// Unknown names are ignored (the compiler may have removed the uniform).
    /// Texture and sampler names accept an `Int` slot index.
    pub fn set(&mut self, name: &str, value: UniformValue) -> UniformWrite {
        let Some(target) = self.targets.get(name) else {
            if self.reported.insert(name.to_string()) {
                log::debug!("uniform `{name}` not found in program; write ignored");
            }
            return UniformWrite::Unknown;
        };

        match (target, value) {
            (Target::Slot { resource }, UniformValue::Int(slot)) if slot >= 0 => {
                self.slots[*resource] = Some(slot as u32);
                UniformWrite::Written
            }
            (Target::Field { block, offset, ty }, value) => match value.encode(ty) {
                Some(bytes) => {
                    let block = &mut self.blocks[*block];
                    let start = *offset as usize;
                    block.bytes[start..start + bytes.len()].copy_from_slice(&bytes);
                    block.dirty = true;
                    UniformWrite::Written
                }
                None => {
                    let expected = ty.to_string();
                    self.report_mismatch(name, value, &expected);
                    UniformWrite::TypeMismatch
                }
            },
            (Target::Slot { .. }, value) => {
                self.report_mismatch(name, value, "non-negative int texture slot");
                UniformWrite::TypeMismatch
            }
        }
    }

    fn report_mismatch(&mut self, name: &str, value: UniformValue, expected: &str) {
        if self.reported.insert(name.to_string()) {
            log::warn!(
                "uniform `{name}` expects {expected}, got a {} value; write ignored",
                value.type_name()
            );
        }
    }

    /// Texture slot read by the texture or sampler at `resource`.
    ///
    /// Unassigned samplers follow their paired texture; anything else reads slot 0.
    pub fn slot_for(&self, resource: usize) -> u32 {
        if let Some(slot) = self.slots.get(resource).copied().flatten() {
            return slot;
        }
        self.sampler_pairs
            .get(&resource)
            .and_then(|texture| self.slots[*texture])
            .unwrap_or(0)
    }

    /// Raw bytes of the block backing `resource`, if it is a uniform buffer.
    pub fn block_bytes(&self, resource: usize) -> Option<&[u8]> {
        self.blocks
            .iter()
            .find(|b| b.resource == resource)
            .map(|b| b.bytes.as_slice())
    }

    pub(crate) fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    /// Yields `(block index, bytes)` for blocks written since the last call.
    pub(crate) fn take_dirty(&mut self) -> impl Iterator<Item = (usize, &[u8])> {
        self.blocks.iter_mut().enumerate().filter_map(|(i, b)| {
            if b.dirty {
                b.dirty = false;
                Some((i, b.bytes.as_slice()))
            } else {
                None
            }
        })
    }
}

fn register_field(
    targets: &mut HashMap<String, Target>,
    name: &str,
    block: usize,
    offset: u32,
    ty: &ValueType,
) {
    // Nested structs are addressed as `outer.inner.field`.
    if let ValueType::Struct { members, .. } = ty {
        for m in members {
            register_field(targets, &format!("{name}.{}", m.name), block, offset + m.offset, &m.ty);
        }
    }
    targets.insert(name.to_string(), Target::Field { block, offset, ty: ty.clone() });
}
