use std::borrow::Cow;
use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{Error, Result};
use crate::render::RenderCtx;

use super::reflect::{stage_interface, StageInterface};

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn visibility(self) -> wgpu::ShaderStages {
        match self {
            Self::Vertex => wgpu::ShaderStages::VERTEX,
            Self::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// A stage that passed the shader compiler, before any GPU allocation.
#[derive(Debug, Clone)]
pub struct StageModule {
    pub kind: StageKind,
    pub entry_point: String,
    pub interface: StageInterface,
    source: String,
}

impl StageModule {
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parses and validates one WGSL stage.
///
/// The source must contain exactly one entry point of `kind`. Diagnostics are
/// rendered against `source` with line/column context.
pub fn compile_module(kind: StageKind, source: &str) -> Result<StageModule> {
    let compile_err = |log: String| Error::Compile { stage: kind, log };

    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| compile_err(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| compile_err(e.emit_to_string(source)))?;

    let stage = kind.naga_stage();
    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == stage);
    let entry = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(compile_err(format!("no @{kind} entry point found"))),
        (Some(_), Some(_)) => {
            return Err(compile_err(format!(
                "more than one @{kind} entry point; one stage per source is expected"
            )));
        }
    };

    let interface = stage_interface(&module, entry).map_err(compile_err)?;

    Ok(StageModule {
        kind,
        entry_point: entry.name.clone(),
        interface,
        source: source.to_owned(),
    })
}

/// A compiled stage holding its GPU shader module.
///
/// Only lives until `ShaderProgram::link`, which consumes it whether or not
/// linking succeeds.
pub struct CompiledStage {
    pub(crate) module: StageModule,
    pub(crate) gpu: wgpu::ShaderModule,
}

impl CompiledStage {
    /// Compiles `source` as a `kind` stage and allocates its GPU module.
    pub fn compile(ctx: &RenderCtx<'_>, kind: StageKind, source: &str) -> Result<Self> {
        let module = compile_module(kind, source)?;

        let label = format!("lumen {kind} stage `{}`", module.entry_point);
        let gpu = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(module.source())),
        });

        log::debug!(
            "compiled {kind} stage `{}` ({} inputs, {} outputs, {} bindings)",
            module.entry_point,
            module.interface.inputs.len(),
            module.interface.outputs.len(),
            module.interface.resources.len()
        );

        Ok(Self { module, gpu })
    }

    pub fn kind(&self) -> StageKind {
        self.module.kind
    }

    pub fn interface(&self) -> &StageInterface {
        &self.module.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        @vertex
        fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(pos, 1.0);
        }
    "#;

    #[test]
    fn valid_vertex_stage_compiles() {
        let stage = compile_module(StageKind::Vertex, VS).expect("valid stage");
        assert_eq!(stage.entry_point, "vs_main");
        assert_eq!(stage.interface.inputs.len(), 1);
        assert!(stage.interface.outputs.is_empty());
    }

    #[test]
    fn vertex_stage_must_write_position() {
        let src = r#"
            @vertex
            fn vs_main(@location(0) pos: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(pos, 1.0);
            }
        "#;
        let err = compile_module(StageKind::Vertex, src).unwrap_err();
        let Error::Compile { stage, log } = err else { panic!("compile error expected") };
        assert_eq!(stage, StageKind::Vertex);
        assert!(log.contains("@builtin(position)"), "{log}");
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let err = compile_module(StageKind::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        match err {
            Error::Compile { stage, log } => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(!log.trim().is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_is_caught_by_validation() {
        let src = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                let x: f32 = 1;
                return vec4<f32>(x, 0.0, 0.0, true);
            }
        "#;
        let err = compile_module(StageKind::Fragment, src).unwrap_err();
        assert!(matches!(err, Error::Compile { stage: StageKind::Fragment, ref log } if !log.is_empty()));
    }

    #[test]
    fn wrong_stage_kind_is_a_compile_error() {
        let err = compile_module(StageKind::Fragment, VS).unwrap_err();
        let Error::Compile { log, .. } = err else { panic!("compile error expected") };
        assert!(log.contains("no @fragment entry point"));
    }

    #[test]
    fn storage_buffers_are_rejected() {
        let src = r#"
            @group(0) @binding(0) var<storage, read> data: array<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(data[0]);
            }
        "#;
        let err = compile_module(StageKind::Fragment, src).unwrap_err();
        let Error::Compile { log, .. } = err else { panic!("compile error expected") };
        assert!(log.contains("`data`"));
    }
}
