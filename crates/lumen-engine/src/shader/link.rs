use crate::error::{Error, Result};
use crate::geometry::VertexLayout;

use super::reflect::{Resource, Varying};
use super::stage::{StageKind, StageModule};

/// A resource of the linked program and the stages that read it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProgramResource {
    pub resource: Resource,
    pub vertex: bool,
    pub fragment: bool,
}

impl ProgramResource {
    pub(crate) fn visibility(&self) -> wgpu::ShaderStages {
        let mut stages = wgpu::ShaderStages::NONE;
        if self.vertex {
            stages |= StageKind::Vertex.visibility();
        }
        if self.fragment {
            stages |= StageKind::Fragment.visibility();
        }
        stages
    }
}

/// Combined interface of a vertex + fragment pair that links.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Per-vertex attributes the vertex stage consumes.
    pub vertex_inputs: Vec<Varying>,
    /// Union of both stages' bindings, sorted by `(group, binding)`.
    pub resources: Vec<ProgramResource>,
}

/// Checks that two stages fit together and merges their interfaces.
///
/// Varyings are matched by `@location`; names are only used in diagnostics.
/// Every problem found is reported, one per line, like a driver info log.
pub fn link_interfaces(vertex: &StageModule, fragment: &StageModule) -> Result<ProgramInterface> {
    let mut log = Vec::new();

    if vertex.kind != StageKind::Vertex {
        log.push(format!("expected a vertex stage, got a {} stage", vertex.kind));
    }
    if fragment.kind != StageKind::Fragment {
        log.push(format!("expected a fragment stage, got a {} stage", fragment.kind));
    }
    if !log.is_empty() {
        return Err(Error::Link { log: log.join("\n") });
    }

    let vs = &vertex.interface;
    let fs = &fragment.interface;

    for input in &fs.inputs {
        match vs.outputs.iter().find(|o| o.location == input.location) {
            None => log.push(format!(
                "fragment input `{}` at @location({}) is not written by the vertex stage",
                input.name, input.location
            )),
            Some(output) if output.ty != input.ty => log.push(format!(
                "varying @location({}) type mismatch: vertex writes `{}: {}`, fragment reads `{}: {}`",
                input.location, output.name, output.ty, input.name, input.ty
            )),
            Some(output)
                if output.interpolation != input.interpolation || output.sampling != input.sampling =>
            {
                log.push(format!(
                    "varying @location({}) interpolation mismatch: vertex writes `{}` as @interpolate({}), \
                     fragment reads `{}` as @interpolate({})",
                    input.location,
                    output.name,
                    output.qualifiers(),
                    input.name,
                    input.qualifiers()
                ))
            }
            Some(_) => {}
        }
    }

    match fs.outputs.as_slice() {
        [] => log.push(format!(
            "fragment stage `{}` writes no color output",
            fragment.entry_point
        )),
        [only] if only.location == 0 && only.ty.float_components().is_some() => {}
        [only] if only.location == 0 => log.push(format!(
            "color output `{}` must be f32-based for the float surface target",
            only.ty
        )),
        _ => log.push("fragment stage must write exactly one color output, at @location(0)".into()),
    }

    let resources = merge_resources(&vs.resources, &fs.resources, &mut log);

    if !log.is_empty() {
        return Err(Error::Link { log: log.join("\n") });
    }

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        vertex_inputs: vs.inputs.clone(),
        resources,
    })
}

fn merge_resources(
    vertex: &[Resource],
    fragment: &[Resource],
    log: &mut Vec<String>,
) -> Vec<ProgramResource> {
    let mut merged: Vec<ProgramResource> = vertex
        .iter()
        .map(|r| ProgramResource {
            resource: r.clone(),
            vertex: true,
            fragment: false,
        })
        .collect();

    for r in fragment {
        let same_slot = merged
            .iter_mut()
            .find(|m| m.resource.group == r.group && m.resource.binding == r.binding);

        match same_slot {
            Some(m) if m.resource == *r => m.fragment = true,
            Some(m) => log.push(format!(
                "binding conflict: vertex stage declares {}, fragment stage declares {}",
                m.resource.describe(),
                r.describe()
            )),
            None => {
                if let Some(m) = merged.iter().find(|m| m.resource.name == r.name) {
                    log.push(format!(
                        "`{}` is bound at different slots: vertex {}, fragment {}",
                        r.name,
                        m.resource.describe(),
                        r.describe()
                    ));
                }
                merged.push(ProgramResource {
                    resource: r.clone(),
                    vertex: false,
                    fragment: true,
                });
            }
        }
    }

    merged.sort_by_key(|m| (m.resource.group, m.resource.binding));
    merged
}

impl ProgramInterface {
    /// Verifies that `layout` supplies every attribute the vertex stage reads.
    ///
    /// Extra layout attributes are allowed; the pipeline simply never fetches them.
    pub fn check_vertex_layout(&self, layout: &VertexLayout) -> Result<()> {
        for input in &self.vertex_inputs {
            let Some(expected) = input.ty.float_components() else {
                return Err(Error::layout(format!(
                    "vertex input `{}: {}` at @location({}) is not a float attribute",
                    input.name, input.ty, input.location
                )));
            };
            match layout.attribute(input.location) {
                None => {
                    return Err(Error::layout(format!(
                        "vertex input `{}` at @location({}) has no attribute in the layout",
                        input.name, input.location
                    )));
                }
                Some(attr) if attr.components != expected => {
                    return Err(Error::layout(format!(
                        "vertex input `{}: {}` at @location({}) expects {expected} components, layout provides {}",
                        input.name, input.ty, input.location, attr.components
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub(crate) fn max_group(&self) -> Option<u32> {
        self.resources.iter().map(|r| r.resource.group).max()
    }

    pub(crate) fn resources_in_group(&self, group: u32) -> impl Iterator<Item = (usize, &ProgramResource)> {
        self.resources
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.resource.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::compile_module;

    const VS: &str = r#"
        struct VsOut {
            @builtin(position) clip: vec4<f32>,
            @location(0) color: vec3<f32>,
        };
        @group(0) @binding(0) var<uniform> offset: vec2<f32>;
        @vertex
        fn vs_main(@location(0) pos: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
            var out: VsOut;
            out.clip = vec4<f32>(pos.xy + offset, pos.z, 1.0);
            out.color = color;
            return out;
        }
    "#;

    const FS: &str = r#"
        @group(0) @binding(0) var<uniform> offset: vec2<f32>;
        @group(0) @binding(1) var<uniform> alpha: f32;
        @fragment
        fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(color + vec3<f32>(offset, 0.0), alpha);
        }
    "#;

    fn vs() -> StageModule {
        compile_module(StageKind::Vertex, VS).unwrap()
    }

    fn fs(src: &str) -> StageModule {
        compile_module(StageKind::Fragment, src).unwrap()
    }

    fn link_log(fs_src: &str) -> String {
        match link_interfaces(&vs(), &fs(fs_src)) {
            Err(Error::Link { log }) => log,
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn compatible_stages_link_and_share_resources() {
        let program = link_interfaces(&vs(), &fs(FS)).expect("links");

        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.vertex_inputs.len(), 2);

        let shared: Vec<_> = program
            .resources
            .iter()
            .map(|r| (r.resource.name.as_str(), r.vertex, r.fragment))
            .collect();
        assert_eq!(shared, [("offset", true, true), ("alpha", false, true)]);
        assert_eq!(
            program.resources[0].visibility(),
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT
        );
    }

    #[test]
    fn missing_varying_fails_to_link() {
        let log = link_log(
            r#"
            @fragment
            fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
            "#,
        );
        assert!(log.contains("`uv` at @location(3)"), "{log}");
    }

    #[test]
    fn varying_type_mismatch_names_both_sides() {
        let log = link_log(
            r#"
            @fragment
            fn fs_main(@location(0) tint: vec4<f32>) -> @location(0) vec4<f32> {
                return tint;
            }
            "#,
        );
        assert!(log.contains("vertex writes `color: vec3<f32>`"), "{log}");
        assert!(log.contains("fragment reads `tint: vec4<f32>`"), "{log}");
    }

    #[test]
    fn conflicting_binding_fails_to_link() {
        let log = link_log(
            r#"
            @group(0) @binding(0) var<uniform> offset: vec4<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return offset;
            }
            "#,
        );
        assert!(log.starts_with("binding conflict"), "{log}");
    }

    #[test]
    fn varying_interpolation_mismatch_fails_to_link() {
        let log = link_log(
            r#"
            @fragment
            fn fs_main(@location(0) @interpolate(flat) color: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 1.0);
            }
            "#,
        );
        assert!(log.contains("interpolation mismatch"), "{log}");
        assert!(log.contains("@interpolate(perspective, center)"), "{log}");
        assert!(log.contains("@interpolate(flat)"), "{log}");
    }

    #[test]
    fn integer_color_output_fails_to_link() {
        let log = link_log(
            r#"
            @fragment
            fn fs_main() -> @location(0) vec4<i32> {
                return vec4<i32>(1);
            }
            "#,
        );
        assert!(log.contains("`vec4<i32>` must be f32-based"), "{log}");
    }

    #[test]
    fn color_output_must_be_at_location_zero() {
        let log = link_log(
            r#"
            @fragment
            fn fs_main() -> @location(1) vec4<f32> {
                return vec4<f32>(1.0);
            }
            "#,
        );
        assert!(log.contains("exactly one color output"), "{log}");
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let Err(Error::Link { log }) = link_interfaces(&fs(FS), &vs()) else {
            panic!("expected link error");
        };
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn vertex_layout_must_cover_inputs() {
        let program = link_interfaces(&vs(), &fs(FS)).unwrap();

        let full = VertexLayout::packed(&[(0, 3), (1, 3)]).unwrap();
        assert!(program.check_vertex_layout(&full).is_ok());

        let with_extra = VertexLayout::packed(&[(0, 3), (1, 3), (2, 2)]).unwrap();
        assert!(program.check_vertex_layout(&with_extra).is_ok());

        let missing = VertexLayout::packed(&[(0, 3)]).unwrap();
        assert!(matches!(
            program.check_vertex_layout(&missing),
            Err(Error::LayoutMismatch { .. })
        ));

        let narrow = VertexLayout::packed(&[(0, 2), (1, 3)]).unwrap();
        assert!(matches!(
            program.check_vertex_layout(&narrow),
            Err(Error::LayoutMismatch { .. })
        ));
    }
}
