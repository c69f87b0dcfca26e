use std::cell::RefCell;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::error::{Error, Result};
use crate::geometry::VertexLayout;
use crate::render::RenderCtx;
use crate::texture::TextureSlots;

use super::link::{link_interfaces, ProgramInterface};
use super::reflect::ResourceKind;
use super::source::ShaderSource;
use super::stage::{CompiledStage, StageKind};
use super::uniform::{UniformStorage, UniformValue, UniformWrite};

struct CachedPipeline {
    layout: VertexLayout,
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
}

/// A linked vertex + fragment program.
///
/// Owns the executable shader modules, bind group layouts and one uniform
/// buffer per `var<uniform>`. Pipelines are built lazily for each vertex
/// layout the program is drawn with.
///
/// The two `wgpu::ShaderModule`s are the program's executable code, not
/// compile-stage handles: the `CompiledStage`s are gone once linking returns.
pub struct ShaderProgram {
    label: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    interface: ProgramInterface,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    /// Parallel to `UniformStorage::blocks`.
    uniform_buffers: Vec<wgpu::Buffer>,
    uniforms: RefCell<UniformStorage>,
    pipelines: RefCell<Vec<CachedPipeline>>,
}

impl ShaderProgram {
    /// Links two compiled stages.
    ///
    /// Both stages are consumed; they are released when this returns,
    /// successful or not.
    pub fn link(ctx: &RenderCtx<'_>, vertex: CompiledStage, fragment: CompiledStage) -> Result<Self> {
        let interface = link_interfaces(&vertex.module, &fragment.module)?;
        let label = format!(
            "lumen program {}/{}",
            interface.vertex_entry, interface.fragment_entry
        );

        let group_count = interface.max_group().map_or(0, |g| g + 1);
        let bind_group_layouts: Vec<_> = (0..group_count)
            .map(|group| {
                let entries: Vec<_> = interface
                    .resources_in_group(group)
                    .map(|(_, r)| wgpu::BindGroupLayoutEntry {
                        binding: r.resource.binding,
                        visibility: r.visibility(),
                        ty: binding_type(&r.resource.kind),
                        count: None,
                    })
                    .collect();
                ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{label} group {group}")),
                    entries: &entries,
                })
            })
            .collect();

        let layout_refs: Vec<_> = bind_group_layouts.iter().collect();
        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let uniforms = UniformStorage::new(&interface);
        let uniform_buffers = uniforms
            .blocks()
            .iter()
            .map(|block| {
                let name = &interface.resources[block.resource].resource.name;
                ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} uniform `{name}`")),
                    contents: &block.bytes,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            })
            .collect();

        log::info!(
            "linked {label}: {} vertex inputs, {} bindings in {group_count} groups",
            interface.vertex_inputs.len(),
            interface.resources.len()
        );

        Ok(Self {
            label,
            vertex_module: vertex.gpu,
            fragment_module: fragment.gpu,
            interface,
            bind_group_layouts,
            pipeline_layout,
            uniform_buffers,
            uniforms: RefCell::new(uniforms),
            pipelines: RefCell::new(Vec::new()),
        })
    }

    /// Compiles both stages of `source` and links them.
    pub fn from_source(ctx: &RenderCtx<'_>, source: &ShaderSource) -> Result<Self> {
        let vertex = CompiledStage::compile(ctx, StageKind::Vertex, source.vertex())?;
        let fragment = CompiledStage::compile(ctx, StageKind::Fragment, source.fragment())?;
        Self::link(ctx, vertex, fragment)
    }

    /// Stages a uniform write for the next draw.
    ///
    /// Unknown names are a no-op. For texture and sampler names an integer
    /// selects the texture slot the binding reads.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> UniformWrite {
        self.uniforms.borrow_mut().set(name, value.into())
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the pipeline for `layout` and `format`, building it on first use.
    pub(crate) fn pipeline_for(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layout: &VertexLayout,
    ) -> Result<wgpu::RenderPipeline> {
        if let Some(cached) = self
            .pipelines
            .borrow()
            .iter()
            .find(|p| p.format == format && p.layout == *layout)
        {
            return Ok(cached.pipeline.clone());
        }

        self.interface.check_vertex_layout(layout)?;

        let attributes = layout.wgpu_attributes();
        // Device-side validation failures become `Error::Link`.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(&self.interface.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(&self.interface.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(Error::Link {
                log: format!("{} was rejected by the device: {err}", self.label),
            });
        }

        log::debug!("built pipeline for {} ({:?}, stride {})", self.label, format, layout.stride());

        self.pipelines.borrow_mut().push(CachedPipeline {
            layout: layout.clone(),
            format,
            pipeline: pipeline.clone(),
        });
        Ok(pipeline)
    }

    /// Writes uniform blocks changed since the last upload.
    pub(crate) fn upload_uniforms(&self, queue: &wgpu::Queue) {
        let mut uniforms = self.uniforms.borrow_mut();
        for (block, bytes) in uniforms.take_dirty() {
            queue.write_buffer(&self.uniform_buffers[block], 0, bytes);
        }
    }

    /// Builds one bind group per group index, resolving textures through `slots`.
    pub(crate) fn bind_groups(
        &self,
        device: &wgpu::Device,
        slots: &TextureSlots<'_>,
    ) -> Result<Vec<wgpu::BindGroup>> {
        let uniforms = self.uniforms.borrow();

        self.bind_group_layouts
            .iter()
            .enumerate()
            .map(|(group, bgl)| -> Result<wgpu::BindGroup> {
                let mut entries = Vec::new();
                for (index, r) in self.interface.resources_in_group(group as u32) {
                    let resource = match &r.resource.kind {
                        ResourceKind::Uniform { .. } => {
                            let block = uniforms
                                .blocks()
                                .iter()
                                .position(|b| b.resource == index)
                                .ok_or_else(|| {
                                    Error::frame(format!("uniform `{}` has no buffer", r.resource.name))
                                })?;
                            self.uniform_buffers[block].as_entire_binding()
                        }
                        ResourceKind::Texture | ResourceKind::Sampler => {
                            let slot = uniforms.slot_for(index);
                            let texture = slots.get(slot).ok_or_else(|| {
                                Error::frame(format!(
                                    "`{}` reads texture slot {slot}, but no texture is bound there",
                                    r.resource.name
                                ))
                            })?;
                            if r.resource.kind == ResourceKind::Texture {
                                wgpu::BindingResource::TextureView(texture.view())
                            } else {
                                wgpu::BindingResource::Sampler(texture.sampler())
                            }
                        }
                    };
                    entries.push(wgpu::BindGroupEntry {
                        binding: r.resource.binding,
                        resource,
                    });
                }

                Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} group {group}", self.label)),
                    layout: bgl,
                    entries: &entries,
                }))
            })
            .collect()
    }
}

fn binding_type(kind: &ResourceKind) -> wgpu::BindingType {
    match kind {
        ResourceKind::Uniform { size, .. } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(*size as u64),
        },
        ResourceKind::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        ResourceKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    }
}
