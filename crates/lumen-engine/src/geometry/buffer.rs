use wgpu::util::DeviceExt;

use crate::error::Result;
use crate::render::RenderCtx;

use super::{DrawGeometry, Mesh, VertexLayout};

/// Static vertex (and optional `u32` index) buffer on the GPU.
///
/// Uploaded once at creation; the CPU copy is not retained.
pub struct GeometryBuffer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    layout: VertexLayout,
    vertex_count: u32,
    draw_count: u32,
}

impl GeometryBuffer {
    /// Uploads a validated mesh.
    pub fn create(ctx: &RenderCtx<'_>, mesh: &Mesh) -> Result<Self> {
        mesh.layout().validate()?;

        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen vertex buffer"),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = mesh.index_bytes().map(|contents| {
            ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen index buffer"),
                contents,
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        log::debug!(
            "uploaded geometry: {} vertices x {} bytes{}",
            mesh.vertex_count(),
            mesh.layout().stride(),
            match mesh.indices() {
                Some(i) => format!(", {} indices", i.len()),
                None => String::new(),
            }
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            layout: mesh.layout().clone(),
            vertex_count: mesh.vertex_count(),
            draw_count: mesh.draw_count(),
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Binds the buffers on `rpass` and issues one draw of `count` elements.
    pub(crate) fn record(&self, rpass: &mut wgpu::RenderPass<'_>, count: u32) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..count, 0, 0..1);
            }
            None => rpass.draw(0..count, 0..1),
        }
    }
}

impl DrawGeometry for GeometryBuffer {
    fn draw_count(&self) -> u32 {
        self.draw_count
    }

    fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}
