use crate::error::{Error, Result};

use super::VertexLayout;

/// Geometry that can be drawn with a single triangle-list call.
pub trait DrawGeometry {
    /// Elements consumed by one draw: indices when indexed, vertices otherwise.
    fn draw_count(&self) -> u32;

    fn is_indexed(&self) -> bool;
}

/// Validated CPU-side vertex data, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
    layout: VertexLayout,
    indices: Option<Vec<u32>>,
}

impl Mesh {
    /// Checks `vertices` against `layout` and every index against the vertex count.
    pub fn new(vertices: Vec<f32>, layout: VertexLayout, indices: Option<Vec<u32>>) -> Result<Self> {
        layout.validate()?;

        let byte_len = vertices.len() * std::mem::size_of::<f32>();
        let stride = layout.stride() as usize;
        if byte_len == 0 {
            return Err(Error::layout("vertex data is empty"));
        }
        if byte_len % stride != 0 {
            return Err(Error::layout(format!(
                "vertex data is {byte_len} bytes, not a multiple of the {stride}-byte stride"
            )));
        }

        let vertex_count = byte_len / stride;
        if let Some(indices) = &indices {
            if indices.is_empty() {
                return Err(Error::layout("index list is empty"));
            }
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::layout(format!(
                    "index {bad} is out of range for {vertex_count} vertices"
                )));
            }
        }

        Ok(Self { vertices, layout, indices })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / self.layout.floats_per_vertex()) as u32
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub(crate) fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub(crate) fn index_bytes(&self) -> Option<&[u8]> {
        self.indices.as_deref().map(bytemuck::cast_slice)
    }
}

impl DrawGeometry for Mesh {
    fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertex_count(),
        }
    }

    fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}
