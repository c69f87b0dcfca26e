//! Vertex data of the demo scenes.

use lumen_engine::Result;
use lumen_engine::geometry::{Mesh, VertexLayout};

/// Position (xyz) + color (rgb), 24-byte stride.
#[rustfmt::skip]
const TRIANGLE_VERTICES: [f32; 18] = [
     0.5, -0.5, 0.0,   1.0, 0.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,   0.0, 1.0, 0.0, // bottom left
     0.0,  0.5, 0.0,   0.0, 0.0, 1.0, // top
];

/// Position (xyz) + color (rgb) + uv, 32-byte stride.
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 32] = [
     0.5,  0.5, 0.0,   1.0, 0.0, 0.0,   1.0, 0.0, // top right
     0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 1.0, // bottom right
    -0.5, -0.5, 0.0,   0.0, 0.0, 1.0,   0.0, 1.0, // bottom left
    -0.5,  0.5, 0.0,   1.0, 1.0, 0.0,   0.0, 0.0, // top left
];

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

pub fn triangle() -> Result<Mesh> {
    let layout = VertexLayout::packed(&[(0, 3), (1, 3)])?;
    Mesh::new(TRIANGLE_VERTICES.to_vec(), layout, None)
}

pub fn quad() -> Result<Mesh> {
    let layout = VertexLayout::packed(&[(0, 3), (1, 3), (2, 2)])?;
    Mesh::new(QUAD_VERTICES.to_vec(), layout, Some(QUAD_INDICES.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_engine::geometry::DrawGeometry;

    #[test]
    fn triangle_draws_three_vertices() {
        let mesh = triangle().unwrap();
        assert_eq!(mesh.layout().stride(), 24);
        assert_eq!(mesh.draw_count(), 3);
    }

    #[test]
    fn quad_draws_two_indexed_triangles() {
        let mesh = quad().unwrap();
        assert_eq!(mesh.layout().stride(), 32);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.draw_count(), 6);
    }
}
