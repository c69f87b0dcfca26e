//! Vertex layouts, CPU meshes and static GPU geometry buffers.
//!
//! Vertices are interleaved `f32` data; topology is always a triangle list.

mod buffer;
mod layout;
mod mesh;

pub use buffer::GeometryBuffer;
pub use layout::{VertexAttribute, VertexLayout};
pub use mesh::{DrawGeometry, Mesh};
