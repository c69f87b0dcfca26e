//! Lumen engine crate.
//!
//! Loads and links WGSL shader programs, uploads static geometry and
//! textures, and draws them once per frame into a winit window via wgpu.

pub mod device;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod texture;
pub mod time;
pub mod window;

mod error;

pub use error::{Error, FileReadError, Result};
