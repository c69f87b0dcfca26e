//! Window + platform events.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer.
//! Escape or a close request sets the stop flag.

mod platform;

pub use platform::{Platform, WindowConfig};
