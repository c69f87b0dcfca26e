//! Frame rendering.
//!
//! `RenderBackend` is the explicit binding state of one frame; `WgpuFrame`
//! implements it on a swapchain image. `RenderLoop` drives a backend in a
//! fixed order each frame.
//!
//! Convention:
//! - One render pass per draw; state is re-established every time.
//! - Clip space follows wgpu: +Y up, depth in `[0, 1]`.

mod backend;
mod ctx;
mod frame;
mod render_loop;

pub use backend::{FrameSource, RenderBackend};
pub use ctx::RenderCtx;
pub use frame::WgpuFrame;
pub use render_loop::RenderLoop;
