//! Frame timing.
//!
//! One `FrameClock` per render loop; `RenderLoop::run` ticks it once per frame
//! and passes the snapshot to the per-frame callback.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
