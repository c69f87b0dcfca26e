//! Color representation used for render-target clears.

pub mod color;

pub use color::Color;
