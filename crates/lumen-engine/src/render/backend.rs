use crate::error::Result;
use crate::geometry::DrawGeometry;
use crate::paint::Color;

/// Explicit binding state of one frame.
///
/// Every call replaces the corresponding piece of state entirely; nothing is
/// inherited from earlier frames.
pub trait RenderBackend<'r> {
    type Program;
    type Geometry: DrawGeometry;
    type Texture;

    /// Clears the color target.
    fn clear(&mut self, color: Color);

    fn bind_texture(&mut self, slot: u32, texture: &'r Self::Texture) -> Result<()>;

    fn use_program(&mut self, program: &'r Self::Program);

    fn bind_geometry(&mut self, geometry: &'r Self::Geometry);

    /// Draws `count` elements of the bound geometry with the bound program.
    fn draw(&mut self, count: u32) -> Result<()>;

    /// Finishes the frame and hands it to the display.
    fn present(&mut self) -> Result<()>;
}

/// Produces frames until the platform asks to stop.
pub trait FrameSource<'r> {
    type Program;
    type Geometry: DrawGeometry;
    type Texture;

    type Frame<'f>: RenderBackend<
            'r,
            Program = Self::Program,
            Geometry = Self::Geometry,
            Texture = Self::Texture,
        >
    where
        Self: 'f;

    /// Waits for the next frame. `None` once the stop signal is set.
    fn next_frame(&mut self) -> Result<Option<Self::Frame<'_>>>;
}
