use crate::error::Result;
use crate::geometry::DrawGeometry;
use crate::paint::Color;
use crate::time::{FrameClock, FrameTime};

use super::{FrameSource, RenderBackend};

/// Draws one program with one geometry per frame.
///
/// Holds references only; the program, geometry and textures are owned by
/// the caller and must outlive the loop.
pub struct RenderLoop<'r, P, G, T> {
    program: &'r P,
    geometry: &'r G,
    textures: Vec<(u32, &'r T)>,
    clear_color: Color,
}

impl<'r, P, G: DrawGeometry, T> RenderLoop<'r, P, G, T> {
    pub fn new(program: &'r P, geometry: &'r G) -> Self {
        Self {
            program,
            geometry,
            textures: Vec::new(),
            clear_color: Color::SLATE,
        }
    }

    /// Binds `texture` to `slot` at the start of every frame.
    pub fn with_texture(mut self, slot: u32, texture: &'r T) -> Self {
        self.textures.retain(|(s, _)| *s != slot);
        self.textures.push((slot, texture));
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Renders and presents one frame.
    ///
    /// Order: clear, bind textures, use program, bind geometry, draw, present.
    pub fn frame<B>(&self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend<'r, Program = P, Geometry = G, Texture = T>,
    {
        backend.clear(self.clear_color);
        for &(slot, texture) in &self.textures {
            backend.bind_texture(slot, texture)?;
        }
        backend.use_program(self.program);
        backend.bind_geometry(self.geometry);
        backend.draw(self.geometry.draw_count())?;
        backend.present()
    }

    /// Runs frames until `source` reports the stop signal.
    ///
    /// `on_frame` runs before each frame is recorded, e.g. to update uniforms.
    /// Returns the number of presented frames.
    pub fn run<S, F>(&self, source: &mut S, mut on_frame: F) -> Result<u64>
    where
        S: FrameSource<'r, Program = P, Geometry = G, Texture = T>,
        F: FnMut(&FrameTime),
    {
        let mut clock = FrameClock::new();
        let mut presented = 0u64;

        while let Some(mut frame) = source.next_frame()? {
            let time = clock.tick();
            on_frame(&time);
            self.frame(&mut frame)?;
            presented += 1;
        }

        log::info!("render loop stopped after {presented} frames");
        Ok(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geometry::{Mesh, VertexLayout};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear(Color),
        BindTexture(u32, &'static str),
        UseProgram(&'static str),
        BindGeometry(u32),
        Draw(u32),
        Present,
    }

    struct Program(&'static str);
    struct Tex(&'static str);

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_present: bool,
    }

    impl<'r> RenderBackend<'r> for Recorder {
        type Program = Program;
        type Geometry = Mesh;
        type Texture = Tex;

        fn clear(&mut self, color: Color) {
            self.calls.push(Call::Clear(color));
        }

        fn bind_texture(&mut self, slot: u32, texture: &'r Tex) -> Result<()> {
            self.calls.push(Call::BindTexture(slot, texture.0));
            Ok(())
        }

        fn use_program(&mut self, program: &'r Program) {
            self.calls.push(Call::UseProgram(program.0));
        }

        fn bind_geometry(&mut self, geometry: &'r Mesh) {
            self.calls.push(Call::BindGeometry(geometry.vertex_count()));
        }

        fn draw(&mut self, count: u32) -> Result<()> {
            self.calls.push(Call::Draw(count));
            Ok(())
        }

        fn present(&mut self) -> Result<()> {
            if self.fail_present {
                return Err(Error::frame("surface lost"));
            }
            self.calls.push(Call::Present);
            Ok(())
        }
    }

    /// Hands out `remaining` frames that all record into one shared log.
    struct Frames {
        remaining: u32,
        recorder: Recorder,
    }

    struct FrameRef<'a>(&'a mut Recorder);

    impl<'r> RenderBackend<'r> for FrameRef<'_> {
        type Program = Program;
        type Geometry = Mesh;
        type Texture = Tex;

        fn clear(&mut self, color: Color) {
            self.0.clear(color)
        }
        fn bind_texture(&mut self, slot: u32, texture: &'r Tex) -> Result<()> {
            self.0.bind_texture(slot, texture)
        }
        fn use_program(&mut self, program: &'r Program) {
            self.0.use_program(program)
        }
        fn bind_geometry(&mut self, geometry: &'r Mesh) {
            self.0.bind_geometry(geometry)
        }
        fn draw(&mut self, count: u32) -> Result<()> {
            self.0.draw(count)
        }
        fn present(&mut self) -> Result<()> {
            self.0.present()
        }
    }

    impl<'r> FrameSource<'r> for Frames {
        type Program = Program;
        type Geometry = Mesh;
        type Texture = Tex;
        type Frame<'f> = FrameRef<'f>;

        fn next_frame(&mut self) -> Result<Option<FrameRef<'_>>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(FrameRef(&mut self.recorder)))
        }
    }

    fn triangle() -> Mesh {
        let layout = VertexLayout::packed(&[(0, 3), (1, 3)]).unwrap();
        Mesh::new(vec![0.0; 18], layout, None).unwrap()
    }

    fn quad() -> Mesh {
        let layout = VertexLayout::packed(&[(0, 3), (1, 3), (2, 2)]).unwrap();
        Mesh::new(vec![0.0; 32], layout, Some(vec![0, 1, 3, 1, 2, 3])).unwrap()
    }

    // ── frame ordering ────────────────────────────────────────────────────

    #[test]
    fn frame_runs_steps_in_fixed_order() {
        let program = Program("basic");
        let mesh = triangle();
        let render = RenderLoop::<_, _, Tex>::new(&program, &mesh);

        let mut rec = Recorder::default();
        render.frame(&mut rec).unwrap();

        assert_eq!(
            rec.calls,
            [
                Call::Clear(Color::SLATE),
                Call::UseProgram("basic"),
                Call::BindGeometry(3),
                Call::Draw(3),
                Call::Present,
            ]
        );
    }

    #[test]
    fn textures_bind_before_program_and_draw_uses_index_count() {
        let program = Program("textured");
        let mesh = quad();
        let wall = Tex("wall");
        let render = RenderLoop::new(&program, &mesh)
            .with_texture(0, &wall)
            .with_clear_color(Color::BLACK);

        let mut rec = Recorder::default();
        render.frame(&mut rec).unwrap();

        assert_eq!(
            rec.calls,
            [
                Call::Clear(Color::BLACK),
                Call::BindTexture(0, "wall"),
                Call::UseProgram("textured"),
                Call::BindGeometry(4),
                Call::Draw(6),
                Call::Present,
            ]
        );
    }

    #[test]
    fn rebinding_a_slot_replaces_the_texture() {
        let program = Program("p");
        let mesh = triangle();
        let (a, b) = (Tex("a"), Tex("b"));
        let render = RenderLoop::new(&program, &mesh).with_texture(1, &a).with_texture(1, &b);

        let mut rec = Recorder::default();
        render.frame(&mut rec).unwrap();
        assert_eq!(rec.calls[1], Call::BindTexture(1, "b"));
        assert_eq!(rec.calls.iter().filter(|c| matches!(c, Call::BindTexture(..))).count(), 1);
    }

    #[test]
    fn present_failure_propagates() {
        let program = Program("p");
        let mesh = triangle();
        let render = RenderLoop::<_, _, Tex>::new(&program, &mesh);

        let mut rec = Recorder { fail_present: true, ..Recorder::default() };
        assert!(matches!(render.frame(&mut rec), Err(Error::Frame { .. })));
    }

    // ── run ───────────────────────────────────────────────────────────────

    #[test]
    fn run_stops_when_source_is_exhausted() {
        let program = Program("p");
        let mesh = triangle();
        let render = RenderLoop::<_, _, Tex>::new(&program, &mesh);

        let mut source = Frames { remaining: 3, recorder: Recorder::default() };
        let mut times = Vec::new();
        let presented = render.run(&mut source, |t| times.push(t.frame_index)).unwrap();

        assert_eq!(presented, 3);
        assert_eq!(times, [0, 1, 2]);
        let draws = source.recorder.calls.iter().filter(|c| matches!(c, Call::Draw(3))).count();
        assert_eq!(draws, 3);
    }

    #[test]
    fn run_with_immediate_stop_draws_nothing() {
        let program = Program("p");
        let mesh = triangle();
        let render = RenderLoop::<_, _, Tex>::new(&program, &mesh);

        let mut source = Frames { remaining: 0, recorder: Recorder::default() };
        assert_eq!(render.run(&mut source, |_| {}).unwrap(), 0);
        assert!(source.recorder.calls.is_empty());
    }
}
