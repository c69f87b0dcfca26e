use winit::window::Window;

use crate::device::{Gpu, GpuFrame};
use crate::error::{Error, Result};
use crate::geometry::GeometryBuffer;
use crate::paint::Color;
use crate::shader::ShaderProgram;
use crate::texture::{Texture, TextureSlots};

use super::RenderBackend;

/// One acquired swapchain image being rendered with wgpu.
///
/// Each `draw` records its own render pass. A pending `clear` becomes the
/// load operation of the next pass, or of a clear-only pass at `present`.
pub struct WgpuFrame<'f, 'r> {
    window: &'f Window,
    gpu: &'f Gpu<'f>,
    frame: Option<GpuFrame>,

    clear: Option<Color>,
    textures: TextureSlots<'r>,
    program: Option<&'r ShaderProgram>,
    geometry: Option<&'r GeometryBuffer>,
}

impl<'f, 'r> WgpuFrame<'f, 'r> {
    pub(crate) fn new(window: &'f Window, gpu: &'f Gpu<'f>, frame: GpuFrame) -> Self {
        Self {
            window,
            gpu,
            frame: Some(frame),
            clear: None,
            textures: TextureSlots::new(),
            program: None,
            geometry: None,
        }
    }

    fn gpu_frame(&mut self) -> Result<&mut GpuFrame> {
        self.frame
            .as_mut()
            .ok_or_else(|| Error::frame("frame was already presented"))
    }

    fn begin_pass<'p>(
        frame: &'p mut GpuFrame,
        clear: Option<Color>,
        label: &'static str,
    ) -> wgpu::RenderPass<'p> {
        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };

        frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

impl<'f, 'r> RenderBackend<'r> for WgpuFrame<'f, 'r> {
    type Program = ShaderProgram;
    type Geometry = GeometryBuffer;
    type Texture = Texture;

    fn clear(&mut self, color: Color) {
        self.clear = Some(color);
    }

    fn bind_texture(&mut self, slot: u32, texture: &'r Texture) -> Result<()> {
        self.textures.bind(slot, texture)
    }

    fn use_program(&mut self, program: &'r ShaderProgram) {
        self.program = Some(program);
    }

    fn bind_geometry(&mut self, geometry: &'r GeometryBuffer) {
        self.geometry = Some(geometry);
    }

    fn draw(&mut self, count: u32) -> Result<()> {
        let program = self
            .program
            .ok_or_else(|| Error::frame("draw without a program in use"))?;
        let geometry = self
            .geometry
            .ok_or_else(|| Error::frame("draw without bound geometry"))?;

        let device = self.gpu.device();
        let pipeline = program.pipeline_for(device, self.gpu.surface_format(), geometry.layout())?;
        program.upload_uniforms(self.gpu.queue());
        let bind_groups = program.bind_groups(device, &self.textures)?;

        let size = self.gpu.size();
        let clear = self.clear.take();
        let frame = self.gpu_frame()?;

        let mut rpass = Self::begin_pass(frame, clear, "lumen draw pass");
        rpass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);
        rpass.set_pipeline(&pipeline);
        for (index, group) in bind_groups.iter().enumerate() {
            rpass.set_bind_group(index as u32, group, &[]);
        }
        geometry.record(&mut rpass, count);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        if let Some(color) = self.clear.take() {
            let frame = self.gpu_frame()?;
            drop(Self::begin_pass(frame, Some(color), "lumen clear pass"));
        }

        let frame = self
            .frame
            .take()
            .ok_or_else(|| Error::frame("frame was already presented"))?;

        self.window.pre_present_notify();
        self.gpu.present(frame);
        Ok(())
    }
}
