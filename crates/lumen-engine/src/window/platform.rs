use std::time::Duration;

use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::error::{Error, Result};
use crate::geometry::GeometryBuffer;
use crate::render::{FrameSource, RenderCtx, WgpuFrame};
use crate::shader::ShaderProgram;
use crate::texture::Texture;

/// Poll interval while the window is minimized.
const IDLE_WAIT: Duration = Duration::from_millis(16);

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct PlatformState {
    config: WindowConfig,
    gpu_init: GpuInit,

    entry: Option<WindowEntry>,
    init_error: Option<Error>,
    stop_requested: bool,
}

impl PlatformState {
    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::context_init(format!("failed to create window: {e}")))?;

        let gpu_init = self.gpu_init.clone();
        WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_gpu_mut(|gpu| gpu.resize(size));
        }
    }
}

impl ApplicationHandler for PlatformState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.init_error.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Poll);

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                log::info!("window `{}` opened", self.config.title);
                self.entry = Some(entry);
            }
            Err(e) => {
                self.init_error = Some(e);
                self.stop_requested = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::debug!("close requested");
                self.stop_requested = true;
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::debug!("escape pressed");
                self.stop_requested = true;
            }

            WindowEvent::Resized(size) => self.resize(size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.borrow_window().inner_size()) {
                    self.resize(size);
                }
            }

            _ => {}
        }
    }
}

/// The window, its GPU context and the stop flag.
///
/// Events are pumped from `next_frame`, so the caller keeps control of the
/// loop instead of handing it to winit.
pub struct Platform {
    // Dropped before the event loop.
    state: PlatformState,
    event_loop: EventLoop<()>,
}

impl Platform {
    /// Opens the window and initializes the GPU for it.
    pub fn open(config: WindowConfig, gpu_init: GpuInit) -> Result<Self> {
        let mut event_loop = EventLoop::new()
            .map_err(|e| Error::context_init(format!("failed to create event loop: {e}")))?;

        let mut state = PlatformState {
            config,
            gpu_init,
            entry: None,
            init_error: None,
            stop_requested: false,
        };

        while state.entry.is_none() {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut state);
            if let Some(err) = state.init_error.take() {
                return Err(err);
            }
            if let PumpStatus::Exit(code) = status {
                return Err(Error::context_init(format!(
                    "event loop exited with code {code} before the window opened"
                )));
            }
        }

        Ok(Self { state, event_loop })
    }

    fn entry(&self) -> Result<&WindowEntry> {
        self.state
            .entry
            .as_ref()
            .ok_or_else(|| Error::context_init("window is not open"))
    }

    /// Device context for creating programs, buffers and textures.
    pub fn render_ctx(&self) -> Result<RenderCtx<'_>> {
        Ok(self.entry()?.borrow_gpu().render_ctx())
    }

    fn pump(&mut self, timeout: Duration) {
        if let PumpStatus::Exit(_) = self.event_loop.pump_app_events(Some(timeout), &mut self.state) {
            self.state.stop_requested = true;
        }
    }
}

impl<'r> FrameSource<'r> for Platform {
    type Program = ShaderProgram;
    type Geometry = GeometryBuffer;
    type Texture = Texture;
    type Frame<'f>
        = WgpuFrame<'f, 'r>
    where
        Self: 'f;

    fn next_frame(&mut self) -> Result<Option<WgpuFrame<'_, 'r>>> {
        let mut timeout = Duration::ZERO;
        loop {
            self.pump(timeout);
            if self.state.stop_requested {
                return Ok(None);
            }
            let Some(entry) = self.state.entry.as_mut() else {
                return Ok(None);
            };

            let size = entry.borrow_gpu().size();
            if size.width == 0 || size.height == 0 {
                timeout = IDLE_WAIT;
                continue;
            }
            timeout = Duration::ZERO;

            let acquired = entry.with_gpu_mut(|gpu| match gpu.begin_frame() {
                Ok(frame) => Ok(Some(frame)),
                Err(err) => match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(None),
                    SurfaceErrorAction::Fatal => Err(Error::frame("surface ran out of memory")),
                },
            })?;

            if let Some(frame) = acquired {
                let entry = self.entry()?;
                return Ok(Some(WgpuFrame::new(entry.borrow_window(), entry.borrow_gpu(), frame)));
            }
        }
    }
}
