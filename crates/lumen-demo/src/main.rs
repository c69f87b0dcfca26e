mod config;
mod scenes;

use anyhow::{Context, Result};

use lumen_engine::device::GpuInit;
use lumen_engine::geometry::GeometryBuffer;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::paint::Color;
use lumen_engine::render::RenderLoop;
use lumen_engine::shader::{ShaderProgram, ShaderSource};
use lumen_engine::texture::{decode_image, Texture, TextureOptions};
use lumen_engine::window::{Platform, WindowConfig};

use config::{DemoConfig, Scene};

/// Texture slot the textured scene samples from.
const DIFFUSE_SLOT: u32 = 0;

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = DemoConfig::from_env()?;
    log::info!("scene `{}`, assets in `{}`", config.scene, config.assets.display());

    // Input files are read before the window opens.
    let (vs_path, fs_path) = config.shader_paths();
    let source = ShaderSource::load(&vs_path, &fs_path)?;

    let (mesh, pixels) = match config.scene {
        Scene::Triangle => (scenes::triangle()?, None),
        Scene::Textured => {
            let path = config.texture_path();
            let pixels = decode_image(&path).with_context(|| format!("loading texture for `{}`", config.scene))?;
            (scenes::quad()?, Some(pixels))
        }
    };

    let mut platform = Platform::open(
        WindowConfig {
            title: format!("lumen - {}", config.scene),
            ..WindowConfig::default()
        },
        GpuInit::default(),
    )?;

    let (program, geometry, texture) = {
        let ctx = platform.render_ctx()?;
        let program = ShaderProgram::from_source(&ctx, &source)
            .with_context(|| format!("building `{}` shader program", config.scene))?;
        let geometry = GeometryBuffer::create(&ctx, &mesh)?;
        let texture = pixels
            .map(|p| Texture::upload(&ctx, p, TextureOptions::default()))
            .transpose()?;
        (program, geometry, texture)
    };

    let mut render = RenderLoop::new(&program, &geometry).with_clear_color(Color::SLATE);
    if let Some(texture) = &texture {
        log::info!(
            "texture {}x{} ({} source channels, {} mip levels) on slot {DIFFUSE_SLOT}",
            texture.width(),
            texture.height(),
            texture.channels(),
            texture.mip_levels()
        );
        program.set_uniform("diffuse", DIFFUSE_SLOT as i32);
        render = render.with_texture(DIFFUSE_SLOT, texture);
    }

    let frames = render.run(&mut platform, |time| {
        program.set_uniform("time", time.elapsed);
    })?;

    log::info!("exiting after {frames} frames");
    Ok(())
}
