use crate::error::Result;
use crate::render::RenderCtx;

use super::pixels::build_levels;
use super::{PixelData, TextureOptions};

/// A sampled 2D RGBA8 texture with its view and sampler.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    channels: u32,
}

impl Texture {
    /// Validates `pixels`, then allocates and fills the GPU texture.
    ///
    /// `pixels` is consumed; nothing is allocated on the GPU when it is
    /// inconsistent or larger than the device allows.
    pub fn upload(ctx: &RenderCtx<'_>, pixels: PixelData, options: TextureOptions) -> Result<Self> {
        pixels.check_extent(ctx.device.limits().max_texture_dimension_2d)?;
        let channels = pixels.layout.channels();
        let (width, height) = (pixels.width, pixels.height);
        let levels = build_levels(pixels, options.mipmaps)?;
        let mip_levels = levels.len() as u32;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: options.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.bytes,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(level.width * 4),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        drop(levels);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = ctx.device.create_sampler(&options.sampler_descriptor());

        log::debug!("uploaded texture {width}x{height} ({channels} channels, {mip_levels} mip levels)");

        Ok(Self {
            texture,
            view,
            sampler,
            channels,
        })
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Channel count of the source pixels (the GPU copy is always RGBA).
    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn mip_levels(&self) -> u32 {
        self.texture.mip_level_count()
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
