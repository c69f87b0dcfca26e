/// Texel filter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

/// Addressing outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Sampling and storage options for a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureOptions {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    /// Filter between mip levels; ignored when `mipmaps` is off.
    pub mip_filter: Filter,
    pub wrap_u: Wrap,
    pub wrap_v: Wrap,
    pub mipmaps: bool,
    /// Treat texel data as sRGB-encoded color.
    pub srgb: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mip_filter: Filter::Linear,
            wrap_u: Wrap::Repeat,
            wrap_v: Wrap::Repeat,
            mipmaps: true,
            srgb: true,
        }
    }
}

impl TextureOptions {
    /// Nearest filtering without mipmaps, for pixel art and lookup tables.
    pub fn pixelated() -> Self {
        Self {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            mip_filter: Filter::Nearest,
            mipmaps: false,
            ..Self::default()
        }
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    pub(crate) fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some("lumen texture sampler"),
            address_mode_u: self.wrap_u.address_mode(),
            address_mode_v: self.wrap_v.address_mode(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.mag_filter.filter_mode(),
            min_filter: self.min_filter.filter_mode(),
            mipmap_filter: match (self.mipmaps, self.mip_filter) {
                (true, Filter::Linear) => wgpu::MipmapFilterMode::Linear,
                _ => wgpu::MipmapFilterMode::Nearest,
            },
            ..Default::default()
        }
    }
}

impl Filter {
    fn filter_mode(self) -> wgpu::FilterMode {
        match self {
            Self::Nearest => wgpu::FilterMode::Nearest,
            Self::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl Wrap {
    fn address_mode(self) -> wgpu::AddressMode {
        match self {
            Self::Repeat => wgpu::AddressMode::Repeat,
            Self::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            Self::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_repeat_linear_mipmapped_srgb() {
        let o = TextureOptions::default();
        assert_eq!((o.wrap_u, o.wrap_v), (Wrap::Repeat, Wrap::Repeat));
        assert_eq!((o.min_filter, o.mag_filter), (Filter::Linear, Filter::Linear));
        assert!(o.mipmaps && o.srgb);
        assert_eq!(o.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn sampler_maps_options() {
        let o = TextureOptions { wrap_v: Wrap::ClampToEdge, ..TextureOptions::pixelated() };
        let desc = o.sampler_descriptor();
        assert_eq!(desc.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(desc.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.mipmap_filter, wgpu::MipmapFilterMode::Nearest);
    }
}
