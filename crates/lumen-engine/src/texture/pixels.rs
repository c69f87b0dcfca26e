use crate::error::{Error, Result};

/// Channel layout of 8-bit source pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> u32 {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Decoded 8-bit pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelData {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
}

impl PixelData {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, layout: ChannelLayout) -> Self {
        Self { bytes, width, height, layout }
    }

    /// Checks that the data is present and matches its declared size.
    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(Error::decode_input("pixel data is empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::decode_input(format!(
                "image has zero size ({}x{})",
                self.width, self.height
            )));
        }
        let expected = self.width as u64 * self.height as u64 * self.layout.channels() as u64;
        if self.bytes.len() as u64 != expected {
            return Err(Error::decode_input(format!(
                "{}x{} {:?} image needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.layout,
                self.bytes.len()
            )));
        }
        Ok(())
    }

    /// Checks that both sides fit a device limit such as
    /// `max_texture_dimension_2d`.
    pub fn check_extent(&self, max_dimension: u32) -> Result<()> {
        if self.width > max_dimension || self.height > max_dimension {
            return Err(Error::decode_input(format!(
                "{}x{} image exceeds the device texture limit of {max_dimension} texels per side",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Validates and expands the pixels to RGBA8, consuming the source buffer.
    ///
    /// Gray is replicated into RGB; missing alpha becomes opaque.
    pub fn into_rgba8(self) -> Result<Vec<u8>> {
        self.validate()?;
        let Self { bytes, layout, .. } = self;

        let rgba = match layout {
            ChannelLayout::Rgba => bytes,
            ChannelLayout::Rgb => bytes.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
            ChannelLayout::GrayAlpha => bytes.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
            ChannelLayout::Gray => bytes.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        };
        Ok(rgba)
    }
}

/// One RGBA8 mip level.
#[derive(Debug, Clone, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Expands `pixels` to RGBA8 and, when `mipmaps` is set, appends the full
/// chain down to 1x1.
///
/// All validation happens here, before anything reaches the GPU.
pub fn build_levels(pixels: PixelData, mipmaps: bool) -> Result<Vec<MipLevel>> {
    let (width, height) = (pixels.width, pixels.height);
    let base = MipLevel { width, height, bytes: pixels.into_rgba8()? };

    let mut levels = vec![base];
    if mipmaps {
        while let Some(next) = levels.last().and_then(downsample) {
            levels.push(next);
        }
    }
    Ok(levels)
}

/// 2x2 box filter. Odd edges reuse the last row/column. `None` at 1x1.
fn downsample(level: &MipLevel) -> Option<MipLevel> {
    if level.width == 1 && level.height == 1 {
        return None;
    }
    let (w, h) = (level.width as usize, level.height as usize);
    let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));

    let texel = |x: usize, y: usize, c: usize| level.bytes[(y.min(h - 1) * w + x.min(w - 1)) * 4 + c] as u32;

    let mut bytes = Vec::with_capacity(nw * nh * 4);
    for y in 0..nh {
        for x in 0..nw {
            let (sx, sy) = (x * 2, y * 2);
            for c in 0..4 {
                let sum = texel(sx, sy, c) + texel(sx + 1, sy, c) + texel(sx, sy + 1, c) + texel(sx + 1, sy + 1, c);
                bytes.push(((sum + 2) / 4) as u8);
            }
        }
    }

    Some(MipLevel { width: nw as u32, height: nh as u32, bytes })
}
