use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

use super::{ChannelLayout, PixelData};

/// Decodes an image file (PNG, JPEG, BMP, PNM) into 8-bit pixels.
///
/// 8-bit gray, gray-alpha, RGB and RGBA images keep their layout; other
/// formats are converted to RGBA.
pub fn decode_image(path: impl AsRef<Path>) -> Result<PixelData> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| Error::decode_input(format!("failed to decode `{}`: {e}", path.display())))?;

    let (width, height) = (image.width(), image.height());
    let (bytes, layout) = match image {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), ChannelLayout::Gray),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), ChannelLayout::GrayAlpha),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), ChannelLayout::Rgb),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), ChannelLayout::Rgba),
        other => (other.into_rgba8().into_raw(), ChannelLayout::Rgba),
    };

    log::debug!("decoded `{}`: {width}x{height} {layout:?}", path.display());
    Ok(PixelData::new(bytes, width, height, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ascii_ppm_decodes_as_rgb() {
        let mut file = tempfile::Builder::new().suffix(".ppm").tempfile().unwrap();
        write!(file, "P3\n2 1\n255\n255 0 0  0 0 255\n").unwrap();

        let pixels = decode_image(file.path()).unwrap();
        assert_eq!((pixels.width, pixels.height), (2, 1));
        assert_eq!(pixels.layout, ChannelLayout::Rgb);
        assert_eq!(pixels.bytes, [255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_image(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, Error::DecodeInput { .. }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"definitely not a png").unwrap();
        assert!(matches!(decode_image(file.path()), Err(Error::DecodeInput { .. })));
    }
}
