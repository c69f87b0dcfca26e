//! 2D textures: pixel validation, RGBA expansion, mip generation and upload.

mod decode;
mod options;
mod pixels;
mod slots;
#[allow(clippy::module_inception)]
mod texture;

pub use decode::decode_image;
pub use options::{Filter, TextureOptions, Wrap};
pub use pixels::{build_levels, ChannelLayout, MipLevel, PixelData};
pub use slots::{TextureSlots, MAX_TEXTURE_SLOTS};
pub use texture::Texture;
