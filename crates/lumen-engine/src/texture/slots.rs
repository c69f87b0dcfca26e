use crate::error::{Error, Result};

use super::Texture;

/// Number of texture slots a frame can bind.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Textures currently bound to numbered slots.
#[derive(Default)]
pub struct TextureSlots<'r> {
    slots: [Option<&'r Texture>; MAX_TEXTURE_SLOTS],
}

impl<'r> TextureSlots<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `texture` to `slot`, replacing whatever was there.
    pub fn bind(&mut self, slot: u32, texture: &'r Texture) -> Result<()> {
        let entry = self.slots.get_mut(slot as usize).ok_or_else(|| {
            Error::frame(format!(
                "texture slot {slot} is out of range (0..{MAX_TEXTURE_SLOTS})"
            ))
        })?;
        *entry = Some(texture);
        Ok(())
    }

    pub fn get(&self, slot: u32) -> Option<&'r Texture> {
        self.slots.get(slot as usize).copied().flatten()
    }
}
