//! Loads program images: a flat sequence of little endian 16 bit words.
//!
//! ```text
//! 09 00 00 80 28 00 63 00   ->   9 32768 40 99   (add r0 40 99)
//! ```

use std::fs;
use std::path::Path;

use crate::error::{Result, VmError};

use super::{Byte, Memory, Word, REGISTER_BASE};

impl Memory {
    /// Creates memory holding `image` at address 0.
    pub fn from_image(image: &[Byte]) -> Result<Self> {
        let mut memory = Self::default();
        memory.load_image(image, 0)?;
        Ok(memory)
    }

    /// Reads the image at `path` into fresh memory at address 0.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = fs::read(path)?;
        log::debug!("Read {} bytes from {}", image.len(), path.display());

        Self::from_image(&image)
    }

    /// Decodes `image` and writes its words starting at `base`.
    ///
    /// # Errors
    ///
    /// Fails without touching memory if the image has an odd length, does not
    /// fit below the register range or contains a word above 32775.
    pub fn load_image(&mut self, image: &[Byte], base: Word) -> Result<()> {
        let words = decode(image)?;

        let available = REGISTER_BASE as usize - (base as usize).min(REGISTER_BASE as usize);
        if words.len() > available {
            return Err(VmError::Load {
                reason: format!(
                    "{} words do not fit into memory at `0x{:04x}`",
                    words.len(),
                    base
                ),
            });
        }

        self.write_program(base, &words)?;
        log::debug!("Loaded {} words at 0x{:04x}", words.len(), base);

        Ok(())
    }
}

fn decode(image: &[Byte]) -> Result<Vec<Word>> {
    if image.len() % 2 != 0 {
        return Err(VmError::Load {
            reason: format!("image length {} is not a whole number of words", image.len()),
        });
    }

    Ok(image
        .chunks_exact(2)
        .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
