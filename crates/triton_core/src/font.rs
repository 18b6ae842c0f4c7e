//! Character-generator ROM (ICs 69 and 70).
//!
//! The glyph image is a raw bitmap: 128 glyphs of 24 rows, one byte per
//! row, most significant bit leftmost. Loaded from `font.rom` in the
//! working directory; a missing or short image is fatal at startup, like
//! a missing monitor ROM.

use std::path::Path;

use crate::rom::RomError;

pub const GLYPH_COUNT: usize = 128;
pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 24;
/// Raw image size in bytes.
pub const FONT_LEN: usize = GLYPH_COUNT * GLYPH_HEIGHT;

/// Default font image file name.
pub const FONT_FILE: &str = "font.rom";

/// The decoded glyph image.
pub struct FontRom {
    rows: Box<[u8; FONT_LEN]>,
}

impl FontRom {
    /// Build from a raw 3072-byte image.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RomError> {
        let rows: Box<[u8; FONT_LEN]> =
            data.to_vec()
                .into_boxed_slice()
                .try_into()
                .map_err(|_| RomError::BadLength {
                    path: FONT_FILE.to_string(),
                    expected: FONT_LEN,
                    actual: data.len(),
                })?;
        Ok(Self { rows })
    }

    /// Load the image from disk.
    pub fn load(path: &Path) -> Result<Self, RomError> {
        let data = std::fs::read(path).map_err(|source| RomError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if data.len() != FONT_LEN {
            return Err(RomError::BadLength {
                path: path.display().to_string(),
                expected: FONT_LEN,
                actual: data.len(),
            });
        }
        Self::from_bytes(&data)
    }

    /// One pixel row of a glyph, MSB leftmost. The glyph index is masked
    /// to seven bits like the video hardware does.
    pub fn glyph_row(&self, glyph: u8, row: usize) -> u8 {
        self.rows[(glyph as usize & 0x7f) * GLYPH_HEIGHT + row]
    }
}

#[cfg(test)]
mod tests {
    use super::{FontRom, FONT_LEN, GLYPH_HEIGHT};
    use crate::rom::RomError;

    #[test]
    fn from_bytes_indexes_rows() {
        let mut image = vec![0u8; FONT_LEN];
        image[b'A' as usize * GLYPH_HEIGHT + 3] = 0x5a;
        let font = FontRom::from_bytes(&image).unwrap();
        assert_eq!(font.glyph_row(b'A', 3), 0x5a);
        assert_eq!(font.glyph_row(b'A', 4), 0x00);
        // High bit is ignored, matching the display projection.
        assert_eq!(font.glyph_row(b'A' | 0x80, 3), 0x5a);
    }

    #[test]
    fn short_image_is_rejected() {
        let result = FontRom::from_bytes(&[0u8; 16]);
        assert!(matches!(result, Err(RomError::BadLength { .. })));
    }
}
