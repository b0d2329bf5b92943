//! `GL_OES_compressed_paletted_texture`
//!
//! Host GL has no paletted formats. The guest's palette and index data are
//! expanded to plain texels, one mip level at a time.

use crate::gl::*;

/// How one paletted internal format expands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteFormat {
    /// Format and type of the expanded texels
    pub format: GLenum,
    pub type_: GLenum,
    /// Bytes per palette entry and per expanded texel
    pub pixel_size: usize,
    /// 4 or 8
    pub bits_per_index: u32,
}

impl PaletteFormat {
    pub fn from_gl(internalformat: GLenum) -> Option<PaletteFormat> {
        let (format, type_, pixel_size) = match internalformat {
            GL_PALETTE4_RGB8_OES | GL_PALETTE8_RGB8_OES => (GL_RGB, GL_UNSIGNED_BYTE, 3),
            GL_PALETTE4_RGBA8_OES | GL_PALETTE8_RGBA8_OES => (GL_RGBA, GL_UNSIGNED_BYTE, 4),
            GL_PALETTE4_R5_G6_B5_OES | GL_PALETTE8_R5_G6_B5_OES => {
                (GL_RGB, GL_UNSIGNED_SHORT_5_6_5, 2)
            }
            GL_PALETTE4_RGBA4_OES | GL_PALETTE8_RGBA4_OES => (GL_RGBA, GL_UNSIGNED_SHORT_4_4_4_4, 2),
            GL_PALETTE4_RGB5_A1_OES | GL_PALETTE8_RGB5_A1_OES => {
                (GL_RGBA, GL_UNSIGNED_SHORT_5_5_5_1, 2)
            }
            _ => return None,
        };
        let bits_per_index = if internalformat <= GL_PALETTE4_RGB5_A1_OES {
            4
        } else {
            8
        };
        Some(PaletteFormat {
            format,
            type_,
            pixel_size,
            bits_per_index,
        })
    }

    pub fn palette_size(&self) -> usize {
        (1usize << self.bits_per_index) * self.pixel_size
    }

    fn indices_size(&self, texels: usize) -> usize {
        if self.bits_per_index == 4 {
            (texels + 1) / 2
        } else {
            texels
        }
    }

    /// Byte size of a compressed image with levels `0..=max_level`
    pub fn image_size(&self, width: u32, height: u32, max_level: u32) -> usize {
        self.palette_size()
            + mip_levels(width, height, max_level)
                .map(|(w, h)| self.indices_size(w as usize * h as usize))
                .sum::<usize>()
    }

    /// Expand every level of `data`; `None` if `data` is shorter than
    /// [`PaletteFormat::image_size`]
    pub fn decompress(&self, data: &[u8], width: u32, height: u32, max_level: u32) -> Option<Vec<Vec<u8>>> {
        let palette = data.get(..self.palette_size())?;
        let mut indices = &data[self.palette_size()..];

        let mut levels = Vec::new();
        for (w, h) in mip_levels(width, height, max_level) {
            let texels = w as usize * h as usize;
            let len = self.indices_size(texels);
            let level = indices.get(..len)?;
            levels.push(self.expand(palette, level, texels));
            indices = &indices[len..];
        }
        Some(levels)
    }

    fn expand(&self, palette: &[u8], indices: &[u8], texels: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(texels * self.pixel_size);
        for i in 0..texels {
            let index = if self.bits_per_index == 4 {
                let byte = indices[i / 2];
                // Even texels live in the high nibble
                if i % 2 == 0 {
                    byte >> 4
                } else {
                    byte & 0xF
                }
            } else {
                indices[i]
            } as usize;
            let at = index * self.pixel_size;
            out.extend_from_slice(&palette[at..at + self.pixel_size]);
        }
        out
    }
}

/// Dimensions of levels `0..=max_level`, halving down to 1
pub fn mip_levels(width: u32, height: u32, max_level: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..=max_level).scan((width, height), |dims, _| {
        let current = *dims;
        *dims = ((dims.0 >> 1).max(1), (dims.1 >> 1).max(1));
        Some(current)
    })
}

/// Non-negative power-of-two dimensions no larger than `max_size`
pub fn tex_dims_valid(width: GLsizei, height: GLsizei, max_size: GLint) -> bool {
    let valid = |dim: GLsizei| dim >= 0 && dim <= max_size && (dim == 0 || (dim as u32).is_power_of_two());
    valid(width) && valid(height)
}

pub fn log2(value: GLint) -> GLint {
    if value <= 0 {
        0
    } else {
        31 - (value as u32).leading_zeros() as GLint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table() {
        let f = PaletteFormat::from_gl(GL_PALETTE4_RGB8_OES).unwrap();
        assert_eq!((f.format, f.type_, f.pixel_size, f.bits_per_index), (GL_RGB, GL_UNSIGNED_BYTE, 3, 4));
        assert_eq!(f.palette_size(), 48);

        let f = PaletteFormat::from_gl(GL_PALETTE8_RGB5_A1_OES).unwrap();
        assert_eq!(
            (f.format, f.type_, f.pixel_size, f.bits_per_index),
            (GL_RGBA, GL_UNSIGNED_SHORT_5_5_5_1, 2, 8)
        );
        assert_eq!(f.palette_size(), 512);

        assert!(PaletteFormat::from_gl(GL_RGBA).is_none());
    }

    #[test]
    fn test_image_size() {
        let f = PaletteFormat::from_gl(GL_PALETTE4_RGBA8_OES).unwrap();
        // 64 palette bytes, then 4x2 -> 4, 2x1 -> 1, 1x1 -> 1
        assert_eq!(f.image_size(4, 2, 0), 64 + 4);
        assert_eq!(f.image_size(4, 2, 2), 64 + 4 + 1 + 1);

        let f = PaletteFormat::from_gl(GL_PALETTE8_RGB8_OES).unwrap();
        assert_eq!(f.image_size(2, 2, 1), 768 + 4 + 1);
    }

    #[test]
    fn test_decompress_4bit() {
        let f = PaletteFormat::from_gl(GL_PALETTE4_R5_G6_B5_OES).unwrap();
        let mut data = vec![0u8; f.palette_size()];
        for entry in 0..16u8 {
            data[entry as usize * 2] = entry;
            data[entry as usize * 2 + 1] = 0xA0 | entry;
        }
        // 2x2: texels 0..3 use entries 1, 2, 3, 15; level 1 uses entry 7
        data.extend_from_slice(&[0x12, 0x3F, 0x70]);

        let levels = f.decompress(&data, 2, 2, 1).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0], vec![1, 0xA1, 2, 0xA2, 3, 0xA3, 15, 0xAF]);
        assert_eq!(levels[1], vec![7, 0xA7]);

        assert!(f.decompress(&data[..data.len() - 1], 2, 2, 1).is_none());
    }

    #[test]
    fn test_decompress_8bit() {
        let f = PaletteFormat::from_gl(GL_PALETTE8_RGB8_OES).unwrap();
        let mut data = vec![0u8; f.palette_size()];
        data[255 * 3..].copy_from_slice(&[9, 8, 7]);
        data[3..6].copy_from_slice(&[1, 2, 3]);
        data.extend_from_slice(&[255, 1]);

        let levels = f.decompress(&data, 2, 1, 0).unwrap();
        assert_eq!(levels, vec![vec![9, 8, 7, 1, 2, 3]]);
    }

    #[test]
    fn test_dims_and_levels() {
        assert!(tex_dims_valid(64, 1, 64));
        assert!(tex_dims_valid(0, 0, 64));
        assert!(!tex_dims_valid(128, 1, 64));
        assert!(!tex_dims_valid(3, 4, 64));
        assert!(!tex_dims_valid(-2, 4, 64));

        assert_eq!(log2(4096), 12);
        assert_eq!(log2(1), 0);

        let dims: Vec<_> = mip_levels(8, 2, 3).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }
}
