//! Enum validation shared by both GLES versions

use crate::gl::*;

/// Texture targets a unit tracks bindings for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    Texture2D = 0,
    CubeMap = 1,
}

pub const NUM_TEXTURE_TARGETS: usize = 2;

impl TextureTarget {
    pub fn from_gl(target: GLenum) -> Option<TextureTarget> {
        match target {
            GL_TEXTURE_2D => Some(TextureTarget::Texture2D),
            GL_TEXTURE_CUBE_MAP => Some(TextureTarget::CubeMap),
            _ => None,
        }
    }
}

/// Framebuffer attachment points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferAttachment {
    Color0 = 0,
    Depth = 1,
    Stencil = 2,
}

pub const NUM_FRAMEBUFFER_ATTACHMENTS: usize = 3;

impl FramebufferAttachment {
    pub fn from_gl(attachment: GLenum) -> Option<FramebufferAttachment> {
        match attachment {
            GL_COLOR_ATTACHMENT0 => Some(FramebufferAttachment::Color0),
            GL_DEPTH_ATTACHMENT => Some(FramebufferAttachment::Depth),
            GL_STENCIL_ATTACHMENT => Some(FramebufferAttachment::Stencil),
            _ => None,
        }
    }
}

pub fn is_buffer_target_valid(target: GLenum) -> bool {
    matches!(target, GL_ARRAY_BUFFER | GL_ELEMENT_ARRAY_BUFFER)
}

pub fn is_buffer_usage_valid(usage: GLenum) -> bool {
    matches!(usage, GL_STREAM_DRAW | GL_STATIC_DRAW | GL_DYNAMIC_DRAW)
}

/// Smallest and largest of the little-endian indices in `bytes`
pub fn minmax_index(bytes: &[u8], index_size: usize) -> Option<(u32, u32)> {
    let mut range: Option<(u32, u32)> = None;
    for chunk in bytes.chunks_exact(index_size) {
        let idx = match index_size {
            1 => chunk[0] as u32,
            2 => u16::from_le_bytes([chunk[0], chunk[1]]) as u32,
            _ => u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
        };
        range = Some(match range {
            Some((min, max)) => (min.min(idx), max.max(idx)),
            None => (idx, idx),
        });
    }
    range
}

/// Size in bytes of one element of an index type
pub fn index_size(type_: GLenum) -> Option<usize> {
    match type_ {
        GL_UNSIGNED_BYTE => Some(1),
        GL_UNSIGNED_SHORT => Some(2),
        GL_UNSIGNED_INT => Some(4),
        _ => None,
    }
}

/// Binding query enum for a buffer target
pub fn buffer_target_to_binding(target: GLenum) -> Option<GLenum> {
    match target {
        GL_ARRAY_BUFFER => Some(GL_ARRAY_BUFFER_BINDING),
        GL_ELEMENT_ARRAY_BUFFER => Some(GL_ELEMENT_ARRAY_BUFFER_BINDING),
        _ => None,
    }
}

/// Map cube faces onto `GL_TEXTURE_CUBE_MAP`
pub fn squash_texture_target(target: GLenum) -> Option<GLenum> {
    match target {
        GL_TEXTURE_2D => Some(GL_TEXTURE_2D),
        GL_TEXTURE_CUBE_MAP_POSITIVE_X
        | GL_TEXTURE_CUBE_MAP_NEGATIVE_X
        | GL_TEXTURE_CUBE_MAP_POSITIVE_Y
        | GL_TEXTURE_CUBE_MAP_NEGATIVE_Y
        | GL_TEXTURE_CUBE_MAP_POSITIVE_Z
        | GL_TEXTURE_CUBE_MAP_NEGATIVE_Z => Some(GL_TEXTURE_CUBE_MAP),
        _ => None,
    }
}

/// Size of one vertex array component
pub fn array_el_size(type_: GLenum) -> Option<usize> {
    match type_ {
        GL_BYTE | GL_UNSIGNED_BYTE => Some(1),
        GL_SHORT | GL_UNSIGNED_SHORT => Some(2),
        GL_FLOAT | GL_FIXED => Some(4),
        _ => None,
    }
}

/// Number of values a state query shared by both versions returns
pub fn common_param_count(pname: GLenum) -> Option<usize> {
    let count = match pname {
        GL_ACTIVE_TEXTURE
        | GL_ALPHA_BITS
        | GL_ARRAY_BUFFER_BINDING
        | GL_BLEND
        | GL_BLEND_DST
        | GL_BLEND_SRC
        | GL_BLUE_BITS
        | GL_CULL_FACE
        | GL_CULL_FACE_MODE
        | GL_DEPTH_BITS
        | GL_DEPTH_CLEAR_VALUE
        | GL_DEPTH_FUNC
        | GL_DEPTH_TEST
        | GL_DEPTH_WRITEMASK
        | GL_DITHER
        | GL_ELEMENT_ARRAY_BUFFER_BINDING
        | GL_FRAMEBUFFER_BINDING
        | GL_FRONT_FACE
        | GL_GENERATE_MIPMAP_HINT
        | GL_GREEN_BITS
        | GL_IMPLEMENTATION_COLOR_READ_FORMAT_OES
        | GL_IMPLEMENTATION_COLOR_READ_TYPE_OES
        | GL_LINE_WIDTH
        | GL_MAX_CUBE_MAP_TEXTURE_SIZE
        | GL_MAX_RENDERBUFFER_SIZE
        | GL_MAX_TEXTURE_SIZE
        | GL_NUM_COMPRESSED_TEXTURE_FORMATS
        | GL_PACK_ALIGNMENT
        | GL_POLYGON_OFFSET_FACTOR
        | GL_POLYGON_OFFSET_FILL
        | GL_POLYGON_OFFSET_UNITS
        | GL_RED_BITS
        | GL_RENDERBUFFER_BINDING
        | GL_SAMPLE_ALPHA_TO_COVERAGE
        | GL_SAMPLE_BUFFERS
        | GL_SAMPLE_COVERAGE
        | GL_SAMPLE_COVERAGE_INVERT
        | GL_SAMPLE_COVERAGE_VALUE
        | GL_SAMPLES
        | GL_SCISSOR_TEST
        | GL_STENCIL_BITS
        | GL_STENCIL_CLEAR_VALUE
        | GL_STENCIL_FAIL
        | GL_STENCIL_FUNC
        | GL_STENCIL_PASS_DEPTH_FAIL
        | GL_STENCIL_PASS_DEPTH_PASS
        | GL_STENCIL_REF
        | GL_STENCIL_TEST
        | GL_STENCIL_VALUE_MASK
        | GL_STENCIL_WRITEMASK
        | GL_SUBPIXEL_BITS
        | GL_TEXTURE_BINDING_2D
        | GL_TEXTURE_BINDING_CUBE_MAP
        | GL_UNPACK_ALIGNMENT => 1,
        GL_ALIASED_LINE_WIDTH_RANGE
        | GL_ALIASED_POINT_SIZE_RANGE
        | GL_DEPTH_RANGE
        | GL_MAX_VIEWPORT_DIMS => 2,
        GL_COLOR_CLEAR_VALUE | GL_COLOR_WRITEMASK | GL_SCISSOR_BOX | GL_VIEWPORT => 4,
        _ => return None,
    };
    Some(count)
}

/// Row stride of client pixel data, rows padded to `alignment`
///
/// `None` for format/type pairs GLES does not accept.
pub fn pixel_row_stride(width: GLsizei, format: GLenum, type_: GLenum, alignment: GLint) -> Option<usize> {
    let per_byte = match type_ {
        GL_UNSIGNED_BYTE => true,
        GL_UNSIGNED_SHORT_5_6_5 | GL_UNSIGNED_SHORT_4_4_4_4 | GL_UNSIGNED_SHORT_5_5_5_1 => false,
        _ => return None,
    };

    let bpp = match format {
        GL_ALPHA | GL_LUMINANCE => 1,
        GL_RGB => {
            if per_byte {
                3
            } else {
                2
            }
        }
        GL_RGBA => {
            if per_byte {
                4
            } else {
                2
            }
        }
        GL_LUMINANCE_ALPHA => 2,
        _ => return None,
    };

    let alignment = if alignment > 0 { alignment as usize } else { 1 };
    let width = width.max(0) as usize;
    Some((width * bpp + alignment - 1) & !(alignment - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash() {
        assert_eq!(squash_texture_target(GL_TEXTURE_2D), Some(GL_TEXTURE_2D));
        assert_eq!(
            squash_texture_target(GL_TEXTURE_CUBE_MAP_NEGATIVE_Z),
            Some(GL_TEXTURE_CUBE_MAP)
        );
        assert_eq!(squash_texture_target(GL_TEXTURE_CUBE_MAP), None);
    }

    #[test]
    fn test_row_stride() {
        assert_eq!(pixel_row_stride(3, GL_RGB, GL_UNSIGNED_BYTE, 4), Some(12));
        assert_eq!(pixel_row_stride(3, GL_RGB, GL_UNSIGNED_BYTE, 1), Some(9));
        assert_eq!(pixel_row_stride(5, GL_RGB, GL_UNSIGNED_SHORT_5_6_5, 4), Some(12));
        assert_eq!(pixel_row_stride(2, GL_ALPHA, GL_UNSIGNED_BYTE, 0), Some(2));
        assert_eq!(pixel_row_stride(2, GL_ALPHA, GL_FLOAT, 4), None);
        assert_eq!(pixel_row_stride(2, GL_BGRA, GL_UNSIGNED_BYTE, 4), None);
    }

    #[test]
    fn test_common_param_count() {
        assert_eq!(common_param_count(GL_VIEWPORT), Some(4));
        assert_eq!(common_param_count(GL_DEPTH_RANGE), Some(2));
        assert_eq!(common_param_count(GL_TEXTURE_BINDING_2D), Some(1));
        assert_eq!(common_param_count(GL_MAX_LIGHTS), None);
    }

    #[test]
    fn test_minmax_index() {
        assert_eq!(minmax_index(&[5, 2, 9, 2], 1), Some((2, 9)));
        assert_eq!(minmax_index(&[0x00, 0x01, 0x03, 0x00], 2), Some((3, 0x100)));
        assert_eq!(minmax_index(&[7, 0, 0, 0], 4), Some((7, 7)));
        assert_eq!(minmax_index(&[], 2), None);
    }

    #[test]
    fn test_el_sizes() {
        assert_eq!(array_el_size(GL_BYTE), Some(1));
        assert_eq!(array_el_size(GL_UNSIGNED_SHORT), Some(2));
        assert_eq!(array_el_size(GL_FIXED), Some(4));
        assert_eq!(array_el_size(GL_INT), None);
        assert_eq!(index_size(GL_UNSIGNED_INT), Some(4));
        assert_eq!(index_size(GL_INT), None);
    }
}
