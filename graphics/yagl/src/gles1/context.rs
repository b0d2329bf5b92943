//! GLES1 context
//!
//! Fixed-function arrays are applied through the host's client-state
//! pointers. Point-size arrays and paletted textures have no host
//! counterpart and are emulated here.

use std::any::Any;
use std::sync::Arc;

use bitflags::bitflags;

use super::palette::{self, PaletteFormat};
use crate::client::{ClientApi, ClientContext};
use crate::driver::{Gles1Driver, GlesDriver, VertexData};
use crate::gl::*;
use crate::gles::context::MAX_TEXTURE_UNITS;
use crate::gles::validate::index_size;
use crate::gles::{ArrayConversion, GlesArray, GlesClient, GlesContext};
use crate::object::{EnsureContext, Sharegroup};

pub const ARRAY_VERTEX: u32 = 0;
pub const ARRAY_COLOR: u32 = 1;
pub const ARRAY_NORMAL: u32 = 2;
pub const ARRAY_POINTSIZE: u32 = 3;
/// First texture coordinate array, one per texture unit follows
pub const ARRAY_TEXCOORD: u32 = 4;

/// Clip planes exposed to the guest at most
pub const MAX_CLIP_PLANES: GLint = 6;

/// Formats `GL_COMPRESSED_TEXTURE_FORMATS` reports
pub const COMPRESSED_TEXTURE_FORMATS: [GLenum; 10] = [
    GL_PALETTE4_RGB8_OES,
    GL_PALETTE4_RGBA8_OES,
    GL_PALETTE4_R5_G6_B5_OES,
    GL_PALETTE4_RGBA4_OES,
    GL_PALETTE4_RGB5_A1_OES,
    GL_PALETTE8_RGB8_OES,
    GL_PALETTE8_RGBA8_OES,
    GL_PALETTE8_R5_G6_B5_OES,
    GL_PALETTE8_RGBA4_OES,
    GL_PALETTE8_RGB5_A1_OES,
];

const BASE_EXTENSIONS: &str = "GL_OES_blend_subtract GL_OES_blend_equation_separate \
GL_OES_blend_func_separate GL_OES_element_index_uint GL_OES_texture_mirrored_repeat \
GL_EXT_texture_format_BGRA8888 GL_OES_point_sprite GL_OES_point_size_array \
GL_OES_stencil_wrap GL_OES_compressed_paletted_texture GL_OES_depth_texture ";

const FRAMEBUFFER_EXTENSIONS: &str = "GL_OES_framebuffer_object GL_OES_depth24 \
GL_OES_depth32 GL_OES_rgb8_rgba8 GL_OES_stencil1 GL_OES_stencil4 GL_OES_stencil8 \
GL_OES_EGL_image ";

bitflags! {
    /// Optional host capabilities a GLES1 context builds on
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Gles1Features: u32 {
        const FRAMEBUFFER_OBJECT = 1 << 0;
        const MATRIX_PALETTE = 1 << 1;
    }
}

impl Gles1Features {
    /// Capabilities found in a host `GL_EXTENSIONS` string
    pub fn from_extensions(extensions: &str) -> Self {
        let mut features = Gles1Features::empty();
        if extensions.contains("GL_EXT_framebuffer_object ")
            || extensions.contains("GL_ARB_framebuffer_object ")
        {
            features |= Gles1Features::FRAMEBUFFER_OBJECT;
        }
        if extensions.contains("GL_ARB_vertex_blend ") && extensions.contains("GL_ARB_matrix_palette ") {
            features |= Gles1Features::MATRIX_PALETTE;
        }
        features
    }
}

pub struct Gles1Context {
    gles: GlesContext,
    driver: Arc<dyn Gles1Driver>,
    prepared: bool,

    /// Unit `glClientActiveTexture` selected
    client_active_texture: usize,

    max_clip_planes: GLint,
    max_lights: GLint,
    max_tex_size: GLint,

    features: Gles1Features,
}

impl Gles1Context {
    pub fn new(
        gles_driver: Arc<dyn GlesDriver>,
        driver: Arc<dyn Gles1Driver>,
        ensure: Arc<dyn EnsureContext>,
        sharegroup: Arc<Sharegroup>,
    ) -> Self {
        Self {
            gles: GlesContext::new(gles_driver, ensure, sharegroup),
            driver,
            prepared: false,
            client_active_texture: 0,
            max_clip_planes: 0,
            max_lights: 0,
            max_tex_size: 0,
            features: Gles1Features::empty(),
        }
    }

    pub fn driver(&self) -> &Arc<dyn Gles1Driver> {
        &self.driver
    }

    pub fn features(&self) -> Gles1Features {
        self.features
    }

    pub fn max_clip_planes(&self) -> GLint {
        self.max_clip_planes
    }

    pub fn max_lights(&self) -> GLint {
        self.max_lights
    }

    pub fn client_active_texture(&self) -> usize {
        self.client_active_texture
    }

    /// `glClientActiveTexture`; false if the unit does not exist
    pub fn set_client_active_texture(&mut self, texture: GLenum) -> bool {
        let unit = texture.wrapping_sub(GL_TEXTURE0) as usize;
        if texture < GL_TEXTURE0 || unit >= self.gles.num_texture_units() {
            return false;
        }
        self.client_active_texture = unit;
        true
    }

    /// Array behind a client-state or array-pointer enum
    pub fn array_index(&self, name: GLenum) -> Option<u32> {
        let index = match name {
            GL_VERTEX_ARRAY | GL_VERTEX_ARRAY_POINTER => ARRAY_VERTEX,
            GL_COLOR_ARRAY | GL_COLOR_ARRAY_POINTER => ARRAY_COLOR,
            GL_NORMAL_ARRAY | GL_NORMAL_ARRAY_POINTER => ARRAY_NORMAL,
            GL_TEXTURE_COORD_ARRAY | GL_TEXTURE_COORD_ARRAY_POINTER => {
                ARRAY_TEXCOORD + self.client_active_texture as u32
            }
            GL_POINT_SIZE_ARRAY_OES | GL_POINT_SIZE_ARRAY_POINTER_OES => ARRAY_POINTSIZE,
            _ => return None,
        };
        Some(index)
    }

    fn prepare(&mut self) {
        let gles_driver = self.gles.driver().clone();
        let query = |pname: GLenum| {
            let mut value = [0 as GLint];
            gles_driver.get_integerv(pname, &mut value);
            value[0]
        };

        let num_texture_units = (query(GL_MAX_TEXTURE_UNITS).max(1) as usize).min(MAX_TEXTURE_UNITS);

        let mut arrays = vec![
            GlesArray::new(ARRAY_VERTEX, ArrayConversion::FIXED_AND_BYTE),
            GlesArray::new(ARRAY_COLOR, ArrayConversion::FIXED),
            GlesArray::new(ARRAY_NORMAL, ArrayConversion::FIXED),
            GlesArray::new(ARRAY_POINTSIZE, ArrayConversion::NONE),
        ];
        arrays.extend(
            (0..num_texture_units)
                .map(|unit| GlesArray::new(ARRAY_TEXCOORD + unit as u32, ArrayConversion::FIXED_AND_BYTE)),
        );
        self.gles.prepare(arrays, num_texture_units);

        self.max_clip_planes = query(GL_MAX_CLIP_PLANES);
        if self.max_clip_planes < MAX_CLIP_PLANES {
            log::warn!(
                "gles1: host supports only {} clip planes, GLES1 wants {}",
                self.max_clip_planes,
                MAX_CLIP_PLANES
            );
        } else {
            self.max_clip_planes = MAX_CLIP_PLANES;
        }
        self.max_lights = query(GL_MAX_LIGHTS);
        self.max_tex_size = query(GL_MAX_TEXTURE_SIZE);

        self.features = Gles1Features::from_extensions(&gles_driver.get_string(GL_EXTENSIONS));

        log::debug!(
            "gles1: prepared, {} clip planes, {} lights, features {:?}",
            self.max_clip_planes,
            self.max_lights,
            self.features
        );
        self.prepared = true;
    }

    fn array(&self, index: u32) -> Option<&GlesArray> {
        self.gles.get_array(index)
    }

    fn array_enabled(&self, index: u32) -> bool {
        self.array(index).is_some_and(GlesArray::enabled)
    }

    /// Run a host pointer call with the array's buffer part bound if it
    /// lives in a buffer object
    fn apply_pointer(&self, array: &GlesArray, pointer: impl FnOnce(VertexData<'_>)) {
        match array.vbo() {
            Some(vbo) => {
                let old = vbo.bind(array.type_(), array.need_convert(), GL_ARRAY_BUFFER);
                pointer(array.host_data());
                if let Some(old) = old {
                    self.gles.driver().bind_buffer(GL_ARRAY_BUFFER, old);
                }
            }
            None => pointer(array.host_data()),
        }
    }

    /// Point size of vertex `index` from the point-size array
    fn point_size_at(&self, index: usize) -> GLfloat {
        let array = match self.array(ARRAY_POINTSIZE) {
            Some(array) => array,
            None => return 1.0,
        };
        let bytes = match array.element_bytes(index, 4) {
            Some(bytes) => bytes,
            None => return 1.0,
        };
        let word = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match array.type_() {
            GL_FIXED => fixed_to_float(i32::from_le_bytes(word)),
            _ => f32::from_le_bytes(word),
        }
    }

    /// Split `[0, count)` into runs of equal point size
    fn point_size_runs(&self, count: usize, vertex: impl Fn(usize) -> usize) -> Vec<(usize, usize, GLfloat)> {
        let mut runs: Vec<(usize, usize, GLfloat)> = Vec::new();
        for i in 0..count {
            let size = self.point_size_at(vertex(i));
            match runs.last_mut() {
                Some((_, len, last)) if *last == size => *len += 1,
                _ => runs.push((i, 1, size)),
            }
        }
        runs
    }

    fn compressed_palette_image(
        &mut self,
        format: PaletteFormat,
        level: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        image_size: GLsizei,
        data: Option<&[u8]>,
    ) -> GLenum {
        if level > 0
            || level < -palette::log2(self.max_tex_size)
            || !palette::tex_dims_valid(width, height, self.max_tex_size)
            || border != 0
        {
            return GL_INVALID_VALUE;
        }
        let max_level = (-level) as u32;
        let (width, height) = (width as u32, height as u32);
        if image_size < 0 || image_size as usize != format.image_size(width, height, max_level) {
            return GL_INVALID_VALUE;
        }

        let driver = self.gles.driver().clone();
        let levels: Vec<((u32, u32), Option<Vec<u8>>)> = match data {
            None => palette::mip_levels(width, height, max_level)
                .map(|dims| (dims, None))
                .collect(),
            Some(data) => match format.decompress(data, width, height, max_level) {
                Some(levels) => palette::mip_levels(width, height, max_level)
                    .zip(levels.into_iter().map(Some))
                    .collect(),
                None => return GL_INVALID_VALUE,
            },
        };

        let mut alignment = [0 as GLint];
        driver.get_integerv(GL_UNPACK_ALIGNMENT, &mut alignment);
        let saved_alignment = alignment[0];
        if data.is_some() && saved_alignment != 1 {
            driver.pixel_storei(GL_UNPACK_ALIGNMENT, 1);
        }

        for (level, ((w, h), texels)) in levels.into_iter().enumerate() {
            driver.tex_image_2d(
                GL_TEXTURE_2D,
                level as GLint,
                format.format as GLint,
                w as GLsizei,
                h as GLsizei,
                0,
                format.format,
                format.type_,
                texels.as_deref(),
            );
        }

        if data.is_some() && saved_alignment != 1 {
            driver.pixel_storei(GL_UNPACK_ALIGNMENT, saved_alignment);
        }
        GL_NO_ERROR
    }
}

impl ClientContext for Gles1Context {
    fn client_api(&self) -> ClientApi {
        ClientApi::Gles1
    }

    fn sharegroup(&self) -> &Arc<Sharegroup> {
        self.gles.sharegroup()
    }

    fn activate(&mut self) {
        if !self.prepared {
            self.prepare();
        }
    }

    fn deactivate(&mut self) {
        self.gles.deactivate();
    }

    fn flush(&mut self) {
        self.gles.driver().flush();
    }

    fn finish(&mut self) {
        self.gles.driver().finish();
    }

    fn read_pixels(&mut self, width: u32, height: u32, bpp: u32, pixels: &mut [u8]) -> bool {
        self.gles.read_pixels(width, height, bpp, pixels)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl GlesClient for Gles1Context {
    fn gles(&self) -> &GlesContext {
        &self.gles
    }

    fn gles_mut(&mut self) -> &mut GlesContext {
        &mut self.gles
    }

    fn get_param_count(&self, pname: GLenum) -> Option<usize> {
        let count = match pname {
            GL_COMPRESSED_TEXTURE_FORMATS => COMPRESSED_TEXTURE_FORMATS.len(),
            GL_ALPHA_TEST
            | GL_ALPHA_TEST_FUNC
            | GL_ALPHA_TEST_REF
            | GL_BLEND_EQUATION_RGB
            | GL_BLEND_EQUATION_ALPHA
            | GL_BLEND_DST_RGB
            | GL_BLEND_SRC_RGB
            | GL_BLEND_DST_ALPHA
            | GL_BLEND_SRC_ALPHA
            | GL_CLIENT_ACTIVE_TEXTURE
            | GL_COLOR_ARRAY
            | GL_COLOR_ARRAY_BUFFER_BINDING
            | GL_COLOR_ARRAY_SIZE
            | GL_COLOR_ARRAY_STRIDE
            | GL_COLOR_ARRAY_TYPE
            | GL_COLOR_LOGIC_OP
            | GL_COLOR_MATERIAL
            | GL_FOG
            | GL_FOG_DENSITY
            | GL_FOG_END
            | GL_FOG_HINT
            | GL_FOG_MODE
            | GL_FOG_START
            | GL_LIGHTING
            | GL_LIGHT_MODEL_TWO_SIDE
            | GL_LINE_SMOOTH
            | GL_LINE_SMOOTH_HINT
            | GL_LOGIC_OP_MODE
            | GL_MATRIX_MODE
            | GL_MAX_CLIP_PLANES
            | GL_MAX_LIGHTS
            | GL_MAX_MODELVIEW_STACK_DEPTH
            | GL_MAX_PROJECTION_STACK_DEPTH
            | GL_MAX_TEXTURE_STACK_DEPTH
            | GL_MAX_TEXTURE_UNITS
            | GL_MODELVIEW_STACK_DEPTH
            | GL_MULTISAMPLE
            | GL_NORMAL_ARRAY
            | GL_NORMAL_ARRAY_BUFFER_BINDING
            | GL_NORMAL_ARRAY_STRIDE
            | GL_NORMAL_ARRAY_TYPE
            | GL_NORMALIZE
            | GL_PERSPECTIVE_CORRECTION_HINT
            | GL_POINT_FADE_THRESHOLD_SIZE
            | GL_POINT_SIZE
            | GL_POINT_SIZE_ARRAY_OES
            | GL_POINT_SIZE_ARRAY_BUFFER_BINDING_OES
            | GL_POINT_SIZE_ARRAY_STRIDE_OES
            | GL_POINT_SIZE_ARRAY_TYPE_OES
            | GL_POINT_SIZE_MAX
            | GL_POINT_SIZE_MIN
            | GL_POINT_SMOOTH
            | GL_POINT_SMOOTH_HINT
            | GL_POINT_SPRITE_OES
            | GL_PROJECTION_STACK_DEPTH
            | GL_RESCALE_NORMAL
            | GL_SAMPLE_ALPHA_TO_ONE
            | GL_SHADE_MODEL
            | GL_TEXTURE_2D
            | GL_TEXTURE_COORD_ARRAY
            | GL_TEXTURE_COORD_ARRAY_BUFFER_BINDING
            | GL_TEXTURE_COORD_ARRAY_SIZE
            | GL_TEXTURE_COORD_ARRAY_STRIDE
            | GL_TEXTURE_COORD_ARRAY_TYPE
            | GL_TEXTURE_STACK_DEPTH
            | GL_VERTEX_ARRAY
            | GL_VERTEX_ARRAY_BUFFER_BINDING
            | GL_VERTEX_ARRAY_SIZE
            | GL_VERTEX_ARRAY_STRIDE
            | GL_VERTEX_ARRAY_TYPE => 1,
            GL_SMOOTH_LINE_WIDTH_RANGE | GL_SMOOTH_POINT_SIZE_RANGE => 2,
            GL_CURRENT_NORMAL | GL_POINT_DISTANCE_ATTENUATION => 3,
            GL_CURRENT_COLOR | GL_CURRENT_TEXTURE_COORDS | GL_FOG_COLOR | GL_LIGHT_MODEL_AMBIENT => 4,
            GL_MODELVIEW_MATRIX | GL_PROJECTION_MATRIX | GL_TEXTURE_MATRIX => 16,
            GL_FRAMEBUFFER_BINDING | GL_RENDERBUFFER_BINDING | GL_MAX_RENDERBUFFER_SIZE => {
                return self
                    .features
                    .contains(Gles1Features::FRAMEBUFFER_OBJECT)
                    .then_some(1)
            }
            GL_MAX_PALETTE_MATRICES_OES
            | GL_MAX_VERTEX_UNITS_OES
            | GL_CURRENT_PALETTE_MATRIX_OES
            | GL_MATRIX_INDEX_ARRAY_BUFFER_BINDING_OES
            | GL_MATRIX_INDEX_ARRAY_SIZE_OES
            | GL_MATRIX_INDEX_ARRAY_STRIDE_OES
            | GL_MATRIX_INDEX_ARRAY_TYPE_OES
            | GL_WEIGHT_ARRAY_BUFFER_BINDING_OES
            | GL_WEIGHT_ARRAY_SIZE_OES
            | GL_WEIGHT_ARRAY_STRIDE_OES
            | GL_WEIGHT_ARRAY_TYPE_OES => {
                return self.features.contains(Gles1Features::MATRIX_PALETTE).then_some(1)
            }
            _ if pname >= GL_CLIP_PLANE0 && pname < GL_CLIP_PLANE0 + self.max_clip_planes.max(0) as GLenum => 1,
            _ if pname >= GL_LIGHT0 && pname < GL_LIGHT0 + self.max_lights.max(0) as GLenum => 1,
            _ => return None,
        };
        Some(count)
    }

    fn get_integerv(&self, pname: GLenum) -> Option<Vec<GLint>> {
        let array_state = |name: GLenum, f: fn(&GlesArray) -> GLint| {
            self.array_index(name)
                .and_then(|index| self.array(index))
                .map(|array| vec![f(array)])
        };

        match pname {
            GL_MAX_CLIP_PLANES => Some(vec![self.max_clip_planes]),
            GL_MAX_LIGHTS => Some(vec![self.max_lights]),
            GL_MAX_TEXTURE_SIZE => Some(vec![self.max_tex_size]),
            GL_MAX_TEXTURE_UNITS => Some(vec![self.gles.num_texture_units() as GLint]),
            GL_CLIENT_ACTIVE_TEXTURE => Some(vec![(GL_TEXTURE0 + self.client_active_texture as GLenum) as GLint]),
            GL_NUM_COMPRESSED_TEXTURE_FORMATS => Some(vec![COMPRESSED_TEXTURE_FORMATS.len() as GLint]),
            GL_COMPRESSED_TEXTURE_FORMATS => Some(COMPRESSED_TEXTURE_FORMATS.iter().map(|&f| f as GLint).collect()),
            GL_ALPHA_TEST_REF => {
                let mut value = [0.0];
                self.gles.driver().get_floatv(GL_ALPHA_TEST_REF, &mut value);
                // Map [0, 1] onto the full positive integer range
                Some(vec![(value[0] as f64 * i32::MAX as f64) as GLint])
            }
            GL_VERTEX_ARRAY => array_state(GL_VERTEX_ARRAY, |a| a.enabled() as GLint),
            GL_COLOR_ARRAY => array_state(GL_COLOR_ARRAY, |a| a.enabled() as GLint),
            GL_NORMAL_ARRAY => array_state(GL_NORMAL_ARRAY, |a| a.enabled() as GLint),
            GL_TEXTURE_COORD_ARRAY => array_state(GL_TEXTURE_COORD_ARRAY, |a| a.enabled() as GLint),
            GL_POINT_SIZE_ARRAY_OES => array_state(GL_POINT_SIZE_ARRAY_OES, |a| a.enabled() as GLint),
            GL_VERTEX_ARRAY_BUFFER_BINDING => array_state(GL_VERTEX_ARRAY, |a| a.vbo_local_name() as GLint),
            GL_COLOR_ARRAY_BUFFER_BINDING => array_state(GL_COLOR_ARRAY, |a| a.vbo_local_name() as GLint),
            GL_NORMAL_ARRAY_BUFFER_BINDING => array_state(GL_NORMAL_ARRAY, |a| a.vbo_local_name() as GLint),
            GL_TEXTURE_COORD_ARRAY_BUFFER_BINDING => {
                array_state(GL_TEXTURE_COORD_ARRAY, |a| a.vbo_local_name() as GLint)
            }
            GL_POINT_SIZE_ARRAY_BUFFER_BINDING_OES => {
                array_state(GL_POINT_SIZE_ARRAY_OES, |a| a.vbo_local_name() as GLint)
            }
            GL_VERTEX_ARRAY_STRIDE => array_state(GL_VERTEX_ARRAY, GlesArray::stride),
            GL_COLOR_ARRAY_STRIDE => array_state(GL_COLOR_ARRAY, GlesArray::stride),
            GL_NORMAL_ARRAY_STRIDE => array_state(GL_NORMAL_ARRAY, GlesArray::stride),
            GL_TEXTURE_COORD_ARRAY_STRIDE => array_state(GL_TEXTURE_COORD_ARRAY, GlesArray::stride),
            GL_POINT_SIZE_ARRAY_STRIDE_OES => array_state(GL_POINT_SIZE_ARRAY_OES, GlesArray::stride),
            GL_VERTEX_ARRAY_TYPE => array_state(GL_VERTEX_ARRAY, |a| a.type_() as GLint),
            GL_COLOR_ARRAY_TYPE => array_state(GL_COLOR_ARRAY, |a| a.type_() as GLint),
            GL_NORMAL_ARRAY_TYPE => array_state(GL_NORMAL_ARRAY, |a| a.type_() as GLint),
            GL_TEXTURE_COORD_ARRAY_TYPE => array_state(GL_TEXTURE_COORD_ARRAY, |a| a.type_() as GLint),
            GL_POINT_SIZE_ARRAY_TYPE_OES => array_state(GL_POINT_SIZE_ARRAY_OES, |a| a.type_() as GLint),
            GL_VERTEX_ARRAY_SIZE => array_state(GL_VERTEX_ARRAY, GlesArray::size),
            GL_COLOR_ARRAY_SIZE => array_state(GL_COLOR_ARRAY, GlesArray::size),
            GL_TEXTURE_COORD_ARRAY_SIZE => array_state(GL_TEXTURE_COORD_ARRAY, GlesArray::size),
            _ => None,
        }
    }

    fn get_floatv(&self, pname: GLenum) -> Option<Vec<GLfloat>> {
        // The host answers in floats already
        if pname == GL_ALPHA_TEST_REF {
            return None;
        }
        self.get_integerv(pname)
            .map(|v| v.into_iter().map(|x| x as GLfloat).collect())
    }

    fn is_enabled(&self, cap: GLenum) -> Option<bool> {
        match cap {
            GL_POINT_SIZE_ARRAY_OES => Some(self.array_enabled(ARRAY_POINTSIZE)),
            _ => None,
        }
    }

    fn extensions(&self) -> String {
        let mut extensions = String::from(BASE_EXTENSIONS);
        if self.gles.texture_npot {
            extensions.push_str("GL_OES_texture_npot ");
        }
        if self.gles.texture_filter_anisotropic {
            extensions.push_str("GL_EXT_texture_filter_anisotropic ");
        }
        if self.features.contains(Gles1Features::FRAMEBUFFER_OBJECT) {
            extensions.push_str(FRAMEBUFFER_EXTENSIONS);
            if self.gles.pack_depth_stencil {
                extensions.push_str("GL_OES_packed_depth_stencil ");
            }
        }
        if self.features.contains(Gles1Features::MATRIX_PALETTE) {
            extensions.push_str("GL_OES_matrix_palette ");
        }
        extensions
    }

    fn apply_array(&self, array: &GlesArray) {
        let driver = &self.driver;
        match array.index() {
            ARRAY_VERTEX => self.apply_pointer(array, |data| {
                driver.vertex_pointer(array.size(), array.host_type(), array.host_stride(), data)
            }),
            ARRAY_COLOR => self.apply_pointer(array, |data| {
                driver.color_pointer(array.size(), array.host_type(), array.host_stride(), data)
            }),
            ARRAY_NORMAL => self.apply_pointer(array, |data| {
                driver.normal_pointer(array.host_type(), array.host_stride(), data)
            }),
            // Consumed by the draw calls themselves
            ARRAY_POINTSIZE => {}
            index => {
                let unit = index - ARRAY_TEXCOORD;
                let switch = unit as usize != self.client_active_texture;
                if switch {
                    driver.client_active_texture(GL_TEXTURE0 + unit);
                }
                self.apply_pointer(array, |data| {
                    driver.tex_coord_pointer(array.size(), array.host_type(), array.host_stride(), data)
                });
                if switch {
                    driver.client_active_texture(GL_TEXTURE0 + self.client_active_texture as GLenum);
                }
            }
        }
    }

    fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        if !self.array_enabled(ARRAY_VERTEX) {
            return;
        }
        if mode != GL_POINTS || !self.array_enabled(ARRAY_POINTSIZE) {
            self.gles.driver().draw_arrays(mode, first, count);
            return;
        }

        let first_vertex = first.max(0) as usize;
        for (start, len, size) in self.point_size_runs(count.max(0) as usize, |i| first_vertex + i) {
            self.driver.point_size(size);
            self.gles
                .driver()
                .draw_arrays(GL_POINTS, first + start as GLint, len as GLsizei);
        }
    }

    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, type_: GLenum, indices: VertexData<'_>) {
        if !self.array_enabled(ARRAY_VERTEX) {
            return;
        }
        if mode != GL_POINTS || !self.array_enabled(ARRAY_POINTSIZE) {
            self.gles.driver().draw_elements(mode, count, type_, indices);
            return;
        }

        let el_size = match index_size(type_) {
            Some(el_size) => el_size,
            None => return,
        };
        let count = count.max(0) as usize;
        let index_bytes = match indices {
            VertexData::Client(bytes) => bytes.get(..count * el_size).map(<[u8]>::to_vec),
            VertexData::Offset(offset) => self.gles.ebo().and_then(|ebo| ebo.read(offset, count * el_size)),
        };
        let index_bytes = match index_bytes {
            Some(bytes) => bytes,
            None => {
                log::error!("gles1: point size draw without {} indices", count);
                return;
            }
        };
        let vertex = |i: usize| {
            let raw = &index_bytes[i * el_size..(i + 1) * el_size];
            let mut word = [0u8; 4];
            word[..el_size].copy_from_slice(raw);
            u32::from_le_bytes(word) as usize
        };

        for (start, len, size) in self.point_size_runs(count, vertex) {
            self.driver.point_size(size);
            let run = match indices {
                VertexData::Client(bytes) => VertexData::Client(&bytes[start * el_size..]),
                VertexData::Offset(offset) => VertexData::Offset(offset + start * el_size),
            };
            self.gles
                .driver()
                .draw_elements(GL_POINTS, len as GLsizei, type_, run);
        }
    }

    fn compressed_tex_image(
        &mut self,
        target: GLenum,
        level: GLint,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        image_size: GLsizei,
        data: Option<&[u8]>,
    ) -> GLenum {
        if target != GL_TEXTURE_2D {
            return GL_INVALID_ENUM;
        }
        match PaletteFormat::from_gl(internalformat) {
            Some(format) => {
                self.compressed_palette_image(format, level, width, height, border, image_size, data)
            }
            None => GL_INVALID_ENUM,
        }
    }
}
