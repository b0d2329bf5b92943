//! GLES2 context
//!
//! Every vertex attribute is one array. Host GL 2.x lacks a few ES
//! defaults: point sprites are switched on around point draws and the
//! ES uniform/varying vector limits are derived from the component limits.

use std::any::Any;
use std::sync::Arc;

use bitflags::bitflags;

use crate::client::{ClientApi, ClientContext};
use crate::config::PrecisionMode;
use crate::driver::{Gles2Driver, GlesDriver, VertexData};
use crate::gl::*;
use crate::gles::context::MAX_TEXTURE_UNITS;
use crate::gles::{ArrayConversion, GlesArray, GlesClient, GlesContext};
use crate::object::{EnsureContext, Sharegroup};
use crate::types::ObjectName;

const MANDATORY_EXTENSIONS: &str = "GL_OES_depth24 GL_OES_depth32 \
GL_OES_texture_float GL_OES_texture_float_linear GL_OES_depth_texture ";

/// Fragment shader the host compiler must accept for precision qualifiers
/// to pass through untouched
const PRECISION_TEST_SHADER: &str = "varying lowp vec4 c;\nvoid main(void) { gl_FragColor=c; }\n";

bitflags! {
    /// Optional host capabilities a GLES2 context exposes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Gles2Features: u32 {
        const TEXTURE_HALF_FLOAT = 1 << 0;
        const VERTEX_HALF_FLOAT = 1 << 1;
        const STANDARD_DERIVATIVES = 1 << 2;
    }
}

impl Gles2Features {
    pub fn from_extensions(extensions: &str) -> Self {
        let mut features = Gles2Features::empty();
        if extensions.contains("GL_ARB_half_float_pixel ") || extensions.contains("GL_NV_half_float ") {
            features |= Gles2Features::TEXTURE_HALF_FLOAT;
        }
        if extensions.contains("GL_ARB_half_float_vertex ") {
            features |= Gles2Features::VERTEX_HALF_FLOAT;
        }
        if extensions.contains("GL_OES_standard_derivatives ") {
            features |= Gles2Features::STANDARD_DERIVATIVES;
        }
        features
    }
}

pub struct Gles2Context {
    gles: GlesContext,
    driver: Arc<dyn Gles2Driver>,
    prepared: bool,

    precision_mode: PrecisionMode,
    strip_precision: bool,

    num_shader_binary_formats: GLint,
    features: Gles2Features,

    /// Program `glUseProgram` selected
    program_local_name: ObjectName,
}

impl Gles2Context {
    pub fn new(
        gles_driver: Arc<dyn GlesDriver>,
        driver: Arc<dyn Gles2Driver>,
        ensure: Arc<dyn EnsureContext>,
        sharegroup: Arc<Sharegroup>,
        precision_mode: PrecisionMode,
    ) -> Self {
        Self {
            gles: GlesContext::new(gles_driver, ensure, sharegroup),
            driver,
            prepared: false,
            precision_mode,
            strip_precision: true,
            num_shader_binary_formats: 0,
            features: Gles2Features::empty(),
            program_local_name: 0,
        }
    }

    pub fn driver(&self) -> &Arc<dyn Gles2Driver> {
        &self.driver
    }

    pub fn features(&self) -> Gles2Features {
        self.features
    }

    /// Whether shader sources are patched before reaching the host
    pub fn strip_precision(&self) -> bool {
        self.strip_precision
    }

    pub fn num_shader_binary_formats(&self) -> GLint {
        self.num_shader_binary_formats
    }

    pub fn num_arrays(&self) -> usize {
        self.gles.arrays.len()
    }

    pub fn program_local_name(&self) -> ObjectName {
        self.program_local_name
    }

    pub fn use_program(&mut self, local_name: ObjectName) {
        self.program_local_name = local_name;
    }

    /// Forget `local_name` if it is the current program
    pub fn unuse_program(&mut self, local_name: ObjectName) {
        if self.program_local_name == local_name {
            self.program_local_name = 0;
        }
    }

    fn query(&self, pname: GLenum) -> GLint {
        let mut value = [0 as GLint];
        self.gles.driver().get_integerv(pname, &mut value);
        value[0]
    }

    fn precision_supported(&self) -> bool {
        let shader = self.driver.create_shader(GL_FRAGMENT_SHADER);
        self.driver.shader_source(shader, PRECISION_TEST_SHADER);
        self.driver.compile_shader(shader);
        let status = self.driver.get_shaderiv(shader, GL_COMPILE_STATUS);
        self.driver.delete_shader(shader);

        if status == GL_FALSE as GLint {
            log::warn!("gles2: host GLSL compiler does not understand precision qualifiers");
            false
        } else {
            log::debug!("gles2: host GLSL compiler understands precision qualifiers");
            true
        }
    }

    fn prepare(&mut self) {
        let num_arrays = self.query(GL_MAX_VERTEX_ATTRIBS).max(0) as u32;
        // Host GL takes no GL_FIXED attributes
        let arrays = (0..num_arrays)
            .map(|index| GlesArray::new(index, ArrayConversion::FIXED))
            .collect();
        let num_texture_units = (self.query(GL_MAX_TEXTURE_IMAGE_UNITS).max(1) as usize).min(MAX_TEXTURE_UNITS);
        self.gles.prepare(arrays, num_texture_units);

        self.strip_precision = match self.precision_mode {
            PrecisionMode::Always => true,
            PrecisionMode::Never => false,
            PrecisionMode::Auto => !self.precision_supported(),
        };

        self.num_shader_binary_formats = self.query(GL_NUM_SHADER_BINARY_FORMATS);
        self.features = Gles2Features::from_extensions(&self.gles.driver().get_string(GL_EXTENSIONS));

        log::debug!(
            "gles2: prepared, {} arrays, {} texture units, strip precision {}, features {:?}",
            num_arrays,
            num_texture_units,
            self.strip_precision,
            self.features
        );
        self.prepared = true;
    }

    fn pre_draw(&self, mode: GLenum) {
        // ES has point sprites and gl_PointSize always on
        if mode == GL_POINTS {
            self.gles.driver().enable(GL_POINT_SPRITE);
            self.gles.driver().enable(GL_VERTEX_PROGRAM_POINT_SIZE);
        }
    }

    fn post_draw(&self, mode: GLenum) {
        if mode == GL_POINTS {
            self.gles.driver().disable(GL_VERTEX_PROGRAM_POINT_SIZE);
            self.gles.driver().disable(GL_POINT_SPRITE);
        }
    }
}

impl ClientContext for Gles2Context {
    fn client_api(&self) -> ClientApi {
        ClientApi::Gles2
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

impl GlesClient for Gles2Context {
    fn gles(&self) -> &GlesContext {
        &self.gles
    }

    fn gles_mut(&mut self) -> &mut GlesContext {
        &mut self.gles
    }

    fn get_param_count(&self, pname: GLenum) -> Option<usize> {
        let count = match pname {
            GL_SHADER_BINARY_FORMATS => self.num_shader_binary_formats.max(0) as usize,
            GL_BLEND_DST_ALPHA
            | GL_BLEND_DST_RGB
            | GL_BLEND_EQUATION_ALPHA
            | GL_BLEND_EQUATION_RGB
            | GL_BLEND_SRC_ALPHA
            | GL_BLEND_SRC_RGB
            | GL_CURRENT_PROGRAM
            | GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS
            | GL_MAX_FRAGMENT_UNIFORM_VECTORS
            | GL_MAX_TEXTURE_IMAGE_UNITS
            | GL_MAX_VARYING_VECTORS
            | GL_MAX_VERTEX_ATTRIBS
            | GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS
            | GL_MAX_VERTEX_UNIFORM_VECTORS
            | GL_NUM_SHADER_BINARY_FORMATS
            | GL_SHADER_COMPILER
            | GL_STENCIL_BACK_FAIL
            | GL_STENCIL_BACK_FUNC
            | GL_STENCIL_BACK_PASS_DEPTH_FAIL
            | GL_STENCIL_BACK_PASS_DEPTH_PASS
            | GL_STENCIL_BACK_REF
            | GL_STENCIL_BACK_VALUE_MASK
            | GL_STENCIL_BACK_WRITEMASK
            | GL_MAX_SAMPLES_IMG
            | GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT => 1,
            GL_BLEND_COLOR => 4,
            _ => return None,
        };
        Some(count)
    }

    fn get_integerv(&self, pname: GLenum) -> Option<Vec<GLint>> {
        let value = match pname {
            GL_CURRENT_PROGRAM => self.program_local_name as GLint,
            GL_MAX_VERTEX_ATTRIBS => self.gles.arrays.len() as GLint,
            GL_MAX_TEXTURE_IMAGE_UNITS => self.gles.num_texture_units() as GLint,
            GL_NUM_SHADER_BINARY_FORMATS => self.num_shader_binary_formats,
            GL_SHADER_COMPILER => GL_TRUE as GLint,
            GL_MAX_VERTEX_UNIFORM_VECTORS => self.query(GL_MAX_VERTEX_UNIFORM_COMPONENTS) / 4,
            GL_MAX_FRAGMENT_UNIFORM_VECTORS => self.query(GL_MAX_FRAGMENT_UNIFORM_COMPONENTS) / 4,
            GL_MAX_VARYING_VECTORS => self.query(GL_MAX_VARYING_FLOATS) / 4,
            _ => return None,
        };
        Some(vec![value])
    }

    fn extensions(&self) -> String {
        let mut extensions = String::from(MANDATORY_EXTENSIONS);
        if self.gles.pack_depth_stencil {
            extensions.push_str("GL_OES_packed_depth_stencil ");
        }
        if self.gles.texture_npot {
            extensions.push_str("GL_OES_texture_npot ");
        }
        if self.gles.texture_filter_anisotropic {
            extensions.push_str("GL_EXT_texture_filter_anisotropic ");
        }
        if self.features.contains(Gles2Features::TEXTURE_HALF_FLOAT) {
            extensions.push_str("GL_OES_texture_half_float GL_OES_texture_half_float_linear ");
        }
        if self.features.contains(Gles2Features::VERTEX_HALF_FLOAT) {
            extensions.push_str("GL_OES_vertex_half_float ");
        }
        if self.features.contains(Gles2Features::STANDARD_DERIVATIVES) {
            extensions.push_str("GL_OES_standard_derivatives ");
        }
        extensions
    }

    fn apply_array(&self, array: &GlesArray) {
        let pointer = |data: VertexData<'_>| {
            self.driver.vertex_attrib_pointer(
                array.index(),
                array.size(),
                array.host_type(),
                array.normalized(),
                array.host_stride(),
                data,
            )
        };
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

    fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        self.pre_draw(mode);
        self.gles.driver().draw_arrays(mode, first, count);
        self.post_draw(mode);
    }

    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, type_: GLenum, indices: VertexData<'_>) {
        self.pre_draw(mode);
        self.gles.driver().draw_elements(mode, count, type_, indices);
        self.post_draw(mode);
    }
}
