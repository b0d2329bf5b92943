//! Host GL driver interfaces
//!
//! [`GlesDriver`] covers the entry points GLES1 and GLES2 share,
//! [`Gles1Driver`] the fixed-function pipeline and [`Gles2Driver`] the
//! programmable one. Vector variants of the C API are folded into slice
//! parameters.

use crate::gl::{GLbitfield, GLboolean, GLenum, GLfloat, GLint, GLsizei, GLuint};

/// Source of vertex or index data for a pointer/draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexData<'a> {
    /// Byte offset into the bound host buffer object
    Offset(usize),
    /// Host memory
    Client(&'a [u8]),
}

/// Result of `glGetActiveAttrib` / `glGetActiveUniform`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub size: GLint,
    pub type_: GLenum,
    pub name: String,
}

pub trait GlesDriver: Send + Sync {
    fn active_texture(&self, texture: GLenum);
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum);
    /// `data` of `None` allocates `size` undefined bytes
    fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]);
    fn clear(&self, mask: GLbitfield);
    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    fn clear_depth(&self, depth: GLfloat);
    fn clear_stencil(&self, s: GLint);
    fn color_mask(&self, red: GLboolean, green: GLboolean, blue: GLboolean, alpha: GLboolean);
    #[allow(clippy::too_many_arguments)]
    fn compressed_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn compressed_tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    );
    fn cull_face(&self, mode: GLenum);
    fn delete_buffers(&self, buffers: &[GLuint]);
    fn delete_textures(&self, textures: &[GLuint]);
    fn depth_func(&self, func: GLenum);
    fn depth_mask(&self, flag: GLboolean);
    fn depth_range(&self, z_near: GLfloat, z_far: GLfloat);
    fn disable(&self, cap: GLenum);
    fn enable(&self, cap: GLenum);
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, type_: GLenum, indices: VertexData<'_>);
    fn finish(&self);
    fn flush(&self);
    fn front_face(&self, mode: GLenum);
    fn gen_buffers(&self, n: usize) -> Vec<GLuint>;
    fn gen_textures(&self, n: usize) -> Vec<GLuint>;
    fn get_booleanv(&self, pname: GLenum, params: &mut [GLboolean]);
    fn get_buffer_parameteriv(&self, target: GLenum, pname: GLenum) -> GLint;
    fn get_error(&self) -> GLenum;
    fn get_floatv(&self, pname: GLenum, params: &mut [GLfloat]);
    fn get_integerv(&self, pname: GLenum, params: &mut [GLint]);
    fn get_string(&self, name: GLenum) -> String;
    fn get_tex_parameterfv(&self, target: GLenum, pname: GLenum, params: &mut [GLfloat]);
    fn get_tex_parameteriv(&self, target: GLenum, pname: GLenum, params: &mut [GLint]);
    fn hint(&self, target: GLenum, mode: GLenum);
    fn is_enabled(&self, cap: GLenum) -> bool;
    fn line_width(&self, width: GLfloat);
    fn pixel_storei(&self, pname: GLenum, param: GLint);
    fn polygon_offset(&self, factor: GLfloat, units: GLfloat);
    /// Read into host memory
    #[allow(clippy::too_many_arguments)]
    fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        pixels: &mut [u8],
    );
    /// Read into the bound pixel-pack buffer at `offset`
    #[allow(clippy::too_many_arguments)]
    fn read_pixels_to_pack(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        offset: usize,
    );
    fn sample_coverage(&self, value: GLfloat, invert: GLboolean);
    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn stencil_func(&self, func: GLenum, ref_: GLint, mask: GLuint);
    fn stencil_mask(&self, mask: GLuint);
    fn stencil_op(&self, fail: GLenum, zfail: GLenum, zpass: GLenum);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        type_: GLenum,
        pixels: Option<&[u8]>,
    );
    fn tex_parameterf(&self, target: GLenum, pname: GLenum, param: GLfloat);
    fn tex_parameterfv(&self, target: GLenum, pname: GLenum, params: &[GLfloat]);
    fn tex_parameteri(&self, target: GLenum, pname: GLenum, param: GLint);
    fn tex_parameteriv(&self, target: GLenum, pname: GLenum, params: &[GLint]);
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        pixels: &[u8],
    );
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);

    /// Copy of the bound buffer's store, `None` if it cannot be mapped
    fn map_buffer(&self, target: GLenum, access: GLenum) -> Option<Vec<u8>>;
    fn unmap_buffer(&self, target: GLenum);
    fn push_client_attrib(&self, mask: GLbitfield);
    fn pop_client_attrib(&self);

    fn gen_framebuffers(&self, n: usize) -> Vec<GLuint>;
    fn delete_framebuffers(&self, framebuffers: &[GLuint]);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    );
    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    );
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    fn get_framebuffer_attachment_parameteriv(
        &self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> GLint;
    fn gen_renderbuffers(&self, n: usize) -> Vec<GLuint>;
    fn delete_renderbuffers(&self, renderbuffers: &[GLuint]);
    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint);
    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    fn get_renderbuffer_parameteriv(&self, target: GLenum, pname: GLenum) -> GLint;
    fn generate_mipmap(&self, target: GLenum);
}

pub trait Gles1Driver: Send + Sync {
    fn alpha_func(&self, func: GLenum, ref_: GLfloat);
    fn clip_plane(&self, plane: GLenum, equation: &[GLfloat; 4]);
    fn get_clip_plane(&self, plane: GLenum) -> [GLfloat; 4];
    fn color4f(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    fn fogf(&self, pname: GLenum, param: GLfloat);
    fn fogfv(&self, pname: GLenum, params: &[GLfloat]);
    fn frustum(&self, l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat);
    fn ortho(&self, l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat);
    fn get_lightfv(&self, light: GLenum, pname: GLenum, params: &mut [GLfloat]);
    fn get_materialfv(&self, face: GLenum, pname: GLenum, params: &mut [GLfloat]);
    fn get_tex_envfv(&self, env: GLenum, pname: GLenum, params: &mut [GLfloat]);
    fn get_tex_enviv(&self, env: GLenum, pname: GLenum, params: &mut [GLint]);
    fn light_modelf(&self, pname: GLenum, param: GLfloat);
    fn light_modelfv(&self, pname: GLenum, params: &[GLfloat]);
    fn lightf(&self, light: GLenum, pname: GLenum, param: GLfloat);
    fn lightfv(&self, light: GLenum, pname: GLenum, params: &[GLfloat]);
    fn load_identity(&self);
    fn load_matrixf(&self, m: &[GLfloat; 16]);
    fn mult_matrixf(&self, m: &[GLfloat; 16]);
    fn materialf(&self, face: GLenum, pname: GLenum, param: GLfloat);
    fn materialfv(&self, face: GLenum, pname: GLenum, params: &[GLfloat]);
    fn matrix_mode(&self, mode: GLenum);
    fn multi_tex_coord4f(&self, target: GLenum, s: GLfloat, t: GLfloat, r: GLfloat, q: GLfloat);
    fn normal3f(&self, nx: GLfloat, ny: GLfloat, nz: GLfloat);
    fn point_parameterf(&self, pname: GLenum, param: GLfloat);
    fn point_parameterfv(&self, pname: GLenum, params: &[GLfloat]);
    fn point_size(&self, size: GLfloat);
    fn rotatef(&self, angle: GLfloat, x: GLfloat, y: GLfloat, z: GLfloat);
    fn scalef(&self, x: GLfloat, y: GLfloat, z: GLfloat);
    fn translatef(&self, x: GLfloat, y: GLfloat, z: GLfloat);
    fn shade_model(&self, mode: GLenum);
    fn tex_envf(&self, target: GLenum, pname: GLenum, param: GLfloat);
    fn tex_envfv(&self, target: GLenum, pname: GLenum, params: &[GLfloat]);
    fn tex_envi(&self, target: GLenum, pname: GLenum, param: GLint);
    fn tex_enviv(&self, target: GLenum, pname: GLenum, params: &[GLint]);
    fn logic_op(&self, opcode: GLenum);
    fn push_matrix(&self);
    fn pop_matrix(&self);
    fn client_active_texture(&self, texture: GLenum);
    fn enable_client_state(&self, array: GLenum);
    fn disable_client_state(&self, array: GLenum);
    fn vertex_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>);
    fn color_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>);
    fn normal_pointer(&self, type_: GLenum, stride: GLsizei, data: VertexData<'_>);
    fn tex_coord_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>);
}

pub trait Gles2Driver: Send + Sync {
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str);
    fn blend_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    fn blend_equation(&self, mode: GLenum);
    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn blend_func_separate(
        &self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    );
    fn compile_shader(&self, shader: GLuint);
    fn create_program(&self) -> GLuint;
    fn create_shader(&self, type_: GLenum) -> GLuint;
    fn delete_program(&self, program: GLuint);
    fn delete_shader(&self, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn get_active_attrib(&self, program: GLuint, index: GLuint) -> Option<ActiveVariable>;
    fn get_active_uniform(&self, program: GLuint, index: GLuint) -> Option<ActiveVariable>;
    fn get_attached_shaders(&self, program: GLuint) -> Vec<GLuint>;
    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint;
    fn get_programiv(&self, program: GLuint, pname: GLenum) -> GLint;
    fn get_program_info_log(&self, program: GLuint) -> String;
    fn get_shaderiv(&self, shader: GLuint, pname: GLenum) -> GLint;
    fn get_shader_info_log(&self, shader: GLuint) -> String;
    /// `(range, precision)`
    fn get_shader_precision_format(
        &self,
        shadertype: GLenum,
        precisiontype: GLenum,
    ) -> ([GLint; 2], GLint);
    fn get_uniformfv(&self, program: GLuint, location: GLint, params: &mut [GLfloat]);
    fn get_uniformiv(&self, program: GLuint, location: GLint, params: &mut [GLint]);
    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn get_vertex_attribfv(&self, index: GLuint, pname: GLenum, params: &mut [GLfloat]);
    fn get_vertex_attribiv(&self, index: GLuint, pname: GLenum, params: &mut [GLint]);
    fn link_program(&self, program: GLuint);
    fn release_shader_compiler(&self);
    fn shader_source(&self, shader: GLuint, source: &str);
    fn stencil_func_separate(&self, face: GLenum, func: GLenum, ref_: GLint, mask: GLuint);
    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint);
    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum);
    /// `glUniform{components}fv` with `values.len() / components` elements
    fn uniformfv(&self, location: GLint, components: usize, values: &[GLfloat]);
    fn uniformiv(&self, location: GLint, components: usize, values: &[GLint]);
    /// `glUniformMatrix{dim}fv`
    fn uniform_matrixfv(&self, location: GLint, dim: usize, transpose: GLboolean, values: &[GLfloat]);
    fn use_program(&self, program: GLuint);
    fn validate_program(&self, program: GLuint);
    /// `glVertexAttrib{values.len()}f`
    fn vertex_attribfv(&self, index: GLuint, values: &[GLfloat]);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        type_: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        data: VertexData<'_>,
    );
}
