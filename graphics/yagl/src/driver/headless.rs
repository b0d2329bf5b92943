//! Recording host driver
//!
//! [`HeadlessDriver`] stands in for a host GL/EGL stack when no GPU is
//! attached. It hands out object names, tracks bindings, buffer stores and
//! shader/program state, answers limit queries with fixed values and keeps
//! a log of the calls that matter for observing the host side.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

use parking_lot::Mutex;

use super::egl::{EglDriver, NativeConfig, PbufferAttribs};
use super::gles::{ActiveVariable, Gles1Driver, Gles2Driver, GlesDriver, VertexData};
use crate::egl::consts::*;
use crate::gl::*;
use crate::types::NativeId;

/// Owned copy of a [`VertexData`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerData {
    Offset(usize),
    Bytes(Vec<u8>),
}

impl From<VertexData<'_>> for PointerData {
    fn from(data: VertexData<'_>) -> Self {
        match data {
            VertexData::Offset(offset) => PointerData::Offset(offset),
            VertexData::Client(bytes) => PointerData::Bytes(bytes.to_vec()),
        }
    }
}

/// One logged host call
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    MakeCurrent {
        ctx: Option<NativeId>,
        draw: Option<NativeId>,
        read: Option<NativeId>,
    },
    Flush,
    Finish,
    BindBuffer {
        target: GLenum,
        buffer: GLuint,
    },
    BufferData {
        target: GLenum,
        size: usize,
        data: Option<Vec<u8>>,
    },
    BufferSubData {
        target: GLenum,
        offset: usize,
        data: Vec<u8>,
    },
    /// Any `gl*Pointer` call; `index` is the attribute index for GLES2 and
    /// 0 otherwise
    Pointer {
        func: &'static str,
        index: GLuint,
        size: GLint,
        type_: GLenum,
        stride: GLsizei,
        data: PointerData,
    },
    DrawArrays {
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    },
    DrawElements {
        mode: GLenum,
        count: GLsizei,
        type_: GLenum,
        indices: PointerData,
    },
    PointSize(GLfloat),
    TexImage2D {
        target: GLenum,
        level: GLint,
        internalformat: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        data: Option<Vec<u8>>,
    },
    PixelStorei {
        pname: GLenum,
        param: GLint,
    },
    ShaderSource {
        shader: GLuint,
        source: String,
    },
    /// Everything else, by entry point name
    Call(&'static str),
}

struct BufferStore {
    data: Vec<u8>,
    usage: GLenum,
}

struct ShaderState {
    type_: GLenum,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramState {
    shaders: Vec<GLuint>,
    linked: bool,
    bound_attribs: HashMap<String, GLuint>,
    attribs: Vec<ActiveVariable>,
    uniforms: Vec<ActiveVariable>,
    uniform_values: HashMap<GLint, Vec<GLfloat>>,
    log: String,
}

struct State {
    calls: Vec<HostCall>,
    next_name: u32,
    bindings: HashMap<GLenum, GLuint>,
    active_texture: GLenum,
    client_active_texture: GLenum,
    buffers: HashMap<GLuint, BufferStore>,
    textures: HashSet<GLuint>,
    framebuffers: HashSet<GLuint>,
    renderbuffers: HashMap<GLuint, (GLenum, GLsizei, GLsizei)>,
    shaders: HashMap<GLuint, ShaderState>,
    programs: HashMap<GLuint, ProgramState>,
    current_program: GLuint,
    enabled: HashSet<GLenum>,
    pack_alignment: GLint,
    unpack_alignment: GLint,
    attrib_stack: Vec<(GLint, GLint)>,
    current: HashMap<ThreadId, NativeId>,
    displays: HashSet<NativeId>,
    surfaces: HashMap<NativeId, (u32, u32)>,
    contexts: HashSet<NativeId>,
}

impl State {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_name: 1,
            bindings: HashMap::new(),
            active_texture: GL_TEXTURE0,
            client_active_texture: GL_TEXTURE0,
            buffers: HashMap::new(),
            textures: HashSet::new(),
            framebuffers: HashSet::new(),
            renderbuffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            current_program: 0,
            enabled: HashSet::new(),
            pack_alignment: 4,
            unpack_alignment: 4,
            attrib_stack: Vec::new(),
            current: HashMap::new(),
            displays: HashSet::new(),
            surfaces: HashMap::new(),
            contexts: HashSet::new(),
        }
    }

    fn gen_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn gen_id(&mut self) -> NativeId {
        NativeId(self.gen_name() as u64)
    }

    fn bound(&self, target: GLenum) -> GLuint {
        self.bindings.get(&target).copied().unwrap_or(0)
    }

    fn bound_buffer_mut(&mut self, target: GLenum) -> Option<&mut BufferStore> {
        let name = self.bound(target);
        self.buffers.get_mut(&name)
    }
}

/// Fixed answers to limit queries
const LIMITS: &[(GLenum, &[GLint])] = &[
    (GL_MAX_TEXTURE_UNITS, &[4]),
    (GL_MAX_TEXTURE_IMAGE_UNITS, &[8]),
    (GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS, &[4]),
    (GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS, &[12]),
    (GL_MAX_VERTEX_ATTRIBS, &[16]),
    (GL_MAX_CLIP_PLANES, &[6]),
    (GL_MAX_LIGHTS, &[8]),
    (GL_MAX_TEXTURE_SIZE, &[4096]),
    (GL_MAX_CUBE_MAP_TEXTURE_SIZE, &[4096]),
    (GL_MAX_RENDERBUFFER_SIZE, &[4096]),
    (GL_MAX_VIEWPORT_DIMS, &[4096, 4096]),
    (GL_MAX_MODELVIEW_STACK_DEPTH, &[32]),
    (GL_MAX_PROJECTION_STACK_DEPTH, &[4]),
    (GL_MAX_TEXTURE_STACK_DEPTH, &[4]),
    (GL_MAX_FRAGMENT_UNIFORM_COMPONENTS, &[1024]),
    (GL_MAX_VERTEX_UNIFORM_COMPONENTS, &[1024]),
    (GL_MAX_VARYING_FLOATS, &[32]),
    (GL_NUM_COMPRESSED_TEXTURE_FORMATS, &[0]),
    (GL_NUM_SHADER_BINARY_FORMATS, &[0]),
    (GL_MAX_PALETTE_MATRICES_OES, &[32]),
    (GL_MAX_VERTEX_UNITS_OES, &[4]),
    (GL_ALIASED_POINT_SIZE_RANGE, &[1, 64]),
    (GL_ALIASED_LINE_WIDTH_RANGE, &[1, 8]),
];

const EXTENSIONS: &str = "GL_ARB_framebuffer_object GL_EXT_framebuffer_object \
GL_EXT_packed_depth_stencil GL_ARB_texture_non_power_of_two \
GL_EXT_texture_filter_anisotropic GL_ARB_half_float_pixel \
GL_ARB_half_float_vertex GL_ARB_vertex_blend GL_ARB_matrix_palette ";

const PRECISION_WORDS: &[&str] = &["precision", "lowp", "mediump", "highp"];

fn glsl_type(word: &str) -> GLenum {
    match word {
        "float" => GL_FLOAT,
        "int" => GL_INT,
        "vec2" => 0x8B50,
        "vec3" => 0x8B51,
        "vec4" => 0x8B52,
        "mat2" => 0x8B5A,
        "mat3" => 0x8B5B,
        "mat4" => 0x8B5C,
        "sampler2D" => 0x8B5E,
        "samplerCube" => 0x8B60,
        _ => GL_FLOAT,
    }
}

/// Declarations introduced by `qualifier` (`uniform`, `attribute`)
fn declarations(source: &str, qualifier: &str) -> Vec<ActiveVariable> {
    let mut vars = Vec::new();
    for statement in source.split(';') {
        let words: Vec<&str> = statement.split_whitespace().collect();
        let Some(pos) = words.iter().position(|w| *w == qualifier) else {
            continue;
        };
        let rest: Vec<&str> = words[pos + 1..]
            .iter()
            .copied()
            .filter(|w| !PRECISION_WORDS.contains(w))
            .collect();
        if rest.len() < 2 {
            continue;
        }
        let raw = rest[rest.len() - 1];
        let (name, size) = match raw.split_once('[') {
            Some((name, dim)) => (name, dim.trim_end_matches(']').parse().unwrap_or(1)),
            None => (raw, 1),
        };
        vars.push(ActiveVariable {
            size,
            type_: glsl_type(rest[0]),
            name: name.to_string(),
        });
    }
    vars
}

fn pixel_size(format: GLenum, type_: GLenum) -> usize {
    match (format, type_) {
        (_, GL_UNSIGNED_SHORT_5_6_5 | GL_UNSIGNED_SHORT_4_4_4_4 | GL_UNSIGNED_SHORT_5_5_5_1) => 2,
        (GL_RGB, _) => 3,
        (GL_ALPHA | GL_LUMINANCE, _) => 1,
        (GL_LUMINANCE_ALPHA, _) => 2,
        _ => 4,
    }
}

/// Synthetic framebuffer contents: row `y` is filled with byte `y`
fn fill_rows(
    out: &mut [u8],
    width: GLsizei,
    height: GLsizei,
    format: GLenum,
    type_: GLenum,
    alignment: GLint,
) {
    let alignment = alignment.max(1) as usize;
    let row = width.max(0) as usize * pixel_size(format, type_);
    let stride = (row + alignment - 1) / alignment * alignment;
    for y in 0..height.max(0) as usize {
        let start = y * stride;
        if start >= out.len() {
            break;
        }
        let end = (start + row).min(out.len());
        out[start..end].fill(y as u8);
    }
}

/// Host GL/EGL stand-in that records calls
pub struct HeadlessDriver {
    state: Mutex<State>,
    fail_make_current: AtomicBool,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
            fail_make_current: AtomicBool::new(false),
        }
    }

    /// Calls logged so far
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Calls logged so far, clearing the log
    pub fn take_calls(&self) -> Vec<HostCall> {
        core::mem::take(&mut self.state.lock().calls)
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make every following `make_current` fail
    pub fn set_fail_make_current(&self, fail: bool) {
        self.fail_make_current.store(fail, Ordering::SeqCst);
    }

    /// Host name bound to `target`, 0 if none
    pub fn binding(&self, target: GLenum) -> GLuint {
        self.state.lock().bound(target)
    }

    /// Contents of host buffer `name`
    pub fn buffer_store(&self, name: GLuint) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&name).map(|b| b.data.clone())
    }

    /// Number of live host buffer objects
    pub fn num_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of live host textures
    pub fn num_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Number of live host contexts
    pub fn num_contexts(&self) -> usize {
        self.state.lock().contexts.len()
    }

    fn record(&self, call: HostCall) {
        self.state.lock().calls.push(call);
    }

    fn call(&self, name: &'static str) {
        self.record(HostCall::Call(name));
    }

    fn gen_names(&self, n: usize, name: &'static str) -> Vec<GLuint> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::Call(name));
        (0..n).map(|_| state.gen_name()).collect()
    }

    fn integer(&self, pname: GLenum, params: &mut [GLint]) {
        let state = self.state.lock();
        let value = match pname {
            GL_ARRAY_BUFFER_BINDING => state.bound(GL_ARRAY_BUFFER) as GLint,
            GL_ELEMENT_ARRAY_BUFFER_BINDING => state.bound(GL_ELEMENT_ARRAY_BUFFER) as GLint,
            GL_PIXEL_PACK_BUFFER_BINDING => state.bound(GL_PIXEL_PACK_BUFFER) as GLint,
            GL_TEXTURE_BINDING_2D => state.bound(GL_TEXTURE_2D) as GLint,
            GL_TEXTURE_BINDING_CUBE_MAP => state.bound(GL_TEXTURE_CUBE_MAP) as GLint,
            GL_FRAMEBUFFER_BINDING => state.bound(GL_FRAMEBUFFER) as GLint,
            GL_RENDERBUFFER_BINDING => state.bound(GL_RENDERBUFFER) as GLint,
            GL_CURRENT_PROGRAM => state.current_program as GLint,
            GL_ACTIVE_TEXTURE => state.active_texture as GLint,
            GL_CLIENT_ACTIVE_TEXTURE => state.client_active_texture as GLint,
            GL_PACK_ALIGNMENT => state.pack_alignment,
            GL_UNPACK_ALIGNMENT => state.unpack_alignment,
            _ => {
                let values = LIMITS
                    .iter()
                    .find(|(p, _)| *p == pname)
                    .map(|(_, v)| *v)
                    .unwrap_or(&[]);
                params.fill(0);
                for (dst, src) in params.iter_mut().zip(values) {
                    *dst = *src;
                }
                return;
            }
        };
        params.fill(0);
        if let Some(first) = params.first_mut() {
            *first = value;
        }
    }
}

impl EglDriver for HeadlessDriver {
    fn display_open(&self, native_dpy: NativeId) -> Option<NativeId> {
        let mut state = self.state.lock();
        let dpy = state.gen_id();
        state.displays.insert(dpy);
        log::debug!("headless: display {:?} opened for native {:?}", dpy, native_dpy);
        Some(dpy)
    }

    fn display_close(&self, dpy: NativeId) {
        self.state.lock().displays.remove(&dpy);
    }

    fn config_enum(&self, dpy: NativeId) -> Vec<NativeConfig> {
        if !self.state.lock().displays.contains(&dpy) {
            return Vec::new();
        }

        let base = NativeConfig {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 8,
            buffer_size: 32,
            caveat: EGL_NONE,
            config_id: 1,
            conformant: EGL_OPENGL_ES_BIT | EGL_OPENGL_ES2_BIT,
            depth_size: 24,
            frame_buffer_level: 0,
            max_pbuffer_width: 4096,
            max_pbuffer_height: 4096,
            max_pbuffer_size: 4096 * 4096,
            max_swap_interval: 1,
            min_swap_interval: 0,
            native_renderable: EGL_TRUE as i32,
            native_visual_id: 0x21,
            native_visual_type: 4,
            renderable_type: EGL_OPENGL_ES_BIT | EGL_OPENGL_ES2_BIT,
            sample_buffers_num: 0,
            samples_per_pixel: 0,
            stencil_size: 8,
            surface_type: EGL_WINDOW_BIT | EGL_PIXMAP_BIT | EGL_PBUFFER_BIT,
            transparent_type: EGL_NONE,
            trans_red_val: 0,
            trans_green_val: 0,
            trans_blue_val: 0,
            bind_to_texture_rgb: EGL_TRUE as i32,
            bind_to_texture_rgba: EGL_TRUE as i32,
            match_format_khr: EGL_FORMAT_RGBA_8888_EXACT_KHR,
            handle: NativeId(0x1001),
        };

        vec![
            base,
            NativeConfig {
                red_size: 5,
                green_size: 6,
                blue_size: 5,
                alpha_size: 0,
                buffer_size: 16,
                config_id: 2,
                match_format_khr: EGL_FORMAT_RGB_565_EXACT_KHR,
                handle: NativeId(0x1002),
                ..base
            },
            NativeConfig {
                caveat: EGL_SLOW_CONFIG,
                config_id: 3,
                sample_buffers_num: 1,
                samples_per_pixel: 4,
                handle: NativeId(0x1003),
                ..base
            },
            NativeConfig {
                config_id: 4,
                depth_size: 0,
                stencil_size: 0,
                handle: NativeId(0x1004),
                ..base
            },
        ]
    }

    fn pbuffer_surface_create(
        &self,
        dpy: NativeId,
        _cfg: &NativeConfig,
        width: u32,
        height: u32,
        _attribs: &PbufferAttribs,
    ) -> Option<NativeId> {
        let mut state = self.state.lock();
        if !state.displays.contains(&dpy) {
            return None;
        }
        let sfc = state.gen_id();
        state.surfaces.insert(sfc, (width, height));
        state.calls.push(HostCall::Call("eglCreatePbufferSurface"));
        Some(sfc)
    }

    fn pbuffer_surface_destroy(&self, _dpy: NativeId, sfc: NativeId) {
        let mut state = self.state.lock();
        state.surfaces.remove(&sfc);
        state.calls.push(HostCall::Call("eglDestroySurface"));
    }

    fn context_create(
        &self,
        dpy: NativeId,
        _cfg: &NativeConfig,
        share: Option<NativeId>,
    ) -> Option<NativeId> {
        let mut state = self.state.lock();
        if !state.displays.contains(&dpy) {
            return None;
        }
        if let Some(share) = share {
            if !state.contexts.contains(&share) {
                return None;
            }
        }
        let ctx = state.gen_id();
        state.contexts.insert(ctx);
        state.calls.push(HostCall::Call("eglCreateContext"));
        Some(ctx)
    }

    fn context_destroy(&self, _dpy: NativeId, ctx: NativeId) {
        let mut state = self.state.lock();
        state.contexts.remove(&ctx);
        state.current.retain(|_, c| *c != ctx);
        state.calls.push(HostCall::Call("eglDestroyContext"));
    }

    fn make_current(
        &self,
        _dpy: NativeId,
        draw: Option<NativeId>,
        read: Option<NativeId>,
        ctx: Option<NativeId>,
    ) -> bool {
        let mut state = self.state.lock();
        state.calls.push(HostCall::MakeCurrent { ctx, draw, read });

        if self.fail_make_current.load(Ordering::SeqCst) {
            return false;
        }

        let thread = std::thread::current().id();
        match ctx {
            Some(ctx) => {
                if !state.contexts.contains(&ctx) {
                    return false;
                }
                for sfc in [draw, read].into_iter().flatten() {
                    if !state.surfaces.contains_key(&sfc) {
                        return false;
                    }
                }
                state.current.insert(thread, ctx);
            }
            None => {
                state.current.remove(&thread);
            }
        }
        true
    }

    fn current_context(&self) -> Option<NativeId> {
        self.state
            .lock()
            .current
            .get(&std::thread::current().id())
            .copied()
    }
}

impl GlesDriver for HeadlessDriver {
    fn active_texture(&self, texture: GLenum) {
        let mut state = self.state.lock();
        state.active_texture = texture;
        state.calls.push(HostCall::Call("glActiveTexture"));
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        let mut state = self.state.lock();
        state.bindings.insert(target, buffer);
        if buffer != 0 {
            state.buffers.entry(buffer).or_insert(BufferStore {
                data: Vec::new(),
                usage: GL_STATIC_DRAW,
            });
        }
        state.calls.push(HostCall::BindBuffer { target, buffer });
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        let mut state = self.state.lock();
        state.bindings.insert(target, texture);
        if texture != 0 {
            state.textures.insert(texture);
        }
        state.calls.push(HostCall::Call("glBindTexture"));
    }

    fn blend_func(&self, _sfactor: GLenum, _dfactor: GLenum) {
        self.call("glBlendFunc");
    }

    fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum) {
        let mut state = self.state.lock();
        if let Some(store) = state.bound_buffer_mut(target) {
            store.data = match data {
                Some(bytes) => bytes[..size.min(bytes.len())].to_vec(),
                None => vec![0; size],
            };
            store.data.resize(size, 0);
            store.usage = usage;
        }
        state.calls.push(HostCall::BufferData {
            target,
            size,
            data: data.map(<[u8]>::to_vec),
        });
    }

    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        let mut state = self.state.lock();
        if let Some(store) = state.bound_buffer_mut(target) {
            let end = (offset + data.len()).min(store.data.len());
            if offset < end {
                store.data[offset..end].copy_from_slice(&data[..end - offset]);
            }
        }
        state.calls.push(HostCall::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
    }

    fn clear(&self, _mask: GLbitfield) {
        self.call("glClear");
    }

    fn clear_color(&self, _red: GLfloat, _green: GLfloat, _blue: GLfloat, _alpha: GLfloat) {
        self.call("glClearColor");
    }

    fn clear_depth(&self, _depth: GLfloat) {
        self.call("glClearDepth");
    }

    fn clear_stencil(&self, _s: GLint) {
        self.call("glClearStencil");
    }

    fn color_mask(&self, _red: GLboolean, _green: GLboolean, _blue: GLboolean, _alpha: GLboolean) {
        self.call("glColorMask");
    }

    fn compressed_tex_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        _internalformat: GLenum,
        _width: GLsizei,
        _height: GLsizei,
        _border: GLint,
        _data: &[u8],
    ) {
        self.call("glCompressedTexImage2D");
    }

    fn compressed_tex_sub_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        _xoffset: GLint,
        _yoffset: GLint,
        _width: GLsizei,
        _height: GLsizei,
        _format: GLenum,
        _data: &[u8],
    ) {
        self.call("glCompressedTexSubImage2D");
    }

    fn copy_tex_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        _internalformat: GLenum,
        _x: GLint,
        _y: GLint,
        _width: GLsizei,
        _height: GLsizei,
        _border: GLint,
    ) {
        self.call("glCopyTexImage2D");
    }

    fn copy_tex_sub_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        _xoffset: GLint,
        _yoffset: GLint,
        _x: GLint,
        _y: GLint,
        _width: GLsizei,
        _height: GLsizei,
    ) {
        self.call("glCopyTexSubImage2D");
    }

    fn cull_face(&self, _mode: GLenum) {
        self.call("glCullFace");
    }

    fn delete_buffers(&self, buffers: &[GLuint]) {
        let mut state = self.state.lock();
        for name in buffers {
            state.buffers.remove(name);
            state.bindings.retain(|target, bound| {
                !(*bound == *name
                    && matches!(
                        *target,
                        GL_ARRAY_BUFFER | GL_ELEMENT_ARRAY_BUFFER | GL_PIXEL_PACK_BUFFER
                    ))
            });
        }
        state.calls.push(HostCall::Call("glDeleteBuffers"));
    }

    fn delete_textures(&self, textures: &[GLuint]) {
        let mut state = self.state.lock();
        for name in textures {
            state.textures.remove(name);
        }
        state.calls.push(HostCall::Call("glDeleteTextures"));
    }

    fn depth_func(&self, _func: GLenum) {
        self.call("glDepthFunc");
    }

    fn depth_mask(&self, _flag: GLboolean) {
        self.call("glDepthMask");
    }

    fn depth_range(&self, _z_near: GLfloat, _z_far: GLfloat) {
        self.call("glDepthRange");
    }

    fn disable(&self, cap: GLenum) {
        let mut state = self.state.lock();
        state.enabled.remove(&cap);
        state.calls.push(HostCall::Call("glDisable"));
    }

    fn enable(&self, cap: GLenum) {
        let mut state = self.state.lock();
        state.enabled.insert(cap);
        state.calls.push(HostCall::Call("glEnable"));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(HostCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, type_: GLenum, indices: VertexData<'_>) {
        self.record(HostCall::DrawElements {
            mode,
            count,
            type_,
            indices: indices.into(),
        });
    }

    fn finish(&self) {
        self.record(HostCall::Finish);
    }

    fn flush(&self) {
        self.record(HostCall::Flush);
    }

    fn front_face(&self, _mode: GLenum) {
        self.call("glFrontFace");
    }

    fn gen_buffers(&self, n: usize) -> Vec<GLuint> {
        let names = self.gen_names(n, "glGenBuffers");
        let mut state = self.state.lock();
        for &name in &names {
            state.buffers.insert(
                name,
                BufferStore {
                    data: Vec::new(),
                    usage: GL_STATIC_DRAW,
                },
            );
        }
        names
    }

    fn gen_textures(&self, n: usize) -> Vec<GLuint> {
        let names = self.gen_names(n, "glGenTextures");
        self.state.lock().textures.extend(names.iter().copied());
        names
    }

    fn get_booleanv(&self, pname: GLenum, params: &mut [GLboolean]) {
        let mut ints = vec![0; params.len()];
        self.integer(pname, &mut ints);
        for (dst, src) in params.iter_mut().zip(ints) {
            *dst = (src != 0) as GLboolean;
        }
    }

    fn get_buffer_parameteriv(&self, target: GLenum, pname: GLenum) -> GLint {
        let state = self.state.lock();
        let name = state.bound(target);
        match (state.buffers.get(&name), pname) {
            (Some(store), GL_BUFFER_SIZE) => store.data.len() as GLint,
            (Some(store), GL_BUFFER_USAGE) => store.usage as GLint,
            _ => 0,
        }
    }

    fn get_error(&self) -> GLenum {
        GL_NO_ERROR
    }

    fn get_floatv(&self, pname: GLenum, params: &mut [GLfloat]) {
        let mut ints = vec![0; params.len()];
        self.integer(pname, &mut ints);
        for (dst, src) in params.iter_mut().zip(ints) {
            *dst = src as GLfloat;
        }
    }

    fn get_integerv(&self, pname: GLenum, params: &mut [GLint]) {
        self.integer(pname, params);
    }

    fn get_string(&self, name: GLenum) -> String {
        match name {
            GL_VENDOR => "YaGL".to_string(),
            GL_RENDERER => "YaGL headless".to_string(),
            GL_VERSION => "2.1 headless".to_string(),
            GL_SHADING_LANGUAGE_VERSION => "1.20".to_string(),
            GL_EXTENSIONS => EXTENSIONS.to_string(),
            _ => String::new(),
        }
    }

    fn get_tex_parameterfv(&self, _target: GLenum, _pname: GLenum, params: &mut [GLfloat]) {
        params.fill(0.0);
    }

    fn get_tex_parameteriv(&self, _target: GLenum, _pname: GLenum, params: &mut [GLint]) {
        params.fill(0);
    }

    fn hint(&self, _target: GLenum, _mode: GLenum) {
        self.call("glHint");
    }

    fn is_enabled(&self, cap: GLenum) -> bool {
        self.state.lock().enabled.contains(&cap)
    }

    fn line_width(&self, _width: GLfloat) {
        self.call("glLineWidth");
    }

    fn pixel_storei(&self, pname: GLenum, param: GLint) {
        let mut state = self.state.lock();
        match pname {
            GL_PACK_ALIGNMENT => state.pack_alignment = param,
            GL_UNPACK_ALIGNMENT => state.unpack_alignment = param,
            _ => {}
        }
        state.calls.push(HostCall::PixelStorei { pname, param });
    }

    fn polygon_offset(&self, _factor: GLfloat, _units: GLfloat) {
        self.call("glPolygonOffset");
    }

    fn read_pixels(
        &self,
        _x: GLint,
        _y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        pixels: &mut [u8],
    ) {
        let mut state = self.state.lock();
        fill_rows(pixels, width, height, format, type_, state.pack_alignment);
        state.calls.push(HostCall::Call("glReadPixels"));
    }

    fn read_pixels_to_pack(
        &self,
        _x: GLint,
        _y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        offset: usize,
    ) {
        let mut state = self.state.lock();
        let alignment = state.pack_alignment;
        if let Some(store) = state.bound_buffer_mut(GL_PIXEL_PACK_BUFFER) {
            if offset < store.data.len() {
                fill_rows(&mut store.data[offset..], width, height, format, type_, alignment);
            }
        }
        state.calls.push(HostCall::Call("glReadPixels"));
    }

    fn sample_coverage(&self, _value: GLfloat, _invert: GLboolean) {
        self.call("glSampleCoverage");
    }

    fn scissor(&self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
        self.call("glScissor");
    }

    fn stencil_func(&self, _func: GLenum, _ref: GLint, _mask: GLuint) {
        self.call("glStencilFunc");
    }

    fn stencil_mask(&self, _mask: GLuint) {
        self.call("glStencilMask");
    }

    fn stencil_op(&self, _fail: GLenum, _zfail: GLenum, _zpass: GLenum) {
        self.call("glStencilOp");
    }

    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLint,
        width: GLsizei,
        height: GLsizei,
        _border: GLint,
        format: GLenum,
        type_: GLenum,
        pixels: Option<&[u8]>,
    ) {
        self.record(HostCall::TexImage2D {
            target,
            level,
            internalformat,
            width,
            height,
            format,
            type_,
            data: pixels.map(<[u8]>::to_vec),
        });
    }

    fn tex_parameterf(&self, _target: GLenum, _pname: GLenum, _param: GLfloat) {
        self.call("glTexParameterf");
    }

    fn tex_parameterfv(&self, _target: GLenum, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glTexParameterfv");
    }

    fn tex_parameteri(&self, _target: GLenum, _pname: GLenum, _param: GLint) {
        self.call("glTexParameteri");
    }

    fn tex_parameteriv(&self, _target: GLenum, _pname: GLenum, _params: &[GLint]) {
        self.call("glTexParameteriv");
    }

    fn tex_sub_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        _xoffset: GLint,
        _yoffset: GLint,
        _width: GLsizei,
        _height: GLsizei,
        _format: GLenum,
        _type: GLenum,
        _pixels: &[u8],
    ) {
        self.call("glTexSubImage2D");
    }

    fn viewport(&self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
        self.call("glViewport");
    }

    fn map_buffer(&self, target: GLenum, _access: GLenum) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let name = state.bound(target);
        state.buffers.get(&name).map(|store| store.data.clone())
    }

    fn unmap_buffer(&self, _target: GLenum) {
        self.call("glUnmapBuffer");
    }

    fn push_client_attrib(&self, _mask: GLbitfield) {
        let mut state = self.state.lock();
        let saved = (state.pack_alignment, state.unpack_alignment);
        state.attrib_stack.push(saved);
        state.calls.push(HostCall::Call("glPushClientAttrib"));
    }

    fn pop_client_attrib(&self) {
        let mut state = self.state.lock();
        if let Some((pack, unpack)) = state.attrib_stack.pop() {
            state.pack_alignment = pack;
            state.unpack_alignment = unpack;
        }
        state.calls.push(HostCall::Call("glPopClientAttrib"));
    }

    fn gen_framebuffers(&self, n: usize) -> Vec<GLuint> {
        let names = self.gen_names(n, "glGenFramebuffers");
        self.state.lock().framebuffers.extend(names.iter().copied());
        names
    }

    fn delete_framebuffers(&self, framebuffers: &[GLuint]) {
        let mut state = self.state.lock();
        for name in framebuffers {
            state.framebuffers.remove(name);
        }
        state.calls.push(HostCall::Call("glDeleteFramebuffers"));
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        let mut state = self.state.lock();
        state.bindings.insert(target, framebuffer);
        state.calls.push(HostCall::Call("glBindFramebuffer"));
    }

    fn framebuffer_texture_2d(
        &self,
        _target: GLenum,
        _attachment: GLenum,
        _textarget: GLenum,
        _texture: GLuint,
        _level: GLint,
    ) {
        self.call("glFramebufferTexture2D");
    }

    fn framebuffer_renderbuffer(
        &self,
        _target: GLenum,
        _attachment: GLenum,
        _renderbuffertarget: GLenum,
        _renderbuffer: GLuint,
    ) {
        self.call("glFramebufferRenderbuffer");
    }

    fn check_framebuffer_status(&self, _target: GLenum) -> GLenum {
        GL_FRAMEBUFFER_COMPLETE
    }

    fn get_framebuffer_attachment_parameteriv(
        &self,
        _target: GLenum,
        _attachment: GLenum,
        _pname: GLenum,
    ) -> GLint {
        0
    }

    fn gen_renderbuffers(&self, n: usize) -> Vec<GLuint> {
        let names = self.gen_names(n, "glGenRenderbuffers");
        let mut state = self.state.lock();
        for &name in &names {
            state.renderbuffers.insert(name, (GL_RGBA, 0, 0));
        }
        names
    }

    fn delete_renderbuffers(&self, renderbuffers: &[GLuint]) {
        let mut state = self.state.lock();
        for name in renderbuffers {
            state.renderbuffers.remove(name);
        }
        state.calls.push(HostCall::Call("glDeleteRenderbuffers"));
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        let mut state = self.state.lock();
        state.bindings.insert(target, renderbuffer);
        state.calls.push(HostCall::Call("glBindRenderbuffer"));
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        let mut state = self.state.lock();
        let name = state.bound(target);
        if let Some(storage) = state.renderbuffers.get_mut(&name) {
            *storage = (internalformat, width, height);
        }
        state.calls.push(HostCall::Call("glRenderbufferStorage"));
    }

    fn get_renderbuffer_parameteriv(&self, target: GLenum, pname: GLenum) -> GLint {
        let state = self.state.lock();
        let name = state.bound(target);
        match (state.renderbuffers.get(&name), pname) {
            (Some((_, width, _)), GL_RENDERBUFFER_WIDTH) => *width,
            (Some((_, _, height)), GL_RENDERBUFFER_HEIGHT) => *height,
            (Some((format, _, _)), GL_RENDERBUFFER_INTERNAL_FORMAT) => *format as GLint,
            _ => 0,
        }
    }

    fn generate_mipmap(&self, _target: GLenum) {
        self.call("glGenerateMipmap");
    }
}

impl Gles1Driver for HeadlessDriver {
    fn alpha_func(&self, _func: GLenum, _ref: GLfloat) {
        self.call("glAlphaFunc");
    }

    fn clip_plane(&self, _plane: GLenum, _equation: &[GLfloat; 4]) {
        self.call("glClipPlane");
    }

    fn get_clip_plane(&self, _plane: GLenum) -> [GLfloat; 4] {
        [0.0; 4]
    }

    fn color4f(&self, _red: GLfloat, _green: GLfloat, _blue: GLfloat, _alpha: GLfloat) {
        self.call("glColor4f");
    }

    fn fogf(&self, _pname: GLenum, _param: GLfloat) {
        self.call("glFogf");
    }

    fn fogfv(&self, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glFogfv");
    }

    fn frustum(&self, _l: GLfloat, _r: GLfloat, _b: GLfloat, _t: GLfloat, _n: GLfloat, _f: GLfloat) {
        self.call("glFrustum");
    }

    fn ortho(&self, _l: GLfloat, _r: GLfloat, _b: GLfloat, _t: GLfloat, _n: GLfloat, _f: GLfloat) {
        self.call("glOrtho");
    }

    fn get_lightfv(&self, _light: GLenum, _pname: GLenum, params: &mut [GLfloat]) {
        params.fill(0.0);
    }

    fn get_materialfv(&self, _face: GLenum, _pname: GLenum, params: &mut [GLfloat]) {
        params.fill(0.0);
    }

    fn get_tex_envfv(&self, _env: GLenum, _pname: GLenum, params: &mut [GLfloat]) {
        params.fill(0.0);
    }

    fn get_tex_enviv(&self, _env: GLenum, _pname: GLenum, params: &mut [GLint]) {
        params.fill(0);
    }

    fn light_modelf(&self, _pname: GLenum, _param: GLfloat) {
        self.call("glLightModelf");
    }

    fn light_modelfv(&self, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glLightModelfv");
    }

    fn lightf(&self, _light: GLenum, _pname: GLenum, _param: GLfloat) {
        self.call("glLightf");
    }

    fn lightfv(&self, _light: GLenum, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glLightfv");
    }

    fn load_identity(&self) {
        self.call("glLoadIdentity");
    }

    fn load_matrixf(&self, _m: &[GLfloat; 16]) {
        self.call("glLoadMatrixf");
    }

    fn mult_matrixf(&self, _m: &[GLfloat; 16]) {
        self.call("glMultMatrixf");
    }

    fn materialf(&self, _face: GLenum, _pname: GLenum, _param: GLfloat) {
        self.call("glMaterialf");
    }

    fn materialfv(&self, _face: GLenum, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glMaterialfv");
    }

    fn matrix_mode(&self, _mode: GLenum) {
        self.call("glMatrixMode");
    }

    fn multi_tex_coord4f(&self, _target: GLenum, _s: GLfloat, _t: GLfloat, _r: GLfloat, _q: GLfloat) {
        self.call("glMultiTexCoord4f");
    }

    fn normal3f(&self, _nx: GLfloat, _ny: GLfloat, _nz: GLfloat) {
        self.call("glNormal3f");
    }

    fn point_parameterf(&self, _pname: GLenum, _param: GLfloat) {
        self.call("glPointParameterf");
    }

    fn point_parameterfv(&self, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glPointParameterfv");
    }

    fn point_size(&self, size: GLfloat) {
        self.record(HostCall::PointSize(size));
    }

    fn rotatef(&self, _angle: GLfloat, _x: GLfloat, _y: GLfloat, _z: GLfloat) {
        self.call("glRotatef");
    }

    fn scalef(&self, _x: GLfloat, _y: GLfloat, _z: GLfloat) {
        self.call("glScalef");
    }

    fn translatef(&self, _x: GLfloat, _y: GLfloat, _z: GLfloat) {
        self.call("glTranslatef");
    }

    fn shade_model(&self, _mode: GLenum) {
        self.call("glShadeModel");
    }

    fn tex_envf(&self, _target: GLenum, _pname: GLenum, _param: GLfloat) {
        self.call("glTexEnvf");
    }

    fn tex_envfv(&self, _target: GLenum, _pname: GLenum, _params: &[GLfloat]) {
        self.call("glTexEnvfv");
    }

    fn tex_envi(&self, _target: GLenum, _pname: GLenum, _param: GLint) {
        self.call("glTexEnvi");
    }

    fn tex_enviv(&self, _target: GLenum, _pname: GLenum, _params: &[GLint]) {
        self.call("glTexEnviv");
    }

    fn logic_op(&self, _opcode: GLenum) {
        self.call("glLogicOp");
    }

    fn push_matrix(&self) {
        self.call("glPushMatrix");
    }

    fn pop_matrix(&self) {
        self.call("glPopMatrix");
    }

    fn client_active_texture(&self, texture: GLenum) {
        let mut state = self.state.lock();
        state.client_active_texture = texture;
        state.calls.push(HostCall::Call("glClientActiveTexture"));
    }

    fn enable_client_state(&self, _array: GLenum) {
        self.call("glEnableClientState");
    }

    fn disable_client_state(&self, _array: GLenum) {
        self.call("glDisableClientState");
    }

    fn vertex_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>) {
        self.record(HostCall::Pointer {
            func: "glVertexPointer",
            index: 0,
            size,
            type_,
            stride,
            data: data.into(),
        });
    }

    fn color_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>) {
        self.record(HostCall::Pointer {
            func: "glColorPointer",
            index: 0,
            size,
            type_,
            stride,
            data: data.into(),
        });
    }

    fn normal_pointer(&self, type_: GLenum, stride: GLsizei, data: VertexData<'_>) {
        self.record(HostCall::Pointer {
            func: "glNormalPointer",
            index: 0,
            size: 3,
            type_,
            stride,
            data: data.into(),
        });
    }

    fn tex_coord_pointer(&self, size: GLint, type_: GLenum, stride: GLsizei, data: VertexData<'_>) {
        self.record(HostCall::Pointer {
            func: "glTexCoordPointer",
            index: 0,
            size,
            type_,
            stride,
            data: data.into(),
        });
    }
}

impl Gles2Driver for HeadlessDriver {
    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.lock();
        if let Some(prog) = state.programs.get_mut(&program) {
            if !prog.shaders.contains(&shader) {
                prog.shaders.push(shader);
            }
        }
        state.calls.push(HostCall::Call("glAttachShader"));
    }

    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        let mut state = self.state.lock();
        if let Some(prog) = state.programs.get_mut(&program) {
            prog.bound_attribs.insert(name.to_string(), index);
        }
        state.calls.push(HostCall::Call("glBindAttribLocation"));
    }

    fn blend_color(&self, _red: GLfloat, _green: GLfloat, _blue: GLfloat, _alpha: GLfloat) {
        self.call("glBlendColor");
    }

    fn blend_equation(&self, _mode: GLenum) {
        self.call("glBlendEquation");
    }

    fn blend_equation_separate(&self, _mode_rgb: GLenum, _mode_alpha: GLenum) {
        self.call("glBlendEquationSeparate");
    }

    fn blend_func_separate(
        &self,
        _src_rgb: GLenum,
        _dst_rgb: GLenum,
        _src_alpha: GLenum,
        _dst_alpha: GLenum,
    ) {
        self.call("glBlendFuncSeparate");
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut state = self.state.lock();
        if let Some(sh) = state.shaders.get_mut(&shader) {
            let qualifier = sh
                .source
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .find(|word| PRECISION_WORDS.contains(word));
            match qualifier {
                Some(word) => {
                    sh.compiled = false;
                    sh.log = format!("ERROR: 0:1: '{}' : syntax error\n", word);
                }
                None => {
                    sh.compiled = true;
                    sh.log.clear();
                }
            }
        }
        state.calls.push(HostCall::Call("glCompileShader"));
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.programs.insert(name, ProgramState::default());
        state.calls.push(HostCall::Call("glCreateProgram"));
        name
    }

    fn create_shader(&self, type_: GLenum) -> GLuint {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.shaders.insert(
            name,
            ShaderState {
                type_,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(HostCall::Call("glCreateShader"));
        name
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.lock();
        state.programs.remove(&program);
        state.calls.push(HostCall::Call("glDeleteProgram"));
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.lock();
        state.shaders.remove(&shader);
        state.calls.push(HostCall::Call("glDeleteShader"));
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.lock();
        if let Some(prog) = state.programs.get_mut(&program) {
            prog.shaders.retain(|s| *s != shader);
        }
        state.calls.push(HostCall::Call("glDetachShader"));
    }

    fn disable_vertex_attrib_array(&self, _index: GLuint) {
        self.call("glDisableVertexAttribArray");
    }

    fn enable_vertex_attrib_array(&self, _index: GLuint) {
        self.call("glEnableVertexAttribArray");
    }

    fn get_active_attrib(&self, program: GLuint, index: GLuint) -> Option<ActiveVariable> {
        let state = self.state.lock();
        let prog = state.programs.get(&program)?;
        prog.attribs.get(index as usize).cloned()
    }

    fn get_active_uniform(&self, program: GLuint, index: GLuint) -> Option<ActiveVariable> {
        let state = self.state.lock();
        let prog = state.programs.get(&program)?;
        prog.uniforms.get(index as usize).cloned()
    }

    fn get_attached_shaders(&self, program: GLuint) -> Vec<GLuint> {
        let state = self.state.lock();
        state
            .programs
            .get(&program)
            .map(|prog| prog.shaders.clone())
            .unwrap_or_default()
    }

    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint {
        let state = self.state.lock();
        let Some(prog) = state.programs.get(&program) else {
            return -1;
        };
        if !prog.linked {
            return -1;
        }
        if let Some(index) = prog.bound_attribs.get(name) {
            return *index as GLint;
        }
        prog.attribs
            .iter()
            .position(|a| a.name == name)
            .map_or(-1, |i| i as GLint)
    }

    fn get_programiv(&self, program: GLuint, pname: GLenum) -> GLint {
        let state = self.state.lock();
        let Some(prog) = state.programs.get(&program) else {
            return 0;
        };
        let max_len = |vars: &[ActiveVariable]| {
            vars.iter()
                .map(|v| v.name.len() as GLint + 1)
                .max()
                .unwrap_or(0)
        };
        match pname {
            GL_LINK_STATUS | GL_VALIDATE_STATUS => prog.linked as GLint,
            GL_ATTACHED_SHADERS => prog.shaders.len() as GLint,
            GL_ACTIVE_ATTRIBUTES => prog.attribs.len() as GLint,
            GL_ACTIVE_UNIFORMS => prog.uniforms.len() as GLint,
            GL_ACTIVE_ATTRIBUTE_MAX_LENGTH => max_len(&prog.attribs),
            GL_ACTIVE_UNIFORM_MAX_LENGTH => max_len(&prog.uniforms),
            GL_INFO_LOG_LENGTH if prog.log.is_empty() => 0,
            GL_INFO_LOG_LENGTH => prog.log.len() as GLint + 1,
            _ => 0,
        }
    }

    fn get_program_info_log(&self, program: GLuint) -> String {
        let state = self.state.lock();
        state
            .programs
            .get(&program)
            .map(|prog| prog.log.clone())
            .unwrap_or_default()
    }

    fn get_shaderiv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let state = self.state.lock();
        let Some(sh) = state.shaders.get(&shader) else {
            return 0;
        };
        match pname {
            GL_SHADER_TYPE => sh.type_ as GLint,
            GL_COMPILE_STATUS => sh.compiled as GLint,
            GL_INFO_LOG_LENGTH if sh.log.is_empty() => 0,
            GL_INFO_LOG_LENGTH => sh.log.len() as GLint + 1,
            GL_SHADER_SOURCE_LENGTH if sh.source.is_empty() => 0,
            GL_SHADER_SOURCE_LENGTH => sh.source.len() as GLint + 1,
            _ => 0,
        }
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        let state = self.state.lock();
        state
            .shaders
            .get(&shader)
            .map(|sh| sh.log.clone())
            .unwrap_or_default()
    }

    fn get_shader_precision_format(
        &self,
        _shadertype: GLenum,
        precisiontype: GLenum,
    ) -> ([GLint; 2], GLint) {
        match precisiontype {
            GL_LOW_INT | GL_MEDIUM_INT | GL_HIGH_INT => ([31, 30], 0),
            _ => ([127, 127], 23),
        }
    }

    fn get_uniformfv(&self, program: GLuint, location: GLint, params: &mut [GLfloat]) {
        let state = self.state.lock();
        params.fill(0.0);
        if let Some(values) = state
            .programs
            .get(&program)
            .and_then(|prog| prog.uniform_values.get(&location))
        {
            for (dst, src) in params.iter_mut().zip(values) {
                *dst = *src;
            }
        }
    }

    fn get_uniformiv(&self, program: GLuint, location: GLint, params: &mut [GLint]) {
        let mut floats = vec![0.0; params.len()];
        self.get_uniformfv(program, location, &mut floats);
        for (dst, src) in params.iter_mut().zip(floats) {
            *dst = src as GLint;
        }
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let state = self.state.lock();
        let Some(prog) = state.programs.get(&program) else {
            return -1;
        };
        if !prog.linked {
            return -1;
        }
        prog.uniforms
            .iter()
            .position(|u| u.name == name)
            .map_or(-1, |i| i as GLint)
    }

    fn get_vertex_attribfv(&self, _index: GLuint, pname: GLenum, params: &mut [GLfloat]) {
        params.fill(0.0);
        if pname == GL_CURRENT_VERTEX_ATTRIB {
            if let Some(w) = params.get_mut(3) {
                *w = 1.0;
            }
        }
    }

    fn get_vertex_attribiv(&self, _index: GLuint, pname: GLenum, params: &mut [GLint]) {
        params.fill(0);
        match pname {
            GL_VERTEX_ATTRIB_ARRAY_SIZE => {
                if let Some(size) = params.first_mut() {
                    *size = 4;
                }
            }
            GL_VERTEX_ATTRIB_ARRAY_TYPE => {
                if let Some(type_) = params.first_mut() {
                    *type_ = GL_FLOAT as GLint;
                }
            }
            _ => {}
        }
    }

    fn link_program(&self, program: GLuint) {
        let mut state = self.state.lock();
        let Some(shaders) = state.programs.get(&program).map(|p| p.shaders.clone()) else {
            return;
        };

        let mut linked = !shaders.is_empty();
        let mut attribs = Vec::new();
        let mut uniforms: Vec<ActiveVariable> = Vec::new();
        for name in &shaders {
            match state.shaders.get(name) {
                Some(sh) if sh.compiled => {
                    if sh.type_ == GL_VERTEX_SHADER {
                        attribs.extend(declarations(&sh.source, "attribute"));
                    }
                    for uniform in declarations(&sh.source, "uniform") {
                        if !uniforms.iter().any(|u| u.name == uniform.name) {
                            uniforms.push(uniform);
                        }
                    }
                }
                _ => linked = false,
            }
        }

        if let Some(prog) = state.programs.get_mut(&program) {
            prog.linked = linked;
            prog.log = if linked {
                String::new()
            } else {
                "ERROR: link failed\n".to_string()
            };
            prog.attribs = if linked { attribs } else { Vec::new() };
            prog.uniforms = if linked { uniforms } else { Vec::new() };
            prog.uniform_values.clear();
        }
        state.calls.push(HostCall::Call("glLinkProgram"));
    }

    fn release_shader_compiler(&self) {
        self.call("glReleaseShaderCompiler");
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let mut state = self.state.lock();
        if let Some(sh) = state.shaders.get_mut(&shader) {
            sh.source = source.to_string();
        }
        state.calls.push(HostCall::ShaderSource {
            shader,
            source: source.to_string(),
        });
    }

    fn stencil_func_separate(&self, _face: GLenum, _func: GLenum, _ref: GLint, _mask: GLuint) {
        self.call("glStencilFuncSeparate");
    }

    fn stencil_mask_separate(&self, _face: GLenum, _mask: GLuint) {
        self.call("glStencilMaskSeparate");
    }

    fn stencil_op_separate(&self, _face: GLenum, _fail: GLenum, _zfail: GLenum, _zpass: GLenum) {
        self.call("glStencilOpSeparate");
    }

    fn uniformfv(&self, location: GLint, _components: usize, values: &[GLfloat]) {
        let mut state = self.state.lock();
        let program = state.current_program;
        if let Some(prog) = state.programs.get_mut(&program) {
            prog.uniform_values.insert(location, values.to_vec());
        }
        state.calls.push(HostCall::Call("glUniformfv"));
    }

    fn uniformiv(&self, location: GLint, _components: usize, values: &[GLint]) {
        let mut state = self.state.lock();
        let program = state.current_program;
        if let Some(prog) = state.programs.get_mut(&program) {
            prog.uniform_values
                .insert(location, values.iter().map(|v| *v as GLfloat).collect());
        }
        state.calls.push(HostCall::Call("glUniformiv"));
    }

    fn uniform_matrixfv(&self, location: GLint, _dim: usize, _transpose: GLboolean, values: &[GLfloat]) {
        let mut state = self.state.lock();
        let program = state.current_program;
        if let Some(prog) = state.programs.get_mut(&program) {
            prog.uniform_values.insert(location, values.to_vec());
        }
        state.calls.push(HostCall::Call("glUniformMatrixfv"));
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.lock();
        state.current_program = program;
        state.calls.push(HostCall::Call("glUseProgram"));
    }

    fn validate_program(&self, _program: GLuint) {
        self.call("glValidateProgram");
    }

    fn vertex_attribfv(&self, _index: GLuint, _values: &[GLfloat]) {
        self.call("glVertexAttribfv");
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        type_: GLenum,
        _normalized: GLboolean,
        stride: GLsizei,
        data: VertexData<'_>,
    ) {
        self.record(HostCall::Pointer {
            func: "glVertexAttribPointer",
            index,
            size,
            type_,
            stride,
            data: data.into(),
        });
    }
}
