//! Call handlers shared by GLES1 and GLES2
//!
//! Every handler decodes all of its arguments before it touches the
//! current context, so a call that faults on a guest page leaves no host
//! state behind and can simply be resubmitted.

use std::sync::Arc;

use super::buffer::GlesBuffer;
use super::context::GlesClient;
use super::framebuffer::GlesFramebuffer;
use super::renderbuffer::GlesRenderbuffer;
use super::texture::GlesTexture;
use super::validate::{
    index_size, is_buffer_target_valid, is_buffer_usage_valid, minmax_index, pixel_row_stride,
    FramebufferAttachment, TextureTarget,
};
use crate::api::{CallError, CallResult, ProcessEnv, ThreadContext};
use crate::driver::VertexData;
use crate::gl::*;
use crate::mem::{staging_buffer, staging_len};
use crate::object::{downcast, NamespaceKind, Object, Sharegroup};
use crate::transport::{InArray, Transport};
use crate::types::{GuestVirtAddr, ObjectName};

/// Function ids of the shared calls; version specific ids follow
/// [`NUM_FUNCS`]
pub mod func {
    pub const ACTIVE_TEXTURE: u32 = 1;
    pub const BIND_BUFFER: u32 = 2;
    pub const BIND_TEXTURE: u32 = 3;
    pub const BLEND_FUNC: u32 = 4;
    pub const BUFFER_DATA: u32 = 5;
    pub const BUFFER_SUB_DATA: u32 = 6;
    pub const CLEAR: u32 = 7;
    pub const CLEAR_COLOR: u32 = 8;
    pub const CLEAR_DEPTHF: u32 = 9;
    pub const CLEAR_STENCIL: u32 = 10;
    pub const COLOR_MASK: u32 = 11;
    pub const COMPRESSED_TEX_IMAGE_2D: u32 = 12;
    pub const COMPRESSED_TEX_SUB_IMAGE_2D: u32 = 13;
    pub const COPY_TEX_IMAGE_2D: u32 = 14;
    pub const COPY_TEX_SUB_IMAGE_2D: u32 = 15;
    pub const CULL_FACE: u32 = 16;
    pub const DELETE_BUFFERS: u32 = 17;
    pub const DELETE_TEXTURES: u32 = 18;
    pub const DEPTH_FUNC: u32 = 19;
    pub const DEPTH_MASK: u32 = 20;
    pub const DEPTH_RANGEF: u32 = 21;
    pub const DISABLE: u32 = 22;
    pub const DRAW_ARRAYS: u32 = 23;
    pub const DRAW_ELEMENTS: u32 = 24;
    pub const ENABLE: u32 = 25;
    pub const FINISH: u32 = 26;
    pub const FLUSH: u32 = 27;
    pub const FRONT_FACE: u32 = 28;
    pub const GEN_BUFFERS: u32 = 29;
    pub const GEN_TEXTURES: u32 = 30;
    pub const GET_BOOLEANV: u32 = 31;
    pub const GET_BUFFER_PARAMETERIV: u32 = 32;
    pub const GET_ERROR: u32 = 33;
    pub const GET_FLOATV: u32 = 34;
    pub const GET_INTEGERV: u32 = 35;
    pub const GET_TEX_PARAMETERFV: u32 = 36;
    pub const GET_TEX_PARAMETERIV: u32 = 37;
    pub const HINT: u32 = 38;
    pub const IS_BUFFER: u32 = 39;
    pub const IS_ENABLED: u32 = 40;
    pub const IS_TEXTURE: u32 = 41;
    pub const LINE_WIDTH: u32 = 42;
    pub const PIXEL_STOREI: u32 = 43;
    pub const POLYGON_OFFSET: u32 = 44;
    pub const READ_PIXELS: u32 = 45;
    pub const SAMPLE_COVERAGE: u32 = 46;
    pub const SCISSOR: u32 = 47;
    pub const STENCIL_FUNC: u32 = 48;
    pub const STENCIL_MASK: u32 = 49;
    pub const STENCIL_OP: u32 = 50;
    pub const TEX_IMAGE_2D: u32 = 51;
    pub const TEX_PARAMETERF: u32 = 52;
    pub const TEX_PARAMETERFV: u32 = 53;
    pub const TEX_PARAMETERI: u32 = 54;
    pub const TEX_PARAMETERIV: u32 = 55;
    pub const TEX_SUB_IMAGE_2D: u32 = 56;
    pub const VIEWPORT: u32 = 57;
    pub const GET_EXTENSION_STRING_YAGL: u32 = 58;
    pub const EGL_IMAGE_TARGET_TEXTURE_2D: u32 = 59;
    pub const GET_VERTEX_ATTRIB_RANGE_YAGL: u32 = 60;
    pub const BIND_FRAMEBUFFER: u32 = 61;
    pub const BIND_RENDERBUFFER: u32 = 62;
    pub const CHECK_FRAMEBUFFER_STATUS: u32 = 63;
    pub const DELETE_FRAMEBUFFERS: u32 = 64;
    pub const DELETE_RENDERBUFFERS: u32 = 65;
    pub const FRAMEBUFFER_RENDERBUFFER: u32 = 66;
    pub const FRAMEBUFFER_TEXTURE_2D: u32 = 67;
    pub const GENERATE_MIPMAP: u32 = 68;
    pub const GEN_FRAMEBUFFERS: u32 = 69;
    pub const GEN_RENDERBUFFERS: u32 = 70;
    pub const GET_FRAMEBUFFER_ATTACHMENT_PARAMETERIV: u32 = 71;
    pub const GET_RENDERBUFFER_PARAMETERIV: u32 = 72;
    pub const IS_FRAMEBUFFER: u32 = 73;
    pub const IS_RENDERBUFFER: u32 = 74;
    pub const RENDERBUFFER_STORAGE: u32 = 75;
}

/// Number of shared function ids
pub const NUM_FUNCS: u32 = 75;

/// Run `f` on the current context of this thread if it is a `C`
///
/// Calls without a current context are dropped, as GL does.
pub fn with_ctx<C: GlesClient>(
    tc: &mut ThreadContext,
    name: &str,
    f: impl FnOnce(&mut C, &mut Transport) -> CallResult,
) -> CallResult {
    let shared = match tc.current.clone() {
        Some(shared) => shared,
        None => {
            log::warn!("gles: {} without a current context", name);
            return Ok(());
        }
    };

    let mut guard = shared.lock();
    match guard.as_any_mut().downcast_mut::<C>() {
        Some(ctx) => f(ctx, &mut tc.transport),
        None => {
            log::error!("gles: {} on a context of another client API", name);
            Ok(())
        }
    }
}

/// Out-array of bytes, `None` for NULL, with the guest count
pub(crate) fn get_bytes(t: &mut Transport) -> Result<(Option<Vec<u8>>, i32), CallError> {
    let array = t.get_out_array(1)?;
    Ok((t.out_bytes(&array).map(<[u8]>::to_vec), array.count()))
}

fn get_u32s(t: &mut Transport) -> Result<(Vec<u32>, i32), CallError> {
    let array = t.get_out_array(4)?;
    Ok((t.out_u32s(&array).unwrap_or_default(), array.count()))
}

pub(crate) fn get_i32s(t: &mut Transport) -> Result<Option<Vec<i32>>, CallError> {
    let array = t.get_out_array(4)?;
    Ok(t.out_i32s(&array))
}

pub(crate) fn get_f32s(t: &mut Transport) -> Result<Option<Vec<f32>>, CallError> {
    let array = t.get_out_array(4)?;
    Ok(t.out_f32s(&array))
}

/// Object under `name`, created with `create` and stored under that name
/// if the guest never generated it
fn acquire_or_create<T: Object>(
    sharegroup: &Sharegroup,
    kind: NamespaceKind,
    name: ObjectName,
    create: impl FnOnce() -> Arc<T>,
) -> Option<Arc<T>> {
    if let Some(obj) = sharegroup.acquire_as::<T>(kind, name) {
        return Some(obj);
    }
    downcast::<T>(sharegroup.add_named(kind, name, create()).into_object())
}

/// Texture bound to `target` in the active unit
fn bound_texture<C: GlesClient>(ctx: &C, target: TextureTarget) -> Option<Arc<GlesTexture>> {
    let gles = ctx.gles();
    match gles.texture_binding(target) {
        0 => None,
        name => gles
            .sharegroup()
            .acquire_as::<GlesTexture>(NamespaceKind::Texture, name),
    }
}

/// Respecifying a 2D texture's storage detaches it from its EGLImage
fn release_tex_image<C: GlesClient>(ctx: &C, target: GLenum) {
    if target != GL_TEXTURE_2D {
        return;
    }
    if let Some(texture) = bound_texture(ctx, TextureTarget::Texture2D) {
        texture.unset_image(target);
    }
}

fn gen_objects<C: GlesClient, T: Object>(
    ctx: &mut C,
    t: &mut Transport,
    names: &InArray,
    kind: NamespaceKind,
    create: impl Fn(&C) -> Arc<T>,
) -> CallResult {
    let n = names.maxcount();
    if n < 0 {
        ctx.gles_mut().set_error(GL_INVALID_VALUE);
        return Ok(());
    }
    let generated: Vec<u32> = (0..n)
        .map(|_| {
            let obj = create(ctx);
            ctx.gles().sharegroup().add(kind, obj)
        })
        .collect();
    t.put_in_u32s(names, &generated)
}

/// Indices of an indexed draw
struct DrawIndices {
    min: u32,
    max: u32,
    /// Guest indices when no element buffer is bound
    client: Option<Vec<u8>>,
}

/// Index window of an indexed draw; indices come from the bound element
/// buffer (`indices` is an offset) or from guest memory
fn read_indices<C: GlesClient>(
    ctx: &C,
    t: &Transport,
    count: GLsizei,
    type_: GLenum,
    indices: GuestVirtAddr,
) -> Result<Result<DrawIndices, GLenum>, CallError> {
    let index_size = match index_size(type_) {
        Some(size) => size,
        None => return Ok(Err(GL_INVALID_ENUM)),
    };

    if let Some(ebo) = ctx.gles().ebo() {
        return Ok(ebo
            .get_minmax_index(type_, indices as GLintptr, count)
            .map(|(min, max)| DrawIndices {
                min,
                max,
                client: None,
            })
            .ok_or(GL_INVALID_VALUE));
    }

    if indices == 0 {
        return Ok(Err(GL_INVALID_VALUE));
    }
    let Some(mut bytes) = staging_len(count.max(0) as usize, index_size).and_then(staging_buffer) else {
        return Ok(Err(GL_OUT_OF_MEMORY));
    };
    t.read_guest(indices, &mut bytes)?;
    Ok(minmax_index(&bytes, index_size)
        .map(|(min, max)| DrawIndices {
            min,
            max,
            client: Some(bytes),
        })
        .ok_or(GL_INVALID_VALUE))
}

fn draw_elements<C: GlesClient>(
    ctx: &mut C,
    t: &Transport,
    mode: GLenum,
    count: GLsizei,
    type_: GLenum,
    indices: GuestVirtAddr,
) -> CallResult {
    if count < 0 {
        ctx.gles_mut().set_error(GL_INVALID_VALUE);
        return Ok(());
    }
    if count == 0 {
        return Ok(());
    }

    let draw = match read_indices(ctx, t, count, type_, indices)? {
        Ok(draw) => draw,
        Err(error) => {
            ctx.gles_mut().set_error(error);
            return Ok(());
        }
    };

    if let Err(error) = ctx.transfer_arrays(draw.min as usize, (draw.max - draw.min) as usize + 1, t)? {
        ctx.gles_mut().set_error(error);
        return Ok(());
    }

    if let Some(bytes) = draw.client {
        ctx.draw_elements(mode, count, type_, VertexData::Client(&bytes));
        return Ok(());
    }

    let ebo = match ctx.gles().ebo() {
        Some(ebo) => ebo.clone(),
        None => return Ok(()),
    };
    ebo.transfer(type_, GL_ELEMENT_ARRAY_BUFFER, false);
    let old = ebo.bind(type_, false, GL_ELEMENT_ARRAY_BUFFER);
    ctx.draw_elements(mode, count, type_, VertexData::Offset(indices as usize));
    if let Some(old) = old {
        ctx.gles().driver().bind_buffer(GL_ELEMENT_ARRAY_BUFFER, old);
    }
    Ok(())
}

/// Integer state as GLES reports it: version hook, then the shared
/// emulated values, then the host
fn integer_state<C: GlesClient>(ctx: &C, pname: GLenum, count: usize) -> Vec<GLint> {
    let mut values = ctx
        .get_integerv(pname)
        .or_else(|| ctx.gles().get_integer(pname).map(|v| vec![v]))
        .unwrap_or_else(|| {
            let mut params = vec![0; count];
            ctx.gles().driver().get_integerv(pname, &mut params);
            params
        });
    values.resize(count, 0);
    values
}

/// Float state: version hook, then the shared emulated values, then the
/// host
pub(crate) fn float_state<C: GlesClient>(ctx: &C, pname: GLenum, count: usize) -> Vec<GLfloat> {
    let mut values = match ctx.get_floatv(pname) {
        Some(values) => values,
        None => match ctx.gles().get_integer(pname) {
            Some(value) => vec![value as GLfloat],
            None => {
                let mut values = vec![0.0; count];
                ctx.gles().driver().get_floatv(pname, &mut values);
                values
            }
        },
    };
    values.resize(count, 0.0);
    values
}

pub(crate) fn param_count<C: GlesClient>(ctx: &mut C, pname: GLenum) -> Option<usize> {
    let count = ctx
        .get_param_count(pname)
        .or_else(|| ctx.gles().param_count(pname));
    if count.is_none() {
        ctx.gles_mut().set_error(GL_INVALID_ENUM);
    }
    count
}

fn is_emulated<C: GlesClient>(ctx: &C, pname: GLenum) -> bool {
    ctx.get_integerv(pname).is_some() || ctx.gles().get_integer(pname).is_some()
}

/// Dispatch a shared call, `None` if `func_id` is not one
pub fn dispatch<C: GlesClient>(
    func_id: u32,
    env: &ProcessEnv,
    tc: &mut ThreadContext,
) -> Option<CallResult> {
    if func_id == 0 || func_id > NUM_FUNCS {
        return None;
    }
    call_trace!("gles: common call {}", func_id);
    Some(call::<C>(func_id, env, tc))
}

fn call<C: GlesClient>(func_id: u32, env: &ProcessEnv, tc: &mut ThreadContext) -> CallResult {
    let t = &mut tc.transport;
    match func_id {
        func::ACTIVE_TEXTURE => {
            let texture = t.get_u32()?;
            with_ctx::<C>(tc, "glActiveTexture", |ctx, _| {
                if ctx.gles_mut().set_active_texture(texture) {
                    ctx.gles().driver().active_texture(texture);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::BIND_BUFFER => {
            let (target, buffer) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glBindBuffer", |ctx, _| {
                if !is_buffer_target_valid(target) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let obj = match buffer {
                    0 => None,
                    name => {
                        let gles = ctx.gles();
                        acquire_or_create(gles.sharegroup(), NamespaceKind::Buffer, name, || {
                            GlesBuffer::new(gles.driver().clone(), gles.ensure().clone())
                        })
                    }
                };
                if !ctx.gles_mut().bind_buffer(target, obj, buffer) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::BIND_TEXTURE => {
            let (target, texture) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glBindTexture", |ctx, _| {
                let unit_target = match TextureTarget::from_gl(target) {
                    Some(unit_target) => unit_target,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        return Ok(());
                    }
                };
                if texture == 0 {
                    ctx.gles().driver().bind_texture(target, 0);
                } else {
                    let gles = ctx.gles();
                    let obj = acquire_or_create(gles.sharegroup(), NamespaceKind::Texture, texture, || {
                        GlesTexture::new(gles.driver().clone(), gles.ensure().clone())
                    });
                    if !obj.is_some_and(|obj| obj.bind(target)) {
                        ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                        return Ok(());
                    }
                }
                ctx.gles_mut().bind_texture(unit_target, texture);
                Ok(())
            })
        }
        func::BLEND_FUNC => {
            let (sfactor, dfactor) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glBlendFunc", |ctx, _| {
                ctx.gles().driver().blend_func(sfactor, dfactor);
                Ok(())
            })
        }
        func::BUFFER_DATA => {
            let target = t.get_u32()?;
            let (data, size) = get_bytes(t)?;
            let usage = t.get_u32()?;
            with_ctx::<C>(tc, "glBufferData", |ctx, _| {
                let error = if !is_buffer_target_valid(target) {
                    GL_INVALID_ENUM
                } else if size < 0 {
                    GL_INVALID_VALUE
                } else if !is_buffer_usage_valid(usage) {
                    GL_INVALID_ENUM
                } else {
                    match ctx.gles().acquire_binded_buffer(target) {
                        Some(buffer) => {
                            buffer.set_data(size as usize, data.as_deref(), usage);
                            GL_NO_ERROR
                        }
                        None => GL_INVALID_OPERATION,
                    }
                };
                if error != GL_NO_ERROR {
                    ctx.gles_mut().set_error(error);
                }
                Ok(())
            })
        }
        func::BUFFER_SUB_DATA => {
            let (target, offset) = (t.get_u32()?, t.get_i32()?);
            let (data, size) = get_bytes(t)?;
            with_ctx::<C>(tc, "glBufferSubData", |ctx, _| {
                let error = if !is_buffer_target_valid(target) {
                    GL_INVALID_ENUM
                } else if offset < 0 || size < 0 {
                    GL_INVALID_VALUE
                } else if size == 0 {
                    GL_NO_ERROR
                } else {
                    match ctx.gles().acquire_binded_buffer(target) {
                        Some(buffer) => {
                            let data = data.unwrap_or_default();
                            if buffer.update_data(offset as GLintptr, &data) {
                                GL_NO_ERROR
                            } else {
                                GL_INVALID_VALUE
                            }
                        }
                        None => GL_INVALID_OPERATION,
                    }
                };
                if error != GL_NO_ERROR {
                    ctx.gles_mut().set_error(error);
                }
                Ok(())
            })
        }
        func::CLEAR => {
            let mask = t.get_u32()?;
            with_ctx::<C>(tc, "glClear", |ctx, _| {
                ctx.gles().driver().clear(mask);
                Ok(())
            })
        }
        func::CLEAR_COLOR => {
            let (r, g, b, a) = (t.get_f32()?, t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<C>(tc, "glClearColor", |ctx, _| {
                ctx.gles().driver().clear_color(r, g, b, a);
                Ok(())
            })
        }
        func::CLEAR_DEPTHF => {
            let depth = t.get_f32()?;
            with_ctx::<C>(tc, "glClearDepthf", |ctx, _| {
                ctx.gles().driver().clear_depth(depth);
                Ok(())
            })
        }
        func::CLEAR_STENCIL => {
            let s = t.get_i32()?;
            with_ctx::<C>(tc, "glClearStencil", |ctx, _| {
                ctx.gles().driver().clear_stencil(s);
                Ok(())
            })
        }
        func::COLOR_MASK => {
            let (r, g, b, a) = (t.get_u8()?, t.get_u8()?, t.get_u8()?, t.get_u8()?);
            with_ctx::<C>(tc, "glColorMask", |ctx, _| {
                ctx.gles().driver().color_mask(r, g, b, a);
                Ok(())
            })
        }
        func::COMPRESSED_TEX_IMAGE_2D => {
            let (target, level, internalformat) = (t.get_u32()?, t.get_i32()?, t.get_u32()?);
            let (width, height, border) = (t.get_i32()?, t.get_i32()?, t.get_i32()?);
            let (data, image_size) = get_bytes(t)?;
            with_ctx::<C>(tc, "glCompressedTexImage2D", |ctx, _| {
                if image_size < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                release_tex_image(ctx, target);
                let error = ctx.compressed_tex_image(
                    target,
                    level,
                    internalformat,
                    width,
                    height,
                    border,
                    image_size,
                    data.as_deref(),
                );
                if error != GL_NO_ERROR {
                    ctx.gles_mut().set_error(error);
                }
                Ok(())
            })
        }
        func::COMPRESSED_TEX_SUB_IMAGE_2D => {
            let (target, level) = (t.get_u32()?, t.get_i32()?);
            let (xoffset, yoffset) = (t.get_i32()?, t.get_i32()?);
            let (width, height, format) = (t.get_i32()?, t.get_i32()?, t.get_u32()?);
            let (data, _) = get_bytes(t)?;
            with_ctx::<C>(tc, "glCompressedTexSubImage2D", |ctx, _| {
                ctx.gles().driver().compressed_tex_sub_image_2d(
                    target,
                    level,
                    xoffset,
                    yoffset,
                    width,
                    height,
                    format,
                    data.as_deref().unwrap_or(&[]),
                );
                Ok(())
            })
        }
        func::COPY_TEX_IMAGE_2D => {
            let (target, level, internalformat) = (t.get_u32()?, t.get_i32()?, t.get_u32()?);
            let (x, y, width, height) = (t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?);
            let border = t.get_i32()?;
            with_ctx::<C>(tc, "glCopyTexImage2D", |ctx, _| {
                release_tex_image(ctx, target);
                ctx.gles().driver().copy_tex_image_2d(
                    target,
                    level,
                    internalformat,
                    x,
                    y,
                    width,
                    height,
                    border,
                );
                Ok(())
            })
        }
        func::COPY_TEX_SUB_IMAGE_2D => {
            let (target, level) = (t.get_u32()?, t.get_i32()?);
            let (xoffset, yoffset) = (t.get_i32()?, t.get_i32()?);
            let (x, y, width, height) = (t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glCopyTexSubImage2D", |ctx, _| {
                ctx.gles()
                    .driver()
                    .copy_tex_sub_image_2d(target, level, xoffset, yoffset, x, y, width, height);
                Ok(())
            })
        }
        func::CULL_FACE => {
            let mode = t.get_u32()?;
            with_ctx::<C>(tc, "glCullFace", |ctx, _| {
                ctx.gles().driver().cull_face(mode);
                Ok(())
            })
        }
        func::DELETE_BUFFERS => {
            let (names, n) = get_u32s(t)?;
            with_ctx::<C>(tc, "glDeleteBuffers", |ctx, _| {
                if n < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                for name in names.into_iter().filter(|&name| name != 0) {
                    let sharegroup = ctx.gles().sharegroup().clone();
                    if let Some(buffer) = sharegroup.acquire_as::<GlesBuffer>(NamespaceKind::Buffer, name) {
                        ctx.gles_mut().unbind_buffer(&buffer, name);
                        sharegroup.remove(NamespaceKind::Buffer, name);
                    }
                }
                Ok(())
            })
        }
        func::DELETE_TEXTURES => {
            let (names, n) = get_u32s(t)?;
            with_ctx::<C>(tc, "glDeleteTextures", |ctx, _| {
                if n < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                for name in names.into_iter().filter(|&name| name != 0) {
                    let sharegroup = ctx.gles().sharegroup().clone();
                    if sharegroup
                        .acquire_as::<GlesTexture>(NamespaceKind::Texture, name)
                        .is_some()
                    {
                        ctx.gles_mut().unbind_texture(name);
                        sharegroup.remove(NamespaceKind::Texture, name);
                    }
                }
                Ok(())
            })
        }
        func::DEPTH_FUNC => {
            let func = t.get_u32()?;
            with_ctx::<C>(tc, "glDepthFunc", |ctx, _| {
                ctx.gles().driver().depth_func(func);
                Ok(())
            })
        }
        func::DEPTH_MASK => {
            let flag = t.get_u8()?;
            with_ctx::<C>(tc, "glDepthMask", |ctx, _| {
                ctx.gles().driver().depth_mask(flag);
                Ok(())
            })
        }
        func::DEPTH_RANGEF => {
            let (z_near, z_far) = (t.get_f32()?, t.get_f32()?);
            with_ctx::<C>(tc, "glDepthRangef", |ctx, _| {
                ctx.gles().driver().depth_range(z_near, z_far);
                Ok(())
            })
        }
        func::DISABLE => {
            let cap = t.get_u32()?;
            with_ctx::<C>(tc, "glDisable", |ctx, _| {
                ctx.gles().driver().disable(cap);
                Ok(())
            })
        }
        func::DRAW_ARRAYS => {
            let (mode, first, count) = (t.get_u32()?, t.get_i32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glDrawArrays", |ctx, t| {
                if first < 0 || count < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                if count == 0 {
                    return Ok(());
                }
                if let Err(error) = ctx.transfer_arrays(first as usize, count as usize, t)? {
                    ctx.gles_mut().set_error(error);
                    return Ok(());
                }
                ctx.draw_arrays(mode, first, count);
                Ok(())
            })
        }
        func::DRAW_ELEMENTS => {
            let (mode, count, type_) = (t.get_u32()?, t.get_i32()?, t.get_u32()?);
            let indices = t.get_va()?;
            with_ctx::<C>(tc, "glDrawElements", |ctx, t| {
                draw_elements(ctx, t, mode, count, type_, indices)
            })
        }
        func::ENABLE => {
            let cap = t.get_u32()?;
            with_ctx::<C>(tc, "glEnable", |ctx, _| {
                ctx.gles().driver().enable(cap);
                Ok(())
            })
        }
        func::FINISH => with_ctx::<C>(tc, "glFinish", |ctx, _| {
            ctx.gles().driver().finish();
            Ok(())
        }),
        func::FLUSH => with_ctx::<C>(tc, "glFlush", |ctx, _| {
            ctx.gles().driver().flush();
            Ok(())
        }),
        func::FRONT_FACE => {
            let mode = t.get_u32()?;
            with_ctx::<C>(tc, "glFrontFace", |ctx, _| {
                ctx.gles().driver().front_face(mode);
                Ok(())
            })
        }
        func::GEN_BUFFERS => {
            let names = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGenBuffers", |ctx, t| {
                gen_objects(ctx, t, &names, NamespaceKind::Buffer, |ctx: &C| {
                    GlesBuffer::new(ctx.gles().driver().clone(), ctx.gles().ensure().clone())
                })
            })
        }
        func::GEN_TEXTURES => {
            let names = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGenTextures", |ctx, t| {
                gen_objects(ctx, t, &names, NamespaceKind::Texture, |ctx: &C| {
                    GlesTexture::new(ctx.gles().driver().clone(), ctx.gles().ensure().clone())
                })
            })
        }
        func::GET_BOOLEANV => {
            let pname = t.get_u32()?;
            let params = t.get_in_array(1)?;
            with_ctx::<C>(tc, "glGetBooleanv", |ctx, t| {
                let count = match param_count(ctx, pname) {
                    Some(count) => count,
                    None => return Ok(()),
                };
                let values: Vec<u8> = if is_emulated(ctx, pname) {
                    integer_state(ctx, pname, count)
                        .into_iter()
                        .map(|v| (v != 0) as GLboolean)
                        .collect()
                } else {
                    let mut values = vec![0; count];
                    ctx.gles().driver().get_booleanv(pname, &mut values);
                    values
                };
                t.put_in_bytes(&params, &values)
            })
        }
        func::GET_BUFFER_PARAMETERIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetBufferParameteriv", |ctx, t| {
                if !is_buffer_target_valid(target) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let buffer = match ctx.gles().acquire_binded_buffer(target) {
                    Some(buffer) => buffer,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                        return Ok(());
                    }
                };
                match buffer.get_parameter(pname) {
                    Some(value) => t.put_in_arg_i32(&param, value),
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        Ok(())
                    }
                }
            })
        }
        func::GET_ERROR => {
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetError", |ctx, t| {
                let error = match ctx.gles_mut().get_error() {
                    GL_NO_ERROR => ctx.gles().driver().get_error(),
                    error => error,
                };
                t.put_in_arg_u32(&result, error)
            })
        }
        func::GET_FLOATV => {
            let pname = t.get_u32()?;
            let params = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGetFloatv", |ctx, t| {
                let count = match param_count(ctx, pname) {
                    Some(count) => count,
                    None => return Ok(()),
                };
                let values = float_state(ctx, pname, count);
                t.put_in_f32s(&params, &values)
            })
        }
        func::GET_INTEGERV => {
            let pname = t.get_u32()?;
            let params = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGetIntegerv", |ctx, t| {
                let count = match param_count(ctx, pname) {
                    Some(count) => count,
                    None => return Ok(()),
                };
                let values = integer_state(ctx, pname, count);
                t.put_in_i32s(&params, &values)
            })
        }
        func::GET_TEX_PARAMETERFV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetTexParameterfv", |ctx, t| {
                if TextureTarget::from_gl(target).is_none() {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let mut value = [0.0];
                ctx.gles().driver().get_tex_parameterfv(target, pname, &mut value);
                t.put_in_arg_f32(&param, value[0])
            })
        }
        func::GET_TEX_PARAMETERIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetTexParameteriv", |ctx, t| {
                if TextureTarget::from_gl(target).is_none() {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let mut value = [0];
                ctx.gles().driver().get_tex_parameteriv(target, pname, &mut value);
                t.put_in_arg_i32(&param, value[0])
            })
        }
        func::HINT => {
            let (target, mode) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glHint", |ctx, _| {
                ctx.gles().driver().hint(target, mode);
                Ok(())
            })
        }
        func::IS_BUFFER => {
            let buffer = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glIsBuffer", |ctx, t| {
                let is = ctx
                    .gles()
                    .sharegroup()
                    .acquire_as::<GlesBuffer>(NamespaceKind::Buffer, buffer)
                    .is_some_and(|buffer| buffer.was_bound());
                t.put_in_arg_u32(&result, is as u32)
            })
        }
        func::IS_ENABLED => {
            let cap = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glIsEnabled", |ctx, t| {
                let enabled = ctx
                    .is_enabled(cap)
                    .unwrap_or_else(|| ctx.gles().driver().is_enabled(cap));
                t.put_in_arg_u32(&result, enabled as u32)
            })
        }
        func::IS_TEXTURE => {
            let texture = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glIsTexture", |ctx, t| {
                let is = ctx
                    .gles()
                    .sharegroup()
                    .acquire_as::<GlesTexture>(NamespaceKind::Texture, texture)
                    .is_some_and(|texture| texture.target() != 0);
                t.put_in_arg_u32(&result, is as u32)
            })
        }
        func::LINE_WIDTH => {
            let width = t.get_f32()?;
            with_ctx::<C>(tc, "glLineWidth", |ctx, _| {
                ctx.gles().driver().line_width(width);
                Ok(())
            })
        }
        func::PIXEL_STOREI => {
            let (pname, param) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glPixelStorei", |ctx, _| {
                ctx.gles().driver().pixel_storei(pname, param);
                Ok(())
            })
        }
        func::POLYGON_OFFSET => {
            let (factor, units) = (t.get_f32()?, t.get_f32()?);
            with_ctx::<C>(tc, "glPolygonOffset", |ctx, _| {
                ctx.gles().driver().polygon_offset(factor, units);
                Ok(())
            })
        }
        func::READ_PIXELS => {
            let (x, y, width, height) = (t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?);
            let (format, type_) = (t.get_u32()?, t.get_u32()?);
            let pixels = t.get_in_array(1)?;
            with_ctx::<C>(tc, "glReadPixels", |ctx, t| {
                if width < 0 || height < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let mut alignment = [0];
                ctx.gles()
                    .driver()
                    .get_integerv(GL_PACK_ALIGNMENT, &mut alignment);
                let stride = match pixel_row_stride(width, format, type_, alignment[0]) {
                    Some(stride) => stride,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        return Ok(());
                    }
                };
                let Some(mut data) = staging_len(height as usize, stride).and_then(staging_buffer) else {
                    ctx.gles_mut().set_error(GL_OUT_OF_MEMORY);
                    return Ok(());
                };
                ctx.gles()
                    .driver()
                    .read_pixels(x, y, width, height, format, type_, &mut data);
                t.put_in_bytes(&pixels, &data)
            })
        }
        func::SAMPLE_COVERAGE => {
            let (value, invert) = (t.get_f32()?, t.get_u8()?);
            with_ctx::<C>(tc, "glSampleCoverage", |ctx, _| {
                ctx.gles().driver().sample_coverage(value, invert);
                Ok(())
            })
        }
        func::SCISSOR => {
            let (x, y, width, height) = (t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glScissor", |ctx, _| {
                ctx.gles().driver().scissor(x, y, width, height);
                Ok(())
            })
        }
        func::STENCIL_FUNC => {
            let (func, ref_, mask) = (t.get_u32()?, t.get_i32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glStencilFunc", |ctx, _| {
                ctx.gles().driver().stencil_func(func, ref_, mask);
                Ok(())
            })
        }
        func::STENCIL_MASK => {
            let mask = t.get_u32()?;
            with_ctx::<C>(tc, "glStencilMask", |ctx, _| {
                ctx.gles().driver().stencil_mask(mask);
                Ok(())
            })
        }
        func::STENCIL_OP => {
            let (fail, zfail, zpass) = (t.get_u32()?, t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glStencilOp", |ctx, _| {
                ctx.gles().driver().stencil_op(fail, zfail, zpass);
                Ok(())
            })
        }
        func::TEX_IMAGE_2D => {
            let (target, level, internalformat) = (t.get_u32()?, t.get_i32()?, t.get_i32()?);
            let (width, height, border) = (t.get_i32()?, t.get_i32()?, t.get_i32()?);
            let (format, type_) = (t.get_u32()?, t.get_u32()?);
            let (pixels, _) = get_bytes(t)?;
            with_ctx::<C>(tc, "glTexImage2D", |ctx, _| {
                release_tex_image(ctx, target);
                ctx.gles().driver().tex_image_2d(
                    target,
                    level,
                    internalformat,
                    width,
                    height,
                    border,
                    format,
                    type_,
                    pixels.as_deref(),
                );
                Ok(())
            })
        }
        func::TEX_PARAMETERF => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_f32()?);
            with_ctx::<C>(tc, "glTexParameterf", |ctx, _| {
                ctx.gles().driver().tex_parameterf(target, pname, param);
                Ok(())
            })
        }
        func::TEX_PARAMETERFV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_f32s(t)?;
            with_ctx::<C>(tc, "glTexParameterfv", |ctx, _| {
                ctx.gles()
                    .driver()
                    .tex_parameterfv(target, pname, params.as_deref().unwrap_or(&[]));
                Ok(())
            })
        }
        func::TEX_PARAMETERI => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glTexParameteri", |ctx, _| {
                ctx.gles().driver().tex_parameteri(target, pname, param);
                Ok(())
            })
        }
        func::TEX_PARAMETERIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<C>(tc, "glTexParameteriv", |ctx, _| {
                ctx.gles()
                    .driver()
                    .tex_parameteriv(target, pname, params.as_deref().unwrap_or(&[]));
                Ok(())
            })
        }
        func::TEX_SUB_IMAGE_2D => {
            let (target, level) = (t.get_u32()?, t.get_i32()?);
            let (xoffset, yoffset) = (t.get_i32()?, t.get_i32()?);
            let (width, height) = (t.get_i32()?, t.get_i32()?);
            let (format, type_) = (t.get_u32()?, t.get_u32()?);
            let (pixels, _) = get_bytes(t)?;
            with_ctx::<C>(tc, "glTexSubImage2D", |ctx, _| {
                ctx.gles().driver().tex_sub_image_2d(
                    target,
                    level,
                    xoffset,
                    yoffset,
                    width,
                    height,
                    format,
                    type_,
                    pixels.as_deref().unwrap_or(&[]),
                );
                Ok(())
            })
        }
        func::VIEWPORT => {
            let (x, y, width, height) = (t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glViewport", |ctx, _| {
                ctx.gles().driver().viewport(x, y, width, height);
                Ok(())
            })
        }
        func::GET_EXTENSION_STRING_YAGL => {
            let out = t.get_in_array(1)?;
            with_ctx::<C>(tc, "glGetExtensionStringYAGL", |ctx, t| {
                let extensions = ctx.extensions();
                if out.is_null() {
                    t.set_in_count(&out, extensions.len() as i32 + 1)
                } else {
                    t.put_in_string(&out, &extensions)
                }
            })
        }
        func::EGL_IMAGE_TARGET_TEXTURE_2D => {
            let (target, image) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glEGLImageTargetTexture2DOES", |ctx, _| {
                if target != GL_TEXTURE_2D {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let image = match env.egl_iface().and_then(|egl| egl.get_image(image)) {
                    Some(image) => image,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_VALUE);
                        return Ok(());
                    }
                };
                match bound_texture(ctx, TextureTarget::Texture2D) {
                    Some(texture) => texture.set_image(target, image),
                    None => ctx.gles_mut().set_error(GL_INVALID_OPERATION),
                }
                Ok(())
            })
        }
        func::GET_VERTEX_ATTRIB_RANGE_YAGL => {
            let (count, type_) = (t.get_i32()?, t.get_u32()?);
            let indices = t.get_va()?;
            let (range_first, range_count) = (t.get_in_arg()?, t.get_in_arg()?);
            with_ctx::<C>(tc, "glGetVertexAttribRangeYAGL", |ctx, t| {
                if count <= 0 {
                    t.put_in_arg_u32(&range_first, 0)?;
                    return t.put_in_arg_u32(&range_count, 0);
                }
                match read_indices(ctx, t, count, type_, indices)? {
                    Ok(draw) => {
                        t.put_in_arg_u32(&range_first, draw.min)?;
                        t.put_in_arg_u32(&range_count, draw.max - draw.min + 1)
                    }
                    Err(error) => {
                        ctx.gles_mut().set_error(error);
                        Ok(())
                    }
                }
            })
        }
        func::BIND_FRAMEBUFFER => {
            let (target, framebuffer) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glBindFramebuffer", |ctx, _| {
                let obj = match framebuffer {
                    0 => None,
                    name => {
                        let gles = ctx.gles();
                        acquire_or_create(gles.sharegroup(), NamespaceKind::Framebuffer, name, || {
                            GlesFramebuffer::new(gles.driver().clone(), gles.ensure().clone())
                        })
                    }
                };
                let global_name = obj.as_ref().map_or(0, |fb| fb.global_name());
                if ctx.gles_mut().bind_framebuffer(target, obj, framebuffer) {
                    ctx.gles().driver().bind_framebuffer(target, global_name);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::BIND_RENDERBUFFER => {
            let (target, renderbuffer) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glBindRenderbuffer", |ctx, _| {
                let global_name = match renderbuffer {
                    0 => 0,
                    name => {
                        let gles = ctx.gles();
                        acquire_or_create(gles.sharegroup(), NamespaceKind::Renderbuffer, name, || {
                            GlesRenderbuffer::new(gles.driver().clone(), gles.ensure().clone())
                        })
                        .map_or(0, |rb| rb.global_name())
                    }
                };
                if ctx.gles_mut().bind_renderbuffer(target, renderbuffer) {
                    ctx.gles().driver().bind_renderbuffer(target, global_name);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::CHECK_FRAMEBUFFER_STATUS => {
            let target = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glCheckFramebufferStatus", |ctx, t| {
                let status = ctx.gles().driver().check_framebuffer_status(target);
                t.put_in_arg_u32(&result, status)
            })
        }
        func::DELETE_FRAMEBUFFERS => {
            let (names, n) = get_u32s(t)?;
            with_ctx::<C>(tc, "glDeleteFramebuffers", |ctx, _| {
                if n < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                for name in names.into_iter().filter(|&name| name != 0) {
                    if ctx.gles().fbo_local_name() == name {
                        ctx.gles_mut().unbind_framebuffer(name);
                        ctx.gles().driver().bind_framebuffer(GL_FRAMEBUFFER, 0);
                    }
                    ctx.gles().sharegroup().remove(NamespaceKind::Framebuffer, name);
                }
                Ok(())
            })
        }
        func::DELETE_RENDERBUFFERS => {
            let (names, n) = get_u32s(t)?;
            with_ctx::<C>(tc, "glDeleteRenderbuffers", |ctx, _| {
                if n < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                for name in names.into_iter().filter(|&name| name != 0) {
                    ctx.gles_mut().unbind_renderbuffer(name);
                    ctx.gles().sharegroup().remove(NamespaceKind::Renderbuffer, name);
                }
                Ok(())
            })
        }
        func::FRAMEBUFFER_RENDERBUFFER => {
            let (target, attachment) = (t.get_u32()?, t.get_u32()?);
            let (renderbuffer_target, renderbuffer) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<C>(tc, "glFramebufferRenderbuffer", |ctx, _| {
                let framebuffer = match framebuffer_for(ctx, target) {
                    Some(framebuffer) => framebuffer,
                    None => return Ok(()),
                };
                let rb = match renderbuffer {
                    0 => None,
                    name => match ctx
                        .gles()
                        .sharegroup()
                        .acquire_as::<GlesRenderbuffer>(NamespaceKind::Renderbuffer, name)
                    {
                        Some(rb) => Some(rb),
                        None => {
                            ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                            return Ok(());
                        }
                    },
                };
                if !framebuffer.renderbuffer(
                    target,
                    attachment,
                    renderbuffer_target,
                    rb.as_deref().map(|rb| (rb, renderbuffer)),
                ) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::FRAMEBUFFER_TEXTURE_2D => {
            let (target, attachment, textarget) = (t.get_u32()?, t.get_u32()?, t.get_u32()?);
            let (texture, level) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glFramebufferTexture2D", |ctx, _| {
                let framebuffer = match framebuffer_for(ctx, target) {
                    Some(framebuffer) => framebuffer,
                    None => return Ok(()),
                };
                if FramebufferAttachment::from_gl(attachment).is_none() {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let tex = match texture {
                    0 => None,
                    name => match ctx
                        .gles()
                        .sharegroup()
                        .acquire_as::<GlesTexture>(NamespaceKind::Texture, name)
                    {
                        Some(tex) => Some(tex),
                        None => {
                            ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                            return Ok(());
                        }
                    },
                };
                if !framebuffer.texture_2d(
                    target,
                    attachment,
                    textarget,
                    level,
                    tex.as_deref().map(|tex| (tex, texture)),
                ) {
                    ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                }
                Ok(())
            })
        }
        func::GENERATE_MIPMAP => {
            let target = t.get_u32()?;
            with_ctx::<C>(tc, "glGenerateMipmap", |ctx, _| {
                ctx.gles().driver().generate_mipmap(target);
                Ok(())
            })
        }
        func::GEN_FRAMEBUFFERS => {
            let names = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGenFramebuffers", |ctx, t| {
                gen_objects(ctx, t, &names, NamespaceKind::Framebuffer, |ctx: &C| {
                    GlesFramebuffer::new(ctx.gles().driver().clone(), ctx.gles().ensure().clone())
                })
            })
        }
        func::GEN_RENDERBUFFERS => {
            let names = t.get_in_array(4)?;
            with_ctx::<C>(tc, "glGenRenderbuffers", |ctx, t| {
                gen_objects(ctx, t, &names, NamespaceKind::Renderbuffer, |ctx: &C| {
                    GlesRenderbuffer::new(ctx.gles().driver().clone(), ctx.gles().ensure().clone())
                })
            })
        }
        func::GET_FRAMEBUFFER_ATTACHMENT_PARAMETERIV => {
            let (target, attachment, pname) = (t.get_u32()?, t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetFramebufferAttachmentParameteriv", |ctx, t| {
                let framebuffer = match framebuffer_for(ctx, target) {
                    Some(framebuffer) => framebuffer,
                    None => return Ok(()),
                };
                let slot = match FramebufferAttachment::from_gl(attachment) {
                    Some(slot) => slot,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        return Ok(());
                    }
                };
                let state = framebuffer.attachment(slot);
                let value = match pname {
                    GL_FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE => state.type_ as GLint,
                    GL_FRAMEBUFFER_ATTACHMENT_OBJECT_NAME => state.local_name as GLint,
                    _ => ctx
                        .gles()
                        .driver()
                        .get_framebuffer_attachment_parameteriv(target, attachment, pname),
                };
                t.put_in_arg_i32(&param, value)
            })
        }
        func::GET_RENDERBUFFER_PARAMETERIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<C>(tc, "glGetRenderbufferParameteriv", |ctx, t| {
                let value = ctx.gles().driver().get_renderbuffer_parameteriv(target, pname);
                t.put_in_arg_i32(&param, value)
            })
        }
        func::IS_FRAMEBUFFER => {
            let framebuffer = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glIsFramebuffer", |ctx, t| {
                let is = ctx
                    .gles()
                    .sharegroup()
                    .acquire_as::<GlesFramebuffer>(NamespaceKind::Framebuffer, framebuffer)
                    .is_some();
                t.put_in_arg_u32(&result, is as u32)
            })
        }
        func::IS_RENDERBUFFER => {
            let renderbuffer = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<C>(tc, "glIsRenderbuffer", |ctx, t| {
                let is = ctx
                    .gles()
                    .sharegroup()
                    .acquire_as::<GlesRenderbuffer>(NamespaceKind::Renderbuffer, renderbuffer)
                    .is_some();
                t.put_in_arg_u32(&result, is as u32)
            })
        }
        func::RENDERBUFFER_STORAGE => {
            let (target, internalformat) = (t.get_u32()?, t.get_u32()?);
            let (width, height) = (t.get_i32()?, t.get_i32()?);
            with_ctx::<C>(tc, "glRenderbufferStorage", |ctx, _| {
                ctx.gles()
                    .driver()
                    .renderbuffer_storage(target, internalformat, width, height);
                Ok(())
            })
        }
        _ => Err(CallError::Protocol(format!("bad gles function {}", func_id))),
    }
}

/// Framebuffer bound to `target`, latching the error GL defines if there
/// is none
fn framebuffer_for<C: GlesClient>(ctx: &mut C, target: GLenum) -> Option<Arc<GlesFramebuffer>> {
    if target != GL_FRAMEBUFFER {
        ctx.gles_mut().set_error(GL_INVALID_ENUM);
        return None;
    }
    let framebuffer = ctx.gles().acquire_binded_framebuffer(target);
    if framebuffer.is_none() {
        ctx.gles_mut().set_error(GL_INVALID_OPERATION);
    }
    framebuffer
}
