//! GLES1 call handlers
//!
//! Ids here are relative to the end of the shared GLES range. The `x`
//! variants take 16.16 fixed point and are forwarded as floats, except
//! where the parameter is really an enum.

use super::context::{Gles1Context, ARRAY_COLOR, ARRAY_NORMAL, ARRAY_POINTSIZE, ARRAY_VERTEX};
use crate::api::{CallError, CallResult, ThreadContext};
use crate::gl::*;
use crate::gles::calls::{float_state, get_f32s, get_i32s, param_count, with_ctx};
use crate::gles::GlesClient;
use crate::transport::Transport;
use crate::types::GuestVirtAddr;

pub mod func {
    pub const ALPHA_FUNC: u32 = 1;
    pub const CLIP_PLANEF: u32 = 2;
    pub const COLOR4F: u32 = 3;
    pub const FOGF: u32 = 4;
    pub const FOGFV: u32 = 5;
    pub const FRUSTUMF: u32 = 6;
    pub const GET_CLIP_PLANEF: u32 = 7;
    pub const GET_LIGHTFV: u32 = 8;
    pub const GET_MATERIALFV: u32 = 9;
    pub const GET_TEX_ENVFV: u32 = 10;
    pub const LIGHT_MODELF: u32 = 11;
    pub const LIGHT_MODELFV: u32 = 12;
    pub const LIGHTF: u32 = 13;
    pub const LIGHTFV: u32 = 14;
    pub const LOAD_MATRIXF: u32 = 15;
    pub const MATERIALF: u32 = 16;
    pub const MATERIALFV: u32 = 17;
    pub const MULT_MATRIXF: u32 = 18;
    pub const MULTI_TEX_COORD4F: u32 = 19;
    pub const NORMAL3F: u32 = 20;
    pub const ORTHOF: u32 = 21;
    pub const POINT_PARAMETERF: u32 = 22;
    pub const POINT_PARAMETERFV: u32 = 23;
    pub const POINT_SIZE: u32 = 24;
    pub const ROTATEF: u32 = 25;
    pub const SCALEF: u32 = 26;
    pub const TEX_ENVF: u32 = 27;
    pub const TEX_ENVFV: u32 = 28;
    pub const TRANSLATEF: u32 = 29;
    pub const ALPHA_FUNCX: u32 = 30;
    pub const CLEAR_COLORX: u32 = 31;
    pub const CLEAR_DEPTHX: u32 = 32;
    pub const CLIENT_ACTIVE_TEXTURE: u32 = 33;
    pub const CLIP_PLANEX: u32 = 34;
    pub const COLOR4UB: u32 = 35;
    pub const COLOR4X: u32 = 36;
    pub const COLOR_POINTER: u32 = 37;
    pub const DEPTH_RANGEX: u32 = 38;
    pub const DISABLE_CLIENT_STATE: u32 = 39;
    pub const ENABLE_CLIENT_STATE: u32 = 40;
    pub const FOGX: u32 = 41;
    pub const FOGXV: u32 = 42;
    pub const FRUSTUMX: u32 = 43;
    pub const GET_CLIP_PLANEX: u32 = 44;
    pub const GET_FIXEDV: u32 = 45;
    pub const GET_LIGHTXV: u32 = 46;
    pub const GET_MATERIALXV: u32 = 47;
    pub const GET_POINTERV: u32 = 48;
    pub const GET_TEX_ENVIV: u32 = 49;
    pub const GET_TEX_ENVXV: u32 = 50;
    pub const GET_TEX_PARAMETERXV: u32 = 51;
    pub const LIGHT_MODELX: u32 = 52;
    pub const LIGHT_MODELXV: u32 = 53;
    pub const LIGHTX: u32 = 54;
    pub const LIGHTXV: u32 = 55;
    pub const LINE_WIDTHX: u32 = 56;
    pub const LOAD_IDENTITY: u32 = 57;
    pub const LOAD_MATRIXX: u32 = 58;
    pub const LOGIC_OP: u32 = 59;
    pub const MATERIALX: u32 = 60;
    pub const MATERIALXV: u32 = 61;
    pub const MATRIX_MODE: u32 = 62;
    pub const MULT_MATRIXX: u32 = 63;
    pub const MULTI_TEX_COORD4X: u32 = 64;
    pub const NORMAL3X: u32 = 65;
    pub const NORMAL_POINTER: u32 = 66;
    pub const ORTHOX: u32 = 67;
    pub const POINT_PARAMETERX: u32 = 68;
    pub const POINT_PARAMETERXV: u32 = 69;
    pub const POINT_SIZEX: u32 = 70;
    pub const POLYGON_OFFSETX: u32 = 71;
    pub const POP_MATRIX: u32 = 72;
    pub const PUSH_MATRIX: u32 = 73;
    pub const ROTATEX: u32 = 74;
    pub const SAMPLE_COVERAGEX: u32 = 75;
    pub const SCALEX: u32 = 76;
    pub const SHADE_MODEL: u32 = 77;
    pub const TEX_COORD_POINTER: u32 = 78;
    pub const TEX_ENVI: u32 = 79;
    pub const TEX_ENVX: u32 = 80;
    pub const TEX_ENVIV: u32 = 81;
    pub const TEX_ENVXV: u32 = 82;
    pub const TEX_PARAMETERX: u32 = 83;
    pub const TEX_PARAMETERXV: u32 = 84;
    pub const TRANSLATEX: u32 = 85;
    pub const VERTEX_POINTER: u32 = 86;
    pub const POINT_SIZE_POINTER_OES: u32 = 87;
}

/// Number of GLES1 specific function ids
pub const NUM_FUNCS: u32 = 87;

fn light_param_len(pname: GLenum) -> Option<usize> {
    match pname {
        GL_AMBIENT | GL_DIFFUSE | GL_SPECULAR | GL_POSITION => Some(4),
        GL_SPOT_DIRECTION => Some(3),
        GL_SPOT_EXPONENT
        | GL_SPOT_CUTOFF
        | GL_CONSTANT_ATTENUATION
        | GL_LINEAR_ATTENUATION
        | GL_QUADRATIC_ATTENUATION => Some(1),
        _ => None,
    }
}

fn material_param_len(pname: GLenum) -> Option<usize> {
    match pname {
        GL_AMBIENT | GL_DIFFUSE | GL_SPECULAR | GL_EMISSION | GL_AMBIENT_AND_DIFFUSE => Some(4),
        GL_SHININESS => Some(1),
        _ => None,
    }
}

fn fog_param_len(pname: GLenum) -> Option<usize> {
    match pname {
        GL_FOG_MODE | GL_FOG_DENSITY | GL_FOG_START | GL_FOG_END => Some(1),
        GL_FOG_COLOR => Some(4),
        _ => None,
    }
}

fn point_param_len(pname: GLenum) -> Option<usize> {
    match pname {
        GL_POINT_SIZE_MIN | GL_POINT_SIZE_MAX | GL_POINT_FADE_THRESHOLD_SIZE => Some(1),
        GL_POINT_DISTANCE_ATTENUATION => Some(3),
        _ => None,
    }
}

fn light_model_param_len(pname: GLenum) -> Option<usize> {
    match pname {
        GL_LIGHT_MODEL_TWO_SIDE => Some(1),
        GL_LIGHT_MODEL_AMBIENT => Some(4),
        _ => None,
    }
}

fn is_tex_env_target(target: GLenum) -> bool {
    target == GL_TEXTURE_ENV || target == GL_POINT_SPRITE_OES
}

fn tex_env_param_len(pname: GLenum) -> usize {
    if pname == GL_TEXTURE_ENV_COLOR {
        4
    } else {
        1
    }
}

/// Whether a fixed `glTexEnvx` value is a number rather than an enum
fn tex_env_is_scalar(pname: GLenum) -> bool {
    matches!(pname, GL_TEXTURE_ENV_COLOR | GL_RGB_SCALE | GL_ALPHA_SCALE)
}

/// Exactly `len` values, missing ones read as zero
fn fit<T: Default + Clone>(values: Option<Vec<T>>, len: usize) -> Vec<T> {
    let mut values = values.unwrap_or_default();
    values.resize(len, T::default());
    values
}

fn fixed_to_floats(values: Option<Vec<GLfixed>>, len: usize) -> Vec<GLfloat> {
    fit(values, len).into_iter().map(fixed_to_float).collect()
}

fn matrix(values: &[GLfloat]) -> [GLfloat; 16] {
    let mut m = [0.0; 16];
    for (dst, src) in m.iter_mut().zip(values) {
        *dst = *src;
    }
    m
}

fn vec4(values: &[GLfloat]) -> [GLfloat; 4] {
    [values[0], values[1], values[2], values[3]]
}

fn plane_valid(ctx: &Gles1Context, plane: GLenum) -> bool {
    plane >= GL_CLIP_PLANE0 && plane < GL_CLIP_PLANE0 + ctx.max_clip_planes().max(0) as GLenum
}

fn light_valid(ctx: &Gles1Context, light: GLenum) -> bool {
    light >= GL_LIGHT0 && light < GL_LIGHT0 + ctx.max_lights().max(0) as GLenum
}

fn frustum_valid(l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat) -> bool {
    n > 0.0 && f > 0.0 && l != r && b != t && n != f
}

fn ortho_valid(l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat) -> bool {
    l != r && b != t && n != f
}

/// Shared body of the `gl*Pointer` calls once the version checks passed
fn set_pointer(ctx: &mut Gles1Context, index: u32, size: GLint, type_: GLenum, stride: GLsizei, va: GuestVirtAddr) {
    let error = ctx.gles_mut().array_pointer(index, size, type_, GL_FALSE, stride, va);
    if error != GL_NO_ERROR {
        ctx.gles_mut().set_error(error);
    }
}

fn client_state(ctx: &mut Gles1Context, array_name: GLenum, enable: bool) {
    let index = match ctx.array_index(array_name) {
        Some(index) => index,
        None => {
            ctx.gles_mut().set_error(GL_INVALID_ENUM);
            return;
        }
    };
    if let Some(array) = ctx.gles_mut().get_array_mut(index) {
        array.enable(enable);
    }
    // Point-size arrays never reach the host
    if array_name == GL_POINT_SIZE_ARRAY_OES {
        return;
    }
    if enable {
        ctx.driver().enable_client_state(array_name);
    } else {
        ctx.driver().disable_client_state(array_name);
    }
}

/// Floats the host reports for a light, material or texture env query,
/// or `None` after latching the error
fn get_tex_env(ctx: &mut Gles1Context, target: GLenum, pname: GLenum) -> Option<Vec<GLfloat>> {
    if !is_tex_env_target(target) {
        ctx.gles_mut().set_error(GL_INVALID_ENUM);
        return None;
    }
    let mut values = vec![0.0; tex_env_param_len(pname)];
    ctx.driver().get_tex_envfv(target, pname, &mut values);
    Some(values)
}

fn get_light(ctx: &mut Gles1Context, light: GLenum, pname: GLenum) -> Option<Vec<GLfloat>> {
    match light_param_len(pname) {
        Some(len) if light_valid(ctx, light) => {
            let mut values = vec![0.0; len];
            ctx.driver().get_lightfv(light, pname, &mut values);
            Some(values)
        }
        _ => {
            ctx.gles_mut().set_error(GL_INVALID_ENUM);
            None
        }
    }
}

fn get_material(ctx: &mut Gles1Context, face: GLenum, pname: GLenum) -> Option<Vec<GLfloat>> {
    match material_param_len(pname) {
        Some(len) => {
            let mut values = vec![0.0; len];
            ctx.driver().get_materialfv(face, pname, &mut values);
            Some(values)
        }
        None => {
            ctx.gles_mut().set_error(GL_INVALID_ENUM);
            None
        }
    }
}

fn put_fixed(t: &mut Transport, params: &crate::transport::InArray, values: &[GLfloat]) -> CallResult {
    let fixed: Vec<GLfixed> = values.iter().copied().map(float_to_fixed).collect();
    t.put_in_i32s(params, &fixed)
}

/// Dispatch a GLES1 call, `None` if `func_id` is not one
pub fn dispatch(func_id: u32, tc: &mut ThreadContext) -> Option<CallResult> {
    if func_id == 0 || func_id > NUM_FUNCS {
        return None;
    }
    call_trace!("gles1: call {}", func_id);
    Some(call(func_id, tc))
}

fn call(func_id: u32, tc: &mut ThreadContext) -> CallResult {
    let t = &mut tc.transport;
    match func_id {
        func::ALPHA_FUNC => {
            let (func, ref_) = (t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glAlphaFunc", |ctx, _| {
                ctx.driver().alpha_func(func, ref_);
                Ok(())
            })
        }
        func::CLIP_PLANEF => {
            let plane = t.get_u32()?;
            let equation = fit(get_f32s(t)?, 4);
            with_ctx::<Gles1Context>(tc, "glClipPlanef", |ctx, _| {
                if !plane_valid(ctx, plane) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                ctx.driver().clip_plane(plane, &vec4(&equation));
                Ok(())
            })
        }
        func::COLOR4F => {
            let (r, g, b, a) = (t.get_f32()?, t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glColor4f", |ctx, _| {
                ctx.driver().color4f(r, g, b, a);
                Ok(())
            })
        }
        func::FOGF => {
            let (pname, param) = (t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glFogf", |ctx, _| {
                if fog_param_len(pname) != Some(1) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                ctx.driver().fogf(pname, param);
                Ok(())
            })
        }
        func::FOGFV => {
            let pname = t.get_u32()?;
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glFogfv", |ctx, _| {
                match fog_param_len(pname) {
                    Some(len) => ctx.driver().fogfv(pname, &fit(params, len)),
                    None => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::FRUSTUMF => {
            let (l, r, b) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            let (top, n, f) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glFrustumf", |ctx, _| {
                if frustum_valid(l, r, b, top, n, f) {
                    ctx.driver().frustum(l, r, b, top, n, f);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                }
                Ok(())
            })
        }
        func::GET_CLIP_PLANEF => {
            let plane = t.get_u32()?;
            let eqn = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetClipPlanef", |ctx, t| {
                if !plane_valid(ctx, plane) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                t.put_in_f32s(&eqn, &ctx.driver().get_clip_plane(plane))
            })
        }
        func::GET_LIGHTFV => {
            let (light, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetLightfv", |ctx, t| match get_light(ctx, light, pname) {
                Some(values) => t.put_in_f32s(&params, &values),
                None => Ok(()),
            })
        }
        func::GET_MATERIALFV => {
            let (face, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetMaterialfv", |ctx, t| match get_material(ctx, face, pname) {
                Some(values) => t.put_in_f32s(&params, &values),
                None => Ok(()),
            })
        }
        func::GET_TEX_ENVFV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetTexEnvfv", |ctx, t| match get_tex_env(ctx, target, pname) {
                Some(values) => t.put_in_f32s(&params, &values),
                None => Ok(()),
            })
        }
        func::LIGHT_MODELF => {
            let (pname, param) = (t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glLightModelf", |ctx, _| {
                if pname == GL_LIGHT_MODEL_TWO_SIDE {
                    ctx.driver().light_modelf(pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::LIGHT_MODELFV => {
            let pname = t.get_u32()?;
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glLightModelfv", |ctx, _| {
                match light_model_param_len(pname) {
                    Some(len) => ctx.driver().light_modelfv(pname, &fit(params, len)),
                    None => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::LIGHTF => {
            let (light, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glLightf", |ctx, _| {
                if light_valid(ctx, light) {
                    ctx.driver().lightf(light, pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::LIGHTFV => {
            let (light, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glLightfv", |ctx, _| {
                match light_param_len(pname) {
                    Some(len) if light_valid(ctx, light) => {
                        ctx.driver().lightfv(light, pname, &fit(params, len))
                    }
                    _ => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::LOAD_MATRIXF | func::MULT_MATRIXF => {
            let m = get_f32s(t)?;
            let load = func_id == func::LOAD_MATRIXF;
            let name = if load { "glLoadMatrixf" } else { "glMultMatrixf" };
            with_ctx::<Gles1Context>(tc, name, |ctx, _| {
                if let Some(m) = m {
                    if load {
                        ctx.driver().load_matrixf(&matrix(&m));
                    } else {
                        ctx.driver().mult_matrixf(&matrix(&m));
                    }
                }
                Ok(())
            })
        }
        func::MATERIALF => {
            let (face, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glMaterialf", |ctx, _| {
                if face == GL_FRONT_AND_BACK {
                    ctx.driver().materialf(face, pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::MATERIALFV => {
            let (face, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glMaterialfv", |ctx, _| {
                match material_param_len(pname) {
                    Some(len) if face == GL_FRONT_AND_BACK => {
                        ctx.driver().materialfv(face, pname, &fit(params, len))
                    }
                    _ => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::MULTI_TEX_COORD4F | func::MULTI_TEX_COORD4X => {
            let target = t.get_u32()?;
            let coords = if func_id == func::MULTI_TEX_COORD4F {
                [t.get_f32()?, t.get_f32()?, t.get_f32()?, t.get_f32()?]
            } else {
                [t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float)
            };
            with_ctx::<Gles1Context>(tc, "glMultiTexCoord4f", |ctx, _| {
                let unit = target.wrapping_sub(GL_TEXTURE0) as usize;
                if target >= GL_TEXTURE0 && unit < ctx.gles().num_texture_units() {
                    let [s, t_, r, q] = coords;
                    ctx.driver().multi_tex_coord4f(target, s, t_, r, q);
                }
                Ok(())
            })
        }
        func::NORMAL3F => {
            let (nx, ny, nz) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glNormal3f", |ctx, _| {
                ctx.driver().normal3f(nx, ny, nz);
                Ok(())
            })
        }
        func::ORTHOF => {
            let (l, r, b) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            let (top, n, f) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glOrthof", |ctx, _| {
                if ortho_valid(l, r, b, top, n, f) {
                    ctx.driver().ortho(l, r, b, top, n, f);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                }
                Ok(())
            })
        }
        func::POINT_PARAMETERF => {
            let (pname, param) = (t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glPointParameterf", |ctx, _| {
                if point_param_len(pname) == Some(1) {
                    ctx.driver().point_parameterf(pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::POINT_PARAMETERFV => {
            let pname = t.get_u32()?;
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glPointParameterfv", |ctx, _| {
                match point_param_len(pname) {
                    Some(len) => ctx.driver().point_parameterfv(pname, &fit(params, len)),
                    None => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::POINT_SIZE | func::POINT_SIZEX => {
            let size = if func_id == func::POINT_SIZE {
                t.get_f32()?
            } else {
                fixed_to_float(t.get_i32()?)
            };
            with_ctx::<Gles1Context>(tc, "glPointSize", |ctx, _| {
                if size <= 0.0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else {
                    ctx.driver().point_size(size);
                }
                Ok(())
            })
        }
        func::ROTATEF => {
            let (angle, x, y, z) = (t.get_f32()?, t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glRotatef", |ctx, _| {
                ctx.driver().rotatef(angle, x, y, z);
                Ok(())
            })
        }
        func::SCALEF => {
            let (x, y, z) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glScalef", |ctx, _| {
                ctx.driver().scalef(x, y, z);
                Ok(())
            })
        }
        func::TEX_ENVF => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glTexEnvf", |ctx, _| {
                if is_tex_env_target(target) {
                    ctx.driver().tex_envf(target, pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::TEX_ENVFV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_f32s(t)?;
            with_ctx::<Gles1Context>(tc, "glTexEnvfv", |ctx, _| {
                if is_tex_env_target(target) {
                    ctx.driver()
                        .tex_envfv(target, pname, &fit(params, tex_env_param_len(pname)));
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::TRANSLATEF => {
            let (x, y, z) = (t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles1Context>(tc, "glTranslatef", |ctx, _| {
                ctx.driver().translatef(x, y, z);
                Ok(())
            })
        }
        func::ALPHA_FUNCX => {
            let (func, ref_) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glAlphaFuncx", |ctx, _| {
                ctx.driver().alpha_func(func, fixed_to_float(ref_));
                Ok(())
            })
        }
        func::CLEAR_COLORX => {
            let rgba = [t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glClearColorx", |ctx, _| {
                ctx.gles().driver().clear_color(rgba[0], rgba[1], rgba[2], rgba[3]);
                Ok(())
            })
        }
        func::CLEAR_DEPTHX => {
            let depth = fixed_to_float(t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glClearDepthx", |ctx, _| {
                ctx.gles().driver().clear_depth(depth);
                Ok(())
            })
        }
        func::CLIENT_ACTIVE_TEXTURE => {
            let texture = t.get_u32()?;
            with_ctx::<Gles1Context>(tc, "glClientActiveTexture", |ctx, _| {
                if ctx.set_client_active_texture(texture) {
                    ctx.driver().client_active_texture(texture);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::CLIP_PLANEX => {
            let plane = t.get_u32()?;
            let equation = fixed_to_floats(get_i32s(t)?, 4);
            with_ctx::<Gles1Context>(tc, "glClipPlanex", |ctx, _| {
                if !plane_valid(ctx, plane) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                ctx.driver().clip_plane(plane, &vec4(&equation));
                Ok(())
            })
        }
        func::COLOR4UB => {
            let rgba = [t.get_u8()?, t.get_u8()?, t.get_u8()?, t.get_u8()?].map(|c| c as GLfloat / 255.0);
            with_ctx::<Gles1Context>(tc, "glColor4ub", |ctx, _| {
                ctx.driver().color4f(rgba[0], rgba[1], rgba[2], rgba[3]);
                Ok(())
            })
        }
        func::COLOR4X => {
            let rgba = [t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glColor4x", |ctx, _| {
                ctx.driver().color4f(rgba[0], rgba[1], rgba[2], rgba[3]);
                Ok(())
            })
        }
        func::COLOR_POINTER => {
            let (size, type_, stride) = (t.get_i32()?, t.get_u32()?, t.get_i32()?);
            let va = t.get_va()?;
            with_ctx::<Gles1Context>(tc, "glColorPointer", |ctx, _| {
                if size != 4 || stride < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else if !matches!(type_, GL_FLOAT | GL_FIXED | GL_UNSIGNED_BYTE) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                } else {
                    set_pointer(ctx, ARRAY_COLOR, size, type_, stride, va);
                }
                Ok(())
            })
        }
        func::DEPTH_RANGEX => {
            let (z_near, z_far) = (fixed_to_float(t.get_i32()?), fixed_to_float(t.get_i32()?));
            with_ctx::<Gles1Context>(tc, "glDepthRangex", |ctx, _| {
                ctx.gles().driver().depth_range(z_near, z_far);
                Ok(())
            })
        }
        func::DISABLE_CLIENT_STATE | func::ENABLE_CLIENT_STATE => {
            let array_name = t.get_u32()?;
            let enable = func_id == func::ENABLE_CLIENT_STATE;
            let name = if enable { "glEnableClientState" } else { "glDisableClientState" };
            with_ctx::<Gles1Context>(tc, name, |ctx, _| {
                client_state(ctx, array_name, enable);
                Ok(())
            })
        }
        func::FOGX => {
            let (pname, param) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glFogx", |ctx, _| {
                match fog_param_len(pname) {
                    Some(1) if pname == GL_FOG_MODE => ctx.driver().fogf(pname, param as GLfloat),
                    Some(1) => ctx.driver().fogf(pname, fixed_to_float(param)),
                    _ => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::FOGXV => {
            let pname = t.get_u32()?;
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glFogxv", |ctx, _| {
                let len = match fog_param_len(pname) {
                    Some(len) => len,
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        return Ok(());
                    }
                };
                let values: Vec<GLfloat> = if pname == GL_FOG_MODE {
                    fit(params, len).into_iter().map(|x| x as GLfloat).collect()
                } else {
                    fixed_to_floats(params, len)
                };
                ctx.driver().fogfv(pname, &values);
                Ok(())
            })
        }
        func::FRUSTUMX | func::ORTHOX => {
            let [l, r, b, top, n, f] = [
                t.get_i32()?,
                t.get_i32()?,
                t.get_i32()?,
                t.get_i32()?,
                t.get_i32()?,
                t.get_i32()?,
            ]
            .map(fixed_to_float);
            let frustum = func_id == func::FRUSTUMX;
            let name = if frustum { "glFrustumx" } else { "glOrthox" };
            with_ctx::<Gles1Context>(tc, name, |ctx, _| {
                if frustum && frustum_valid(l, r, b, top, n, f) {
                    ctx.driver().frustum(l, r, b, top, n, f);
                } else if !frustum && ortho_valid(l, r, b, top, n, f) {
                    ctx.driver().ortho(l, r, b, top, n, f);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                }
                Ok(())
            })
        }
        func::GET_CLIP_PLANEX => {
            let plane = t.get_u32()?;
            let eqn = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetClipPlanex", |ctx, t| {
                if !plane_valid(ctx, plane) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                put_fixed(t, &eqn, &ctx.driver().get_clip_plane(plane))
            })
        }
        func::GET_FIXEDV => {
            let pname = t.get_u32()?;
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetFixedv", |ctx, t| {
                let count = match param_count(ctx, pname) {
                    Some(count) => count,
                    None => return Ok(()),
                };
                let values = float_state(ctx, pname, count);
                put_fixed(t, &params, &values)
            })
        }
        func::GET_LIGHTXV => {
            let (light, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetLightxv", |ctx, t| match get_light(ctx, light, pname) {
                Some(values) => put_fixed(t, &params, &values),
                None => Ok(()),
            })
        }
        func::GET_MATERIALXV => {
            let (face, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetMaterialxv", |ctx, t| match get_material(ctx, face, pname) {
                Some(values) => put_fixed(t, &params, &values),
                None => Ok(()),
            })
        }
        func::GET_POINTERV => {
            let pname = t.get_u32()?;
            let param = t.get_in_arg()?;
            with_ctx::<Gles1Context>(tc, "glGetPointerv", |ctx, t| {
                let pointer = ctx
                    .array_index(pname)
                    .and_then(|index| ctx.gles().get_array(index))
                    .map(|array| array.pointer());
                match pointer {
                    Some(pointer) => t.put_in_arg_u32(&param, pointer as u32),
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        Ok(())
                    }
                }
            })
        }
        func::GET_TEX_ENVIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetTexEnviv", |ctx, t| {
                if !is_tex_env_target(target) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let mut values = vec![0; tex_env_param_len(pname)];
                ctx.driver().get_tex_enviv(target, pname, &mut values);
                t.put_in_i32s(&params, &values)
            })
        }
        func::GET_TEX_ENVXV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles1Context>(tc, "glGetTexEnvxv", |ctx, t| match get_tex_env(ctx, target, pname) {
                Some(values) if tex_env_is_scalar(pname) => put_fixed(t, &params, &values),
                Some(values) => {
                    let values: Vec<GLfixed> = values.into_iter().map(|v| v as GLfixed).collect();
                    t.put_in_i32s(&params, &values)
                }
                None => Ok(()),
            })
        }
        func::GET_TEX_PARAMETERXV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<Gles1Context>(tc, "glGetTexParameterxv", |ctx, t| {
                if target != GL_TEXTURE_2D {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let mut value = [0.0];
                ctx.gles().driver().get_tex_parameterfv(target, pname, &mut value);
                t.put_in_arg_i32(&param, value[0] as GLfixed)
            })
        }
        func::LIGHT_MODELX => {
            let (pname, param) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glLightModelx", |ctx, _| {
                if pname == GL_LIGHT_MODEL_TWO_SIDE {
                    ctx.driver().light_modelf(pname, param as GLfloat);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::LIGHT_MODELXV => {
            let pname = t.get_u32()?;
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glLightModelxv", |ctx, _| {
                match light_model_param_len(pname) {
                    Some(len) if pname == GL_LIGHT_MODEL_TWO_SIDE => {
                        let values: Vec<GLfloat> = fit(params, len).into_iter().map(|x| x as GLfloat).collect();
                        ctx.driver().light_modelfv(pname, &values);
                    }
                    Some(len) => ctx.driver().light_modelfv(pname, &fixed_to_floats(params, len)),
                    None => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::LIGHTX => {
            let (light, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glLightx", |ctx, _| {
                if light_valid(ctx, light) {
                    ctx.driver().lightf(light, pname, fixed_to_float(param));
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::LIGHTXV => {
            let (light, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glLightxv", |ctx, _| {
                match light_param_len(pname) {
                    Some(len) if light_valid(ctx, light) => {
                        ctx.driver().lightfv(light, pname, &fixed_to_floats(params, len))
                    }
                    _ => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::LINE_WIDTHX => {
            let width = fixed_to_float(t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glLineWidthx", |ctx, _| {
                if width <= 0.0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else {
                    ctx.gles().driver().line_width(width);
                }
                Ok(())
            })
        }
        func::LOAD_IDENTITY => with_ctx::<Gles1Context>(tc, "glLoadIdentity", |ctx, _| {
            ctx.driver().load_identity();
            Ok(())
        }),
        func::LOAD_MATRIXX | func::MULT_MATRIXX => {
            let m = get_i32s(t)?;
            let load = func_id == func::LOAD_MATRIXX;
            let name = if load { "glLoadMatrixx" } else { "glMultMatrixx" };
            with_ctx::<Gles1Context>(tc, name, |ctx, _| {
                if m.is_some() {
                    let m = matrix(&fixed_to_floats(m, 16));
                    if load {
                        ctx.driver().load_matrixf(&m);
                    } else {
                        ctx.driver().mult_matrixf(&m);
                    }
                }
                Ok(())
            })
        }
        func::LOGIC_OP => {
            let opcode = t.get_u32()?;
            with_ctx::<Gles1Context>(tc, "glLogicOp", |ctx, _| {
                ctx.driver().logic_op(opcode);
                Ok(())
            })
        }
        func::MATERIALX => {
            let (face, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glMaterialx", |ctx, _| {
                if face == GL_FRONT_AND_BACK {
                    ctx.driver().materialf(face, pname, fixed_to_float(param));
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::MATERIALXV => {
            let (face, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glMaterialxv", |ctx, _| {
                match material_param_len(pname) {
                    Some(len) if face == GL_FRONT_AND_BACK => {
                        ctx.driver().materialfv(face, pname, &fixed_to_floats(params, len))
                    }
                    _ => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::MATRIX_MODE => {
            let mode = t.get_u32()?;
            with_ctx::<Gles1Context>(tc, "glMatrixMode", |ctx, _| {
                ctx.driver().matrix_mode(mode);
                Ok(())
            })
        }
        func::NORMAL3X => {
            let [nx, ny, nz] = [t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glNormal3x", |ctx, _| {
                ctx.driver().normal3f(nx, ny, nz);
                Ok(())
            })
        }
        func::NORMAL_POINTER => {
            let (type_, stride) = (t.get_u32()?, t.get_i32()?);
            let va = t.get_va()?;
            with_ctx::<Gles1Context>(tc, "glNormalPointer", |ctx, _| {
                if stride < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else if !matches!(type_, GL_FLOAT | GL_FIXED | GL_SHORT | GL_BYTE) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                } else {
                    set_pointer(ctx, ARRAY_NORMAL, 3, type_, stride, va);
                }
                Ok(())
            })
        }
        func::POINT_PARAMETERX => {
            let (pname, param) = (t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glPointParameterx", |ctx, _| {
                if point_param_len(pname) == Some(1) {
                    ctx.driver().point_parameterf(pname, fixed_to_float(param));
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::POINT_PARAMETERXV => {
            let pname = t.get_u32()?;
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glPointParameterxv", |ctx, _| {
                match point_param_len(pname) {
                    Some(len) => ctx.driver().point_parameterfv(pname, &fixed_to_floats(params, len)),
                    None => ctx.gles_mut().set_error(GL_INVALID_ENUM),
                }
                Ok(())
            })
        }
        func::POLYGON_OFFSETX => {
            let (factor, units) = (fixed_to_float(t.get_i32()?), fixed_to_float(t.get_i32()?));
            with_ctx::<Gles1Context>(tc, "glPolygonOffsetx", |ctx, _| {
                ctx.gles().driver().polygon_offset(factor, units);
                Ok(())
            })
        }
        func::POP_MATRIX => with_ctx::<Gles1Context>(tc, "glPopMatrix", |ctx, _| {
            ctx.driver().pop_matrix();
            Ok(())
        }),
        func::PUSH_MATRIX => with_ctx::<Gles1Context>(tc, "glPushMatrix", |ctx, _| {
            ctx.driver().push_matrix();
            Ok(())
        }),
        func::ROTATEX => {
            let [angle, x, y, z] = [t.get_i32()?, t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glRotatex", |ctx, _| {
                ctx.driver().rotatef(angle, x, y, z);
                Ok(())
            })
        }
        func::SAMPLE_COVERAGEX => {
            let (value, invert) = (fixed_to_float(t.get_i32()?), t.get_u8()?);
            with_ctx::<Gles1Context>(tc, "glSampleCoveragex", |ctx, _| {
                ctx.gles().driver().sample_coverage(value, invert);
                Ok(())
            })
        }
        func::SCALEX => {
            let [x, y, z] = [t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glScalex", |ctx, _| {
                ctx.driver().scalef(x, y, z);
                Ok(())
            })
        }
        func::SHADE_MODEL => {
            let mode = t.get_u32()?;
            with_ctx::<Gles1Context>(tc, "glShadeModel", |ctx, _| {
                ctx.driver().shade_model(mode);
                Ok(())
            })
        }
        func::TEX_COORD_POINTER | func::VERTEX_POINTER => {
            let (size, type_, stride) = (t.get_i32()?, t.get_u32()?, t.get_i32()?);
            let va = t.get_va()?;
            let vertex = func_id == func::VERTEX_POINTER;
            let name = if vertex { "glVertexPointer" } else { "glTexCoordPointer" };
            with_ctx::<Gles1Context>(tc, name, |ctx, _| {
                if !(2..=4).contains(&size) || stride < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else if !matches!(type_, GL_FLOAT | GL_FIXED | GL_SHORT | GL_BYTE) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                } else {
                    let index = if vertex {
                        Some(ARRAY_VERTEX)
                    } else {
                        ctx.array_index(GL_TEXTURE_COORD_ARRAY)
                    };
                    if let Some(index) = index {
                        set_pointer(ctx, index, size, type_, stride, va);
                    }
                }
                Ok(())
            })
        }
        func::TEX_ENVI => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glTexEnvi", |ctx, _| {
                if is_tex_env_target(target) {
                    ctx.driver().tex_envi(target, pname, param);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::TEX_ENVX => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glTexEnvx", |ctx, _| {
                if !is_tex_env_target(target) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let value = if tex_env_is_scalar(pname) {
                    fixed_to_float(param)
                } else {
                    param as GLfloat
                };
                ctx.driver().tex_envf(target, pname, value);
                Ok(())
            })
        }
        func::TEX_ENVIV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glTexEnviv", |ctx, _| {
                if is_tex_env_target(target) {
                    ctx.driver()
                        .tex_enviv(target, pname, &fit(params, tex_env_param_len(pname)));
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::TEX_ENVXV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glTexEnvxv", |ctx, _| {
                if !is_tex_env_target(target) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let len = tex_env_param_len(pname);
                let values: Vec<GLfloat> = if tex_env_is_scalar(pname) {
                    fixed_to_floats(params, len)
                } else {
                    fit(params, len).into_iter().map(|x| x as GLfloat).collect()
                };
                ctx.driver().tex_envfv(target, pname, &values);
                Ok(())
            })
        }
        func::TEX_PARAMETERX => {
            let (target, pname, param) = (t.get_u32()?, t.get_u32()?, t.get_i32()?);
            with_ctx::<Gles1Context>(tc, "glTexParameterx", |ctx, _| {
                if target == GL_TEXTURE_2D {
                    ctx.gles().driver().tex_parameterf(target, pname, param as GLfloat);
                } else {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                }
                Ok(())
            })
        }
        func::TEX_PARAMETERXV => {
            let (target, pname) = (t.get_u32()?, t.get_u32()?);
            let params = get_i32s(t)?;
            with_ctx::<Gles1Context>(tc, "glTexParameterxv", |ctx, _| {
                if target != GL_TEXTURE_2D {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let values: Vec<GLfloat> = params
                    .unwrap_or_default()
                    .into_iter()
                    .take(1)
                    .map(|x| x as GLfloat)
                    .collect();
                ctx.gles().driver().tex_parameterfv(target, pname, &values);
                Ok(())
            })
        }
        func::TRANSLATEX => {
            let [x, y, z] = [t.get_i32()?, t.get_i32()?, t.get_i32()?].map(fixed_to_float);
            with_ctx::<Gles1Context>(tc, "glTranslatex", |ctx, _| {
                ctx.driver().translatef(x, y, z);
                Ok(())
            })
        }
        func::POINT_SIZE_POINTER_OES => {
            let (type_, stride) = (t.get_u32()?, t.get_i32()?);
            let va = t.get_va()?;
            with_ctx::<Gles1Context>(tc, "glPointSizePointerOES", |ctx, _| {
                if stride < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                } else if !matches!(type_, GL_FLOAT | GL_FIXED) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                } else {
                    set_pointer(ctx, ARRAY_POINTSIZE, 1, type_, stride, va);
                }
                Ok(())
            })
        }
        _ => Err(CallError::Protocol(format!("gles1: unhandled function {}", func_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Api, ApiTs, ProcessEnv};
    use crate::client::ClientApi;
    use crate::config::YaglConfig;
    use crate::driver::{HeadlessDriver, HostCall, HostDrivers};
    use crate::gles::calls::{func as common, NUM_FUNCS as NUM_COMMON_FUNCS};
    use crate::gles1::Gles1Api;
    use crate::mem::{GuestMemory, PageSet};
    use crate::object::Sharegroup;
    use crate::testutil::{BatchWriter, NoEnsure, SimMemory};
    use std::sync::Arc;

    const API: u32 = 2;
    const BATCH_PA: u64 = 0x80000;
    const VERTEX_VA: u64 = 0x4001_0000;
    const VERTEX_PA: u64 = 0x110000;

    fn id(func_id: u32) -> u32 {
        NUM_COMMON_FUNCS + func_id
    }

    struct Harness {
        sim: Arc<SimMemory>,
        driver: Arc<HeadlessDriver>,
        ts: Box<dyn ApiTs>,
        tc: ThreadContext,
    }

    impl Harness {
        fn new() -> Self {
            let sim = SimMemory::new();
            let driver = Arc::new(HeadlessDriver::new());
            let mem: Arc<dyn GuestMemory> = sim.clone();
            let config = YaglConfig::default();
            let env = Arc::new(ProcessEnv::new(
                1,
                Arc::new(config.clone()),
                HostDrivers::from_driver(driver.clone()),
                mem.clone(),
            ));

            let mut tc = ThreadContext::new(1, 1, Transport::new(&config, mem));
            let ts = Gles1Api.process_init(&env).thread_init(&mut tc);

            let ctx = env
                .client_iface(ClientApi::Gles1)
                .unwrap()
                .create_ctx(Sharegroup::new(), Arc::new(NoEnsure));
            ctx.lock().activate();
            tc.current = Some(ctx);
            driver.clear_calls();

            Harness { sim, driver, ts, tc }
        }

        fn run(&mut self, w: &BatchWriter) -> CallResult {
            let mem: Arc<dyn GuestMemory> = self.sim.clone();
            let addrs = self.sim.load_batch(BATCH_PA, w.bytes());
            self.tc
                .transport
                .set_pages(Some(PageSet::map(mem, &addrs).unwrap()));
            self.tc.transport.begin(0)?;
            while let Some((_, func_id)) = self.tc.transport.begin_call()? {
                self.ts.call(func_id, &mut self.tc)?;
                self.tc.transport.end_call()?;
            }
            Ok(())
        }

        fn slot(&self, offset: usize) -> u32 {
            self.sim.phys_u32(BATCH_PA + offset as u64)
        }

        fn with<R>(&self, f: impl FnOnce(&mut Gles1Context) -> R) -> R {
            let shared = self.tc.current.clone().unwrap();
            let mut guard = shared.lock();
            f(guard.as_any_mut().downcast_mut::<Gles1Context>().unwrap())
        }

        fn error(&self) -> GLenum {
            self.with(|ctx| ctx.gles_mut().get_error())
        }
    }

    #[test]
    fn test_dispatch_range() {
        let mut h = Harness::new();
        assert!(dispatch(0, &mut h.tc).is_none());
        assert!(dispatch(NUM_FUNCS + 1, &mut h.tc).is_none());
        assert!(matches!(
            h.ts.call(id(NUM_FUNCS + 1), &mut h.tc),
            Err(CallError::Protocol(_))
        ));
    }

    #[test]
    fn test_client_state() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::ENABLE_CLIENT_STATE), false);
        w.u32(GL_POINT_SIZE_ARRAY_OES);
        w.call(API, id(func::ENABLE_CLIENT_STATE), false);
        w.u32(GL_VERTEX_ARRAY);
        w.call(API, id(func::ENABLE_CLIENT_STATE), false);
        w.u32(GL_TEXTURE_2D);
        w.call(API, common::IS_ENABLED, false);
        w.u32(GL_POINT_SIZE_ARRAY_OES);
        let enabled = w.in_arg();
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(enabled), 1);
        assert_eq!(h.error(), GL_INVALID_ENUM);
        let forwarded: Vec<_> = h
            .driver
            .take_calls()
            .into_iter()
            .filter(|c| *c == HostCall::Call("glEnableClientState"))
            .collect();
        assert_eq!(forwarded.len(), 1);
    }

    #[test]
    fn test_client_active_texture() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::CLIENT_ACTIVE_TEXTURE), false);
        w.u32(GL_TEXTURE0 + 1);
        w.call(API, id(func::TEX_COORD_POINTER), false);
        w.i32(2);
        w.u32(GL_FLOAT);
        w.i32(0);
        w.u32(0x1000);
        w.call(API, id(func::GET_POINTERV), false);
        w.u32(GL_TEXTURE_COORD_ARRAY_POINTER);
        let pointer = w.in_arg();
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(pointer), 0x1000);
        assert_eq!(h.with(|ctx| ctx.client_active_texture()), 1);
        assert_eq!(h.error(), GL_NO_ERROR);

        let mut w = BatchWriter::new();
        w.call(API, id(func::CLIENT_ACTIVE_TEXTURE), false);
        w.u32(GL_TEXTURE0 + 4);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);
        assert_eq!(h.with(|ctx| ctx.client_active_texture()), 1);
    }

    #[test]
    fn test_pointer_validation() {
        let mut h = Harness::new();
        let cases: [(u32, i32, GLenum, GLenum); 5] = [
            (func::COLOR_POINTER, 3, GL_FLOAT, GL_INVALID_VALUE),
            (func::COLOR_POINTER, 4, GL_SHORT, GL_INVALID_ENUM),
            (func::VERTEX_POINTER, 1, GL_FLOAT, GL_INVALID_VALUE),
            (func::VERTEX_POINTER, 3, GL_UNSIGNED_BYTE, GL_INVALID_ENUM),
            (func::VERTEX_POINTER, 3, GL_FIXED, GL_NO_ERROR),
        ];
        for (func_id, size, type_, error) in cases {
            let mut w = BatchWriter::new();
            w.call(API, id(func_id), false);
            w.i32(size);
            w.u32(type_);
            w.i32(0);
            w.u32(0x2000);
            w.end();
            h.run(&w).unwrap();
            assert_eq!(h.error(), error, "func {} size {}", func_id, size);
        }

        let mut w = BatchWriter::new();
        w.call(API, id(func::POINT_SIZE_POINTER_OES), false);
        w.u32(GL_SHORT);
        w.i32(0);
        w.u32(0x2000);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_fixed_vertices_are_converted() {
        let mut h = Harness::new();
        h.sim.map_virt(VERTEX_VA, VERTEX_PA);
        let vertices: Vec<u8> = [0x10000i32, 0x20000, -0x8000, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        h.sim.write_virt(VERTEX_VA, &vertices).unwrap();

        let mut w = BatchWriter::new();
        w.call(API, id(func::VERTEX_POINTER), false);
        w.i32(2);
        w.u32(GL_FIXED);
        w.i32(0);
        w.u32(VERTEX_VA as u32);
        w.call(API, id(func::ENABLE_CLIENT_STATE), false);
        w.u32(GL_VERTEX_ARRAY);
        w.call(API, common::DRAW_ARRAYS, false);
        w.u32(GL_LINES);
        w.i32(0);
        w.i32(2);
        w.end();
        h.run(&w).unwrap();

        let expected: Vec<u8> = [1.0f32, 2.0, -0.5, 0.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let calls = h.driver.take_calls();
        assert!(calls.contains(&HostCall::Pointer {
            func: "glVertexPointer",
            index: 0,
            size: 2,
            type_: GL_FLOAT,
            stride: 8,
            data: crate::driver::PointerData::Bytes(expected),
        }));
        assert!(calls.contains(&HostCall::DrawArrays {
            mode: GL_LINES,
            first: 0,
            count: 2
        }));
        assert_eq!(h.error(), GL_NO_ERROR);
    }

    #[test]
    fn test_light_queries() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_LIGHTFV), false);
        w.u32(GL_LIGHT0 + 1);
        w.u32(GL_SPOT_DIRECTION);
        let (count_at, _) = w.in_inline(4, 4);
        w.call(API, id(func::GET_LIGHTXV), false);
        w.u32(GL_LIGHT0 + 8);
        w.u32(GL_AMBIENT);
        w.in_inline(4, 4);
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(count_at), 3);
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_get_fixedv() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_FIXEDV), false);
        w.u32(GL_MAX_LIGHTS);
        let (count_at, data_at) = w.in_inline(4, 4);
        w.call(API, id(func::GET_FIXEDV), false);
        w.u32(0x1234);
        w.in_inline(4, 4);
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(count_at), 1);
        assert_eq!(h.slot(data_at), 8 << 16);
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_clip_planes_and_ranges() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::CLIP_PLANEX), false);
        let eq: Vec<u8> = [0x10000i32, 0, 0, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
        w.u32(GL_CLIP_PLANE0 + 6);
        w.out_inline(4, &eq);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);

        let mut w = BatchWriter::new();
        w.call(API, id(func::FRUSTUMF), false);
        for v in [-1.0f32, 1.0, -1.0, 1.0, 0.0, 10.0] {
            w.f32(v);
        }
        w.call(API, id(func::POINT_SIZEX), false);
        w.i32(0);
        w.end();
        h.run(&w).unwrap();
        // Near plane at zero; the zero point size error is not latched over it
        assert_eq!(h.error(), GL_INVALID_VALUE);
        assert!(h.driver.take_calls().is_empty());
    }

    #[test]
    fn test_color4ub_scales() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::COLOR4UB), false);
        for c in [255u32, 0, 51, 255] {
            w.u32(c);
        }
        w.call(API, id(func::TEX_ENVX), false);
        w.u32(GL_TEXTURE_2D);
        w.u32(GL_TEXTURE_ENV_MODE);
        w.i32(0);
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.driver.take_calls(), vec![HostCall::Call("glColor4f")]);
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }
}
