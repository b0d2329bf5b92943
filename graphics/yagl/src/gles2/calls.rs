//! GLES2 call handlers
//!
//! Ids here are relative to the end of the shared GLES range. Shaders and
//! programs live in one sharegroup namespace; naming an object of the
//! wrong kind is `GL_INVALID_OPERATION`, naming nothing is
//! `GL_INVALID_VALUE`.

use std::sync::Arc;

use super::context::Gles2Context;
use super::program::GlesProgram;
use super::shader::GlesShader;
use crate::api::{CallError, CallResult, ThreadContext};
use crate::gl::*;
use crate::gles::calls::{get_f32s, get_i32s, with_ctx};
use crate::gles::GlesClient;
use crate::object::{downcast, NamespaceKind, Object};
use crate::transport::{split_string_array, InArg, InArray, Transport};
use crate::types::ObjectName;

pub mod func {
    pub const ATTACH_SHADER: u32 = 1;
    pub const BIND_ATTRIB_LOCATION: u32 = 2;
    pub const BLEND_COLOR: u32 = 3;
    pub const BLEND_EQUATION: u32 = 4;
    pub const BLEND_EQUATION_SEPARATE: u32 = 5;
    pub const BLEND_FUNC_SEPARATE: u32 = 6;
    pub const COMPILE_SHADER: u32 = 7;
    pub const CREATE_PROGRAM: u32 = 8;
    pub const CREATE_SHADER: u32 = 9;
    pub const DELETE_PROGRAM: u32 = 10;
    pub const DELETE_SHADER: u32 = 11;
    pub const DETACH_SHADER: u32 = 12;
    pub const DISABLE_VERTEX_ATTRIB_ARRAY: u32 = 13;
    pub const ENABLE_VERTEX_ATTRIB_ARRAY: u32 = 14;
    pub const GET_ACTIVE_ATTRIB: u32 = 15;
    pub const GET_ACTIVE_UNIFORM: u32 = 16;
    pub const GET_ATTACHED_SHADERS: u32 = 17;
    pub const GET_ATTRIB_LOCATION: u32 = 18;
    pub const GET_PROGRAMIV: u32 = 19;
    pub const GET_PROGRAM_INFO_LOG: u32 = 20;
    pub const GET_SHADERIV: u32 = 21;
    pub const GET_SHADER_INFO_LOG: u32 = 22;
    pub const GET_SHADER_PRECISION_FORMAT: u32 = 23;
    pub const GET_SHADER_SOURCE: u32 = 24;
    pub const GET_UNIFORMFV: u32 = 25;
    pub const GET_UNIFORMIV: u32 = 26;
    pub const GET_UNIFORM_LOCATION: u32 = 27;
    pub const GET_VERTEX_ATTRIBFV: u32 = 28;
    pub const GET_VERTEX_ATTRIBIV: u32 = 29;
    pub const GET_VERTEX_ATTRIB_POINTERV: u32 = 30;
    pub const IS_PROGRAM: u32 = 31;
    pub const IS_SHADER: u32 = 32;
    pub const LINK_PROGRAM: u32 = 33;
    pub const RELEASE_SHADER_COMPILER: u32 = 34;
    pub const SHADER_BINARY: u32 = 35;
    pub const SHADER_SOURCE: u32 = 36;
    pub const STENCIL_FUNC_SEPARATE: u32 = 37;
    pub const STENCIL_MASK_SEPARATE: u32 = 38;
    pub const STENCIL_OP_SEPARATE: u32 = 39;
    pub const UNIFORM1F: u32 = 40;
    pub const UNIFORM1FV: u32 = 41;
    pub const UNIFORM1I: u32 = 42;
    pub const UNIFORM1IV: u32 = 43;
    pub const UNIFORM2F: u32 = 44;
    pub const UNIFORM2FV: u32 = 45;
    pub const UNIFORM2I: u32 = 46;
    pub const UNIFORM2IV: u32 = 47;
    pub const UNIFORM3F: u32 = 48;
    pub const UNIFORM3FV: u32 = 49;
    pub const UNIFORM3I: u32 = 50;
    pub const UNIFORM3IV: u32 = 51;
    pub const UNIFORM4F: u32 = 52;
    pub const UNIFORM4FV: u32 = 53;
    pub const UNIFORM4I: u32 = 54;
    pub const UNIFORM4IV: u32 = 55;
    pub const UNIFORM_MATRIX2FV: u32 = 56;
    pub const UNIFORM_MATRIX3FV: u32 = 57;
    pub const UNIFORM_MATRIX4FV: u32 = 58;
    pub const USE_PROGRAM: u32 = 59;
    pub const VALIDATE_PROGRAM: u32 = 60;
    pub const VERTEX_ATTRIB1F: u32 = 61;
    pub const VERTEX_ATTRIB1FV: u32 = 62;
    pub const VERTEX_ATTRIB2F: u32 = 63;
    pub const VERTEX_ATTRIB2FV: u32 = 64;
    pub const VERTEX_ATTRIB3F: u32 = 65;
    pub const VERTEX_ATTRIB3FV: u32 = 66;
    pub const VERTEX_ATTRIB4F: u32 = 67;
    pub const VERTEX_ATTRIB4FV: u32 = 68;
    pub const VERTEX_ATTRIB_POINTER: u32 = 69;
}

/// Number of GLES2 specific function ids
pub const NUM_FUNCS: u32 = 69;

/// Largest uniform, a 4x4 matrix
const MAX_UNIFORM_VALUES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniformForm {
    Float,
    FloatVector,
    Int,
    IntVector,
}

/// Components and argument form of a `glUniform*` entry point
fn uniform_form(func_id: u32) -> Option<(usize, UniformForm)> {
    use UniformForm::*;
    let form = match func_id {
        func::UNIFORM1F => (1, Float),
        func::UNIFORM2F => (2, Float),
        func::UNIFORM3F => (3, Float),
        func::UNIFORM4F => (4, Float),
        func::UNIFORM1FV => (1, FloatVector),
        func::UNIFORM2FV => (2, FloatVector),
        func::UNIFORM3FV => (3, FloatVector),
        func::UNIFORM4FV => (4, FloatVector),
        func::UNIFORM1I => (1, Int),
        func::UNIFORM2I => (2, Int),
        func::UNIFORM3I => (3, Int),
        func::UNIFORM4I => (4, Int),
        func::UNIFORM1IV => (1, IntVector),
        func::UNIFORM2IV => (2, IntVector),
        func::UNIFORM3IV => (3, IntVector),
        func::UNIFORM4IV => (4, IntVector),
        _ => return None,
    };
    Some(form)
}

fn matrix_dim(func_id: u32) -> Option<usize> {
    match func_id {
        func::UNIFORM_MATRIX2FV => Some(2),
        func::UNIFORM_MATRIX3FV => Some(3),
        func::UNIFORM_MATRIX4FV => Some(4),
        _ => None,
    }
}

/// Components of a `glVertexAttrib*` entry point and whether it takes a vector
fn vertex_attrib_form(func_id: u32) -> Option<(usize, bool)> {
    match func_id {
        func::VERTEX_ATTRIB1F => Some((1, false)),
        func::VERTEX_ATTRIB2F => Some((2, false)),
        func::VERTEX_ATTRIB3F => Some((3, false)),
        func::VERTEX_ATTRIB4F => Some((4, false)),
        func::VERTEX_ATTRIB1FV => Some((1, true)),
        func::VERTEX_ATTRIB2FV => Some((2, true)),
        func::VERTEX_ATTRIB3FV => Some((3, true)),
        func::VERTEX_ATTRIB4FV => Some((4, true)),
        _ => None,
    }
}

fn is_precision_type(precisiontype: GLenum) -> bool {
    matches!(
        precisiontype,
        GL_LOW_FLOAT | GL_MEDIUM_FLOAT | GL_HIGH_FLOAT | GL_LOW_INT | GL_MEDIUM_INT | GL_HIGH_INT
    )
}

/// Exactly `len` values, missing ones read as zero
fn fit<T: Default + Clone>(values: Option<Vec<T>>, len: usize) -> Vec<T> {
    let mut values = values.unwrap_or_default();
    values.resize(len, T::default());
    values
}

/// Program or shader `name`, or `None` after latching the error
fn acquire<T: Object>(ctx: &mut Gles2Context, name: ObjectName) -> Option<Arc<T>> {
    let obj = ctx.gles().sharegroup().acquire(NamespaceKind::Program, name);
    match obj.map(downcast::<T>) {
        Some(Some(obj)) => Some(obj),
        Some(None) => {
            ctx.gles_mut().set_error(GL_INVALID_OPERATION);
            None
        }
        None => {
            ctx.gles_mut().set_error(GL_INVALID_VALUE);
            None
        }
    }
}

fn is_object<T: Object>(ctx: &Gles2Context, name: ObjectName) -> bool {
    name != 0
        && ctx
            .gles()
            .sharegroup()
            .acquire_as::<T>(NamespaceKind::Program, name)
            .is_some()
}

/// Guest string from a byte out-array
fn get_string(t: &mut Transport) -> Result<Option<String>, CallError> {
    let array = t.get_out_array(1)?;
    Ok(t.out_string(&array))
}

/// Write a log or source string; a negative buffer size is the guest's error
fn put_string(ctx: &mut Gles2Context, t: &mut Transport, out: &InArray, s: &str) -> CallResult {
    if out.maxcount() < 0 {
        ctx.gles_mut().set_error(GL_INVALID_VALUE);
        return Ok(());
    }
    t.put_in_string(out, s)
}

/// Answer `glGetActiveAttrib`/`glGetActiveUniform` once the host found the variable
fn put_active(
    t: &mut Transport,
    var: &crate::driver::ActiveVariable,
    length: &InArg,
    size: &InArg,
    type_: &InArg,
    name: &InArray,
) -> CallResult {
    let written = if name.is_null() || name.maxcount() <= 0 {
        0
    } else {
        var.name.len().min(name.maxcount() as usize - 1)
    };
    t.put_in_arg_i32(length, written as GLint)?;
    t.put_in_arg_i32(size, var.size)?;
    t.put_in_arg_u32(type_, var.type_)?;
    t.put_in_string(name, &var.name)
}

/// Array parameters answered from the tracked state
fn vertex_attrib_param(ctx: &Gles2Context, index: GLuint, pname: GLenum) -> Option<GLint> {
    let array = ctx.gles().get_array(index)?;
    let value = match pname {
        GL_VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => array.vbo_local_name() as GLint,
        GL_VERTEX_ATTRIB_ARRAY_ENABLED => array.enabled() as GLint,
        GL_VERTEX_ATTRIB_ARRAY_SIZE => array.size(),
        GL_VERTEX_ATTRIB_ARRAY_STRIDE => array.stride(),
        GL_VERTEX_ATTRIB_ARRAY_TYPE => array.type_() as GLint,
        GL_VERTEX_ATTRIB_ARRAY_NORMALIZED => array.normalized() as GLint,
        _ => return None,
    };
    Some(value)
}

/// Shared body of `glGetVertexAttribfv`/`iv`: `Some(ints)` for array state,
/// `None` for the current value, error latched for everything else
fn get_vertex_attrib(ctx: &mut Gles2Context, index: GLuint, pname: GLenum) -> Result<Option<GLint>, ()> {
    if ctx.gles().get_array(index).is_none() {
        ctx.gles_mut().set_error(GL_INVALID_VALUE);
        return Err(());
    }
    if pname == GL_CURRENT_VERTEX_ATTRIB {
        return Ok(None);
    }
    match vertex_attrib_param(ctx, index, pname) {
        Some(value) => Ok(Some(value)),
        None => {
            ctx.gles_mut().set_error(GL_INVALID_ENUM);
            Err(())
        }
    }
}

fn vertex_attrib_array(ctx: &mut Gles2Context, index: GLuint, enable: bool) {
    match ctx.gles_mut().get_array_mut(index) {
        Some(array) => array.enable(enable),
        None => {
            ctx.gles_mut().set_error(GL_INVALID_VALUE);
            return;
        }
    }
    if enable {
        ctx.driver().enable_vertex_attrib_array(index);
    } else {
        ctx.driver().disable_vertex_attrib_array(index);
    }
}

/// Dispatch a GLES2 call, `None` if `func_id` is not one
pub fn dispatch(func_id: u32, tc: &mut ThreadContext) -> Option<CallResult> {
    if func_id == 0 || func_id > NUM_FUNCS {
        return None;
    }
    call_trace!("gles2: call {}", func_id);
    Some(call(func_id, tc))
}

fn uniform(components: usize, form: UniformForm, tc: &mut ThreadContext) -> CallResult {
    let t = &mut tc.transport;
    let location = t.get_i32()?;
    match form {
        UniformForm::Float => {
            let mut values = Vec::with_capacity(components);
            for _ in 0..components {
                values.push(t.get_f32()?);
            }
            with_ctx::<Gles2Context>(tc, "glUniformf", |ctx, _| {
                ctx.driver().uniformfv(location, components, &values);
                Ok(())
            })
        }
        UniformForm::Int => {
            let mut values = Vec::with_capacity(components);
            for _ in 0..components {
                values.push(t.get_i32()?);
            }
            with_ctx::<Gles2Context>(tc, "glUniformi", |ctx, _| {
                ctx.driver().uniformiv(location, components, &values);
                Ok(())
            })
        }
        UniformForm::FloatVector => {
            let count = t.get_i32()?;
            let values = get_f32s(t)?;
            with_ctx::<Gles2Context>(tc, "glUniformfv", |ctx, _| {
                if count < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let values = fit(values, count as usize * components);
                ctx.driver().uniformfv(location, components, &values);
                Ok(())
            })
        }
        UniformForm::IntVector => {
            let count = t.get_i32()?;
            let values = get_i32s(t)?;
            with_ctx::<Gles2Context>(tc, "glUniformiv", |ctx, _| {
                if count < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let values = fit(values, count as usize * components);
                ctx.driver().uniformiv(location, components, &values);
                Ok(())
            })
        }
    }
}

fn uniform_matrix(dim: usize, tc: &mut ThreadContext) -> CallResult {
    let t = &mut tc.transport;
    let (location, count) = (t.get_i32()?, t.get_i32()?);
    let transpose = (t.get_u32()? != 0) as GLboolean;
    let values = get_f32s(t)?;
    with_ctx::<Gles2Context>(tc, "glUniformMatrixfv", |ctx, _| {
        if count < 0 {
            ctx.gles_mut().set_error(GL_INVALID_VALUE);
            return Ok(());
        }
        let values = fit(values, count as usize * dim * dim);
        ctx.driver().uniform_matrixfv(location, dim, transpose, &values);
        Ok(())
    })
}

fn vertex_attrib(components: usize, vector: bool, tc: &mut ThreadContext) -> CallResult {
    let t = &mut tc.transport;
    let index = t.get_u32()?;
    let values = if vector {
        fit(get_f32s(t)?, components)
    } else {
        let mut values = Vec::with_capacity(components);
        for _ in 0..components {
            values.push(t.get_f32()?);
        }
        values
    };
    with_ctx::<Gles2Context>(tc, "glVertexAttribf", |ctx, _| {
        if index as usize >= ctx.num_arrays() {
            ctx.gles_mut().set_error(GL_INVALID_VALUE);
            return Ok(());
        }
        ctx.driver().vertex_attribfv(index, &values);
        Ok(())
    })
}

fn call(func_id: u32, tc: &mut ThreadContext) -> CallResult {
    if let Some((components, form)) = uniform_form(func_id) {
        return uniform(components, form, tc);
    }
    if let Some(dim) = matrix_dim(func_id) {
        return uniform_matrix(dim, tc);
    }
    if let Some((components, vector)) = vertex_attrib_form(func_id) {
        return vertex_attrib(components, vector, tc);
    }

    let t = &mut tc.transport;
    match func_id {
        func::ATTACH_SHADER => {
            let (program, shader) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glAttachShader", |ctx, _| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                let Some(sh) = acquire::<GlesShader>(ctx, shader) else {
                    return Ok(());
                };
                if !prog.attach_shader(&sh, shader) {
                    ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                }
                Ok(())
            })
        }
        func::BIND_ATTRIB_LOCATION => {
            let (program, index) = (t.get_u32()?, t.get_u32()?);
            let name = get_string(t)?;
            with_ctx::<Gles2Context>(tc, "glBindAttribLocation", |ctx, _| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                match name {
                    Some(name) if (index as usize) < ctx.num_arrays() => {
                        prog.bind_attrib_location(index, &name);
                    }
                    _ => ctx.gles_mut().set_error(GL_INVALID_VALUE),
                }
                Ok(())
            })
        }
        func::BLEND_COLOR => {
            let (r, g, b, a) = (t.get_f32()?, t.get_f32()?, t.get_f32()?, t.get_f32()?);
            with_ctx::<Gles2Context>(tc, "glBlendColor", |ctx, _| {
                ctx.driver().blend_color(r, g, b, a);
                Ok(())
            })
        }
        func::BLEND_EQUATION => {
            let mode = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glBlendEquation", |ctx, _| {
                ctx.driver().blend_equation(mode);
                Ok(())
            })
        }
        func::BLEND_EQUATION_SEPARATE => {
            let (mode_rgb, mode_alpha) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glBlendEquationSeparate", |ctx, _| {
                ctx.driver().blend_equation_separate(mode_rgb, mode_alpha);
                Ok(())
            })
        }
        func::BLEND_FUNC_SEPARATE => {
            let (src_rgb, dst_rgb) = (t.get_u32()?, t.get_u32()?);
            let (src_alpha, dst_alpha) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glBlendFuncSeparate", |ctx, _| {
                ctx.driver()
                    .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
                Ok(())
            })
        }
        func::COMPILE_SHADER => {
            let shader = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glCompileShader", |ctx, _| {
                if let Some(sh) = acquire::<GlesShader>(ctx, shader) {
                    sh.compile();
                }
                Ok(())
            })
        }
        func::CREATE_PROGRAM => {
            let result = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glCreateProgram", |ctx, t| {
                let program = GlesProgram::new(ctx.driver().clone(), ctx.gles().ensure().clone());
                let name = ctx.gles().sharegroup().add(NamespaceKind::Program, program);
                t.put_in_arg_u32(&result, name)
            })
        }
        func::CREATE_SHADER => {
            let type_ = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glCreateShader", |ctx, t| {
                let shader = GlesShader::new(ctx.driver().clone(), ctx.gles().ensure().clone(), type_);
                let name = match shader {
                    Some(shader) => ctx.gles().sharegroup().add(NamespaceKind::Program, shader),
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_ENUM);
                        0
                    }
                };
                t.put_in_arg_u32(&result, name)
            })
        }
        func::DELETE_PROGRAM => {
            let program = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glDeleteProgram", |ctx, _| {
                if program == 0 || acquire::<GlesProgram>(ctx, program).is_none() {
                    return Ok(());
                }
                ctx.unuse_program(program);
                ctx.gles().sharegroup().remove(NamespaceKind::Program, program);
                Ok(())
            })
        }
        func::DELETE_SHADER => {
            let shader = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glDeleteShader", |ctx, _| {
                if shader == 0 || acquire::<GlesShader>(ctx, shader).is_none() {
                    return Ok(());
                }
                ctx.gles().sharegroup().remove(NamespaceKind::Program, shader);
                Ok(())
            })
        }
        func::DETACH_SHADER => {
            let (program, shader) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glDetachShader", |ctx, _| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                let Some(sh) = acquire::<GlesShader>(ctx, shader) else {
                    return Ok(());
                };
                if !prog.detach_shader(&sh, shader) {
                    ctx.gles_mut().set_error(GL_INVALID_OPERATION);
                }
                Ok(())
            })
        }
        func::DISABLE_VERTEX_ATTRIB_ARRAY => {
            let index = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glDisableVertexAttribArray", |ctx, _| {
                vertex_attrib_array(ctx, index, false);
                Ok(())
            })
        }
        func::ENABLE_VERTEX_ATTRIB_ARRAY => {
            let index = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glEnableVertexAttribArray", |ctx, _| {
                vertex_attrib_array(ctx, index, true);
                Ok(())
            })
        }
        func::GET_ACTIVE_ATTRIB | func::GET_ACTIVE_UNIFORM => {
            let attrib = func_id == func::GET_ACTIVE_ATTRIB;
            let (program, index) = (t.get_u32()?, t.get_u32()?);
            let (length, size, type_) = (t.get_in_arg()?, t.get_in_arg()?, t.get_in_arg()?);
            let name = t.get_in_array(1)?;
            with_ctx::<Gles2Context>(tc, "glGetActiveAttrib", |ctx, t| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                if name.maxcount() < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let var = if attrib {
                    prog.active_attrib(index)
                } else {
                    prog.active_uniform(index)
                };
                match var {
                    Some(var) => put_active(t, &var, &length, &size, &type_, &name),
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_VALUE);
                        Ok(())
                    }
                }
            })
        }
        func::GET_ATTACHED_SHADERS => {
            let program = t.get_u32()?;
            let shaders = t.get_in_array(4)?;
            with_ctx::<Gles2Context>(tc, "glGetAttachedShaders", |ctx, t| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                if shaders.maxcount() < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                t.put_in_u32s(&shaders, &prog.attached_shaders())
            })
        }
        func::GET_ATTRIB_LOCATION | func::GET_UNIFORM_LOCATION => {
            let attrib = func_id == func::GET_ATTRIB_LOCATION;
            let program = t.get_u32()?;
            let name = get_string(t)?;
            let result = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glGetAttribLocation", |ctx, t| {
                let location = match (acquire::<GlesProgram>(ctx, program), name) {
                    (Some(prog), Some(name)) if attrib => prog.attrib_location(&name),
                    (Some(prog), Some(name)) => prog.uniform_location(&name),
                    _ => -1,
                };
                t.put_in_arg_i32(&result, location)
            })
        }
        func::GET_PROGRAMIV => {
            let (program, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glGetProgramiv", |ctx, t| match acquire::<GlesProgram>(ctx, program) {
                Some(prog) => t.put_in_arg_i32(&param, prog.get_param(pname)),
                None => Ok(()),
            })
        }
        func::GET_PROGRAM_INFO_LOG => {
            let program = t.get_u32()?;
            let infolog = t.get_in_array(1)?;
            with_ctx::<Gles2Context>(tc, "glGetProgramInfoLog", |ctx, t| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                put_string(ctx, t, &infolog, &prog.info_log())
            })
        }
        func::GET_SHADERIV => {
            let (shader, pname) = (t.get_u32()?, t.get_u32()?);
            let param = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glGetShaderiv", |ctx, t| match acquire::<GlesShader>(ctx, shader) {
                Some(sh) => t.put_in_arg_i32(&param, sh.get_param(pname)),
                None => Ok(()),
            })
        }
        func::GET_SHADER_INFO_LOG | func::GET_SHADER_SOURCE => {
            let source = func_id == func::GET_SHADER_SOURCE;
            let shader = t.get_u32()?;
            let out = t.get_in_array(1)?;
            with_ctx::<Gles2Context>(tc, "glGetShaderInfoLog", |ctx, t| {
                let Some(sh) = acquire::<GlesShader>(ctx, shader) else {
                    return Ok(());
                };
                let text = if source { sh.source() } else { sh.info_log() };
                put_string(ctx, t, &out, &text)
            })
        }
        func::GET_SHADER_PRECISION_FORMAT => {
            let (shadertype, precisiontype) = (t.get_u32()?, t.get_u32()?);
            let range = t.get_in_array(4)?;
            let precision = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glGetShaderPrecisionFormat", |ctx, t| {
                let shader_ok = matches!(shadertype, GL_VERTEX_SHADER | GL_FRAGMENT_SHADER);
                if !shader_ok || !is_precision_type(precisiontype) {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                let (values, bits) = ctx
                    .driver()
                    .get_shader_precision_format(shadertype, precisiontype);
                t.put_in_i32s(&range, &values)?;
                t.put_in_arg_i32(&precision, bits)
            })
        }
        func::GET_UNIFORMFV | func::GET_UNIFORMIV => {
            let float = func_id == func::GET_UNIFORMFV;
            let (program, location) = (t.get_u32()?, t.get_i32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles2Context>(tc, "glGetUniformfv", |ctx, t| {
                let Some(prog) = acquire::<GlesProgram>(ctx, program) else {
                    return Ok(());
                };
                let len = (params.maxcount().max(0) as usize).min(MAX_UNIFORM_VALUES);
                if float {
                    let mut values = vec![0.0; len];
                    prog.uniformfv(location, &mut values);
                    t.put_in_f32s(&params, &values)
                } else {
                    let mut values = vec![0; len];
                    prog.uniformiv(location, &mut values);
                    t.put_in_i32s(&params, &values)
                }
            })
        }
        func::GET_VERTEX_ATTRIBFV => {
            let (index, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles2Context>(tc, "glGetVertexAttribfv", |ctx, t| match get_vertex_attrib(ctx, index, pname) {
                Ok(Some(value)) => t.put_in_f32s(&params, &[value as GLfloat]),
                Ok(None) => {
                    let mut values = [0.0; 4];
                    ctx.driver().get_vertex_attribfv(index, pname, &mut values);
                    t.put_in_f32s(&params, &values)
                }
                Err(()) => Ok(()),
            })
        }
        func::GET_VERTEX_ATTRIBIV => {
            let (index, pname) = (t.get_u32()?, t.get_u32()?);
            let params = t.get_in_array(4)?;
            with_ctx::<Gles2Context>(tc, "glGetVertexAttribiv", |ctx, t| match get_vertex_attrib(ctx, index, pname) {
                Ok(Some(value)) => t.put_in_i32s(&params, &[value]),
                Ok(None) => {
                    let mut values = [0; 4];
                    ctx.driver().get_vertex_attribiv(index, pname, &mut values);
                    t.put_in_i32s(&params, &values)
                }
                Err(()) => Ok(()),
            })
        }
        func::GET_VERTEX_ATTRIB_POINTERV => {
            let (index, pname) = (t.get_u32()?, t.get_u32()?);
            let pointer = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glGetVertexAttribPointerv", |ctx, t| {
                if pname != GL_VERTEX_ATTRIB_ARRAY_POINTER {
                    ctx.gles_mut().set_error(GL_INVALID_ENUM);
                    return Ok(());
                }
                match ctx.gles().get_array(index) {
                    Some(array) => t.put_in_arg_u32(&pointer, array.pointer() as u32),
                    None => {
                        ctx.gles_mut().set_error(GL_INVALID_VALUE);
                        Ok(())
                    }
                }
            })
        }
        func::IS_PROGRAM => {
            let program = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glIsProgram", |ctx, t| {
                t.put_in_arg_u32(&result, is_object::<GlesProgram>(ctx, program) as u32)
            })
        }
        func::IS_SHADER => {
            let shader = t.get_u32()?;
            let result = t.get_in_arg()?;
            with_ctx::<Gles2Context>(tc, "glIsShader", |ctx, t| {
                t.put_in_arg_u32(&result, is_object::<GlesShader>(ctx, shader) as u32)
            })
        }
        func::LINK_PROGRAM => {
            let program = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glLinkProgram", |ctx, _| {
                if let Some(prog) = acquire::<GlesProgram>(ctx, program) {
                    prog.link();
                }
                Ok(())
            })
        }
        func::RELEASE_SHADER_COMPILER => with_ctx::<Gles2Context>(tc, "glReleaseShaderCompiler", |ctx, _| {
            ctx.driver().release_shader_compiler();
            Ok(())
        }),
        func::SHADER_BINARY => {
            let n = t.get_i32()?;
            let shaders = t.get_out_array(4)?;
            let binaryformat = t.get_u32()?;
            let binary = t.get_out_array(1)?;
            with_ctx::<Gles2Context>(tc, "glShaderBinary", |ctx, _| {
                // No binary format is ever advertised
                log::warn!(
                    "gles2: glShaderBinary of {} shaders ({}), format 0x{:X}, {} bytes",
                    n,
                    shaders.count(),
                    binaryformat,
                    binary.count()
                );
                ctx.gles_mut().set_error(GL_INVALID_ENUM);
                Ok(())
            })
        }
        func::SHADER_SOURCE => {
            let (shader, count) = (t.get_u32()?, t.get_i32()?);
            let strings = t.get_out_array(1)?;
            let parts = t.out_bytes(&strings).map(split_string_array);
            with_ctx::<Gles2Context>(tc, "glShaderSource", |ctx, _| {
                let Some(sh) = acquire::<GlesShader>(ctx, shader) else {
                    return Ok(());
                };
                if count < 0 {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let source: String = parts
                    .unwrap_or_default()
                    .into_iter()
                    .take(count as usize)
                    .collect();
                sh.set_source(source, ctx.strip_precision());
                Ok(())
            })
        }
        func::STENCIL_FUNC_SEPARATE => {
            let (face, func, ref_, mask) = (t.get_u32()?, t.get_u32()?, t.get_i32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glStencilFuncSeparate", |ctx, _| {
                ctx.driver().stencil_func_separate(face, func, ref_, mask);
                Ok(())
            })
        }
        func::STENCIL_MASK_SEPARATE => {
            let (face, mask) = (t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glStencilMaskSeparate", |ctx, _| {
                ctx.driver().stencil_mask_separate(face, mask);
                Ok(())
            })
        }
        func::STENCIL_OP_SEPARATE => {
            let (face, fail, zfail, zpass) = (t.get_u32()?, t.get_u32()?, t.get_u32()?, t.get_u32()?);
            with_ctx::<Gles2Context>(tc, "glStencilOpSeparate", |ctx, _| {
                ctx.driver().stencil_op_separate(face, fail, zfail, zpass);
                Ok(())
            })
        }
        func::USE_PROGRAM => {
            let program = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glUseProgram", |ctx, _| {
                let global_name = if program == 0 {
                    0
                } else {
                    match acquire::<GlesProgram>(ctx, program) {
                        Some(prog) => prog.global_name(),
                        None => return Ok(()),
                    }
                };
                ctx.use_program(program);
                ctx.driver().use_program(global_name);
                Ok(())
            })
        }
        func::VALIDATE_PROGRAM => {
            let program = t.get_u32()?;
            with_ctx::<Gles2Context>(tc, "glValidateProgram", |ctx, _| {
                if let Some(prog) = acquire::<GlesProgram>(ctx, program) {
                    prog.validate();
                }
                Ok(())
            })
        }
        func::VERTEX_ATTRIB_POINTER => {
            let (index, size, type_) = (t.get_u32()?, t.get_i32()?, t.get_u32()?);
            let normalized = (t.get_u32()? != 0) as GLboolean;
            let stride = t.get_i32()?;
            let va = t.get_va()?;
            with_ctx::<Gles2Context>(tc, "glVertexAttribPointer", |ctx, _| {
                if !(1..=4).contains(&size) {
                    ctx.gles_mut().set_error(GL_INVALID_VALUE);
                    return Ok(());
                }
                let error = ctx
                    .gles_mut()
                    .array_pointer(index, size, type_, normalized, stride, va);
                if error != GL_NO_ERROR {
                    ctx.gles_mut().set_error(error);
                }
                Ok(())
            })
        }
        _ => Err(CallError::Protocol(format!("gles2: unhandled function {}", func_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Api, ApiTs, ProcessEnv};
    use crate::client::ClientApi;
    use crate::config::YaglConfig;
    use crate::driver::{HeadlessDriver, HostCall, HostDrivers};
    use crate::gles2::Gles2Api;
    use crate::gles::calls::{func as common, NUM_FUNCS as NUM_COMMON_FUNCS};
    use crate::mem::{GuestMemory, PageSet};
    use crate::object::Sharegroup;
    use crate::testutil::{BatchWriter, NoEnsure, SimMemory};

    const API: u32 = 3;
    const BATCH_PA: u64 = 0x80000;

    const VERTEX_SOURCE: &str = "attribute vec4 pos;\nuniform mat4 mvp;\nvoid main() { gl_Position = mvp * pos; }";
    const FRAGMENT_SOURCE: &str = "precision mediump float;\nuniform vec4 color;\nvoid main() { gl_FragColor = color; }";

    fn id(func_id: u32) -> u32 {
        NUM_COMMON_FUNCS + func_id
    }

    fn string(s: &str) -> Vec<u8> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        bytes
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
            let ts = Gles2Api.process_init(&env).thread_init(&mut tc);

            let ctx = env
                .client_iface(ClientApi::Gles2)
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

        fn bytes(&self, offset: usize, len: usize) -> Vec<u8> {
            (0..len.div_ceil(4))
                .flat_map(|i| self.slot(offset + i * 4).to_le_bytes())
                .take(len)
                .collect()
        }

        fn with<R>(&self, f: impl FnOnce(&mut Gles2Context) -> R) -> R {
            let shared = self.tc.current.clone().unwrap();
            let mut guard = shared.lock();
            f(guard.as_any_mut().downcast_mut::<Gles2Context>().unwrap())
        }

        fn error(&self) -> GLenum {
            self.with(|ctx| ctx.gles_mut().get_error())
        }

        /// Create, source and compile a shader, returning its name
        fn shader(&mut self, type_: GLenum, source: &str) -> u32 {
            let mut w = BatchWriter::new();
            w.call(API, id(func::CREATE_SHADER), false);
            w.u32(type_);
            let name = w.in_arg();
            w.end();
            self.run(&w).unwrap();
            let name_value = self.slot(name);

            let mut w = BatchWriter::new();
            w.call(API, id(func::SHADER_SOURCE), false);
            w.u32(name_value);
            w.i32(1);
            let bytes = string(source);
            w.out_inline(bytes.len() as i32, &bytes);
            w.call(API, id(func::COMPILE_SHADER), false);
            w.u32(name_value);
            w.end();
            self.run(&w).unwrap();
            name_value
        }

        /// Linked program from the two test shaders
        fn program(&mut self) -> u32 {
            let vs = self.shader(GL_VERTEX_SHADER, VERTEX_SOURCE);
            let fs = self.shader(GL_FRAGMENT_SHADER, FRAGMENT_SOURCE);

            let mut w = BatchWriter::new();
            w.call(API, id(func::CREATE_PROGRAM), false);
            let name = w.in_arg();
            w.end();
            self.run(&w).unwrap();
            let program = self.slot(name);

            let mut w = BatchWriter::new();
            for shader in [vs, fs] {
                w.call(API, id(func::ATTACH_SHADER), false);
                w.u32(program);
                w.u32(shader);
            }
            w.call(API, id(func::LINK_PROGRAM), false);
            w.u32(program);
            w.end();
            self.run(&w).unwrap();
            program
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
    fn test_shader_lifecycle() {
        let mut h = Harness::new();
        let fs = h.shader(GL_FRAGMENT_SHADER, FRAGMENT_SOURCE);
        assert_ne!(fs, 0);

        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_SHADERIV), false);
        w.u32(fs);
        w.u32(GL_COMPILE_STATUS);
        let status = w.in_arg();
        w.call(API, id(func::GET_SHADER_SOURCE), false);
        w.u32(fs);
        let (count_at, data_at) = w.in_inline(256, 1);
        w.call(API, id(func::IS_SHADER), false);
        w.u32(fs);
        let is_shader = w.in_arg();
        w.call(API, id(func::IS_PROGRAM), false);
        w.u32(fs);
        let is_program = w.in_arg();
        w.end();
        h.run(&w).unwrap();

        // Precision statements are stripped for the host, kept for the guest
        assert_eq!(h.slot(status), 1);
        let len = FRAGMENT_SOURCE.len() + 1;
        assert_eq!(h.slot(count_at) as usize, len);
        assert_eq!(h.bytes(data_at, len), string(FRAGMENT_SOURCE));
        assert_eq!(h.slot(is_shader), 1);
        assert_eq!(h.slot(is_program), 0);
        assert_eq!(h.error(), GL_NO_ERROR);

        let mut w = BatchWriter::new();
        w.call(API, id(func::DELETE_SHADER), false);
        w.u32(fs);
        w.call(API, id(func::IS_SHADER), false);
        w.u32(fs);
        let is_shader = w.in_arg();
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.slot(is_shader), 0);
    }

    #[test]
    fn test_create_shader_bad_type() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::CREATE_SHADER), false);
        w.u32(GL_FLOAT);
        let name = w.in_arg();
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.slot(name), 0);
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_object_kind_errors() {
        let mut h = Harness::new();
        let vs = h.shader(GL_VERTEX_SHADER, VERTEX_SOURCE);

        let mut w = BatchWriter::new();
        w.call(API, id(func::LINK_PROGRAM), false);
        w.u32(vs);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_OPERATION);

        let mut w = BatchWriter::new();
        w.call(API, id(func::COMPILE_SHADER), false);
        w.u32(77);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_VALUE);
    }

    #[test]
    fn test_program_link_and_queries() {
        let mut h = Harness::new();
        let program = h.program();

        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_PROGRAMIV), false);
        w.u32(program);
        w.u32(GL_LINK_STATUS);
        let linked = w.in_arg();
        w.call(API, id(func::GET_ATTACHED_SHADERS), false);
        w.u32(program);
        let (count_at, data_at) = w.in_inline(4, 4);
        w.call(API, id(func::GET_ATTRIB_LOCATION), false);
        w.u32(program);
        let pos = string("pos");
        w.out_inline(pos.len() as i32, &pos);
        let attrib = w.in_arg();
        w.call(API, id(func::GET_UNIFORM_LOCATION), false);
        w.u32(program);
        let color = string("color");
        w.out_inline(color.len() as i32, &color);
        let uniform = w.in_arg();
        w.call(API, id(func::GET_ACTIVE_UNIFORM), false);
        w.u32(program);
        w.u32(1);
        let length = w.in_arg();
        let size = w.in_arg();
        let type_ = w.in_arg();
        let (_, name_at) = w.in_inline(3, 1);
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(linked), 1);
        assert_eq!(h.slot(count_at), 2);
        assert_eq!(h.slot(data_at), 1);
        assert_eq!(h.slot(data_at + 4), 2);
        assert_eq!(h.slot(attrib), 0);
        assert_eq!(h.slot(uniform), 1);
        // Name truncated to the room the guest gave
        assert_eq!(h.slot(length), 2);
        assert_eq!(h.slot(size), 1);
        assert_eq!(h.slot(type_), GL_FLOAT_VEC4);
        assert_eq!(h.bytes(name_at, 3), b"co\0".to_vec());
        assert_eq!(h.error(), GL_NO_ERROR);
    }

    #[test]
    fn test_attach_twice_fails() {
        let mut h = Harness::new();
        let program = h.program();
        let vs = h.shader(GL_VERTEX_SHADER, VERTEX_SOURCE);

        let mut w = BatchWriter::new();
        w.call(API, id(func::ATTACH_SHADER), false);
        w.u32(program);
        w.u32(vs);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_OPERATION);
    }

    #[test]
    fn test_use_and_delete_program() {
        let mut h = Harness::new();
        let program = h.program();

        let mut w = BatchWriter::new();
        w.call(API, id(func::USE_PROGRAM), false);
        w.u32(program);
        w.call(API, common::GET_INTEGERV, false);
        w.u32(GL_CURRENT_PROGRAM);
        let (_, current) = w.in_inline(1, 4);
        w.call(API, id(func::UNIFORM4F), false);
        w.i32(1);
        for v in [0.25f32, 0.5, 0.75, 1.0] {
            w.f32(v);
        }
        w.call(API, id(func::GET_UNIFORMFV), false);
        w.u32(program);
        w.i32(1);
        let (_, values) = w.in_inline(4, 4);
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(current), program);
        assert_eq!(f32::from_bits(h.slot(values + 8)), 0.75);
        assert!(h.driver.calls().contains(&HostCall::Call("glUseProgram")));

        let mut w = BatchWriter::new();
        w.call(API, id(func::DELETE_PROGRAM), false);
        w.u32(program);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.with(|ctx| ctx.program_local_name()), 0);

        let mut w = BatchWriter::new();
        w.call(API, id(func::USE_PROGRAM), false);
        w.u32(program);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_VALUE);
    }

    #[test]
    fn test_uniform_vector_count() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::UNIFORM2FV), false);
        w.i32(0);
        w.i32(-1);
        w.out_null();
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_VALUE);
        assert!(!h.driver.calls().contains(&HostCall::Call("glUniformfv")));
    }

    #[test]
    fn test_vertex_attrib_state() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::VERTEX_ATTRIB_POINTER), false);
        w.u32(2);
        w.i32(3);
        w.u32(GL_FLOAT);
        w.u32(1);
        w.i32(12);
        w.u32(0x3000);
        w.call(API, id(func::ENABLE_VERTEX_ATTRIB_ARRAY), false);
        w.u32(2);
        w.call(API, id(func::GET_VERTEX_ATTRIBIV), false);
        w.u32(2);
        w.u32(GL_VERTEX_ATTRIB_ARRAY_SIZE);
        let (_, size) = w.in_inline(4, 4);
        w.call(API, id(func::GET_VERTEX_ATTRIBIV), false);
        w.u32(2);
        w.u32(GL_VERTEX_ATTRIB_ARRAY_ENABLED);
        let (_, enabled) = w.in_inline(4, 4);
        w.call(API, id(func::GET_VERTEX_ATTRIBFV), false);
        w.u32(2);
        w.u32(GL_CURRENT_VERTEX_ATTRIB);
        let (count_at, current) = w.in_inline(4, 4);
        w.call(API, id(func::GET_VERTEX_ATTRIB_POINTERV), false);
        w.u32(2);
        w.u32(GL_VERTEX_ATTRIB_ARRAY_POINTER);
        let pointer = w.in_arg();
        w.end();
        h.run(&w).unwrap();

        assert_eq!(h.slot(size), 3);
        assert_eq!(h.slot(enabled), 1);
        assert_eq!(h.slot(count_at), 4);
        assert_eq!(f32::from_bits(h.slot(current + 12)), 1.0);
        assert_eq!(h.slot(pointer), 0x3000);
        assert_eq!(h.error(), GL_NO_ERROR);
        assert!(h
            .driver
            .calls()
            .contains(&HostCall::Call("glEnableVertexAttribArray")));
    }

    #[test]
    fn test_vertex_attrib_bad_index() {
        let mut h = Harness::new();
        let cases = [
            (func::ENABLE_VERTEX_ATTRIB_ARRAY, GL_INVALID_VALUE),
            (func::VERTEX_ATTRIB1F, GL_INVALID_VALUE),
        ];
        for (func_id, error) in cases {
            let mut w = BatchWriter::new();
            w.call(API, id(func_id), false);
            w.u32(64);
            if func_id == func::VERTEX_ATTRIB1F {
                w.f32(1.0);
            }
            w.end();
            h.run(&w).unwrap();
            assert_eq!(h.error(), error, "func {}", func_id);
        }

        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_VERTEX_ATTRIBIV), false);
        w.u32(0);
        w.u32(GL_TEXTURE_2D);
        w.in_inline(4, 4);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_shader_binary_is_refused() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::SHADER_BINARY), false);
        w.i32(1);
        w.out_inline(1, &1u32.to_le_bytes());
        w.u32(0x1234);
        w.out_inline(4, &[1, 2, 3, 4]);
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_shader_precision_format() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_SHADER_PRECISION_FORMAT), false);
        w.u32(GL_FRAGMENT_SHADER);
        w.u32(GL_HIGH_FLOAT);
        let (_, range) = w.in_inline(2, 4);
        let precision = w.in_arg();
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.slot(range), 127);
        assert_eq!(h.slot(precision), 23);

        let mut w = BatchWriter::new();
        w.call(API, id(func::GET_SHADER_PRECISION_FORMAT), false);
        w.u32(GL_TEXTURE_2D);
        w.u32(GL_HIGH_FLOAT);
        w.in_inline(2, 4);
        w.in_arg();
        w.end();
        h.run(&w).unwrap();
        assert_eq!(h.error(), GL_INVALID_ENUM);
    }
}
