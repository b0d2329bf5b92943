//! EGL call handlers
//!
//! EGL errors are latched per thread; the first one sticks until
//! `eglGetError`. Calls that return a value take a trailing in-arg for it,
//! written with 0 (`EGL_FALSE`, `EGL_NO_*`) when the call fails.

use std::sync::Arc;

use super::backend::{BackendSurface, OffscreenParams};
use super::config::{parse_selection, EglConfig};
use super::consts::*;
use super::context::EglContext;
use super::display::EglDisplay;
use super::image::EglImage;
use super::surface::{self, EglSurface, SurfaceKind, SurfaceQuery};
use super::{attrib_pairs, EglPs};
use crate::api::{bad_func, ApiId, ApiTs, CallError, CallResult, ThreadContext};
use crate::client::{ClientApi, ClientContext};
use crate::config::RenderType;
use crate::driver::PbufferAttribs;
use crate::mem::staging_buffer;
use crate::object::{Resource, Sharegroup};
use crate::transport::{InArg, InArray, Transport};
use crate::types::{HostHandle, NativeId, WinsysId};

pub mod func {
    pub const GET_ERROR: u32 = 1;
    pub const GET_DISPLAY: u32 = 2;
    pub const INITIALIZE: u32 = 3;
    pub const TERMINATE: u32 = 4;
    pub const GET_CONFIGS: u32 = 5;
    pub const CHOOSE_CONFIG: u32 = 6;
    pub const GET_CONFIG_ATTRIB: u32 = 7;
    pub const DESTROY_SURFACE: u32 = 8;
    pub const QUERY_SURFACE: u32 = 9;
    pub const BIND_API: u32 = 10;
    pub const WAIT_CLIENT: u32 = 11;
    pub const RELEASE_THREAD: u32 = 12;
    pub const CREATE_PBUFFER_FROM_CLIENT_BUFFER: u32 = 13;
    pub const SURFACE_ATTRIB: u32 = 14;
    pub const BIND_TEX_IMAGE: u32 = 15;
    pub const RELEASE_TEX_IMAGE: u32 = 16;
    pub const CREATE_CONTEXT: u32 = 17;
    pub const DESTROY_CONTEXT: u32 = 18;
    pub const MAKE_CURRENT: u32 = 19;
    pub const QUERY_CONTEXT: u32 = 20;
    pub const SWAP_BUFFERS: u32 = 21;
    pub const COPY_BUFFERS: u32 = 22;
    pub const CREATE_IMAGE_KHR: u32 = 23;
    pub const DESTROY_IMAGE_KHR: u32 = 24;
    pub const CREATE_WINDOW_SURFACE_OFFSCREEN: u32 = 25;
    pub const CREATE_PBUFFER_SURFACE_OFFSCREEN: u32 = 26;
    pub const CREATE_PIXMAP_SURFACE_OFFSCREEN: u32 = 27;
    pub const RESIZE_OFFSCREEN_SURFACE: u32 = 28;
    pub const UPDATE_OFFSCREEN_IMAGE: u32 = 29;
    pub const CREATE_WINDOW_SURFACE_ONSCREEN: u32 = 30;
    pub const CREATE_PBUFFER_SURFACE_ONSCREEN: u32 = 31;
    pub const CREATE_PIXMAP_SURFACE_ONSCREEN: u32 = 32;
    pub const INVALIDATE_ONSCREEN_SURFACE: u32 = 33;
}

pub const NUM_FUNCS: u32 = 33;

/// Largest image edge accepted from the guest
const MAX_IMAGE_DIM: u32 = 8192;

type EglResult<T> = Result<T, EGLint>;

fn validate_config(dpy: &EglDisplay, handle: HostHandle) -> EglResult<Arc<EglConfig>> {
    dpy.configs.acquire(handle).ok_or(EGL_BAD_CONFIG)
}

fn validate_surface(dpy: &EglDisplay, handle: HostHandle) -> EglResult<Arc<EglSurface>> {
    dpy.surfaces.acquire(handle).ok_or(EGL_BAD_SURFACE)
}

fn validate_context(dpy: &EglDisplay, handle: HostHandle) -> EglResult<Arc<EglContext>> {
    dpy.contexts.acquire(handle).ok_or(EGL_BAD_CONTEXT)
}

fn validate_image(dpy: &EglDisplay, handle: HostHandle) -> EglResult<Arc<EglImage>> {
    dpy.images.acquire(handle).ok_or(EGL_BAD_PARAMETER)
}

/// Error for a surface the backend could not create
fn create_error(kind: SurfaceKind) -> EGLint {
    match kind {
        SurfaceKind::Window => EGL_BAD_NATIVE_WINDOW,
        SurfaceKind::Pixmap => EGL_BAD_NATIVE_PIXMAP,
        SurfaceKind::Pbuffer => EGL_BAD_ALLOC,
    }
}

fn surface_bit(kind: SurfaceKind) -> EGLint {
    match kind {
        SurfaceKind::Window => EGL_WINDOW_BIT,
        SurfaceKind::Pixmap => EGL_PIXMAP_BIT,
        SurfaceKind::Pbuffer => EGL_PBUFFER_BIT,
    }
}

/// Attribute list, empty when the guest passed none
fn get_attribs(t: &mut Transport) -> Result<Vec<EGLint>, CallError> {
    let array = t.get_out_array(4)?;
    Ok(t.out_i32s(&array).unwrap_or_default())
}

/// Report config handles, truncated to the guest's room
fn put_configs(
    t: &mut Transport,
    configs: &InArray,
    num_config: &InArg,
    handles: &[HostHandle],
) -> CallResult {
    if configs.is_null() {
        return t.put_in_arg_i32(num_config, handles.len() as i32);
    }
    let count = handles.len().min(configs.maxcount().max(0) as usize);
    t.put_in_u32s(configs, &handles[..count])?;
    t.put_in_arg_i32(num_config, count as i32)
}

fn present(backend: &mut dyn BackendSurface, client: Option<&mut dyn ClientContext>, copy: bool) -> bool {
    if copy {
        backend.copy_buffers(client)
    } else {
        backend.swap_buffers(client)
    }
}

/// EGL state of one guest thread
pub struct EglTs {
    ps: Arc<EglPs>,
    error: EGLint,
    api: EGLenum,
    context: Option<Arc<EglContext>>,
}

impl EglTs {
    pub fn new(ps: Arc<EglPs>) -> Self {
        Self {
            ps,
            error: EGL_SUCCESS,
            api: EGL_OPENGL_ES_API,
            context: None,
        }
    }

    /// Context current on this thread
    pub fn context(&self) -> Option<&Arc<EglContext>> {
        self.context.as_ref()
    }

    /// API chosen with `eglBindAPI`
    pub fn bound_api(&self) -> EGLenum {
        self.api
    }

    /// Latch `error` unless an earlier error is still pending
    fn set_error(&mut self, error: EGLint) {
        log::warn!("egl: error = 0x{:X}", error);
        if self.error == EGL_SUCCESS {
            self.error = error;
        }
    }

    fn reply(&mut self, t: &Transport, retval: &InArg, result: EglResult<u32>) -> CallResult {
        let value = match result {
            Ok(value) => value,
            Err(error) => {
                self.set_error(error);
                0
            }
        };
        t.put_in_arg_u32(retval, value)
    }

    /// Write `result` to `value` when there is one, then answer `EGL_TRUE`
    fn reply_value(
        &mut self,
        t: &Transport,
        value: &InArg,
        retval: &InArg,
        result: EglResult<Option<EGLint>>,
    ) -> CallResult {
        if let Ok(Some(v)) = result {
            t.put_in_arg_i32(value, v)?;
        }
        self.reply(t, retval, result.map(|_| EGL_TRUE))
    }

    /// Initialized display behind `handle`
    fn display(&self, handle: HostHandle) -> EglResult<Arc<EglDisplay>> {
        let dpy = self.ps.acquire_display(handle).ok_or(EGL_BAD_DISPLAY)?;
        if !dpy.is_initialized() {
            return Err(EGL_NOT_INITIALIZED);
        }
        Ok(dpy)
    }

    fn get_error(&mut self, tc: &mut ThreadContext) -> CallResult {
        let retval = tc.transport.get_in_arg()?;
        let error = core::mem::replace(&mut self.error, EGL_SUCCESS);
        tc.transport.put_in_arg_i32(&retval, error)
    }

    fn get_display(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let display_id = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglGetDisplay({})", display_id);

        let handle = self.ps.get_display(display_id).map_or(0, |dpy| dpy.handle());
        t.put_in_arg_u32(&retval, handle)
    }

    fn initialize(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let major = t.get_in_arg()?;
        let minor = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglInitialize({})", dpy);

        let result = match self.ps.acquire_display(dpy) {
            Some(dpy) => {
                dpy.initialize(self.ps.renderable_type());
                t.put_in_arg_i32(&major, EGL_VERSION_MAJOR)?;
                t.put_in_arg_i32(&minor, EGL_VERSION_MINOR)?;
                Ok(EGL_TRUE)
            }
            None => Err(EGL_BAD_DISPLAY),
        };
        self.reply(t, &retval, result)
    }

    fn terminate(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglTerminate({})", dpy);

        let result = match self.ps.acquire_display(dpy) {
            Some(dpy) => {
                dpy.terminate();
                Ok(EGL_TRUE)
            }
            None => Err(EGL_BAD_DISPLAY),
        };
        self.reply(t, &retval, result)
    }

    fn get_configs(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let configs = t.get_in_array(4)?;
        let num_config = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglGetConfigs({})", dpy);

        let result = self.display(dpy).and_then(|dpy| {
            if num_config.is_null() {
                return Err(EGL_BAD_PARAMETER);
            }
            Ok(dpy.configs())
        });
        match result {
            Ok(list) => {
                let handles: Vec<HostHandle> = list.iter().map(|cfg| cfg.handle()).collect();
                put_configs(t, &configs, &num_config, &handles)?;
                self.reply(t, &retval, Ok(EGL_TRUE))
            }
            Err(error) => self.reply(t, &retval, Err(error)),
        }
    }

    fn choose_config(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let attribs = get_attribs(t)?;
        let configs = t.get_in_array(4)?;
        let num_config = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglChooseConfig({}, {:?})", dpy, attribs);

        let result = self.display(dpy).and_then(|dpy| {
            if num_config.is_null() {
                return Err(EGL_BAD_PARAMETER);
            }
            dpy.choose_configs(&parse_selection(&attribs)?)
        });
        match result {
            Ok(list) => {
                let handles: Vec<HostHandle> = list.iter().map(|cfg| cfg.handle()).collect();
                put_configs(t, &configs, &num_config, &handles)?;
                self.reply(t, &retval, Ok(EGL_TRUE))
            }
            Err(error) => self.reply(t, &retval, Err(error)),
        }
    }

    fn get_config_attrib(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let config = t.get_u32()?;
        let attribute = t.get_i32()?;
        let value = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglGetConfigAttrib({}, {}, 0x{:X})", dpy, config, attribute);

        let result = self
            .display(dpy)
            .and_then(|dpy| validate_config(&dpy, config))
            .and_then(|config| config.get_attrib(attribute).ok_or(EGL_BAD_ATTRIBUTE))
            .map(Some);
        self.reply_value(t, &value, &retval, result)
    }

    fn destroy_surface(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglDestroySurface({}, {})", dpy, sfc);

        let result = self.display(dpy).and_then(|dpy| {
            let surface = validate_surface(&dpy, sfc)?;
            if !dpy.surfaces.remove(sfc) {
                return Err(EGL_BAD_SURFACE);
            }
            surface.invalidate();
            Ok(EGL_TRUE)
        });
        self.reply(t, &retval, result)
    }

    fn query_surface(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let attribute = t.get_i32()?;
        let value = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglQuerySurface({}, {}, 0x{:X})", dpy, sfc, attribute);

        let result = self
            .display(dpy)
            .and_then(|dpy| validate_surface(&dpy, sfc))
            .and_then(|surface| match surface.query(attribute) {
                SurfaceQuery::Value(v) => Ok(Some(v)),
                SurfaceQuery::NotApplicable => Ok(None),
                SurfaceQuery::BadAttribute => Err(EGL_BAD_ATTRIBUTE),
            });
        self.reply_value(t, &value, &retval, result)
    }

    fn bind_api(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let api = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglBindAPI(0x{:X})", api);

        let result = if api == EGL_OPENGL_ES_API {
            self.api = api;
            Ok(EGL_TRUE)
        } else {
            Err(EGL_BAD_PARAMETER)
        };
        self.reply(t, &retval, result)
    }

    fn wait_client(&mut self, tc: &mut ThreadContext) -> CallResult {
        let retval = tc.transport.get_in_arg()?;
        call_trace!("eglWaitClient()");

        if let Some(draw) = self.context.as_ref().and_then(|ctx| ctx.draw()) {
            draw.backend().wait_gl();
        }
        self.reply(&tc.transport, &retval, Ok(EGL_TRUE))
    }

    fn release_thread(&mut self, tc: &mut ThreadContext) -> CallResult {
        let retval = tc.transport.get_in_arg()?;
        call_trace!("eglReleaseThread()");

        let result = if self.release_current(tc) {
            self.api = EGL_OPENGL_ES_API;
            self.error = EGL_SUCCESS;
            Ok(EGL_TRUE)
        } else {
            Err(EGL_BAD_ACCESS)
        };
        self.reply(&tc.transport, &retval, result)
    }

    fn create_pbuffer_from_client_buffer(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let _dpy = t.get_u32()?;
        let buftype = t.get_u32()?;
        let _buffer = t.get_u32()?;
        let _config = t.get_u32()?;
        let _attribs = get_attribs(t)?;
        let retval = t.get_in_arg()?;
        call_trace!("eglCreatePbufferFromClientBuffer(0x{:X})", buftype);

        self.reply(t, &retval, Err(EGL_BAD_PARAMETER))
    }

    fn surface_attrib(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let attribute = t.get_i32()?;
        let value = t.get_i32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglSurfaceAttrib({}, {}, 0x{:X}, {})", dpy, sfc, attribute, value);

        let result = self
            .display(dpy)
            .and_then(|dpy| validate_surface(&dpy, sfc))
            .and_then(|_| match attribute {
                EGL_MIPMAP_LEVEL | EGL_SWAP_BEHAVIOR | EGL_MULTISAMPLE_RESOLVE => Ok(EGL_TRUE),
                _ => Err(EGL_BAD_ATTRIBUTE),
            });
        self.reply(t, &retval, result)
    }

    /// Shared validation of eglBindTexImage and eglReleaseTexImage
    fn tex_image(&self, dpy: HostHandle, sfc: HostHandle, buffer: EGLint, bind: bool) -> EglResult<u32> {
        let dpy = self.display(dpy)?;
        let surface = validate_surface(&dpy, sfc)?;

        if bind && self.context.is_none() {
            return Ok(EGL_TRUE);
        }
        if buffer != EGL_BACK_BUFFER {
            return Err(EGL_BAD_PARAMETER);
        }
        if surface.kind() != SurfaceKind::Pbuffer {
            return Err(EGL_BAD_SURFACE);
        }
        let attribs = surface.attribs();
        if attribs.tex_format == EGL_NO_TEXTURE || attribs.tex_target == EGL_NO_TEXTURE {
            return Err(EGL_BAD_MATCH);
        }
        Ok(EGL_TRUE)
    }

    fn bind_tex_image(&mut self, tc: &mut ThreadContext, bind: bool) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let buffer = t.get_i32()?;
        let retval = t.get_in_arg()?;
        call_trace!("egl{}TexImage({}, {}, 0x{:X})", if bind { "Bind" } else { "Release" }, dpy, sfc, buffer);

        let result = self.tex_image(dpy, sfc, buffer, bind);
        self.reply(t, &retval, result)
    }

    fn do_create_context(
        &self,
        dpy: HostHandle,
        config: HostHandle,
        share: HostHandle,
        attribs: &[EGLint],
    ) -> EglResult<u32> {
        let dpy = self.display(dpy)?;
        let config = validate_config(&dpy, config)?;

        let mut client_api = ClientApi::Gles1;
        for (attrib, value) in attrib_pairs(attribs) {
            match attrib {
                EGL_CONTEXT_CLIENT_VERSION => {
                    client_api = ClientApi::from_version(value).ok_or(EGL_BAD_ATTRIBUTE)?;
                }
                _ => return Err(EGL_BAD_ATTRIBUTE),
            }
        }

        let iface = self.ps.env().client_iface(client_api).ok_or(EGL_BAD_CONFIG)?;
        let sharegroup = if share != 0 {
            validate_context(&dpy, share)?.sharegroup()
        } else {
            Sharegroup::new()
        };

        let client = iface.create_ctx(sharegroup, self.ps.host().ensure());
        let ctx = EglContext::new(self.ps.host(), dpy.handle(), dpy.native(), config, client)
            .ok_or(EGL_BAD_ALLOC)?;
        dpy.contexts.add(ctx.clone());
        Ok(ctx.handle())
    }

    fn create_context(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let config = t.get_u32()?;
        let share = t.get_u32()?;
        let attribs = get_attribs(t)?;
        let retval = t.get_in_arg()?;
        call_trace!("eglCreateContext({}, {}, {}, {:?})", dpy, config, share, attribs);

        let result = self.do_create_context(dpy, config, share, &attribs);
        self.reply(t, &retval, result)
    }

    fn destroy_context(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let ctx = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglDestroyContext({}, {})", dpy, ctx);

        let result = self.display(dpy).and_then(|dpy| {
            validate_context(&dpy, ctx)?;
            if dpy.contexts.remove(ctx) {
                Ok(EGL_TRUE)
            } else {
                Err(EGL_BAD_CONTEXT)
            }
        });
        self.reply(t, &retval, result)
    }

    /// Drop the current context, `false` if the host refused
    fn release_current(&mut self, tc: &mut ThreadContext) -> bool {
        let Some(ctx) = self.context.clone() else {
            return true;
        };

        {
            let mut client = ctx.client().lock();
            client.flush();
            client.deactivate();
        }

        if !self.ps.host().release_current(ctx.native_dpy()) {
            log::warn!("egl: host refused to release context {:?}", ctx.native());
            ctx.client().lock().activate();
            return false;
        }

        ctx.clear_surfaces();
        self.context = None;
        tc.current = None;
        true
    }

    fn do_make_current(
        &mut self,
        tc: &mut ThreadContext,
        dpy: HostHandle,
        draw: HostHandle,
        read: HostHandle,
        ctx: HostHandle,
    ) -> EglResult<u32> {
        let release = ctx == 0;
        let bad_match = if release {
            draw != 0 || read != 0
        } else {
            draw == 0 || read == 0
        };
        if bad_match {
            return Err(EGL_BAD_MATCH);
        }

        if release {
            if dpy != 0 {
                self.display(dpy)?;
            }
            return if self.release_current(tc) {
                Ok(EGL_TRUE)
            } else {
                Err(EGL_BAD_ACCESS)
            };
        }

        let dpy = self.display(dpy)?;
        let ctx = validate_context(&dpy, ctx)?;
        let draw = validate_surface(&dpy, draw)?;
        let read = validate_surface(&dpy, read)?;

        let prev = self.context.clone();
        let switching = !prev.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, &ctx));

        if let Some(prev) = &prev {
            let mut client = prev.client().lock();
            client.flush();
            if switching {
                client.deactivate();
            }
        }

        if !self
            .ps
            .host()
            .make_current(dpy.native(), ctx.native(), draw.native(), read.native())
        {
            log::warn!("egl: host refused to make context {:?} current", ctx.native());
            if switching {
                if let Some(prev) = &prev {
                    prev.client().lock().activate();
                }
            }
            return Err(EGL_BAD_ACCESS);
        }

        if switching {
            if let Some(prev) = &prev {
                prev.clear_surfaces();
            }
            ctx.client().lock().activate();
            log::debug!("egl: thread {}/{} switched to context {:?}", tc.pid, tc.tid, ctx.native());
        }

        ctx.set_surfaces(draw, read);
        tc.current = Some(ctx.client().clone());
        self.context = Some(ctx);
        Ok(EGL_TRUE)
    }

    fn make_current(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let draw = t.get_u32()?;
        let read = t.get_u32()?;
        let ctx = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglMakeCurrent({}, {}, {}, {})", dpy, draw, read, ctx);

        let result = self.do_make_current(tc, dpy, draw, read, ctx);
        self.reply(&tc.transport, &retval, result)
    }

    fn query_context(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let ctx = t.get_u32()?;
        let attribute = t.get_i32()?;
        let value = t.get_in_arg()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglQueryContext({}, {}, 0x{:X})", dpy, ctx, attribute);

        let result = self
            .display(dpy)
            .and_then(|dpy| validate_context(&dpy, ctx))
            .and_then(|ctx| match attribute {
                EGL_CONFIG_ID => Ok(Some(ctx.config().config_id())),
                EGL_CONTEXT_CLIENT_TYPE => Ok(Some(EGL_OPENGL_ES_API as EGLint)),
                EGL_CONTEXT_CLIENT_VERSION => Ok(Some(ctx.client_api() as EGLint)),
                EGL_RENDER_BUFFER => Ok(Some(
                    ctx.draw()
                        .map_or(EGL_NONE, |draw| draw.kind().render_buffer()),
                )),
                _ => Err(EGL_BAD_ATTRIBUTE),
            });
        self.reply_value(t, &value, &retval, result)
    }

    fn swap_buffers(&mut self, tc: &mut ThreadContext, copy: bool) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("egl{}Buffers({}, {})", if copy { "Copy" } else { "Swap" }, dpy, sfc);

        let result = self.display(dpy).and_then(|dpy| {
            let surface = validate_surface(&dpy, sfc)?;
            let mut backend = surface.backend();
            let presented = match &self.context {
                Some(ctx) => {
                    let mut client = ctx.client().lock();
                    present(&mut **backend, Some(&mut **client), copy)
                }
                None => present(&mut **backend, None, copy),
            };
            match (presented, copy) {
                (true, _) => Ok(EGL_TRUE),
                (false, false) => Err(EGL_BAD_ALLOC),
                (false, true) => Err(EGL_BAD_NATIVE_PIXMAP),
            }
        });
        self.reply(t, &retval, result)
    }

    fn do_create_image(&self, dpy: HostHandle, ctx: HostHandle, target: EGLenum, buffer: WinsysId, attribs: &[EGLint]) -> EglResult<u32> {
        let dpy = self.display(dpy)?;
        if target != EGL_NATIVE_PIXMAP_KHR || ctx != 0 {
            return Err(EGL_BAD_PARAMETER);
        }
        for (attrib, _) in attrib_pairs(attribs) {
            if attrib != EGL_IMAGE_PRESERVED_KHR {
                return Err(EGL_BAD_PARAMETER);
            }
        }

        let env = self.ps.env();
        let iface = env
            .client_iface(ClientApi::Gles2)
            .or_else(|| env.client_iface(ClientApi::Gles1))
            .ok_or(EGL_BAD_ALLOC)?;
        let image = EglImage::new(self.ps.host(), iface.as_ref(), buffer).ok_or(EGL_BAD_ALLOC)?;
        dpy.images.add(image.clone());
        Ok(image.handle())
    }

    fn create_image(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let ctx = t.get_u32()?;
        let target = t.get_u32()?;
        let buffer = t.get_u32()?;
        let attribs = get_attribs(t)?;
        let retval = t.get_in_arg()?;
        call_trace!("eglCreateImageKHR({}, {}, 0x{:X}, {})", dpy, ctx, target, buffer);

        let result = self.do_create_image(dpy, ctx, target, buffer, &attribs);
        self.reply(t, &retval, result)
    }

    fn destroy_image(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let image = t.get_u32()?;
        let retval = t.get_in_arg()?;
        call_trace!("eglDestroyImageKHR({}, {})", dpy, image);

        let result = self.display(dpy).and_then(|dpy| {
            validate_image(&dpy, image)?;
            if dpy.images.remove(image) {
                Ok(EGL_TRUE)
            } else {
                Err(EGL_BAD_PARAMETER)
            }
        });
        self.reply(t, &retval, result)
    }

    /// Validate a surface creation request, returning the display, config
    /// and creation attributes
    fn surface_request(
        &self,
        kind: SurfaceKind,
        dpy: HostHandle,
        config: HostHandle,
        attribs: &[EGLint],
    ) -> EglResult<(Arc<EglDisplay>, Arc<EglConfig>, PbufferAttribs)> {
        let attribs = surface::parse_attribs(kind, attribs)?;
        let dpy = self.display(dpy)?;
        let config = validate_config(&dpy, config)?;
        if config.get_attrib(EGL_SURFACE_TYPE).unwrap_or(0) & surface_bit(kind) == 0 {
            return Err(EGL_BAD_MATCH);
        }
        Ok((dpy, config, attribs))
    }

    fn add_surface(
        dpy: &EglDisplay,
        config: Arc<EglConfig>,
        kind: SurfaceKind,
        attribs: PbufferAttribs,
        backend: Option<Box<dyn BackendSurface>>,
    ) -> EglResult<u32> {
        let backend = backend.ok_or(create_error(kind))?;
        let surface = EglSurface::new(config, kind, attribs, backend);
        dpy.surfaces.add(surface.clone());
        Ok(surface.handle())
    }

    fn create_surface_offscreen(&mut self, tc: &mut ThreadContext, kind: SurfaceKind) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let config = t.get_u32()?;
        let params = OffscreenParams {
            width: t.get_u32()?,
            height: t.get_u32()?,
            bpp: t.get_u32()?,
            pixels: t.get_va()?,
        };
        let attribs = get_attribs(t)?;
        let retval = t.get_in_arg()?;
        call_trace!("eglCreate{:?}SurfaceOffscreen({}, {}, {:?})", kind, dpy, config, params);

        let result = self
            .surface_request(kind, dpy, config, &attribs)
            .and_then(|(dpy, config, attribs)| {
                let backend = self.ps.backend().create_offscreen_surface(
                    self.ps.host(),
                    dpy.native(),
                    config.native(),
                    kind,
                    &attribs,
                    &params,
                );
                Self::add_surface(&dpy, config, kind, attribs, backend)
            });
        self.reply(t, &retval, result)
    }

    fn do_resize(&self, dpy: HostHandle, sfc: HostHandle, params: &OffscreenParams) -> EglResult<u32> {
        let dpy = self.display(dpy)?;
        let surface = validate_surface(&dpy, sfc)?;
        let host = self.ps.host();

        let backend = self
            .ps
            .backend()
            .create_offscreen_surface(
                host,
                dpy.native(),
                surface.config().native(),
                surface.kind(),
                surface.attribs(),
                params,
            )
            .ok_or(EGL_BAD_ALLOC)?;

        if let Some(ctx) = &self.context {
            let bound = ctx.surfaces();
            let is_resized = |s: &Option<Arc<EglSurface>>| s.as_ref().is_some_and(|s| Arc::ptr_eq(s, &surface));
            let native_of = |s: &Option<Arc<EglSurface>>| {
                if is_resized(s) {
                    backend.native()
                } else {
                    s.as_ref().map_or(NativeId::NONE, |s| s.native())
                }
            };

            if is_resized(&bound.draw) || is_resized(&bound.read) {
                let (draw, read) = (native_of(&bound.draw), native_of(&bound.read));
                if !host.make_current(ctx.native_dpy(), ctx.native(), draw, read) {
                    log::warn!("egl: cannot rebind resized surface {:?}", draw);
                    return Err(EGL_BAD_ALLOC);
                }
            }
        }

        let old = surface.replace_backend(backend);
        drop(old);
        Ok(EGL_TRUE)
    }

    fn resize_offscreen_surface(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let params = OffscreenParams {
            width: t.get_u32()?,
            height: t.get_u32()?,
            bpp: t.get_u32()?,
            pixels: t.get_va()?,
        };
        let retval = t.get_in_arg()?;
        call_trace!("eglResizeOffscreenSurface({}, {}, {:?})", dpy, sfc, params);

        let result = self.do_resize(dpy, sfc, &params);
        self.reply(t, &retval, result)
    }

    fn update_offscreen_image(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let image = t.get_u32()?;
        let width = t.get_u32()?;
        let height = t.get_u32()?;
        let bpp = t.get_u32()?;
        let pixels = t.get_va()?;
        call_trace!("eglUpdateOffscreenImage({}, {}, {}x{}x{})", dpy, image, width, height, bpp);

        let image = match self.display(dpy).and_then(|dpy| validate_image(&dpy, image)) {
            Ok(image) => image,
            Err(error) => {
                self.set_error(error);
                return Ok(());
            }
        };
        if !matches!(bpp, 3 | 4) || width > MAX_IMAGE_DIM || height > MAX_IMAGE_DIM {
            self.set_error(EGL_BAD_PARAMETER);
            return Ok(());
        }

        let Some(mut data) = staging_buffer((width * height * bpp) as usize) else {
            self.set_error(EGL_BAD_ALLOC);
            return Ok(());
        };
        t.read_guest(pixels, &mut data)?;

        if !image.update_offscreen(width, height, bpp, &data) {
            self.set_error(EGL_BAD_ALLOC);
        }
        Ok(())
    }

    fn create_surface_onscreen(&mut self, tc: &mut ThreadContext, kind: SurfaceKind) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let config = t.get_u32()?;
        let id = t.get_u32()?;
        let attribs = get_attribs(t)?;
        let retval = t.get_in_arg()?;
        call_trace!("eglCreate{:?}SurfaceOnscreen({}, {}, {})", kind, dpy, config, id);

        let result = self
            .surface_request(kind, dpy, config, &attribs)
            .and_then(|(dpy, config, attribs)| {
                let backend = self.ps.backend().create_onscreen_surface(
                    self.ps.host(),
                    dpy.native(),
                    config.native(),
                    kind,
                    &attribs,
                    id,
                );
                Self::add_surface(&dpy, config, kind, attribs, backend)
            });
        self.reply(t, &retval, result)
    }

    fn invalidate_onscreen_surface(&mut self, tc: &mut ThreadContext) -> CallResult {
        let t = &mut tc.transport;
        let dpy = t.get_u32()?;
        let sfc = t.get_u32()?;
        let id = t.get_u32()?;
        call_trace!("eglInvalidateOnscreenSurface({}, {}, {})", dpy, sfc, id);

        match self.display(dpy).and_then(|dpy| validate_surface(&dpy, sfc)) {
            Ok(surface) => surface.backend().invalidate(id),
            Err(error) => self.set_error(error),
        }
        Ok(())
    }
}

impl ApiTs for EglTs {
    fn call(&mut self, func_id: u32, tc: &mut ThreadContext) -> CallResult {
        let render_type = self.ps.backend().render_type();
        let offscreen = render_type == RenderType::Offscreen;
        let onscreen = render_type == RenderType::Onscreen;

        match func_id {
            func::GET_ERROR => self.get_error(tc),
            func::GET_DISPLAY => self.get_display(tc),
            func::INITIALIZE => self.initialize(tc),
            func::TERMINATE => self.terminate(tc),
            func::GET_CONFIGS => self.get_configs(tc),
            func::CHOOSE_CONFIG => self.choose_config(tc),
            func::GET_CONFIG_ATTRIB => self.get_config_attrib(tc),
            func::DESTROY_SURFACE => self.destroy_surface(tc),
            func::QUERY_SURFACE => self.query_surface(tc),
            func::BIND_API => self.bind_api(tc),
            func::WAIT_CLIENT => self.wait_client(tc),
            func::RELEASE_THREAD => self.release_thread(tc),
            func::CREATE_PBUFFER_FROM_CLIENT_BUFFER => self.create_pbuffer_from_client_buffer(tc),
            func::SURFACE_ATTRIB => self.surface_attrib(tc),
            func::BIND_TEX_IMAGE => self.bind_tex_image(tc, true),
            func::RELEASE_TEX_IMAGE => self.bind_tex_image(tc, false),
            func::CREATE_CONTEXT => self.create_context(tc),
            func::DESTROY_CONTEXT => self.destroy_context(tc),
            func::MAKE_CURRENT => self.make_current(tc),
            func::QUERY_CONTEXT => self.query_context(tc),
            func::SWAP_BUFFERS => self.swap_buffers(tc, false),
            func::COPY_BUFFERS => self.swap_buffers(tc, true),
            func::CREATE_IMAGE_KHR => self.create_image(tc),
            func::DESTROY_IMAGE_KHR => self.destroy_image(tc),
            func::CREATE_WINDOW_SURFACE_OFFSCREEN if offscreen => {
                self.create_surface_offscreen(tc, SurfaceKind::Window)
            }
            func::CREATE_PBUFFER_SURFACE_OFFSCREEN if offscreen => {
                self.create_surface_offscreen(tc, SurfaceKind::Pbuffer)
            }
            func::CREATE_PIXMAP_SURFACE_OFFSCREEN if offscreen => {
                self.create_surface_offscreen(tc, SurfaceKind::Pixmap)
            }
            func::RESIZE_OFFSCREEN_SURFACE if offscreen => self.resize_offscreen_surface(tc),
            func::UPDATE_OFFSCREEN_IMAGE if offscreen => self.update_offscreen_image(tc),
            func::CREATE_WINDOW_SURFACE_ONSCREEN if onscreen => {
                self.create_surface_onscreen(tc, SurfaceKind::Window)
            }
            func::CREATE_PBUFFER_SURFACE_ONSCREEN if onscreen => {
                self.create_surface_onscreen(tc, SurfaceKind::Pbuffer)
            }
            func::CREATE_PIXMAP_SURFACE_ONSCREEN if onscreen => {
                self.create_surface_onscreen(tc, SurfaceKind::Pixmap)
            }
            func::INVALIDATE_ONSCREEN_SURFACE if onscreen => self.invalidate_onscreen_surface(tc),
            _ => Err(bad_func(ApiId::Egl, func_id)),
        }
    }

    fn thread_fini(&mut self, tc: &mut ThreadContext) {
        if !self.release_current(tc) {
            self.context = None;
            tc.current = None;
        }
        log::debug!("egl: thread {}/{} finished", tc.pid, tc.tid);
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::api::{Api, ProcessEnv};
    use crate::client::{ClientImage, ClientInterface, SharedClientContext};
    use crate::config::YaglConfig;
    use crate::driver::{EglDriver, HeadlessDriver, HostCall, HostDrivers};
    use crate::egl::EglApi;
    use crate::gles1::Gles1Api;
    use crate::gles2::Gles2Api;
    use crate::mem::{GuestMemory, PageSet};
    use crate::object::EnsureContext;
    use crate::testutil::{BatchWriter, SimMemory};

    const API: u32 = 1;
    const BATCH_PA: u64 = 0x80000;
    const PIXELS_VA: u64 = 0x4000_0000;
    const PIXELS_PA: u64 = 0x100000;

    struct Harness {
        sim: Arc<SimMemory>,
        driver: Arc<HeadlessDriver>,
        env: Arc<ProcessEnv>,
        ts: Box<dyn ApiTs>,
        tc: ThreadContext,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(YaglConfig::default())
        }

        fn with_config(config: YaglConfig) -> Self {
            let sim = SimMemory::new();
            let driver = Arc::new(HeadlessDriver::new());
            let mem: Arc<dyn GuestMemory> = sim.clone();
            let env = Arc::new(ProcessEnv::new(
                1,
                Arc::new(config.clone()),
                HostDrivers::from_driver(driver.clone()),
                mem.clone(),
            ));

            let mut tc = ThreadContext::new(1, 1, Transport::new(&config, mem));
            let egl = EglApi.process_init(&env);
            Gles1Api.process_init(&env);
            Gles2Api.process_init(&env);
            let ts = egl.thread_init(&mut tc);

            Harness {
                sim,
                driver,
                env,
                ts,
                tc,
            }
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

        /// Run one call whose arguments `args` writes, followed by the
        /// return value in-arg; returns the value and what `args` returned
        fn call<R>(&mut self, func_id: u32, args: impl FnOnce(&mut BatchWriter) -> R) -> (u32, R) {
            let mut w = BatchWriter::new();
            w.call(API, func_id, false);
            let r = args(&mut w);
            let retval = w.in_arg();
            w.end();
            self.run(&w).unwrap();
            (self.slot(retval), r)
        }

        fn attribs(w: &mut BatchWriter, attribs: &[EGLint]) {
            let bytes: Vec<u8> = attribs.iter().flat_map(|v| v.to_le_bytes()).collect();
            w.out_inline(attribs.len() as i32, &bytes);
        }

        fn error(&mut self) -> EGLint {
            self.call(func::GET_ERROR, |_| ()).0 as EGLint
        }

        fn display(&mut self) -> u32 {
            let (dpy, _) = self.call(func::GET_DISPLAY, |w| {
                w.u32(0);
            });
            let (ok, (major, minor)) = self.call(func::INITIALIZE, |w| {
                w.u32(dpy);
                (w.in_arg(), w.in_arg())
            });
            assert_eq!(ok, EGL_TRUE);
            assert_eq!(self.slot(major), 1);
            assert_eq!(self.slot(minor), 4);
            dpy
        }

        fn configs(&mut self, dpy: u32, attribs: &[EGLint]) -> Vec<u32> {
            let (ok, ((count_at, data_at), num)) = self.call(func::CHOOSE_CONFIG, |w| {
                w.u32(dpy);
                Self::attribs(w, attribs);
                (w.in_inline(8, 4), w.in_arg())
            });
            assert_eq!(ok, EGL_TRUE);
            let count = self.slot(count_at) as usize;
            assert_eq!(self.slot(num) as usize, count);
            (0..count).map(|i| self.slot(data_at + i * 4)).collect()
        }

        fn window(&mut self, dpy: u32, config: u32, width: u32, height: u32) -> u32 {
            for page in 0..((width * height * 4) as u64).div_ceil(4096) {
                self.sim
                    .map_virt(PIXELS_VA + page * 4096, PIXELS_PA + page * 4096);
            }
            self.call(func::CREATE_WINDOW_SURFACE_OFFSCREEN, |w| {
                w.u32(dpy);
                w.u32(config);
                w.u32(width);
                w.u32(height);
                w.u32(4);
                w.u32(PIXELS_VA as u32);
                Self::attribs(w, &[EGL_NONE]);
            })
            .0
        }

        fn context(&mut self, dpy: u32, config: u32, share: u32, attribs: &[EGLint]) -> u32 {
            self.call(func::CREATE_CONTEXT, |w| {
                w.u32(dpy);
                w.u32(config);
                w.u32(share);
                Self::attribs(w, attribs);
            })
            .0
        }

        fn make_current(&mut self, dpy: u32, draw: u32, read: u32, ctx: u32) -> u32 {
            self.call(func::MAKE_CURRENT, |w| {
                w.u32(dpy);
                w.u32(draw);
                w.u32(read);
                w.u32(ctx);
            })
            .0
        }

        /// Display, first config, a window and a GLES2 context made current
        fn current(&mut self, width: u32, height: u32) -> (u32, u32, u32) {
            let dpy = self.display();
            let config = self.configs(dpy, &[EGL_NONE])[0];
            let sfc = self.window(dpy, config, width, height);
            assert_ne!(sfc, 0);
            let ctx = self.context(dpy, config, 0, &[EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE]);
            assert_ne!(ctx, 0);
            assert_eq!(self.make_current(dpy, sfc, sfc, ctx), EGL_TRUE);
            (dpy, sfc, ctx)
        }
    }

    #[test]
    fn test_display_and_configs() {
        let mut h = Harness::new();
        let dpy = h.display();
        let (again, _) = h.call(func::GET_DISPLAY, |w| {
            w.u32(0);
        });
        assert_eq!(again, dpy);

        let all = h.configs(dpy, &[EGL_NONE]);
        assert_eq!(all.len(), 2);
        let multisampled = h.configs(dpy, &[EGL_SAMPLES, 4, EGL_NONE]);
        assert_eq!(multisampled.len(), 1);
        assert_eq!(multisampled[0], all[1]);

        // Count only
        let (ok, num) = h.call(func::GET_CONFIGS, |w| {
            w.u32(dpy);
            w.in_null();
            w.in_arg()
        });
        assert_eq!(ok, EGL_TRUE);
        assert_eq!(h.slot(num), 2);

        // Room for one
        let (ok, ((count_at, data_at), num)) = h.call(func::GET_CONFIGS, |w| {
            w.u32(dpy);
            (w.in_inline(1, 4), w.in_arg())
        });
        assert_eq!(ok, EGL_TRUE);
        assert_eq!(h.slot(count_at), 1);
        assert_eq!(h.slot(num), 1);
        assert_eq!(h.slot(data_at), all[0]);

        let (ok, value) = h.call(func::GET_CONFIG_ATTRIB, |w| {
            w.u32(dpy);
            w.u32(all[0]);
            w.i32(EGL_DEPTH_SIZE);
            w.in_arg()
        });
        assert_eq!(ok, EGL_TRUE);
        assert_eq!(h.slot(value), 24);

        let (ok, _) = h.call(func::GET_CONFIG_ATTRIB, |w| {
            w.u32(dpy);
            w.u32(all[0]);
            w.i32(0x1234);
            w.in_arg()
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_ATTRIBUTE);

        let (ok, _) = h.call(func::CHOOSE_CONFIG, |w| {
            w.u32(dpy);
            Harness::attribs(w, &[EGL_RED_SIZE, -2, EGL_NONE]);
            (w.in_inline(8, 4), w.in_arg())
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_ATTRIBUTE);
    }

    #[test]
    fn test_error_latch() {
        let mut h = Harness::new();
        assert_eq!(h.error(), EGL_SUCCESS);

        let (ok, _) = h.call(func::INITIALIZE, |w| {
            w.u32(0xDEAD);
            (w.in_arg(), w.in_arg())
        });
        assert_eq!(ok, EGL_FALSE);

        // The first error sticks until read
        let (ok, _) = h.call(func::BIND_API, |w| {
            w.u32(0x30A2);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_DISPLAY);
        assert_eq!(h.error(), EGL_SUCCESS);

        // Known display, not initialized yet
        let (dpy, _) = h.call(func::GET_DISPLAY, |w| {
            w.u32(3);
        });
        let (ok, _) = h.call(func::GET_CONFIGS, |w| {
            w.u32(dpy);
            w.in_null();
            w.in_arg()
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_NOT_INITIALIZED);

        let (ok, _) = h.call(func::CREATE_PBUFFER_FROM_CLIENT_BUFFER, |w| {
            w.u32(dpy);
            w.u32(0);
            w.u32(0);
            w.u32(0);
            w.out_null();
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_PARAMETER);
    }

    #[test]
    fn test_make_current_and_swap() {
        let mut h = Harness::new();
        let (dpy, sfc, ctx) = h.current(2, 3);
        assert!(h.tc.current.is_some());

        let (ok, value) = h.call(func::QUERY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(ctx);
            w.i32(EGL_CONTEXT_CLIENT_VERSION);
            w.in_arg()
        });
        assert_eq!(ok, EGL_TRUE);
        assert_eq!(h.slot(value), 2);

        let (_, value) = h.call(func::QUERY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(ctx);
            w.i32(EGL_RENDER_BUFFER);
            w.in_arg()
        });
        assert_eq!(h.slot(value) as EGLint, EGL_BACK_BUFFER);

        let (ok, value) = h.call(func::QUERY_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
            w.i32(EGL_HEIGHT);
            w.in_arg()
        });
        assert_eq!(ok, EGL_TRUE);
        assert_eq!(h.slot(value), 3);

        let (ok, _) = h.call(func::SWAP_BUFFERS, |w| {
            w.u32(dpy);
            w.u32(sfc);
        });
        assert_eq!(ok, EGL_TRUE);
        let mut guest = vec![0u8; 24];
        h.sim.read_virt(PIXELS_VA, &mut guest).unwrap();
        assert_eq!(&guest[..8], &[2; 8]);
        assert_eq!(&guest[16..], &[0; 8]);

        // Release flushes before the host switch
        h.driver.clear_calls();
        assert_eq!(h.make_current(0, 0, 0, 0), EGL_TRUE);
        assert!(h.tc.current.is_none());
        let calls = h.driver.take_calls();
        let flush = calls.iter().position(|c| *c == HostCall::Flush).unwrap();
        let release = calls
            .iter()
            .position(|c| {
                *c == HostCall::MakeCurrent {
                    ctx: None,
                    draw: None,
                    read: None,
                }
            })
            .unwrap();
        assert!(flush < release);

        // Releasing with nothing current is fine
        assert_eq!(h.make_current(0, 0, 0, 0), EGL_TRUE);

        // Nothing current, nothing to read back
        let (ok, _) = h.call(func::SWAP_BUFFERS, |w| {
            w.u32(dpy);
            w.u32(sfc);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_ALLOC);
    }

    type Events = Arc<parking_lot::Mutex<Vec<&'static str>>>;

    /// GLES2 stand-in that logs what EGL asks of its contexts
    struct RecordingClient(Events);

    struct RecordingCtx {
        events: Events,
        sharegroup: Arc<Sharegroup>,
    }

    struct NoImage;

    impl ClientImage for NoImage {
        fn tex_global_name(&self) -> u32 {
            0
        }
    }

    impl ClientInterface for RecordingClient {
        fn client_api(&self) -> ClientApi {
            ClientApi::Gles2
        }

        fn create_ctx(&self, sharegroup: Arc<Sharegroup>, _ensure: Arc<dyn EnsureContext>) -> SharedClientContext {
            let ctx: Box<dyn ClientContext> = Box::new(RecordingCtx {
                events: self.0.clone(),
                sharegroup,
            });
            Arc::new(parking_lot::Mutex::new(ctx))
        }

        fn create_image(&self, _tex_global_name: u32, _ensure: Arc<dyn EnsureContext>) -> Arc<dyn ClientImage> {
            Arc::new(NoImage)
        }
    }

    impl ClientContext for RecordingCtx {
        fn client_api(&self) -> ClientApi {
            ClientApi::Gles2
        }

        fn sharegroup(&self) -> &Arc<Sharegroup> {
            &self.sharegroup
        }

        fn activate(&mut self) {
            self.events.lock().push("activate");
        }

        fn deactivate(&mut self) {
            self.events.lock().push("deactivate");
        }

        fn flush(&mut self) {
            self.events.lock().push("flush");
        }

        fn finish(&mut self) {
            self.events.lock().push("finish");
        }

        fn read_pixels(&mut self, _width: u32, _height: u32, _bpp: u32, _pixels: &mut [u8]) -> bool {
            true
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Drop for RecordingCtx {
        fn drop(&mut self) {
            self.events.lock().push("destroy");
        }
    }

    #[test]
    fn test_client_context_lifecycle() {
        let mut h = Harness::new();
        let events = Events::default();
        h.env.register_client(Arc::new(RecordingClient(events.clone())));
        let take = || core::mem::take(&mut *events.lock());

        let (dpy, sfc, ctx) = h.current(2, 2);
        assert_eq!(take(), vec!["activate"]);

        // Same context again: flushed, stays active
        assert_eq!(h.make_current(dpy, sfc, sfc, ctx), EGL_TRUE);
        assert_eq!(take(), vec!["flush"]);

        assert_eq!(h.make_current(dpy, 0, 0, 0), EGL_TRUE);
        assert_eq!(take(), vec!["flush", "deactivate"]);
        assert_eq!(h.make_current(dpy, 0, 0, 0), EGL_TRUE);
        assert!(take().is_empty());

        // Destroying the current context defers until it is released
        assert_eq!(h.make_current(dpy, sfc, sfc, ctx), EGL_TRUE);
        assert_eq!(take(), vec!["activate"]);
        let (ok, _) = h.call(func::DESTROY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(ctx);
        });
        assert_eq!(ok, EGL_TRUE);
        assert!(take().is_empty());

        assert_eq!(h.make_current(dpy, 0, 0, 0), EGL_TRUE);
        assert_eq!(take(), vec!["flush", "deactivate", "destroy"]);
    }

    #[test]
    fn test_make_current_errors() {
        let mut h = Harness::new();
        let (dpy, sfc, ctx) = h.current(4, 4);

        assert_eq!(h.make_current(dpy, sfc, 0, ctx), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_MATCH);
        assert_eq!(h.make_current(dpy, sfc, sfc, 0), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_MATCH);
        assert_eq!(h.make_current(dpy, sfc, sfc, 0x7777), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_CONTEXT);
        assert_eq!(h.make_current(dpy, 0x7777, sfc, ctx), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_SURFACE);

        // A failed switch leaves the previous context current
        let config = h.configs(dpy, &[EGL_NONE])[0];
        let other = h.context(dpy, config, ctx, &[EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE]);
        assert_ne!(other, 0);
        h.driver.set_fail_make_current(true);
        assert_eq!(h.make_current(dpy, sfc, sfc, other), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_ACCESS);
        h.driver.set_fail_make_current(false);
        assert!(h.tc.current.is_some());

        let (ok, _) = h.call(func::SWAP_BUFFERS, |w| {
            w.u32(dpy);
            w.u32(sfc);
        });
        assert_eq!(ok, EGL_TRUE);

        assert_eq!(h.make_current(dpy, sfc, sfc, other), EGL_TRUE);
    }

    #[test]
    fn test_create_context_attribs() {
        let mut h = Harness::new();
        let dpy = h.display();
        let config = h.configs(dpy, &[EGL_NONE])[0];

        let gles1 = h.context(dpy, config, 0, &[EGL_NONE]);
        assert_ne!(gles1, 0);
        let (_, value) = h.call(func::QUERY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(gles1);
            w.i32(EGL_CONTEXT_CLIENT_VERSION);
            w.in_arg()
        });
        assert_eq!(h.slot(value), 1);

        assert_eq!(h.context(dpy, config, 0, &[EGL_CONTEXT_CLIENT_VERSION, 3, EGL_NONE]), 0);
        assert_eq!(h.error(), EGL_BAD_ATTRIBUTE);
        assert_eq!(h.context(dpy, config, 0x7777, &[EGL_NONE]), 0);
        assert_eq!(h.error(), EGL_BAD_CONTEXT);
        assert_eq!(h.context(dpy, 0x7777, 0, &[EGL_NONE]), 0);
        assert_eq!(h.error(), EGL_BAD_CONFIG);

        let (ok, _) = h.call(func::DESTROY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(gles1);
        });
        assert_eq!(ok, EGL_TRUE);
        let (ok, _) = h.call(func::DESTROY_CONTEXT, |w| {
            w.u32(dpy);
            w.u32(gles1);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_CONTEXT);
    }

    #[test]
    fn test_destroy_surface_while_current() {
        let mut h = Harness::new();
        let (dpy, sfc, _ctx) = h.current(2, 2);
        let mappings = h.sim.live_mappings();

        let (ok, _) = h.call(func::DESTROY_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
        });
        assert_eq!(ok, EGL_TRUE);
        // The pixel transfer is gone, the call buffer pages stay mapped
        assert!(h.sim.live_mappings() < mappings);

        let (ok, _) = h.call(func::SWAP_BUFFERS, |w| {
            w.u32(dpy);
            w.u32(sfc);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_SURFACE);

        // The host surface goes once the context lets go of it
        h.driver.clear_calls();
        assert_eq!(h.make_current(dpy, 0, 0, 0), EGL_TRUE);
        assert!(h.driver.calls().contains(&HostCall::Call("eglDestroySurface")));
    }

    #[test]
    fn test_resize_rebinds_current_surface() {
        let mut h = Harness::new();
        let (dpy, sfc, _ctx) = h.current(2, 2);

        h.driver.clear_calls();
        let (ok, _) = h.call(func::RESIZE_OFFSCREEN_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
            w.u32(4);
            w.u32(1);
            w.u32(4);
            w.u32(PIXELS_VA as u32);
        });
        assert_eq!(ok, EGL_TRUE);
        let calls = h.driver.take_calls();
        assert!(calls.iter().any(|c| matches!(c, HostCall::MakeCurrent { ctx: Some(_), .. })));
        assert_eq!(calls.last(), Some(&HostCall::Call("eglDestroySurface")));

        let (_, value) = h.call(func::QUERY_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
            w.i32(EGL_WIDTH);
            w.in_arg()
        });
        assert_eq!(h.slot(value), 4);
    }

    #[test]
    fn test_oversized_surfaces_rejected() {
        let mut h = Harness::new();
        let (dpy, sfc, _ctx) = h.current(2, 2);
        let config = h.configs(dpy, &[EGL_NONE])[0];

        let (ok, _) = h.call(func::RESIZE_OFFSCREEN_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
            w.u32(u32::MAX);
            w.u32(u32::MAX);
            w.u32(4);
            w.u32(PIXELS_VA as u32);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_ALLOC);
        let (_, value) = h.call(func::QUERY_SURFACE, |w| {
            w.u32(dpy);
            w.u32(sfc);
            w.i32(EGL_WIDTH);
            w.in_arg()
        });
        assert_eq!(h.slot(value), 2);

        let (pbuffer, _) = h.call(func::CREATE_PBUFFER_SURFACE_OFFSCREEN, |w| {
            w.u32(dpy);
            w.u32(config);
            w.u32(1 << 20);
            w.u32(1 << 20);
            w.u32(4);
            w.u32(PIXELS_VA as u32);
            Harness::attribs(w, &[EGL_NONE]);
        });
        assert_eq!(pbuffer, 0);
        assert_eq!(h.error(), EGL_BAD_ALLOC);
    }

    #[test]
    fn test_pbuffer_tex_image() {
        let mut h = Harness::new();
        let (dpy, _sfc, _ctx) = h.current(2, 2);
        let config = h.configs(dpy, &[EGL_NONE])[0];

        let pbuffer = |h: &mut Harness, attribs: &[EGLint]| {
            h.call(func::CREATE_PBUFFER_SURFACE_OFFSCREEN, |w| {
                w.u32(dpy);
                w.u32(config);
                w.u32(2);
                w.u32(2);
                w.u32(4);
                w.u32(PIXELS_VA as u32);
                Harness::attribs(w, attribs);
            })
            .0
        };
        let tex_image = |h: &mut Harness, func_id: u32, sfc: u32| {
            h.call(func_id, |w| {
                w.u32(dpy);
                w.u32(sfc);
                w.i32(EGL_BACK_BUFFER);
            })
            .0
        };

        let plain = pbuffer(&mut h, &[EGL_NONE]);
        assert_ne!(plain, 0);
        assert_eq!(tex_image(&mut h, func::BIND_TEX_IMAGE, plain), EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_MATCH);

        let textured = pbuffer(
            &mut h,
            &[EGL_TEXTURE_FORMAT, EGL_TEXTURE_RGBA, EGL_TEXTURE_TARGET, EGL_TEXTURE_2D, EGL_NONE],
        );
        assert_ne!(textured, 0);
        assert_eq!(tex_image(&mut h, func::BIND_TEX_IMAGE, textured), EGL_TRUE);
        assert_eq!(tex_image(&mut h, func::RELEASE_TEX_IMAGE, textured), EGL_TRUE);

        assert_eq!(pbuffer(&mut h, &[EGL_TEXTURE_FORMAT, 0x1234, EGL_NONE]), 0);
        assert_eq!(h.error(), EGL_BAD_ATTRIBUTE);
    }

    #[test]
    fn test_images() {
        let mut h = Harness::new();
        let dpy = h.display();

        let create = |h: &mut Harness, target: EGLenum| {
            h.call(func::CREATE_IMAGE_KHR, |w| {
                w.u32(dpy);
                w.u32(0);
                w.u32(target);
                w.u32(42);
                w.out_null();
            })
            .0
        };

        assert_eq!(create(&mut h, EGL_GL_TEXTURE_2D_KHR), 0);
        assert_eq!(h.error(), EGL_BAD_PARAMETER);

        let image = create(&mut h, EGL_NATIVE_PIXMAP_KHR);
        assert_ne!(image, 0);
        let client_image = h.env.egl_iface().unwrap().get_image(image).unwrap();
        assert_ne!(client_image.tex_global_name(), 0);

        // Pixels not resident yet
        let update = |h: &mut Harness| {
            let mut w = BatchWriter::new();
            w.call(API, func::UPDATE_OFFSCREEN_IMAGE, false);
            w.u32(dpy);
            w.u32(image);
            w.u32(1);
            w.u32(1);
            w.u32(4);
            w.u32(PIXELS_VA as u32);
            w.end();
            h.run(&w)
        };
        assert_eq!(update(&mut h), Err(CallError::Retry));
        h.sim.map_virt(PIXELS_VA, PIXELS_PA);
        h.sim.write_virt(PIXELS_VA, &[9, 8, 7, 6]).unwrap();
        h.driver.clear_calls();
        assert_eq!(update(&mut h), Ok(()));
        assert!(h.driver.calls().iter().any(|c| matches!(
            c,
            HostCall::TexImage2D { data: Some(data), .. } if data == &[9, 8, 7, 6]
        )));
        assert_eq!(h.error(), EGL_SUCCESS);

        let (ok, _) = h.call(func::DESTROY_IMAGE_KHR, |w| {
            w.u32(dpy);
            w.u32(image);
        });
        assert_eq!(ok, EGL_TRUE);
        assert!(h.env.egl_iface().unwrap().get_image(image).is_none());
        let (ok, _) = h.call(func::DESTROY_IMAGE_KHR, |w| {
            w.u32(dpy);
            w.u32(image);
        });
        assert_eq!(ok, EGL_FALSE);
        assert_eq!(h.error(), EGL_BAD_PARAMETER);
    }

    #[test]
    fn test_release_thread() {
        let mut h = Harness::new();
        let (_dpy, _sfc, _ctx) = h.current(2, 2);

        let (ok, _) = h.call(func::RELEASE_THREAD, |_| ());
        assert_eq!(ok, EGL_TRUE);
        assert!(h.tc.current.is_none());
        assert_eq!(h.driver.current_context(), None);
    }

    #[test]
    fn test_render_type_functions() {
        let mut h = Harness::with_config(YaglConfig {
            render_type: RenderType::Onscreen,
            ..YaglConfig::default()
        });
        let dpy = h.display();
        let config = h.configs(dpy, &[EGL_NONE])[0];

        let mut w = BatchWriter::new();
        w.call(API, func::CREATE_WINDOW_SURFACE_OFFSCREEN, false);
        w.end();
        assert!(matches!(h.run(&w), Err(CallError::Protocol(_))));

        let (sfc, _) = h.call(func::CREATE_WINDOW_SURFACE_ONSCREEN, |w| {
            w.u32(dpy);
            w.u32(config);
            w.u32(17);
            Harness::attribs(w, &[EGL_NONE]);
        });
        assert_ne!(sfc, 0);

        let mut w = BatchWriter::new();
        w.call(API, func::INVALIDATE_ONSCREEN_SURFACE, false);
        w.u32(dpy);
        w.u32(sfc);
        w.u32(18);
        w.end();
        assert_eq!(h.run(&w), Ok(()));
        assert_eq!(h.error(), EGL_SUCCESS);
    }

    #[test]
    fn test_bad_func() {
        let mut h = Harness::new();
        let mut w = BatchWriter::new();
        w.call(API, NUM_FUNCS + 1, false);
        w.end();
        assert!(matches!(h.run(&w), Err(CallError::Protocol(_))));
    }

    #[test]
    fn test_thread_fini_releases_context() {
        let mut h = Harness::new();
        h.current(2, 2);
        assert!(h.driver.current_context().is_some());

        h.ts.thread_fini(&mut h.tc);
        assert!(h.tc.current.is_none());
        assert_eq!(h.driver.current_context(), None);
    }
}
