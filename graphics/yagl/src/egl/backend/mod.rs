//! Host side of EGL
//!
//! [`HostEgl`] owns what every render type shares: host displays, host
//! contexts, make-current and the ensure context pair. An [`EglBackend`]
//! only decides how guest surfaces are backed.

mod offscreen;
mod onscreen;

pub use offscreen::{OffscreenBackend, OffscreenSurface};
pub use onscreen::{OnscreenBackend, OnscreenSurface};

use std::sync::Arc;

use parking_lot::Mutex;

use super::config::EglConfig;
use super::surface::SurfaceKind;
use crate::client::ClientContext;
use crate::config::RenderType;
use crate::driver::{EglDriver, GlesDriver, HostDrivers, NativeConfig, PbufferAttribs};
use crate::mem::GuestMemory;
use crate::object::EnsureContext;
use crate::types::{GuestVirtAddr, NativeId, WinsysId};

/// Render-type specific part of a guest surface
pub trait BackendSurface: Send {
    /// Host surface bound at make-current
    fn native(&self) -> NativeId;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Present the draw buffer; `client` is the context current on the
    /// calling thread
    fn swap_buffers(&mut self, client: Option<&mut dyn ClientContext>) -> bool;

    fn copy_buffers(&mut self, client: Option<&mut dyn ClientContext>) -> bool;

    fn wait_gl(&mut self);

    /// Rebind to another window-system surface
    fn invalidate(&mut self, _id: WinsysId) {}

    /// Stop pushing pixels to the guest
    fn release_transfer(&mut self) {}
}

/// Guest surface geometry and pixel memory, offscreen rendering only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenParams {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    pub pixels: GuestVirtAddr,
}

pub trait EglBackend: Send + Sync {
    fn render_type(&self) -> RenderType;

    fn create_offscreen_surface(
        &self,
        _host: &HostEgl,
        _dpy: NativeId,
        _cfg: &NativeConfig,
        _kind: SurfaceKind,
        _attribs: &PbufferAttribs,
        _params: &OffscreenParams,
    ) -> Option<Box<dyn BackendSurface>> {
        None
    }

    fn create_onscreen_surface(
        &self,
        _host: &HostEgl,
        _dpy: NativeId,
        _cfg: &NativeConfig,
        _kind: SurfaceKind,
        _attribs: &PbufferAttribs,
        _id: WinsysId,
    ) -> Option<Box<dyn BackendSurface>> {
        None
    }
}

/// Backend for the configured render type
pub fn for_render_type(render_type: RenderType) -> Box<dyn EglBackend> {
    match render_type {
        RenderType::Offscreen => Box::new(OffscreenBackend),
        RenderType::Onscreen => Box::new(OnscreenBackend),
    }
}

#[derive(Debug, Clone, Copy)]
struct EnsurePair {
    dpy: NativeId,
    sfc: NativeId,
    ctx: NativeId,
    /// Every guest host-context shares with this one
    global: NativeId,
}

/// 1x1 pbuffer and context made current when host objects must be touched
/// with nothing else current
pub struct HostEnsure {
    egl: Arc<dyn EglDriver>,
    pair: Mutex<Option<EnsurePair>>,
}

impl HostEnsure {
    pub fn new(egl: Arc<dyn EglDriver>) -> Arc<HostEnsure> {
        Arc::new(HostEnsure {
            egl,
            pair: Mutex::new(None),
        })
    }

    fn create_pair(&self) -> Option<EnsurePair> {
        let egl = &self.egl;
        let dpy = egl.display_open(NativeId::NONE)?;

        let configs = egl.config_enum(dpy);
        let cfg = match configs
            .iter()
            .find(|cfg| EglConfig::accepts(cfg))
            .or_else(|| configs.first())
        {
            Some(cfg) => *cfg,
            None => {
                log::error!("egl: host display offers no configs");
                egl.display_close(dpy);
                return None;
            }
        };

        let sfc = match egl.pbuffer_surface_create(dpy, &cfg, 1, 1, &PbufferAttribs::default()) {
            Some(sfc) => sfc,
            None => {
                log::error!("egl: cannot create ensure surface");
                egl.display_close(dpy);
                return None;
            }
        };

        let ctx = match egl.context_create(dpy, &cfg, None) {
            Some(ctx) => ctx,
            None => {
                log::error!("egl: cannot create ensure context");
                egl.pbuffer_surface_destroy(dpy, sfc);
                egl.display_close(dpy);
                return None;
            }
        };

        let global = match egl.context_create(dpy, &cfg, Some(ctx)) {
            Some(global) => global,
            None => {
                log::error!("egl: cannot create global context");
                egl.context_destroy(dpy, ctx);
                egl.pbuffer_surface_destroy(dpy, sfc);
                egl.display_close(dpy);
                return None;
            }
        };

        log::debug!("egl: ensure context {:?} created", ctx);

        Some(EnsurePair {
            dpy,
            sfc,
            ctx,
            global,
        })
    }

    fn pair(&self) -> Option<EnsurePair> {
        let mut pair = self.pair.lock();
        if pair.is_none() {
            *pair = self.create_pair();
        }
        *pair
    }

    /// Share context for guest host-contexts
    pub fn global_ctx(&self) -> Option<NativeId> {
        self.pair().map(|pair| pair.global)
    }
}

impl EnsureContext for HostEnsure {
    fn ensure_ctx(&self) -> bool {
        if self.egl.current_context().is_some() {
            return false;
        }
        match self.pair() {
            Some(pair) => self
                .egl
                .make_current(pair.dpy, Some(pair.sfc), Some(pair.sfc), Some(pair.ctx)),
            None => false,
        }
    }

    fn unensure_ctx(&self, switched: bool) {
        if !switched {
            return;
        }
        if let Some(pair) = *self.pair.lock() {
            if !self.egl.make_current(pair.dpy, None, None, None) {
                log::warn!("egl: cannot release ensure context");
            }
        }
    }
}

impl Drop for HostEnsure {
    fn drop(&mut self) {
        if let Some(pair) = self.pair.get_mut().take() {
            self.egl.context_destroy(pair.dpy, pair.global);
            self.egl.context_destroy(pair.dpy, pair.ctx);
            self.egl.pbuffer_surface_destroy(pair.dpy, pair.sfc);
            self.egl.display_close(pair.dpy);
        }
    }
}

/// Host EGL services of one guest process
pub struct HostEgl {
    pub egl: Arc<dyn EglDriver>,
    pub gles: Arc<dyn GlesDriver>,
    pub mem: Arc<dyn GuestMemory>,
    ensure: Arc<HostEnsure>,
}

impl HostEgl {
    pub fn new(drivers: &HostDrivers, mem: Arc<dyn GuestMemory>) -> HostEgl {
        HostEgl {
            egl: drivers.egl.clone(),
            gles: drivers.gles.clone(),
            mem,
            ensure: HostEnsure::new(drivers.egl.clone()),
        }
    }

    pub fn ensure(&self) -> Arc<dyn EnsureContext> {
        self.ensure.clone()
    }

    pub fn open_display(&self, display_id: u32) -> Option<NativeId> {
        self.egl.display_open(NativeId(display_id as u64))
    }

    pub fn close_display(&self, dpy: NativeId) {
        self.egl.display_close(dpy);
    }

    /// Host context in the global share group
    pub fn create_context(&self, dpy: NativeId, cfg: &NativeConfig) -> Option<NativeId> {
        self.egl.context_create(dpy, cfg, self.ensure.global_ctx())
    }

    pub fn destroy_context(&self, dpy: NativeId, ctx: NativeId) {
        self.egl.context_destroy(dpy, ctx);
    }

    pub fn create_pbuffer(
        &self,
        dpy: NativeId,
        cfg: &NativeConfig,
        width: u32,
        height: u32,
        attribs: &PbufferAttribs,
    ) -> Option<NativeId> {
        self.egl.pbuffer_surface_create(dpy, cfg, width, height, attribs)
    }

    pub fn make_current(&self, dpy: NativeId, ctx: NativeId, draw: NativeId, read: NativeId) -> bool {
        self.egl.make_current(dpy, Some(draw), Some(read), Some(ctx))
    }

    pub fn release_current(&self, dpy: NativeId) -> bool {
        self.egl.make_current(dpy, None, None, None)
    }
}
