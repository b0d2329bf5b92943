//! Onscreen rendering
//!
//! Guest surfaces are bound to window-system ids the embedder composes
//! itself. The host surface bound at make-current is a 1x1 placeholder
//! pbuffer; presenting only has to get the GL commands to the host.

use std::sync::Arc;

use super::{BackendSurface, EglBackend, HostEgl};
use crate::client::ClientContext;
use crate::config::RenderType;
use crate::driver::{EglDriver, GlesDriver, NativeConfig, PbufferAttribs};
use crate::egl::surface::SurfaceKind;
use crate::types::{NativeId, WinsysId};

pub struct OnscreenBackend;

impl EglBackend for OnscreenBackend {
    fn render_type(&self) -> RenderType {
        RenderType::Onscreen
    }

    fn create_onscreen_surface(
        &self,
        host: &HostEgl,
        dpy: NativeId,
        cfg: &NativeConfig,
        kind: SurfaceKind,
        attribs: &PbufferAttribs,
        id: WinsysId,
    ) -> Option<Box<dyn BackendSurface>> {
        let attribs = match kind {
            SurfaceKind::Pbuffer => *attribs,
            SurfaceKind::Window | SurfaceKind::Pixmap => PbufferAttribs::default(),
        };
        let native = host.create_pbuffer(dpy, cfg, 1, 1, &attribs)?;

        log::debug!("egl: onscreen {:?} surface {:?} for winsys id {}", kind, native, id);

        Some(Box::new(OnscreenSurface {
            egl: host.egl.clone(),
            gles: host.gles.clone(),
            dpy,
            native,
            id,
        }))
    }
}

pub struct OnscreenSurface {
    egl: Arc<dyn EglDriver>,
    gles: Arc<dyn GlesDriver>,
    dpy: NativeId,
    native: NativeId,
    id: WinsysId,
}

impl BackendSurface for OnscreenSurface {
    fn native(&self) -> NativeId {
        self.native
    }

    fn width(&self) -> u32 {
        1
    }

    fn height(&self) -> u32 {
        1
    }

    fn swap_buffers(&mut self, _client: Option<&mut dyn ClientContext>) -> bool {
        self.gles.flush();
        true
    }

    fn copy_buffers(&mut self, _client: Option<&mut dyn ClientContext>) -> bool {
        self.gles.flush();
        true
    }

    fn wait_gl(&mut self) {
        self.gles.finish();
    }

    fn invalidate(&mut self, id: WinsysId) {
        if id == self.id {
            return;
        }
        log::debug!("egl: surface {:?} rebound from {} to {}", self.native, self.id, id);
        self.id = id;
    }
}

impl Drop for OnscreenSurface {
    fn drop(&mut self) {
        self.egl.pbuffer_surface_destroy(self.dpy, self.native);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{HeadlessDriver, HostCall, HostDrivers};
    use crate::testutil::SimMemory;

    #[test]
    fn test_onscreen_surface() {
        let driver = Arc::new(HeadlessDriver::new());
        let host = HostEgl::new(&HostDrivers::from_driver(driver.clone()), SimMemory::new());
        let dpy = host.open_display(0).unwrap();
        let cfg = driver.config_enum(dpy)[0];

        let mut sfc = OnscreenBackend
            .create_onscreen_surface(
                &host,
                dpy,
                &cfg,
                SurfaceKind::Window,
                &PbufferAttribs::default(),
                5,
            )
            .unwrap();
        assert!(OnscreenBackend
            .create_offscreen_surface(
                &host,
                dpy,
                &cfg,
                SurfaceKind::Window,
                &PbufferAttribs::default(),
                &super::super::OffscreenParams {
                    width: 1,
                    height: 1,
                    bpp: 4,
                    pixels: 0,
                },
            )
            .is_none());

        driver.clear_calls();
        assert!(sfc.swap_buffers(None));
        sfc.wait_gl();
        sfc.invalidate(6);
        assert_eq!(driver.take_calls(), vec![HostCall::Flush, HostCall::Finish]);

        drop(sfc);
        assert_eq!(driver.calls(), vec![HostCall::Call("eglDestroySurface")]);
    }
}
