//! Offscreen rendering
//!
//! Every guest surface is a host pbuffer of the same size. Swap and copy
//! read the host framebuffer back through the current client context and
//! push it into the guest's pixel memory with a compiled transfer.

use std::sync::Arc;

use super::{BackendSurface, EglBackend, HostEgl, OffscreenParams};
use crate::client::ClientContext;
use crate::config::RenderType;
use crate::driver::{EglDriver, NativeConfig, PbufferAttribs};
use crate::egl::surface::SurfaceKind;
use crate::mem::{staging_buffer, staging_len, CompiledTransfer};
use crate::types::NativeId;

pub struct OffscreenBackend;

impl EglBackend for OffscreenBackend {
    fn render_type(&self) -> RenderType {
        RenderType::Offscreen
    }

    fn create_offscreen_surface(
        &self,
        host: &HostEgl,
        dpy: NativeId,
        cfg: &NativeConfig,
        kind: SurfaceKind,
        attribs: &PbufferAttribs,
        params: &OffscreenParams,
    ) -> Option<Box<dyn BackendSurface>> {
        let surface = OffscreenSurface::new(host, dpy, cfg, kind, attribs, params)?;
        Some(Box::new(surface))
    }
}

pub struct OffscreenSurface {
    egl: Arc<dyn EglDriver>,
    dpy: NativeId,
    native: NativeId,
    width: u32,
    height: u32,
    bpp: u32,
    transfer: Option<CompiledTransfer>,
    host_pixels: Vec<u8>,
}

impl OffscreenSurface {
    pub fn new(
        host: &HostEgl,
        dpy: NativeId,
        cfg: &NativeConfig,
        kind: SurfaceKind,
        attribs: &PbufferAttribs,
        params: &OffscreenParams,
    ) -> Option<OffscreenSurface> {
        let attribs = match kind {
            SurfaceKind::Pbuffer => *attribs,
            SurfaceKind::Window | SurfaceKind::Pixmap => PbufferAttribs::default(),
        };

        let size = staging_len(params.width as usize, params.bpp as usize)
            .and_then(|row| staging_len(row, params.height as usize));
        let host_pixels = match size.and_then(staging_buffer) {
            Some(host_pixels) => host_pixels,
            None => {
                log::warn!(
                    "egl: offscreen surface {}x{}x{} is too large",
                    params.width,
                    params.height,
                    params.bpp
                );
                return None;
            }
        };
        let size = host_pixels.len();

        let transfer = match CompiledTransfer::new(host.mem.clone(), params.pixels, size, true) {
            Ok(transfer) => transfer,
            Err(err) => {
                log::warn!(
                    "egl: cannot bind {}x{}x{} pixels at 0x{:X}: {}",
                    params.width,
                    params.height,
                    params.bpp,
                    params.pixels,
                    err
                );
                return None;
            }
        };

        let native = host.create_pbuffer(dpy, cfg, params.width, params.height, &attribs)?;

        log::debug!(
            "egl: offscreen {:?} surface {:?} {}x{}x{}",
            kind,
            native,
            params.width,
            params.height,
            params.bpp
        );

        Some(OffscreenSurface {
            egl: host.egl.clone(),
            dpy,
            native,
            width: params.width,
            height: params.height,
            bpp: params.bpp,
            transfer: Some(transfer),
            host_pixels,
        })
    }

    fn push_pixels(&mut self, client: Option<&mut dyn ClientContext>) -> bool {
        let client = match client {
            Some(client) => client,
            None => {
                log::warn!("egl: pixel readback without a current context");
                return false;
            }
        };

        if !client.read_pixels(self.width, self.height, self.bpp, &mut self.host_pixels) {
            log::error!("egl: read_pixels failed");
            return false;
        }

        if let Some(transfer) = &self.transfer {
            transfer.exec(&mut self.host_pixels);
        }

        true
    }
}

impl BackendSurface for OffscreenSurface {
    fn native(&self) -> NativeId {
        self.native
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn swap_buffers(&mut self, client: Option<&mut dyn ClientContext>) -> bool {
        self.push_pixels(client)
    }

    fn copy_buffers(&mut self, client: Option<&mut dyn ClientContext>) -> bool {
        self.push_pixels(client)
    }

    fn wait_gl(&mut self) {}

    fn release_transfer(&mut self) {
        self.transfer = None;
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        self.egl.pbuffer_surface_destroy(self.dpy, self.native);
    }
}
