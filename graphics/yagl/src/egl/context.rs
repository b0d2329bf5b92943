//! EGL contexts
//!
//! An EGL context pairs a client GL context with a host context in the
//! global share group. The client context is dropped before the host
//! context so its host names are deleted while the share group is alive.

use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::HostEgl;
use super::config::EglConfig;
use super::surface::EglSurface;
use crate::client::{ClientApi, SharedClientContext};
use crate::object::{gen_handle, Resource, Sharegroup};
use crate::types::{HostHandle, NativeId};

/// Host context, destroyed on drop
struct HostContext {
    host: Arc<HostEgl>,
    dpy: NativeId,
    native: NativeId,
}

impl Drop for HostContext {
    fn drop(&mut self) {
        self.host.destroy_context(self.dpy, self.native);
    }
}

/// Surfaces bound while the context is current
#[derive(Clone, Default)]
pub struct BoundSurfaces {
    pub draw: Option<Arc<EglSurface>>,
    pub read: Option<Arc<EglSurface>>,
}

pub struct EglContext {
    handle: HostHandle,
    display: HostHandle,
    config: Arc<EglConfig>,
    client_api: ClientApi,
    client: SharedClientContext,
    surfaces: Mutex<BoundSurfaces>,
    // Must stay the last field
    host_ctx: HostContext,
}

impl EglContext {
    /// Wrap `client` with a new host context on `dpy`, `None` if the host
    /// refuses one
    pub fn new(
        host: &Arc<HostEgl>,
        display: HostHandle,
        dpy: NativeId,
        config: Arc<EglConfig>,
        client: SharedClientContext,
    ) -> Option<Arc<EglContext>> {
        let native = host.create_context(dpy, config.native())?;
        let client_api = client.lock().client_api();

        log::debug!("egl: context {:?} created for {:?}", native, client_api);

        Some(Arc::new(EglContext {
            handle: gen_handle(),
            display,
            config,
            client_api,
            client,
            surfaces: Mutex::new(BoundSurfaces::default()),
            host_ctx: HostContext {
                host: host.clone(),
                dpy,
                native,
            },
        }))
    }

    /// Handle of the owning display
    pub fn display(&self) -> HostHandle {
        self.display
    }

    pub fn native_dpy(&self) -> NativeId {
        self.host_ctx.dpy
    }

    pub fn native(&self) -> NativeId {
        self.host_ctx.native
    }

    pub fn config(&self) -> &Arc<EglConfig> {
        &self.config
    }

    pub fn client_api(&self) -> ClientApi {
        self.client_api
    }

    pub fn client(&self) -> &SharedClientContext {
        &self.client
    }

    pub fn sharegroup(&self) -> Arc<Sharegroup> {
        self.client.lock().sharegroup().clone()
    }

    pub fn surfaces(&self) -> BoundSurfaces {
        self.surfaces.lock().clone()
    }

    pub fn draw(&self) -> Option<Arc<EglSurface>> {
        self.surfaces.lock().draw.clone()
    }

    pub fn set_surfaces(&self, draw: Arc<EglSurface>, read: Arc<EglSurface>) {
        *self.surfaces.lock() = BoundSurfaces {
            draw: Some(draw),
            read: Some(read),
        };
    }

    pub fn clear_surfaces(&self) {
        let released = core::mem::take(&mut *self.surfaces.lock());
        drop(released);
    }
}

impl Resource for EglContext {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}
