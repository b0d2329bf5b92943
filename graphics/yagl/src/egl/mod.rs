//! EGL 1.4
//!
//! Displays, configs, surfaces, contexts and images of one guest process.
//! Surfaces are backed according to the configured render type; contexts
//! wrap client GL contexts created through the registered client APIs.

pub mod backend;
pub mod calls;
pub mod config;
pub mod consts;
pub mod context;
pub mod display;
pub mod image;
pub mod surface;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::{Api, ApiId, ApiPs, ApiTs, EglInterface, ProcessEnv, ThreadContext};
use crate::client::{ClientApi, ClientImage};
use crate::object::Resource;
use crate::types::HostHandle;

use backend::{EglBackend, HostEgl};
use calls::EglTs;
use config::RenderableType;
use consts::*;
use display::EglDisplay;

pub use context::EglContext;
pub use surface::{EglSurface, SurfaceKind};

/// (attribute, value) pairs of an `EGL_NONE` terminated list
pub(crate) fn attrib_pairs(list: &[EGLint]) -> impl Iterator<Item = (EGLint, EGLint)> + '_ {
    list.chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .take_while(|&(attrib, _)| attrib != EGL_NONE)
}

pub struct EglApi;

impl Api for EglApi {
    fn id(&self) -> ApiId {
        ApiId::Egl
    }

    fn process_init(&self, env: &Arc<ProcessEnv>) -> Arc<dyn ApiPs> {
        let ps = Arc::new(EglPs {
            env: env.clone(),
            host: Arc::new(HostEgl::new(&env.drivers, env.mem.clone())),
            backend: backend::for_render_type(env.config.render_type),
            displays: Mutex::new(Vec::new()),
        });
        env.register_egl(ps.clone());
        log::debug!(
            "egl: process {} initialized, {:?} rendering",
            env.pid,
            ps.backend.render_type()
        );
        ps
    }
}

pub struct EglPs {
    env: Arc<ProcessEnv>,
    host: Arc<HostEgl>,
    backend: Box<dyn EglBackend>,
    displays: Mutex<Vec<Arc<EglDisplay>>>,
}

impl EglPs {
    pub fn env(&self) -> &Arc<ProcessEnv> {
        &self.env
    }

    pub fn host(&self) -> &Arc<HostEgl> {
        &self.host
    }

    pub fn backend(&self) -> &dyn EglBackend {
        self.backend.as_ref()
    }

    /// Display for guest display `display_id`, opened on first request
    pub fn get_display(&self, display_id: u32) -> Option<Arc<EglDisplay>> {
        let mut displays = self.displays.lock();
        if let Some(dpy) = displays.iter().find(|dpy| dpy.display_id() == display_id) {
            return Some(dpy.clone());
        }
        let dpy = EglDisplay::new(&self.host, display_id)?;
        displays.push(dpy.clone());
        Some(dpy)
    }

    pub fn acquire_display(&self, handle: HostHandle) -> Option<Arc<EglDisplay>> {
        self.displays
            .lock()
            .iter()
            .find(|dpy| dpy.handle() == handle)
            .cloned()
    }

    /// What configs can render given the client APIs of the process
    pub fn renderable_type(&self) -> RenderableType {
        let mut renderable = RenderableType::empty();
        if self.env.client_iface(ClientApi::Gles1).is_some() {
            renderable |= RenderableType::OPENGL_ES;
        }
        if self.env.client_iface(ClientApi::Gles2).is_some() {
            renderable |= RenderableType::OPENGL_ES2;
        }
        renderable
    }
}

impl EglInterface for EglPs {
    fn get_image(&self, handle: HostHandle) -> Option<Arc<dyn ClientImage>> {
        let displays = self.displays.lock().clone();
        displays
            .iter()
            .find_map(|dpy| dpy.images.acquire(handle))
            .map(|image| image.client_image().clone())
    }
}

impl ApiPs for EglPs {
    fn id(&self) -> ApiId {
        ApiId::Egl
    }

    fn thread_init(self: Arc<Self>, tc: &mut ThreadContext) -> Box<dyn ApiTs> {
        log::debug!("egl: thread {}/{} initialized", tc.pid, tc.tid);
        Box::new(EglTs::new(self))
    }

    fn fini(&self) {
        let displays = core::mem::take(&mut *self.displays.lock());
        for dpy in &displays {
            dpy.terminate();
        }
        drop(displays);
        self.env.clear_egl();
        log::debug!("egl: process {} finished", self.env.pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrib_pairs() {
        let pairs: Vec<_> = attrib_pairs(&[EGL_RED_SIZE, 8, EGL_DEPTH_SIZE, 24, EGL_NONE, EGL_ALPHA_SIZE, 8]).collect();
        assert_eq!(pairs, vec![(EGL_RED_SIZE, 8), (EGL_DEPTH_SIZE, 24)]);

        assert_eq!(attrib_pairs(&[EGL_NONE]).count(), 0);
        assert_eq!(attrib_pairs(&[]).count(), 0);
        // Attribute without a value
        assert_eq!(attrib_pairs(&[EGL_RED_SIZE, 8, EGL_BLUE_SIZE]).count(), 1);
    }
}
