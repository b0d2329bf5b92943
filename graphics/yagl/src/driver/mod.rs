//! Host GL/EGL driver interfaces
//!
//! Everything YaGL does to the host graphics stack goes through these
//! traits. The embedding device model supplies an implementation bound to a
//! real host EGL/GL; the built-in [`HeadlessDriver`] records calls instead
//! and emulates just enough state (names, bindings, limits) for the object
//! model to run.

mod egl;
mod gles;
mod headless;

use std::sync::Arc;

pub use egl::{EglDriver, NativeConfig, PbufferAttribs};
pub use gles::{ActiveVariable, Gles1Driver, Gles2Driver, GlesDriver, VertexData};
pub use headless::{HeadlessDriver, HostCall, PointerData};

use crate::config::HostBackend;

/// Driver tables handed to the server at construction
#[derive(Clone)]
pub struct HostDrivers {
    pub egl: Arc<dyn EglDriver>,
    pub gles: Arc<dyn GlesDriver>,
    pub gles1: Arc<dyn Gles1Driver>,
    pub gles2: Arc<dyn Gles2Driver>,
}

impl HostDrivers {
    /// Bind every table to one driver object
    pub fn from_driver<D>(driver: Arc<D>) -> Self
    where
        D: EglDriver + GlesDriver + Gles1Driver + Gles2Driver + 'static,
    {
        Self {
            egl: driver.clone(),
            gles: driver.clone(),
            gles1: driver.clone(),
            gles2: driver,
        }
    }

    /// Drivers backed by a fresh [`HeadlessDriver`]
    pub fn headless() -> Self {
        Self::from_driver(Arc::new(HeadlessDriver::new()))
    }

    /// Drivers for a configured backend
    pub fn for_backend(backend: HostBackend) -> Self {
        match backend {
            HostBackend::Headless => Self::headless(),
        }
    }
}

impl core::fmt::Debug for HostDrivers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostDrivers").finish_non_exhaustive()
    }
}
