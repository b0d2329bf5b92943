//! EGL displays
//!
//! A display owns the configs, surfaces, contexts and images the guest
//! created on it. Terminating releases the display's references; objects
//! still current on some thread live until they are released there.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::backend::HostEgl;
use super::config::{EglConfig, RenderableType, Selection};
use super::consts::*;
use super::context::EglContext;
use super::image::EglImage;
use super::surface::EglSurface;
use crate::object::{gen_handle, Resource, ResourceList};
use crate::types::{HostHandle, NativeId};

pub struct EglDisplay {
    handle: HostHandle,
    display_id: u32,
    native: NativeId,
    host: Arc<HostEgl>,
    initialized: AtomicBool,
    pub configs: ResourceList<EglConfig>,
    pub surfaces: ResourceList<EglSurface>,
    pub contexts: ResourceList<EglContext>,
    pub images: ResourceList<EglImage>,
}

impl EglDisplay {
    /// Open the host display for guest display `display_id`
    pub fn new(host: &Arc<HostEgl>, display_id: u32) -> Option<Arc<EglDisplay>> {
        let native = host.open_display(display_id)?;

        log::debug!("egl: display {} opened as {:?}", display_id, native);

        Some(Arc::new(EglDisplay {
            handle: gen_handle(),
            display_id,
            native,
            host: host.clone(),
            initialized: AtomicBool::new(false),
            configs: ResourceList::new(),
            surfaces: ResourceList::new(),
            contexts: ResourceList::new(),
            images: ResourceList::new(),
        }))
    }

    pub fn display_id(&self) -> u32 {
        self.display_id
    }

    pub fn native(&self) -> NativeId {
        self.native
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Enumerate host configs on first use; `renderable` is what the
    /// process's client APIs can render
    pub fn initialize(&self, renderable: RenderableType) {
        if self.is_initialized() {
            return;
        }

        for native in self.host.egl.config_enum(self.native) {
            if EglConfig::accepts(&native) {
                self.configs.add(EglConfig::new(&native, renderable));
            }
        }

        log::debug!(
            "egl: display {} initialized with {} configs",
            self.display_id,
            self.configs.count()
        );

        self.initialized.store(true, Ordering::Release);
    }

    pub fn terminate(&self) {
        let configs = ResourceList::new();
        let surfaces = ResourceList::new();
        let contexts = ResourceList::new();
        let images = ResourceList::new();

        self.configs.move_to(&configs);
        self.surfaces.move_to(&surfaces);
        self.contexts.move_to(&contexts);
        self.images.move_to(&images);

        self.initialized.store(false, Ordering::Release);

        for surface in surfaces.to_vec() {
            surface.invalidate();
        }

        contexts.cleanup();
        surfaces.cleanup();
        images.cleanup();
        configs.cleanup();
    }

    /// Every config in EGL sort order
    pub fn configs(&self) -> Vec<Arc<EglConfig>> {
        let mut configs = self.configs.to_vec();
        configs.sort_by(|a, b| a.sort_order(b));
        configs
    }

    pub fn config_by_id(&self, config_id: EGLint) -> Option<Arc<EglConfig>> {
        self.configs
            .to_vec()
            .into_iter()
            .find(|config| config.config_id() == config_id)
    }

    /// Configs matching `selection` in EGL sort order; an unknown
    /// `EGL_CONFIG_ID` is `EGL_BAD_ATTRIBUTE`
    pub fn choose_configs(&self, selection: &Selection) -> Result<Vec<Arc<EglConfig>>, EGLint> {
        match selection {
            Selection::ById(config_id) => self
                .config_by_id(*config_id)
                .map(|config| vec![config])
                .ok_or(EGL_BAD_ATTRIBUTE),
            Selection::Match(template) => Ok(self
                .configs()
                .into_iter()
                .filter(|config| config.is_chosen_by(template))
                .collect()),
        }
    }
}

impl Resource for EglDisplay {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

impl Drop for EglDisplay {
    fn drop(&mut self) {
        self.terminate();
        self.host.close_display(self.native);
    }
}
