//! Client side of EGLImages

use std::sync::Arc;

use crate::client::ClientImage;
use crate::driver::GlesDriver;
use crate::gl::GLuint;
use crate::object::{EnsureContext, EnsureGuard};

/// Host texture shared between an EGLImage and the textures targeting it.
/// The texture is deleted with the last reference.
pub struct GlesImage {
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    tex_global_name: GLuint,
}

impl GlesImage {
    pub fn new(
        driver: Arc<dyn GlesDriver>,
        tex_global_name: GLuint,
        ensure: Arc<dyn EnsureContext>,
    ) -> Arc<GlesImage> {
        Arc::new(GlesImage {
            driver,
            ensure,
            tex_global_name,
        })
    }
}

impl ClientImage for GlesImage {
    fn tex_global_name(&self) -> u32 {
        self.tex_global_name
    }
}

impl Drop for GlesImage {
    fn drop(&mut self) {
        if self.tex_global_name == 0 {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_textures(&[self.tex_global_name]);
    }
}
