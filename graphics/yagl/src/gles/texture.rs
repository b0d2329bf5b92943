//! Texture objects and texture units

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use super::validate::{TextureTarget, NUM_TEXTURE_TARGETS};
use crate::client::ClientImage;
use crate::driver::GlesDriver;
use crate::gl::*;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};
use crate::types::ObjectName;

struct TextureState {
    /// 0 until the first bind
    target: GLenum,
    /// Set while the texture is an EGLImage sibling
    image: Option<Arc<dyn ClientImage>>,
}

pub struct GlesTexture {
    header: ObjectHeader,
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    global_name: GLuint,
    state: Mutex<TextureState>,
}

impl GlesTexture {
    pub fn new(driver: Arc<dyn GlesDriver>, ensure: Arc<dyn EnsureContext>) -> Arc<GlesTexture> {
        let global_name = driver.gen_textures(1).first().copied().unwrap_or(0);
        Arc::new(GlesTexture {
            header: ObjectHeader::new(),
            driver,
            ensure,
            global_name,
            state: Mutex::new(TextureState {
                target: 0,
                image: None,
            }),
        })
    }

    /// Host name currently standing for this texture
    pub fn global_name(&self) -> GLuint {
        match &self.state.lock().image {
            Some(image) => image.tex_global_name(),
            None => self.global_name,
        }
    }

    pub fn target(&self) -> GLenum {
        self.state.lock().target
    }

    /// `glBindTexture`; a texture keeps the target of its first bind
    pub fn bind(&self, target: GLenum) -> bool {
        let mut state = self.state.lock();
        if state.target != 0 && state.target != target {
            return false;
        }
        state.target = target;
        let name = match &state.image {
            Some(image) => image.tex_global_name(),
            None => self.global_name,
        };
        drop(state);

        self.driver.bind_texture(target, name);
        true
    }

    /// Make the texture a sibling of `image` and bind the image's host
    /// texture to `target`
    pub fn set_image(&self, target: GLenum, image: Arc<dyn ClientImage>) {
        let name = image.tex_global_name();
        self.state.lock().image = Some(image);
        self.driver.bind_texture(target, name);
    }

    /// Respecifying storage detaches the texture from its image
    pub fn unset_image(&self, target: GLenum) {
        let mut state = self.state.lock();
        if state.image.take().is_some() {
            drop(state);
            self.driver.bind_texture(target, self.global_name);
        }
    }

    pub fn has_image(&self) -> bool {
        self.state.lock().image.is_some()
    }
}

impl Object for GlesTexture {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesTexture {
    fn drop(&mut self) {
        if self.header.nodelete() || self.global_name == 0 {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_textures(&[self.global_name]);
    }
}

/// Per-unit texture bindings, by local name
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnit {
    bindings: [ObjectName; NUM_TEXTURE_TARGETS],
    /// `GL_TEXTURE_2D` enabled on this unit (GLES1)
    pub enabled_2d: bool,
}

impl TextureUnit {
    pub fn binding(&self, target: TextureTarget) -> ObjectName {
        self.bindings[target as usize]
    }

    pub fn bind(&mut self, target: TextureTarget, local_name: ObjectName) {
        self.bindings[target as usize] = local_name;
    }

    /// Reset every binding of `local_name` to 0
    pub fn unbind(&mut self, local_name: ObjectName) {
        for binding in self.bindings.iter_mut() {
            if *binding == local_name {
                *binding = 0;
            }
        }
    }
}
