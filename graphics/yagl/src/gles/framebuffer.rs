//! Framebuffer objects
//!
//! Attachments are remembered by local name so the guest can query them.
//! Host GL generally has no standalone stencil buffers, so stencil
//! attachments are recorded but never forwarded.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use super::renderbuffer::GlesRenderbuffer;
use super::texture::GlesTexture;
use super::validate::{squash_texture_target, FramebufferAttachment, NUM_FRAMEBUFFER_ATTACHMENTS};
use crate::driver::GlesDriver;
use crate::gl::*;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};
use crate::types::ObjectName;

/// What is attached at one attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentState {
    /// `GL_NONE`, `GL_TEXTURE` or `GL_RENDERBUFFER`
    pub type_: GLenum,
    pub local_name: ObjectName,
}

impl Default for AttachmentState {
    fn default() -> Self {
        Self {
            type_: GL_NONE,
            local_name: 0,
        }
    }
}

pub struct GlesFramebuffer {
    header: ObjectHeader,
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    global_name: GLuint,
    attachments: Mutex<[AttachmentState; NUM_FRAMEBUFFER_ATTACHMENTS]>,
}

impl GlesFramebuffer {
    pub fn new(driver: Arc<dyn GlesDriver>, ensure: Arc<dyn EnsureContext>) -> Arc<GlesFramebuffer> {
        let global_name = driver.gen_framebuffers(1).first().copied().unwrap_or(0);
        Arc::new(GlesFramebuffer {
            header: ObjectHeader::new(),
            driver,
            ensure,
            global_name,
            attachments: Mutex::new(Default::default()),
        })
    }

    pub fn global_name(&self) -> GLuint {
        self.global_name
    }

    pub fn attachment(&self, attachment: FramebufferAttachment) -> AttachmentState {
        self.attachments.lock()[attachment as usize]
    }

    /// `glFramebufferRenderbuffer`; false on an invalid attachment or
    /// renderbuffer target
    pub fn renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: Option<(&GlesRenderbuffer, ObjectName)>,
    ) -> bool {
        let slot = match FramebufferAttachment::from_gl(attachment) {
            Some(slot) => slot,
            None => return false,
        };
        if renderbuffer.is_some() && renderbuffer_target != GL_RENDERBUFFER {
            return false;
        }

        let mut attachments = self.attachments.lock();
        attachments[slot as usize] = match renderbuffer {
            Some((_, local_name)) => AttachmentState {
                type_: GL_RENDERBUFFER,
                local_name,
            },
            None => AttachmentState::default(),
        };

        if slot != FramebufferAttachment::Stencil {
            self.driver.framebuffer_renderbuffer(
                target,
                attachment,
                renderbuffer_target,
                renderbuffer.map_or(0, |(rb, _)| rb.global_name()),
            );
        }
        true
    }

    /// `glFramebufferTexture2D`; only level 0 of a texture bound to the
    /// matching target can be attached
    pub fn texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        level: GLint,
        texture: Option<(&GlesTexture, ObjectName)>,
    ) -> bool {
        let slot = match FramebufferAttachment::from_gl(attachment) {
            Some(slot) => slot,
            None => return false,
        };

        if let Some((texture, _)) = texture {
            if level != 0 {
                return false;
            }
            if squash_texture_target(textarget) != Some(texture.target()) {
                return false;
            }
        }

        let mut attachments = self.attachments.lock();
        attachments[slot as usize] = match texture {
            Some((_, local_name)) => AttachmentState {
                type_: GL_TEXTURE,
                local_name,
            },
            None => AttachmentState::default(),
        };

        if slot != FramebufferAttachment::Stencil {
            self.driver.framebuffer_texture_2d(
                target,
                attachment,
                textarget,
                texture.map_or(0, |(tex, _)| tex.global_name()),
                level,
            );
        }
        true
    }
}

impl Object for GlesFramebuffer {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesFramebuffer {
    fn drop(&mut self) {
        if self.header.nodelete() || self.global_name == 0 {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_framebuffers(&[self.global_name]);
    }
}
