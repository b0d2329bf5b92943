//! Renderbuffer objects

use std::any::Any;
use std::sync::Arc;

use crate::driver::GlesDriver;
use crate::gl::GLuint;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};

pub struct GlesRenderbuffer {
    header: ObjectHeader,
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    global_name: GLuint,
}

impl GlesRenderbuffer {
    pub fn new(driver: Arc<dyn GlesDriver>, ensure: Arc<dyn EnsureContext>) -> Arc<GlesRenderbuffer> {
        let global_name = driver.gen_renderbuffers(1).first().copied().unwrap_or(0);
        Arc::new(GlesRenderbuffer {
            header: ObjectHeader::new(),
            driver,
            ensure,
            global_name,
        })
    }

    pub fn global_name(&self) -> GLuint {
        self.global_name
    }
}

impl Object for GlesRenderbuffer {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesRenderbuffer {
    fn drop(&mut self) {
        if self.header.nodelete() || self.global_name == 0 {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_renderbuffers(&[self.global_name]);
    }
}
