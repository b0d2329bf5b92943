//! Contract between EGL and the GL client APIs
//!
//! EGL never looks inside a GLES context. It creates contexts through a
//! [`ClientInterface`] and drives them through [`ClientContext`].

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::object::{EnsureContext, Sharegroup};

/// Client API implemented by a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientApi {
    Gles1 = 1,
    Gles2 = 2,
}

impl ClientApi {
    /// From the `EGL_CONTEXT_CLIENT_VERSION` attribute value
    pub fn from_version(version: i32) -> Option<ClientApi> {
        match version {
            1 => Some(ClientApi::Gles1),
            2 => Some(ClientApi::Gles2),
            _ => None,
        }
    }
}

/// A GL context as seen by EGL
///
/// `activate` and `deactivate` are called in pairs around every period in
/// which the context is current on a thread. The first `activate` also
/// sizes the context from host limits. Dropping the context is its destroy.
pub trait ClientContext: Send {
    fn client_api(&self) -> ClientApi;

    fn sharegroup(&self) -> &Arc<Sharegroup>;

    fn activate(&mut self);

    fn deactivate(&mut self);

    fn flush(&mut self);

    fn finish(&mut self);

    /// Read the current draw surface into `pixels`, bottom row first in host
    /// order, top row first in `pixels`
    fn read_pixels(&mut self, width: u32, height: u32, bpp: u32, pixels: &mut [u8]) -> bool;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Context handle shared by the EGL wrapper and the current thread
pub type SharedClientContext = Arc<Mutex<Box<dyn ClientContext>>>;

/// Client side of an EGLImage: a host texture name other contexts can adopt
pub trait ClientImage: Send + Sync {
    fn tex_global_name(&self) -> u32;
}

/// Factory registered by every client API
pub trait ClientInterface: Send + Sync {
    fn client_api(&self) -> ClientApi;

    fn create_ctx(
        &self,
        sharegroup: Arc<Sharegroup>,
        ensure: Arc<dyn EnsureContext>,
    ) -> SharedClientContext;

    fn create_image(
        &self,
        tex_global_name: u32,
        ensure: Arc<dyn EnsureContext>,
    ) -> Arc<dyn ClientImage>;
}
