//! State and calls GLES1 and GLES2 share
//!
//! Guest object names are resolved through the context's sharegroup to
//! host names. Vertex arrays are pulled from guest memory at draw time, and
//! errors are latched locally so `glGetError` reports the guest's view.

pub mod array;
pub mod buffer;
pub mod calls;
pub mod context;
pub mod framebuffer;
pub mod image;
pub mod renderbuffer;
pub mod texture;
pub mod validate;

pub use array::{ArrayConversion, GlesArray};
pub use buffer::GlesBuffer;
pub use context::{GlesClient, GlesContext};
pub use framebuffer::GlesFramebuffer;
pub use image::GlesImage;
pub use renderbuffer::GlesRenderbuffer;
pub use texture::GlesTexture;
