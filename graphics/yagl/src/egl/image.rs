//! EGLImages
//!
//! An image is a host texture created on behalf of a guest window-system
//! buffer. With offscreen rendering the guest uploads the buffer contents
//! explicitly; GL clients adopt the texture through the client image.

use std::sync::Arc;

use super::backend::HostEgl;
use crate::client::{ClientImage, ClientInterface};
use crate::gl::*;
use crate::object::{gen_handle, EnsureGuard, Resource};
use crate::types::{HostHandle, WinsysId};

pub struct EglImage {
    handle: HostHandle,
    buffer: WinsysId,
    host: Arc<HostEgl>,
    client_image: Arc<dyn ClientImage>,
}

impl EglImage {
    pub fn new(host: &Arc<HostEgl>, iface: &dyn ClientInterface, buffer: WinsysId) -> Option<Arc<EglImage>> {
        let ensure = host.ensure();
        let name = {
            let _guard = EnsureGuard::new(ensure.as_ref());
            host.gles.gen_textures(1).first().copied().unwrap_or(0)
        };
        if name == 0 {
            log::error!("egl: cannot create image texture");
            return None;
        }

        let client_image = iface.create_image(name, ensure);

        log::debug!("egl: image for buffer {} uses texture {}", buffer, name);

        Some(Arc::new(EglImage {
            handle: gen_handle(),
            buffer,
            host: host.clone(),
            client_image,
        }))
    }

    /// Window-system buffer the image was created for
    pub fn buffer(&self) -> WinsysId {
        self.buffer
    }

    pub fn client_image(&self) -> &Arc<dyn ClientImage> {
        &self.client_image
    }

    /// Replace the texture contents with guest pixels, top row first
    pub fn update_offscreen(&self, width: u32, height: u32, bpp: u32, pixels: &[u8]) -> bool {
        let (internalformat, format) = match bpp {
            3 => (GL_RGB, GL_RGB),
            4 => (GL_RGBA, GL_BGRA),
            _ => {
                log::warn!("egl: image update with bpp {}", bpp);
                return false;
            }
        };

        let gles = &self.host.gles;
        let ensure = self.host.ensure();
        let _guard = EnsureGuard::new(ensure.as_ref());

        let mut current = [0 as GLint];
        gles.get_integerv(GL_TEXTURE_BINDING_2D, &mut current);

        gles.bind_texture(GL_TEXTURE_2D, self.client_image.tex_global_name());
        gles.tex_image_2d(
            GL_TEXTURE_2D,
            0,
            internalformat as GLint,
            width as GLsizei,
            height as GLsizei,
            0,
            format,
            GL_UNSIGNED_BYTE,
            Some(pixels),
        );
        gles.bind_texture(GL_TEXTURE_2D, current[0] as GLuint);

        true
    }
}

impl Resource for EglImage {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Api, ProcessEnv};
    use crate::client::ClientApi;
    use crate::config::YaglConfig;
    use crate::driver::{HeadlessDriver, HostCall, HostDrivers};
    use crate::gles2::Gles2Api;
    use crate::testutil::SimMemory;

    #[test]
    fn test_update_offscreen() {
        let driver = Arc::new(HeadlessDriver::new());
        let drivers = HostDrivers::from_driver(driver.clone());
        let sim = SimMemory::new();
        let host = Arc::new(HostEgl::new(&drivers, sim.clone()));
        let env = Arc::new(ProcessEnv::new(1, Arc::new(YaglConfig::default()), drivers, sim));
        let _ps = Gles2Api.process_init(&env);
        let iface = env.client_iface(ClientApi::Gles2).unwrap();

        let image = EglImage::new(&host, iface.as_ref(), 12).unwrap();
        let name = image.client_image().tex_global_name();
        assert_ne!(name, 0);
        assert_eq!(image.buffer(), 12);
        let textures = driver.num_textures();

        assert!(!image.update_offscreen(1, 1, 2, &[0, 0]));

        driver.clear_calls();
        assert!(image.update_offscreen(1, 2, 4, &[1, 2, 3, 4, 5, 6, 7, 8]));
        let uploads: Vec<_> = driver
            .calls()
            .into_iter()
            .filter(|call| matches!(call, HostCall::TexImage2D { .. }))
            .collect();
        assert_eq!(
            uploads,
            vec![HostCall::TexImage2D {
                target: GL_TEXTURE_2D,
                level: 0,
                internalformat: GL_RGBA as GLint,
                width: 1,
                height: 2,
                format: GL_BGRA,
                type_: GL_UNSIGNED_BYTE,
                data: Some(vec![1, 2, 3, 4, 5, 6, 7, 8]),
            }]
        );
        assert_eq!(driver.binding(GL_TEXTURE_2D), 0);

        drop(image);
        assert_eq!(driver.num_textures(), textures - 1);
    }
}
