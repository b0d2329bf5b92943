//! EGL surfaces

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::backend::BackendSurface;
use super::config::EglConfig;
use super::consts::*;
use crate::driver::PbufferAttribs;
use crate::object::{gen_handle, Resource};
use crate::types::{HostHandle, NativeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Window,
    Pixmap,
    Pbuffer,
}

impl SurfaceKind {
    /// `EGL_RENDER_BUFFER` of a surface of this kind
    pub fn render_buffer(self) -> EGLint {
        match self {
            SurfaceKind::Pixmap => EGL_SINGLE_BUFFER,
            SurfaceKind::Window | SurfaceKind::Pbuffer => EGL_BACK_BUFFER,
        }
    }
}

/// Creation attributes of a `kind` surface from a guest attribute list
pub fn parse_attribs(kind: SurfaceKind, list: &[EGLint]) -> Result<PbufferAttribs, EGLint> {
    let mut attribs = PbufferAttribs {
        largest: false,
        tex_format: EGL_NO_TEXTURE,
        tex_target: EGL_NO_TEXTURE,
        tex_mipmap: false,
    };

    for (attrib, value) in super::attrib_pairs(list) {
        match (kind, attrib) {
            (_, EGL_VG_COLORSPACE | EGL_VG_ALPHA_FORMAT) => {}
            (SurfaceKind::Window, EGL_RENDER_BUFFER) => {}
            (SurfaceKind::Pbuffer, EGL_WIDTH | EGL_HEIGHT) => {}
            (SurfaceKind::Pbuffer, EGL_LARGEST_PBUFFER) => attribs.largest = value != 0,
            (SurfaceKind::Pbuffer, EGL_TEXTURE_FORMAT) => match value {
                EGL_NO_TEXTURE | EGL_TEXTURE_RGB | EGL_TEXTURE_RGBA => attribs.tex_format = value,
                _ => return Err(EGL_BAD_ATTRIBUTE),
            },
            (SurfaceKind::Pbuffer, EGL_TEXTURE_TARGET) => match value {
                EGL_NO_TEXTURE | EGL_TEXTURE_2D => attribs.tex_target = value,
                _ => return Err(EGL_BAD_ATTRIBUTE),
            },
            (SurfaceKind::Pbuffer, EGL_MIPMAP_TEXTURE) => attribs.tex_mipmap = value != 0,
            _ => {
                log::warn!("egl: {:?} surface attribute 0x{:X}", kind, attrib);
                return Err(EGL_BAD_ATTRIBUTE);
            }
        }
    }

    Ok(attribs)
}

/// Outcome of `eglQuerySurface` for one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceQuery {
    Value(EGLint),
    /// Valid attribute without meaning for this surface kind, nothing written
    NotApplicable,
    BadAttribute,
}

pub struct EglSurface {
    handle: HostHandle,
    config: Arc<EglConfig>,
    kind: SurfaceKind,
    attribs: PbufferAttribs,
    backend: Mutex<Box<dyn BackendSurface>>,
}

impl EglSurface {
    pub fn new(
        config: Arc<EglConfig>,
        kind: SurfaceKind,
        attribs: PbufferAttribs,
        backend: Box<dyn BackendSurface>,
    ) -> Arc<EglSurface> {
        Arc::new(EglSurface {
            handle: gen_handle(),
            config,
            kind,
            attribs,
            backend: Mutex::new(backend),
        })
    }

    pub fn config(&self) -> &Arc<EglConfig> {
        &self.config
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn attribs(&self) -> &PbufferAttribs {
        &self.attribs
    }

    pub fn native(&self) -> NativeId {
        self.backend.lock().native()
    }

    /// The backend surface; held across swap and copy so a concurrent
    /// destroy waits for them
    pub fn backend(&self) -> MutexGuard<'_, Box<dyn BackendSurface>> {
        self.backend.lock()
    }

    /// Install `with` and hand back the previous backend surface
    pub fn replace_backend(&self, with: Box<dyn BackendSurface>) -> Box<dyn BackendSurface> {
        core::mem::replace(&mut *self.backend.lock(), with)
    }

    /// Stop writing guest pixel memory, the guest is destroying the surface
    pub fn invalidate(&self) {
        self.backend.lock().release_transfer();
    }

    pub fn query(&self, attrib: EGLint) -> SurfaceQuery {
        let is_pbuffer = self.kind == SurfaceKind::Pbuffer;
        let pbuffer_only = |value: EGLint| {
            if is_pbuffer {
                SurfaceQuery::Value(value)
            } else {
                SurfaceQuery::NotApplicable
            }
        };

        match attrib {
            EGL_CONFIG_ID => SurfaceQuery::Value(self.config.config_id()),
            EGL_LARGEST_PBUFFER => pbuffer_only(self.attribs.largest as EGLint),
            EGL_TEXTURE_FORMAT => pbuffer_only(self.attribs.tex_format),
            EGL_TEXTURE_TARGET => pbuffer_only(self.attribs.tex_target),
            EGL_MIPMAP_TEXTURE => pbuffer_only(self.attribs.tex_mipmap as EGLint),
            EGL_MIPMAP_LEVEL => pbuffer_only(0),
            EGL_RENDER_BUFFER => SurfaceQuery::Value(self.kind.render_buffer()),
            EGL_HORIZONTAL_RESOLUTION | EGL_VERTICAL_RESOLUTION | EGL_PIXEL_ASPECT_RATIO => {
                SurfaceQuery::Value(EGL_UNKNOWN)
            }
            EGL_SWAP_BEHAVIOR => SurfaceQuery::Value(EGL_BUFFER_PRESERVED),
            EGL_MULTISAMPLE_RESOLVE => SurfaceQuery::Value(EGL_MULTISAMPLE_RESOLVE_DEFAULT),
            EGL_WIDTH => SurfaceQuery::Value(self.backend.lock().width() as EGLint),
            EGL_HEIGHT => SurfaceQuery::Value(self.backend.lock().height() as EGLint),
            _ => SurfaceQuery::BadAttribute,
        }
    }
}

impl Resource for EglSurface {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientContext;
    use crate::driver::NativeConfig;
    use crate::egl::config::RenderableType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSurface {
        native: NativeId,
        size: (u32, u32),
        released: Arc<AtomicUsize>,
    }

    impl BackendSurface for FakeSurface {
        fn native(&self) -> NativeId {
            self.native
        }

        fn width(&self) -> u32 {
            self.size.0
        }

        fn height(&self) -> u32 {
            self.size.1
        }

        fn swap_buffers(&mut self, _client: Option<&mut dyn ClientContext>) -> bool {
            true
        }

        fn copy_buffers(&mut self, _client: Option<&mut dyn ClientContext>) -> bool {
            true
        }

        fn wait_gl(&mut self) {}

        fn release_transfer(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn surface(kind: SurfaceKind, attribs: PbufferAttribs) -> (Arc<EglSurface>, Arc<AtomicUsize>) {
        let config = EglConfig::new(
            &NativeConfig {
                config_id: 9,
                ..NativeConfig::default()
            },
            RenderableType::OPENGL_ES2,
        );
        let released = Arc::new(AtomicUsize::new(0));
        let backend = Box::new(FakeSurface {
            native: NativeId(3),
            size: (640, 480),
            released: released.clone(),
        });
        (EglSurface::new(config, kind, attribs, backend), released)
    }

    #[test]
    fn test_query() {
        let (window, _) = surface(SurfaceKind::Window, PbufferAttribs::default());
        assert_eq!(window.query(EGL_CONFIG_ID), SurfaceQuery::Value(9));
        assert_eq!(window.query(EGL_WIDTH), SurfaceQuery::Value(640));
        assert_eq!(window.query(EGL_HEIGHT), SurfaceQuery::Value(480));
        assert_eq!(window.query(EGL_RENDER_BUFFER), SurfaceQuery::Value(EGL_BACK_BUFFER));
        assert_eq!(window.query(EGL_TEXTURE_FORMAT), SurfaceQuery::NotApplicable);
        assert_eq!(window.query(EGL_SWAP_BEHAVIOR), SurfaceQuery::Value(EGL_BUFFER_PRESERVED));
        assert_eq!(window.query(EGL_BUFFER_SIZE), SurfaceQuery::BadAttribute);

        let (pbuffer, _) = surface(
            SurfaceKind::Pbuffer,
            PbufferAttribs {
                largest: true,
                tex_format: EGL_TEXTURE_RGBA,
                tex_target: EGL_TEXTURE_2D,
                tex_mipmap: false,
            },
        );
        assert_eq!(pbuffer.query(EGL_LARGEST_PBUFFER), SurfaceQuery::Value(1));
        assert_eq!(pbuffer.query(EGL_TEXTURE_FORMAT), SurfaceQuery::Value(EGL_TEXTURE_RGBA));
        assert_eq!(pbuffer.query(EGL_MIPMAP_LEVEL), SurfaceQuery::Value(0));

        let (pixmap, _) = surface(SurfaceKind::Pixmap, PbufferAttribs::default());
        assert_eq!(pixmap.query(EGL_RENDER_BUFFER), SurfaceQuery::Value(EGL_SINGLE_BUFFER));
    }

    #[test]
    fn test_parse_attribs() {
        let window = parse_attribs(SurfaceKind::Window, &[EGL_RENDER_BUFFER, EGL_BACK_BUFFER, EGL_NONE]).unwrap();
        assert_eq!(window.tex_format, EGL_NO_TEXTURE);
        assert_eq!(parse_attribs(SurfaceKind::Window, &[EGL_WIDTH, 4, EGL_NONE]), Err(EGL_BAD_ATTRIBUTE));
        assert_eq!(parse_attribs(SurfaceKind::Pixmap, &[EGL_RENDER_BUFFER, EGL_BACK_BUFFER]), Err(EGL_BAD_ATTRIBUTE));
        assert!(parse_attribs(SurfaceKind::Pixmap, &[]).is_ok());

        let pbuffer = parse_attribs(
            SurfaceKind::Pbuffer,
            &[
                EGL_WIDTH,
                16,
                EGL_LARGEST_PBUFFER,
                EGL_TRUE as EGLint,
                EGL_TEXTURE_FORMAT,
                EGL_TEXTURE_RGB,
                EGL_TEXTURE_TARGET,
                EGL_TEXTURE_2D,
                EGL_NONE,
                EGL_MIPMAP_TEXTURE,
                1,
            ],
        )
        .unwrap();
        assert!(pbuffer.largest);
        assert_eq!(pbuffer.tex_format, EGL_TEXTURE_RGB);
        assert_eq!(pbuffer.tex_target, EGL_TEXTURE_2D);
        assert!(!pbuffer.tex_mipmap);

        assert_eq!(
            parse_attribs(SurfaceKind::Pbuffer, &[EGL_TEXTURE_TARGET, EGL_TEXTURE_RGB, EGL_NONE]),
            Err(EGL_BAD_ATTRIBUTE)
        );
    }

    #[test]
    fn test_replace_and_invalidate() {
        let (window, released) = surface(SurfaceKind::Window, PbufferAttribs::default());
        window.invalidate();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let old = window.replace_backend(Box::new(FakeSurface {
            native: NativeId(4),
            size: (32, 16),
            released: released.clone(),
        }));
        assert_eq!(old.native(), NativeId(3));
        assert_eq!(window.native(), NativeId(4));
        assert_eq!(window.query(EGL_WIDTH), SurfaceQuery::Value(32));
    }
}
