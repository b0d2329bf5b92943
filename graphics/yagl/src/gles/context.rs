//! State shared by GLES1 and GLES2 contexts
//!
//! [`GlesContext`] holds what both versions track on top of the host
//! context: the sticky error, vertex arrays, texture units and the
//! buffer/framebuffer bindings. Version specific behaviour is reached
//! through the [`GlesClient`] hooks, which the version contexts implement
//! next to [`ClientContext`].

use std::sync::Arc;

use super::array::GlesArray;
use super::buffer::GlesBuffer;
use super::framebuffer::GlesFramebuffer;
use super::texture::TextureUnit;
use super::validate::{array_el_size, common_param_count, TextureTarget};
use crate::api::CallError;
use crate::client::ClientContext;
use crate::driver::{GlesDriver, VertexData};
use crate::gl::*;
use crate::object::{EnsureContext, Sharegroup};
use crate::transport::Transport;
use crate::types::{GuestVirtAddr, ObjectName};

/// Upper bound on texture units any version exposes
pub const MAX_TEXTURE_UNITS: usize = 32;

/// Pixel-pack buffer used to read the draw surface back
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReadbackPbo {
    name: GLuint,
    width: u32,
    height: u32,
    bpp: u32,
}

pub struct GlesContext {
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    sharegroup: Arc<Sharegroup>,

    error: GLenum,

    pub arrays: Vec<GlesArray>,

    texture_units: Vec<TextureUnit>,
    active_texture_unit: usize,

    pub num_compressed_texture_formats: GLint,

    vbo: Option<(Arc<GlesBuffer>, ObjectName)>,
    ebo: Option<(Arc<GlesBuffer>, ObjectName)>,
    fbo: Option<(Arc<GlesFramebuffer>, ObjectName)>,
    rbo_local_name: ObjectName,

    rp_pbo: ReadbackPbo,

    /// Host extension support discovered at prepare time
    pub texture_npot: bool,
    pub texture_filter_anisotropic: bool,
    pub pack_depth_stencil: bool,
}

impl GlesContext {
    pub fn new(
        driver: Arc<dyn GlesDriver>,
        ensure: Arc<dyn EnsureContext>,
        sharegroup: Arc<Sharegroup>,
    ) -> Self {
        Self {
            driver,
            ensure,
            sharegroup,
            error: GL_NO_ERROR,
            arrays: Vec::new(),
            texture_units: Vec::new(),
            active_texture_unit: 0,
            num_compressed_texture_formats: 0,
            vbo: None,
            ebo: None,
            fbo: None,
            rbo_local_name: 0,
            rp_pbo: ReadbackPbo::default(),
            texture_npot: false,
            texture_filter_anisotropic: false,
            pack_depth_stencil: false,
        }
    }

    pub fn driver(&self) -> &Arc<dyn GlesDriver> {
        &self.driver
    }

    /// Owner hook handed to every object this context creates
    pub fn ensure(&self) -> &Arc<dyn EnsureContext> {
        &self.ensure
    }

    pub fn sharegroup(&self) -> &Arc<Sharegroup> {
        &self.sharegroup
    }

    /// Size the context from host limits, called on first activation
    pub fn prepare(&mut self, arrays: Vec<GlesArray>, num_texture_units: usize) {
        let num_texture_units = num_texture_units.clamp(1, MAX_TEXTURE_UNITS);

        log::debug!(
            "gles: prepare, {} arrays, {} texture units",
            arrays.len(),
            num_texture_units
        );

        self.arrays = arrays;
        self.texture_units = vec![TextureUnit::default(); num_texture_units];

        let mut formats = [0 as GLint];
        self.driver
            .get_integerv(GL_NUM_COMPRESSED_TEXTURE_FORMATS, &mut formats);
        self.num_compressed_texture_formats = formats[0];

        let extensions = self.driver.get_string(GL_EXTENSIONS);
        self.texture_npot = extensions.contains("GL_OES_texture_npot ")
            || extensions.contains("GL_ARB_texture_non_power_of_two ");
        self.texture_filter_anisotropic = extensions.contains("GL_EXT_texture_filter_anisotropic ");
        self.pack_depth_stencil = extensions.contains("GL_EXT_packed_depth_stencil ")
            || extensions.contains("GL_NV_packed_depth_stencil ");
    }

    pub fn deactivate(&mut self) {
        if self.rp_pbo.name != 0 {
            self.driver.delete_buffers(&[self.rp_pbo.name]);
            self.rp_pbo = ReadbackPbo::default();
        }
    }

    /// Latch `error` unless an earlier error is still pending
    pub fn set_error(&mut self, error: GLenum) {
        log::warn!("gles: error = 0x{:X}", error);
        if self.error == GL_NO_ERROR {
            self.error = error;
        }
    }

    /// Return and clear the latched error
    pub fn get_error(&mut self) -> GLenum {
        core::mem::replace(&mut self.error, GL_NO_ERROR)
    }

    pub fn get_array(&self, index: u32) -> Option<&GlesArray> {
        self.arrays.iter().find(|a| a.index() == index)
    }

    pub fn get_array_mut(&mut self, index: u32) -> Option<&mut GlesArray> {
        self.arrays.iter_mut().find(|a| a.index() == index)
    }

    pub fn num_texture_units(&self) -> usize {
        self.texture_units.len()
    }

    pub fn active_texture_unit(&self) -> usize {
        self.active_texture_unit
    }

    /// `glActiveTexture`; false if the unit does not exist
    pub fn set_active_texture(&mut self, texture: GLenum) -> bool {
        let unit = texture.wrapping_sub(GL_TEXTURE0) as usize;
        if texture < GL_TEXTURE0 || unit >= self.texture_units.len() {
            return false;
        }
        self.active_texture_unit = unit;
        true
    }

    pub fn active_texture_unit_state(&self) -> Option<&TextureUnit> {
        self.texture_units.get(self.active_texture_unit)
    }

    pub fn active_texture_unit_state_mut(&mut self) -> Option<&mut TextureUnit> {
        self.texture_units.get_mut(self.active_texture_unit)
    }

    pub fn bind_texture(&mut self, target: TextureTarget, local_name: ObjectName) {
        if let Some(unit) = self.active_texture_unit_state_mut() {
            unit.bind(target, local_name);
        }
    }

    /// Forget `local_name` in the active unit, as `glDeleteTextures` does
    pub fn unbind_texture(&mut self, local_name: ObjectName) {
        if let Some(unit) = self.active_texture_unit_state_mut() {
            unit.unbind(local_name);
        }
    }

    /// Local name bound to `target` in the active unit
    pub fn texture_binding(&self, target: TextureTarget) -> ObjectName {
        self.active_texture_unit_state()
            .map_or(0, |unit| unit.binding(target))
    }

    /// `glBindBuffer`; false on an unknown target
    pub fn bind_buffer(
        &mut self,
        target: GLenum,
        buffer: Option<Arc<GlesBuffer>>,
        local_name: ObjectName,
    ) -> bool {
        let slot = match target {
            GL_ARRAY_BUFFER => &mut self.vbo,
            GL_ELEMENT_ARRAY_BUFFER => &mut self.ebo,
            _ => return false,
        };
        if let Some(buffer) = &buffer {
            buffer.set_bound();
        }
        let old = core::mem::replace(slot, buffer.map(|b| (b, local_name)));
        if let Some((old, _)) = old {
            self.sharegroup.reap(old);
        }
        true
    }

    /// Drop every binding of `buffer`, as `glDeleteBuffers` does
    pub fn unbind_buffer(&mut self, buffer: &Arc<GlesBuffer>, local_name: ObjectName) {
        for slot in [&mut self.vbo, &mut self.ebo] {
            if slot.as_ref().is_some_and(|(b, _)| Arc::ptr_eq(b, buffer)) {
                if let Some((old, _)) = slot.take() {
                    self.sharegroup.reap(old);
                }
            }
        }
        for array in self.arrays.iter_mut() {
            array.unbind_vbo(local_name);
        }
    }

    pub fn acquire_binded_buffer(&self, target: GLenum) -> Option<Arc<GlesBuffer>> {
        match target {
            GL_ARRAY_BUFFER => self.vbo.as_ref().map(|(b, _)| b.clone()),
            GL_ELEMENT_ARRAY_BUFFER => self.ebo.as_ref().map(|(b, _)| b.clone()),
            _ => None,
        }
    }

    /// Buffer bound to `GL_ARRAY_BUFFER` with its local name
    pub fn vbo(&self) -> Option<(Arc<GlesBuffer>, ObjectName)> {
        self.vbo.clone()
    }

    pub fn ebo(&self) -> Option<&Arc<GlesBuffer>> {
        self.ebo.as_ref().map(|(b, _)| b)
    }

    pub fn vbo_local_name(&self) -> ObjectName {
        self.vbo.as_ref().map_or(0, |(_, name)| *name)
    }

    pub fn ebo_local_name(&self) -> ObjectName {
        self.ebo.as_ref().map_or(0, |(_, name)| *name)
    }

    /// `glBindFramebuffer`; false unless `target` is `GL_FRAMEBUFFER`
    pub fn bind_framebuffer(
        &mut self,
        target: GLenum,
        framebuffer: Option<Arc<GlesFramebuffer>>,
        local_name: ObjectName,
    ) -> bool {
        if target != GL_FRAMEBUFFER {
            return false;
        }
        let old = core::mem::replace(&mut self.fbo, framebuffer.map(|f| (f, local_name)));
        if let Some((old, _)) = old {
            self.sharegroup.reap(old);
        }
        true
    }

    pub fn unbind_framebuffer(&mut self, local_name: ObjectName) {
        if self.fbo.as_ref().is_some_and(|(_, name)| *name == local_name) {
            if let Some((old, _)) = self.fbo.take() {
                self.sharegroup.reap(old);
            }
        }
    }

    pub fn acquire_binded_framebuffer(&self, target: GLenum) -> Option<Arc<GlesFramebuffer>> {
        match target {
            GL_FRAMEBUFFER => self.fbo.as_ref().map(|(f, _)| f.clone()),
            _ => None,
        }
    }

    pub fn fbo_local_name(&self) -> ObjectName {
        self.fbo.as_ref().map_or(0, |(_, name)| *name)
    }

    /// `glBindRenderbuffer`; only the name is tracked
    pub fn bind_renderbuffer(&mut self, target: GLenum, local_name: ObjectName) -> bool {
        if target != GL_RENDERBUFFER {
            return false;
        }
        self.rbo_local_name = local_name;
        true
    }

    pub fn unbind_renderbuffer(&mut self, local_name: ObjectName) {
        if self.rbo_local_name == local_name {
            self.rbo_local_name = 0;
        }
    }

    pub fn rbo_local_name(&self) -> ObjectName {
        self.rbo_local_name
    }

    /// Value count of a state query both versions share
    pub fn param_count(&self, pname: GLenum) -> Option<usize> {
        match pname {
            GL_COMPRESSED_TEXTURE_FORMATS => Some(self.num_compressed_texture_formats.max(0) as usize),
            _ => common_param_count(pname),
        }
    }

    /// `gl*Pointer`: point array `index` at the bound `GL_ARRAY_BUFFER`
    /// (with `va` as offset) or at guest memory
    #[allow(clippy::too_many_arguments)]
    pub fn array_pointer(
        &mut self,
        index: u32,
        size: GLint,
        type_: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        va: GuestVirtAddr,
    ) -> GLenum {
        if array_el_size(type_).is_none() {
            return GL_INVALID_ENUM;
        }
        if stride < 0 {
            return GL_INVALID_VALUE;
        }
        let vbo = self.vbo.clone();
        let array = match self.get_array_mut(index) {
            Some(array) => array,
            None => return GL_INVALID_VALUE,
        };
        let ok = match vbo {
            Some((buffer, local_name)) => {
                array.update_vbo(size, type_, normalized, stride, buffer, local_name, va as usize)
            }
            None => array.update(size, type_, normalized, stride, va),
        };
        if ok {
            GL_NO_ERROR
        } else {
            GL_INVALID_VALUE
        }
    }

    /// Values the common layer answers without the host
    pub fn get_integer(&self, pname: GLenum) -> Option<GLint> {
        let value = match pname {
            GL_ACTIVE_TEXTURE => (GL_TEXTURE0 + self.active_texture_unit as GLenum) as GLint,
            GL_TEXTURE_BINDING_2D => self.texture_binding(TextureTarget::Texture2D) as GLint,
            GL_TEXTURE_BINDING_CUBE_MAP => self.texture_binding(TextureTarget::CubeMap) as GLint,
            GL_ARRAY_BUFFER_BINDING => self.vbo_local_name() as GLint,
            GL_ELEMENT_ARRAY_BUFFER_BINDING => self.ebo_local_name() as GLint,
            GL_FRAMEBUFFER_BINDING => self.fbo_local_name() as GLint,
            GL_RENDERBUFFER_BINDING => self.rbo_local_name as GLint,
            _ => return None,
        };
        Some(value)
    }

    /// Read the bound draw surface through a pixel-pack buffer, flipping
    /// rows so the top row lands first in `pixels`
    pub fn read_pixels(&mut self, width: u32, height: u32, bpp: u32, pixels: &mut [u8]) -> bool {
        let format = match bpp {
            3 => GL_RGB,
            4 => GL_BGRA,
            _ => {
                log::error!("gles: read_pixels with bpp {}", bpp);
                return false;
            }
        };

        let line_size = (width * bpp) as usize;
        let size = line_size * height as usize;
        if pixels.len() < size {
            log::error!("gles: read_pixels target {} < {}", pixels.len(), size);
            return false;
        }

        if self.rp_pbo.name == 0 {
            self.rp_pbo.name = self.driver.gen_buffers(1).first().copied().unwrap_or(0);
            if self.rp_pbo.name == 0 {
                log::error!("gles: cannot create readback buffer");
                return false;
            }
        }

        let mut current = [0 as GLint];
        self.driver
            .get_integerv(GL_PIXEL_PACK_BUFFER_BINDING, &mut current);
        let current_pbo = current[0] as GLuint;

        if current_pbo != self.rp_pbo.name {
            self.driver
                .bind_buffer(GL_PIXEL_PACK_BUFFER, self.rp_pbo.name);
        }

        if (self.rp_pbo.width, self.rp_pbo.height, self.rp_pbo.bpp) != (width, height, bpp) {
            self.rp_pbo.width = width;
            self.rp_pbo.height = height;
            self.rp_pbo.bpp = bpp;
            self.driver
                .buffer_data(GL_PIXEL_PACK_BUFFER, size, None, GL_STREAM_READ);
        }

        self.driver.push_client_attrib(GL_CLIENT_PIXEL_STORE_BIT);
        self.driver
            .pixel_storei(GL_PACK_ALIGNMENT, if bpp == 4 { 4 } else { 1 });
        self.driver.read_pixels_to_pack(
            0,
            0,
            width as GLsizei,
            height as GLsizei,
            format,
            GL_UNSIGNED_BYTE,
            0,
        );

        let ok = match self.driver.map_buffer(GL_PIXEL_PACK_BUFFER, GL_READ_ONLY) {
            Some(mapped) => {
                for (i, row) in mapped.chunks_exact(line_size.max(1)).take(height as usize).enumerate() {
                    let dst = (height as usize - 1 - i) * line_size;
                    pixels[dst..dst + line_size].copy_from_slice(row);
                }
                self.driver.unmap_buffer(GL_PIXEL_PACK_BUFFER);
                true
            }
            None => {
                log::error!("gles: cannot map readback buffer");
                false
            }
        };

        self.driver.pop_client_attrib();

        if current_pbo != 0 && current_pbo != self.rp_pbo.name {
            log::error!("gles: guest had pbo {} bound", current_pbo);
            self.driver.bind_buffer(GL_PIXEL_PACK_BUFFER, current_pbo);
        }

        ok
    }
}

impl Drop for GlesContext {
    fn drop(&mut self) {
        for slot in [self.vbo.take(), self.ebo.take()].into_iter().flatten() {
            self.sharegroup.reap(slot.0);
        }
        if let Some((fbo, _)) = self.fbo.take() {
            self.sharegroup.reap(fbo);
        }
        for array in self.arrays.iter_mut() {
            array.cleanup(&self.sharegroup);
        }
    }
}

/// Version hooks of a GLES context
pub trait GlesClient: ClientContext + 'static {
    fn gles(&self) -> &GlesContext;

    fn gles_mut(&mut self) -> &mut GlesContext;

    /// Number of values `pname` returns, `None` if the version does not
    /// know it
    fn get_param_count(&self, pname: GLenum) -> Option<usize>;

    /// Values the version answers itself instead of the host
    fn get_integerv(&self, pname: GLenum) -> Option<Vec<GLint>>;

    /// Float answers the version emulates; integer answers are converted
    fn get_floatv(&self, pname: GLenum) -> Option<Vec<GLfloat>> {
        self.get_integerv(pname)
            .map(|v| v.into_iter().map(|x| x as GLfloat).collect())
    }

    fn is_enabled(&self, cap: GLenum) -> Option<bool> {
        let _ = cap;
        None
    }

    /// Extension string reported to the guest
    fn extensions(&self) -> String;

    /// Point the host at one array after its data was transferred
    fn apply_array(&self, array: &GlesArray);

    fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        self.gles().driver().draw_arrays(mode, first, count);
    }

    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, type_: GLenum, indices: VertexData<'_>) {
        self.gles()
            .driver()
            .draw_elements(mode, count, type_, indices);
    }

    /// `glCompressedTexImage2D`; returns the GL error to latch
    #[allow(clippy::too_many_arguments)]
    fn compressed_tex_image(
        &mut self,
        target: GLenum,
        level: GLint,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        image_size: GLsizei,
        data: Option<&[u8]>,
    ) -> GLenum {
        let _ = image_size;
        self.gles().driver().compressed_tex_image_2d(
            target,
            level,
            internalformat,
            width,
            height,
            border,
            data.unwrap_or(&[]),
        );
        GL_NO_ERROR
    }

    /// Make vertices `[first, first + count)` of every enabled array
    /// available to the host. Guest memory is read for all arrays before
    /// anything is sent to the host; on a GL error nothing is sent.
    fn transfer_arrays(
        &mut self,
        first: usize,
        count: usize,
        transport: &Transport,
    ) -> Result<Result<(), GLenum>, CallError> {
        let mut apply = Vec::new();
        for (i, array) in self.gles_mut().arrays.iter_mut().enumerate() {
            match array.transfer(first, count, transport)? {
                Ok(true) => apply.push(i),
                Ok(false) => {}
                Err(error) => return Ok(Err(error)),
            }
        }

        for i in apply {
            let array = &self.gles().arrays[i];
            array.upload_vbo();
            self.apply_array(array);
        }
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{HeadlessDriver, HostCall};
    use crate::object::NamespaceKind;
    use crate::testutil::NoEnsure;

    fn context() -> (Arc<HeadlessDriver>, GlesContext) {
        let driver = Arc::new(HeadlessDriver::new());
        let mut ctx = GlesContext::new(driver.clone(), Arc::new(NoEnsure), Sharegroup::new());
        ctx.prepare(Vec::new(), 4);
        (driver, ctx)
    }

    #[test]
    fn test_sticky_error() {
        let (_driver, mut ctx) = context();
        ctx.set_error(GL_INVALID_ENUM);
        ctx.set_error(GL_INVALID_VALUE);
        assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
        assert_eq!(ctx.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_prepare_reads_host_extensions() {
        let (_driver, ctx) = context();
        assert!(ctx.texture_npot);
        assert!(ctx.texture_filter_anisotropic);
        assert!(ctx.pack_depth_stencil);
        assert_eq!(ctx.num_texture_units(), 4);
    }

    #[test]
    fn test_active_texture_range() {
        let (_driver, mut ctx) = context();
        assert!(ctx.set_active_texture(GL_TEXTURE0 + 3));
        assert_eq!(ctx.get_integer(GL_ACTIVE_TEXTURE), Some((GL_TEXTURE0 + 3) as GLint));
        assert!(!ctx.set_active_texture(GL_TEXTURE0 + 4));
        assert!(!ctx.set_active_texture(0));
        assert_eq!(ctx.active_texture_unit(), 3);

        ctx.bind_texture(TextureTarget::Texture2D, 9);
        assert_eq!(ctx.get_integer(GL_TEXTURE_BINDING_2D), Some(9));
        ctx.unbind_texture(9);
        assert_eq!(ctx.get_integer(GL_TEXTURE_BINDING_2D), Some(0));
    }

    #[test]
    fn test_buffer_bindings() {
        let (driver, mut ctx) = context();
        let buffer = GlesBuffer::new(driver.clone(), Arc::new(NoEnsure));
        let name = ctx.sharegroup().add(NamespaceKind::Buffer, buffer.clone());

        assert!(!ctx.bind_buffer(GL_TEXTURE_2D, Some(buffer.clone()), name));
        assert!(ctx.bind_buffer(GL_ARRAY_BUFFER, Some(buffer.clone()), name));
        assert!(ctx.bind_buffer(GL_ELEMENT_ARRAY_BUFFER, Some(buffer.clone()), name));
        assert!(buffer.was_bound());
        assert_eq!(ctx.get_integer(GL_ARRAY_BUFFER_BINDING), Some(name as GLint));

        ctx.unbind_buffer(&buffer, name);
        assert!(ctx.acquire_binded_buffer(GL_ARRAY_BUFFER).is_none());
        assert!(ctx.acquire_binded_buffer(GL_ELEMENT_ARRAY_BUFFER).is_none());
        assert_eq!(ctx.ebo_local_name(), 0);
    }

    #[test]
    fn test_read_pixels_flips_rows() {
        let (driver, mut ctx) = context();
        let (w, h, bpp) = (2u32, 3u32, 4u32);
        let mut pixels = vec![0xFFu8; (w * h * bpp) as usize];
        assert!(ctx.read_pixels(w, h, bpp, &mut pixels));

        // Host row y is filled with byte y, guest gets the top row first
        let line = (w * bpp) as usize;
        assert!(pixels[..line].iter().all(|&b| b == 2));
        assert!(pixels[line..2 * line].iter().all(|&b| b == 1));
        assert!(pixels[2 * line..].iter().all(|&b| b == 0));

        let calls = driver.take_calls();
        assert!(calls.contains(&HostCall::PixelStorei {
            pname: GL_PACK_ALIGNMENT,
            param: 4
        }));
        // Storage is reused while the size does not change
        assert!(ctx.read_pixels(w, h, bpp, &mut pixels));
        assert!(!driver
            .take_calls()
            .iter()
            .any(|c| matches!(c, HostCall::BufferData { .. })));

        assert!(!ctx.read_pixels(w, h, 2, &mut pixels));
    }

    #[test]
    fn test_deactivate_releases_readback_buffer() {
        let (driver, mut ctx) = context();
        let before = driver.num_buffers();
        let mut pixels = vec![0u8; 12];
        assert!(ctx.read_pixels(1, 3, 4, &mut pixels));
        assert_eq!(driver.num_buffers(), before + 1);
        ctx.deactivate();
        assert_eq!(driver.num_buffers(), before);
    }
}
