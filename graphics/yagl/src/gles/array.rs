//! Vertex arrays
//!
//! An array points either at guest memory or into a buffer object. Nothing
//! is read when the pointer is set: a draw calls [`GlesArray::transfer`]
//! with the vertex window it consumes and the array pulls exactly that
//! window from the guest, converting it if host GL cannot take the type.

use std::sync::Arc;

use super::buffer::GlesBuffer;
use super::validate::array_el_size;
use crate::api::CallError;
use crate::driver::VertexData;
use crate::gl::*;
use crate::mem::{grow_staging, staging_buffer, staging_len};
use crate::object::Sharegroup;
use crate::transport::Transport;
use crate::types::{GuestVirtAddr, ObjectName};

/// Types the host cannot consume for one array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayConversion {
    pub fixed: bool,
    pub byte: bool,
}

impl ArrayConversion {
    pub const NONE: ArrayConversion = ArrayConversion {
        fixed: false,
        byte: false,
    };
    pub const FIXED: ArrayConversion = ArrayConversion {
        fixed: true,
        byte: false,
    };
    pub const FIXED_AND_BYTE: ArrayConversion = ArrayConversion {
        fixed: true,
        byte: true,
    };
}

enum ArraySource {
    None,
    Client(GuestVirtAddr),
    Vbo {
        buffer: Arc<GlesBuffer>,
        local_name: ObjectName,
        offset: usize,
    },
}

pub struct GlesArray {
    index: u32,
    conversion: ArrayConversion,
    size: GLint,
    type_: GLenum,
    el_size: usize,
    normalized: GLboolean,
    stride: GLsizei,
    enabled: bool,
    source: ArraySource,
    /// Guest bytes of the last transferred window, converted in place
    host_data: Vec<u8>,
}

impl GlesArray {
    pub fn new(index: u32, conversion: ArrayConversion) -> Self {
        Self {
            index,
            conversion,
            size: 4,
            type_: GL_FLOAT,
            el_size: 4,
            normalized: GL_FALSE,
            stride: 0,
            enabled: false,
            source: ArraySource::None,
            host_data: Vec::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn size(&self) -> GLint {
        self.size
    }

    pub fn type_(&self) -> GLenum {
        self.type_
    }

    pub fn normalized(&self) -> GLboolean {
        self.normalized
    }

    /// Guest stride, never 0 once a pointer was set
    pub fn stride(&self) -> GLsizei {
        self.stride
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self, enable: bool) {
        self.enabled = enable;
    }

    /// Local name of the backing buffer, 0 for client memory
    pub fn vbo_local_name(&self) -> ObjectName {
        match &self.source {
            ArraySource::Vbo { local_name, .. } => *local_name,
            _ => 0,
        }
    }

    pub fn vbo(&self) -> Option<&Arc<GlesBuffer>> {
        match &self.source {
            ArraySource::Vbo { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Guest pointer value as the guest would read it back
    pub fn pointer(&self) -> GuestVirtAddr {
        match &self.source {
            ArraySource::None => 0,
            ArraySource::Client(va) => *va,
            ArraySource::Vbo { offset, .. } => *offset as GuestVirtAddr,
        }
    }

    pub fn need_convert(&self) -> bool {
        match self.type_ {
            GL_FIXED => self.conversion.fixed,
            GL_BYTE => self.conversion.byte,
            _ => false,
        }
    }

    /// Element type handed to the host
    pub fn host_type(&self) -> GLenum {
        match (self.type_, self.need_convert()) {
            (GL_FIXED, true) => GL_FLOAT,
            (GL_BYTE, true) => GL_SHORT,
            (type_, _) => type_,
        }
    }

    fn scale(&self) -> usize {
        if self.type_ == GL_BYTE && self.need_convert() {
            2
        } else {
            1
        }
    }

    pub fn host_stride(&self) -> GLsizei {
        self.stride * self.scale() as GLsizei
    }

    /// Where the host reads the data: an offset into the bound buffer part
    /// or the converted client bytes
    pub fn host_data(&self) -> VertexData<'_> {
        match &self.source {
            ArraySource::Vbo { offset, .. } => VertexData::Offset(offset * self.scale()),
            _ => VertexData::Client(&self.host_data),
        }
    }

    fn set_format(&mut self, size: GLint, type_: GLenum, normalized: GLboolean, stride: GLsizei) -> bool {
        let el_size = match array_el_size(type_) {
            Some(el_size) => el_size,
            None => return false,
        };

        self.size = size;
        self.type_ = type_;
        self.el_size = el_size;
        self.normalized = normalized;
        self.stride = if stride == 0 {
            size.saturating_mul(el_size as GLsizei)
        } else {
            stride
        };
        self.host_data.clear();
        true
    }

    /// Point at guest memory
    pub fn update(
        &mut self,
        size: GLint,
        type_: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        va: GuestVirtAddr,
    ) -> bool {
        if !self.set_format(size, type_, normalized, stride) {
            return false;
        }
        self.source = ArraySource::Client(va);
        true
    }

    /// Point into a buffer object
    #[allow(clippy::too_many_arguments)]
    pub fn update_vbo(
        &mut self,
        size: GLint,
        type_: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        buffer: Arc<GlesBuffer>,
        local_name: ObjectName,
        offset: usize,
    ) -> bool {
        if !self.set_format(size, type_, normalized, stride) {
            return false;
        }
        self.source = ArraySource::Vbo {
            buffer,
            local_name,
            offset,
        };
        true
    }

    /// Forget the buffer if it is `local_name`, as `glDeleteBuffers` does
    pub fn unbind_vbo(&mut self, local_name: ObjectName) -> bool {
        if local_name != 0 && self.vbo_local_name() == local_name {
            self.source = ArraySource::None;
            true
        } else {
            false
        }
    }

    /// Pull vertices `[first, first + count)` of a client array from the
    /// guest. Returns whether the array must be (re)applied to the host.
    ///
    /// Only guest memory is touched here, so a fault leaves the host as it
    /// was; buffer-backed arrays are uploaded later by [`GlesArray::upload_vbo`].
    /// A window too large to stage yields `GL_OUT_OF_MEMORY`.
    pub fn transfer(
        &mut self,
        first: usize,
        count: usize,
        transport: &Transport,
    ) -> Result<Result<bool, GLenum>, CallError> {
        if !self.enabled {
            return Ok(Ok(false));
        }

        let va = match &self.source {
            ArraySource::None => return Ok(Ok(false)),
            ArraySource::Vbo { .. } => return Ok(Ok(true)),
            ArraySource::Client(0) => return Ok(Ok(false)),
            ArraySource::Client(va) => *va,
        };

        let stride = self.stride.max(0) as usize;
        let scale = self.scale();
        let window = staging_len(first, stride).and_then(|start| {
            let len = staging_len(count, stride)?;
            let needed = staging_len(start.checked_add(len)?, scale)?;
            Some((start, len, needed))
        });
        let Some((start, len, needed)) = window else {
            return Ok(Err(GL_OUT_OF_MEMORY));
        };

        // Bytes before `first` are never read by the host
        let Some(mut raw) = staging_buffer(len) else {
            return Ok(Err(GL_OUT_OF_MEMORY));
        };
        transport.read_guest(va + start as GuestVirtAddr, &mut raw)?;

        if !grow_staging(&mut self.host_data, needed) {
            return Ok(Err(GL_OUT_OF_MEMORY));
        }

        if !self.need_convert() {
            self.host_data[start..start + len].copy_from_slice(&raw);
            return Ok(Ok(true));
        }

        match self.type_ {
            GL_BYTE => {
                let dst = &mut self.host_data[start * 2..(start + len) * 2];
                for (out, &b) in dst.chunks_exact_mut(2).zip(raw.iter()) {
                    out.copy_from_slice(&(b as i8 as i16).to_le_bytes());
                }
            }
            _ => {
                self.host_data[start..start + len].copy_from_slice(&raw);
                let comps = self.size.max(0) as usize;
                for vertex in 0..count {
                    let base = start + vertex * stride;
                    for c in 0..comps {
                        let at = base + c * 4;
                        if at + 4 > start + len {
                            break;
                        }
                        let mut word = [0u8; 4];
                        word.copy_from_slice(&self.host_data[at..at + 4]);
                        let value = fixed_to_float(i32::from_le_bytes(word));
                        self.host_data[at..at + 4].copy_from_slice(&value.to_le_bytes());
                    }
                }
            }
        }

        Ok(Ok(true))
    }

    /// Flush the dirty ranges of the backing buffer part
    pub fn upload_vbo(&self) {
        if let ArraySource::Vbo { buffer, .. } = &self.source {
            buffer.transfer(self.type_, GL_ARRAY_BUFFER, self.need_convert());
        }
    }

    /// Guest-layout bytes behind element `index`, read from the buffer
    /// shadow or the last transferred client window
    pub fn element_bytes(&self, index: usize, len: usize) -> Option<Vec<u8>> {
        let stride = self.stride.max(0) as usize;
        match &self.source {
            ArraySource::None => None,
            ArraySource::Vbo { buffer, offset, .. } => {
                buffer.read(offset.checked_add(index.checked_mul(stride)?)?, len)
            }
            ArraySource::Client(_) => {
                if self.need_convert() {
                    return None;
                }
                let at = index.checked_mul(stride)?;
                self.host_data.get(at..at.checked_add(len)?).map(<[u8]>::to_vec)
            }
        }
    }

    /// Hand a buffer reference to the sharegroup so its host names are
    /// released when that is safe
    pub fn cleanup(&mut self, sharegroup: &Sharegroup) {
        if let ArraySource::Vbo { buffer, .. } = core::mem::replace(&mut self.source, ArraySource::None) {
            sharegroup.reap(buffer);
        }
        self.host_data = Vec::new();
    }
}
