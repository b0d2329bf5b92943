//! Shadowed GL buffer objects
//!
//! Guest writes land in a CPU copy first and are recorded as dirty ranges.
//! Nothing reaches the host until a draw binds the buffer, at which point
//! the dirty ranges of the part the draw needs are uploaded. Host GL cannot
//! consume `GL_FIXED` or `GL_BYTE` vertex data, so a buffer keeps up to
//! three host buffers ("parts"): the raw bytes, a `GL_FIXED` to `GL_FLOAT`
//! conversion and a `GL_BYTE` to `GL_SHORT` conversion. Each part has its
//! own dirty list and is converted lazily.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use super::validate::{buffer_target_to_binding, index_size, minmax_index};
use crate::driver::GlesDriver;
use crate::gl::*;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};
use crate::range_list::RangeList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Default = 0,
    Fixed = 1,
    Byte = 2,
}

const NUM_PARTS: usize = 3;

impl PartKind {
    fn select(type_: GLenum, need_convert: bool) -> PartKind {
        match (type_, need_convert) {
            (GL_FIXED, true) => PartKind::Fixed,
            (GL_BYTE, true) => PartKind::Byte,
            _ => PartKind::Default,
        }
    }

    /// Host bytes per guest byte
    fn scale(self) -> usize {
        match self {
            PartKind::Byte => 2,
            _ => 1,
        }
    }
}

#[derive(Debug)]
struct BufferPart {
    global_name: GLuint,
    ranges: RangeList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MinmaxCache {
    type_: GLenum,
    offset: usize,
    count: usize,
    min: u32,
    max: u32,
}

#[derive(Debug)]
struct BufferState {
    parts: [BufferPart; NUM_PARTS],
    data: Vec<u8>,
    usage: GLenum,
    was_bound: bool,
    minmax: Option<MinmaxCache>,
}

/// Host representation of one part's bytes in `[start, start + size)`
fn convert(kind: PartKind, data: &[u8], start: usize, size: usize) -> Vec<u8> {
    let src = &data[start..start + size];
    match kind {
        PartKind::Default => src.to_vec(),
        PartKind::Fixed => {
            let mut out = src.to_vec();
            // Only whole, aligned words are fixed-point values
            let first = (4 - start % 4) % 4;
            let mut i = first;
            while i + 4 <= out.len() {
                let mut word = [0u8; 4];
                word.copy_from_slice(&out[i..i + 4]);
                let value = fixed_to_float(i32::from_le_bytes(word));
                out[i..i + 4].copy_from_slice(&value.to_le_bytes());
                i += 4;
            }
            out
        }
        PartKind::Byte => src
            .iter()
            .flat_map(|&b| (b as i8 as i16).to_le_bytes())
            .collect(),
    }
}

impl BufferState {
    fn upload(&self, driver: &dyn GlesDriver, kind: PartKind, target: GLenum, start: usize, size: usize) {
        let host = convert(kind, &self.data, start, size);
        if start == 0 && size == self.data.len() {
            driver.buffer_data(target, host.len(), Some(&host), self.usage);
        } else {
            driver.buffer_sub_data(target, start * kind.scale(), &host);
        }
    }

    fn transfer_part(&mut self, driver: &dyn GlesDriver, kind: PartKind, target: GLenum) {
        let ranges: Vec<(usize, usize)> = self.parts[kind as usize].ranges.iter().collect();

        match ranges.as_slice() {
            [] => return,
            [(_, 0)] => {
                driver.buffer_data(target, 0, None, self.usage);
            }
            [(0, size)] if *size == self.data.len() => {
                self.upload(driver, kind, target, 0, *size);
            }
            _ => {
                for &(start, size) in &ranges {
                    self.upload(driver, kind, target, start, size);
                }
            }
        }

        self.parts[kind as usize].ranges.clear();
    }
}

/// A buffer object in a sharegroup namespace
pub struct GlesBuffer {
    header: ObjectHeader,
    driver: Arc<dyn GlesDriver>,
    ensure: Arc<dyn EnsureContext>,
    state: Mutex<BufferState>,
}

impl GlesBuffer {
    pub fn new(driver: Arc<dyn GlesDriver>, ensure: Arc<dyn EnsureContext>) -> Arc<GlesBuffer> {
        let names = driver.gen_buffers(NUM_PARTS);
        let part = |i: usize| BufferPart {
            global_name: names.get(i).copied().unwrap_or(0),
            ranges: RangeList::new(),
        };

        Arc::new(GlesBuffer {
            header: ObjectHeader::new(),
            state: Mutex::new(BufferState {
                parts: [part(0), part(1), part(2)],
                data: Vec::new(),
                usage: GL_STATIC_DRAW,
                was_bound: false,
                minmax: None,
            }),
            driver,
            ensure,
        })
    }

    /// `glBufferData`: replace the store, `data` of `None` leaves it
    /// uninitialised (zeroed here)
    pub fn set_data(&self, size: usize, data: Option<&[u8]>, usage: GLenum) {
        let mut state = self.state.lock();

        state.data.clear();
        if size > 0 {
            match data {
                Some(data) => {
                    state.data.extend_from_slice(&data[..size.min(data.len())]);
                    state.data.resize(size, 0);
                }
                None => state.data.resize(size, 0),
            }
        }
        state.usage = usage;
        state.minmax = None;

        for part in state.parts.iter_mut() {
            part.ranges.clear();
            part.ranges.add(0, size);
        }
    }

    /// `glBufferSubData`; false if the range does not fit the store
    pub fn update_data(&self, offset: GLintptr, data: &[u8]) -> bool {
        let mut state = self.state.lock();

        if offset < 0 {
            return false;
        }
        let offset = offset as usize;
        let size = data.len();
        if offset + size > state.data.len() {
            return false;
        }
        if size == 0 {
            return true;
        }

        state.data[offset..offset + size].copy_from_slice(data);
        state.minmax = None;
        for part in state.parts.iter_mut() {
            part.ranges.add(offset, size);
        }
        true
    }

    pub fn size(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Copy of `len` shadow bytes at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state.data.get(offset..offset.checked_add(len)?).map(<[u8]>::to_vec)
    }

    /// Smallest and largest index among `count` indices at byte `offset`
    pub fn get_minmax_index(&self, type_: GLenum, offset: GLintptr, count: GLsizei) -> Option<(u32, u32)> {
        let index_size = index_size(type_)?;
        if offset < 0 || count <= 0 {
            return None;
        }
        let (offset, count) = (offset as usize, count as usize);

        let mut state = self.state.lock();
        if offset + count * index_size > state.data.len() {
            return None;
        }

        if let Some(cache) = state.minmax {
            if cache.type_ == type_ && cache.offset == offset && cache.count == count {
                return Some((cache.min, cache.max));
            }
        }

        let (min, max) = minmax_index(&state.data[offset..offset + count * index_size], index_size)?;

        state.minmax = Some(MinmaxCache {
            type_,
            offset,
            count,
            min,
            max,
        });
        Some((min, max))
    }

    /// Bind the part serving `type_` to `target`; returns the host buffer
    /// that was bound before
    pub fn bind(&self, type_: GLenum, need_convert: bool, target: GLenum) -> Option<GLuint> {
        let binding = buffer_target_to_binding(target)?;

        let mut current = [0 as GLint];
        self.driver.get_integerv(binding, &mut current);
        let old = current[0] as GLuint;

        let name = self.state.lock().parts[PartKind::select(type_, need_convert) as usize].global_name;
        if old != name {
            self.driver.bind_buffer(target, name);
        }
        Some(old)
    }

    /// Upload the dirty ranges of the part serving `type_`
    pub fn transfer(&self, type_: GLenum, target: GLenum, need_convert: bool) -> bool {
        let old = match self.bind(type_, need_convert, target) {
            Some(old) => old,
            None => return false,
        };

        self.state
            .lock()
            .transfer_part(self.driver.as_ref(), PartKind::select(type_, need_convert), target);

        self.driver.bind_buffer(target, old);
        true
    }

    /// `glGetBufferParameteriv`
    pub fn get_parameter(&self, pname: GLenum) -> Option<GLint> {
        let state = self.state.lock();
        match pname {
            GL_BUFFER_SIZE => Some(state.data.len() as GLint),
            GL_BUFFER_USAGE => Some(state.usage as GLint),
            _ => None,
        }
    }

    pub fn set_bound(&self) {
        self.state.lock().was_bound = true;
    }

    /// `glIsBuffer` is true only once a buffer has been bound
    pub fn was_bound(&self) -> bool {
        self.state.lock().was_bound
    }

    #[cfg(test)]
    fn global_name(&self, type_: GLenum, need_convert: bool) -> GLuint {
        self.state.lock().parts[PartKind::select(type_, need_convert) as usize].global_name
    }

    #[cfg(test)]
    fn dirty_ranges(&self, type_: GLenum, need_convert: bool) -> Vec<(usize, usize)> {
        self.state.lock().parts[PartKind::select(type_, need_convert) as usize]
            .ranges
            .iter()
            .collect()
    }
}

impl Object for GlesBuffer {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesBuffer {
    fn drop(&mut self) {
        if self.header.nodelete() {
            return;
        }
        let names: Vec<GLuint> = self
            .state
            .get_mut()
            .parts
            .iter()
            .map(|p| p.global_name)
            .filter(|&n| n != 0)
            .collect();
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_buffers(&names);
    }
}
