//! Call-buffer decoder
//!
//! A batch is a run of calls packed into the thread's mapped pages. Every
//! field takes one 8-byte slot:
//!
//! ```text
//! api_id | func_id | direct/result | args ...        (api_id 0 ends the batch)
//! ```
//!
//! The guest writes the direct flag into the third slot and the host
//! overwrites it with the call result. Out-arrays (guest to host) are
//! `va | count | inline data`, in-arrays (host to guest) are
//! `va | maxcount | inline space`, in-args are `va | value`. Direct calls
//! carry no inline data; the host reaches the guest buffers through the
//! configured [`DirectAccess`] policy instead.
//!
//! Anything staged for the guest is written back only in
//! [`Transport::end_call`], so a call that asks for a retry leaves nothing
//! behind.

use std::sync::Arc;

use crate::api::CallError;
use crate::config::YaglConfig;
use crate::mem::{direct_access, grow_staging, staging_len, DirectAccess, GuestMemory, MemTransfer, PageSet};
use crate::types::{slot_align, GuestVirtAddr};
use crate::SLOT_SIZE;

/// Result word: call completed
pub const CALL_RESULT_OK: u32 = 0xA;
/// Result word: a guest page was missing, resubmit
pub const CALL_RESULT_RETRY: u32 = 0xB;

/// Position inside the page set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cursor {
    page_index: usize,
    offset: usize,
}

#[derive(Debug, Clone, Copy)]
enum OutData {
    Null,
    Page { at: Cursor, len: usize },
    Scratch { slot: usize, len: usize },
}

/// Guest-to-host array argument
#[derive(Debug, Clone, Copy)]
pub struct OutArray {
    data: OutData,
    count: i32,
}

impl OutArray {
    pub fn is_null(&self) -> bool {
        matches!(self.data, OutData::Null)
    }

    /// Element count as sent by the guest, may be negative
    pub fn count(&self) -> i32 {
        self.count
    }
}

#[derive(Debug, Clone, Copy)]
enum InData {
    Null,
    Page { at: Cursor, len: usize },
    Staged { slot: usize },
}

/// Host-to-guest array argument
#[derive(Debug, Clone, Copy)]
pub struct InArray {
    data: InData,
    count_at: Cursor,
    maxcount: i32,
    el_size: usize,
}

impl InArray {
    pub fn is_null(&self) -> bool {
        matches!(self.data, InData::Null)
    }

    /// Room the guest provided, in elements
    pub fn maxcount(&self) -> i32 {
        self.maxcount
    }
}

/// Optional scalar return slot
#[derive(Debug, Clone, Copy)]
pub struct InArg {
    at: Option<Cursor>,
}

impl InArg {
    pub fn is_null(&self) -> bool {
        self.at.is_none()
    }
}

enum InTarget {
    Pages(Cursor),
    Guest(MemTransfer),
}

struct InStage {
    buf: Vec<u8>,
    el_size: usize,
    count: i32,
    target: InTarget,
}

pub struct Transport {
    mem: Arc<dyn GuestMemory>,
    direct_policy: Box<dyn DirectAccess>,
    page_size: usize,
    max_in_arrays: usize,
    max_out_arrays: usize,
    pages: Option<PageSet>,

    // batch
    start: Cursor,
    cur: Cursor,

    // call
    res: Cursor,
    direct: bool,
    out_arrays: Vec<Vec<u8>>,
    num_out_arrays: usize,
    in_arrays: Vec<InStage>,
    num_in_arrays: usize,
}

fn overrun() -> CallError {
    CallError::Protocol("call buffer overrun".to_string())
}

impl Transport {
    pub fn new(config: &YaglConfig, mem: Arc<dyn GuestMemory>) -> Self {
        let page_size = mem.page_size();
        if page_size != config.page_size {
            log::warn!(
                "yagl: guest page size {} differs from configured {}",
                page_size,
                config.page_size
            );
        }
        Self {
            mem,
            direct_policy: direct_access(config.direct_transfer),
            page_size,
            max_in_arrays: config.max_in_arrays,
            max_out_arrays: config.max_out_arrays,
            pages: None,
            start: Cursor::default(),
            cur: Cursor::default(),
            res: Cursor::default(),
            direct: false,
            out_arrays: Vec::new(),
            num_out_arrays: 0,
            in_arrays: Vec::new(),
            num_in_arrays: 0,
        }
    }

    pub fn mem(&self) -> &Arc<dyn GuestMemory> {
        &self.mem
    }

    /// Replace the call buffer; the previous pages are unmapped
    pub fn set_pages(&mut self, pages: Option<PageSet>) {
        self.pages = pages;
    }

    pub fn has_pages(&self) -> bool {
        self.pages.is_some()
    }

    /// Start decoding at byte `offset` of the page set
    pub fn begin(&mut self, offset: usize) -> Result<(), CallError> {
        let num_pages = match &self.pages {
            Some(pages) => pages.len(),
            None => return Err(CallError::Protocol("no call buffer".to_string())),
        };
        let cursor = Cursor {
            page_index: offset / self.page_size,
            offset: offset % self.page_size,
        };
        if cursor.page_index >= num_pages {
            return Err(CallError::Protocol(format!(
                "batch offset {} outside {} pages",
                offset, num_pages
            )));
        }
        self.start = cursor;
        self.cur = cursor;
        Ok(())
    }

    /// Read the call header; `None` marks the end of the batch
    pub fn begin_call(&mut self) -> Result<Option<(u32, u32)>, CallError> {
        let api_id = self.get_u32()?;
        if api_id == 0 {
            return Ok(None);
        }
        let func_id = self.get_u32()?;
        self.res = self.cur;
        self.direct = self.get_u32()? != 0;
        self.num_out_arrays = 0;
        self.num_in_arrays = 0;
        Ok(Some((api_id, func_id)))
    }

    /// Flush staged in-arrays and mark the call done
    pub fn end_call(&mut self) -> Result<(), CallError> {
        for i in 0..self.num_in_arrays {
            let stage = &self.in_arrays[i];
            if stage.count <= 0 {
                continue;
            }
            let len = (stage.count as usize * stage.el_size).min(stage.buf.len());
            match &stage.target {
                InTarget::Guest(mt) => mt.put(self.mem.as_ref(), &stage.buf[..len]),
                InTarget::Pages(at) => self.copy_to(*at, &stage.buf[..len])?,
            }
        }
        self.write_u32(self.res, CALL_RESULT_OK)
    }

    /// Whether the current call moves arrays through guest virtual memory
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Bytes consumed since [`Transport::begin`]
    pub fn bytes_processed(&self) -> usize {
        (self.cur.page_index - self.start.page_index) * self.page_size + self.cur.offset
            - self.start.offset
    }

    fn ptr_at(&self, at: Cursor) -> Result<*mut u8, CallError> {
        self.pages
            .as_ref()
            .and_then(|pages| pages.page(at.page_index))
            .map(|page| unsafe { page.add(at.offset) })
            .ok_or_else(overrun)
    }

    fn advance(&mut self, size: usize) {
        let offset = self.cur.offset + size;
        if offset >= self.page_size {
            let over = offset - self.page_size;
            self.cur.page_index += 1 + over / self.page_size;
            self.cur.offset = over % self.page_size;
        } else {
            self.cur.offset = offset;
        }
    }

    fn fits_in_page(&self, size: usize) -> bool {
        self.cur.offset + size <= self.page_size
    }

    fn read_slot(&mut self) -> Result<[u8; 4], CallError> {
        let ptr = self.ptr_at(self.cur)?;
        let mut raw = [0u8; 4];
        unsafe {
            core::ptr::copy_nonoverlapping(ptr, raw.as_mut_ptr(), 4);
        }
        self.advance(SLOT_SIZE);
        Ok(raw)
    }

    fn write_u32(&self, at: Cursor, value: u32) -> Result<(), CallError> {
        let ptr = self.ptr_at(at)?;
        let raw = value.to_le_bytes();
        unsafe {
            core::ptr::copy_nonoverlapping(raw.as_ptr(), ptr, 4);
        }
        Ok(())
    }

    /// Gather `buf.len()` bytes starting at the cursor, crossing pages
    fn copy_from(&mut self, buf: &mut [u8]) -> Result<(), CallError> {
        let mut done = 0;
        while done < buf.len() {
            let ptr = self.ptr_at(self.cur)?;
            let chunk = (self.page_size - self.cur.offset).min(buf.len() - done);
            unsafe {
                core::ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr().add(done), chunk);
            }
            done += chunk;
            self.advance(chunk);
        }
        Ok(())
    }

    /// Scatter `data` into the pages starting at `at`
    fn copy_to(&self, mut at: Cursor, data: &[u8]) -> Result<(), CallError> {
        let mut done = 0;
        while done < data.len() {
            let ptr = self.ptr_at(at)?;
            let chunk = (self.page_size - at.offset).min(data.len() - done);
            unsafe {
                core::ptr::copy_nonoverlapping(data.as_ptr().add(done), ptr, chunk);
            }
            done += chunk;
            at.page_index += 1;
            at.offset = 0;
        }
        Ok(())
    }

    /// Signal retry to the guest and produce the matching error
    fn retry(&self) -> CallError {
        if let Err(e) = self.write_u32(self.res, CALL_RESULT_RETRY) {
            return e;
        }
        CallError::Retry
    }

    pub fn get_u32(&mut self) -> Result<u32, CallError> {
        Ok(u32::from_le_bytes(self.read_slot()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, CallError> {
        Ok(i32::from_le_bytes(self.read_slot()?))
    }

    pub fn get_f32(&mut self) -> Result<f32, CallError> {
        Ok(f32::from_le_bytes(self.read_slot()?))
    }

    pub fn get_u8(&mut self) -> Result<u8, CallError> {
        Ok(self.read_slot()?[0])
    }

    pub fn get_va(&mut self) -> Result<GuestVirtAddr, CallError> {
        Ok(self.get_u32()? as GuestVirtAddr)
    }

    /// Decode a guest-to-host array of `el_size`-byte elements
    pub fn get_out_array(&mut self, el_size: usize) -> Result<OutArray, CallError> {
        let va = self.get_va()?;
        let count = self.get_i32()?;

        if va == 0 {
            return Ok(OutArray {
                data: OutData::Null,
                count,
            });
        }

        let size = array_size(count, el_size)?;

        if self.direct {
            let slot = self.claim_out_slot(size)?;
            let mut buf = core::mem::take(&mut self.out_arrays[slot]);
            let read = self
                .direct_policy
                .read(self.mem.as_ref(), va, &mut buf[..size]);
            self.out_arrays[slot] = buf;
            if read.is_err() {
                return Err(self.retry());
            }
            self.num_out_arrays += 1;
            return Ok(OutArray {
                data: OutData::Scratch { slot, len: size },
                count,
            });
        }

        if self.fits_in_page(size) {
            let at = self.cur;
            self.ptr_at(at)?;
            self.advance(slot_align(size));
            return Ok(OutArray {
                data: OutData::Page { at, len: size },
                count,
            });
        }

        let slot = self.claim_out_slot(size)?;
        let mut buf = core::mem::take(&mut self.out_arrays[slot]);
        let copied = self.copy_from(&mut buf[..size]);
        self.out_arrays[slot] = buf;
        copied?;
        self.advance(slot_align(size) - size);
        self.num_out_arrays += 1;
        Ok(OutArray {
            data: OutData::Scratch { slot, len: size },
            count,
        })
    }

    fn claim_out_slot(&mut self, size: usize) -> Result<usize, CallError> {
        let slot = self.num_out_arrays;
        if slot >= self.max_out_arrays {
            return Err(CallError::Protocol(format!(
                "more than {} out-arrays",
                self.max_out_arrays
            )));
        }
        if self.out_arrays.len() <= slot {
            self.out_arrays.resize_with(slot + 1, Vec::new);
        }
        let buf = &mut self.out_arrays[slot];
        buf.clear();
        if !grow_staging(buf, size) {
            return Err(CallError::Protocol(format!("cannot stage a {} byte out-array", size)));
        }
        Ok(slot)
    }

    /// Bytes of an out-array, `None` for a NULL array
    pub fn out_bytes(&self, array: &OutArray) -> Option<&[u8]> {
        match array.data {
            OutData::Null => None,
            OutData::Page { at, len } => {
                let ptr = self.ptr_at(at).ok()?;
                Some(unsafe { core::slice::from_raw_parts(ptr, len) })
            }
            OutData::Scratch { slot, len } => self.out_arrays.get(slot).map(|v| &v[..len]),
        }
    }

    pub fn out_u32s(&self, array: &OutArray) -> Option<Vec<u32>> {
        self.out_bytes(array).map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        })
    }

    pub fn out_i32s(&self, array: &OutArray) -> Option<Vec<i32>> {
        self.out_u32s(array)
            .map(|v| v.into_iter().map(|x| x as i32).collect())
    }

    pub fn out_f32s(&self, array: &OutArray) -> Option<Vec<f32>> {
        self.out_u32s(array)
            .map(|v| v.into_iter().map(f32::from_bits).collect())
    }

    /// Single NUL-terminated string carried in a byte out-array
    pub fn out_string(&self, array: &OutArray) -> Option<String> {
        self.out_bytes(array).map(|bytes| {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        })
    }

    /// Decode a host-to-guest array of `el_size`-byte elements
    pub fn get_in_array(&mut self, el_size: usize) -> Result<InArray, CallError> {
        let va = self.get_va()?;
        let count_at = self.cur;
        let maxcount = self.get_i32()?;

        if va == 0 {
            return Ok(InArray {
                data: InData::Null,
                count_at,
                maxcount,
                el_size,
            });
        }

        let size = array_size(maxcount, el_size)?;

        if self.direct {
            let slot = self.claim_in_slot(size, el_size)?;
            let mut mt = match core::mem::replace(
                &mut self.in_arrays[slot].target,
                InTarget::Pages(Cursor::default()),
            ) {
                InTarget::Guest(mt) => mt,
                InTarget::Pages(_) => MemTransfer::new(),
            };
            let prepared = mt.prepare(self.mem.as_ref(), va, size);
            self.in_arrays[slot].target = InTarget::Guest(mt);
            if prepared.is_err() {
                return Err(self.retry());
            }
            self.num_in_arrays += 1;
            return Ok(InArray {
                data: InData::Staged { slot },
                count_at,
                maxcount,
                el_size,
            });
        }

        if self.fits_in_page(size) {
            let at = self.cur;
            self.ptr_at(at)?;
            self.advance(slot_align(size));
            return Ok(InArray {
                data: InData::Page { at, len: size },
                count_at,
                maxcount,
                el_size,
            });
        }

        let slot = self.claim_in_slot(size, el_size)?;
        self.in_arrays[slot].target = InTarget::Pages(self.cur);
        self.advance(slot_align(size));
        self.num_in_arrays += 1;
        Ok(InArray {
            data: InData::Staged { slot },
            count_at,
            maxcount,
            el_size,
        })
    }

    fn claim_in_slot(&mut self, size: usize, el_size: usize) -> Result<usize, CallError> {
        let slot = self.num_in_arrays;
        if slot >= self.max_in_arrays {
            return Err(CallError::Protocol(format!(
                "more than {} in-arrays",
                self.max_in_arrays
            )));
        }
        if self.in_arrays.len() <= slot {
            self.in_arrays.resize_with(slot + 1, || InStage {
                buf: Vec::new(),
                el_size: 1,
                count: 0,
                target: InTarget::Guest(MemTransfer::new()),
            });
        }
        let stage = &mut self.in_arrays[slot];
        stage.buf.clear();
        if !grow_staging(&mut stage.buf, size) {
            return Err(CallError::Protocol(format!("cannot stage a {} byte in-array", size)));
        }
        stage.el_size = el_size;
        stage.count = 0;
        Ok(slot)
    }

    /// Store `count` elements from `data` and report the count to the guest.
    /// Output beyond the guest's room is dropped.
    pub fn put_in_array(
        &mut self,
        array: &InArray,
        data: &[u8],
        count: i32,
    ) -> Result<(), CallError> {
        let count = count.clamp(0, array.maxcount.max(0));
        let len = (count as usize * array.el_size).min(data.len());

        match array.data {
            InData::Null => {}
            InData::Page { at, len: room } => {
                let ptr = self.ptr_at(at)?;
                let len = len.min(room);
                unsafe {
                    core::ptr::copy_nonoverlapping(data.as_ptr(), ptr, len);
                }
            }
            InData::Staged { slot } => {
                if let Some(stage) = self.in_arrays.get_mut(slot) {
                    let len = len.min(stage.buf.len());
                    stage.buf[..len].copy_from_slice(&data[..len]);
                    stage.count = count;
                }
            }
        }

        self.write_u32(array.count_at, count as u32)
    }

    /// Report a count without data (e.g. a required length)
    pub fn set_in_count(&mut self, array: &InArray, count: i32) -> Result<(), CallError> {
        self.write_u32(array.count_at, count as u32)
    }

    pub fn put_in_bytes(&mut self, array: &InArray, data: &[u8]) -> Result<(), CallError> {
        let count = (data.len() / array.el_size.max(1)) as i32;
        self.put_in_array(array, data, count)
    }

    pub fn put_in_u32s(&mut self, array: &InArray, values: &[u32]) -> Result<(), CallError> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.put_in_array(array, &bytes, values.len() as i32)
    }

    pub fn put_in_i32s(&mut self, array: &InArray, values: &[i32]) -> Result<(), CallError> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.put_in_array(array, &bytes, values.len() as i32)
    }

    pub fn put_in_f32s(&mut self, array: &InArray, values: &[f32]) -> Result<(), CallError> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.put_in_array(array, &bytes, values.len() as i32)
    }

    /// NUL-terminated string into a byte in-array, count includes the NUL
    pub fn put_in_string(&mut self, array: &InArray, s: &str) -> Result<(), CallError> {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        let room = array.maxcount.max(0) as usize;
        if !array.is_null() && room > 0 && bytes.len() > room {
            bytes.truncate(room);
            if let Some(last) = bytes.last_mut() {
                *last = 0;
            }
        }
        self.put_in_array(array, &bytes, bytes.len() as i32)
    }

    pub fn get_in_arg(&mut self) -> Result<InArg, CallError> {
        let va = self.get_va()?;
        if va == 0 {
            return Ok(InArg { at: None });
        }
        let at = self.cur;
        self.advance(SLOT_SIZE);
        Ok(InArg { at: Some(at) })
    }

    pub fn put_in_arg_u32(&self, arg: &InArg, value: u32) -> Result<(), CallError> {
        match arg.at {
            Some(at) => self.write_u32(at, value),
            None => Ok(()),
        }
    }

    pub fn put_in_arg_i32(&self, arg: &InArg, value: i32) -> Result<(), CallError> {
        self.put_in_arg_u32(arg, value as u32)
    }

    pub fn put_in_arg_f32(&self, arg: &InArg, value: f32) -> Result<(), CallError> {
        self.put_in_arg_u32(arg, value.to_bits())
    }

    /// Read guest memory outside the call buffer; a fault requests a retry
    pub fn read_guest(&self, va: GuestVirtAddr, buf: &mut [u8]) -> Result<(), CallError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.direct_policy
            .read(self.mem.as_ref(), va, buf)
            .map_err(|_| self.retry())
    }
}

/// Split a byte array of NUL-separated strings
pub fn split_string_array(data: &[u8]) -> Vec<String> {
    if data.is_empty() {
        return Vec::new();
    }
    let data = data.strip_suffix(&[0]).unwrap_or(data);
    data.split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

/// Byte size of an array of `count` elements; a negative count is empty
fn array_size(count: i32, el_size: usize) -> Result<usize, CallError> {
    if count <= 0 {
        return Ok(0);
    }
    staging_len(count as usize, el_size).ok_or_else(|| {
        CallError::Protocol(format!("array of {} x {} bytes is too large", count, el_size))
    })
}
