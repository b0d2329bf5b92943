//! Guest side of the integration tests: a small guest memory and a call
//! buffer writer that lays calls out like the guest driver stub

#![allow(dead_code)]

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use yagl::mem::GuestMemory;
use yagl::{Error, GuestPhysAddr, GuestVirtAddr, Result, PAGE_SIZE, SLOT_SIZE};

pub const BATCH_PA: GuestPhysAddr = 0x10000;

pub struct GuestRam {
    base: NonNull<u8>,
    size: usize,
    pages: Mutex<HashMap<GuestVirtAddr, GuestPhysAddr>>,
    mapped: AtomicUsize,
}

unsafe impl Send for GuestRam {}
unsafe impl Sync for GuestRam {}

fn page_of(addr: u64) -> u64 {
    addr & !(PAGE_SIZE as u64 - 1)
}

impl GuestRam {
    pub fn new(size: usize) -> Arc<Self> {
        let storage = vec![0u8; size].into_boxed_slice();
        let base = NonNull::new(Box::into_raw(storage) as *mut u8).unwrap();
        Arc::new(Self {
            base,
            size,
            pages: Mutex::new(HashMap::new()),
            mapped: AtomicUsize::new(0),
        })
    }

    /// Make `len` bytes at `va` resident starting at `pa`
    pub fn map_range(&self, va: GuestVirtAddr, pa: GuestPhysAddr, len: usize) {
        let mut pages = self.pages.lock();
        for i in 0..len.div_ceil(PAGE_SIZE) as u64 {
            pages.insert(page_of(va) + i * PAGE_SIZE as u64, page_of(pa) + i * PAGE_SIZE as u64);
        }
    }

    pub fn mapped(&self) -> usize {
        self.mapped.load(Ordering::SeqCst)
    }

    pub fn u32_at(&self, pa: GuestPhysAddr) -> u32 {
        let mut raw = [0u8; 4];
        self.read_phys(pa, &mut raw);
        u32::from_le_bytes(raw)
    }

    /// Store a call buffer at [`BATCH_PA`] and list its pages
    pub fn store_batch(&self, bytes: &[u8]) -> Vec<GuestPhysAddr> {
        self.write_phys(BATCH_PA, bytes);
        (0..bytes.len().div_ceil(PAGE_SIZE).max(1))
            .map(|i| BATCH_PA + (i * PAGE_SIZE) as u64)
            .collect()
    }

    fn spans(&self, va: GuestVirtAddr, len: usize) -> Result<Vec<(GuestPhysAddr, usize)>> {
        let mut spans = Vec::new();
        let mut cur = va;
        let end = va + len as u64;
        while cur < end {
            let pa = self
                .translate(cur)
                .ok_or(Error::GuestMemoryFault(page_of(cur)))?;
            let offset = (cur - page_of(cur)) as usize;
            let chunk = (PAGE_SIZE - offset).min((end - cur) as usize);
            spans.push((pa + offset as u64, chunk));
            cur += chunk as u64;
        }
        Ok(spans)
    }
}

impl Drop for GuestRam {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                self.base.as_ptr(),
                self.size,
            )));
        }
    }
}

impl GuestMemory for GuestRam {
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    fn translate(&self, va: GuestVirtAddr) -> Option<GuestPhysAddr> {
        self.pages.lock().get(&page_of(va)).copied()
    }

    fn read_virt(&self, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()> {
        let mut done = 0;
        for (pa, chunk) in self.spans(va, buf.len())? {
            self.read_phys(pa, &mut buf[done..done + chunk]);
            done += chunk;
        }
        Ok(())
    }

    fn write_virt(&self, va: GuestVirtAddr, data: &[u8]) -> Result<()> {
        let mut done = 0;
        for (pa, chunk) in self.spans(va, data.len())? {
            self.write_phys(pa, &data[done..done + chunk]);
            done += chunk;
        }
        Ok(())
    }

    fn read_phys(&self, pa: GuestPhysAddr, buf: &mut [u8]) {
        assert!(pa as usize + buf.len() <= self.size);
        unsafe {
            core::ptr::copy_nonoverlapping(self.base.as_ptr().add(pa as usize), buf.as_mut_ptr(), buf.len());
        }
    }

    fn write_phys(&self, pa: GuestPhysAddr, data: &[u8]) {
        assert!(pa as usize + data.len() <= self.size);
        unsafe {
            core::ptr::copy_nonoverlapping(data.as_ptr(), self.base.as_ptr().add(pa as usize), data.len());
        }
    }

    fn map(&self, pa: GuestPhysAddr, len: usize) -> Option<(NonNull<u8>, usize)> {
        if pa as usize + len > self.size {
            return None;
        }
        self.mapped.fetch_add(1, Ordering::SeqCst);
        NonNull::new(unsafe { self.base.as_ptr().add(pa as usize) }).map(|p| (p, len))
    }

    fn unmap(&self, _ptr: NonNull<u8>, _len: usize) {
        self.mapped.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Call buffer under construction; offsets returned are byte offsets into
/// the buffer
#[derive(Default)]
pub struct Batch {
    bytes: Vec<u8>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    fn slot(&mut self, raw: [u8; 4]) -> usize {
        let at = self.bytes.len();
        self.bytes.extend_from_slice(&raw);
        self.bytes.resize(at + SLOT_SIZE, 0);
        at
    }

    fn align(&mut self) {
        let aligned = self.bytes.len().div_ceil(SLOT_SIZE) * SLOT_SIZE;
        self.bytes.resize(aligned, 0);
    }

    /// Call header, returns the result slot
    pub fn call(&mut self, api: yagl::ApiId, func_id: u32) -> usize {
        self.u32(api as u32);
        self.u32(func_id);
        self.u32(0)
    }

    /// Header of a call whose arrays live in guest virtual memory
    pub fn call_direct(&mut self, api: yagl::ApiId, func_id: u32) -> usize {
        self.u32(api as u32);
        self.u32(func_id);
        self.u32(1)
    }

    pub fn end(&mut self) {
        self.u32(0);
    }

    pub fn u32(&mut self, value: u32) -> usize {
        self.slot(value.to_le_bytes())
    }

    pub fn i32(&mut self, value: i32) -> usize {
        self.slot(value.to_le_bytes())
    }

    pub fn bytes_array(&mut self, count: i32, data: &[u8]) {
        self.u32(1);
        self.i32(count);
        self.bytes.extend_from_slice(data);
        self.align();
    }

    pub fn i32_array(&mut self, values: &[i32]) {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.bytes_array(values.len() as i32, &raw);
    }

    /// Room for `maxcount` elements, returns (count slot, data) offsets
    pub fn in_array(&mut self, maxcount: i32, el_size: usize) -> (usize, usize) {
        self.u32(1);
        let count_at = self.i32(maxcount);
        let data_at = self.bytes.len();
        self.bytes.resize(data_at + maxcount as usize * el_size, 0);
        self.align();
        (count_at, data_at)
    }

    /// Array of a direct call, data stays at `va`
    pub fn direct_array(&mut self, va: u32, count: i32) {
        self.u32(va);
        self.i32(count);
    }

    pub fn null_array(&mut self) {
        self.u32(0);
        self.i32(0);
    }

    /// Returns the value slot
    pub fn in_arg(&mut self) -> usize {
        self.u32(1);
        self.u32(0)
    }

    pub fn null_arg(&mut self) {
        self.u32(0);
    }
}
