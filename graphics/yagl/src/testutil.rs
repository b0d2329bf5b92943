//! Test helpers: simulated guest memory and a call-buffer writer

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::mem::{page_base, page_offset, GuestMemory};
use crate::types::{GuestPhysAddr, GuestVirtAddr};
use crate::{Error, Result, PAGE_SIZE, SLOT_SIZE};

/// Flat physical memory plus a software page table
pub struct SimMemory {
    base: NonNull<u8>,
    size: usize,
    page_table: Mutex<HashMap<GuestVirtAddr, GuestPhysAddr>>,
    mappings: AtomicUsize,
}

unsafe impl Send for SimMemory {}
unsafe impl Sync for SimMemory {}

impl SimMemory {
    pub const PHYS_SIZE: usize = 4 << 20;
    pub const UNMAPPABLE_PA: GuestPhysAddr = 0xFFFF_F000;

    pub fn new() -> Arc<Self> {
        let storage = vec![0u8; Self::PHYS_SIZE].into_boxed_slice();
        let base = Box::into_raw(storage) as *mut u8;
        Arc::new(Self {
            base: NonNull::new(base).unwrap(),
            size: Self::PHYS_SIZE,
            page_table: Mutex::new(HashMap::new()),
            mappings: AtomicUsize::new(0),
        })
    }

    /// Make the guest page at `va` resident at `pa`
    pub fn map_virt(&self, va: GuestVirtAddr, pa: GuestPhysAddr) {
        self.page_table
            .lock()
            .insert(page_base(va, PAGE_SIZE), page_base(pa, PAGE_SIZE));
    }

    /// Make the guest page at `va` non-resident
    pub fn unmap_virt(&self, va: GuestVirtAddr) {
        self.page_table.lock().remove(&page_base(va, PAGE_SIZE));
    }

    pub fn live_mappings(&self) -> usize {
        self.mappings.load(Ordering::SeqCst)
    }

    pub fn phys_u32(&self, pa: GuestPhysAddr) -> u32 {
        let mut raw = [0u8; 4];
        self.read_phys(pa, &mut raw);
        u32::from_le_bytes(raw)
    }

    /// Copy a call buffer to `base_pa` and return its page addresses
    pub fn load_batch(&self, base_pa: GuestPhysAddr, bytes: &[u8]) -> Vec<GuestPhysAddr> {
        self.write_phys(base_pa, bytes);
        let num_pages = bytes.len().div_ceil(PAGE_SIZE).max(1);
        (0..num_pages)
            .map(|i| base_pa + (i * PAGE_SIZE) as u64)
            .collect()
    }

    fn check(&self, pa: GuestPhysAddr, len: usize) -> bool {
        (pa as usize).checked_add(len).is_some_and(|end| end <= self.size)
    }

    fn walk(
        &self,
        va: GuestVirtAddr,
        len: usize,
        mut f: impl FnMut(GuestPhysAddr, usize, usize),
    ) -> Result<()> {
        let mut spans = Vec::new();
        let mut cur = va;
        let end = va + len as u64;
        while cur < end {
            let page_va = page_base(cur, PAGE_SIZE);
            let pa = self
                .translate(page_va)
                .ok_or(Error::GuestMemoryFault(page_va))?;
            let chunk = (PAGE_SIZE - page_offset(cur, PAGE_SIZE)).min((end - cur) as usize);
            spans.push((pa + page_offset(cur, PAGE_SIZE) as u64, chunk));
            cur += chunk as u64;
        }
        let mut done = 0;
        for (pa, chunk) in spans {
            f(pa, done, chunk);
            done += chunk;
        }
        Ok(())
    }
}

impl Drop for SimMemory {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                self.base.as_ptr(),
                self.size,
            )));
        }
    }
}

impl GuestMemory for SimMemory {
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    fn translate(&self, va: GuestVirtAddr) -> Option<GuestPhysAddr> {
        self.page_table
            .lock()
            .get(&page_base(va, PAGE_SIZE))
            .copied()
    }

    fn read_virt(&self, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        self.walk(va, len, |pa, done, chunk| {
            self.read_phys(pa, &mut buf[done..done + chunk])
        })
    }

    fn write_virt(&self, va: GuestVirtAddr, data: &[u8]) -> Result<()> {
        self.walk(va, data.len(), |pa, done, chunk| {
            self.write_phys(pa, &data[done..done + chunk])
        })
    }

    fn read_phys(&self, pa: GuestPhysAddr, buf: &mut [u8]) {
        assert!(self.check(pa, buf.len()));
        unsafe {
            core::ptr::copy_nonoverlapping(
                self.base.as_ptr().add(pa as usize),
                buf.as_mut_ptr(),
                buf.len(),
            );
        }
    }

    fn write_phys(&self, pa: GuestPhysAddr, data: &[u8]) {
        assert!(self.check(pa, data.len()));
        unsafe {
            core::ptr::copy_nonoverlapping(
                data.as_ptr(),
                self.base.as_ptr().add(pa as usize),
                data.len(),
            );
        }
    }

    fn map(&self, pa: GuestPhysAddr, len: usize) -> Option<(NonNull<u8>, usize)> {
        if !self.check(pa, len) {
            return None;
        }
        self.mappings.fetch_add(1, Ordering::SeqCst);
        NonNull::new(unsafe { self.base.as_ptr().add(pa as usize) }).map(|p| (p, len))
    }

    fn unmap(&self, _ptr: NonNull<u8>, _len: usize) {
        self.mappings.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builds a call buffer the way the guest driver stub lays it out
#[derive(Default)]
pub struct BatchWriter {
    bytes: Vec<u8>,
}

impl BatchWriter {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    fn slot(&mut self, raw: [u8; 4]) -> usize {
        let at = self.bytes.len();
        self.bytes.extend_from_slice(&raw);
        self.bytes.extend_from_slice(&[0u8; SLOT_SIZE - 4]);
        at
    }

    fn inline(&mut self, data: &[u8], reserve: usize) -> usize {
        let at = self.bytes.len();
        self.bytes.extend_from_slice(data);
        self.bytes.resize(at + reserve.max(data.len()), 0);
        let aligned = (self.bytes.len() + SLOT_SIZE - 1) & !(SLOT_SIZE - 1);
        self.bytes.resize(aligned, 0);
        at
    }

    /// Call header, returns the offset of the result slot
    pub fn call(&mut self, api_id: u32, func_id: u32, direct: bool) -> usize {
        self.u32(api_id);
        self.u32(func_id);
        self.u32(direct as u32)
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

    pub fn f32(&mut self, value: f32) -> usize {
        self.slot(value.to_le_bytes())
    }

    /// Zero slots until `position` is reached, returns how many were written
    pub fn pad_to(&mut self, position: usize) -> usize {
        let mut slots = 0;
        while self.bytes.len() < position {
            self.u32(0);
            slots += 1;
        }
        slots
    }

    /// Non-direct out-array with inline data
    pub fn out_inline(&mut self, count: i32, data: &[u8]) {
        self.u32(1);
        self.i32(count);
        self.inline(data, 0);
    }

    pub fn out_null(&mut self) {
        self.u32(0);
        self.i32(0);
    }

    /// Direct out-array referring to guest memory at `va`
    pub fn out_direct(&mut self, va: u32, count: i32) {
        self.u32(va);
        self.i32(count);
    }

    /// Non-direct in-array, returns (count slot, data area) offsets
    pub fn in_inline(&mut self, maxcount: i32, el_size: usize) -> (usize, usize) {
        self.u32(1);
        let count_at = self.i32(maxcount);
        let data_at = self.inline(&[], maxcount.max(0) as usize * el_size);
        (count_at, data_at)
    }

    pub fn in_null(&mut self) {
        self.u32(0);
        self.i32(0);
    }

    /// Direct in-array, returns the count slot offset
    pub fn in_direct(&mut self, va: u32, maxcount: i32) -> usize {
        self.u32(va);
        self.i32(maxcount)
    }

    /// In-arg, returns the value slot offset
    pub fn in_arg(&mut self) -> usize {
        self.u32(1);
        self.u32(0)
    }

    pub fn in_arg_null(&mut self) {
        self.u32(0);
    }
}

/// Ensure hook for objects created without a host context owner
pub struct NoEnsure;

impl crate::object::EnsureContext for NoEnsure {
    fn ensure_ctx(&self) -> bool {
        false
    }

    fn unensure_ctx(&self, _switched: bool) {}
}
