//! Translate-first guest writes
//!
//! `prepare` resolves every page of the destination up front so a missing
//! page is detected before the call does any work; `put` later writes the
//! data through physical accesses and cannot fault.

use super::{page_base, page_offset, GuestMemory};
use crate::types::{GuestPhysAddr, GuestVirtAddr};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct MemTransfer {
    va: GuestVirtAddr,
    offset: usize,
    len: usize,
    pages: Vec<GuestPhysAddr>,
}

impl MemTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every page of `[va, va + len)`
    pub fn prepare(&mut self, mem: &dyn GuestMemory, va: GuestVirtAddr, len: usize) -> Result<()> {
        let page_size = mem.page_size();

        self.va = va;
        self.offset = page_offset(va, page_size);
        self.len = len;
        self.pages.clear();

        if va == 0 {
            return Ok(());
        }

        let mut cur = va;
        let mut rem = len;
        while rem > 0 {
            let page_va = page_base(cur, page_size);
            let page_pa = match mem.translate(page_va) {
                Some(pa) => pa,
                None => {
                    log::warn!("yagl: page fault at 0x{:X}", page_va);
                    return Err(Error::GuestMemoryFault(page_va));
                }
            };
            let chunk = ((page_va + page_size as u64 - cur) as usize).min(rem);
            rem -= chunk;
            cur += chunk as u64;
            self.pages.push(page_pa);
        }

        Ok(())
    }

    pub fn va(&self) -> GuestVirtAddr {
        self.va
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write up to the prepared length of `data`
    pub fn put(&self, mem: &dyn GuestMemory, data: &[u8]) {
        if self.va == 0 {
            log::error!("yagl: put to a NULL transfer");
            return;
        }

        let page_size = mem.page_size();
        let mut rem = self.len.min(data.len());
        let mut offset = self.offset;
        let mut done = 0;

        for &pa in &self.pages {
            if rem == 0 {
                break;
            }
            let chunk = rem.min(page_size - offset);
            mem.write_phys(pa + offset as u64, &data[done..done + chunk]);
            offset = 0;
            done += chunk;
            rem -= chunk;
        }
    }
}
