//! Pre-resolved guest buffer for repeated transfers
//!
//! Physically contiguous runs of pages are mapped once as sections; `exec`
//! then copies straight between host memory and those mappings.

use std::ptr::NonNull;
use std::sync::Arc;

use super::{page_base, page_offset, GuestMemory};
use crate::types::GuestVirtAddr;
use crate::{Error, Result};

struct Section {
    map_base: NonNull<u8>,
    map_len: usize,
    /// Offset of the first transferred byte within the mapping
    offset: usize,
    len: usize,
}

pub struct CompiledTransfer {
    mem: Arc<dyn GuestMemory>,
    sections: Vec<Section>,
    is_write: bool,
}

// Sections are private host mappings owned until drop.
unsafe impl Send for CompiledTransfer {}
unsafe impl Sync for CompiledTransfer {}

impl CompiledTransfer {
    /// Resolve and map `[va, va + len)`; `is_write` pushes host data to the guest
    pub fn new(
        mem: Arc<dyn GuestMemory>,
        va: GuestVirtAddr,
        len: usize,
        is_write: bool,
    ) -> Result<Self> {
        let page_size = mem.page_size();
        let mut ct = CompiledTransfer {
            mem,
            sections: Vec::new(),
            is_write,
        };

        if len == 0 {
            return Ok(ct);
        }

        let last_page_va = page_base(va + len as u64 - 1, page_size);
        let mut cur_va = va;
        let mut rem = len;

        while rem > 0 {
            let start_page_va = page_base(cur_va, page_size);
            let start_page_pa = ct.translate(start_page_va)?;

            let mut end_page_va = start_page_va;
            while end_page_va < last_page_va {
                let next_page_va = end_page_va + page_size as u64;
                let next_page_pa = ct.translate(next_page_va)?;
                if next_page_pa < start_page_pa
                    || next_page_pa - start_page_pa != next_page_va - start_page_va
                {
                    break;
                }
                end_page_va = next_page_va;
            }

            let want = (end_page_va + page_size as u64 - start_page_va) as usize;
            let (map_base, map_len) = match ct.mem.map(start_page_pa, want) {
                Some((ptr, mapped)) if mapped > 0 => (ptr, mapped),
                Some((ptr, mapped)) => {
                    ct.mem.unmap(ptr, mapped);
                    return Err(Error::GuestMemoryFault(start_page_pa));
                }
                None => {
                    log::error!("yagl: map(0x{:X}, {}) failed", start_page_pa, want);
                    return Err(Error::GuestMemoryFault(start_page_pa));
                }
            };

            let offset = page_offset(cur_va, page_size);
            let section_len = (map_len - offset).min(rem);
            ct.sections.push(Section {
                map_base,
                map_len,
                offset,
                len: section_len,
            });
            rem -= section_len;
            cur_va += section_len as u64;
        }

        log::debug!(
            "yagl: compiled transfer va=0x{:X} len={} sections={}",
            va,
            len,
            ct.sections.len()
        );

        Ok(ct)
    }

    fn translate(&self, page_va: GuestVirtAddr) -> Result<u64> {
        self.mem.translate(page_va).ok_or_else(|| {
            log::error!("yagl: translation of 0x{:X} failed", page_va);
            Error::GuestMemoryFault(page_va)
        })
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Total bytes covered
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `data` into the guest buffer (write) or the guest buffer into
    /// `data` (read); `data` must hold at least [`CompiledTransfer::len`] bytes
    pub fn exec(&self, data: &mut [u8]) {
        let mut done = 0;
        for section in &self.sections {
            let len = section.len.min(data.len().saturating_sub(done));
            if len == 0 {
                break;
            }
            unsafe {
                let base = section.map_base.as_ptr().add(section.offset);
                if self.is_write {
                    core::ptr::copy_nonoverlapping(data.as_ptr().add(done), base, len);
                } else {
                    core::ptr::copy_nonoverlapping(base, data.as_mut_ptr().add(done), len);
                }
            }
            done += len;
        }
    }
}

impl Drop for CompiledTransfer {
    fn drop(&mut self) {
        for section in self.sections.drain(..) {
            self.mem.unmap(section.map_base, section.map_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SimMemory;

    #[test]
    fn test_coalesces_contiguous_pages() {
        let sim = SimMemory::new();
        sim.map_virt(0x40000, 0x10000);
        sim.map_virt(0x41000, 0x11000);
        sim.map_virt(0x42000, 0x30000);

        let mem: Arc<dyn GuestMemory> = sim.clone();
        let ct = CompiledTransfer::new(mem, 0x40800, 0x2000, true).unwrap();
        assert_eq!(ct.num_sections(), 2);
        assert_eq!(ct.len(), 0x2000);
        assert_eq!(sim.live_mappings(), 2);

        let mut pixels = vec![0xABu8; 0x2000];
        pixels[0x1fff] = 0x5A;
        ct.exec(&mut pixels);

        let mut back = vec![0u8; 0x2000];
        sim.read_virt(0x40800, &mut back).unwrap();
        assert_eq!(back, pixels);

        drop(ct);
        assert_eq!(sim.live_mappings(), 0);
    }

    #[test]
    fn test_read_direction() {
        let sim = SimMemory::new();
        sim.map_virt(0x50000, 0x20000);
        sim.write_virt(0x50010, &[1, 2, 3, 4]).unwrap();

        let mem: Arc<dyn GuestMemory> = sim.clone();
        let ct = CompiledTransfer::new(mem, 0x50010, 4, false).unwrap();
        let mut out = [0u8; 4];
        ct.exec(&mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_page_unmaps_partial() {
        let sim = SimMemory::new();
        sim.map_virt(0x60000, 0x20000);
        sim.map_virt(0x61000, 0x40000);

        let mem: Arc<dyn GuestMemory> = sim.clone();
        assert!(CompiledTransfer::new(mem, 0x60000, 0x3000, true).is_err());
        assert_eq!(sim.live_mappings(), 0);
    }
}
