//! Access policies for arrays the guest flags as direct

use super::{page_base, page_offset, GuestMemory};
use crate::config::DirectTransferMode;
use crate::types::GuestVirtAddr;
use crate::{Error, Result};

/// Reads guest virtual memory that is not part of the call buffer
pub trait DirectAccess: Send + Sync {
    fn read(&self, mem: &dyn GuestMemory, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()>;
}

/// Goes through the emulator's debug accessor for every read
pub struct DebugAccess;

impl DirectAccess for DebugAccess {
    fn read(&self, mem: &dyn GuestMemory, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()> {
        mem.read_virt(va, buf).map_err(|e| {
            log::warn!("yagl: page fault at 0x{:X}", va);
            e
        })
    }
}

/// Translates every page first, then copies through physical accesses
pub struct PagedAccess;

impl DirectAccess for PagedAccess {
    fn read(&self, mem: &dyn GuestMemory, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()> {
        let page_size = mem.page_size();
        let mut pas = Vec::new();
        let mut cur = va;
        let end = va + buf.len() as u64;

        while cur < end {
            let page_va = page_base(cur, page_size);
            let pa = match mem.translate(page_va) {
                Some(pa) => pa,
                None => {
                    log::warn!("yagl: page fault at 0x{:X}", page_va);
                    return Err(Error::GuestMemoryFault(page_va));
                }
            };
            let len = (page_size - page_offset(cur, page_size)).min((end - cur) as usize);
            pas.push((pa + page_offset(cur, page_size) as u64, len));
            cur += len as u64;
        }

        let mut done = 0;
        for (pa, len) in pas {
            mem.read_phys(pa, &mut buf[done..done + len]);
            done += len;
        }
        Ok(())
    }
}

/// Policy object for the configured mode
pub fn direct_access(mode: DirectTransferMode) -> Box<dyn DirectAccess> {
    match mode {
        DirectTransferMode::Debug => Box::new(DebugAccess),
        DirectTransferMode::Paged => Box::new(PagedAccess),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SimMemory;

    fn setup() -> std::sync::Arc<SimMemory> {
        let sim = SimMemory::new();
        // Virtually contiguous, physically scattered
        sim.map_virt(0x10000, 0x7000);
        sim.map_virt(0x11000, 0x3000);
        let data: Vec<u8> = (0..32).collect();
        sim.write_virt(0x10ff0, &data).unwrap();
        sim
    }

    #[test]
    fn test_policies_agree() {
        let sim = setup();
        for mode in [DirectTransferMode::Debug, DirectTransferMode::Paged] {
            let access = direct_access(mode);
            let mut buf = [0u8; 32];
            access.read(sim.as_ref(), 0x10ff0, &mut buf).unwrap();
            assert_eq!(buf[0], 0);
            assert_eq!(buf[16], 16);
            assert_eq!(buf[31], 31);
        }
    }

    #[test]
    fn test_fault() {
        let sim = setup();
        for mode in [DirectTransferMode::Debug, DirectTransferMode::Paged] {
            let access = direct_access(mode);
            let mut buf = [0u8; 8];
            assert!(access.read(sim.as_ref(), 0x11ffc, &mut buf).is_err());
        }
    }
}
