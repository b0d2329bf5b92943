//! Guest memory access
//!
//! The emulator exposes guest memory through [`GuestMemory`]. On top of it
//! this module builds the mapped call-buffer [`PageSet`], the
//! [`DirectAccess`] policies used for direct arrays, [`MemTransfer`] for
//! staged writes and [`CompiledTransfer`] for repeated pixel pushes.

mod compiled;
mod direct;
mod transfer;

pub use compiled::CompiledTransfer;
pub use direct::{direct_access, DebugAccess, DirectAccess, PagedAccess};
pub use transfer::MemTransfer;

use std::ptr::NonNull;
use std::sync::Arc;

use crate::types::{GuestPhysAddr, GuestVirtAddr};
use crate::{Error, Result, MAX_STAGING_SIZE};

/// Guest memory services provided by the emulator
pub trait GuestMemory: Send + Sync {
    /// Guest page size in bytes
    fn page_size(&self) -> usize;

    /// Physical address of the page containing `va`, `None` if not resident
    fn translate(&self, va: GuestVirtAddr) -> Option<GuestPhysAddr>;

    /// Read through the guest MMU, failing on the first non-resident page
    fn read_virt(&self, va: GuestVirtAddr, buf: &mut [u8]) -> Result<()>;

    /// Write through the guest MMU, failing on the first non-resident page
    fn write_virt(&self, va: GuestVirtAddr, data: &[u8]) -> Result<()>;

    fn read_phys(&self, pa: GuestPhysAddr, buf: &mut [u8]);

    fn write_phys(&self, pa: GuestPhysAddr, data: &[u8]);

    /// Map up to `len` bytes of physical memory, returns the pointer and the
    /// length actually mapped
    fn map(&self, pa: GuestPhysAddr, len: usize) -> Option<(NonNull<u8>, usize)>;

    fn unmap(&self, ptr: NonNull<u8>, len: usize);
}

/// Page-aligned base of `va`
#[inline]
pub fn page_base(va: u64, page_size: usize) -> u64 {
    va & !(page_size as u64 - 1)
}

/// Offset of `va` inside its page
#[inline]
pub fn page_offset(va: u64, page_size: usize) -> usize {
    (va & (page_size as u64 - 1)) as usize
}

/// Byte count of `count` elements of `el_size` bytes, `None` when the
/// product overflows or exceeds [`MAX_STAGING_SIZE`]
pub fn staging_len(count: usize, el_size: usize) -> Option<usize> {
    count
        .checked_mul(el_size)
        .filter(|&len| len <= MAX_STAGING_SIZE)
}

/// Zeroed host buffer of `len` bytes, `None` when `len` is over
/// [`MAX_STAGING_SIZE`] or the host cannot allocate it
pub fn staging_buffer(len: usize) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    grow_staging(&mut buf, len).then_some(buf)
}

/// Grow `buf` with zeroes to at least `len` bytes under the same limits as
/// [`staging_buffer`]
pub fn grow_staging(buf: &mut Vec<u8>, len: usize) -> bool {
    if len <= buf.len() {
        return true;
    }
    if len > MAX_STAGING_SIZE || buf.try_reserve_exact(len - buf.len()).is_err() {
        log::warn!("yagl: cannot stage {} bytes", len);
        return false;
    }
    buf.resize(len, 0);
    true
}

/// Call buffer pages mapped into host memory, unmapped on drop
pub struct PageSet {
    mem: Arc<dyn GuestMemory>,
    pages: Vec<NonNull<u8>>,
    page_size: usize,
}

// The mappings stay valid until drop and are only touched by the owning
// worker while a batch runs.
unsafe impl Send for PageSet {}

impl PageSet {
    /// Map every page in `addrs`
    pub fn map(mem: Arc<dyn GuestMemory>, addrs: &[GuestPhysAddr]) -> Result<PageSet> {
        let page_size = mem.page_size();
        let mut set = PageSet {
            mem,
            pages: Vec::with_capacity(addrs.len()),
            page_size,
        };

        for &pa in addrs {
            match set.mem.map(pa, page_size) {
                Some((ptr, len)) if len == page_size => set.pages.push(ptr),
                Some((ptr, len)) => {
                    set.mem.unmap(ptr, len);
                    log::error!("yagl: partial map of page 0x{:X} ({} bytes)", pa, len);
                    return Err(Error::GuestMemoryFault(pa));
                }
                None => {
                    log::error!("yagl: cannot map page 0x{:X}", pa);
                    return Err(Error::GuestMemoryFault(pa));
                }
            }
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Host pointer to the start of page `index`
    pub fn page(&self, index: usize) -> Option<*mut u8> {
        self.pages.get(index).map(|p| p.as_ptr())
    }
}

impl Drop for PageSet {
    fn drop(&mut self) {
        for page in self.pages.drain(..) {
            self.mem.unmap(page, self.page_size);
        }
    }
}
