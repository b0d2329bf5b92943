//! Basic identifiers shared by every layer

/// Guest process id
pub type Pid = u32;

/// Guest thread id
pub type Tid = u32;

/// Host-generated handle for EGL resources, 0 is never valid
pub type HostHandle = u32;

/// Guest window-system surface id
pub type WinsysId = u32;

/// Guest-visible GL object name inside a sharegroup namespace
pub type ObjectName = u32;

/// Guest virtual address as carried in a protocol slot
pub type GuestVirtAddr = u64;

/// Guest physical address
pub type GuestPhysAddr = u64;

/// Round `size` up to the next protocol slot boundary
#[inline]
pub const fn slot_align(size: usize) -> usize {
    (size + 7) & !7
}

/// Host-side identifier of a native EGL object (display, surface, context)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(pub u64);

impl NativeId {
    pub const NONE: NativeId = NativeId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_align() {
        assert_eq!(slot_align(0), 0);
        assert_eq!(slot_align(1), 8);
        assert_eq!(slot_align(8), 8);
        assert_eq!(slot_align(13), 16);
    }
}
