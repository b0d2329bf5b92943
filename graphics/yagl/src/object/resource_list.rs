//! Ordered list of host-handle resources

use std::sync::Arc;

use parking_lot::Mutex;

use super::Resource;
use crate::types::HostHandle;

pub struct ResourceList<T: Resource + ?Sized> {
    resources: Mutex<Vec<Arc<T>>>,
}

impl<T: Resource + ?Sized> Default for ResourceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource + ?Sized> ResourceList<T> {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Append `res`; the list keeps its own reference
    pub fn add(&self, res: Arc<T>) {
        self.resources.lock().push(res);
    }

    pub fn acquire(&self, handle: HostHandle) -> Option<Arc<T>> {
        self.resources
            .lock()
            .iter()
            .find(|res| res.handle() == handle)
            .cloned()
    }

    /// Drop the list's reference to `handle`; false if it was not listed
    pub fn remove(&self, handle: HostHandle) -> bool {
        let removed = {
            let mut resources = self.resources.lock();
            match resources.iter().position(|res| res.handle() == handle) {
                Some(index) => Some(resources.remove(index)),
                None => None,
            }
        };
        removed.is_some()
    }

    /// Transfer every entry to the tail of `to`, leaving this list empty
    pub fn move_to(&self, to: &ResourceList<T>) {
        let moved = core::mem::take(&mut *self.resources.lock());
        to.resources.lock().extend(moved);
    }

    pub fn count(&self) -> usize {
        self.resources.lock().len()
    }

    /// Snapshot of the current entries
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.resources.lock().clone()
    }

    /// Release every entry
    pub fn cleanup(&self) {
        let released = core::mem::take(&mut *self.resources.lock());
        drop(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::gen_handle;

    struct Res {
        handle: HostHandle,
    }

    impl Resource for Res {
        fn handle(&self) -> HostHandle {
            self.handle
        }
    }

    fn res() -> Arc<Res> {
        Arc::new(Res {
            handle: gen_handle(),
        })
    }

    #[test]
    fn test_add_acquire_remove() {
        let list = ResourceList::new();
        let a = res();
        let b = res();
        list.add(a.clone());
        list.add(b.clone());
        assert_eq!(list.count(), 2);
        assert_eq!(Arc::strong_count(&a), 2);

        assert!(list.acquire(b.handle).is_some());
        assert!(list.remove(a.handle));
        assert!(!list.remove(a.handle));
        assert_eq!(Arc::strong_count(&a), 1);
        assert!(list.acquire(a.handle).is_none());
        assert!(list.acquire(0).is_none());
    }

    #[test]
    fn test_move_keeps_order() {
        let from = ResourceList::new();
        let to = ResourceList::new();
        let a = res();
        let b = res();
        let c = res();
        to.add(a.clone());
        from.add(b.clone());
        from.add(c.clone());

        from.move_to(&to);
        assert_eq!(from.count(), 0);
        let handles: Vec<_> = to.to_vec().iter().map(|r| r.handle).collect();
        assert_eq!(handles, vec![a.handle, b.handle, c.handle]);

        to.cleanup();
        assert_eq!(to.count(), 0);
        assert_eq!(Arc::strong_count(&c), 1);
    }
}
