//! Local name to object map for one object kind

use std::collections::BTreeMap;
use std::sync::Arc;

use super::Object;
use crate::types::ObjectName;

/// Outcome of inserting under a caller-chosen name
pub enum AddNamed {
    /// The candidate was stored
    Inserted(Arc<dyn Object>),
    /// The name was taken; the candidate was dropped and this is the holder
    Existing(Arc<dyn Object>),
}

impl AddNamed {
    /// The object now living under the name, whichever it is
    pub fn into_object(self) -> Arc<dyn Object> {
        match self {
            AddNamed::Inserted(obj) | AddNamed::Existing(obj) => obj,
        }
    }
}

/// Ordered map from guest-visible names to objects; 0 is never handed out
#[derive(Default)]
pub struct Namespace {
    entries: BTreeMap<ObjectName, Arc<dyn Object>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Store `obj` under the lowest free non-zero name
    pub fn add(&mut self, obj: Arc<dyn Object>) -> ObjectName {
        let mut name: ObjectName = 1;
        for &used in self.entries.keys() {
            if used != name {
                break;
            }
            name += 1;
        }
        self.entries.insert(name, obj);
        name
    }

    pub fn add_named(&mut self, name: ObjectName, obj: Arc<dyn Object>) -> AddNamed {
        if let Some(existing) = self.entries.get(&name) {
            return AddNamed::Existing(existing.clone());
        }
        self.entries.insert(name, obj.clone());
        AddNamed::Inserted(obj)
    }

    pub fn remove(&mut self, name: ObjectName) -> Option<Arc<dyn Object>> {
        self.entries.remove(&name)
    }

    /// Remove `name` only if it still refers to `obj`
    pub fn remove_check(&mut self, name: ObjectName, obj: &Arc<dyn Object>) -> bool {
        match self.entries.get(&name) {
            Some(stored) if same_object(stored, obj) => {
                self.entries.remove(&name);
                true
            }
            _ => false,
        }
    }

    pub fn acquire(&self, name: ObjectName) -> Option<Arc<dyn Object>> {
        self.entries.get(&name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the namespace, marking every object so its host names survive
    pub fn cleanup_nodelete(&mut self) {
        for (_, obj) in core::mem::take(&mut self.entries) {
            obj.header().set_nodelete();
        }
    }
}

/// Identity comparison ignoring vtable pointers
pub(crate) fn same_object(a: &Arc<dyn Object>, b: &Arc<dyn Object>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectHeader;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted {
        header: ObjectHeader,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Object for Counted {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn counted(drops: &Arc<AtomicUsize>) -> Arc<dyn Object> {
        Arc::new(Counted {
            header: ObjectHeader::new(),
            drops: drops.clone(),
        })
    }

    #[test]
    fn test_name_reuse() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ns = Namespace::new();
        assert_eq!(ns.add(counted(&drops)), 1);
        assert_eq!(ns.add(counted(&drops)), 2);
        assert_eq!(ns.add(counted(&drops)), 3);

        ns.remove(2);
        assert_eq!(ns.add(counted(&drops)), 2);
        assert_eq!(ns.add(counted(&drops)), 4);
    }

    #[test]
    fn test_add_named_collision() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ns = Namespace::new();
        let first = counted(&drops);
        assert!(matches!(ns.add_named(5, first.clone()), AddNamed::Inserted(_)));

        let candidate = counted(&drops);
        match ns.add_named(5, candidate) {
            AddNamed::Existing(obj) => assert!(same_object(&obj, &first)),
            AddNamed::Inserted(_) => panic!("name 5 was taken"),
        }
        // The losing candidate is gone
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        // Generated names skip the explicitly taken one
        for expected in 1..5 {
            assert_eq!(ns.add(counted(&drops)), expected);
        }
        assert_eq!(ns.add(counted(&drops)), 6);
    }

    #[test]
    fn test_remove_check() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ns = Namespace::new();
        let a = counted(&drops);
        let b = counted(&drops);
        let name = ns.add(a.clone());

        assert!(!ns.remove_check(name, &b));
        assert!(ns.acquire(name).is_some());
        assert!(ns.remove_check(name, &a));
        assert!(ns.acquire(name).is_none());
    }

    #[test]
    fn test_drop_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ns = Namespace::new();
        let name = ns.add(counted(&drops));
        let held = ns.acquire(name);
        ns.remove(name);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(held);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(ns.acquire(0).is_none());
    }

    #[test]
    fn test_cleanup_nodelete() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ns = Namespace::new();
        let obj = counted(&drops);
        ns.add(obj.clone());
        ns.cleanup_nodelete();
        assert!(ns.is_empty());
        assert!(obj.header().nodelete());
    }
}
