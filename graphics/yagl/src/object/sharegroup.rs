//! Namespaces shared by a group of GL contexts

use std::sync::Arc;

use parking_lot::Mutex;

use super::namespace::same_object;
use super::{downcast, AddNamed, Namespace, Object};
use crate::types::ObjectName;

/// Fixed namespace slots of a sharegroup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    Buffer = 0,
    Texture = 1,
    Framebuffer = 2,
    Renderbuffer = 3,
    Program = 4,
    Reserved = 5,
}

const NUM_NAMESPACES: usize = 6;

struct Inner {
    namespaces: [Namespace; NUM_NAMESPACES],
    reap_list: Vec<Arc<dyn Object>>,
}

impl Inner {
    /// Release everything parked for deferred destruction
    fn drain(&mut self) {
        if !self.reap_list.is_empty() {
            log::trace!("sharegroup: reaping {} objects", self.reap_list.len());
            self.reap_list.clear();
        }
    }
}

/// Set of namespaces plus a deferred release list, all behind one mutex
pub struct Sharegroup {
    inner: Mutex<Inner>,
}

impl Sharegroup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                namespaces: Default::default(),
                reap_list: Vec::new(),
            }),
        })
    }

    /// Insert under a freshly generated name
    pub fn add(&self, kind: NamespaceKind, obj: Arc<dyn Object>) -> ObjectName {
        let mut inner = self.inner.lock();
        inner.drain();
        inner.namespaces[kind as usize].add(obj)
    }

    /// Insert under `name` unless it is taken, see [`AddNamed`]
    pub fn add_named(
        &self,
        kind: NamespaceKind,
        name: ObjectName,
        obj: Arc<dyn Object>,
    ) -> AddNamed {
        let mut inner = self.inner.lock();
        inner.drain();
        inner.namespaces[kind as usize].add_named(name, obj)
    }

    pub fn remove(&self, kind: NamespaceKind, name: ObjectName) {
        let removed = {
            let mut inner = self.inner.lock();
            inner.drain();
            inner.namespaces[kind as usize].remove(name)
        };
        drop(removed);
    }

    /// Remove `name` only if it still refers to `obj`
    pub fn remove_check(&self, kind: NamespaceKind, name: ObjectName, obj: &Arc<dyn Object>) {
        let mut inner = self.inner.lock();
        inner.drain();
        inner.namespaces[kind as usize].remove_check(name, obj);
    }

    pub fn acquire(&self, kind: NamespaceKind, name: ObjectName) -> Option<Arc<dyn Object>> {
        let mut inner = self.inner.lock();
        inner.drain();
        inner.namespaces[kind as usize].acquire(name)
    }

    /// Typed [`Sharegroup::acquire`]
    pub fn acquire_as<T: Object>(&self, kind: NamespaceKind, name: ObjectName) -> Option<Arc<T>> {
        self.acquire(kind, name).and_then(downcast::<T>)
    }

    /// Park `obj` until the next operation on this sharegroup
    pub fn reap(&self, obj: Arc<dyn Object>) {
        self.inner.lock().reap_list.push(obj);
    }

    pub fn reap_len(&self) -> usize {
        self.inner.lock().reap_list.len()
    }

    /// Whether `obj` is currently parked for reaping
    pub fn is_reaping(&self, obj: &Arc<dyn Object>) -> bool {
        self.inner
            .lock()
            .reap_list
            .iter()
            .any(|parked| same_object(parked, obj))
    }
}

impl Drop for Sharegroup {
    fn drop(&mut self) {
        // The last context using these names is gone, host names die with it
        let inner = self.inner.get_mut();
        for ns in inner.namespaces.iter_mut() {
            ns.cleanup_nodelete();
        }
        inner.reap_list.clear();
    }
}
