//! Reference-counted object model
//!
//! GL objects that contexts can share (buffers, textures, framebuffers,
//! renderbuffers, programs and shaders) implement [`Object`] and live in the
//! namespaces of a [`Sharegroup`]. EGL entities implement [`Resource`] and are
//! kept in per-display [`ResourceList`]s keyed by a host handle.
//!
//! Reference counting is `Arc`: an object's `Drop` impl is its destroy hook
//! and runs exactly once, when the last holder lets go.

mod namespace;
mod resource_list;
mod sharegroup;

pub use namespace::{AddNamed, Namespace};
pub use resource_list::ResourceList;
pub use sharegroup::{NamespaceKind, Sharegroup};

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::HostHandle;

/// State common to every namespace object
#[derive(Debug, Default)]
pub struct ObjectHeader {
    nodelete: AtomicBool,
}

impl ObjectHeader {
    pub fn new() -> Self {
        Self {
            nodelete: AtomicBool::new(false),
        }
    }

    /// Host names must not be deleted on drop, the owning host context is gone
    pub fn set_nodelete(&self) {
        self.nodelete.store(true, Ordering::Release);
    }

    pub fn nodelete(&self) -> bool {
        self.nodelete.load(Ordering::Acquire)
    }
}

/// A GL object stored in a sharegroup namespace
pub trait Object: Any + Send + Sync {
    fn header(&self) -> &ObjectHeader;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Downcast a namespace entry to its concrete type
pub fn downcast<T: Object>(obj: Arc<dyn Object>) -> Option<Arc<T>> {
    obj.into_any().downcast::<T>().ok()
}

/// Host-handle keyed entity (EGL display, config, surface, context, image)
pub trait Resource: Send + Sync {
    fn handle(&self) -> HostHandle;
}

static NEXT_HANDLE: spin::Mutex<HostHandle> = spin::Mutex::new(1);

/// Allocate a process-wide unique host handle, never 0
pub fn gen_handle() -> HostHandle {
    let mut next = NEXT_HANDLE.lock();
    let handle = *next;
    *next = next.wrapping_add(1);
    if *next == 0 {
        *next = 1;
    }
    handle
}

/// Makes some host context current so host object names can be deleted
/// outside the normal current-context flow
pub trait EnsureContext: Send + Sync {
    /// Returns true when a context had to be made current
    fn ensure_ctx(&self) -> bool;

    /// Undo a previous `ensure_ctx` that returned true
    fn unensure_ctx(&self, switched: bool);
}

/// Scoped `ensure_ctx`/`unensure_ctx` pair
pub struct EnsureGuard<'a> {
    owner: &'a dyn EnsureContext,
    switched: bool,
}

impl<'a> EnsureGuard<'a> {
    pub fn new(owner: &'a dyn EnsureContext) -> Self {
        let switched = owner.ensure_ctx();
        Self { owner, switched }
    }
}

impl Drop for EnsureGuard<'_> {
    fn drop(&mut self) {
        self.owner.unensure_ctx(self.switched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        header: ObjectHeader,
    }

    impl Object for Dummy {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    struct Other {
        header: ObjectHeader,
    }

    impl Object for Other {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[test]
    fn test_handles_unique_nonzero() {
        let a = gen_handle();
        let b = gen_handle();
        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_downcast() {
        let obj: Arc<dyn Object> = Arc::new(Dummy {
            header: ObjectHeader::new(),
        });
        assert!(downcast::<Other>(obj.clone()).is_none());
        assert!(downcast::<Dummy>(obj).is_some());

        let other = Other {
            header: ObjectHeader::new(),
        };
        assert!(!other.header().nodelete());
        other.header().set_nodelete();
        assert!(other.header().nodelete());
    }
}
